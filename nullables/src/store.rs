//! Nullable store: thread-safe in-memory ordered storage for testing.

use peggy_store::{KvStore, StoreError, WriteOp};
use std::collections::BTreeMap;
use std::ops::ControlFlow;
use std::sync::Mutex;

/// An in-memory [`KvStore`] for testing.
pub struct NullStore {
    entries: Mutex<BTreeMap<Vec<u8>, Vec<u8>>>,
    writes: Mutex<u64>,
    visits: Mutex<u64>,
}

impl NullStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            writes: Mutex::new(0),
            visits: Mutex::new(0),
        }
    }

    /// A copy of every entry, for byte-level state comparisons.
    pub fn snapshot(&self) -> BTreeMap<Vec<u8>, Vec<u8>> {
        self.entries.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of committed write operations (puts, deletes and batches).
    pub fn write_count(&self) -> u64 {
        *self.writes.lock().unwrap()
    }

    /// Number of entries handed to prefix-iteration visitors.
    pub fn visited_count(&self) -> u64 {
        *self.visits.lock().unwrap()
    }

    fn bump_writes(&self) {
        *self.writes.lock().unwrap() += 1;
    }
}

impl Default for NullStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KvStore for NullStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_vec(), value.to_vec());
        self.bump_writes();
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        self.entries.lock().unwrap().remove(key);
        self.bump_writes();
        Ok(())
    }

    fn for_each_prefix(
        &self,
        prefix: &[u8],
        visit: &mut dyn FnMut(&[u8], &[u8]) -> ControlFlow<()>,
    ) -> Result<(), StoreError> {
        // Snapshot first so the visitor never runs under the lock.
        let matching: Vec<(Vec<u8>, Vec<u8>)> = self
            .entries
            .lock()
            .unwrap()
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for (k, v) in &matching {
            *self.visits.lock().unwrap() += 1;
            if visit(k, v).is_break() {
                break;
            }
        }
        Ok(())
    }

    fn write_batch(&self, ops: Vec<WriteOp>) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap();
        for (k, v) in ops {
            match v {
                Some(v) => entries.insert(k, v),
                None => entries.remove(&k),
            };
        }
        drop(entries);
        self.bump_writes();
        Ok(())
    }
}
