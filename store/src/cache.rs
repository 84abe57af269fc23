//! Write-buffering overlay.
//!
//! A [`CacheStore`] reads through to its parent and keeps every write in
//! memory until [`CacheStore::write`] flushes them to the parent in one
//! batch. Dropping the cache discards the writes. Caches nest: a cache can
//! sit on top of another cache.

use crate::{KvStore, StoreError, WriteOp};
use std::collections::BTreeMap;
use std::ops::ControlFlow;
use std::sync::{Mutex, MutexGuard};

type Overlay = BTreeMap<Vec<u8>, Option<Vec<u8>>>;

pub struct CacheStore<'a> {
    parent: &'a dyn KvStore,
    writes: Mutex<Overlay>,
}

impl<'a> CacheStore<'a> {
    pub fn new(parent: &'a dyn KvStore) -> Self {
        Self {
            parent,
            writes: Mutex::new(BTreeMap::new()),
        }
    }

    fn overlay(&self) -> Result<MutexGuard<'_, Overlay>, StoreError> {
        self.writes
            .lock()
            .map_err(|_| StoreError::Backend("cache overlay lock poisoned".to_string()))
    }

    /// Number of buffered writes (puts and deletes).
    pub fn pending_writes(&self) -> usize {
        self.writes.lock().map(|w| w.len()).unwrap_or(0)
    }

    /// Flush all buffered writes to the parent atomically.
    pub fn write(self) -> Result<(), StoreError> {
        let writes = self
            .writes
            .into_inner()
            .map_err(|_| StoreError::Backend("cache overlay lock poisoned".to_string()))?;
        if writes.is_empty() {
            return Ok(());
        }
        let ops: Vec<WriteOp> = writes.into_iter().collect();
        tracing::trace!(ops = ops.len(), "flushing cache store");
        self.parent.write_batch(ops)
    }
}

impl KvStore for CacheStore<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        if let Some(entry) = self.overlay()?.get(key) {
            return Ok(entry.clone());
        }
        self.parent.get(key)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.overlay()?.insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        self.overlay()?.insert(key.to_vec(), None);
        Ok(())
    }

    fn for_each_prefix(
        &self,
        prefix: &[u8],
        visit: &mut dyn FnMut(&[u8], &[u8]) -> ControlFlow<()>,
    ) -> Result<(), StoreError> {
        // The overlay range is copied so the visitor runs without the lock;
        // the parent is streamed and merged against it in key order.
        let buffered: Vec<(Vec<u8>, Option<Vec<u8>>)> = self
            .overlay()?
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let mut buffered = buffered.into_iter().peekable();
        let mut stopped = false;
        self.parent.for_each_prefix(prefix, &mut |key, value| {
            while let Some((k, v)) = buffered.next_if(|(k, _)| k.as_slice() < key) {
                if let Some(v) = v {
                    if visit(&k, &v).is_break() {
                        stopped = true;
                        return ControlFlow::Break(());
                    }
                }
            }
            let flow = match buffered.next_if(|(k, _)| k.as_slice() == key) {
                Some((_, Some(v))) => visit(key, &v),
                Some((_, None)) => ControlFlow::Continue(()),
                None => visit(key, value),
            };
            stopped = flow.is_break();
            flow
        })?;
        if stopped {
            return Ok(());
        }
        for (k, v) in buffered {
            if let Some(v) = v {
                if visit(&k, &v).is_break() {
                    break;
                }
            }
        }
        Ok(())
    }

    fn write_batch(&self, ops: Vec<WriteOp>) -> Result<(), StoreError> {
        let mut overlay = self.overlay()?;
        for (k, v) in ops {
            overlay.insert(k, v);
        }
        Ok(())
    }
}
