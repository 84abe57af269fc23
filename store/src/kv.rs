//! Ordered key-value store trait.

use crate::StoreError;
use std::ops::ControlFlow;

/// A single buffered write: `Some(value)` puts, `None` deletes.
pub type WriteOp = (Vec<u8>, Option<Vec<u8>>);

/// Ordered byte-keyed storage with prefix iteration.
///
/// Keys are compared lexicographically, so big-endian integer suffixes
/// iterate in numeric order.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;

    /// Deleting a missing key is not an error.
    fn delete(&self, key: &[u8]) -> Result<(), StoreError>;

    /// Visit every entry whose key starts with `prefix`, in ascending key
    /// order, until the visitor returns `ControlFlow::Break`.
    ///
    /// The visitor must not write to the same store.
    fn for_each_prefix(
        &self,
        prefix: &[u8],
        visit: &mut dyn FnMut(&[u8], &[u8]) -> ControlFlow<()>,
    ) -> Result<(), StoreError>;

    /// Apply all writes atomically, in order.
    fn write_batch(&self, ops: Vec<WriteOp>) -> Result<(), StoreError>;

    fn contains(&self, key: &[u8]) -> Result<bool, StoreError> {
        Ok(self.get(key)?.is_some())
    }

    /// Collect every entry under `prefix`.
    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let mut out = Vec::new();
        self.for_each_prefix(prefix, &mut |k, v| {
            out.push((k.to_vec(), v.to_vec()));
            ControlFlow::Continue(())
        })?;
        Ok(out)
    }
}
