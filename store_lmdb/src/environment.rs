//! LMDB environment and the `KvStore` implementation.

use std::ops::ControlFlow;
use std::path::Path;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use peggy_store::{KvStore, StoreError, WriteOp};

use crate::LmdbError;

/// The schema version that the current code writes.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

pub(crate) const STATE_DB: &str = "state";
pub(crate) const META_DB: &str = "meta";
pub(crate) const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";

/// Default map size: 1 GiB.
pub const DEFAULT_MAP_SIZE: usize = 1 << 30;

/// Bridge state in an LMDB environment.
///
/// Every write opens its own write transaction; [`KvStore::write_batch`]
/// applies a whole message's writes in one transaction.
pub struct LmdbStore {
    env: Env,
    state_db: Database<Bytes, Bytes>,
    meta_db: Database<Bytes, Bytes>,
}

impl LmdbStore {
    /// Open or create an environment at `path`, checking the schema version.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;
        // SAFETY: the environment is opened once per process for this path.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(4)
                .open(path)?
        };
        let mut wtxn = env.write_txn()?;
        let state_db: Database<Bytes, Bytes> = env.create_database(&mut wtxn, Some(STATE_DB))?;
        let meta_db: Database<Bytes, Bytes> = env.create_database(&mut wtxn, Some(META_DB))?;
        wtxn.commit()?;

        let store = Self {
            env,
            state_db,
            meta_db,
        };
        store.check_schema()?;
        tracing::info!(path = %path.display(), "opened LMDB store");
        Ok(store)
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    /// Stored schema version; 0 for a fresh database.
    pub fn schema_version(&self) -> Result<u32, LmdbError> {
        let rtxn = self.env.read_txn()?;
        let version = match self.meta_db.get(&rtxn, SCHEMA_VERSION_KEY)? {
            Some(bytes) => {
                let arr: [u8; 4] = bytes.try_into().map_err(|_| {
                    LmdbError::Heed("schema_version has unexpected byte length".to_string())
                })?;
                u32::from_be_bytes(arr)
            }
            None => 0,
        };
        Ok(version)
    }

    fn check_schema(&self) -> Result<(), LmdbError> {
        let found = self.schema_version()?;
        if found > CURRENT_SCHEMA_VERSION {
            return Err(LmdbError::SchemaVersion {
                found,
                supported: CURRENT_SCHEMA_VERSION,
            });
        }
        if found < CURRENT_SCHEMA_VERSION {
            let mut wtxn = self.env.write_txn()?;
            self.meta_db.put(
                &mut wtxn,
                SCHEMA_VERSION_KEY,
                &CURRENT_SCHEMA_VERSION.to_be_bytes(),
            )?;
            wtxn.commit()?;
            tracing::info!(from = found, to = CURRENT_SCHEMA_VERSION, "schema version set");
        }
        Ok(())
    }

    /// Number of entries in the state database.
    pub fn len(&self) -> Result<u64, LmdbError> {
        let rtxn = self.env.read_txn()?;
        Ok(self.state_db.len(&rtxn)?)
    }

    pub fn is_empty(&self) -> Result<bool, LmdbError> {
        Ok(self.len()? == 0)
    }
}

impl KvStore for LmdbStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self.state_db.get(&rtxn, key).map_err(LmdbError::from)?;
        Ok(val.map(|v| v.to_vec()))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.state_db
            .put(&mut wtxn, key, value)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.state_db
            .delete(&mut wtxn, key)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn for_each_prefix(
        &self,
        prefix: &[u8],
        visit: &mut dyn FnMut(&[u8], &[u8]) -> ControlFlow<()>,
    ) -> Result<(), StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self
            .state_db
            .prefix_iter(&rtxn, prefix)
            .map_err(LmdbError::from)?;
        for entry in iter {
            let (k, v) = entry.map_err(LmdbError::from)?;
            if visit(k, v).is_break() {
                break;
            }
        }
        Ok(())
    }

    fn write_batch(&self, ops: Vec<WriteOp>) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        for (key, value) in &ops {
            match value {
                Some(v) => self
                    .state_db
                    .put(&mut wtxn, key, v)
                    .map_err(LmdbError::from)?,
                None => {
                    self.state_db
                        .delete(&mut wtxn, key)
                        .map_err(LmdbError::from)?;
                }
            }
        }
        wtxn.commit().map_err(LmdbError::from)?;
        tracing::debug!(ops = ops.len(), "committed write batch");
        Ok(())
    }
}
