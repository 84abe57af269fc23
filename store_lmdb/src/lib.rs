//! LMDB storage backend for the Peggy bridge.
//!
//! Implements [`peggy_store::KvStore`] over a single `heed` database inside an
//! LMDB environment, plus a small metadata database for the schema version.

pub mod environment;
pub mod error;
pub mod integrity;

pub use environment::{LmdbStore, CURRENT_SCHEMA_VERSION, DEFAULT_MAP_SIZE};
pub use error::LmdbError;
pub use integrity::{check_data_dir, check_integrity, IntegrityReport};
