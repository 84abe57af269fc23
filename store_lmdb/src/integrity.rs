//! Startup checks for the LMDB data directory.
//!
//! Run before any message is applied so a damaged or foreign store is
//! refused instead of silently extended.

use std::path::Path;

use heed::types::Bytes;
use heed::Env;

use crate::environment::{CURRENT_SCHEMA_VERSION, META_DB, SCHEMA_VERSION_KEY, STATE_DB};
use crate::LmdbError;

#[derive(Debug, Default)]
pub struct IntegrityReport {
    pub databases_checked: u32,
    /// Entries in the state database.
    pub state_entries: u64,
    /// `None` if the meta database has no version record.
    pub schema_version: Option<u32>,
    pub errors: Vec<String>,
}

impl IntegrityReport {
    pub fn is_healthy(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Inspect the state and meta databases. Problems are collected in the
/// report; only a failure to start a read transaction is returned.
pub fn check_integrity(env: &Env) -> Result<IntegrityReport, LmdbError> {
    let mut report = IntegrityReport::default();
    let rtxn = env.read_txn()?;

    match env.open_database::<Bytes, Bytes>(&rtxn, Some(STATE_DB)) {
        Ok(Some(db)) => {
            report.databases_checked += 1;
            match db.len(&rtxn) {
                Ok(count) => report.state_entries = count,
                Err(e) => report.errors.push(format!("cannot count '{STATE_DB}': {e}")),
            }
        }
        Ok(None) => report.errors.push(format!("database '{STATE_DB}' is missing")),
        Err(e) => report.errors.push(format!("cannot open '{STATE_DB}': {e}")),
    }

    match env.open_database::<Bytes, Bytes>(&rtxn, Some(META_DB)) {
        Ok(Some(db)) => {
            report.databases_checked += 1;
            match db.get(&rtxn, SCHEMA_VERSION_KEY) {
                Ok(Some(bytes)) => match <[u8; 4]>::try_from(bytes) {
                    Ok(arr) => {
                        let version = u32::from_be_bytes(arr);
                        if version > CURRENT_SCHEMA_VERSION {
                            report.errors.push(format!(
                                "schema version {version} is newer than {CURRENT_SCHEMA_VERSION}"
                            ));
                        }
                        report.schema_version = Some(version);
                    }
                    Err(_) => report
                        .errors
                        .push(format!("schema version record has {} bytes", bytes.len())),
                },
                Ok(None) => {}
                Err(e) => report.errors.push(format!("cannot read schema version: {e}")),
            }
        }
        Ok(None) => report.errors.push(format!("database '{META_DB}' is missing")),
        Err(e) => report.errors.push(format!("cannot open '{META_DB}': {e}")),
    }

    Ok(report)
}

/// Check a data directory before opening it.
///
/// A missing directory is a fresh start. An existing directory without
/// `data.mdb` is refused.
pub fn check_data_dir(path: &Path) -> Result<(), LmdbError> {
    if path.exists() && !path.join("data.mdb").exists() {
        return Err(LmdbError::MissingDataFile(path.to_path_buf()));
    }
    Ok(())
}
