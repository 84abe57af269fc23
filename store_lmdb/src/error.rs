use thiserror::Error;

#[derive(Debug, Error)]
pub enum LmdbError {
    #[error("LMDB error: {0}")]
    Heed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("data directory {0} exists but holds no data.mdb")]
    MissingDataFile(std::path::PathBuf),

    #[error("unsupported schema version {found} (this build supports {supported})")]
    SchemaVersion { found: u32, supported: u32 },
}

impl From<heed::Error> for LmdbError {
    fn from(e: heed::Error) -> Self {
        LmdbError::Heed(e.to_string())
    }
}

impl From<LmdbError> for peggy_store::StoreError {
    fn from(e: LmdbError) -> Self {
        peggy_store::StoreError::Backend(e.to_string())
    }
}
