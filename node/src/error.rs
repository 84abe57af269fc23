use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("bridge error: {0}")]
    Bridge(#[from] peggy_bridge::PeggyError),

    #[error("store error: {0}")]
    Store(#[from] peggy_store::StoreError),

    #[error("storage backend error: {0}")]
    Lmdb(#[from] peggy_store_lmdb::LmdbError),

    #[error("logging error: {0}")]
    Logging(#[from] peggy_utils::LoggingError),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("store integrity check failed: {0}")]
    Integrity(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("block height {requested} is below current height {current}")]
    HeightRegression { requested: u64, current: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
