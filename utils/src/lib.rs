//! Shared utilities for the Peggy bridge.

pub mod logging;

pub use logging::{init_logging, LogFormat, LoggingError};
