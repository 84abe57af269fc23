//! Parse and validation errors for the fundamental types.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid ethereum address: {0}")]
    InvalidEthAddress(String),

    #[error("invalid hash: {0}")]
    InvalidHash(String),

    #[error("invalid ledger address: {0}")]
    InvalidAddress(String),

    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
