use peggy_types::EthAddress;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    #[error("signature recovery failed: {0}")]
    Recovery(String),

    #[error("signature signed by {recovered}, expected {expected}")]
    SignerMismatch {
        expected: EthAddress,
        recovered: EthAddress,
    },

    #[error("invalid secret key: {0}")]
    InvalidKey(String),
}
