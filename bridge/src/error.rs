use peggy_crypto::CryptoError;
use peggy_messages::MsgError;
use peggy_store::{BankError, StoreError};
use peggy_types::{EthAddress, ValAddress};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PeggyError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("unknown validator: {0}")]
    UnknownValidator(String),

    #[error("no external address registered for validator {0}")]
    UnknownAddress(ValAddress),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("validator {validator} already signed {target}")]
    DuplicateSignature { validator: ValAddress, target: String },

    #[error("validator {validator} already claimed event {event_nonce}")]
    DuplicateClaim {
        validator: ValAddress,
        event_nonce: u64,
    },

    #[error("insufficient funds: needed {needed}, available {available}")]
    InsufficientFunds { needed: u128, available: u128 },

    #[error("no pending transfers for {0}")]
    EmptyBatch(String),

    #[error("external address {address} is already bound to validator {owner}")]
    AddressInUse {
        address: EthAddress,
        owner: ValAddress,
    },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("arithmetic overflow: {0}")]
    Overflow(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<BankError> for PeggyError {
    fn from(e: BankError) -> Self {
        match e {
            BankError::InsufficientFunds {
                needed, available, ..
            } => PeggyError::InsufficientFunds { needed, available },
            BankError::Overflow(denom) => PeggyError::Overflow(format!("balance of {denom}")),
            BankError::Store(e) => PeggyError::Store(e),
        }
    }
}

impl From<CryptoError> for PeggyError {
    fn from(e: CryptoError) -> Self {
        PeggyError::InvalidSignature(e.to_string())
    }
}

impl From<MsgError> for PeggyError {
    fn from(e: MsgError) -> Self {
        PeggyError::InvalidRequest(e.to_string())
    }
}
