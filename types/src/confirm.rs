//! Validator signatures over batches and validator sets.

use crate::{EthAddress, ValAddress};
use serde::{Deserialize, Serialize};

/// A validator's signature over an outgoing batch checkpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfirm {
    pub token_contract: EthAddress,
    pub nonce: u64,
    pub validator: ValAddress,
    /// External address the signature was verified against.
    pub eth_signer: EthAddress,
    pub signature: Vec<u8>,
}

/// A validator's signature over a valset checkpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValsetConfirm {
    pub nonce: u64,
    pub validator: ValAddress,
    pub eth_signer: EthAddress,
    pub signature: Vec<u8>,
}
