//! Bridge messages.
//!
//! Every state transition of the bridge is triggered by one [`Msg`], executed
//! atomically. Messages are signed by the ledger account in their `orchestrator`
//! (or `sender`) field; the ledger has already authenticated that signature.

use peggy_types::{
    AccAddress, ClaimDetails, Coin, Denom, EthAddress, EthereumClaim, Hash256, OutgoingTxBatch,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Stateless validation failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MsgError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid denomination: {0}")]
    InvalidDenom(String),

    #[error("{0}")]
    Invalid(String),
}

/// All message types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    SetEthAddress,
    RequestValset,
    ConfirmValset,
    SendToExternal,
    RequestBatch,
    ConfirmBatch,
    SubmitClaims,
}

impl MessageType {
    pub const ALL: [MessageType; 7] = [
        MessageType::SetEthAddress,
        MessageType::RequestValset,
        MessageType::ConfirmValset,
        MessageType::SendToExternal,
        MessageType::RequestBatch,
        MessageType::ConfirmBatch,
        MessageType::SubmitClaims,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::SetEthAddress => "set_eth_address",
            MessageType::RequestValset => "request_valset",
            MessageType::ConfirmValset => "confirm_valset",
            MessageType::SendToExternal => "send_to_external",
            MessageType::RequestBatch => "request_batch",
            MessageType::ConfirmBatch => "confirm_batch",
            MessageType::SubmitClaims => "submit_claims",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bind the orchestrator's validator to an external signing address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSetEthAddress {
    pub orchestrator: AccAddress,
    pub address: EthAddress,
}

/// Snapshot the current validator set into a new valset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgRequestValset {
    pub orchestrator: AccAddress,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgConfirmValset {
    pub orchestrator: AccAddress,
    pub nonce: u64,
    /// Hex-encoded 65-byte signature over the valset checkpoint.
    pub signature: String,
}

/// Queue a transfer of vouchers back to the external chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSendToExternal {
    pub sender: AccAddress,
    pub destination: EthAddress,
    pub amount: Coin,
    pub bridge_fee: Coin,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgRequestBatch {
    pub orchestrator: AccAddress,
    pub denom: Denom,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgConfirmBatch {
    pub orchestrator: AccAddress,
    pub token_contract: EthAddress,
    pub nonce: u64,
    /// Hex-encoded 65-byte signature over the batch checkpoint.
    pub signature: String,
}

/// Report events observed on the external chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSubmitClaims {
    pub orchestrator: AccAddress,
    pub claims: Vec<EthereumClaim>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Msg {
    SetEthAddress(MsgSetEthAddress),
    RequestValset(MsgRequestValset),
    ConfirmValset(MsgConfirmValset),
    SendToExternal(MsgSendToExternal),
    RequestBatch(MsgRequestBatch),
    ConfirmBatch(MsgConfirmBatch),
    SubmitClaims(MsgSubmitClaims),
}

impl Msg {
    pub fn message_type(&self) -> MessageType {
        match self {
            Msg::SetEthAddress(_) => MessageType::SetEthAddress,
            Msg::RequestValset(_) => MessageType::RequestValset,
            Msg::ConfirmValset(_) => MessageType::ConfirmValset,
            Msg::SendToExternal(_) => MessageType::SendToExternal,
            Msg::RequestBatch(_) => MessageType::RequestBatch,
            Msg::ConfirmBatch(_) => MessageType::ConfirmBatch,
            Msg::SubmitClaims(_) => MessageType::SubmitClaims,
        }
    }

    /// The account that signed the message.
    pub fn signer(&self) -> &AccAddress {
        match self {
            Msg::SetEthAddress(m) => &m.orchestrator,
            Msg::RequestValset(m) => &m.orchestrator,
            Msg::ConfirmValset(m) => &m.orchestrator,
            Msg::SendToExternal(m) => &m.sender,
            Msg::RequestBatch(m) => &m.orchestrator,
            Msg::ConfirmBatch(m) => &m.orchestrator,
            Msg::SubmitClaims(m) => &m.orchestrator,
        }
    }

    /// Checks that need no state.
    pub fn validate_basic(&self) -> Result<(), MsgError> {
        let signer = self.signer();
        if !signer.is_valid() {
            return Err(MsgError::InvalidAddress(signer.to_string()));
        }
        match self {
            Msg::SetEthAddress(m) => {
                if m.address.is_zero() {
                    return Err(MsgError::InvalidAddress(m.address.to_string()));
                }
            }
            Msg::RequestValset(_) => {}
            Msg::ConfirmValset(m) => require_signature(&m.signature)?,
            Msg::SendToExternal(m) => {
                if m.destination.is_zero() {
                    return Err(MsgError::InvalidAddress(m.destination.to_string()));
                }
                for coin in [&m.amount, &m.bridge_fee] {
                    if !coin.denom.is_valid() {
                        return Err(MsgError::InvalidDenom(coin.denom.to_string()));
                    }
                }
                if m.amount.denom != m.bridge_fee.denom {
                    return Err(MsgError::Invalid(format!(
                        "amount denom {} differs from fee denom {}",
                        m.amount.denom, m.bridge_fee.denom
                    )));
                }
                if m.amount.is_zero() {
                    return Err(MsgError::Invalid("amount must be positive".to_string()));
                }
            }
            Msg::RequestBatch(m) => {
                if !m.denom.is_valid() {
                    return Err(MsgError::InvalidDenom(m.denom.to_string()));
                }
            }
            Msg::ConfirmBatch(m) => require_signature(&m.signature)?,
            Msg::SubmitClaims(m) => {
                if m.claims.is_empty() {
                    return Err(MsgError::Invalid("no claims submitted".to_string()));
                }
                for claim in &m.claims {
                    if claim.event_nonce == 0 {
                        return Err(MsgError::Invalid("event nonce must be positive".to_string()));
                    }
                    if let ClaimDetails::Deposit {
                        cosmos_receiver, ..
                    } = &claim.details
                    {
                        if !cosmos_receiver.is_valid() {
                            return Err(MsgError::InvalidAddress(cosmos_receiver.to_string()));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

fn require_signature(signature: &str) -> Result<(), MsgError> {
    if signature.trim().is_empty() {
        return Err(MsgError::Invalid("empty signature".to_string()));
    }
    Ok(())
}

/// The result of a successfully delivered message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MsgResponse {
    EthAddressSet,
    ValsetRequested {
        nonce: u64,
    },
    ValsetConfirmed {
        /// Hex-encoded store key of the confirm.
        confirm_key: String,
    },
    TransferQueued {
        transfer_id: u64,
    },
    BatchCreated {
        nonce: u64,
        batch: OutgoingTxBatch,
    },
    BatchConfirmed {
        confirm_key: String,
    },
    ClaimsSubmitted {
        attestation_keys: Vec<Hash256>,
    },
}
