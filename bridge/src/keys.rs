//! Store key layout.
//!
//! Every key starts with a one-byte prefix. Integers are big-endian so that
//! lexical order is numeric order.

use peggy_types::{Denom, EthAddress, Hash256, ValAddress};

pub const ETH_ADDRESS_PREFIX: u8 = 0x01;
pub const ETH_OWNER_PREFIX: u8 = 0x02;
pub const VALSET_PREFIX: u8 = 0x03;
pub const VALSET_CONFIRM_PREFIX: u8 = 0x04;
pub const POOL_PREFIX: u8 = 0x05;
pub const BATCH_PREFIX: u8 = 0x06;
pub const BATCH_CONFIRM_PREFIX: u8 = 0x07;
pub const DENOMINATOR_PREFIX: u8 = 0x08;
pub const ATTESTATION_PREFIX: u8 = 0x09;
pub const OBSERVED_QUEUE_PREFIX: u8 = 0x0a;
pub const SEQUENCE_PREFIX: u8 = 0x0b;
pub const META_PREFIX: u8 = 0x0c;

// Sequence names.
pub const TRANSFER_ID_SEQUENCE: &[u8] = b"transfer_id";
pub const VALSET_NONCE_SEQUENCE: &[u8] = b"valset_nonce";

// Meta names.
pub const LAST_APPLIED_EVENT_NONCE: &[u8] = b"last_applied_event_nonce";
pub const LAST_OBSERVED_VALSET_NONCE: &[u8] = b"last_observed_valset_nonce";
pub const BOOTSTRAP: &[u8] = b"bootstrap";

fn with_prefix(prefix: u8, capacity: usize) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + capacity);
    key.push(prefix);
    key
}

pub fn eth_address_key(validator: &ValAddress) -> Vec<u8> {
    let mut key = with_prefix(ETH_ADDRESS_PREFIX, validator.as_bytes().len());
    key.extend_from_slice(validator.as_bytes());
    key
}

pub fn eth_owner_key(address: &EthAddress) -> Vec<u8> {
    let mut key = with_prefix(ETH_OWNER_PREFIX, 20);
    key.extend_from_slice(address.as_bytes());
    key
}

pub fn valset_key(nonce: u64) -> Vec<u8> {
    let mut key = with_prefix(VALSET_PREFIX, 8);
    key.extend_from_slice(&nonce.to_be_bytes());
    key
}

pub fn valset_confirm_prefix(nonce: u64) -> Vec<u8> {
    let mut key = with_prefix(VALSET_CONFIRM_PREFIX, 8);
    key.extend_from_slice(&nonce.to_be_bytes());
    key
}

pub fn valset_confirm_key(nonce: u64, validator: &ValAddress) -> Vec<u8> {
    let mut key = valset_confirm_prefix(nonce);
    key.extend_from_slice(validator.as_bytes());
    key
}

/// All pool entries of one denomination.
pub fn pool_denom_prefix(denom: &Denom) -> Vec<u8> {
    let bytes = denom.as_bytes();
    let mut key = with_prefix(POOL_PREFIX, 1 + bytes.len());
    // Denominations are at most Denom::MAX_LEN (< 256) bytes.
    key.push(bytes.len() as u8);
    key.extend_from_slice(bytes);
    key
}

/// Pool entries sort by descending fee, then ascending id.
pub fn pool_key(denom: &Denom, fee: u128, id: u64) -> Vec<u8> {
    let mut key = pool_denom_prefix(denom);
    key.extend_from_slice(&(u128::MAX - fee).to_be_bytes());
    key.extend_from_slice(&id.to_be_bytes());
    key
}

/// The transfer id is the last 8 bytes of a pool key.
pub fn pool_key_id(key: &[u8]) -> Option<u64> {
    let start = key.len().checked_sub(8)?;
    let bytes: [u8; 8] = key[start..].try_into().ok()?;
    Some(u64::from_be_bytes(bytes))
}

pub fn batch_contract_prefix(contract: &EthAddress) -> Vec<u8> {
    let mut key = with_prefix(BATCH_PREFIX, 20);
    key.extend_from_slice(contract.as_bytes());
    key
}

pub fn batch_key(contract: &EthAddress, nonce: u64) -> Vec<u8> {
    let mut key = batch_contract_prefix(contract);
    key.extend_from_slice(&nonce.to_be_bytes());
    key
}

pub fn batch_confirm_prefix(contract: &EthAddress, nonce: u64) -> Vec<u8> {
    let mut key = with_prefix(BATCH_CONFIRM_PREFIX, 28);
    key.extend_from_slice(contract.as_bytes());
    key.extend_from_slice(&nonce.to_be_bytes());
    key
}

pub fn batch_confirm_key(contract: &EthAddress, nonce: u64, validator: &ValAddress) -> Vec<u8> {
    let mut key = batch_confirm_prefix(contract, nonce);
    key.extend_from_slice(validator.as_bytes());
    key
}

pub fn batch_nonce_sequence(contract: &EthAddress) -> Vec<u8> {
    let mut name = b"batch_nonce/".to_vec();
    name.extend_from_slice(contract.as_bytes());
    name
}

pub fn denominator_key(voucher: &Denom) -> Vec<u8> {
    let mut key = with_prefix(DENOMINATOR_PREFIX, voucher.as_bytes().len());
    key.extend_from_slice(voucher.as_bytes());
    key
}

pub fn attestation_nonce_prefix(event_nonce: u64) -> Vec<u8> {
    let mut key = with_prefix(ATTESTATION_PREFIX, 40);
    key.extend_from_slice(&event_nonce.to_be_bytes());
    key
}

pub fn attestation_key(event_nonce: u64, hash: &Hash256) -> Vec<u8> {
    let mut key = attestation_nonce_prefix(event_nonce);
    key.extend_from_slice(hash.as_bytes());
    key
}

pub fn observed_queue_key(event_nonce: u64) -> Vec<u8> {
    let mut key = with_prefix(OBSERVED_QUEUE_PREFIX, 8);
    key.extend_from_slice(&event_nonce.to_be_bytes());
    key
}

pub fn sequence_key(name: &[u8]) -> Vec<u8> {
    let mut key = with_prefix(SEQUENCE_PREFIX, name.len());
    key.extend_from_slice(name);
    key
}

pub fn meta_key(name: &[u8]) -> Vec<u8> {
    let mut key = with_prefix(META_PREFIX, name.len());
    key.extend_from_slice(name);
    key
}
