//! Checkpoints: the 32-byte digests validators sign so the external bridge
//! contract can verify valset updates and batches.

use alloy_primitives::{Address, FixedBytes, U256};
use alloy_sol_types::SolValue;

use crate::hash::keccak256;
use peggy_types::{EthAddress, Hash256, OutgoingTxBatch, Valset};

/// Method tags the bridge contract prepends to each checkpoint.
const VALSET_METHOD: &str = "checkpoint";
const BATCH_METHOD: &str = "transactionBatch";

fn method_tag(name: &str) -> FixedBytes<32> {
    bytes32(&Hash256::from_short_str(name).unwrap_or(Hash256::ZERO))
}

fn bytes32(hash: &Hash256) -> FixedBytes<32> {
    FixedBytes::new(*hash.as_bytes())
}

fn address(addr: &EthAddress) -> Address {
    Address::new(*addr.as_bytes())
}

/// `abi.encode(peggy_id, "checkpoint", nonce, addresses, powers)`.
///
/// Members are encoded in the valset's canonical order.
fn encode_valset(peggy_id: &Hash256, valset: &Valset) -> Vec<u8> {
    let addresses: Vec<Address> = valset
        .members
        .iter()
        .map(|m| address(&m.eth_address))
        .collect();
    let powers: Vec<U256> = valset
        .members
        .iter()
        .map(|m| U256::from(m.power))
        .collect();
    (
        bytes32(peggy_id),
        method_tag(VALSET_METHOD),
        U256::from(valset.nonce),
        addresses,
        powers,
    )
        .abi_encode_params()
}

/// `abi.encode(peggy_id, "transactionBatch", amounts, destinations, fees,
/// nonce, token_contract)`.
fn encode_batch(peggy_id: &Hash256, batch: &OutgoingTxBatch) -> Vec<u8> {
    let amounts: Vec<U256> = batch
        .elements
        .iter()
        .map(|e| U256::from(e.amount.amount))
        .collect();
    let destinations: Vec<Address> = batch
        .elements
        .iter()
        .map(|e| address(&e.dest_address))
        .collect();
    let fees: Vec<U256> = batch
        .elements
        .iter()
        .map(|e| U256::from(e.bridge_fee.amount))
        .collect();
    (
        bytes32(peggy_id),
        method_tag(BATCH_METHOD),
        amounts,
        destinations,
        fees,
        U256::from(batch.nonce),
        address(&batch.token_contract),
    )
        .abi_encode_params()
}

pub fn valset_checkpoint(peggy_id: &Hash256, valset: &Valset) -> Hash256 {
    Hash256::new(keccak256(&encode_valset(peggy_id, valset)))
}

pub fn batch_checkpoint(peggy_id: &Hash256, batch: &OutgoingTxBatch) -> Hash256 {
    Hash256::new(keccak256(&encode_batch(peggy_id, batch)))
}
