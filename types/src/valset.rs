//! Bridge validator sets.

use crate::EthAddress;
use serde::{Deserialize, Serialize};

/// A member of a bridge validator set: an external signing address and its power.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BridgeValidator {
    pub eth_address: EthAddress,
    pub power: u64,
}

impl BridgeValidator {
    pub fn new(eth_address: EthAddress, power: u64) -> Self {
        Self { eth_address, power }
    }
}

/// A snapshot of the bridge validator set at a point in time.
///
/// Members are kept in canonical order: descending power, ties broken by
/// ascending address. The checkpoint signed by validators depends on this order.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Valset {
    pub nonce: u64,
    pub members: Vec<BridgeValidator>,
}

impl Valset {
    /// Build a valset, sorting members into canonical order.
    pub fn new(nonce: u64, mut members: Vec<BridgeValidator>) -> Self {
        sort_members(&mut members);
        Self { nonce, members }
    }

    pub fn total_power(&self) -> u128 {
        self.members.iter().map(|m| m.power as u128).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }
}

/// Sort validators by descending power, then ascending address.
pub fn sort_members(members: &mut [BridgeValidator]) {
    members.sort_by(|a, b| {
        b.power
            .cmp(&a.power)
            .then_with(|| a.eth_address.cmp(&b.eth_address))
    });
}
