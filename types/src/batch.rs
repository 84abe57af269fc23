//! Outgoing transfers and the batches they are settled in.

use crate::{AccAddress, BridgedDenominator, Coin, Erc20Token, EthAddress, Valset};
use serde::{Deserialize, Serialize};

/// A pending transfer to the external chain, waiting in the pool.
///
/// `amount` and `bridge_fee` are always in the same voucher denomination.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingTx {
    pub sender: AccAddress,
    pub dest_address: EthAddress,
    pub amount: Coin,
    pub bridge_fee: Coin,
}

/// A transfer that has been assigned to a batch, expressed in external tokens.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingTransferTx {
    pub id: u64,
    pub sender: AccAddress,
    pub dest_address: EthAddress,
    pub amount: Erc20Token,
    pub bridge_fee: Erc20Token,
}

impl OutgoingTransferTx {
    /// Convert a pooled transfer into its batched form.
    pub fn from_pooled(id: u64, tx: &OutgoingTx, denominator: &BridgedDenominator) -> Self {
        Self {
            id,
            sender: tx.sender.clone(),
            dest_address: tx.dest_address,
            amount: denominator.to_erc20(tx.amount.amount),
            bridge_fee: denominator.to_erc20(tx.bridge_fee.amount),
        }
    }

    /// Convert back into a pool entry (used when a batch is cancelled).
    pub fn to_pooled(&self, denominator: &BridgedDenominator) -> OutgoingTx {
        OutgoingTx {
            sender: self.sender.clone(),
            dest_address: self.dest_address,
            amount: denominator.to_voucher_coin(self.amount.amount),
            bridge_fee: denominator.to_voucher_coin(self.bridge_fee.amount),
        }
    }
}

/// An immutable settlement batch for one token contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingTxBatch {
    pub nonce: u64,
    pub elements: Vec<OutgoingTransferTx>,
    pub total_fee: Erc20Token,
    pub bridged_denominator: BridgedDenominator,
    pub token_contract: EthAddress,
    pub valset: Valset,
}

impl OutgoingTxBatch {
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn element_ids(&self) -> Vec<u64> {
        self.elements.iter().map(|e| e.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pooled_roundtrip_through_batch_form() {
        let denominator = BridgedDenominator::new(EthAddress::new([9; 20]), "TKN");
        let tx = OutgoingTx {
            sender: AccAddress::new("peggy1alice"),
            dest_address: EthAddress::new([1; 20]),
            amount: denominator.to_voucher_coin(100),
            bridge_fee: denominator.to_voucher_coin(3),
        };
        let batched = OutgoingTransferTx::from_pooled(7, &tx, &denominator);
        assert_eq!(batched.id, 7);
        assert_eq!(batched.amount.amount, 100);
        assert_eq!(batched.bridge_fee.contract, denominator.token_contract);
        assert_eq!(batched.to_pooled(&denominator), tx);
    }
}
