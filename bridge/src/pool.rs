//! The outgoing transfer pool.
//!
//! Unbatched transfers are indexed by voucher denomination and descending fee,
//! with the transfer id as tie-break, so a prefix scan yields them in the
//! order the batch builder wants.

use crate::keys;
use crate::{Context, Keeper, PeggyError, MODULE_NAME};
use peggy_types::{AccAddress, Coin, Denom, EthAddress, OutgoingTx};
use std::ops::ControlFlow;
use tracing::info;

impl Keeper {
    /// Lock `amount + bridge_fee` from the sender and queue the transfer.
    /// Returns the transfer id.
    pub fn add_to_outgoing_pool(
        &self,
        ctx: &Context<'_>,
        sender: &AccAddress,
        dest_address: EthAddress,
        amount: Coin,
        bridge_fee: Coin,
    ) -> Result<u64, PeggyError> {
        if amount.denom != bridge_fee.denom {
            return Err(PeggyError::InvalidRequest(format!(
                "amount denom {} differs from fee denom {}",
                amount.denom, bridge_fee.denom
            )));
        }
        if amount.is_zero() {
            return Err(PeggyError::InvalidRequest("amount must be positive".into()));
        }
        if self.get_denominator(ctx, &amount.denom)?.is_none() {
            return Err(PeggyError::NotFound(format!(
                "bridged denominator for {}",
                amount.denom
            )));
        }
        let total = amount
            .amount
            .checked_add(bridge_fee.amount)
            .ok_or_else(|| PeggyError::Overflow("amount plus fee".into()))?;

        self.atomically(ctx, |ctx| {
            let locked = [Coin::new(amount.denom.clone(), total)];
            self.bank
                .send_to_module(ctx.store(), sender, MODULE_NAME, &locked)?;
            self.bank.burn(ctx.store(), MODULE_NAME, &locked)?;

            let id = self.next_sequence(ctx, keys::TRANSFER_ID_SEQUENCE)?;
            let tx = OutgoingTx {
                sender: sender.clone(),
                dest_address,
                amount: amount.clone(),
                bridge_fee: bridge_fee.clone(),
            };
            self.insert_pool_entry(ctx, id, &tx)?;
            info!(
                height = ctx.height(),
                id,
                sender = %sender,
                dest = %dest_address,
                amount = %amount,
                fee = bridge_fee.amount,
                "transfer added to outgoing pool"
            );
            Ok(id)
        })
    }

    /// Visit unbatched transfers of `denom` from highest to lowest fee (ties
    /// in id order) until the visitor breaks. Read-only.
    pub fn iterate_outgoing_pool_by_fee(
        &self,
        ctx: &Context<'_>,
        denom: &Denom,
        mut visit: impl FnMut(u64, &OutgoingTx) -> ControlFlow<()>,
    ) -> Result<(), PeggyError> {
        let mut failure = None;
        ctx.store()
            .for_each_prefix(&keys::pool_denom_prefix(denom), &mut |key, value| {
                let entry = keys::pool_key_id(key)
                    .ok_or_else(|| PeggyError::Serialization("malformed pool key".into()))
                    .and_then(|id| Ok((id, peggy_store::decode::<OutgoingTx>(value)?)));
                match entry {
                    Ok((id, tx)) => visit(id, &tx),
                    Err(e) => {
                        failure = Some(e);
                        ControlFlow::Break(())
                    }
                }
            })?;
        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// All unbatched transfers of `denom` in fee order.
    pub fn pool_transactions(
        &self,
        ctx: &Context<'_>,
        denom: &Denom,
    ) -> Result<Vec<(u64, OutgoingTx)>, PeggyError> {
        let mut out = Vec::new();
        self.iterate_outgoing_pool_by_fee(ctx, denom, |id, tx| {
            out.push((id, tx.clone()));
            ControlFlow::Continue(())
        })?;
        Ok(out)
    }

    pub(crate) fn insert_pool_entry(
        &self,
        ctx: &Context<'_>,
        id: u64,
        tx: &OutgoingTx,
    ) -> Result<(), PeggyError> {
        let key = keys::pool_key(&tx.amount.denom, tx.bridge_fee.amount, id);
        self.put(ctx, &key, tx)
    }

    pub(crate) fn remove_pool_entry(
        &self,
        ctx: &Context<'_>,
        id: u64,
        tx: &OutgoingTx,
    ) -> Result<(), PeggyError> {
        let key = keys::pool_key(&tx.amount.denom, tx.bridge_fee.amount, id);
        Ok(ctx.store().delete(&key)?)
    }
}
