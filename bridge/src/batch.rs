//! Outgoing batches.
//!
//! A batch takes the highest-fee transfers of one token out of the pool. For
//! a fixed batch size the greedy pick by fee is the fee-maximizing one.

use crate::keys;
use crate::{Context, Keeper, PeggyError};
use peggy_crypto::batch_checkpoint;
use peggy_types::{
    Denom, EthAddress, Hash256, OutgoingTransferTx, OutgoingTx, OutgoingTxBatch,
};
use std::ops::ControlFlow;
use tracing::{debug, info};

impl Keeper {
    /// Build a batch from up to `max_elements` of the best-paying pool entries.
    ///
    /// The selected entries leave the pool, the token's batch nonce advances
    /// and the batch is stored, all or nothing.
    pub fn build_outgoing_tx_batch(
        &self,
        ctx: &Context<'_>,
        denom: &Denom,
        max_elements: usize,
    ) -> Result<OutgoingTxBatch, PeggyError> {
        if max_elements == 0 {
            return Err(PeggyError::InvalidRequest("batch size must be positive".into()));
        }
        let denominator = self
            .get_denominator(ctx, denom)?
            .ok_or_else(|| PeggyError::NotFound(format!("bridged denominator for {denom}")))?;

        let mut selected: Vec<(u64, OutgoingTx)> = Vec::new();
        self.iterate_outgoing_pool_by_fee(ctx, denom, |id, tx| {
            selected.push((id, tx.clone()));
            if selected.len() >= max_elements {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })?;
        if selected.is_empty() {
            return Err(PeggyError::EmptyBatch(denom.to_string()));
        }

        self.atomically(ctx, |ctx| {
            let mut total_fee: u128 = 0;
            let mut elements = Vec::with_capacity(selected.len());
            for (id, tx) in &selected {
                self.remove_pool_entry(ctx, *id, tx)?;
                total_fee = total_fee
                    .checked_add(tx.bridge_fee.amount)
                    .ok_or_else(|| PeggyError::Overflow("batch total fee".into()))?;
                elements.push(OutgoingTransferTx::from_pooled(*id, tx, &denominator));
            }
            let contract = denominator.token_contract;
            let nonce = self.next_sequence(ctx, &keys::batch_nonce_sequence(&contract))?;
            let batch = OutgoingTxBatch {
                nonce,
                elements,
                total_fee: denominator.to_erc20(total_fee),
                bridged_denominator: denominator.clone(),
                token_contract: contract,
                valset: self.current_valset(ctx)?,
            };
            self.put(ctx, &keys::batch_key(&contract, nonce), &batch)?;
            info!(
                height = ctx.height(),
                contract = %contract,
                nonce,
                elements = batch.len(),
                total_fee,
                "outgoing batch built"
            );
            Ok(batch)
        })
    }

    pub fn get_outgoing_tx_batch(
        &self,
        ctx: &Context<'_>,
        token_contract: &EthAddress,
        nonce: u64,
    ) -> Result<Option<OutgoingTxBatch>, PeggyError> {
        self.get(ctx, &keys::batch_key(token_contract, nonce))
    }

    /// Pending batches of one token, by ascending nonce.
    pub fn outgoing_tx_batches_for(
        &self,
        ctx: &Context<'_>,
        token_contract: &EthAddress,
    ) -> Result<Vec<OutgoingTxBatch>, PeggyError> {
        self.collect(ctx, &keys::batch_contract_prefix(token_contract))
    }

    /// Every pending batch, by contract then nonce.
    pub fn outgoing_tx_batches(
        &self,
        ctx: &Context<'_>,
    ) -> Result<Vec<OutgoingTxBatch>, PeggyError> {
        self.collect(ctx, &[keys::BATCH_PREFIX])
    }

    /// The nonce of the most recent batch built for a token (0 if none).
    pub fn last_batch_nonce(
        &self,
        ctx: &Context<'_>,
        token_contract: &EthAddress,
    ) -> Result<u64, PeggyError> {
        self.peek_sequence(ctx, &keys::batch_nonce_sequence(token_contract))
    }

    pub fn batch_checkpoint(&self, batch: &OutgoingTxBatch) -> Hash256 {
        batch_checkpoint(self.peggy_id(), batch)
    }

    /// Settle an executed batch.
    ///
    /// The batch and its confirms are deleted. Earlier batches of the same
    /// token can no longer execute, so they are cancelled and their transfers
    /// return to the pool. Later batches are untouched.
    pub fn outgoing_tx_batch_executed(
        &self,
        ctx: &Context<'_>,
        token_contract: &EthAddress,
        nonce: u64,
    ) -> Result<(), PeggyError> {
        if self.get_outgoing_tx_batch(ctx, token_contract, nonce)?.is_none() {
            return Err(PeggyError::NotFound(format!(
                "batch {nonce} for {token_contract}"
            )));
        }
        self.delete_batch(ctx, token_contract, nonce)?;
        info!(
            height = ctx.height(),
            contract = %token_contract,
            nonce,
            "outgoing batch executed"
        );

        for earlier in self.outgoing_tx_batches_for(ctx, token_contract)? {
            if earlier.nonce >= nonce {
                break;
            }
            self.cancel_outgoing_tx_batch(ctx, token_contract, earlier.nonce)?;
        }
        Ok(())
    }

    /// Return a batch's transfers to the pool with their original ids and
    /// delete the batch.
    pub fn cancel_outgoing_tx_batch(
        &self,
        ctx: &Context<'_>,
        token_contract: &EthAddress,
        nonce: u64,
    ) -> Result<(), PeggyError> {
        let batch = self
            .get_outgoing_tx_batch(ctx, token_contract, nonce)?
            .ok_or_else(|| PeggyError::NotFound(format!("batch {nonce} for {token_contract}")))?;
        for element in &batch.elements {
            let tx = element.to_pooled(&batch.bridged_denominator);
            self.insert_pool_entry(ctx, element.id, &tx)?;
        }
        self.delete_batch(ctx, token_contract, nonce)?;
        info!(
            height = ctx.height(),
            contract = %token_contract,
            nonce,
            released = batch.len(),
            "outgoing batch cancelled"
        );
        Ok(())
    }

    fn delete_batch(
        &self,
        ctx: &Context<'_>,
        token_contract: &EthAddress,
        nonce: u64,
    ) -> Result<(), PeggyError> {
        let store = ctx.store();
        store.delete(&keys::batch_key(token_contract, nonce))?;
        let confirms = store.scan_prefix(&keys::batch_confirm_prefix(token_contract, nonce))?;
        debug!(nonce, confirms = confirms.len(), "deleting batch confirms");
        for (key, _) in confirms {
            store.delete(&key)?;
        }
        Ok(())
    }
}
