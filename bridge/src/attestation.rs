//! Claims and attestations.
//!
//! Validators report external-chain events as claims. Claims with the same
//! event nonce and identical details aggregate into one attestation. When the
//! claimants' power exceeds the threshold the attestation is observed, and its
//! effect is applied exactly once, in event-nonce order:
//!
//! - the attestation for `last_applied + 1` is applied at once, followed by
//!   any already-observed successors;
//! - an observed attestation for a later nonce waits in the observed queue
//!   until the gap closes;
//! - the first attestation observed for a nonce owns that nonce. Conflicting
//!   attestations and attestations at or below the last applied nonce still
//!   collect claims but are never applied.
//!
//! An effect runs in its own write buffer. If it fails its writes are dropped
//! and the failure is recorded on the attestation; the claim still succeeds
//! so the nonce sequence keeps moving.

use crate::keys;
use crate::{Context, Keeper, PeggyError, MODULE_NAME};
use peggy_store::CacheStore;
use peggy_types::{
    Attestation, AttestationStatus, BridgeBootstrap, ClaimDetails, EffectOutcome, EthereumClaim,
    Hash256, ValAddress,
};
use tracing::{debug, info, warn};

impl Keeper {
    /// Record `validator`'s claim and apply any effects it unlocks. Returns
    /// the attestation as stored after processing.
    pub fn add_claim(
        &self,
        ctx: &Context<'_>,
        validator: &ValAddress,
        claim: &EthereumClaim,
    ) -> Result<Attestation, PeggyError> {
        if self.staking.validator_power(validator).is_none() {
            return Err(PeggyError::UnknownValidator(validator.to_string()));
        }
        if claim.event_nonce == 0 {
            return Err(PeggyError::InvalidRequest("event nonce must be positive".into()));
        }

        let hash = claim.attestation_key();
        let store_key = keys::attestation_key(claim.event_nonce, &hash);
        let mut attestation = self
            .get::<Attestation>(ctx, &store_key)?
            .unwrap_or_else(|| Attestation::new(claim.event_nonce, claim.details.clone()));
        if attestation.has_vote(validator) {
            return Err(PeggyError::DuplicateClaim {
                validator: validator.clone(),
                event_nonce: claim.event_nonce,
            });
        }
        attestation.votes.push(validator.clone());
        attestation.tally = self.tally(&attestation.votes);
        debug!(
            event_nonce = claim.event_nonce,
            claim_type = %claim.claim_type(),
            validator = %validator,
            tally = %attestation.tally,
            "claim recorded"
        );

        if attestation.status == AttestationStatus::Pending {
            let total = self.staking.total_power();
            if self.params().exceeds_threshold(attestation.tally, total) {
                attestation.status = AttestationStatus::Observed;
                info!(
                    height = ctx.height(),
                    event_nonce = claim.event_nonce,
                    claim_type = %claim.claim_type(),
                    tally = %attestation.tally,
                    total_power = %total,
                    "attestation observed"
                );
                self.enqueue_observed(ctx, claim.event_nonce, &hash)?;
            }
        }
        self.put(ctx, &store_key, &attestation)?;

        self.process_observed_queue(ctx)?;
        self.get::<Attestation>(ctx, &store_key)?
            .ok_or_else(|| PeggyError::NotFound(format!("attestation {hash}")))
    }

    /// Combined current power of the claimants. Unbonded claimants count 0.
    fn tally(&self, votes: &[ValAddress]) -> u128 {
        votes
            .iter()
            .filter_map(|v| self.staking.validator_power(v))
            .map(|p| p as u128)
            .sum()
    }

    fn enqueue_observed(
        &self,
        ctx: &Context<'_>,
        event_nonce: u64,
        hash: &Hash256,
    ) -> Result<(), PeggyError> {
        let last_applied = self.last_applied_event_nonce(ctx)?;
        if event_nonce <= last_applied {
            warn!(
                event_nonce,
                last_applied, "attestation observed for an already applied nonce; not applied"
            );
            return Ok(());
        }
        let slot = keys::observed_queue_key(event_nonce);
        if let Some(owner) = self.get::<Hash256>(ctx, &slot)? {
            warn!(
                event_nonce,
                owner = %owner,
                conflicting = %hash,
                "conflicting attestation observed; not applied"
            );
            return Ok(());
        }
        self.put(ctx, &slot, hash)
    }

    /// Apply queued attestations for consecutive nonces after the last
    /// applied one.
    fn process_observed_queue(&self, ctx: &Context<'_>) -> Result<(), PeggyError> {
        loop {
            let last_applied = self.last_applied_event_nonce(ctx)?;
            let next = last_applied
                .checked_add(1)
                .ok_or_else(|| PeggyError::Overflow("event nonce".into()))?;
            let slot = keys::observed_queue_key(next);
            let Some(hash) = self.get::<Hash256>(ctx, &slot)? else {
                if let Some(waiting) = self.first_queued_nonce(ctx)? {
                    debug!(next, waiting, "observed attestations waiting for earlier nonces");
                }
                return Ok(());
            };

            let store_key = keys::attestation_key(next, &hash);
            let mut attestation = self
                .get::<Attestation>(ctx, &store_key)?
                .ok_or_else(|| PeggyError::NotFound(format!("attestation {hash}")))?;
            let outcome = self.apply_effect(ctx, &attestation);
            attestation.status = AttestationStatus::Processed;
            attestation.outcome = Some(outcome);
            self.put(ctx, &store_key, &attestation)?;
            ctx.store().delete(&slot)?;
            self.set_meta_u64(ctx, keys::LAST_APPLIED_EVENT_NONCE, next)?;
        }
    }

    fn first_queued_nonce(&self, ctx: &Context<'_>) -> Result<Option<u64>, PeggyError> {
        let mut first = None;
        ctx.store()
            .for_each_prefix(&[keys::OBSERVED_QUEUE_PREFIX], &mut |key, _| {
                first = key
                    .get(1..9)
                    .and_then(|b| b.try_into().ok())
                    .map(u64::from_be_bytes);
                std::ops::ControlFlow::Break(())
            })?;
        Ok(first)
    }

    /// Run the event's effect in a nested write buffer.
    fn apply_effect(&self, ctx: &Context<'_>, attestation: &Attestation) -> EffectOutcome {
        let cache = CacheStore::new(ctx.store());
        let result = self.run_effect(&ctx.with_store(&cache), attestation);
        let result = result.and_then(|()| cache.write().map_err(PeggyError::from));
        match result {
            Ok(()) => {
                info!(
                    height = ctx.height(),
                    event_nonce = attestation.event_nonce,
                    claim_type = %attestation.claim_type,
                    "attestation applied"
                );
                EffectOutcome::Applied
            }
            Err(e) => {
                warn!(
                    height = ctx.height(),
                    event_nonce = attestation.event_nonce,
                    claim_type = %attestation.claim_type,
                    error = %e,
                    "attestation effect failed; writes discarded"
                );
                EffectOutcome::Failed(e.to_string())
            }
        }
    }

    fn run_effect(&self, ctx: &Context<'_>, attestation: &Attestation) -> Result<(), PeggyError> {
        match &attestation.details {
            ClaimDetails::Deposit {
                erc20_token,
                cosmos_receiver,
                ..
            } => {
                let denominator =
                    self.register_token(ctx, erc20_token.contract, &erc20_token.symbol)?;
                let coins = [denominator.to_voucher_coin(erc20_token.amount)];
                self.bank.mint(ctx.store(), MODULE_NAME, &coins)?;
                self.bank
                    .send_from_module(ctx.store(), MODULE_NAME, cosmos_receiver, &coins)?;
                Ok(())
            }
            ClaimDetails::WithdrawalBatch {
                token_contract,
                batch_nonce,
            } => self.outgoing_tx_batch_executed(ctx, token_contract, *batch_nonce),
            ClaimDetails::ValsetUpdated { valset_nonce } => {
                let last = self.last_observed_valset_nonce(ctx)?;
                if *valset_nonce <= last && last != 0 {
                    return Err(PeggyError::InvalidRequest(format!(
                        "valset nonce {valset_nonce} is not after observed nonce {last}"
                    )));
                }
                self.set_meta_u64(ctx, keys::LAST_OBSERVED_VALSET_NONCE, *valset_nonce)
            }
            ClaimDetails::Bootstrap {
                peggy_id,
                start_threshold,
                validators,
            } => {
                if self.bootstrap(ctx)?.is_some() {
                    return Err(PeggyError::InvalidRequest("bridge already bootstrapped".into()));
                }
                let bootstrap = BridgeBootstrap {
                    event_nonce: attestation.event_nonce,
                    peggy_id: *peggy_id,
                    start_threshold: *start_threshold,
                    validators: validators.clone(),
                };
                self.put(ctx, &keys::meta_key(keys::BOOTSTRAP), &bootstrap)
            }
        }
    }

    pub fn get_attestation(
        &self,
        ctx: &Context<'_>,
        event_nonce: u64,
        details: &ClaimDetails,
    ) -> Result<Option<Attestation>, PeggyError> {
        let hash = peggy_types::attestation_key(event_nonce, details);
        self.get(ctx, &keys::attestation_key(event_nonce, &hash))
    }

    /// Every attestation recorded for an event nonce, by key.
    pub fn attestations_at(
        &self,
        ctx: &Context<'_>,
        event_nonce: u64,
    ) -> Result<Vec<Attestation>, PeggyError> {
        self.collect(ctx, &keys::attestation_nonce_prefix(event_nonce))
    }

    pub fn last_applied_event_nonce(&self, ctx: &Context<'_>) -> Result<u64, PeggyError> {
        self.get_meta_u64(ctx, keys::LAST_APPLIED_EVENT_NONCE)
    }

    pub fn last_observed_valset_nonce(&self, ctx: &Context<'_>) -> Result<u64, PeggyError> {
        self.get_meta_u64(ctx, keys::LAST_OBSERVED_VALSET_NONCE)
    }

    pub fn bootstrap(&self, ctx: &Context<'_>) -> Result<Option<BridgeBootstrap>, PeggyError> {
        self.get(ctx, &keys::meta_key(keys::BOOTSTRAP))
    }

    /// Observed attestations waiting for earlier nonces, as `(nonce, key)`.
    pub fn observed_queue(&self, ctx: &Context<'_>) -> Result<Vec<(u64, Hash256)>, PeggyError> {
        ctx.store()
            .scan_prefix(&[keys::OBSERVED_QUEUE_PREFIX])?
            .into_iter()
            .map(|(k, v)| -> Result<(u64, Hash256), PeggyError> {
                let nonce = k
                    .get(1..9)
                    .and_then(|b| b.try_into().ok())
                    .map(u64::from_be_bytes)
                    .ok_or_else(|| PeggyError::Serialization("malformed queue key".into()))?;
                Ok((nonce, peggy_store::decode(&v)?))
            })
            .collect()
    }
}
