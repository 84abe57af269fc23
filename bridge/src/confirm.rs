//! Validator signatures over batches and valsets.
//!
//! A confirm is accepted once per validator and target, and only if the
//! signature recovers to the validator's registered external address.
//! Confirms are collected for relayers; they never trigger execution.

use crate::keys;
use crate::{Context, Keeper, PeggyError};
use peggy_crypto::decode_signature_hex;
use peggy_types::{BatchConfirm, EthAddress, Hash256, ValAddress, ValsetConfirm};
use tracing::info;

impl Keeper {
    fn registered_signer(
        &self,
        ctx: &Context<'_>,
        validator: &ValAddress,
    ) -> Result<EthAddress, PeggyError> {
        self.get_eth_address(ctx, validator)?
            .ok_or_else(|| PeggyError::UnknownAddress(validator.clone()))
    }

    fn verify_confirm(
        &self,
        checkpoint: &Hash256,
        signature_hex: &str,
        signer: &EthAddress,
    ) -> Result<Vec<u8>, PeggyError> {
        let signature = decode_signature_hex(signature_hex)?;
        self.verifier.verify(checkpoint, &signature, signer)?;
        Ok(signature)
    }

    /// Store a validator's signature over a batch; returns the confirm's key.
    pub fn confirm_batch(
        &self,
        ctx: &Context<'_>,
        validator: &ValAddress,
        token_contract: EthAddress,
        nonce: u64,
        signature_hex: &str,
    ) -> Result<Vec<u8>, PeggyError> {
        let signer = self.registered_signer(ctx, validator)?;
        let batch = self
            .get_outgoing_tx_batch(ctx, &token_contract, nonce)?
            .ok_or_else(|| PeggyError::NotFound(format!("batch {nonce} for {token_contract}")))?;
        let checkpoint = self.batch_checkpoint(&batch);
        let signature = self.verify_confirm(&checkpoint, signature_hex, &signer)?;

        let key = keys::batch_confirm_key(&token_contract, nonce, validator);
        if ctx.store().contains(&key)? {
            return Err(PeggyError::DuplicateSignature {
                validator: validator.clone(),
                target: format!("batch {nonce} for {token_contract}"),
            });
        }
        let confirm = BatchConfirm {
            token_contract,
            nonce,
            validator: validator.clone(),
            eth_signer: signer,
            signature,
        };
        self.put(ctx, &key, &confirm)?;
        info!(
            height = ctx.height(),
            validator = %validator,
            contract = %token_contract,
            nonce,
            "batch confirm stored"
        );
        Ok(key)
    }

    /// Store a validator's signature over a valset; returns the confirm's key.
    pub fn confirm_valset(
        &self,
        ctx: &Context<'_>,
        validator: &ValAddress,
        nonce: u64,
        signature_hex: &str,
    ) -> Result<Vec<u8>, PeggyError> {
        let signer = self.registered_signer(ctx, validator)?;
        let valset = self
            .get_valset_request(ctx, nonce)?
            .ok_or_else(|| PeggyError::NotFound(format!("valset {nonce}")))?;
        let checkpoint = self.valset_checkpoint(&valset);
        let signature = self.verify_confirm(&checkpoint, signature_hex, &signer)?;

        let key = keys::valset_confirm_key(nonce, validator);
        if ctx.store().contains(&key)? {
            return Err(PeggyError::DuplicateSignature {
                validator: validator.clone(),
                target: format!("valset {nonce}"),
            });
        }
        let confirm = ValsetConfirm {
            nonce,
            validator: validator.clone(),
            eth_signer: signer,
            signature,
        };
        self.put(ctx, &key, &confirm)?;
        info!(
            height = ctx.height(),
            validator = %validator,
            nonce,
            "valset confirm stored"
        );
        Ok(key)
    }

    pub fn get_batch_confirm(
        &self,
        ctx: &Context<'_>,
        token_contract: &EthAddress,
        nonce: u64,
        validator: &ValAddress,
    ) -> Result<Option<BatchConfirm>, PeggyError> {
        self.get(ctx, &keys::batch_confirm_key(token_contract, nonce, validator))
    }

    pub fn batch_confirms(
        &self,
        ctx: &Context<'_>,
        token_contract: &EthAddress,
        nonce: u64,
    ) -> Result<Vec<BatchConfirm>, PeggyError> {
        self.collect(ctx, &keys::batch_confirm_prefix(token_contract, nonce))
    }

    pub fn get_valset_confirm(
        &self,
        ctx: &Context<'_>,
        nonce: u64,
        validator: &ValAddress,
    ) -> Result<Option<ValsetConfirm>, PeggyError> {
        self.get(ctx, &keys::valset_confirm_key(nonce, validator))
    }

    pub fn valset_confirms(
        &self,
        ctx: &Context<'_>,
        nonce: u64,
    ) -> Result<Vec<ValsetConfirm>, PeggyError> {
        self.collect(ctx, &keys::valset_confirm_prefix(nonce))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{TestBridge, TOKEN_CONTRACT};
    use peggy_crypto::sign_checkpoint;
    use peggy_types::{AccAddress, Coin};

    fn with_valset() -> TestBridge {
        let t = TestBridge::new(&[10, 20]);
        t.register_eth_addresses();
        t.keeper.set_valset_request(&t.ctx()).unwrap();
        t
    }

    fn valset_sig(t: &TestBridge, signer: usize, nonce: u64) -> String {
        let valset = t.keeper.get_valset_request(&t.ctx(), nonce).unwrap().unwrap();
        let checkpoint = t.keeper.valset_checkpoint(&valset);
        hex::encode(sign_checkpoint(&checkpoint, &t.validators[signer].key.secret))
    }

    #[test]
    fn valid_valset_confirm_is_stored_once() {
        let t = with_valset();
        let ctx = t.ctx();
        let v = &t.validators[0];
        let sig = valset_sig(&t, 0, 1);
        let key = t.keeper.confirm_valset(&ctx, &v.validator, 1, &sig).unwrap();
        assert_eq!(key, keys::valset_confirm_key(1, &v.validator));

        let stored = t.keeper.get_valset_confirm(&ctx, 1, &v.validator).unwrap().unwrap();
        assert_eq!(stored.eth_signer, v.key.address);
        assert_eq!(t.keeper.valset_confirms(&ctx, 1).unwrap().len(), 1);

        let again = t.keeper.confirm_valset(&ctx, &v.validator, 1, &format!("0x{sig}"));
        assert!(matches!(again, Err(PeggyError::DuplicateSignature { .. })));
    }

    #[test]
    fn signature_from_another_key_is_rejected() {
        let t = with_valset();
        let ctx = t.ctx();
        // validator 0 submits validator 1's signature
        let sig = valset_sig(&t, 1, 1);
        let err = t
            .keeper
            .confirm_valset(&ctx, &t.validators[0].validator, 1, &sig)
            .unwrap_err();
        assert!(matches!(err, PeggyError::InvalidSignature(_)));
        assert!(t.keeper.valset_confirms(&ctx, 1).unwrap().is_empty());
    }

    #[test]
    fn malformed_hex_is_an_invalid_signature() {
        let t = with_valset();
        let err = t
            .keeper
            .confirm_valset(&t.ctx(), &t.validators[0].validator, 1, "not-hex")
            .unwrap_err();
        assert!(matches!(err, PeggyError::InvalidSignature(_)));
    }

    #[test]
    fn unknown_targets_and_addresses() {
        let t = with_valset();
        let ctx = t.ctx();
        let sig = valset_sig(&t, 0, 1);
        assert!(matches!(
            t.keeper.confirm_valset(&ctx, &t.validators[0].validator, 9, &sig),
            Err(PeggyError::NotFound(_))
        ));
        let stranger = ValAddress::new("val-unregistered");
        assert_eq!(
            t.keeper.confirm_valset(&ctx, &stranger, 1, &sig),
            Err(PeggyError::UnknownAddress(stranger.clone()))
        );
    }

    #[test]
    fn batch_confirms_are_listed_per_batch() {
        let t = with_valset();
        let ctx = t.ctx();
        let voucher = t.token().voucher_denom;
        let sender = AccAddress::new("sender");
        t.fund(&sender, Coin::new(voucher.clone(), 100));
        t.keeper
            .add_to_outgoing_pool(
                &ctx,
                &sender,
                EthAddress::new([9; 20]),
                Coin::new(voucher.clone(), 10),
                Coin::new(voucher.clone(), 1),
            )
            .unwrap();
        let batch = t.keeper.build_outgoing_tx_batch(&ctx, &voucher, 10).unwrap();
        let checkpoint = t.keeper.batch_checkpoint(&batch);

        for v in &t.validators {
            let sig = hex::encode(sign_checkpoint(&checkpoint, &v.key.secret));
            t.keeper
                .confirm_batch(&ctx, &v.validator, TOKEN_CONTRACT, batch.nonce, &sig)
                .unwrap();
        }
        let confirms = t.keeper.batch_confirms(&ctx, &TOKEN_CONTRACT, batch.nonce).unwrap();
        assert_eq!(confirms.len(), 2);
        assert!(t
            .keeper
            .get_batch_confirm(&ctx, &TOKEN_CONTRACT, batch.nonce, &t.validators[1].validator)
            .unwrap()
            .is_some());

        // confirms go away with the executed batch
        t.keeper
            .outgoing_tx_batch_executed(&ctx, &TOKEN_CONTRACT, batch.nonce)
            .unwrap();
        assert!(t.keeper.batch_confirms(&ctx, &TOKEN_CONTRACT, batch.nonce).unwrap().is_empty());
    }
}
