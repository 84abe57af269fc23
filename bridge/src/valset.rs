//! Validator set snapshots.

use crate::keys;
use crate::{Context, Keeper, PeggyError};
use peggy_crypto::valset_checkpoint;
use peggy_types::{BridgeValidator, Hash256, Valset};
use tracing::{info, warn};

impl Keeper {
    /// Bonded validators that have registered an external address, in
    /// canonical order.
    pub fn current_members(&self, ctx: &Context<'_>) -> Result<Vec<BridgeValidator>, PeggyError> {
        let mut members = Vec::new();
        for (validator, power) in self.staking.bonded_validators() {
            if let Some(address) = self.get_eth_address(ctx, &validator)? {
                members.push(BridgeValidator::new(address, power));
            }
        }
        peggy_types::valset::sort_members(&mut members);
        Ok(members)
    }

    /// The current membership, labelled with the latest requested nonce
    /// (0 before the first request).
    pub fn current_valset(&self, ctx: &Context<'_>) -> Result<Valset, PeggyError> {
        let nonce = self.latest_valset_nonce(ctx)?;
        Ok(Valset::new(nonce, self.current_members(ctx)?))
    }

    /// Snapshot the current membership under the next valset nonce.
    pub fn set_valset_request(&self, ctx: &Context<'_>) -> Result<Valset, PeggyError> {
        let members = self.current_members(ctx)?;
        let nonce = self.next_sequence(ctx, keys::VALSET_NONCE_SEQUENCE)?;
        let valset = Valset::new(nonce, members);
        if valset.is_empty() {
            warn!(nonce, "valset requested with no registered external addresses");
        }
        self.put(ctx, &keys::valset_key(nonce), &valset)?;
        info!(
            height = ctx.height(),
            nonce,
            members = valset.len(),
            total_power = %valset.total_power(),
            "valset requested"
        );
        Ok(valset)
    }

    pub fn get_valset_request(
        &self,
        ctx: &Context<'_>,
        nonce: u64,
    ) -> Result<Option<Valset>, PeggyError> {
        self.get(ctx, &keys::valset_key(nonce))
    }

    /// Every requested valset, by ascending nonce.
    pub fn valset_requests(&self, ctx: &Context<'_>) -> Result<Vec<Valset>, PeggyError> {
        self.collect(ctx, &[keys::VALSET_PREFIX])
    }

    pub fn latest_valset_nonce(&self, ctx: &Context<'_>) -> Result<u64, PeggyError> {
        self.peek_sequence(ctx, keys::VALSET_NONCE_SEQUENCE)
    }

    pub fn valset_checkpoint(&self, valset: &Valset) -> Hash256 {
        valset_checkpoint(self.peggy_id(), valset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestBridge;

    #[test]
    fn only_validators_with_addresses_are_members() {
        let t = TestBridge::new(&[10, 30, 20]);
        let ctx = t.ctx();
        for v in &t.validators[..2] {
            t.keeper.set_eth_address(&ctx, &v.validator, v.key.address).unwrap();
        }
        let valset = t.keeper.set_valset_request(&ctx).unwrap();
        assert_eq!(valset.nonce, 1);
        let powers: Vec<u64> = valset.members.iter().map(|m| m.power).collect();
        assert_eq!(powers, vec![30, 10]);
    }

    #[test]
    fn nonces_increase_and_requests_are_stored() {
        let t = TestBridge::new(&[10]);
        t.register_eth_addresses();
        let ctx = t.ctx();
        assert_eq!(t.keeper.latest_valset_nonce(&ctx).unwrap(), 0);
        let a = t.keeper.set_valset_request(&ctx).unwrap();
        t.staking.set_power("val-0", 15);
        let b = t.keeper.set_valset_request(&ctx).unwrap();
        assert_eq!((a.nonce, b.nonce), (1, 2));
        assert_eq!(t.keeper.get_valset_request(&ctx, 1).unwrap(), Some(a.clone()));
        assert_eq!(t.keeper.valset_requests(&ctx).unwrap(), vec![a.clone(), b.clone()]);
        // earlier snapshot is immutable
        assert_eq!(a.members[0].power, 10);
        assert_eq!(b.members[0].power, 15);
    }

    #[test]
    fn checkpoint_is_deterministic_and_order_sensitive() {
        let t = TestBridge::new(&[10, 20]);
        t.register_eth_addresses();
        let ctx = t.ctx();
        let valset = t.keeper.set_valset_request(&ctx).unwrap();
        let stored = t.keeper.get_valset_request(&ctx, 1).unwrap().unwrap();
        assert_eq!(t.keeper.valset_checkpoint(&valset), t.keeper.valset_checkpoint(&stored));

        let mut reordered = valset.clone();
        reordered.members.reverse();
        assert_ne!(t.keeper.valset_checkpoint(&valset), t.keeper.valset_checkpoint(&reordered));
    }

    #[test]
    fn current_valset_uses_latest_nonce() {
        let t = TestBridge::new(&[10]);
        t.register_eth_addresses();
        let ctx = t.ctx();
        assert_eq!(t.keeper.current_valset(&ctx).unwrap().nonce, 0);
        t.keeper.set_valset_request(&ctx).unwrap();
        let current = t.keeper.current_valset(&ctx).unwrap();
        assert_eq!(current.nonce, 1);
        assert_eq!(current.len(), 1);
    }
}
