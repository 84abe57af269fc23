//! Validator identities and their registered external addresses.

use crate::keys;
use crate::{Context, Keeper, PeggyError};
use peggy_types::{AccAddress, EthAddress, ValAddress};
use tracing::info;

impl Keeper {
    /// Map a message submitter to its validator through the staking registry.
    pub fn resolve_validator(&self, orchestrator: &AccAddress) -> Result<ValAddress, PeggyError> {
        self.staking
            .validator_for_orchestrator(orchestrator)
            .ok_or_else(|| PeggyError::UnknownValidator(orchestrator.to_string()))
    }

    /// Bind `address` to `validator`, replacing any previous binding.
    ///
    /// Fails with `AddressInUse` if another validator already owns the address.
    pub fn set_eth_address(
        &self,
        ctx: &Context<'_>,
        validator: &ValAddress,
        address: EthAddress,
    ) -> Result<(), PeggyError> {
        if let Some(owner) = self.validator_by_eth_address(ctx, &address)? {
            if &owner != validator {
                return Err(PeggyError::AddressInUse { address, owner });
            }
        }
        if let Some(previous) = self.get_eth_address(ctx, validator)? {
            if previous != address {
                ctx.store().delete(&keys::eth_owner_key(&previous))?;
            }
        }
        self.put(ctx, &keys::eth_address_key(validator), &address)?;
        self.put(ctx, &keys::eth_owner_key(&address), validator)?;
        info!(
            height = ctx.height(),
            validator = %validator,
            address = %address,
            "external address bound"
        );
        Ok(())
    }

    pub fn get_eth_address(
        &self,
        ctx: &Context<'_>,
        validator: &ValAddress,
    ) -> Result<Option<EthAddress>, PeggyError> {
        self.get(ctx, &keys::eth_address_key(validator))
    }

    pub fn validator_by_eth_address(
        &self,
        ctx: &Context<'_>,
        address: &EthAddress,
    ) -> Result<Option<ValAddress>, PeggyError> {
        self.get(ctx, &keys::eth_owner_key(address))
    }
}
