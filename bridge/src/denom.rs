//! Bridged denominators: which voucher denomination stands for which token.

use crate::keys;
use crate::{Context, Keeper, PeggyError};
use peggy_types::{BridgedDenominator, Denom, EthAddress};
use tracing::info;

impl Keeper {
    /// Look up the token behind a voucher denomination.
    pub fn get_denominator(
        &self,
        ctx: &Context<'_>,
        voucher: &Denom,
    ) -> Result<Option<BridgedDenominator>, PeggyError> {
        self.get(ctx, &keys::denominator_key(voucher))
    }

    /// Store the denominator for `(contract, symbol)` if it is not known yet,
    /// and return it.
    pub fn register_token(
        &self,
        ctx: &Context<'_>,
        token_contract: EthAddress,
        symbol: &str,
    ) -> Result<BridgedDenominator, PeggyError> {
        let denominator = BridgedDenominator::new(token_contract, symbol);
        match self.get_denominator(ctx, &denominator.voucher_denom)? {
            Some(existing) if existing == denominator => Ok(existing),
            Some(existing) => Err(PeggyError::InvalidRequest(format!(
                "voucher denomination {} already stands for {}/{}",
                existing.voucher_denom, existing.token_contract, existing.symbol
            ))),
            None => {
                self.put(
                    ctx,
                    &keys::denominator_key(&denominator.voucher_denom),
                    &denominator,
                )?;
                info!(
                    height = ctx.height(),
                    contract = %token_contract,
                    symbol,
                    voucher = %denominator.voucher_denom,
                    "token registered"
                );
                Ok(denominator)
            }
        }
    }

    /// Every registered denominator, ordered by voucher denomination.
    pub fn denominators(&self, ctx: &Context<'_>) -> Result<Vec<BridgedDenominator>, PeggyError> {
        self.collect(ctx, &[keys::DENOMINATOR_PREFIX])
    }
}
