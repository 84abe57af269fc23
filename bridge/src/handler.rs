//! Message dispatch.

use crate::{Context, Keeper, PeggyError};
use peggy_messages::{Msg, MsgResponse};
use tracing::{debug, warn};

impl Keeper {
    /// Validate and execute one message atomically.
    ///
    /// Either every write the message causes reaches `ctx`'s store or none
    /// does.
    pub fn deliver(&self, ctx: &Context<'_>, msg: &Msg) -> Result<MsgResponse, PeggyError> {
        let msg_type = msg.message_type();
        let result = msg
            .validate_basic()
            .map_err(PeggyError::from)
            .and_then(|()| self.atomically(ctx, |ctx| self.dispatch(ctx, msg)));
        match &result {
            Ok(_) => debug!(
                height = ctx.height(),
                %msg_type,
                signer = %msg.signer(),
                "message delivered"
            ),
            Err(e) => warn!(
                height = ctx.height(),
                %msg_type,
                signer = %msg.signer(),
                error = %e,
                "message rejected"
            ),
        }
        result
    }

    fn dispatch(&self, ctx: &Context<'_>, msg: &Msg) -> Result<MsgResponse, PeggyError> {
        match msg {
            Msg::SetEthAddress(m) => {
                let validator = self.resolve_validator(&m.orchestrator)?;
                self.set_eth_address(ctx, &validator, m.address)?;
                Ok(MsgResponse::EthAddressSet)
            }
            Msg::RequestValset(m) => {
                self.resolve_validator(&m.orchestrator)?;
                let valset = self.set_valset_request(ctx)?;
                Ok(MsgResponse::ValsetRequested {
                    nonce: valset.nonce,
                })
            }
            Msg::ConfirmValset(m) => {
                let validator = self.resolve_validator(&m.orchestrator)?;
                let key = self.confirm_valset(ctx, &validator, m.nonce, &m.signature)?;
                Ok(MsgResponse::ValsetConfirmed {
                    confirm_key: hex::encode(key),
                })
            }
            Msg::SendToExternal(m) => {
                let transfer_id = self.add_to_outgoing_pool(
                    ctx,
                    &m.sender,
                    m.destination,
                    m.amount.clone(),
                    m.bridge_fee.clone(),
                )?;
                Ok(MsgResponse::TransferQueued { transfer_id })
            }
            Msg::RequestBatch(m) => {
                self.resolve_validator(&m.orchestrator)?;
                let batch = self.build_outgoing_tx_batch(ctx, &m.denom, self.params().batch_size)?;
                Ok(MsgResponse::BatchCreated {
                    nonce: batch.nonce,
                    batch,
                })
            }
            Msg::ConfirmBatch(m) => {
                let validator = self.resolve_validator(&m.orchestrator)?;
                let key = self.confirm_batch(
                    ctx,
                    &validator,
                    m.token_contract,
                    m.nonce,
                    &m.signature,
                )?;
                Ok(MsgResponse::BatchConfirmed {
                    confirm_key: hex::encode(key),
                })
            }
            Msg::SubmitClaims(m) => {
                let validator = self.resolve_validator(&m.orchestrator)?;
                let mut attestation_keys = Vec::with_capacity(m.claims.len());
                for claim in &m.claims {
                    let attestation = self.add_claim(ctx, &validator, claim)?;
                    attestation_keys.push(attestation.key());
                }
                Ok(MsgResponse::ClaimsSubmitted { attestation_keys })
            }
        }
    }
}
