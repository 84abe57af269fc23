//! The bridge application: a store, the keeper over it, and the current
//! block height.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use peggy_bridge::{Context, Keeper};
use peggy_crypto::EthereumVerifier;
use peggy_messages::{Msg, MsgResponse};
use peggy_store::{
    get_typed, put_typed, KvBank, KvStore, StakingKeeper, StaticStaking, ValidatorRecord,
};
use peggy_types::{BridgeBootstrap, BridgeParams, BridgedDenominator};

use crate::config::NodeConfig;
use crate::metrics::NodeMetrics;
use crate::tracing_spans::{block_span, deliver_span};
use crate::NodeError;

/// Store key of the last begun block height. Outside every bridge and bank
/// prefix.
const HEIGHT_KEY: &[u8] = b"\xf0height";

pub struct BridgeApp<S: KvStore> {
    store: S,
    keeper: Keeper,
    staking: Arc<StaticStaking>,
    height: u64,
    metrics: NodeMetrics,
}

impl<S: KvStore> BridgeApp<S> {
    /// Build the app over `store` with a fixed genesis validator set. The
    /// height resumes from the store.
    pub fn new(
        store: S,
        params: BridgeParams,
        validators: Vec<ValidatorRecord>,
    ) -> Result<Self, NodeError> {
        let staking = Arc::new(StaticStaking::new(validators));
        if staking.bonded_validators().is_empty() {
            warn!("no bonded validators in genesis; no claim can reach quorum");
        }
        let keeper = Keeper::new(
            params,
            Arc::new(KvBank::new()),
            staking.clone(),
            Arc::new(EthereumVerifier::new()),
        )?;
        let height = get_typed::<u64>(&store, HEIGHT_KEY)?.unwrap_or(0);
        let metrics = NodeMetrics::new()?;
        metrics.block_height.set(height as i64);
        info!(
            height,
            validators = staking.len(),
            total_power = %staking.total_power(),
            peggy_id = %keeper.params().peggy_id,
            "bridge app ready"
        );
        Ok(Self {
            store,
            keeper,
            staking,
            height,
            metrics,
        })
    }

    pub fn from_config(config: &NodeConfig, store: S) -> Result<Self, NodeError> {
        config.validate()?;
        Self::new(store, config.params.clone(), config.validators.clone())
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn keeper(&self) -> &Keeper {
        &self.keeper
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn metrics(&self) -> &NodeMetrics {
        &self.metrics
    }

    /// A read context at the current height.
    pub fn context(&self) -> Context<'_> {
        Context::new(&self.store, self.height)
    }

    /// Move to `height`. Heights never go backwards; repeating the current
    /// height is allowed.
    pub fn begin_block(&mut self, height: u64) -> Result<(), NodeError> {
        if height < self.height {
            return Err(NodeError::HeightRegression {
                requested: height,
                current: self.height,
            });
        }
        if height > self.height {
            let _span = block_span(height).entered();
            put_typed(&self.store, HEIGHT_KEY, &height)?;
            debug!(previous = self.height, "block begun");
            self.height = height;
            self.metrics.block_height.set(height as i64);
        }
        Ok(())
    }

    /// Deliver one message at the current height.
    pub fn deliver(&mut self, msg: &Msg) -> Result<MsgResponse, NodeError> {
        let msg_type = msg.message_type();
        let span = deliver_span(msg_type.as_str(), self.height);
        let _guard = span.enter();
        let result = self
            .keeper
            .deliver(&Context::new(&self.store, self.height), msg);
        self.metrics.record_delivery(msg_type, result.is_ok());
        Ok(result?)
    }

    /// A summary of bridge state for operators.
    pub fn status(&self) -> Result<AppStatus, NodeError> {
        let ctx = self.context();
        let keeper = &self.keeper;
        let mut tokens = Vec::new();
        for denominator in keeper.denominators(&ctx)? {
            let contract = denominator.token_contract;
            tokens.push(TokenStatus {
                pooled_transfers: keeper
                    .pool_transactions(&ctx, &denominator.voucher_denom)?
                    .len(),
                pending_batches: keeper
                    .outgoing_tx_batches_for(&ctx, &contract)?
                    .iter()
                    .map(|b| b.nonce)
                    .collect(),
                last_batch_nonce: keeper.last_batch_nonce(&ctx, &contract)?,
                denominator,
            });
        }
        Ok(AppStatus {
            height: self.height,
            peggy_id: keeper.params().peggy_id.clone(),
            bonded_validators: self.staking.bonded_validators().len(),
            total_power: self.staking.total_power(),
            last_applied_event_nonce: keeper.last_applied_event_nonce(&ctx)?,
            last_observed_valset_nonce: keeper.last_observed_valset_nonce(&ctx)?,
            latest_valset_nonce: keeper.latest_valset_nonce(&ctx)?,
            observed_queue: keeper
                .observed_queue(&ctx)?
                .into_iter()
                .map(|(nonce, _)| nonce)
                .collect(),
            bootstrap: keeper.bootstrap(&ctx)?,
            tokens,
        })
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct TokenStatus {
    pub denominator: BridgedDenominator,
    pub pooled_transfers: usize,
    pub pending_batches: Vec<u64>,
    pub last_batch_nonce: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct AppStatus {
    pub height: u64,
    pub peggy_id: String,
    pub bonded_validators: usize,
    pub total_power: u128,
    pub last_applied_event_nonce: u64,
    pub last_observed_valset_nonce: u64,
    pub latest_valset_nonce: u64,
    /// Event nonces observed but waiting for an earlier nonce.
    pub observed_queue: Vec<u64>,
    pub bootstrap: Option<BridgeBootstrap>,
    pub tokens: Vec<TokenStatus>,
}
