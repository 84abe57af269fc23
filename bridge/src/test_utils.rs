//! Shared fixtures for the keeper's unit tests.

use crate::{Context, Keeper};
use peggy_crypto::{keypair_from_seed, EthKeyPair, EthereumVerifier};
use peggy_nullables::{NullStaking, NullStore};
use peggy_store::KvBank;
use peggy_types::{AccAddress, BridgeParams, BridgedDenominator, Coin, EthAddress, ValAddress};
use std::sync::Arc;

pub(crate) struct TestValidator {
    pub validator: ValAddress,
    pub orchestrator: AccAddress,
    pub key: EthKeyPair,
}

pub(crate) struct TestBridge {
    pub store: NullStore,
    pub staking: Arc<NullStaking>,
    pub bank: Arc<KvBank>,
    pub keeper: Keeper,
    pub validators: Vec<TestValidator>,
}

pub(crate) const TOKEN_CONTRACT: EthAddress = EthAddress::new([0xaa; 20]);

impl TestBridge {
    /// One bonded validator per entry in `powers`.
    pub fn new(powers: &[u64]) -> Self {
        Self::with_params(powers, BridgeParams::default())
    }

    pub fn with_params(powers: &[u64], params: BridgeParams) -> Self {
        let staking = Arc::new(NullStaking::new());
        let mut validators = Vec::new();
        for (i, power) in powers.iter().enumerate() {
            let validator = format!("val-{i}");
            let orchestrator = format!("orch-{i}");
            staking.set_validator(&validator, &orchestrator, *power);
            validators.push(TestValidator {
                validator: ValAddress::new(validator),
                orchestrator: AccAddress::new(orchestrator),
                key: keypair_from_seed(format!("eth-{i}").as_bytes()).unwrap(),
            });
        }
        let bank = Arc::new(KvBank::new());
        let keeper = Keeper::new(
            params,
            bank.clone(),
            staking.clone(),
            Arc::new(EthereumVerifier::new()),
        )
        .unwrap();
        Self {
            store: NullStore::new(),
            staking,
            bank,
            keeper,
            validators,
        }
    }

    pub fn ctx(&self) -> Context<'_> {
        Context::new(&self.store, 1)
    }

    pub fn register_eth_addresses(&self) {
        let ctx = self.ctx();
        for v in &self.validators {
            self.keeper
                .set_eth_address(&ctx, &v.validator, v.key.address)
                .unwrap();
        }
    }

    /// Register the test token and return its denominator.
    pub fn token(&self) -> BridgedDenominator {
        let ctx = self.ctx();
        self.keeper
            .register_token(&ctx, TOKEN_CONTRACT, "TST")
            .unwrap()
    }

    pub fn fund(&self, account: &AccAddress, coin: Coin) {
        self.bank.fund(&self.store, account, &coin).unwrap();
    }
}
