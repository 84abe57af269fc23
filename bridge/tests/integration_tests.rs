//! End-to-end tests driving the keeper through `deliver`, the same way the
//! node does: orchestrators register keys, sign valsets and batches, and
//! attest to deposits and withdrawals.

use std::sync::Arc;

use peggy_bridge::{Context, Keeper, PeggyError};
use peggy_crypto::{keypair_from_seed, sign_checkpoint, EthKeyPair, EthereumVerifier};
use peggy_messages::{
    Msg, MsgConfirmBatch, MsgConfirmValset, MsgRequestBatch, MsgRequestValset, MsgResponse,
    MsgSendToExternal, MsgSetEthAddress, MsgSubmitClaims,
};
use peggy_nullables::{NullStaking, NullStore};
use peggy_store::{module_account, BankKeeper, KvBank};
use peggy_types::{
    AccAddress, AttestationStatus, BridgeParams, BridgedDenominator, ClaimDetails, Coin, Denom,
    EffectOutcome, Erc20Token, EthAddress, EthereumClaim, OutgoingTxBatch,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const TOKEN: EthAddress = EthAddress::new([0x42; 20]);
const SYMBOL: &str = "USDX";

struct Chain {
    store: NullStore,
    staking: Arc<NullStaking>,
    bank: Arc<KvBank>,
    keeper: Keeper,
    keys: Vec<EthKeyPair>,
    event_nonce: u64,
}

impl Chain {
    fn new(powers: &[u64]) -> Self {
        Self::with_params(powers, BridgeParams::default())
    }

    fn with_params(powers: &[u64], params: BridgeParams) -> Self {
        let staking = Arc::new(NullStaking::new());
        let mut keys = Vec::new();
        for (i, power) in powers.iter().enumerate() {
            staking.set_validator(&format!("val-{i}"), &format!("orch-{i}"), *power);
            keys.push(keypair_from_seed(format!("orchestrator key {i}").as_bytes()).unwrap());
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
            keys,
            event_nonce: 0,
        }
    }

    fn ctx(&self) -> Context<'_> {
        Context::new(&self.store, 7)
    }

    fn orch(&self, i: usize) -> AccAddress {
        AccAddress::new(format!("orch-{i}"))
    }

    fn deliver(&self, msg: Msg) -> Result<MsgResponse, PeggyError> {
        self.keeper.deliver(&self.ctx(), &msg)
    }

    fn register_keys(&self) {
        for (i, key) in self.keys.iter().enumerate() {
            self.deliver(Msg::SetEthAddress(MsgSetEthAddress {
                orchestrator: self.orch(i),
                address: key.address,
            }))
            .unwrap();
        }
    }

    fn voucher(&self) -> Denom {
        BridgedDenominator::new(TOKEN, SYMBOL).voucher_denom
    }

    fn balance(&self, account: &AccAddress) -> u128 {
        self.bank
            .balance(&self.store, account, &self.voucher())
            .unwrap()
    }

    /// Every validator attests to the next event.
    fn observe(&mut self, details: ClaimDetails) {
        self.event_nonce += 1;
        for i in 0..self.keys.len() {
            self.deliver(Msg::SubmitClaims(MsgSubmitClaims {
                orchestrator: self.orch(i),
                claims: vec![EthereumClaim::new(self.event_nonce, details.clone())],
            }))
            .unwrap();
        }
    }

    fn deposit(&mut self, receiver: &AccAddress, amount: u128) {
        self.observe(ClaimDetails::Deposit {
            erc20_token: Erc20Token::new(TOKEN, SYMBOL, amount),
            ethereum_sender: EthAddress::new([0xde; 20]),
            cosmos_receiver: receiver.clone(),
        });
    }

    fn send(&self, sender: &AccAddress, amount: u128, fee: u128) -> Result<u64, PeggyError> {
        match self.deliver(Msg::SendToExternal(MsgSendToExternal {
            sender: sender.clone(),
            destination: EthAddress::new([0x99; 20]),
            amount: Coin::new(self.voucher(), amount),
            bridge_fee: Coin::new(self.voucher(), fee),
        }))? {
            MsgResponse::TransferQueued { transfer_id } => Ok(transfer_id),
            other => panic!("unexpected response {other:?}"),
        }
    }

    fn request_batch(&self) -> Result<OutgoingTxBatch, PeggyError> {
        match self.deliver(Msg::RequestBatch(MsgRequestBatch {
            orchestrator: self.orch(0),
            denom: self.voucher(),
        }))? {
            MsgResponse::BatchCreated { batch, .. } => Ok(batch),
            other => panic!("unexpected response {other:?}"),
        }
    }

    fn confirm_batch(&self, i: usize, batch: &OutgoingTxBatch) -> Result<MsgResponse, PeggyError> {
        let checkpoint = self.keeper.batch_checkpoint(batch);
        let signature = sign_checkpoint(&checkpoint, &self.keys[i].secret);
        self.deliver(Msg::ConfirmBatch(MsgConfirmBatch {
            orchestrator: self.orch(i),
            token_contract: batch.token_contract,
            nonce: batch.nonce,
            signature: format!("0x{}", hex::encode(signature)),
        }))
    }

    fn pool_ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self
            .keeper
            .pool_transactions(&self.ctx(), &self.voucher())
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        ids.sort_unstable();
        ids
    }
}

// ---------------------------------------------------------------------------
// 1. Pool and batch selection
// ---------------------------------------------------------------------------

#[test]
fn batch_takes_highest_fees_with_id_tiebreak() {
    let params = BridgeParams {
        batch_size: 2,
        ..BridgeParams::default()
    };
    let mut chain = Chain::with_params(&[10], params);
    let alice = AccAddress::new("alice");
    chain.deposit(&alice, 1_000);

    for (expected_id, fee) in [(1, 2), (2, 3), (3, 2), (4, 1)] {
        assert_eq!(chain.send(&alice, 100, fee).unwrap(), expected_id);
    }
    assert_eq!(chain.balance(&alice), 1_000 - 400 - 8);

    let batch = chain.request_batch().unwrap();
    assert_eq!(batch.nonce, 1);
    assert_eq!(batch.element_ids(), vec![2, 1]);
    assert_eq!(batch.total_fee.amount, 5);
    assert_eq!(batch.total_fee.contract, TOKEN);
    assert_eq!(chain.pool_ids(), vec![3, 4]);
}

#[test]
fn small_batch_reads_only_the_top_of_a_large_pool() {
    let params = BridgeParams {
        batch_size: 1,
        ..BridgeParams::default()
    };
    let mut chain = Chain::with_params(&[10], params);
    let alice = AccAddress::new("alice");
    chain.deposit(&alice, 1_000_000);
    for fee in 1..=300 {
        chain.send(&alice, 10, fee).unwrap();
    }

    let before = chain.store.visited_count();
    let batch = chain.request_batch().unwrap();
    let visited = chain.store.visited_count() - before;

    assert_eq!(batch.element_ids(), vec![300]);
    assert!(visited < 10, "read {visited} entries for a one-element batch");
    assert_eq!(chain.pool_ids().len(), 299);
}

#[test]
fn empty_pool_cannot_be_batched() {
    let mut chain = Chain::new(&[10]);
    chain.deposit(&AccAddress::new("alice"), 5);
    let before = chain.store.snapshot();
    assert!(matches!(
        chain.request_batch(),
        Err(PeggyError::EmptyBatch(_))
    ));
    assert_eq!(chain.store.snapshot(), before);
}

#[test]
fn transfers_burn_the_locked_vouchers() {
    let mut chain = Chain::new(&[10]);
    let alice = AccAddress::new("alice");
    chain.deposit(&alice, 500);
    chain.send(&alice, 200, 10).unwrap();

    assert_eq!(chain.balance(&alice), 290);
    assert_eq!(chain.balance(&module_account(peggy_bridge::MODULE_NAME)), 0);
    assert_eq!(
        chain.bank.supply(&chain.store, &chain.voucher()).unwrap(),
        290
    );
}

// ---------------------------------------------------------------------------
// 2. Attestation quorum
// ---------------------------------------------------------------------------

#[test]
fn deposit_is_minted_once_the_threshold_is_crossed() {
    let chain = Chain::new(&[40, 35, 30, 45]);
    let bob = AccAddress::new("bob");
    let details = ClaimDetails::Deposit {
        erc20_token: Erc20Token::new(TOKEN, SYMBOL, 250),
        ethereum_sender: EthAddress::new([0xde; 20]),
        cosmos_receiver: bob.clone(),
    };
    let claim = |i: usize| {
        chain
            .deliver(Msg::SubmitClaims(MsgSubmitClaims {
                orchestrator: chain.orch(i),
                claims: vec![EthereumClaim::new(1, details.clone())],
            }))
            .unwrap()
    };

    claim(0);
    claim(1);
    assert_eq!(chain.balance(&bob), 0);
    claim(2);
    assert_eq!(chain.balance(&bob), 250);
    claim(3);
    assert_eq!(chain.balance(&bob), 250);

    let attestation = chain
        .keeper
        .get_attestation(&chain.ctx(), 1, &details)
        .unwrap()
        .unwrap();
    assert_eq!(attestation.status, AttestationStatus::Processed);
    assert_eq!(attestation.outcome, Some(EffectOutcome::Applied));
    assert_eq!(attestation.tally, 150);
}

#[test]
fn unbonded_validator_cannot_claim() {
    let chain = Chain::new(&[10, 10, 10]);
    let details = ClaimDetails::ValsetUpdated { valset_nonce: 1 };
    let submit = |i: usize| {
        chain.deliver(Msg::SubmitClaims(MsgSubmitClaims {
            orchestrator: chain.orch(i),
            claims: vec![EthereumClaim::new(1, details.clone())],
        }))
    };
    submit(0).unwrap();
    submit(1).unwrap();
    assert_eq!(chain.keeper.last_applied_event_nonce(&chain.ctx()).unwrap(), 0);

    // val-2 unbonds; the two claimants now hold all bonded power
    chain.staking.set_power("val-2", 0);
    assert!(matches!(submit(2), Err(PeggyError::UnknownValidator(_))));
    let att = chain
        .keeper
        .get_attestation(&chain.ctx(), 1, &details)
        .unwrap()
        .unwrap();
    assert_eq!(att.status, AttestationStatus::Pending);
}

// ---------------------------------------------------------------------------
// 3. Batch execution
// ---------------------------------------------------------------------------

#[test]
fn executing_a_later_batch_releases_earlier_ones() {
    let params = BridgeParams {
        batch_size: 1,
        ..BridgeParams::default()
    };
    let mut chain = Chain::with_params(&[10, 10], params);
    chain.register_keys();
    let alice = AccAddress::new("alice");
    chain.deposit(&alice, 1_000);

    chain.send(&alice, 100, 1).unwrap();
    let first = chain.request_batch().unwrap();
    chain.send(&alice, 100, 2).unwrap();
    let second = chain.request_batch().unwrap();
    chain.send(&alice, 100, 3).unwrap();
    let third = chain.request_batch().unwrap();
    assert_eq!((first.nonce, second.nonce, third.nonce), (1, 2, 3));
    assert!(chain.pool_ids().is_empty());

    chain.confirm_batch(0, &first).unwrap();
    chain.observe(ClaimDetails::WithdrawalBatch {
        token_contract: TOKEN,
        batch_nonce: second.nonce,
    });

    let ctx = chain.ctx();
    let remaining: Vec<u64> = chain
        .keeper
        .outgoing_tx_batches_for(&ctx, &TOKEN)
        .unwrap()
        .iter()
        .map(|b| b.nonce)
        .collect();
    assert_eq!(remaining, vec![3]);
    assert_eq!(chain.pool_ids(), first.element_ids());
    assert!(chain.keeper.batch_confirms(&ctx, &TOKEN, 1).unwrap().is_empty());
}

#[test]
fn withdrawal_of_an_unknown_batch_is_recorded_as_failed() {
    let mut chain = Chain::new(&[10]);
    chain.observe(ClaimDetails::WithdrawalBatch {
        token_contract: TOKEN,
        batch_nonce: 9,
    });
    let att = chain
        .keeper
        .attestations_at(&chain.ctx(), 1)
        .unwrap()
        .pop()
        .unwrap();
    assert!(matches!(att.outcome, Some(EffectOutcome::Failed(_))));
    assert_eq!(chain.keeper.last_applied_event_nonce(&chain.ctx()).unwrap(), 1);
}

// ---------------------------------------------------------------------------
// 4. Full round trip
// ---------------------------------------------------------------------------

#[test]
fn full_bridge_round_trip() {
    let mut chain = Chain::new(&[30, 30, 40]);
    chain.register_keys();
    let carol = AccAddress::new("carol");

    // valset request and signatures
    let nonce = match chain
        .deliver(Msg::RequestValset(MsgRequestValset {
            orchestrator: chain.orch(2),
        }))
        .unwrap()
    {
        MsgResponse::ValsetRequested { nonce } => nonce,
        other => panic!("unexpected response {other:?}"),
    };
    let valset = chain
        .keeper
        .get_valset_request(&chain.ctx(), nonce)
        .unwrap()
        .unwrap();
    assert_eq!(valset.len(), 3);
    assert_eq!(valset.members[0].power, 40);
    let checkpoint = chain.keeper.valset_checkpoint(&valset);
    for i in 0..3 {
        let signature = sign_checkpoint(&checkpoint, &chain.keys[i].secret);
        chain
            .deliver(Msg::ConfirmValset(MsgConfirmValset {
                orchestrator: chain.orch(i),
                nonce,
                signature: hex::encode(signature),
            }))
            .unwrap();
    }
    assert_eq!(
        chain.keeper.valset_confirms(&chain.ctx(), nonce).unwrap().len(),
        3
    );

    // in and back out
    chain.deposit(&carol, 1_000);
    assert_eq!(chain.balance(&carol), 1_000);
    chain.send(&carol, 600, 25).unwrap();
    let batch = chain.request_batch().unwrap();
    assert_eq!(batch.valset.nonce, nonce);
    for i in 0..3 {
        assert!(matches!(
            chain.confirm_batch(i, &batch),
            Ok(MsgResponse::BatchConfirmed { .. })
        ));
    }
    assert!(matches!(
        chain.confirm_batch(0, &batch),
        Err(PeggyError::DuplicateSignature { .. })
    ));

    chain.observe(ClaimDetails::WithdrawalBatch {
        token_contract: TOKEN,
        batch_nonce: batch.nonce,
    });
    let ctx = chain.ctx();
    assert!(chain.keeper.outgoing_tx_batches(&ctx).unwrap().is_empty());
    assert!(chain.keeper.batch_confirms(&ctx, &TOKEN, batch.nonce).unwrap().is_empty());
    assert_eq!(chain.balance(&carol), 375);
    assert_eq!(chain.bank.supply(&chain.store, &chain.voucher()).unwrap(), 375);
    assert_eq!(chain.keeper.last_applied_event_nonce(&ctx).unwrap(), 2);
}

#[test]
fn forged_confirm_leaves_store_untouched() {
    let mut chain = Chain::new(&[10, 10]);
    chain.register_keys();
    let alice = AccAddress::new("alice");
    chain.deposit(&alice, 100);
    chain.send(&alice, 50, 1).unwrap();
    let batch = chain.request_batch().unwrap();
    let before = chain.store.snapshot();

    // val-1 signs, val-0 submits
    let signature = sign_checkpoint(&chain.keeper.batch_checkpoint(&batch), &chain.keys[1].secret);
    let forged = Msg::ConfirmBatch(MsgConfirmBatch {
        orchestrator: chain.orch(0),
        token_contract: TOKEN,
        nonce: batch.nonce,
        signature: hex::encode(signature),
    });
    assert!(matches!(
        chain.deliver(forged),
        Err(PeggyError::InvalidSignature(_))
    ));
    assert_eq!(chain.store.snapshot(), before);
}

#[test]
fn address_cannot_be_claimed_twice() {
    let chain = Chain::new(&[10, 10]);
    chain.register_keys();
    let stolen = Msg::SetEthAddress(MsgSetEthAddress {
        orchestrator: chain.orch(1),
        address: chain.keys[0].address,
    });
    assert!(matches!(
        chain.deliver(stolen),
        Err(PeggyError::AddressInUse { .. })
    ));
}
