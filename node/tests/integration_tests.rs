//! Integration tests exercising the node over a real LMDB store:
//! config → genesis → message delivery → persistence → reopen.

use peggy_crypto::{keypair_from_seed, sign_checkpoint, EthKeyPair};
use peggy_messages::{
    Msg, MsgConfirmBatch, MsgRequestBatch, MsgResponse, MsgSendToExternal, MsgSetEthAddress,
    MsgSubmitClaims,
};
use peggy_node::{open_app, BridgeApp, NodeConfig, NodeError};
use peggy_store_lmdb::LmdbStore;
use peggy_types::{
    AccAddress, BridgedDenominator, ClaimDetails, Coin, Erc20Token, EthAddress, EthereumClaim,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const TOKEN: EthAddress = EthAddress::new([0x5a; 20]);

fn config(dir: &tempfile::TempDir) -> NodeConfig {
    let toml = format!(
        r#"
        data_dir = "{}"
        map_size = 67108864

        [params]
        peggy_id = "it-bridge"
        batch_size = 10

        [[validators]]
        validator = "val-a"
        orchestrator = "orch-a"
        power = 60

        [[validators]]
        validator = "val-b"
        orchestrator = "orch-b"
        power = 40
        "#,
        dir.path().join("db").display()
    );
    NodeConfig::from_toml_str(&toml).expect("valid config")
}

fn keys() -> [EthKeyPair; 2] {
    [
        keypair_from_seed(b"node-it-a").unwrap(),
        keypair_from_seed(b"node-it-b").unwrap(),
    ]
}

fn orch(i: usize) -> AccAddress {
    AccAddress::new(["orch-a", "orch-b"][i])
}

fn voucher() -> peggy_types::Denom {
    BridgedDenominator::new(TOKEN, "LMDB").voucher_denom
}

fn deposit_claims(app: &mut BridgeApp<LmdbStore>, nonce: u64, amount: u128) {
    for i in 0..2 {
        app.deliver(&Msg::SubmitClaims(MsgSubmitClaims {
            orchestrator: orch(i),
            claims: vec![EthereumClaim::new(
                nonce,
                ClaimDetails::Deposit {
                    erc20_token: Erc20Token::new(TOKEN, "LMDB", amount),
                    ethereum_sender: EthAddress::new([0xe1; 20]),
                    cosmos_receiver: AccAddress::new("user"),
                },
            )],
        }))
        .unwrap();
    }
}

// ---------------------------------------------------------------------------
// 1. Delivery and persistence
// ---------------------------------------------------------------------------

#[test]
fn state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir);
    let keys = keys();

    {
        let mut app = open_app(&config).unwrap();
        app.begin_block(1).unwrap();
        for (i, key) in keys.iter().enumerate() {
            app.deliver(&Msg::SetEthAddress(MsgSetEthAddress {
                orchestrator: orch(i),
                address: key.address,
            }))
            .unwrap();
        }
        app.begin_block(2).unwrap();
        deposit_claims(&mut app, 1, 1_000);
        app.deliver(&Msg::SendToExternal(MsgSendToExternal {
            sender: AccAddress::new("user"),
            destination: EthAddress::new([0x0d; 20]),
            amount: Coin::new(voucher(), 300),
            bridge_fee: Coin::new(voucher(), 7),
        }))
        .unwrap();
    }

    let mut app = open_app(&config).unwrap();
    assert_eq!(app.height(), 2);
    let status = app.status().unwrap();
    assert_eq!(status.last_applied_event_nonce, 1);
    assert_eq!(status.tokens.len(), 1);
    assert_eq!(status.tokens[0].pooled_transfers, 1);
    assert_eq!(status.total_power, 100);

    app.begin_block(3).unwrap();
    let batch = match app
        .deliver(&Msg::RequestBatch(MsgRequestBatch {
            orchestrator: orch(1),
            denom: voucher(),
        }))
        .unwrap()
    {
        MsgResponse::BatchCreated { batch, .. } => batch,
        other => panic!("unexpected response {other:?}"),
    };
    assert_eq!(batch.valset.len(), 2);
    let checkpoint = app.keeper().batch_checkpoint(&batch);
    for (i, key) in keys.iter().enumerate() {
        app.deliver(&Msg::ConfirmBatch(MsgConfirmBatch {
            orchestrator: orch(i),
            token_contract: TOKEN,
            nonce: batch.nonce,
            signature: hex::encode(sign_checkpoint(&checkpoint, &key.secret)),
        }))
        .unwrap();
    }
    assert_eq!(
        app.keeper()
            .batch_confirms(&app.context(), &TOKEN, batch.nonce)
            .unwrap()
            .len(),
        2
    );
}

#[test]
fn rejected_message_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = open_app(&config(&dir)).unwrap();
    app.begin_block(1).unwrap();
    deposit_claims(&mut app, 1, 50);
    let before = app.store().len().unwrap();

    let overdraw = Msg::SendToExternal(MsgSendToExternal {
        sender: AccAddress::new("user"),
        destination: EthAddress::new([0x0d; 20]),
        amount: Coin::new(voucher(), 50),
        bridge_fee: Coin::new(voucher(), 1),
    });
    assert!(matches!(app.deliver(&overdraw), Err(NodeError::Bridge(_))));
    assert_eq!(app.store().len().unwrap(), before);
    assert_eq!(app.status().unwrap().tokens[0].pooled_transfers, 0);
    assert_eq!(app.metrics().total_rejected(), 1);
}

#[test]
fn invalid_config_is_refused_before_opening() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(&dir);
    config.params.batch_size = 0;
    assert!(matches!(open_app(&config), Err(NodeError::Config(_))));
    assert!(!dir.path().join("db").exists());
}
