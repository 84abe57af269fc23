//! Abstract storage traits for the Peggy bridge.
//!
//! Every storage backend (LMDB, in-memory for testing) implements [`KvStore`].
//! The keeper depends only on the trait, plus the collaborator traits
//! ([`BankKeeper`], [`StakingKeeper`]) the surrounding ledger provides.

pub mod bank;
pub mod cache;
pub mod codec;
pub mod error;
pub mod kv;
pub mod staking;

pub use bank::{module_account, BankError, BankKeeper, KvBank};
pub use cache::CacheStore;
pub use codec::{decode, encode, get_typed, put_typed};
pub use error::StoreError;
pub use kv::{KvStore, WriteOp};
pub use staking::{StakingKeeper, StaticStaking, ValidatorRecord};
