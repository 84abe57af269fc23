//! The Peggy bridge keeper.
//!
//! A two-way asset bridge between a proof-of-stake ledger and an external
//! EVM chain. The keeper owns all bridge state in an injected [`KvStore`]
//! and is driven one message at a time through [`Keeper::deliver`]:
//!
//! - **Outgoing pool**: locked transfers waiting to leave the ledger.
//! - **Batches**: the highest-fee transfers of one token, grouped for
//!   execution on the external chain.
//! - **Confirmations**: validator signatures over batch and valset
//!   checkpoints.
//! - **Attestations**: validator claims about external events, applied in
//!   event-nonce order once a power threshold agrees.
//! - **Valsets**: snapshots of the validators' external signing addresses.
//!
//! [`KvStore`]: peggy_store::KvStore

mod attestation;
mod batch;
mod confirm;
mod denom;
mod error;
mod handler;
mod identity;
mod keeper;
pub mod keys;
mod pool;
mod valset;

#[cfg(test)]
mod test_utils;

pub use error::PeggyError;
pub use keeper::{Context, Keeper, MODULE_NAME};
