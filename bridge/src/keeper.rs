//! The keeper: the bridge's state machine over an injected store.

use crate::keys;
use crate::PeggyError;
use peggy_crypto::SignatureVerifier;
use peggy_store::{get_typed, put_typed, BankKeeper, CacheStore, KvStore, StakingKeeper};
use peggy_types::{BridgeParams, Hash256};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// Name of the bridge's module account in the bank.
pub const MODULE_NAME: &str = "peggy";

/// Execution context for one operation: the store to read and write, and the
/// enclosing block height (used only for logging).
#[derive(Clone, Copy)]
pub struct Context<'a> {
    store: &'a dyn KvStore,
    height: u64,
}

impl<'a> Context<'a> {
    pub fn new(store: &'a dyn KvStore, height: u64) -> Self {
        Self { store, height }
    }

    pub fn store(&self) -> &'a dyn KvStore {
        self.store
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    /// The same context over a different store (e.g. a nested write buffer).
    pub fn with_store<'b>(&self, store: &'b dyn KvStore) -> Context<'b> {
        Context {
            store,
            height: self.height,
        }
    }
}

pub struct Keeper {
    params: BridgeParams,
    peggy_id: Hash256,
    pub(crate) bank: Arc<dyn BankKeeper>,
    pub(crate) staking: Arc<dyn StakingKeeper>,
    pub(crate) verifier: Arc<dyn SignatureVerifier>,
}

impl Keeper {
    pub fn new(
        params: BridgeParams,
        bank: Arc<dyn BankKeeper>,
        staking: Arc<dyn StakingKeeper>,
        verifier: Arc<dyn SignatureVerifier>,
    ) -> Result<Self, PeggyError> {
        params
            .validate()
            .map_err(|e| PeggyError::InvalidRequest(e.to_string()))?;
        Ok(Self {
            peggy_id: params.peggy_id_bytes(),
            params,
            bank,
            staking,
            verifier,
        })
    }

    pub fn params(&self) -> &BridgeParams {
        &self.params
    }

    /// The bridge id word mixed into every checkpoint.
    pub fn peggy_id(&self) -> &Hash256 {
        &self.peggy_id
    }

    pub fn staking(&self) -> &dyn StakingKeeper {
        self.staking.as_ref()
    }

    pub fn bank(&self) -> &dyn BankKeeper {
        self.bank.as_ref()
    }

    /// Run `f` against a write buffer over `ctx`'s store. The buffered writes
    /// reach the store only if `f` returns `Ok`.
    pub fn atomically<T>(
        &self,
        ctx: &Context<'_>,
        f: impl FnOnce(&Context<'_>) -> Result<T, PeggyError>,
    ) -> Result<T, PeggyError> {
        let cache = CacheStore::new(ctx.store());
        let value = f(&ctx.with_store(&cache))?;
        cache.write()?;
        Ok(value)
    }

    pub(crate) fn get<T: DeserializeOwned>(
        &self,
        ctx: &Context<'_>,
        key: &[u8],
    ) -> Result<Option<T>, PeggyError> {
        Ok(get_typed(ctx.store(), key)?)
    }

    pub(crate) fn put<T: Serialize>(
        &self,
        ctx: &Context<'_>,
        key: &[u8],
        value: &T,
    ) -> Result<(), PeggyError> {
        Ok(put_typed(ctx.store(), key, value)?)
    }

    /// Decode every value under `prefix`, in key order.
    pub(crate) fn collect<T: DeserializeOwned>(
        &self,
        ctx: &Context<'_>,
        prefix: &[u8],
    ) -> Result<Vec<T>, PeggyError> {
        ctx.store()
            .scan_prefix(prefix)?
            .into_iter()
            .map(|(_, v)| peggy_store::decode(&v).map_err(PeggyError::from))
            .collect()
    }

    /// Current value of a sequence (0 if never advanced).
    pub(crate) fn peek_sequence(&self, ctx: &Context<'_>, name: &[u8]) -> Result<u64, PeggyError> {
        Ok(self
            .get::<u64>(ctx, &keys::sequence_key(name))?
            .unwrap_or(0))
    }

    /// Advance a sequence and return the new value; the first value is 1.
    pub(crate) fn next_sequence(&self, ctx: &Context<'_>, name: &[u8]) -> Result<u64, PeggyError> {
        let next = self
            .peek_sequence(ctx, name)?
            .checked_add(1)
            .ok_or_else(|| PeggyError::Overflow(String::from_utf8_lossy(name).into_owned()))?;
        self.put(ctx, &keys::sequence_key(name), &next)?;
        Ok(next)
    }

    pub(crate) fn get_meta_u64(&self, ctx: &Context<'_>, name: &[u8]) -> Result<u64, PeggyError> {
        Ok(self.get::<u64>(ctx, &keys::meta_key(name))?.unwrap_or(0))
    }

    pub(crate) fn set_meta_u64(
        &self,
        ctx: &Context<'_>,
        name: &[u8],
        value: u64,
    ) -> Result<(), PeggyError> {
        self.put(ctx, &keys::meta_key(name), &value)
    }
}
