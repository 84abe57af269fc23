//! Account balances, as consumed by the bridge.
//!
//! [`BankKeeper`] operations take the store explicitly so balance changes
//! share the message's write buffer and roll back with it.

use crate::{KvStore, StoreError};
use peggy_types::{AccAddress, Coin, Denom};
use thiserror::Error;

const BALANCE_PREFIX: u8 = 0xb0;
const SUPPLY_PREFIX: u8 = 0xb1;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BankError {
    #[error("insufficient funds in {account}: needed {needed}{denom}, available {available}")]
    InsufficientFunds {
        account: AccAddress,
        denom: Denom,
        needed: u128,
        available: u128,
    },

    #[error("balance overflow for {0}")]
    Overflow(Denom),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The ledger address of a named module account.
pub fn module_account(name: &str) -> AccAddress {
    AccAddress::new(format!("module/{name}"))
}

pub trait BankKeeper: Send + Sync {
    fn balance(
        &self,
        store: &dyn KvStore,
        account: &AccAddress,
        denom: &Denom,
    ) -> Result<u128, BankError>;

    /// Total minted minus burned for `denom`.
    fn supply(&self, store: &dyn KvStore, denom: &Denom) -> Result<u128, BankError>;

    fn send_coins(
        &self,
        store: &dyn KvStore,
        from: &AccAddress,
        to: &AccAddress,
        coins: &[Coin],
    ) -> Result<(), BankError>;

    fn mint(&self, store: &dyn KvStore, module: &str, coins: &[Coin]) -> Result<(), BankError>;

    fn burn(&self, store: &dyn KvStore, module: &str, coins: &[Coin]) -> Result<(), BankError>;

    fn send_to_module(
        &self,
        store: &dyn KvStore,
        from: &AccAddress,
        module: &str,
        coins: &[Coin],
    ) -> Result<(), BankError> {
        self.send_coins(store, from, &module_account(module), coins)
    }

    fn send_from_module(
        &self,
        store: &dyn KvStore,
        module: &str,
        to: &AccAddress,
        coins: &[Coin],
    ) -> Result<(), BankError> {
        self.send_coins(store, &module_account(module), to, coins)
    }
}

/// A [`BankKeeper`] that keeps balances in the shared store.
#[derive(Clone, Copy, Debug, Default)]
pub struct KvBank;

fn balance_key(account: &AccAddress, denom: &Denom) -> Vec<u8> {
    let mut key = Vec::with_capacity(2 + account.as_bytes().len() + denom.as_bytes().len());
    key.push(BALANCE_PREFIX);
    key.extend_from_slice(account.as_bytes());
    key.push(0);
    key.extend_from_slice(denom.as_bytes());
    key
}

fn supply_key(denom: &Denom) -> Vec<u8> {
    let mut key = vec![SUPPLY_PREFIX];
    key.extend_from_slice(denom.as_bytes());
    key
}

fn read_u128(store: &dyn KvStore, key: &[u8]) -> Result<u128, StoreError> {
    match store.get(key)? {
        None => Ok(0),
        Some(bytes) => {
            let arr: [u8; 16] = bytes.as_slice().try_into().map_err(|_| {
                StoreError::Corruption(format!("amount has {} bytes", bytes.len()))
            })?;
            Ok(u128::from_be_bytes(arr))
        }
    }
}

fn write_u128(store: &dyn KvStore, key: &[u8], value: u128) -> Result<(), StoreError> {
    if value == 0 {
        store.delete(key)
    } else {
        store.put(key, &value.to_be_bytes())
    }
}

impl KvBank {
    pub fn new() -> Self {
        Self
    }

    fn credit(
        &self,
        store: &dyn KvStore,
        account: &AccAddress,
        coin: &Coin,
    ) -> Result<(), BankError> {
        let key = balance_key(account, &coin.denom);
        let current = read_u128(store, &key)?;
        let next = current
            .checked_add(coin.amount)
            .ok_or_else(|| BankError::Overflow(coin.denom.clone()))?;
        write_u128(store, &key, next)?;
        Ok(())
    }

    fn debit(
        &self,
        store: &dyn KvStore,
        account: &AccAddress,
        coin: &Coin,
    ) -> Result<(), BankError> {
        let key = balance_key(account, &coin.denom);
        let available = read_u128(store, &key)?;
        if available < coin.amount {
            return Err(BankError::InsufficientFunds {
                account: account.clone(),
                denom: coin.denom.clone(),
                needed: coin.amount,
                available,
            });
        }
        write_u128(store, &key, available - coin.amount)?;
        Ok(())
    }

    fn adjust_supply(&self, store: &dyn KvStore, coin: &Coin, mint: bool) -> Result<(), BankError> {
        let key = supply_key(&coin.denom);
        let current = read_u128(store, &key)?;
        let next = if mint {
            current.checked_add(coin.amount)
        } else {
            current.checked_sub(coin.amount)
        }
        .ok_or_else(|| BankError::Overflow(coin.denom.clone()))?;
        write_u128(store, &key, next)?;
        Ok(())
    }

    /// Mint coins straight into an account (genesis balances, test funding).
    pub fn fund(
        &self,
        store: &dyn KvStore,
        account: &AccAddress,
        coin: &Coin,
    ) -> Result<(), BankError> {
        self.adjust_supply(store, coin, true)?;
        self.credit(store, account, coin)
    }
}

impl BankKeeper for KvBank {
    fn balance(
        &self,
        store: &dyn KvStore,
        account: &AccAddress,
        denom: &Denom,
    ) -> Result<u128, BankError> {
        Ok(read_u128(store, &balance_key(account, denom))?)
    }

    fn supply(&self, store: &dyn KvStore, denom: &Denom) -> Result<u128, BankError> {
        Ok(read_u128(store, &supply_key(denom))?)
    }

    fn send_coins(
        &self,
        store: &dyn KvStore,
        from: &AccAddress,
        to: &AccAddress,
        coins: &[Coin],
    ) -> Result<(), BankError> {
        for coin in coins {
            self.debit(store, from, coin)?;
            self.credit(store, to, coin)?;
        }
        Ok(())
    }

    fn mint(&self, store: &dyn KvStore, module: &str, coins: &[Coin]) -> Result<(), BankError> {
        let account = module_account(module);
        for coin in coins {
            self.adjust_supply(store, coin, true)?;
            self.credit(store, &account, coin)?;
        }
        Ok(())
    }

    fn burn(&self, store: &dyn KvStore, module: &str, coins: &[Coin]) -> Result<(), BankError> {
        let account = module_account(module);
        for coin in coins {
            self.debit(store, &account, coin)?;
            self.adjust_supply(store, coin, false)?;
        }
        Ok(())
    }
}
