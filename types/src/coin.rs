//! Coins on the ledger side and token amounts on the external chain.

use crate::EthAddress;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A ledger coin denomination.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Denom(String);

impl Denom {
    /// Longest denomination that fits the one-byte length prefix used in store keys.
    pub const MAX_LEN: usize = 128;

    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn is_valid(&self) -> bool {
        !self.0.is_empty()
            && self.0.len() <= Self::MAX_LEN
            && self.0.chars().all(|c| c.is_ascii_alphanumeric() || "/:._-".contains(c))
    }
}

impl fmt::Display for Denom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Denom {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// An amount of a ledger denomination.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub denom: Denom,
    pub amount: u128,
}

impl Coin {
    pub fn new(denom: impl Into<Denom>, amount: u128) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }
}

impl From<String> for Denom {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// An amount of an ERC20 token on the external chain.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Erc20Token {
    pub contract: EthAddress,
    pub symbol: String,
    pub amount: u128,
}

impl Erc20Token {
    pub fn new(contract: EthAddress, symbol: impl Into<String>, amount: u128) -> Self {
        Self {
            contract,
            symbol: symbol.into(),
            amount,
        }
    }
}

impl fmt::Display for Erc20Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.amount, self.symbol, self.contract)
    }
}
