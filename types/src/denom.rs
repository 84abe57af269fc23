//! Bridged denominators: the link between an ERC20 contract and the voucher
//! denomination that represents it on the ledger.

use crate::{Coin, Denom, Erc20Token, EthAddress};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

/// Prefix shared by every voucher denomination.
pub const VOUCHER_DENOM_PREFIX: &str = "peggy";

/// Number of hex characters of the trace hash kept in a voucher denomination.
const VOUCHER_HASH_CHARS: usize = 10;

/// Derive the canonical voucher denomination for an ERC20 token.
///
/// `"peggy"` followed by the first 10 hex characters of
/// `keccak256("<contract>/<symbol>/")`.
pub fn voucher_denom(token_contract: &EthAddress, symbol: &str) -> Denom {
    let trace = format!("{token_contract}/{symbol}/");
    let digest = Keccak256::digest(trace.as_bytes());
    let hash = hex::encode(digest);
    Denom::new(format!(
        "{VOUCHER_DENOM_PREFIX}{}",
        &hash[..VOUCHER_HASH_CHARS]
    ))
}

/// An ERC20 token known to the bridge, together with its voucher denomination.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BridgedDenominator {
    pub token_contract: EthAddress,
    pub symbol: String,
    pub voucher_denom: Denom,
}

impl BridgedDenominator {
    pub fn new(token_contract: EthAddress, symbol: impl Into<String>) -> Self {
        let symbol = symbol.into();
        let voucher_denom = voucher_denom(&token_contract, &symbol);
        Self {
            token_contract,
            symbol,
            voucher_denom,
        }
    }

    /// Express a voucher amount as the external token.
    pub fn to_erc20(&self, amount: u128) -> Erc20Token {
        Erc20Token::new(self.token_contract, self.symbol.clone(), amount)
    }

    /// Express an external token amount as a voucher coin.
    pub fn to_voucher_coin(&self, amount: u128) -> Coin {
        Coin::new(self.voucher_denom.clone(), amount)
    }
}
