//! secp256k1 key handling and Ethereum address derivation.

use crate::hash::keccak256;
use crate::CryptoError;
use peggy_types::EthAddress;
use secp256k1::{PublicKey, Secp256k1, SecretKey};

/// A secp256k1 key pair together with its Ethereum address.
#[derive(Clone, Debug)]
pub struct EthKeyPair {
    pub secret: SecretKey,
    pub public: PublicKey,
    pub address: EthAddress,
}

impl EthKeyPair {
    pub fn from_secret(secret: SecretKey) -> Self {
        let secp = Secp256k1::signing_only();
        let public = PublicKey::from_secret_key(&secp, &secret);
        Self {
            secret,
            public,
            address: eth_address_from_public(&public),
        }
    }
}

/// The last 20 bytes of the keccak of the uncompressed public key (sans 0x04 tag).
pub fn eth_address_from_public(public: &PublicKey) -> EthAddress {
    let uncompressed = public.serialize_uncompressed();
    let digest = keccak256(&uncompressed[1..]);
    let mut out = [0u8; 20];
    out.copy_from_slice(&digest[12..]);
    EthAddress::new(out)
}

/// Derive a key pair deterministically from a seed (keccak of the seed is the secret).
pub fn keypair_from_seed(seed: &[u8]) -> Result<EthKeyPair, CryptoError> {
    let secret = SecretKey::from_slice(&keccak256(seed))
        .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
    Ok(EthKeyPair::from_secret(secret))
}
