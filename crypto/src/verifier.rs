//! Signature verification behind a trait, so the keeper can be driven with a
//! permissive verifier in tests.

use crate::sign::recover_with;
use crate::CryptoError;
use peggy_types::{EthAddress, Hash256};
use secp256k1::{Secp256k1, VerifyOnly};

pub trait SignatureVerifier: Send + Sync {
    /// Succeed iff `signature` over `checkpoint` was produced by `signer`.
    fn verify(
        &self,
        checkpoint: &Hash256,
        signature: &[u8],
        signer: &EthAddress,
    ) -> Result<(), CryptoError>;
}

/// Recovers the secp256k1 signer and compares Ethereum addresses.
pub struct EthereumVerifier {
    secp: Secp256k1<VerifyOnly>,
}

impl EthereumVerifier {
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::verification_only(),
        }
    }
}

impl Default for EthereumVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SignatureVerifier for EthereumVerifier {
    fn verify(
        &self,
        checkpoint: &Hash256,
        signature: &[u8],
        signer: &EthAddress,
    ) -> Result<(), CryptoError> {
        let recovered = recover_with(&self.secp, checkpoint, signature)?;
        if &recovered != signer {
            return Err(CryptoError::SignerMismatch {
                expected: *signer,
                recovered,
            });
        }
        Ok(())
    }
}
