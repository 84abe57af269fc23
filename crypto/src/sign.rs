//! Ethereum-style recoverable signatures over checkpoints.
//!
//! Orchestrators sign `keccak256("\x19Ethereum Signed Message:\n32" ‖ checkpoint)`
//! and submit the 65-byte `r ‖ s ‖ v` signature hex encoded. The signer is
//! recovered from the signature and compared with the expected address.

use crate::hash::keccak256_multi;
use crate::keys::eth_address_from_public;
use crate::CryptoError;
use peggy_types::{EthAddress, Hash256};
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, Secp256k1, SecretKey, Verification};

pub const SIGNATURE_LEN: usize = 65;

const ETH_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

/// The digest an Ethereum wallet actually signs for a 32-byte message.
pub fn eth_signed_message_hash(checkpoint: &Hash256) -> [u8; 32] {
    keccak256_multi(&[ETH_MESSAGE_PREFIX, checkpoint.as_bytes()])
}

/// Sign a checkpoint, returning `r ‖ s ‖ v` with `v` in {27, 28}.
pub fn sign_checkpoint(checkpoint: &Hash256, secret: &SecretKey) -> [u8; SIGNATURE_LEN] {
    let secp = Secp256k1::signing_only();
    let msg = Message::from_digest(eth_signed_message_hash(checkpoint));
    let sig = secp.sign_ecdsa_recoverable(&msg, secret);
    let (rec_id, compact) = sig.serialize_compact();
    let mut out = [0u8; SIGNATURE_LEN];
    out[..64].copy_from_slice(&compact);
    out[64] = 27 + rec_id.to_i32() as u8;
    out
}

/// Decode a hex signature, with or without a `0x` prefix.
pub fn decode_signature_hex(s: &str) -> Result<Vec<u8>, CryptoError> {
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(stripped).map_err(|e| CryptoError::MalformedSignature(e.to_string()))
}

/// Recover the Ethereum address that produced `signature` over `checkpoint`.
pub fn recover_signer(checkpoint: &Hash256, signature: &[u8]) -> Result<EthAddress, CryptoError> {
    recover_with(&Secp256k1::verification_only(), checkpoint, signature)
}

pub(crate) fn recover_with<C: Verification>(
    secp: &Secp256k1<C>,
    checkpoint: &Hash256,
    signature: &[u8],
) -> Result<EthAddress, CryptoError> {
    if signature.len() != SIGNATURE_LEN {
        return Err(CryptoError::MalformedSignature(format!(
            "expected {SIGNATURE_LEN} bytes, got {}",
            signature.len()
        )));
    }
    let v = match signature[64] {
        0 | 1 => signature[64],
        27 | 28 => signature[64] - 27,
        other => {
            return Err(CryptoError::MalformedSignature(format!(
                "invalid recovery byte {other}"
            )))
        }
    };
    let rec_id = RecoveryId::from_i32(v as i32)
        .map_err(|e| CryptoError::MalformedSignature(e.to_string()))?;
    let sig = RecoverableSignature::from_compact(&signature[..64], rec_id)
        .map_err(|e| CryptoError::MalformedSignature(e.to_string()))?;
    let msg = Message::from_digest(eth_signed_message_hash(checkpoint));
    let public = secp
        .recover_ecdsa(&msg, &sig)
        .map_err(|e| CryptoError::Recovery(e.to_string()))?;
    Ok(eth_address_from_public(&public))
}

/// Check that `signature` over `checkpoint` was produced by `expected`.
pub fn verify_eth_signature(
    checkpoint: &Hash256,
    signature: &[u8],
    expected: &EthAddress,
) -> Result<(), CryptoError> {
    let recovered = recover_signer(checkpoint, signature)?;
    if &recovered != expected {
        return Err(CryptoError::SignerMismatch {
            expected: *expected,
            recovered,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::keypair_from_seed;

    fn checkpoint() -> Hash256 {
        Hash256::new([0x42; 32])
    }

    #[test]
    fn sign_and_recover() {
        let kp = keypair_from_seed(b"orchestrator").unwrap();
        let sig = sign_checkpoint(&checkpoint(), &kp.secret);
        assert!(sig[64] == 27 || sig[64] == 28);
        assert_eq!(recover_signer(&checkpoint(), &sig).unwrap(), kp.address);
        assert!(verify_eth_signature(&checkpoint(), &sig, &kp.address).is_ok());
    }

    #[test]
    fn raw_recovery_byte_is_accepted() {
        let kp = keypair_from_seed(b"orchestrator").unwrap();
        let mut sig = sign_checkpoint(&checkpoint(), &kp.secret);
        sig[64] -= 27;
        assert_eq!(recover_signer(&checkpoint(), &sig).unwrap(), kp.address);
    }

    #[test]
    fn wrong_checkpoint_recovers_other_address() {
        let kp = keypair_from_seed(b"orchestrator").unwrap();
        let sig = sign_checkpoint(&checkpoint(), &kp.secret);
        let other = Hash256::new([0x43; 32]);
        let err = verify_eth_signature(&other, &sig, &kp.address).unwrap_err();
        assert!(matches!(err, CryptoError::SignerMismatch { .. }));
    }

    #[test]
    fn wrong_signer_is_rejected() {
        let kp1 = keypair_from_seed(b"one").unwrap();
        let kp2 = keypair_from_seed(b"two").unwrap();
        let sig = sign_checkpoint(&checkpoint(), &kp1.secret);
        assert_eq!(
            verify_eth_signature(&checkpoint(), &sig, &kp2.address),
            Err(CryptoError::SignerMismatch {
                expected: kp2.address,
                recovered: kp1.address,
            })
        );
    }

    #[test]
    fn malformed_signatures() {
        assert!(matches!(
            recover_signer(&checkpoint(), &[0u8; 64]),
            Err(CryptoError::MalformedSignature(_))
        ));
        let mut sig = [1u8; 65];
        sig[64] = 5;
        assert!(matches!(
            recover_signer(&checkpoint(), &sig),
            Err(CryptoError::MalformedSignature(_))
        ));
    }

    #[test]
    fn hex_decoding() {
        assert_eq!(decode_signature_hex("0x0aff").unwrap(), vec![0x0a, 0xff]);
        assert_eq!(decode_signature_hex("0aff").unwrap(), vec![0x0a, 0xff]);
        assert!(decode_signature_hex("0xzz").is_err());
    }
}
