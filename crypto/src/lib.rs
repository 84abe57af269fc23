//! Cryptographic primitives for the Peggy bridge.
//!
//! - **Keccak-256** for checkpoints, attestation keys and address derivation
//! - **Ethereum ABI** encoding of the messages the bridge contract verifies
//! - **secp256k1** recoverable signatures, checked against a validator's
//!   registered Ethereum address

pub mod checkpoint;
pub mod error;
pub mod hash;
pub mod keys;
pub mod sign;
pub mod verifier;

pub use checkpoint::{batch_checkpoint, valset_checkpoint};
pub use error::CryptoError;
pub use hash::{keccak256, keccak256_multi};
pub use keys::{eth_address_from_public, keypair_from_seed, EthKeyPair};
pub use sign::{
    decode_signature_hex, eth_signed_message_hash, recover_signer, sign_checkpoint,
    verify_eth_signature, SIGNATURE_LEN,
};
pub use verifier::{EthereumVerifier, SignatureVerifier};
