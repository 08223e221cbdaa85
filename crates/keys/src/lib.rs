//! Lamport one-time-signature keys
//!
//! This crate derives Lamport key pairs from a compact 20-byte seed, keeps unused keys in a
//! compressed FIFO queue that hands every key out at most once, and signs/verifies 160-bit
//! digests with them. Key material is generic over a [HashFamily](HashFamily); the two families
//! ([Keccak256](Keccak256) and [Ripemd160](Ripemd160)) are never interchangeable.

mod error;
mod hash;
mod key_pair;
mod signature;
mod tracker;

pub use error::KeyError;
pub use hash::{HashFamily, Keccak256, Ripemd160};
pub use key_pair::{
    CompressedKeyPair, KeyPair, PublicKey, PublicPair, SecretPair, Seed, KEY_BITS,
};
pub use signature::{sign, verify, Digest160, Signature, DIGEST_BYTES};
pub use tracker::{KeyTracker, TrackerSnapshot};
