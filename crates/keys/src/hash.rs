//! Hash families used to derive and verify Lamport keys

use ethers::{
    types::{H160, H256},
    utils::keccak256,
};
use ripemd::Digest;
use serde::{de::DeserializeOwned, Serialize};
use std::{fmt::Debug, hash::Hash};

/// A digest function together with the word layout used to feed it.
///
/// Keys derived under one family are invalid for a verifier expecting the other, so every type
/// that holds key material is parameterized by its family.
pub trait HashFamily:
    Clone + Copy + Debug + Default + PartialEq + Eq + Send + Sync + 'static
{
    /// Digest output (secrets, public images and public key hashes all share it)
    type Output: Copy
        + Debug
        + Default
        + PartialEq
        + Eq
        + Hash
        + AsRef<[u8]>
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static;

    /// Human readable name
    const NAME: &'static str;

    /// Width of the digest output in bytes
    const OUTPUT_BYTES: usize;

    /// Width of one packed integer word (`uintN`) when combining seed and index
    const WORD_BYTES: usize;

    /// Hashes arbitrary bytes
    fn digest(data: &[u8]) -> Self::Output;

    /// Builds an output from exactly [OUTPUT_BYTES](Self::OUTPUT_BYTES) bytes
    fn output_from_slice(bytes: &[u8]) -> Self::Output;

    /// Left-pads `bytes` into one packed word of this family
    fn word(bytes: &[u8]) -> Vec<u8> {
        let mut word = vec![0u8; Self::WORD_BYTES];
        let offset = Self::WORD_BYTES.saturating_sub(bytes.len());
        let skip = bytes.len().saturating_sub(Self::WORD_BYTES);
        word[offset..].copy_from_slice(&bytes[skip..]);
        word
    }
}

/// Keccak-256 family: `bytes32` outputs, `uint256` words
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Keccak256;

impl HashFamily for Keccak256 {
    type Output = H256;

    const NAME: &'static str = "keccak256";
    const OUTPUT_BYTES: usize = 32;
    const WORD_BYTES: usize = 32;

    fn digest(data: &[u8]) -> H256 {
        H256::from(keccak256(data))
    }

    fn output_from_slice(bytes: &[u8]) -> H256 {
        H256::from_slice(bytes)
    }
}

/// RIPEMD-160 family: `bytes20` outputs, `uint160` words
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Ripemd160;

impl HashFamily for Ripemd160 {
    type Output = H160;

    const NAME: &'static str = "ripemd160";
    const OUTPUT_BYTES: usize = 20;
    const WORD_BYTES: usize = 20;

    fn digest(data: &[u8]) -> H160 {
        H160::from_slice(ripemd::Ripemd160::digest(data).as_slice())
    }

    fn output_from_slice(bytes: &[u8]) -> H160 {
        H160::from_slice(bytes)
    }
}
