use crate::{
    error::KeyError,
    hash::HashFamily,
    key_pair::{public_key_hash, PublicPair, SecretPair, KEY_BITS},
};
use ethers::utils::hex;
use std::fmt;
use tracing::trace;

/// Width of a signable digest in bytes
pub const DIGEST_BYTES: usize = KEY_BITS / 8;

/// A 160-bit message digest, the only input a Lamport key can sign
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Digest160(pub [u8; DIGEST_BYTES]);

impl Digest160 {
    /// Interprets `bytes` as a big-endian integer that must fit in 160 bits.
    ///
    /// Shorter inputs are zero-extended; longer inputs are accepted only when the excess leading
    /// bytes are zero.
    pub fn from_be_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.is_empty() {
            return Err(KeyError::malformed("empty digest"));
        }

        let excess = bytes.len().saturating_sub(DIGEST_BYTES);
        if bytes[..excess].iter().any(|b| *b != 0) {
            return Err(KeyError::malformed(format!(
                "digest of {} bytes does not fit in {KEY_BITS} bits",
                bytes.len()
            )));
        }

        let significant = &bytes[excess..];
        let mut digest = [0u8; DIGEST_BYTES];
        digest[DIGEST_BYTES - significant.len()..].copy_from_slice(significant);
        Ok(Self(digest))
    }

    /// Bit at `position`, most significant first
    pub fn bit(&self, position: usize) -> usize {
        ((self.0[position / 8] >> (7 - position % 8)) & 1) as usize
    }

    /// Iterator over all 160 bits, most significant first
    pub fn bits(&self) -> impl Iterator<Item = usize> + '_ {
        (0..KEY_BITS).map(|position| self.bit(position))
    }
}

impl TryFrom<&[u8]> for Digest160 {
    type Error = KeyError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        Self::from_be_bytes(value)
    }
}

impl fmt::Debug for Digest160 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest160(0x{})", hex::encode(self.0))
    }
}

/// Lamport signature: one revealed secret per digest bit, positionally aligned
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature<H: HashFamily>(pub Box<[H::Output; KEY_BITS]>);

impl<H: HashFamily> Signature<H> {
    /// Builds a signature from revealed secrets, which must cover all 160 positions
    pub fn from_secrets(secrets: &[H::Output]) -> Result<Self, KeyError> {
        let secrets: [H::Output; KEY_BITS] = secrets.try_into().map_err(|_| {
            KeyError::malformed(format!(
                "signature has {} secrets, expected {KEY_BITS}",
                secrets.len()
            ))
        })?;
        Ok(Self(Box::new(secrets)))
    }

    /// Revealed secrets, indexed by bit position
    pub fn secrets(&self) -> &[H::Output; KEY_BITS] {
        &self.0
    }
}

/// Signs a 160-bit digest, revealing `pri[i][bit_i]` for every position `i`.
///
/// Deterministic. The caller is responsible for never signing a second digest with the same key.
pub fn sign<H: HashFamily>(digest: &[u8], pri: &[SecretPair<H>]) -> Result<Signature<H>, KeyError> {
    if pri.len() != KEY_BITS {
        return Err(KeyError::malformed(format!(
            "private key has {} positions, expected {KEY_BITS}",
            pri.len()
        )));
    }
    let digest = Digest160::from_be_bytes(digest)?;

    trace!("Signing {digest:?} with a {} key", H::NAME);

    Ok(Signature(Box::new(std::array::from_fn(|position| pri[position][digest.bit(position)]))))
}

/// Checks a signature against a public key and the public key hash the account has bound.
///
/// Valid iff every revealed secret hashes to the public image selected by its digest bit and the
/// public key hashes to `expected_pkh`. Malformed digests and public keys never verify.
pub fn verify<H: HashFamily>(
    digest: &[u8],
    signature: &Signature<H>,
    public: &[PublicPair<H>],
    expected_pkh: &H::Output,
) -> bool {
    let Ok(digest) = Digest160::from_be_bytes(digest) else {
        return false;
    };
    if public.len() != KEY_BITS {
        return false;
    }

    let images_match = signature
        .secrets()
        .iter()
        .zip(public)
        .zip(digest.bits())
        .all(|((secret, pair), bit)| H::digest(secret.as_ref()) == pair[bit]);

    images_match && public_key_hash::<H>(public) == *expected_pkh
}
