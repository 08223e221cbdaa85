use crate::{error::KeyError, hash::HashFamily};
use ethers::types::H160;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of bit positions covered by one key (one secret pair per digest bit)
pub const KEY_BITS: usize = 160;

/// Secrets for one bit position: `[bit-0 secret, bit-1 secret]`
pub type SecretPair<H> = [<H as HashFamily>::Output; 2];

/// Hash images of one [SecretPair](SecretPair)
pub type PublicPair<H> = [<H as HashFamily>::Output; 2];

/// Full public key, indexed by bit position
pub type PublicKey<H> = [PublicPair<H>; KEY_BITS];

/// 20-byte root of one key pair's derivation
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Seed(pub H160);

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Seed(..)")
    }
}

impl Seed {
    /// Draws a fresh seed from a cryptographically secure generator
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut bytes = [0u8; 20];
        rng.fill_bytes(&mut bytes);
        Self(H160(bytes))
    }

    /// Raw seed bytes
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl From<[u8; 20]> for Seed {
    fn from(value: [u8; 20]) -> Self {
        Self(H160(value))
    }
}

/// Lamport key pair with its private and public halves expanded
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair<H: HashFamily> {
    secret: Seed,
    pri: Box<[SecretPair<H>; KEY_BITS]>,
    public: Box<PublicKey<H>>,
    pkh: H::Output,
}

impl<H: HashFamily> KeyPair<H> {
    /// Derives the full key pair rooted at `secret`
    pub fn derive(secret: Seed) -> Self {
        let pri: Box<[SecretPair<H>; KEY_BITS]> = Box::new(std::array::from_fn(|position| {
            [
                intermediate_secret::<H>(&secret, 2 * position),
                intermediate_secret::<H>(&secret, 2 * position + 1),
            ]
        }));
        let public: Box<PublicKey<H>> = Box::new(std::array::from_fn(|position| {
            let [zero, one] = pri[position];
            [H::digest(zero.as_ref()), H::digest(one.as_ref())]
        }));
        let pkh = public_key_hash::<H>(public.as_slice());

        Self { secret, pri, public, pkh }
    }

    /// Mints a key pair from a fresh random seed
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self::derive(Seed::random(rng))
    }

    /// Seed the key pair was derived from
    pub fn secret(&self) -> &Seed {
        &self.secret
    }

    /// Secret pairs, indexed by bit position
    pub fn pri(&self) -> &[SecretPair<H>; KEY_BITS] {
        &self.pri
    }

    /// Public pairs, indexed by bit position
    pub fn public(&self) -> &PublicKey<H> {
        &self.public
    }

    /// Hash of the serialized public key
    pub fn pkh(&self) -> H::Output {
        self.pkh
    }

    /// Drops the expanded halves, keeping only what is needed to recompute them
    pub fn compress(&self) -> CompressedKeyPair<H> {
        CompressedKeyPair { secret: self.secret, pkh: self.pkh }
    }
}

impl<H: HashFamily> fmt::Debug for KeyPair<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("family", &H::NAME)
            .field("pkh", &self.pkh)
            .finish_non_exhaustive()
    }
}

/// Key pair as persisted: seed plus public key hash
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct CompressedKeyPair<H: HashFamily> {
    /// Seed the key pair is derived from
    pub secret: Seed,
    /// Public key hash bound to the seed
    pub pkh: H::Output,
}

impl<H: HashFamily> CompressedKeyPair<H> {
    /// Re-derives the private and public halves.
    ///
    /// Fails with [KeyError::Integrity](KeyError::Integrity) when the seed no longer produces the
    /// stored public key hash (corrupted or tampered secret).
    pub fn decompress(&self) -> Result<KeyPair<H>, KeyError> {
        let key_pair = KeyPair::<H>::derive(self.secret);
        if key_pair.pkh != self.pkh {
            return Err(KeyError::Integrity {
                expected: format!("{:?}", self.pkh),
                derived: format!("{:?}", key_pair.pkh),
            });
        }
        Ok(key_pair)
    }
}

impl<H: HashFamily> From<&KeyPair<H>> for CompressedKeyPair<H> {
    fn from(value: &KeyPair<H>) -> Self {
        value.compress()
    }
}

/// Hashes the packed `bytesN[2][160]` encoding of a public key.
///
/// Packed arrays pad every element to a full 32-byte slot, so `bytes20` images are right-padded.
pub fn public_key_hash<H: HashFamily>(public: &[PublicPair<H>]) -> H::Output {
    let mut packed = Vec::with_capacity(public.len() * 2 * 32);
    for pair in public {
        for image in pair {
            let bytes = image.as_ref();
            packed.extend_from_slice(bytes);
            packed.resize(packed.len() + 32usize.saturating_sub(bytes.len()), 0);
        }
    }
    H::digest(&packed)
}

fn intermediate_secret<H: HashFamily>(seed: &Seed, index: usize) -> H::Output {
    let combined = [H::word(seed.as_bytes()), H::word(&(index as u64).to_be_bytes())].concat();
    H::digest(&combined)
}
