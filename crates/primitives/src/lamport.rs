//! Lamport signatures over user operations

use crate::user_operation::{UserOperation, UserOperationHash};
use ethers::{
    abi::{self, ParamType, Token},
    signers::LocalWallet,
    types::{Address, Bytes, U256},
    utils::hash_message,
};
use lamport_keys::{
    sign, verify, Digest160, HashFamily, KeyError, KeyTracker, PublicKey, Signature,
    DIGEST_BYTES, KEY_BITS,
};
use thiserror::Error;
use tracing::{debug, trace};

/// Errors raised while signing or unpacking a user operation
#[derive(Debug, Error)]
pub enum SigningError {
    /// Key material could not be drawn or used
    #[error(transparent)]
    Key(#[from] KeyError),

    /// The ECDSA co-signer failed
    #[error("co-signer error: {inner}")]
    Wallet { inner: String },

    /// The signature field is not a packed Lamport signature
    #[error("signature decode error: {inner}")]
    Decode { inner: String },
}

/// Reduces a user operation hash to the 160-bit digest signed by the Lamport key.
///
/// The hash is wrapped as an Ethereum personal message and the low 20 bytes of the result are
/// kept.
pub fn lamport_digest(uo_hash: &UserOperationHash) -> Digest160 {
    let message = hash_message(uo_hash.as_bytes());
    let mut digest = [0u8; DIGEST_BYTES];
    digest.copy_from_slice(&message.as_bytes()[32 - DIGEST_BYTES..]);
    Digest160(digest)
}

/// Signs the user operation with the oldest unused key of `tracker`.
///
/// The key is consumed even if the signed operation is never submitted, so the caller must
/// persist the tracker before handing the result to a bundler. The returned operation carries
/// `abi.encode(bytes[160] revealed, bytesN[2][160] public)` as its signature, followed by the
/// co-signer's ECDSA signature when one is given.
///
/// # Arguments
/// * `uo` - The user operation to sign; its signature field is replaced
/// * `cosigner` - Optional ECDSA co-signer
/// * `entry_point` - Address of the entry point the operation is meant for
/// * `chain_id` - Chain the operation is meant for
/// * `tracker` - Key queue the signing key is drawn from
///
/// # Returns
/// * `UserOperation` - A new user operation; the input is left untouched
pub fn attach_lamport_signature<H: HashFamily>(
    uo: &UserOperation,
    cosigner: Option<&LocalWallet>,
    entry_point: &Address,
    chain_id: &U256,
    tracker: &mut KeyTracker<H>,
) -> Result<UserOperation, SigningError> {
    let uo_hash = uo.hash(entry_point, chain_id);

    let ecdsa = cosigner
        .map(|wallet| {
            wallet
                .sign_hash(hash_message(uo_hash.as_bytes()))
                .map(|sig| sig.to_vec())
                .map_err(|err| SigningError::Wallet { inner: err.to_string() })
        })
        .transpose()?;

    let key_pair = tracker.get_one()?;
    let digest = lamport_digest(&uo_hash);
    let signature = sign::<H>(&digest.0, key_pair.pri())?;

    debug!(
        "Signed user operation {:?} of {:?} with {} key {:?}",
        uo_hash.0,
        uo.sender,
        H::NAME,
        key_pair.pkh()
    );

    Ok(uo.clone().signature(pack_lamport_signature::<H>(&signature, key_pair.public(), ecdsa)))
}

/// ABI-encodes a Lamport signature with its public key and an optional ECDSA signature
pub fn pack_lamport_signature<H: HashFamily>(
    signature: &Signature<H>,
    public: &PublicKey<H>,
    ecdsa: Option<Vec<u8>>,
) -> Bytes {
    let revealed = Token::FixedArray(
        signature.secrets().iter().map(|secret| Token::Bytes(secret.as_ref().to_vec())).collect(),
    );
    let public = Token::FixedArray(
        public
            .iter()
            .map(|pair| {
                Token::FixedArray(
                    pair.iter().map(|image| Token::FixedBytes(image.as_ref().to_vec())).collect(),
                )
            })
            .collect(),
    );

    let mut tokens = vec![revealed, public];
    if let Some(ecdsa) = ecdsa {
        tokens.push(Token::Bytes(ecdsa));
    }

    trace!("Packing {} signature ({} tokens)", H::NAME, tokens.len());

    abi::encode(&tokens).into()
}

/// Decodes the revealed secrets and public key from a packed signature field
pub fn unpack_lamport_signature<H: HashFamily>(
    packed: &[u8],
) -> Result<(Signature<H>, Box<PublicKey<H>>), SigningError> {
    let types = [
        ParamType::FixedArray(Box::new(ParamType::Bytes), KEY_BITS),
        ParamType::FixedArray(
            Box::new(ParamType::FixedArray(Box::new(ParamType::FixedBytes(H::OUTPUT_BYTES)), 2)),
            KEY_BITS,
        ),
    ];
    let mut tokens = abi::decode(&types, packed)
        .map_err(|err| SigningError::Decode { inner: err.to_string() })?
        .into_iter();

    let (Some(Token::FixedArray(revealed)), Some(Token::FixedArray(public))) =
        (tokens.next(), tokens.next())
    else {
        return Err(decode_error("unexpected token layout"));
    };

    let secrets = revealed
        .into_iter()
        .map(|token| match token {
            Token::Bytes(bytes) if bytes.len() == H::OUTPUT_BYTES => {
                Ok(H::output_from_slice(&bytes))
            }
            other => Err(decode_error(format!("invalid revealed secret {other:?}"))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let pairs = public
        .into_iter()
        .map(|token| match token {
            Token::FixedArray(images) => match images.as_slice() {
                [Token::FixedBytes(zero), Token::FixedBytes(one)] => {
                    Ok([H::output_from_slice(zero), H::output_from_slice(one)])
                }
                _ => Err(decode_error("invalid public pair")),
            },
            other => Err(decode_error(format!("invalid public pair {other:?}"))),
        })
        .collect::<Result<Vec<_>, _>>()?;
    let public: Box<PublicKey<H>> = pairs
        .into_boxed_slice()
        .try_into()
        .map_err(|_| decode_error("public key does not cover every bit position"))?;

    Ok((Signature::from_secrets(&secrets)?, public))
}

/// Verifies the Lamport signature carried by a user operation against the public key hash the
/// account has bound
pub fn verify_user_operation<H: HashFamily>(
    uo: &UserOperation,
    entry_point: &Address,
    chain_id: &U256,
    expected_pkh: &H::Output,
) -> Result<bool, SigningError> {
    let (signature, public) = unpack_lamport_signature::<H>(&uo.signature)?;
    let digest = lamport_digest(&uo.hash(entry_point, chain_id));
    Ok(verify::<H>(&digest.0, &signature, public.as_slice(), expected_pkh))
}

fn decode_error(inner: impl Into<String>) -> SigningError {
    SigningError::Decode { inner: inner.into() }
}
