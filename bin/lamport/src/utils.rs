use dirs::home_dir;
use ethers::types::{Address, U256};
use expanded_pathbuf::ExpandedPathBuf;
use lamport_keys::{sign, HashFamily, KeyTracker};
use lamport_primitives::{
    calldata_gas, constants::entry_point::ADDRESS, lamport_digest, pack_lamport_signature,
    UserOperation,
};
use std::{future::Future, str::FromStr, time::Duration};
use tracing::info;

/// Length of a placeholder ECDSA signature (r, s, v)
const ECDSA_SIGNATURE_BYTES: usize = 65;

/// Unwrap path or returns home directory
pub fn unwrap_path_or_home(path: Option<ExpandedPathBuf>) -> eyre::Result<ExpandedPathBuf> {
    if let Some(path) = path {
        Ok(path)
    } else {
        home_dir()
            .map(|h| h.join(".lamport"))
            .ok_or_else(|| eyre::eyre!("Get Home directory error"))
            .map(ExpandedPathBuf)
    }
}

/// Parses address from string
pub fn parse_address(s: &str) -> Result<Address, String> {
    Address::from_str(s).map_err(|_| format!("String {s} is not a valid address"))
}

/// Parses U256 from string
pub fn parse_u256(s: &str) -> Result<U256, String> {
    U256::from_str_radix(s, 10).map_err(|_| format!("String {s} is not a valid U256"))
}

pub fn parse_duration(duration: &str) -> Result<Duration, String> {
    let millis: u64 = duration.parse().map_err(|_| format!("{duration} must be unsigned int"))?;
    Ok(Duration::from_millis(millis))
}

pub fn validate_private_key(hex_string: &str) -> Result<String, String> {
    let hex_string = hex_string.strip_prefix("0x").unwrap_or(hex_string);
    let chars = hex_string.chars();

    if chars.clone().count() != 64 {
        return Err("private key must be 32 bytes of hex".into());
    }

    for c in chars {
        if !c.is_ascii_hexdigit() {
            return Err("private key is not a valid hexadecimal string".into());
        }
    }

    Ok(String::from(hex_string))
}

/// Amount lifting `current` up to `minimum`, if it falls short
pub fn top_up_amount(current: U256, minimum: U256) -> Option<U256> {
    (current < minimum).then(|| minimum - current)
}

/// Calldata gas of a packed user operation signature made with a fresh key of family `H`
pub fn packed_signature_gas<H: HashFamily>(cosign: bool) -> eyre::Result<u64> {
    let mut tracker = KeyTracker::<H>::new();
    tracker.more(1);
    let key_pair = tracker.get_one()?;

    let uo_hash = UserOperation::with_defaults().hash(&ADDRESS.parse()?, &U256::one());
    let signature = sign::<H>(&lamport_digest(&uo_hash).0, key_pair.pri())?;
    let ecdsa = cosign.then(|| vec![0xff; ECDSA_SIGNATURE_BYTES]);
    let packed = pack_lamport_signature::<H>(&signature, key_pair.public(), ecdsa);

    Ok(calldata_gas(&packed))
}

/// Runs the future to completion or until:
/// - `ctrl-c` is received.
/// - `SIGTERM` is received (unix only).
pub async fn run_until_ctrl_c<F, E>(fut: F) -> Result<(), E>
where
    F: Future<Output = Result<(), E>>,
    E: Send + Sync + 'static + From<std::io::Error>,
{
    let ctrl_c = tokio::signal::ctrl_c();

    let mut stream = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
    let sigterm = stream.recv();
    tokio::pin!(sigterm, ctrl_c, fut);

    tokio::select! {
        _ = ctrl_c => {
            info!("Received ctrl-c signal.");
        },
        _ = sigterm => {
            info!("Received SIGTERM signal.");
        },
        res = fut => res?,
    }

    Ok(())
}
