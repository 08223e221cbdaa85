//! Origin record of a Lamport account: where it lives, how it was created and its unused keys

use crate::{
    constants::account::{RECORD_EXTENSION, RECORD_PREFIX},
    utils::as_checksum_addr,
};
use ethers::{
    types::{Address, H256},
    utils::to_checksum,
};
use lamport_keys::{Keccak256, KeyTracker, TrackerSnapshot};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised while persisting or loading an account record
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no account record for {counterfactual:?} in {dir}")]
    NotFound { counterfactual: Address, dir: String },
}

/// Everything needed to reconstruct and operate a Lamport account
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDetails {
    /// Counterfactual (create2) address of the account
    #[serde(serialize_with = "as_checksum_addr")]
    pub counterfactual: Address,

    /// Factory deploying the account
    #[serde(serialize_with = "as_checksum_addr")]
    pub factory: Address,

    /// Unused keys, oldest first
    pub keys: TrackerSnapshot<Keccak256>,

    /// Public key hashes the account was created with
    pub initial_key_hashes: Vec<H256>,

    /// ECDSA owner of the account
    #[serde(serialize_with = "as_checksum_addr")]
    pub signer_address: Address,

    /// Salt used by the factory
    pub salt: u64,

    /// Chain id of the network the account lives on
    pub network: u64,
}

impl AccountDetails {
    /// Creates a record for a freshly minted account
    pub fn new(
        counterfactual: Address,
        factory: Address,
        tracker: &KeyTracker<Keccak256>,
        signer_address: Address,
        salt: u64,
        network: u64,
    ) -> Self {
        Self {
            counterfactual,
            factory,
            keys: tracker.snapshot(),
            initial_key_hashes: tracker.pkhs(),
            signer_address,
            salt,
            network,
        }
    }

    /// Rebuilds the key tracker from the stored snapshot
    pub fn tracker(&self) -> KeyTracker<Keccak256> {
        KeyTracker::from_snapshot(self.keys.clone())
    }

    /// Replaces the stored keys with the tracker's current queue
    pub fn update_keys(&mut self, tracker: &KeyTracker<Keccak256>) {
        self.keys = tracker.snapshot();
    }

    /// File name of the record
    pub fn file_name(&self) -> String {
        format!("{RECORD_PREFIX}{}.{RECORD_EXTENSION}", to_checksum(&self.counterfactual, None))
    }

    /// Writes the record into `dir`, creating the directory if needed.
    ///
    /// The record is written to a temporary file in the same directory and renamed over the
    /// previous version, so a crash never leaves a truncated record behind.
    pub fn save(&self, dir: &Path) -> Result<PathBuf, AccountError> {
        fs::create_dir_all(dir)?;

        let path = dir.join(self.file_name());
        let mut file = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut file, self)?;
        file.flush()?;
        file.as_file().sync_all()?;
        file.persist(&path).map_err(|err| AccountError::Io(err.error))?;

        info!("Account record saved to {path:?} ({} unused keys)", self.keys.0.len());

        Ok(path)
    }

    /// Loads the record of `counterfactual` from `dir`
    pub fn load(dir: &Path, counterfactual: &Address) -> Result<Self, AccountError> {
        let needle = format!("{counterfactual:x}");

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_lowercase();
            if !name.starts_with(&RECORD_PREFIX.to_lowercase()) || !name.contains(&needle) {
                continue;
            }

            debug!("Loading account record {:?}", entry.path());

            let details: Self = serde_json::from_slice(&fs::read(entry.path())?)?;
            return Ok(details);
        }

        Err(AccountError::NotFound {
            counterfactual: *counterfactual,
            dir: dir.display().to_string(),
        })
    }
}
