use crate::{
    error::KeyError,
    hash::{HashFamily, Keccak256},
    key_pair::{CompressedKeyPair, KeyPair},
};
use rand::{rngs::OsRng, CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, info};

/// Persisted form of a [KeyTracker](KeyTracker): compressed keys, oldest unused first
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent, bound = "")]
pub struct TrackerSnapshot<H: HashFamily = Keccak256>(pub Vec<CompressedKeyPair<H>>);

/// FIFO queue of unused one-time keys.
///
/// Keys are stored compressed and leave the queue the moment they are drawn; no API returns a
/// drawn key twice. Drawing is a read-modify-write on the queue, so a tracker must have a single
/// owner (wrap it in a mutex to share it).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyTracker<H: HashFamily = Keccak256> {
    keys: VecDeque<CompressedKeyPair<H>>,
}

impl<H: HashFamily> KeyTracker<H> {
    /// Creates an empty tracker
    pub fn new() -> Self {
        Self { keys: VecDeque::new() }
    }

    /// Rebuilds a tracker from a persisted snapshot
    pub fn from_snapshot(snapshot: TrackerSnapshot<H>) -> Self {
        Self { keys: snapshot.0.into() }
    }

    /// Captures the queue for persistence
    pub fn snapshot(&self) -> TrackerSnapshot<H> {
        TrackerSnapshot(self.keys.iter().copied().collect())
    }

    /// Number of unused keys
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether all keys have been consumed
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Public key hashes of the unused keys, oldest first
    pub fn pkhs(&self) -> Vec<H::Output> {
        self.keys.iter().map(|key| key.pkh).collect()
    }

    /// Mints `amount` fresh keys from the operating system's generator.
    ///
    /// The compressed forms are appended to the queue; the expanded key pairs are returned to the
    /// caller (typically to register their public key hashes with the account).
    pub fn more(&mut self, amount: usize) -> Vec<KeyPair<H>> {
        self.more_with_rng(amount, &mut OsRng)
    }

    /// Same as [more](Self::more) with an explicit generator
    pub fn more_with_rng<R: RngCore + CryptoRng>(
        &mut self,
        amount: usize,
        rng: &mut R,
    ) -> Vec<KeyPair<H>> {
        let minted: Vec<KeyPair<H>> =
            (0..amount).map(|_| KeyPair::generate(&mut *rng)).collect();
        self.keys.extend(minted.iter().map(KeyPair::compress));

        info!("Minted {amount} {} keys, {} unused", H::NAME, self.keys.len());

        minted
    }

    /// Draws the oldest unused key.
    ///
    /// The key is removed before it is expanded, so a corrupted head is discarded and reported
    /// as [KeyError::Integrity](KeyError::Integrity) rather than blocking the queue.
    pub fn get_one(&mut self) -> Result<KeyPair<H>, KeyError> {
        let compressed =
            self.keys.pop_front().ok_or(KeyError::Exhaustion { requested: 1, available: 0 })?;

        debug!("Consumed {} key {:?}, {} unused", H::NAME, compressed.pkh, self.keys.len());

        compressed.decompress()
    }

    /// Draws the `n` oldest unused keys, all or nothing.
    ///
    /// Nothing is consumed when fewer than `n` keys remain or when any of them fails to expand.
    /// A corrupted key therefore keeps failing here until [get_one](Self::get_one) drains it.
    pub fn get_n(&mut self, n: usize) -> Result<Vec<KeyPair<H>>, KeyError> {
        if self.keys.len() < n {
            return Err(KeyError::Exhaustion { requested: n, available: self.keys.len() });
        }

        let expanded = self
            .keys
            .iter()
            .take(n)
            .map(CompressedKeyPair::decompress)
            .collect::<Result<Vec<_>, _>>()?;
        self.keys.drain(..n);

        debug!("Consumed {n} {} keys, {} unused", H::NAME, self.keys.len());

        Ok(expanded)
    }

    /// Moves every key of `other` to the back of the queue, preserving its order
    pub fn append(&mut self, mut other: KeyTracker<H>) {
        self.keys.append(&mut other.keys);

        debug!("Appended {} keys, {} unused", H::NAME, self.keys.len());
    }

    /// Drops the unused keys whose public key hash is in `pkhs`, returning how many were dropped
    pub fn discard(&mut self, pkhs: &[H::Output]) -> usize {
        let before = self.keys.len();
        self.keys.retain(|key| !pkhs.contains(&key.pkh));
        let dropped = before - self.keys.len();

        if dropped > 0 {
            info!("Discarded {dropped} {} keys, {} unused", H::NAME, self.keys.len());
        }

        dropped
    }
}

impl<H: HashFamily> From<TrackerSnapshot<H>> for KeyTracker<H> {
    fn from(value: TrackerSnapshot<H>) -> Self {
        Self::from_snapshot(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::Ripemd160;

    #[test]
    fn more_appends_compressed_keys() {
        let mut tracker = KeyTracker::<Keccak256>::new();
        let minted = tracker.more(3);
        assert_eq!(minted.len(), 3);
        assert_eq!(tracker.len(), 3);
        assert_eq!(tracker.pkhs(), minted.iter().map(KeyPair::pkh).collect::<Vec<_>>());
    }

    #[test]
    fn get_one_on_empty_tracker() {
        let mut tracker = KeyTracker::<Ripemd160>::new();
        assert!(tracker.is_empty());
        assert_eq!(
            tracker.get_one().unwrap_err(),
            KeyError::Exhaustion { requested: 1, available: 0 }
        );
    }

    #[test]
    fn get_n_is_all_or_nothing() {
        let mut tracker = KeyTracker::<Keccak256>::new();
        let minted = tracker.more(2);

        assert_eq!(
            tracker.get_n(3).unwrap_err(),
            KeyError::Exhaustion { requested: 3, available: 2 }
        );
        assert_eq!(tracker.len(), 2);

        let drawn = tracker.get_n(2).unwrap();
        assert_eq!(drawn, minted);
        assert!(tracker.is_empty());
    }

    #[test]
    fn get_n_keeps_queue_on_corruption() {
        let mut tracker = KeyTracker::<Keccak256>::new();
        tracker.more(2);
        let mut snapshot = tracker.snapshot();
        snapshot.0[1].secret.0 .0[0] ^= 0xff;
        let mut tracker = KeyTracker::from_snapshot(snapshot);

        assert!(matches!(tracker.get_n(2), Err(KeyError::Integrity { .. })));
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn corrupted_head_is_discarded_by_get_one() {
        let mut tracker = KeyTracker::<Ripemd160>::new();
        let minted = tracker.more(2);
        let mut snapshot = tracker.snapshot();
        snapshot.0[0].secret.0 .0[5] ^= 0x10;
        let mut tracker = KeyTracker::from_snapshot(snapshot);

        assert!(matches!(tracker.get_one(), Err(KeyError::Integrity { .. })));
        assert_eq!(tracker.get_one().unwrap(), minted[1]);
    }

    #[test]
    fn get_n_recovers_after_get_one_drains_corrupted_head() {
        let mut tracker = KeyTracker::<Keccak256>::new();
        let minted = tracker.more(3);
        let mut snapshot = tracker.snapshot();
        snapshot.0[0].secret.0 .0[0] ^= 0xff;
        let mut tracker = KeyTracker::from_snapshot(snapshot);

        assert!(matches!(tracker.get_n(2), Err(KeyError::Integrity { .. })));
        assert!(matches!(tracker.get_n(2), Err(KeyError::Integrity { .. })));
        assert_eq!(tracker.len(), 3);

        assert!(matches!(tracker.get_one(), Err(KeyError::Integrity { .. })));
        assert_eq!(tracker.get_n(2).unwrap(), minted[1..]);
        assert!(tracker.is_empty());
    }

    #[test]
    fn append_keeps_order() {
        let mut tracker = KeyTracker::<Keccak256>::new();
        let first = tracker.more(1);
        let mut fresh = KeyTracker::<Keccak256>::new();
        let second = fresh.more(2);

        tracker.append(fresh);

        assert_eq!(tracker.len(), 3);
        assert_eq!(
            tracker.pkhs(),
            first.iter().chain(second.iter()).map(KeyPair::pkh).collect::<Vec<_>>()
        );
    }

    #[test]
    fn discard_drops_matching_keys_only() {
        let mut tracker = KeyTracker::<Ripemd160>::new();
        let minted = tracker.more(3);

        assert_eq!(tracker.discard(&[minted[1].pkh(), Default::default()]), 1);
        assert_eq!(tracker.pkhs(), vec![minted[0].pkh(), minted[2].pkh()]);
        assert_eq!(tracker.discard(&[minted[1].pkh()]), 0);
    }
}
