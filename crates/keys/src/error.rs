use thiserror::Error;

/// Errors raised while minting, drawing or using one-time keys
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// The tracker holds fewer unused keys than requested
    #[error("no keys left: requested {requested}, available {available}")]
    Exhaustion {
        /// Number of keys requested
        requested: usize,
        /// Number of keys still in the tracker
        available: usize,
    },

    /// The public key hash recomputed from a secret does not match the stored one
    #[error("public key hash does not match secret: expected {expected}, derived {derived}")]
    Integrity {
        /// Stored public key hash
        expected: String,
        /// Public key hash derived from the stored secret
        derived: String,
    },

    /// A digest or private key violates the 160-position layout
    #[error("malformed input: {inner}")]
    MalformedInput {
        /// The inner error message
        inner: String,
    },
}

impl KeyError {
    pub(crate) fn malformed(inner: impl Into<String>) -> Self {
        Self::MalformedInput { inner: inner.into() }
    }
}
