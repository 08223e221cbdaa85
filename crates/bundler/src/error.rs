use crate::report::ValidationReport;
use ethers::types::Address;
use lamport_contracts::EntryPointError;
use thiserror::Error;

/// JSON-RPC error codes defined by ERC-4337
pub mod rpc_error_codes {
    /// Validation of the user operation failed (simulation reverted)
    pub const VALIDATION: i32 = -32500;
    /// The account rejected the signature
    pub const SIGNATURE: i32 = -32507;
}

/// Validation of a user operation failed during simulation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The account reported a signature failure
    #[error("signature validation failed")]
    SignatureFailed {
        /// Simulation payload, when the entry point returned one
        report: Option<ValidationReport>,
    },

    /// The account (or paymaster) cannot pay for the user operation
    #[error("insufficient prefund: {reason}")]
    InsufficientPrefund {
        /// Reason reported by the entry point
        reason: String,
    },

    /// Any other validation revert
    #[error("validation failed: {reason}")]
    FailedOp {
        /// Reason reported by the entry point
        reason: String,
    },
}

impl ValidationError {
    /// Classifies an entry point `FailedOp` reason (`AAxx ...`)
    pub fn from_reason(reason: &str) -> Self {
        if reason.starts_with("AA21") {
            Self::InsufficientPrefund { reason: reason.into() }
        } else if reason.starts_with("AA24") {
            Self::SignatureFailed { report: None }
        } else {
            Self::FailedOp { reason: reason.into() }
        }
    }
}

/// Submission of a user operation failed
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// Simulation rejected the user operation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The bundler does not serve the requested entry point
    #[error("entry point {entry_point:?} not supported by the bundler (supported: {supported:?})")]
    UnsupportedEntryPoint {
        /// Requested entry point
        entry_point: Address,
        /// Entry points the bundler serves
        supported: Vec<String>,
    },

    /// The bundler rejected the request
    #[error("bundler rejected the request ({code}): {message}")]
    Rejected {
        /// JSON-RPC error code
        code: i32,
        /// JSON-RPC error message
        message: String,
        /// JSON-RPC error data, serialized
        data: Option<String>,
    },

    /// The bundler did not answer in time
    #[error("bundler request timed out")]
    Timeout,

    /// Connection or protocol failure
    #[error("transport error: {inner}")]
    Transport {
        /// The inner error message
        inner: String,
    },

    /// Direct submission through the entry point failed
    #[error(transparent)]
    EntryPoint(#[from] EntryPointError),
}
