//! Submission of Lamport-signed user operations, through a bundler or directly to the entry point

mod api;
mod client;
mod direct;
mod error;
mod relay;
mod report;

pub use api::{BundlerApiClient, BundlerApiServer};
pub use client::{BundlerClient, SendMode, SendUserOperation, Submission};
pub use direct::{simulate, DirectClient};
pub use error::{rpc_error_codes, SubmissionError, ValidationError};
pub use relay::RelayClient;
pub use report::{StakeInfo, ValidationReport};
