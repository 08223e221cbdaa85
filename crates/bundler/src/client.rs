use crate::{
    direct::DirectClient, error::SubmissionError, relay::RelayClient, report::ValidationReport,
};
use ethers::{
    providers::Middleware,
    types::{Address, TransactionReceipt},
};
use lamport_contracts::EntryPoint;
use lamport_primitives::{UserOperation, UserOperationHash};
use std::{sync::Arc, time::Duration};
use tracing::debug;

/// A trait for submitting a signed user operation
#[async_trait::async_trait]
pub trait SendUserOperation: Send + Sync + 'static {
    /// Submit a signed [UserOperation](UserOperation) for the given entry point
    ///
    /// # Arguments
    /// * `uo` - The signed user operation
    /// * `entry_point` - Entry point the user operation was signed for
    ///
    /// # Returns
    /// * `Submission` - Acceptance handle or receipt
    async fn send_user_operation(
        &self,
        uo: &UserOperation,
        entry_point: Address,
    ) -> Result<Submission, SubmissionError>;
}

/// Where signed user operations are sent
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SendMode {
    /// Through a bundler's intake RPC
    Relayed {
        /// HTTP endpoint of the bundler
        url: String,
        /// Time to wait for each bundler response
        timeout: Duration,
    },
    /// Straight to the entry point, as a single-operation batch
    Direct {
        /// Address receiving the gas refund of the batch
        beneficiary: Address,
    },
}

/// Result of a successful submission
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Submission {
    /// The bundler accepted the user operation into its pool
    Accepted {
        /// Hash the bundler assigned to the user operation
        uo_hash: UserOperationHash,
    },
    /// The user operation was executed by a `handleOps` transaction
    Included {
        /// Outcome of the simulation preceding the transaction
        report: ValidationReport,
        /// Receipt of the transaction, `None` if it was dropped
        receipt: Option<TransactionReceipt>,
    },
}

/// Submits signed user operations, relayed or direct. No retries are attempted.
#[derive(Clone)]
pub struct BundlerClient<M: Middleware + 'static> {
    mode: SendMode,
    eth_client: Arc<M>,
    sender: Arc<dyn SendUserOperation>,
}

impl<M: Middleware + 'static> BundlerClient<M> {
    /// Create a bundler client
    ///
    /// # Arguments
    /// * `mode` - Relayed or direct submission
    /// * `eth_client` - Connection to the Ethereum execution client (must sign in direct mode)
    pub fn new(mode: SendMode, eth_client: Arc<M>) -> Result<Self, SubmissionError> {
        let sender: Arc<dyn SendUserOperation> = match &mode {
            SendMode::Relayed { url, timeout } => {
                Arc::new(RelayClient::new(url.clone(), *timeout)?)
            }
            SendMode::Direct { beneficiary } => {
                Arc::new(DirectClient::new(eth_client.clone(), *beneficiary))
            }
        };
        Ok(Self { mode, eth_client, sender })
    }

    pub fn mode(&self) -> &SendMode {
        &self.mode
    }

    /// Submit a signed user operation
    pub async fn submit(
        &self,
        uo: &UserOperation,
        entry_point: Address,
    ) -> Result<Submission, SubmissionError> {
        debug!("Submitting user operation of {:?} ({:?})", uo.sender, self.mode);
        self.sender.send_user_operation(uo, entry_point).await
    }

    /// Simulate validation of a user operation against the entry point
    pub async fn simulate(
        &self,
        uo: &UserOperation,
        entry_point: Address,
    ) -> Result<ValidationReport, SubmissionError> {
        crate::direct::simulate(&EntryPoint::new(self.eth_client.clone(), entry_point), uo).await
    }
}
