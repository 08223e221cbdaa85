use crate::{
    client::{SendUserOperation, Submission},
    error::{SubmissionError, ValidationError},
    report::ValidationReport,
};
use ethers::{providers::Middleware, types::Address};
use lamport_contracts::{EntryPoint, EntryPointError};
use lamport_primitives::UserOperation;
use std::sync::Arc;
use tracing::{info, warn};

/// Executes user operations by sending `handleOps` to the entry point, bypassing the bundler's
/// mempool. The middleware must be able to sign transactions.
#[derive(Clone)]
pub struct DirectClient<M: Middleware + 'static> {
    eth_client: Arc<M>,
    beneficiary: Address,
}

impl<M: Middleware + 'static> DirectClient<M> {
    /// Create a direct client
    ///
    /// # Arguments
    /// * `eth_client` - Signing connection to the Ethereum execution client
    /// * `beneficiary` - Address receiving the gas refund of the batch
    pub fn new(eth_client: Arc<M>, beneficiary: Address) -> Self {
        Self { eth_client, beneficiary }
    }

    pub fn beneficiary(&self) -> Address {
        self.beneficiary
    }
}

/// Simulates validation and classifies the outcome.
///
/// A report with `sig_failed` set and an `AA21`/`AA24` revert are validation errors; any other
/// entry point revert is returned as [ValidationError::FailedOp].
pub async fn simulate<M: Middleware + 'static>(
    entry_point: &EntryPoint<M>,
    uo: &UserOperation,
) -> Result<ValidationReport, SubmissionError> {
    match entry_point.simulate_validation(uo.clone()).await {
        Ok(res) => {
            let report = ValidationReport::from(res);
            if report.sig_failed {
                warn!("Simulation of {:?} reported a signature failure", uo.sender);
                return Err(ValidationError::SignatureFailed { report: Some(report) }.into());
            }
            Ok(report)
        }
        Err(EntryPointError::FailedOp(op)) => {
            warn!("Simulation of {:?} failed: {}", uo.sender, op.reason);
            Err(ValidationError::from_reason(&op.reason).into())
        }
        Err(err) => Err(err.into()),
    }
}

#[async_trait::async_trait]
impl<M: Middleware + 'static> SendUserOperation for DirectClient<M> {
    async fn send_user_operation(
        &self,
        uo: &UserOperation,
        entry_point: Address,
    ) -> Result<Submission, SubmissionError> {
        let entry_point = EntryPoint::new(self.eth_client.clone(), entry_point);
        let report = simulate(&entry_point, uo).await?;

        info!(
            "Simulation passed (pre op gas {}, prefund {}), sending handle ops",
            report.pre_op_gas, report.prefund
        );

        let receipt = entry_point.handle_ops(vec![uo.clone()], self.beneficiary).await?;

        Ok(Submission::Included { report, receipt })
    }
}
