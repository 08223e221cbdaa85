use crate::{
    api::BundlerApiClient,
    client::{SendUserOperation, Submission},
    error::{rpc_error_codes, SubmissionError, ValidationError},
};
use ethers::types::Address;
use jsonrpsee::{
    core::Error as RpcError,
    http_client::{HttpClient, HttpClientBuilder},
};
use lamport_primitives::UserOperation;
use std::time::Duration;
use tracing::{info, trace};

/// Sends user operations to a bundler's intake (`eth_sendUserOperation`)
#[derive(Clone, Debug)]
pub struct RelayClient {
    url: String,
    client: HttpClient,
}

impl RelayClient {
    /// Create a client for the bundler at `url`
    ///
    /// # Arguments
    /// * `url` - HTTP endpoint of the bundler
    /// * `timeout` - Time to wait for each response
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, SubmissionError> {
        let url = url.into();
        let client = HttpClientBuilder::default()
            .request_timeout(timeout)
            .build(&url)
            .map_err(from_rpc_error)?;
        Ok(Self { url, client })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Entry points served by the bundler
    pub async fn supported_entry_points(&self) -> Result<Vec<String>, SubmissionError> {
        self.client.supported_entry_points().await.map_err(from_rpc_error)
    }
}

#[async_trait::async_trait]
impl SendUserOperation for RelayClient {
    async fn send_user_operation(
        &self,
        uo: &UserOperation,
        entry_point: Address,
    ) -> Result<Submission, SubmissionError> {
        let supported = self.supported_entry_points().await?;
        let served = supported
            .iter()
            .any(|ep| ep.parse::<Address>().map(|ep| ep == entry_point).unwrap_or(false));
        if !served {
            return Err(SubmissionError::UnsupportedEntryPoint { entry_point, supported });
        }

        trace!("Sending user operation {uo:?} to {}", self.url);

        let uo_hash = self
            .client
            .send_user_operation(uo.clone(), entry_point)
            .await
            .map_err(from_rpc_error)?;

        info!("Bundler {} accepted user operation {:?}", self.url, uo_hash.0);

        Ok(Submission::Accepted { uo_hash })
    }
}

/// Maps a JSON-RPC client error onto the submission taxonomy
pub(crate) fn from_rpc_error(err: RpcError) -> SubmissionError {
    match err {
        RpcError::Call(obj) => {
            let data = obj.data().map(|data| data.get().to_string());
            match obj.code() {
                rpc_error_codes::SIGNATURE => ValidationError::SignatureFailed {
                    report: data.and_then(|data| serde_json::from_str(&data).ok()),
                }
                .into(),
                rpc_error_codes::VALIDATION if obj.message().contains("AA21") => {
                    ValidationError::InsufficientPrefund { reason: obj.message().into() }.into()
                }
                code => SubmissionError::Rejected { code, message: obj.message().into(), data },
            }
        }
        RpcError::RequestTimeout => SubmissionError::Timeout,
        other => SubmissionError::Transport { inner: other.to_string() },
    }
}
