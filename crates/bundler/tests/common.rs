use async_trait::async_trait;
use ethers::types::{Address, U64};
use jsonrpsee::{
    core::RpcResult,
    server::{ServerBuilder, ServerHandle},
    types::{ErrorObject, ErrorObjectOwned},
};
use lamport_bundler::BundlerApiServer;
use lamport_primitives::{constants::entry_point::ADDRESS, UserOperation, UserOperationHash};
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

/// How the mock bundler answers `eth_sendUserOperation`
#[derive(Clone, Debug)]
pub enum Behaviour {
    Accept,
    Reject { code: i32, message: String },
    Stall(Duration),
}

#[derive(Clone, Debug)]
pub struct MockBundler {
    pub entry_points: Vec<String>,
    pub behaviour: Behaviour,
    pub received: Arc<Mutex<Vec<(UserOperation, Address)>>>,
}

impl MockBundler {
    pub fn new(behaviour: Behaviour) -> Self {
        Self {
            entry_points: vec![ADDRESS.to_string()],
            behaviour,
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl BundlerApiServer for MockBundler {
    async fn chain_id(&self) -> RpcResult<U64> {
        Ok(80_001.into())
    }

    async fn supported_entry_points(&self) -> RpcResult<Vec<String>> {
        Ok(self.entry_points.clone())
    }

    async fn send_user_operation(
        &self,
        user_operation: UserOperation,
        entry_point: Address,
    ) -> RpcResult<UserOperationHash> {
        self.received.lock().unwrap().push((user_operation.clone(), entry_point));

        match &self.behaviour {
            Behaviour::Accept => Ok(user_operation.hash(&entry_point, &80_001.into())),
            Behaviour::Reject { code, message } => {
                Err::<_, ErrorObjectOwned>(ErrorObject::owned(*code, message.clone(), None::<bool>))
            }
            Behaviour::Stall(duration) => {
                tokio::time::sleep(*duration).await;
                Ok(UserOperationHash::default())
            }
        }
    }
}

/// Starts the mock bundler on a random port, returning its url
pub async fn start(mock: MockBundler) -> eyre::Result<(String, ServerHandle)> {
    let server = ServerBuilder::default().build("127.0.0.1:0").await?;
    let addr = server.local_addr()?;
    let handle = server.start(mock.into_rpc());
    Ok((format!("http://{addr}"), handle))
}
