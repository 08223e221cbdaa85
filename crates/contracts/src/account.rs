//! Lamport account factory and account helpers

pub use super::gen::{LamportAccountAPI, LamportAccountFactoryAPI};
use super::{
    error::EntryPointError,
    gen::{
        lamport_account_api::{
            AddPublicKeyHashesCall, ExecuteBatchCall, ExecuteCall, RemovePublicKeyHashesCall,
            TogglePauseCall,
        },
        lamport_account_factory_api::CreateAccountCall,
    },
};
use ethers::{
    abi::AbiEncode,
    providers::Middleware,
    types::{Address, Bytes, H256, U256},
};
use std::sync::Arc;
use tracing::debug;

/// Init code deploying a Lamport account: `factory ‖ createAccount(owner, salt, keys)`
pub fn init_code(
    factory: Address,
    owner: Address,
    salt: U256,
    initial_key_hashes: &[H256],
) -> Bytes {
    let call = CreateAccountCall {
        owner,
        salt,
        first_lamport_keys: initial_key_hashes.iter().map(|pkh| pkh.0).collect(),
    };
    [factory.as_bytes().to_vec(), call.encode()].concat().into()
}

/// Call data transferring `value` to `dest` and calling it with `func`
pub fn execute_call_data(dest: Address, value: U256, func: Bytes) -> Bytes {
    ExecuteCall { dest, value, func }.encode().into()
}

/// Call data for a batch of calls without value
pub fn execute_batch_call_data(dest: Vec<Address>, func: Vec<Bytes>) -> Bytes {
    ExecuteBatchCall { dest, func }.encode().into()
}

/// Call data registering new public key hashes with the account
pub fn add_public_key_hashes_call_data(pkhs: &[H256]) -> Bytes {
    AddPublicKeyHashesCall { public_key_hashes_to_add: pkhs.iter().map(|pkh| pkh.0).collect() }
        .encode()
        .into()
}

/// Call data revoking public key hashes
pub fn remove_public_key_hashes_call_data(pkhs: &[H256]) -> Bytes {
    RemovePublicKeyHashesCall {
        public_key_hashes_to_remove: pkhs.iter().map(|pkh| pkh.0).collect(),
    }
    .encode()
    .into()
}

/// Call data pausing or resuming the account
pub fn toggle_pause_call_data() -> Bytes {
    TogglePauseCall.encode().into()
}

/// Read access to a factory and the accounts it deploys
#[derive(Clone)]
pub struct LamportAccount<M: Middleware + 'static> {
    eth_client: Arc<M>,
    factory: LamportAccountFactoryAPI<M>,
}

impl<M: Middleware + 'static> LamportAccount<M> {
    pub fn new(eth_client: Arc<M>, factory: Address) -> Self {
        let factory = LamportAccountFactoryAPI::new(factory, eth_client.clone());
        Self { eth_client, factory }
    }

    pub fn factory(&self) -> Address {
        self.factory.address()
    }

    /// Counterfactual address of the account `owner` would get with `salt` and the initial keys
    pub async fn counterfactual_address(
        &self,
        owner: Address,
        salt: U256,
        initial_key_hashes: &[H256],
    ) -> Result<Address, EntryPointError> {
        let keys = initial_key_hashes.iter().map(|pkh| pkh.0).collect();
        let res = self.factory.get_address(owner, salt, keys).call().await;

        match res {
            Ok(address) => {
                debug!("Counterfactual address for {owner:?} is {address:?}");
                Ok(address)
            }
            Err(err) => {
                Err(EntryPointError::Other { inner: format!("get address error: {err:?}") })
            }
        }
    }

    /// Whether code is deployed at `account`
    pub async fn is_deployed(&self, account: Address) -> Result<bool, EntryPointError> {
        let code = self
            .eth_client
            .get_code(account, None)
            .await
            .map_err(|err| EntryPointError::Provider { inner: err.to_string() })?;
        Ok(!code.is_empty())
    }

    /// Number of public key hashes the deployed account still accepts
    pub async fn live_key_count(&self, account: Address) -> Result<U256, EntryPointError> {
        let res =
            LamportAccountAPI::new(account, self.eth_client.clone()).live_key_count().call().await;

        match res {
            Ok(count) => Ok(count),
            Err(err) => {
                Err(EntryPointError::Other { inner: format!("live key count error: {err:?}") })
            }
        }
    }
}
