pub use super::{
    error::EntryPointError,
    gen::{EntryPointAPI, UserOperationEventFilter},
};
use super::{
    error::decode_revert_error,
    gen::entry_point_api::{DepositInfo, EntryPointAPIErrors, UserOperation, ValidationResult},
};
use ethers::{
    contract::parse_log,
    prelude::ContractError,
    providers::Middleware,
    types::{Address, TransactionReceipt, H256, U256},
};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct EntryPoint<M: Middleware + 'static> {
    eth_client: Arc<M>,
    address: Address,
    entry_point_api: EntryPointAPI<M>,
}

impl<M: Middleware + 'static> EntryPoint<M> {
    pub fn new(eth_client: Arc<M>, address: Address) -> Self {
        let entry_point_api = EntryPointAPI::new(address, eth_client.clone());
        Self { eth_client, address, entry_point_api }
    }

    pub fn eth_client(&self) -> Arc<M> {
        self.eth_client.clone()
    }

    pub fn address(&self) -> Address {
        self.address
    }

    fn deserialize_error_msg(
        err: ContractError<M>,
    ) -> Result<EntryPointAPIErrors, EntryPointError> {
        match err {
            ContractError::DecodingError(e) => {
                Err(EntryPointError::Decode { inner: e.to_string() })
            }
            ContractError::AbiError(e) => Err(EntryPointError::ABI { inner: e.to_string() }),
            ContractError::MiddlewareError { e } => EntryPointError::from_middleware_error::<M>(e),
            ContractError::ProviderError { e } => EntryPointError::from_provider_error(&e),
            ContractError::Revert(data) => decode_revert_error(data),
            _ => Err(EntryPointError::Other { inner: err.to_string() }),
        }
    }

    /// Runs the entry point's validation of a user operation without executing it.
    ///
    /// `simulateValidation` always reverts; a `ValidationResult` revert is the successful outcome
    /// and a `FailedOp` revert is returned as [EntryPointError::FailedOp].
    pub async fn simulate_validation<U: Into<UserOperation>>(
        &self,
        uo: U,
    ) -> Result<ValidationResult, EntryPointError> {
        let res = self.entry_point_api.simulate_validation(uo.into()).call().await;

        match res {
            Ok(_) => Err(EntryPointError::NoRevert { function: "simulate_validation".into() }),
            Err(e) => Self::deserialize_error_msg(e).and_then(|op| match op {
                EntryPointAPIErrors::FailedOp(err) => Err(EntryPointError::FailedOp(err)),
                EntryPointAPIErrors::ValidationResult(res) => {
                    debug!(
                        "Simulated validation, pre op gas {:?}, prefund {:?}",
                        res.return_info.0, res.return_info.1
                    );
                    Ok(res)
                }
                _ => Err(EntryPointError::Other {
                    inner: format!("simulate validation error: {op:?}"),
                }),
            }),
        }
    }

    /// Sends a `handleOps` transaction and waits for its receipt
    pub async fn handle_ops<U: Into<UserOperation>>(
        &self,
        uos: Vec<U>,
        beneficiary: Address,
    ) -> Result<Option<TransactionReceipt>, EntryPointError> {
        let call = self
            .entry_point_api
            .handle_ops(uos.into_iter().map(|u| u.into()).collect(), beneficiary);

        let pending = call.send().await.map_err(|e| match Self::deserialize_error_msg(e) {
            Ok(EntryPointAPIErrors::FailedOp(err)) => EntryPointError::FailedOp(err),
            Ok(op) => EntryPointError::Other { inner: format!("handle ops error: {op:?}") },
            Err(err) => err,
        })?;

        info!("Sent handle ops transaction {:?}", pending.tx_hash());

        pending.await.map_err(|err| EntryPointError::Provider { inner: err.to_string() })
    }

    pub async fn get_deposit_info(&self, addr: &Address) -> Result<DepositInfo, EntryPointError> {
        let res = self.entry_point_api.get_deposit_info(*addr).call().await;

        match res {
            Ok(deposit_info) => Ok(deposit_info),
            Err(err) => {
                Err(EntryPointError::Other { inner: format!("get deposit info error: {err:?}") })
            }
        }
    }

    pub async fn balance_of(&self, addr: &Address) -> Result<U256, EntryPointError> {
        let res = self.entry_point_api.balance_of(*addr).call().await;

        match res {
            Ok(balance) => Ok(balance),
            Err(err) => Err(EntryPointError::Other { inner: format!("balance of error: {err:?}") }),
        }
    }

    pub async fn get_nonce(&self, address: &Address, key: U256) -> Result<U256, EntryPointError> {
        let res = self.entry_point_api.get_nonce(*address, key).call().await;

        match res {
            Ok(nonce) => Ok(nonce),
            Err(err) => Err(EntryPointError::Other { inner: format!("get nonce error: {err:?}") }),
        }
    }

    /// Hash of the user operation as computed by the entry point contract
    pub async fn get_user_op_hash<U: Into<UserOperation>>(
        &self,
        uo: U,
    ) -> Result<H256, EntryPointError> {
        let res = self.entry_point_api.get_user_op_hash(uo.into()).call().await;

        match res {
            Ok(hash) => Ok(H256::from(hash)),
            Err(err) => {
                Err(EntryPointError::Other { inner: format!("get user op hash error: {err:?}") })
            }
        }
    }

    /// Adds `value` wei to the entry point deposit of `account` and waits for the receipt
    pub async fn deposit_to(
        &self,
        account: &Address,
        value: U256,
    ) -> Result<Option<TransactionReceipt>, EntryPointError> {
        let call = self.entry_point_api.deposit_to(*account).value(value);

        let pending = call.send().await.map_err(|e| match Self::deserialize_error_msg(e) {
            Ok(op) => EntryPointError::Other { inner: format!("deposit to error: {op:?}") },
            Err(err) => err,
        })?;

        info!("Sent deposit of {value} wei for {account:?} in {:?}", pending.tx_hash());

        pending.await.map_err(|err| EntryPointError::Provider { inner: err.to_string() })
    }

    /// `UserOperationEvent`s emitted by this entry point in `receipt`
    pub fn user_operation_events(
        &self,
        receipt: &TransactionReceipt,
    ) -> Vec<UserOperationEventFilter> {
        receipt
            .logs
            .iter()
            .filter(|log| log.address == self.address)
            .filter_map(|log| parse_log::<UserOperationEventFilter>(log.clone()).ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::{
        abi::{self, Token},
        contract::EthEvent,
        providers::{Http, Provider},
        types::Log,
    };
    use lamport_primitives::{constants::entry_point, UserOperation};

    fn user_operation_log(address: Address, uo_hash: H256, sender: Address, success: bool) -> Log {
        Log {
            address,
            topics: vec![
                UserOperationEventFilter::signature(),
                uo_hash,
                H256::from(sender),
                H256::zero(),
            ],
            data: abi::encode(&[
                Token::Uint(U256::one()),
                Token::Bool(success),
                Token::Uint(U256::from(21_000)),
                Token::Uint(U256::from(7_000)),
            ])
            .into(),
            ..Default::default()
        }
    }

    #[test]
    fn user_operation_events_from_receipt() {
        let (provider, _) = Provider::mocked();
        let address: Address = entry_point::ADDRESS.parse().unwrap();
        let ep = EntryPoint::new(Arc::new(provider), address);

        let sender = Address::repeat_byte(0x11);
        let uo_hash = H256::repeat_byte(0x22);
        let receipt = TransactionReceipt {
            logs: vec![
                user_operation_log(Address::repeat_byte(0x33), H256::repeat_byte(0x44), sender, true),
                Log { address, topics: vec![H256::repeat_byte(0x55)], ..Default::default() },
                user_operation_log(address, uo_hash, sender, false),
            ],
            ..Default::default()
        };

        let events = ep.user_operation_events(&receipt);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].user_op_hash, <[u8; 32]>::from(uo_hash));
        assert_eq!(events[0].sender, sender);
        assert_eq!(events[0].paymaster, Address::zero());
        assert_eq!(events[0].nonce, U256::one());
        assert!(!events[0].success);
        assert_eq!(events[0].actual_gas_cost, U256::from(21_000));
    }

    #[tokio::test]
    #[ignore]
    async fn simulate_validation() {
        let eth_client = Arc::new(Provider::try_from("http://127.0.0.1:8545").unwrap());
        let ep = EntryPoint::<Provider<Http>>::new(
            eth_client.clone(),
            entry_point::ADDRESS.parse().unwrap(),
        );

        let uo = UserOperation::with_defaults()
            .sender("0xBBe6a3230Ef8abC44EF61B3fBf93Cd0394D1d21f".parse().unwrap());

        let res = ep.simulate_validation(uo.clone()).await;
        assert!(matches!(res, Ok(_) | Err(EntryPointError::FailedOp(_))));

        let nonce = ep.get_nonce(&uo.sender, U256::zero()).await.unwrap();
        assert_eq!(nonce, U256::zero());
    }

    #[tokio::test]
    #[ignore]
    async fn deposit_to() {
        let eth_client = Provider::<Http>::try_from("http://127.0.0.1:8545").unwrap();
        let accounts = eth_client.get_accounts().await.unwrap();
        let eth_client = Arc::new(eth_client.with_sender(accounts[0]));
        let ep = EntryPoint::new(eth_client, entry_point::ADDRESS.parse().unwrap());

        let account = Address::repeat_byte(0x42);
        let before = ep.balance_of(&account).await.unwrap();
        let receipt = ep.deposit_to(&account, U256::exp10(15)).await.unwrap();

        assert!(receipt.is_some());
        assert_eq!(ep.balance_of(&account).await.unwrap(), before + U256::exp10(15));
    }
}
