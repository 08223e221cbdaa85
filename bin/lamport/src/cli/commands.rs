use crate::{
    cli::args::{NodeArgs, SubmitArgs},
    utils::{packed_signature_gas, parse_address, parse_u256, top_up_amount},
};
use alloy_chains::Chain;
use clap::Parser;
use ethers::{
    middleware::SignerMiddleware,
    providers::Middleware,
    signers::Signer,
    types::{Address, Bytes, TransactionRequest, H256, U256},
    utils::{format_ether, to_checksum},
};
use lamport_bundler::{BundlerClient, Submission};
use lamport_contracts::{
    account::{
        add_public_key_hashes_call_data, execute_batch_call_data, execute_call_data,
        remove_public_key_hashes_call_data, toggle_pause_call_data,
    },
    init_code, EntryPoint, LamportAccount,
};
use lamport_keys::{Keccak256, KeyTracker, Ripemd160};
use lamport_primitives::{
    attach_lamport_signature,
    constants::account::{INITIAL_KEYS, MIN_BALANCE, MIN_DEPOSIT},
    AccountDetails, GasComparison, Staged, UserOperation, UserOperationPartial,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Create account command
#[derive(Debug, Parser)]
pub struct CreateAccountCommand {
    /// Node args
    #[clap(flatten)]
    node: NodeArgs,

    /// Lamport account factory address.
    #[clap(long, value_parser=parse_address)]
    factory: Address,

    /// Salt passed to the factory.
    #[clap(long, default_value_t = 0)]
    salt: u64,

    /// Number of keys registered at deployment.
    #[clap(long, default_value_t = INITIAL_KEYS)]
    keys: usize,
}

impl CreateAccountCommand {
    /// Execute the command
    pub async fn execute(self) -> eyre::Result<()> {
        let owner = self.node.wallet()?.address();
        let eth_client = Arc::new(self.node.provider()?);
        let chain = Chain::from_id(eth_client.get_chainid().await?.as_u64());

        let mut tracker = KeyTracker::<Keccak256>::new();
        tracker.more(self.keys);

        let counterfactual = LamportAccount::new(eth_client, self.factory)
            .counterfactual_address(owner, self.salt.into(), &tracker.pkhs())
            .await?;

        let details = AccountDetails::new(
            counterfactual,
            self.factory,
            &tracker,
            owner,
            self.salt,
            chain.id(),
        );
        let path = details.save(&self.node.keys_dir()?)?;

        info!(
            "Account {} on {chain} created with {} keys, record at {path:?}",
            to_checksum(&counterfactual, None),
            self.keys
        );

        Ok(())
    }
}

/// Add keys command
#[derive(Debug, Parser)]
pub struct AddKeysCommand {
    /// Node args
    #[clap(flatten)]
    node: NodeArgs,

    /// Submission args
    #[clap(flatten)]
    submit: SubmitArgs,

    /// Account address.
    #[clap(long, value_parser=parse_address)]
    account: Address,

    /// Number of keys to mint.
    #[clap(long, default_value_t = INITIAL_KEYS)]
    count: usize,
}

impl AddKeysCommand {
    /// Execute the command
    ///
    /// The fresh keys join the account record only once the registering call has landed.
    pub async fn execute(self) -> eyre::Result<()> {
        let mut details = AccountDetails::load(&self.node.keys_dir()?, &self.account)?;
        let mut tracker = details.tracker();

        let mut fresh = KeyTracker::<Keccak256>::new();
        let pkhs: Vec<_> = fresh.more(self.count).iter().map(|key_pair| key_pair.pkh()).collect();
        let call_data = add_public_key_hashes_call_data(&pkhs);

        let landed =
            sign_and_submit(&self.node, &self.submit, &mut details, &mut tracker, call_data)
                .await?;
        if !landed {
            warn!("Registration of {} keys not confirmed, fresh keys dropped", pkhs.len());
            return Ok(());
        }

        tracker.append(fresh);
        details.update_keys(&tracker);
        details.save(&self.node.keys_dir()?)?;

        info!("Registered {} keys, {} unused keys left", pkhs.len(), tracker.len());

        Ok(())
    }
}

/// Remove keys command
#[derive(Debug, Parser)]
pub struct RemoveKeysCommand {
    /// Node args
    #[clap(flatten)]
    node: NodeArgs,

    /// Submission args
    #[clap(flatten)]
    submit: SubmitArgs,

    /// Account address.
    #[clap(long, value_parser=parse_address)]
    account: Address,

    /// Public key hash to revoke (repeatable).
    #[clap(long = "pkh", required = true)]
    pkhs: Vec<H256>,
}

impl RemoveKeysCommand {
    /// Execute the command
    pub async fn execute(self) -> eyre::Result<()> {
        let mut details = AccountDetails::load(&self.node.keys_dir()?, &self.account)?;
        let mut tracker = details.tracker();

        let call_data = remove_public_key_hashes_call_data(&self.pkhs);

        let landed =
            sign_and_submit(&self.node, &self.submit, &mut details, &mut tracker, call_data)
                .await?;
        if !landed {
            warn!("Revocation of {} keys not confirmed, local keys kept", self.pkhs.len());
            return Ok(());
        }

        let discarded = tracker.discard(&self.pkhs);
        details.update_keys(&tracker);
        details.save(&self.node.keys_dir()?)?;

        info!("Revoked {} keys ({discarded} held locally)", self.pkhs.len());

        Ok(())
    }
}

/// Pause command
#[derive(Debug, Parser)]
pub struct PauseCommand {
    /// Node args
    #[clap(flatten)]
    node: NodeArgs,

    /// Submission args
    #[clap(flatten)]
    submit: SubmitArgs,

    /// Account address.
    #[clap(long, value_parser=parse_address)]
    account: Address,
}

impl PauseCommand {
    /// Execute the command
    pub async fn execute(self) -> eyre::Result<()> {
        let mut details = AccountDetails::load(&self.node.keys_dir()?, &self.account)?;
        let mut tracker = details.tracker();

        let call_data = toggle_pause_call_data();

        let landed =
            sign_and_submit(&self.node, &self.submit, &mut details, &mut tracker, call_data)
                .await?;
        if landed {
            info!("Toggled pause of {}", to_checksum(&self.account, None));
        }

        Ok(())
    }
}

/// Execute command
#[derive(Debug, Parser)]
pub struct ExecuteCommand {
    /// Node args
    #[clap(flatten)]
    node: NodeArgs,

    /// Submission args
    #[clap(flatten)]
    submit: SubmitArgs,

    /// Account address.
    #[clap(long, value_parser=parse_address)]
    account: Address,

    /// Call target (repeat for a batch).
    #[clap(long, required = true, value_parser=parse_address)]
    to: Vec<Address>,

    /// Value in wei (single calls only).
    #[clap(long, default_value = "0", value_parser=parse_u256)]
    value: U256,

    /// Call data (hex), one per target when given.
    #[clap(long)]
    data: Vec<Bytes>,
}

impl ExecuteCommand {
    /// Account call data: `execute` for one target, `executeBatch` for several
    fn call_data(&self) -> eyre::Result<Bytes> {
        let data = if self.data.is_empty() {
            vec![Bytes::default(); self.to.len()]
        } else {
            self.data.clone()
        };
        eyre::ensure!(
            data.len() == self.to.len(),
            "{} call data given for {} targets",
            data.len(),
            self.to.len()
        );

        match (self.to.as_slice(), data.as_slice()) {
            ([to], [func]) => Ok(execute_call_data(*to, self.value, func.clone())),
            _ => {
                eyre::ensure!(self.value.is_zero(), "batched calls cannot carry value");
                Ok(execute_batch_call_data(self.to.clone(), data))
            }
        }
    }

    /// Execute the command
    pub async fn execute(self) -> eyre::Result<()> {
        let mut details = AccountDetails::load(&self.node.keys_dir()?, &self.account)?;
        let mut tracker = details.tracker();

        let call_data = self.call_data()?;

        sign_and_submit(&self.node, &self.submit, &mut details, &mut tracker, call_data)
            .await?;

        Ok(())
    }
}

/// Fund command
#[derive(Debug, Parser)]
pub struct FundCommand {
    /// Node args
    #[clap(flatten)]
    node: NodeArgs,

    /// Account address.
    #[clap(long, value_parser=parse_address)]
    account: Address,

    /// Entry point deposit to maintain, in wei.
    #[clap(long, value_parser=parse_u256)]
    deposit: Option<U256>,

    /// Native balance to maintain on the account, in wei.
    #[clap(long, value_parser=parse_u256)]
    balance: Option<U256>,
}

impl FundCommand {
    /// Execute the command
    ///
    /// Tops up the entry point deposit and the account's own balance from the owner's wallet.
    pub async fn execute(self) -> eyre::Result<()> {
        let provider = self.node.provider()?;
        let chain_id = provider.get_chainid().await?;
        let wallet = self.node.wallet()?.with_chain_id(chain_id.as_u64());
        let eth_client = Arc::new(SignerMiddleware::new(provider, wallet));
        let entry_point = EntryPoint::new(eth_client.clone(), self.node.entry_point);

        let deposit = entry_point.balance_of(&self.account).await?;
        let min_deposit = self.deposit.unwrap_or_else(|| MIN_DEPOSIT.into());
        match top_up_amount(deposit, min_deposit) {
            Some(amount) => {
                let receipt = entry_point.deposit_to(&self.account, amount).await?;
                info!(
                    "Deposited {} ETH in {:?}",
                    format_ether(amount),
                    receipt.map(|receipt| receipt.transaction_hash)
                );
            }
            None => info!("Deposit of {} ETH is sufficient", format_ether(deposit)),
        }

        let balance = eth_client.get_balance(self.account, None).await?;
        let min_balance = self.balance.unwrap_or_else(|| MIN_BALANCE.into());
        match top_up_amount(balance, min_balance) {
            Some(amount) => {
                let tx = TransactionRequest::pay(self.account, amount);
                let receipt = eth_client.send_transaction(tx, None).await?.await?;
                info!(
                    "Sent {} ETH in {:?}",
                    format_ether(amount),
                    receipt.map(|receipt| receipt.transaction_hash)
                );
            }
            None => info!("Balance of {} ETH is sufficient", format_ether(balance)),
        }

        Ok(())
    }
}

/// Status command
#[derive(Debug, Parser)]
pub struct StatusCommand {
    /// Node args
    #[clap(flatten)]
    node: NodeArgs,

    /// Account address.
    #[clap(long, value_parser=parse_address)]
    account: Address,
}

impl StatusCommand {
    /// Execute the command
    pub async fn execute(self) -> eyre::Result<()> {
        let details = AccountDetails::load(&self.node.keys_dir()?, &self.account)?;
        let eth_client = Arc::new(self.node.provider()?);
        let account = LamportAccount::new(eth_client.clone(), details.factory);
        let entry_point = EntryPoint::new(eth_client.clone(), self.node.entry_point);

        let balance = eth_client.get_balance(details.counterfactual, None).await?;
        let deployed = account.is_deployed(details.counterfactual).await?;
        let deposit = entry_point.get_deposit_info(&details.counterfactual).await?;

        info!("Account {}", to_checksum(&details.counterfactual, None));
        info!("  network: {}", Chain::from_id(details.network));
        info!("  owner: {}", to_checksum(&details.signer_address, None));
        info!("  balance: {} ETH", format_ether(balance));
        info!("  deployed: {deployed}");
        info!(
            "  deposit: {} ETH, staked: {}, stake: {} ETH, unstake delay: {}s",
            format_ether(U256::from(deposit.deposit)),
            deposit.staked,
            format_ether(U256::from(deposit.stake)),
            deposit.unstake_delay_sec
        );
        if deployed {
            let live_keys = account.live_key_count(details.counterfactual).await?;
            info!("  live keys on chain: {live_keys}");
        }
        info!("  unused local keys: {}", details.keys.0.len());

        Ok(())
    }
}

/// Compare families command
#[derive(Debug, Parser)]
pub struct CompareFamiliesCommand {
    /// Include a 65-byte ECDSA co-signature in both packings.
    #[clap(long)]
    cosign: bool,
}

impl CompareFamiliesCommand {
    /// Execute the command
    pub fn execute(self) -> eyre::Result<()> {
        let keccak = packed_signature_gas::<Keccak256>(self.cosign)?;
        let ripemd = packed_signature_gas::<Ripemd160>(self.cosign)?;

        info!("keccak256 signature calldata: {keccak} gas");
        info!("ripemd160 signature calldata: {ripemd} gas");
        info!("keccak256 vs ripemd160: {}", GasComparison::compare(keccak.into(), ripemd.into()));

        Ok(())
    }
}

/// Signs a call from the account with its next key and submits it, returning whether the call
/// landed.
///
/// The account record is saved with the key removed before anything leaves the machine, so a
/// failed or repeated submission can never reuse the key. A bundler's acceptance counts as landed;
/// a direct submission lands when its `UserOperationEvent` reports success.
async fn sign_and_submit(
    node: &NodeArgs,
    submit: &SubmitArgs,
    details: &mut AccountDetails,
    tracker: &mut KeyTracker<Keccak256>,
    call_data: Bytes,
) -> eyre::Result<bool> {
    let provider = node.provider()?;
    let chain_id = provider.get_chainid().await?;
    let wallet = node.wallet()?.with_chain_id(chain_id.as_u64());
    let eth_client = Arc::new(SignerMiddleware::new(provider, wallet.clone()));

    let account = LamportAccount::new(eth_client.clone(), details.factory);
    let entry_point = EntryPoint::new(eth_client.clone(), node.entry_point);

    let origin = if account.is_deployed(details.counterfactual).await? {
        UserOperationPartial {
            nonce: Some(entry_point.get_nonce(&details.counterfactual, U256::zero()).await?),
            ..Default::default()
        }
    } else {
        info!("Account is not deployed yet, attaching init code");
        UserOperationPartial {
            nonce: Some(U256::zero()),
            init_code: Some(init_code(
                details.factory,
                details.signer_address,
                details.salt.into(),
                &details.initial_key_hashes,
            )),
            ..Default::default()
        }
    };

    let unsigned = Staged::of(UserOperationPartial {
        sender: Some(details.counterfactual),
        call_data: Some(call_data),
        ..origin
    })
    .map(UserOperation::from);

    let uo_hash = unsigned.snapshot().hash(&node.entry_point, &chain_id);
    let remote_hash = entry_point.get_user_op_hash(unsigned.snapshot()).await?;
    eyre::ensure!(
        uo_hash.0 == remote_hash,
        "user operation hash mismatch: local {:?}, entry point {remote_hash:?}",
        uo_hash.0
    );

    let cosigner = submit.cosign.then_some(&wallet);
    let uo = unsigned
        .try_bind(|uo| {
            attach_lamport_signature(&uo, cosigner, &node.entry_point, &chain_id, tracker)
                .map(Staged::of)
        })?
        .into_inner();

    details.update_keys(tracker);
    details.save(&node.keys_dir()?)?;

    let client = BundlerClient::new(submit.send_mode(wallet.address()), eth_client)?;
    let landed = match client.submit(&uo, node.entry_point).await? {
        Submission::Accepted { uo_hash } => {
            info!("User operation {:?} accepted by the bundler", uo_hash.0);
            warn!("Inclusion is up to the bundler and is not tracked");
            true
        }
        Submission::Included { report, receipt: Some(receipt) } => {
            info!(
                "User operation included in {:?} (pre-op gas {}, prefund {})",
                receipt.transaction_hash, report.pre_op_gas, report.prefund
            );
            let succeeded = entry_point
                .user_operation_events(&receipt)
                .iter()
                .any(|event| H256::from(event.user_op_hash) == uo_hash.0 && event.success);
            if !succeeded {
                warn!("User operation {:?} reverted during execution", uo_hash.0);
            }
            succeeded
        }
        Submission::Included { receipt: None, .. } => {
            warn!("Handle ops transaction was dropped");
            false
        }
    };
    info!("{} unused keys left", tracker.len());

    Ok(landed)
}
