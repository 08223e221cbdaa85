use crate::utils::{parse_address, parse_duration, unwrap_path_or_home, validate_private_key};
use clap::Parser;
use ethers::{
    providers::{Http, Provider},
    signers::LocalWallet,
    types::Address,
};
use expanded_pathbuf::ExpandedPathBuf;
use lamport_bundler::SendMode;
use lamport_primitives::constants::entry_point::ADDRESS;
use std::{str::FromStr, time::Duration};

/// Node and account-owner CLI args
#[derive(Debug, Clone, Parser)]
pub struct NodeArgs {
    /// Ethereum execution client RPC endpoint.
    #[clap(long, default_value = "http://127.0.0.1:8545")]
    pub eth_client_address: String,

    /// Entry point contract address.
    #[clap(long, default_value = ADDRESS, value_parser=parse_address)]
    pub entry_point: Address,

    /// Directory holding the account records.
    ///
    /// By default, `~/.lamport` is used.
    #[clap(long)]
    pub keys_dir: Option<ExpandedPathBuf>,

    /// Private key of the account owner (hex).
    #[clap(long, env = "PRIVATE_KEY", hide_env_values = true, value_parser=validate_private_key)]
    pub private_key: String,
}

impl NodeArgs {
    /// Connection to the execution client
    pub fn provider(&self) -> eyre::Result<Provider<Http>> {
        Ok(Provider::<Http>::try_from(self.eth_client_address.as_str())?)
    }

    /// Wallet of the account owner
    pub fn wallet(&self) -> eyre::Result<LocalWallet> {
        Ok(LocalWallet::from_str(&self.private_key)?)
    }

    /// Directory holding the account records
    pub fn keys_dir(&self) -> eyre::Result<ExpandedPathBuf> {
        unwrap_path_or_home(self.keys_dir.clone())
    }
}

/// Submission CLI args
#[derive(Debug, Clone, Parser, PartialEq)]
pub struct SubmitArgs {
    /// Bundler RPC endpoint.
    ///
    /// When absent, user operations are sent straight to the entry point.
    #[clap(long)]
    pub bundler_url: Option<String>,

    /// Bundler response timeout in milliseconds.
    #[clap(long, default_value = "10000", value_parser=parse_duration)]
    pub bundler_timeout: Duration,

    /// Beneficiary of direct `handleOps` transactions (defaults to the owner).
    #[clap(long, value_parser=parse_address)]
    pub beneficiary: Option<Address>,

    /// Append the owner's ECDSA signature to the Lamport signature.
    #[clap(long)]
    pub cosign: bool,
}

impl SubmitArgs {
    /// Relayed when a bundler is given, direct otherwise
    pub fn send_mode(&self, owner: Address) -> SendMode {
        match &self.bundler_url {
            Some(url) => SendMode::Relayed { url: url.clone(), timeout: self.bundler_timeout },
            None => SendMode::Direct { beneficiary: self.beneficiary.unwrap_or(owner) },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::signers::Signer;

    const KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn node_args_defaults() {
        let args = NodeArgs::try_parse_from(["lamport", "--private-key", KEY]).unwrap();
        assert_eq!(args.eth_client_address, "http://127.0.0.1:8545");
        assert_eq!(args.entry_point, ADDRESS.parse::<Address>().unwrap());
        assert!(args.keys_dir.is_none());
        assert_eq!(
            format!("{:?}", args.wallet().unwrap().address()),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn send_mode_selection() {
        let owner = Address::random();

        let args = SubmitArgs::try_parse_from(["lamport"]).unwrap();
        assert_eq!(args.send_mode(owner), SendMode::Direct { beneficiary: owner });

        let args = SubmitArgs::try_parse_from([
            "lamport",
            "--bundler-url",
            "http://127.0.0.1:3000",
            "--bundler-timeout",
            "500",
        ])
        .unwrap();
        assert_eq!(
            args.send_mode(owner),
            SendMode::Relayed {
                url: "http://127.0.0.1:3000".into(),
                timeout: Duration::from_millis(500)
            }
        );
    }
}
