use crate::utils::run_until_ctrl_c;
use clap::{value_parser, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

pub mod args;
pub mod commands;

/// The main Lamport CLI interface
#[derive(Debug, Parser)]
#[command(author, version, about = "Lamport", long_about = None)]
pub struct Cli {
    /// The command to execute
    #[clap(subcommand)]
    command: Commands,

    /// The verbosity level
    #[clap(long, short, global = true, default_value_t = 2, value_parser = value_parser!(u8).range(..=4))]
    verbosity: u8,
}

impl Cli {
    /// Get the log level based on the verbosity level
    pub fn get_log_level(&self) -> String {
        match self.verbosity {
            0 => "error",
            1 => "warn",
            2 => "info",
            3 => "debug",
            _ => "trace",
        }
        .into()
    }
}

/// Commands to be executed
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Mint the initial keys of a new account and record its counterfactual address
    #[command(name = "create-account")]
    CreateAccount(commands::CreateAccountCommand),

    /// Mint fresh keys and register their hashes with the account
    #[command(name = "add-keys")]
    AddKeys(commands::AddKeysCommand),

    /// Revoke public key hashes registered with the account
    #[command(name = "remove-keys")]
    RemoveKeys(commands::RemoveKeysCommand),

    /// Send value and/or call data from the account
    #[command(name = "execute")]
    Execute(commands::ExecuteCommand),

    /// Pause or resume the account
    #[command(name = "pause")]
    Pause(commands::PauseCommand),

    /// Top up the account's entry point deposit and native balance
    #[command(name = "fund")]
    Fund(commands::FundCommand),

    /// Show balances, deployment, deposit and remaining keys of the account
    #[command(name = "status")]
    Status(commands::StatusCommand),

    /// Compare the calldata cost of signatures under both hash families
    #[command(name = "compare-families")]
    CompareFamilies(commands::CompareFamiliesCommand),
}

pub fn run() -> eyre::Result<()> {
    let cli = Cli::parse();

    let directives = match std::env::var("RUST_LOG") {
        Ok(val) => format!("{val},lamport={}", cli.get_log_level()),
        Err(_) => format!("lamport={}", cli.get_log_level()),
    };
    tracing_subscriber::fmt().with_env_filter(EnvFilter::new(directives)).init();

    let rt = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;

    let task = async move {
        match cli.command {
            Commands::CreateAccount(command) => command.execute().await,
            Commands::AddKeys(command) => command.execute().await,
            Commands::RemoveKeys(command) => command.execute().await,
            Commands::Execute(command) => command.execute().await,
            Commands::Pause(command) => command.execute().await,
            Commands::Fund(command) => command.execute().await,
            Commands::Status(command) => command.execute().await,
            Commands::CompareFamilies(command) => command.execute(),
        }
    };

    rt.block_on(run_until_ctrl_c(task))
}
