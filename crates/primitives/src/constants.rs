//! Account abstraction (ERC-4337) and Lamport account constants

/// Entry point smart contract
pub mod entry_point {
    /// Address of the entry point smart contract
    pub const ADDRESS: &str = "0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789";
    /// Version of the entry point smart contract
    pub const VERSION: &str = "0.6.0";
}

/// Defaults filled into a partial user operation
pub mod user_operation {
    /// Gas for the main execution call
    pub const CALL_GAS_LIMIT: u64 = 100_000;
    /// Gas for the verification step (Lamport verification is expensive)
    pub const VERIFICATION_GAS_LIMIT: u64 = 2_000_000;
    /// Pre-verification gas, also covering the calldata of a packed Lamport signature
    pub const PRE_VERIFICATION_GAS: u64 = 1_010_000;
    /// Maximum fee per gas
    pub const MAX_FEE_PER_GAS: u64 = 8_000_000_000;
    /// Maximum priority fee per gas
    pub const MAX_PRIORITY_FEE_PER_GAS: u64 = 8_000_000_000;
}

/// Lamport account
pub mod account {
    /// Number of keys minted when an account is created
    pub const INITIAL_KEYS: usize = 20;
    /// Prefix of persisted account record files
    pub const RECORD_PREFIX: &str = "initObj_";
    /// Extension of persisted account record files
    pub const RECORD_EXTENSION: &str = "json";
    /// Entry point deposit topped up before the account's first user operations (0.1 ETH)
    pub const MIN_DEPOSIT: u128 = 100_000_000_000_000_000;
    /// Native balance topped up on the account itself (0.00001 ETH)
    pub const MIN_BALANCE: u128 = 10_000_000_000_000;
}

/// Calldata pricing
pub mod calldata {
    /// Gas per zero byte of calldata
    pub const ZERO_BYTE_GAS: u64 = 4;
    /// Gas per non-zero byte of calldata
    pub const NON_ZERO_BYTE_GAS: u64 = 16;
}
