//! Account abstraction (ERC-4337) primitive types for Lamport accounts
//!
//! This crate contains the user operation type, its canonical encodings and hash, Lamport signing
//! of user operations, the staged build pipeline and the persisted account record.

pub mod account;
pub mod constants;
pub mod gas;
mod lamport;
pub mod staged;
mod user_operation;
mod utils;

pub use account::{AccountDetails, AccountError};
pub use gas::{calldata_gas, GasComparison};
pub use lamport::{
    attach_lamport_signature, lamport_digest, pack_lamport_signature, unpack_lamport_signature,
    verify_user_operation, SigningError,
};
pub use staged::Staged;
pub use user_operation::{
    UserOperation, UserOperationHash, UserOperationPartial, UserOperationUnsigned,
};
pub use utils::as_checksum_addr;
