//! Entry point (v0.6) and Lamport account smart contract interfaces

pub mod account;
pub mod entry_point;
mod error;
mod gen;
mod utils;

pub use account::{init_code, LamportAccount};
pub use entry_point::EntryPoint;
pub use error::{decode_revert_error, decode_revert_string, EntryPointError};
pub use gen::{
    entry_point_api::{DepositInfo, EntryPointAPIErrors, FailedOp, ValidationResult},
    UserOperationEventFilter,
};
