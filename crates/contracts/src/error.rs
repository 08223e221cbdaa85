use crate::gen::{entry_point_api::FailedOp, EntryPointAPIErrors};
use ethers::{
    abi::AbiDecode,
    providers::{JsonRpcError, Middleware, MiddlewareError, ProviderError},
    types::Bytes,
};
use regex::Regex;
use std::str::FromStr;
use thiserror::Error;

/// Entry point errors
#[derive(Debug, Error, Clone)]
pub enum EntryPointError {
    /// Failed user operation error
    #[error("{0}")]
    FailedOp(FailedOp),

    /// There is no revert when there should be
    #[error("{function} should revert")]
    NoRevert {
        /// function
        function: String,
    },

    /// Provider error
    #[error("provider error: {inner}")]
    Provider {
        /// The inner error message
        inner: String,
    },

    /// ABI error
    #[error("abi error: {inner}")]
    ABI {
        /// The inner error message
        inner: String,
    },

    /// Data decoding error
    #[error("decode error: {inner}")]
    Decode {
        /// The inner error message
        inner: String,
    },

    /// Any other error
    #[error("other error: {inner}")]
    Other {
        /// The inner error message
        inner: String,
    },
}

impl EntryPointError {
    /// Reason string of a failed user operation, if this is one
    pub fn failed_op_reason(&self) -> Option<&str> {
        match self {
            Self::FailedOp(op) => Some(op.reason.as_str()),
            _ => None,
        }
    }

    pub fn from_provider_error(err: &ProviderError) -> Result<EntryPointAPIErrors, Self> {
        match err {
            ProviderError::JsonRpcClientError(err) => err
                .as_error_response()
                .map(Self::from_json_rpc_error)
                .unwrap_or(Err(EntryPointError::Provider {
                    inner: format!("unknown json-rpc client error: {err:?}"),
                })),
            ProviderError::HTTPError(err) => {
                Err(EntryPointError::Provider { inner: format!("HTTP error: {err:?}") })
            }
            _ => {
                Err(EntryPointError::Provider { inner: format!("unknown provider error: {err:?}") })
            }
        }
    }

    pub fn from_json_rpc_error(err: &JsonRpcError) -> Result<EntryPointAPIErrors, Self> {
        let Some(ref value) = err.data else {
            return Err(Self::Provider {
                inner: format!("json-rpc error doesn't contain data field: {err:?}"),
            });
        };

        let serde_json::Value::String(data) = value else {
            return Err(Self::Decode {
                inner: format!("json-rpc return data is not a string: {value:?}"),
            });
        };

        let re = Regex::new(r"0x[0-9a-fA-F]+")
            .map_err(|e| Self::Decode { inner: format!("invalid revert data pattern: {e:?}") })?;
        let Some(hex) = re.find(data) else {
            return Err(Self::Decode { inner: format!("hex string not found in {data:?}") });
        };

        let bytes = Bytes::from_str(hex.as_str()).map_err(|e| Self::Decode {
            inner: format!("string {data:?} could not be converted to bytes: {e:?}"),
        })?;

        decode_revert_error(bytes).map_err(|err| Self::Provider {
            inner: format!("failed to decode revert error: {err:?}"),
        })
    }

    pub fn from_middleware_error<M: Middleware>(
        err: M::Error,
    ) -> Result<EntryPointAPIErrors, Self> {
        if let Some(err) = err.as_error_response() {
            return Self::from_json_rpc_error(err);
        }

        if let Some(err) = err.as_provider_error() {
            return Self::from_provider_error(err);
        }

        Err(Self::Provider { inner: format!("middleware error: {err:?}") })
    }
}

// ethers-rs does not decode `require(cond, "reason")` or `revert("reason")` reverts, which carry
// the `Error(string)` selector `0x08c379a0`, so they are handled manually
pub fn decode_revert_string(data: Bytes) -> Option<String> {
    if data.len() < 4 {
        return None;
    }
    let (error_sig, reason) = data.split_at(4);
    if error_sig == [0x08, 0xc3, 0x79, 0xa0] {
        <String as AbiDecode>::decode(reason).ok()
    } else {
        None
    }
}

pub fn decode_revert_error(data: Bytes) -> Result<EntryPointAPIErrors, EntryPointError> {
    let decoded = EntryPointAPIErrors::decode(data.as_ref());
    match decoded {
        Ok(res) => Ok(res),
        Err(e) => {
            if let Some(error_str) = decode_revert_string(data) {
                return Ok(EntryPointAPIErrors::RevertString(error_str));
            };

            Err(EntryPointError::Decode {
                inner: format!(
                    "data field can't be deserialized to EntryPointAPIErrors error: {e:?}",
                ),
            })
        }
    }
}
