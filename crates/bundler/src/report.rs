use ethers::types::{Bytes, U256};
use lamport_contracts::ValidationResult;
use serde::{Deserialize, Serialize};

/// Stake of an entity taking part in validation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeInfo {
    pub stake: U256,
    pub unstake_delay_sec: U256,
}

impl From<(U256, U256)> for StakeInfo {
    fn from((stake, unstake_delay_sec): (U256, U256)) -> Self {
        Self { stake, unstake_delay_sec }
    }
}

/// Outcome of simulating the validation of a user operation
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    /// Gas used by validation, including pre-verification
    pub pre_op_gas: U256,
    /// Funds required from the account (or paymaster)
    pub prefund: U256,
    /// Whether the account rejected the signature
    pub sig_failed: bool,
    /// Start of the validity window (seconds since epoch)
    pub valid_after: u64,
    /// End of the validity window, 0 for no expiry
    pub valid_until: u64,
    /// Context handed by the paymaster to its post-operation hook
    pub paymaster_context: Bytes,
    pub sender_info: StakeInfo,
    pub factory_info: StakeInfo,
    pub paymaster_info: StakeInfo,
}

impl ValidationReport {
    /// Whether `timestamp` falls inside the validity window
    pub fn is_valid_at(&self, timestamp: u64) -> bool {
        timestamp >= self.valid_after && (self.valid_until == 0 || timestamp <= self.valid_until)
    }
}

impl From<ValidationResult> for ValidationReport {
    fn from(res: ValidationResult) -> Self {
        let (pre_op_gas, prefund, sig_failed, valid_after, valid_until, paymaster_context) =
            res.return_info;
        Self {
            pre_op_gas,
            prefund,
            sig_failed,
            valid_after,
            valid_until,
            paymaster_context,
            sender_info: res.sender_info.into(),
            factory_info: res.factory_info.into(),
            paymaster_info: res.paymaster_info.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_from_validation_result() {
        let res = ValidationResult {
            return_info: (50_000.into(), 1_000.into(), true, 10, 20, Bytes::default()),
            sender_info: (1.into(), 2.into()),
            factory_info: Default::default(),
            paymaster_info: Default::default(),
        };
        let report = ValidationReport::from(res);
        assert!(report.sig_failed);
        assert_eq!(report.pre_op_gas, 50_000.into());
        assert_eq!(report.sender_info, StakeInfo { stake: 1.into(), unstake_delay_sec: 2.into() });
        assert!(report.is_valid_at(15));
        assert!(!report.is_valid_at(21));
        assert!(!report.is_valid_at(5));
    }

    #[test]
    fn zero_valid_until_never_expires() {
        let report = ValidationReport::default();
        assert!(report.is_valid_at(u64::MAX));
    }
}
