//! Basic transaction type for account abstraction (ERC-4337)

use crate::{constants::user_operation as defaults, utils::as_checksum_addr};
use ethers::{
    abi::AbiEncode,
    contract::{EthAbiCodec, EthAbiType},
    types::{Address, Bytes, H256, U256},
    utils::keccak256,
};
use serde::{Deserialize, Serialize};
use std::{ops::Deref, str::FromStr};

/// Transaction type for ERC-4337 account abstraction
#[derive(
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EthAbiCodec,
    EthAbiType,
)]
#[serde(rename_all = "camelCase")]
pub struct UserOperation {
    /// Sender of the user operation
    #[serde(serialize_with = "as_checksum_addr")]
    pub sender: Address,

    /// Nonce (anti replay protection)
    pub nonce: U256,

    /// Init code for the account (needed if account not yet deployed and needs to be created)
    pub init_code: Bytes,

    /// The data that is passed to the sender during the main execution call
    pub call_data: Bytes,

    /// The amount of gas to allocate for the main execution call
    pub call_gas_limit: U256,

    /// The amount of gas to allocate for the verification step
    pub verification_gas_limit: U256,

    /// The amount of gas to pay bundler to compensate for the pre-verification execution and
    /// calldata
    pub pre_verification_gas: U256,

    /// Maximum fee per gas (similar to EIP-1559)
    pub max_fee_per_gas: U256,

    /// Maximum priority fee per gas (similar to EIP-1559)
    pub max_priority_fee_per_gas: U256,

    /// Address of paymaster sponsoring the user operation, followed by extra data to send to the
    /// paymaster (can be empty)
    pub paymaster_and_data: Bytes,

    /// Data passed to the account along with the nonce during the verification step
    pub signature: Bytes,
}

impl UserOperation {
    /// User operation with every field set to its default: zero sender and nonce, empty byte
    /// fields and the default gas table
    pub fn with_defaults() -> Self {
        UserOperationPartial::default().into()
    }

    /// Packs the user operation into bytes, signature included (used for gas estimation)
    pub fn pack(&self) -> Bytes {
        self.clone().encode().into()
    }

    /// Packs the user operation without signature to bytes (used for calculating the hash)
    pub fn pack_without_signature(&self) -> Bytes {
        let user_operation_packed = UserOperationUnsigned::from(self.clone());
        user_operation_packed.encode().into()
    }

    /// Calculates the hash of the user operation
    pub fn hash(&self, entry_point: &Address, chain_id: &U256) -> UserOperationHash {
        H256::from_slice(
            keccak256(
                [
                    keccak256(self.pack_without_signature().deref()).to_vec(),
                    entry_point.encode(),
                    chain_id.encode(),
                ]
                .concat(),
            )
            .as_slice(),
        )
        .into()
    }

    // Builder pattern helpers

    /// Sets the sender of the user operation
    pub fn sender(mut self, sender: Address) -> Self {
        self.sender = sender;
        self
    }

    /// Sets the nonce of the user operation
    pub fn nonce(mut self, nonce: U256) -> Self {
        self.nonce = nonce;
        self
    }

    /// Sets the init code of the user operation
    pub fn init_code(mut self, init_code: Bytes) -> Self {
        self.init_code = init_code;
        self
    }

    /// Sets the call data of the user operation
    pub fn call_data(mut self, call_data: Bytes) -> Self {
        self.call_data = call_data;
        self
    }

    /// Sets the call gas limit of the user operation
    pub fn call_gas_limit(mut self, call_gas_limit: U256) -> Self {
        self.call_gas_limit = call_gas_limit;
        self
    }

    /// Sets the verification gas limit of the user operation
    pub fn verification_gas_limit(mut self, verification_gas_limit: U256) -> Self {
        self.verification_gas_limit = verification_gas_limit;
        self
    }

    /// Sets the pre-verification gas of the user operation
    pub fn pre_verification_gas(mut self, pre_verification_gas: U256) -> Self {
        self.pre_verification_gas = pre_verification_gas;
        self
    }

    /// Sets the max fee per gas of the user operation
    pub fn max_fee_per_gas(mut self, max_fee_per_gas: U256) -> Self {
        self.max_fee_per_gas = max_fee_per_gas;
        self
    }

    /// Sets the max priority fee per gas of the user operation
    pub fn max_priority_fee_per_gas(mut self, max_priority_fee_per_gas: U256) -> Self {
        self.max_priority_fee_per_gas = max_priority_fee_per_gas;
        self
    }

    /// Sets the paymaster and data of the user operation
    pub fn paymaster_and_data(mut self, paymaster_and_data: Bytes) -> Self {
        self.paymaster_and_data = paymaster_and_data;
        self
    }

    /// Sets the signature of the user operation
    pub fn signature(mut self, signature: Bytes) -> Self {
        self.signature = signature;
        self
    }
}

/// User operation hash
#[derive(
    Eq, Hash, PartialEq, Debug, Serialize, Deserialize, Clone, Copy, Default, PartialOrd, Ord,
)]
pub struct UserOperationHash(pub H256);

impl From<H256> for UserOperationHash {
    fn from(value: H256) -> Self {
        Self(value)
    }
}

impl From<UserOperationHash> for H256 {
    fn from(value: UserOperationHash) -> Self {
        value.0
    }
}

impl From<[u8; 32]> for UserOperationHash {
    fn from(value: [u8; 32]) -> Self {
        Self(H256::from_slice(&value))
    }
}

impl FromStr for UserOperationHash {
    type Err = <H256 as FromStr>::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        H256::from_str(s).map(|h| h.into())
    }
}

impl UserOperationHash {
    #[inline]
    pub const fn as_fixed_bytes(&self) -> &[u8; 32] {
        &self.0 .0
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

/// User operation without signature (variable-length fields replaced by their hashes)
#[derive(EthAbiCodec, EthAbiType)]
pub struct UserOperationUnsigned {
    pub sender: Address,
    pub nonce: U256,
    pub init_code: H256,
    pub call_data: H256,
    pub call_gas_limit: U256,
    pub verification_gas_limit: U256,
    pub pre_verification_gas: U256,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
    pub paymaster_and_data: H256,
}

impl From<UserOperation> for UserOperationUnsigned {
    fn from(value: UserOperation) -> Self {
        Self {
            sender: value.sender,
            nonce: value.nonce,
            init_code: keccak256(value.init_code.deref()).into(),
            call_data: keccak256(value.call_data.deref()).into(),
            call_gas_limit: value.call_gas_limit,
            verification_gas_limit: value.verification_gas_limit,
            pre_verification_gas: value.pre_verification_gas,
            max_fee_per_gas: value.max_fee_per_gas,
            max_priority_fee_per_gas: value.max_priority_fee_per_gas,
            paymaster_and_data: keccak256(value.paymaster_and_data.deref()).into(),
        }
    }
}

/// User operation with all fields being optional
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperationPartial {
    pub sender: Option<Address>,
    pub nonce: Option<U256>,
    pub init_code: Option<Bytes>,
    pub call_data: Option<Bytes>,
    pub call_gas_limit: Option<U256>,
    pub verification_gas_limit: Option<U256>,
    pub pre_verification_gas: Option<U256>,
    pub max_fee_per_gas: Option<U256>,
    pub max_priority_fee_per_gas: Option<U256>,
    pub paymaster_and_data: Option<Bytes>,
    pub signature: Option<Bytes>,
}

impl UserOperationPartial {
    /// Merges the partial user operation over the defaults table; unset fields take the default
    pub fn fill_defaults(self) -> UserOperation {
        self.into()
    }
}

impl From<UserOperationPartial> for UserOperation {
    fn from(user_operation: UserOperationPartial) -> Self {
        Self {
            sender: user_operation.sender.unwrap_or_default(),
            nonce: user_operation.nonce.unwrap_or_default(),
            init_code: user_operation.init_code.unwrap_or_default(),
            call_data: user_operation.call_data.unwrap_or_default(),
            call_gas_limit: user_operation
                .call_gas_limit
                .unwrap_or_else(|| defaults::CALL_GAS_LIMIT.into()),
            verification_gas_limit: user_operation
                .verification_gas_limit
                .unwrap_or_else(|| defaults::VERIFICATION_GAS_LIMIT.into()),
            pre_verification_gas: user_operation
                .pre_verification_gas
                .unwrap_or_else(|| defaults::PRE_VERIFICATION_GAS.into()),
            max_fee_per_gas: user_operation
                .max_fee_per_gas
                .unwrap_or_else(|| defaults::MAX_FEE_PER_GAS.into()),
            max_priority_fee_per_gas: user_operation
                .max_priority_fee_per_gas
                .unwrap_or_else(|| defaults::MAX_PRIORITY_FEE_PER_GAS.into()),
            paymaster_and_data: user_operation.paymaster_and_data.unwrap_or_default(),
            signature: user_operation.signature.unwrap_or_default(),
        }
    }
}

impl From<UserOperation> for UserOperationPartial {
    fn from(user_operation: UserOperation) -> Self {
        Self {
            sender: Some(user_operation.sender),
            nonce: Some(user_operation.nonce),
            init_code: Some(user_operation.init_code),
            call_data: Some(user_operation.call_data),
            call_gas_limit: Some(user_operation.call_gas_limit),
            verification_gas_limit: Some(user_operation.verification_gas_limit),
            pre_verification_gas: Some(user_operation.pre_verification_gas),
            max_fee_per_gas: Some(user_operation.max_fee_per_gas),
            max_priority_fee_per_gas: Some(user_operation.max_priority_fee_per_gas),
            paymaster_and_data: Some(user_operation.paymaster_and_data),
            signature: Some(user_operation.signature),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_operation_pack() {
        let uos =  vec![
            UserOperation::default().verification_gas_limit(100_000.into()).pre_verification_gas(21_000.into()).max_priority_fee_per_gas(1_000_000_000.into()),
            UserOperation::default().sender("0x9c5754De1443984659E1b3a8d1931D83475ba29C".parse().unwrap()).call_gas_limit(200_000.into()).verification_gas_limit(100_000.into()).pre_verification_gas(21_000.into()).max_fee_per_gas(3_000_000_000_u64.into()).max_priority_fee_per_gas(1_000_000_000.into()).signature("0x7cb39607585dee8e297d0d7a669ad8c5e43975220b6773c10a138deadbc8ec864981de4b9b3c735288a217115fb33f8326a61ddabc60a534e3b5536515c70f931c".parse().unwrap()),
        ];
        assert_eq!(uos[0].pack(), "0x0000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000001600000000000000000000000000000000000000000000000000000000000000180000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000186a000000000000000000000000000000000000000000000000000000000000052080000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000003b9aca0000000000000000000000000000000000000000000000000000000000000001a000000000000000000000000000000000000000000000000000000000000001c00000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000".parse::<Bytes>().unwrap());
        assert_eq!(uos[1].pack(), "0x0000000000000000000000009c5754de1443984659e1b3a8d1931d83475ba29c0000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000016000000000000000000000000000000000000000000000000000000000000001800000000000000000000000000000000000000000000000000000000000030d4000000000000000000000000000000000000000000000000000000000000186a0000000000000000000000000000000000000000000000000000000000000520800000000000000000000000000000000000000000000000000000000b2d05e00000000000000000000000000000000000000000000000000000000003b9aca0000000000000000000000000000000000000000000000000000000000000001a000000000000000000000000000000000000000000000000000000000000001c000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000417cb39607585dee8e297d0d7a669ad8c5e43975220b6773c10a138deadbc8ec864981de4b9b3c735288a217115fb33f8326a61ddabc60a534e3b5536515c70f931c00000000000000000000000000000000000000000000000000000000000000".parse::<Bytes>().unwrap());
    }

    #[test]
    fn user_operation_pack_without_signature() {
        let uos =  vec![
            UserOperation::default().verification_gas_limit(100_000.into()).pre_verification_gas(21_000.into()).max_priority_fee_per_gas(1_000_000_000.into()),
            UserOperation {
                sender: "0x9c5754De1443984659E1b3a8d1931D83475ba29C".parse().unwrap(),
                nonce: 1.into(),
                init_code: Bytes::default(),
                call_data: "0xb61d27f60000000000000000000000009c5754de1443984659e1b3a8d1931d83475ba29c00000000000000000000000000000000000000000000000000005af3107a400000000000000000000000000000000000000000000000000000000000000000600000000000000000000000000000000000000000000000000000000000000000".parse().unwrap(),
                call_gas_limit: 33_100.into(),
                verification_gas_limit: 60_624.into(),
                pre_verification_gas: 44_056.into(),
                max_fee_per_gas: 1_695_000_030_u64.into(),
                max_priority_fee_per_gas: 1_695_000_000.into(),
                paymaster_and_data: Bytes::default(),
                signature: "0x37540ca4f91a9f08993ba4ebd4b7473902f69864c98951f9db8cb47b78764c1a13ad46894a96dc0cad68f9207e49b4dbb897f25f47f040cec2a636a8201c1cd71b".parse().unwrap(),
            },
        ];
        assert_eq!(uos[0].pack_without_signature(), "0x00000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000186a000000000000000000000000000000000000000000000000000000000000052080000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000003b9aca00c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470".parse::<Bytes>().unwrap());
        assert_eq!(uos[1].pack_without_signature(), "0x0000000000000000000000009c5754de1443984659e1b3a8d1931d83475ba29c0000000000000000000000000000000000000000000000000000000000000001c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470f7def7aeb687d6992b466243b713223689982cefca0f91a1f5c5f60adb532b93000000000000000000000000000000000000000000000000000000000000814c000000000000000000000000000000000000000000000000000000000000ecd0000000000000000000000000000000000000000000000000000000000000ac18000000000000000000000000000000000000000000000000000000006507a5de000000000000000000000000000000000000000000000000000000006507a5c0c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470".parse::<Bytes>().unwrap());
    }

    #[test]
    fn user_operation_hash() {
        let uos =  vec![
            UserOperation::default().verification_gas_limit(100_000.into()).pre_verification_gas(21_000.into()).max_priority_fee_per_gas(1_000_000_000.into()),
            UserOperation {
                sender: "0x9c5754De1443984659E1b3a8d1931D83475ba29C".parse().unwrap(),
                nonce: U256::zero(),
                init_code: "0x9406cc6185a346906296840746125a0e449764545fbfb9cf000000000000000000000000ce0fefa6f7979c4c9b5373e0f5105b7259092c6d0000000000000000000000000000000000000000000000000000000000000000".parse().unwrap(),
                call_data: "0xb61d27f60000000000000000000000009c5754de1443984659e1b3a8d1931d83475ba29c00000000000000000000000000000000000000000000000000005af3107a400000000000000000000000000000000000000000000000000000000000000000600000000000000000000000000000000000000000000000000000000000000000".parse().unwrap(),
                call_gas_limit: 33_100.into(),
                verification_gas_limit: 361_460.into(),
                pre_verification_gas: 44_980.into(),
                max_fee_per_gas: 1_695_000_030_u64.into(),
                max_priority_fee_per_gas: 1_695_000_000.into(),
                paymaster_and_data: Bytes::default(),
                signature: "0xebfd4657afe1f1c05c1ec65f3f9cc992a3ac083c424454ba61eab93152195e1400d74df01fc9fa53caadcb83a891d478b713016bcc0c64307c1ad3d7ea2e2d921b".parse().unwrap(),
            },
        ];
        assert_eq!(
            uos[0].hash(
                &"0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789"
                    .parse()
                    .unwrap(),
                &80_001.into()
            ),
            "0x95418c07086df02ff6bc9e8bdc150b380cb761beecc098630440bcec6e862702"
                .parse::<H256>()
                .unwrap()
                .into()
        );
        assert_eq!(
            uos[1].hash(
                &"0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789"
                    .parse()
                    .unwrap(),
                &80_001.into()
            ),
            "0x7c1b8c9df49a9e09ecef0f0fe6841d895850d29820f9a4b494097764085dcd7e"
                .parse::<H256>()
                .unwrap()
                .into()
        );
    }

    #[test]
    fn fill_defaults_uses_default_table() {
        let uo = UserOperation::with_defaults();
        assert_eq!(uo.sender, Address::zero());
        assert_eq!(uo.nonce, U256::zero());
        assert!(uo.init_code.is_empty());
        assert!(uo.call_data.is_empty());
        assert_eq!(uo.call_gas_limit, 100_000.into());
        assert_eq!(uo.verification_gas_limit, 2_000_000.into());
        assert_eq!(uo.pre_verification_gas, 1_010_000.into());
        assert_eq!(uo.max_fee_per_gas, 8_000_000_000_u64.into());
        assert_eq!(uo.max_priority_fee_per_gas, 8_000_000_000_u64.into());
        assert!(uo.paymaster_and_data.is_empty());
        assert!(uo.signature.is_empty());
    }

    #[test]
    fn fill_defaults_from_sender_only() {
        let sender: Address = "0x9c5754De1443984659E1b3a8d1931D83475ba29C".parse().unwrap();
        let uo = UserOperationPartial { sender: Some(sender), ..Default::default() }.fill_defaults();

        assert_eq!(
            uo,
            UserOperation {
                sender,
                nonce: U256::zero(),
                init_code: Bytes::default(),
                call_data: Bytes::default(),
                call_gas_limit: 100_000.into(),
                verification_gas_limit: 2_000_000.into(),
                pre_verification_gas: 1_010_000.into(),
                max_fee_per_gas: 8_000_000_000_u64.into(),
                max_priority_fee_per_gas: 8_000_000_000_u64.into(),
                paymaster_and_data: Bytes::default(),
                signature: Bytes::default(),
            }
        );
    }

    #[test]
    fn fill_defaults_keeps_set_fields() {
        let sender: Address = "0x9c5754De1443984659E1b3a8d1931D83475ba29C".parse().unwrap();
        let uo = UserOperationPartial {
            sender: Some(sender),
            call_gas_limit: Some(50_000.into()),
            call_data: Some("0xdeadbeef".parse().unwrap()),
            ..Default::default()
        }
        .fill_defaults();

        assert_eq!(uo.sender, sender);
        assert_eq!(uo.call_gas_limit, 50_000.into());
        assert_eq!(uo.call_data, "0xdeadbeef".parse::<Bytes>().unwrap());
        assert_eq!(uo.verification_gas_limit, 2_000_000.into());
        assert_eq!(UserOperation::from(UserOperationPartial::from(uo.clone())), uo);
    }

    #[test]
    fn partial_from_json_ignores_missing_fields() {
        let uo: UserOperation = serde_json::from_str::<UserOperationPartial>(
            r#"{"sender":"0x9c5754de1443984659e1b3a8d1931d83475ba29c","nonce":"0x5"}"#,
        )
        .unwrap()
        .into();
        assert_eq!(uo.nonce, 5.into());
        assert_eq!(uo.pre_verification_gas, 1_010_000.into());
    }

    #[test]
    fn hash_ignores_signature() {
        let ep: Address = "0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789".parse().unwrap();
        let uo = UserOperation::with_defaults();
        let signed = uo.clone().signature("0x0102".parse().unwrap());
        assert_eq!(uo.hash(&ep, &1.into()), signed.hash(&ep, &1.into()));
        assert_ne!(uo.pack(), signed.pack());
    }

    #[test]
    fn hash_depends_on_entry_point_and_chain() {
        let ep: Address = "0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789".parse().unwrap();
        let uo = UserOperation::with_defaults();
        assert_ne!(uo.hash(&ep, &1.into()), uo.hash(&ep, &5.into()));
        assert_ne!(uo.hash(&ep, &1.into()), uo.hash(&Address::zero(), &1.into()));
        assert_ne!(uo.hash(&ep, &1.into()), uo.clone().nonce(1.into()).hash(&ep, &1.into()));
    }

    #[test]
    fn user_operation_serializes_checksummed_camel_case() {
        let uo = UserOperation::default()
            .sender("0x9c5754de1443984659e1b3a8d1931d83475ba29c".parse().unwrap());
        let json = serde_json::to_value(&uo).unwrap();
        assert_eq!(json["sender"], "0x9c5754De1443984659E1b3a8d1931D83475ba29C");
        assert!(json.get("maxPriorityFeePerGas").is_some());
        assert!(json.get("paymasterAndData").is_some());
    }

    #[test]
    fn user_operation_hash_from_str() {
        let hash: UserOperationHash =
            "0x95418c07086df02ff6bc9e8bdc150b380cb761beecc098630440bcec6e862702".parse().unwrap();
        assert_eq!(hash.as_fixed_bytes()[31], 0x02);
        assert!("0x1234".parse::<UserOperationHash>().is_err());
    }
}
