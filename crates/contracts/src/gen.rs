use ethers::contract::abigen;

abigen!(
    EntryPointAPI,
    r#"[
        struct UserOperation {address sender;uint256 nonce;bytes initCode;bytes callData;uint256 callGasLimit;uint256 verificationGasLimit;uint256 preVerificationGas;uint256 maxFeePerGas;uint256 maxPriorityFeePerGas;bytes paymasterAndData;bytes signature;}
        struct DepositInfo {uint112 deposit;bool staked;uint112 stake;uint32 unstakeDelaySec;uint48 withdrawTime;}
        function handleOps(UserOperation[] calldata ops,address payable beneficiary) external
        function simulateValidation(UserOperation calldata userOp) external
        function getNonce(address sender,uint192 key) external view returns (uint256 nonce)
        function balanceOf(address account) external view returns (uint256)
        function getDepositInfo(address account) external view returns (DepositInfo memory info)
        function depositTo(address account) external payable
        function getUserOpHash(UserOperation calldata userOp) external view returns (bytes32)
        error FailedOp(uint256 opIndex,string reason)
        error ValidationResult((uint256,uint256,bool,uint48,uint48,bytes) returnInfo,(uint256,uint256) senderInfo,(uint256,uint256) factoryInfo,(uint256,uint256) paymasterInfo)
        error SenderAddressResult(address sender)
        event UserOperationEvent(bytes32 indexed userOpHash,address indexed sender,address indexed paymaster,uint256 nonce,bool success,uint256 actualGasCost,uint256 actualGasUsed)
    ]"#
);

abigen!(
    LamportAccountFactoryAPI,
    r#"[
        function createAccount(address owner,uint256 salt,bytes32[] memory firstLamportKeys) external returns (address)
        function getAddress(address owner,uint256 salt,bytes32[] memory firstLamportKeys) external view returns (address)
    ]"#
);

abigen!(
    LamportAccountAPI,
    r#"[
        function execute(address dest,uint256 value,bytes calldata func) external
        function executeBatch(address[] calldata dest,bytes[] calldata func) external
        function addPublicKeyHashes(bytes32[] memory publicKeyHashesToAdd) external
        function removePublicKeyHashes(bytes32[] memory publicKeyHashesToRemove) external
        function togglePause() external
        function liveKeyCount() external view returns (uint256)
    ]"#
);
