use ethers::types::{Address, Bytes, U256};
use lamport_keys::{Keccak256, KeyTracker};
use lamport_primitives::{
    attach_lamport_signature, calldata_gas, verify_user_operation, AccountDetails, Staged,
    UserOperation, UserOperationPartial,
};

fn entry_point() -> Address {
    lamport_primitives::constants::entry_point::ADDRESS.parse().unwrap()
}

#[test]
fn staged_build_and_sign() -> eyre::Result<()> {
    let chain_id = U256::from(80_001);
    let sender: Address = "0x9c5754De1443984659E1b3a8d1931D83475ba29C".parse()?;
    let mut tracker = KeyTracker::<Keccak256>::new();
    let pkh = tracker.more(20)[0].pkh();

    let partial = UserOperationPartial {
        sender: Some(sender),
        nonce: Some(U256::zero()),
        call_data: Some("0xb61d27f6".parse()?),
        ..Default::default()
    };

    let filled = Staged::of(partial.clone()).map(UserOperation::from);
    let signed = filled.try_bind(|uo| {
        attach_lamport_signature(&uo, None, &entry_point(), &chain_id, &mut tracker)
            .map(Staged::of)
    })?;

    // earlier stages are unaffected by signing
    assert!(filled.snapshot().signature.is_empty());
    assert_eq!(Staged::of(partial).snapshot().signature, None);

    let uo = signed.into_inner();
    assert_eq!(tracker.len(), 19);
    assert!(!tracker.pkhs().contains(&pkh));
    assert!(verify_user_operation::<Keccak256>(&uo, &entry_point(), &chain_id, &pkh)?);

    // a packed keccak signature is well above the zero-signature calldata cost
    let unsigned = uo.clone().signature(Bytes::default());
    assert!(calldata_gas(&uo.pack()) > calldata_gas(&unsigned.pack()));

    Ok(())
}

#[test]
fn consumed_key_is_persisted_before_submission() -> eyre::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut tracker = KeyTracker::<Keccak256>::new();
    tracker.more(3);

    let mut details = AccountDetails::new(
        "0x9c5754De1443984659E1b3a8d1931D83475ba29C".parse()?,
        Address::repeat_byte(0xfa),
        &tracker,
        Address::repeat_byte(0x0e),
        0,
        80_001,
    );
    let path = details.save(dir.path())?;
    assert!(path.ends_with("initObj_0x9c5754De1443984659E1b3a8d1931D83475ba29C.json"));

    let mut tracker = AccountDetails::load(dir.path(), &details.counterfactual)?.tracker();
    let used = tracker.get_one()?.pkh();
    details.update_keys(&tracker);
    details.save(dir.path())?;

    let reloaded = AccountDetails::load(dir.path(), &details.counterfactual)?;
    assert_eq!(reloaded, details);
    assert_eq!(reloaded.keys.0.len(), 2);
    assert!(!reloaded.tracker().pkhs().contains(&used));
    assert!(reloaded.initial_key_hashes.contains(&used));
    assert_eq!(std::fs::read_dir(dir.path())?.count(), 1);

    Ok(())
}
