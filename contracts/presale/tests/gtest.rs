//! Integration tests for the presale program.
//!
//! Flows that need a live VFT or DEX program are covered by the unit tests
//! in `presale-app`; these exercise the deployed program's entry points.
//!
//! Endpoints that talk to other programs reply with `Err` instead of failing
//! the message, so those are checked by reply payload.

use std::collections::BTreeSet;

use gtest::{BlockRunResult, Program, System};
use presale_app::presale::{HouseFee, PresaleConfig};
use presale_app::whitelist::Whitelist;
use presale_app::PresaleInit;
use presale_shared::{Amount, LeftoverPolicy, PresaleError, TokenType};
use sails_rs::prelude::ActorId;
use sails_rs::Encode;

// User IDs must be >= 100 to be valid in gtest
const CREATOR: u64 = 100;
const CONTRIBUTOR: u64 = 101;
const STRANGER: u64 = 102;
const HOUSE: u64 = 103;

const ONE_VARA: u128 = 1_000_000_000_000; // 10^12
const EXISTENTIAL_DEPOSIT: u128 = 10 * ONE_VARA;

// Dummy program addresses
const ASSET_TOKEN: u64 = 200;
const DEX_ROUTER: u64 = 201;

const WASM_PATH: &str = "../../target/wasm32-gear/release/presale.opt.wasm";

/// Encode a Sails constructor call with parameters
fn encode_constructor<T: Encode>(name: &str, params: T) -> Vec<u8> {
    let mut payload = name.encode();
    payload.extend(params.encode());
    payload
}

/// Encode a Sails service call with parameters
fn encode_call<T: Encode>(service: &str, method: &str, params: T) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend(service.encode());
    payload.extend(method.encode());
    payload.extend(params.encode());
    payload
}

/// Encode a Sails service call without parameters
fn encode_call_no_params(service: &str, method: &str) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend(service.encode());
    payload.extend(method.encode());
    payload
}

/// Whether `user` got `Err(error)` back from `service/method`.
fn replied_err<T: Encode>(
    result: &BlockRunResult,
    user: u64,
    service: &str,
    method: &str,
    error: PresaleError,
) -> bool {
    let expected = encode_call(service, method, Err::<T, PresaleError>(error));
    result
        .log()
        .iter()
        .any(|log| log.destination() == ActorId::from(user) && log.payload() == expected.as_slice())
}

fn replied_ok<T: Encode>(result: &BlockRunResult, user: u64, service: &str, method: &str, value: T) -> bool {
    let expected = encode_call(service, method, Ok::<T, PresaleError>(value));
    result
        .log()
        .iter()
        .any(|log| log.destination() == ActorId::from(user) && log.payload() == expected.as_slice())
}

fn setup_system() -> System {
    let system = System::new();
    system.init_logger();

    for user in [CREATOR, CONTRIBUTOR, STRANGER, HOUSE] {
        system.mint_to(user, EXISTENTIAL_DEPOSIT * 1000);
    }

    system
}

fn presale_init(system: &System, whitelist: Whitelist) -> PresaleInit {
    let now = system.block_timestamp();

    PresaleInit {
        config: PresaleConfig {
            asset: ActorId::from(ASSET_TOKEN),
            currency: TokenType::Native,
            asset_deposit: 1_500_000 * ONE_VARA,
            hard_cap: 1000 * ONE_VARA,
            soft_cap: 500 * ONE_VARA,
            min_contribution: ONE_VARA,
            max_contribution: 200 * ONE_VARA,
            start: now + 60_000,
            end: now + 600_000,
            liquidity_bps: 6_000,
            slippage_bps: 100,
            presale_rate: 1000,
            listing_rate: 800,
            lockup_duration: 30 * 24 * 60 * 60 * 1000,
            vesting_bps: 0,
            vesting_duration: 0,
            leftover_policy: LeftoverPolicy::Return,
        },
        house: HouseFee {
            recipient: ActorId::from(HOUSE),
            bps: 200,
        },
        whitelist,
        pool_provider: ActorId::from(DEX_ROUTER),
    }
}

/// Deploys the program and reports whether the constructor succeeded.
fn try_deploy<'a>(system: &'a System, init: PresaleInit) -> (Program<'a>, bool) {
    let program = Program::from_file(system, WASM_PATH);

    let init_msg_id = program.send_bytes(CREATOR, encode_constructor("New", init));
    let result = system.run_next_block();

    let ok = result.succeed.contains(&init_msg_id);
    (program, ok)
}

fn deploy(system: &System, whitelist: Whitelist) -> Program<'_> {
    let (program, ok) = try_deploy(system, presale_init(system, whitelist));
    if !ok {
        panic!("Presale init failed. Check WASM file exists and is valid.");
    }
    program
}

// =============================================================================
// CONSTRUCTOR
// =============================================================================

#[test]
fn test_presale_initialization() {
    let system = setup_system();
    let _program = deploy(&system, Whitelist::Open);
}

#[test]
fn test_init_rejects_invalid_config() {
    let system = setup_system();

    let mut init = presale_init(&system, Whitelist::Open);
    init.config.soft_cap = init.config.hard_cap + 1;

    let (_program, ok) = try_deploy(&system, init);
    assert!(!ok, "Init with soft cap above hard cap should fail");
}

#[test]
fn test_init_rejects_excessive_house_fee() {
    let system = setup_system();

    let mut init = presale_init(&system, Whitelist::Open);
    init.house.bps = 600;

    let (_program, ok) = try_deploy(&system, init);
    assert!(!ok, "Init with a house fee above 5% should fail");
}

#[test]
fn test_init_rejects_missing_pool_provider() {
    let system = setup_system();

    let mut init = presale_init(&system, Whitelist::Open);
    init.pool_provider = ActorId::zero();

    let (_program, ok) = try_deploy(&system, init);
    assert!(!ok, "Init without a DEX router should fail");
}

// =============================================================================
// ACCESS CONTROL AND LIFECYCLE
// =============================================================================

#[test]
fn test_deposit_requires_creator() {
    let system = setup_system();
    let program = deploy(&system, Whitelist::Open);

    let msg_id = program.send_bytes(STRANGER, encode_call_no_params("Presale", "Deposit"));
    let result = system.run_next_block();

    assert!(result.succeed.contains(&msg_id));
    assert!(
        replied_err::<Amount>(&result, STRANGER, "Presale", "Deposit", PresaleError::Unauthorized),
        "Deposit from a non-creator should be refused"
    );
}

#[test]
fn test_contribute_before_deposit_fails() {
    let system = setup_system();
    let program = deploy(&system, Whitelist::Open);

    let proof: Vec<[u8; 32]> = Vec::new();
    let msg_id = program.send_bytes_with_value(
        CONTRIBUTOR,
        encode_call("Presale", "Contribute", (10 * ONE_VARA, proof)),
        10 * ONE_VARA,
    );
    let result = system.run_next_block();

    assert!(result.succeed.contains(&msg_id));
    assert!(
        replied_err::<Amount>(&result, CONTRIBUTOR, "Presale", "Contribute", PresaleError::NotActive),
        "Contribute to a pending presale should be refused"
    );
}

#[test]
fn test_finalize_before_deposit_fails() {
    let system = setup_system();
    let program = deploy(&system, Whitelist::Open);

    let msg_id = program.send_bytes(CREATOR, encode_call_no_params("Presale", "Finalize"));
    let result = system.run_next_block();

    assert!(result.succeed.contains(&msg_id));
    assert!(
        replied_err::<Amount>(&result, CREATOR, "Presale", "Finalize", PresaleError::NotActive),
        "Finalize of a pending presale should be refused"
    );
}

#[test]
fn test_cancel_requires_creator() {
    let system = setup_system();
    let program = deploy(&system, Whitelist::Open);

    let msg_id = program.send_bytes(STRANGER, encode_call_no_params("Presale", "Cancel"));
    let result = system.run_next_block();

    assert!(result.succeed.contains(&msg_id));
    assert!(
        replied_err::<Amount>(&result, STRANGER, "Presale", "Cancel", PresaleError::Unauthorized),
        "Cancel from a non-creator should be refused"
    );
}

#[test]
fn test_refused_calls_leave_presale_usable() {
    let system = setup_system();
    let program = deploy(&system, Whitelist::Open);

    for (user, method) in [(STRANGER, "Deposit"), (CREATOR, "Finalize"), (STRANGER, "Cancel")] {
        program.send_bytes(user, encode_call_no_params("Presale", method));
        system.run_next_block();
    }

    let msg_id = program.send_bytes(CREATOR, encode_call_no_params("Presale", "Cancel"));
    let result = system.run_next_block();
    assert!(result.succeed.contains(&msg_id));
    assert!(
        replied_ok::<Amount>(&result, CREATOR, "Presale", "Cancel", 0),
        "Earlier refusals must not leave the presale busy"
    );
}

#[test]
fn test_cancel_pending_then_refund_nothing() {
    let system = setup_system();
    let program = deploy(&system, Whitelist::Open);

    let msg_id = program.send_bytes(CREATOR, encode_call_no_params("Presale", "Cancel"));
    let result = system.run_next_block();
    assert!(
        result.succeed.contains(&msg_id),
        "Creator should be able to cancel a pending presale"
    );

    // Second cancel hits a closed presale
    program.send_bytes(CREATOR, encode_call_no_params("Presale", "Cancel"));
    let result = system.run_next_block();
    assert!(
        replied_err::<Amount>(&result, CREATOR, "Presale", "Cancel", PresaleError::PresaleClosed),
        "Cancel is one-shot"
    );

    // Nothing was contributed, so there is nothing to refund
    program.send_bytes(CONTRIBUTOR, encode_call_no_params("Presale", "Refund"));
    let result = system.run_next_block();
    assert!(
        replied_err::<Amount>(&result, CONTRIBUTOR, "Presale", "Refund", PresaleError::NoFundsToRefund),
        "Refund without a contribution should be refused"
    );
}

#[test]
fn test_withdraw_before_finalize_fails() {
    let system = setup_system();
    let program = deploy(&system, Whitelist::Open);

    program.send_bytes(CREATOR, encode_call_no_params("Presale", "Withdraw"));
    let result = system.run_next_block();

    assert!(
        replied_err::<Amount>(&result, CREATOR, "Presale", "Withdraw", PresaleError::NoFundsToWithdraw),
        "Withdraw before finalization should be refused"
    );
}

// =============================================================================
// WHITELIST
// =============================================================================

#[test]
fn test_whitelist_management() {
    let system = setup_system();
    let program = deploy(&system, Whitelist::Listed(BTreeSet::new()));

    let addresses: Vec<ActorId> = vec![ActorId::from(CONTRIBUTOR)];

    let msg_id = program.send_bytes(
        STRANGER,
        encode_call("Presale", "AddToWhitelist", addresses.clone()),
    );
    let result = system.run_next_block();
    assert!(
        result.failed.contains(&msg_id),
        "AddToWhitelist from a non-creator should fail"
    );

    let msg_id = program.send_bytes(
        CREATOR,
        encode_call("Presale", "AddToWhitelist", addresses.clone()),
    );
    let result = system.run_next_block();
    assert!(
        result.succeed.contains(&msg_id),
        "AddToWhitelist should succeed"
    );

    let msg_id = program.send_bytes(
        CREATOR,
        encode_call("Presale", "RemoveFromWhitelist", addresses),
    );
    let result = system.run_next_block();
    assert!(
        result.succeed.contains(&msg_id),
        "RemoveFromWhitelist should succeed"
    );
}

#[test]
fn test_merkle_root_on_open_presale_fails() {
    let system = setup_system();
    let program = deploy(&system, Whitelist::Open);

    let msg_id = program.send_bytes(
        CREATOR,
        encode_call("Presale", "SetMerkleRoot", [7u8; 32]),
    );
    let result = system.run_next_block();

    assert!(
        result.failed.contains(&msg_id),
        "SetMerkleRoot on an open presale should fail"
    );
}

#[test]
fn test_whitelist_frozen_after_cancel() {
    let system = setup_system();
    let program = deploy(&system, Whitelist::Listed(BTreeSet::new()));

    program.send_bytes(CREATOR, encode_call_no_params("Presale", "Cancel"));
    system.run_next_block();

    let addresses: Vec<ActorId> = vec![ActorId::from(CONTRIBUTOR)];
    let msg_id = program.send_bytes(
        CREATOR,
        encode_call("Presale", "AddToWhitelist", addresses),
    );
    let result = system.run_next_block();

    assert!(
        result.failed.contains(&msg_id),
        "Whitelist cannot change after cancel"
    );
}

// =============================================================================
// CUSTODY AND VESTING
// =============================================================================

#[test]
fn test_unknown_lock_and_schedule_fail() {
    let system = setup_system();
    let program = deploy(&system, Whitelist::Open);

    program.send_bytes(CREATOR, encode_call("Custody", "Withdraw", 0u64));
    let result = system.run_next_block();
    assert!(
        replied_err::<Amount>(&result, CREATOR, "Custody", "Withdraw", PresaleError::LockNotFound),
        "Withdrawing a missing lock should be refused"
    );

    program.send_bytes(CONTRIBUTOR, encode_call("Vesting", "Release", 0u64));
    let result = system.run_next_block();
    assert!(
        replied_err::<Amount>(&result, CONTRIBUTOR, "Vesting", "Release", PresaleError::ScheduleNotFound),
        "Releasing a missing schedule should be refused"
    );
}
