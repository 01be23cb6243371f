//! Presale Program - Application Logic.
//!
//! One program runs one presale end to end:
//! - Contribution window with hard/soft caps and an optional whitelist
//! - Finalization that seeds a DEX pool and locks the pool shares
//! - Claims with an optional linearly vesting part, refunds on failure
//!
//! The state machine, vesting engine and custody are plain types driven
//! through [`rails`]; the services below bind them to the Gear runtime.
//!
//! Endpoints that await other programs reply with their `Result` instead of
//! failing the message. Memory is committed at every await, so a failure
//! raised afterwards would keep the busy flag set and lose the restore.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod constants;
pub mod custody;
pub mod dex_client;
pub mod gear_rails;
pub mod guard;
pub mod instance;
pub mod math;
pub mod presale;
pub mod rails;
pub mod vesting;
pub mod vft_client;
pub mod whitelist;

#[cfg(test)]
mod testing;

use alloc::vec::Vec;
use parity_scale_codec::{Decode, Encode};
use presale_shared::{
    Amount, LeftoverPolicy, LockId, PresaleError, ScheduleId, Timestamp, TokenType,
};
use scale_info::TypeInfo;
use core::panic;
use sails_rs::prelude::*;

use crate::custody::Lock;
use crate::gear_rails::GearRails;
use crate::instance::{InstanceAccounts, PresaleInstance};
use crate::presale::{HouseFee, PoolState, PresaleConfig};
use crate::rails::CallContext;
use crate::vesting::VestingSchedule;
use crate::whitelist::{Hash, Whitelist};

// =============================================================================
// CONSTRUCTOR INPUT AND VIEWS
// =============================================================================

/// Constructor input.
#[derive(Debug, Clone, Encode, Decode, TypeInfo)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub struct PresaleInit {
    pub config: PresaleConfig,
    pub house: HouseFee,
    pub whitelist: Whitelist,
    /// DEX router used at finalization.
    pub pool_provider: ActorId,
}

/// Everything a front end needs to render the presale.
#[derive(Debug, Clone, Encode, Decode, TypeInfo)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub struct PresaleView {
    pub creator: ActorId,
    pub config: PresaleConfig,
    pub house: HouseFee,
    pub pool: PoolState,
    pub whitelist: Whitelist,
    pub pool_provider: ActorId,
    pub contributors: u32,
}

// =============================================================================
// STORAGE
// =============================================================================

pub struct PresaleStorage {
    instance: PresaleInstance,
    pool_provider: ActorId,
}

static mut STORAGE: Option<PresaleStorage> = None;

fn init_storage(storage: PresaleStorage) {
    unsafe {
        *core::ptr::addr_of_mut!(STORAGE) = Some(storage);
    }
}

fn storage_mut() -> &'static mut PresaleStorage {
    unsafe {
        (*core::ptr::addr_of_mut!(STORAGE))
            .as_mut()
            .expect("Presale storage is not initialized")
    }
}

fn storage() -> &'static PresaleStorage {
    unsafe {
        (*core::ptr::addr_of!(STORAGE))
            .as_ref()
            .expect("Presale storage is not initialized")
    }
}

fn call_context() -> CallContext {
    CallContext::new(gstd::msg::source(), gstd::exec::block_timestamp())
}

/// Sends back attached value the operation did not take, on success and on
/// error alike. A failed send is logged; the reply still reports the
/// operation's own outcome.
fn settle_value(rails: &mut GearRails, caller: ActorId) {
    if let Err(e) = rails.return_unspent(caller) {
        gstd::debug!("presale: could not return unspent value to {:?}: {:?}", caller, e);
    }
}

// =============================================================================
// EVENTS
// =============================================================================

/// Events emitted by the Presale service.
#[derive(Debug, Clone, Encode, TypeInfo)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub enum PresaleEvent {
    /// Asset deposited, presale active.
    Deposited { amount: Amount },
    Contributed {
        contributor: ActorId,
        amount: Amount,
        total: Amount,
    },
    Finalized {
        total_raised: Amount,
        house_amount: Amount,
        owner_residual: Amount,
    },
    LiquidityAdded {
        pool: ActorId,
        asset_amount: Amount,
        currency_amount: Amount,
        shares: Amount,
    },
    /// Pool shares locked for the creator.
    Locked {
        lock_id: LockId,
        shares: Amount,
        unlock_time: Timestamp,
    },
    LeftoverDisposed {
        amount: Amount,
        policy: LeftoverPolicy,
        schedule_id: Option<ScheduleId>,
    },
    Canceled { returned: Amount },
    Claimed {
        user: ActorId,
        immediate: Amount,
        vested: Amount,
    },
    ScheduleCreated {
        beneficiary: ActorId,
        schedule_id: ScheduleId,
        amount: Amount,
    },
    Refunded { user: ActorId, amount: Amount },
    Withdrawn { amount: Amount },
    Rescued {
        token: TokenType,
        to: ActorId,
        amount: Amount,
    },
    WhitelistUpdated { added: u32, removed: u32 },
    MerkleRootUpdated { root: Hash },
}

impl sails_rs::SailsEvent for PresaleEvent {
    fn encoded_event_name(&self) -> &'static [u8] {
        match self {
            PresaleEvent::Deposited { .. } => b"Deposited",
            PresaleEvent::Contributed { .. } => b"Contributed",
            PresaleEvent::Finalized { .. } => b"Finalized",
            PresaleEvent::LiquidityAdded { .. } => b"LiquidityAdded",
            PresaleEvent::Locked { .. } => b"Locked",
            PresaleEvent::LeftoverDisposed { .. } => b"LeftoverDisposed",
            PresaleEvent::Canceled { .. } => b"Canceled",
            PresaleEvent::Claimed { .. } => b"Claimed",
            PresaleEvent::ScheduleCreated { .. } => b"ScheduleCreated",
            PresaleEvent::Refunded { .. } => b"Refunded",
            PresaleEvent::Withdrawn { .. } => b"Withdrawn",
            PresaleEvent::Rescued { .. } => b"Rescued",
            PresaleEvent::WhitelistUpdated { .. } => b"WhitelistUpdated",
            PresaleEvent::MerkleRootUpdated { .. } => b"MerkleRootUpdated",
        }
    }
}

/// Events emitted by the Vesting service.
#[derive(Debug, Clone, Encode, TypeInfo)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub enum VestingEvent {
    Released {
        beneficiary: ActorId,
        schedule_id: ScheduleId,
        amount: Amount,
    },
}

impl sails_rs::SailsEvent for VestingEvent {
    fn encoded_event_name(&self) -> &'static [u8] {
        match self {
            VestingEvent::Released { .. } => b"Released",
        }
    }
}

/// Events emitted by the Custody service.
#[derive(Debug, Clone, Encode, TypeInfo)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub enum CustodyEvent {
    Unlocked {
        lock_id: LockId,
        owner: ActorId,
        amount: Amount,
    },
}

impl sails_rs::SailsEvent for CustodyEvent {
    fn encoded_event_name(&self) -> &'static [u8] {
        match self {
            CustodyEvent::Unlocked { .. } => b"Unlocked",
        }
    }
}

// =============================================================================
// PRESALE SERVICE
// =============================================================================

pub struct PresaleService(());

impl PresaleService {
    pub fn new() -> Self {
        Self(())
    }
}

#[sails_rs::service(events = PresaleEvent)]
impl PresaleService {
    // -------------------------------------------------------------------------
    // LIFECYCLE
    // -------------------------------------------------------------------------

    /// Pull the asset deposit from the creator (requires VFT approval).
    #[export]
    pub async fn deposit(&mut self) -> Result<Amount, PresaleError> {
        let ctx = call_context();
        let s = storage_mut();
        let mut rails = GearRails::new(s.pool_provider);

        let result = s.instance.deposit(&ctx, &mut rails).await;
        settle_value(&mut rails, ctx.caller);
        let amount = result?;

        gstd::debug!("presale: deposit of {} received, sale is active", amount);
        self.emit_event(PresaleEvent::Deposited { amount });
        Ok(amount)
    }

    /// Contribute `amount` of the raise currency. Native contributions attach
    /// exactly `amount` as message value.
    #[export]
    pub async fn contribute(&mut self, amount: Amount, proof: Vec<Hash>) -> Result<Amount, PresaleError> {
        let ctx = call_context();
        let s = storage_mut();
        let mut rails = GearRails::new(s.pool_provider);

        let result = s.instance.contribute(&ctx, &mut rails, amount, &proof).await;
        settle_value(&mut rails, ctx.caller);
        let total = result?;

        self.emit_event(PresaleEvent::Contributed {
            contributor: ctx.caller,
            amount,
            total,
        });
        Ok(total)
    }

    /// Finalize a successful raise (creator only, after the end).
    #[export]
    pub async fn finalize(&mut self) -> Result<Amount, PresaleError> {
        let ctx = call_context();
        let s = storage_mut();
        let mut rails = GearRails::new(s.pool_provider);

        let result = s.instance.finalize(&ctx, &mut rails).await;
        settle_value(&mut rails, ctx.caller);
        let report = result?;

        gstd::debug!(
            "presale: finalized with {} raised, {} pool shares locked until {}",
            report.total_raised,
            report.shares,
            report.unlock_time
        );

        self.emit_event(PresaleEvent::Finalized {
            total_raised: report.total_raised,
            house_amount: report.house_amount,
            owner_residual: report.owner_residual,
        });
        self.emit_event(PresaleEvent::LiquidityAdded {
            pool: report.pool,
            asset_amount: report.liquidity_asset,
            currency_amount: report.liquidity_currency,
            shares: report.shares,
        });
        self.emit_event(PresaleEvent::Locked {
            lock_id: report.lock_id,
            shares: report.shares,
            unlock_time: report.unlock_time,
        });
        if report.leftover > 0 {
            self.emit_event(PresaleEvent::LeftoverDisposed {
                amount: report.leftover,
                policy: report.leftover_policy,
                schedule_id: report.leftover_schedule,
            });
        }
        if let Some(schedule_id) = report.leftover_schedule {
            self.emit_event(PresaleEvent::ScheduleCreated {
                beneficiary: s.instance.presale().creator(),
                schedule_id,
                amount: report.leftover,
            });
        }

        Ok(report.total_raised)
    }

    /// Cancel before finalization and return the asset to the creator.
    #[export]
    pub async fn cancel(&mut self) -> Result<Amount, PresaleError> {
        let ctx = call_context();
        let s = storage_mut();
        let mut rails = GearRails::new(s.pool_provider);

        let result = s.instance.cancel(&ctx, &mut rails).await;
        settle_value(&mut rails, ctx.caller);
        let returned = result?;

        gstd::debug!("presale: canceled, {} asset returned", returned);
        self.emit_event(PresaleEvent::Canceled { returned });
        Ok(returned)
    }

    // -------------------------------------------------------------------------
    // SETTLEMENT
    // -------------------------------------------------------------------------

    /// Claim the caller's allocation after finalization.
    #[export]
    pub async fn claim(&mut self) -> Result<Amount, PresaleError> {
        let ctx = call_context();
        let s = storage_mut();
        let mut rails = GearRails::new(s.pool_provider);

        let result = s.instance.claim(&ctx, &mut rails).await;
        settle_value(&mut rails, ctx.caller);
        let report = result?;

        self.emit_event(PresaleEvent::Claimed {
            user: ctx.caller,
            immediate: report.immediate,
            vested: report.vested,
        });
        if let Some(schedule_id) = report.schedule_id {
            self.emit_event(PresaleEvent::ScheduleCreated {
                beneficiary: ctx.caller,
                schedule_id,
                amount: report.vested,
            });
        }
        Ok(report.total)
    }

    /// Take the caller's contribution back after a cancel or a missed soft cap.
    #[export]
    pub async fn refund(&mut self) -> Result<Amount, PresaleError> {
        let ctx = call_context();
        let s = storage_mut();
        let mut rails = GearRails::new(s.pool_provider);

        let result = s.instance.refund(&ctx, &mut rails).await;
        settle_value(&mut rails, ctx.caller);
        let amount = result?;

        self.emit_event(PresaleEvent::Refunded {
            user: ctx.caller,
            amount,
        });
        Ok(amount)
    }

    /// Withdraw the creator's share of the raise.
    #[export]
    pub async fn withdraw(&mut self) -> Result<Amount, PresaleError> {
        let ctx = call_context();
        let s = storage_mut();
        let mut rails = GearRails::new(s.pool_provider);

        let result = s.instance.withdraw(&ctx, &mut rails).await;
        settle_value(&mut rails, ctx.caller);
        let amount = result?;

        gstd::debug!("presale: creator withdrew {}", amount);
        self.emit_event(PresaleEvent::Withdrawn { amount });
        Ok(amount)
    }

    /// Move stray tokens out of a closed presale.
    #[export]
    pub async fn rescue(&mut self, token: TokenType, to: ActorId, amount: Amount) -> Result<(), PresaleError> {
        let ctx = call_context();
        let s = storage_mut();
        let mut rails = GearRails::new(s.pool_provider);

        let result = s.instance.rescue(&ctx, &mut rails, token, to, amount).await;
        settle_value(&mut rails, ctx.caller);
        result?;

        self.emit_event(PresaleEvent::Rescued { token, to, amount });
        Ok(())
    }

    // -------------------------------------------------------------------------
    // WHITELIST
    // -------------------------------------------------------------------------

    #[export(unwrap_result)]
    pub fn add_to_whitelist(&mut self, addresses: Vec<ActorId>) -> Result<u32, PresaleError> {
        let ctx = call_context();
        let added = storage_mut().instance.add_to_whitelist(&ctx, addresses)?;

        self.emit_event(PresaleEvent::WhitelistUpdated { added, removed: 0 });
        Ok(added)
    }

    #[export(unwrap_result)]
    pub fn remove_from_whitelist(&mut self, addresses: Vec<ActorId>) -> Result<u32, PresaleError> {
        let ctx = call_context();
        let removed = storage_mut().instance.remove_from_whitelist(&ctx, addresses)?;

        self.emit_event(PresaleEvent::WhitelistUpdated { added: 0, removed });
        Ok(removed)
    }

    #[export(unwrap_result)]
    pub fn set_merkle_root(&mut self, root: Hash) -> Result<(), PresaleError> {
        let ctx = call_context();
        storage_mut().instance.set_merkle_root(&ctx, root)?;

        self.emit_event(PresaleEvent::MerkleRootUpdated { root });
        Ok(())
    }

    // -------------------------------------------------------------------------
    // QUERIES
    // -------------------------------------------------------------------------

    #[export]
    pub fn view(&self) -> PresaleView {
        let s = storage();
        let presale = s.instance.presale();
        PresaleView {
            creator: presale.creator(),
            config: presale.config().clone(),
            house: *presale.house(),
            pool: presale.pool().clone(),
            whitelist: presale.whitelist().clone(),
            pool_provider: s.pool_provider,
            contributors: math::count_u32(presale.contributors().len()),
        }
    }

    #[export]
    pub fn contribution_of(&self, user: ActorId) -> Amount {
        storage().instance.presale().contribution_of(&user)
    }

    /// Contributors in first-contribution order.
    #[export]
    pub fn contributors(&self) -> Vec<ActorId> {
        storage().instance.presale().contributors().to_vec()
    }

    /// Asset a contributor would receive for their open contribution.
    #[export]
    pub fn claimable_tokens(&self, user: ActorId) -> Amount {
        storage()
            .instance
            .presale()
            .allocation_of(&user)
            .unwrap_or(0)
    }

    #[export]
    pub fn is_whitelisted(&self, user: ActorId, proof: Vec<Hash>) -> bool {
        storage().instance.presale().is_whitelisted(&user, &proof)
    }

    #[export]
    pub fn refunds_open(&self) -> bool {
        storage()
            .instance
            .presale()
            .refunds_open(gstd::exec::block_timestamp())
    }
}

// =============================================================================
// VESTING SERVICE
// =============================================================================

pub struct VestingService(());

impl VestingService {
    pub fn new() -> Self {
        Self(())
    }
}

#[sails_rs::service(events = VestingEvent)]
impl VestingService {
    /// Release whatever has vested on one of the caller's schedules.
    #[export]
    pub async fn release(&mut self, schedule_id: ScheduleId) -> Result<Amount, PresaleError> {
        let ctx = call_context();
        let s = storage_mut();
        let mut rails = GearRails::new(s.pool_provider);

        let result = s.instance.release(&ctx, &mut rails, schedule_id).await;
        settle_value(&mut rails, ctx.caller);
        let amount = result?;

        self.emit_event(VestingEvent::Released {
            beneficiary: ctx.caller,
            schedule_id,
            amount,
        });
        Ok(amount)
    }

    #[export]
    pub fn schedules_of(&self, beneficiary: ActorId) -> Vec<(ScheduleId, VestingSchedule)> {
        storage().instance.vesting().schedules_of(beneficiary)
    }

    #[export]
    pub fn vested_amount(&self, beneficiary: ActorId, schedule_id: ScheduleId) -> Amount {
        storage().instance.vesting().vested_amount(
            beneficiary,
            schedule_id,
            gstd::exec::block_timestamp(),
        )
    }

    #[export]
    pub fn releasable(&self, beneficiary: ActorId, schedule_id: ScheduleId) -> Amount {
        storage()
            .instance
            .vesting()
            .schedule(beneficiary, schedule_id)
            .map(|s| s.releasable(gstd::exec::block_timestamp()))
            .unwrap_or(0)
    }
}

// =============================================================================
// CUSTODY SERVICE
// =============================================================================

pub struct CustodyService(());

impl CustodyService {
    pub fn new() -> Self {
        Self(())
    }
}

#[sails_rs::service(events = CustodyEvent)]
impl CustodyService {
    /// Withdraw a matured lock (lock owner only).
    #[export]
    pub async fn withdraw(&mut self, lock_id: LockId) -> Result<Amount, PresaleError> {
        let ctx = call_context();
        let s = storage_mut();
        let mut rails = GearRails::new(s.pool_provider);

        let result = s.instance.unlock(&ctx, &mut rails, lock_id).await;
        settle_value(&mut rails, ctx.caller);
        let amount = result?;

        gstd::debug!("custody: lock {} released {} to its owner", lock_id, amount);
        self.emit_event(CustodyEvent::Unlocked {
            lock_id,
            owner: ctx.caller,
            amount,
        });
        Ok(amount)
    }

    #[export]
    pub fn lock(&self, lock_id: LockId) -> Option<Lock> {
        storage().instance.custody().get(lock_id).cloned()
    }

    #[export]
    pub fn locks_of(&self, owner: ActorId) -> Vec<LockId> {
        storage().instance.custody().locks_of(owner)
    }
}

// =============================================================================
// PROGRAM ENTRY POINT
// =============================================================================

/// Presale Program entry point.
pub struct PresaleProgram(());

#[sails_rs::program]
impl PresaleProgram {
    /// Create the presale; the sender becomes its creator. Panics on an
    /// invalid configuration.
    pub fn new(init: PresaleInit) -> Self {
        if init.pool_provider == ActorId::zero() {
            panic!("{:?}", PresaleError::ZeroAddress);
        }

        let instance = PresaleInstance::new(
            InstanceAccounts::single(gstd::exec::program_id()),
            gstd::msg::source(),
            init.config,
            init.house,
            init.whitelist,
            gstd::exec::block_timestamp(),
        )
        .unwrap_or_else(|e| panic!("{e:?}"));

        init_storage(PresaleStorage {
            instance,
            pool_provider: init.pool_provider,
        });
        gstd::debug!("presale: created by {:?}", gstd::msg::source());
        Self(())
    }

    pub fn presale(&self) -> PresaleService {
        PresaleService::new()
    }

    pub fn vesting(&self) -> VestingService {
        VestingService::new()
    }

    pub fn custody(&self) -> CustodyService {
        CustodyService::new()
    }
}
