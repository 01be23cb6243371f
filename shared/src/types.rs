//! Common types used across the presale services.

use alloc::collections::BTreeSet;
use parity_scale_codec::{Decode, Encode};
use scale_info::TypeInfo;
use sails_rs::prelude::*;

use crate::errors::{ContractResult, PresaleError};

/// Amount type for token values (supports up to 10^38).
pub type Amount = u128;

/// Block timestamp in milliseconds.
pub type Timestamp = u64;

/// Length of a time span in milliseconds.
pub type Duration = u64;

/// Basis points (1/100th of a percent, so 10000 = 100%).
pub type BasisPoints = u16;

/// Maximum basis points (100%).
pub const MAX_BASIS_POINTS: BasisPoints = 10_000;

/// Index of a lock inside the custody.
pub type LockId = u64;

/// Identifier of a vesting schedule, unique per engine.
pub type ScheduleId = u64;

/// Token type for contracts supporting both native and VFT tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Encode, Decode, TypeInfo)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub enum TokenType {
    /// Native VARA token.
    Native,
    /// VFT (Vara Fungible Token) contract address.
    Vft(ActorId),
}

impl TokenType {
    /// A VFT pointing at the zero address is the null token.
    pub fn is_null(&self) -> bool {
        matches!(self, TokenType::Vft(id) if *id == ActorId::zero())
    }
}

impl Default for TokenType {
    fn default() -> Self {
        Self::Native
    }
}

/// Lifecycle of a presale. Pending → Active → Finalized | Canceled, never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, TypeInfo, Default)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub enum PresaleState {
    /// Waiting for the asset deposit.
    #[default]
    Pending,
    /// Deposit made, accepting contributions inside the window.
    Active,
    /// Terminal, refund-only.
    Canceled,
    /// Terminal, claim/withdraw-only.
    Finalized,
}

/// What happens to the asset that was neither sold nor paired into the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, TypeInfo, Default)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub enum LeftoverPolicy {
    /// Send back to the creator.
    #[default]
    Return,
    /// Send to a sink nobody controls.
    Burn,
    /// Vest to the creator over the vesting duration.
    Vest,
}

/// Capability a caller may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Encode, Decode, TypeInfo)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub enum Role {
    /// Presale creator: deposit, finalize, cancel, withdraw, rescue.
    Creator,
    /// May open custody locks.
    Locker,
    /// May create vesting schedules.
    Scheduler,
}

/// Explicit role grants checked at the start of every gated operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode, TypeInfo)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub struct AccessControl {
    grants: BTreeSet<(Role, ActorId)>,
}

impl AccessControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&mut self, role: Role, who: ActorId) {
        self.grants.insert((role, who));
    }

    pub fn has_role(&self, who: ActorId, role: Role) -> bool {
        self.grants.contains(&(role, who))
    }

    pub fn ensure(&self, caller: ActorId, role: Role) -> ContractResult<()> {
        if self.has_role(caller, role) {
            Ok(())
        } else {
            Err(PresaleError::Unauthorized)
        }
    }
}
