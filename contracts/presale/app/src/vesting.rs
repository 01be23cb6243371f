//! Linear vesting schedules.
//!
//! Schedules are created by authorized callers (the presale instance) which
//! fund them up front; each beneficiary may hold several schedules and
//! releases them one at a time.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use parity_scale_codec::{Decode, Encode};
use presale_shared::{
    AccessControl, Amount, ContractResult, Duration, PresaleError, Role, ScheduleId, Timestamp,
    TokenType,
};
use scale_info::TypeInfo;
use sails_rs::prelude::*;

use crate::math;
use crate::rails::{AssetRail, CallContext};

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, TypeInfo)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub struct VestingSchedule {
    /// Caller that created and funded the schedule.
    pub context: ActorId,
    pub beneficiary: ActorId,
    pub total: Amount,
    pub released: Amount,
    pub start: Timestamp,
    pub duration: Duration,
}

impl VestingSchedule {
    /// Vested amount at `now`; linear between `start` and `start + duration`.
    pub fn vested_amount(&self, now: Timestamp) -> Amount {
        if now < self.start || self.total == 0 {
            return 0;
        }
        let elapsed = now - self.start;
        math::proportion(self.total, elapsed, self.duration)
    }

    pub fn releasable(&self, now: Timestamp) -> Amount {
        self.vested_amount(now).saturating_sub(self.released)
    }
}

#[derive(Debug, Clone)]
pub struct VestingEngine {
    id: ActorId,
    asset: TokenType,
    access: AccessControl,
    schedules: BTreeMap<(ActorId, ScheduleId), VestingSchedule>,
    next_schedule_id: ScheduleId,
}

impl VestingEngine {
    /// `id` is the escrow account, `asset` the token every schedule pays in.
    pub fn new(id: ActorId, asset: TokenType) -> Self {
        Self {
            id,
            asset,
            access: AccessControl::new(),
            schedules: BTreeMap::new(),
            next_schedule_id: 0,
        }
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    pub fn asset(&self) -> TokenType {
        self.asset
    }

    pub fn authorize(&mut self, scheduler: ActorId) {
        self.access.grant(Role::Scheduler, scheduler);
    }

    /// Pulls `amount` from the caller and starts a schedule for `beneficiary`.
    pub async fn create_schedule<R: AssetRail>(
        &mut self,
        ctx: &CallContext,
        rails: &mut R,
        beneficiary: ActorId,
        amount: Amount,
        start: Timestamp,
        duration: Duration,
    ) -> ContractResult<ScheduleId> {
        self.access.ensure(ctx.caller, Role::Scheduler)?;

        if amount == 0 {
            return Err(PresaleError::ZeroAmount);
        }
        if duration == 0 {
            return Err(PresaleError::InvalidVestingDuration);
        }
        if beneficiary == ActorId::zero() {
            return Err(PresaleError::ZeroAddress);
        }

        let schedule_id = self.next_schedule_id;
        let next = schedule_id.checked_add(1).ok_or(PresaleError::Overflow)?;

        rails.transfer(self.asset, ctx.caller, self.id, amount).await?;

        self.next_schedule_id = next;
        self.schedules.insert(
            (beneficiary, schedule_id),
            VestingSchedule {
                context: ctx.caller,
                beneficiary,
                total: amount,
                released: 0,
                start,
                duration,
            },
        );

        Ok(schedule_id)
    }

    /// Pays the caller whatever has vested on one of their schedules since the
    /// last release.
    pub async fn release<R: AssetRail>(
        &mut self,
        ctx: &CallContext,
        rails: &mut R,
        schedule_id: ScheduleId,
    ) -> ContractResult<Amount> {
        let schedule = self
            .schedules
            .get_mut(&(ctx.caller, schedule_id))
            .ok_or(PresaleError::ScheduleNotFound)?;

        let releasable = schedule.releasable(ctx.now);
        if releasable == 0 {
            return Err(PresaleError::NoTokensToRelease);
        }
        schedule.released += releasable;

        if let Err(e) = rails.transfer(self.asset, self.id, ctx.caller, releasable).await {
            if let Some(schedule) = self.schedules.get_mut(&(ctx.caller, schedule_id)) {
                schedule.released -= releasable;
            }
            return Err(e);
        }

        Ok(releasable)
    }

    pub fn schedule(&self, beneficiary: ActorId, schedule_id: ScheduleId) -> Option<&VestingSchedule> {
        self.schedules.get(&(beneficiary, schedule_id))
    }

    pub fn schedules_of(&self, beneficiary: ActorId) -> Vec<(ScheduleId, VestingSchedule)> {
        self.schedules
            .range((beneficiary, 0)..=(beneficiary, ScheduleId::MAX))
            .map(|((_, id), s)| (*id, s.clone()))
            .collect()
    }

    pub fn vested_amount(&self, beneficiary: ActorId, schedule_id: ScheduleId, now: Timestamp) -> Amount {
        self.schedule(beneficiary, schedule_id)
            .map(|s| s.vested_amount(now))
            .unwrap_or(0)
    }

    /// Escrowed amount not yet released, across all schedules.
    pub fn outstanding(&self) -> Amount {
        self.schedules.values().map(|s| s.total - s.released).sum()
    }
}
