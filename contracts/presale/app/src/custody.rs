//! Time-locked escrow for pool shares.

use alloc::vec::Vec;
use parity_scale_codec::{Decode, Encode};
use presale_shared::{
    AccessControl, Amount, ContractResult, LockId, PresaleError, Role, Timestamp, TokenType,
};
use scale_info::TypeInfo;
use sails_rs::prelude::*;

use crate::rails::{AssetRail, CallContext};

/// One escrowed lot. `amount` drops to zero on withdrawal and never comes back.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, TypeInfo)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub struct Lock {
    pub asset: TokenType,
    pub amount: Amount,
    pub unlock_time: Timestamp,
    pub owner: ActorId,
    pub withdrawn: bool,
}

impl Lock {
    pub fn is_unlocked(&self, now: Timestamp) -> bool {
        now >= self.unlock_time
    }
}

#[derive(Debug, Clone)]
pub struct LockedCustody {
    id: ActorId,
    access: AccessControl,
    locks: Vec<Lock>,
}

impl LockedCustody {
    /// `id` is the account escrowed lots are held under.
    pub fn new(id: ActorId) -> Self {
        Self {
            id,
            access: AccessControl::new(),
            locks: Vec::new(),
        }
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    pub fn authorize(&mut self, locker: ActorId) {
        self.access.grant(Role::Locker, locker);
    }

    /// Pulls `amount` of `asset` from the caller and records a new lock.
    pub async fn lock<R: AssetRail>(
        &mut self,
        ctx: &CallContext,
        rails: &mut R,
        asset: TokenType,
        amount: Amount,
        unlock_time: Timestamp,
        owner: ActorId,
    ) -> ContractResult<LockId> {
        self.access.ensure(ctx.caller, Role::Locker)?;

        if asset.is_null() || owner == ActorId::zero() {
            return Err(PresaleError::ZeroAddress);
        }
        if amount == 0 {
            return Err(PresaleError::ZeroAmount);
        }
        if unlock_time <= ctx.now {
            return Err(PresaleError::InvalidUnlockTime);
        }

        rails.transfer(asset, ctx.caller, self.id, amount).await?;

        let lock_id = self.locks.len() as LockId;
        self.locks.push(Lock {
            asset,
            amount,
            unlock_time,
            owner,
            withdrawn: false,
        });

        Ok(lock_id)
    }

    /// Pays a matured lock out to its owner, once.
    pub async fn withdraw<R: AssetRail>(
        &mut self,
        ctx: &CallContext,
        rails: &mut R,
        lock_id: LockId,
    ) -> ContractResult<Lock> {
        let index = usize::try_from(lock_id).map_err(|_| PresaleError::LockNotFound)?;
        let lock = self.locks.get_mut(index).ok_or(PresaleError::LockNotFound)?;

        if ctx.caller != lock.owner {
            return Err(PresaleError::NotLockOwner);
        }
        if !lock.is_unlocked(ctx.now) {
            return Err(PresaleError::StillLocked);
        }
        if lock.amount == 0 {
            return Err(PresaleError::AlreadyWithdrawn);
        }

        let released = lock.clone();
        lock.amount = 0;
        lock.withdrawn = true;

        if let Err(e) = rails
            .transfer(released.asset, self.id, released.owner, released.amount)
            .await
        {
            self.locks[index] = released;
            return Err(e);
        }

        Ok(released)
    }

    pub fn get(&self, lock_id: LockId) -> Option<&Lock> {
        usize::try_from(lock_id).ok().and_then(|i| self.locks.get(i))
    }

    pub fn locks_of(&self, owner: ActorId) -> Vec<LockId> {
        self.locks
            .iter()
            .enumerate()
            .filter(|(_, l)| l.owner == owner)
            .map(|(i, _)| i as LockId)
            .collect()
    }

    /// Amount of `token` still escrowed for open locks.
    pub fn locked(&self, token: TokenType) -> Amount {
        self.locks
            .iter()
            .filter(|l| l.asset == token)
            .map(|l| l.amount)
            .sum()
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
