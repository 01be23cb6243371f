//! One presale together with its vesting engine and custody.
//!
//! Every mutating call enters the busy guard and checkpoints all three
//! components. A call that fails before any transfer went out is undone
//! from the checkpoint; one that fails later keeps what it recorded, since
//! the transfers behind those records cannot be called back. The guard is
//! released either way, and errors are returned, never raised, so both
//! survive on chain.

use alloc::vec::Vec;
use presale_shared::{
    Amount, ContractResult, LockId, PresaleError, ScheduleId, Timestamp, TokenType,
};
use sails_rs::prelude::*;

use crate::custody::LockedCustody;
use crate::guard::ReentrancyGuard;
use crate::presale::{ClaimReport, FinalizeReport, HouseFee, Presale, PresaleConfig};
use crate::rails::{AssetRail, CallContext, PoolProvider};
use crate::vesting::VestingEngine;
use crate::whitelist::{Hash, Whitelist};

/// Accounts each component holds funds under. On chain all three are the
/// program itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceAccounts {
    pub presale: ActorId,
    pub vesting: ActorId,
    pub custody: ActorId,
}

impl InstanceAccounts {
    pub fn single(id: ActorId) -> Self {
        Self {
            presale: id,
            vesting: id,
            custody: id,
        }
    }
}

struct Checkpoint {
    presale: Presale,
    vesting: VestingEngine,
    custody: LockedCustody,
    committed: u64,
}

#[derive(Debug, Clone)]
pub struct PresaleInstance {
    presale: Presale,
    vesting: VestingEngine,
    custody: LockedCustody,
    guard: ReentrancyGuard,
}

impl PresaleInstance {
    pub fn new(
        accounts: InstanceAccounts,
        creator: ActorId,
        config: PresaleConfig,
        house: HouseFee,
        whitelist: Whitelist,
        now: Timestamp,
    ) -> ContractResult<Self> {
        let asset = config.asset_token();
        let presale = Presale::new(accounts.presale, creator, config, house, whitelist, now)?;

        let mut vesting = VestingEngine::new(accounts.vesting, asset);
        vesting.authorize(accounts.presale);
        let mut custody = LockedCustody::new(accounts.custody);
        custody.authorize(accounts.presale);

        Ok(Self {
            presale,
            vesting,
            custody,
            guard: ReentrancyGuard::default(),
        })
    }

    /// `committed` is the rail's effect count before the call.
    fn begin(&mut self, committed: u64) -> ContractResult<Checkpoint> {
        self.guard.enter()?;
        Ok(Checkpoint {
            presale: self.presale.clone(),
            vesting: self.vesting.clone(),
            custody: self.custody.clone(),
            committed,
        })
    }

    fn end<T>(
        &mut self,
        checkpoint: Checkpoint,
        committed: u64,
        result: ContractResult<T>,
    ) -> ContractResult<T> {
        if result.is_err() && committed == checkpoint.committed {
            self.presale = checkpoint.presale;
            self.vesting = checkpoint.vesting;
            self.custody = checkpoint.custody;
        }
        self.guard.exit();
        result
    }

    /// Part of the presale account's `token` balance that belongs to open
    /// locks or vesting schedules kept under the same account.
    fn escrowed_with_presale(&self, token: TokenType) -> ContractResult<Amount> {
        let account = self.presale.id();
        let mut escrowed: Amount = 0;
        if self.custody.id() == account {
            escrowed = self.custody.locked(token);
        }
        if self.vesting.id() == account && self.vesting.asset() == token {
            escrowed = escrowed
                .checked_add(self.vesting.outstanding())
                .ok_or(PresaleError::Overflow)?;
        }
        Ok(escrowed)
    }

    async fn rescue_unescrowed<R: AssetRail>(
        &mut self,
        ctx: &CallContext,
        rails: &mut R,
        token: TokenType,
        to: ActorId,
        amount: Amount,
    ) -> ContractResult<()> {
        self.presale.ensure_rescuable(ctx, token, to, amount)?;

        let escrowed = self.escrowed_with_presale(token)?;
        if escrowed > 0 {
            let held = rails.balance_of(token, self.presale.id()).await?;
            if held.saturating_sub(escrowed) < amount {
                return Err(PresaleError::RescueProtected);
            }
        }

        self.presale.rescue(ctx, rails, token, to, amount).await
    }

    // -------------------------------------------------------------------------
    // PRESALE
    // -------------------------------------------------------------------------

    pub async fn deposit<R: AssetRail>(
        &mut self,
        ctx: &CallContext,
        rails: &mut R,
    ) -> ContractResult<Amount> {
        let checkpoint = self.begin(rails.committed())?;
        let result = self.presale.deposit(ctx, rails).await;
        self.end(checkpoint, rails.committed(), result)
    }

    pub async fn contribute<R: AssetRail>(
        &mut self,
        ctx: &CallContext,
        rails: &mut R,
        amount: Amount,
        proof: &[Hash],
    ) -> ContractResult<Amount> {
        let checkpoint = self.begin(rails.committed())?;
        let result = self.presale.contribute(ctx, rails, amount, proof).await;
        self.end(checkpoint, rails.committed(), result)
    }

    pub async fn finalize<R: AssetRail + PoolProvider>(
        &mut self,
        ctx: &CallContext,
        rails: &mut R,
    ) -> ContractResult<FinalizeReport> {
        let checkpoint = self.begin(rails.committed())?;
        let result = self
            .presale
            .finalize(ctx, rails, &mut self.vesting, &mut self.custody)
            .await;
        self.end(checkpoint, rails.committed(), result)
    }

    pub async fn cancel<R: AssetRail>(
        &mut self,
        ctx: &CallContext,
        rails: &mut R,
    ) -> ContractResult<Amount> {
        let checkpoint = self.begin(rails.committed())?;
        let result = self.presale.cancel(ctx, rails).await;
        self.end(checkpoint, rails.committed(), result)
    }

    pub async fn claim<R: AssetRail>(
        &mut self,
        ctx: &CallContext,
        rails: &mut R,
    ) -> ContractResult<ClaimReport> {
        let checkpoint = self.begin(rails.committed())?;
        let result = self.presale.claim(ctx, rails, &mut self.vesting).await;
        self.end(checkpoint, rails.committed(), result)
    }

    pub async fn refund<R: AssetRail>(
        &mut self,
        ctx: &CallContext,
        rails: &mut R,
    ) -> ContractResult<Amount> {
        let checkpoint = self.begin(rails.committed())?;
        let result = self.presale.refund(ctx, rails).await;
        self.end(checkpoint, rails.committed(), result)
    }

    pub async fn withdraw<R: AssetRail>(
        &mut self,
        ctx: &CallContext,
        rails: &mut R,
    ) -> ContractResult<Amount> {
        let checkpoint = self.begin(rails.committed())?;
        let result = self.presale.withdraw(ctx, rails).await;
        self.end(checkpoint, rails.committed(), result)
    }

    pub async fn rescue<R: AssetRail>(
        &mut self,
        ctx: &CallContext,
        rails: &mut R,
        token: TokenType,
        to: ActorId,
        amount: Amount,
    ) -> ContractResult<()> {
        let checkpoint = self.begin(rails.committed())?;
        let result = self.rescue_unescrowed(ctx, rails, token, to, amount).await;
        self.end(checkpoint, rails.committed(), result)
    }

    pub fn add_to_whitelist(
        &mut self,
        ctx: &CallContext,
        addresses: Vec<ActorId>,
    ) -> ContractResult<u32> {
        let checkpoint = self.begin(0)?;
        let result = self.presale.add_to_whitelist(ctx, addresses);
        self.end(checkpoint, 0, result)
    }

    pub fn remove_from_whitelist(
        &mut self,
        ctx: &CallContext,
        addresses: Vec<ActorId>,
    ) -> ContractResult<u32> {
        let checkpoint = self.begin(0)?;
        let result = self.presale.remove_from_whitelist(ctx, addresses);
        self.end(checkpoint, 0, result)
    }

    pub fn set_merkle_root(&mut self, ctx: &CallContext, root: Hash) -> ContractResult<()> {
        let checkpoint = self.begin(0)?;
        let result = self.presale.set_merkle_root(ctx, root);
        self.end(checkpoint, 0, result)
    }

    // -------------------------------------------------------------------------
    // VESTING AND CUSTODY
    // -------------------------------------------------------------------------

    pub async fn release<R: AssetRail>(
        &mut self,
        ctx: &CallContext,
        rails: &mut R,
        schedule_id: ScheduleId,
    ) -> ContractResult<Amount> {
        let checkpoint = self.begin(rails.committed())?;
        let result = self.vesting.release(ctx, rails, schedule_id).await;
        self.end(checkpoint, rails.committed(), result)
    }

    /// Withdraws a matured lock; returns the amount paid out.
    pub async fn unlock<R: AssetRail>(
        &mut self,
        ctx: &CallContext,
        rails: &mut R,
        lock_id: LockId,
    ) -> ContractResult<Amount> {
        let checkpoint = self.begin(rails.committed())?;
        let result = self
            .custody
            .withdraw(ctx, rails, lock_id)
            .await
            .map(|lock| lock.amount);
        self.end(checkpoint, rails.committed(), result)
    }

    pub fn presale(&self) -> &Presale {
        &self.presale
    }

    pub fn vesting(&self) -> &VestingEngine {
        &self.vesting
    }

    pub fn custody(&self) -> &LockedCustody {
        &self.custody
    }

    pub fn is_busy(&self) -> bool {
        self.guard.is_busy()
    }

    #[cfg(test)]
    pub(crate) fn guard_mut(&mut self) -> &mut ReentrancyGuard {
        &mut self.guard
    }
}
