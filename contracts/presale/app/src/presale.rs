//! Fundraising state machine.
//!
//! A presale collects the raise currency inside a time window, then either
//! finalizes (seeds a pool, locks the shares, lets contributors claim the
//! asset) or ends up canceled / under its soft cap (contributors refund).
//!
//! Operations check everything before touching state and write their books
//! before the external calls, so a call failing half-way leaves state that
//! matches the transfers already made. Run them through
//! [`PresaleInstance`](crate::instance::PresaleInstance), which also undoes
//! calls that failed before anything went out.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use parity_scale_codec::{Decode, Encode};
use presale_shared::{
    AccessControl, Amount, BasisPoints, ContractResult, Duration, LeftoverPolicy, LockId,
    PresaleError, PresaleState, Role, ScheduleId, Timestamp, TokenType, MAX_BASIS_POINTS,
};
use scale_info::TypeInfo;
use sails_rs::prelude::*;

use crate::constants::{
    burn_address, CLAIM_WINDOW, LIQUIDITY_SHARE_OPTIONS, MAX_HOUSE_FEE_BPS, MAX_SLIPPAGE_BPS,
    SOFT_CAP_MIN_DIVISOR,
};
use crate::custody::LockedCustody;
use crate::math;
use crate::rails::{AssetRail, CallContext, LiquidityRequest, PoolProvider};
use crate::vesting::VestingEngine;
use crate::whitelist::{Hash, Whitelist};

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Presale parameters, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, TypeInfo)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub struct PresaleConfig {
    /// VFT program of the distributed asset.
    pub asset: ActorId,
    /// Raise currency.
    pub currency: TokenType,
    /// Asset amount the creator deposits to activate the presale.
    pub asset_deposit: Amount,
    pub hard_cap: Amount,
    pub soft_cap: Amount,
    /// Minimum of every single contribution.
    pub min_contribution: Amount,
    /// Maximum cumulative contribution per address.
    pub max_contribution: Amount,
    pub start: Timestamp,
    pub end: Timestamp,
    /// Share of the raise paired into the pool.
    pub liquidity_bps: BasisPoints,
    pub slippage_bps: BasisPoints,
    /// Asset units per currency unit sold.
    pub presale_rate: Amount,
    /// Asset units per currency unit paired into the pool.
    pub listing_rate: Amount,
    pub lockup_duration: Duration,
    /// Part of every claim that vests instead of being paid out.
    pub vesting_bps: BasisPoints,
    pub vesting_duration: Duration,
    pub leftover_policy: LeftoverPolicy,
}

impl PresaleConfig {
    pub fn asset_token(&self) -> TokenType {
        TokenType::Vft(self.asset)
    }

    /// Rejects configurations the state machine cannot honor.
    pub fn validate(&self, now: Timestamp) -> ContractResult<()> {
        if self.asset == ActorId::zero() || self.currency.is_null() {
            return Err(PresaleError::ZeroAddress);
        }
        if self.hard_cap == 0 {
            return Err(PresaleError::InvalidHardCap);
        }
        if self.soft_cap == 0 || self.soft_cap > self.hard_cap {
            return Err(PresaleError::InvalidSoftCap);
        }
        if self.soft_cap < self.hard_cap / SOFT_CAP_MIN_DIVISOR {
            return Err(PresaleError::SoftCapTooLow);
        }
        if self.min_contribution == 0
            || self.min_contribution > self.max_contribution
            || self.max_contribution > self.hard_cap
        {
            return Err(PresaleError::InvalidContributionLimits);
        }
        if !LIQUIDITY_SHARE_OPTIONS.contains(&self.liquidity_bps) {
            return Err(PresaleError::InvalidLiquidityShare);
        }
        if self.slippage_bps > MAX_SLIPPAGE_BPS {
            return Err(PresaleError::SlippageTooHigh);
        }
        if self.presale_rate == 0 {
            return Err(PresaleError::InvalidPresaleRate);
        }
        if self.listing_rate == 0 {
            return Err(PresaleError::InvalidListingRate);
        }
        if self.listing_rate >= self.presale_rate {
            return Err(PresaleError::ListingRateTooHigh);
        }
        if self.start < now {
            return Err(PresaleError::InvalidStartTime);
        }
        if self.end <= self.start {
            return Err(PresaleError::InvalidEndTime);
        }
        if self.lockup_duration == 0 {
            return Err(PresaleError::InvalidLockupDuration);
        }
        if self.vesting_bps > MAX_BASIS_POINTS {
            return Err(PresaleError::InvalidVestingBps);
        }
        let needs_vesting = self.vesting_bps > 0 || self.leftover_policy == LeftoverPolicy::Vest;
        if needs_vesting && self.vesting_duration == 0 {
            return Err(PresaleError::InvalidVestingDuration);
        }
        Ok(())
    }
}

/// House cut of the raise, taken at finalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Encode, Decode, TypeInfo)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub struct HouseFee {
    pub recipient: ActorId,
    pub bps: BasisPoints,
}

impl HouseFee {
    pub fn validate(&self, liquidity_bps: BasisPoints) -> ContractResult<()> {
        if self.bps > MAX_HOUSE_FEE_BPS {
            return Err(PresaleError::HouseFeeTooHigh);
        }
        // The fee and the pool share come out of the same raise.
        if self.bps as u32 + liquidity_bps as u32 > MAX_BASIS_POINTS as u32 {
            return Err(PresaleError::HouseFeeTooHigh);
        }
        if self.bps > 0 && self.recipient == ActorId::zero() {
            return Err(PresaleError::ZeroAddress);
        }
        Ok(())
    }
}

// =============================================================================
// STATE
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode, TypeInfo)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub struct PoolState {
    pub state: PresaleState,
    pub total_raised: Amount,
    /// Asset currently held for this presale.
    pub asset_balance: Amount,
    pub claim_deadline: Timestamp,
    /// Raise left for the creator after pool seeding and the house cut.
    pub owner_residual: Amount,
    /// Asset reserved for contributors at a full hard cap.
    pub tokens_claimable: Amount,
    /// Asset reserved for pool seeding.
    pub tokens_liquidity: Amount,
    pub asset_decimals: u8,
    pub currency_decimals: u8,
}

/// Per-contributor running totals in first-contribution order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode, TypeInfo)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub struct ContributionLedger {
    contributions: BTreeMap<ActorId, Amount>,
    contributors: Vec<ActorId>,
    settled: Amount,
}

impl ContributionLedger {
    pub fn contribution_of(&self, who: &ActorId) -> Amount {
        self.contributions.get(who).copied().unwrap_or(0)
    }

    pub fn contributors(&self) -> &[ActorId] {
        &self.contributors
    }

    /// Total of entries zeroed by claims and refunds.
    pub fn settled(&self) -> Amount {
        self.settled
    }

    /// Adds `amount` to `who` and returns the new cumulative total.
    pub fn record(&mut self, who: ActorId, amount: Amount) -> ContractResult<Amount> {
        let entry = self.contributions.entry(who).or_insert_with(|| {
            self.contributors.push(who);
            0
        });
        *entry = entry.checked_add(amount).ok_or(PresaleError::Overflow)?;
        Ok(*entry)
    }

    /// Zeroes `who` and returns what the entry held.
    pub fn settle(&mut self, who: &ActorId) -> Amount {
        let amount = self
            .contributions
            .get_mut(who)
            .map(core::mem::take)
            .unwrap_or(0);
        self.settled += amount;
        amount
    }
}

/// Outcome of a successful [`Presale::finalize`].
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, TypeInfo)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub struct FinalizeReport {
    pub total_raised: Amount,
    pub pool: ActorId,
    pub liquidity_asset: Amount,
    pub liquidity_currency: Amount,
    pub shares: Amount,
    pub lock_id: LockId,
    pub unlock_time: Timestamp,
    pub house_amount: Amount,
    pub owner_residual: Amount,
    pub leftover: Amount,
    pub leftover_policy: LeftoverPolicy,
    /// Set when the leftover was put on a vesting schedule.
    pub leftover_schedule: Option<ScheduleId>,
}

/// Outcome of a successful [`Presale::claim`].
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, TypeInfo)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub struct ClaimReport {
    pub total: Amount,
    pub immediate: Amount,
    pub vested: Amount,
    pub schedule_id: Option<ScheduleId>,
}

// =============================================================================
// PRESALE
// =============================================================================

#[derive(Debug, Clone)]
pub struct Presale {
    id: ActorId,
    creator: ActorId,
    config: PresaleConfig,
    house: HouseFee,
    whitelist: Whitelist,
    access: AccessControl,
    pool: PoolState,
    ledger: ContributionLedger,
}

impl Presale {
    /// Validates the configuration; `id` is the account the presale holds
    /// funds under.
    pub fn new(
        id: ActorId,
        creator: ActorId,
        config: PresaleConfig,
        house: HouseFee,
        whitelist: Whitelist,
        now: Timestamp,
    ) -> ContractResult<Self> {
        if creator == ActorId::zero() {
            return Err(PresaleError::ZeroAddress);
        }
        config.validate(now)?;
        house.validate(config.liquidity_bps)?;

        let mut access = AccessControl::new();
        access.grant(Role::Creator, creator);

        Ok(Self {
            id,
            creator,
            config,
            house,
            whitelist,
            access,
            pool: PoolState::default(),
            ledger: ContributionLedger::default(),
        })
    }

    // -------------------------------------------------------------------------
    // LIFECYCLE
    // -------------------------------------------------------------------------

    /// Pulls the asset deposit from the creator and opens the presale.
    pub async fn deposit<R: AssetRail>(
        &mut self,
        ctx: &CallContext,
        rails: &mut R,
    ) -> ContractResult<Amount> {
        self.access.ensure(ctx.caller, Role::Creator)?;
        if self.pool.state != PresaleState::Pending {
            return Err(PresaleError::NotPending);
        }

        let asset_decimals = rails.decimals(self.config.asset_token()).await?;
        let currency_decimals = rails.decimals(self.config.currency).await?;

        let c = &self.config;
        let tokens_claimable =
            math::convert(c.hard_cap, c.presale_rate, asset_decimals, currency_decimals)?;
        let liquidity_at_cap = math::bps_of(c.hard_cap, c.liquidity_bps)?;
        let tokens_liquidity =
            math::convert(liquidity_at_cap, c.listing_rate, asset_decimals, currency_decimals)?;
        let required = tokens_claimable
            .checked_add(tokens_liquidity)
            .ok_or(PresaleError::Overflow)?;
        if c.asset_deposit < required {
            return Err(PresaleError::InsufficientDeposit);
        }

        let deposit = c.asset_deposit;
        rails
            .transfer(c.asset_token(), ctx.caller, self.id, deposit)
            .await?;

        self.pool.state = PresaleState::Active;
        self.pool.asset_balance = deposit;
        self.pool.tokens_claimable = tokens_claimable;
        self.pool.tokens_liquidity = tokens_liquidity;
        self.pool.asset_decimals = asset_decimals;
        self.pool.currency_decimals = currency_decimals;

        Ok(deposit)
    }

    /// Adds `amount` of the raise currency to the caller's contribution and
    /// returns their new total. The minimum applies to each call on its own.
    pub async fn contribute<R: AssetRail>(
        &mut self,
        ctx: &CallContext,
        rails: &mut R,
        amount: Amount,
        proof: &[Hash],
    ) -> ContractResult<Amount> {
        if self.pool.state != PresaleState::Active {
            return Err(PresaleError::NotActive);
        }
        if ctx.now < self.config.start {
            return Err(PresaleError::NotStarted);
        }
        if ctx.now > self.config.end {
            return Err(PresaleError::AlreadyEnded);
        }
        if !self.whitelist.permits(&ctx.caller, proof) {
            return Err(PresaleError::NotWhitelisted);
        }
        if amount < self.config.min_contribution {
            return Err(PresaleError::BelowMinContribution);
        }

        let cumulative = self
            .ledger
            .contribution_of(&ctx.caller)
            .checked_add(amount)
            .ok_or(PresaleError::Overflow)?;
        if cumulative > self.config.max_contribution {
            return Err(PresaleError::MaxContributionExceeded);
        }
        let total_raised = self
            .pool
            .total_raised
            .checked_add(amount)
            .ok_or(PresaleError::Overflow)?;
        if total_raised > self.config.hard_cap {
            return Err(PresaleError::HardCapExceeded);
        }

        rails
            .transfer(self.config.currency, ctx.caller, self.id, amount)
            .await?;

        self.ledger.record(ctx.caller, amount)?;
        self.pool.total_raised = total_raised;

        Ok(cumulative)
    }

    /// Closes a successful raise: seeds the pool, locks the shares for the
    /// creator, pays the house and disposes of the unsold asset.
    pub async fn finalize<R: AssetRail + PoolProvider>(
        &mut self,
        ctx: &CallContext,
        rails: &mut R,
        vesting: &mut VestingEngine,
        custody: &mut LockedCustody,
    ) -> ContractResult<FinalizeReport> {
        self.access.ensure(ctx.caller, Role::Creator)?;
        if self.pool.state != PresaleState::Active {
            return Err(PresaleError::NotActive);
        }
        if ctx.now <= self.config.end {
            return Err(PresaleError::NotEnded);
        }
        if self.pool.total_raised < self.config.soft_cap {
            return Err(PresaleError::SoftCapNotReached);
        }

        let raised = self.pool.total_raised;
        let liquidity_asset = self.pool.tokens_liquidity;
        let liquidity_currency = math::bps_of(raised, self.config.liquidity_bps)?;
        let kept = MAX_BASIS_POINTS - self.config.slippage_bps;
        let min_asset = math::bps_of(liquidity_asset, kept)?;
        let min_currency = math::bps_of(liquidity_currency, kept)?;
        let house_amount = math::bps_of(raised, self.house.bps)?;
        let owner_residual = raised
            .checked_sub(liquidity_currency)
            .and_then(|r| r.checked_sub(house_amount))
            .ok_or(PresaleError::Overflow)?;
        let unlock_time = ctx
            .now
            .checked_add(self.config.lockup_duration)
            .ok_or(PresaleError::Overflow)?;

        // Books first: once the pool is seeded nothing is rolled back, so
        // every later step must find the final figures already in place.
        self.pool.state = PresaleState::Finalized;
        self.pool.asset_balance = self
            .pool
            .asset_balance
            .checked_sub(liquidity_asset)
            .ok_or(PresaleError::Overflow)?;
        let leftover = self.leftover()?;
        self.pool.asset_balance = self
            .pool
            .asset_balance
            .checked_sub(leftover)
            .ok_or(PresaleError::Overflow)?;
        self.pool.owner_residual = owner_residual;
        self.pool.claim_deadline = ctx.now.saturating_add(CLAIM_WINDOW);

        let pool = rails
            .get_or_create_pool(self.config.asset, self.config.currency)
            .await
            .map_err(|_| PresaleError::PoolUnavailable)?;
        if pool == ActorId::zero() {
            return Err(PresaleError::PoolUnavailable);
        }
        let shares = rails
            .add_liquidity(LiquidityRequest {
                pool,
                asset: self.config.asset,
                currency: self.config.currency,
                asset_amount: liquidity_asset,
                currency_amount: liquidity_currency,
                min_asset,
                min_currency,
                payer: self.id,
                recipient: self.id,
            })
            .await
            .map_err(|_| PresaleError::LiquificationFailed)?;
        if shares == 0 {
            return Err(PresaleError::LiquificationFailed);
        }

        let lock_id = custody
            .lock(
                &ctx.on_behalf_of(self.id),
                rails,
                TokenType::Vft(pool),
                shares,
                unlock_time,
                self.creator,
            )
            .await?;

        if house_amount > 0 {
            rails
                .transfer(self.config.currency, self.id, self.house.recipient, house_amount)
                .await?;
        }

        let leftover_schedule = self
            .dispose_leftover(ctx, rails, vesting, leftover)
            .await?;

        Ok(FinalizeReport {
            total_raised: raised,
            pool,
            liquidity_asset,
            liquidity_currency,
            shares,
            lock_id,
            unlock_time,
            house_amount,
            owner_residual,
            leftover,
            leftover_policy: self.config.leftover_policy,
            leftover_schedule,
        })
    }

    /// Asset neither sold nor paired: the unsold part of the claimable
    /// reserve plus whatever was deposited above the requirement.
    fn leftover(&self) -> ContractResult<Amount> {
        let sold = math::convert(
            self.pool.total_raised,
            self.config.presale_rate,
            self.pool.asset_decimals,
            self.pool.currency_decimals,
        )?
        .min(self.pool.tokens_claimable);
        let unsold = self.pool.tokens_claimable - sold;
        let excess = self
            .pool
            .asset_balance
            .saturating_sub(self.pool.tokens_claimable);
        unsold.checked_add(excess).ok_or(PresaleError::Overflow)
    }

    async fn dispose_leftover<R: AssetRail>(
        &mut self,
        ctx: &CallContext,
        rails: &mut R,
        vesting: &mut VestingEngine,
        leftover: Amount,
    ) -> ContractResult<Option<ScheduleId>> {
        if leftover == 0 {
            return Ok(None);
        }

        let asset = self.config.asset_token();
        match self.config.leftover_policy {
            LeftoverPolicy::Return => {
                rails.transfer(asset, self.id, self.creator, leftover).await?;
                Ok(None)
            }
            LeftoverPolicy::Burn => {
                rails.transfer(asset, self.id, burn_address(), leftover).await?;
                Ok(None)
            }
            LeftoverPolicy::Vest => {
                let schedule_id = vesting
                    .create_schedule(
                        &ctx.on_behalf_of(self.id),
                        rails,
                        self.creator,
                        leftover,
                        ctx.now,
                        self.config.vesting_duration,
                    )
                    .await?;
                Ok(Some(schedule_id))
            }
        }
    }

    /// Gives the whole asset balance back to the creator and turns the
    /// presale refund-only.
    pub async fn cancel<R: AssetRail>(
        &mut self,
        ctx: &CallContext,
        rails: &mut R,
    ) -> ContractResult<Amount> {
        self.access.ensure(ctx.caller, Role::Creator)?;
        if !matches!(self.pool.state, PresaleState::Pending | PresaleState::Active) {
            return Err(PresaleError::PresaleClosed);
        }

        let returned = core::mem::take(&mut self.pool.asset_balance);
        self.pool.state = PresaleState::Canceled;

        if returned > 0 {
            rails
                .transfer(self.config.asset_token(), self.id, self.creator, returned)
                .await?;
        }

        Ok(returned)
    }

    // -------------------------------------------------------------------------
    // SETTLEMENT
    // -------------------------------------------------------------------------

    /// Pays the caller's allocation, vesting part of it if configured.
    pub async fn claim<R: AssetRail>(
        &mut self,
        ctx: &CallContext,
        rails: &mut R,
        vesting: &mut VestingEngine,
    ) -> ContractResult<ClaimReport> {
        if self.pool.state != PresaleState::Finalized {
            return Err(PresaleError::NotFinalized);
        }
        if ctx.now >= self.pool.claim_deadline {
            return Err(PresaleError::ClaimPeriodExpired);
        }

        let total = self.allocation_of(&ctx.caller)?;
        if total == 0 {
            return Err(PresaleError::NoTokensToClaim);
        }
        self.ledger.settle(&ctx.caller);
        self.pool.asset_balance = self
            .pool
            .asset_balance
            .checked_sub(total)
            .ok_or(PresaleError::Overflow)?;

        let vested = math::bps_of(total, self.config.vesting_bps)?;
        let immediate = total - vested;

        // The schedule stays in this account on chain, so it is booked
        // before the payout that actually leaves.
        let schedule_id = if vested > 0 {
            let id = vesting
                .create_schedule(
                    &ctx.on_behalf_of(self.id),
                    rails,
                    ctx.caller,
                    vested,
                    ctx.now,
                    self.config.vesting_duration,
                )
                .await?;
            Some(id)
        } else {
            None
        };

        if immediate > 0 {
            rails
                .transfer(self.config.asset_token(), self.id, ctx.caller, immediate)
                .await?;
        }

        Ok(ClaimReport {
            total,
            immediate,
            vested,
            schedule_id,
        })
    }

    /// Returns the caller's contribution after a cancel or a missed soft cap.
    pub async fn refund<R: AssetRail>(
        &mut self,
        ctx: &CallContext,
        rails: &mut R,
    ) -> ContractResult<Amount> {
        if !self.refunds_open(ctx.now) {
            return Err(PresaleError::RefundNotAvailable);
        }

        let amount = self.ledger.settle(&ctx.caller);
        if amount == 0 {
            return Err(PresaleError::NoFundsToRefund);
        }

        rails
            .transfer(self.config.currency, self.id, ctx.caller, amount)
            .await?;

        Ok(amount)
    }

    /// Pays the creator's share of the raise.
    pub async fn withdraw<R: AssetRail>(
        &mut self,
        ctx: &CallContext,
        rails: &mut R,
    ) -> ContractResult<Amount> {
        self.access.ensure(ctx.caller, Role::Creator)?;

        let amount = core::mem::take(&mut self.pool.owner_residual);
        if amount == 0 {
            return Err(PresaleError::NoFundsToWithdraw);
        }

        rails
            .transfer(self.config.currency, self.id, self.creator, amount)
            .await?;

        Ok(amount)
    }

    /// Moves tokens stuck in the presale account once it is closed.
    pub async fn rescue<R: AssetRail>(
        &mut self,
        ctx: &CallContext,
        rails: &mut R,
        token: TokenType,
        to: ActorId,
        amount: Amount,
    ) -> ContractResult<()> {
        self.ensure_rescuable(ctx, token, to, amount)?;
        rails.transfer(token, self.id, to, amount).await
    }

    /// The asset stays put while contributors may still claim, and the
    /// currency stays put while refunds or the creator's residual are owed.
    pub fn ensure_rescuable(
        &self,
        ctx: &CallContext,
        token: TokenType,
        to: ActorId,
        amount: Amount,
    ) -> ContractResult<()> {
        self.access.ensure(ctx.caller, Role::Creator)?;
        if !matches!(self.pool.state, PresaleState::Finalized | PresaleState::Canceled) {
            return Err(PresaleError::RescueNotAvailable);
        }
        if to == ActorId::zero() || token.is_null() {
            return Err(PresaleError::ZeroAddress);
        }
        if amount == 0 {
            return Err(PresaleError::ZeroAmount);
        }
        if token == self.config.asset_token()
            && self.pool.state == PresaleState::Finalized
            && ctx.now < self.pool.claim_deadline
        {
            return Err(PresaleError::RescueProtected);
        }
        if token == self.config.currency && self.currency_reserved() {
            return Err(PresaleError::RescueProtected);
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // WHITELIST
    // -------------------------------------------------------------------------

    fn whitelist_mut(&mut self, caller: ActorId) -> ContractResult<&mut Whitelist> {
        self.access.ensure(caller, Role::Creator)?;
        if !matches!(self.pool.state, PresaleState::Pending | PresaleState::Active) {
            return Err(PresaleError::WhitelistLocked);
        }
        Ok(&mut self.whitelist)
    }

    pub fn add_to_whitelist(
        &mut self,
        ctx: &CallContext,
        addresses: Vec<ActorId>,
    ) -> ContractResult<u32> {
        self.whitelist_mut(ctx.caller)?.add(addresses)
    }

    pub fn remove_from_whitelist(
        &mut self,
        ctx: &CallContext,
        addresses: Vec<ActorId>,
    ) -> ContractResult<u32> {
        self.whitelist_mut(ctx.caller)?.remove(addresses)
    }

    pub fn set_merkle_root(&mut self, ctx: &CallContext, root: Hash) -> ContractResult<()> {
        self.whitelist_mut(ctx.caller)?.set_root(root)
    }

    // -------------------------------------------------------------------------
    // QUERIES
    // -------------------------------------------------------------------------

    /// Account the presale holds funds under.
    pub fn id(&self) -> ActorId {
        self.id
    }

    pub fn creator(&self) -> ActorId {
        self.creator
    }

    pub fn config(&self) -> &PresaleConfig {
        &self.config
    }

    pub fn house(&self) -> &HouseFee {
        &self.house
    }

    pub fn whitelist(&self) -> &Whitelist {
        &self.whitelist
    }

    pub fn pool(&self) -> &PoolState {
        &self.pool
    }

    pub fn ledger(&self) -> &ContributionLedger {
        &self.ledger
    }

    pub fn state(&self) -> PresaleState {
        self.pool.state
    }

    pub fn contributors(&self) -> &[ActorId] {
        self.ledger.contributors()
    }

    pub fn contribution_of(&self, who: &ActorId) -> Amount {
        self.ledger.contribution_of(who)
    }

    pub fn is_whitelisted(&self, who: &ActorId, proof: &[Hash]) -> bool {
        self.whitelist.permits(who, proof)
    }

    /// Asset units `who` would receive for their open contribution.
    pub fn allocation_of(&self, who: &ActorId) -> ContractResult<Amount> {
        math::convert(
            self.ledger.contribution_of(who),
            self.config.presale_rate,
            self.pool.asset_decimals,
            self.pool.currency_decimals,
        )
    }

    pub fn refunds_open(&self, now: Timestamp) -> bool {
        match self.pool.state {
            PresaleState::Canceled => true,
            PresaleState::Active => {
                now > self.config.end && self.pool.total_raised < self.config.soft_cap
            }
            _ => false,
        }
    }

    fn currency_reserved(&self) -> bool {
        match self.pool.state {
            PresaleState::Canceled => self.ledger.settled() < self.pool.total_raised,
            PresaleState::Finalized => self.pool.owner_residual > 0,
            _ => true,
        }
    }
}
