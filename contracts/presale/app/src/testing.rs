//! In-memory rails and fixtures for host tests.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;
use presale_shared::{
    Amount, ContractResult, LeftoverPolicy, PresaleError, Timestamp, TokenType,
};
use sails_rs::prelude::*;

use crate::instance::{InstanceAccounts, PresaleInstance};
use crate::presale::{ClaimReport, FinalizeReport, HouseFee, PresaleConfig};
use crate::rails::{AssetRail, CallContext, LiquidityRequest, PoolProvider};
use crate::whitelist::{Hash, Whitelist};

pub fn actor(id: u64) -> ActorId {
    ActorId::from(id)
}

const FIRST_POOL: u64 = 9_000;

/// Balance sheet of every token the tests touch, plus a toy pool provider.
///
/// Pools accept both amounts in full and mint one share per currency unit.
/// Like a real chain, nothing here is undone when an operation fails after
/// some of its transfers went through.
#[derive(Debug, Clone, Default)]
pub struct MemoryChain {
    balances: BTreeMap<(TokenType, ActorId), Amount>,
    decimals: BTreeMap<TokenType, u8>,
    blocked: BTreeSet<ActorId>,
    pools: BTreeMap<(ActorId, TokenType), ActorId>,
    committed: u64,
    pub reject_pool: bool,
    pub reject_liquidity: bool,
    /// Pools take nothing and mint no shares.
    pub zero_shares: bool,
    pub liquidity_requests: Vec<LiquidityRequest>,
}

impl MemoryChain {
    pub fn mint(&mut self, token: TokenType, who: ActorId, amount: Amount) {
        *self.balances.entry((token, who)).or_insert(0) += amount;
    }

    pub fn balance(&self, token: TokenType, who: ActorId) -> Amount {
        self.balances.get(&(token, who)).copied().unwrap_or(0)
    }

    pub fn set_decimals(&mut self, token: TokenType, decimals: u8) {
        self.decimals.insert(token, decimals);
    }

    /// Transfers to `who` fail until unblocked.
    pub fn block_recipient(&mut self, who: ActorId) {
        self.blocked.insert(who);
    }

    pub fn unblock_recipient(&mut self, who: ActorId) {
        self.blocked.remove(&who);
    }

    pub fn pool_of(&self, asset: ActorId, currency: TokenType) -> Option<ActorId> {
        self.pools.get(&(asset, currency)).copied()
    }

    fn debit(&mut self, token: TokenType, from: ActorId, amount: Amount) -> ContractResult<()> {
        let balance = self.balances.entry((token, from)).or_insert(0);
        *balance = balance.checked_sub(amount).ok_or(PresaleError::TransferFailed)?;
        Ok(())
    }
}

impl AssetRail for MemoryChain {
    async fn decimals(&mut self, token: TokenType) -> ContractResult<u8> {
        Ok(self.decimals.get(&token).copied().unwrap_or(18))
    }

    async fn balance_of(&mut self, token: TokenType, owner: ActorId) -> ContractResult<Amount> {
        Ok(self.balance(token, owner))
    }

    fn committed(&self) -> u64 {
        self.committed
    }

    async fn transfer(
        &mut self,
        token: TokenType,
        from: ActorId,
        to: ActorId,
        amount: Amount,
    ) -> ContractResult<()> {
        if self.blocked.contains(&to) {
            return Err(PresaleError::TransferFailed);
        }
        if from == to || amount == 0 {
            return Ok(());
        }
        self.debit(token, from, amount)?;
        self.mint(token, to, amount);
        self.committed += 1;
        Ok(())
    }
}

impl PoolProvider for MemoryChain {
    async fn get_or_create_pool(
        &mut self,
        asset: ActorId,
        currency: TokenType,
    ) -> ContractResult<ActorId> {
        if self.reject_pool {
            return Err(PresaleError::PoolUnavailable);
        }
        let next = actor(FIRST_POOL + self.pools.len() as u64);
        Ok(*self.pools.entry((asset, currency)).or_insert(next))
    }

    async fn add_liquidity(&mut self, request: LiquidityRequest) -> ContractResult<Amount> {
        if self.reject_liquidity
            || request.asset_amount < request.min_asset
            || request.currency_amount < request.min_currency
        {
            return Err(PresaleError::LiquificationFailed);
        }
        if self.zero_shares {
            return Ok(0);
        }
        let asset = TokenType::Vft(request.asset);
        if self.balance(asset, request.payer) < request.asset_amount
            || self.balance(request.currency, request.payer) < request.currency_amount
        {
            return Err(PresaleError::TransferFailed);
        }

        self.debit(asset, request.payer, request.asset_amount)?;
        self.mint(asset, request.pool, request.asset_amount);
        self.debit(request.currency, request.payer, request.currency_amount)?;
        self.mint(request.currency, request.pool, request.currency_amount);

        let shares = request.currency_amount;
        self.mint(TokenType::Vft(request.pool), request.recipient, shares);
        self.liquidity_requests.push(request);
        self.committed += 1;
        Ok(shares)
    }
}

// =============================================================================
// FIXTURES
// =============================================================================

pub const PRESALE: u64 = 1_000;
pub const VESTING: u64 = 1_001;
pub const CUSTODY: u64 = 1_002;
pub const CREATOR: u64 = 100;
pub const HOUSE: u64 = 300;
pub const ASSET: u64 = 500;

pub const START: Timestamp = 1_000;
pub const END: Timestamp = 2_000;
pub const LOCKUP: Timestamp = 10_000;
pub const VESTING_DURATION: Timestamp = 3_000;

/// Balance every contributor starts with.
pub const WALLET: Amount = 1_000;

pub fn asset() -> TokenType {
    TokenType::Vft(actor(ASSET))
}

pub fn accounts() -> InstanceAccounts {
    InstanceAccounts {
        presale: actor(PRESALE),
        vesting: actor(VESTING),
        custody: actor(CUSTODY),
    }
}

/// hardCap 10, softCap 5, contributions in [1, 5], 1000 asset per unit sold,
/// 500 per unit paired, half of the raise into the pool.
pub fn base_config() -> PresaleConfig {
    PresaleConfig {
        asset: actor(ASSET),
        currency: TokenType::Native,
        asset_deposit: 12_500,
        hard_cap: 10,
        soft_cap: 5,
        min_contribution: 1,
        max_contribution: 5,
        start: START,
        end: END,
        liquidity_bps: 5_000,
        slippage_bps: 100,
        presale_rate: 1_000,
        listing_rate: 500,
        lockup_duration: LOCKUP,
        vesting_bps: 0,
        vesting_duration: VESTING_DURATION,
        leftover_policy: LeftoverPolicy::Return,
    }
}

/// One presale instance over a [`MemoryChain`], with a clock.
///
/// A failed call leaves the chain as it is: transfers made before the
/// failing step stay made, as they do on chain.
pub struct World {
    pub instance: PresaleInstance,
    pub chain: MemoryChain,
    pub now: Timestamp,
}

impl World {
    pub fn new(config: PresaleConfig) -> Self {
        Self::with(config, HouseFee::default(), Whitelist::Open)
    }

    pub fn with(config: PresaleConfig, house: HouseFee, whitelist: Whitelist) -> Self {
        Self::build(accounts(), config, house, whitelist)
    }

    /// Presale, vesting escrow and custody on one account, as deployed.
    pub fn single(config: PresaleConfig) -> Self {
        Self::build(
            InstanceAccounts::single(actor(PRESALE)),
            config,
            HouseFee::default(),
            Whitelist::Open,
        )
    }

    fn build(
        accounts: InstanceAccounts,
        config: PresaleConfig,
        house: HouseFee,
        whitelist: Whitelist,
    ) -> Self {
        let mut chain = MemoryChain::default();
        chain.mint(TokenType::Vft(config.asset), actor(CREATOR), config.asset_deposit);
        for who in 101..=110 {
            chain.mint(config.currency, actor(who), WALLET);
        }
        let instance =
            PresaleInstance::new(accounts, actor(CREATOR), config, house, whitelist, 0)
                .expect("valid config");
        Self { instance, chain, now: 0 }
    }

    /// Deposited and inside the contribution window.
    pub async fn active(config: PresaleConfig) -> Self {
        Self::activate(Self::new(config)).await
    }

    pub async fn activate(mut world: Self) -> Self {
        world.deposit().await.expect("deposit");
        world.now = START;
        world
    }

    pub fn ctx(&self, who: u64) -> CallContext {
        CallContext::new(actor(who), self.now)
    }

    pub async fn deposit(&mut self) -> ContractResult<Amount> {
        self.deposit_as(CREATOR).await
    }

    pub async fn deposit_as(&mut self, who: u64) -> ContractResult<Amount> {
        let ctx = self.ctx(who);
        self.instance.deposit(&ctx, &mut self.chain).await
    }

    pub async fn contribute(&mut self, who: u64, amount: Amount) -> ContractResult<Amount> {
        self.contribute_with_proof(who, amount, &[]).await
    }

    pub async fn contribute_with_proof(
        &mut self,
        who: u64,
        amount: Amount,
        proof: &[Hash],
    ) -> ContractResult<Amount> {
        let ctx = self.ctx(who);
        self.instance.contribute(&ctx, &mut self.chain, amount, proof).await
    }

    pub async fn finalize(&mut self) -> ContractResult<FinalizeReport> {
        let ctx = self.ctx(CREATOR);
        self.instance.finalize(&ctx, &mut self.chain).await
    }

    pub async fn cancel(&mut self, who: u64) -> ContractResult<Amount> {
        let ctx = self.ctx(who);
        self.instance.cancel(&ctx, &mut self.chain).await
    }

    pub async fn claim(&mut self, who: u64) -> ContractResult<ClaimReport> {
        let ctx = self.ctx(who);
        self.instance.claim(&ctx, &mut self.chain).await
    }

    pub async fn refund(&mut self, who: u64) -> ContractResult<Amount> {
        let ctx = self.ctx(who);
        self.instance.refund(&ctx, &mut self.chain).await
    }

    pub async fn withdraw(&mut self) -> ContractResult<Amount> {
        let ctx = self.ctx(CREATOR);
        self.instance.withdraw(&ctx, &mut self.chain).await
    }

    pub async fn rescue(&mut self, token: TokenType, to: u64, amount: Amount) -> ContractResult<()> {
        let ctx = self.ctx(CREATOR);
        self.instance
            .rescue(&ctx, &mut self.chain, token, actor(to), amount)
            .await
    }

    pub async fn release(&mut self, who: u64, schedule_id: u64) -> ContractResult<Amount> {
        let ctx = self.ctx(who);
        self.instance.release(&ctx, &mut self.chain, schedule_id).await
    }

    pub async fn unlock(&mut self, who: u64, lock_id: u64) -> ContractResult<Amount> {
        let ctx = self.ctx(who);
        self.instance.unlock(&ctx, &mut self.chain, lock_id).await
    }

    pub fn balance(&self, token: TokenType, who: u64) -> Amount {
        self.chain.balance(token, actor(who))
    }

    /// Σ contributions + settled == raised, raised ≤ hard cap.
    pub fn assert_ledger_consistent(&self) {
        let presale = self.instance.presale();
        let ledger = presale.ledger();
        let open: Amount = presale
            .contributors()
            .iter()
            .map(|c| ledger.contribution_of(c))
            .sum();
        assert_eq!(open + ledger.settled(), presale.pool().total_raised);
        assert!(presale.pool().total_raised <= presale.config().hard_cap);
    }
}
