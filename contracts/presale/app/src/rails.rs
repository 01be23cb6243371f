//! Seams to the outside world: who is calling, when, and how value moves.

use parity_scale_codec::{Decode, Encode};
use presale_shared::{Amount, ContractResult, Timestamp, TokenType};
use scale_info::TypeInfo;
use sails_rs::prelude::*;

/// Caller and block time of the operation being executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub caller: ActorId,
    pub now: Timestamp,
}

impl CallContext {
    pub fn new(caller: ActorId, now: Timestamp) -> Self {
        Self { caller, now }
    }

    /// Same block, different caller. Used when one component calls another.
    pub fn on_behalf_of(&self, caller: ActorId) -> Self {
        Self { caller, now: self.now }
    }
}

/// Moves the raise currency and the distributed asset.
///
/// A transfer either fully succeeds or returns an error without effects.
/// A transfer that succeeded stays done even if the operation issuing it
/// fails later.
#[allow(async_fn_in_trait)]
pub trait AssetRail {
    /// Decimal count of `token`.
    async fn decimals(&mut self, token: TokenType) -> ContractResult<u8>;

    /// Amount of `token` held by `owner`.
    async fn balance_of(&mut self, token: TokenType, owner: ActorId) -> ContractResult<Amount>;

    /// Transfers and pool deposits carried out through this rail so far.
    /// Transfers between an account and itself are not counted.
    fn committed(&self) -> u64;

    /// Moves `amount` of `token` from `from` to `to`.
    async fn transfer(
        &mut self,
        token: TokenType,
        from: ActorId,
        to: ActorId,
        amount: Amount,
    ) -> ContractResult<()>;
}

/// Pool seeding parameters.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, TypeInfo)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub struct LiquidityRequest {
    pub pool: ActorId,
    pub asset: ActorId,
    pub currency: TokenType,
    pub asset_amount: Amount,
    pub currency_amount: Amount,
    pub min_asset: Amount,
    pub min_currency: Amount,
    /// Account both amounts are taken from.
    pub payer: ActorId,
    /// Account the pool shares are minted to.
    pub recipient: ActorId,
}

/// Creates trading pools and seeds them.
#[allow(async_fn_in_trait)]
pub trait PoolProvider {
    /// Pool (and pool share token) for the pair, created if absent.
    async fn get_or_create_pool(
        &mut self,
        asset: ActorId,
        currency: TokenType,
    ) -> ContractResult<ActorId>;

    /// Adds liquidity and returns the pool shares minted to the recipient.
    async fn add_liquidity(&mut self, request: LiquidityRequest) -> ContractResult<Amount>;
}
