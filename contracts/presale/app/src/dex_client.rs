//! DEX router client used to create and seed the listing pool.

use alloc::vec::Vec;
use parity_scale_codec::{Decode, Encode};
use presale_shared::{Amount, ContractResult, PresaleError, TokenType};
use scale_info::TypeInfo;
use sails_rs::prelude::*;

/// Router messages.
#[derive(Debug, Clone, Encode, Decode, TypeInfo)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub enum DexAction {
    /// Replies with the pool (and share token) id.
    GetOrCreatePool { asset: ActorId, currency: TokenType },
    /// Replies with the shares minted to `to`. A native currency side is
    /// attached as message value.
    AddLiquidity {
        pool: ActorId,
        asset_amount: Amount,
        currency_amount: Amount,
        min_asset: Amount,
        min_currency: Amount,
        to: ActorId,
    },
}

pub struct DexClient;

impl DexClient {
    async fn request(router: ActorId, action: DexAction, value: u128) -> Option<Vec<u8>> {
        gstd::msg::send_bytes_for_reply(router, action.encode(), value, 0)
            .ok()?
            .await
            .ok()
    }

    pub async fn get_or_create_pool(
        router: ActorId,
        asset: ActorId,
        currency: TokenType,
    ) -> ContractResult<ActorId> {
        let response = Self::request(router, DexAction::GetOrCreatePool { asset, currency }, 0)
            .await
            .ok_or(PresaleError::PoolUnavailable)?;

        ActorId::decode(&mut response.as_slice()).map_err(|_| PresaleError::PoolUnavailable)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn add_liquidity(
        router: ActorId,
        pool: ActorId,
        asset_amount: Amount,
        currency_amount: Amount,
        min_asset: Amount,
        min_currency: Amount,
        to: ActorId,
        value: u128,
    ) -> ContractResult<Amount> {
        let action = DexAction::AddLiquidity {
            pool,
            asset_amount,
            currency_amount,
            min_asset,
            min_currency,
            to,
        };
        let response = Self::request(router, action, value)
            .await
            .ok_or(PresaleError::LiquificationFailed)?;

        Amount::decode(&mut response.as_slice()).map_err(|_| PresaleError::LiquificationFailed)
    }
}
