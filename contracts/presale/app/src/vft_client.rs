//! VFT (Vara Fungible Token) client for moving the asset and VFT currencies.
//!
//! Provides async messaging interface for the VFT operations the presale needs.

use alloc::vec::Vec;
use parity_scale_codec::{Decode, Encode};
use presale_shared::{Amount, ContractResult, PresaleError};
use scale_info::TypeInfo;
use sails_rs::prelude::*;

// =============================================================================
// VFT MESSAGE TYPES
// =============================================================================

/// VFT action messages for token operations.
#[derive(Debug, Clone, Encode, Decode, TypeInfo)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub enum VftAction {
    Transfer { to: ActorId, value: Amount },
    TransferFrom { from: ActorId, to: ActorId, value: Amount },
    Approve { spender: ActorId, value: Amount },
}

/// VFT query messages for reading token state.
#[derive(Debug, Clone, Encode, Decode, TypeInfo)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub enum VftQuery {
    Decimals,
    BalanceOf { account: ActorId },
}

// =============================================================================
// VFT CLIENT
// =============================================================================

/// VFT client for async token operations.
pub struct VftClient;

impl VftClient {
    /// Send an action and require a `true` reply.
    pub async fn send_action(token_address: ActorId, action: VftAction) -> ContractResult<()> {
        let response = Self::request(token_address, action.encode()).await?;

        // Tokens that reply with nothing are taken at their word.
        if response.is_empty() {
            return Ok(());
        }
        match bool::decode(&mut response.as_slice()) {
            Ok(true) => Ok(()),
            _ => Err(PresaleError::TransferFailed),
        }
    }

    /// Send an async query to VFT contract.
    pub async fn send_query(token_address: ActorId, query: VftQuery) -> ContractResult<Vec<u8>> {
        Self::request(token_address, query.encode()).await
    }

    async fn request(token_address: ActorId, payload: Vec<u8>) -> ContractResult<Vec<u8>> {
        gstd::msg::send_bytes_for_reply(token_address, payload, 0, 0)
            .map_err(|_| PresaleError::TransferFailed)?
            .await
            .map_err(|_| PresaleError::TransferFailed)
    }

    /// Transfer tokens from the program to a recipient.
    pub async fn transfer(token_address: ActorId, to: ActorId, amount: Amount) -> ContractResult<()> {
        Self::send_action(token_address, VftAction::Transfer { to, value: amount }).await
    }

    /// Transfer tokens on behalf of another account (requires approval).
    pub async fn transfer_from(
        token_address: ActorId,
        from: ActorId,
        to: ActorId,
        amount: Amount,
    ) -> ContractResult<()> {
        Self::send_action(
            token_address,
            VftAction::TransferFrom {
                from,
                to,
                value: amount,
            },
        )
        .await
    }

    /// Approve another account to spend the program's tokens.
    pub async fn approve(token_address: ActorId, spender: ActorId, amount: Amount) -> ContractResult<()> {
        Self::send_action(
            token_address,
            VftAction::Approve {
                spender,
                value: amount,
            },
        )
        .await
    }

    /// Query the token's decimal count.
    pub async fn decimals(token_address: ActorId) -> ContractResult<u8> {
        let response = Self::send_query(token_address, VftQuery::Decimals).await?;

        u8::decode(&mut response.as_slice()).map_err(|_| PresaleError::TransferFailed)
    }

    /// Query the balance of `account`.
    pub async fn balance_of(token_address: ActorId, account: ActorId) -> ContractResult<Amount> {
        let response = Self::send_query(token_address, VftQuery::BalanceOf { account }).await?;

        Amount::decode(&mut response.as_slice()).map_err(|_| PresaleError::TransferFailed)
    }
}
