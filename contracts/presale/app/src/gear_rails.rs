//! Rails backed by the Gear runtime: attached value, VFT programs and a DEX
//! router.
//!
//! Presale, vesting and custody all live in this program, so a transfer
//! between two of them is a no-op here.

use presale_shared::{Amount, ContractResult, PresaleError, TokenType};
use sails_rs::prelude::*;

use crate::constants::VARA_DECIMALS;
use crate::dex_client::DexClient;
use crate::rails::{AssetRail, LiquidityRequest, PoolProvider};
use crate::vft_client::VftClient;

pub struct GearRails {
    program: ActorId,
    router: ActorId,
    /// Value attached to the current message and not yet pulled.
    attached: Amount,
    committed: u64,
}

impl GearRails {
    /// Rails for the message being handled.
    pub fn new(router: ActorId) -> Self {
        Self {
            program: gstd::exec::program_id(),
            router,
            attached: gstd::msg::value(),
            committed: 0,
        }
    }

    /// Sends back attached value no operation pulled.
    pub fn return_unspent(&mut self, to: ActorId) -> ContractResult<()> {
        let unspent = core::mem::take(&mut self.attached);
        send_native(to, unspent)
    }
}

fn send_native(to: ActorId, amount: Amount) -> ContractResult<()> {
    if amount == 0 {
        return Ok(());
    }
    gstd::msg::send_bytes(to, [], amount).map_err(|_| PresaleError::TransferFailed)?;
    Ok(())
}

impl AssetRail for GearRails {
    async fn decimals(&mut self, token: TokenType) -> ContractResult<u8> {
        match token {
            TokenType::Native => Ok(VARA_DECIMALS),
            TokenType::Vft(id) => VftClient::decimals(id).await,
        }
    }

    async fn balance_of(&mut self, token: TokenType, owner: ActorId) -> ContractResult<Amount> {
        match token {
            TokenType::Native if owner == self.program => {
                // Value still attached to this message is not the program's yet.
                Ok(gstd::exec::value_available().saturating_sub(self.attached))
            }
            TokenType::Native => Err(PresaleError::TransferFailed),
            TokenType::Vft(id) => VftClient::balance_of(id, owner).await,
        }
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
        if amount == 0 || from == to {
            return Ok(());
        }

        match token {
            // Native value can only come in attached to the caller's message.
            TokenType::Native if to == self.program => {
                if amount != self.attached {
                    return Err(PresaleError::AttachedValueMismatch);
                }
                self.attached = 0;
            }
            TokenType::Native if from == self.program => send_native(to, amount)?,
            TokenType::Native => return Err(PresaleError::TransferFailed),
            TokenType::Vft(id) if from == self.program => VftClient::transfer(id, to, amount).await?,
            TokenType::Vft(id) => VftClient::transfer_from(id, from, to, amount).await?,
        }
        self.committed += 1;
        Ok(())
    }
}

impl PoolProvider for GearRails {
    async fn get_or_create_pool(
        &mut self,
        asset: ActorId,
        currency: TokenType,
    ) -> ContractResult<ActorId> {
        DexClient::get_or_create_pool(self.router, asset, currency).await
    }

    async fn add_liquidity(&mut self, request: LiquidityRequest) -> ContractResult<Amount> {
        if request.payer != self.program {
            return Err(PresaleError::LiquificationFailed);
        }

        VftClient::approve(request.asset, self.router, request.asset_amount).await?;
        let value = match request.currency {
            TokenType::Native => request.currency_amount,
            TokenType::Vft(currency) => {
                VftClient::approve(currency, self.router, request.currency_amount).await?;
                0
            }
        };

        let shares = DexClient::add_liquidity(
            self.router,
            request.pool,
            request.asset_amount,
            request.currency_amount,
            request.min_asset,
            request.min_currency,
            request.recipient,
            value,
        )
        .await?;
        self.committed += 1;
        Ok(shares)
    }
}
