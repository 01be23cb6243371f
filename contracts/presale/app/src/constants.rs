//! Fixed policy values of the presale program.

use presale_shared::{BasisPoints, Duration};
use sails_rs::prelude::*;

/// Allowed shares of the raise that go into the pool.
pub const LIQUIDITY_SHARE_OPTIONS: [BasisPoints; 6] = [5_000, 6_000, 7_000, 8_000, 9_000, 10_000];

/// Ceiling for the pool-seeding slippage tolerance (5%).
pub const MAX_SLIPPAGE_BPS: BasisPoints = 500;

/// Ceiling for the house cut of the raise (5%).
pub const MAX_HOUSE_FEE_BPS: BasisPoints = 500;

/// Soft cap must be at least `hard_cap / SOFT_CAP_MIN_DIVISOR`.
pub const SOFT_CAP_MIN_DIVISOR: u128 = 4;

/// How long contributors may claim after finalization (180 days).
pub const CLAIM_WINDOW: Duration = 180 * 24 * 60 * 60 * 1_000;

/// Decimals of the native VARA token.
pub const VARA_DECIMALS: u8 = 12;

const BURN_SINK: [u8; 32] = [0xde; 32];

/// Sink for burned leftovers. No key controls it.
pub fn burn_address() -> ActorId {
    ActorId::from(BURN_SINK)
}
