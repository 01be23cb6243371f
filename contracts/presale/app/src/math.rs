//! Fixed-point helpers. Products are taken in 256 bits, divisions truncate.

use presale_shared::{Amount, BasisPoints, ContractResult, PresaleError, MAX_BASIS_POINTS};
use sails_rs::U256;

fn narrow(value: U256) -> ContractResult<Amount> {
    if value > U256::from(u128::MAX) {
        return Err(PresaleError::Overflow);
    }
    Ok(value.low_u128())
}

fn scale(decimals: u8) -> ContractResult<U256> {
    U256::from(10u8)
        .checked_pow(U256::from(decimals))
        .ok_or(PresaleError::Overflow)
}

/// `a * b / denom`, truncated.
pub fn mul_div(a: Amount, b: Amount, denom: Amount) -> ContractResult<Amount> {
    if denom == 0 {
        return Err(PresaleError::Overflow);
    }
    narrow(U256::from(a) * U256::from(b) / U256::from(denom))
}

/// `amount * bps / 10000`, truncated.
pub fn bps_of(amount: Amount, bps: BasisPoints) -> ContractResult<Amount> {
    mul_div(amount, bps as Amount, MAX_BASIS_POINTS as Amount)
}

/// Converts a currency amount into asset units at `rate` asset per currency,
/// `amount * rate * 10^asset_decimals / 10^currency_decimals`.
pub fn convert(
    amount: Amount,
    rate: Amount,
    asset_decimals: u8,
    currency_decimals: u8,
) -> ContractResult<Amount> {
    let product = U256::from(amount)
        .checked_mul(U256::from(rate))
        .and_then(|p| p.checked_mul(scale(asset_decimals).ok()?))
        .ok_or(PresaleError::Overflow)?;

    narrow(product / scale(currency_decimals)?)
}

/// `total * part / whole` for `part <= whole`; `total` when `whole == 0`.
pub fn proportion(total: Amount, part: u64, whole: u64) -> Amount {
    if whole == 0 || part >= whole {
        return total;
    }
    // Bounded by `total`, so the narrowing cannot fail.
    (U256::from(total) * U256::from(part) / U256::from(whole)).low_u128()
}

/// Count for a reply field; saturates at `u32::MAX`.
pub fn count_u32(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}
