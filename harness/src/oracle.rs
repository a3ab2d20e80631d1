use cast::i128;
use log::error;
use soroban_fixed_point_math::FixedPoint;
use soroban_sdk::Address;

use crate::{
    constants::{PERCENTAGE_FACTOR, PRICE_DECIMALS},
    errors::HarnessError,
    pool::PoolView,
    report::address_label,
};

/// Convert a dollar value into a token amount at a given oracle price
///
/// `amount = dollar_value * 10^(8 + decimals) / price`
///
/// ### Arguments
/// * `dollar_value` - The value in whole dollars
/// * `decimals` - The decimals of the token
/// * `price` - The oracle price of one whole token, in 8 decimals
///
/// ### Errors
/// If the price is not positive or the amount overflows
pub fn token_amount_for_value(
    dollar_value: i128,
    decimals: u32,
    price: i128,
) -> Result<i128, HarnessError> {
    if price <= 0 {
        return Err(HarnessError::InvalidPrice);
    }
    10i128
        .checked_pow(decimals)
        .and_then(|scalar| dollar_value.checked_mul(scalar))
        .and_then(|value| value.fixed_div_floor(price, 10i128.pow(PRICE_DECIMALS)))
        .ok_or(HarnessError::ArithmeticError)
}

/// Convert a dollar value into an amount of `asset` using the pool's oracle
///
/// ### Errors
/// If the oracle has no positive price for `asset`
pub fn token_amount_by_dollar_value<P: PoolView>(
    pool: &P,
    asset: &Address,
    decimals: u32,
    dollar_value: i128,
) -> Result<i128, HarnessError> {
    let price = pool.asset_price(asset);
    token_amount_for_value(dollar_value, decimals, price).map_err(|err| {
        error!(
            "unable to size {} with price {}: {}",
            address_label(asset),
            price,
            err
        );
        err
    })
}

/// Multiply `value` by a percentage in bps, rounding half up
pub fn percent_mul(value: i128, bps: u32) -> i128 {
    (value * i128(bps) + PERCENTAGE_FACTOR / 2) / PERCENTAGE_FACTOR
}

/// Check if `a` is within `delta` of `b`, inclusive
pub fn approx_eq_abs(a: i128, b: i128, delta: i128) -> bool {
    (a - b).abs() <= delta
}
