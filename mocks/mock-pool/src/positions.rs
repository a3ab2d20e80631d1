use cast::i128;
use harness::{constants::PERCENTAGE_FACTOR, PoolError};
use soroban_fixed_point_math::FixedPoint;
use soroban_sdk::Address;

use crate::storage::{MockReserve, PoolState};

/// The close factor applies while the health factor is above this value, in bps
const CLOSE_FACTOR_HF_THRESHOLD: i128 = 9_500;

/// A user's position valued in the oracle's base currency, in 8 decimals
pub(crate) struct PositionData {
    /// The collateral value weighted by loan to value
    pub borrow_limit: i128,
    /// The collateral value weighted by liquidation threshold
    pub liquidation_limit: i128,
    /// The value of all debt
    pub liability: i128,
}

impl PositionData {
    /// Value every position `user` holds in the pool
    ///
    /// ### Errors
    /// If a value overflows
    pub fn calculate(state: &PoolState, user: &Address) -> Result<Self, PoolError> {
        let mut position = PositionData {
            borrow_limit: 0,
            liquidation_limit: 0,
            liability: 0,
        };
        for reserve in &state.reserves {
            let b_token_balance = state.balance(&reserve.tokens.b_token, user);
            let d_token_balance = state.balance(&reserve.tokens.d_token, user);
            if b_token_balance == 0 && d_token_balance == 0 {
                continue;
            }
            let price = state.price(&reserve.asset);

            if b_token_balance > 0 && reserve.params.usage_as_collateral_enabled {
                let value = to_value(price, b_token_balance, reserve)?;
                position.borrow_limit += value
                    .fixed_mul_floor(i128(reserve.params.ltv), PERCENTAGE_FACTOR)
                    .ok_or(PoolError::InternalError)?;
                position.liquidation_limit += value
                    .fixed_mul_floor(
                        i128(reserve.params.liquidation_threshold),
                        PERCENTAGE_FACTOR,
                    )
                    .ok_or(PoolError::InternalError)?;
            }
            if d_token_balance > 0 {
                position.liability += price
                    .fixed_mul_ceil(d_token_balance, reserve.scalar())
                    .ok_or(PoolError::InternalError)?;
            }
        }
        Ok(position)
    }

    /// Check if the debt is covered by the loan to value weighted collateral
    pub fn can_cover_debt(&self) -> bool {
        self.liability == 0 || (self.borrow_limit > 0 && self.liability <= self.borrow_limit)
    }

    /// Check if the health factor is below 1
    pub fn is_liquidatable(&self) -> bool {
        self.liability > self.liquidation_limit
    }

    /// Check if at most half of the debt may be liquidated in one call
    pub fn is_close_factor_limited(&self) -> bool {
        self.liquidation_limit * PERCENTAGE_FACTOR > self.liability * CLOSE_FACTOR_HF_THRESHOLD
    }
}

/// Value `amount` of a reserve's token at `price`
pub(crate) fn to_value(
    price: i128,
    amount: i128,
    reserve: &MockReserve,
) -> Result<i128, PoolError> {
    price
        .fixed_mul_floor(amount, reserve.scalar())
        .ok_or(PoolError::InternalError)
}

/// Convert `value` into an amount of a reserve's token at `price`
pub(crate) fn to_amount(
    price: i128,
    value: i128,
    reserve: &MockReserve,
) -> Result<i128, PoolError> {
    if price <= 0 {
        return Err(PoolError::InternalError);
    }
    value
        .fixed_div_floor(price, reserve.scalar())
        .ok_or(PoolError::InternalError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use harness::pool::{ReserveParams, ReserveTokens};
    use soroban_sdk::{testutils::Address as _, Env};

    fn reserve(e: &Env, decimals: u32, ltv: u32, liquidation_threshold: u32) -> MockReserve {
        MockReserve {
            asset: Address::generate(e),
            symbol: String::from("TEST"),
            tokens: ReserveTokens {
                b_token: Address::generate(e),
                d_token: Address::generate(e),
                rate_strategy: Address::generate(e),
            },
            params: ReserveParams {
                decimals,
                ltv,
                liquidation_threshold,
                usage_as_collateral_enabled: true,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_calculate_position() {
        let e = Env::default();
        let samwise = Address::generate(&e);
        let weth = reserve(&e, 18, 7_500, 8_000);
        let usdc = reserve(&e, 6, 0, 0);

        let mut state = PoolState::default();
        state.set_price(&weth.asset, 2_000_0000_0000);
        state.set_price(&usdc.asset, 1_0000_0000);
        // 1 weth of collateral, 1000 usdc of debt
        state.mint(&weth.tokens.b_token, &samwise, 1_000_000_000_000_000_000);
        state.mint(&usdc.tokens.d_token, &samwise, 1_000_000_000);
        state.reserves.push(weth);
        state.reserves.push(usdc);

        let position = PositionData::calculate(&state, &samwise).unwrap();
        assert_eq!(position.borrow_limit, 1_500_0000_0000);
        assert_eq!(position.liquidation_limit, 1_600_0000_0000);
        assert_eq!(position.liability, 1_000_0000_0000);
        assert!(position.can_cover_debt());
        assert!(!position.is_liquidatable());
        assert!(position.is_close_factor_limited());
    }

    #[test]
    fn test_liquidatable_position() {
        let position = PositionData {
            borrow_limit: 750,
            liquidation_limit: 800,
            liability: 1_000,
        };
        assert!(!position.can_cover_debt());
        assert!(position.is_liquidatable());
        assert!(!position.is_close_factor_limited());

        let position = PositionData {
            borrow_limit: 750,
            liquidation_limit: 960,
            liability: 1_000,
        };
        assert!(position.is_liquidatable());
        assert!(position.is_close_factor_limited());
    }

    #[test]
    fn test_to_amount_requires_price() {
        let e = Env::default();
        let usdc = reserve(&e, 6, 0, 0);
        assert_eq!(to_amount(0, 100, &usdc), Err(PoolError::InternalError));
        assert_eq!(to_amount(1_0000_0000, 5_0000_0000, &usdc).unwrap(), 5_000_000);
    }
}
