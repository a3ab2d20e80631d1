use log::{debug, error};
use soroban_sdk::Address;

use crate::{
    constants::BPS_TO_RAY,
    errors::{HarnessError, PoolError},
    pool::{LegacyStrategyParams, PoolView, StrategyShape, V2StrategyParams},
    report::address_label,
};

/// The parameters of an interest rate curve, normalized to ray
///
/// Stable rate parameters are zero for strategies without a stable rate.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct InterestStrategyValues {
    pub optimal_usage_ratio: u128,
    pub optimal_stable_to_total_debt_ratio: u128,
    pub base_variable_borrow_rate: u128,
    pub variable_rate_slope1: u128,
    pub variable_rate_slope2: u128,
    pub stable_rate_slope1: u128,
    pub stable_rate_slope2: u128,
    pub base_stable_rate_offset: u128,
    pub stable_rate_excess_offset: u128,
}

/// The parameters read from a strategy contract, tagged by layout
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RateStrategy {
    Legacy(LegacyStrategyParams),
    V2(V2StrategyParams),
}

impl RateStrategy {
    pub fn shape(&self) -> StrategyShape {
        match self {
            RateStrategy::Legacy(_) => StrategyShape::Legacy,
            RateStrategy::V2(_) => StrategyShape::V2,
        }
    }

    /// Normalize the parameters into ray based values
    pub fn values(&self) -> InterestStrategyValues {
        match self {
            RateStrategy::Legacy(params) => InterestStrategyValues {
                optimal_usage_ratio: params.optimal_usage_ratio,
                optimal_stable_to_total_debt_ratio: params.optimal_stable_to_total_debt_ratio,
                base_variable_borrow_rate: params.base_variable_borrow_rate,
                variable_rate_slope1: params.variable_rate_slope1,
                variable_rate_slope2: params.variable_rate_slope2,
                stable_rate_slope1: params.stable_rate_slope1,
                stable_rate_slope2: params.stable_rate_slope2,
                base_stable_rate_offset: params.base_stable_rate_offset,
                stable_rate_excess_offset: params.stable_rate_excess_offset,
            },
            RateStrategy::V2(params) => InterestStrategyValues {
                optimal_usage_ratio: u128::from(params.optimal_usage_ratio) * BPS_TO_RAY,
                base_variable_borrow_rate: u128::from(params.base_variable_borrow_rate)
                    * BPS_TO_RAY,
                variable_rate_slope1: u128::from(params.variable_rate_slope1) * BPS_TO_RAY,
                variable_rate_slope2: u128::from(params.variable_rate_slope2) * BPS_TO_RAY,
                ..Default::default()
            },
        }
    }
}

/// Read the rate strategy of a reserve
///
/// Uses the layout the strategy reports when it reports one. Otherwise probes the legacy
/// layout first and falls back to the V2 layout if the strategy does not support it.
///
/// ### Arguments
/// * `pool` - The pool the reserve is listed in
/// * `asset` - The underlying asset of the reserve
/// * `strategy` - The strategy contract of the reserve
///
/// ### Errors
/// If the strategy supports neither layout
pub fn read_rate_strategy<P: PoolView>(
    pool: &P,
    asset: &Address,
    strategy: &Address,
) -> Result<RateStrategy, HarnessError> {
    let result = match pool.strategy_shape(strategy) {
        Some(StrategyShape::Legacy) => pool
            .legacy_strategy_params(strategy)
            .map(RateStrategy::Legacy),
        Some(StrategyShape::V2) => pool
            .v2_strategy_params(strategy, asset)
            .map(RateStrategy::V2),
        None => match pool.legacy_strategy_params(strategy) {
            Ok(params) => Ok(RateStrategy::Legacy(params)),
            Err(PoolError::Unsupported) => {
                debug!(
                    "strategy {} has no legacy layout, probing v2",
                    address_label(strategy)
                );
                pool.v2_strategy_params(strategy, asset)
                    .map(RateStrategy::V2)
            }
            Err(err) => Err(err),
        },
    };
    result.map_err(|err| {
        error!(
            "unable to read strategy {} for {}: {}",
            address_label(strategy),
            address_label(asset),
            err
        );
        HarnessError::UnsupportedStrategyShape
    })
}

/// Validate the strategy of a reserve against expected values
///
/// ### Errors
/// If the strategy cannot be read or any value differs from `expected`
pub fn validate_interest_rate_strategy<P: PoolView>(
    pool: &P,
    asset: &Address,
    strategy: &Address,
    expected: &InterestStrategyValues,
) -> Result<(), HarnessError> {
    let actual = read_rate_strategy(pool, asset, strategy)?.values();
    if &actual != expected {
        error!(
            "strategy {} mismatch: expected {:?}, got {:?}",
            address_label(strategy),
            expected,
            actual
        );
        return Err(HarnessError::StrategyMismatch);
    }
    Ok(())
}
