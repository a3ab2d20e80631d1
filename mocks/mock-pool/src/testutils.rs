use harness::{
    constants::RAY,
    pool::{LegacyStrategyParams, ReserveParams, V2StrategyParams},
};

use crate::storage::MockStrategy;

//************************************************
//           Reserve Configuration Helpers
//************************************************

/// A fully enabled, uncapped reserve usable as collateral
pub fn default_reserve_params(decimals: u32) -> ReserveParams {
    ReserveParams {
        decimals,
        ltv: 7_500,
        liquidation_threshold: 8_000,
        liquidation_bonus: 10_500,
        liquidation_protocol_fee: 1_000,
        reserve_factor: 1_000,
        supply_cap: 0,
        borrow_cap: 0,
        debt_ceiling: 0,
        emode_category: 0,
        is_active: true,
        is_frozen: false,
        is_paused: false,
        borrowing_enabled: true,
        usage_as_collateral_enabled: true,
        is_flashloanable: true,
        is_siloed: false,
        borrowable_in_isolation: false,
    }
}

//***** Strategies ******

pub fn default_legacy_strategy() -> MockStrategy {
    MockStrategy::Legacy(LegacyStrategyParams {
        optimal_usage_ratio: RAY / 100 * 80,
        optimal_stable_to_total_debt_ratio: RAY / 100 * 20,
        base_variable_borrow_rate: 0,
        variable_rate_slope1: RAY / 100 * 4,
        variable_rate_slope2: RAY / 100 * 75,
        stable_rate_slope1: RAY / 100 * 2,
        stable_rate_slope2: RAY / 100 * 75,
        base_stable_rate_offset: RAY / 100 * 2,
        stable_rate_excess_offset: RAY / 100 * 5,
    })
}

pub fn default_v2_strategy() -> MockStrategy {
    MockStrategy::V2(V2StrategyParams {
        optimal_usage_ratio: 9_000,
        base_variable_borrow_rate: 0,
        variable_rate_slope1: 550,
        variable_rate_slope2: 6_000,
    })
}
