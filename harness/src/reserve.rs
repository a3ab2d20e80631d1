use log::{error, info};
use soroban_sdk::Address;

use crate::{
    errors::HarnessError,
    pool::{ReserveParams, ReserveTokens},
    report::address_label,
};

/// The full configuration of one listed reserve
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReserveConfig {
    pub symbol: String,
    pub underlying: Address,            // the underlying asset address
    pub b_token: Address,               // the interest bearing token
    pub d_token: Address,               // the variable debt token
    pub interest_rate_strategy: Address, // the interest rate strategy contract
    pub decimals: u32,
    pub ltv: u32,                      // loan to value, in bps
    pub liquidation_threshold: u32,    // in bps
    pub liquidation_bonus: u32,        // in bps
    pub liquidation_protocol_fee: u32, // in bps
    pub reserve_factor: u32,           // in bps
    pub supply_cap: u64,               // in whole tokens
    pub borrow_cap: u64,               // in whole tokens
    pub debt_ceiling: u64,             // isolation mode ceiling, 0 is not isolated
    pub emode_category: u32,
    pub is_active: bool,
    pub is_frozen: bool,
    pub is_paused: bool,
    pub borrowing_enabled: bool,
    pub usage_as_collateral_enabled: bool,
    pub is_flashloanable: bool,
    pub is_siloed: bool,
    pub borrowable_in_isolation: bool,
}

impl ReserveConfig {
    /// Assemble a reserve config from what the pool stores about `underlying`
    pub fn from_parts(
        underlying: &Address,
        symbol: String,
        tokens: ReserveTokens,
        params: ReserveParams,
    ) -> Self {
        ReserveConfig {
            symbol,
            underlying: underlying.clone(),
            b_token: tokens.b_token,
            d_token: tokens.d_token,
            interest_rate_strategy: tokens.rate_strategy,
            decimals: params.decimals,
            ltv: params.ltv,
            liquidation_threshold: params.liquidation_threshold,
            liquidation_bonus: params.liquidation_bonus,
            liquidation_protocol_fee: params.liquidation_protocol_fee,
            reserve_factor: params.reserve_factor,
            supply_cap: params.supply_cap,
            borrow_cap: params.borrow_cap,
            debt_ceiling: params.debt_ceiling,
            emode_category: params.emode_category,
            is_active: params.is_active,
            is_frozen: params.is_frozen,
            is_paused: params.is_paused,
            borrowing_enabled: params.borrowing_enabled,
            usage_as_collateral_enabled: params.usage_as_collateral_enabled,
            is_flashloanable: params.is_flashloanable,
            is_siloed: params.is_siloed,
            borrowable_in_isolation: params.borrowable_in_isolation,
        }
    }

    /// Check if the reserve accepts user actions: active, not frozen and not paused
    pub fn is_eligible(&self) -> bool {
        self.is_active && !self.is_frozen && !self.is_paused
    }

    /// Check if the reserve can back borrows of any other reserve
    pub fn is_reference_collateral(&self) -> bool {
        self.is_eligible()
            && self.usage_as_collateral_enabled
            && self.debt_ceiling == 0
            && self.ltv != 0
    }

    /// The scalar for one whole token
    ///
    /// ### Errors
    /// If `10^decimals` does not fit in an i128
    pub fn scalar(&self) -> Result<i128, HarnessError> {
        10i128.checked_pow(self.decimals).ok_or_else(|| {
            error!("{} has {} decimals", self.symbol, self.decimals);
            HarnessError::ArithmeticError
        })
    }

    /// Every field rendered as a string, in declaration order
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("symbol", self.symbol.clone()),
            ("underlying", address_label(&self.underlying)),
            ("bToken", address_label(&self.b_token)),
            ("dToken", address_label(&self.d_token)),
            (
                "interestRateStrategy",
                address_label(&self.interest_rate_strategy),
            ),
            ("decimals", self.decimals.to_string()),
            ("ltv", self.ltv.to_string()),
            (
                "liquidationThreshold",
                self.liquidation_threshold.to_string(),
            ),
            ("liquidationBonus", self.liquidation_bonus.to_string()),
            (
                "liquidationProtocolFee",
                self.liquidation_protocol_fee.to_string(),
            ),
            ("reserveFactor", self.reserve_factor.to_string()),
            ("supplyCap", self.supply_cap.to_string()),
            ("borrowCap", self.borrow_cap.to_string()),
            ("debtCeiling", self.debt_ceiling.to_string()),
            ("eModeCategory", self.emode_category.to_string()),
            ("isActive", self.is_active.to_string()),
            ("isFrozen", self.is_frozen.to_string()),
            ("isPaused", self.is_paused.to_string()),
            ("borrowingEnabled", self.borrowing_enabled.to_string()),
            (
                "usageAsCollateralEnabled",
                self.usage_as_collateral_enabled.to_string(),
            ),
            ("isFlashloanable", self.is_flashloanable.to_string()),
            ("isSiloed", self.is_siloed.to_string()),
            (
                "borrowableInIsolation",
                self.borrowable_in_isolation.to_string(),
            ),
        ]
    }

    /// The fields that differ from `other`, as (field, self value, other value)
    pub fn changed_fields(&self, other: &ReserveConfig) -> Vec<(&'static str, String, String)> {
        self.fields()
            .into_iter()
            .zip(other.fields())
            .filter(|((_, from), (_, to))| from != to)
            .map(|((field, from), (_, to))| (field, from, to))
            .collect()
    }
}

/// Find the config of `asset` in a snapshot
///
/// ### Errors
/// If no reserve in `configs` has `asset` as its underlying
pub fn find_reserve_config<'a>(
    configs: &'a [ReserveConfig],
    asset: &Address,
) -> Result<&'a ReserveConfig, HarnessError> {
    configs
        .iter()
        .find(|config| &config.underlying == asset)
        .ok_or_else(|| {
            error!("reserve {} not found in snapshot", address_label(asset));
            HarnessError::ReserveNotFound
        })
}

/// Find the config of the reserve with `symbol` in a snapshot
///
/// ### Errors
/// If no reserve in `configs` has the symbol
pub fn find_reserve_config_by_symbol<'a>(
    configs: &'a [ReserveConfig],
    symbol: &str,
) -> Result<&'a ReserveConfig, HarnessError> {
    configs
        .iter()
        .find(|config| config.symbol == symbol)
        .ok_or_else(|| {
            error!("reserve {} not found in snapshot", symbol);
            HarnessError::ReserveNotFound
        })
}

/// Log every field of a reserve config
pub fn log_reserve_config(config: &ReserveConfig) {
    info!("Reserve {}", config.symbol);
    for (field, value) in config.fields() {
        info!("  {}: {}", field, value);
    }
}
