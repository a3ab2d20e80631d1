use cast::i128;
use log::error;
use soroban_sdk::Address;

use crate::{
    config::HarnessConfig,
    constants::SUPPLY_CAP_TOLERANCE,
    errors::HarnessError,
    pool::{PoolView, TokenView},
    report::address_label,
    reserve::{find_reserve_config, ReserveConfig},
};

/// A broken plausibility rule
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub error: HarnessError,
    pub position: usize, // position of the reserve in the snapshot
    pub symbol: String,
}

impl Violation {
    fn new(error: HarnessError, position: usize, symbol: &str) -> Self {
        Violation {
            error,
            position,
            symbol: symbol.to_string(),
        }
    }
}

/// Find every plausibility violation between two snapshots of the same pool
///
/// Reserves are compared by position. For each position of `after`, in order:
/// * the reserve must sit at the same position it held in `before`
/// * for a reserve present in both, a borrow cap raised from a nonzero value requires
///   borrowing to be enabled
/// * for a newly listed reserve, the supply cap divided by `SUPPLY_CAP_TOLERANCE` must not
///   exceed the token's total supply in whole tokens
/// * a nonzero borrow cap must not exceed the supply cap, except on the excluded stablecoin
///
/// A reserve of `before` missing from `after` is reported last.
///
/// ### Arguments
/// * `tokens` - Token reads for the pool's underlying assets
/// * `before` - The reserves before the change
/// * `after` - The reserves after the change
/// * `config` - The harness configuration
pub fn find_violations<T: TokenView>(
    tokens: &T,
    before: &[ReserveConfig],
    after: &[ReserveConfig],
    config: &HarnessConfig,
) -> Vec<Violation> {
    let mut violations: Vec<Violation> = Vec::new();
    for (position, reserve) in after.iter().enumerate() {
        match before.get(position) {
            Some(prior) => {
                if prior.underlying != reserve.underlying {
                    violations.push(Violation::new(
                        HarnessError::ReserveListChanged,
                        position,
                        &reserve.symbol,
                    ));
                }
                if reserve.borrow_cap > prior.borrow_cap
                    && prior.borrow_cap != 0
                    && !reserve.borrowing_enabled
                {
                    violations.push(Violation::new(
                        HarnessError::BorrowCapBorrowDisabled,
                        position,
                        &reserve.symbol,
                    ));
                }
            }
            None => match reserve.scalar() {
                Ok(scalar) => {
                    let total_supply = tokens.total_supply(&reserve.underlying);
                    if i128(reserve.supply_cap / SUPPLY_CAP_TOLERANCE) > total_supply / scalar {
                        violations.push(Violation::new(
                            HarnessError::SupplyCapGtTotalSupply,
                            position,
                            &reserve.symbol,
                        ));
                    }
                }
                Err(err) => violations.push(Violation::new(err, position, &reserve.symbol)),
            },
        }

        if reserve.borrow_cap != 0
            && !config.is_excluded_stablecoin(&reserve.underlying)
            && reserve.borrow_cap > reserve.supply_cap
        {
            violations.push(Violation::new(
                HarnessError::SupplyLtBorrow,
                position,
                &reserve.symbol,
            ));
        }
    }

    for (position, prior) in before.iter().enumerate().skip(after.len()) {
        violations.push(Violation::new(
            HarnessError::ReserveListChanged,
            position,
            &prior.symbol,
        ));
    }
    violations
}

/// Validate two snapshots of the same pool against the plausibility rules
///
/// ### Errors
/// The first violation found by `find_violations`
pub fn validate_plausibility<T: TokenView>(
    tokens: &T,
    before: &[ReserveConfig],
    after: &[ReserveConfig],
    config: &HarnessConfig,
) -> Result<(), HarnessError> {
    match find_violations(tokens, before, after, config).first() {
        Some(violation) => {
            error!(
                "{} violated by reserve {} at position {}",
                violation.error, violation.symbol, violation.position
            );
            Err(violation.error)
        }
        None => Ok(()),
    }
}

/// Validate that the reserve of `expected.underlying` matches `expected` exactly
///
/// ### Errors
/// If the reserve is missing or any field differs
pub fn validate_reserve_config(
    expected: &ReserveConfig,
    configs: &[ReserveConfig],
) -> Result<(), HarnessError> {
    let actual = find_reserve_config(configs, &expected.underlying)?;
    let changes = expected.changed_fields(actual);
    if changes.is_empty() {
        return Ok(());
    }
    for (field, expected_value, actual_value) in changes {
        error!(
            "{}: {} expected {}, got {}",
            expected.symbol, field, expected_value, actual_value
        );
    }
    Err(HarnessError::ReserveConfigMismatch)
}

/// Validate that every reserve of `before` is unchanged in `after`, apart from `assets`
///
/// Reserves appended to `after` are ignored.
///
/// ### Errors
/// If a reserve outside `assets` changed or moved
pub fn no_reserve_changes_apart_from(
    before: &[ReserveConfig],
    after: &[ReserveConfig],
    assets: &[Address],
) -> Result<(), HarnessError> {
    for (position, prior) in before.iter().enumerate() {
        let current = match after.get(position) {
            Some(current) if current.underlying == prior.underlying => current,
            _ => {
                error!("reserve {} moved from position {}", prior.symbol, position);
                return Err(HarnessError::ReserveListChanged);
            }
        };
        if assets.contains(&prior.underlying) {
            continue;
        }
        let changes = prior.changed_fields(current);
        if !changes.is_empty() {
            for (field, from, to) in changes {
                error!("{}: {} changed from {} to {}", prior.symbol, field, from, to);
            }
            return Err(HarnessError::UnexpectedReserveChange);
        }
    }
    Ok(())
}

/// Validate that no reserve of `before` changed in `after`
///
/// ### Errors
/// If any previously listed reserve changed or moved
pub fn no_reserve_changes_apart_new_listings(
    before: &[ReserveConfig],
    after: &[ReserveConfig],
) -> Result<(), HarnessError> {
    no_reserve_changes_apart_from(before, after, &[])
}

/// Validate that the oracle reports a positive price for `asset`
///
/// ### Errors
/// If the price is zero or negative
pub fn validate_price_source<P: PoolView>(pool: &P, asset: &Address) -> Result<(), HarnessError> {
    let price = pool.asset_price(asset);
    if price <= 0 {
        error!("no price source for {}: {}", address_label(asset), price);
        return Err(HarnessError::MissingPriceSource);
    }
    Ok(())
}
