use log::{debug, error, info, warn};
use soroban_sdk::Address;

use crate::{
    config::HarnessConfig,
    errors::{HarnessError, PoolError},
    pool::{EModeShape, PoolView},
    report::address_label,
    reserve::ReserveConfig,
    strategy::{read_rate_strategy, RateStrategy},
};

/// An e-mode category, normalized over both record layouts
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EModeCategory {
    pub id: u32,
    pub shape: EModeShape,
    pub ltv: u32,
    pub liquidation_threshold: u32,
    pub liquidation_bonus: u32,
    pub label: String,
    pub collateral_bitmap: Option<u128>, // bitmap layout only
    pub borrowable_bitmap: Option<u128>, // bitmap layout only
    pub price_source: Option<Address>,   // legacy layout only
}

/// The rate strategy of one reserve
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StrategySnapshot {
    pub asset: Address,
    pub symbol: String,
    pub address: Address,
    pub strategy: RateStrategy,
}

/// The configuration of every reserve of a pool at a point in time
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub name: String,
    pub pool: Address,
    pub reserves: Vec<ReserveConfig>,      // in listing order
    pub emodes: Vec<EModeCategory>,        // populated categories, ordered by id
    pub strategies: Vec<StrategySnapshot>, // in listing order
    pub flash_loan_premium_total: u32,
}

/// Build a snapshot of every reserve listed in `pool`
///
/// ### Arguments
/// * `pool` - The pool to snapshot
/// * `name` - The name reports for the snapshot are written under
/// * `config` - The harness configuration
///
/// ### Errors
/// If a listed reserve cannot be read or is listed twice, or an e-mode category or rate
/// strategy supports neither known layout
pub fn create_snapshot<P: PoolView>(
    pool: &P,
    name: &str,
    config: &HarnessConfig,
) -> Result<Snapshot, HarnessError> {
    let reserves = read_reserve_configs(pool)?;
    let emodes = read_emode_categories(pool, config)?;
    let strategies = reserves
        .iter()
        .map(|reserve| {
            Ok(StrategySnapshot {
                asset: reserve.underlying.clone(),
                symbol: reserve.symbol.clone(),
                address: reserve.interest_rate_strategy.clone(),
                strategy: read_rate_strategy(
                    pool,
                    &reserve.underlying,
                    &reserve.interest_rate_strategy,
                )?,
            })
        })
        .collect::<Result<Vec<StrategySnapshot>, HarnessError>>()?;
    info!(
        "snapshot {}: {} reserves, {} e-mode categories",
        name,
        reserves.len(),
        emodes.len()
    );
    Ok(Snapshot {
        name: name.to_string(),
        pool: pool.address(),
        reserves,
        emodes,
        strategies,
        flash_loan_premium_total: pool.flash_loan_premium_total(),
    })
}

/// Read the config of every listed reserve, in listing order
///
/// ### Errors
/// If a listed reserve cannot be read, or an underlying asset is listed more than once
pub fn read_reserve_configs<P: PoolView>(pool: &P) -> Result<Vec<ReserveConfig>, HarnessError> {
    let mut configs: Vec<ReserveConfig> = Vec::new();
    for asset in pool.reserves_list().iter() {
        if let Some(listed) = configs.iter().find(|config| &config.underlying == asset) {
            error!(
                "reserve {} ({}) is listed more than once",
                listed.symbol,
                address_label(asset)
            );
            return Err(HarnessError::DuplicateReserve);
        }
        let tokens = pool.reserve_tokens(asset);
        let params = pool.reserve_params(asset);
        match (tokens, params) {
            (Ok(tokens), Ok(params)) => configs.push(ReserveConfig::from_parts(
                asset,
                pool.symbol(asset),
                tokens,
                params,
            )),
            (Err(err), _) | (_, Err(err)) => {
                error!("unable to read reserve {}: {}", address_label(asset), err);
                return Err(HarnessError::ReserveNotFound);
            }
        }
    }
    Ok(configs)
}

/// Read every populated e-mode category
///
/// Enumerates exactly the allocated ids when the pool reports a category count. Otherwise scans
/// ids below `emode_scan_limit` and stops once more than `max_consecutive_empty_emodes` empty
/// categories are found in a row.
///
/// ### Errors
/// If a category supports neither known layout
pub fn read_emode_categories<P: PoolView>(
    pool: &P,
    config: &HarnessConfig,
) -> Result<Vec<EModeCategory>, HarnessError> {
    let mut shape = pool.emode_shape();
    let mut categories: Vec<EModeCategory> = Vec::new();

    // id 0 is reserved for "no e-mode"
    if let Some(count) = pool.emode_category_count() {
        let last = count.min(config.emode_scan_limit.saturating_sub(1));
        for id in 1..=last {
            if let Some(category) = read_emode_category(pool, id, &mut shape)? {
                categories.push(category);
            }
        }
        return Ok(categories);
    }

    let mut empty_in_a_row = 0;
    for id in 1..config.emode_scan_limit {
        match read_emode_category(pool, id, &mut shape)? {
            Some(category) => {
                empty_in_a_row = 0;
                categories.push(category);
            }
            None => {
                empty_in_a_row += 1;
                if empty_in_a_row > config.max_consecutive_empty_emodes {
                    warn!(
                        "e-mode scan stopped at id {} after {} empty categories",
                        id, empty_in_a_row
                    );
                    break;
                }
            }
        }
    }
    Ok(categories)
}

/// Read a single e-mode category, or None if the category is empty
///
/// `shape` holds the layout to use. If unknown, the bitmap layout is probed before the legacy
/// layout, and the layout that answered is stored for later reads.
fn read_emode_category<P: PoolView>(
    pool: &P,
    id: u32,
    shape: &mut Option<EModeShape>,
) -> Result<Option<EModeCategory>, HarnessError> {
    let category = match shape {
        Some(EModeShape::Bitmap) => read_bitmap_category(pool, id),
        Some(EModeShape::Legacy) => read_legacy_category(pool, id),
        None => match read_bitmap_category(pool, id) {
            Err(PoolError::Unsupported) => {
                debug!("e-mode bitmap layout unsupported, probing legacy layout");
                read_legacy_category(pool, id)
            }
            result => result,
        },
    }
    .map_err(|err| {
        error!("unable to read e-mode category {}: {}", id, err);
        HarnessError::UnsupportedEModeShape
    })?;

    if shape.is_none() {
        *shape = Some(category.shape);
    }
    if category.liquidation_threshold == 0 {
        return Ok(None);
    }
    Ok(Some(category))
}

fn read_bitmap_category<P: PoolView>(pool: &P, id: u32) -> Result<EModeCategory, PoolError> {
    let data = pool.emode_category(id)?;
    Ok(EModeCategory {
        id,
        shape: EModeShape::Bitmap,
        ltv: data.ltv,
        liquidation_threshold: data.liquidation_threshold,
        liquidation_bonus: data.liquidation_bonus,
        label: data.label,
        collateral_bitmap: Some(data.collateral_bitmap),
        borrowable_bitmap: Some(data.borrowable_bitmap),
        price_source: None,
    })
}

fn read_legacy_category<P: PoolView>(pool: &P, id: u32) -> Result<EModeCategory, PoolError> {
    let data = pool.legacy_emode_category(id)?;
    Ok(EModeCategory {
        id,
        shape: EModeShape::Legacy,
        ltv: data.ltv,
        liquidation_threshold: data.liquidation_threshold,
        liquidation_bonus: data.liquidation_bonus,
        label: data.label,
        collateral_bitmap: None,
        borrowable_bitmap: None,
        price_source: data.price_source,
    })
}
