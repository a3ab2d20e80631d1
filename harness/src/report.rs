use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use log::{error, info};
use serde::Serialize;
use soroban_sdk::Address;

use crate::{
    diff::SnapshotDiff,
    errors::HarnessError,
    pool::StorageWrite,
    reserve::ReserveConfig,
    snapshot::{EModeCategory, Snapshot, StrategySnapshot},
};

/// Render an address for reports and logs
pub fn address_label(address: &Address) -> String {
    format!("{:?}", address)
}

/********** Report Types **********/

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReserveReport {
    symbol: String,
    underlying: String,
    b_token: String,
    d_token: String,
    interest_rate_strategy: String,
    decimals: u32,
    ltv: u32,
    liquidation_threshold: u32,
    liquidation_bonus: u32,
    liquidation_protocol_fee: u32,
    reserve_factor: u32,
    supply_cap: u64,
    borrow_cap: u64,
    debt_ceiling: u64,
    e_mode_category: u32,
    is_active: bool,
    is_frozen: bool,
    is_paused: bool,
    borrowing_enabled: bool,
    usage_as_collateral_enabled: bool,
    is_flashloanable: bool,
    is_siloed: bool,
    borrowable_in_isolation: bool,
}

impl From<&ReserveConfig> for ReserveReport {
    fn from(config: &ReserveConfig) -> Self {
        ReserveReport {
            symbol: config.symbol.clone(),
            underlying: address_label(&config.underlying),
            b_token: address_label(&config.b_token),
            d_token: address_label(&config.d_token),
            interest_rate_strategy: address_label(&config.interest_rate_strategy),
            decimals: config.decimals,
            ltv: config.ltv,
            liquidation_threshold: config.liquidation_threshold,
            liquidation_bonus: config.liquidation_bonus,
            liquidation_protocol_fee: config.liquidation_protocol_fee,
            reserve_factor: config.reserve_factor,
            supply_cap: config.supply_cap,
            borrow_cap: config.borrow_cap,
            debt_ceiling: config.debt_ceiling,
            e_mode_category: config.emode_category,
            is_active: config.is_active,
            is_frozen: config.is_frozen,
            is_paused: config.is_paused,
            borrowing_enabled: config.borrowing_enabled,
            usage_as_collateral_enabled: config.usage_as_collateral_enabled,
            is_flashloanable: config.is_flashloanable,
            is_siloed: config.is_siloed,
            borrowable_in_isolation: config.borrowable_in_isolation,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EModeReport {
    label: String,
    ltv: u32,
    liquidation_threshold: u32,
    liquidation_bonus: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    collateral_bitmap: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    borrowable_bitmap: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    price_source: Option<String>,
}

impl From<&EModeCategory> for EModeReport {
    fn from(category: &EModeCategory) -> Self {
        EModeReport {
            label: category.label.clone(),
            ltv: category.ltv,
            liquidation_threshold: category.liquidation_threshold,
            liquidation_bonus: category.liquidation_bonus,
            collateral_bitmap: category.collateral_bitmap.map(|bitmap| format!("{:#b}", bitmap)),
            borrowable_bitmap: category.borrowable_bitmap.map(|bitmap| format!("{:#b}", bitmap)),
            price_source: category.price_source.as_ref().map(address_label),
        }
    }
}

// ray values exceed the precision of json numbers, so they are written as strings
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StrategyReport {
    asset: String,
    symbol: String,
    address: String,
    shape: String,
    optimal_usage_ratio: String,
    optimal_stable_to_total_debt_ratio: String,
    base_variable_borrow_rate: String,
    variable_rate_slope1: String,
    variable_rate_slope2: String,
    stable_rate_slope1: String,
    stable_rate_slope2: String,
    base_stable_rate_offset: String,
    stable_rate_excess_offset: String,
}

impl From<&StrategySnapshot> for StrategyReport {
    fn from(snapshot: &StrategySnapshot) -> Self {
        let values = snapshot.strategy.values();
        StrategyReport {
            asset: address_label(&snapshot.asset),
            symbol: snapshot.symbol.clone(),
            address: address_label(&snapshot.address),
            shape: format!("{:?}", snapshot.strategy.shape()),
            optimal_usage_ratio: values.optimal_usage_ratio.to_string(),
            optimal_stable_to_total_debt_ratio: values
                .optimal_stable_to_total_debt_ratio
                .to_string(),
            base_variable_borrow_rate: values.base_variable_borrow_rate.to_string(),
            variable_rate_slope1: values.variable_rate_slope1.to_string(),
            variable_rate_slope2: values.variable_rate_slope2.to_string(),
            stable_rate_slope1: values.stable_rate_slope1.to_string(),
            stable_rate_slope2: values.stable_rate_slope2.to_string(),
            base_stable_rate_offset: values.base_stable_rate_offset.to_string(),
            stable_rate_excess_offset: values.stable_rate_excess_offset.to_string(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PoolConfigReport {
    pool: String,
    flash_loan_premium_total: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotReport {
    name: String,
    reserves: Vec<ReserveReport>,
    e_modes: BTreeMap<u32, EModeReport>,
    strategies: Vec<StrategyReport>,
    pool_config: PoolConfigReport,
}

impl From<&Snapshot> for SnapshotReport {
    fn from(snapshot: &Snapshot) -> Self {
        SnapshotReport {
            name: snapshot.name.clone(),
            reserves: snapshot.reserves.iter().map(ReserveReport::from).collect(),
            e_modes: snapshot
                .emodes
                .iter()
                .map(|category| (category.id, EModeReport::from(category)))
                .collect(),
            strategies: snapshot
                .strategies
                .iter()
                .map(StrategyReport::from)
                .collect(),
            pool_config: PoolConfigReport {
                pool: address_label(&snapshot.pool),
                flash_loan_premium_total: snapshot.flash_loan_premium_total,
            },
        }
    }
}

#[derive(Serialize)]
struct StorageWriteReport<'a> {
    account: &'a str,
    slot: &'a str,
    previous: &'a str,
    new: &'a str,
}

/********** Writers **********/

/// Write `value` as pretty printed json to `dir/file_name`, creating `dir` if needed
///
/// ### Errors
/// If the directory or file cannot be written
pub fn write_json<T: Serialize>(
    dir: &Path,
    file_name: &str,
    value: &T,
) -> Result<PathBuf, HarnessError> {
    let path = dir.join(file_name);
    let json = serde_json::to_string_pretty(value).map_err(|err| {
        error!("unable to serialize {}: {}", file_name, err);
        HarnessError::ReportWriteFailed
    })?;
    fs::create_dir_all(dir)
        .and_then(|_| fs::write(&path, json))
        .map_err(|err| {
            error!("unable to write {}: {}", path.display(), err);
            HarnessError::ReportWriteFailed
        })?;
    info!("report written to {}", path.display());
    Ok(path)
}

/// Write a snapshot to `dir/<name>.json`
pub fn write_snapshot_report(dir: &Path, snapshot: &Snapshot) -> Result<PathBuf, HarnessError> {
    write_json(
        dir,
        &format!("{}.json", snapshot.name),
        &SnapshotReport::from(snapshot),
    )
}

/// Write a snapshot diff to `dir/<from>_<to>.json`
pub fn write_diff_report(dir: &Path, diff: &SnapshotDiff) -> Result<PathBuf, HarnessError> {
    write_json(dir, &format!("{}_{}.json", diff.from, diff.to), diff)
}

/// Write the raw storage writes of a payload to `dir/<name>_state_diff.json`
pub fn write_state_diff(
    dir: &Path,
    name: &str,
    writes: &[StorageWrite],
) -> Result<PathBuf, HarnessError> {
    let report: Vec<StorageWriteReport> = writes
        .iter()
        .map(|write| StorageWriteReport {
            account: &write.account,
            slot: &write.slot,
            previous: &write.previous,
            new: &write.new,
        })
        .collect();
    write_json(dir, &format!("{}_state_diff.json", name), &report)
}
