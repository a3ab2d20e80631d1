/// Decimals used by the price oracle
pub const PRICE_DECIMALS: u32 = 8;

/// 100% expressed in basis points
pub const PERCENTAGE_FACTOR: i128 = 10_000;

/// 1.0 expressed in 27 decimals
pub const RAY: u128 = 1_000_000_000_000_000_000_000_000_000;

/// Scale to move a basis point value into 27 decimals
pub const BPS_TO_RAY: u128 = 100_000_000_000_000_000_000_000;

/// Amount used to request "everything" from withdraw, repay and liquidate
pub const MAX_AMOUNT: i128 = i128::MAX;

/// Absolute tolerance, in token units, for balance assertions
pub const ROUNDING_TOLERANCE: i128 = 1;

/********** Plausibility **********/

/// Factor applied to a new listing's supply cap before comparing it with the token supply
pub const SUPPLY_CAP_TOLERANCE: u64 = 100;

/********** Snapshot **********/

/// Exclusive upper bound of the e-mode category id range
pub const EMODE_SCAN_LIMIT: u32 = 256;

/// Consecutive empty e-mode categories tolerated before the scan assumes the used range ended.
///
/// Only applied when the pool cannot report how many categories exist. Assumes categories are
/// allocated densely, so a deployment with a larger gap between live categories is truncated.
pub const MAX_CONSECUTIVE_EMPTY_EMODES: u32 = 2;

/********** Scenarios **********/

/// Dollar value supplied as collateral for every scenario
pub const COLLATERAL_DOLLAR_VALUE: i128 = 100_000;

/// Dollar value of the asset under test supplied and borrowed in every scenario
pub const TEST_ASSET_DOLLAR_VALUE: i128 = 10_000;

/// Multiplier applied to the debt asset price to force a position underwater
pub const PRICE_SPIKE_MULTIPLIER: i128 = 10;

/// LTV and liquidation threshold, in bps, used to force a same-asset position underwater
pub const CRUSHED_COLLATERAL_FACTOR: u32 = 5;

pub const COLLATERAL_SUPPLIER_INDEX: u32 = 1;
pub const TEST_ASSET_SUPPLIER_INDEX: u32 = 2;
pub const LIQUIDATOR_INDEX: u32 = 3;

/********** Payload **********/

/// Share of the block resource limit, in percent, a payload may consume
pub const PAYLOAD_RESOURCE_LIMIT_PCT: u64 = 95;

/// Resource limit of a single block on the target network
pub const DEFAULT_BLOCK_RESOURCE_LIMIT: u64 = 30_000_000;

pub const DEFAULT_REPORTS_DIR: &str = "./reports";
