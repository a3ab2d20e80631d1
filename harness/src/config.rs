use std::path::PathBuf;

use soroban_sdk::Address;

use crate::constants::{
    COLLATERAL_DOLLAR_VALUE, DEFAULT_BLOCK_RESOURCE_LIMIT, DEFAULT_REPORTS_DIR, EMODE_SCAN_LIMIT,
    MAX_CONSECUTIVE_EMPTY_EMODES, TEST_ASSET_DOLLAR_VALUE,
};

/// Configuration for a harness run
#[derive(Clone, Debug)]
pub struct HarnessConfig {
    pub reports_dir: PathBuf,      // directory the json reports are written to
    pub write_reports: bool,       // write reports to `reports_dir`
    pub run_e2e: bool,             // run the scenario driver after the plausibility checks
    pub block_resource_limit: u64, // resource limit of a single block
    pub collateral_value: i128,    // dollar value supplied as collateral
    pub test_asset_value: i128,    // dollar value of the asset under test
    pub emode_scan_limit: u32,     // exclusive upper bound of e-mode ids to probe
    pub max_consecutive_empty_emodes: u32,
    /// A stablecoin minted by the pool rather than supplied to it. It is never supplied during
    /// scenarios and is exempt from the borrow cap <= supply cap rule.
    pub excluded_stablecoin: Option<Address>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        HarnessConfig {
            reports_dir: PathBuf::from(DEFAULT_REPORTS_DIR),
            write_reports: true,
            run_e2e: true,
            block_resource_limit: DEFAULT_BLOCK_RESOURCE_LIMIT,
            collateral_value: COLLATERAL_DOLLAR_VALUE,
            test_asset_value: TEST_ASSET_DOLLAR_VALUE,
            excluded_stablecoin: None,
            emode_scan_limit: EMODE_SCAN_LIMIT,
            max_consecutive_empty_emodes: MAX_CONSECUTIVE_EMPTY_EMODES,
        }
    }
}

impl HarnessConfig {
    /// Check if `asset` is the stablecoin excluded from supply based checks
    pub fn is_excluded_stablecoin(&self, asset: &Address) -> bool {
        self.excluded_stablecoin.as_ref() == Some(asset)
    }
}
