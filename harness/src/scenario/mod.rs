//! End-to-end scenarios run against every eligible reserve of a pool

mod actions;
mod asset;

pub use actions::{borrow, deposit, flash_loan, liquidate, repay, withdraw};
pub use asset::AssetScenario;

use log::{info, warn};
use soroban_sdk::Address;

use crate::{
    checkpoint::with_rollback, config::HarnessConfig, errors::HarnessError, pool::PoolDriver,
    reserve::ReserveConfig, snapshot::read_reserve_configs,
};

/// Drives the per-asset scenario over a pool's reserves
pub struct E2eDriver<'a> {
    config: &'a HarnessConfig,
    flash_loan_receiver: Option<Address>,
}

impl<'a> E2eDriver<'a> {
    pub fn new(config: &'a HarnessConfig) -> Self {
        E2eDriver {
            config,
            flash_loan_receiver: None,
        }
    }

    /// The flash loan receiver, deployed on first use
    pub fn flash_loan_receiver<P: PoolDriver>(&mut self, pool: &mut P) -> Address {
        self.flash_loan_receiver
            .get_or_insert_with(|| pool.deploy_flash_loan_receiver())
            .clone()
    }

    /// Run the scenario against every eligible reserve currently listed on the pool
    pub fn run_current<P: PoolDriver>(&mut self, pool: &mut P) -> Result<(), HarnessError> {
        let reserves = read_reserve_configs(&*pool)?;
        self.run(pool, &reserves)
    }

    /// Run the scenario against every eligible reserve in `reserves`
    ///
    /// The pool is restored after each reserve, so every scenario starts from the state the
    /// pool was in when this was called.
    ///
    /// ### Arguments
    /// * `pool` - The pool under test
    /// * `reserves` - The reserve configurations of the pool
    ///
    /// ### Errors
    /// If no reserve can serve as collateral, or any scenario step fails
    pub fn run<P: PoolDriver>(
        &mut self,
        pool: &mut P,
        reserves: &[ReserveConfig],
    ) -> Result<(), HarnessError> {
        let receiver = self.flash_loan_receiver(pool);
        let collateral = select_collateral(reserves)?;
        info!("E2E: using {} as collateral", collateral.symbol);

        for reserve in reserves {
            if !reserve.is_eligible() {
                warn!("E2E: skipping {}, reserve is inactive, frozen or paused", reserve.symbol);
                continue;
            }
            with_rollback(pool, |pool| {
                AssetScenario::prepare(pool, self.config, collateral, reserve, &receiver)?.run(pool)
            })?;
        }
        Ok(())
    }
}

/// Pick the first eligible reserve usable as collateral outside of isolation mode
///
/// ### Errors
/// If no reserve qualifies
pub fn select_collateral(reserves: &[ReserveConfig]) -> Result<&ReserveConfig, HarnessError> {
    reserves
        .iter()
        .find(|reserve| reserve.is_reference_collateral())
        .ok_or(HarnessError::NoCollateralFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reserve::tests::default_reserve_config;
    use soroban_sdk::Env;

    #[test]
    fn test_select_collateral_skips_isolated_and_ineligible() {
        let e = Env::default();
        let mut frozen = default_reserve_config(&e, "FRZ");
        frozen.is_frozen = true;
        let mut isolated = default_reserve_config(&e, "ISO");
        isolated.debt_ceiling = 1_000;
        let mut zero_ltv = default_reserve_config(&e, "ZLTV");
        zero_ltv.ltv = 0;
        let weth = default_reserve_config(&e, "WETH");

        let reserves = [frozen, isolated, zero_ltv, weth];
        let collateral = select_collateral(&reserves).unwrap();
        assert_eq!(collateral.symbol, "WETH");
    }

    #[test]
    fn test_select_collateral_none_found() {
        let e = Env::default();
        let mut usdc = default_reserve_config(&e, "USDC");
        usdc.usage_as_collateral_enabled = false;

        let reserves = [usdc];
        let result = select_collateral(&reserves);
        assert_eq!(result.err(), Some(HarnessError::NoCollateralFound));
    }
}
