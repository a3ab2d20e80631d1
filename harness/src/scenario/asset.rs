use log::{debug, info};
use soroban_sdk::Address;

use crate::{
    checkpoint::with_rollback,
    config::HarnessConfig,
    constants::{
        COLLATERAL_SUPPLIER_INDEX, CRUSHED_COLLATERAL_FACTOR, LIQUIDATOR_INDEX, MAX_AMOUNT,
        PRICE_SPIKE_MULTIPLIER, TEST_ASSET_SUPPLIER_INDEX,
    },
    errors::{HarnessError, PoolError},
    oracle::token_amount_by_dollar_value,
    pool::{FlashLoanMode, PoolDriver},
    reserve::ReserveConfig,
};

use super::actions::{
    borrow, deposit, expect_revert, flash_loan, liquidate, repay, require_success, withdraw,
};

/// The scenario run against a single reserve, borrowing against a reference collateral
#[derive(Debug)]
pub struct AssetScenario<'a> {
    config: &'a HarnessConfig,
    collateral: &'a ReserveConfig,
    test_asset: &'a ReserveConfig,
    flash_loan_receiver: &'a Address,
    collateral_supplier: Address,
    test_asset_supplier: Address,
    liquidator: Address,
    collateral_amount: i128,
    test_asset_amount: i128,
    excluded: bool,
}

impl<'a> AssetScenario<'a> {
    /// Resolve the accounts and token amounts used by the scenario
    ///
    /// ### Errors
    /// If the collateral reserve cannot be used as collateral, or a price is unusable
    pub fn prepare<P: PoolDriver>(
        pool: &mut P,
        config: &'a HarnessConfig,
        collateral: &'a ReserveConfig,
        test_asset: &'a ReserveConfig,
        flash_loan_receiver: &'a Address,
    ) -> Result<Self, HarnessError> {
        if !collateral.usage_as_collateral_enabled {
            return Err(HarnessError::CollateralNotUsable);
        }
        let collateral_amount = token_amount_by_dollar_value(
            &*pool,
            &collateral.underlying,
            collateral.decimals,
            config.collateral_value,
        )?;
        let test_asset_amount = token_amount_by_dollar_value(
            &*pool,
            &test_asset.underlying,
            test_asset.decimals,
            config.test_asset_value,
        )?;
        Ok(AssetScenario {
            config,
            collateral,
            test_asset,
            flash_loan_receiver,
            collateral_supplier: pool.test_account(COLLATERAL_SUPPLIER_INDEX),
            test_asset_supplier: pool.test_account(TEST_ASSET_SUPPLIER_INDEX),
            liquidator: pool.test_account(LIQUIDATOR_INDEX),
            collateral_amount,
            test_asset_amount,
            excluded: config.is_excluded_stablecoin(&test_asset.underlying),
        })
    }

    /// Run every step that applies to the reserve under test
    ///
    /// Leaves the pool in the post-scenario state. The caller is expected to roll it back.
    pub fn run<P: PoolDriver>(&self, pool: &mut P) -> Result<(), HarnessError> {
        info!(
            "E2E: Collateral {}, TestAsset {}",
            self.collateral.symbol, self.test_asset.symbol
        );
        self.strip_caps(pool, self.collateral)?;
        self.strip_caps(pool, self.test_asset)?;

        deposit(
            pool,
            self.collateral,
            &self.collateral_supplier,
            self.collateral_amount,
        )?;
        if !self.excluded {
            deposit(
                pool,
                self.test_asset,
                &self.test_asset_supplier,
                self.test_asset_amount,
            )?;
            with_rollback(pool, |pool| self.cap_enforcement(pool))?;
            with_rollback(pool, |pool| self.withdrawals(pool))?;
        }
        if self.test_asset.borrowing_enabled {
            with_rollback(pool, |pool| self.borrow_and_repay(pool))?;
            with_rollback(pool, |pool| self.liquidations(pool))?;
        }
        if self.test_asset.is_flashloanable {
            self.flash_loans(pool)?;
        }
        Ok(())
    }

    fn strip_caps<P: PoolDriver>(
        &self,
        pool: &mut P,
        reserve: &ReserveConfig,
    ) -> Result<(), HarnessError> {
        require_success(pool.set_supply_cap(&reserve.underlying, 0), "set supply cap", reserve)?;
        require_success(pool.set_borrow_cap(&reserve.underlying, 0), "set borrow cap", reserve)
    }

    /// Caps set one whole token above current usage must reject a further whole token
    fn cap_enforcement<P: PoolDriver>(&self, pool: &mut P) -> Result<(), HarnessError> {
        let reserve = self.test_asset;
        let scalar = reserve.scalar()?;
        let probe = scalar + 1;

        if reserve.borrowing_enabled {
            let liquidity = pool.balance(&reserve.underlying, &reserve.b_token);
            if liquidity < probe {
                let factor = probe / self.test_asset_amount + 1;
                debug!("cap probe {}: topping up liquidity by {}x", reserve.symbol, factor);
                deposit(
                    pool,
                    self.collateral,
                    &self.collateral_supplier,
                    self.collateral_amount * factor,
                )?;
                deposit(
                    pool,
                    reserve,
                    &self.test_asset_supplier,
                    self.test_asset_amount * factor,
                )?;
            }
        }

        let supply_cap = whole_tokens_above(pool.total_supply(&reserve.b_token), scalar)?;
        let borrow_cap = whole_tokens_above(pool.total_supply(&reserve.d_token), scalar)?;
        require_success(
            pool.set_supply_cap(&reserve.underlying, supply_cap),
            "set supply cap",
            reserve,
        )?;
        require_success(
            pool.set_borrow_cap(&reserve.underlying, borrow_cap),
            "set borrow cap",
            reserve,
        )?;

        pool.mint(&reserve.underlying, &self.test_asset_supplier, probe);
        let result = pool.supply(&self.test_asset_supplier, &reserve.underlying, probe);
        expect_revert(result, PoolError::SupplyCapExceeded, "supply over cap", reserve)?;
        if reserve.borrowing_enabled {
            let result = pool.borrow(&self.collateral_supplier, &reserve.underlying, probe);
            expect_revert(result, PoolError::BorrowCapExceeded, "borrow over cap", reserve)?;
        }
        Ok(())
    }

    fn withdrawals<P: PoolDriver>(&self, pool: &mut P) -> Result<(), HarnessError> {
        withdraw(
            pool,
            self.test_asset,
            &self.test_asset_supplier,
            self.test_asset_amount / 2,
        )?;
        withdraw(pool, self.test_asset, &self.test_asset_supplier, MAX_AMOUNT)
    }

    fn borrow_and_repay<P: PoolDriver>(&self, pool: &mut P) -> Result<(), HarnessError> {
        let user = &self.collateral_supplier;
        borrow(pool, self.test_asset, user, self.test_asset_amount)?;
        with_rollback(pool, |pool| {
            repay(pool, self.test_asset, user, self.test_asset_amount, false)
        })?;
        if !self.excluded {
            deposit(pool, self.test_asset, user, self.test_asset_amount)?;
            repay(pool, self.test_asset, user, self.test_asset_amount, true)?;
        }
        Ok(())
    }

    fn liquidations<P: PoolDriver>(&self, pool: &mut P) -> Result<(), HarnessError> {
        let user = &self.collateral_supplier;
        borrow(pool, self.test_asset, user, self.test_asset_amount)?;
        if self.collateral.underlying != self.test_asset.underlying {
            let price = pool.asset_price(&self.test_asset.underlying);
            pool.set_asset_price(&self.test_asset.underlying, price * PRICE_SPIKE_MULTIPLIER);
        } else {
            require_success(
                pool.configure_collateral(
                    &self.collateral.underlying,
                    CRUSHED_COLLATERAL_FACTOR,
                    CRUSHED_COLLATERAL_FACTOR,
                    self.collateral.liquidation_bonus,
                ),
                "configure collateral",
                self.collateral,
            )?;
        }
        with_rollback(pool, |pool| {
            liquidate(
                pool,
                self.collateral,
                self.test_asset,
                &self.liquidator,
                user,
                false,
            )
        })?;
        liquidate(
            pool,
            self.collateral,
            self.test_asset,
            &self.liquidator,
            user,
            true,
        )
    }

    fn flash_loans<P: PoolDriver>(&self, pool: &mut P) -> Result<(), HarnessError> {
        flash_loan(
            pool,
            self.test_asset,
            self.flash_loan_receiver,
            &self.collateral_supplier,
            self.test_asset_amount,
            FlashLoanMode::NoDebt,
        )?;
        if self.test_asset.borrowing_enabled {
            flash_loan(
                pool,
                self.test_asset,
                self.flash_loan_receiver,
                &self.collateral_supplier,
                self.test_asset_amount,
                FlashLoanMode::VariableDebt,
            )?;
        }
        Ok(())
    }
}

/// Whole-token count one above `total` base units
fn whole_tokens_above(total: i128, scalar: i128) -> Result<u64, HarnessError> {
    cast::u64(total / scalar + 1).map_err(|_| HarnessError::ArithmeticError)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_tokens_above() {
        assert_eq!(whole_tokens_above(0, 1_0000000).unwrap(), 1);
        assert_eq!(whole_tokens_above(1_0000000, 1_0000000).unwrap(), 2);
        assert_eq!(whole_tokens_above(1_9999999, 1_0000000).unwrap(), 2);
        assert_eq!(
            whole_tokens_above(-5_0000000, 1_0000000),
            Err(HarnessError::ArithmeticError)
        );
    }
}
