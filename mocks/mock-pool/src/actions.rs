use cast::i128;
use harness::{
    constants::{MAX_AMOUNT, PERCENTAGE_FACTOR},
    oracle::percent_mul,
    FlashLoanMode, PoolError,
};
use soroban_fixed_point_math::FixedPoint;
use soroban_sdk::Address;

use crate::{
    positions::{to_amount, to_value, PositionData},
    storage::{MockReserve, PoolState},
};

fn require_positive(amount: i128) -> Result<(), PoolError> {
    if amount <= 0 {
        return Err(PoolError::InvalidAmount);
    }
    Ok(())
}

/// Require the reserve to be active and not paused
fn require_active(reserve: &MockReserve) -> Result<(), PoolError> {
    if !reserve.params.is_active {
        return Err(PoolError::ReserveInactive);
    }
    if reserve.params.is_paused {
        return Err(PoolError::ReservePaused);
    }
    Ok(())
}

/// Require the reserve to accept new supply and debt
fn require_not_frozen(reserve: &MockReserve) -> Result<(), PoolError> {
    require_active(reserve)?;
    if reserve.params.is_frozen {
        return Err(PoolError::ReserveFrozen);
    }
    Ok(())
}

/// Check if `total + amount` exceeds a cap in whole tokens. A cap of 0 is uncapped.
fn exceeds_cap(total: i128, amount: i128, cap: u64, reserve: &MockReserve) -> bool {
    cap != 0 && total + amount > i128(cap) * reserve.scalar()
}

impl PoolState {
    pub fn supply(
        &mut self,
        from: &Address,
        asset: &Address,
        amount: i128,
    ) -> Result<(), PoolError> {
        require_positive(amount)?;
        let reserve = self.reserve(asset)?.clone();
        require_not_frozen(&reserve)?;
        let b_supply = self.total_supply(&reserve.tokens.b_token);
        if !self.faults.skip_cap_checks
            && exceeds_cap(b_supply, amount, reserve.params.supply_cap, &reserve)
        {
            return Err(PoolError::SupplyCapExceeded);
        }

        self.transfer(asset, from, &reserve.tokens.b_token, amount)
            .map_err(|_| PoolError::NotEnoughAvailableUserBalance)?;
        self.mint(&reserve.tokens.b_token, from, amount);
        Ok(())
    }

    pub fn withdraw(
        &mut self,
        from: &Address,
        asset: &Address,
        amount: i128,
    ) -> Result<i128, PoolError> {
        require_positive(amount)?;
        let reserve = self.reserve(asset)?.clone();
        require_active(&reserve)?;
        let balance = self.balance(&reserve.tokens.b_token, from);
        let amount = if amount == MAX_AMOUNT {
            balance - self.faults.withdraw_dust
        } else {
            amount
        };
        if amount <= 0 || amount > balance {
            return Err(PoolError::NotEnoughAvailableUserBalance);
        }
        if self.balance(asset, &reserve.tokens.b_token) < amount {
            return Err(PoolError::InsufficientLiquidity);
        }

        self.burn(&reserve.tokens.b_token, from, amount)?;
        self.transfer(asset, &reserve.tokens.b_token, from, amount)?;
        if PositionData::calculate(self, from)?.is_liquidatable() {
            return Err(PoolError::HealthFactorBelowThreshold);
        }
        Ok(amount)
    }

    /// Borrow `amount` of `asset` against `from`'s collateral
    ///
    /// Flags are checked first, then the borrow cap, then liquidity and finally collateral.
    pub fn borrow(
        &mut self,
        from: &Address,
        to: &Address,
        asset: &Address,
        amount: i128,
    ) -> Result<(), PoolError> {
        require_positive(amount)?;
        let reserve = self.reserve(asset)?.clone();
        self.open_debt(&reserve, from, amount)?;
        if self.balance(asset, &reserve.tokens.b_token) < amount {
            return Err(PoolError::InsufficientLiquidity);
        }
        self.transfer(asset, &reserve.tokens.b_token, to, amount)?;
        self.require_debt_covered(from)
    }

    pub fn repay(
        &mut self,
        from: &Address,
        asset: &Address,
        amount: i128,
    ) -> Result<i128, PoolError> {
        require_positive(amount)?;
        let reserve = self.reserve(asset)?.clone();
        require_active(&reserve)?;
        let debt = self.balance(&reserve.tokens.d_token, from);
        if debt == 0 {
            return Err(PoolError::NoDebtToRepay);
        }
        let repaid = amount.min(debt);

        self.transfer(asset, from, &reserve.tokens.b_token, repaid)
            .map_err(|_| PoolError::NotEnoughAvailableUserBalance)?;
        self.burn(&reserve.tokens.d_token, from, repaid)?;
        Ok(repaid)
    }

    /// Repay debt by burning b-tokens of the same reserve. `MAX_AMOUNT` repays as much as the
    /// b-token balance covers.
    pub fn repay_with_b_tokens(
        &mut self,
        from: &Address,
        asset: &Address,
        amount: i128,
    ) -> Result<i128, PoolError> {
        require_positive(amount)?;
        let reserve = self.reserve(asset)?.clone();
        require_active(&reserve)?;
        let debt = self.balance(&reserve.tokens.d_token, from);
        if debt == 0 {
            return Err(PoolError::NoDebtToRepay);
        }
        let b_token_balance = self.balance(&reserve.tokens.b_token, from);
        let mut repaid = amount.min(debt);
        if amount == MAX_AMOUNT {
            repaid = repaid.min(b_token_balance);
        }
        if repaid == 0 || repaid > b_token_balance {
            return Err(PoolError::NotEnoughAvailableUserBalance);
        }

        self.burn(&reserve.tokens.b_token, from, repaid)?;
        self.burn(&reserve.tokens.d_token, from, repaid)?;
        Ok(repaid)
    }

    /// Repay up to `debt_to_cover` of an unhealthy user's debt in exchange for their collateral
    /// plus the liquidation bonus
    ///
    /// At most half the debt can be repaid while the health factor is above 0.95. If the
    /// user's collateral cannot cover the bonus, all of it is seized and the repaid debt is
    /// scaled down to match. The protocol fee is taken from the bonus and paid to the treasury
    /// in b-tokens.
    #[allow(clippy::too_many_arguments)]
    pub fn liquidate(
        &mut self,
        treasury: &Address,
        liquidator: &Address,
        collateral_asset: &Address,
        debt_asset: &Address,
        user: &Address,
        debt_to_cover: i128,
        receive_b_token: bool,
    ) -> Result<(), PoolError> {
        require_positive(debt_to_cover)?;
        let collateral = self.reserve(collateral_asset)?.clone();
        let debt = self.reserve(debt_asset)?.clone();
        require_active(&collateral)?;
        require_active(&debt)?;

        let position = PositionData::calculate(self, user)?;
        if !position.is_liquidatable() {
            return Err(PoolError::HealthFactorNotBelowThreshold);
        }
        let user_debt = self.balance(&debt.tokens.d_token, user);
        if user_debt == 0 {
            return Err(PoolError::NoDebtToRepay);
        }
        let user_collateral = self.balance(&collateral.tokens.b_token, user);
        if user_collateral == 0
            || collateral.params.liquidation_threshold == 0
            || !collateral.params.usage_as_collateral_enabled
        {
            return Err(PoolError::NoCollateralToLiquidate);
        }

        let max_debt = if position.is_close_factor_limited() {
            user_debt / 2
        } else {
            user_debt
        };
        let bonus = i128(collateral.params.liquidation_bonus);
        let debt_price = self.price(debt_asset);
        let collateral_price = self.price(collateral_asset);

        let mut debt_repaid = debt_to_cover.min(max_debt);
        let seized_value = to_value(debt_price, debt_repaid, &debt)?
            .fixed_mul_floor(bonus, PERCENTAGE_FACTOR)
            .ok_or(PoolError::InternalError)?;
        let mut seized = to_amount(collateral_price, seized_value, &collateral)?;
        if seized > user_collateral {
            seized = user_collateral;
            let repaid_value = to_value(collateral_price, seized, &collateral)?
                .fixed_div_floor(bonus, PERCENTAGE_FACTOR)
                .ok_or(PoolError::InternalError)?;
            debt_repaid = to_amount(debt_price, repaid_value, &debt)?;
        }
        if debt_repaid == 0 {
            return Err(PoolError::InvalidAmount);
        }
        let seized_bonus = seized
            - seized
                .fixed_div_floor(bonus, PERCENTAGE_FACTOR)
                .ok_or(PoolError::InternalError)?;
        let protocol_fee = percent_mul(seized_bonus, collateral.params.liquidation_protocol_fee);
        let received = seized - protocol_fee;

        self.transfer(debt_asset, liquidator, &debt.tokens.b_token, debt_repaid)
            .map_err(|_| PoolError::NotEnoughAvailableUserBalance)?;
        if !self.faults.skip_liquidation_debt_burn {
            self.burn(&debt.tokens.d_token, user, debt_repaid)?;
        }
        self.burn(&collateral.tokens.b_token, user, seized)?;
        if protocol_fee > 0 {
            self.mint(&collateral.tokens.b_token, treasury, protocol_fee);
        }
        if receive_b_token {
            self.mint(&collateral.tokens.b_token, liquidator, received);
        } else {
            if self.balance(collateral_asset, &collateral.tokens.b_token) < received {
                return Err(PoolError::InsufficientLiquidity);
            }
            self.transfer(
                collateral_asset,
                &collateral.tokens.b_token,
                liquidator,
                received,
            )?;
        }
        Ok(())
    }

    /// Lend `amount` of `asset` to `receiver` for the duration of the call
    ///
    /// `FlashLoanMode::NoDebt` pulls back `amount` plus the premium from the receiver, and the
    /// premium accrues to the treasury. `FlashLoanMode::VariableDebt` leaves the funds with the
    /// receiver and opens the same amount of debt for `on_behalf_of`.
    pub fn flash_loan(
        &mut self,
        treasury: &Address,
        receiver: &Address,
        asset: &Address,
        amount: i128,
        mode: FlashLoanMode,
        on_behalf_of: &Address,
    ) -> Result<(), PoolError> {
        require_positive(amount)?;
        let reserve = self.reserve(asset)?.clone();
        require_active(&reserve)?;
        if !reserve.params.is_flashloanable {
            return Err(PoolError::FlashLoanDisabled);
        }
        if self.balance(asset, &reserve.tokens.b_token) < amount {
            return Err(PoolError::InsufficientLiquidity);
        }
        self.transfer(asset, &reserve.tokens.b_token, receiver, amount)?;

        match mode {
            FlashLoanMode::NoDebt => {
                let premium_bps = self
                    .faults
                    .charged_flash_loan_premium
                    .unwrap_or(self.flash_loan_premium_total);
                let premium = percent_mul(amount, premium_bps);
                self.transfer(asset, receiver, &reserve.tokens.b_token, amount + premium)?;
                if premium > 0 {
                    self.mint(&reserve.tokens.b_token, treasury, premium);
                }
                Ok(())
            }
            FlashLoanMode::VariableDebt => {
                self.open_debt(&reserve, on_behalf_of, amount)?;
                self.require_debt_covered(on_behalf_of)
            }
        }
    }

    fn open_debt(
        &mut self,
        reserve: &MockReserve,
        user: &Address,
        amount: i128,
    ) -> Result<(), PoolError> {
        require_not_frozen(reserve)?;
        if !reserve.params.borrowing_enabled {
            return Err(PoolError::BorrowingNotEnabled);
        }
        let d_supply = self.total_supply(&reserve.tokens.d_token);
        if !self.faults.skip_cap_checks
            && exceeds_cap(d_supply, amount, reserve.params.borrow_cap, reserve)
        {
            return Err(PoolError::BorrowCapExceeded);
        }
        self.mint(&reserve.tokens.d_token, user, amount);
        Ok(())
    }

    fn require_debt_covered(&self, user: &Address) -> Result<(), PoolError> {
        if !PositionData::calculate(self, user)?.can_cover_debt() {
            return Err(PoolError::CollateralCannotCoverBorrow);
        }
        Ok(())
    }
}
