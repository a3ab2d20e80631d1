use log::{debug, error};
use soroban_sdk::Address;

use crate::{
    constants::{MAX_AMOUNT, ROUNDING_TOLERANCE},
    errors::{HarnessError, PoolError},
    oracle::{approx_eq_abs, percent_mul},
    pool::{FlashLoanMode, PoolDriver},
    reserve::ReserveConfig,
};

/// Unwrap the result of a pool call that is expected to succeed
pub(crate) fn require_success<T>(
    result: Result<T, PoolError>,
    action: &str,
    reserve: &ReserveConfig,
) -> Result<T, HarnessError> {
    result.map_err(|err| {
        error!("{} {} failed: {}", action, reserve.symbol, err);
        HarnessError::PoolOperationFailed
    })
}

/// Require that a pool call reverted with `expected`
pub(crate) fn expect_revert<T>(
    result: Result<T, PoolError>,
    expected: PoolError,
    action: &str,
    reserve: &ReserveConfig,
) -> Result<(), HarnessError> {
    match result {
        Err(err) if err == expected => Ok(()),
        Err(err) => {
            error!(
                "{} {} reverted with {}, expected {}",
                action, reserve.symbol, err, expected
            );
            Err(HarnessError::ExpectedRevert)
        }
        Ok(_) => {
            error!("{} {} succeeded, expected {}", action, reserve.symbol, expected);
            Err(HarnessError::ExpectedRevert)
        }
    }
}

/// Mint `amount` of the reserve's underlying to `user` and supply it
///
/// ### Errors
/// If the supply fails or the user's b-token balance does not grow by `amount`
pub fn deposit<P: PoolDriver>(
    pool: &mut P,
    reserve: &ReserveConfig,
    user: &Address,
    amount: i128,
) -> Result<(), HarnessError> {
    debug!("SUPPLY: {}, Amount: {}", reserve.symbol, amount);
    pool.mint(&reserve.underlying, user, amount);
    let balance_before = pool.balance(&reserve.b_token, user);
    require_success(
        pool.supply(user, &reserve.underlying, amount),
        "supply",
        reserve,
    )?;
    let balance_after = pool.balance(&reserve.b_token, user);
    if !approx_eq_abs(balance_after, balance_before + amount, ROUNDING_TOLERANCE) {
        error!(
            "supply {}: b-token balance {} expected {}",
            reserve.symbol,
            balance_after,
            balance_before + amount
        );
        return Err(HarnessError::DepositMismatch);
    }
    Ok(())
}

/// Withdraw `amount` of the reserve's underlying for `user`
///
/// Requesting more than the user's balance, such as `MAX_AMOUNT`, must leave the balance at
/// exactly zero. Otherwise the balance must drop by `amount`.
///
/// ### Errors
/// If the withdrawal fails or the resulting balance is wrong
pub fn withdraw<P: PoolDriver>(
    pool: &mut P,
    reserve: &ReserveConfig,
    user: &Address,
    amount: i128,
) -> Result<(), HarnessError> {
    debug!("WITHDRAW: {}, Amount: {}", reserve.symbol, amount);
    let balance_before = pool.balance(&reserve.b_token, user);
    require_success(
        pool.withdraw(user, &reserve.underlying, amount),
        "withdraw",
        reserve,
    )?;
    let balance_after = pool.balance(&reserve.b_token, user);
    if balance_before < amount {
        if balance_after != 0 {
            error!(
                "withdraw {}: b-token balance {} must be zero",
                reserve.symbol, balance_after
            );
            return Err(HarnessError::WithdrawNotZero);
        }
    } else if !approx_eq_abs(balance_after, balance_before - amount, ROUNDING_TOLERANCE) {
        error!(
            "withdraw {}: b-token balance {} expected {}",
            reserve.symbol,
            balance_after,
            balance_before - amount
        );
        return Err(HarnessError::WithdrawMismatch);
    }
    Ok(())
}

/// Borrow `amount` of the reserve's underlying for `user`
///
/// ### Errors
/// If the borrow fails or the user's debt does not grow by `amount`
pub fn borrow<P: PoolDriver>(
    pool: &mut P,
    reserve: &ReserveConfig,
    user: &Address,
    amount: i128,
) -> Result<(), HarnessError> {
    debug!("BORROW: {}, Amount: {}", reserve.symbol, amount);
    let debt_before = pool.balance(&reserve.d_token, user);
    require_success(
        pool.borrow(user, &reserve.underlying, amount),
        "borrow",
        reserve,
    )?;
    let debt_after = pool.balance(&reserve.d_token, user);
    if !approx_eq_abs(debt_after, debt_before + amount, ROUNDING_TOLERANCE) {
        error!(
            "borrow {}: debt {} expected {}",
            reserve.symbol,
            debt_after,
            debt_before + amount
        );
        return Err(HarnessError::BorrowMismatch);
    }
    Ok(())
}

/// Repay `amount` of `user`'s debt, with underlying tokens or with b-tokens of the same reserve
///
/// Repaying at least the outstanding debt must clear it exactly. Otherwise the debt must drop
/// by `amount`.
///
/// ### Errors
/// If the repayment fails or the resulting debt is wrong
pub fn repay<P: PoolDriver>(
    pool: &mut P,
    reserve: &ReserveConfig,
    user: &Address,
    amount: i128,
    with_b_tokens: bool,
) -> Result<(), HarnessError> {
    debug!(
        "REPAY: {}, Amount: {}, With b-tokens: {}",
        reserve.symbol, amount, with_b_tokens
    );
    let debt_before = pool.balance(&reserve.d_token, user);
    let result = if with_b_tokens {
        pool.repay_with_b_tokens(user, &reserve.underlying, amount)
    } else {
        pool.mint(&reserve.underlying, user, amount.min(debt_before));
        pool.repay(user, &reserve.underlying, amount)
    };
    require_success(result, "repay", reserve)?;
    let debt_after = pool.balance(&reserve.d_token, user);
    if amount >= debt_before {
        if debt_after != 0 {
            error!("repay {}: debt {} must be zero", reserve.symbol, debt_after);
            return Err(HarnessError::RepayNotZero);
        }
    } else if !approx_eq_abs(debt_after, debt_before - amount, ROUNDING_TOLERANCE) {
        error!(
            "repay {}: debt {} expected {}",
            reserve.symbol,
            debt_after,
            debt_before - amount
        );
        return Err(HarnessError::RepayMismatch);
    }
    Ok(())
}

/// Liquidate as much of `user`'s debt in `debt` as the pool allows, seizing `collateral`
///
/// ### Errors
/// If the liquidation fails or the user's debt did not strictly decrease
pub fn liquidate<P: PoolDriver>(
    pool: &mut P,
    collateral: &ReserveConfig,
    debt: &ReserveConfig,
    liquidator: &Address,
    user: &Address,
    receive_b_token: bool,
) -> Result<(), HarnessError> {
    debug!(
        "LIQUIDATE: Collateral {}, Debt {}, Receive b-token: {}",
        collateral.symbol, debt.symbol, receive_b_token
    );
    let debt_before = pool.balance(&debt.d_token, user);
    pool.mint(&debt.underlying, liquidator, debt_before);
    require_success(
        pool.liquidate(
            liquidator,
            &collateral.underlying,
            &debt.underlying,
            user,
            MAX_AMOUNT,
            receive_b_token,
        ),
        "liquidate",
        debt,
    )?;
    let debt_after = pool.balance(&debt.d_token, user);
    if debt_after >= debt_before {
        error!(
            "liquidate {}: debt {} not below {}",
            debt.symbol, debt_after, debt_before
        );
        return Err(HarnessError::LiquidationDebtNotReduced);
    }
    Ok(())
}

/// Flash loan `amount` of the reserve's underlying through `receiver`
///
/// A no-debt flash loan must grow the pool's held balance by exactly the premium and leave
/// debt untouched. A variable debt flash loan must shrink the held balance by `amount` and
/// grow `user`'s debt by `amount`.
///
/// ### Errors
/// If the flash loan fails or the balances are wrong
pub fn flash_loan<P: PoolDriver>(
    pool: &mut P,
    reserve: &ReserveConfig,
    receiver: &Address,
    user: &Address,
    amount: i128,
    mode: FlashLoanMode,
) -> Result<(), HarnessError> {
    debug!(
        "FLASH LOAN: {}, Amount: {}, Mode: {:?}",
        reserve.symbol, amount, mode
    );
    let held_before = pool.balance(&reserve.underlying, &reserve.b_token);
    let debt_before = pool.balance(&reserve.d_token, user);
    let premium = match mode {
        FlashLoanMode::NoDebt => percent_mul(amount, pool.flash_loan_premium_total()),
        FlashLoanMode::VariableDebt => 0,
    };
    if premium > 0 {
        pool.mint(&reserve.underlying, receiver, premium);
    }
    require_success(
        pool.flash_loan(receiver, &reserve.underlying, amount, mode, user),
        "flash loan",
        reserve,
    )?;
    let held_after = pool.balance(&reserve.underlying, &reserve.b_token);
    let debt_after = pool.balance(&reserve.d_token, user);
    match mode {
        FlashLoanMode::NoDebt => {
            if held_after != held_before + premium {
                error!(
                    "flash loan {}: held balance {} expected {}",
                    reserve.symbol,
                    held_after,
                    held_before + premium
                );
                return Err(HarnessError::FlashLoanBalanceMismatch);
            }
            if debt_after != debt_before {
                error!(
                    "flash loan {}: debt changed from {} to {}",
                    reserve.symbol, debt_before, debt_after
                );
                return Err(HarnessError::FlashLoanDebtMismatch);
            }
        }
        FlashLoanMode::VariableDebt => {
            if held_after != held_before - amount {
                error!(
                    "flash loan {}: held balance {} expected {}",
                    reserve.symbol,
                    held_after,
                    held_before - amount
                );
                return Err(HarnessError::FlashLoanBalanceMismatch);
            }
            if !approx_eq_abs(debt_after, debt_before + amount, ROUNDING_TOLERANCE) {
                error!(
                    "flash loan {}: debt {} expected {}",
                    reserve.symbol,
                    debt_after,
                    debt_before + amount
                );
                return Err(HarnessError::FlashLoanDebtMismatch);
            }
        }
    }
    Ok(())
}
