use core::fmt;

use soroban_sdk::contracterror;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
/// Error codes raised by the harness. Each code maps to a stable name reported to the caller.
/// Precondition errors start at 1, plausibility errors at 100, payload errors at 200, probing
/// errors at 300, scenario errors at 400 and report errors at 500.
pub enum HarnessError {
    // Precondition Errors
    NoCollateralFound = 1,
    CollateralNotUsable = 2,
    InvalidPrice = 3,
    ReserveNotFound = 4,
    ArithmeticError = 5,

    // Plausibility Errors (start at 100)
    BorrowCapBorrowDisabled = 100,
    SupplyCapGtTotalSupply = 101,
    SupplyLtBorrow = 102,
    ReserveListChanged = 103,
    ReserveConfigMismatch = 104,
    UnexpectedReserveChange = 105,
    StrategyMismatch = 106,
    MissingPriceSource = 107,
    DuplicateReserve = 108,

    // Payload Errors
    PayloadResourceLimitExceeded = 200,
    PayloadFailed = 201,

    // Probing Errors
    UnsupportedStrategyShape = 300,
    UnsupportedEModeShape = 301,

    // Scenario Errors
    ExpectedRevert = 400,
    DepositMismatch = 401,
    WithdrawNotZero = 402,
    WithdrawMismatch = 403,
    BorrowMismatch = 404,
    RepayNotZero = 405,
    RepayMismatch = 406,
    LiquidationDebtNotReduced = 407,
    FlashLoanBalanceMismatch = 408,
    FlashLoanDebtMismatch = 409,
    PoolOperationFailed = 410,

    // Report Errors
    ReportWriteFailed = 500,
}

impl HarnessError {
    /// The named failure code reported to the caller
    pub fn code(&self) -> &'static str {
        match self {
            HarnessError::NoCollateralFound => "E2E_NO_COLLATERAL_FOUND",
            HarnessError::CollateralNotUsable => "E2E_COLLATERAL_NOT_USABLE",
            HarnessError::InvalidPrice => "ORACLE_INVALID_PRICE",
            HarnessError::ReserveNotFound => "RESERVE_NOT_FOUND",
            HarnessError::ArithmeticError => "ARITHMETIC_ERROR",
            HarnessError::BorrowCapBorrowDisabled => "PL_BORROW_CAP_BORROW_DISABLED",
            HarnessError::SupplyCapGtTotalSupply => "PL_SUPPLY_CAP_GT_TOTAL_SUPPLY",
            HarnessError::SupplyLtBorrow => "PL_SUPPLY_LT_BORROW",
            HarnessError::ReserveListChanged => "PL_RESERVE_LIST_CHANGED",
            HarnessError::ReserveConfigMismatch => "RESERVE_CONFIG_MISMATCH",
            HarnessError::UnexpectedReserveChange => "UNEXPECTED_RESERVE_CHANGE",
            HarnessError::StrategyMismatch => "IR_STRATEGY_MISMATCH",
            HarnessError::MissingPriceSource => "ORACLE_MISSING_PRICE_SOURCE",
            HarnessError::DuplicateReserve => "PL_DUPLICATE_RESERVE",
            HarnessError::PayloadResourceLimitExceeded => "PAYLOAD_RESOURCE_LIMIT_EXCEEDED",
            HarnessError::PayloadFailed => "PAYLOAD_FAILED",
            HarnessError::UnsupportedStrategyShape => "UNSUPPORTED_STRATEGY_SHAPE",
            HarnessError::UnsupportedEModeShape => "UNSUPPORTED_EMODE_SHAPE",
            HarnessError::ExpectedRevert => "E2E_EXPECTED_REVERT",
            HarnessError::DepositMismatch => "E2E_DEPOSIT_BALANCE_MISMATCH",
            HarnessError::WithdrawNotZero => "E2E_WITHDRAW_MUST_BE_ZERO",
            HarnessError::WithdrawMismatch => "E2E_WITHDRAW_BALANCE_MISMATCH",
            HarnessError::BorrowMismatch => "E2E_BORROW_DEBT_MISMATCH",
            HarnessError::RepayNotZero => "E2E_REPAY_MUST_BE_ZERO",
            HarnessError::RepayMismatch => "E2E_REPAY_DEBT_MISMATCH",
            HarnessError::LiquidationDebtNotReduced => "E2E_LIQUIDATION_DEBT_NOT_REDUCED",
            HarnessError::FlashLoanBalanceMismatch => "E2E_FLASHLOAN_BALANCE_MISMATCH",
            HarnessError::FlashLoanDebtMismatch => "E2E_FLASHLOAN_DEBT_MISMATCH",
            HarnessError::PoolOperationFailed => "E2E_POOL_OPERATION_FAILED",
            HarnessError::ReportWriteFailed => "REPORT_WRITE_FAILED",
        }
    }
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl std::error::Error for HarnessError {}

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
/// Revert reasons surfaced by the pool under test.
pub enum PoolError {
    // Common Errors
    InternalError = 1,
    Unsupported = 2,
    UnauthorizedError = 4,
    InvalidAmount = 8,
    BalanceError = 10,

    // Reserve State Errors
    ReserveNotListed = 1200,
    ReserveInactive = 1201,
    ReserveFrozen = 1202,
    ReservePaused = 1203,
    BorrowingNotEnabled = 1204,
    FlashLoanDisabled = 1205,

    // Cap Errors
    SupplyCapExceeded = 1210,
    BorrowCapExceeded = 1211,

    // Position Errors
    NotEnoughAvailableUserBalance = 1220,
    NoDebtToRepay = 1221,
    InsufficientLiquidity = 1222,
    CollateralCannotCoverBorrow = 1223,
    HealthFactorBelowThreshold = 1224,
    HealthFactorNotBelowThreshold = 1225,
    NoCollateralToLiquidate = 1226,
    InvalidFlashLoanMode = 1227,
    InvalidReserveParams = 1228,
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl std::error::Error for PoolError {}
