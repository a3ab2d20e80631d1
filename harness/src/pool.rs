use soroban_sdk::Address;

use crate::errors::PoolError;

/********** Pool Types **********/

/// The tokens and strategy attached to a listed reserve
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReserveTokens {
    pub b_token: Address,       // the interest bearing token minted to suppliers
    pub d_token: Address,       // the variable debt token minted to borrowers
    pub rate_strategy: Address, // the interest rate strategy contract
}

/// The configuration of a listed reserve as stored by the pool
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct ReserveParams {
    pub decimals: u32,
    pub ltv: u32,                      // loan to value, in bps
    pub liquidation_threshold: u32,    // in bps
    pub liquidation_bonus: u32,        // in bps, 10_000 means no bonus
    pub liquidation_protocol_fee: u32, // in bps
    pub reserve_factor: u32,           // in bps
    pub supply_cap: u64,               // in whole tokens, 0 is uncapped
    pub borrow_cap: u64,               // in whole tokens, 0 is uncapped
    pub debt_ceiling: u64,             // isolation mode ceiling, 0 is not isolated
    pub emode_category: u32,
    pub is_active: bool,
    pub is_frozen: bool,
    pub is_paused: bool,
    pub borrowing_enabled: bool,
    pub usage_as_collateral_enabled: bool,
    pub is_flashloanable: bool,
    pub is_siloed: bool,
    pub borrowable_in_isolation: bool,
}

/// Which e-mode record layout a pool exposes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EModeShape {
    /// Collateral and borrowable assets tracked as reserve index bitmaps
    Bitmap,
    /// Assets opt into a category from their own reserve config
    Legacy,
}

/// An e-mode category in the bitmap layout
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct EModeCategoryData {
    pub ltv: u32,
    pub liquidation_threshold: u32,
    pub liquidation_bonus: u32,
    pub label: String,
    pub collateral_bitmap: u128,
    pub borrowable_bitmap: u128,
}

/// An e-mode category in the legacy layout
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LegacyEModeCategoryData {
    pub ltv: u32,
    pub liquidation_threshold: u32,
    pub liquidation_bonus: u32,
    pub price_source: Option<Address>,
    pub label: String,
}

/// Which interest rate strategy layout a strategy contract exposes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrategyShape {
    /// Fixed slope strategy with stable rate parameters, values in ray
    Legacy,
    /// Per-asset variable rate strategy, values in bps
    V2,
}

/// Parameters of a legacy fixed slope strategy, expressed in ray
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct LegacyStrategyParams {
    pub optimal_usage_ratio: u128,
    pub optimal_stable_to_total_debt_ratio: u128,
    pub base_variable_borrow_rate: u128,
    pub variable_rate_slope1: u128,
    pub variable_rate_slope2: u128,
    pub stable_rate_slope1: u128,
    pub stable_rate_slope2: u128,
    pub base_stable_rate_offset: u128,
    pub stable_rate_excess_offset: u128,
}

/// Parameters of a per-asset variable rate strategy, expressed in bps
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct V2StrategyParams {
    pub optimal_usage_ratio: u32,
    pub base_variable_borrow_rate: u32,
    pub variable_rate_slope1: u32,
    pub variable_rate_slope2: u32,
}

/// Flash loan repayment modes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum FlashLoanMode {
    /// The borrowed amount and premium are returned in the same call
    NoDebt = 0,
    /// The borrowed amount is kept and opened as variable debt
    VariableDebt = 2,
}

/// A single storage write captured while state diff recording is active
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageWrite {
    pub account: String,
    pub slot: String,
    pub previous: String,
    pub new: String,
}

/// An opaque handle to the pool state at a point in time
///
/// Restoring a checkpoint consumes it and invalidates every checkpoint taken after it.
#[derive(Debug, PartialEq, Eq)]
pub struct Checkpoint(u64);

impl Checkpoint {
    pub fn new(id: u64) -> Self {
        Checkpoint(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/********** Pool Interfaces **********/

/// Read access to token balances
pub trait TokenView {
    /// Fetch the total supply of a token
    fn total_supply(&self, token: &Address) -> i128;

    /// Fetch the balance of `holder` for a token
    fn balance(&self, token: &Address, holder: &Address) -> i128;
}

/// Read access to the pool's listing, configuration and oracle
pub trait PoolView: TokenView {
    /// The pool's own address
    fn address(&self) -> Address;

    /// Fetch the underlying assets of every listed reserve, in listing order
    fn reserves_list(&self) -> Vec<Address>;

    /// Fetch the symbol of an underlying asset
    fn symbol(&self, asset: &Address) -> String;

    /// Fetch the tokens and strategy of a reserve
    fn reserve_tokens(&self, asset: &Address) -> Result<ReserveTokens, PoolError>;

    /// Fetch the configuration of a reserve
    fn reserve_params(&self, asset: &Address) -> Result<ReserveParams, PoolError>;

    /// Fetch the oracle price of an asset, in 8 decimals
    fn asset_price(&self, asset: &Address) -> i128;

    /// The flash loan premium charged on no-debt flash loans, in bps
    fn flash_loan_premium_total(&self) -> u32;

    /// The e-mode layout the pool reports, if it reports one
    fn emode_shape(&self) -> Option<EModeShape>;

    /// The number of e-mode categories allocated, if the pool tracks it
    fn emode_category_count(&self) -> Option<u32>;

    /// Fetch an e-mode category in the bitmap layout
    fn emode_category(&self, id: u32) -> Result<EModeCategoryData, PoolError>;

    /// Fetch an e-mode category in the legacy layout
    fn legacy_emode_category(&self, id: u32) -> Result<LegacyEModeCategoryData, PoolError>;

    /// The strategy layout a strategy contract reports, if it reports one
    fn strategy_shape(&self, strategy: &Address) -> Option<StrategyShape>;

    /// Fetch the parameters of a legacy strategy
    fn legacy_strategy_params(&self, strategy: &Address)
        -> Result<LegacyStrategyParams, PoolError>;

    /// Fetch the parameters a V2 strategy holds for `asset`
    fn v2_strategy_params(
        &self,
        strategy: &Address,
        asset: &Address,
    ) -> Result<V2StrategyParams, PoolError>;
}

/// Mutable access to the pool, its admin interface and the test environment primitives
pub trait PoolDriver: PoolView {
    /********** Environment **********/

    /// Save the current state of the pool
    fn checkpoint(&mut self) -> Checkpoint;

    /// Restore the state saved by `checkpoint`
    fn restore(&mut self, checkpoint: Checkpoint);

    /// Fetch the test account derived from `index`. The same index always returns the same account.
    fn test_account(&mut self, index: u32) -> Address;

    /// Deploy a flash loan receiver that repays every no-debt flash loan from its own balance
    fn deploy_flash_loan_receiver(&mut self) -> Address;

    /// Mint `amount` of a token to `to`
    fn mint(&mut self, token: &Address, to: &Address, amount: i128);

    /// Total resources consumed by the pool since it was created
    fn resources_used(&self) -> u64;

    /// Start capturing raw storage writes
    fn start_state_diff(&mut self);

    /// Stop capturing storage writes and return everything captured
    fn take_state_diff(&mut self) -> Vec<StorageWrite>;

    /********** Admin **********/

    fn set_supply_cap(&mut self, asset: &Address, cap: u64) -> Result<(), PoolError>;

    fn set_borrow_cap(&mut self, asset: &Address, cap: u64) -> Result<(), PoolError>;

    fn configure_collateral(
        &mut self,
        asset: &Address,
        ltv: u32,
        liquidation_threshold: u32,
        liquidation_bonus: u32,
    ) -> Result<(), PoolError>;

    /// Override the oracle price of an asset, in 8 decimals
    fn set_asset_price(&mut self, asset: &Address, price: i128);

    /********** User **********/

    fn supply(&mut self, from: &Address, asset: &Address, amount: i128) -> Result<(), PoolError>;

    /// Withdraw `amount` of `asset`, or the full balance for `MAX_AMOUNT`. Returns the amount
    /// withdrawn.
    fn withdraw(&mut self, from: &Address, asset: &Address, amount: i128)
        -> Result<i128, PoolError>;

    fn borrow(&mut self, from: &Address, asset: &Address, amount: i128) -> Result<(), PoolError>;

    /// Repay debt with underlying tokens, capped at the outstanding debt. Returns the amount
    /// repaid.
    fn repay(&mut self, from: &Address, asset: &Address, amount: i128) -> Result<i128, PoolError>;

    /// Repay debt by burning b-tokens of the same reserve. Returns the amount repaid.
    fn repay_with_b_tokens(
        &mut self,
        from: &Address,
        asset: &Address,
        amount: i128,
    ) -> Result<i128, PoolError>;

    /// Liquidate `user` by covering up to `debt_to_cover` of `debt_asset` in exchange for
    /// `collateral_asset`, received as b-tokens when `receive_b_token` is set.
    #[allow(clippy::too_many_arguments)]
    fn liquidate(
        &mut self,
        liquidator: &Address,
        collateral_asset: &Address,
        debt_asset: &Address,
        user: &Address,
        debt_to_cover: i128,
        receive_b_token: bool,
    ) -> Result<(), PoolError>;

    /// Flash loan `amount` of `asset` to `receiver`. Debt opened by `FlashLoanMode::VariableDebt`
    /// is assigned to `on_behalf_of`.
    fn flash_loan(
        &mut self,
        receiver: &Address,
        asset: &Address,
        amount: i128,
        mode: FlashLoanMode,
        on_behalf_of: &Address,
    ) -> Result<(), PoolError>;
}
