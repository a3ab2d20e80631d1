use harness::{
    pool::{
        Checkpoint, EModeCategoryData, EModeShape, FlashLoanMode, LegacyEModeCategoryData,
        LegacyStrategyParams, ReserveParams, ReserveTokens, StorageWrite, StrategyShape,
        V2StrategyParams,
    },
    report::address_label,
    PoolDriver, PoolError, PoolView, ReserveConfig, TokenView,
};
use soroban_sdk::{testutils::Address as _, Address, Env};

use crate::storage::{MockEModeCategory, MockReserve, MockStrategy, PoolState};

/// Resources charged for every call into the pool
pub const CALL_COST: u64 = 100_000;
/// Resources charged for every configuration write
pub const WRITE_COST: u64 = 25_000;
/// Flash loan premium charged by a new pool, in bps
pub const DEFAULT_FLASH_LOAN_PREMIUM: u32 = 5;

/// ### Mock Pool
///
/// An in-memory lending pool with an admin interface, an oracle and a token ledger.
///
/// ### Dev
/// For testing purposes only! Debt does not accrue interest and b-tokens are always redeemable 1:1.
pub struct MockPool {
    env: Env,
    address: Address,
    pub(crate) treasury: Address,
    pub(crate) state: PoolState,
    checkpoints: Vec<(u64, PoolState)>,
    next_checkpoint: u64,
    resources: u64,
    state_diff: Option<Vec<StorageWrite>>,
    accounts: Vec<(u32, Address)>,
    pub(crate) flash_loan_receivers: Vec<Address>,
    emode_layout: EModeShape,
    reports_emode_shape: bool,
    reports_emode_count: bool,
    reported_strategies: Vec<Address>,
}

impl MockPool {
    pub fn new(e: &Env) -> Self {
        MockPool {
            env: e.clone(),
            address: Address::generate(e),
            treasury: Address::generate(e),
            state: PoolState::new(DEFAULT_FLASH_LOAN_PREMIUM),
            checkpoints: Vec::new(),
            next_checkpoint: 0,
            resources: 0,
            state_diff: None,
            accounts: Vec::new(),
            flash_loan_receivers: Vec::new(),
            emode_layout: EModeShape::Bitmap,
            reports_emode_shape: false,
            reports_emode_count: false,
            reported_strategies: Vec::new(),
        }
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    pub fn treasury(&self) -> &Address {
        &self.treasury
    }

    /********** Capabilities **********/

    /// Set the e-mode layout the pool stores categories in
    pub fn set_emode_layout(&mut self, layout: EModeShape) {
        self.emode_layout = layout;
    }

    /// Set if the pool reports its e-mode layout, or leaves readers to probe for it
    pub fn set_reports_emode_shape(&mut self, reports: bool) {
        self.reports_emode_shape = reports;
    }

    /// Set if the pool reports how many e-mode categories are allocated
    pub fn set_reports_emode_count(&mut self, reports: bool) {
        self.reports_emode_count = reports;
    }

    /// Have `strategy` report its layout rather than leave readers to probe for it
    pub fn report_strategy_shape(&mut self, strategy: &Address) {
        if !self.reported_strategies.contains(strategy) {
            self.reported_strategies.push(strategy.clone());
        }
    }

    /********** Faults **********/

    /// Set if supply and borrow caps are enforced
    pub fn set_enforce_caps(&mut self, enforce: bool) {
        self.state.faults.skip_cap_checks = !enforce;
    }

    /// Leave `dust` b-tokens behind on every full withdrawal
    pub fn set_withdraw_dust(&mut self, dust: i128) {
        self.state.faults.withdraw_dust = dust;
    }

    /// Charge `premium` bps on no-debt flash loans instead of the reported premium. `None`
    /// charges the reported premium.
    pub fn set_flash_loan_premium_override(&mut self, premium: Option<u32>) {
        self.state.faults.charged_flash_loan_premium = premium;
    }

    /// Set if liquidations burn the debt they repay
    pub fn set_liquidations_burn_debt(&mut self, burn: bool) {
        self.state.faults.skip_liquidation_debt_burn = !burn;
    }

    /********** Admin **********/

    /// List a new reserve with a freshly deployed underlying, tokens and strategy
    ///
    /// ### Arguments
    /// * `symbol` - The symbol of the underlying
    /// * `params` - The reserve configuration
    /// * `price` - The oracle price of one whole token, in 8 decimals
    /// * `strategy` - The parameters of the reserve's strategy contract
    ///
    /// ### Errors
    /// If the configuration is invalid
    pub fn list_reserve(
        &mut self,
        symbol: &str,
        params: ReserveParams,
        price: i128,
        strategy: MockStrategy,
    ) -> Result<Address, PoolError> {
        self.meter();
        validate_params(&params)?;
        let asset = Address::generate(&self.env);
        let rate_strategy = self.deploy_strategy(strategy);
        let reserve = MockReserve {
            asset: asset.clone(),
            symbol: symbol.to_string(),
            tokens: ReserveTokens {
                b_token: Address::generate(&self.env),
                d_token: Address::generate(&self.env),
                rate_strategy,
            },
            params,
        };
        self.record(
            "reservesList",
            String::new(),
            address_label(&reserve.asset),
        );
        for (field, value) in reserve_config(&reserve).fields() {
            self.record(&format!("{}.{}", symbol, field), String::new(), value);
        }
        self.state.reserves.push(reserve);
        self.state.set_price(&asset, price);
        Ok(asset)
    }

    /// Drop a reserve from the listing
    ///
    /// ### Errors
    /// If the reserve is not listed or still has suppliers or borrowers
    pub fn drop_reserve(&mut self, asset: &Address) -> Result<(), PoolError> {
        self.meter();
        let reserve = self.state.reserve(asset)?;
        if self.state.total_supply(&reserve.tokens.b_token) != 0
            || self.state.total_supply(&reserve.tokens.d_token) != 0
        {
            return Err(PoolError::InvalidReserveParams);
        }
        let label = address_label(&reserve.asset);
        self.state.reserves.retain(|reserve| &reserve.asset != asset);
        self.record("reservesList", label, String::new());
        Ok(())
    }

    /// Apply `update` to the configuration of a reserve
    ///
    /// ### Errors
    /// If the reserve is not listed or the updated configuration is invalid
    pub fn update_reserve<F>(&mut self, asset: &Address, update: F) -> Result<(), PoolError>
    where
        F: FnOnce(&mut ReserveParams),
    {
        self.meter();
        let reserve = self.state.reserve(asset)?;
        let mut params = reserve.params.clone();
        update(&mut params);
        validate_params(&params)?;

        let before = reserve_config(reserve);
        let symbol = reserve.symbol.clone();
        self.state.reserve_mut(asset)?.params = params;
        let after = reserve_config(self.state.reserve(asset)?);
        for (field, previous, new) in before.changed_fields(&after) {
            self.record(&format!("{}.{}", symbol, field), previous, new);
        }
        Ok(())
    }

    /// Point a reserve at a newly deployed strategy contract
    ///
    /// ### Errors
    /// If the reserve is not listed
    pub fn set_strategy(
        &mut self,
        asset: &Address,
        strategy: MockStrategy,
    ) -> Result<Address, PoolError> {
        self.meter();
        self.state.reserve(asset)?;
        let rate_strategy = self.deploy_strategy(strategy);
        let reserve = self.state.reserve_mut(asset)?;
        let previous = address_label(&reserve.tokens.rate_strategy);
        reserve.tokens.rate_strategy = rate_strategy.clone();
        let slot = format!("{}.interestRateStrategy", reserve.symbol);
        self.record(&slot, previous, address_label(&rate_strategy));
        Ok(rate_strategy)
    }

    /// Create or replace an e-mode category
    ///
    /// ### Errors
    /// If the category id is 0 or its parameters are invalid
    pub fn set_emode_category(&mut self, category: MockEModeCategory) -> Result<(), PoolError> {
        self.meter();
        if category.id == 0
            || category.ltv > category.liquidation_threshold
            || !valid_bonus(category.liquidation_threshold, category.liquidation_bonus)
        {
            return Err(PoolError::InvalidReserveParams);
        }
        let previous = self
            .state
            .emode_category(category.id)
            .map(|category| format!("{:?}", category))
            .unwrap_or_default();
        self.record(
            &format!("eModeCategory.{}", category.id),
            previous,
            format!("{:?}", category),
        );
        self.state.emode_categories.retain(|c| c.id != category.id);
        self.state.emode_categories.push(category);
        Ok(())
    }

    pub fn set_flash_loan_premium_total(&mut self, premium: u32) {
        self.meter();
        self.record(
            "flashLoanPremiumTotal",
            self.state.flash_loan_premium_total.to_string(),
            premium.to_string(),
        );
        self.state.flash_loan_premium_total = premium;
    }

    /// Mint `amount` of a reserve's underlying straight into its b-token, for assets the
    /// protocol issues rather than takes deposits of
    ///
    /// ### Errors
    /// If the reserve is not listed
    pub fn seed_liquidity(&mut self, asset: &Address, amount: i128) -> Result<(), PoolError> {
        let b_token = self.state.reserve(asset)?.tokens.b_token.clone();
        self.state.mint(asset, &b_token, amount);
        Ok(())
    }

    /********** Internals **********/

    pub(crate) fn meter(&mut self) {
        self.resources += CALL_COST;
    }

    fn record(&mut self, slot: &str, previous: String, new: String) {
        self.resources += WRITE_COST;
        if let Some(writes) = self.state_diff.as_mut() {
            writes.push(StorageWrite {
                account: address_label(&self.address),
                slot: slot.to_string(),
                previous,
                new,
            });
        }
    }

    fn deploy_strategy(&mut self, strategy: MockStrategy) -> Address {
        let address = Address::generate(&self.env);
        self.state.strategies.push((address.clone(), strategy));
        address
    }
}

fn reserve_config(reserve: &MockReserve) -> ReserveConfig {
    ReserveConfig::from_parts(
        &reserve.asset,
        reserve.symbol.clone(),
        reserve.tokens.clone(),
        reserve.params.clone(),
    )
}

fn valid_bonus(liquidation_threshold: u32, liquidation_bonus: u32) -> bool {
    liquidation_threshold == 0
        || (liquidation_bonus >= 10_000
            && u64::from(liquidation_threshold) * u64::from(liquidation_bonus) <= 10_000 * 10_000)
}

/// Validate the risk parameters of a reserve configuration
fn validate_params(params: &ReserveParams) -> Result<(), PoolError> {
    if params.ltv > params.liquidation_threshold
        || params.liquidation_threshold > 10_000
        || params.reserve_factor > 10_000
        || params.liquidation_protocol_fee > 10_000
        || !valid_bonus(params.liquidation_threshold, params.liquidation_bonus)
        || 10i128.checked_pow(params.decimals).is_none()
    {
        return Err(PoolError::InvalidReserveParams);
    }
    Ok(())
}

impl TokenView for MockPool {
    fn total_supply(&self, token: &Address) -> i128 {
        self.state.total_supply(token)
    }

    fn balance(&self, token: &Address, holder: &Address) -> i128 {
        self.state.balance(token, holder)
    }
}

impl PoolView for MockPool {
    fn address(&self) -> Address {
        self.address.clone()
    }

    fn reserves_list(&self) -> Vec<Address> {
        self.state
            .reserves
            .iter()
            .map(|reserve| reserve.asset.clone())
            .collect()
    }

    fn symbol(&self, asset: &Address) -> String {
        match self.state.reserve(asset) {
            Ok(reserve) => reserve.symbol.clone(),
            Err(_) => address_label(asset),
        }
    }

    fn reserve_tokens(&self, asset: &Address) -> Result<ReserveTokens, PoolError> {
        Ok(self.state.reserve(asset)?.tokens.clone())
    }

    fn reserve_params(&self, asset: &Address) -> Result<ReserveParams, PoolError> {
        Ok(self.state.reserve(asset)?.params.clone())
    }

    fn asset_price(&self, asset: &Address) -> i128 {
        self.state.price(asset)
    }

    fn flash_loan_premium_total(&self) -> u32 {
        self.state.flash_loan_premium_total
    }

    fn emode_shape(&self) -> Option<EModeShape> {
        self.reports_emode_shape.then_some(self.emode_layout)
    }

    fn emode_category_count(&self) -> Option<u32> {
        self.reports_emode_count.then(|| {
            self.state
                .emode_categories
                .iter()
                .map(|category| category.id)
                .max()
                .unwrap_or(0)
        })
    }

    fn emode_category(&self, id: u32) -> Result<EModeCategoryData, PoolError> {
        if self.emode_layout != EModeShape::Bitmap {
            return Err(PoolError::Unsupported);
        }
        // unallocated ids read as an empty category
        Ok(match self.state.emode_category(id) {
            Some(category) => EModeCategoryData {
                ltv: category.ltv,
                liquidation_threshold: category.liquidation_threshold,
                liquidation_bonus: category.liquidation_bonus,
                label: category.label.clone(),
                collateral_bitmap: category.collateral_bitmap,
                borrowable_bitmap: category.borrowable_bitmap,
            },
            None => EModeCategoryData::default(),
        })
    }

    fn legacy_emode_category(&self, id: u32) -> Result<LegacyEModeCategoryData, PoolError> {
        if self.emode_layout != EModeShape::Legacy {
            return Err(PoolError::Unsupported);
        }
        let category = self.state.emode_category(id).cloned().unwrap_or_default();
        Ok(LegacyEModeCategoryData {
            ltv: category.ltv,
            liquidation_threshold: category.liquidation_threshold,
            liquidation_bonus: category.liquidation_bonus,
            price_source: category.price_source,
            label: category.label,
        })
    }

    fn strategy_shape(&self, strategy: &Address) -> Option<StrategyShape> {
        if !self.reported_strategies.contains(strategy) {
            return None;
        }
        self.state.strategy(strategy).map(|strategy| match strategy {
            MockStrategy::Legacy(_) => StrategyShape::Legacy,
            MockStrategy::V2(_) => StrategyShape::V2,
        })
    }

    fn legacy_strategy_params(
        &self,
        strategy: &Address,
    ) -> Result<LegacyStrategyParams, PoolError> {
        match self.state.strategy(strategy) {
            Some(MockStrategy::Legacy(params)) => Ok(params.clone()),
            Some(MockStrategy::V2(_)) => Err(PoolError::Unsupported),
            None => Err(PoolError::InternalError),
        }
    }

    fn v2_strategy_params(
        &self,
        strategy: &Address,
        asset: &Address,
    ) -> Result<V2StrategyParams, PoolError> {
        if &self.state.reserve(asset)?.tokens.rate_strategy != strategy {
            return Err(PoolError::ReserveNotListed);
        }
        match self.state.strategy(strategy) {
            Some(MockStrategy::V2(params)) => Ok(params.clone()),
            Some(MockStrategy::Legacy(_)) => Err(PoolError::Unsupported),
            None => Err(PoolError::InternalError),
        }
    }
}

impl PoolDriver for MockPool {
    fn checkpoint(&mut self) -> Checkpoint {
        let id = self.next_checkpoint;
        self.next_checkpoint += 1;
        self.checkpoints.push((id, self.state.clone()));
        Checkpoint::new(id)
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        let index = self
            .checkpoints
            .iter()
            .position(|(id, _)| *id == checkpoint.id())
            .unwrap_or_else(|| panic!("checkpoint {} is not live", checkpoint.id()));
        let (_, state) = self.checkpoints.swap_remove(index);
        self.checkpoints.truncate(index);
        self.state = state;
    }

    fn test_account(&mut self, index: u32) -> Address {
        if let Some((_, account)) = self.accounts.iter().find(|(i, _)| *i == index) {
            return account.clone();
        }
        let account = Address::generate(&self.env);
        self.accounts.push((index, account.clone()));
        account
    }

    fn deploy_flash_loan_receiver(&mut self) -> Address {
        let receiver = Address::generate(&self.env);
        self.flash_loan_receivers.push(receiver.clone());
        receiver
    }

    fn mint(&mut self, token: &Address, to: &Address, amount: i128) {
        self.state.mint(token, to, amount);
    }

    fn resources_used(&self) -> u64 {
        self.resources
    }

    fn start_state_diff(&mut self) {
        self.state_diff = Some(Vec::new());
    }

    fn take_state_diff(&mut self) -> Vec<StorageWrite> {
        self.state_diff.take().unwrap_or_default()
    }

    fn set_supply_cap(&mut self, asset: &Address, cap: u64) -> Result<(), PoolError> {
        self.update_reserve(asset, |params| params.supply_cap = cap)
    }

    fn set_borrow_cap(&mut self, asset: &Address, cap: u64) -> Result<(), PoolError> {
        self.update_reserve(asset, |params| params.borrow_cap = cap)
    }

    fn configure_collateral(
        &mut self,
        asset: &Address,
        ltv: u32,
        liquidation_threshold: u32,
        liquidation_bonus: u32,
    ) -> Result<(), PoolError> {
        self.update_reserve(asset, |params| {
            params.ltv = ltv;
            params.liquidation_threshold = liquidation_threshold;
            params.liquidation_bonus = liquidation_bonus;
        })
    }

    fn set_asset_price(&mut self, asset: &Address, price: i128) {
        self.meter();
        let previous = self.state.price(asset).to_string();
        self.record(
            &format!("price.{}", self.symbol(asset)),
            previous,
            price.to_string(),
        );
        self.state.set_price(asset, price);
    }

    fn supply(&mut self, from: &Address, asset: &Address, amount: i128) -> Result<(), PoolError> {
        self.meter();
        let mut state = self.state.clone();
        state.supply(from, asset, amount)?;
        self.state = state;
        Ok(())
    }

    fn withdraw(
        &mut self,
        from: &Address,
        asset: &Address,
        amount: i128,
    ) -> Result<i128, PoolError> {
        self.meter();
        let mut state = self.state.clone();
        let withdrawn = state.withdraw(from, asset, amount)?;
        self.state = state;
        Ok(withdrawn)
    }

    fn borrow(&mut self, from: &Address, asset: &Address, amount: i128) -> Result<(), PoolError> {
        self.meter();
        let mut state = self.state.clone();
        state.borrow(from, from, asset, amount)?;
        self.state = state;
        Ok(())
    }

    fn repay(&mut self, from: &Address, asset: &Address, amount: i128) -> Result<i128, PoolError> {
        self.meter();
        let mut state = self.state.clone();
        let repaid = state.repay(from, asset, amount)?;
        self.state = state;
        Ok(repaid)
    }

    fn repay_with_b_tokens(
        &mut self,
        from: &Address,
        asset: &Address,
        amount: i128,
    ) -> Result<i128, PoolError> {
        self.meter();
        let mut state = self.state.clone();
        let repaid = state.repay_with_b_tokens(from, asset, amount)?;
        self.state = state;
        Ok(repaid)
    }

    fn liquidate(
        &mut self,
        liquidator: &Address,
        collateral_asset: &Address,
        debt_asset: &Address,
        user: &Address,
        debt_to_cover: i128,
        receive_b_token: bool,
    ) -> Result<(), PoolError> {
        self.meter();
        let mut state = self.state.clone();
        state.liquidate(
            &self.treasury,
            liquidator,
            collateral_asset,
            debt_asset,
            user,
            debt_to_cover,
            receive_b_token,
        )?;
        self.state = state;
        Ok(())
    }

    fn flash_loan(
        &mut self,
        receiver: &Address,
        asset: &Address,
        amount: i128,
        mode: FlashLoanMode,
        on_behalf_of: &Address,
    ) -> Result<(), PoolError> {
        self.meter();
        if !self.flash_loan_receivers.contains(receiver) {
            return Err(PoolError::UnauthorizedError);
        }
        let mut state = self.state.clone();
        state.flash_loan(&self.treasury, receiver, asset, amount, mode, on_behalf_of)?;
        self.state = state;
        Ok(())
    }
}
