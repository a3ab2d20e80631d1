use harness::{
    pool::{LegacyStrategyParams, ReserveParams, ReserveTokens, V2StrategyParams},
    PoolError,
};
use soroban_sdk::Address;

/********** Storage Types **********/

/// A reserve listed on the mock pool
#[derive(Clone, Debug)]
pub struct MockReserve {
    pub asset: Address,
    pub symbol: String,
    pub tokens: ReserveTokens,
    pub params: ReserveParams,
}

impl MockReserve {
    pub fn scalar(&self) -> i128 {
        10i128.pow(self.params.decimals)
    }
}

/// An e-mode category, stored in a superset of both layouts
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct MockEModeCategory {
    pub id: u32,
    pub ltv: u32,
    pub liquidation_threshold: u32,
    pub liquidation_bonus: u32,
    pub label: String,
    pub collateral_bitmap: u128,       // only exposed by the bitmap layout
    pub borrowable_bitmap: u128,       // only exposed by the bitmap layout
    pub price_source: Option<Address>, // only exposed by the legacy layout
}

/// The parameters held by a deployed strategy contract
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MockStrategy {
    Legacy(LegacyStrategyParams),
    V2(V2StrategyParams),
}

#[derive(Clone, Debug)]
struct Balance {
    token: Address,
    holder: Address,
    amount: i128,
}

/// Deliberate deviations from correct pool behavior, all off by default
#[derive(Clone, Debug, Default)]
pub(crate) struct MockFaults {
    pub skip_cap_checks: bool,
    pub withdraw_dust: i128, // b-tokens left behind by a full withdrawal
    pub charged_flash_loan_premium: Option<u32>, // premium charged instead of the reported one
    pub skip_liquidation_debt_burn: bool,
}

/// Everything a checkpoint captures
#[derive(Clone, Debug, Default)]
pub(crate) struct PoolState {
    pub reserves: Vec<MockReserve>,
    pub prices: Vec<(Address, i128)>,
    pub emode_categories: Vec<MockEModeCategory>,
    pub strategies: Vec<(Address, MockStrategy)>,
    pub flash_loan_premium_total: u32,
    pub faults: MockFaults,
    balances: Vec<Balance>,
}

impl PoolState {
    pub fn new(flash_loan_premium_total: u32) -> Self {
        PoolState {
            reserves: Vec::new(),
            prices: Vec::new(),
            emode_categories: Vec::new(),
            strategies: Vec::new(),
            flash_loan_premium_total,
            faults: MockFaults::default(),
            balances: Vec::new(),
        }
    }

    /********** Reserves **********/

    pub fn reserve(&self, asset: &Address) -> Result<&MockReserve, PoolError> {
        self.reserves
            .iter()
            .find(|reserve| &reserve.asset == asset)
            .ok_or(PoolError::ReserveNotListed)
    }

    pub fn reserve_mut(&mut self, asset: &Address) -> Result<&mut MockReserve, PoolError> {
        self.reserves
            .iter_mut()
            .find(|reserve| &reserve.asset == asset)
            .ok_or(PoolError::ReserveNotListed)
    }

    pub fn strategy(&self, strategy: &Address) -> Option<&MockStrategy> {
        self.strategies
            .iter()
            .find(|(address, _)| address == strategy)
            .map(|(_, strategy)| strategy)
    }

    pub fn emode_category(&self, id: u32) -> Option<&MockEModeCategory> {
        self.emode_categories
            .iter()
            .find(|category| category.id == id)
    }

    /********** Oracle **********/

    /// The price of `asset` in 8 decimals, or 0 if the oracle has no source for it
    pub fn price(&self, asset: &Address) -> i128 {
        self.prices
            .iter()
            .find(|(address, _)| address == asset)
            .map_or(0, |(_, price)| *price)
    }

    pub fn set_price(&mut self, asset: &Address, price: i128) {
        match self.prices.iter_mut().find(|(address, _)| address == asset) {
            Some(entry) => entry.1 = price,
            None => self.prices.push((asset.clone(), price)),
        }
    }

    /********** Tokens **********/

    pub fn balance(&self, token: &Address, holder: &Address) -> i128 {
        self.balances
            .iter()
            .find(|balance| &balance.token == token && &balance.holder == holder)
            .map_or(0, |balance| balance.amount)
    }

    pub fn total_supply(&self, token: &Address) -> i128 {
        self.balances
            .iter()
            .filter(|balance| &balance.token == token)
            .map(|balance| balance.amount)
            .sum()
    }

    pub fn mint(&mut self, token: &Address, to: &Address, amount: i128) {
        match self
            .balances
            .iter_mut()
            .find(|balance| &balance.token == token && &balance.holder == to)
        {
            Some(balance) => balance.amount += amount,
            None => self.balances.push(Balance {
                token: token.clone(),
                holder: to.clone(),
                amount,
            }),
        }
    }

    pub fn burn(&mut self, token: &Address, from: &Address, amount: i128) -> Result<(), PoolError> {
        let balance = self
            .balances
            .iter_mut()
            .find(|balance| &balance.token == token && &balance.holder == from)
            .ok_or(PoolError::BalanceError)?;
        if balance.amount < amount {
            return Err(PoolError::BalanceError);
        }
        balance.amount -= amount;
        Ok(())
    }

    pub fn transfer(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: i128,
    ) -> Result<(), PoolError> {
        self.burn(token, from, amount)?;
        self.mint(token, to, amount);
        Ok(())
    }
}
