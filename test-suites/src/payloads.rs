use harness::{pool::ReserveParams, Payload, PoolDriver, PoolError};
use mock_pool::{MockPool, MockStrategy};
use soroban_sdk::{testutils::Address as _, Address};

/// Lists a new reserve. The token already circulates before the listing.
pub struct ListReservePayload {
    pub symbol: String,
    pub params: ReserveParams,
    pub price: i128,
    pub strategy: MockStrategy,
    pub circulating_supply: i128,
}

impl Payload<MockPool> for ListReservePayload {
    fn execute(&self, pool: &mut MockPool) -> Result<(), PoolError> {
        let asset = pool.list_reserve(
            &self.symbol,
            self.params.clone(),
            self.price,
            self.strategy.clone(),
        )?;
        let holder = Address::generate(pool.env());
        pool.mint(&asset, &holder, self.circulating_supply);
        Ok(())
    }
}

/// Updates the supply and borrow caps of a set of reserves
pub struct UpdateCapsPayload {
    pub updates: Vec<(Address, u64, u64)>, // (asset, supply cap, borrow cap)
}

impl Payload<MockPool> for UpdateCapsPayload {
    fn execute(&self, pool: &mut MockPool) -> Result<(), PoolError> {
        for (asset, supply_cap, borrow_cap) in &self.updates {
            pool.set_supply_cap(asset, *supply_cap)?;
            pool.set_borrow_cap(asset, *borrow_cap)?;
        }
        Ok(())
    }
}
