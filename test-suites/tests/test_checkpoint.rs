#![cfg(test)]
use harness::{
    scenario::deposit, with_rollback, HarnessError, PoolDriver, PoolView, Rollback, TokenView,
};
use test_suites::{
    assertions::assert_harness_error,
    test_fixture::{AssetIndex, TestFixture, SCALAR_6, SCALAR_8},
};

#[test]
fn test_with_rollback_restores_on_success() {
    let mut fixture = TestFixture::create();
    let usdc = fixture.reserve_config(AssetIndex::USDC);
    let samwise = fixture.pool.test_account(1);

    let supplied = with_rollback(&mut fixture.pool, |pool| {
        deposit(pool, &usdc, &samwise, 1_000 * SCALAR_6)?;
        Ok(pool.balance(&usdc.b_token, &samwise))
    })
    .unwrap();

    assert_eq!(supplied, 1_000 * SCALAR_6);
    assert_eq!(fixture.pool.balance(&usdc.b_token, &samwise), 0);
    assert_eq!(fixture.pool.total_supply(&usdc.b_token), 0);
    assert_eq!(fixture.pool.balance(&usdc.underlying, &samwise), 0);
}

#[test]
fn test_with_rollback_restores_on_error() {
    let mut fixture = TestFixture::create();
    let weth = fixture.reserve_config(AssetIndex::WETH);
    let frodo = fixture.pool.test_account(2);

    let result: Result<(), HarnessError> = with_rollback(&mut fixture.pool, |pool| {
        deposit(pool, &weth, &frodo, 10)?;
        Err(HarnessError::WithdrawMismatch)
    });

    assert_harness_error(result, HarnessError::WithdrawMismatch);
    assert_eq!(fixture.pool.balance(&weth.b_token, &frodo), 0);
    assert_eq!(fixture.pool.total_supply(&weth.b_token), 0);
}

#[test]
fn test_nested_rollback() {
    let mut fixture = TestFixture::create();
    let usdc = fixture.reserve_config(AssetIndex::USDC);
    let samwise = fixture.pool.test_account(1);

    with_rollback(&mut fixture.pool, |pool| {
        deposit(pool, &usdc, &samwise, 100 * SCALAR_6)?;
        with_rollback(pool, |pool| {
            deposit(pool, &usdc, &samwise, 50 * SCALAR_6)?;
            assert_eq!(pool.balance(&usdc.b_token, &samwise), 150 * SCALAR_6);
            Ok(())
        })?;
        // only the inner deposit is undone
        assert_eq!(pool.balance(&usdc.b_token, &samwise), 100 * SCALAR_6);

        let inner: Result<(), HarnessError> = with_rollback(pool, |pool| {
            deposit(pool, &usdc, &samwise, 25 * SCALAR_6)?;
            Err(HarnessError::DepositMismatch)
        });
        assert_harness_error(inner, HarnessError::DepositMismatch);
        assert_eq!(pool.balance(&usdc.b_token, &samwise), 100 * SCALAR_6);
        Ok(())
    })
    .unwrap();

    assert_eq!(fixture.pool.balance(&usdc.b_token, &samwise), 0);
}

#[test]
fn test_rollback_guard_restores_on_drop() {
    let mut fixture = TestFixture::create();
    let weth = fixture.asset(AssetIndex::WETH);
    let price = 2_000 * SCALAR_8;

    {
        let mut guard = Rollback::new(&mut fixture.pool);
        guard.set_asset_price(&weth, price * 2);
        guard.set_supply_cap(&weth, 1).unwrap();
        assert_eq!(guard.asset_price(&weth), price * 2);
    }

    assert_eq!(fixture.pool.asset_price(&weth), price);
    assert_eq!(fixture.reserve_config(AssetIndex::WETH).supply_cap, 10_000);
}

#[test]
fn test_rollback_guard_restores_on_panic() {
    let mut fixture = TestFixture::create();
    let usdc = fixture.reserve_config(AssetIndex::USDC);
    let samwise = fixture.pool.test_account(1);

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let mut guard = Rollback::new(&mut fixture.pool);
        deposit(&mut *guard, &usdc, &samwise, SCALAR_6).unwrap();
        panic!("scenario aborted");
    }));

    assert!(result.is_err());
    assert_eq!(fixture.pool.balance(&usdc.b_token, &samwise), 0);
}

#[test]
#[should_panic(expected = "is not live")]
fn test_restore_consumed_checkpoint_panics() {
    let mut fixture = TestFixture::create();
    let outer = fixture.pool.checkpoint();
    let inner = fixture.pool.checkpoint();

    // restoring the outer checkpoint discards every later one
    fixture.pool.restore(outer);
    fixture.pool.restore(inner);
}
