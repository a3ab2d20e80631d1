#![cfg(test)]
use harness::{
    constants::BPS_TO_RAY,
    create_snapshot,
    plausibility::{validate_price_source, validate_reserve_config},
    pool::{
        EModeCategoryData, EModeShape, LegacyEModeCategoryData, LegacyStrategyParams,
        ReserveParams, ReserveTokens, StrategyShape, V2StrategyParams,
    },
    reserve::{find_reserve_config, find_reserve_config_by_symbol},
    snapshot::{read_emode_categories, read_reserve_configs},
    strategy::{read_rate_strategy, validate_interest_rate_strategy, InterestStrategyValues},
    HarnessError, PoolDriver, PoolError, PoolView, TokenView,
};
use mock_pool::{testutils::default_v2_strategy, MockEModeCategory, MockPool, MockStrategy};
use soroban_sdk::{testutils::Address as _, Address};
use test_suites::{
    assertions::assert_harness_error,
    init_logging,
    test_fixture::{AssetIndex, TestFixture},
};

fn emode_category(id: u32) -> MockEModeCategory {
    MockEModeCategory {
        id,
        ltv: 8_000,
        liquidation_threshold: 8_500,
        liquidation_bonus: 10_200,
        label: format!("category {}", id),
        ..Default::default()
    }
}

#[test]
fn test_snapshot_reads_every_reserve_in_order() {
    init_logging();
    let fixture = TestFixture::create();

    let snapshot = create_snapshot(&fixture.pool, "fixture", &fixture.config).unwrap();
    assert_eq!(snapshot.name, "fixture");
    assert_eq!(snapshot.reserves.len(), 7);
    let symbols: Vec<&str> = snapshot
        .reserves
        .iter()
        .map(|reserve| reserve.symbol.as_str())
        .collect();
    assert_eq!(
        symbols,
        vec!["wETH", "USDC", "XLM", "wBTC", "GHO", "FRZ", "ISO"]
    );
    for (index, reserve) in snapshot.reserves.iter().enumerate() {
        assert_eq!(reserve.underlying, fixture.assets[index]);
    }

    let usdc = find_reserve_config(&snapshot.reserves, &fixture.asset(AssetIndex::USDC)).unwrap();
    assert_eq!(usdc.decimals, 6);
    assert_eq!(usdc.ltv, 7_700);
    assert_eq!(usdc.supply_cap, 2_000_000);
    assert_eq!(usdc.borrow_cap, 1_800_000);
    assert!(usdc.borrowing_enabled);

    let frz = find_reserve_config_by_symbol(&snapshot.reserves, "FRZ").unwrap();
    assert!(frz.is_frozen);
    assert_harness_error(
        find_reserve_config_by_symbol(&snapshot.reserves, "DAI"),
        HarnessError::ReserveNotFound,
    );

    assert_eq!(snapshot.strategies.len(), 7);
    assert_eq!(snapshot.flash_loan_premium_total, 5);
}

#[test]
fn test_snapshot_probes_bitmap_emode_layout() {
    let fixture = TestFixture::create();

    let snapshot = create_snapshot(&fixture.pool, "bitmap", &fixture.config).unwrap();
    assert_eq!(snapshot.emodes.len(), 2);
    let eth = &snapshot.emodes[0];
    assert_eq!(eth.id, 1);
    assert_eq!(eth.shape, EModeShape::Bitmap);
    assert_eq!(eth.label, "ETH correlated");
    assert_eq!(eth.collateral_bitmap, Some(0b1));
    assert_eq!(eth.price_source, None);
    assert_eq!(snapshot.emodes[1].borrowable_bitmap, Some(0b10010));
}

#[test]
fn test_snapshot_falls_back_to_legacy_emode_layout() {
    let mut fixture = TestFixture::create_legacy_emode();
    let oracle = Address::generate(&fixture.env);
    fixture
        .pool
        .set_emode_category(MockEModeCategory {
            price_source: Some(oracle.clone()),
            ..emode_category(3)
        })
        .unwrap();

    let snapshot = create_snapshot(&fixture.pool, "legacy", &fixture.config).unwrap();
    assert_eq!(snapshot.emodes.len(), 3);
    for category in snapshot.emodes.iter() {
        assert_eq!(category.shape, EModeShape::Legacy);
        assert_eq!(category.collateral_bitmap, None);
    }
    assert_eq!(snapshot.emodes[2].price_source, Some(oracle));

    // a reported layout is used without probing
    fixture.pool.set_reports_emode_shape(true);
    let snapshot = create_snapshot(&fixture.pool, "legacy", &fixture.config).unwrap();
    assert_eq!(snapshot.emodes.len(), 3);
}

#[test]
fn test_emode_scan_stops_after_empty_categories() {
    let mut fixture = TestFixture::create();
    // ids 3, 4 and 5 are empty
    fixture.pool.set_emode_category(emode_category(6)).unwrap();

    let categories = read_emode_categories(&fixture.pool, &fixture.config).unwrap();
    let ids: Vec<u32> = categories.iter().map(|category| category.id).collect();
    assert_eq!(ids, vec![1, 2]);

    // a gap of two is tolerated
    fixture.pool.set_emode_category(emode_category(5)).unwrap();
    let categories = read_emode_categories(&fixture.pool, &fixture.config).unwrap();
    let ids: Vec<u32> = categories.iter().map(|category| category.id).collect();
    assert_eq!(ids, vec![1, 2, 5, 6]);
}

#[test]
fn test_emode_count_finds_sparse_categories() {
    let mut fixture = TestFixture::create();
    fixture.pool.set_emode_category(emode_category(9)).unwrap();
    fixture.pool.set_reports_emode_count(true);

    let categories = read_emode_categories(&fixture.pool, &fixture.config).unwrap();
    let ids: Vec<u32> = categories.iter().map(|category| category.id).collect();
    assert_eq!(ids, vec![1, 2, 9]);
}

#[test]
fn test_rate_strategy_probing() {
    let mut fixture = TestFixture::create();
    let weth = fixture.asset(AssetIndex::WETH);
    let usdc = fixture.asset(AssetIndex::USDC);
    let weth_strategy = fixture.pool.reserve_tokens(&weth).unwrap().rate_strategy;
    let usdc_strategy = fixture.pool.reserve_tokens(&usdc).unwrap().rate_strategy;

    let strategy = read_rate_strategy(&fixture.pool, &weth, &weth_strategy).unwrap();
    assert_eq!(strategy.shape(), StrategyShape::Legacy);
    assert!(strategy.values().stable_rate_slope1 > 0);

    let strategy = read_rate_strategy(&fixture.pool, &usdc, &usdc_strategy).unwrap();
    assert_eq!(strategy.shape(), StrategyShape::V2);
    let values = strategy.values();
    assert_eq!(values.optimal_usage_ratio, 9_000 * BPS_TO_RAY);
    assert_eq!(values.variable_rate_slope1, 550 * BPS_TO_RAY);
    assert_eq!(values.stable_rate_slope1, 0);

    // reported shapes skip the probe
    fixture.pool.report_strategy_shape(&usdc_strategy);
    let strategy = read_rate_strategy(&fixture.pool, &usdc, &usdc_strategy).unwrap();
    assert_eq!(strategy.shape(), StrategyShape::V2);

    let expected = InterestStrategyValues {
        optimal_usage_ratio: 9_000 * BPS_TO_RAY,
        base_variable_borrow_rate: 0,
        variable_rate_slope1: 550 * BPS_TO_RAY,
        variable_rate_slope2: 6_000 * BPS_TO_RAY,
        ..Default::default()
    };
    validate_interest_rate_strategy(&fixture.pool, &usdc, &usdc_strategy, &expected).unwrap();
    assert_harness_error(
        validate_interest_rate_strategy(
            &fixture.pool,
            &usdc,
            &usdc_strategy,
            &InterestStrategyValues {
                variable_rate_slope2: 8_000 * BPS_TO_RAY,
                ..expected
            },
        ),
        HarnessError::StrategyMismatch,
    );

    let unknown = Address::generate(&fixture.env);
    assert_harness_error(
        read_rate_strategy(&fixture.pool, &usdc, &unknown),
        HarnessError::UnsupportedStrategyShape,
    );
}

#[test]
fn test_snapshot_after_strategy_update() {
    let mut fixture = TestFixture::create();
    let usdc = fixture.asset(AssetIndex::USDC);
    let before = create_snapshot(&fixture.pool, "before", &fixture.config).unwrap();

    let new_strategy = fixture
        .pool
        .set_strategy(&usdc, default_v2_strategy())
        .unwrap();
    let after = create_snapshot(&fixture.pool, "after", &fixture.config).unwrap();

    let strategy = after
        .strategies
        .iter()
        .find(|strategy| strategy.asset == usdc)
        .unwrap();
    assert_eq!(strategy.address, new_strategy);
    assert_eq!(
        strategy.strategy,
        before
            .strategies
            .iter()
            .find(|strategy| strategy.asset == usdc)
            .unwrap()
            .strategy
    );

    let legacy = fixture
        .pool
        .set_strategy(&usdc, MockStrategy::Legacy(Default::default()))
        .unwrap();
    let after = create_snapshot(&fixture.pool, "after", &fixture.config).unwrap();
    let usdc_config = find_reserve_config(&after.reserves, &usdc).unwrap();
    assert_eq!(usdc_config.interest_rate_strategy, legacy);
}

#[test]
fn test_validate_reserve_config() {
    let mut fixture = TestFixture::create();
    let xlm = fixture.asset(AssetIndex::XLM);
    let mut expected = fixture.reserve_config(AssetIndex::XLM);

    let snapshot = create_snapshot(&fixture.pool, "current", &fixture.config).unwrap();
    validate_reserve_config(&expected, &snapshot.reserves).unwrap();

    fixture
        .pool
        .update_reserve(&xlm, |params| params.reserve_factor = 2_000)
        .unwrap();
    let snapshot = create_snapshot(&fixture.pool, "updated", &fixture.config).unwrap();
    assert_harness_error(
        validate_reserve_config(&expected, &snapshot.reserves),
        HarnessError::ReserveConfigMismatch,
    );
    expected.reserve_factor = 2_000;
    validate_reserve_config(&expected, &snapshot.reserves).unwrap();
}

#[test]
fn test_validate_price_source() {
    let mut fixture = TestFixture::create();
    let wbtc = fixture.asset(AssetIndex::WBTC);

    validate_price_source(&fixture.pool, &wbtc).unwrap();
    fixture.pool.set_asset_price(&wbtc, 0);
    assert_harness_error(
        validate_price_source(&fixture.pool, &wbtc),
        HarnessError::MissingPriceSource,
    );
}

/// Lists the first reserve of the wrapped pool a second time
struct RelistingPool<'a>(&'a MockPool);

impl TokenView for RelistingPool<'_> {
    fn total_supply(&self, token: &Address) -> i128 {
        self.0.total_supply(token)
    }

    fn balance(&self, token: &Address, holder: &Address) -> i128 {
        self.0.balance(token, holder)
    }
}

impl PoolView for RelistingPool<'_> {
    fn address(&self) -> Address {
        self.0.address()
    }

    fn reserves_list(&self) -> Vec<Address> {
        let mut list = self.0.reserves_list();
        list.push(list[0].clone());
        list
    }

    fn symbol(&self, asset: &Address) -> String {
        self.0.symbol(asset)
    }

    fn reserve_tokens(&self, asset: &Address) -> Result<ReserveTokens, PoolError> {
        self.0.reserve_tokens(asset)
    }

    fn reserve_params(&self, asset: &Address) -> Result<ReserveParams, PoolError> {
        self.0.reserve_params(asset)
    }

    fn asset_price(&self, asset: &Address) -> i128 {
        self.0.asset_price(asset)
    }

    fn flash_loan_premium_total(&self) -> u32 {
        self.0.flash_loan_premium_total()
    }

    fn emode_shape(&self) -> Option<EModeShape> {
        self.0.emode_shape()
    }

    fn emode_category_count(&self) -> Option<u32> {
        self.0.emode_category_count()
    }

    fn emode_category(&self, id: u32) -> Result<EModeCategoryData, PoolError> {
        self.0.emode_category(id)
    }

    fn legacy_emode_category(&self, id: u32) -> Result<LegacyEModeCategoryData, PoolError> {
        self.0.legacy_emode_category(id)
    }

    fn strategy_shape(&self, strategy: &Address) -> Option<StrategyShape> {
        self.0.strategy_shape(strategy)
    }

    fn legacy_strategy_params(
        &self,
        strategy: &Address,
    ) -> Result<LegacyStrategyParams, PoolError> {
        self.0.legacy_strategy_params(strategy)
    }

    fn v2_strategy_params(
        &self,
        strategy: &Address,
        asset: &Address,
    ) -> Result<V2StrategyParams, PoolError> {
        self.0.v2_strategy_params(strategy, asset)
    }
}

#[test]
fn test_snapshot_rejects_relisted_underlying() {
    let fixture = TestFixture::create();
    let relisting = RelistingPool(&fixture.pool);

    assert_harness_error(
        read_reserve_configs(&relisting),
        HarnessError::DuplicateReserve,
    );
    assert_harness_error(
        create_snapshot(&relisting, "relisted", &fixture.config),
        HarnessError::DuplicateReserve,
    );

    // the wrapped pool itself lists every underlying once
    assert_eq!(read_reserve_configs(&fixture.pool).unwrap().len(), 7);
}
