use harness::{
    pool::{EModeShape, ReserveParams},
    HarnessConfig, PoolDriver, PoolView, ReserveConfig,
};
use mock_pool::{
    testutils::{default_legacy_strategy, default_reserve_params, default_v2_strategy},
    MockEModeCategory, MockPool,
};
use soroban_sdk::{testutils::Address as _, Address, Env};

pub const SCALAR_6: i128 = 1_000_000;
pub const SCALAR_7: i128 = 1_000_0000;
pub const SCALAR_8: i128 = 1_0000_0000;
pub const SCALAR_18: i128 = 1_000_000_000_000_000_000;

#[repr(usize)]
#[derive(Clone, Copy)]
pub enum AssetIndex {
    WETH = 0,
    USDC = 1,
    XLM = 2,
    WBTC = 3,
    GHO = 4,
    FRZ = 5,
    ISO = 6,
}

pub struct TestFixture {
    pub env: Env,
    pub bombadil: Address, // holds the circulating supply of every asset
    pub pool: MockPool,
    pub assets: Vec<Address>,
    pub config: HarnessConfig,
}

impl TestFixture {
    /// Create a new TestFixture with a mock pool
    ///
    /// Lists wETH (0), USDC (1), XLM (2), wBTC (3), GHO (4), a frozen reserve FRZ (5) and an
    /// isolated reserve ISO (6). GHO is issued by the pool rather than supplied to it, so it
    /// is the config's excluded stablecoin and starts with seeded liquidity.
    pub fn create() -> TestFixture {
        let e = Env::default();
        let bombadil = Address::generate(&e);
        let mut pool = MockPool::new(&e);

        let mut assets = Vec::new();
        // (symbol, params, price, circulating supply)
        let listings: [(&str, ReserveParams, i128, i128); 7] = [
            (
                "wETH",
                ReserveParams {
                    supply_cap: 10_000,
                    borrow_cap: 5_000,
                    emode_category: 1,
                    ..default_reserve_params(18)
                },
                2_000 * SCALAR_8,
                1_000_000 * SCALAR_18,
            ),
            (
                "USDC",
                ReserveParams {
                    ltv: 7_700,
                    liquidation_threshold: 8_000,
                    supply_cap: 2_000_000,
                    borrow_cap: 1_800_000,
                    ..default_reserve_params(6)
                },
                SCALAR_8,
                1_000_000_000 * SCALAR_6,
            ),
            (
                "XLM",
                ReserveParams {
                    ltv: 4_000,
                    liquidation_threshold: 5_000,
                    liquidation_bonus: 11_000,
                    supply_cap: 50_000_000,
                    borrow_cap: 10_000_000,
                    is_flashloanable: false,
                    ..default_reserve_params(7)
                },
                SCALAR_8 / 10,
                50_000_000_000 * SCALAR_7,
            ),
            (
                "wBTC",
                ReserveParams {
                    ltv: 7_000,
                    liquidation_threshold: 7_500,
                    liquidation_bonus: 10_650,
                    supply_cap: 1_000,
                    borrow_cap: 500,
                    ..default_reserve_params(8)
                },
                60_000 * SCALAR_8,
                21_000 * SCALAR_8,
            ),
            (
                "GHO",
                ReserveParams {
                    ltv: 0,
                    liquidation_threshold: 0,
                    liquidation_bonus: 0,
                    usage_as_collateral_enabled: false,
                    supply_cap: 0,
                    borrow_cap: 5_000_000,
                    ..default_reserve_params(18)
                },
                SCALAR_8,
                100_000_000 * SCALAR_18,
            ),
            (
                "FRZ",
                ReserveParams {
                    is_frozen: true,
                    supply_cap: 1_000,
                    borrow_cap: 100,
                    ..default_reserve_params(7)
                },
                SCALAR_8,
                1_000_000 * SCALAR_7,
            ),
            (
                "ISO",
                ReserveParams {
                    ltv: 5_000,
                    liquidation_threshold: 6_500,
                    liquidation_bonus: 11_000,
                    debt_ceiling: 1_000_000,
                    borrowing_enabled: false,
                    is_flashloanable: false,
                    supply_cap: 100_000,
                    borrow_cap: 0,
                    ..default_reserve_params(7)
                },
                5 * SCALAR_8,
                10_000_000 * SCALAR_7,
            ),
        ];
        for (index, (symbol, params, price, circulating)) in listings.into_iter().enumerate() {
            let strategy = if index % 2 == 0 {
                default_legacy_strategy()
            } else {
                default_v2_strategy()
            };
            let asset = pool
                .list_reserve(symbol, params, price, strategy)
                .unwrap_or_else(|err| panic!("unable to list {}: {}", symbol, err));
            pool.mint(&asset, &bombadil, circulating);
            assets.push(asset);
        }

        let gho = assets[AssetIndex::GHO as usize].clone();
        pool.seed_liquidity(&gho, 10_000_000 * SCALAR_18).unwrap();

        pool.set_emode_category(MockEModeCategory {
            id: 1,
            ltv: 9_000,
            liquidation_threshold: 9_300,
            liquidation_bonus: 10_100,
            label: String::from("ETH correlated"),
            collateral_bitmap: 0b1,
            borrowable_bitmap: 0b1,
            price_source: None,
        })
        .unwrap();
        pool.set_emode_category(MockEModeCategory {
            id: 2,
            ltv: 9_300,
            liquidation_threshold: 9_500,
            liquidation_bonus: 10_100,
            label: String::from("Stablecoins"),
            collateral_bitmap: 0b10010,
            borrowable_bitmap: 0b10010,
            price_source: None,
        })
        .unwrap();

        let config = HarnessConfig {
            write_reports: false,
            excluded_stablecoin: Some(gho),
            ..Default::default()
        };

        TestFixture {
            env: e,
            bombadil,
            pool,
            assets,
            config,
        }
    }

    /// Create a fixture whose pool stores e-mode categories in the legacy layout and reports
    /// nothing about its layout
    pub fn create_legacy_emode() -> TestFixture {
        let mut fixture = TestFixture::create();
        fixture.pool.set_emode_layout(EModeShape::Legacy);
        fixture
    }

    pub fn asset(&self, index: AssetIndex) -> Address {
        self.assets[index as usize].clone()
    }

    /// Read the current config of a listed reserve
    pub fn reserve_config(&self, index: AssetIndex) -> ReserveConfig {
        let asset = self.asset(index);
        ReserveConfig::from_parts(
            &asset,
            self.pool.symbol(&asset),
            self.pool.reserve_tokens(&asset).unwrap(),
            self.pool.reserve_params(&asset).unwrap(),
        )
    }

    /// Route reports to `dir`
    pub fn write_reports_to(&mut self, dir: &std::path::Path) {
        self.config.write_reports = true;
        self.config.reports_dir = dir.to_path_buf();
    }
}
