#![cfg(test)]
use harness::{
    default_test, execute_payload, pool::ReserveParams, HarnessError, PoolDriver, PoolError,
    PoolView,
};
use mock_pool::{
    testutils::{default_reserve_params, default_v2_strategy},
    MockPool, CALL_COST, WRITE_COST,
};
use serde_json::Value;
use test_suites::{
    assertions::assert_harness_error,
    init_logging,
    payloads::{ListReservePayload, UpdateCapsPayload},
    test_fixture::{AssetIndex, TestFixture, SCALAR_7, SCALAR_8},
};

fn read_json(path: &std::path::Path) -> Value {
    let contents = std::fs::read_to_string(path).unwrap();
    serde_json::from_str(&contents).unwrap()
}

fn link_listing() -> ListReservePayload {
    ListReservePayload {
        symbol: String::from("LINK"),
        params: ReserveParams {
            supply_cap: 1_000_000,
            borrow_cap: 500_000,
            ..default_reserve_params(7)
        },
        price: 15 * SCALAR_8,
        strategy: default_v2_strategy(),
        circulating_supply: 1_000_000_000 * SCALAR_7,
    }
}

#[test]
fn test_default_test_noop_payload() {
    init_logging();
    let mut fixture = TestFixture::create();
    let dir = tempfile::tempdir().unwrap();
    fixture.write_reports_to(dir.path());

    let noop = |_: &mut MockPool| -> Result<(), PoolError> { Ok(()) };
    let config = fixture.config.clone();
    let report = default_test(&mut fixture.pool, "noop", &noop, &config).unwrap();

    assert!(report.diff.is_empty());
    assert!(report.state_diff.is_empty());
    assert_eq!(report.resources_used, 0);
    assert_eq!(report.before.reserves, report.after.reserves);

    let before = read_json(&dir.path().join("noop_before.json"));
    assert_eq!(before["name"], "noop_before");
    assert_eq!(before["reserves"].as_array().unwrap().len(), 7);
    assert_eq!(before["reserves"][0]["symbol"], "wETH");
    assert_eq!(before["reserves"][0]["supplyCap"], 10_000);
    assert_eq!(before["eModes"]["2"]["label"], "Stablecoins");
    assert!(dir.path().join("noop_after.json").exists());

    let diff = read_json(&dir.path().join("noop_before_noop_after.json"));
    assert_eq!(diff["from"], "noop_before");
    assert_eq!(diff["to"], "noop_after");
    assert_eq!(diff["reserves"].as_array().unwrap().len(), 0);

    let state_diff = read_json(&dir.path().join("noop_state_diff.json"));
    assert_eq!(state_diff.as_array().unwrap().len(), 0);
}

#[test]
fn test_default_test_cap_update() {
    let mut fixture = TestFixture::create();
    let dir = tempfile::tempdir().unwrap();
    fixture.write_reports_to(dir.path());
    let usdc = fixture.asset(AssetIndex::USDC);

    let payload = UpdateCapsPayload {
        updates: vec![(usdc, 3_000_000, 2_000_000)],
    };
    let config = fixture.config.clone();
    let report = default_test(&mut fixture.pool, "caps", &payload, &config).unwrap();

    assert_eq!(report.resources_used, 2 * CALL_COST + 2 * WRITE_COST);
    assert_eq!(report.diff.reserves.len(), 1);
    let usdc_diff = &report.diff.reserves[0];
    assert_eq!(usdc_diff.key, "USDC");
    let fields: Vec<(&str, &str, &str)> = usdc_diff
        .changes
        .iter()
        .map(|change| {
            (
                change.field.as_str(),
                change.from.as_str(),
                change.to.as_str(),
            )
        })
        .collect();
    assert_eq!(
        fields,
        vec![
            ("supplyCap", "2000000", "3000000"),
            ("borrowCap", "1800000", "2000000"),
        ]
    );

    let slots: Vec<&str> = report
        .state_diff
        .iter()
        .map(|write| write.slot.as_str())
        .collect();
    assert_eq!(slots, vec!["USDC.supplyCap", "USDC.borrowCap"]);
    let state_diff = read_json(&dir.path().join("caps_state_diff.json"));
    assert_eq!(state_diff[0]["slot"], "USDC.supplyCap");
    assert_eq!(state_diff[0]["new"], "3000000");
}

#[test]
fn test_default_test_new_listing() {
    let mut fixture = TestFixture::create();
    let config = fixture.config.clone();

    let report = default_test(&mut fixture.pool, "link", &link_listing(), &config).unwrap();

    assert_eq!(report.diff.listed_reserves, vec![String::from("LINK")]);
    assert!(report.diff.reserves.is_empty());
    assert_eq!(report.after.reserves.len(), 8);
    assert_eq!(report.after.strategies.len(), 8);
    // the payload itself is kept, only the scenarios are rolled back
    assert_eq!(fixture.pool.reserves_list().len(), 8);
}

#[test]
fn test_default_test_resource_limit() {
    let mut fixture = TestFixture::create();
    fixture.config.block_resource_limit = 500_000;
    let config = fixture.config.clone();

    assert_harness_error(
        default_test(&mut fixture.pool, "link", &link_listing(), &config),
        HarnessError::PayloadResourceLimitExceeded,
    );
}

#[test]
#[should_panic(expected = "PayloadResourceLimitExceeded")]
fn test_execute_payload_over_limit_panics() {
    let mut fixture = TestFixture::create();
    fixture.config.block_resource_limit = 700_000;
    let config = fixture.config.clone();

    // 100_000 for the call and 25_000 for each of the 24 writes is above 95% of the limit
    execute_payload(&mut fixture.pool, &link_listing(), &config).unwrap();
}

#[test]
fn test_execute_payload_within_limit() {
    let mut fixture = TestFixture::create();
    fixture.config.block_resource_limit = 737_000;
    let config = fixture.config.clone();

    let execution = execute_payload(&mut fixture.pool, &link_listing(), &config).unwrap();
    assert_eq!(execution.resources_used, CALL_COST + 24 * WRITE_COST);
    assert_eq!(execution.state_diff.len(), 24);
}

#[test]
fn test_default_test_failing_payload() {
    let mut fixture = TestFixture::create();
    let weth = fixture.asset(AssetIndex::WETH);
    let config = fixture.config.clone();

    let invalid_ltv = move |pool: &mut MockPool| -> Result<(), PoolError> {
        pool.update_reserve(&weth, |params| params.ltv = 9_000)
    };
    assert_harness_error(
        default_test(&mut fixture.pool, "invalid", &invalid_ltv, &config),
        HarnessError::PayloadFailed,
    );
}

#[test]
fn test_default_test_implausible_payload_still_reports() {
    let mut fixture = TestFixture::create();
    let dir = tempfile::tempdir().unwrap();
    fixture.write_reports_to(dir.path());
    let weth = fixture.asset(AssetIndex::WETH);

    let payload = UpdateCapsPayload {
        updates: vec![(weth, 10_000, 20_000)],
    };
    let config = fixture.config.clone();
    assert_harness_error(
        default_test(&mut fixture.pool, "weth_caps", &payload, &config),
        HarnessError::SupplyLtBorrow,
    );

    let diff = read_json(&dir.path().join("weth_caps_before_weth_caps_after.json"));
    assert_eq!(diff["reserves"][0]["key"], "wETH");
    assert_eq!(diff["reserves"][0]["changes"][0]["field"], "borrowCap");
    assert_eq!(diff["reserves"][0]["changes"][0]["to"], "20000");
}

#[test]
fn test_default_test_without_e2e() {
    let mut fixture = TestFixture::create();
    let xlm = fixture.asset(AssetIndex::XLM);
    // a missing price only fails the scenarios
    fixture.pool.set_asset_price(&xlm, 0);
    fixture.config.run_e2e = false;
    let config = fixture.config.clone();

    let noop = |_: &mut MockPool| -> Result<(), PoolError> { Ok(()) };
    default_test(&mut fixture.pool, "no_e2e", &noop, &config).unwrap();

    fixture.config.run_e2e = true;
    let config = fixture.config.clone();
    assert_harness_error(
        default_test(&mut fixture.pool, "e2e", &noop, &config),
        HarnessError::InvalidPrice,
    );
}
