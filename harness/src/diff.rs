use serde::Serialize;

use crate::{
    report::address_label,
    snapshot::{EModeCategory, Snapshot},
    strategy::InterestStrategyValues,
};

/// A single field that changed value
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldChange {
    pub field: String,
    pub from: String,
    pub to: String,
}

impl FieldChange {
    fn new(field: &str, from: String, to: String) -> Self {
        FieldChange {
            field: field.to_string(),
            from,
            to,
        }
    }
}

/// The changes of one reserve, e-mode category or strategy
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EntryDiff {
    pub key: String,
    pub changes: Vec<FieldChange>,
}

/// Everything that differs between two snapshots
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDiff {
    pub from: String,
    pub to: String,
    pub listed_reserves: Vec<String>,
    pub removed_reserves: Vec<String>,
    pub reserves: Vec<EntryDiff>,
    pub emodes: Vec<EntryDiff>,
    pub strategies: Vec<EntryDiff>,
}

impl SnapshotDiff {
    /// Check if the snapshots are identical
    pub fn is_empty(&self) -> bool {
        self.listed_reserves.is_empty()
            && self.removed_reserves.is_empty()
            && self.reserves.is_empty()
            && self.emodes.is_empty()
            && self.strategies.is_empty()
    }
}

/// Diff two snapshots field by field
///
/// Reserves and strategies are matched by underlying asset and e-mode categories by id, so a
/// reserve that moved position is reported by its field changes only.
pub fn diff_snapshots(before: &Snapshot, after: &Snapshot) -> SnapshotDiff {
    let mut diff = SnapshotDiff {
        from: before.name.clone(),
        to: after.name.clone(),
        ..Default::default()
    };

    for reserve in after.reserves.iter() {
        match before
            .reserves
            .iter()
            .find(|prior| prior.underlying == reserve.underlying)
        {
            Some(prior) => {
                let changes: Vec<FieldChange> = prior
                    .changed_fields(reserve)
                    .into_iter()
                    .map(|(field, from, to)| FieldChange::new(field, from, to))
                    .collect();
                if !changes.is_empty() {
                    diff.reserves.push(EntryDiff {
                        key: reserve.symbol.clone(),
                        changes,
                    });
                }
            }
            None => diff.listed_reserves.push(reserve.symbol.clone()),
        }
    }
    for prior in before.reserves.iter() {
        if !after
            .reserves
            .iter()
            .any(|reserve| reserve.underlying == prior.underlying)
        {
            diff.removed_reserves.push(prior.symbol.clone());
        }
    }

    let emode_ids = before
        .emodes
        .iter()
        .chain(after.emodes.iter())
        .map(|category| category.id)
        .collect::<std::collections::BTreeSet<u32>>();
    for id in emode_ids {
        let from = before.emodes.iter().find(|category| category.id == id);
        let to = after.emodes.iter().find(|category| category.id == id);
        let changes = diff_fields(
            from.map(emode_fields).unwrap_or_default(),
            to.map(emode_fields).unwrap_or_default(),
        );
        if !changes.is_empty() {
            diff.emodes.push(EntryDiff {
                key: id.to_string(),
                changes,
            });
        }
    }

    for strategy in after.strategies.iter() {
        let prior = before
            .strategies
            .iter()
            .find(|prior| prior.asset == strategy.asset);
        let mut from = prior
            .map(|prior| strategy_fields(&prior.strategy.values()))
            .unwrap_or_default();
        let mut to = strategy_fields(&strategy.strategy.values());
        if let Some(prior) = prior {
            from.push(("address", address_label(&prior.address)));
        }
        to.push(("address", address_label(&strategy.address)));
        let changes = diff_fields(from, to);
        if !changes.is_empty() {
            diff.strategies.push(EntryDiff {
                key: strategy.symbol.clone(),
                changes,
            });
        }
    }
    diff
}

/// Pair two field lists by name, treating a field missing from one side as empty
fn diff_fields(
    from: Vec<(&'static str, String)>,
    to: Vec<(&'static str, String)>,
) -> Vec<FieldChange> {
    let mut changes: Vec<FieldChange> = Vec::new();
    for (field, to_value) in to.iter() {
        let from_value = from
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.clone())
            .unwrap_or_default();
        if &from_value != to_value {
            changes.push(FieldChange::new(field, from_value, to_value.clone()));
        }
    }
    for (field, from_value) in from.iter() {
        if !to.iter().any(|(name, _)| name == field) {
            changes.push(FieldChange::new(field, from_value.clone(), String::new()));
        }
    }
    changes
}

fn emode_fields(category: &EModeCategory) -> Vec<(&'static str, String)> {
    let optional = |value: Option<u128>| value.map(|v| v.to_string()).unwrap_or_default();
    vec![
        ("label", category.label.clone()),
        ("ltv", category.ltv.to_string()),
        (
            "liquidationThreshold",
            category.liquidation_threshold.to_string(),
        ),
        ("liquidationBonus", category.liquidation_bonus.to_string()),
        ("collateralBitmap", optional(category.collateral_bitmap)),
        ("borrowableBitmap", optional(category.borrowable_bitmap)),
        (
            "priceSource",
            category
                .price_source
                .as_ref()
                .map(address_label)
                .unwrap_or_default(),
        ),
    ]
}

fn strategy_fields(values: &InterestStrategyValues) -> Vec<(&'static str, String)> {
    vec![
        ("optimalUsageRatio", values.optimal_usage_ratio.to_string()),
        (
            "optimalStableToTotalDebtRatio",
            values.optimal_stable_to_total_debt_ratio.to_string(),
        ),
        (
            "baseVariableBorrowRate",
            values.base_variable_borrow_rate.to_string(),
        ),
        ("variableRateSlope1", values.variable_rate_slope1.to_string()),
        ("variableRateSlope2", values.variable_rate_slope2.to_string()),
        ("stableRateSlope1", values.stable_rate_slope1.to_string()),
        ("stableRateSlope2", values.stable_rate_slope2.to_string()),
        (
            "baseStableRateOffset",
            values.base_stable_rate_offset.to_string(),
        ),
        (
            "stableRateExcessOffset",
            values.stable_rate_excess_offset.to_string(),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        pool::{EModeShape, V2StrategyParams},
        reserve::tests::default_reserve_config,
        snapshot::StrategySnapshot,
        strategy::RateStrategy,
    };
    use soroban_sdk::{testutils::Address as _, Address, Env};

    fn snapshot(e: &Env, name: &str) -> Snapshot {
        let reserves = vec![
            default_reserve_config(e, "XLM"),
            default_reserve_config(e, "USDC"),
        ];
        let strategies = reserves
            .iter()
            .map(|reserve| StrategySnapshot {
                asset: reserve.underlying.clone(),
                symbol: reserve.symbol.clone(),
                address: reserve.interest_rate_strategy.clone(),
                strategy: RateStrategy::V2(V2StrategyParams {
                    optimal_usage_ratio: 8000,
                    base_variable_borrow_rate: 0,
                    variable_rate_slope1: 400,
                    variable_rate_slope2: 7500,
                }),
            })
            .collect();
        Snapshot {
            name: name.to_string(),
            pool: Address::generate(e),
            reserves,
            emodes: vec![EModeCategory {
                id: 1,
                shape: EModeShape::Bitmap,
                ltv: 9000,
                liquidation_threshold: 9300,
                liquidation_bonus: 10100,
                label: "Stablecoins".to_string(),
                collateral_bitmap: Some(0b10),
                borrowable_bitmap: Some(0b10),
                price_source: None,
            }],
            strategies,
            flash_loan_premium_total: 5,
        }
    }

    #[test]
    fn test_identical_snapshots() {
        let e = Env::default();
        let before = snapshot(&e, "before");
        let mut after = before.clone();
        after.name = "after".to_string();

        let diff = diff_snapshots(&before, &after);
        assert!(diff.is_empty());
        assert_eq!(diff.from, "before");
        assert_eq!(diff.to, "after");
    }

    #[test]
    fn test_diff_reserves_emodes_and_strategies() {
        let e = Env::default();
        let before = snapshot(&e, "before");
        let mut after = before.clone();
        after.reserves[1].supply_cap = 2_000_000;
        let listing = default_reserve_config(&e, "wETH");
        after.strategies.push(StrategySnapshot {
            asset: listing.underlying.clone(),
            symbol: listing.symbol.clone(),
            address: listing.interest_rate_strategy.clone(),
            strategy: after.strategies[0].strategy.clone(),
        });
        after.reserves.push(listing);
        after.emodes[0].ltv = 9300;
        after.emodes.push(EModeCategory {
            id: 2,
            shape: EModeShape::Bitmap,
            ltv: 9000,
            liquidation_threshold: 9300,
            liquidation_bonus: 10100,
            label: "ETH correlated".to_string(),
            collateral_bitmap: Some(0b100),
            borrowable_bitmap: Some(0b100),
            price_source: None,
        });
        after.strategies[0].strategy = RateStrategy::V2(V2StrategyParams {
            optimal_usage_ratio: 9000,
            base_variable_borrow_rate: 0,
            variable_rate_slope1: 400,
            variable_rate_slope2: 7500,
        });

        let diff = diff_snapshots(&before, &after);
        assert_eq!(diff.listed_reserves, vec!["wETH".to_string()]);
        assert!(diff.removed_reserves.is_empty());
        assert_eq!(
            diff.reserves,
            vec![EntryDiff {
                key: "USDC".to_string(),
                changes: vec![FieldChange::new(
                    "supplyCap",
                    "1000000".to_string(),
                    "2000000".to_string()
                )],
            }]
        );
        assert_eq!(diff.emodes.len(), 2);
        assert_eq!(diff.emodes[0].key, "1");
        assert_eq!(
            diff.emodes[0].changes,
            vec![FieldChange::new(
                "ltv",
                "9000".to_string(),
                "9300".to_string()
            )]
        );
        assert_eq!(diff.emodes[1].key, "2");
        assert_eq!(diff.strategies.len(), 2);
        assert_eq!(diff.strategies[0].key, "XLM");
        assert_eq!(diff.strategies[0].changes[0].field, "optimalUsageRatio");
        // the new listing's strategy is reported in full
        assert_eq!(diff.strategies[1].key, "wETH");
    }
}
