//! Property-based tests for dataset planning.
//!
//! - Plans keep declaration order and one entry per dataset
//! - Excluding restricted data only changes price-series entries
//! - Planning with every dataset restricted-eligible processes all known ones

use dexprep_core::{Category, Classifier};
use dexprep_runner::{plan_datasets, DatasetConfig, PlanAction};
use proptest::prelude::*;

const TYPES: [Option<&str>; 7] = [
    None,
    Some("yfinance"),
    Some("fred"),
    Some("bls"),
    Some("rss"),
    Some("fed_stress"),
    Some("scraped"),
];

const NAMES: [&str; 6] = [
    "us_indices",
    "fred_rates",
    "bls_employment",
    "fed_news",
    "fed_stress_2025",
    "misc_table",
];

fn arb_datasets() -> impl Strategy<Value = Vec<DatasetConfig>> {
    prop::collection::vec((0..NAMES.len(), 0..TYPES.len(), 0u32..1000), 0..20).prop_map(
        |entries| {
            entries
                .into_iter()
                .map(|(name, ty, suffix)| DatasetConfig {
                    name: format!("{}_{suffix}", NAMES[name]),
                    source_type: TYPES[ty].map(str::to_string),
                    ..DatasetConfig::default()
                })
                .collect()
        },
    )
}

proptest! {
    #[test]
    fn plan_preserves_declaration_order(datasets in arb_datasets()) {
        let plans = plan_datasets(&datasets, &Classifier::default(), true);
        prop_assert_eq!(plans.len(), datasets.len());
        for (plan, dataset) in plans.iter().zip(&datasets) {
            prop_assert_eq!(&plan.name, &dataset.name);
        }
    }

    #[test]
    fn exclusion_only_touches_price_series(datasets in arb_datasets()) {
        let classifier = Classifier::default();
        let included = plan_datasets(&datasets, &classifier, true);
        let excluded = plan_datasets(&datasets, &classifier, false);

        for (inc, exc) in included.iter().zip(&excluded) {
            prop_assert_eq!(inc.category, exc.category);
            if inc.category == Category::PriceSeries {
                prop_assert_eq!(exc.action, PlanAction::ExcludeRestricted);
            } else {
                prop_assert_eq!(inc.action, exc.action);
            }
        }
    }

    #[test]
    fn known_categories_are_processed_when_restricted_allowed(datasets in arb_datasets()) {
        let plans = plan_datasets(&datasets, &Classifier::default(), true);
        for plan in &plans {
            let expected = if plan.category.is_known() {
                PlanAction::Process
            } else {
                PlanAction::SkipUnknown
            };
            prop_assert_eq!(plan.action, expected);
        }
    }
}
