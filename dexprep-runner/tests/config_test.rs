//! The shipped sample config parses and plans as documented.

use dexprep_core::{Category, Classifier, MacroSource};
use dexprep_runner::{PipelineConfig, PlanAction};

const SAMPLE: &str = include_str!("../../datadex.toml");

#[test]
fn sample_config_plans_every_dataset() {
    let config = PipelineConfig::from_toml(SAMPLE).unwrap();
    let plans = config.plan(&Classifier::default());

    let categories: Vec<(&str, Category)> =
        plans.iter().map(|p| (p.name.as_str(), p.category)).collect();
    assert_eq!(
        categories,
        vec![
            ("us_indices", Category::PriceSeries),
            ("treasury_yields", Category::PriceSeries),
            ("fred_rates", Category::MacroSeries(MacroSource::Fred)),
            ("fred_inflation", Category::MacroSeries(MacroSource::Fred)),
            ("bls_employment", Category::MacroSeries(MacroSource::Bls)),
            ("fed_news", Category::NewsFeed),
            ("fed_stress_scenarios", Category::StressScenario),
        ]
    );
    assert!(plans.iter().all(|p| p.action == PlanAction::Process));
}

#[test]
fn excluding_restricted_only_touches_price_series() {
    let mut config = PipelineConfig::from_toml(SAMPLE).unwrap();
    config.include_restricted = false;
    let plans = config.plan(&Classifier::default());

    let excluded: Vec<&str> = plans
        .iter()
        .filter(|p| p.action == PlanAction::ExcludeRestricted)
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(excluded, vec!["us_indices", "treasury_yields"]);
}

#[test]
fn params_are_forwarded_verbatim() {
    let config = PipelineConfig::from_toml(SAMPLE).unwrap();
    let stress = config
        .datasets
        .iter()
        .find(|d| d.name == "fed_stress_scenarios")
        .unwrap();
    assert_eq!(stress.params["years"], serde_json::json!([2025, 2026]));
}
