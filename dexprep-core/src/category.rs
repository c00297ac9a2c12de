//! Dataset category classification.
//!
//! A dataset is classified once, from its declared source type or, failing
//! that, from its name. The resulting [`Category`] selects the normalizer
//! descriptor used for the rest of the run.

use std::collections::BTreeSet;
use std::fmt;

use crate::document::DocumentType;
use crate::normalize::descriptor::{Descriptor, BLS, FRED, NEWS, PRICE, STRESS};

/// Which macro-series publisher a dataset comes from. Both share one
/// normalizer and differ only in the published `type` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MacroSource {
    Fred,
    Bls,
}

/// Processing category of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    PriceSeries,
    MacroSeries(MacroSource),
    NewsFeed,
    StressScenario,
    Unknown,
}

impl Category {
    /// Normalizer descriptor, `None` for [`Category::Unknown`].
    pub fn descriptor(&self) -> Option<&'static Descriptor> {
        match self {
            Category::PriceSeries => Some(&PRICE),
            Category::MacroSeries(MacroSource::Fred) => Some(&FRED),
            Category::MacroSeries(MacroSource::Bls) => Some(&BLS),
            Category::NewsFeed => Some(&NEWS),
            Category::StressScenario => Some(&STRESS),
            Category::Unknown => None,
        }
    }

    pub fn document_type(&self) -> Option<DocumentType> {
        self.descriptor().map(|d| d.document_type)
    }

    /// Price series come from personal/research-use market data and can be
    /// excluded from public builds.
    pub fn is_restricted(&self) -> bool {
        matches!(self, Category::PriceSeries)
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Category::Unknown)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::PriceSeries => "price-series",
            Category::MacroSeries(_) => "macro-series",
            Category::NewsFeed => "news-feed",
            Category::StressScenario => "stress-scenario",
            Category::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// Map a declared source type tag to a category.
///
/// Returns `None` when the tag is not recognised.
pub fn category_for_type(declared_type: &str) -> Option<Category> {
    match declared_type.trim().to_ascii_lowercase().as_str() {
        "yfinance" | "ohlcv" | "price" => Some(Category::PriceSeries),
        "fred" => Some(Category::MacroSeries(MacroSource::Fred)),
        "bls" => Some(Category::MacroSeries(MacroSource::Bls)),
        "rss" | "news" => Some(Category::NewsFeed),
        "fed_stress" => Some(Category::StressScenario),
        _ => None,
    }
}

/// Name-set based classifier.
///
/// Holds the well-known dataset names for each category and the name
/// prefixes used by the macro and stress dataset families.
#[derive(Debug, Clone)]
pub struct Classifier {
    price: BTreeSet<String>,
    news: BTreeSet<String>,
    fred: BTreeSet<String>,
    bls: BTreeSet<String>,
    stress: BTreeSet<String>,
}

const PRICE_DATASETS: &[&str] = &[
    "us_indices",
    "global_indices",
    "treasury_yields",
    "bond_etfs",
    "currencies",
    "commodities",
    "sector_etfs",
    "macro_proxies",
];

const NEWS_DATASETS: &[&str] = &["fed_news", "financial_news", "economics_news"];

const FRED_DATASETS: &[&str] = &[
    "fred_gdp",
    "fred_employment",
    "fred_inflation",
    "fred_rates",
    "fred_money",
    "fred_housing",
    "fred_consumer",
    "fred_banking",
    "fred_stress_index",
    "fred_mev",
    "fred_market",
];

const BLS_DATASETS: &[&str] = &["bls_cpi", "bls_employment", "bls_wages", "bls_ppi", "bls_jolts"];

const STRESS_DATASETS: &[&str] = &["fed_stress_scenarios"];

impl Default for Classifier {
    fn default() -> Self {
        fn set(names: &[&str]) -> BTreeSet<String> {
            names.iter().map(|s| s.to_string()).collect()
        }
        Self {
            price: set(PRICE_DATASETS),
            news: set(NEWS_DATASETS),
            fred: set(FRED_DATASETS),
            bls: set(BLS_DATASETS),
            stress: set(STRESS_DATASETS),
        }
    }
}

impl Classifier {
    /// A classifier that knows no dataset names; only declared types resolve.
    pub fn empty() -> Self {
        Self {
            price: BTreeSet::new(),
            news: BTreeSet::new(),
            fred: BTreeSet::new(),
            bls: BTreeSet::new(),
            stress: BTreeSet::new(),
        }
    }

    /// Register an additional dataset name for a category.
    pub fn with_name(mut self, name: impl Into<String>, category: Category) -> Self {
        let name = name.into();
        match category {
            Category::PriceSeries => self.price.insert(name),
            Category::MacroSeries(MacroSource::Fred) => self.fred.insert(name),
            Category::MacroSeries(MacroSource::Bls) => self.bls.insert(name),
            Category::NewsFeed => self.news.insert(name),
            Category::StressScenario => self.stress.insert(name),
            Category::Unknown => false,
        };
        self
    }

    /// Resolve a dataset's category.
    ///
    /// A declared type wins; an unrecognised declared type is `Unknown`.
    /// Without a declared type the dataset name is matched against the known
    /// name sets, then the `fed_stress`, `fred_` and `bls_` prefixes.
    pub fn classify(&self, name: &str, declared_type: Option<&str>) -> Category {
        if let Some(declared) = declared_type {
            return category_for_type(declared).unwrap_or(Category::Unknown);
        }

        if self.price.contains(name) {
            Category::PriceSeries
        } else if self.news.contains(name) {
            Category::NewsFeed
        } else if self.fred.contains(name) {
            Category::MacroSeries(MacroSource::Fred)
        } else if self.bls.contains(name) {
            Category::MacroSeries(MacroSource::Bls)
        } else if self.stress.contains(name) || name.starts_with("fed_stress") {
            Category::StressScenario
        } else if name.starts_with("fred_") {
            Category::MacroSeries(MacroSource::Fred)
        } else if name.starts_with("bls_") {
            Category::MacroSeries(MacroSource::Bls)
        } else {
            Category::Unknown
        }
    }
}

/// Classify with the built-in name sets.
pub fn classify(name: &str, declared_type: Option<&str>) -> Category {
    Classifier::default().classify(name, declared_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_type_wins_over_name() {
        assert_eq!(classify("fed_news", Some("fred")), Category::MacroSeries(MacroSource::Fred));
        assert_eq!(classify("anything", Some("yfinance")), Category::PriceSeries);
        assert_eq!(classify("anything", Some("RSS")), Category::NewsFeed);
    }

    #[test]
    fn test_unrecognised_declared_type_is_unknown() {
        assert_eq!(classify("us_indices", Some("example")), Category::Unknown);
    }

    #[test]
    fn test_name_sets() {
        assert_eq!(classify("us_indices", None), Category::PriceSeries);
        assert_eq!(classify("economics_news", None), Category::NewsFeed);
        assert_eq!(classify("bls_cpi", None), Category::MacroSeries(MacroSource::Bls));
        assert_eq!(classify("fred_stress_index", None), Category::MacroSeries(MacroSource::Fred));
    }

    #[test]
    fn test_prefix_families() {
        assert_eq!(classify("fred_new_thing", None), Category::MacroSeries(MacroSource::Fred));
        assert_eq!(classify("bls_other", None), Category::MacroSeries(MacroSource::Bls));
        assert_eq!(classify("fed_stress_2025", None), Category::StressScenario);
        assert_eq!(classify("weather", None), Category::Unknown);
    }

    #[test]
    fn test_registered_names() {
        let classifier = Classifier::empty().with_name("spx", Category::PriceSeries);
        assert_eq!(classifier.classify("spx", None), Category::PriceSeries);
        assert_eq!(classifier.classify("us_indices", None), Category::Unknown);
    }

    #[test]
    fn test_document_types() {
        assert_eq!(Category::PriceSeries.document_type(), Some(DocumentType::Ohlcv));
        assert_eq!(
            Category::MacroSeries(MacroSource::Bls).document_type(),
            Some(DocumentType::Bls)
        );
        assert_eq!(Category::StressScenario.document_type(), Some(DocumentType::FedStress));
        assert_eq!(Category::Unknown.document_type(), None);
    }

    #[test]
    fn test_only_price_series_are_restricted() {
        assert!(Category::PriceSeries.is_restricted());
        assert!(!Category::NewsFeed.is_restricted());
        assert!(!Category::MacroSeries(MacroSource::Fred).is_restricted());
    }
}
