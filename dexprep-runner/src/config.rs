//! Pipeline configuration and dataset plan resolution.
//!
//! The config is a TOML file:
//!
//! ```toml
//! include_restricted = false
//! parallel = true
//!
//! [source]
//! data_dir = "../cdata/data"
//!
//! [output]
//! public_dir = "public/data"
//! summary_path = "src/data/datasets.json"
//! clean = true
//!
//! [datasets.fred_rates]
//! type = "fred"
//! description = "Treasury and policy rates"
//! primary_keys = ["date", "series_id"]
//! params = { series = ["DGS10", "FEDFUNDS"] }
//! ```
//!
//! Datasets keep their declaration order. Each one is classified exactly once,
//! when the config is turned into a list of [`DatasetPlan`]s.

use dexprep_core::{Category, Classifier, Metadata};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Whether restricted (price-series) datasets are published.
    #[serde(default = "default_true")]
    pub include_restricted: bool,

    /// Normalize datasets on the rayon pool instead of one at a time.
    #[serde(default)]
    pub parallel: bool,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default, deserialize_with = "declared_datasets")]
    pub datasets: Vec<DatasetConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    /// Directory holding `index.json` and the dataset files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// One `<name>.json` per dataset is written here.
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,

    /// The summary collection (all documents without `data`).
    #[serde(default = "default_summary_path")]
    pub summary_path: PathBuf,

    /// Remove `public_dir` before writing, dropping stale dataset files.
    #[serde(default)]
    pub clean: bool,
}

/// One declared dataset.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetConfig {
    /// Table key under `[datasets]`.
    #[serde(skip)]
    pub name: String,

    /// Declared source type (`yfinance`, `fred`, `bls`, `rss`, `fed_stress`).
    #[serde(rename = "type", default)]
    pub source_type: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub primary_keys: Vec<String>,

    /// Forwarded to the table provider untouched.
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl DatasetConfig {
    /// A dataset declared by name only; its category comes from the name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Metadata declared in the config, overlaid on the provider's.
    pub fn metadata(&self) -> Metadata {
        let mut meta = Metadata::new();
        if let Some(description) = &self.description {
            meta.insert("description", description.as_str());
        }
        if !self.primary_keys.is_empty() {
            meta.insert("primary_keys", self.primary_keys.clone());
        }
        meta
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            public_dir: default_public_dir(),
            summary_path: default_summary_path(),
            clean: false,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            include_restricted: true,
            parallel: false,
            source: SourceConfig::default(),
            output: OutputConfig::default(),
            datasets: Vec::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_public_dir() -> PathBuf {
    PathBuf::from("public/data")
}

fn default_summary_path() -> PathBuf {
    PathBuf::from("src/data/datasets.json")
}

/// `[datasets.<name>]` tables in declaration order.
fn declared_datasets<'de, D>(deserializer: D) -> Result<Vec<DatasetConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    let table = toml::Table::deserialize(deserializer)?;
    table
        .into_iter()
        .map(|(name, value)| {
            let mut dataset: DatasetConfig = value
                .try_into()
                .map_err(|e| D::Error::custom(format!("dataset '{name}': {e}")))?;
            dataset.name = name;
            Ok(dataset)
        })
        .collect()
}

impl PipelineConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Resolve every declared dataset to a plan entry.
    pub fn plan(&self, classifier: &Classifier) -> Vec<DatasetPlan> {
        plan_datasets(&self.datasets, classifier, self.include_restricted)
    }
}

/// What the pipeline will do with a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanAction {
    Process,
    /// Restricted category and the run excludes restricted data.
    ExcludeRestricted,
    /// No normalizer for this dataset.
    SkipUnknown,
}

/// A dataset with its category resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetPlan {
    pub name: String,
    pub category: Category,
    pub action: PlanAction,
    /// Config-declared metadata, overlaid on the provider's.
    pub metadata: Metadata,
    pub params: Map<String, Value>,
}

impl DatasetPlan {
    pub fn is_processed(&self) -> bool {
        self.action == PlanAction::Process
    }
}

/// Classify datasets and decide which ones run.
pub fn plan_datasets(
    datasets: &[DatasetConfig],
    classifier: &Classifier,
    include_restricted: bool,
) -> Vec<DatasetPlan> {
    datasets
        .iter()
        .map(|dataset| {
            let category = classifier.classify(&dataset.name, dataset.source_type.as_deref());
            let action = if !category.is_known() {
                PlanAction::SkipUnknown
            } else if category.is_restricted() && !include_restricted {
                PlanAction::ExcludeRestricted
            } else {
                PlanAction::Process
            };
            DatasetPlan {
                name: dataset.name.clone(),
                category,
                action,
                metadata: dataset.metadata(),
                params: dataset.params.clone(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dexprep_core::MacroSource;

    const SAMPLE: &str = r#"
include_restricted = false

[source]
data_dir = "cdata"

[output]
public_dir = "out/public"
summary_path = "out/datasets.json"
clean = true

[datasets.us_indices]
type = "yfinance"
description = "Major US indices"
primary_keys = ["date", "symbol"]
params = { symbols = ["^GSPC", "^DJI"], period = "1y" }

[datasets.fred_rates]
type = "fred"

[datasets.bls_cpi]
type = "bls"

[datasets.fed_news]

[datasets.mystery]
type = "scraper"
"#;

    #[test]
    fn test_parse_sample_config() {
        let config = PipelineConfig::from_toml(SAMPLE).unwrap();

        assert!(!config.include_restricted);
        assert!(!config.parallel);
        assert_eq!(config.source.data_dir, PathBuf::from("cdata"));
        assert_eq!(config.output.public_dir, PathBuf::from("out/public"));
        assert!(config.output.clean);

        let names: Vec<&str> = config.datasets.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["us_indices", "fred_rates", "bls_cpi", "fed_news", "mystery"]
        );

        let indices = &config.datasets[0];
        assert_eq!(indices.source_type.as_deref(), Some("yfinance"));
        assert_eq!(indices.params["period"], Value::from("1y"));
        assert_eq!(
            indices.metadata().get("primary_keys"),
            Some(&serde_json::json!(["date", "symbol"]))
        );
    }

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::from_toml("").unwrap();
        assert!(config.include_restricted);
        assert!(!config.parallel);
        assert!(config.datasets.is_empty());
        assert_eq!(config.output.summary_path, PathBuf::from("src/data/datasets.json"));
    }

    #[test]
    fn test_plan_resolves_categories_once() {
        let config = PipelineConfig::from_toml(SAMPLE).unwrap();
        let plan = config.plan(&Classifier::default());

        let summary: Vec<(&str, Category, PlanAction)> = plan
            .iter()
            .map(|p| (p.name.as_str(), p.category, p.action))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("us_indices", Category::PriceSeries, PlanAction::ExcludeRestricted),
                ("fred_rates", Category::MacroSeries(MacroSource::Fred), PlanAction::Process),
                ("bls_cpi", Category::MacroSeries(MacroSource::Bls), PlanAction::Process),
                ("fed_news", Category::NewsFeed, PlanAction::Process),
                ("mystery", Category::Unknown, PlanAction::SkipUnknown),
            ]
        );
    }

    #[test]
    fn test_restricted_included_by_default() {
        let plan = plan_datasets(&[DatasetConfig::named("us_indices")], &Classifier::default(), true);
        assert!(plan[0].is_processed());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = PipelineConfig::from_toml("paralel = true").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_bad_dataset_table_names_dataset() {
        let err = PipelineConfig::from_toml("[datasets.x]\nprimary_keys = 3\n").unwrap_err();
        assert!(err.to_string().contains("dataset 'x'"), "{err}");
    }
}
