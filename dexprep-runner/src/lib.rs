//! dexprep runner: configuration, table providers, publishing and the
//! fail-at-end dataset pipeline.
//!
//! This crate builds on `dexprep-core` to provide:
//! - TOML pipeline config with datasets resolved once into a plan
//! - Table providers (registry directory of Parquet/CSV/JSON files, in-memory)
//! - JSON publisher with atomic writes
//! - Sequential or rayon-parallel orchestration with per-dataset error isolation

pub mod config;
pub mod pipeline;
pub mod progress;
pub mod provider;
pub mod publisher;

pub use config::{
    plan_datasets, ConfigError, DatasetConfig, DatasetPlan, OutputConfig, PipelineConfig,
    PlanAction, SourceConfig,
};
pub use pipeline::{
    run_pipeline, DatasetError, PipelineError, PipelineSummary, RunOptions, SkipReason,
};
pub use progress::{LogProgress, PipelineProgress};
pub use provider::{
    read_table_file, DirectoryProvider, MemoryProvider, ProviderError, SourceTable, TableFormat,
    TableProvider, TableRequest,
};
pub use publisher::{JsonPublisher, PublishError, Publisher};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn providers_are_send_sync() {
        assert_send::<DirectoryProvider>();
        assert_sync::<DirectoryProvider>();
        assert_send::<MemoryProvider>();
        assert_sync::<MemoryProvider>();
    }

    #[test]
    fn publisher_is_send_sync() {
        assert_send::<JsonPublisher>();
        assert_sync::<JsonPublisher>();
    }

    #[test]
    fn dataset_error_is_send_sync() {
        assert_send::<DatasetError>();
        assert_sync::<DatasetError>();
    }

    #[test]
    fn plan_is_send_sync() {
        assert_send::<DatasetPlan>();
        assert_sync::<DatasetPlan>();
    }
}
