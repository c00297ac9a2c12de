//! Fail-at-end dataset pipeline.
//!
//! For each planned dataset: fetch the raw table, normalize it, publish the
//! full document and keep its summary. A failing dataset is recorded and the
//! run moves on; the summary collection is written once every dataset has
//! been attempted. Only a failure to prepare the output or to write the
//! summary collection aborts the run.

use chrono::{DateTime, Utc};
use dexprep_core::{normalize, DocumentSummary, NormalizeContext, NormalizeError};
use rayon::prelude::*;
use std::fmt;
use thiserror::Error;

use crate::config::{DatasetPlan, PlanAction};
use crate::progress::PipelineProgress;
use crate::provider::{ProviderError, TableProvider, TableRequest};
use crate::publisher::{PublishError, Publisher};

/// Why a single dataset failed. Recorded, never fatal to the run.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}

/// Errors that abort the whole run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("prepare output: {0}")]
    Prepare(#[source] PublishError),

    #[error("write summary collection: {0}")]
    SummaryCollection(#[source] PublishError),
}

/// Why a dataset produced no document without counting as a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Restricted category excluded from this run.
    Restricted,
    /// No normalizer for the dataset's category.
    UnknownCategory,
    /// The provider has no backing data for it.
    NotFound(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Restricted => f.write_str("restricted dataset excluded"),
            SkipReason::UnknownCategory => f.write_str("unknown dataset category"),
            SkipReason::NotFound(reason) => write!(f, "no data ({reason})"),
        }
    }
}

/// Run-wide settings.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Stamped into every document's `meta.fetched_at`.
    pub fetched_at: DateTime<Utc>,
    /// Process datasets on the rayon pool.
    pub parallel: bool,
}

impl RunOptions {
    pub fn new(fetched_at: DateTime<Utc>) -> Self {
        Self {
            fetched_at,
            parallel: false,
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Outcome of a whole run.
#[derive(Debug, Default)]
pub struct PipelineSummary {
    pub total: usize,
    /// Names of published datasets, in plan order.
    pub published: Vec<String>,
    pub skipped: Vec<(String, SkipReason)>,
    pub errors: Vec<(String, DatasetError)>,
    /// What was written as the summary collection, in plan order.
    pub summaries: Vec<DocumentSummary>,
}

impl PipelineSummary {
    pub fn all_succeeded(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn failed(&self) -> usize {
        self.errors.len()
    }
}

enum Outcome {
    Published(DocumentSummary),
    Skipped(SkipReason),
    Failed(DatasetError),
}

/// Run every planned dataset through provider, normalizer and publisher.
///
/// Results are merged in plan order, so sequential and parallel runs produce
/// the same summary collection.
pub fn run_pipeline(
    plans: &[DatasetPlan],
    provider: &dyn TableProvider,
    publisher: &dyn Publisher,
    progress: &dyn PipelineProgress,
    options: &RunOptions,
) -> Result<PipelineSummary, PipelineError> {
    publisher.prepare().map_err(PipelineError::Prepare)?;

    let total = plans.len();
    let run_one = |(index, plan): (usize, &DatasetPlan)| -> Outcome {
        let outcome = match plan.action {
            PlanAction::ExcludeRestricted => Outcome::Skipped(SkipReason::Restricted),
            PlanAction::SkipUnknown => Outcome::Skipped(SkipReason::UnknownCategory),
            PlanAction::Process => {
                progress.on_start(&plan.name, index, total);
                match process_dataset(plan, provider, publisher, options) {
                    Ok((summary, rows)) => {
                        progress.on_complete(&plan.name, index, total, Ok(rows));
                        Outcome::Published(summary)
                    }
                    Err(DatasetError::Provider(e)) if e.is_not_found() => {
                        Outcome::Skipped(SkipReason::NotFound(e.to_string()))
                    }
                    Err(e) => {
                        progress.on_complete(&plan.name, index, total, Err(&e));
                        Outcome::Failed(e)
                    }
                }
            }
        };
        if let Outcome::Skipped(reason) = &outcome {
            progress.on_skip(&plan.name, reason);
        }
        outcome
    };

    let outcomes: Vec<Outcome> = if options.parallel {
        plans.par_iter().enumerate().map(run_one).collect()
    } else {
        plans.iter().enumerate().map(run_one).collect()
    };

    let mut summary = PipelineSummary {
        total,
        ..PipelineSummary::default()
    };
    for (plan, outcome) in plans.iter().zip(outcomes) {
        match outcome {
            Outcome::Published(doc) => {
                summary.published.push(plan.name.clone());
                summary.summaries.push(doc);
            }
            Outcome::Skipped(reason) => summary.skipped.push((plan.name.clone(), reason)),
            Outcome::Failed(e) => summary.errors.push((plan.name.clone(), e)),
        }
    }

    publisher
        .emit_summary_collection(&summary.summaries)
        .map_err(PipelineError::SummaryCollection)?;

    progress.on_batch_complete(
        summary.published.len(),
        summary.skipped.len(),
        summary.failed(),
    );
    Ok(summary)
}

/// Fetch, normalize and publish one dataset. Returns the summary and the
/// number of published `data` rows.
fn process_dataset(
    plan: &DatasetPlan,
    provider: &dyn TableProvider,
    publisher: &dyn Publisher,
    options: &RunOptions,
) -> Result<(DocumentSummary, usize), DatasetError> {
    let _span = tracing::info_span!("dataset", name = %plan.name, category = %plan.category)
        .entered();

    let source = provider.get_table(&TableRequest::new(&plan.name, &plan.params))?;
    tracing::debug!(rows = source.table.len(), "fetched table");

    let mut metadata = source.metadata;
    for (key, value) in plan.metadata.iter() {
        metadata.insert(key.clone(), value.clone());
    }

    let ctx = NormalizeContext {
        fetched_at: options.fetched_at,
        location: provider.name().to_string(),
        format: source.format,
    };
    let document = normalize(&plan.name, plan.category, &source.table, &metadata, &ctx)?;
    publisher.emit(&plan.name, &document)?;
    Ok((document.summary(), document.data.len()))
}
