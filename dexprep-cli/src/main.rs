//! dexprep CLI: prepare, plan and normalize commands.
//!
//! Commands:
//! - `prepare`: normalize every declared dataset and publish JSON for the site
//! - `plan`: show how each declared dataset would be handled
//! - `normalize`: normalize a single table file and print the document

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use dexprep_core::{normalize, Category, Classifier, Metadata, NormalizeContext};
use dexprep_runner::{
    plan_datasets, read_table_file, run_pipeline, DatasetConfig, DatasetPlan, DirectoryProvider,
    JsonPublisher, LogProgress, PipelineConfig, PlanAction, RunOptions, TableProvider,
};

/// Environment override for publishing restricted (price-series) datasets.
const INCLUDE_RESTRICTED_ENV: &str = "INCLUDE_RESTRICTED_DATA";

#[derive(Parser)]
#[command(
    name = "dexprep",
    about = "Normalize time-indexed datasets into canonical JSON documents"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize all declared datasets and write the JSON output.
    Prepare {
        /// Path to the pipeline TOML config.
        #[arg(long)]
        config: PathBuf,

        /// Override `[source] data_dir`.
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Override `[output] public_dir`.
        #[arg(long)]
        public_dir: Option<PathBuf>,

        /// Override `[output] summary_path`.
        #[arg(long)]
        summary_path: Option<PathBuf>,

        /// Leave restricted (price-series) datasets out of this run.
        #[arg(long, default_value_t = false)]
        exclude_restricted: bool,

        /// Process datasets in parallel.
        #[arg(long, default_value_t = false)]
        parallel: bool,
    },
    /// Print the resolved dataset plan without processing anything.
    Plan {
        /// Path to the pipeline TOML config.
        #[arg(long)]
        config: PathBuf,
    },
    /// Normalize one table file (.parquet, .csv, .json) and print it as JSON.
    Normalize {
        /// Table file to read.
        file: PathBuf,

        /// Dataset name. Defaults to the file stem.
        #[arg(long)]
        name: Option<String>,

        /// Source type (yfinance, fred, bls, rss, fed_stress). Defaults to
        /// classification by name.
        #[arg(long = "type")]
        source_type: Option<String>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Prepare {
            config,
            data_dir,
            public_dir,
            summary_path,
            exclude_restricted,
            parallel,
        } => run_prepare(
            &config,
            data_dir,
            public_dir,
            summary_path,
            exclude_restricted,
            parallel,
        ),
        Commands::Plan { config } => run_plan(&config),
        Commands::Normalize {
            file,
            name,
            source_type,
        } => run_normalize(&file, name, source_type),
    }
}

fn run_prepare(
    config_path: &Path,
    data_dir: Option<PathBuf>,
    public_dir: Option<PathBuf>,
    summary_path: Option<PathBuf>,
    exclude_restricted: bool,
    parallel: bool,
) -> Result<()> {
    let mut config = PipelineConfig::from_file(config_path)?;
    if let Some(dir) = data_dir {
        config.source.data_dir = dir;
    }
    if let Some(dir) = public_dir {
        config.output.public_dir = dir;
    }
    if let Some(path) = summary_path {
        config.output.summary_path = path;
    }
    config.include_restricted = resolve_include_restricted(
        config.include_restricted,
        std::env::var(INCLUDE_RESTRICTED_ENV).ok().as_deref(),
        exclude_restricted,
    );
    config.parallel |= parallel;

    if !config.include_restricted {
        tracing::info!("restricted datasets excluded from this run");
    }

    let provider = DirectoryProvider::open(&config.source.data_dir)
        .with_context(|| format!("open data dir {}", config.source.data_dir.display()))?;
    let plans = resolve_plan(&config, &provider);
    let publisher = JsonPublisher::new(&config.output.public_dir, &config.output.summary_path)
        .with_clean(config.output.clean);
    let options = RunOptions::new(chrono::Utc::now()).with_parallel(config.parallel);

    let summary = run_pipeline(&plans, &provider, &publisher, &LogProgress, &options)?;

    println!(
        "Processed {} of {} datasets ({} skipped)",
        summary.published.len(),
        summary.total,
        summary.skipped.len()
    );

    if !summary.all_succeeded() {
        eprintln!("Errors encountered:");
        for (name, err) in &summary.errors {
            eprintln!("  - {name}: {err}");
        }
        std::process::exit(1);
    }

    Ok(())
}

fn run_plan(config_path: &Path) -> Result<()> {
    let config = PipelineConfig::from_file(config_path)?;
    let plans = if config.datasets.is_empty() {
        let provider = DirectoryProvider::open(&config.source.data_dir)
            .with_context(|| format!("open data dir {}", config.source.data_dir.display()))?;
        resolve_plan(&config, &provider)
    } else {
        config.plan(&Classifier::default())
    };

    println!(
        "{:<28} {:<16} {:<10} action",
        "dataset", "category", "type"
    );
    for plan in &plans {
        let doc_type = plan
            .category
            .document_type()
            .map_or("-", |t| t.as_str());
        println!(
            "{:<28} {:<16} {:<10} {}",
            plan.name,
            plan.category,
            doc_type,
            action_label(plan.action)
        );
    }
    let processed = plans.iter().filter(|p| p.is_processed()).count();
    println!("\n{processed} of {} datasets will be processed", plans.len());
    Ok(())
}

fn run_normalize(file: &Path, name: Option<String>, source_type: Option<String>) -> Result<()> {
    let name = match name {
        Some(name) => name,
        None => file
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_string)
            .context("cannot derive a dataset name from the file; pass --name")?,
    };

    let category = Classifier::default().classify(&name, source_type.as_deref());
    if category == Category::Unknown {
        bail!("dataset '{name}' has an unknown category; pass --type");
    }

    let (table, format) = read_table_file(file)?;
    let ctx = NormalizeContext {
        fetched_at: chrono::Utc::now(),
        location: file.display().to_string(),
        format: format.as_str().to_string(),
    };
    let document = normalize(&name, category, &table, &Metadata::new(), &ctx)?;
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}

/// Plan from the config, or from the registry when the config declares no
/// datasets.
fn resolve_plan(config: &PipelineConfig, provider: &dyn TableProvider) -> Vec<DatasetPlan> {
    if !config.datasets.is_empty() {
        return config.plan(&Classifier::default());
    }
    let datasets: Vec<DatasetConfig> = provider
        .dataset_names()
        .into_iter()
        .map(DatasetConfig::named)
        .collect();
    tracing::info!(
        datasets = datasets.len(),
        "no datasets declared; using the registry"
    );
    plan_datasets(&datasets, &Classifier::default(), config.include_restricted)
}

/// Config value, then the environment, then `--exclude-restricted`.
fn resolve_include_restricted(configured: bool, env: Option<&str>, exclude_flag: bool) -> bool {
    if exclude_flag {
        return false;
    }
    match env.map(|v| v.trim().to_ascii_lowercase()) {
        Some(v) if v.is_empty() => configured,
        Some(v) => matches!(v.as_str(), "true" | "1" | "yes"),
        None => configured,
    }
}

fn action_label(action: PlanAction) -> &'static str {
    match action {
        PlanAction::Process => "process",
        PlanAction::ExcludeRestricted => "skip (restricted)",
        PlanAction::SkipUnknown => "skip (unknown category)",
    }
}
