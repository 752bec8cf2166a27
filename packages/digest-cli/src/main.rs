//! Command-line entry point for the table-of-contents digest.
//!
//! Reads every input file in a directory, summarizes its sections through an
//! OpenAI-compatible model and appends one row per file to a CSV table.
//! Re-running against the same table only processes files that are missing.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use toc_digest::ai::OpenAI;
use toc_digest::{
    CorrelationScope, CsvTable, NoSectionsPolicy, Pipeline, PipelineConfig, PipelineError,
    RunReport, Summarizer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "toc-digest")]
#[command(about = "Summarize documents section by section into a resumable CSV")]
struct Cli {
    /// Directory containing the input documents
    input_dir: PathBuf,

    /// CSV file rows are appended to (created with a header if missing)
    output_csv: PathBuf,

    /// JSON file with pipeline settings; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Files processed at the same time
    #[arg(long)]
    concurrency: Option<usize>,

    /// Reprocess files that already have a row
    #[arg(long)]
    no_resume: bool,

    /// Write no row for files where no section could be located
    #[arg(long)]
    skip_no_sections: bool,

    /// Compute the correlation summary over the whole document
    #[arg(long)]
    full_document_correlation: bool,

    /// Input file extension, without the dot (repeatable)
    #[arg(long = "extension")]
    extensions: Vec<String>,

    /// Chat model used for summaries
    #[arg(long, default_value = "gpt-4o-mini")]
    model: String,

    /// Base URL of an OpenAI-compatible API
    #[arg(long)]
    base_url: Option<String>,

    /// Attempts per model call, including the first
    #[arg(long)]
    max_attempts: Option<usize>,

    /// Per-file time budget in seconds (0 disables)
    #[arg(long)]
    file_timeout_secs: Option<u64>,
}

impl Cli {
    /// Defaults, then the config file, then flags.
    fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => PipelineConfig::default(),
        };

        if let Some(concurrency) = self.concurrency {
            config = config.with_concurrency(concurrency);
        }
        if self.no_resume {
            config = config.with_resume(false);
        }
        if self.skip_no_sections {
            config = config.with_no_sections(NoSectionsPolicy::Skip);
        }
        if self.full_document_correlation {
            config = config.with_correlation_scope(CorrelationScope::FullDocument);
        }
        if !self.extensions.is_empty() {
            config = config.with_extensions(
                self.extensions
                    .iter()
                    .map(|e| e.trim_start_matches('.').to_string()),
            );
        }
        if let Some(max_attempts) = self.max_attempts {
            config.summarizer = config.summarizer.with_max_attempts(max_attempts);
        }
        if let Some(secs) = self.file_timeout_secs {
            let timeout = (secs > 0).then(|| Duration::from_secs(secs));
            config = config.with_file_timeout(timeout);
        }

        Ok(config)
    }

    fn model(&self) -> Result<OpenAI> {
        let mut model = OpenAI::from_env()
            .context("Failed to configure model")?
            .with_model(&self.model);
        if let Some(base_url) = &self.base_url {
            model = model.with_base_url(base_url);
        }
        Ok(model)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,toc_digest=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.pipeline_config()?;
    let model = cli.model()?;
    tracing::info!(
        model = model.model(),
        concurrency = config.concurrency,
        resume = config.resume,
        "Starting digest of {}",
        cli.input_dir.display()
    );

    let summarizer = Arc::new(Summarizer::with_config(model, config.summarizer.clone()));
    let table = CsvTable::open(&cli.output_csv)
        .await
        .with_context(|| format!("Failed to open output table {}", cli.output_csv.display()))?;
    let pipeline = Pipeline::new(summarizer, table).with_config(config);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight files");
            on_interrupt.cancel();
        }
    });

    match pipeline.run_until_cancelled(&cli.input_dir, cancel).await {
        Ok(report) => {
            print_report(&report);
            if report.is_success() {
                Ok(())
            } else if report.cancelled {
                bail!("Run interrupted; re-run to process the remaining files")
            } else {
                bail!("{} files failed", report.failures.len())
            }
        }
        Err(PipelineError::Aborted { reason, report }) => {
            print_report(&report);
            bail!("Run aborted: {}", reason)
        }
        Err(e) => Err(e).context("Digest run failed"),
    }
}

fn print_report(report: &RunReport) {
    println!();
    println!("Files found:          {}", report.files_discovered);
    println!("Rows appended:        {}", report.rows_appended);
    println!("Already processed:    {}", report.skipped_existing);
    println!("No sections, skipped: {}", report.skipped_no_sections);
    println!("Failed:               {}", report.failures.len());
    for failure in &report.failures {
        println!("  - {}", failure);
    }
    if report.cancelled {
        println!("Stopped early; remaining files were not started.");
    }
}
