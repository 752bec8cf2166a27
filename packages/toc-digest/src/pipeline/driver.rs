//! Pipeline driver - discover files, fan out to workers, append rows.
//!
//! Workers run concurrently up to the configured limit. Only the driver
//! writes to the output table, one row at a time, as workers finish.

use std::collections::{HashMap, HashSet, VecDeque};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::FutureExt;
use tokio::task::{self, JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::error::{PipelineError, Result};
use crate::pipeline::process::{process_file, Progress};
use crate::pipeline::summarize::Summarizer;
use crate::traits::model::SummaryModel;
use crate::traits::table::ResultTable;
use crate::types::config::PipelineConfig;
use crate::types::document::Document;
use crate::types::row::{FileFailure, FileOutcome, FileStage, RunReport};

/// Batch driver over a directory of documents.
///
/// # Example
///
/// ```rust,ignore
/// let summarizer = Arc::new(Summarizer::new(OpenAI::from_env()?));
/// let table = CsvTable::open("out/results.csv").await?;
/// let report = Pipeline::new(summarizer, table).run(Path::new("docs")).await?;
/// println!("{} rows appended", report.rows_appended);
/// ```
pub struct Pipeline<M: SummaryModel + 'static, T: ResultTable> {
    summarizer: Arc<Summarizer<M>>,
    table: T,
    config: Arc<PipelineConfig>,
}

impl<M: SummaryModel + 'static, T: ResultTable> Pipeline<M, T> {
    /// Create a pipeline with default settings.
    pub fn new(summarizer: Arc<Summarizer<M>>, table: T) -> Self {
        Self {
            summarizer,
            table,
            config: Arc::new(PipelineConfig::default()),
        }
    }

    /// Use custom settings.
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    /// Current settings.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The output table.
    pub fn table(&self) -> &T {
        &self.table
    }

    /// Process every input file in `input_dir`.
    pub async fn run(&self, input_dir: &Path) -> Result<RunReport> {
        self.run_until_cancelled(input_dir, CancellationToken::new())
            .await
    }

    /// Process every input file in `input_dir`, stopping dispatch when
    /// `cancel` fires. Files already in flight are drained and appended.
    pub async fn run_until_cancelled(
        &self,
        input_dir: &Path,
        cancel: CancellationToken,
    ) -> Result<RunReport> {
        let files = discover_files(input_dir, &self.config).await?;
        info!(
            "Found {} input files in {}",
            files.len(),
            input_dir.display()
        );
        self.run_files(files, cancel).await
    }

    /// Process an explicit list of files.
    pub async fn run_files(
        &self,
        files: Vec<PathBuf>,
        cancel: CancellationToken,
    ) -> Result<RunReport> {
        let cancel = cancel.child_token();
        let mut report = RunReport::new();
        report.files_discovered = files.len();

        let done = if self.config.resume {
            self.table.processed_titles().await?
        } else {
            HashSet::new()
        };
        let mut queue = self.plan(files, &done, &mut report);

        let concurrency = self.config.concurrency.max(1);
        let mut workers = JoinSet::new();
        let mut in_flight: HashMap<task::Id, PathBuf> = HashMap::new();
        let mut abort_reason: Option<String> = None;

        loop {
            while workers.len() < concurrency && !cancel.is_cancelled() {
                let Some(path) = queue.pop_front() else {
                    break;
                };
                let handle = workers.spawn(self.worker(path.clone()));
                in_flight.insert(handle.id(), path);
            }

            if cancel.is_cancelled() && !queue.is_empty() && !report.cancelled {
                report.cancelled = true;
                info!(
                    remaining = queue.len(),
                    in_flight = workers.len(),
                    "Dispatch stopped, draining in-flight files"
                );
            }

            let Some(joined) = workers.join_next_with_id().await else {
                break;
            };

            let outcome = match joined {
                Ok((id, outcome)) => {
                    in_flight.remove(&id);
                    outcome
                }
                Err(e) => {
                    let failure = join_failure(&mut in_flight, e);
                    error!(path = %failure.path.display(), error = %failure.error, "Worker task failed to join");
                    report.failures.push(failure);
                    continue;
                }
            };

            match outcome {
                FileOutcome::Row { path, row } => match self.table.append(&row).await {
                    Ok(()) => {
                        report.rows_appended += 1;
                        debug!(path = %path.display(), stage = %FileStage::Appended, "Stage reached");
                    }
                    Err(e) => {
                        error!(
                            path = %path.display(),
                            error = %e,
                            "Output table unwritable, stopping dispatch"
                        );
                        abort_reason.get_or_insert_with(|| e.to_string());
                        cancel.cancel();
                        report.failures.push(FileFailure {
                            path,
                            stage: FileStage::Appended,
                            error: e.into(),
                        });
                    }
                },
                FileOutcome::NoSections { .. } => {
                    report.skipped_no_sections += 1;
                }
                FileOutcome::Failed(failure) => {
                    warn!("{}", failure);
                    report.failures.push(failure);
                }
            }
        }

        info!(
            appended = report.rows_appended,
            skipped_existing = report.skipped_existing,
            skipped_no_sections = report.skipped_no_sections,
            failed = report.failures.len(),
            cancelled = report.cancelled,
            "Run finished"
        );

        match abort_reason {
            Some(reason) => Err(PipelineError::Aborted {
                reason,
                report: Box::new(report),
            }),
            None => Ok(report),
        }
    }

    /// Order of work: skip titles already present and duplicate titles.
    fn plan(
        &self,
        files: Vec<PathBuf>,
        done: &HashSet<String>,
        report: &mut RunReport,
    ) -> VecDeque<PathBuf> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::with_capacity(files.len());

        for path in files {
            let title = Document::title_for(&path);
            if done.contains(&title) {
                debug!(title = %title, "Row exists, skipping");
                report.skipped_existing += 1;
            } else if !seen.insert(title.clone()) {
                warn!(
                    title = %title,
                    path = %path.display(),
                    "Another input file has the same title, skipping"
                );
                report.skipped_existing += 1;
            } else {
                queue.push_back(path);
            }
        }

        if report.skipped_existing > 0 {
            info!("Skipping {} files already in the output", report.skipped_existing);
        }
        queue
    }

    /// One file's task: full pipeline under a timeout, panics contained.
    fn worker(&self, path: PathBuf) -> impl Future<Output = FileOutcome> + Send + 'static {
        let summarizer = Arc::clone(&self.summarizer);
        let config = Arc::clone(&self.config);
        let span = info_span!("file", path = %path.display());

        async move {
            let progress = Progress::new();
            let work = AssertUnwindSafe(process_file(
                path.clone(),
                summarizer.as_ref(),
                config.as_ref(),
                &progress,
            ))
            .catch_unwind();

            let result = match config.file_timeout {
                Some(limit) => match tokio::time::timeout(limit, work).await {
                    Ok(result) => result,
                    Err(_) => {
                        return FileOutcome::failed(
                            path,
                            progress.attempting(),
                            PipelineError::Timeout(limit),
                        )
                    }
                },
                None => work.await,
            };

            match result {
                Ok(outcome) => outcome,
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    error!(panic = %message, "Worker panicked");
                    FileOutcome::failed(
                        path,
                        progress.attempting(),
                        PipelineError::WorkerPanic(message),
                    )
                }
            }
        }
        .instrument(span)
    }
}

/// Input files in `dir` with an accepted extension, sorted by path.
///
/// Subdirectories are not descended into.
pub async fn discover_files(dir: &Path, config: &PipelineConfig) -> Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| PipelineError::io(dir, e))?;

    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| PipelineError::io(dir, e))?
    {
        let path = entry.path();
        let accepted = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| config.accepts_extension(ext));
        if !accepted {
            continue;
        }
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Cannot stat input, skipping"),
        }
    }

    files.sort();
    Ok(files)
}

/// Failure for a task that ended without producing an outcome.
fn join_failure(in_flight: &mut HashMap<task::Id, PathBuf>, error: JoinError) -> FileFailure {
    FileFailure {
        path: in_flight.remove(&error.id()).unwrap_or_default(),
        stage: FileStage::Pending,
        error: PipelineError::WorkerPanic(error.to_string()),
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
