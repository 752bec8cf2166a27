//! Integration tests for a full digest run.
//!
//! These tests drive the pipeline over a real directory into a real CSV
//! file:
//! 1. Discover input files
//! 2. Process them concurrently
//! 3. Append one row per file
//! 4. Resume without duplicating rows

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use toc_digest::error::SummarizeResult;
use toc_digest::{
    testing::MockModel, CsvTable, FileStage, Pipeline, PipelineConfig, PipelineError,
    ResultTable, SummaryModel, Summarizer, SummarizerConfig, COLUMNS, TOO_SHORT,
};

const REPORT: &str = "\
Publication Title: Coastal Risk Review
Author: Jane Doe
Date: 2022-06-01

1. Introduction
2. Findings
3. Outlook

Introduction
Climate change has increased insurance premiums along the coast. More at https://example.org/data.
Findings
Losses doubled over the decade while coverage shrank in exposed counties.
Outlook
Regulators expect further repricing.
";

/// Helper to write input files.
fn write_inputs(dir: &Path, files: &[(&str, &str)]) {
    for (name, text) in files {
        std::fs::write(dir.join(name), text).unwrap();
    }
}

/// Helper to build a summarizer that never waits between retries.
fn summarizer(model: MockModel) -> Arc<Summarizer<MockModel>> {
    Arc::new(Summarizer::with_config(
        model,
        SummarizerConfig::default().with_retry_backoff(Duration::ZERO),
    ))
}

/// Model that crashes on inputs containing `needle`.
struct CrashingModel {
    inner: MockModel,
    needle: &'static str,
}

#[async_trait]
impl SummaryModel for CrashingModel {
    async fn summarize(&self, input: &str) -> SummarizeResult<String> {
        if input.contains(self.needle) {
            panic!("model crashed on {:?}", self.needle);
        }
        self.inner.summarize(input).await
    }
}

#[tokio::test]
async fn test_run_writes_one_row_per_file() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let csv_path = output.path().join("digest.csv");
    write_inputs(
        input.path(),
        &[("alpha.txt", REPORT), ("beta.txt", REPORT), ("ignored.md", REPORT)],
    );

    let table = CsvTable::open(&csv_path).await.unwrap();
    let pipeline = Pipeline::new(summarizer(MockModel::new()), table);
    let report = pipeline.run(input.path()).await.unwrap();

    assert!(report.is_success());
    assert_eq!(report.files_discovered, 2);
    assert_eq!(report.rows_appended, 2);

    let raw = std::fs::read_to_string(&csv_path).unwrap();
    assert!(raw.starts_with(&COLUMNS.join(",")));
    assert_eq!(raw.lines().count(), 3);

    let mut rows = pipeline.table().rows().await.unwrap();
    rows.sort_by(|a, b| a.title.cmp(&b.title));
    assert_eq!(rows[0].title, "alpha");
    assert_eq!(rows[1].title, "beta");

    let row = &rows[0];
    assert!(row.extracted_text.starts_with("Introduction: Climate change"));
    assert!(row.extracted_text.contains(" | Findings: Losses doubled"));
    assert!(row.extracted_text.ends_with("Outlook: Regulators expect further repricing."));
    assert!(!row.extracted_text.contains("https://"));
    assert!(row.summary.starts_with("Summary: Climate change"));
    assert!(row.correlation_summary.starts_with("Summary: Climate change"));
    assert_eq!(row.author, "Jane Doe");
    assert_eq!(row.publication_title, "Coastal Risk Review");
    assert_eq!(row.date, "2022-06-01");
}

#[tokio::test]
async fn test_rerun_resumes_without_duplicates() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let csv_path = output.path().join("digest.csv");
    write_inputs(input.path(), &[("alpha.txt", REPORT)]);

    let first = Pipeline::new(summarizer(MockModel::new()), CsvTable::open(&csv_path).await.unwrap())
        .run(input.path())
        .await
        .unwrap();
    assert_eq!(first.rows_appended, 1);

    write_inputs(input.path(), &[("beta.txt", REPORT)]);
    let model = summarizer(MockModel::new());
    let pipeline = Pipeline::new(Arc::clone(&model), CsvTable::open(&csv_path).await.unwrap());
    let second = pipeline.run(input.path()).await.unwrap();

    assert_eq!(second.skipped_existing, 1);
    assert_eq!(second.rows_appended, 1);
    assert_eq!(pipeline.table().row_count().await.unwrap(), 2);
    // Only beta was summarized: one overall and one correlation call.
    assert_eq!(model.model().calls().len(), 2);
}

#[tokio::test]
async fn test_failing_file_leaves_no_row() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let csv_path = output.path().join("digest.csv");
    write_inputs(
        input.path(),
        &[
            ("alpha.txt", REPORT),
            (
                "broken.txt",
                "1. Body\n\nBody\nThis text is rejected by the model every single time it is sent.\n",
            ),
        ],
    );

    let model = MockModel::new().failing_on("rejected by the model");
    let pipeline = Pipeline::new(summarizer(model), CsvTable::open(&csv_path).await.unwrap());
    let report = pipeline.run(input.path()).await.unwrap();

    assert_eq!(report.rows_appended, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].stage, FileStage::Summarized);

    let titles = pipeline.table().processed_titles().await.unwrap();
    assert!(titles.contains("alpha"));
    assert!(!titles.contains("broken"));

    // A later run retries the failed file.
    let retry = Pipeline::new(summarizer(MockModel::new()), CsvTable::open(&csv_path).await.unwrap())
        .run(input.path())
        .await
        .unwrap();
    assert_eq!(retry.skipped_existing, 1);
    assert_eq!(retry.rows_appended, 1);
}

#[tokio::test]
async fn test_document_without_toc_is_summarized_whole() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_inputs(
        input.path(),
        &[
            ("plain.txt", "A short memo with no contents listing at all, only one paragraph of prose."),
            ("tiny.txt", "Too small."),
        ],
    );

    let table = CsvTable::open(output.path().join("digest.csv")).await.unwrap();
    let pipeline = Pipeline::new(summarizer(MockModel::new()), table);
    pipeline.run(input.path()).await.unwrap();

    let mut rows = pipeline.table().rows().await.unwrap();
    rows.sort_by(|a, b| a.title.cmp(&b.title));
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].title, "plain");
    assert!(rows[0].summary.starts_with("Summary: A short memo"));
    assert_eq!(rows[0].correlation_summary, "");
    assert_eq!(rows[1].summary, TOO_SHORT);
    assert_eq!(rows[1].author, "N/A");
}

#[tokio::test]
async fn test_cancel_before_start_writes_nothing() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_inputs(input.path(), &[("alpha.txt", REPORT), ("beta.txt", REPORT)]);

    let cancel = CancellationToken::new();
    cancel.cancel();

    let table = CsvTable::open(output.path().join("digest.csv")).await.unwrap();
    let pipeline = Pipeline::new(summarizer(MockModel::new()), table);
    let report = pipeline
        .run_until_cancelled(input.path(), cancel)
        .await
        .unwrap();

    assert!(report.cancelled);
    assert_eq!(report.rows_appended, 0);
    assert_eq!(pipeline.table().row_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_cancel_mid_run_keeps_in_flight_rows() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let csv_path = output.path().join("digest.csv");
    let files: Vec<(String, &str)> = (0..6).map(|i| (format!("doc{i}.txt"), REPORT)).collect();
    let named: Vec<(&str, &str)> = files.iter().map(|(n, t)| (n.as_str(), *t)).collect();
    write_inputs(input.path(), &named);

    let model = summarizer(MockModel::new().with_delay(Duration::from_millis(100)));
    let table = CsvTable::open(&csv_path).await.unwrap();
    let pipeline = Pipeline::new(Arc::clone(&model), table)
        .with_config(PipelineConfig::default().with_concurrency(2));

    let cancel = CancellationToken::new();
    let interrupt = async {
        while model.model().peak_in_flight() < 2 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        cancel.cancel();
    };
    let (report, ()) = tokio::join!(
        pipeline.run_until_cancelled(input.path(), cancel.clone()),
        interrupt
    );
    let report = report.unwrap();

    assert!(report.cancelled);
    assert!(report.failures.is_empty());
    assert_eq!(report.rows_appended, 2);
    assert_eq!(pipeline.table().row_count().await.unwrap(), 2);
    assert_eq!(std::fs::read_to_string(&csv_path).unwrap().lines().count(), 3);

    // The next run picks up the files that were never started.
    let rest = Pipeline::new(summarizer(MockModel::new()), CsvTable::open(&csv_path).await.unwrap())
        .run(input.path())
        .await
        .unwrap();
    assert_eq!(rest.skipped_existing, 2);
    assert_eq!(rest.rows_appended, 4);
}

#[tokio::test]
async fn test_model_panic_fails_only_that_file() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_inputs(
        input.path(),
        &[
            ("alpha.txt", REPORT),
            (
                "crash.txt",
                "1. Body\n\nBody\nThis section makes the model detonate every time it is read.\n",
            ),
            ("omega.txt", REPORT),
        ],
    );

    let model = CrashingModel {
        inner: MockModel::new(),
        needle: "detonate",
    };
    let summarizer = Arc::new(Summarizer::with_config(
        model,
        SummarizerConfig::default().with_retry_backoff(Duration::ZERO),
    ));
    let table = CsvTable::open(output.path().join("digest.csv")).await.unwrap();
    let pipeline = Pipeline::new(summarizer, table);
    let report = pipeline.run(input.path()).await.unwrap();

    assert_eq!(report.rows_appended, 2);
    assert_eq!(report.failures.len(), 1);
    let failure = &report.failures[0];
    assert!(failure.path.ends_with("crash.txt"));
    assert_eq!(failure.stage, FileStage::Summarized);
    assert!(matches!(&failure.error, PipelineError::WorkerPanic(msg) if msg.contains("detonate")));

    let titles = pipeline.table().processed_titles().await.unwrap();
    assert!(titles.contains("alpha"));
    assert!(titles.contains("omega"));
    assert!(!titles.contains("crash"));
}

#[tokio::test]
async fn test_concurrency_limit_is_respected() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let files: Vec<(String, &str)> = (0..6).map(|i| (format!("doc{i}.txt"), REPORT)).collect();
    let named: Vec<(&str, &str)> = files.iter().map(|(n, t)| (n.as_str(), *t)).collect();
    write_inputs(input.path(), &named);

    let model = summarizer(MockModel::new().with_delay(Duration::from_millis(20)));
    let table = CsvTable::open(output.path().join("digest.csv")).await.unwrap();
    let pipeline = Pipeline::new(Arc::clone(&model), table)
        .with_config(PipelineConfig::default().with_concurrency(2));
    let report = pipeline.run(input.path()).await.unwrap();

    assert_eq!(report.rows_appended, 6);
    assert_eq!(pipeline.table().row_count().await.unwrap(), 6);
    // Each file calls the model sequentially, so calls track files.
    assert!(model.model().peak_in_flight() <= 2);
    assert_eq!(model.model().calls().len(), 12);
}

#[tokio::test]
async fn test_missing_input_dir_is_an_error() {
    let output = tempfile::tempdir().unwrap();
    let table = CsvTable::open(output.path().join("digest.csv")).await.unwrap();
    let pipeline = Pipeline::new(summarizer(MockModel::new()), table);

    let result = pipeline.run(Path::new("/no/such/input/dir")).await;
    assert!(matches!(result, Err(PipelineError::Io { .. })));
}
