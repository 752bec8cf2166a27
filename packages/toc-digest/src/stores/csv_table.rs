//! Append-only CSV output table.
//!
//! Every row occupies exactly one physical line: line breaks inside fields
//! are replaced with spaces before writing. A crash can therefore only leave
//! a torn last line, which is cut off when the table is reopened.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::{TableError, TableResult};
use crate::traits::table::ResultTable;
use crate::types::row::{OutputRow, COLUMNS};

/// CSV file that rows are appended to across runs.
pub struct CsvTable {
    path: PathBuf,
    file: Mutex<File>,
}

impl CsvTable {
    /// Open `path`, creating it with a header if it is missing or empty.
    ///
    /// An existing file must carry the expected header.
    pub async fn open(path: impl Into<PathBuf>) -> TableResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(parent, e))?;
        }

        let existing = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(io_error(&path, e)),
        };

        let header = encode_header()?;
        let complete = complete_prefix(&existing);
        if complete > 0 {
            check_header(&path, &existing[..complete])?;
        } else if !header.starts_with(&existing) {
            // With no complete line, only a torn header may be truncated.
            return Err(TableError::HeaderMismatch {
                path,
                found: first_record(&existing),
            });
        }

        if complete < existing.len() {
            warn!(
                path = %path.display(),
                dropped_bytes = existing.len() - complete,
                "Dropping torn last line from output table"
            );
            let file = OpenOptions::new()
                .write(true)
                .open(&path)
                .await
                .map_err(|e| io_error(&path, e))?;
            file.set_len(complete as u64)
                .await
                .map_err(|e| io_error(&path, e))?;
            file.sync_all().await.map_err(|e| io_error(&path, e))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| io_error(&path, e))?;

        if complete == 0 {
            write_durably(&mut file, &header)
                .await
                .map_err(|e| io_error(&path, e))?;
            info!(path = %path.display(), "CSV initialized");
        }

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Path of the table.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every row currently in the table.
    pub async fn rows(&self) -> TableResult<Vec<OutputRow>> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| io_error(&self.path, e))?;
        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let mut rows = Vec::new();
        for row in reader.deserialize::<OutputRow>() {
            rows.push(row?);
        }
        Ok(rows)
    }
}

#[async_trait]
impl ResultTable for CsvTable {
    async fn append(&self, row: &OutputRow) -> TableResult<()> {
        let bytes = encode_row(row)?;
        let mut file = self.file.lock().await;
        write_durably(&mut file, &bytes)
            .await
            .map_err(|e| io_error(&self.path, e))?;
        info!(title = %row.title, "Row appended to CSV");
        Ok(())
    }

    async fn processed_titles(&self) -> TableResult<HashSet<String>> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| io_error(&self.path, e))?;
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(bytes.as_slice());

        let mut titles = HashSet::new();
        for record in reader.records() {
            match record {
                Ok(record) => {
                    if let Some(title) = record.get(0) {
                        titles.insert(title.to_string());
                    }
                }
                Err(e) => warn!(path = %self.path.display(), error = %e, "Skipping unreadable row"),
            }
        }
        Ok(titles)
    }

    async fn row_count(&self) -> TableResult<usize> {
        Ok(self.rows().await?.len())
    }
}

fn io_error(path: &Path, source: std::io::Error) -> TableError {
    TableError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Length of the prefix ending in the last newline.
fn complete_prefix(bytes: &[u8]) -> usize {
    bytes
        .iter()
        .rposition(|&b| b == b'\n')
        .map(|idx| idx + 1)
        .unwrap_or(0)
}

/// Fields of the first record, or nothing if it does not parse.
fn first_record(bytes: &[u8]) -> Vec<String> {
    let mut reader = csv::Reader::from_reader(bytes);
    reader
        .headers()
        .map(|record| record.iter().map(str::to_string).collect())
        .unwrap_or_default()
}

fn check_header(path: &Path, bytes: &[u8]) -> TableResult<()> {
    let found = first_record(bytes);
    if found.iter().map(String::as_str).eq(COLUMNS.iter().copied()) {
        Ok(())
    } else {
        Err(TableError::HeaderMismatch {
            path: path.to_path_buf(),
            found,
        })
    }
}

fn encode_header() -> TableResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(COLUMNS)?;
    finish(writer)
}

fn encode_row(row: &OutputRow) -> TableResult<Vec<u8>> {
    let flat = OutputRow {
        title: single_line(&row.title),
        extracted_text: single_line(&row.extracted_text),
        summary: single_line(&row.summary),
        correlation_summary: single_line(&row.correlation_summary),
        author: single_line(&row.author),
        publication_title: single_line(&row.publication_title),
        date: single_line(&row.date),
    };
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.serialize(&flat)?;
    finish(writer)
}

fn finish(writer: csv::Writer<Vec<u8>>) -> TableResult<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| TableError::Csv(csv::Error::from(e.into_error())))
}

fn single_line(field: &str) -> String {
    if field.contains(['\n', '\r']) {
        field.replace("\r\n", " ").replace(['\n', '\r'], " ")
    } else {
        field.to_string()
    }
}

async fn write_durably(file: &mut File, bytes: &[u8]) -> std::io::Result<()> {
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_data().await
}
