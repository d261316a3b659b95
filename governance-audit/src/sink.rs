//! Append-only decision trace sinks.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::AuditResult;
use crate::trace::DecisionTrace;

/// Destination for decision traces.
///
/// Sinks accept writes only. Reading traces back is a forensic activity and
/// lives in [`crate::forensics`], away from anything the decision path holds.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Appends a trace.
    async fn append(&self, trace: &DecisionTrace) -> AuditResult<()>;
}

/// Appends one JSON line to an open file and flushes it.
pub(crate) async fn append_json_line<T: serde::Serialize + Sync>(
    file: &Mutex<fs::File>,
    value: &T,
) -> AuditResult<()> {
    let line = serde_json::to_vec(value)?;
    let mut guard = file.lock().await;
    guard.write_all(&line).await?;
    guard.write_u8(b'\n').await?;
    guard.flush().await?;
    Ok(())
}

/// Opens (or creates) a file for appending, creating parent directories.
pub(crate) async fn open_append(path: &Path) -> AuditResult<fs::File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    Ok(OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?)
}

/// File-backed journal writing newline-delimited JSON traces.
#[derive(Debug)]
pub struct FileAuditJournal {
    path: PathBuf,
    file: Mutex<fs::File>,
}

impl FileAuditJournal {
    /// Opens (or creates) a journal file at the provided path.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors encountered while preparing the file.
    pub async fn open(path: impl Into<PathBuf>) -> AuditResult<Self> {
        let path = path.into();
        let file = open_append(&path).await?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Returns the underlying path of the journal file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AuditSink for FileAuditJournal {
    async fn append(&self, trace: &DecisionTrace) -> AuditResult<()> {
        append_json_line(&self.file, trace).await
    }
}

/// In-process sink keeping every trace in memory.
#[derive(Debug, Default)]
pub struct InMemoryAuditSink {
    traces: Mutex<Vec<DecisionTrace>>,
}

impl InMemoryAuditSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every trace appended so far, oldest first.
    pub async fn snapshot(&self) -> Vec<DecisionTrace> {
        self.traces.lock().await.clone()
    }

    /// Returns the number of traces appended so far.
    pub async fn len(&self) -> usize {
        self.traces.lock().await.len()
    }

    /// Returns true when nothing was appended.
    pub async fn is_empty(&self) -> bool {
        self.traces.lock().await.is_empty()
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditSink {
    async fn append(&self, trace: &DecisionTrace) -> AuditResult<()> {
        self.traces.lock().await.push(trace.clone());
        Ok(())
    }
}
