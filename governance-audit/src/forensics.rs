//! Read access for audits and incident review.
//!
//! These functions read files directly. No engine component holds a handle
//! that can reach them.

use std::path::Path;

use governance_canon::HarmLogUse;
use serde::de::DeserializeOwned;
use tokio::fs;
use tracing::info;

use crate::error::{AuditError, AuditResult};
use crate::harm::ObservedHarmEntry;

/// Reads every record of a newline-delimited JSON journal, oldest first.
///
/// A missing file reads as empty.
///
/// # Errors
///
/// Propagates I/O errors and fails on the first undecodable line.
pub async fn read_journal<T: DeserializeOwned>(path: impl AsRef<Path>) -> AuditResult<Vec<T>> {
    let data = match fs::read(path.as_ref()).await {
        Ok(data) => data,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };

    let mut records = Vec::new();
    for chunk in data
        .split(|byte| *byte == b'\n')
        .filter(|chunk| !chunk.is_empty())
    {
        records.push(serde_json::from_slice(chunk)?);
    }
    Ok(records)
}

/// Reads the observed-harm ledger for a declared purpose.
///
/// # Errors
///
/// Returns [`AuditError::ProhibitedUse`] when `purpose` is not a permitted
/// use of the ledger, otherwise mirrors [`read_journal`].
pub async fn read_harm_ledger(
    path: impl AsRef<Path>,
    purpose: HarmLogUse,
) -> AuditResult<Vec<ObservedHarmEntry>> {
    if !purpose.is_permitted() {
        return Err(AuditError::ProhibitedUse(purpose));
    }
    info!(path = %path.as_ref().display(), purpose = %purpose, "reading observed-harm ledger");
    read_journal(path).await
}
