//! JSON output: serialise a value and write it atomically.
//!
//! Both pipeline phases write their whole result in one go. Writing to a
//! sibling temp file and renaming means a crash or a fatal error mid-run
//! never leaves a truncated JSON file where a previous good one stood.

use crate::error::TopicsError;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// Serialise `value` as pretty JSON and atomically write it to `path`,
/// creating parent directories as needed.
pub async fn write_json_atomic<T: Serialize + ?Sized>(
    path: impl AsRef<Path>,
    value: &T,
) -> Result<(), TopicsError> {
    let path = path.as_ref();
    let write_err = |source: std::io::Error| TopicsError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let body = serde_json::to_vec_pretty(value)
        .map_err(|e| TopicsError::Internal(format!("JSON serialisation failed: {e}")))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }
    }

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, &body).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;

    debug!("Wrote {} bytes to {}", body.len(), path.display());
    Ok(())
}
