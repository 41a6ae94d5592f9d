//! Input resolution: validate a PDF path, and load the intermediate page
//! document produced by extraction.
//!
//! We check existence, read permission, and the PDF magic bytes (`%PDF`)
//! before handing the path to the backend so callers get a meaningful error
//! rather than an opaque pdfium failure.

use crate::error::TopicsError;
use crate::output::ExtractedDocument;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validate that `path` is an existing, readable PDF file.
pub fn resolve_pdf(path: impl AsRef<Path>) -> Result<PathBuf, TopicsError> {
    let path = path.as_ref().to_path_buf();

    if !path.is_file() {
        return Err(TopicsError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(TopicsError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(TopicsError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(TopicsError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path)
}

/// Read an intermediate `{ "pages": [...], "metadata": {...} }` document.
pub async fn read_document(path: impl AsRef<Path>) -> Result<ExtractedDocument, TopicsError> {
    let path = path.as_ref();

    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => TopicsError::FileNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => TopicsError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => TopicsError::InvalidDocument {
            path: path.to_path_buf(),
            detail: e.to_string(),
        },
    })?;

    let doc: ExtractedDocument =
        serde_json::from_slice(&bytes).map_err(|e| TopicsError::InvalidDocument {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

    debug!("Loaded {} pages from {}", doc.pages.len(), path.display());
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_pdf_is_not_found() {
        let err = resolve_pdf("/definitely/not/a/real/file.pdf").unwrap_err();
        assert!(matches!(err, TopicsError::FileNotFound { .. }));
    }

    #[test]
    fn directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_pdf(dir.path()).unwrap_err();
        assert!(matches!(err, TopicsError::FileNotFound { .. }));
    }

    #[test]
    fn wrong_magic_is_rejected() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"PK\x03\x04 not a pdf").unwrap();
        let err = resolve_pdf(f.path()).unwrap_err();
        assert!(matches!(err, TopicsError::NotAPdf { magic, .. } if &magic == b"PK\x03\x04"));
    }

    #[test]
    fn pdf_magic_is_accepted() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"%PDF-1.7\n").unwrap();
        assert_eq!(resolve_pdf(f.path()).unwrap(), f.path());
    }

    #[tokio::test]
    async fn read_document_rejects_missing_pages() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(br#"{"metadata": {}}"#).unwrap();
        let err = read_document(f.path()).await.unwrap_err();
        assert!(matches!(err, TopicsError::InvalidDocument { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn read_document_missing_file() {
        let err = read_document("/no/such/pages.json").await.unwrap_err();
        assert!(matches!(err, TopicsError::FileNotFound { .. }));
    }
}
