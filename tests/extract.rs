//! Extraction phase against a fake PDF backend.
//!
//! The backend returns canned page text, so these tests cover file checks,
//! cleanup, numbering and metadata without a pdfium library.

use pdf_topics::{
    extract_document, extract_to_file, ExtractedDocument, PdfBackend, RawDocument, TopicsError,
};
use serde_json::{json, Value};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

struct FakeBackend {
    raw: RawDocument,
}

impl PdfBackend for FakeBackend {
    fn load(&self, _path: &Path) -> Result<RawDocument, TopicsError> {
        Ok(self.raw.clone())
    }
}

struct FailingBackend;

impl PdfBackend for FailingBackend {
    fn load(&self, path: &Path) -> Result<RawDocument, TopicsError> {
        Err(TopicsError::CorruptPdf {
            path: path.to_path_buf(),
            detail: "xref table missing".into(),
        })
    }
}

fn backend(pages: &[&str]) -> Arc<FakeBackend> {
    Arc::new(FakeBackend {
        raw: RawDocument {
            pages: pages.iter().map(|s| s.to_string()).collect(),
            properties: vec![
                ("/Title".into(), Some(json!("Control and Coordination"))),
                ("/Producer".into(), Some(json!("pdfTeX-1.40"))),
                ("/Subject".into(), None),
                ("/ModDate".into(), Some(json!("D:20240301093000+05'30'"))),
            ],
        },
    })
}

fn fake_pdf(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("chapter6.pdf");
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(b"%PDF-1.7\n% fake body for tests\n").unwrap();
    path
}

#[tokio::test]
async fn pages_are_numbered_cleaned_and_counted() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = fake_pdf(dir.path());
    let be = backend(&[
        "Control\nand\tCoordination",
        "The nervous   system system reflex.",
        "caf\u{e9} square reflex",
    ]);

    let doc = extract_document(&pdf, be).await.unwrap();

    assert_eq!(doc.pages.len(), 3);
    let numbers: Vec<u32> = doc.pages.iter().map(|p| p.page_number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert_eq!(doc.pages[0].text, "Control and Coordination");
    assert_eq!(doc.pages[1].text, "The nervous system reflex.");
    assert_eq!(doc.pages[2].text, "cafe reflex");
    assert_eq!(doc.pages[2].word_count, 2);
    assert_eq!(doc.pages[2].char_count, 11);
}

#[tokio::test]
async fn metadata_is_normalised_with_statistics() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = fake_pdf(dir.path());
    let size = std::fs::metadata(&pdf).unwrap().len();

    let doc = extract_document(&pdf, backend(&["one two", "three four five six"]))
        .await
        .unwrap();

    let m = &doc.metadata;
    assert_eq!(m["title"], json!("Control and Coordination"));
    assert_eq!(m["producer"], json!("pdfTeX-1.40"));
    assert!(m.get("subject").is_none());
    assert_eq!(m["modification_date"], json!("2024-03-01T09:30:00"));
    assert_eq!(m["num_pages"], json!(2));
    assert_eq!(m["total_word_count"], json!(6));
    assert_eq!(m["avg_words_per_page"], json!(3.0));
    assert_eq!(m["file_name"], json!("chapter6.pdf"));
    assert_eq!(m["file_size_bytes"], json!(size));
}

#[tokio::test]
async fn missing_file_is_file_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = extract_document(dir.path().join("nope.pdf"), backend(&["x"]))
        .await
        .unwrap_err();
    assert!(matches!(err, TopicsError::FileNotFound { .. }), "got {err:?}");
}

#[tokio::test]
async fn directory_is_file_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = extract_document(dir.path(), backend(&["x"]))
        .await
        .unwrap_err();
    assert!(matches!(err, TopicsError::FileNotFound { .. }), "got {err:?}");
}

#[tokio::test]
async fn non_pdf_is_rejected_before_the_backend_runs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.pdf");
    std::fs::write(&path, b"just some text").unwrap();

    let err = extract_document(&path, Arc::new(FailingBackend))
        .await
        .unwrap_err();
    assert!(matches!(err, TopicsError::NotAPdf { .. }), "got {err:?}");
}

#[tokio::test]
async fn backend_errors_propagate() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = fake_pdf(dir.path());

    let err = extract_document(&pdf, Arc::new(FailingBackend))
        .await
        .unwrap_err();
    assert!(matches!(err, TopicsError::CorruptPdf { .. }), "got {err:?}");
}

#[tokio::test]
async fn extract_to_file_writes_the_page_document() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = fake_pdf(dir.path());
    let out = dir.path().join("out/pages.json");

    let doc = extract_to_file(&pdf, &out, backend(&["alpha beta.", "gamma"]))
        .await
        .unwrap();

    let written: Value = serde_json::from_slice(&std::fs::read(&out).unwrap()).unwrap();
    assert_eq!(written["pages"][0]["page_number"], json!(1));
    assert_eq!(written["pages"][0]["text"], json!("alpha beta."));
    assert_eq!(written["pages"][0]["sentence_count"], json!(2));
    assert_eq!(written["metadata"]["num_pages"], json!(2));

    let back: ExtractedDocument = serde_json::from_value(written).unwrap();
    assert_eq!(back, doc);
}

/// Live check against a real PDF and pdfium. Opt in with `E2E_ENABLED=1`
/// and point `PDF_TOPICS_E2E_PDF` at a document.
#[tokio::test]
async fn e2e_pdfium_extraction() {
    if std::env::var("E2E_ENABLED").is_err() {
        return;
    }
    let Ok(path) = std::env::var("PDF_TOPICS_E2E_PDF") else {
        return;
    };

    let doc = extract_document(&path, Arc::new(pdf_topics::PdfiumBackend::new()))
        .await
        .unwrap();
    assert!(!doc.pages.is_empty());
    assert_eq!(doc.metadata["num_pages"], json!(doc.pages.len()));
}
