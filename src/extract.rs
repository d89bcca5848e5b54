//! PDF text extraction.
//!
//! Extraction is best-effort: [`parse_pdf`] returns an empty string for a
//! document it cannot read, and [`batch_parse_pdfs`] keeps going past such
//! documents, recording them in its report. The chunk stage turns empty
//! text into zero chunks.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::progress::{ProgressEvent, ProgressReporter};

/// Extraction error for a single document.
#[derive(Debug)]
pub enum ExtractError {
    Io(std::io::Error),
    Pdf(String),
    /// The PDF parser panicked on malformed input.
    Panicked,
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::Io(e) => write!(f, "failed to read PDF: {}", e),
            ExtractError::Pdf(e) => write!(f, "PDF extraction failed: {}", e),
            ExtractError::Panicked => write!(f, "PDF extraction failed: parser panicked"),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Extract plain text from PDF bytes.
pub fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    // pdf-extract panics on some malformed inputs; keep that to one document.
    match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(ExtractError::Pdf(e.to_string())),
        Err(_) => Err(ExtractError::Panicked),
    }
}

/// Extract text from a PDF file, or return an empty string on failure.
pub fn parse_pdf(path: &Path) -> String {
    let result = fs::read(path)
        .map_err(ExtractError::Io)
        .and_then(|bytes| extract_pdf(&bytes));
    match result {
        Ok(text) => text,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "text extraction failed");
            String::new()
        }
    }
}

/// Outcome of [`batch_parse_pdfs`].
#[derive(Debug, Default)]
pub struct ParseReport {
    /// Text files written, one per PDF.
    pub written: Vec<PathBuf>,
    /// Stems of PDFs whose extracted text was empty.
    pub empty: Vec<String>,
}

/// Extract every `*.pdf` in `input_dir` into `output_dir/<stem>.txt`.
///
/// PDFs are processed in file-name order. A PDF that yields no text still
/// gets an (empty) text file and is listed in [`ParseReport::empty`].
pub fn batch_parse_pdfs(
    input_dir: &Path,
    output_dir: &Path,
    progress: &dyn ProgressReporter,
) -> Result<ParseReport> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let pdfs = list_files_with_extension(input_dir, "pdf")?;
    let total = pdfs.len();
    let mut report = ParseReport::default();

    for (i, pdf) in pdfs.iter().enumerate() {
        let stem = file_stem(pdf);
        let text = parse_pdf(pdf);
        if text.trim().is_empty() {
            progress.report(ProgressEvent::skipped("parse", &stem, "no text extracted"));
            report.empty.push(stem.clone());
        }

        let out_path = output_dir.join(format!("{}.txt", stem));
        fs::write(&out_path, &text)
            .with_context(|| format!("Failed to write {}", out_path.display()))?;
        report.written.push(out_path);
        progress.report(ProgressEvent::advanced("parse", i + 1, total));
    }

    info!(
        parsed = report.written.len(),
        empty = report.empty.len(),
        "parsed PDFs"
    );
    Ok(report)
}

/// Files in `dir` with the given extension, sorted by file name.
pub fn list_files_with_extension(dir: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to read directory {}", dir.display()))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some(ext) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

pub(crate) fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use tempfile::TempDir;

    #[test]
    fn test_garbage_bytes_yield_error() {
        assert!(extract_pdf(b"definitely not a pdf").is_err());
    }

    #[test]
    fn test_parse_missing_file_returns_empty() {
        assert_eq!(parse_pdf(Path::new("/nonexistent/paper.pdf")), "");
    }

    #[test]
    fn test_batch_continues_past_bad_pdf() {
        let tmp = TempDir::new().unwrap();
        let raw = tmp.path().join("raw");
        let out = tmp.path().join("text");
        fs::create_dir_all(&raw).unwrap();
        fs::write(raw.join("a.pdf"), b"garbage").unwrap();
        fs::write(raw.join("b.pdf"), b"more garbage").unwrap();
        fs::write(raw.join("notes.md"), b"ignored").unwrap();

        let report = batch_parse_pdfs(&raw, &out, &NoProgress).unwrap();
        assert_eq!(report.written.len(), 2);
        assert_eq!(report.empty, vec!["a".to_string(), "b".to_string()]);
        assert!(out.join("a.txt").exists());
        assert!(!out.join("notes.txt").exists());
    }

    #[test]
    fn test_list_files_sorted() {
        let tmp = TempDir::new().unwrap();
        for name in ["c.txt", "a.txt", "b.json", "b.txt"] {
            fs::write(tmp.path().join(name), "").unwrap();
        }
        let files = list_files_with_extension(tmp.path(), "txt").unwrap();
        let names: Vec<String> = files.iter().map(|p| file_stem(p)).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }
}
