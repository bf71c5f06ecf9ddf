// src/report/source.rs
use std::fs;
use std::path::Path;

use crate::utils::error::SourceError;

/// Page separator emitted by common text extractors (form feed).
const PAGE_BREAK: char = '\u{0C}';

/// Something that can turn a report file into per-page text.
pub trait TextSource {
    fn pages(&self, path: &Path) -> Result<Vec<String>, SourceError>;
}

/// Reads an already-extracted UTF-8 text file. Form feeds split it into pages.
pub struct PlainTextSource;

impl TextSource for PlainTextSource {
    fn pages(&self, path: &Path) -> Result<Vec<String>, SourceError> {
        let bytes = fs::read(path)?;
        let text = String::from_utf8(bytes)
            .map_err(|e| SourceError::Encoding(format!("{}: {}", path.display(), e)))?;
        Ok(text.split(PAGE_BREAK).map(str::to_string).collect())
    }
}

/// Extracts page text from a PDF report.
#[cfg(feature = "pdf")]
pub struct PdfTextSource;

#[cfg(feature = "pdf")]
impl TextSource for PdfTextSource {
    fn pages(&self, path: &Path) -> Result<Vec<String>, SourceError> {
        let bytes = fs::read(path)?;
        tracing::debug!("Decoding PDF {} ({} bytes)", path.display(), bytes.len());
        pdf_extract::extract_text_from_mem_by_pages(&bytes)
            .map_err(|e| SourceError::Pdf(format!("{}: {}", path.display(), e)))
    }
}

/// Picks a text source from the file extension.
pub fn source_for_path(path: &Path) -> Result<Box<dyn TextSource>, SourceError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("pdf") => pdf_source(path),
        _ => Ok(Box::new(PlainTextSource)),
    }
}

#[cfg(feature = "pdf")]
fn pdf_source(_path: &Path) -> Result<Box<dyn TextSource>, SourceError> {
    Ok(Box::new(PdfTextSource))
}

#[cfg(not(feature = "pdf"))]
fn pdf_source(path: &Path) -> Result<Box<dyn TextSource>, SourceError> {
    Err(SourceError::Unsupported(format!(
        "{} (built without the `pdf` feature)",
        path.display()
    )))
}

/// Joins page text into one document, one newline after each page.
/// Pages that produced no text are skipped.
pub fn join_pages<S: AsRef<str>>(pages: &[S]) -> String {
    let mut text = String::new();
    for page in pages {
        let page = page.as_ref();
        if page.trim().is_empty() {
            continue;
        }
        text.push_str(page);
        text.push('\n');
    }
    text
}

/// Loads a report file and returns its Document Text.
pub fn load_document(path: &Path) -> Result<String, SourceError> {
    let source = source_for_path(path)?;
    let pages = source.pages(path)?;
    let text = join_pages(&pages);

    if text.is_empty() {
        tracing::warn!("{} produced no text across {} page(s)", path.display(), pages.len());
        return Err(SourceError::NoText(path.display().to_string()));
    }

    tracing::info!("Loaded {} page(s), {} bytes of text from {}", pages.len(), text.len(), path.display());
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_join_pages_skips_empty_pages() {
        let pages = vec!["Page one", "", "   \n", "Page three"];
        assert_eq!(join_pages(&pages), "Page one\nPage three\n");
    }

    #[test]
    fn test_plain_text_splits_on_form_feed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "first\u{0C}second\u{0C}").unwrap();

        let pages = PlainTextSource.pages(file.path()).unwrap();
        assert_eq!(pages, vec!["first", "second", ""]);
    }

    #[test]
    fn test_load_document_rejects_blank_report() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "  \u{0C}\n").unwrap();

        let err = load_document(file.path()).unwrap_err();
        assert!(matches!(err, SourceError::NoText(_)));
    }

    #[test]
    fn test_load_document_missing_file() {
        let err = load_document(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(matches!(err, SourceError::Io(_)));
    }

    #[test]
    fn test_invalid_utf8_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0x66, 0xff, 0xfe]).unwrap();

        let err = PlainTextSource.pages(file.path()).unwrap_err();
        assert!(matches!(err, SourceError::Encoding(_)));
    }
}
