//! PDF text extraction via pdfium.
//!
//! ## Why a temp file?
//!
//! The bytes are written to a `NamedTempFile` and pdfium opens it from disk.
//! The file lives exactly as long as the blocking extraction closure that
//! owns it, so it is removed on success, on error and on panic alike.
//!
//! ## Why spawn_blocking?
//!
//! pdfium is a C++ library with thread-local state; calling it from a Tokio
//! worker would stall the runtime. All pdfium work runs on the blocking pool.

use crate::error::Vocab2PostError;
use async_trait::async_trait;
use pdfium_render::prelude::*;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info, warn};

/// How far into the file a `%PDF` header may start.
const PDF_HEADER_WINDOW: usize = 1024;

/// Converts document bytes into plain text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_text(&self, pdf: &[u8]) -> Result<String, Vocab2PostError>;
}

/// Page-by-page text extraction backed by pdfium (bound via `pdfium-auto`).
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfiumExtractor;

#[async_trait]
impl TextExtractor for PdfiumExtractor {
    async fn extract_text(&self, pdf: &[u8]) -> Result<String, Vocab2PostError> {
        check_pdf_header(pdf)?;
        let bytes = pdf.to_vec();

        tokio::task::spawn_blocking(move || extract_text_blocking(&bytes))
            .await
            .map_err(|e| Vocab2PostError::Internal(format!("Extraction task panicked: {e}")))?
    }
}

/// Reject input that does not carry a `%PDF` marker near the start.
pub fn check_pdf_header(bytes: &[u8]) -> Result<(), Vocab2PostError> {
    let window = &bytes[..bytes.len().min(PDF_HEADER_WINDOW)];
    if window.windows(4).any(|w| w == b"%PDF") {
        Ok(())
    } else {
        Err(Vocab2PostError::NotAPdf {
            magic: bytes.iter().take(4).copied().collect(),
        })
    }
}

/// Join per-page text with `\n`; pages without text contribute `""`.
pub fn join_page_texts<I>(pages: I) -> String
where
    I: IntoIterator<Item = Option<String>>,
{
    pages
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect::<Vec<_>>()
        .join("\n")
}

fn extract_text_blocking(bytes: &[u8]) -> Result<String, Vocab2PostError> {
    with_temp_pdf(bytes, &std::env::temp_dir(), |path| {
        let pdfium = pdfium_auto::bind_pdfium_silent()
            .map_err(|e| Vocab2PostError::PdfiumBindingFailed(e.to_string()))?;
        read_pages(&pdfium, path)
    })
}

/// Write `bytes` to a `vocab2post-*.pdf` file in `dir` and hand its path to
/// `f`. The file is deleted when `f` returns, whatever the result.
pub(crate) fn with_temp_pdf<T>(
    bytes: &[u8],
    dir: &Path,
    f: impl FnOnce(&Path) -> Result<T, Vocab2PostError>,
) -> Result<T, Vocab2PostError> {
    let mut tmp = tempfile::Builder::new()
        .prefix("vocab2post-")
        .suffix(".pdf")
        .tempfile_in(dir)
        .map_err(|e| Vocab2PostError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .and_then(|_| tmp.flush())
        .map_err(|e| Vocab2PostError::Internal(format!("tempfile write: {e}")))?;

    f(tmp.path())
}

fn read_pages(pdfium: &Pdfium, path: &Path) -> Result<String, Vocab2PostError> {
    let document = pdfium
        .load_pdf_from_file(path, None)
        .map_err(|e| Vocab2PostError::Extraction {
            detail: format!("{e:?}"),
        })?;

    let pages = document.pages();
    info!("PDF loaded: {} pages", pages.len());

    let texts: Vec<Option<String>> = pages
        .iter()
        .enumerate()
        .map(|(idx, page)| page_text(idx + 1, page.text().map(|t| t.all())))
        .collect();

    Ok(join_page_texts(texts))
}

/// A page whose text layer cannot be read contributes nothing.
fn page_text<E: std::fmt::Debug>(page_no: usize, text: Result<String, E>) -> Option<String> {
    match text {
        Ok(text) => {
            debug!("Page {}: {} chars", page_no, text.len());
            Some(text)
        }
        Err(e) => {
            warn!("Page {}: no text layer ({:?})", page_no, e);
            None
        }
    }
}
