//! Format-specific text extraction for uploaded documents.
//!
//! Every supported format is handled by delegating to a third-party library (or, for OCR,
//! the system `tesseract` binary) and rendering the result as plain text. Extraction is
//! best effort and never retried: a failure in the underlying library propagates as a hard
//! [`ExtractError`].

use calamine::{Data, Reader, open_workbook_auto};
use std::io::Read;
use std::path::Path;
use std::process::Command;
use thiserror::Error;

/// Document formats accepted by the upload endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentFormat {
    /// PDF document.
    Pdf,
    /// Word document (`.docx`).
    WordDocument,
    /// Plain UTF-8 text.
    PlainText,
    /// Excel workbook (`.xlsx`/`.xls`).
    Spreadsheet,
    /// Raster image passed through OCR.
    Image,
}

impl DocumentFormat {
    /// Map a lower-cased filename extension to a format tag.
    ///
    /// Returns `None` for unrecognized extensions; callers surface that as an
    /// unsupported-format error before any extraction side effect occurs.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "pdf" => Some(Self::Pdf),
            "docx" | "doc" => Some(Self::WordDocument),
            "txt" => Some(Self::PlainText),
            "xlsx" | "xls" => Some(Self::Spreadsheet),
            "png" | "jpg" | "jpeg" => Some(Self::Image),
            _ => None,
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Pdf => "pdf",
            Self::WordDocument => "word-document",
            Self::PlainText => "plain-text",
            Self::Spreadsheet => "spreadsheet",
            Self::Image => "image",
        };
        f.write_str(name)
    }
}

/// Errors raised while extracting text from an uploaded document.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Reading the persisted upload from disk failed.
    #[error("Failed to read uploaded file: {0}")]
    Io(#[from] std::io::Error),
    /// The PDF library rejected the document.
    #[error("Failed to extract PDF text: {0}")]
    Pdf(String),
    /// The upload was not a readable DOCX archive.
    #[error("Failed to extract Word document text: {0}")]
    WordDocument(String),
    /// The spreadsheet library rejected the workbook.
    #[error("Failed to extract spreadsheet text: {0}")]
    Spreadsheet(String),
    /// The OCR pass failed or the `tesseract` binary is unavailable.
    #[error("Failed to run OCR: {0}")]
    Ocr(String),
}

/// Extract the best-effort plain-text rendering of the file at `path`.
///
/// The file is expected to already be persisted to scratch storage; extraction reads it
/// from disk rather than from the request body so that path-based libraries and the OCR
/// binary can be pointed at it directly.
pub fn extract(path: &Path, format: DocumentFormat) -> Result<String, ExtractError> {
    tracing::debug!(path = %path.display(), %format, "Extracting document text");
    match format {
        DocumentFormat::Pdf => extract_pdf(path),
        DocumentFormat::WordDocument => extract_docx(path),
        DocumentFormat::PlainText => extract_plain_text(path),
        DocumentFormat::Spreadsheet => extract_spreadsheet(path),
        DocumentFormat::Image => extract_image(path),
    }
}

fn extract_pdf(path: &Path) -> Result<String, ExtractError> {
    pdf_extract::extract_text(path)
        .map(|text| text.trim().to_string())
        .map_err(|error| ExtractError::Pdf(error.to_string()))
}

/// A DOCX file is a ZIP archive; the document body lives in `word/document.xml`.
fn extract_docx(path: &Path) -> Result<String, ExtractError> {
    let file = std::fs::File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|error| ExtractError::WordDocument(format!("invalid archive: {error}")))?;
    let mut document = archive
        .by_name("word/document.xml")
        .map_err(|_| ExtractError::WordDocument("missing word/document.xml".to_string()))?;

    let mut xml = String::new();
    document
        .read_to_string(&mut xml)
        .map_err(|error| ExtractError::WordDocument(format!("unreadable document.xml: {error}")))?;

    Ok(docx_xml_to_text(&xml))
}

/// Walk the WordprocessingML body, keeping `w:t` text runs and separating paragraphs
/// (`w:p`) with newlines. Paragraph order is preserved.
fn docx_xml_to_text(xml: &str) -> String {
    let mut text = String::new();
    let mut in_text_run = false;
    let mut chars = xml.chars();

    while let Some(c) = chars.next() {
        if c == '<' {
            let mut tag = String::new();
            for tag_char in chars.by_ref() {
                if tag_char == '>' {
                    break;
                }
                tag.push(tag_char);
            }

            if tag == "w:t" || tag.starts_with("w:t ") {
                in_text_run = true;
            } else if tag == "/w:t" {
                in_text_run = false;
            } else if (tag == "w:p" || tag.starts_with("w:p ")) && !text.is_empty() {
                text.push('\n');
            }
        } else if in_text_run {
            text.push(c);
        }
    }

    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
}

fn extract_plain_text(path: &Path) -> Result<String, ExtractError> {
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Render the workbook as a whitespace-delimited textual dump, sheet by sheet,
/// preserving row and column order.
fn extract_spreadsheet(path: &Path) -> Result<String, ExtractError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|error| ExtractError::Spreadsheet(error.to_string()))?;

    let sheet_names = workbook.sheet_names().to_vec();
    let mut rendered = Vec::new();
    for name in sheet_names {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|error| ExtractError::Spreadsheet(error.to_string()))?;
        for row in range.rows() {
            let cells: Vec<String> = row.iter().map(render_cell).collect();
            rendered.push(cells.join("\t"));
        }
    }

    Ok(rendered.join("\n"))
}

fn render_cell(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

/// OCR via the system `tesseract` binary, reading the recognized text from stdout.
fn extract_image(path: &Path) -> Result<String, ExtractError> {
    let output = Command::new("tesseract")
        .arg(path)
        .arg("stdout")
        .output()
        .map_err(|error| {
            ExtractError::Ocr(format!("failed to run tesseract (is it installed?): {error}"))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ExtractError::Ocr(format!(
            "tesseract exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
