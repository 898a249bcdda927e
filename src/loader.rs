//! Document loading boundary
//!
//! Raw file parsing (PDF/DOCX extraction) happens outside this crate; the
//! contract here is page-delimited plain text, with pages separated by form
//! feeds the way pdftotext-style extractors emit them. The loader normalizes
//! each page, computes page start offsets into the joined text, and derives a
//! stable document identity from the normalized content.

use crate::error::Result;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Page separator emitted by text extractors (form feed)
const PAGE_SEPARATOR: char = '\u{0C}';

/// A loaded, normalized document ready for chunking
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    /// Stable content hash of the normalized text
    pub document_id: String,

    /// Path the document was loaded from
    pub source_path: PathBuf,

    /// Human-readable title used in citations
    pub title: String,

    /// Normalized full text, pages joined with blank lines
    pub text: String,

    /// Byte offset of each page's start within `text` (index 0 = page 1)
    pub page_offsets: Vec<usize>,
}

impl LoadedDocument {
    pub fn page_count(&self) -> usize {
        self.page_offsets.len()
    }

    /// 1-based page number containing the given byte offset
    pub fn page_at_offset(&self, offset: usize) -> u32 {
        let n = self.page_offsets.partition_point(|&start| start <= offset);
        n.max(1) as u32
    }
}

fn multi_space() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t]+").unwrap())
}

fn multi_newline() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").unwrap())
}

fn space_before_punct() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t]+([.,;:!?])").unwrap())
}

/// Normalize extracted text: collapse runs of spaces, trim line ends, cap
/// consecutive blank lines, normalize dashes, drop spaces before punctuation.
pub fn normalize_text(raw: &str) -> String {
    let text = raw.replace(PAGE_SEPARATOR, "\n");
    let text = multi_space().replace_all(&text, " ");

    let text = text
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n");

    let text = multi_newline().replace_all(&text, "\n\n");
    let text = text.replace(['\u{2014}', '\u{2013}'], "-");
    let text = space_before_punct().replace_all(&text, "$1");

    text.trim().to_string()
}

/// Load a page-delimited plain text document from disk
pub fn load_document(path: &Path) -> Result<LoadedDocument> {
    let raw = std::fs::read_to_string(path)?;
    let title = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    Ok(from_pages(raw.split(PAGE_SEPARATOR), path.to_path_buf(), title))
}

/// Build a document from already-split pages; the loader's core
pub fn from_pages<'a, I>(pages: I, source_path: PathBuf, title: String) -> LoadedDocument
where
    I: IntoIterator<Item = &'a str>,
{
    let mut text = String::new();
    let mut page_offsets = Vec::new();

    for page in pages {
        if !text.is_empty() {
            text.push_str("\n\n");
        }
        page_offsets.push(text.len());
        text.push_str(&normalize_text(page));
    }

    let document_id = blake3::hash(text.as_bytes()).to_hex().to_string();

    LoadedDocument {
        document_id,
        source_path,
        title,
        text,
        page_offsets,
    }
}
