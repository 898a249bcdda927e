//! Overlapping text chunker with page provenance
//!
//! Splits a loaded document into chunks of at most `chunk_size` units
//! (words or characters). Consecutive chunks share `overlap` units so
//! information spanning a boundary stays retrievable. Cuts prefer paragraph
//! and sentence boundaries inside a slack window before falling back to a
//! hard cut, and a too-short final fragment is merged into the previous
//! chunk. Chunk identity is a hash of `(document_id, sequence_index)`, so
//! re-chunking the same document is idempotent.

mod boundaries;

pub use boundaries::*;

use crate::config::ChunkConfig;
use crate::error::{Error, Result};
use crate::loader::LoadedDocument;
use std::str::FromStr;

/// A chunk of document text, the unit of retrieval
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Deterministic id: hash of document_id and sequence_index
    pub chunk_id: String,

    /// Owning document
    pub document_id: String,

    /// The chunk text
    pub text: String,

    /// Byte offset of the chunk start in the normalized document text
    pub start_offset: usize,

    /// Byte offset one past the chunk end
    pub end_offset: usize,

    /// 1-based page the chunk starts on
    pub page_number: u32,

    /// Position of this chunk within its document
    pub sequence_index: u32,
}

/// Unit chunks are measured in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkUnit {
    Words,
    Chars,
}

impl FromStr for ChunkUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "words" => Ok(ChunkUnit::Words),
            "chars" => Ok(ChunkUnit::Chars),
            _ => Err(Error::Config(format!("Unknown chunk unit: {}", s))),
        }
    }
}

/// Compute the deterministic id for a chunk
pub fn chunk_id(document_id: &str, sequence_index: u32) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(document_id.as_bytes());
    hasher.update(b":");
    hasher.update(sequence_index.to_string().as_bytes());
    hasher.finalize().to_hex().to_string()
}

/// Deterministic document chunker
#[derive(Debug, Clone)]
pub struct Chunker {
    unit: ChunkUnit,
    chunk_size: usize,
    overlap: usize,
    slack_units: usize,
    min_fragment_units: usize,
}

impl Chunker {
    pub fn new(config: &ChunkConfig) -> Result<Self> {
        let unit = config.unit.parse()?;

        if config.overlap >= config.chunk_size {
            return Err(Error::Config(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                config.overlap, config.chunk_size
            )));
        }

        Ok(Self {
            unit,
            chunk_size: config.chunk_size,
            overlap: config.overlap,
            slack_units: (config.chunk_size as f32 * config.slack_ratio) as usize,
            min_fragment_units: (config.chunk_size as f32 * config.min_fragment_ratio) as usize,
        })
    }

    /// Split a document into overlapping chunks.
    ///
    /// Deterministic for a given document and configuration: two runs yield
    /// identical chunk ids, offsets, and text.
    pub fn chunk(&self, doc: &LoadedDocument) -> Result<Vec<Chunk>> {
        if doc.text.trim().is_empty() {
            return Err(Error::EmptyDocument(doc.title.clone()));
        }

        let units = self.unit_spans(&doc.text);
        if units.is_empty() {
            return Err(Error::EmptyDocument(doc.title.clone()));
        }

        let ranges = self.chunk_ranges(&doc.text, &units);

        let chunks = ranges
            .into_iter()
            .enumerate()
            .map(|(i, (start, end))| {
                let start_offset = units[start].0;
                let end_offset = units[end - 1].1;
                Chunk {
                    chunk_id: chunk_id(&doc.document_id, i as u32),
                    document_id: doc.document_id.clone(),
                    text: doc.text[start_offset..end_offset].to_string(),
                    start_offset,
                    end_offset,
                    page_number: doc.page_at_offset(start_offset),
                    sequence_index: i as u32,
                }
            })
            .collect();

        Ok(chunks)
    }

    /// Byte spans of the configured unit across the text
    fn unit_spans(&self, text: &str) -> Vec<(usize, usize)> {
        match self.unit {
            ChunkUnit::Words => {
                let mut spans = Vec::new();
                let mut start = None;
                for (i, c) in text.char_indices() {
                    if c.is_whitespace() {
                        if let Some(s) = start.take() {
                            spans.push((s, i));
                        }
                    } else if start.is_none() {
                        start = Some(i);
                    }
                }
                if let Some(s) = start {
                    spans.push((s, text.len()));
                }
                spans
            }
            ChunkUnit::Chars => text
                .char_indices()
                .map(|(i, c)| (i, i + c.len_utf8()))
                .collect(),
        }
    }

    /// Compute chunk ranges as half-open unit index intervals
    fn chunk_ranges(&self, text: &str, units: &[(usize, usize)]) -> Vec<(usize, usize)> {
        let n = units.len();
        let break_units = self.break_unit_indices(text, units);

        let mut ranges: Vec<(usize, usize)> = Vec::new();
        let mut start = 0;

        loop {
            let target = (start + self.chunk_size).min(n);
            let end = if target == n {
                n
            } else {
                self.pick_cut(start, target, &break_units)
            };

            ranges.push((start, end));
            if end == n {
                break;
            }
            start = end - self.overlap;
        }

        // Merge a too-short final fragment into the previous chunk
        if ranges.len() > 1 {
            let (last_start, last_end) = *ranges.last().unwrap();
            if last_end - last_start < self.min_fragment_units {
                ranges.pop();
                ranges.last_mut().unwrap().1 = last_end;
            }
        }

        ranges
    }

    /// Map break point byte positions to unit cut indices
    fn break_unit_indices(
        &self,
        text: &str,
        units: &[(usize, usize)],
    ) -> Vec<(usize, BreakPriority)> {
        let mut cuts: Vec<(usize, BreakPriority)> = find_break_points(text)
            .into_iter()
            .map(|bp| {
                let cut = units.partition_point(|&(s, _)| s < bp.position);
                (cut, bp.priority)
            })
            .collect();

        cuts.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.cmp(&a.1)));
        cuts.dedup_by_key(|c| c.0);
        cuts
    }

    /// Choose the cut for a chunk starting at `start` with hard limit `target`.
    ///
    /// Prefers the highest-priority break inside the slack window below
    /// `target`; among equals the one closest to `target` wins. The cut must
    /// leave the next start strictly past the current one.
    fn pick_cut(&self, start: usize, target: usize, cuts: &[(usize, BreakPriority)]) -> usize {
        let window_start = target
            .saturating_sub(self.slack_units)
            .max(start + self.overlap + 1);

        cuts.iter()
            .filter(|&&(cut, _)| cut >= window_start && cut <= target)
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)))
            .map(|&(cut, _)| cut)
            .unwrap_or(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChunkConfig;
    use crate::loader;
    use std::path::PathBuf;

    fn make_doc(text: &str) -> LoadedDocument {
        loader::from_pages([text], PathBuf::from("doc.txt"), "doc".to_string())
    }

    fn chunker(unit: &str, chunk_size: usize, overlap: usize) -> Chunker {
        Chunker::new(&ChunkConfig {
            unit: unit.to_string(),
            chunk_size,
            overlap,
            slack_ratio: 0.2,
            min_fragment_ratio: 0.2,
        })
        .unwrap()
    }

    #[test]
    fn test_empty_document_fails() {
        let doc = make_doc("   \n\n  ");
        let err = chunker("words", 100, 20).chunk(&doc).unwrap_err();
        assert!(matches!(err, Error::EmptyDocument(_)));
    }

    #[test]
    fn test_short_document_single_chunk() {
        let doc = make_doc("The winter semester begins in September.");
        let chunks = chunker("words", 100, 20).chunk(&doc).unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].sequence_index, 0);
        assert_eq!(chunks[0].text, doc.text);
        assert_eq!(chunks[0].page_number, 1);
    }

    #[test]
    fn test_chunking_is_idempotent() {
        let text = "Enrollment opens May 2. ".repeat(80);
        let doc = make_doc(&text);
        let c = chunker("words", 50, 10);

        let a = c.chunk(&doc).unwrap();
        let b = c.chunk(&doc).unwrap();

        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.chunk_id, y.chunk_id);
            assert_eq!(x.text, y.text);
            assert_eq!(x.start_offset, y.start_offset);
        }
    }

    #[test]
    fn test_word_overlap_invariant() {
        let text = (0..400)
            .map(|i| format!("token{}", i))
            .collect::<Vec<_>>()
            .join(" ");
        let doc = make_doc(&text);
        let chunks = chunker("words", 50, 10).chunk(&doc).unwrap();

        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            let tail: Vec<&str> = pair[0]
                .text
                .split_whitespace()
                .rev()
                .take(10)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            let head: Vec<&str> = pair[1].text.split_whitespace().take(10).collect();
            assert_eq!(tail, head);
        }
    }

    #[test]
    fn test_char_sliding_window_scenario() {
        // 10,000 units, chunk_size 1000, overlap 200: stride 800 gives starts
        // 0, 800, ..., 9600; the final 400-unit fragment clears the 20%
        // minimum and is kept.
        let text = "abcdefghij".repeat(1000);
        let doc = make_doc(&text);
        let chunks = chunker("chars", 1000, 200).chunk(&doc).unwrap();

        assert_eq!(chunks.len(), 13);
        for chunk in &chunks[..12] {
            assert_eq!(chunk.end_offset - chunk.start_offset, 1000);
        }
        let last = chunks.last().unwrap();
        assert_eq!(last.end_offset - last.start_offset, 400);

        for pair in chunks.windows(2) {
            let overlap_len = pair[0].end_offset - pair[1].start_offset;
            assert_eq!(overlap_len, 200);
            let tail = &pair[0].text[pair[0].text.len() - overlap_len..];
            let head = &pair[1].text[..overlap_len];
            assert_eq!(tail, head);
        }
    }

    #[test]
    fn test_short_final_fragment_is_merged() {
        // 1,850 chars with chunk_size 1000, overlap 200: the sliding window
        // leaves a 250-char tail. Below a 300-char minimum it folds into the
        // previous chunk, which then runs to the end of the document.
        let text = "x".repeat(1850);
        let doc = make_doc(&text);
        let c = Chunker::new(&ChunkConfig {
            unit: "chars".to_string(),
            chunk_size: 1000,
            overlap: 200,
            slack_ratio: 0.2,
            min_fragment_ratio: 0.3,
        })
        .unwrap();
        let chunks = c.chunk(&doc).unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].start_offset, 800);
        assert_eq!(chunks[1].end_offset, 1850);
    }

    #[test]
    fn test_prefers_paragraph_break() {
        let first = "alpha ".repeat(45).trim_end().to_string();
        let text = format!("{}\n\n{}", first, "beta ".repeat(60).trim_end());
        let doc = make_doc(&text);
        let chunks = chunker("words", 50, 10).chunk(&doc).unwrap();

        // The first cut lands on the paragraph boundary at word 45, not the
        // hard limit of 50.
        assert_eq!(chunks[0].text.split_whitespace().count(), 45);
        assert!(chunks[0].text.ends_with("alpha"));
    }

    #[test]
    fn test_page_provenance() {
        let page1 = "one ".repeat(60).trim_end().to_string();
        let page2 = "two ".repeat(60).trim_end().to_string();
        let doc = loader::from_pages(
            [page1.as_str(), page2.as_str()],
            PathBuf::from("doc.txt"),
            "doc".to_string(),
        );
        let chunks = chunker("words", 50, 10).chunk(&doc).unwrap();

        assert_eq!(chunks.first().unwrap().page_number, 1);
        assert_eq!(chunks.last().unwrap().page_number, 2);
    }

    #[test]
    fn test_chunk_ids_differ_by_position_and_document() {
        assert_ne!(chunk_id("doc-a", 0), chunk_id("doc-a", 1));
        assert_ne!(chunk_id("doc-a", 0), chunk_id("doc-b", 0));
        assert_eq!(chunk_id("doc-a", 3), chunk_id("doc-a", 3));
    }
}
