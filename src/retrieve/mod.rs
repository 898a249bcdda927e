//! Question-time retrieval
//!
//! Embeds a question, queries the index store for the nearest chunks,
//! applies the relevance floor, and optionally merges chunks that sit next
//! to each other in the same document so the prompt is not padded with
//! duplicated overlap text. An emptied result set is returned as-is; the
//! prompt assembler owns the fallback behavior.

use crate::embed::{embed_one, Embedder};
use crate::error::Result;
use crate::store::{HydratedChunk, IndexStore};
use serde::Serialize;
use tracing::debug;

/// Ranked reference to a chunk, ephemeral per query
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalResult {
    pub chunk_id: String,
    pub score: f32,
    pub rank: usize,
}

/// A retrieved chunk hydrated with text and citation metadata
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedChunk {
    pub chunk_id: String,
    pub document_id: String,
    pub document_title: String,
    pub page_number: u32,
    pub sequence_index: u32,
    pub text: String,
    pub start_offset: usize,
    pub end_offset: usize,
    pub score: f32,
    pub rank: usize,
}

impl RetrievedChunk {
    fn from_hydrated(chunk: HydratedChunk, score: f32, rank: usize) -> Self {
        Self {
            chunk_id: chunk.chunk_id,
            document_id: chunk.document_id,
            document_title: chunk.document_title,
            page_number: chunk.page_number as u32,
            sequence_index: chunk.sequence_index as u32,
            text: chunk.text,
            start_offset: chunk.start_offset as usize,
            end_offset: chunk.end_offset as usize,
            score,
            rank,
        }
    }

    /// Ephemeral result view of this chunk
    pub fn as_result(&self) -> RetrievalResult {
        RetrievalResult {
            chunk_id: self.chunk_id.clone(),
            score: self.score,
            rank: self.rank,
        }
    }
}

/// Retrieval options
#[derive(Debug, Clone)]
pub struct RetrieveOptions {
    /// Number of nearest chunks to request from the store
    pub top_k: usize,
    /// Relevance floor; results scoring below are dropped, never padded
    pub min_score: f32,
    /// Merge chunks adjacent within one document into a single block
    pub merge_adjacent: bool,
}

/// Retriever over an index store and an embedder
pub struct Retriever<'a> {
    store: &'a IndexStore,
    embedder: &'a dyn Embedder,
}

impl<'a> Retriever<'a> {
    pub fn new(store: &'a IndexStore, embedder: &'a dyn Embedder) -> Self {
        Self { store, embedder }
    }

    /// Retrieve the chunks most relevant to a question, best first.
    ///
    /// Returns an empty sequence when nothing clears `min_score`.
    pub async fn retrieve(
        &self,
        question: &str,
        options: &RetrieveOptions,
    ) -> Result<Vec<RetrievedChunk>> {
        let vector = embed_one(self.embedder, question).await?;
        let hits = self
            .store
            .query(&vector, options.top_k, self.embedder.model_id())
            .await?;
        debug!("Store returned {} candidate chunks", hits.len());

        let metric = self.store.metric();
        let mut results = Vec::new();

        for (chunk_id, distance) in hits {
            let score = metric.similarity(distance);
            if score < options.min_score {
                continue;
            }
            // Orphan embeddings without a chunk row are skipped
            let Some(chunk) = self.store.get_chunk(&chunk_id).await? else {
                continue;
            };
            let rank = results.len() + 1;
            results.push(RetrievedChunk::from_hydrated(chunk, score, rank));
        }

        if options.merge_adjacent {
            results = merge_adjacent(results);
        }

        debug!("Retrieved {} chunks above the relevance floor", results.len());
        Ok(results)
    }
}

/// Merge retrieved chunks that are consecutive within one document.
///
/// Members of a merged block contribute their text minus the shared overlap
/// (recovered from chunk offsets); the block keeps the best score and rank of
/// its members. Ranks are reassigned contiguously afterwards.
pub fn merge_adjacent(results: Vec<RetrievedChunk>) -> Vec<RetrievedChunk> {
    if results.len() < 2 {
        return results;
    }

    let mut ordered = results;
    ordered.sort_by(|a, b| {
        a.document_id
            .cmp(&b.document_id)
            .then_with(|| a.sequence_index.cmp(&b.sequence_index))
    });

    let mut merged: Vec<RetrievedChunk> = Vec::new();
    for chunk in ordered {
        match merged.last_mut() {
            Some(prev)
                if prev.document_id == chunk.document_id
                    && chunk.sequence_index == prev.sequence_index + 1 =>
            {
                // prev covers [ps, pe) and chunk [cs, ce) of the same document
                // text, so chunk.text past the shared pe-cs bytes continues
                // prev.text exactly
                let overlap = prev.end_offset.saturating_sub(chunk.start_offset);
                let tail = chunk.text.get(overlap.min(chunk.text.len())..).unwrap_or("");
                prev.text.push_str(tail);
                prev.end_offset = chunk.end_offset;
                prev.sequence_index = chunk.sequence_index;
                prev.score = prev.score.max(chunk.score);
                prev.rank = prev.rank.min(chunk.rank);
            }
            _ => merged.push(chunk),
        }
    }

    merged.sort_by_key(|c| c.rank);
    for (i, chunk) in merged.iter_mut().enumerate() {
        chunk.rank = i + 1;
    }
    merged
}
