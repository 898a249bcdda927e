//! Prompt assembly with citations
//!
//! Builds the generation prompt from retrieved chunks, annotating every
//! context block with its document title and page so the answer stays
//! traceable. When retrieval comes back empty the assembler produces the
//! fixed fallback response instead of an unconstrained prompt; callers must
//! not invoke the generator in that case.

use crate::error::{Error, Result};
use crate::retrieve::RetrievedChunk;
use serde::{Deserialize, Serialize};

/// Answer returned when no relevant context was retrieved
pub const FALLBACK_ANSWER: &str =
    "I could not find this information in the indexed university documents.";

/// Rough chars-per-token ratio used for the context budget
const CHARS_PER_TOKEN: usize = 4;

/// Excerpt length carried in citations
const EXCERPT_CHARS: usize = 200;

/// Metadata linking an answer back to its source document and page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub document_title: String,
    pub page_number: u32,
    pub excerpt: String,
}

impl Citation {
    fn for_chunk(chunk: &RetrievedChunk) -> Self {
        let excerpt = if chunk.text.chars().count() > EXCERPT_CHARS {
            let cut = chunk
                .text
                .char_indices()
                .nth(EXCERPT_CHARS)
                .map(|(i, _)| i)
                .unwrap_or(chunk.text.len());
            format!("{}...", &chunk.text[..cut])
        } else {
            chunk.text.clone()
        };

        Self {
            document_title: chunk.document_title.clone(),
            page_number: chunk.page_number,
            excerpt,
        }
    }
}

/// Result of prompt assembly
#[derive(Debug, Clone)]
pub enum AssembledPrompt {
    /// A grounded prompt ready for the generator, with parallel citations
    Grounded {
        prompt: String,
        citations: Vec<Citation>,
    },
    /// Nothing relevant was retrieved; answer with the fallback, skip the generator
    Empty { fallback: String },
}

/// Assembles generation prompts under a context budget
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    context_budget: usize,
}

fn approx_tokens(text: &str) -> usize {
    text.chars().count() / CHARS_PER_TOKEN + 1
}

impl PromptAssembler {
    pub fn new(context_budget: usize) -> Self {
        Self { context_budget }
    }

    /// Assemble a prompt for the question from retrieved chunks.
    ///
    /// Empty input yields [`AssembledPrompt::Empty`] with the fallback text.
    pub fn assemble(&self, question: &str, results: &[RetrievedChunk]) -> AssembledPrompt {
        match self.build_grounded(question, results) {
            Ok((prompt, citations)) => AssembledPrompt::Grounded { prompt, citations },
            Err(_) => AssembledPrompt::Empty {
                fallback: FALLBACK_ANSWER.to_string(),
            },
        }
    }

    /// Build the grounded prompt; fails with `NoRelevantContext` on empty input.
    ///
    /// Chunks are inserted in rank order. If the combined context plus
    /// question exceeds the budget, whole chunks are dropped lowest-rank
    /// first; a chunk is never cut mid-text, and the top-ranked chunk is
    /// always kept so the prompt stays grounded.
    pub fn build_grounded(
        &self,
        question: &str,
        results: &[RetrievedChunk],
    ) -> Result<(String, Vec<Citation>)> {
        if results.is_empty() {
            return Err(Error::NoRelevantContext);
        }

        let overhead = approx_tokens(&render_prompt(question, ""));
        let mut budget_left = self.context_budget.saturating_sub(overhead);

        let mut blocks = Vec::new();
        let mut citations = Vec::new();

        for chunk in results {
            let block = format!(
                "[{}] {}, page {}\n{}\n---\n",
                blocks.len() + 1,
                chunk.document_title,
                chunk.page_number,
                chunk.text
            );
            let cost = approx_tokens(&block);
            if !blocks.is_empty() && cost > budget_left {
                break;
            }
            budget_left = budget_left.saturating_sub(cost);
            blocks.push(block);
            citations.push(Citation::for_chunk(chunk));
        }

        let context = blocks.concat();
        Ok((render_prompt(question, &context), citations))
    }
}

fn render_prompt(question: &str, context: &str) -> String {
    format!(
        "You are an assistant for university students. You answer questions \
about official university documents: timetables, regulations, procedures, \
and FAQs.\n\n\
Answer using ONLY the context below. Cite the source of every fact with its \
document title and page, in the form [title, page N]. If the context does \
not contain the answer, reply exactly: \"{fallback}\"\n\n\
Context:\n{context}\n\
Question: {question}\n\n\
Answer:",
        fallback = FALLBACK_ANSWER,
        context = context,
        question = question
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::chunk_id;

    fn retrieved(title: &str, page: u32, text: &str, rank: usize) -> RetrievedChunk {
        RetrievedChunk {
            chunk_id: chunk_id(title, rank as u32),
            document_id: title.to_string(),
            document_title: title.to_string(),
            page_number: page,
            sequence_index: rank as u32,
            text: text.to_string(),
            start_offset: 0,
            end_offset: text.len(),
            score: 1.0 - rank as f32 * 0.1,
            rank,
        }
    }

    #[test]
    fn test_empty_results_yield_fallback() {
        let assembler = PromptAssembler::new(2048);
        match assembler.assemble("when are resits?", &[]) {
            AssembledPrompt::Empty { fallback } => assert_eq!(fallback, FALLBACK_ANSWER),
            AssembledPrompt::Grounded { .. } => panic!("expected fallback for empty retrieval"),
        }
    }

    #[test]
    fn test_build_grounded_rejects_empty_input() {
        let assembler = PromptAssembler::new(2048);
        let err = assembler.build_grounded("q", &[]).unwrap_err();
        assert!(matches!(err, Error::NoRelevantContext));
    }

    #[test]
    fn test_prompt_carries_citation_annotations_in_rank_order() {
        let assembler = PromptAssembler::new(2048);
        let results = vec![
            retrieved("Exam Regulations", 12, "resit exams run in September 2025", 1),
            retrieved("Academic Calendar", 3, "the winter term starts in October", 2),
        ];

        let (prompt, citations) = assembler
            .build_grounded("When are the S1 resit exams in 2025?", &results)
            .unwrap();

        assert!(prompt.contains("[1] Exam Regulations, page 12"));
        assert!(prompt.contains("[2] Academic Calendar, page 3"));
        assert!(
            prompt.find("Exam Regulations").unwrap() < prompt.find("Academic Calendar").unwrap()
        );
        assert!(prompt.contains("When are the S1 resit exams in 2025?"));

        assert_eq!(citations.len(), 2);
        assert_eq!(citations[0].document_title, "Exam Regulations");
        assert_eq!(citations[0].page_number, 12);
        assert!(citations[0].excerpt.contains("resit exams"));
    }

    #[test]
    fn test_truncation_drops_lowest_rank_whole_chunks() {
        // Budget fits the template and the first chunk, not the second.
        let long_text = "word ".repeat(300);
        let results = vec![
            retrieved("Doc A", 1, &long_text, 1),
            retrieved("Doc B", 2, &long_text, 2),
        ];

        let assembler = PromptAssembler::new(600);
        let (prompt, citations) = assembler.build_grounded("q", &results).unwrap();

        assert!(prompt.contains("[1] Doc A, page 1"));
        assert!(!prompt.contains("Doc B"));
        assert_eq!(citations.len(), 1);
        // The kept chunk is present in full, never cut mid-chunk
        assert!(prompt.contains(long_text.trim_end()));
    }

    #[test]
    fn test_oversized_top_chunk_is_still_included() {
        let huge = "token ".repeat(2000);
        let results = vec![retrieved("Doc A", 1, &huge, 1)];

        let assembler = PromptAssembler::new(100);
        let (prompt, citations) = assembler.build_grounded("q", &results).unwrap();

        assert!(prompt.contains(huge.trim_end()));
        assert_eq!(citations.len(), 1);
    }

    #[test]
    fn test_citation_excerpt_is_bounded() {
        let long_text = "x".repeat(500);
        let citation = Citation::for_chunk(&retrieved("Doc", 4, &long_text, 1));

        assert!(citation.excerpt.len() <= EXCERPT_CHARS + 3);
        assert!(citation.excerpt.ends_with("..."));
        assert_eq!(citation.page_number, 4);
    }

    #[test]
    fn test_fallback_phrase_is_embedded_in_instructions() {
        let assembler = PromptAssembler::new(2048);
        let results = vec![retrieved("Doc", 1, "content", 1)];
        let (prompt, _) = assembler.build_grounded("q", &results).unwrap();
        assert!(prompt.contains(FALLBACK_ANSWER));
    }
}
