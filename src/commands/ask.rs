//! Ask command implementation: the full question-answering pipeline

use crate::config::Config;
use crate::embed::Embedder;
use crate::error::Result;
use crate::generate::Generator;
use crate::history::SessionStore;
use crate::prompt::{AssembledPrompt, Citation, PromptAssembler};
use crate::retrieve::{RetrieveOptions, Retriever};
use crate::store::IndexStore;
use serde::Serialize;
use tracing::info;

/// Ask options
#[derive(Debug, Clone, Default)]
pub struct AskOptions {
    /// Override the configured number of retrieved chunks
    pub top_k: Option<usize>,
    /// Override the configured relevance floor
    pub min_score: Option<f32>,
    /// Record the exchange in this conversation session
    pub session: Option<String>,
}

/// A question answered with citations
#[derive(Debug, Clone, Serialize)]
pub struct AskResult {
    pub question: String,
    pub answer: String,
    pub citations: Vec<Citation>,
    /// false when the fallback answer was used without invoking the generator
    pub grounded: bool,
    pub session_id: Option<String>,
}

/// Answer a question: retrieve, assemble, generate, cite.
///
/// When retrieval comes back empty the fallback answer is returned directly
/// and the generator is never invoked.
pub async fn cmd_ask(
    config: &Config,
    store: &IndexStore,
    embedder: &dyn Embedder,
    generator: &dyn Generator,
    question: &str,
    options: AskOptions,
) -> Result<AskResult> {
    let retriever = Retriever::new(store, embedder);
    let retrieve_options = RetrieveOptions {
        top_k: options.top_k.unwrap_or(config.query.top_k),
        min_score: options.min_score.unwrap_or(config.query.min_score),
        merge_adjacent: config.query.merge_adjacent,
    };

    let results = retriever.retrieve(question, &retrieve_options).await?;
    info!("Retrieved {} context chunks", results.len());

    let assembler = PromptAssembler::new(config.generation.context_budget);
    let (answer, citations, grounded) = match assembler.assemble(question, &results) {
        AssembledPrompt::Grounded { prompt, citations } => {
            let answer = generator.generate(&prompt).await?;
            (answer, citations, true)
        }
        AssembledPrompt::Empty { fallback } => {
            info!("No relevant context found; answering with the fallback");
            (fallback, Vec::new(), false)
        }
    };

    if let Some(session_id) = &options.session {
        let sessions = SessionStore::new(config.paths.sessions_dir.clone());
        sessions.record_exchange(session_id, question, &answer, &citations)?;
    }

    Ok(AskResult {
        question: question.to_string(),
        answer,
        citations,
        grounded,
        session_id: options.session,
    })
}

/// Print an answer with its sources to the console
pub fn print_answer(result: &AskResult) {
    println!("\n❓ {}\n", result.question);
    println!("{}\n", result.answer);

    if !result.citations.is_empty() {
        println!("Sources:");
        for (i, citation) in result.citations.iter().enumerate() {
            println!(
                "  {}. {}, page {}",
                i + 1,
                citation.document_title,
                citation.page_number
            );
        }
    }

    if let Some(session) = &result.session_id {
        println!("\n(recorded in session {})", session);
    }
}
