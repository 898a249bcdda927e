//! Search command implementation: retrieval only, no generation

use crate::config::Config;
use crate::embed::Embedder;
use crate::error::Result;
use crate::retrieve::{RetrieveOptions, RetrievedChunk, Retriever};
use crate::store::IndexStore;
use serde::Serialize;

/// Search options
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Override the configured number of results
    pub limit: Option<usize>,
    /// Override the configured relevance floor
    pub min_score: Option<f32>,
}

/// Retrieval-only report for inspection of the index
#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub query: String,
    pub results: Vec<RetrievedChunk>,
}

/// Retrieve the chunks most relevant to a query and report them with scores
pub async fn cmd_search(
    config: &Config,
    store: &IndexStore,
    embedder: &dyn Embedder,
    query: &str,
    options: SearchOptions,
) -> Result<SearchReport> {
    let retriever = Retriever::new(store, embedder);
    let retrieve_options = RetrieveOptions {
        top_k: options.limit.unwrap_or(config.query.top_k),
        min_score: options.min_score.unwrap_or(config.query.min_score),
        merge_adjacent: config.query.merge_adjacent,
    };

    let results = retriever.retrieve(query, &retrieve_options).await?;

    Ok(SearchReport {
        query: query.to_string(),
        results,
    })
}

/// Print search results to the console
pub fn print_search_results(report: &SearchReport) {
    println!("\n🔍 {}\n", report.query);

    if report.results.is_empty() {
        println!("No chunks above the relevance floor.");
        return;
    }

    for result in &report.results {
        println!(
            "{}. [score: {:.3}] {}, page {}",
            result.rank, result.score, result.document_title, result.page_number
        );

        let preview: String = result.text.chars().take(200).collect();
        println!("   {}\n", preview.replace('\n', " "));
    }
}
