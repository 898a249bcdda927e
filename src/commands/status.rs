//! Status command implementation

use crate::config::Config;
use crate::error::Result;
use crate::generate::HttpGenerator;
use crate::store::{IndexStats, IndexStore};
use serde::Serialize;

/// System status report
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub db_path: String,
    pub stats: IndexStats,
    pub embedding_model: String,
    pub embedding_dimension: usize,
    pub metric: String,
    pub generation_model: String,
    pub generator_reachable: bool,
}

/// Collect index statistics and probe the generation backend
pub async fn cmd_status(config: &Config, store: &IndexStore) -> Result<StatusReport> {
    let stats = store.stats().await?;

    let generator_reachable = match HttpGenerator::new(&config.generation) {
        Ok(generator) => generator.health_check().await.unwrap_or(false),
        Err(_) => false,
    };

    Ok(StatusReport {
        db_path: config.paths.db_file.display().to_string(),
        stats,
        embedding_model: config.embedding.model.clone(),
        embedding_dimension: config.embedding.dimension,
        metric: config.index.metric.clone(),
        generation_model: config.generation.model.clone(),
        generator_reachable,
    })
}

/// Print the status report to the console
pub fn print_status(report: &StatusReport) {
    println!("registrar status");
    println!("  Index:      {}", report.db_path);
    println!("  Documents:  {}", report.stats.document_count);
    println!("  Chunks:     {}", report.stats.chunk_count);
    println!("  Embeddings: {}", report.stats.embedding_count);
    println!(
        "  Embedding:  {} ({}d, {})",
        report.embedding_model, report.embedding_dimension, report.metric
    );
    println!(
        "  Generator:  {} ({})",
        report.generation_model,
        if report.generator_reachable {
            "reachable"
        } else {
            "unreachable"
        }
    );
}
