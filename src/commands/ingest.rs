//! Ingest command implementation
//!
//! Batch pipeline: loader -> chunker -> embedder -> index store. Documents
//! are independent units processed by concurrent workers; a failure in one
//! document never aborts the batch, and each document's writes land in a
//! single transaction so interrupted work leaves no partial rows.

use crate::chunk::Chunker;
use crate::config::Config;
use crate::embed::{embed_in_batches, Embedder};
use crate::error::{Error, Result};
use crate::loader;
use crate::progress::ingest_bar;
use crate::store::{DocumentRecord, IndexStore};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Statistics from an ingestion run
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestStats {
    pub docs_processed: usize,
    pub docs_skipped: usize,
    pub docs_failed: usize,
    pub chunks_written: usize,
    pub errors: Vec<String>,
}

enum DocOutcome {
    Processed(usize),
    Skipped,
    Failed(String),
}

/// Ingest all .txt documents under a path
pub async fn cmd_ingest(
    config: &Config,
    store: &IndexStore,
    embedder: &dyn Embedder,
    path: &Path,
) -> Result<IngestStats> {
    let files = collect_text_files(path)?;
    if files.is_empty() {
        return Err(Error::InvalidPath(format!(
            "No .txt documents found under {}",
            path.display()
        )));
    }

    info!("Ingesting {} documents from {}", files.len(), path.display());

    let chunker = Chunker::new(&config.chunk)?;
    let run_id = store.start_ingestion_run().await?;
    let bar = ingest_bar(files.len() as u64);
    bar.set_message("ingesting");

    let outcomes: Vec<DocOutcome> = stream::iter(files.iter().map(|file| {
        let chunker = &chunker;
        let bar = &bar;
        async move {
            let outcome = ingest_one(config, store, embedder, chunker, file).await;
            bar.inc(1);
            outcome
        }
    }))
    .buffer_unordered(config.ingest.workers)
    .collect()
    .await;

    bar.finish_and_clear();

    let mut stats = IngestStats::default();
    for outcome in outcomes {
        match outcome {
            DocOutcome::Processed(chunks) => {
                stats.docs_processed += 1;
                stats.chunks_written += chunks;
            }
            DocOutcome::Skipped => stats.docs_skipped += 1,
            DocOutcome::Failed(message) => {
                stats.docs_failed += 1;
                stats.errors.push(message);
            }
        }
    }

    let status = if stats.docs_failed == 0 {
        "completed"
    } else {
        "completed_with_errors"
    };
    store
        .complete_ingestion_run(
            &run_id,
            status,
            stats.docs_processed,
            stats.docs_skipped,
            stats.docs_failed,
            stats.chunks_written,
        )
        .await?;

    Ok(stats)
}

async fn ingest_one(
    config: &Config,
    store: &IndexStore,
    embedder: &dyn Embedder,
    chunker: &Chunker,
    file: &Path,
) -> DocOutcome {
    match process_document(config, store, embedder, chunker, file).await {
        Ok(chunks) => DocOutcome::Processed(chunks),
        Err(Error::EmptyDocument(title)) => {
            warn!("Skipping '{}': no content after normalization", title);
            DocOutcome::Skipped
        }
        Err(e) => {
            warn!("Failed to ingest {}: {}", file.display(), e);
            DocOutcome::Failed(format!("{}: {}", file.display(), e))
        }
    }
}

async fn process_document(
    config: &Config,
    store: &IndexStore,
    embedder: &dyn Embedder,
    chunker: &Chunker,
    file: &Path,
) -> Result<usize> {
    let doc = loader::load_document(file)?;
    let chunks = chunker.chunk(&doc)?;

    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let vectors = embed_in_batches(embedder, texts, config.embedding.batch_size).await?;

    let record = DocumentRecord {
        id: doc.document_id.clone(),
        source_path: file.display().to_string(),
        title: doc.title.clone(),
        page_count: doc.page_count() as i64,
        ingested_at: Utc::now().to_rfc3339(),
    };
    store
        .insert_document_chunks(&record, &chunks, &vectors, embedder.model_id())
        .await?;

    info!(
        "Ingested '{}': {} pages, {} chunks",
        doc.title,
        doc.page_count(),
        chunks.len()
    );
    Ok(chunks.len())
}

fn collect_text_files(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        return Err(Error::InvalidPath(path.display().to_string()));
    }
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().map_or(false, |ext| ext == "txt"))
        .collect();
    files.sort();
    Ok(files)
}

/// Print ingestion statistics to the console
pub fn print_ingest_stats(stats: &IngestStats) {
    println!("\n✓ Ingestion complete");
    println!("  Documents processed: {}", stats.docs_processed);
    println!("  Documents skipped:   {}", stats.docs_skipped);
    println!("  Documents failed:    {}", stats.docs_failed);
    println!("  Chunks written:      {}", stats.chunks_written);

    for error in &stats.errors {
        println!("  ! {}", error);
    }
}
