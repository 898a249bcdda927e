//! Remove command implementation

use crate::error::{Error, Result};
use crate::store::{DeleteStats, IndexStore};

/// Delete a document and everything derived from it.
///
/// Accepts a full document id or an unambiguous prefix.
pub async fn cmd_remove(store: &IndexStore, document_id: &str) -> Result<DeleteStats> {
    let resolved = resolve_document_id(store, document_id).await?;
    store.delete_document(&resolved).await
}

async fn resolve_document_id(store: &IndexStore, id_or_prefix: &str) -> Result<String> {
    if store.get_document(id_or_prefix).await?.is_some() {
        return Ok(id_or_prefix.to_string());
    }

    let matches: Vec<String> = store
        .list_documents()
        .await?
        .into_iter()
        .map(|d| d.id)
        .filter(|id| id.starts_with(id_or_prefix))
        .collect();

    match matches.len() {
        1 => Ok(matches.into_iter().next().unwrap()),
        0 => Err(Error::DocumentNotFound(id_or_prefix.to_string())),
        _ => Err(Error::Other(format!(
            "Document id prefix '{}' is ambiguous ({} matches)",
            id_or_prefix,
            matches.len()
        ))),
    }
}

/// Print deletion counts to the console
pub fn print_remove_stats(document_id: &str, stats: &DeleteStats) {
    println!("✓ Removed document {}", document_id);
    println!("  Chunks deleted:     {}", stats.chunks_deleted);
    println!("  Embeddings deleted: {}", stats.embeddings_deleted);
}
