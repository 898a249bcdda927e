//! Document listing command

use crate::error::Result;
use crate::store::{DocumentSummary, IndexStore};

/// List ingested documents with chunk counts
pub async fn cmd_list_documents(store: &IndexStore) -> Result<Vec<DocumentSummary>> {
    store.list_documents().await
}

/// Print the document listing to the console
pub fn print_documents(documents: &[DocumentSummary]) {
    if documents.is_empty() {
        println!("No documents ingested yet. Run 'registrar ingest <dir>' first.");
        return;
    }

    for doc in documents {
        println!(
            "{}  {} ({} pages, {} chunks)",
            &doc.id[..12.min(doc.id.len())],
            doc.title,
            doc.page_count,
            doc.chunk_count
        );
    }
    println!("\n{} document(s)", documents.len());
}
