//! Embedding generation
//!
//! The embedding model is a collaborator behind a vector-in/vector-out HTTP
//! contract. This module provides the trait, an HTTP backend with bounded
//! retry, and batch helpers for ingestion.

mod http_backend;

pub use http_backend::*;

use crate::config::EmbeddingConfig;
use crate::error::Result;
use async_trait::async_trait;

/// Trait for embedding providers
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, one fixed-dimension vector per input
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;

    /// Embedding dimension
    fn dimension(&self) -> usize;

    /// Model identifier recorded alongside stored vectors
    fn model_id(&self) -> &str;
}

/// Create an embedder from configuration
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Box<dyn Embedder>> {
    let embedder = HttpEmbedder::new(config)?;
    Ok(Box::new(embedder))
}

/// Embed a single text, e.g. a question at query time
pub async fn embed_one(embedder: &dyn Embedder, text: &str) -> Result<Vec<f32>> {
    let mut vectors = embedder.embed(vec![text.to_string()]).await?;
    vectors.pop().ok_or_else(|| {
        crate::error::Error::EmbeddingService("Backend returned no embedding".to_string())
    })
}

/// Embed texts in batches to bound request sizes during ingestion
pub async fn embed_in_batches(
    embedder: &dyn Embedder,
    texts: Vec<String>,
    batch_size: usize,
) -> Result<Vec<Vec<f32>>> {
    let mut all_embeddings = Vec::with_capacity(texts.len());

    for batch in texts.chunks(batch_size.max(1)) {
        let embeddings = embedder.embed(batch.to_vec()).await?;
        all_embeddings.extend(embeddings);
    }

    Ok(all_embeddings)
}


#[cfg(test)]
mod tests {
    use super::testing::StubEmbedder;
    use super::*;
    use crate::error::Error;

    #[tokio::test]
    async fn test_embed_one_returns_single_vector() {
        let embedder = StubEmbedder { dimension: 8 };
        let v = embed_one(&embedder, "when do exams start?").await.unwrap();
        assert_eq!(v.len(), 8);
    }

    #[tokio::test]
    async fn test_embed_one_is_deterministic() {
        let embedder = StubEmbedder { dimension: 8 };
        let a = embed_one(&embedder, "resit schedule").await.unwrap();
        let b = embed_one(&embedder, "resit schedule").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_embed_in_batches_preserves_order_and_count() {
        let embedder = StubEmbedder { dimension: 4 };
        let texts: Vec<String> = (0..10).map(|i| format!("chunk {}", i)).collect();

        let batched = embed_in_batches(&embedder, texts.clone(), 3).await.unwrap();
        let direct = embedder.embed(texts).await.unwrap();

        assert_eq!(batched.len(), 10);
        assert_eq!(batched, direct);
    }

    #[tokio::test]
    async fn test_embed_one_with_empty_response() {
        struct EmptyEmbedder;

        #[async_trait]
        impl Embedder for EmptyEmbedder {
            async fn embed(&self, _texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
                Ok(Vec::new())
            }
            fn dimension(&self) -> usize {
                4
            }
            fn model_id(&self) -> &str {
                "empty"
            }
        }

        let err = embed_one(&EmptyEmbedder, "anything").await.unwrap_err();
        assert!(matches!(err, Error::EmbeddingService(_)));
    }
}
