//! Index store backed by SQLite
//!
//! Persists documents, chunks, and embeddings, and answers nearest-neighbor
//! queries. Embeddings are keyed by `(chunk_id, model_id)` so re-embedding
//! with a different model adds records instead of overwriting, and every
//! row records the distance metric it was computed under; queries against a
//! different metric are rejected. Upserts are last-writer-wins and SQLite
//! serializes concurrent writers, which keeps ingestion workers from
//! interleaving partial rows.

mod schema;

pub use schema::*;

use crate::chunk::Chunk;
use crate::error::{Error, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

/// Distance metric embeddings are stored and queried under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    Cosine,
    Euclidean,
}

impl std::fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DistanceMetric::Cosine => write!(f, "cosine"),
            DistanceMetric::Euclidean => write!(f, "euclidean"),
        }
    }
}

impl FromStr for DistanceMetric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "cosine" => Ok(DistanceMetric::Cosine),
            "euclidean" => Ok(DistanceMetric::Euclidean),
            _ => Err(Error::Config(format!("Unknown distance metric: {}", s))),
        }
    }
}

impl DistanceMetric {
    /// Distance between two vectors; lower is closer
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            DistanceMetric::Cosine => {
                let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
                let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
                let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
                if norm_a == 0.0 || norm_b == 0.0 {
                    1.0
                } else {
                    1.0 - dot / (norm_a * norm_b)
                }
            }
            DistanceMetric::Euclidean => a
                .iter()
                .zip(b)
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f32>()
                .sqrt(),
        }
    }

    /// Map a distance to a 0-1 relevance score, higher is better
    pub fn similarity(&self, distance: f32) -> f32 {
        match self {
            DistanceMetric::Cosine => 1.0 - distance,
            DistanceMetric::Euclidean => 1.0 / (1.0 + distance),
        }
    }
}

/// An ingested document
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    pub source_path: String,
    pub title: String,
    pub page_count: i64,
    pub ingested_at: String,
}

/// A stored chunk joined with its document title, as returned to the retriever
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct HydratedChunk {
    pub chunk_id: String,
    pub document_id: String,
    pub document_title: String,
    pub sequence_index: i64,
    pub text: String,
    pub start_offset: i64,
    pub end_offset: i64,
    pub page_number: i64,
}

/// Per-document summary for listings
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DocumentSummary {
    pub id: String,
    pub title: String,
    pub page_count: i64,
    pub chunk_count: i64,
    pub ingested_at: String,
}

/// Global index statistics
#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub document_count: usize,
    pub chunk_count: usize,
    pub embedding_count: usize,
}

/// Counts removed by a document deletion
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeleteStats {
    pub chunks_deleted: usize,
    pub embeddings_deleted: usize,
}

/// Raw embedding row loaded for a query
#[derive(FromRow)]
struct EmbeddingRow {
    chunk_id: String,
    metric: String,
    vector: Vec<u8>,
}

/// Encode a vector as little-endian f32 bytes
pub fn vector_to_blob(vector: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(vector.len() * 4);
    for v in vector {
        blob.extend_from_slice(&v.to_le_bytes());
    }
    blob
}

/// Decode little-endian f32 bytes back into a vector
pub fn blob_to_vector(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

/// Index store handle
#[derive(Clone)]
pub struct IndexStore {
    pool: SqlitePool,
    dimension: usize,
    metric: DistanceMetric,
}

impl IndexStore {
    /// Open (creating if missing) the index database
    pub async fn connect(db_path: &Path, dimension: usize, metric: DistanceMetric) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        debug!("Connecting to index database at {:?}", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Ok(Self {
            pool,
            dimension,
            metric,
        })
    }

    /// Initialize the database schema
    pub async fn init_schema(&self) -> Result<()> {
        info!("Initializing index schema");
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    /// Check whether the schema has been created
    pub async fn is_initialized(&self) -> Result<bool> {
        let result: Option<(i32,)> =
            sqlx::query_as("SELECT 1 FROM sqlite_master WHERE type='table' AND name='documents'")
                .fetch_optional(&self.pool)
                .await?;
        Ok(result.is_some())
    }

    /// Configured vector dimension
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Configured distance metric
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }

    // ===== Ingestion writes =====

    /// Upsert one chunk together with its embedding.
    ///
    /// Idempotent on `(chunk_id, model_id)`: repeating the call replaces the
    /// vector and metadata without duplicating rows.
    pub async fn upsert(&self, chunk: &Chunk, vector: &[f32], model_id: &str) -> Result<()> {
        self.check_dimension(vector)?;

        let mut tx = self.pool.begin().await?;
        upsert_chunk(&mut tx, chunk).await?;
        upsert_embedding(&mut tx, chunk, vector, model_id, self.metric, self.dimension).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Write a document with all its chunks and embeddings in one transaction.
    ///
    /// Chunks from an earlier ingestion of the same document whose
    /// sequence_index is past the new count are removed, so re-ingestion
    /// never leaves stale tails. A failure rolls the whole document back.
    pub async fn insert_document_chunks(
        &self,
        document: &DocumentRecord,
        chunks: &[Chunk],
        vectors: &[Vec<f32>],
        model_id: &str,
    ) -> Result<()> {
        if chunks.len() != vectors.len() {
            return Err(Error::Other(format!(
                "{} chunks but {} vectors for document {}",
                chunks.len(),
                vectors.len(),
                document.id
            )));
        }
        for vector in vectors {
            self.check_dimension(vector)?;
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO documents (id, source_path, title, page_count, ingested_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                source_path = excluded.source_path,
                title = excluded.title,
                page_count = excluded.page_count,
                ingested_at = excluded.ingested_at
            "#,
        )
        .bind(&document.id)
        .bind(&document.source_path)
        .bind(&document.title)
        .bind(document.page_count)
        .bind(&document.ingested_at)
        .execute(&mut *tx)
        .await?;

        // Drop stale tail chunks from a previous chunking of this document
        sqlx::query(
            r#"
            DELETE FROM embeddings WHERE chunk_id IN
                (SELECT id FROM chunks WHERE document_id = ? AND sequence_index >= ?)
            "#,
        )
        .bind(&document.id)
        .bind(chunks.len() as i64)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM chunks WHERE document_id = ? AND sequence_index >= ?")
            .bind(&document.id)
            .bind(chunks.len() as i64)
            .execute(&mut *tx)
            .await?;

        for (chunk, vector) in chunks.iter().zip(vectors) {
            upsert_chunk(&mut tx, chunk).await?;
            upsert_embedding(&mut tx, chunk, vector, model_id, self.metric, self.dimension)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    // ===== Query =====

    /// Nearest-neighbor query over embeddings of the given model.
    ///
    /// Returns at most `k` `(chunk_id, distance)` pairs ordered by ascending
    /// distance, ties broken by chunk_id, so identical queries against an
    /// unchanged store return identical sequences.
    pub async fn query(
        &self,
        vector: &[f32],
        k: usize,
        model_id: &str,
    ) -> Result<Vec<(String, f32)>> {
        self.check_dimension(vector)?;

        let rows = sqlx::query_as::<_, EmbeddingRow>(
            "SELECT chunk_id, metric, vector FROM embeddings WHERE model_id = ?",
        )
        .bind(model_id)
        .fetch_all(&self.pool)
        .await?;

        let mut scored = Vec::with_capacity(rows.len());
        for row in rows {
            let stored: DistanceMetric = row.metric.parse()?;
            if stored != self.metric {
                return Err(Error::MetricMismatch {
                    stored: stored.to_string(),
                    requested: self.metric.to_string(),
                });
            }
            let candidate = blob_to_vector(&row.vector);
            scored.push((row.chunk_id, self.metric.distance(vector, &candidate)));
        }

        scored.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        scored.truncate(k);
        Ok(scored)
    }

    /// Fetch a chunk joined with its document title
    pub async fn get_chunk(&self, chunk_id: &str) -> Result<Option<HydratedChunk>> {
        let chunk = sqlx::query_as::<_, HydratedChunk>(
            r#"
            SELECT c.id AS chunk_id, c.document_id, d.title AS document_title,
                   c.sequence_index, c.text, c.start_offset, c.end_offset, c.page_number
            FROM chunks c
            JOIN documents d ON c.document_id = d.id
            WHERE c.id = ?
            "#,
        )
        .bind(chunk_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(chunk)
    }

    // ===== Documents =====

    /// Get a document by id
    pub async fn get_document(&self, id: &str) -> Result<Option<DocumentRecord>> {
        let doc = sqlx::query_as::<_, DocumentRecord>("SELECT * FROM documents WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(doc)
    }

    /// List documents with chunk counts, newest first
    pub async fn list_documents(&self) -> Result<Vec<DocumentSummary>> {
        let docs = sqlx::query_as::<_, DocumentSummary>(
            r#"
            SELECT d.id, d.title, d.page_count, d.ingested_at,
                   (SELECT COUNT(*) FROM chunks c WHERE c.document_id = d.id) AS chunk_count
            FROM documents d
            ORDER BY d.ingested_at DESC, d.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(docs)
    }

    /// Delete a document and cascade to its chunks and embeddings
    pub async fn delete_document(&self, document_id: &str) -> Result<DeleteStats> {
        let existing = self.get_document(document_id).await?;
        if existing.is_none() {
            return Err(Error::DocumentNotFound(document_id.to_string()));
        }

        let mut tx = self.pool.begin().await?;

        let embeddings = sqlx::query(
            r#"
            DELETE FROM embeddings WHERE chunk_id IN
                (SELECT id FROM chunks WHERE document_id = ?)
            "#,
        )
        .bind(document_id)
        .execute(&mut *tx)
        .await?;

        let chunks = sqlx::query("DELETE FROM chunks WHERE document_id = ?")
            .bind(document_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(document_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(DeleteStats {
            chunks_deleted: chunks.rows_affected() as usize,
            embeddings_deleted: embeddings.rows_affected() as usize,
        })
    }

    // ===== Statistics =====

    /// Global index statistics
    pub async fn stats(&self) -> Result<IndexStats> {
        let document_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await?;
        let chunk_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
            .fetch_one(&self.pool)
            .await?;
        let embedding_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM embeddings")
            .fetch_one(&self.pool)
            .await?;

        Ok(IndexStats {
            document_count: document_count as usize,
            chunk_count: chunk_count as usize,
            embedding_count: embedding_count as usize,
        })
    }

    // ===== Ingestion runs =====

    /// Record the start of an ingestion run, returning its id
    pub async fn start_ingestion_run(&self) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO ingestion_runs (id, started_at, status) VALUES (?, ?, 'running')")
            .bind(&id)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    /// Mark an ingestion run finished with its final counts
    pub async fn complete_ingestion_run(
        &self,
        id: &str,
        status: &str,
        docs_processed: usize,
        docs_skipped: usize,
        docs_failed: usize,
        chunks_written: usize,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE ingestion_runs SET
                completed_at = ?, status = ?,
                docs_processed = ?, docs_skipped = ?, docs_failed = ?, chunks_written = ?
            WHERE id = ?
            "#,
        )
        .bind(Utc::now().to_rfc3339())
        .bind(status)
        .bind(docs_processed as i64)
        .bind(docs_skipped as i64)
        .bind(docs_failed as i64)
        .bind(chunks_written as i64)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

async fn upsert_chunk(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    chunk: &Chunk,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO chunks (id, document_id, sequence_index, text, start_offset, end_offset, page_number, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            document_id = excluded.document_id,
            sequence_index = excluded.sequence_index,
            text = excluded.text,
            start_offset = excluded.start_offset,
            end_offset = excluded.end_offset,
            page_number = excluded.page_number
        "#,
    )
    .bind(&chunk.chunk_id)
    .bind(&chunk.document_id)
    .bind(chunk.sequence_index as i64)
    .bind(&chunk.text)
    .bind(chunk.start_offset as i64)
    .bind(chunk.end_offset as i64)
    .bind(chunk.page_number as i64)
    .bind(Utc::now().to_rfc3339())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn upsert_embedding(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    chunk: &Chunk,
    vector: &[f32],
    model_id: &str,
    metric: DistanceMetric,
    dimension: usize,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO embeddings (chunk_id, model_id, dimension, metric, vector, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(chunk_id, model_id) DO UPDATE SET
            dimension = excluded.dimension,
            metric = excluded.metric,
            vector = excluded.vector,
            created_at = excluded.created_at
        "#,
    )
    .bind(&chunk.chunk_id)
    .bind(model_id)
    .bind(dimension as i64)
    .bind(metric.to_string())
    .bind(vector_to_blob(vector))
    .bind(Utc::now().to_rfc3339())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::chunk_id;
    use tempfile::TempDir;

    fn make_chunk(document_id: &str, seq: u32, text: &str) -> Chunk {
        Chunk {
            chunk_id: chunk_id(document_id, seq),
            document_id: document_id.to_string(),
            text: text.to_string(),
            start_offset: 0,
            end_offset: text.len(),
            page_number: 1,
            sequence_index: seq,
        }
    }

    fn make_document(id: &str) -> DocumentRecord {
        DocumentRecord {
            id: id.to_string(),
            source_path: format!("/docs/{}.txt", id),
            title: id.to_string(),
            page_count: 1,
            ingested_at: Utc::now().to_rfc3339(),
        }
    }

    async fn open_store(dir: &TempDir, metric: DistanceMetric) -> IndexStore {
        let store = IndexStore::connect(&dir.path().join("index.db"), 3, metric)
            .await
            .unwrap();
        store.init_schema().await.unwrap();
        store
    }

    #[test]
    fn test_vector_blob_roundtrip() {
        let vector = vec![0.25f32, -1.5, 3.75];
        assert_eq!(blob_to_vector(&vector_to_blob(&vector)), vector);
    }

    #[test]
    fn test_cosine_distance() {
        let metric = DistanceMetric::Cosine;
        let d = metric.distance(&[1.0, 0.0], &[1.0, 0.0]);
        assert!(d.abs() < 1e-6);

        let d = metric.distance(&[1.0, 0.0], &[0.0, 1.0]);
        assert!((d - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_euclidean_similarity_decreases_with_distance() {
        let metric = DistanceMetric::Euclidean;
        assert!(metric.similarity(0.0) > metric.similarity(2.0));
        assert!((metric.similarity(0.0) - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, DistanceMetric::Cosine).await;

        let doc = make_document("doc-1");
        let chunk = make_chunk("doc-1", 0, "resit exams run in September");
        store
            .insert_document_chunks(&doc, &[chunk.clone()], &[vec![1.0, 0.0, 0.0]], "model-a")
            .await
            .unwrap();

        store
            .upsert(&chunk, &[1.0, 0.0, 0.0], "model-a")
            .await
            .unwrap();
        store
            .upsert(&chunk, &[1.0, 0.0, 0.0], "model-a")
            .await
            .unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.chunk_count, 1);
        assert_eq!(stats.embedding_count, 1);
    }

    #[tokio::test]
    async fn test_reembedding_with_new_model_adds_record() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, DistanceMetric::Cosine).await;

        let doc = make_document("doc-1");
        let chunk = make_chunk("doc-1", 0, "tuition deadlines");
        store
            .insert_document_chunks(&doc, &[chunk.clone()], &[vec![1.0, 0.0, 0.0]], "model-a")
            .await
            .unwrap();
        store
            .upsert(&chunk, &[0.0, 1.0, 0.0], "model-b")
            .await
            .unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.chunk_count, 1);
        assert_eq!(stats.embedding_count, 2);
    }

    #[tokio::test]
    async fn test_query_orders_by_distance_with_id_tiebreak() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, DistanceMetric::Cosine).await;

        let doc = make_document("doc-1");
        let chunks = vec![
            make_chunk("doc-1", 0, "a"),
            make_chunk("doc-1", 1, "b"),
            make_chunk("doc-1", 2, "c"),
        ];
        // Chunks 1 and 2 are equidistant from the query; chunk 0 is farther.
        let vectors = vec![
            vec![0.0, 1.0, 0.0],
            vec![1.0, 0.0, 0.0],
            vec![1.0, 0.0, 0.0],
        ];
        store
            .insert_document_chunks(&doc, &chunks, &vectors, "model-a")
            .await
            .unwrap();

        let results = store.query(&[1.0, 0.0, 0.0], 3, "model-a").await.unwrap();
        assert_eq!(results.len(), 3);
        assert!(results[0].1 < results[2].1);

        let mut tied: Vec<&str> = vec![results[0].0.as_str(), results[1].0.as_str()];
        tied.sort();
        assert_eq!(results[0].0, tied[0]);
        assert_eq!(results[1].0, tied[1]);

        // Determinism across repeated calls
        let again = store.query(&[1.0, 0.0, 0.0], 3, "model-a").await.unwrap();
        assert_eq!(results, again);
    }

    #[tokio::test]
    async fn test_query_respects_k_and_model_filter() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, DistanceMetric::Cosine).await;

        let doc = make_document("doc-1");
        let chunks = vec![make_chunk("doc-1", 0, "a"), make_chunk("doc-1", 1, "b")];
        let vectors = vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]];
        store
            .insert_document_chunks(&doc, &chunks, &vectors, "model-a")
            .await
            .unwrap();

        let results = store.query(&[1.0, 0.0, 0.0], 1, "model-a").await.unwrap();
        assert_eq!(results.len(), 1);

        let other_model = store.query(&[1.0, 0.0, 0.0], 5, "model-b").await.unwrap();
        assert!(other_model.is_empty());
    }

    #[tokio::test]
    async fn test_query_rejects_dimension_mismatch() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, DistanceMetric::Cosine).await;

        let err = store.query(&[1.0, 0.0], 3, "model-a").await.unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[tokio::test]
    async fn test_query_rejects_metric_mismatch() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, DistanceMetric::Cosine).await;

        let doc = make_document("doc-1");
        let chunk = make_chunk("doc-1", 0, "a");
        store
            .insert_document_chunks(&doc, &[chunk], &[vec![1.0, 0.0, 0.0]], "model-a")
            .await
            .unwrap();

        // Reopen the same database configured for euclidean distance
        let euclidean = IndexStore::connect(
            &dir.path().join("index.db"),
            3,
            DistanceMetric::Euclidean,
        )
        .await
        .unwrap();

        let err = euclidean
            .query(&[1.0, 0.0, 0.0], 3, "model-a")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MetricMismatch { .. }));
    }

    #[tokio::test]
    async fn test_delete_document_cascades() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, DistanceMetric::Cosine).await;

        let doc = make_document("doc-1");
        let chunks = vec![make_chunk("doc-1", 0, "a"), make_chunk("doc-1", 1, "b")];
        let vectors = vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]];
        store
            .insert_document_chunks(&doc, &chunks, &vectors, "model-a")
            .await
            .unwrap();

        let deleted = store.delete_document("doc-1").await.unwrap();
        assert_eq!(deleted.chunks_deleted, 2);
        assert_eq!(deleted.embeddings_deleted, 2);

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.document_count, 0);
        assert_eq!(stats.chunk_count, 0);
        assert_eq!(stats.embedding_count, 0);
    }

    #[tokio::test]
    async fn test_delete_missing_document_fails() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, DistanceMetric::Cosine).await;

        let err = store.delete_document("nope").await.unwrap_err();
        assert!(matches!(err, Error::DocumentNotFound(_)));
    }

    #[tokio::test]
    async fn test_reingestion_drops_stale_tail_chunks() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, DistanceMetric::Cosine).await;

        let doc = make_document("doc-1");
        let three: Vec<Chunk> = (0..3).map(|i| make_chunk("doc-1", i, "t")).collect();
        let vectors: Vec<Vec<f32>> = (0..3).map(|_| vec![1.0, 0.0, 0.0]).collect();
        store
            .insert_document_chunks(&doc, &three, &vectors, "model-a")
            .await
            .unwrap();

        let two: Vec<Chunk> = (0..2).map(|i| make_chunk("doc-1", i, "t")).collect();
        store
            .insert_document_chunks(&doc, &two, &vectors[..2].to_vec(), "model-a")
            .await
            .unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.chunk_count, 2);
        assert_eq!(stats.embedding_count, 2);
    }

    #[tokio::test]
    async fn test_persists_across_reconnect() {
        let dir = TempDir::new().unwrap();
        {
            let store = open_store(&dir, DistanceMetric::Cosine).await;
            let doc = make_document("doc-1");
            let chunk = make_chunk("doc-1", 0, "holidays calendar");
            store
                .insert_document_chunks(&doc, &[chunk], &[vec![1.0, 0.0, 0.0]], "model-a")
                .await
                .unwrap();
        }

        let reopened = IndexStore::connect(&dir.path().join("index.db"), 3, DistanceMetric::Cosine)
            .await
            .unwrap();
        let results = reopened.query(&[1.0, 0.0, 0.0], 1, "model-a").await.unwrap();
        assert_eq!(results.len(), 1);

        let chunk = reopened.get_chunk(&results[0].0).await.unwrap().unwrap();
        assert_eq!(chunk.text, "holidays calendar");
        assert_eq!(chunk.document_title, "doc-1");
    }

    #[tokio::test]
    async fn test_ingestion_run_lifecycle() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, DistanceMetric::Cosine).await;

        let run_id = store.start_ingestion_run().await.unwrap();
        store
            .complete_ingestion_run(&run_id, "completed", 3, 1, 0, 42)
            .await
            .unwrap();

        let status: String =
            sqlx::query_scalar("SELECT status FROM ingestion_runs WHERE id = ?")
                .bind(&run_id)
                .fetch_one(&store.pool)
                .await
                .unwrap();
        assert_eq!(status, "completed");
    }
}
