//! Default values for configuration

/// Default embedding model (multilingual, matches French + English corpora)
pub fn default_embedding_model() -> String {
    "sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2".to_string()
}

/// Default embedding dimension (must match the model)
pub fn default_embedding_dimension() -> usize {
    384
}

/// Default embedding backend URL
pub fn default_embedding_backend_url() -> String {
    std::env::var("REGISTRAR_EMBEDDING_URL")
        .unwrap_or_else(|_| "http://127.0.0.1:7997".to_string())
}

/// Default batch size for embedding during ingestion
pub fn default_embedding_batch_size() -> usize {
    32
}

/// Default embedding request timeout in seconds
pub fn default_embedding_timeout() -> u64 {
    30
}

/// Default chunk unit (words or chars)
pub fn default_chunk_unit() -> String {
    "words".to_string()
}

/// Default chunk size in units
pub fn default_chunk_size() -> usize {
    500
}

/// Default overlap between consecutive chunks in units
pub fn default_chunk_overlap() -> usize {
    100
}

/// Default slack window for break-point search, as a fraction of chunk_size
pub fn default_chunk_slack_ratio() -> f32 {
    0.2
}

/// Default minimum final-fragment size, as a fraction of chunk_size
pub fn default_min_fragment_ratio() -> f32 {
    0.2
}

/// Default distance metric for the index
pub fn default_index_metric() -> String {
    "cosine".to_string()
}

/// Default number of chunks retrieved per question
pub fn default_query_top_k() -> usize {
    4
}

/// Default minimum similarity score (0.0 - 1.0)
pub fn default_query_min_score() -> f32 {
    0.25
}

/// Default: merge adjacent chunks from the same document
pub fn default_merge_adjacent() -> bool {
    true
}

/// Default generation backend URL (Ollama-compatible)
pub fn default_generation_backend_url() -> String {
    std::env::var("REGISTRAR_GENERATION_URL")
        .unwrap_or_else(|_| "http://127.0.0.1:11434".to_string())
}

/// Default generation model
pub fn default_generation_model() -> String {
    "mistral:7b-instruct".to_string()
}

/// Default generation temperature
pub fn default_generation_temperature() -> f32 {
    0.2
}

/// Default context budget for the assembled prompt, in approximate tokens
pub fn default_context_budget() -> usize {
    3072
}

/// Default generation request timeout in seconds
pub fn default_generation_timeout() -> u64 {
    60
}

/// Default retry count for collaborator requests
pub fn default_max_retries() -> u32 {
    2
}

/// Default number of concurrent ingestion workers
pub fn default_ingest_workers() -> usize {
    4
}
