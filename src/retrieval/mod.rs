// src/retrieval/mod.rs
// Semantic document retrieval: embedding client + Qdrant-backed index.

use crate::config::CONFIG;
use crate::error::SolaceError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, PointStruct, SearchPointsBuilder, UpsertPointsBuilder,
    Value as QdrantValue, VectorParamsBuilder,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// A ranked chunk of background text. Ephemeral - produced per query, never
/// persisted by this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedSnippet {
    pub text: String,
    pub source_id: String,
    pub similarity_score: f32,
}

/// A document chunk ready for ingestion.
#[derive(Debug, Clone)]
pub struct DocumentChunk {
    pub id: String,
    pub text: String,
    pub metadata: HashMap<String, String>,
}

/// Narrow port over the vector index. The core never touches the storage
/// format - it only issues these calls.
#[async_trait]
pub trait DocumentRetriever: Send + Sync {
    /// Top-k most similar chunks, best first. An empty index or nothing
    /// above the similarity floor yields an empty vec, not an error.
    async fn query(&self, text: &str, k: usize) -> Result<Vec<RetrievedSnippet>, SolaceError>;

    /// Idempotent per chunk id: re-ingesting overwrites, never duplicates.
    async fn ingest(&self, chunk: DocumentChunk) -> Result<(), SolaceError>;

    /// Drop every indexed chunk.
    async fn clear(&self) -> Result<(), SolaceError>;
}

/// Hosted embedding API client (OpenAI-compatible `/embeddings`).
pub struct EmbeddingClient {
    client: reqwest::Client,
    api_key: String,
}

impl EmbeddingClient {
    pub fn new(api_key: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(CONFIG.http_timeout))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client, api_key }
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = CONFIG.openai_api_url("embeddings");
        let body = serde_json::json!({
            "input": text,
            "model": CONFIG.embedding_model,
            "dimensions": CONFIG.embedding_dim,
        });

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .context("embedding request failed")?;

        if !resp.status().is_success() {
            anyhow::bail!(
                "embedding request returned {}: {}",
                resp.status(),
                resp.text().await.unwrap_or_default()
            );
        }

        let resp_json: serde_json::Value = resp.json().await?;
        let embedding = resp_json["data"][0]["embedding"]
            .as_array()
            .ok_or_else(|| anyhow::anyhow!("no embedding in response"))?
            .iter()
            .filter_map(|v| v.as_f64().map(|f| f as f32))
            .collect();

        Ok(embedding)
    }
}

/// Qdrant-backed retriever. Holds `Option<Qdrant>` so a missing or
/// unreachable index degrades to "retrieval unavailable" instead of taking
/// the session down.
pub struct QdrantRetriever {
    qdrant: Option<Qdrant>,
    embeddings: EmbeddingClient,
    collection: String,
    min_score: f32,
}

impl QdrantRetriever {
    pub fn new(qdrant_url: &str, embeddings: EmbeddingClient) -> Self {
        let qdrant = match Qdrant::from_url(qdrant_url).skip_compatibility_check().build() {
            Ok(client) => {
                info!("Connected to Qdrant at {}", qdrant_url);
                Some(client)
            }
            Err(e) => {
                warn!("Failed to connect to Qdrant: {} - retrieval disabled", e);
                None
            }
        };

        Self {
            qdrant,
            embeddings,
            collection: CONFIG.qdrant_collection.clone(),
            min_score: CONFIG.retrieval_min_score,
        }
    }

    pub fn is_available(&self) -> bool {
        self.qdrant.is_some()
    }

    fn client(&self) -> Result<&Qdrant, SolaceError> {
        self.qdrant
            .as_ref()
            .ok_or_else(|| SolaceError::RetrieverUnavailable("qdrant not connected".into()))
    }

    async fn ensure_collection(&self) -> Result<(), SolaceError> {
        let qdrant = self.client()?;
        let exists = qdrant
            .collection_exists(&self.collection)
            .await
            .map_err(|e| SolaceError::RetrieverUnavailable(e.to_string()))?;
        if !exists {
            info!("Creating Qdrant collection: {}", self.collection);
            qdrant
                .create_collection(
                    CreateCollectionBuilder::new(&self.collection).vectors_config(
                        VectorParamsBuilder::new(CONFIG.embedding_dim as u64, Distance::Cosine),
                    ),
                )
                .await
                .map_err(|e| SolaceError::RetrieverUnavailable(e.to_string()))?;
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentRetriever for QdrantRetriever {
    async fn query(&self, text: &str, k: usize) -> Result<Vec<RetrievedSnippet>, SolaceError> {
        let qdrant = self.client()?;

        let exists = qdrant
            .collection_exists(&self.collection)
            .await
            .map_err(|e| SolaceError::RetrieverUnavailable(e.to_string()))?;
        if !exists {
            return Ok(Vec::new());
        }

        let embedding = self
            .embeddings
            .embed(text)
            .await
            .map_err(|e| SolaceError::RetrieverUnavailable(e.to_string()))?;

        let search = SearchPointsBuilder::new(&self.collection, embedding, k as u64)
            .with_payload(true)
            .score_threshold(self.min_score);

        let results = qdrant
            .search_points(search)
            .await
            .map_err(|e| SolaceError::RetrieverUnavailable(e.to_string()))?;

        let snippets: Vec<RetrievedSnippet> = results
            .result
            .into_iter()
            .filter_map(|point| {
                let text = point.payload.get("content")?.as_str()?.to_string();
                let source_id = point
                    .payload
                    .get("source_id")
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string())
                    .unwrap_or_default();
                Some(RetrievedSnippet {
                    text,
                    source_id,
                    similarity_score: point.score,
                })
            })
            .collect();

        debug!(count = snippets.len(), "retrieval query complete");
        Ok(snippets)
    }

    async fn ingest(&self, chunk: DocumentChunk) -> Result<(), SolaceError> {
        self.ensure_collection().await?;
        let qdrant = self.client()?;

        let embedding = self
            .embeddings
            .embed(&chunk.text)
            .await
            .map_err(|e| SolaceError::RetrieverUnavailable(e.to_string()))?;

        let mut payload: HashMap<String, QdrantValue> = HashMap::new();
        payload.insert("content".to_string(), chunk.text.clone().into());
        payload.insert("source_id".to_string(), chunk.id.clone().into());
        for (key, value) in chunk.metadata {
            payload.insert(key, value.into());
        }

        // Point id is a stable hash of the chunk id: re-ingesting the same
        // id upserts in place.
        let point = PointStruct::new(hash_string(&chunk.id), embedding, payload);

        qdrant
            .upsert_points(UpsertPointsBuilder::new(&self.collection, vec![point]).wait(true))
            .await
            .map_err(|e| SolaceError::RetrieverUnavailable(e.to_string()))?;

        debug!(id = %chunk.id, "ingested chunk");
        Ok(())
    }

    async fn clear(&self) -> Result<(), SolaceError> {
        let qdrant = self.client()?;
        let exists = qdrant
            .collection_exists(&self.collection)
            .await
            .map_err(|e| SolaceError::RetrieverUnavailable(e.to_string()))?;
        if exists {
            qdrant
                .delete_collection(&self.collection)
                .await
                .map_err(|e| SolaceError::RetrieverUnavailable(e.to_string()))?;
        }
        self.ensure_collection().await
    }
}

/// Stable u64 id for a chunk id string.
fn hash_string(s: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    s.hash(&mut hasher);
    hasher.finish()
}

const INGEST_EXTENSIONS: &[&str] = &["txt", "md", "markdown"];

/// Scan a folder for ingestable documents. Chunk ids derive from file stems
/// so re-running ingestion overwrites rather than duplicates.
pub fn collect_documents(folder: &Path) -> Result<Vec<DocumentChunk>> {
    let mut chunks = Vec::new();

    for entry in WalkDir::new(folder).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());
        if !ext.is_some_and(|e| INGEST_EXTENSIONS.contains(&e.as_str())) {
            continue;
        }

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        if text.trim().is_empty() {
            continue;
        }

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document");
        let filename = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("document")
            .to_string();
        let category = path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|s| s.to_str())
            .unwrap_or("general")
            .to_string();

        let mut metadata = HashMap::new();
        metadata.insert("filename".to_string(), filename);
        metadata.insert("category".to_string(), category);

        chunks.push(DocumentChunk {
            id: format!("doc_{}", stem),
            text,
            metadata,
        });
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_hash_string_is_stable() {
        assert_eq!(hash_string("doc_intro"), hash_string("doc_intro"));
        assert_ne!(hash_string("doc_intro"), hash_string("doc_outro"));
    }

    #[test]
    fn test_collect_documents_filters_extensions() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.md"), "some research notes").unwrap();
        fs::write(dir.path().join("data.csv"), "a,b,c").unwrap();
        fs::write(dir.path().join("empty.txt"), "   ").unwrap();

        let chunks = collect_documents(dir.path()).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].id, "doc_notes");
        assert_eq!(chunks[0].metadata.get("filename").unwrap(), "notes.md");
    }

    #[test]
    fn test_collect_documents_ids_are_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("guide.txt"), "ingest me").unwrap();

        let first = collect_documents(dir.path()).unwrap();
        let second = collect_documents(dir.path()).unwrap();
        assert_eq!(first[0].id, second[0].id);
    }
}
