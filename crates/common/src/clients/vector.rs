//! Vector store client (Qdrant REST)
//!
//! Three access paths:
//! - `search` — approximate nearest neighbors with an optional filter
//! - `scroll` — exhaustive filtered scan in stable batches
//! - `fetch_ruku` — all ayahs of one ruku in canonical order
//!
//! Points whose payload does not parse as a known chunk shape are skipped
//! with a warning rather than failing the whole page.

use crate::config::VectorStoreConfig;
use crate::errors::{AppError, Result};
use crate::types::{ChunkPayload, SearchFilter, SearchHit};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Mutex;

/// One page of an exhaustive scroll
#[derive(Debug, Clone)]
pub struct ScrollPage {
    pub points: Vec<SearchHit>,
    /// Opaque cursor for the next page; `None` means the scan is done
    pub next_offset: Option<Value>,
}

/// Trait for vector store access
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Nearest-neighbor search, highest score first
    async fn search(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: &SearchFilter,
    ) -> Result<Vec<SearchHit>>;

    /// One page of an exhaustive filtered scan
    async fn scroll(
        &self,
        filter: &SearchFilter,
        offset: Option<Value>,
        limit: usize,
    ) -> Result<ScrollPage>;

    /// All ayahs belonging to one ruku, in canonical (surah, ayah) order
    async fn fetch_ruku(&self, ruku: u32) -> Result<Vec<SearchHit>>;
}

/// Qdrant HTTP client
pub struct QdrantStore {
    client: reqwest::Client,
    config: VectorStoreConfig,
}

#[derive(Deserialize)]
struct SearchResponse {
    result: Vec<ScoredPoint>,
}

#[derive(Deserialize)]
struct ScoredPoint {
    id: Value,
    #[serde(default)]
    score: f32,
    payload: Value,
}

#[derive(Deserialize)]
struct ScrollResponse {
    result: ScrollResult,
}

#[derive(Deserialize)]
struct ScrollResult {
    points: Vec<ScoredPoint>,
    #[serde(default)]
    next_page_offset: Option<Value>,
}

fn point_id_string(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_point(point: ScoredPoint) -> Option<SearchHit> {
    let id = point_id_string(&point.id);
    match serde_json::from_value::<ChunkPayload>(point.payload) {
        Ok(payload) => Some(SearchHit {
            id,
            score: point.score,
            payload,
        }),
        Err(e) => {
            tracing::warn!(point_id = %id, error = %e, "Skipping point with unparseable payload");
            None
        }
    }
}

/// Translate a [`SearchFilter`] into a Qdrant filter object
fn qdrant_filter(filter: &SearchFilter) -> Option<Value> {
    let mut must = Vec::new();
    if let Some(category) = &filter.category {
        must.push(json!({"key": "category", "match": {"value": category}}));
    }
    if let Some(surah) = filter.surah_number {
        must.push(json!({"key": "surah_number", "match": {"value": surah}}));
    }
    if let Some(ayah) = filter.ayah_number {
        must.push(json!({"key": "ayah_number", "match": {"value": ayah}}));
    }
    if let Some(juz) = filter.juz {
        must.push(json!({"key": "juz", "match": {"value": juz}}));
    }
    if let Some(ruku) = filter.ruku {
        must.push(json!({"key": "ruku", "match": {"value": ruku}}));
    }
    if must.is_empty() {
        None
    } else {
        Some(json!({"must": must}))
    }
}

impl QdrantStore {
    pub fn new(config: VectorStoreConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;
        Ok(Self { client, config })
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        let url = format!(
            "{}/collections/{}/{}",
            self.config.url, self.config.collection, path
        );
        let mut builder = self.client.post(&url).json(body);
        if let Some(key) = &self.config.api_key {
            builder = builder.header("api-key", key);
        }

        let response = builder.send().await.map_err(|e| AppError::VectorStore {
            message: format!("Request failed: {}", e),
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::VectorStore {
                message: format!("API error {}: {}", status, body),
            });
        }

        response.json().await.map_err(|e| AppError::VectorStore {
            message: format!("Failed to parse response: {}", e),
        })
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn search(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: &SearchFilter,
    ) -> Result<Vec<SearchHit>> {
        let mut body = json!({
            "vector": vector,
            "limit": top_k,
            "with_payload": true,
        });
        if let Some(f) = qdrant_filter(filter) {
            body["filter"] = f;
        }

        let raw = self.post("points/search", &body).await?;
        let parsed: SearchResponse =
            serde_json::from_value(raw).map_err(|e| AppError::VectorStore {
                message: format!("Malformed search response: {}", e),
            })?;

        Ok(parsed.result.into_iter().filter_map(parse_point).collect())
    }

    async fn scroll(
        &self,
        filter: &SearchFilter,
        offset: Option<Value>,
        limit: usize,
    ) -> Result<ScrollPage> {
        let mut body = json!({
            "limit": limit,
            "with_payload": true,
        });
        if let Some(f) = qdrant_filter(filter) {
            body["filter"] = f;
        }
        if let Some(offset) = offset {
            body["offset"] = offset;
        }

        let raw = self.post("points/scroll", &body).await?;
        let parsed: ScrollResponse =
            serde_json::from_value(raw).map_err(|e| AppError::VectorStore {
                message: format!("Malformed scroll response: {}", e),
            })?;

        Ok(ScrollPage {
            points: parsed
                .result
                .points
                .into_iter()
                .filter_map(parse_point)
                .collect(),
            next_offset: parsed.result.next_page_offset,
        })
    }

    async fn fetch_ruku(&self, ruku: u32) -> Result<Vec<SearchHit>> {
        let filter = SearchFilter {
            ruku: Some(ruku),
            ..SearchFilter::default()
        };

        let mut hits = Vec::new();
        let mut offset = None;
        loop {
            let page = self
                .scroll(&filter, offset, self.config.scroll_batch_size)
                .await?;
            hits.extend(page.points);
            match page.next_offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        hits.sort_by_key(|h| h.payload.canonical_key());
        Ok(hits)
    }
}

/// In-memory vector store for tests
///
/// `search` ignores the query vector and returns preset hits filtered
/// and ordered by their stored scores, so tests control relevance
/// directly.
#[derive(Default)]
pub struct InMemoryVectorStore {
    hits: Vec<SearchHit>,
    fail: bool,
    search_calls: Mutex<usize>,
}

impl InMemoryVectorStore {
    pub fn new(hits: Vec<SearchHit>) -> Self {
        Self {
            hits,
            ..Self::default()
        }
    }

    /// A store that fails every call, for degradation tests
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// How many `search` calls were issued
    pub fn search_call_count(&self) -> usize {
        *self.search_calls.lock().unwrap()
    }

    fn check_fail(&self) -> Result<()> {
        if self.fail {
            return Err(AppError::VectorStore {
                message: "mock store failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn search(
        &self,
        _vector: &[f32],
        top_k: usize,
        filter: &SearchFilter,
    ) -> Result<Vec<SearchHit>> {
        self.check_fail()?;
        *self.search_calls.lock().unwrap() += 1;

        let mut matched: Vec<SearchHit> = self
            .hits
            .iter()
            .filter(|h| filter.matches(&h.payload))
            .cloned()
            .collect();
        matched.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.id.cmp(&b.id))
        });
        matched.truncate(top_k);
        Ok(matched)
    }

    async fn scroll(
        &self,
        filter: &SearchFilter,
        offset: Option<Value>,
        limit: usize,
    ) -> Result<ScrollPage> {
        self.check_fail()?;

        let start = offset
            .and_then(|v| v.as_u64())
            .map(|v| v as usize)
            .unwrap_or(0);

        let matched: Vec<SearchHit> = self
            .hits
            .iter()
            .filter(|h| filter.matches(&h.payload))
            .cloned()
            .collect();

        let end = (start + limit).min(matched.len());
        let points = matched[start.min(matched.len())..end].to_vec();
        let next_offset = if end < matched.len() {
            Some(json!(end))
        } else {
            None
        };

        Ok(ScrollPage {
            points,
            next_offset,
        })
    }

    async fn fetch_ruku(&self, ruku: u32) -> Result<Vec<SearchHit>> {
        self.check_fail()?;

        let mut hits: Vec<SearchHit> = self
            .hits
            .iter()
            .filter(|h| h.payload.ruku() == Some(ruku))
            .cloned()
            .map(|mut h| {
                // Scroll has no scores
                h.score = 0.0;
                h
            })
            .collect();
        hits.sort_by_key(|h| h.payload.canonical_key());
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AyahPayload;

    fn ayah_hit(id: &str, surah: u32, ayah: u32, ruku: Option<u32>, score: f32) -> SearchHit {
        SearchHit {
            id: id.to_string(),
            score,
            payload: ChunkPayload::Ayah(AyahPayload {
                surah_number: surah,
                ayah_number: ayah,
                surah_name_english: "Al-Baqara".to_string(),
                juz: None,
                ruku,
                content_arabic: String::new(),
                content_english: String::new(),
            }),
        }
    }

    #[test]
    fn test_qdrant_filter_shape() {
        let filter = SearchFilter {
            category: Some("quran".to_string()),
            surah_number: Some(2),
            ..SearchFilter::default()
        };
        let f = qdrant_filter(&filter).unwrap();
        assert_eq!(f["must"].as_array().unwrap().len(), 2);
        assert!(qdrant_filter(&SearchFilter::default()).is_none());
    }

    #[tokio::test]
    async fn test_in_memory_search_sorted_and_truncated() {
        let store = InMemoryVectorStore::new(vec![
            ayah_hit("a", 2, 1, None, 0.5),
            ayah_hit("b", 2, 2, None, 0.9),
            ayah_hit("c", 2, 3, None, 0.7),
        ]);
        let hits = store
            .search(&[0.0], 2, &SearchFilter::default())
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "b");
        assert_eq!(hits[1].id, "c");
        assert_eq!(store.search_call_count(), 1);
    }

    #[tokio::test]
    async fn test_in_memory_scroll_paginates() {
        let store = InMemoryVectorStore::new(vec![
            ayah_hit("a", 2, 1, None, 0.0),
            ayah_hit("b", 2, 2, None, 0.0),
            ayah_hit("c", 2, 3, None, 0.0),
        ]);
        let first = store
            .scroll(&SearchFilter::default(), None, 2)
            .await
            .unwrap();
        assert_eq!(first.points.len(), 2);
        let second = store
            .scroll(&SearchFilter::default(), first.next_offset, 2)
            .await
            .unwrap();
        assert_eq!(second.points.len(), 1);
        assert!(second.next_offset.is_none());
    }

    #[tokio::test]
    async fn test_fetch_ruku_canonical_order() {
        let store = InMemoryVectorStore::new(vec![
            ayah_hit("c", 2, 3, Some(1), 0.9),
            ayah_hit("a", 2, 1, Some(1), 0.1),
            ayah_hit("x", 2, 9, Some(2), 0.5),
        ]);
        let hits = store.fetch_ruku(1).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "a");
        assert_eq!(hits[1].id, "c");
        assert_eq!(hits[0].score, 0.0);
    }
}
