//! Hybrid search orchestration
//!
//! Full pipeline: classify → expand → embed → parallel vector searches →
//! max-score merge → supplementary scripture search + diversification →
//! ruku passage expansion → keyword-confirmed merge for counting/listing.
//! External calls with no data dependency run in parallel; merging is a
//! pure reduction over the collected results.

pub mod keyword;

use crate::classifier::{QueryClassifier, QueryIntent, QueryType};
use crate::format;
use crate::prompts::QUERY_EXPANSION_PROMPT;
use bayan_common::clients::{Embedder, LlmClient, VectorStore};
use bayan_common::config::{RetrievalConfig, VectorStoreConfig};
use bayan_common::errors::Result;
use bayan_common::types::{ChatMessage, SearchFilter, SearchHit};
use std::collections::HashMap;
use std::sync::Arc;

/// Result of the retrieval pipeline, consumed by the answer engine.
/// `sources_text` and citation order stay index-aligned downstream.
#[derive(Debug, Clone)]
pub struct RagResult {
    pub sources_text: String,
    pub query_context: String,
    pub hits: Vec<SearchHit>,
    pub intent: QueryIntent,
}

/// Retrieval orchestrator over the external service clients
pub struct Retriever {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    llm: Arc<dyn LlmClient>,
    classifier: QueryClassifier,
    cfg: RetrievalConfig,
    scroll_batch_size: usize,
}

impl Retriever {
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn LlmClient>,
        cfg: RetrievalConfig,
        store_cfg: &VectorStoreConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            llm,
            classifier: QueryClassifier::new(&cfg),
            cfg,
            scroll_batch_size: store_cfg.scroll_batch_size,
        }
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.cfg
    }

    /// Run the full retrieval pipeline and return formatted sources.
    ///
    /// Returns `Ok(None)` when nothing relevant was found (and the query
    /// is not a structural fact). Store and embedding failures propagate
    /// so the caller can present a degraded-service answer instead of
    /// fabricating one.
    pub async fn retrieve_and_format(
        &self,
        question: &str,
        category: Option<&str>,
        top_k: usize,
    ) -> Result<Option<RagResult>> {
        let intent = self.classifier.classify(question);
        tracing::info!(
            query_type = ?intent.query_type,
            keywords = intent.keywords.len(),
            "Query classified"
        );

        let hits = if intent.structural_context.is_some() {
            // Answered from constants; no search at all
            tracing::info!("Structural fact query, skipping search");
            Vec::new()
        } else if intent.query_type == QueryType::Metadata {
            match &intent.metadata_filter {
                Some(filter) => {
                    let hits = keyword::metadata_search(
                        self.store.as_ref(),
                        filter,
                        intent.max_results,
                        self.scroll_batch_size,
                    )
                    .await?;
                    tracing::info!(results = hits.len(), "Metadata search complete");
                    hits
                }
                None => Vec::new(),
            }
        } else {
            self.vector_pipeline(question, &intent, category, top_k)
                .await?
        };

        if hits.is_empty() && intent.structural_context.is_none() {
            return Ok(None);
        }

        let (sources_text, query_context) = format::build_sources_and_context(&hits, &intent);

        Ok(Some(RagResult {
            sources_text,
            query_context,
            hits,
            intent,
        }))
    }

    /// Generate alternative phrasings for retrieval coverage. Expansion
    /// failure degrades to the original question alone, never a hard
    /// error.
    async fn expand_query(&self, question: &str) -> Vec<String> {
        let messages = vec![ChatMessage::user(question)];
        let response = match self
            .llm
            .complete(QUERY_EXPANSION_PROMPT, &messages, 200, 0.5)
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "Query expansion failed, using original query only");
                return Vec::new();
            }
        };

        let phrases: Vec<String> = response
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .take(self.cfg.max_expansion_phrases)
            .map(str::to_string)
            .collect();
        tracing::info!(phrases = phrases.len(), "Query expanded");
        phrases
    }

    async fn vector_pipeline(
        &self,
        question: &str,
        intent: &QueryIntent,
        category: Option<&str>,
        top_k: usize,
    ) -> Result<Vec<SearchHit>> {
        let is_exhaustive = matches!(intent.query_type, QueryType::Counting | QueryType::Listing);

        let expanded = self.expand_query(question).await;
        let mut all_phrases = vec![question.to_string()];
        all_phrases.extend(expanded);

        let vectors = self.embedder.embed_batch(&all_phrases).await?;

        // More sub-topic phrasings widen the candidate pool, capped to
        // bound cost
        let effective_top_k = (top_k.max(all_phrases.len() * 2)).min(self.cfg.pool_ceiling);
        if effective_top_k != top_k {
            tracing::info!(
                top_k,
                effective_top_k,
                phrases = all_phrases.len(),
                "Auto-scaled top_k"
            );
        }
        let search_limit = effective_top_k * self.cfg.candidate_multiplier;

        let filter = match category {
            Some(cat) => SearchFilter::category(cat),
            None => SearchFilter::default(),
        };

        let searches = vectors
            .iter()
            .map(|vec| self.store.search(vec, search_limit, &filter));
        let results = futures::future::try_join_all(searches).await?;

        let mut merged: HashMap<String, SearchHit> = HashMap::new();
        for batch in results {
            merge_max_score(&mut merged, batch);
        }
        let mut vector_hits = sorted_by_score(&merged);

        if !is_exhaustive {
            // Supplementary scripture search when the privileged category
            // is under quota in the top results
            let quran_count = vector_hits
                .iter()
                .take(effective_top_k)
                .filter(|h| h.payload.category() == "quran")
                .count();
            let quran_quota = quota(effective_top_k, self.cfg.quran_quota);

            if quran_count < quran_quota && category.is_none() {
                let supp = self
                    .store
                    .search(&vectors[0], search_limit, &SearchFilter::category("quran"))
                    .await?;
                merge_max_score(&mut merged, supp);
                vector_hits = sorted_by_score(&merged);
                tracing::info!(
                    quran_count,
                    quran_quota,
                    pool = vector_hits.len(),
                    "Supplementary Quran search merged"
                );
            }

            vector_hits = self.diversify(vector_hits, effective_top_k);
        } else {
            vector_hits.truncate(top_k);
        }

        if !is_exhaustive && vector_hits.iter().any(|h| h.payload.ruku().is_some()) {
            vector_hits = self.expand_to_passages(vector_hits).await?;
        }

        if is_exhaustive && !intent.keywords.is_empty() {
            let kw_hits = keyword::keyword_search(
                self.store.as_ref(),
                &intent.keywords,
                category,
                intent.max_results,
                self.scroll_batch_size,
            )
            .await?;
            let mut hits =
                merge_keyword_confirmed(&vector_hits, kw_hits, intent.max_results);
            // Canonical order so repeated counts are stable and auditable
            hits.sort_by_key(|h| h.payload.canonical_key());
            tracing::info!(
                vector = vector_hits.len(),
                merged = hits.len(),
                "Hybrid search merged (keyword-confirmed only)"
            );
            Ok(hits)
        } else {
            Ok(vector_hits)
        }
    }

    /// Category-based diversification: fixed per-category quotas selected
    /// from the merged pool, each sub-list sorted by score descending,
    /// concatenated in fixed priority order (Quran → Hadith → Tafsir →
    /// other).
    fn diversify(&self, hits: Vec<SearchHit>, top_k: usize) -> Vec<SearchHit> {
        let by_category = |cat: &str| -> Vec<&SearchHit> {
            hits.iter().filter(|h| h.payload.category() == cat).collect()
        };
        let quran = by_category("quran");
        let hadith = by_category("hadith");
        let tafsir = by_category("tafsir");

        let quran_quota = quota(top_k, self.cfg.quran_quota).min(quran.len());
        let hadith_quota = quota(top_k, self.cfg.hadith_quota).min(hadith.len());
        let tafsir_quota = quota(top_k, self.cfg.tafsir_quota).min(tafsir.len());

        let mut selected: Vec<SearchHit> = Vec::new();
        let mut selected_ids: Vec<&str> = Vec::new();

        for h in quran.iter().take(quran_quota) {
            selected.push((*h).clone());
            selected_ids.push(&h.id);
        }
        for h in hadith.iter().take(hadith_quota) {
            selected.push((*h).clone());
            selected_ids.push(&h.id);
        }
        for h in tafsir.iter().take(tafsir_quota) {
            selected.push((*h).clone());
            selected_ids.push(&h.id);
        }

        // Fill the remainder from the pool in score order
        let mut remaining = top_k.saturating_sub(selected.len());
        for h in &hits {
            if remaining == 0 {
                break;
            }
            if !selected_ids.contains(&h.id.as_str()) {
                selected.push(h.clone());
                selected_ids.push(&h.id);
                remaining -= 1;
            }
        }

        let tier = |cat: &str| -> Vec<SearchHit> {
            let mut sub: Vec<SearchHit> = selected
                .iter()
                .filter(|h| h.payload.category() == cat)
                .cloned()
                .collect();
            sub.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
            sub
        };

        let quran_final = tier("quran");
        let hadith_final = tier("hadith");
        let tafsir_final = tier("tafsir");
        let mut other_final: Vec<SearchHit> = selected
            .iter()
            .filter(|h| !matches!(h.payload.category(), "quran" | "hadith" | "tafsir"))
            .cloned()
            .collect();
        other_final.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));

        tracing::info!(
            quran = quran_final.len(),
            hadith = hadith_final.len(),
            tafsir = tafsir_final.len(),
            other = other_final.len(),
            candidates = hits.len(),
            "Source diversification"
        );

        let mut result = quran_final;
        result.extend(hadith_final);
        result.extend(tafsir_final);
        result.extend(other_final);
        result
    }

    /// Expand ayah hits into full ruku passages: for the top-scoring
    /// rukus fetch every ayah in the ruku, preserving original match
    /// scores on direct hits; filler ayahs keep score 0.0. Non-scripture
    /// hits pass through unchanged.
    async fn expand_to_passages(&self, vector_hits: Vec<SearchHit>) -> Result<Vec<SearchHit>> {
        let mut ruku_best: HashMap<u32, f32> = HashMap::new();
        for hit in &vector_hits {
            if let Some(ruku) = hit.payload.ruku() {
                let entry = ruku_best.entry(ruku).or_insert(f32::NEG_INFINITY);
                if hit.score > *entry {
                    *entry = hit.score;
                }
            }
        }
        if ruku_best.is_empty() {
            return Ok(vector_hits);
        }

        let mut ranked: Vec<(u32, f32)> = ruku_best.into_iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        let top_rukus: Vec<u32> = ranked
            .into_iter()
            .take(self.cfg.passage_group_cap)
            .map(|(r, _)| r)
            .collect();

        let fetches = top_rukus.iter().map(|r| self.store.fetch_ruku(*r));
        let passages = futures::future::try_join_all(fetches).await?;

        let mut expanded: Vec<SearchHit> = Vec::new();
        let mut seen: Vec<String> = Vec::new();
        for passage_hits in passages {
            for mut hit in passage_hits {
                if seen.contains(&hit.id) {
                    continue;
                }
                if let Some(original) = vector_hits.iter().find(|v| v.id == hit.id) {
                    hit.score = original.score;
                }
                seen.push(hit.id.clone());
                expanded.push(hit);
            }
        }
        for hit in vector_hits {
            if !seen.contains(&hit.id) {
                seen.push(hit.id.clone());
                expanded.push(hit);
            }
        }

        tracing::info!(
            ayahs = expanded.len(),
            rukus = top_rukus.len(),
            "Passage expansion"
        );
        Ok(expanded)
    }
}

fn quota(top_k: usize, fraction: f32) -> usize {
    (top_k as f32 * fraction).ceil() as usize
}

/// Keep the maximum score observed per hit id. First writer wins on
/// exact ties.
fn merge_max_score(merged: &mut HashMap<String, SearchHit>, batch: Vec<SearchHit>) {
    for hit in batch {
        let replace = match merged.get(&hit.id) {
            Some(existing) => hit.score > existing.score,
            None => true,
        };
        if replace {
            merged.insert(hit.id.clone(), hit);
        }
    }
}

/// Score-descending order with id tie-break so merges are deterministic
fn sorted_by_score(merged: &HashMap<String, SearchHit>) -> Vec<SearchHit> {
    let mut hits: Vec<SearchHit> = merged.values().cloned().collect();
    hits.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
    hits
}

/// Merge vector and keyword hits, keeping only keyword-confirmed hits.
/// Counting and listing require completeness over ranked recall, so
/// vector-only hits are dropped; confirmed hits keep the higher score.
fn merge_keyword_confirmed(
    vector_hits: &[SearchHit],
    keyword_hits: Vec<SearchHit>,
    max_results: usize,
) -> Vec<SearchHit> {
    let mut seen: HashMap<String, SearchHit> = HashMap::new();
    for hit in keyword_hits {
        seen.insert(hit.id.clone(), hit);
    }
    for hit in vector_hits {
        if let Some(existing) = seen.get_mut(&hit.id) {
            if hit.score > existing.score {
                *existing = hit.clone();
            }
        }
    }

    let mut merged = sorted_by_score(&seen);
    merged.truncate(max_results);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use bayan_common::types::{AyahPayload, ChunkPayload, HadithPayload, TafsirPayload};

    fn ayah(id: &str, score: f32, surah: u32, ayah_num: u32, ruku: Option<u32>) -> SearchHit {
        SearchHit {
            id: id.to_string(),
            score,
            payload: ChunkPayload::Ayah(AyahPayload {
                surah_number: surah,
                ayah_number: ayah_num,
                surah_name_english: "Al-Baqara".to_string(),
                juz: Some(1),
                ruku,
                content_arabic: "نص".to_string(),
                content_english: "text".to_string(),
            }),
        }
    }

    fn hadith(id: &str, score: f32) -> SearchHit {
        SearchHit {
            id: id.to_string(),
            score,
            payload: ChunkPayload::Hadith(HadithPayload {
                book_title: "Sahih Bukhari".to_string(),
                hadith_number: Some("1".to_string()),
                content_arabic: String::new(),
                content_english: "narration".to_string(),
                metadata: None,
            }),
        }
    }

    fn tafsir(id: &str, score: f32) -> SearchHit {
        SearchHit {
            id: id.to_string(),
            score,
            payload: ChunkPayload::Tafsir(TafsirPayload {
                book_title: "Tafsir Ibn Kathir".to_string(),
                surah_number: Some(2),
                ayah_number: Some(255),
                surah_name_english: Some("Al-Baqara".to_string()),
                content_arabic: String::new(),
                content_english: "commentary".to_string(),
            }),
        }
    }

    #[test]
    fn test_merge_keeps_max_score() {
        let mut merged = HashMap::new();
        merge_max_score(&mut merged, vec![ayah("a", 0.5, 2, 1, None)]);
        merge_max_score(&mut merged, vec![ayah("a", 0.9, 2, 1, None)]);
        merge_max_score(&mut merged, vec![ayah("a", 0.7, 2, 1, None)]);
        assert_eq!(merged["a"].score, 0.9);
    }

    #[test]
    fn test_merge_first_writer_wins_on_tie() {
        let mut merged = HashMap::new();
        let mut first = ayah("a", 0.5, 2, 1, None);
        first.payload = ChunkPayload::Ayah(AyahPayload {
            surah_number: 2,
            ayah_number: 1,
            surah_name_english: "first".to_string(),
            juz: None,
            ruku: None,
            content_arabic: String::new(),
            content_english: String::new(),
        });
        merge_max_score(&mut merged, vec![first]);
        merge_max_score(&mut merged, vec![ayah("a", 0.5, 2, 1, None)]);
        if let ChunkPayload::Ayah(p) = &merged["a"].payload {
            assert_eq!(p.surah_name_english, "first");
        } else {
            panic!("expected ayah payload");
        }
    }

    #[test]
    fn test_keyword_confirmed_drops_vector_only() {
        let vector = vec![ayah("v1", 0.9, 2, 1, None), ayah("k1", 0.8, 2, 2, None)];
        let keyword = vec![ayah("k1", 1.0, 2, 2, None), ayah("k2", 1.0, 2, 3, None)];
        let merged = merge_keyword_confirmed(&vector, keyword, 100);
        let ids: Vec<&str> = merged.iter().map(|h| h.id.as_str()).collect();
        assert!(ids.contains(&"k1"));
        assert!(ids.contains(&"k2"));
        assert!(!ids.contains(&"v1"));
    }

    #[test]
    fn test_keyword_confirmed_keeps_higher_score() {
        // Keyword score is fixed 1.0, higher than the vector score
        let vector = vec![ayah("k1", 0.6, 2, 1, None)];
        let keyword = vec![ayah("k1", 1.0, 2, 1, None)];
        let merged = merge_keyword_confirmed(&vector, keyword, 100);
        assert_eq!(merged[0].score, 1.0);
    }

    fn test_retriever(hits: Vec<SearchHit>) -> Retriever {
        use bayan_common::clients::{InMemoryVectorStore, MockEmbedder, MockLlm};
        Retriever::new(
            Arc::new(InMemoryVectorStore::new(hits)),
            Arc::new(MockEmbedder::new(8)),
            Arc::new(MockLlm::with_response("alternative phrasing")),
            RetrievalConfig::default(),
            &VectorStoreConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_diversification_order() {
        let retriever = test_retriever(Vec::new());
        let hits = vec![
            hadith("h1", 0.95),
            hadith("h2", 0.94),
            tafsir("t1", 0.93),
            ayah("a1", 0.5, 2, 1, None),
            ayah("a2", 0.4, 2, 2, None),
        ];
        let result = retriever.diversify(hits, 5);
        // Quran first despite lower scores, then hadith, then tafsir
        assert_eq!(result[0].id, "a1");
        assert_eq!(result[1].id, "a2");
        assert_eq!(result[2].id, "h1");
        assert_eq!(result.last().unwrap().id, "t1");
    }

    #[tokio::test]
    async fn test_passage_expansion_preserves_direct_scores() {
        use bayan_common::clients::{InMemoryVectorStore, MockEmbedder, MockLlm};
        let store_hits = vec![
            ayah("r1a", 0.0, 2, 1, Some(1)),
            ayah("r1b", 0.0, 2, 2, Some(1)),
            ayah("r1c", 0.0, 2, 3, Some(1)),
        ];
        let retriever = Retriever::new(
            Arc::new(InMemoryVectorStore::new(store_hits)),
            Arc::new(MockEmbedder::new(8)),
            Arc::new(MockLlm::new()),
            RetrievalConfig::default(),
            &VectorStoreConfig::default(),
        );

        let direct = vec![ayah("r1b", 0.87, 2, 2, Some(1))];
        let expanded = retriever.expand_to_passages(direct).await.unwrap();

        assert_eq!(expanded.len(), 3);
        let direct_hit = expanded.iter().find(|h| h.id == "r1b").unwrap();
        assert_eq!(direct_hit.score, 0.87);
        let filler = expanded.iter().find(|h| h.id == "r1a").unwrap();
        assert_eq!(filler.score, 0.0);
    }

    #[tokio::test]
    async fn test_structural_fact_skips_search() {
        use bayan_common::clients::{InMemoryVectorStore, MockEmbedder, MockLlm};
        let store = Arc::new(InMemoryVectorStore::new(Vec::new()));
        let retriever = Retriever::new(
            store.clone(),
            Arc::new(MockEmbedder::new(8)),
            Arc::new(MockLlm::new()),
            RetrievalConfig::default(),
            &VectorStoreConfig::default(),
        );

        let result = retriever
            .retrieve_and_format("How many surahs are in the Quran?", None, 10)
            .await
            .unwrap()
            .unwrap();

        assert!(result.intent.structural_context.is_some());
        assert!(result.hits.is_empty());
        assert_eq!(store.search_call_count(), 0);
    }

    #[tokio::test]
    async fn test_metadata_exact_ayah() {
        let hits = vec![
            ayah("a", 0.0, 2, 255, Some(40)),
            ayah("b", 0.0, 2, 254, Some(40)),
        ];
        let retriever = test_retriever(hits);
        let result = retriever
            .retrieve_and_format("What does 2:255 say?", None, 10)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(result.hits.len(), 1);
        assert_eq!(result.hits[0].payload.canonical_key(), (2, 255));
    }

    #[tokio::test]
    async fn test_no_results_returns_none() {
        let retriever = test_retriever(Vec::new());
        let result = retriever
            .retrieve_and_format("What about honesty in trade?", None, 10)
            .await
            .unwrap();
        assert!(result.is_none());
    }
}
