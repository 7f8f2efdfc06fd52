//! End-to-end pipeline tests over the in-memory service clients

use std::sync::Arc;

use bayan_common::clients::{
    Embedder, InMemoryVectorStore, LlmClient, MockEmbedder, MockLlm, VectorStore,
};
use bayan_common::config::{RetrievalConfig, VectorStoreConfig};
use bayan_common::types::{AyahPayload, ChunkPayload, HadithPayload, SearchHit};
use bayan_retrieval::citations::build_citations;
use bayan_retrieval::format::build_sources_and_context;
use bayan_retrieval::{QueryType, RagEngine, Retriever};

fn ayah(id: &str, surah: u32, ayah_num: u32, ruku: Option<u32>, english: &str, score: f32) -> SearchHit {
    SearchHit {
        id: id.to_string(),
        score,
        payload: ChunkPayload::Ayah(AyahPayload {
            surah_number: surah,
            ayah_number: ayah_num,
            surah_name_english: "Al-Baqara".to_string(),
            juz: Some(1),
            ruku,
            content_arabic: "نص عربي".to_string(),
            content_english: english.to_string(),
        }),
    }
}

fn hadith(id: &str, number: &str, english: &str, score: f32) -> SearchHit {
    SearchHit {
        id: id.to_string(),
        score,
        payload: ChunkPayload::Hadith(HadithPayload {
            book_title: "Sahih Bukhari".to_string(),
            hadith_number: Some(number.to_string()),
            content_arabic: String::new(),
            content_english: english.to_string(),
            metadata: None,
        }),
    }
}

fn retriever(store: Arc<dyn VectorStore>, llm: Arc<dyn LlmClient>) -> Retriever {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    let embedder: Arc<dyn Embedder> = Arc::new(MockEmbedder::new(8));
    Retriever::new(
        store,
        embedder,
        llm,
        RetrievalConfig::default(),
        &VectorStoreConfig::default(),
    )
}

#[tokio::test]
async fn counting_citations_match_confirmed_hits_and_are_stable() {
    // Four ayahs mention Musa, two do not; only keyword-confirmed hits
    // may back a counting answer.
    let mut hits = vec![
        ayah("a1", 2, 50, None, "We saved Musa and his people", 0.9),
        ayah("a2", 7, 103, None, "Then We sent Musa with Our signs", 0.8),
        ayah("a3", 20, 9, None, "Has the story of Musa reached you", 0.7),
        ayah("a4", 28, 7, None, "We inspired the mother of Musa", 0.6),
    ];
    hits.push(ayah("b1", 3, 14, None, "Beautified for people is love", 0.85));
    hits.push(ayah("b2", 4, 1, None, "O mankind, fear your Lord", 0.75));

    let store: Arc<dyn VectorStore> = Arc::new(InMemoryVectorStore::new(hits));
    let llm: Arc<dyn LlmClient> = Arc::new(MockLlm::with_response("musa in egypt\nmoses pharaoh"));
    let r = retriever(store, llm);

    let first = r
        .retrieve_and_format("How many times is Musa mentioned in the Quran?", None, 10)
        .await
        .unwrap()
        .expect("results");
    assert_eq!(first.intent.query_type, QueryType::Counting);
    assert_eq!(first.hits.len(), 4);
    // Canonical corpus order, not score order
    let keys: Vec<_> = first.hits.iter().map(|h| h.payload.canonical_key()).collect();
    assert_eq!(keys, vec![(2, 50), (7, 103), (20, 9), (28, 7)]);

    let citations = build_citations(&first.hits, &first.intent);
    assert_eq!(citations.len(), 4);

    // Re-running yields identical hits and citations
    let second = r
        .retrieve_and_format("How many times is Musa mentioned in the Quran?", None, 10)
        .await
        .unwrap()
        .expect("results");
    let ids_first: Vec<_> = first.hits.iter().map(|h| h.id.clone()).collect();
    let ids_second: Vec<_> = second.hits.iter().map(|h| h.id.clone()).collect();
    assert_eq!(ids_first, ids_second);
}

#[tokio::test]
async fn ayah_reference_returns_exactly_one_hit() {
    let store: Arc<dyn VectorStore> = Arc::new(InMemoryVectorStore::new(vec![
        ayah("a", 2, 254, None, "spend from what We provided", 0.0),
        ayah("b", 2, 255, None, "Allah, there is no deity except Him", 0.0),
        ayah("c", 2, 256, None, "no compulsion in religion", 0.0),
    ]));
    let llm: Arc<dyn LlmClient> = Arc::new(MockLlm::new());
    let r = retriever(store, llm);

    let result = r
        .retrieve_and_format("What does 2:255 say?", None, 10)
        .await
        .unwrap()
        .expect("results");
    assert_eq!(result.intent.query_type, QueryType::Metadata);
    assert_eq!(result.hits.len(), 1);
    assert_eq!(result.hits[0].payload.canonical_key(), (2, 255));
}

#[tokio::test]
async fn numbered_blocks_and_citations_stay_aligned() {
    // A ruku run, a hadith, and a lone ayah: grouping must produce the
    // same block count on both the prompt side and the citation side.
    let hits = vec![
        ayah("a1", 2, 1, Some(1), "Alif Lam Meem", 0.9),
        ayah("a2", 2, 2, Some(1), "This is the Book", 0.8),
        hadith("h1", "1", "Actions are by intentions", 0.7),
        ayah("a3", 2, 255, Some(35), "Allah, there is no deity except Him", 0.6),
    ];
    let intent = bayan_retrieval::QueryClassifier::new(&RetrievalConfig::default())
        .classify("What does the Quran say about faith?");
    assert_eq!(intent.query_type, QueryType::Semantic);

    let (sources_text, _) = build_sources_and_context(&hits, &intent);
    let citations = build_citations(&hits, &intent);

    let block_count = sources_text.matches("[Source ").count();
    assert_eq!(block_count, citations.len());
    for i in 0..citations.len() {
        assert!(sources_text.contains(&format!("[Source {}]", i + 1)));
    }
}

#[tokio::test]
async fn structural_fact_skips_search_entirely() {
    let store = Arc::new(InMemoryVectorStore::new(vec![ayah(
        "a", 1, 1, None, "In the name of Allah", 0.9,
    )]));
    let llm: Arc<dyn LlmClient> = Arc::new(MockLlm::new());
    let r = retriever(store.clone() as Arc<dyn VectorStore>, llm);

    let result = r
        .retrieve_and_format("How many surahs are in the Quran?", None, 10)
        .await
        .unwrap()
        .expect("structural fact result");
    assert!(result.hits.is_empty());
    assert!(result.sources_text.contains("114"));
    assert_eq!(store.search_call_count(), 0);
}

#[tokio::test]
async fn engine_degrades_gracefully_when_store_is_down() {
    let store: Arc<dyn VectorStore> = Arc::new(InMemoryVectorStore::failing());
    let llm = Arc::new(MockLlm::with_response("should never appear"));
    let r = Arc::new(retriever(store, llm.clone() as Arc<dyn LlmClient>));
    let engine = RagEngine::new(r, llm, RetrievalConfig::default());

    let response = engine.ask("What is patience in Islam?", &[], None).await;
    assert!(response.answer.contains("temporarily unavailable"));
    assert!(response.citations.is_empty());
}

#[tokio::test]
async fn engine_answers_with_aligned_citations() {
    let store: Arc<dyn VectorStore> = Arc::new(InMemoryVectorStore::new(vec![
        ayah("a1", 2, 153, None, "seek help through patience and prayer", 0.9),
        hadith("h1", "52", "patience is illumination", 0.8),
    ]));
    let llm = Arc::new(MockLlm::with_response(
        "Patience is commanded in 2:153 [1] and praised in hadith [2].",
    ));
    let r = Arc::new(retriever(store, llm.clone() as Arc<dyn LlmClient>));
    let engine = RagEngine::new(r, llm, RetrievalConfig::default());

    let response = engine.ask("What do the sources say about patience?", &[], None).await;
    assert_eq!(response.citations.len(), 2);
    assert_eq!(response.citations[0].source, "Quran 2:153 (Surah Al-Baqara)");
    assert_eq!(response.citations[1].source, "Sahih Bukhari, Hadith 52");
}
