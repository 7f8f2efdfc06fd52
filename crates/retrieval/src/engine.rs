//! Conversational answering engine
//!
//! Orchestrates the full question → answer flow on top of the
//! retriever: history trimming, follow-up rewriting, tiered prompt
//! assembly, chunked synthesis for oversized source sets, citation
//! finalization, and session title generation. Two entry points:
//! [`RagEngine::ask`] for a complete response and
//! [`RagEngine::ask_stream`] for token-by-token streaming events.
//!
//! The engine never fails outward: upstream errors degrade into a
//! labeled service-unavailable answer with zero citations.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

use bayan_common::clients::LlmClient;
use bayan_common::config::RetrievalConfig;
use bayan_common::types::{ChatMessage, Citation};

use crate::budget::{available_source_tokens, trim_history};
use crate::citations::{build_citations, finalize_citations};
use crate::format::{build_sources_tiered, split_sources_into_chunks, SourceTier};
use crate::prompts::{ANSWER_SYSTEM_PROMPT, QUERY_REWRITE_PROMPT, SESSION_TITLE_PROMPT};
use crate::retrieval::{RagResult, Retriever};

const ANSWER_MAX_TOKENS: u32 = 2_000;
const ANSWER_TEMPERATURE: f32 = 0.3;
const CHUNK_ANALYSIS_MAX_TOKENS: u32 = 4_000;
const SYNTHESIS_MAX_TOKENS: u32 = 8_000;
const REWRITE_MAX_TOKENS: u32 = 200;
const REWRITE_TEMPERATURE: f32 = 0.1;
const TITLE_MAX_TOKENS: u32 = 30;
const TITLE_TEMPERATURE: f32 = 0.5;

/// Rewriter only sees the last 3 exchanges, each message truncated
const REWRITE_HISTORY_TURNS: usize = 6;
const REWRITE_MESSAGE_CHARS: usize = 300;

const UNAVAILABLE_ANSWER: &str =
    "I'm sorry, the AI service is temporarily unavailable. Please try again in a moment.";

/// No-results is distinct from service failure and never fabricated by
/// a sourceless LLM call
const NO_RESULTS_ANSWER: &str =
    "I could not find any relevant sources for this question in the available \
     Quran, Hadith, and Tafsir collections. Please try rephrasing the question \
     or asking about a different topic.";

/// Complete response from [`RagEngine::ask`]
#[derive(Debug, Clone, Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub citations: Vec<Citation>,
}

/// Events emitted by [`RagEngine::ask_stream`], in order: user_message,
/// content_delta (repeated), citations, title (first turn only), done.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StreamEvent {
    UserMessage { content: String },
    ContentDelta { token: String },
    Citations { citations: Vec<Citation> },
    Title { title: String },
    Done,
    Error { detail: String },
}

#[derive(Clone)]
pub struct RagEngine {
    retriever: Arc<Retriever>,
    llm: Arc<dyn LlmClient>,
    cfg: RetrievalConfig,
}

impl RagEngine {
    pub fn new(retriever: Arc<Retriever>, llm: Arc<dyn LlmClient>, cfg: RetrievalConfig) -> Self {
        Self {
            retriever,
            llm,
            cfg,
        }
    }

    /// Answer a question with retrieval grounding and citations.
    ///
    /// `history` is the prior conversation, oldest first, not including
    /// the current question. Never returns an error; failures degrade to
    /// [`UNAVAILABLE_ANSWER`] with no citations.
    pub async fn ask(
        &self,
        question: &str,
        history: &[ChatMessage],
        category: Option<&str>,
    ) -> AskResponse {
        let history = trim_history(history, &self.cfg);

        let search_query = if history.is_empty() {
            question.to_string()
        } else {
            let rewritten = self.rewrite_query(question, &history).await;
            tracing::info!(original = question, rewritten = %rewritten, "Query rewritten");
            rewritten
        };

        let rag_result = match self
            .retriever
            .retrieve_and_format(&search_query, category, self.cfg.semantic_top_k)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "Retrieval failed");
                return AskResponse {
                    answer: UNAVAILABLE_ANSWER.to_string(),
                    citations: Vec::new(),
                };
            }
        };

        let Some(rag) = &rag_result else {
            tracing::info!("No relevant sources found");
            return AskResponse {
                answer: NO_RESULTS_ANSWER.to_string(),
                citations: Vec::new(),
            };
        };

        let (answer, llm_failed) = self.answer_with_sources(question, &history, rag).await;

        // No [N] markers exist in the degraded answer
        let citations = if llm_failed {
            Vec::new()
        } else {
            let citations = build_citations(&rag.hits, &rag.intent);
            finalize_citations(
                self.llm.as_ref(),
                &answer,
                citations,
                true,
                self.cfg.translation_max_batch,
                self.cfg.translation_max_chars,
            )
            .await
        };

        AskResponse { answer, citations }
    }

    /// Answer a question as a stream of events.
    ///
    /// The returned stream is driven by a background task; dropping the
    /// stream stops the work, including any in-flight title generation.
    pub fn ask_stream(
        &self,
        question: String,
        history: Vec<ChatMessage>,
        category: Option<String>,
        generate_title: bool,
    ) -> ReceiverStream<StreamEvent> {
        let (tx, rx) = mpsc::channel(32);
        let engine = self.clone();
        tokio::spawn(async move {
            engine
                .run_stream(tx, question, history, category, generate_title)
                .await;
        });
        ReceiverStream::new(rx)
    }

    async fn run_stream(
        &self,
        tx: mpsc::Sender<StreamEvent>,
        question: String,
        history: Vec<ChatMessage>,
        category: Option<String>,
        generate_title: bool,
    ) {
        if tx
            .send(StreamEvent::UserMessage {
                content: question.clone(),
            })
            .await
            .is_err()
        {
            return;
        }

        let history = trim_history(&history, &self.cfg);

        let search_query = if history.is_empty() {
            question.clone()
        } else {
            let rewritten = self.rewrite_query(&question, &history).await;
            tracing::info!(original = %question, rewritten = %rewritten, "Query rewritten");
            rewritten
        };

        // Title generation runs concurrently with the answer
        let title_task = if generate_title {
            let llm = Arc::clone(&self.llm);
            let q = question.clone();
            Some(tokio::spawn(async move {
                generate_session_title(llm.as_ref(), &q).await
            }))
        } else {
            None
        };

        let abort_title = |task: &Option<tokio::task::JoinHandle<String>>| {
            if let Some(task) = task {
                task.abort();
            }
        };

        let rag_result = match self
            .retriever
            .retrieve_and_format(&search_query, category.as_deref(), self.cfg.semantic_top_k)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "Retrieval failed during stream");
                abort_title(&title_task);
                let _ = tx
                    .send(StreamEvent::ContentDelta {
                        token: UNAVAILABLE_ANSWER.to_string(),
                    })
                    .await;
                let _ = tx.send(StreamEvent::Done).await;
                return;
            }
        };

        let Some(rag) = &rag_result else {
            tracing::info!("No relevant sources found");
            if tx
                .send(StreamEvent::ContentDelta {
                    token: NO_RESULTS_ANSWER.to_string(),
                })
                .await
                .is_err()
            {
                abort_title(&title_task);
                return;
            }
            self.finish_stream(&tx, title_task, &question).await;
            return;
        };

        // Stream the answer, accumulating the full text for citation
        // matching
        let mut full_answer = String::new();
        let mut llm_failed = false;

        let stream_result = self.stream_with_sources(&question, &history, rag).await;

        match stream_result {
            Ok(mut token_stream) => {
                while let Some(item) = token_stream.next().await {
                    match item {
                        Ok(token) => {
                            full_answer.push_str(&token);
                            if tx.send(StreamEvent::ContentDelta { token }).await.is_err() {
                                tracing::info!("Client disconnected during streaming");
                                abort_title(&title_task);
                                return;
                            }
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "LLM streaming failed mid-answer");
                            llm_failed = true;
                            full_answer = UNAVAILABLE_ANSWER.to_string();
                            let _ = tx
                                .send(StreamEvent::ContentDelta {
                                    token: full_answer.clone(),
                                })
                                .await;
                            break;
                        }
                    }
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "LLM streaming failed");
                llm_failed = true;
                full_answer = UNAVAILABLE_ANSWER.to_string();
                let _ = tx
                    .send(StreamEvent::ContentDelta {
                        token: full_answer.clone(),
                    })
                    .await;
            }
        }

        if !llm_failed {
            let citations = build_citations(&rag.hits, &rag.intent);
            let citations = finalize_citations(
                self.llm.as_ref(),
                &full_answer,
                citations,
                true,
                self.cfg.translation_max_batch,
                self.cfg.translation_max_chars,
            )
            .await;
            if !citations.is_empty() && tx.send(StreamEvent::Citations { citations }).await.is_err()
            {
                abort_title(&title_task);
                return;
            }
        }

        self.finish_stream(&tx, title_task, &question).await;
    }

    /// Await the concurrent title task (if any) and close the stream
    async fn finish_stream(
        &self,
        tx: &mpsc::Sender<StreamEvent>,
        title_task: Option<tokio::task::JoinHandle<String>>,
        question: &str,
    ) {
        if let Some(task) = title_task {
            let title = match task.await {
                Ok(title) => title,
                Err(_) => {
                    tracing::warn!("Title generation failed during stream");
                    truncate_chars(question, 60)
                }
            };
            if tx.send(StreamEvent::Title { title }).await.is_err() {
                return;
            }
        }

        let _ = tx.send(StreamEvent::Done).await;
    }

    /// Generate a short session title from the first question
    pub async fn generate_title(&self, question: &str) -> String {
        generate_session_title(self.llm.as_ref(), question).await
    }

    async fn answer_with_sources(
        &self,
        question: &str,
        history: &[ChatMessage],
        rag: &RagResult,
    ) -> (String, bool) {
        let budget = available_source_tokens(
            ANSWER_SYSTEM_PROMPT,
            history,
            question,
            &rag.query_context,
            &self.cfg,
        );
        let (sources_text, query_context, tier) =
            build_sources_tiered(&rag.hits, &rag.intent, budget, &self.cfg);

        let result = match tier {
            SourceTier::Full | SourceTier::EnglishOnly => {
                let mut messages = history.to_vec();
                messages.push(ChatMessage::user(current_turn_content(
                    &sources_text,
                    question,
                    &query_context,
                )));
                self.llm
                    .complete(
                        ANSWER_SYSTEM_PROMPT,
                        &messages,
                        ANSWER_MAX_TOKENS,
                        ANSWER_TEMPERATURE,
                    )
                    .await
            }
            SourceTier::Chunked => {
                let chunks = split_sources_into_chunks(&sources_text, budget, &self.cfg);
                self.chunked_synthesis(question, history, &query_context, &chunks)
                    .await
            }
        };

        match result {
            Ok(answer) => (answer, false),
            Err(e) => {
                tracing::error!(error = %e, tier = ?tier, "LLM call failed");
                (UNAVAILABLE_ANSWER.to_string(), true)
            }
        }
    }

    /// Build the streaming token source, running chunk analysis first
    /// when the sources exceed even the English-only tier.
    async fn stream_with_sources(
        &self,
        question: &str,
        history: &[ChatMessage],
        rag: &RagResult,
    ) -> bayan_common::errors::Result<bayan_common::clients::TokenStream> {
        let budget = available_source_tokens(
            ANSWER_SYSTEM_PROMPT,
            history,
            question,
            &rag.query_context,
            &self.cfg,
        );
        let (sources_text, query_context, tier) =
            build_sources_tiered(&rag.hits, &rag.intent, budget, &self.cfg);

        match tier {
            SourceTier::Full | SourceTier::EnglishOnly => {
                let mut messages = history.to_vec();
                messages.push(ChatMessage::user(current_turn_content(
                    &sources_text,
                    question,
                    &query_context,
                )));
                self.llm
                    .complete_stream(
                        ANSWER_SYSTEM_PROMPT,
                        &messages,
                        ANSWER_MAX_TOKENS,
                        ANSWER_TEMPERATURE,
                    )
                    .await
            }
            SourceTier::Chunked => {
                let chunks = split_sources_into_chunks(&sources_text, budget, &self.cfg);
                let partials = self
                    .analyze_chunks(question, history, &query_context, &chunks)
                    .await?;
                let mut messages = history.to_vec();
                messages.push(ChatMessage::user(synthesis_content(question, &partials)));
                self.llm
                    .complete_stream(
                        ANSWER_SYSTEM_PROMPT,
                        &messages,
                        SYNTHESIS_MAX_TOKENS,
                        ANSWER_TEMPERATURE,
                    )
                    .await
            }
        }
    }

    /// Oversized-source path: parallel per-chunk analysis followed by a
    /// synthesis call that merges the partial answers.
    async fn chunked_synthesis(
        &self,
        question: &str,
        history: &[ChatMessage],
        query_context: &str,
        chunks: &[String],
    ) -> bayan_common::errors::Result<String> {
        let partials = self
            .analyze_chunks(question, history, query_context, chunks)
            .await?;
        let mut messages = history.to_vec();
        messages.push(ChatMessage::user(synthesis_content(question, &partials)));
        self.llm
            .complete(
                ANSWER_SYSTEM_PROMPT,
                &messages,
                SYNTHESIS_MAX_TOKENS,
                ANSWER_TEMPERATURE,
            )
            .await
    }

    async fn analyze_chunks(
        &self,
        question: &str,
        history: &[ChatMessage],
        query_context: &str,
        chunks: &[String],
    ) -> bayan_common::errors::Result<Vec<String>> {
        tracing::info!(chunks = chunks.len(), "Chunked synthesis started");
        let analyses = chunks.iter().enumerate().map(|(i, chunk)| {
            let mut messages = history.to_vec();
            messages.push(ChatMessage::user(chunk_analysis_content(
                chunk,
                i + 1,
                chunks.len(),
                question,
                query_context,
            )));
            async move {
                self.llm
                    .complete(
                        ANSWER_SYSTEM_PROMPT,
                        &messages,
                        CHUNK_ANALYSIS_MAX_TOKENS,
                        ANSWER_TEMPERATURE,
                    )
                    .await
            }
        });
        futures::future::try_join_all(analyses).await
    }

    /// Rewrite a follow-up into a standalone question so retrieval sees
    /// all the entities the follow-up refers to. Falls back to the
    /// original message on any failure.
    async fn rewrite_query(&self, follow_up: &str, history: &[ChatMessage]) -> String {
        let recent = &history[history.len().saturating_sub(REWRITE_HISTORY_TURNS)..];
        let conv_text: Vec<String> = recent
            .iter()
            .map(|m| {
                let label = match m.role {
                    bayan_common::types::Role::User => "User",
                    bayan_common::types::Role::Assistant => "Assistant",
                };
                format!("{label}: {}", truncate_chars_plain(&m.content, REWRITE_MESSAGE_CHARS))
            })
            .collect();

        let user_message = format!(
            "Conversation so far:\n{}\n\nFollow-up message: {follow_up}\n\nRewritten standalone question:",
            conv_text.join("\n")
        );

        match self
            .llm
            .complete(
                QUERY_REWRITE_PROMPT,
                &[ChatMessage::user(user_message)],
                REWRITE_MAX_TOKENS,
                REWRITE_TEMPERATURE,
            )
            .await
        {
            Ok(rewritten) => {
                let rewritten = strip_quotes(&rewritten);
                if rewritten.is_empty() {
                    follow_up.to_string()
                } else {
                    rewritten
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Query rewrite failed, using original message");
                follow_up.to_string()
            }
        }
    }
}

fn current_turn_content(sources_text: &str, question: &str, query_context: &str) -> String {
    format!("## Source Texts\n{sources_text}\n\n## User Question\n{question}\n\n{query_context}")
}

fn chunk_analysis_content(
    chunk_text: &str,
    chunk_num: usize,
    chunk_total: usize,
    question: &str,
    query_context: &str,
) -> String {
    format!(
        "## Source Texts (Part {chunk_num}/{chunk_total})\n{chunk_text}\n\n\
         ## User Question\n{question}\n\n{query_context}\n\n\
         Provide a thorough partial answer based ONLY on the sources above. \
         CRITICAL: Every claim MUST be cited by its source number in square \
         brackets, like [1], [42], [103]. The numbers correspond to the \
         [Source N] blocks above. NEVER cite by source title or book name — \
         ONLY use bracketed numbers. \
         This is part of a multi-part analysis — cover what these sources contain."
    )
}

fn synthesis_content(question: &str, partial_answers: &[String]) -> String {
    let parts_text: Vec<String> = partial_answers
        .iter()
        .enumerate()
        .map(|(i, answer)| format!("## Partial Answer {}\n{answer}", i + 1))
        .collect();
    format!(
        "The user asked: {question}\n\n\
         The following partial answers were generated from different sets of sources. \
         Synthesize them into a single, coherent, well-structured response. \
         Preserve all bracketed citation numbers exactly as they appear \
         (e.g. [1], [42], [103]). Do NOT replace them with source titles \
         or book names, and do NOT add the word 'Source' before the number. \
         Remove redundancy and organize by theme.\n\n{}",
        parts_text.join("\n\n---\n\n")
    )
}

async fn generate_session_title(llm: &dyn LlmClient, question: &str) -> String {
    match llm
        .complete(
            SESSION_TITLE_PROMPT,
            &[ChatMessage::user(question)],
            TITLE_MAX_TOKENS,
            TITLE_TEMPERATURE,
        )
        .await
    {
        Ok(title) => {
            let title = strip_quotes(&title);
            let title = title.trim_end_matches('.').to_string();
            if title.chars().count() > 100 {
                let prefix: String = title.chars().take(97).collect();
                format!("{prefix}...")
            } else {
                title
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to generate session title, using fallback");
            truncate_chars(question, 60)
        }
    }
}

fn strip_quotes(text: &str) -> String {
    text.trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .to_string()
}

/// Truncate to `max` chars, appending "..." when anything was cut
fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let prefix: String = text.chars().take(max).collect();
        format!("{prefix}...")
    } else {
        text.to_string()
    }
}

/// Truncate to `max` chars with no ellipsis
fn truncate_chars_plain(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bayan_common::clients::{Embedder, InMemoryVectorStore, MockEmbedder, MockLlm, VectorStore};
    use bayan_common::config::VectorStoreConfig;
    use bayan_common::types::{AyahPayload, ChunkPayload, SearchHit};

    fn ayah_hit(id: &str, surah: u32, ayah: u32, score: f32) -> SearchHit {
        SearchHit {
            id: id.to_string(),
            score,
            payload: ChunkPayload::Ayah(AyahPayload {
                surah_number: surah,
                ayah_number: ayah,
                surah_name_english: "Al-Baqara".to_string(),
                juz: Some(1),
                ruku: None,
                content_arabic: "نص".to_string(),
                content_english: "the verse text".to_string(),
            }),
        }
    }

    fn engine_with(store: Arc<dyn VectorStore>, llm: Arc<MockLlm>) -> RagEngine {
        let cfg = RetrievalConfig::default();
        let embedder: Arc<dyn Embedder> = Arc::new(MockEmbedder::new(8));
        let retriever = Arc::new(Retriever::new(
            store,
            embedder,
            llm.clone() as Arc<dyn LlmClient>,
            cfg.clone(),
            &VectorStoreConfig::default(),
        ));
        RagEngine::new(retriever, llm, cfg)
    }

    #[tokio::test]
    async fn test_ask_answers_with_citations() {
        let store: Arc<dyn VectorStore> =
            Arc::new(InMemoryVectorStore::new(vec![ayah_hit("a", 2, 255, 0.9)]));
        let llm = Arc::new(MockLlm::with_response(
            "Ayat al-Kursi is 2:255 [1], the greatest verse.",
        ));
        let engine = engine_with(store, llm);

        let response = engine.ask("Tell me about Ayat al-Kursi", &[], None).await;
        assert!(response.answer.contains("2:255"));
        assert_eq!(response.citations.len(), 1);
        assert_eq!(response.citations[0].source, "Quran 2:255 (Surah Al-Baqara)");
    }

    #[tokio::test]
    async fn test_ask_degrades_on_store_failure() {
        let store: Arc<dyn VectorStore> = Arc::new(InMemoryVectorStore::failing());
        let llm = Arc::new(MockLlm::with_response("should not be used"));
        let engine = engine_with(store, llm);

        let response = engine.ask("What is patience?", &[], None).await;
        assert_eq!(response.answer, UNAVAILABLE_ANSWER);
        assert!(response.citations.is_empty());
    }

    #[tokio::test]
    async fn test_ask_no_results_is_explicit() {
        let store: Arc<dyn VectorStore> = Arc::new(InMemoryVectorStore::new(Vec::new()));
        let llm = Arc::new(MockLlm::with_response("should not be used"));
        let engine = engine_with(store, llm.clone());

        let response = engine.ask("What about something obscure?", &[], None).await;
        assert_eq!(response.answer, NO_RESULTS_ANSWER);
        // Distinct from the service-failure answer
        assert_ne!(response.answer, UNAVAILABLE_ANSWER);
        assert!(response.citations.is_empty());
        // No answering call was made; only query expansion ran
        let calls = llm.calls();
        assert!(calls.iter().all(|c| !c.contains("## Source Texts")));
    }

    #[tokio::test]
    async fn test_ask_llm_failure_skips_citations() {
        let store: Arc<dyn VectorStore> =
            Arc::new(InMemoryVectorStore::new(vec![ayah_hit("a", 2, 255, 0.9)]));
        let llm = Arc::new(MockLlm::failing());
        let engine = engine_with(store, llm);

        let response = engine.ask("Tell me about Ayat al-Kursi", &[], None).await;
        assert_eq!(response.answer, UNAVAILABLE_ANSWER);
        assert!(response.citations.is_empty());
    }

    #[tokio::test]
    async fn test_rewrite_used_only_with_history() {
        let store: Arc<dyn VectorStore> = Arc::new(InMemoryVectorStore::new(Vec::new()));
        let llm = Arc::new(MockLlm::with_response("answer"));
        let engine = engine_with(store, llm.clone());

        engine.ask("standalone question", &[], None).await;
        let calls = llm.calls();
        assert!(calls.iter().all(|c| !c.contains("Follow-up message:")));

        let history = vec![
            ChatMessage::user("Who was Musa?"),
            ChatMessage::assistant("Musa was a prophet."),
        ];
        engine.ask("What about his brother?", &history, None).await;
        let calls = llm.calls();
        assert!(calls.iter().any(|c| c.contains("Follow-up message: What about his brother?")));
    }

    #[tokio::test]
    async fn test_stream_event_order() {
        let store: Arc<dyn VectorStore> =
            Arc::new(InMemoryVectorStore::new(vec![ayah_hit("a", 2, 255, 0.9)]));
        let llm = Arc::new(MockLlm::with_response("Ayat al-Kursi is 2:255 [1]."));
        let engine = engine_with(store, llm);

        let mut stream =
            engine.ask_stream("Tell me about Ayat al-Kursi".to_string(), Vec::new(), None, true);

        let mut events = Vec::new();
        while let Some(event) = stream.next().await {
            events.push(event);
        }

        assert!(matches!(events.first(), Some(StreamEvent::UserMessage { .. })));
        assert!(matches!(events.last(), Some(StreamEvent::Done)));
        assert!(events.iter().any(|e| matches!(e, StreamEvent::ContentDelta { .. })));

        let citations_pos = events
            .iter()
            .position(|e| matches!(e, StreamEvent::Citations { .. }))
            .expect("citations event");
        let title_pos = events
            .iter()
            .position(|e| matches!(e, StreamEvent::Title { .. }))
            .expect("title event");
        let last_delta = events
            .iter()
            .rposition(|e| matches!(e, StreamEvent::ContentDelta { .. }))
            .unwrap();
        assert!(last_delta < citations_pos);
        assert!(citations_pos < title_pos);
    }

    #[tokio::test]
    async fn test_stream_degrades_on_llm_failure() {
        let store: Arc<dyn VectorStore> =
            Arc::new(InMemoryVectorStore::new(vec![ayah_hit("a", 2, 255, 0.9)]));
        let llm = Arc::new(MockLlm::failing());
        let engine = engine_with(store, llm);

        let mut stream = engine.ask_stream("question".to_string(), Vec::new(), None, false);
        let mut tokens = String::new();
        let mut saw_citations = false;
        while let Some(event) = stream.next().await {
            match event {
                StreamEvent::ContentDelta { token } => tokens.push_str(&token),
                StreamEvent::Citations { .. } => saw_citations = true,
                _ => {}
            }
        }
        assert_eq!(tokens, UNAVAILABLE_ANSWER);
        assert!(!saw_citations);
    }

    #[tokio::test]
    async fn test_title_fallback_on_llm_failure() {
        let llm = MockLlm::failing();
        let long_question = "x".repeat(80);
        let title = generate_session_title(&llm, &long_question).await;
        assert_eq!(title.chars().count(), 63);
        assert!(title.ends_with("..."));
    }

    #[tokio::test]
    async fn test_title_strips_quotes_and_period() {
        let llm = MockLlm::with_response("\"Mercy In The Quran.\"");
        let title = generate_session_title(&llm, "q").await;
        assert_eq!(title, "Mercy In The Quran");
    }

    #[test]
    fn test_strip_quotes() {
        assert_eq!(strip_quotes("  \"hello\"  "), "hello");
        assert_eq!(strip_quotes("'hi'"), "hi");
        assert_eq!(strip_quotes("plain"), "plain");
    }
}
