//! Configuration management for the Bayan pipeline
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default.toml, config/{env}.toml)
//! - Default values
//!
//! The retrieval calibration constants (quotas, budgets, ratios) are
//! configuration rather than literals; the defaults reflect values tuned
//! against the corpus.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Embedding service configuration
    pub embedding: EmbeddingConfig,

    /// LLM service configuration
    pub llm: LlmConfig,

    /// Vector store configuration
    pub vector_store: VectorStoreConfig,

    /// Retrieval calibration constants
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    /// API base URL (OpenAI-compatible /embeddings endpoint)
    #[serde(default = "default_embedding_base")]
    pub api_base: String,

    /// API key for the embedding service
    pub api_key: Option<String>,

    /// Model to use
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Embedding dimension
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    /// Request timeout in seconds
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries
    #[serde(default = "default_embedding_retries")]
    pub max_retries: u32,

    /// Batch size for embedding requests
    #[serde(default = "default_embedding_batch_size")]
    pub batch_size: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    /// Chat completions endpoint (OpenRouter-compatible)
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    /// API key
    pub api_key: Option<String>,

    /// Model name
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VectorStoreConfig {
    /// Qdrant base URL
    #[serde(default = "default_qdrant_url")]
    pub url: String,

    /// Qdrant API key
    pub api_key: Option<String>,

    /// Collection name
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Scroll batch size for exhaustive scans
    #[serde(default = "default_scroll_batch")]
    pub scroll_batch_size: usize,
}

/// Calibration constants for retrieval, budgeting, and citation handling
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrievalConfig {
    /// Total model context window in tokens
    #[serde(default = "default_context_window")]
    pub context_window: usize,

    /// Reserved maximum output tokens
    #[serde(default = "default_max_output")]
    pub max_output_tokens: usize,

    /// Fixed safety margin in tokens
    #[serde(default = "default_safety_margin")]
    pub safety_margin: usize,

    /// Floor returned by the budget estimator even when arithmetic goes
    /// negative
    #[serde(default = "default_min_budget")]
    pub min_source_budget: usize,

    /// Pessimistic chars-per-token ratio (lower ratio over-estimates
    /// token counts, which is the safe direction)
    #[serde(default = "default_chars_per_token")]
    pub chars_per_token: f32,

    /// Token budget for conversation history trimming
    #[serde(default = "default_history_budget")]
    pub history_budget_tokens: usize,

    /// Default top_k for semantic queries
    #[serde(default = "default_semantic_top_k")]
    pub semantic_top_k: usize,

    /// Default max_results for counting queries
    #[serde(default = "default_counting_max")]
    pub counting_max_results: usize,

    /// Default max_results for listing queries
    #[serde(default = "default_listing_max")]
    pub listing_max_results: usize,

    /// Hard ceiling on the auto-scaled working result-set size
    #[serde(default = "default_pool_ceiling")]
    pub pool_ceiling: usize,

    /// Per-search candidate multiplier over the working set size
    #[serde(default = "default_candidate_multiplier")]
    pub candidate_multiplier: usize,

    /// Maximum alternative phrasings kept from query expansion
    #[serde(default = "default_max_phrases")]
    pub max_expansion_phrases: usize,

    /// Diversification quota for Quran hits (fraction of the working set)
    #[serde(default = "default_quran_quota")]
    pub quran_quota: f32,

    /// Diversification quota for Hadith hits
    #[serde(default = "default_hadith_quota")]
    pub hadith_quota: f32,

    /// Diversification quota for Tafsir hits
    #[serde(default = "default_tafsir_quota")]
    pub tafsir_quota: f32,

    /// How many top-scoring rukus are expanded into full passages
    #[serde(default = "default_passage_group_cap")]
    pub passage_group_cap: usize,

    /// Maximum citations auto-translated per answer
    #[serde(default = "default_translation_batch")]
    pub translation_max_batch: usize,

    /// Maximum characters per citation sent for translation
    #[serde(default = "default_translation_chars")]
    pub translation_max_chars: usize,
}

// Default value functions
fn default_embedding_base() -> String { "https://api.openai.com/v1".to_string() }
fn default_embedding_model() -> String { "bge-m3".to_string() }
fn default_embedding_dimension() -> usize { 1024 }
fn default_embedding_timeout() -> u64 { 30 }
fn default_embedding_retries() -> u32 { 3 }
fn default_embedding_batch_size() -> usize { 32 }
fn default_llm_endpoint() -> String { "https://openrouter.ai/api/v1/chat/completions".to_string() }
fn default_llm_model() -> String { "qwen/qwen-2.5-72b-instruct".to_string() }
fn default_llm_timeout() -> u64 { 60 }
fn default_qdrant_url() -> String { "http://localhost:6333".to_string() }
fn default_collection() -> String { "bayan-v1".to_string() }
fn default_scroll_batch() -> usize { 250 }
fn default_context_window() -> usize { 262_144 }
fn default_max_output() -> usize { 32_768 }
fn default_safety_margin() -> usize { 5_000 }
fn default_min_budget() -> usize { 1_000 }
fn default_chars_per_token() -> f32 { 1.5 }
fn default_history_budget() -> usize { 40_000 }
fn default_semantic_top_k() -> usize { 10 }
fn default_counting_max() -> usize { 100 }
fn default_listing_max() -> usize { 50 }
fn default_pool_ceiling() -> usize { 20 }
fn default_candidate_multiplier() -> usize { 3 }
fn default_max_phrases() -> usize { 8 }
fn default_quran_quota() -> f32 { 0.4 }
fn default_hadith_quota() -> f32 { 0.3 }
fn default_tafsir_quota() -> f32 { 0.2 }
fn default_passage_group_cap() -> usize { 3 }
fn default_translation_batch() -> usize { 10 }
fn default_translation_chars() -> usize { 1_500 }

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env if present; real environment variables win
        dotenvy::dotenv().ok();

        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables with APP__ prefix
            // e.g., APP__LLM__MODEL=...
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get the LLM request timeout as Duration
    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm.timeout_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            embedding: EmbeddingConfig::default(),
            llm: LlmConfig::default(),
            vector_store: VectorStoreConfig::default(),
            retrieval: RetrievalConfig::default(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_base: default_embedding_base(),
            api_key: None,
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            timeout_secs: default_embedding_timeout(),
            max_retries: default_embedding_retries(),
            batch_size: default_embedding_batch_size(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            api_key: None,
            model: default_llm_model(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            url: default_qdrant_url(),
            api_key: None,
            collection: default_collection(),
            scroll_batch_size: default_scroll_batch(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            context_window: default_context_window(),
            max_output_tokens: default_max_output(),
            safety_margin: default_safety_margin(),
            min_source_budget: default_min_budget(),
            chars_per_token: default_chars_per_token(),
            history_budget_tokens: default_history_budget(),
            semantic_top_k: default_semantic_top_k(),
            counting_max_results: default_counting_max(),
            listing_max_results: default_listing_max(),
            pool_ceiling: default_pool_ceiling(),
            candidate_multiplier: default_candidate_multiplier(),
            max_expansion_phrases: default_max_phrases(),
            quran_quota: default_quran_quota(),
            hadith_quota: default_hadith_quota(),
            tafsir_quota: default_tafsir_quota(),
            passage_group_cap: default_passage_group_cap(),
            translation_max_batch: default_translation_batch(),
            translation_max_chars: default_translation_chars(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.embedding.model, "bge-m3");
        assert_eq!(config.retrieval.pool_ceiling, 20);
        assert!(config.retrieval.chars_per_token < 1.64);
    }

    #[test]
    fn test_quotas_sum_below_one() {
        let r = RetrievalConfig::default();
        assert!(r.quran_quota + r.hadith_quota + r.tafsir_quota < 1.0);
    }
}
