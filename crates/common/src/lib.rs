//! Bayan Common Library
//!
//! Shared code for the Bayan retrieval pipeline including:
//! - Core domain types (search hits, payloads, citations)
//! - Error types and handling
//! - Configuration management
//! - External service clients (embedding, LLM, vector store)

pub mod clients;
pub mod config;
pub mod errors;
pub mod types;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::{AppError, Result};
pub use types::{ChatMessage, ChunkPayload, Citation, Role, SearchFilter, SearchHit};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default embedding model
pub const DEFAULT_EMBEDDING_MODEL: &str = "bge-m3";

/// Default embedding dimension (bge-m3 output)
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 1024;
