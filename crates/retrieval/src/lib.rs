//! Bayan Retrieval Library
//!
//! Retrieval-augmented answering over an Islamic text corpus:
//! - Query intent classification (semantic, counting, listing, metadata)
//! - Hybrid vector + keyword + metadata search with passage expansion
//! - Token-budget tiering of source texts (full / english-only / chunked)
//! - Citation building, verification, and auto-translation
//! - Conversational engine with follow-up rewriting and SSE-style streaming

pub mod budget;
pub mod citations;
pub mod classifier;
pub mod engine;
pub mod format;
pub mod prompts;
pub mod retrieval;

// Re-export the main entry points
pub use classifier::{MetadataFilter, QueryClassifier, QueryIntent, QueryType};
pub use engine::{AskResponse, RagEngine, StreamEvent};
pub use format::SourceTier;
pub use retrieval::{RagResult, Retriever};
