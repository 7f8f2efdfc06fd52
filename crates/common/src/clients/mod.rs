//! External service clients
//!
//! Every external dependency of the pipeline is reached through a trait
//! at this boundary:
//! - [`Embedder`] — batch text embedding
//! - [`LlmClient`] — chat completion, plain and streaming
//! - [`VectorStore`] — nearest-neighbor search, exhaustive scroll, and
//!   passage fetch
//!
//! Each trait ships one HTTP implementation and one mock for tests.

pub mod embedding;
pub mod llm;
pub mod vector;

pub use embedding::{Embedder, HttpEmbedder, MockEmbedder};
pub use llm::{LlmClient, MockLlm, OpenRouterClient, TokenStream};
pub use vector::{InMemoryVectorStore, QdrantStore, ScrollPage, VectorStore};
