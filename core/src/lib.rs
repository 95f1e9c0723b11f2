//! Extractive summarization: sentence splitting, token statistics, sentence
//! ranking, and the two-tier cache that fronts it.

pub mod cache;
pub mod model;
pub mod sentences;
pub mod summarize;
pub mod tokenizer;

pub use cache::{CacheEntry, CacheError, CacheKey, CacheStore, MemoryStore, SledStore, SummaryCache};
pub use model::{CacheTier, Confidence, Document, Mode, SummaryResponse, SummaryResult};
pub use summarize::{summarize, summarize_document, Extract};
