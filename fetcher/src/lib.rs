//! Full-text retrieval for deep summaries: find where a document's PDF
//! lives, download it, and pull the text layer out of it.

pub mod error;
pub mod extract;
pub mod fetcher;
pub mod resolve;
pub mod source;

pub use error::FetchError;
pub use extract::{PdfExtractor, TextExtractor};
pub use fetcher::{DocumentFetcher, FetchConfig, FullTextSource};
pub use resolve::Resolver;
pub use source::{DocumentLocator, SourceKind};
