use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Where a document comes from; picks which resolver is asked first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Preprint repository: the PDF location is derived from the identifier.
    Arxiv,
    /// Open-access aggregator queried for a PDF link.
    OpenAlex,
    /// Plain URL, probed for a PDF content type.
    Url,
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "arxiv" => Ok(SourceKind::Arxiv),
            "openalex" => Ok(SourceKind::OpenAlex),
            "url" | "web" | "generic" => Ok(SourceKind::Url),
            other => Err(format!("unknown source kind: {other}")),
        }
    }
}

impl SourceKind {
    /// Unknown or missing hints fall through to the generic probe only.
    pub fn from_hint(hint: Option<&str>) -> Option<Self> {
        hint.and_then(|h| h.parse().ok())
    }
}

/// What the fetcher knows about a document it should find full text for.
#[derive(Debug, Clone, Default)]
pub struct DocumentLocator {
    pub identity: String,
    pub document_url: Option<String>,
    pub source: Option<SourceKind>,
}

impl DocumentLocator {
    pub fn new(identity: impl Into<String>) -> Self {
        Self { identity: identity.into(), ..Default::default() }
    }

    pub fn with_url(mut self, url: Option<String>) -> Self {
        self.document_url = url.filter(|u| !u.trim().is_empty());
        self
    }

    pub fn with_source(mut self, source: Option<SourceKind>) -> Self {
        self.source = source;
        self
    }
}
