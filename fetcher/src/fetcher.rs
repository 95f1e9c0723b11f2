use crate::error::FetchError;
use crate::extract::{PdfExtractor, TextExtractor, PDF_MAGIC};
use crate::resolve::{content_type, is_pdf_content_type, Resolver, OPENALEX_BASE};
use crate::source::DocumentLocator;
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(25);
pub const DEFAULT_MAX_PDF_BYTES: usize = 25 * 1024 * 1024;
pub const USER_AGENT: &str = concat!("tldr/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Budget for resolve + download + extract together.
    pub timeout: Duration,
    pub max_pdf_bytes: usize,
    pub user_agent: String,
    pub openalex_base: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_pdf_bytes: DEFAULT_MAX_PDF_BYTES,
            user_agent: USER_AGENT.to_string(),
            openalex_base: OPENALEX_BASE.to_string(),
        }
    }
}

/// Supplies the full body text of a document for deep summaries.
#[async_trait]
pub trait FullTextSource: Send + Sync {
    async fn full_text(&self, locator: &DocumentLocator) -> Result<String, FetchError>;
}

pub struct DocumentFetcher {
    client: Client,
    extractor: Arc<dyn TextExtractor>,
    config: FetchConfig,
}

impl DocumentFetcher {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(5))
            .connect_timeout(config.timeout)
            .build()?;
        Ok(Self { client, extractor: Arc::new(PdfExtractor), config })
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// First PDF URL any resolver in the chain produces.
    pub async fn locate(&self, locator: &DocumentLocator) -> Result<String, FetchError> {
        for resolver in Resolver::chain(locator.source, &self.config.openalex_base) {
            match resolver.resolve(&self.client, locator).await {
                Ok(Some(url)) => {
                    tracing::debug!(resolver = resolver.name(), %url, "resolved pdf location");
                    return Ok(url);
                }
                Ok(None) => tracing::debug!(resolver = resolver.name(), "resolver found nothing"),
                Err(e) => tracing::debug!(resolver = resolver.name(), error = %e, "resolver failed"),
            }
        }
        Err(FetchError::NoLocation)
    }

    /// Download a PDF, refusing non-PDF responses and bodies over the size cap.
    pub async fn download(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status()));
        }
        let ct = content_type(&resp);
        let max = self.config.max_pdf_bytes;
        if resp.content_length().is_some_and(|len| len as usize > max) {
            return Err(FetchError::TooLarge(max));
        }

        let mut body: Vec<u8> = Vec::new();
        let mut chunks = resp.bytes_stream();
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            if body.len() + chunk.len() > max {
                return Err(FetchError::TooLarge(max));
            }
            body.extend_from_slice(&chunk);
        }

        if !accepts_pdf(&ct, &body) {
            return Err(FetchError::NotPdf(ct));
        }
        Ok(body)
    }

    async fn fetch_text(&self, locator: &DocumentLocator) -> Result<String, FetchError> {
        let url = self.locate(locator).await?;
        let bytes = self.download(&url).await?;
        let extractor = self.extractor.clone();
        // pdf parsing is CPU bound and may panic on malformed files
        tokio::task::spawn_blocking(move || extractor.extract(&bytes))
            .await
            .map_err(|e| FetchError::Extract(e.to_string()))?
    }
}

/// A body counts as a PDF when the server says so or when it opens with the
/// `%PDF` magic; repositories often serve PDFs as `application/octet-stream`.
pub fn accepts_pdf(content_type: &str, body: &[u8]) -> bool {
    is_pdf_content_type(content_type) || body.starts_with(PDF_MAGIC)
}

#[async_trait]
impl FullTextSource for DocumentFetcher {
    async fn full_text(&self, locator: &DocumentLocator) -> Result<String, FetchError> {
        let timeout = self.config.timeout;
        match tokio::time::timeout(timeout, self.fetch_text(locator)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(identity = %locator.identity, ?timeout, "full text fetch timed out");
                Err(FetchError::Timeout(timeout))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceKind;
    use std::time::Instant;
    use tokio::net::TcpListener;

    /// Accepts connections and never answers them.
    async fn silent_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn stalled_sources_hit_the_overall_timeout() {
        let config = FetchConfig {
            timeout: Duration::from_millis(200),
            openalex_base: silent_server().await,
            ..FetchConfig::default()
        };
        let fetcher = DocumentFetcher::new(config).unwrap();
        let locator = DocumentLocator::new("W2741809807").with_source(Some(SourceKind::OpenAlex));

        let started = Instant::now();
        let err = fetcher.full_text(&locator).await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout(t) if t == Duration::from_millis(200)), "got {err:?}");
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn pdf_bodies_pass_on_header_or_magic() {
        assert!(accepts_pdf("application/pdf", b""));
        assert!(accepts_pdf("application/octet-stream", b"%PDF-1.7\n"));
        assert!(!accepts_pdf("text/html; charset=utf-8", b"<html></html>"));
        assert!(!accepts_pdf("", b"plain text"));
    }

    #[tokio::test]
    async fn unresolvable_documents_report_no_location() {
        let fetcher = DocumentFetcher::new(FetchConfig::default()).unwrap();
        let err = fetcher.full_text(&DocumentLocator::new("Some Paper Title")).await.unwrap_err();
        assert!(matches!(err, FetchError::NoLocation));
    }
}
