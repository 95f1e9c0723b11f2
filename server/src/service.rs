use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tldr_core::{
    summarize_document, CacheKey, CacheTier, Confidence, Document, Mode, SummaryCache, SummaryResponse, SummaryResult,
};
use tldr_fetch::{DocumentLocator, FullTextSource, SourceKind};
use tokio::sync::mpsc;

/// Upper bound on a caller-supplied sentence count.
pub const MAX_SENTENCES: usize = 20;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeRequest {
    pub identity: Option<String>,
    pub title: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub source_hint: Option<String>,
    pub document_url: Option<String>,
    #[serde(default)]
    pub mode: Mode,
    pub sentences: Option<usize>,
}

impl SummarizeRequest {
    /// Cache identity: the explicit identity, else the title.
    pub fn identity(&self) -> Result<&str, ServiceError> {
        [self.identity.as_deref(), self.title.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
            .ok_or(ServiceError::MissingIdentity)
    }

    /// Caller's sentence count clamped to `1..=MAX_SENTENCES`.
    pub fn sentences(&self) -> Option<usize> {
        self.sentences.map(|n| n.clamp(1, MAX_SENTENCES))
    }

    /// Cache slot for a summary of `identity` built in `mode` with this request's sentence count.
    pub fn cache_key(&self, identity: &str, mode: Mode) -> CacheKey {
        CacheKey::with_sentences(identity, mode, self.sentences())
    }

    fn quick_document(&self, identity: &str) -> Document {
        Document::quick(identity, self.title.as_deref(), self.abstract_text.as_deref())
    }

    fn locator(&self, identity: &str) -> DocumentLocator {
        DocumentLocator::new(identity)
            .with_url(self.document_url.clone())
            .with_source(SourceKind::from_hint(self.source_hint.as_deref()))
    }
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("identity or title is required")]
    MissingIdentity,
    #[error("internal error")]
    Internal(String),
}

/// One step of a streamed summary, emitted in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub enum SummaryEvent {
    Meta { from_cache: bool, cache_tier: CacheTier },
    Tldr(String),
    Bullets(Vec<String>),
    Tags(Vec<String>),
    Done { mode_used: Mode, reading_time_minutes: u32, confidence: Confidence },
    Error { message: String },
}

impl SummaryEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SummaryEvent::Meta { .. } => "meta",
            SummaryEvent::Tldr(_) => "tldr",
            SummaryEvent::Bullets(_) => "bullets",
            SummaryEvent::Tags(_) => "tags",
            SummaryEvent::Done { .. } => "done",
            SummaryEvent::Error { .. } => "error",
        }
    }

    pub fn payload(&self) -> serde_json::Value {
        match self {
            SummaryEvent::Meta { from_cache, cache_tier } => json!({ "fromCache": from_cache, "cacheTier": cache_tier }),
            SummaryEvent::Tldr(tldr) => json!({ "tldr": tldr }),
            SummaryEvent::Bullets(bullets) => json!({ "bullets": bullets }),
            SummaryEvent::Tags(tags) => json!({ "tags": tags }),
            SummaryEvent::Done { mode_used, reading_time_minutes, confidence } => json!({
                "modeUsed": mode_used,
                "readingTimeMinutes": reading_time_minutes,
                "confidence": confidence,
            }),
            SummaryEvent::Error { message } => json!({ "message": message }),
        }
    }

    fn from_result(result: SummaryResult) -> [SummaryEvent; 4] {
        [
            SummaryEvent::Tldr(result.tldr),
            SummaryEvent::Bullets(result.bullets),
            SummaryEvent::Tags(result.tags),
            SummaryEvent::Done {
                mode_used: result.mode_used,
                reading_time_minutes: result.reading_time_minutes,
                confidence: result.confidence,
            },
        ]
    }
}

pub struct SummaryService {
    cache: SummaryCache,
    source: Arc<dyn FullTextSource>,
}

impl SummaryService {
    pub fn new(cache: SummaryCache, source: Arc<dyn FullTextSource>) -> Self {
        Self { cache, source }
    }

    pub fn cache(&self) -> &SummaryCache { &self.cache }

    pub async fn summarize(&self, req: &SummarizeRequest) -> Result<SummaryResponse, ServiceError> {
        let identity = req.identity()?;
        let key = req.cache_key(identity, req.mode);
        if let Some((result, tier)) = self.cache.lookup(&key) {
            tracing::debug!(key = key.as_str(), tier = tier.as_str(), "cache hit");
            return Ok(SummaryResponse::cached(result, tier));
        }
        let result = self.compute(req, identity).await?;
        self.remember(req, identity, &result);
        Ok(SummaryResponse::computed(result))
    }

    /// Build the document for the requested mode and summarize it, skipping the cache.
    pub async fn compute(&self, req: &SummarizeRequest, identity: &str) -> Result<SummaryResult, ServiceError> {
        let document = self.resolve_document(req, identity).await;
        let n = req.sentences();
        tokio::task::spawn_blocking(move || summarize_document(&document, n))
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))
    }

    /// Stream the summary as events; the channel closes after `done` or `error`.
    pub fn stream(self: &Arc<Self>, req: SummarizeRequest) -> mpsc::Receiver<SummaryEvent> {
        let (tx, rx) = mpsc::channel(8);
        let service = Arc::clone(self);
        tokio::spawn(async move {
            for event in service.events(&req).await {
                if tx.send(event).await.is_err() {
                    tracing::debug!("stream receiver dropped");
                    return;
                }
            }
        });
        rx
    }

    async fn events(&self, req: &SummarizeRequest) -> Vec<SummaryEvent> {
        let identity = match req.identity() {
            Ok(identity) => identity,
            Err(e) => return vec![SummaryEvent::Error { message: e.to_string() }],
        };
        let key = req.cache_key(identity, req.mode);
        let outcome = match self.cache.lookup(&key) {
            Some(hit) => Ok(hit),
            None => self.compute(req, identity).await.map(|result| {
                self.remember(req, identity, &result);
                (result, CacheTier::None)
            }),
        };
        if let Err(e) = &outcome {
            tracing::error!(key = key.as_str(), error = ?e, "summary failed");
        }
        summary_events(outcome)
    }

    async fn resolve_document(&self, req: &SummarizeRequest, identity: &str) -> Document {
        match req.mode {
            Mode::Quick => req.quick_document(identity),
            Mode::Deep => match self.source.full_text(&req.locator(identity)).await {
                Ok(body) => Document::deep(identity, req.title.as_deref(), &body),
                Err(e) => {
                    tracing::warn!(identity, error = %e, "full text unavailable, falling back to quick mode");
                    req.quick_document(identity)
                }
            },
        }
    }

    /// Best-effort write under the mode actually used, so a fallback never
    /// occupies the deep slot.
    fn remember(&self, req: &SummarizeRequest, identity: &str, result: &SummaryResult) {
        let key = req.cache_key(identity, result.mode_used);
        if let Err(e) = self.cache.store(&key, result.clone()) {
            tracing::warn!(key = key.as_str(), error = %e, "cache write failed");
        }
    }
}

/// Events for a looked-up or computed summary. A failure still opens with
/// `meta` and ends at `error`.
fn summary_events(outcome: Result<(SummaryResult, CacheTier), ServiceError>) -> Vec<SummaryEvent> {
    match outcome {
        Ok((result, tier)) => {
            let mut events = vec![SummaryEvent::Meta { from_cache: tier != CacheTier::None, cache_tier: tier }];
            events.extend(SummaryEvent::from_result(result));
            events
        }
        Err(e) => vec![
            SummaryEvent::Meta { from_cache: false, cache_tier: CacheTier::None },
            SummaryEvent::Error { message: e.to_string() },
        ],
    }
}
