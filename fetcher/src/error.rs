use thiserror::Error;

/// Every way full-text retrieval can fail. Callers treat all of them as
/// "no text available".
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("no document location could be resolved")]
    NoLocation,
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected http status {0}")]
    Status(reqwest::StatusCode),
    #[error("not a pdf (content-type: {0})")]
    NotPdf(String),
    #[error("document exceeds {0} bytes")]
    TooLarge(usize),
    #[error("pdf extraction failed: {0}")]
    Extract(String),
    #[error("extracted text is empty")]
    Empty,
    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),
}
