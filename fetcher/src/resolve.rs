//! PDF location strategies, tried in a fixed order per source kind.

use crate::error::FetchError;
use crate::source::{DocumentLocator, SourceKind};
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::{header, Client};
use scraper::{Html, Selector};
use url::Url;

pub const OPENALEX_BASE: &str = "https://api.openalex.org";

lazy_static! {
    // new style 2101.00001v2, old style hep-th/9901001
    static ref ARXIV_ID: Regex = Regex::new(r"(\d{4}\.\d{4,5}(?:v\d+)?|[a-z][a-z.-]*/\d{7}(?:v\d+)?)").expect("valid regex");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolver {
    Arxiv,
    OpenAlex { base: String },
    GenericProbe,
}

impl Resolver {
    /// Resolvers for `source` in priority order; the generic probe always runs last.
    pub fn chain(source: Option<SourceKind>, openalex_base: &str) -> Vec<Resolver> {
        match source {
            Some(SourceKind::Arxiv) => vec![Resolver::Arxiv, Resolver::GenericProbe],
            Some(SourceKind::OpenAlex) => vec![Resolver::OpenAlex { base: openalex_base.to_string() }, Resolver::GenericProbe],
            Some(SourceKind::Url) | None => vec![Resolver::GenericProbe],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Resolver::Arxiv => "arxiv",
            Resolver::OpenAlex { .. } => "openalex",
            Resolver::GenericProbe => "generic",
        }
    }

    pub async fn resolve(&self, client: &Client, locator: &DocumentLocator) -> Result<Option<String>, FetchError> {
        match self {
            Resolver::Arxiv => Ok(arxiv_pdf_url(&locator.identity)
                .or_else(|| locator.document_url.as_deref().and_then(arxiv_pdf_url))),
            Resolver::OpenAlex { base } => openalex_pdf_url(client, base, &locator.identity).await,
            Resolver::GenericProbe => match probe_candidate(locator) {
                Some(candidate) => probe(client, &candidate).await,
                None => Ok(None),
            },
        }
    }
}

/// Derive the arXiv PDF URL from a bare id, an `arXiv:` id, or an abs/pdf URL.
pub fn arxiv_pdf_url(input: &str) -> Option<String> {
    let trimmed = input.trim();
    let rest = trimmed
        .strip_prefix("arXiv:")
        .or_else(|| trimmed.strip_prefix("arxiv:"))
        .unwrap_or(trimmed);
    let rest = match rest.find("arxiv.org/") {
        Some(pos) => {
            let path = &rest[pos + "arxiv.org/".len()..];
            path.strip_prefix("abs/").or_else(|| path.strip_prefix("pdf/"))?
        }
        None if rest.contains("://") => return None,
        None => rest,
    };
    let id = ARXIV_ID.find(rest)?.as_str();
    Some(format!("https://arxiv.org/pdf/{id}"))
}

pub fn openalex_work_url(base: &str, identity: &str) -> String {
    let id = identity.trim();
    let id = id.strip_prefix("https://doi.org/").unwrap_or(id);
    let id = id.strip_prefix("https://openalex.org/").unwrap_or(id);
    if id.starts_with("10.") {
        format!("{}/works/doi:{}", base.trim_end_matches('/'), id)
    } else {
        format!("{}/works/{}", base.trim_end_matches('/'), id)
    }
}

/// First PDF link in an OpenAlex work record.
pub fn openalex_pdf_from_work(work: &serde_json::Value) -> Option<String> {
    let candidates = [
        work.pointer("/best_oa_location/pdf_url"),
        work.pointer("/primary_location/pdf_url"),
        work.pointer("/open_access/oa_url"),
    ];
    candidates
        .into_iter()
        .flatten()
        .filter_map(|v| v.as_str())
        .find(|s| !s.trim().is_empty())
        .map(str::to_string)
}

async fn openalex_pdf_url(client: &Client, base: &str, identity: &str) -> Result<Option<String>, FetchError> {
    let url = openalex_work_url(base, identity);
    let resp = client.get(&url).header(header::ACCEPT, "application/json").send().await?;
    if !resp.status().is_success() {
        return Err(FetchError::Status(resp.status()));
    }
    let work: serde_json::Value = resp.json().await?;
    Ok(openalex_pdf_from_work(&work))
}

fn probe_candidate(locator: &DocumentLocator) -> Option<Url> {
    let raw = locator.document_url.as_deref().unwrap_or(&locator.identity);
    let url = Url::parse(raw.trim()).ok()?;
    url.scheme().starts_with("http").then_some(url)
}

pub fn is_pdf_content_type(ct: &str) -> bool {
    ct.to_ascii_lowercase().contains("application/pdf")
}

async fn probe(client: &Client, url: &Url) -> Result<Option<String>, FetchError> {
    if url.path().to_ascii_lowercase().ends_with(".pdf") {
        return Ok(Some(url.to_string()));
    }
    let resp = client.head(url.clone()).send().await?;
    let ct = content_type(&resp);
    if resp.status().is_success() && is_pdf_content_type(&ct) {
        return Ok(Some(url.to_string()));
    }
    if !ct.starts_with("text/html") {
        return Ok(None);
    }
    // landing page: look for a linked pdf
    let resp = client.get(url.clone()).send().await?;
    if !resp.status().is_success() {
        return Ok(None);
    }
    let body = resp.text().await?;
    Ok(pdf_link_from_html(&body, url))
}

pub(crate) fn content_type(resp: &reqwest::Response) -> String {
    resp.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string()
}

/// `citation_pdf_url` meta tag first, then the first anchor ending in `.pdf`.
pub fn pdf_link_from_html(html: &str, page: &Url) -> Option<String> {
    let doc = Html::parse_document(html);
    let meta = Selector::parse(r#"meta[name="citation_pdf_url"]"#).ok()?;
    let anchors = Selector::parse("a[href]").ok()?;
    let from_meta = doc.select(&meta).filter_map(|m| m.value().attr("content")).next();
    let from_anchor = || {
        doc.select(&anchors)
            .filter_map(|a| a.value().attr("href"))
            .find(|h| h.split(['?', '#']).next().unwrap_or("").to_ascii_lowercase().ends_with(".pdf"))
    };
    let href = from_meta.or_else(from_anchor)?;
    let resolved = Url::parse(href).or_else(|_| page.join(href)).ok()?;
    resolved.scheme().starts_with("http").then(|| resolved.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn arxiv_ids_in_every_shape() {
        let want = Some("https://arxiv.org/pdf/2101.00001v2".to_string());
        assert_eq!(arxiv_pdf_url("2101.00001v2"), want);
        assert_eq!(arxiv_pdf_url("arXiv:2101.00001v2"), want);
        assert_eq!(arxiv_pdf_url("https://arxiv.org/abs/2101.00001v2"), want);
        assert_eq!(arxiv_pdf_url("https://arxiv.org/pdf/2101.00001v2"), want);
        assert_eq!(arxiv_pdf_url("hep-th/9901001"), Some("https://arxiv.org/pdf/hep-th/9901001".to_string()));
        assert_eq!(arxiv_pdf_url("https://example.com/2101.00001"), None);
        assert_eq!(arxiv_pdf_url("Attention Is All You Need"), None);
    }

    #[test]
    fn chain_orders_hint_before_probe() {
        let chain = Resolver::chain(Some(SourceKind::OpenAlex), OPENALEX_BASE);
        assert_eq!(chain.iter().map(Resolver::name).collect::<Vec<_>>(), vec!["openalex", "generic"]);
        assert_eq!(Resolver::chain(None, OPENALEX_BASE), vec![Resolver::GenericProbe]);
    }

    #[test]
    fn openalex_urls_handle_dois() {
        assert_eq!(openalex_work_url(OPENALEX_BASE, "W2741809807"), "https://api.openalex.org/works/W2741809807");
        assert_eq!(
            openalex_work_url(OPENALEX_BASE, "https://doi.org/10.7717/peerj.4375"),
            "https://api.openalex.org/works/doi:10.7717/peerj.4375"
        );
    }

    #[test]
    fn openalex_pdf_falls_through_locations() {
        let work = json!({
            "best_oa_location": { "pdf_url": null },
            "primary_location": { "pdf_url": "" },
            "open_access": { "oa_url": "https://example.org/paper.pdf" }
        });
        assert_eq!(openalex_pdf_from_work(&work), Some("https://example.org/paper.pdf".to_string()));
        assert_eq!(openalex_pdf_from_work(&json!({})), None);
    }

    #[test]
    fn html_landing_pages_yield_pdf_links() {
        let page = Url::parse("https://journal.example/articles/42").unwrap();
        let html = r#"<html><head><meta name="citation_pdf_url" content="https://journal.example/42.pdf"></head></html>"#;
        assert_eq!(pdf_link_from_html(html, &page), Some("https://journal.example/42.pdf".to_string()));

        let html = r#"<html><body><a href="/about">About</a><a href="files/full.PDF?dl=1">PDF</a></body></html>"#;
        assert_eq!(pdf_link_from_html(html, &page), Some("https://journal.example/articles/files/full.PDF?dl=1".to_string()));

        assert_eq!(pdf_link_from_html("<p>nothing here</p>", &page), None);
    }

    #[tokio::test]
    async fn arxiv_resolver_needs_no_network() {
        let client = Client::new();
        let loc = DocumentLocator::new("arXiv:1706.03762").with_source(Some(SourceKind::Arxiv));
        let url = Resolver::Arxiv.resolve(&client, &loc).await.unwrap();
        assert_eq!(url.as_deref(), Some("https://arxiv.org/pdf/1706.03762"));
    }

    #[tokio::test]
    async fn probe_accepts_pdf_paths_without_network() {
        let client = Client::new();
        let loc = DocumentLocator::new("x").with_url(Some("https://example.org/files/paper.pdf".into()));
        let url = Resolver::GenericProbe.resolve(&client, &loc).await.unwrap();
        assert_eq!(url.as_deref(), Some("https://example.org/files/paper.pdf"));

        let loc = DocumentLocator::new("not a url");
        assert_eq!(Resolver::GenericProbe.resolve(&client, &loc).await.unwrap(), None);
    }
}
