use serde::{Deserialize, Serialize};
use std::fmt;

/// Deep-mode body text is cut to this many characters before scoring.
pub const DEEP_TEXT_LIMIT: usize = 200_000;
pub const QUICK_SENTENCES: usize = 5;
pub const DEEP_SENTENCES: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Quick,
    Deep,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Quick => "quick",
            Mode::Deep => "deep",
        }
    }

    /// Number of sentences picked when the caller does not ask for a count.
    pub fn default_sentences(&self) -> usize {
        match self {
            Mode::Quick => QUICK_SENTENCES,
            Mode::Deep => DEEP_SENTENCES,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quick" => Ok(Mode::Quick),
            "deep" => Ok(Mode::Deep),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}

/// Per-request input to the summarizer.
#[derive(Debug, Clone)]
pub struct Document {
    pub identity: String,
    pub title: Option<String>,
    pub text: String,
    pub mode: Mode,
}

impl Document {
    /// Title and abstract only.
    pub fn quick(identity: &str, title: Option<&str>, abstract_text: Option<&str>) -> Self {
        let title = title.map(str::trim).filter(|t| !t.is_empty());
        let abstract_text = abstract_text.map(str::trim).filter(|a| !a.is_empty());
        let text = match (title, abstract_text) {
            (Some(t), Some(a)) if t.ends_with(['.', '!', '?']) => format!("{t} {a}"),
            (Some(t), Some(a)) => format!("{t}. {a}"),
            (Some(t), None) => t.to_string(),
            (None, Some(a)) => a.to_string(),
            (None, None) => String::new(),
        };
        Self { identity: identity.to_string(), title: title.map(str::to_string), text, mode: Mode::Quick }
    }

    /// Full extracted body, truncated to [`DEEP_TEXT_LIMIT`] chars.
    pub fn deep(identity: &str, title: Option<&str>, body: &str) -> Self {
        Self {
            identity: identity.to_string(),
            title: title.map(str::to_string),
            text: truncate_chars(body, DEEP_TEXT_LIMIT).to_string(),
            mode: Mode::Deep,
        }
    }
}

/// Longest prefix of `text` holding at most `max` chars.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// The only label an extractive summary gets.
    #[default]
    Medium,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResult {
    pub tldr: String,
    pub bullets: Vec<String>,
    pub tags: Vec<String>,
    pub reading_time_minutes: u32,
    pub confidence: Confidence,
    pub mode_used: Mode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheTier {
    None,
    Memory,
    External,
}

impl CacheTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheTier::None => "none",
            CacheTier::Memory => "memory",
            CacheTier::External => "external",
        }
    }
}

/// What the HTTP layer hands back: the result plus where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    #[serde(flatten)]
    pub result: SummaryResult,
    pub from_cache: bool,
    pub cache_tier: CacheTier,
}

impl SummaryResponse {
    pub fn computed(result: SummaryResult) -> Self {
        Self { result, from_cache: false, cache_tier: CacheTier::None }
    }

    pub fn cached(result: SummaryResult, tier: CacheTier) -> Self {
        Self { result, from_cache: true, cache_tier: tier }
    }
}
