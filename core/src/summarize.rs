//! Frequency-based extractive summarization.
//!
//! Sentences are scored by the mean document-local frequency of their
//! qualifying tokens. The top `n` are returned in document order; equal
//! scores keep their original order, so the lower index wins a tie.

use crate::model::{truncate_chars, Confidence, Document, SummaryResult};
use crate::sentences::split_sentences;
use crate::tokenizer::{is_qualifying, qualifying_tokens, tokenize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Only this many leading chars are split and scored.
pub const SCORING_TEXT_LIMIT: usize = 50_000;
pub const TLDR_SENTENCES: usize = 2;
pub const MAX_TAGS: usize = 3;
pub const WORDS_PER_MINUTE: f64 = 200.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredSentence {
    pub index: usize,
    pub text: String,
    pub tokens: Vec<String>,
    pub score: f64,
}

/// Output of one summarization pass, before it is labelled with a mode.
#[derive(Debug, Clone, PartialEq)]
pub struct Extract {
    pub tldr: String,
    pub bullets: Vec<String>,
    pub tags: Vec<String>,
    pub reading_time_minutes: u32,
}

impl Extract {
    pub fn into_result(self, document: &Document) -> SummaryResult {
        SummaryResult {
            tldr: self.tldr,
            bullets: self.bullets,
            tags: self.tags,
            reading_time_minutes: self.reading_time_minutes,
            confidence: Confidence::Medium,
            mode_used: document.mode,
        }
    }
}

pub fn score_sentences(text: &str) -> Vec<ScoredSentence> {
    let sentences = split_sentences(truncate_chars(text, SCORING_TEXT_LIMIT));
    let tokenized: Vec<(String, Vec<String>)> = sentences
        .into_iter()
        .map(|s| {
            let toks = qualifying_tokens(&s);
            (s, toks)
        })
        .collect();

    let scores: Vec<f64> = {
        let mut freq: HashMap<&str, u32> = HashMap::new();
        for (_, toks) in &tokenized {
            for t in toks {
                *freq.entry(t.as_str()).or_insert(0) += 1;
            }
        }
        tokenized
            .iter()
            .map(|(_, toks)| {
                if toks.is_empty() {
                    return 0.0;
                }
                let total: u32 = toks.iter().map(|t| freq.get(t.as_str()).copied().unwrap_or(0)).sum();
                total as f64 / toks.len() as f64
            })
            .collect()
    };

    tokenized
        .into_iter()
        .zip(scores)
        .enumerate()
        .map(|(index, ((text, tokens), score))| ScoredSentence { index, text, tokens, score })
        .collect()
}

/// Top `n` sentences by score, returned in document order.
pub fn select_top(mut scored: Vec<ScoredSentence>, n: usize) -> Vec<ScoredSentence> {
    // sort_by is stable: equal scores keep ascending index order
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored.truncate(n);
    scored.sort_by_key(|s| s.index);
    scored
}

/// Most frequent qualifying tokens of the whole text, ties by first occurrence.
pub fn top_tags(tokens: &[String], limit: usize) -> Vec<String> {
    let mut counts: HashMap<&str, (u32, usize)> = HashMap::new();
    for (pos, t) in tokens.iter().enumerate() {
        if !is_qualifying(t) {
            continue;
        }
        counts.entry(t.as_str()).or_insert((0, pos)).0 += 1;
    }
    let mut ranked: Vec<(&str, u32, usize)> = counts.into_iter().map(|(t, (c, first))| (t, c, first)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked.into_iter().take(limit).map(|(t, _, _)| t.to_string()).collect()
}

pub fn reading_time_minutes(token_count: usize) -> u32 {
    let minutes = (token_count as f64 / WORDS_PER_MINUTE).round() as u32;
    minutes.max(1)
}

/// Summarize `text`, keeping at most `n` sentences.
pub fn summarize(text: &str, n: usize) -> Extract {
    let bullets: Vec<String> = select_top(score_sentences(text), n).into_iter().map(|s| s.text).collect();

    let joined = bullets.join(" ");
    let tldr = split_sentences(&joined).into_iter().take(TLDR_SENTENCES).collect::<Vec<_>>().join(" ");

    let all_tokens = tokenize(text);
    let tags = top_tags(&all_tokens, MAX_TAGS);
    let reading_time_minutes = reading_time_minutes(all_tokens.len());

    Extract { tldr, bullets, tags, reading_time_minutes }
}

/// Summarize a document with its mode's default sentence count unless `n` overrides it.
pub fn summarize_document(document: &Document, n: Option<usize>) -> SummaryResult {
    let n = n.unwrap_or_else(|| document.mode.default_sentences());
    summarize(&document.text, n).into_result(document)
}
