use lazy_static::lazy_static;
use regex::Regex;

/// Sentences past this position are ignored.
pub const MAX_SENTENCES: usize = 100;

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("valid regex");
    // The regex crate has no lookaround, so the match covers the punctuation,
    // the gap and the first char of the next sentence. All three are ASCII
    // after whitespace collapsing, which keeps the byte offsets below exact.
    static ref BOUNDARY: Regex = Regex::new(r"[.!?] [A-Z0-9]").expect("valid regex");
}

pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").into_owned()
}

/// Split text into trimmed sentences, keeping terminal punctuation attached.
pub fn split_sentences(text: &str) -> Vec<String> {
    let collapsed = collapse_whitespace(text);
    let mut sentences = Vec::new();
    let mut start = 0;
    for m in BOUNDARY.find_iter(&collapsed) {
        push_trimmed(&mut sentences, &collapsed[start..m.start() + 1]);
        if sentences.len() == MAX_SENTENCES {
            return sentences;
        }
        start = m.end() - 1;
    }
    push_trimmed(&mut sentences, &collapsed[start..]);
    sentences.truncate(MAX_SENTENCES);
    sentences
}

fn push_trimmed(out: &mut Vec<String>, piece: &str) {
    let trimmed = piece.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_terminal_punctuation() {
        let s = split_sentences("Hello there.  How are you?\nI am fine! 42 is the answer.");
        assert_eq!(s, vec!["Hello there.", "How are you?", "I am fine!", "42 is the answer."]);
    }

    #[test]
    fn lowercase_continuation_is_not_a_boundary() {
        let s = split_sentences("See e.g. the appendix. Then stop.");
        assert_eq!(s, vec!["See e.g. the appendix.", "Then stop."]);
    }

    #[test]
    fn no_boundary_yields_whole_input() {
        assert_eq!(split_sentences("  just one fragment  "), vec!["just one fragment"]);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences(" \n\t ").is_empty());
    }

    #[test]
    fn caps_sentence_count() {
        let text = (0..150).map(|i| format!("Sentence {i}.")).collect::<Vec<_>>().join(" ");
        let s = split_sentences(&text);
        assert_eq!(s.len(), MAX_SENTENCES);
        assert_eq!(s[0], "Sentence 0.");
        assert_eq!(s[99], "Sentence 99.");
    }
}
