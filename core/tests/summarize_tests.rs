use tldr_core::sentences::split_sentences;
use tldr_core::summarize::{score_sentences, MAX_TAGS};
use tldr_core::tokenizer::{is_stopword, tokenize};
use tldr_core::{summarize, summarize_document, Document, Mode};

const ARTICLE: &str = "Rust guarantees memory safety without a garbage collector. \
    The borrow checker enforces ownership rules at compile time. \
    Many teams adopt Rust for systems programming. \
    Ownership and borrowing make data races impossible in safe Rust. \
    Compile times remain a common complaint. \
    Cargo makes dependency management pleasant. \
    The community publishes crates for almost every need. \
    Rust compiles to efficient native code.";

#[test]
fn it_is_deterministic() {
    let a = summarize(ARTICLE, 3);
    let b = summarize(ARTICLE, 3);
    assert_eq!(a, b);
}

#[test]
fn it_preserves_document_order() {
    let extract = summarize(ARTICLE, 4);
    let sentences = split_sentences(ARTICLE);
    let positions: Vec<usize> = extract
        .bullets
        .iter()
        .map(|b| sentences.iter().position(|s| s == b).expect("bullet comes from source"))
        .collect();
    let mut sorted = positions.clone();
    sorted.sort();
    assert_eq!(positions, sorted);
}

#[test]
fn it_respects_bounds() {
    for n in 0..10 {
        let extract = summarize(ARTICLE, n);
        assert!(extract.bullets.len() <= n);
        assert!(extract.tags.len() <= MAX_TAGS);
        assert!(split_sentences(&extract.tldr).len() <= 2);
    }
}

#[test]
fn tldr_is_first_two_bullets() {
    let extract = summarize(ARTICLE, 4);
    assert_eq!(extract.tldr, extract.bullets[..2].join(" "));
}

#[test]
fn empty_input_is_degenerate() {
    let extract = summarize("", 5);
    assert!(extract.bullets.is_empty());
    assert!(extract.tags.is_empty());
    assert_eq!(extract.tldr, "");
    assert_eq!(extract.reading_time_minutes, 1);
}

#[test]
fn stopwords_never_contribute() {
    let scored = score_sentences("The the the.");
    assert_eq!(scored[0].score, 0.0);

    let extract = summarize(ARTICLE, 5);
    for tag in &extract.tags {
        assert!(!is_stopword(tag));
        assert!(tag.len() >= 3);
    }
}

#[test]
fn cats_scenario_picks_cat_heavy_sentences() {
    let extract = summarize("Cats are mammals. Cats are popular pets. Many people love cats and dogs.", 2);
    assert_eq!(extract.bullets, vec!["Cats are mammals.", "Cats are popular pets."]);
    assert_eq!(extract.tldr, "Cats are mammals. Cats are popular pets.");
    assert_eq!(extract.tags[0], "cats");
}

#[test]
fn tags_and_reading_time_cover_full_text() {
    let long = "Lattice cryptography resists quantum attacks. ".repeat(150);
    let extract = summarize(&long, 5);
    assert_eq!(extract.tags, vec!["lattice", "cryptography", "resists"]);
    // 150 * 5 tokens = 750 -> 3.75 -> 4 minutes
    assert_eq!(tokenize(&long).len(), 750);
    assert_eq!(extract.reading_time_minutes, 4);
}

#[test]
fn document_modes_pick_default_sentence_counts() {
    let quick = Document::quick("x", Some("Rust"), Some(ARTICLE));
    let result = summarize_document(&quick, None);
    assert_eq!(result.mode_used, Mode::Quick);
    assert_eq!(result.bullets.len(), 5);

    let deep = Document::deep("x", None, ARTICLE);
    let result = summarize_document(&deep, None);
    assert_eq!(result.mode_used, Mode::Deep);
    assert_eq!(result.bullets.len(), 6);
}
