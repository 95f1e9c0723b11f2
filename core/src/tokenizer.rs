use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

/// Tokens shorter than this never take part in scoring or tagging.
pub const MIN_TOKEN_LEN: usize = 3;

lazy_static! {
    static ref NON_WORD: Regex = Regex::new(r"[^a-z0-9\s-]").expect("valid regex");
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","also","am","an","and","any","are","aren","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","cannot","could","couldn",
            "did","didn","do","does","doesn","doing","don","down","during",
            "each","few","for","from","further",
            "had","hadn","has","hasn","have","haven","having","he","her","here","hers","herself","him","himself","his","how",
            "i","if","in","into","is","isn","it","its","itself",
            "just","let","may","me","might","more","most","must","mustn","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","should","shouldn","so","some","such",
            "than","that","the","their","theirs","them","themselves","then","there","these","they","this","those","through","to","too",
            "under","until","up","upon","us","very",
            "was","wasn","we","were","weren","what","when","where","which","while","who","whom","why","will","with","won","would","wouldn",
            "you","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

pub fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// A token counts toward scores and tags only when it is long enough and not a stopword.
pub fn is_qualifying(token: &str) -> bool {
    token.len() >= MIN_TOKEN_LEN && !is_stopword(token)
}

/// Lowercase, blank out everything outside `[a-z0-9\s-]`, split on whitespace.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let cleaned = NON_WORD.replace_all(&lowered, " ");
    cleaned.split_whitespace().map(str::to_string).collect()
}

pub fn qualifying_tokens(text: &str) -> Vec<String> {
    tokenize(text).into_iter().filter(|t| is_qualifying(t)).collect()
}
