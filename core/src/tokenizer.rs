use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Anything that is not a letter, a digit or '+' separates words. '_' included.
    // Letters are Unicode-aware on purpose: "café" stays "café", not "caf".
    static ref SEPARATORS: Regex = Regex::new(r"[^\p{L}\p{N}+]+").expect("valid regex");
}

/// Normalize extracted page text: lowercase, strip punctuation (keeping digits and '+'),
/// collapse whitespace and trim.
pub fn normalize_text(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    SEPARATORS.replace_all(&lowered, " ").trim().to_string()
}

/// Tokenize already-normalized text into (term, position) pairs. Positions are
/// 0-based indices over the whitespace-separated tokens.
pub fn tokenize(text: &str) -> Vec<(&str, usize)> {
    text.split_whitespace().enumerate().map(|(pos, tok)| (tok, pos)).collect()
}

/// Lowercase a raw query and split it into terms. Repeated terms are kept.
pub fn query_terms(query: &str) -> Vec<String> {
    query.trim().to_lowercase().split_whitespace().map(str::to_string).collect()
}
