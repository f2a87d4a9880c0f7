use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Path prefix every internal article link carries.
pub const ARTICLE_PREFIX: &str = "/wiki/";

lazy_static! {
    static ref NON_FILE_CHARS: Regex = Regex::new(r"[^A-Za-z0-9]+").expect("valid regex");
}

/// Canonical page identifier, e.g. `/wiki/Rust_(programming_language)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(String);

impl PageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Build an id from a free-text phrase: every word title-cased, joined with
    /// underscores and prefixed with the article path. Phrases that already are
    /// article paths are kept as they are.
    pub fn from_phrase(phrase: &str) -> Self {
        let phrase = phrase.trim();
        if phrase.starts_with(ARTICLE_PREFIX) {
            return Self(phrase.to_string());
        }
        let title = phrase.split_whitespace().map(capitalize).collect::<Vec<_>>().join("_");
        Self(format!("{ARTICLE_PREFIX}{title}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Filesystem-safe name for the persisted artifacts of this page.
    pub fn file_name(&self) -> String {
        let last = self.0.rsplit('/').next().unwrap_or_default();
        let name = NON_FILE_CHARS.replace_all(last, "_");
        if name.is_empty() { "Unknown".to_string() } else { name.into_owned() }
    }

    /// Human-readable title: the last path segment with underscores as spaces.
    pub fn title(&self) -> String {
        self.0.rsplit('/').next().unwrap_or_default().replace('_', " ")
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PageId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// One visited page: its normalized body text and outbound article links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    pub id: PageId,
    pub text: String,
    pub links: Vec<PageId>,
}

impl PageRecord {
    pub fn new(id: PageId, text: String, links: Vec<PageId>) -> Self {
        Self { id, text, links }
    }
}
