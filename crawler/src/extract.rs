//! Body text and outbound link extraction for article pages.
//!
//! HTML parsing sits behind [`HtmlParser`] so the extraction rules can be
//! exercised against synthetic trees; [`ScraperParser`] is the real backend.

use scraper::{Html, Selector};
use wikisearch_core::tokenizer::normalize_text;
use wikisearch_core::{PageId, ARTICLE_PREFIX};

/// Paragraphs of the article body.
pub const PARAGRAPH_SELECTOR: &str = "#mw-content-text p";
/// Anchors inside those paragraphs.
pub const ANCHOR_SELECTOR: &str = "#mw-content-text p a";
/// Namespaces that are not articles: project, portal, help, talk and file pages.
pub const EXCLUDED_NAMESPACES: &[&str] = &["Wikipedia:", "Portal:", "Help:", "Talk:", "File:"];

/// An element matched by a selector: its text content and attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub text: String,
    pub attrs: Vec<(String, String)>,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }
}

pub trait HtmlParser: Send + Sync {
    type Tree;

    fn parse_body(&self, raw: &str) -> Self::Tree;

    /// Elements matching a CSS selector, in document order.
    fn query_elements(&self, tree: &Self::Tree, selector: &str) -> Vec<Element>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ScraperParser;

impl HtmlParser for ScraperParser {
    type Tree = Html;

    fn parse_body(&self, raw: &str) -> Html {
        Html::parse_document(raw)
    }

    fn query_elements(&self, tree: &Html, selector: &str) -> Vec<Element> {
        let sel = match Selector::parse(selector) {
            Ok(sel) => sel,
            Err(e) => {
                tracing::warn!(selector, error = ?e, "invalid selector");
                return Vec::new();
            }
        };
        tree.select(&sel)
            .map(|el| Element {
                text: el.text().collect(),
                attrs: el.value().attrs().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
    pub text: String,
    pub links: Vec<PageId>,
}

#[derive(Debug, Default, Clone)]
pub struct ContentExtractor<P = ScraperParser> {
    parser: P,
}

impl<P: HtmlParser> ContentExtractor<P> {
    pub fn new(parser: P) -> Self {
        Self { parser }
    }

    /// Parse once and pull out both the text and the links.
    pub fn extract(&self, raw: &str) -> Extracted {
        let tree = self.parser.parse_body(raw);
        Extracted { text: self.text_of(&tree), links: self.links_of(&tree) }
    }

    pub fn extract_text(&self, raw: &str) -> String {
        self.text_of(&self.parser.parse_body(raw))
    }

    pub fn extract_links(&self, raw: &str) -> Vec<PageId> {
        self.links_of(&self.parser.parse_body(raw))
    }

    fn text_of(&self, tree: &P::Tree) -> String {
        let paragraphs: Vec<String> =
            self.parser.query_elements(tree, PARAGRAPH_SELECTOR).into_iter().map(|el| el.text).collect();
        normalize_text(&paragraphs.join(" "))
    }

    fn links_of(&self, tree: &P::Tree) -> Vec<PageId> {
        self.parser
            .query_elements(tree, ANCHOR_SELECTOR)
            .iter()
            .filter_map(|el| el.attr("href"))
            .filter(|href| is_article_link(href))
            .map(|href| PageId::new(href.trim()))
            .collect()
    }
}

/// True for links into the article namespace.
pub fn is_article_link(href: &str) -> bool {
    match href.strip_prefix(ARTICLE_PREFIX) {
        Some(rest) => !EXCLUDED_NAMESPACES.iter().any(|ns| rest.starts_with(ns)),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Line-based stand-in for a DOM: `p <text>` is a paragraph, `a <href>` an anchor.
    struct FixtureParser;

    impl HtmlParser for FixtureParser {
        type Tree = Vec<(String, Element)>;

        fn parse_body(&self, raw: &str) -> Self::Tree {
            raw.lines()
                .filter_map(|line| line.split_once(' '))
                .map(|(kind, rest)| match kind {
                    "a" => (ANCHOR_SELECTOR.to_string(), Element { text: String::new(), attrs: vec![("href".into(), rest.into())] }),
                    _ => (PARAGRAPH_SELECTOR.to_string(), Element { text: rest.into(), attrs: vec![] }),
                })
                .collect()
        }

        fn query_elements(&self, tree: &Self::Tree, selector: &str) -> Vec<Element> {
            tree.iter().filter(|(s, _)| s == selector).map(|(_, el)| el.clone()).collect()
        }
    }

    #[test]
    fn fixture_text_is_joined_and_normalized() {
        let ex = ContentExtractor::new(FixtureParser);
        assert_eq!(ex.extract_text("p The Cat,\np sat   ON the_mat!"), "the cat sat on the mat");
    }

    #[test]
    fn fixture_links_are_filtered_in_order() {
        let ex = ContentExtractor::new(FixtureParser);
        let raw = "a /wiki/Dog\na /wiki/Talk:Dog\na https://example.com\na /wiki/Cat \na /wiki/Dog\na /wiki/File:Cat.jpg";
        let links: Vec<String> = ex.extract_links(raw).into_iter().map(|l| l.to_string()).collect();
        assert_eq!(links, vec!["/wiki/Dog", "/wiki/Cat", "/wiki/Dog"]);
    }

    #[test]
    fn namespaces_are_excluded() {
        for ns in EXCLUDED_NAMESPACES {
            assert!(!is_article_link(&format!("/wiki/{ns}Anything")));
        }
        assert!(is_article_link("/wiki/Portals_of_the_world"));
        assert!(!is_article_link("/w/index.php?title=Cat"));
    }

    const ARTICLE: &str = r##"<html><body>
        <div id="mw-content-text">
          <p>The <b>cat</b> (<i>Felis catus</i>) is a <a href="/wiki/Mammal">mammal</a>.</p>
          <table><tr><td><a href="/wiki/Infobox_only">not a paragraph</a></td></tr></table>
          <p>See <a href="/wiki/Help:Contents">help</a>, <a href="/wiki/Dog">dogs</a> and <a href="#cite">[1]</a>.</p>
        </div>
        <p>Footer <a href="/wiki/Footer">outside content</a></p>
    </body></html>"##;

    #[test]
    fn scraper_extracts_body_paragraphs_only() {
        let out = ContentExtractor::new(ScraperParser).extract(ARTICLE);
        assert_eq!(out.text, "the cat felis catus is a mammal see help dogs and 1");
        let links: Vec<&str> = out.links.iter().map(PageId::as_str).collect();
        assert_eq!(links, vec!["/wiki/Mammal", "/wiki/Dog"]);
    }

    #[test]
    fn empty_content_yields_nothing() {
        let out = ContentExtractor::new(ScraperParser).extract("");
        assert_eq!(out, Extracted::default());
    }
}
