use crate::tokenizer::tokenize;
use crate::{Corpus, PageId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub page: PageId,
    /// 0-based token positions of the term in the page text, ascending.
    pub positions: Vec<u32>,
}

impl Posting {
    pub fn count(&self) -> usize { self.positions.len() }

    pub fn first(&self) -> Option<u32> { self.positions.first().copied() }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct InvertedIndex {
    pub postings: HashMap<String, Vec<Posting>>, // postings sorted by page
    /// Token count of every indexed page.
    pub doc_lengths: BTreeMap<PageId, u32>,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    pub fn postings(&self, term: &str) -> &[Posting] {
        self.postings.get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn doc_length(&self, page: &PageId) -> u32 {
        self.doc_lengths.get(page).copied().unwrap_or(0)
    }

    pub fn num_pages(&self) -> usize { self.doc_lengths.len() }

    pub fn num_terms(&self) -> usize { self.postings.len() }

    pub fn is_empty(&self) -> bool { self.postings.is_empty() }
}

/// Build the positional index for one corpus generation.
pub fn build_index(corpus: &Corpus) -> InvertedIndex {
    let mut index = InvertedIndex::new();
    // Corpus iterates in id order, so each term's posting list comes out sorted.
    for page in corpus.pages() {
        let tokens = tokenize(&page.text);
        index.doc_lengths.insert(page.id.clone(), tokens.len() as u32);

        let mut local: HashMap<&str, Vec<u32>> = HashMap::new();
        for (term, pos) in tokens {
            local.entry(term).or_default().push(pos as u32);
        }
        for (term, positions) in local {
            index
                .postings
                .entry(term.to_string())
                .or_default()
                .push(Posting { page: page.id.clone(), positions });
        }
    }
    tracing::debug!(pages = index.num_pages(), terms = index.num_terms(), "built inverted index");
    index
}
