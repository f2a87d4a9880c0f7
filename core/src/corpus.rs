use crate::{PageId, PageRecord, SearchError};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;

const WORDS_DIR: &str = "Words";
const LINKS_DIR: &str = "Links";
const MANIFEST: &str = "manifest.json";

/// All pages of one crawl generation, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pages: BTreeMap<PageId, PageRecord>,
    created_at: Option<String>,
}

impl Corpus {
    pub fn new() -> Self { Self::default() }

    /// Build a corpus from records, rejecting duplicate ids.
    pub fn from_records<I: IntoIterator<Item = PageRecord>>(records: I) -> Result<Self, SearchError> {
        let mut corpus = Self::new();
        for record in records {
            corpus.insert(record)?;
        }
        Ok(corpus)
    }

    pub fn insert(&mut self, record: PageRecord) -> Result<(), SearchError> {
        if self.pages.contains_key(&record.id) {
            return Err(SearchError::DuplicatePage(record.id));
        }
        self.pages.insert(record.id.clone(), record);
        Ok(())
    }

    pub fn get(&self, id: &PageId) -> Option<&PageRecord> { self.pages.get(id) }

    /// Look a page up by the sanitized name its artifacts are stored under.
    pub fn find_by_file_name(&self, name: &str) -> Option<&PageRecord> {
        self.pages.values().find(|p| p.id.file_name() == name)
    }

    /// Records in ascending id order.
    pub fn pages(&self) -> impl Iterator<Item = &PageRecord> { self.pages.values() }

    pub fn len(&self) -> usize { self.pages.len() }

    pub fn is_empty(&self) -> bool { self.pages.is_empty() }

    pub fn created_at(&self) -> Option<&str> { self.created_at.as_deref() }
}

#[derive(Debug, Serialize, Deserialize)]
struct Manifest {
    created_at: String,
    num_pages: usize,
    /// artifact file name -> page id
    pages: BTreeMap<String, PageId>,
}

/// On-disk corpus: `Words/<file>` holds body text, `Links/<file>` one link per line.
#[derive(Debug, Clone)]
pub struct CorpusStore {
    root: PathBuf,
}

impl CorpusStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn root(&self) -> &Path { &self.root }
    fn words_dir(&self) -> PathBuf { self.root.join(WORDS_DIR) }
    fn links_dir(&self) -> PathBuf { self.root.join(LINKS_DIR) }
    fn manifest(&self) -> PathBuf { self.root.join(MANIFEST) }

    /// Discard the persisted generation and start writing a new one.
    pub fn begin_generation(&self) -> Result<CorpusWriter> {
        reset_dir(&self.words_dir())?;
        reset_dir(&self.links_dir())?;
        let manifest = self.manifest();
        if manifest.exists() {
            fs::remove_file(&manifest)?;
        }
        tracing::debug!(root = %self.root.display(), "cleared previous corpus generation");
        Ok(CorpusWriter {
            store: self.clone(),
            corpus: Corpus::new(),
            files: BTreeMap::new(),
        })
    }

    /// Read the persisted generation. A missing store is an empty corpus, and so
    /// is one without a manifest: `finish` writes the manifest last, so its
    /// absence means the generation was never completed.
    pub fn load(&self) -> Result<Corpus> {
        let mut corpus = Corpus::new();
        if !self.words_dir().is_dir() {
            return Ok(corpus);
        }

        let manifest = self.manifest();
        if !manifest.exists() {
            tracing::warn!(root = %self.root.display(), "corpus has no manifest; ignoring incomplete generation");
            return Ok(corpus);
        }
        let raw = fs::read_to_string(&manifest)?;
        let m: Manifest = serde_json::from_str(&raw).with_context(|| format!("parsing {}", manifest.display()))?;
        corpus.created_at = Some(m.created_at);

        for (file, id) in m.pages {
            let text = fs::read_to_string(self.words_dir().join(&file))
                .with_context(|| format!("reading text artifact {file}"))?;
            let links = match fs::read_to_string(self.links_dir().join(&file)) {
                Ok(raw) => parse_links(&raw),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
                Err(e) => return Err(e.into()),
            };
            corpus.insert(PageRecord::new(id, text, links))?;
        }
        tracing::info!(pages = corpus.len(), root = %self.root.display(), "loaded corpus");
        Ok(corpus)
    }
}

/// Writes the artifacts of a generation in progress.
pub struct CorpusWriter {
    store: CorpusStore,
    corpus: Corpus,
    files: BTreeMap<String, PageId>,
}

impl CorpusWriter {
    pub fn write(&mut self, record: PageRecord) -> Result<()> {
        if self.corpus.get(&record.id).is_some() {
            return Err(SearchError::DuplicatePage(record.id).into());
        }
        let base = record.id.file_name();
        let mut file = base.clone();
        let mut n = 1;
        while self.files.contains_key(&file) {
            n += 1;
            file = format!("{base}_{n}");
        }

        fs::write(self.store.words_dir().join(&file), &record.text)?;
        let links = record.links.iter().map(PageId::as_str).collect::<Vec<_>>().join("\n");
        fs::write(self.store.links_dir().join(&file), links)?;

        self.files.insert(file, record.id.clone());
        self.corpus.insert(record)?;
        Ok(())
    }

    pub fn len(&self) -> usize { self.corpus.len() }

    pub fn is_empty(&self) -> bool { self.corpus.is_empty() }

    /// Write the manifest and hand back the completed generation.
    pub fn finish(mut self) -> Result<Corpus> {
        let created_at = time::OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default();
        let manifest = Manifest { created_at: created_at.clone(), num_pages: self.corpus.len(), pages: self.files };
        fs::write(self.store.manifest(), serde_json::to_string_pretty(&manifest)?)?;
        self.corpus.created_at = Some(created_at);
        Ok(self.corpus)
    }
}

fn reset_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir)?;
    }
    fs::create_dir_all(dir)?;
    Ok(())
}

fn parse_links(raw: &str) -> Vec<PageId> {
    raw.lines().map(str::trim).filter(|l| !l.is_empty()).map(PageId::from).collect()
}
