#![forbid(unsafe_code)]

//! Document selection.
//!
//! A [`Corpus`] groups documents under source identifiers (a language name,
//! a sample collection) and hands them out through [`DocumentSource`]. The
//! animators only ever see the trait, so tests and hosts can plug in any
//! selection policy.
//!
//! # Failure Modes
//!
//! - No documents at all: [`CorpusError::NoDocuments`].
//! - The selected document has zero lines: [`CorpusError::EmptyDocument`].
//!
//! Both surface at selection time, so a misconfigured corpus fails on the
//! first pick (during startup) instead of rendering nothing forever.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::document::Document;

/// Errors raised when a document cannot be selected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CorpusError {
    /// The corpus holds no documents.
    #[error("corpus has no documents")]
    NoDocuments,
    /// The selected document has no lines.
    #[error("document `{name}` has no lines")]
    EmptyDocument { name: String },
}

/// Anything that can choose the next document for an animator.
pub trait DocumentSource {
    /// Choose a document. Non-empty on success.
    fn pick_document(&mut self) -> Result<Document, CorpusError>;
}

impl<S: DocumentSource + ?Sized> DocumentSource for Box<S> {
    fn pick_document(&mut self) -> Result<Document, CorpusError> {
        (**self).pick_document()
    }
}

/// How a [`Corpus`] chooses among its documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Selection {
    /// Uniform random choice over every document, repeats allowed.
    #[default]
    Uniform,
    /// Every document in insertion order, wrapping around.
    Sequential,
}

#[derive(Debug, Clone)]
struct Source {
    id: String,
    documents: Vec<Document>,
}

/// Read-only collection of documents grouped by source identifier.
#[derive(Debug, Clone)]
pub struct Corpus {
    sources: Vec<Source>,
    selection: Selection,
    rng: SmallRng,
    next: usize,
}

impl Corpus {
    /// Create an empty corpus with an OS-seeded uniform selector.
    #[must_use]
    pub fn new() -> Self {
        Self::from_rng(SmallRng::from_os_rng())
    }

    /// Create an empty corpus whose uniform selector is seeded, for
    /// reproducible runs.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(SmallRng::seed_from_u64(seed))
    }

    fn from_rng(rng: SmallRng) -> Self {
        Self {
            sources: Vec::new(),
            selection: Selection::Uniform,
            rng,
            next: 0,
        }
    }

    /// Set the selection policy (builder pattern).
    #[must_use]
    pub fn selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    /// Add a source (builder pattern).
    #[must_use]
    pub fn with_source(
        mut self,
        id: impl Into<String>,
        documents: impl IntoIterator<Item = Document>,
    ) -> Self {
        self.add_source(id, documents);
        self
    }

    /// Add documents under `id`. Documents added to an existing id are
    /// appended to it.
    pub fn add_source(
        &mut self,
        id: impl Into<String>,
        documents: impl IntoIterator<Item = Document>,
    ) {
        let id = id.into();
        match self.sources.iter_mut().find(|s| s.id == id) {
            Some(source) => source.documents.extend(documents),
            None => self.sources.push(Source {
                id,
                documents: documents.into_iter().collect(),
            }),
        }
    }

    /// Source identifiers in insertion order.
    pub fn source_ids(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|s| s.id.as_str())
    }

    /// Documents registered under `id`.
    pub fn documents(&self, id: &str) -> &[Document] {
        self.sources
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.documents.as_slice())
            .unwrap_or(&[])
    }

    /// Total number of documents across all sources.
    pub fn document_count(&self) -> usize {
        self.sources.iter().map(|s| s.documents.len()).sum()
    }

    fn nth_document(&self, mut n: usize) -> Option<&Document> {
        for source in &self.sources {
            if n < source.documents.len() {
                return source.documents.get(n);
            }
            n -= source.documents.len();
        }
        None
    }
}

impl Default for Corpus {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentSource for Corpus {
    fn pick_document(&mut self) -> Result<Document, CorpusError> {
        let count = self.document_count();
        if count == 0 {
            return Err(CorpusError::NoDocuments);
        }
        let index = match self.selection {
            Selection::Uniform => self.rng.random_range(0..count),
            Selection::Sequential => {
                let index = self.next % count;
                self.next = index + 1;
                index
            }
        };
        let document = self.nth_document(index).ok_or(CorpusError::NoDocuments)?;
        if document.is_empty() {
            return Err(CorpusError::EmptyDocument {
                name: document.name().to_string(),
            });
        }
        Ok(document.clone())
    }
}
