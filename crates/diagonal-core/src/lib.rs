#![forbid(unsafe_code)]

//! Core: lines, documents, corpus selection, and the sliding window animator.
//!
//! # Role in Diagonal
//! `diagonal-core` owns the data that scrolls. A [`Corpus`] hands out
//! immutable [`Document`]s, and a [`Window`] slides a fixed number of rows
//! over the current document one line per step, emitting a [`Frame`] for the
//! renderer each time.
//!
//! # Primary responsibilities
//! - **Line / Document**: immutable display text with indentation levels,
//!   shared cheaply between the corpus and the animators.
//! - **Corpus**: pluggable document selection (uniform random or sequential)
//!   that fails fast on empty input.
//! - **Window**: the immutable-update state machine behind each viewport.
//!
//! # How it fits in the system
//! `diagonal-render` turns frames into positioned glyphs, and
//! `diagonal-runtime` threads windows through a timed operation loop. Nothing
//! in this crate performs I/O or keeps time.

pub mod corpus;
pub mod document;
pub mod window;

pub use corpus::{Corpus, CorpusError, DocumentSource, Selection};
pub use document::{Document, Line};
pub use window::{Frame, Window};
