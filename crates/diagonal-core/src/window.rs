#![forbid(unsafe_code)]

//! Window: a fixed-capacity sliding buffer over one document.
//!
//! A [`Window`] shows `capacity` rows of its current [`Document`]. Each
//! [`step`](Window::step) emits the rows currently visible as a [`Frame`]
//! and returns a new window advanced by one line: the oldest row drops off
//! the top and the line under the cursor enters at the bottom.
//!
//! # Usage
//!
//! ```
//! use diagonal_core::{Document, Window};
//!
//! let doc = Document::from_prose("demo", "a\nb\nc\nd");
//! let window = Window::new(2, doc);
//! let (window, frame) = window.step();
//! assert_eq!(frame.len(), 2);
//! assert_eq!(window.cursor(), 3);
//! ```
//!
//! # Invariants
//!
//! 1. The buffer never holds more than `capacity` rows.
//! 2. A window built with [`new`](Window::new) or [`reload`](Window::reload)
//!    always holds exactly `capacity` rows; rows past the end of the
//!    document are blank placeholders, so row geometry never shrinks.
//! 3. Row `i` shows document line `top() + i`.
//! 4. Once the buffer is full, `cursor() - capacity() == top()` for any
//!    document at least `capacity` lines long.
//! 5. Frames are emitted before advancing: the frame returned by `step` is
//!    the buffer the window held when `step` was called.
//!
//! # Failure Modes
//!
//! - Zero capacity: clamped to one row.
//! - Stepping an exhausted window: appends blank placeholders, never fails.

use std::collections::VecDeque;

use crate::document::{Document, Line};

/// The rows one animation step should render, top row first.
///
/// Trailing blank placeholders are dropped, so a frame may be shorter than
/// the window capacity near the end of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    lines: Vec<Line>,
}

impl Frame {
    pub fn new(lines: Vec<Line>) -> Self {
        Self { lines }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Line for `row`, if the row is occupied.
    #[inline]
    pub fn get(&self, row: usize) -> Option<&Line> {
        self.lines.get(row)
    }

    #[inline]
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Line> {
        self.lines.iter()
    }
}

impl FromIterator<Line> for Frame {
    fn from_iter<I: IntoIterator<Item = Line>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Frame {
    type Item = &'a Line;
    type IntoIter = std::slice::Iter<'a, Line>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}

/// Sliding window state for one viewport.
///
/// Windows are values: [`step`](Self::step) and [`reload`](Self::reload)
/// return new windows and leave `self` untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    document: Document,
    capacity: usize,
    /// Index of the next document line to pull in.
    cursor: usize,
    /// Document index shown on row 0.
    top: usize,
    /// `None` marks a blank placeholder past the end of the document.
    rows: VecDeque<Option<Line>>,
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl Window {
    /// Create a full window over the start of `document`.
    ///
    /// `cursor = min(capacity, len)` and the buffer holds the first `cursor`
    /// lines, padded with blank placeholders up to `capacity`.
    #[must_use]
    pub fn new(capacity: usize, document: Document) -> Self {
        let capacity = capacity.max(1);
        let cursor = capacity.min(document.len());
        let rows = (0..capacity).map(|i| document.get(i).cloned()).collect();
        Self {
            document,
            capacity,
            cursor,
            top: 0,
            rows,
        }
    }

    /// Create an empty window that fills in one row per step before it
    /// starts sliding.
    #[must_use]
    pub fn filling(capacity: usize, document: Document) -> Self {
        let capacity = capacity.max(1);
        Self {
            document,
            capacity,
            cursor: 0,
            top: 0,
            rows: VecDeque::with_capacity(capacity),
        }
    }

    /// Replace the document, discarding the buffer and cursor.
    ///
    /// Equivalent to [`Window::new`] with this window's capacity.
    #[must_use]
    pub fn reload(&self, document: Document) -> Self {
        Self::new(self.capacity, document)
    }
}

// ---------------------------------------------------------------------------
// Stepping
// ---------------------------------------------------------------------------

impl Window {
    /// Emit the current frame and return the window advanced by one line.
    #[must_use]
    pub fn step(&self) -> (Self, Frame) {
        let frame = self.frame();
        let mut next = self.clone();
        next.advance();
        (next, frame)
    }

    fn advance(&mut self) {
        if self.rows.len() >= self.capacity {
            self.rows.pop_front();
            self.top = self.top.saturating_add(1);
        }
        self.rows.push_back(self.document.get(self.cursor).cloned());
        self.cursor = self.cursor.saturating_add(1);
    }

    /// The frame this window would emit now, without advancing.
    pub fn frame(&self) -> Frame {
        let occupied = self
            .rows
            .iter()
            .rposition(Option::is_some)
            .map_or(0, |last| last + 1);
        self.rows
            .iter()
            .take(occupied)
            .map(|row| row.clone().unwrap_or_default())
            .collect()
    }

    /// Returns `true` once the cursor has reached the end of the document.
    ///
    /// An exhausted window should be reloaded before its next step; stepping
    /// it anyway only scrolls in blank placeholders.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.document.len()
    }
}

// ---------------------------------------------------------------------------
// Accessors
// ---------------------------------------------------------------------------

impl Window {
    #[inline]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Visible row count.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Document index of the line on row 0.
    #[inline]
    pub fn top(&self) -> usize {
        self.top
    }

    /// Number of buffered rows, placeholders included.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows holding a document line.
    pub fn occupied(&self) -> usize {
        self.rows.iter().filter(|row| row.is_some()).count()
    }

    /// Buffered rows, top first; `None` is a blank placeholder.
    pub fn rows(&self) -> impl Iterator<Item = Option<&Line>> {
        self.rows.iter().map(Option::as_ref)
    }

    /// Buffered rows with placeholders rendered as blank lines.
    pub fn lines(&self) -> Vec<Line> {
        self.rows
            .iter()
            .map(|row| row.clone().unwrap_or_default())
            .collect()
    }
}
