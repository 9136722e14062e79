#![forbid(unsafe_code)]

//! Lines and documents.
//!
//! A [`Line`] is the atomic display unit: text plus an indentation level.
//! A [`Document`] is an ordered, immutable run of lines with a source name.
//! Both are reference counted, so handing a document to an animator or
//! keeping a line in a frame never copies text.
//!
//! # Parsing
//!
//! [`Document::from_code`] derives indentation from leading whitespace and
//! strips it, because the renderer expresses indentation as a horizontal
//! offset rather than as literal spaces:
//!
//! - leading spaces in multiples of four count as four-space levels;
//! - any other run of leading spaces counts as two-space levels;
//! - leading tabs count one level each.
//!
//! [`Document::from_prose`] trims every line and leaves the indent at zero.

use std::fmt;
use std::sync::Arc;

/// One unit of display text plus its indentation level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Line {
    text: Arc<str>,
    indent: u16,
}

impl Line {
    /// Create a line with an explicit indentation level.
    pub fn new(text: impl Into<Arc<str>>, indent: u16) -> Self {
        Self {
            text: text.into(),
            indent,
        }
    }

    /// Create an unindented line.
    pub fn prose(text: impl Into<Arc<str>>) -> Self {
        Self::new(text, 0)
    }

    /// Parse one line of source code, moving leading whitespace into the
    /// indentation level.
    pub fn from_code(raw: &str) -> Self {
        let raw = raw.trim_end();
        let spaces = raw.bytes().take_while(|&b| b == b' ').count();
        let indent = if spaces > 0 {
            if spaces % 4 == 0 { spaces / 4 } else { spaces / 2 }
        } else {
            raw.bytes().take_while(|&b| b == b'\t').count()
        };
        Self::new(raw.trim_start(), u16::try_from(indent).unwrap_or(u16::MAX))
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[inline]
    pub fn indent(&self) -> u16 {
        self.indent
    }

    /// Returns `true` if the line has no text.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// An ordered, immutable sequence of lines.
///
/// Cloning a document shares its lines. Two clones compare equal and
/// [`ptr_eq`](Self::ptr_eq) reports whether they share storage.
#[derive(Clone, PartialEq, Eq)]
pub struct Document {
    name: Arc<str>,
    lines: Arc<[Line]>,
}

impl Document {
    /// Create a document from already-built lines.
    pub fn new(name: impl Into<Arc<str>>, lines: impl IntoIterator<Item = Line>) -> Self {
        Self {
            name: name.into(),
            lines: lines.into_iter().collect(),
        }
    }

    /// Build a document from source code text.
    pub fn from_code(name: impl Into<Arc<str>>, source: &str) -> Self {
        Self::new(name, source.lines().map(Line::from_code))
    }

    /// Build a document from prose text, one line per input line.
    pub fn from_prose(name: impl Into<Arc<str>>, text: &str) -> Self {
        Self::new(name, text.lines().map(|l| Line::prose(l.trim())))
    }

    /// Source name, e.g. a file name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Line at `index`, or `None` past the end.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    #[inline]
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Returns `true` if both documents share the same line storage.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.lines, &other.lines)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("name", &self.name)
            .field("len", &self.lines.len())
            .finish()
    }
}
