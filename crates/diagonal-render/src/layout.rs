#![forbid(unsafe_code)]

//! Row layouts and the character budget.
//!
//! A [`RowLayout`] maps `(row, line)` to a glyph position. Two layouts ship:
//!
//! - [`CodeLayout`]: the diagonal code panel. Indentation drives the
//!   horizontal offset and the row drives the vertical offset:
//!   `x = indent * col_step + x_origin`, `y = row * row_step + y_origin`.
//! - [`ProseLayout`]: the writing panel. Rows count upward from the
//!   container's far edge, `y = far_edge - row * row_step`, with an optional
//!   cosmetic drift of `row * drift` added to `x`.
//!
//! [`CharBudget`] is the static-render truncation policy: the diagonal
//! layout leaves less horizontal room the further down and the deeper
//! indented a line is.

use diagonal_core::Line;
use unicode_segmentation::UnicodeSegmentation;

/// Maps a row and its line to a position and style.
pub trait RowLayout {
    /// Position of the glyph for `line` shown on `row`.
    fn position(&self, row: usize, line: &Line) -> (f32, f32);

    /// Style tag attached to every glyph of this layout.
    fn style(&self) -> &'static str;
}

impl<L: RowLayout + ?Sized> RowLayout for &L {
    fn position(&self, row: usize, line: &Line) -> (f32, f32) {
        (**self).position(row, line)
    }

    fn style(&self) -> &'static str {
        (**self).style()
    }
}

/// Diagonal, indent-driven layout for the code viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CodeLayout {
    pub x_origin: f32,
    pub y_origin: f32,
    /// Horizontal offset per indentation level.
    pub col_step: f32,
    /// Vertical offset per row.
    pub row_step: f32,
    pub style: &'static str,
}

impl Default for CodeLayout {
    fn default() -> Self {
        Self {
            x_origin: 1.0,
            y_origin: 0.0,
            col_step: 2.0,
            row_step: 1.0,
            style: "code",
        }
    }
}

impl RowLayout for CodeLayout {
    fn position(&self, row: usize, line: &Line) -> (f32, f32) {
        (
            f32::from(line.indent()) * self.col_step + self.x_origin,
            row as f32 * self.row_step + self.y_origin,
        )
    }

    fn style(&self) -> &'static str {
        self.style
    }
}

/// Bottom-up layout for the prose viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProseLayout {
    pub x_origin: f32,
    /// Vertical coordinate of row 0, the edge rows grow away from.
    pub far_edge: f32,
    pub row_step: f32,
    /// Extra horizontal offset per row; zero keeps a straight left edge.
    pub drift: f32,
    pub style: &'static str,
}

impl ProseLayout {
    /// Layout anchored at `far_edge` with default spacing.
    #[must_use]
    pub fn anchored(far_edge: f32) -> Self {
        Self {
            far_edge,
            ..Self::default()
        }
    }
}

impl Default for ProseLayout {
    fn default() -> Self {
        Self {
            x_origin: 1.0,
            far_edge: 23.0,
            row_step: 1.0,
            drift: 0.0,
            style: "writing",
        }
    }
}

impl RowLayout for ProseLayout {
    fn position(&self, row: usize, _line: &Line) -> (f32, f32) {
        let row = row as f32;
        (
            self.x_origin + row * self.drift,
            self.far_edge - row * self.row_step,
        )
    }

    fn style(&self) -> &'static str {
        self.style
    }
}

/// Per-row character budget for static renders.
///
/// `max_chars(row, indent) = floor(base - per_row * row - per_indent * indent)`,
/// floored at zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharBudget {
    pub base: f32,
    pub per_row: f32,
    pub per_indent: f32,
}

impl Default for CharBudget {
    fn default() -> Self {
        Self {
            base: 80.0,
            per_row: 3.15,
            per_indent: 4.0,
        }
    }
}

impl CharBudget {
    /// Maximum number of grapheme clusters shown on `row` at `indent`.
    pub fn max_chars(&self, row: usize, indent: u16) -> usize {
        let budget = self.base - self.per_row * row as f32 - self.per_indent * f32::from(indent);
        if budget <= 0.0 || !budget.is_finite() {
            0
        } else {
            budget.floor() as usize
        }
    }

    /// Leading part of `text` that fits the budget for `row` and `indent`.
    pub fn truncate<'a>(&self, text: &'a str, row: usize, indent: u16) -> &'a str {
        truncate_graphemes(text, self.max_chars(row, indent))
    }
}

/// Keep at most `max` grapheme clusters of `text`.
pub fn truncate_graphemes(text: &str, max: usize) -> &str {
    text.grapheme_indices(true)
        .nth(max)
        .map_or(text, |(offset, _)| &text[..offset])
}
