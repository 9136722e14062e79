#![forbid(unsafe_code)]

//! Glyph reconciliation between consecutive frames.
//!
//! The [`Reconciler`] keeps a [`VisibleSet`] (one glyph handle per occupied
//! row) in step with the latest [`Frame`]. Text changes on every tick, so
//! there is no content diffing: every row present in the new frame gets a
//! freshly created glyph, and only the row count decides what else happens.
//!
//! # How it works
//!
//! With `k` rows currently visible and `m` rows in the new frame, rows are
//! visited in ascending order `0..max(k, m)`:
//!
//! 1. If the row has a live glyph, destroy it.
//! 2. If the frame has a line for the row, create its replacement.
//!
//! So rows `0..min(k, m)` are replaced, rows `k..m` are added when the frame
//! grew, and rows `m..k` are removed when it shrank.
//!
//! # Invariants
//!
//! 1. A row's old glyph is always destroyed before its replacement is
//!    created, so no row ever has two live glyphs.
//! 2. After a successful reconcile the visible set holds exactly one handle
//!    per frame row.
//! 3. Length mismatches between frames are never errors.
//!
//! # Failure Modes
//!
//! - Sink error mid-frame: the error is returned immediately. Rows already
//!   processed keep their new glyphs, the failing row is left empty, and
//!   rows not yet visited keep their old glyphs; the visible set always
//!   reflects what is attached.

use diagonal_core::{Frame, Line};

use crate::glyph::{Glyph, GlyphSink};
use crate::layout::{CharBudget, RowLayout};

/// Rendered glyph handles keyed by row index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleSet<H> {
    rows: Vec<Option<H>>,
}

impl<H> VisibleSet<H> {
    #[must_use]
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    /// Number of tracked rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows with an attached glyph.
    pub fn live(&self) -> usize {
        self.rows.iter().filter(|row| row.is_some()).count()
    }

    /// Handle attached at `row`.
    pub fn get(&self, row: usize) -> Option<&H> {
        self.rows.get(row).and_then(Option::as_ref)
    }

    /// Attached handles with their row index, top row first.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &H)> {
        self.rows
            .iter()
            .enumerate()
            .filter_map(|(row, handle)| handle.as_ref().map(|h| (row, h)))
    }
}

impl<H> Default for VisibleSet<H> {
    fn default() -> Self {
        Self::new()
    }
}

/// Glyph churn produced by one reconcile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub created: usize,
    pub destroyed: usize,
}

/// Applies frames to a sink through a row layout.
#[derive(Debug, Clone)]
pub struct Reconciler<L> {
    layout: L,
    budget: Option<CharBudget>,
}

impl<L: RowLayout> Reconciler<L> {
    #[must_use]
    pub fn new(layout: L) -> Self {
        Self {
            layout,
            budget: None,
        }
    }

    /// Truncate every glyph to a per-row character budget (builder pattern).
    #[must_use]
    pub fn with_budget(mut self, budget: CharBudget) -> Self {
        self.budget = Some(budget);
        self
    }

    #[inline]
    pub fn layout(&self) -> &L {
        &self.layout
    }

    /// Glyph for `line` on `row`.
    pub fn glyph<'a>(&self, row: usize, line: &'a Line) -> Glyph<'a> {
        let (x, y) = self.layout.position(row, line);
        let text = match self.budget {
            Some(budget) => budget.truncate(line.text(), row, line.indent()),
            None => line.text(),
        };
        Glyph {
            x,
            y,
            style: self.layout.style(),
            text,
        }
    }

    /// Bring `visible` in line with `frame`, then flush the sink.
    pub fn reconcile<S: GlyphSink>(
        &self,
        sink: &mut S,
        visible: &mut VisibleSet<S::Handle>,
        frame: &Frame,
    ) -> Result<ReconcileStats, S::Error> {
        let previous = visible.rows.len();
        let target = frame.len();
        let mut stats = ReconcileStats::default();

        if target > previous {
            visible.rows.resize_with(target, || None);
        }
        for row in 0..previous.max(target) {
            if let Some(stale) = visible.rows[row].take() {
                sink.destroy_glyph(stale)?;
                stats.destroyed += 1;
            }
            if let Some(line) = frame.get(row) {
                let handle = sink.create_glyph(&self.glyph(row, line))?;
                visible.rows[row] = Some(handle);
                stats.created += 1;
            }
        }
        visible.rows.truncate(target);
        sink.flush()?;

        tracing::trace!(
            style = self.layout.style(),
            rows = target,
            created = stats.created,
            destroyed = stats.destroyed,
            "reconciled frame"
        );
        Ok(stats)
    }

    /// Destroy every glyph in `visible`, returning how many were removed.
    pub fn clear<S: GlyphSink>(
        &self,
        sink: &mut S,
        visible: &mut VisibleSet<S::Handle>,
    ) -> Result<usize, S::Error> {
        self.reconcile(sink, visible, &Frame::default())
            .map(|stats| stats.destroyed)
    }
}

/// Render the first `rows` lines of `lines` once, truncated by `budget`.
///
/// This is the static, non-animated variant of a viewport.
pub fn paint_static<S: GlyphSink, L: RowLayout>(
    sink: &mut S,
    layout: L,
    budget: CharBudget,
    lines: &[Line],
    rows: usize,
) -> Result<VisibleSet<S::Handle>, S::Error> {
    let reconciler = Reconciler::new(layout).with_budget(budget);
    let frame: Frame = lines.iter().take(rows).cloned().collect();
    let mut visible = VisibleSet::new();
    reconciler.reconcile(sink, &mut visible, &frame)?;
    Ok(visible)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::RenderError;
    use crate::headless::{HeadlessSurface, SinkOp};
    use crate::layout::CodeLayout;

    fn frame(texts: &[&str]) -> Frame {
        texts.iter().map(|t| Line::prose(*t)).collect()
    }

    fn setup() -> (HeadlessSurface, crate::headless::HeadlessSink) {
        let surface = HeadlessSurface::new(["code"]);
        let sink = surface.container("code").unwrap();
        (surface, sink)
    }

    fn live_texts(surface: &HeadlessSurface) -> Vec<String> {
        surface
            .live("code")
            .into_iter()
            .map(|g| g.text)
            .collect()
    }

    #[test]
    fn first_frame_creates_every_row() {
        let (surface, mut sink) = setup();
        let reconciler = Reconciler::new(CodeLayout::default());
        let mut visible = VisibleSet::new();

        let stats = reconciler
            .reconcile(&mut sink, &mut visible, &frame(&["a", "b", "c"]))
            .unwrap();

        assert_eq!(stats, ReconcileStats { created: 3, destroyed: 0 });
        assert_eq!(visible.live(), 3);
        assert_eq!(live_texts(&surface), vec!["a", "b", "c"]);
    }

    #[test]
    fn same_length_frame_replaces_every_row() {
        let (surface, mut sink) = setup();
        let reconciler = Reconciler::new(CodeLayout::default());
        let mut visible = VisibleSet::new();
        reconciler
            .reconcile(&mut sink, &mut visible, &frame(&["a", "b"]))
            .unwrap();
        let before: Vec<_> = visible.iter().map(|(_, h)| *h).collect();

        let stats = reconciler
            .reconcile(&mut sink, &mut visible, &frame(&["b", "c"]))
            .unwrap();

        assert_eq!(stats, ReconcileStats { created: 2, destroyed: 2 });
        let after: Vec<_> = visible.iter().map(|(_, h)| *h).collect();
        assert!(before.iter().all(|h| !after.contains(h)));
        assert_eq!(live_texts(&surface), vec!["b", "c"]);
    }

    #[test]
    fn identical_rows_still_get_fresh_glyphs() {
        let (surface, mut sink) = setup();
        let reconciler = Reconciler::new(CodeLayout::default());
        let mut visible = VisibleSet::new();
        let same = frame(&["same", "same"]);

        reconciler.reconcile(&mut sink, &mut visible, &same).unwrap();
        let first: Vec<_> = visible.iter().map(|(_, h)| *h).collect();
        let stats = reconciler.reconcile(&mut sink, &mut visible, &same).unwrap();
        let second: Vec<_> = visible.iter().map(|(_, h)| *h).collect();

        assert_eq!(stats.created, 2);
        assert_eq!(stats.destroyed, 2);
        assert_ne!(first, second);
        assert_eq!(surface.live("code").len(), 2);
        assert_eq!(surface.collisions("code"), 0);
    }

    #[test]
    fn growing_frame_adds_rows_at_the_bottom() {
        let (surface, mut sink) = setup();
        let reconciler = Reconciler::new(CodeLayout::default());
        let mut visible = VisibleSet::new();
        reconciler
            .reconcile(&mut sink, &mut visible, &frame(&["a"]))
            .unwrap();

        let stats = reconciler
            .reconcile(&mut sink, &mut visible, &frame(&["a", "b", "c"]))
            .unwrap();

        assert_eq!(stats, ReconcileStats { created: 3, destroyed: 1 });
        assert_eq!(visible.len(), 3);
        assert_eq!(live_texts(&surface), vec!["a", "b", "c"]);
    }

    #[test]
    fn shrinking_frame_removes_trailing_rows() {
        let (surface, mut sink) = setup();
        let reconciler = Reconciler::new(CodeLayout::default());
        let mut visible = VisibleSet::new();
        reconciler
            .reconcile(&mut sink, &mut visible, &frame(&["a", "b", "c"]))
            .unwrap();

        let stats = reconciler
            .reconcile(&mut sink, &mut visible, &frame(&["x"]))
            .unwrap();

        assert_eq!(stats, ReconcileStats { created: 1, destroyed: 3 });
        assert_eq!(visible.len(), 1);
        assert_eq!(live_texts(&surface), vec!["x"]);
    }

    #[test]
    fn each_row_is_destroyed_before_its_replacement() {
        let (surface, mut sink) = setup();
        let reconciler = Reconciler::new(CodeLayout::default());
        let mut visible = VisibleSet::new();
        reconciler
            .reconcile(&mut sink, &mut visible, &frame(&["a", "b"]))
            .unwrap();
        let old: Vec<_> = visible.iter().map(|(_, h)| *h).collect();
        surface.take_ops("code");

        reconciler
            .reconcile(&mut sink, &mut visible, &frame(&["c", "d"]))
            .unwrap();

        let ops = surface.take_ops("code");
        assert_eq!(ops.len(), 4);
        assert_eq!(ops[0], SinkOp::Destroy(old[0]));
        assert!(matches!(&ops[1], SinkOp::Create(g) if g.text == "c"));
        assert_eq!(ops[2], SinkOp::Destroy(old[1]));
        assert!(matches!(&ops[3], SinkOp::Create(g) if g.text == "d"));
    }

    #[test]
    fn clear_removes_everything() {
        let (surface, mut sink) = setup();
        let reconciler = Reconciler::new(CodeLayout::default());
        let mut visible = VisibleSet::new();
        reconciler
            .reconcile(&mut sink, &mut visible, &frame(&["a", "b"]))
            .unwrap();

        assert_eq!(reconciler.clear(&mut sink, &mut visible).unwrap(), 2);
        assert!(visible.is_empty());
        assert!(surface.live("code").is_empty());
    }

    #[test]
    fn sink_failure_leaves_visible_set_consistent() {
        let (surface, mut sink) = setup();
        let reconciler = Reconciler::new(CodeLayout::default());
        let mut visible = VisibleSet::new();
        reconciler
            .reconcile(&mut sink, &mut visible, &frame(&["a", "b"]))
            .unwrap();
        surface.close("code");

        let err = reconciler
            .reconcile(&mut sink, &mut visible, &frame(&["c", "d"]))
            .unwrap_err();

        assert!(matches!(err, RenderError::Closed { .. }));
        assert_eq!(visible.live(), surface.live("code").len());
    }

    #[test]
    fn budget_truncates_glyph_text() {
        let reconciler = Reconciler::new(CodeLayout::default()).with_budget(CharBudget {
            base: 4.0,
            per_row: 1.0,
            per_indent: 1.0,
        });
        let line = Line::new("abcdef", 1);
        assert_eq!(reconciler.glyph(0, &line).text, "abc");
        assert_eq!(reconciler.glyph(2, &line).text, "a");
    }

    #[test]
    fn paint_static_renders_a_truncated_prefix() {
        let (surface, mut sink) = setup();
        let lines: Vec<Line> = (0..10).map(|i| Line::new("x".repeat(100), i % 3)).collect();

        let visible = paint_static(
            &mut sink,
            CodeLayout::default(),
            CharBudget::default(),
            &lines,
            4,
        )
        .unwrap();

        assert_eq!(visible.live(), 4);
        let widths: Vec<usize> = surface
            .live("code")
            .iter()
            .map(|g| g.text.chars().count())
            .collect();
        assert_eq!(widths, vec![80, 72, 65, 70]);
    }
}
