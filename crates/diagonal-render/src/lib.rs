#![forbid(unsafe_code)]

//! Render layer: glyph sinks, row layouts, and the glyph reconciler.
//!
//! # Role in Diagonal
//! `diagonal-render` turns a [`Frame`](diagonal_core::Frame) of lines into
//! positioned text glyphs inside a named container, replacing the previous
//! frame's glyphs without ever attaching two glyphs to the same row.
//!
//! # Primary responsibilities
//! - **GlyphSink**: the renderer boundary. The core only creates and
//!   destroys glyphs; everything else belongs to the host.
//! - **Layouts**: row/indent to position mapping for the code viewport
//!   (diagonal, indent-driven) and the prose viewport (bottom-up).
//! - **Reconciler**: per-row destroy-then-create diff between frames.
//! - **Sinks**: an in-memory [`headless`] sink for tests and tooling, and a
//!   Crossterm-backed `terminal` sink behind the `crossterm` feature.
//!
//! # How it fits in the system
//! `diagonal-runtime` owns one reconciler and one sink per viewport and
//! calls [`Reconciler::reconcile`] on every render tick.

pub mod glyph;
pub mod headless;
pub mod layout;
pub mod reconcile;
#[cfg(feature = "crossterm")]
pub mod terminal;

pub use glyph::{Glyph, GlyphSink, RenderError};
pub use headless::{GlyphId, HeadlessSink, HeadlessSurface, RenderedGlyph, SinkOp};
pub use layout::{CharBudget, CodeLayout, ProseLayout, RowLayout};
pub use reconcile::{ReconcileStats, Reconciler, VisibleSet, paint_static};
#[cfg(feature = "crossterm")]
pub use terminal::{Region, TerminalSink, TerminalSurface};
