#![forbid(unsafe_code)]

//! Crossterm-backed glyph sink.
//!
//! A [`TerminalSurface`] splits the screen into named [`Region`]s, one per
//! viewport. Glyph coordinates are cell offsets inside the region: `x` is
//! the column, `y` the row, both rounded to the nearest cell.
//!
//! # Invariants
//!
//! 1. Nothing is ever drawn outside a glyph's region. Text is clipped by
//!    display width, so wide characters never straddle the region edge.
//! 2. Destroying a glyph blanks exactly the cells its creation painted.
//!
//! # Failure Modes
//!
//! - Glyphs that land entirely outside their region still get a handle;
//!   they paint nothing and destroying them is a no-op.
//! - Write errors surface as [`RenderError::Io`].
//!
//! # Session lifecycle
//!
//! [`TerminalSurface::enter`] switches stdout to raw mode and the alternate
//! screen. The terminal is restored when the last clone of the surface (and
//! every sink resolved from it) is dropped, including during panic unwinding.

use std::collections::{BTreeMap, HashMap};
use std::io::{self, Stdout, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::{cursor, queue, terminal};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::glyph::{Glyph, GlyphSink, RenderError};

/// Rectangle of terminal cells owned by one container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Region {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Region {
    #[must_use]
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Split into a left and a right half separated by a one-cell gutter.
    #[must_use]
    pub fn split_columns(self) -> (Self, Self) {
        let left = self.width / 2;
        let gutter = u16::from(self.width > 1);
        let right = self.width.saturating_sub(left + gutter);
        (
            Self::new(self.x, self.y, left, self.height),
            Self::new(self.x + left + gutter, self.y, right, self.height),
        )
    }
}

/// Foreground color for a style tag.
fn style_color(style: &str) -> Option<Color> {
    match style {
        "code" => Some(Color::Green),
        "writing" => Some(Color::Grey),
        _ => None,
    }
}

/// Cells painted by one glyph.
#[derive(Debug, Clone, Copy)]
struct Painted {
    col: u16,
    row: u16,
    width: u16,
}

/// Restores the terminal on drop.
#[derive(Debug)]
struct Session;

impl Session {
    fn enter(out: &mut Stdout) -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        if let Err(err) = crossterm::execute!(
            out,
            terminal::EnterAlternateScreen,
            terminal::Clear(terminal::ClearType::All),
            cursor::Hide,
            cursor::MoveTo(0, 0)
        ) {
            let _ = terminal::disable_raw_mode();
            return Err(err);
        }
        tracing::debug!("terminal session entered");
        Ok(Self)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let mut stdout = io::stdout();
        let _ = crossterm::execute!(stdout, ResetColor, cursor::Show);
        let _ = crossterm::execute!(stdout, terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
        let _ = stdout.flush();
        tracing::debug!("terminal session restored");
    }
}

#[derive(Debug)]
struct SurfaceState<W> {
    out: W,
    regions: BTreeMap<String, Region>,
    painted: HashMap<u64, Option<Painted>>,
    next_id: u64,
    // Dropped after `out`.
    _session: Option<Session>,
}

/// Terminal host with named regions.
#[derive(Debug)]
pub struct TerminalSurface<W: Write> {
    state: Arc<Mutex<SurfaceState<W>>>,
}

impl<W: Write> Clone for TerminalSurface<W> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl TerminalSurface<Stdout> {
    /// Take over stdout: raw mode, alternate screen, hidden cursor.
    pub fn enter<I, S>(regions: I) -> Result<Self, RenderError>
    where
        I: IntoIterator<Item = (S, Region)>,
        S: Into<String>,
    {
        let mut out = io::stdout();
        let session = Session::enter(&mut out)?;
        Ok(Self::build(out, regions, Some(session)))
    }
}

impl<W: Write> TerminalSurface<W> {
    /// Draw into an arbitrary writer without touching terminal modes.
    pub fn with_writer<I, S>(out: W, regions: I) -> Self
    where
        I: IntoIterator<Item = (S, Region)>,
        S: Into<String>,
    {
        Self::build(out, regions, None)
    }

    fn build<I, S>(out: W, regions: I, session: Option<Session>) -> Self
    where
        I: IntoIterator<Item = (S, Region)>,
        S: Into<String>,
    {
        let regions = regions
            .into_iter()
            .map(|(name, region)| (name.into(), region))
            .collect();
        Self {
            state: Arc::new(Mutex::new(SurfaceState {
                out,
                regions,
                painted: HashMap::new(),
                next_id: 0,
                _session: session,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SurfaceState<W>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Region registered under `name`.
    pub fn region(&self, name: &str) -> Option<Region> {
        self.lock().regions.get(name).copied()
    }

    /// Resolve a sink bound to the named region.
    pub fn container(&self, name: &str) -> Result<TerminalSink<W>, RenderError> {
        let region = self
            .region(name)
            .ok_or_else(|| RenderError::UnknownContainer {
                name: name.to_string(),
            })?;
        Ok(TerminalSink {
            state: Arc::clone(&self.state),
            name: name.to_string(),
            region,
        })
    }

    /// Run `f` against the underlying writer.
    pub fn inspect<R>(&self, f: impl FnOnce(&W) -> R) -> R {
        f(&self.lock().out)
    }
}

/// Sink drawing into one region of a [`TerminalSurface`].
#[derive(Debug)]
pub struct TerminalSink<W: Write> {
    state: Arc<Mutex<SurfaceState<W>>>,
    name: String,
    region: Region,
}

impl<W: Write> TerminalSink<W> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn region(&self) -> Region {
        self.region
    }

    /// Clip `text` at cell `(x, y)` of the region.
    ///
    /// Returns the absolute position, the visible prefix and its width.
    fn clip<'a>(&self, x: f32, y: f32, text: &'a str) -> Option<(u16, u16, &'a str, u16)> {
        let (x, y) = (x.round(), y.round());
        if !x.is_finite() || !y.is_finite() || x < 0.0 || y < 0.0 {
            return None;
        }
        if y >= f32::from(self.region.height) || x >= f32::from(self.region.width) {
            return None;
        }
        let (col, row) = (x as u16, y as u16);
        let room = usize::from(self.region.width - col);

        let mut end = 0;
        let mut width = 0;
        for (offset, grapheme) in text.grapheme_indices(true) {
            let w = grapheme.width();
            if width + w > room {
                break;
            }
            width += w;
            end = offset + grapheme.len();
        }
        if width == 0 {
            return None;
        }
        let width = u16::try_from(width).unwrap_or(self.region.width);
        Some((
            self.region.x + col,
            self.region.y + row,
            &text[..end],
            width,
        ))
    }
}

impl<W: Write> GlyphSink for TerminalSink<W> {
    type Handle = u64;
    type Error = RenderError;

    fn create_glyph(&mut self, glyph: &Glyph<'_>) -> Result<u64, RenderError> {
        let clipped = self.clip(glyph.x, glyph.y, glyph.text);
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let id = state.next_id;
        state.next_id += 1;

        let painted = match clipped {
            Some((col, row, text, width)) => {
                let out = &mut state.out;
                queue!(out, cursor::MoveTo(col, row))?;
                match style_color(glyph.style) {
                    Some(color) => {
                        queue!(out, SetForegroundColor(color), Print(text), ResetColor)?;
                    }
                    None => queue!(out, Print(text))?,
                }
                Some(Painted { col, row, width })
            }
            None => None,
        };
        state.painted.insert(id, painted);
        Ok(id)
    }

    fn destroy_glyph(&mut self, handle: u64) -> Result<(), RenderError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let painted = state
            .painted
            .remove(&handle)
            .ok_or_else(|| RenderError::UnknownGlyph {
                container: self.name.clone(),
                id: handle,
            })?;
        if let Some(Painted { col, row, width }) = painted {
            let blank = " ".repeat(usize::from(width));
            queue!(state.out, cursor::MoveTo(col, row), Print(blank))?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), RenderError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface() -> TerminalSurface<Vec<u8>> {
        TerminalSurface::with_writer(Vec::new(), [("code", Region::new(2, 1, 10, 3))])
    }

    fn output(surface: &TerminalSurface<Vec<u8>>) -> String {
        surface.inspect(|out| String::from_utf8_lossy(out).into_owned())
    }

    fn glyph<'a>(x: f32, y: f32, text: &'a str) -> Glyph<'a> {
        Glyph {
            x,
            y,
            style: "plain",
            text,
        }
    }

    #[test]
    fn unknown_region_fails_at_resolution() {
        let surface = surface();
        assert!(matches!(
            surface.container("writing"),
            Err(RenderError::UnknownContainer { .. })
        ));
    }

    #[test]
    fn glyphs_are_offset_by_their_region() {
        let surface = surface();
        let mut sink = surface.container("code").unwrap();
        sink.create_glyph(&glyph(1.0, 2.0, "hi")).unwrap();
        sink.flush().unwrap();
        // MoveTo is zero-based; the escape sequence is one-based row;col.
        assert_eq!(output(&surface), "\u{1b}[4;4Hhi");
    }

    #[test]
    fn text_is_clipped_at_the_region_edge() {
        let surface = surface();
        let mut sink = surface.container("code").unwrap();
        sink.create_glyph(&glyph(6.0, 0.0, "abcdefgh")).unwrap();
        assert!(output(&surface).ends_with("abcd"));
    }

    #[test]
    fn wide_characters_never_straddle_the_edge() {
        let surface = surface();
        let mut sink = surface.container("code").unwrap();
        sink.create_glyph(&glyph(7.0, 0.0, "日本語")).unwrap();
        assert!(output(&surface).ends_with("日"));
    }

    #[test]
    fn off_region_glyphs_paint_nothing() {
        let surface = surface();
        let mut sink = surface.container("code").unwrap();
        let below = sink.create_glyph(&glyph(0.0, 3.0, "x")).unwrap();
        let right = sink.create_glyph(&glyph(10.0, 0.0, "x")).unwrap();
        let left = sink.create_glyph(&glyph(-1.0, 0.0, "x")).unwrap();
        assert!(output(&surface).is_empty());
        sink.destroy_glyph(below).unwrap();
        sink.destroy_glyph(right).unwrap();
        sink.destroy_glyph(left).unwrap();
        assert!(output(&surface).is_empty());
    }

    #[test]
    fn destroy_blanks_the_painted_cells() {
        let surface = surface();
        let mut sink = surface.container("code").unwrap();
        let id = sink.create_glyph(&glyph(0.0, 0.0, "日x")).unwrap();
        sink.destroy_glyph(id).unwrap();
        assert!(output(&surface).ends_with("\u{1b}[2;3H   "));
        assert!(matches!(
            sink.destroy_glyph(id),
            Err(RenderError::UnknownGlyph { .. })
        ));
    }

    #[test]
    fn styled_glyphs_reset_their_color() {
        let surface = surface();
        let mut sink = surface.container("code").unwrap();
        sink.create_glyph(&Glyph {
            x: 0.0,
            y: 0.0,
            style: "code",
            text: "fn",
        })
        .unwrap();
        let out = output(&surface);
        assert!(out.contains("fn"));
        assert!(out.ends_with("\u{1b}[0m"));
    }

    #[test]
    fn split_columns_leaves_a_gutter() {
        let (left, right) = Region::new(0, 0, 81, 24).split_columns();
        assert_eq!(left, Region::new(0, 0, 40, 24));
        assert_eq!(right, Region::new(41, 0, 40, 24));
        let (left, right) = Region::new(0, 0, 1, 1).split_columns();
        assert_eq!(left.width + right.width, 1);
    }
}
