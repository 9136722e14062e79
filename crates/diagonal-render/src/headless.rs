#![forbid(unsafe_code)]

//! In-memory glyph sink.
//!
//! [`HeadlessSurface`] hosts any number of named containers and records every
//! glyph mutation. It backs the test suites and any host that wants to
//! inspect frames without a terminal.
//!
//! # Example
//!
//! ```
//! use diagonal_render::{Glyph, GlyphSink, HeadlessSurface};
//!
//! let surface = HeadlessSurface::new(["code", "writing"]);
//! let mut sink = surface.container("code").unwrap();
//! let id = sink
//!     .create_glyph(&Glyph { x: 1.0, y: 0.0, style: "code", text: "fn main() {" })
//!     .unwrap();
//! assert_eq!(surface.live("code").len(), 1);
//! sink.destroy_glyph(id).unwrap();
//! assert!(surface.live("code").is_empty());
//! assert!(surface.container("missing").is_err());
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::glyph::{Glyph, GlyphSink, RenderError};

/// Handle of a glyph attached to a headless container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlyphId(u64);

impl GlyphId {
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for GlyphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Snapshot of an attached glyph.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedGlyph {
    pub id: GlyphId,
    pub x: f32,
    pub y: f32,
    pub style: &'static str,
    pub text: String,
}

/// One recorded mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkOp {
    Create(RenderedGlyph),
    Destroy(GlyphId),
}

#[derive(Debug, Default)]
struct Container {
    live: BTreeMap<GlyphId, RenderedGlyph>,
    ops: Vec<SinkOp>,
    /// Creates that landed on a `y` already holding a live glyph.
    collisions: usize,
    closed: bool,
}

#[derive(Debug, Default)]
struct SurfaceState {
    next_id: u64,
    containers: BTreeMap<String, Container>,
}

/// Shared in-memory host for named containers.
///
/// Clones share state, so a test can keep one clone for inspection while
/// sinks mutate the containers.
#[derive(Debug, Clone, Default)]
pub struct HeadlessSurface {
    state: Arc<Mutex<SurfaceState>>,
}

impl HeadlessSurface {
    /// Create a surface with the given container names.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let containers = names
            .into_iter()
            .map(|name| (name.into(), Container::default()))
            .collect();
        Self {
            state: Arc::new(Mutex::new(SurfaceState {
                next_id: 0,
                containers,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SurfaceState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Resolve a sink bound to the named container.
    pub fn container(&self, name: &str) -> Result<HeadlessSink, RenderError> {
        if !self.lock().containers.contains_key(name) {
            return Err(RenderError::UnknownContainer {
                name: name.to_string(),
            });
        }
        Ok(HeadlessSink {
            state: Arc::clone(&self.state),
            container: name.to_string(),
        })
    }

    /// Live glyphs of a container, ordered by `y` then `x`.
    pub fn live(&self, name: &str) -> Vec<RenderedGlyph> {
        let mut glyphs: Vec<RenderedGlyph> = self
            .lock()
            .containers
            .get(name)
            .map(|c| c.live.values().cloned().collect())
            .unwrap_or_default();
        glyphs.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));
        glyphs
    }

    /// Every mutation recorded for a container.
    pub fn ops(&self, name: &str) -> Vec<SinkOp> {
        self.lock()
            .containers
            .get(name)
            .map(|c| c.ops.clone())
            .unwrap_or_default()
    }

    /// Drain the mutation log of a container.
    pub fn take_ops(&self, name: &str) -> Vec<SinkOp> {
        self.lock()
            .containers
            .get_mut(name)
            .map(|c| std::mem::take(&mut c.ops))
            .unwrap_or_default()
    }

    /// Number of creates that attached a glyph to an already occupied row.
    pub fn collisions(&self, name: &str) -> usize {
        self.lock()
            .containers
            .get(name)
            .map_or(0, |c| c.collisions)
    }

    /// Stop a container from accepting new glyphs. Destroying still works.
    pub fn close(&self, name: &str) {
        if let Some(container) = self.lock().containers.get_mut(name) {
            container.closed = true;
        }
    }
}

/// Sink bound to one container of a [`HeadlessSurface`].
#[derive(Debug, Clone)]
pub struct HeadlessSink {
    state: Arc<Mutex<SurfaceState>>,
    container: String,
}

impl HeadlessSink {
    /// Name of the container this sink writes to.
    pub fn name(&self) -> &str {
        &self.container
    }
}

impl GlyphSink for HeadlessSink {
    type Handle = GlyphId;
    type Error = RenderError;

    fn create_glyph(&mut self, glyph: &Glyph<'_>) -> Result<GlyphId, RenderError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let id = GlyphId(state.next_id);
        let container = state
            .containers
            .get_mut(&self.container)
            .ok_or_else(|| RenderError::UnknownContainer {
                name: self.container.clone(),
            })?;
        if container.closed {
            return Err(RenderError::Closed {
                name: self.container.clone(),
            });
        }
        if container.live.values().any(|g| g.y == glyph.y) {
            container.collisions += 1;
        }
        let rendered = RenderedGlyph {
            id,
            x: glyph.x,
            y: glyph.y,
            style: glyph.style,
            text: glyph.text.to_string(),
        };
        container.ops.push(SinkOp::Create(rendered.clone()));
        container.live.insert(id, rendered);
        state.next_id += 1;
        Ok(id)
    }

    fn destroy_glyph(&mut self, handle: GlyphId) -> Result<(), RenderError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let container = state
            .containers
            .get_mut(&self.container)
            .ok_or_else(|| RenderError::UnknownContainer {
                name: self.container.clone(),
            })?;
        if container.live.remove(&handle).is_none() {
            return Err(RenderError::UnknownGlyph {
                container: self.container.clone(),
                id: handle.get(),
            });
        }
        container.ops.push(SinkOp::Destroy(handle));
        Ok(())
    }
}
