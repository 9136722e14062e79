#![forbid(unsafe_code)]

//! Glyphs and the renderer boundary.
//!
//! A [`GlyphSink`] is the output half of a viewport: it attaches a text
//! glyph at a position inside one container and later detaches it by
//! handle. Sinks are bound to a single container when the host resolves
//! them at startup, so the reconciler never names containers itself.

use core::fmt;

/// One positioned run of text, ready to be attached to a container.
///
/// Coordinates are in the sink's native unit system (terminal cells for the
/// terminal sink, anything for the headless sink).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph<'a> {
    pub x: f32,
    pub y: f32,
    /// Style tag the host maps to a visual treatment (`"code"`, `"writing"`).
    pub style: &'static str,
    pub text: &'a str,
}

/// Renderer boundary: create and destroy glyphs in one container.
pub trait GlyphSink {
    /// Handle identifying an attached glyph.
    type Handle;

    /// Platform-specific error type.
    type Error: fmt::Debug + fmt::Display;

    /// Attach a glyph and return its handle.
    fn create_glyph(&mut self, glyph: &Glyph<'_>) -> Result<Self::Handle, Self::Error>;

    /// Detach a previously created glyph.
    fn destroy_glyph(&mut self, handle: Self::Handle) -> Result<(), Self::Error>;

    /// Make the mutations of the current frame visible.
    ///
    /// Called once after each reconcile. Sinks that apply mutations
    /// immediately keep the default.
    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl<S: GlyphSink + ?Sized> GlyphSink for &mut S {
    type Handle = S::Handle;
    type Error = S::Error;

    fn create_glyph(&mut self, glyph: &Glyph<'_>) -> Result<Self::Handle, Self::Error> {
        (**self).create_glyph(glyph)
    }

    fn destroy_glyph(&mut self, handle: Self::Handle) -> Result<(), Self::Error> {
        (**self).destroy_glyph(handle)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        (**self).flush()
    }
}

impl<S: GlyphSink + ?Sized> GlyphSink for Box<S> {
    type Handle = S::Handle;
    type Error = S::Error;

    fn create_glyph(&mut self, glyph: &Glyph<'_>) -> Result<Self::Handle, Self::Error> {
        (**self).create_glyph(glyph)
    }

    fn destroy_glyph(&mut self, handle: Self::Handle) -> Result<(), Self::Error> {
        (**self).destroy_glyph(handle)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        (**self).flush()
    }
}

/// Errors raised by the bundled sinks.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The host has no container with this name.
    #[error("no container named `{name}`")]
    UnknownContainer { name: String },
    /// The container was closed and no longer accepts glyphs.
    #[error("container `{name}` is closed")]
    Closed { name: String },
    /// A handle did not refer to a live glyph.
    #[error("glyph {id} is not attached to `{container}`")]
    UnknownGlyph { container: String, id: u64 },
    /// I/O failure while presenting.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
