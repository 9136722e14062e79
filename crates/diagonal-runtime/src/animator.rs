#![forbid(unsafe_code)]

//! Window animators as schedules.
//!
//! An animator is a [`Schedule`] whose payload is an [`AnimatorState`] (the
//! sliding window plus the glyphs currently on screen) and whose operations
//! are:
//!
//! - **advance**: step the window and reconcile the emitted frame into the
//!   animator's sink;
//! - **check**: when the window is exhausted, reload it with the next
//!   document from the corpus. The visible glyphs are left alone.
//!
//! With [`Cadence::Alternating`] each tick runs one of the two, so the
//! screen changes every other tick. [`Cadence::Combined`] runs both on every
//! tick.
//!
//! # Invariants
//!
//! 1. The first document is picked when the animator is built, so an empty
//!    corpus fails at startup rather than on the first tick.
//! 2. A reload always completes before the next advance observes the
//!    window.
//! 3. Each animator exclusively owns its sink.

use diagonal_core::{CorpusError, DocumentSource, Window};
use diagonal_render::{GlyphSink, Reconciler, RowLayout, VisibleSet};
use web_time::Duration;

use crate::schedule::{Operation, Schedule};

/// How the advance and exhaustion-check operations share ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "lowercase"))]
pub enum Cadence {
    /// One operation per tick: advance, check, advance, ...
    #[default]
    Alternating,
    /// Advance then check on every tick.
    Combined,
}

impl std::str::FromStr for Cadence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "alternating" => Ok(Self::Alternating),
            "combined" => Ok(Self::Combined),
            other => Err(format!("unknown cadence `{other}`")),
        }
    }
}

/// Failure inside an animator operation.
#[derive(Debug, thiserror::Error)]
pub enum AnimatorError<E> {
    #[error(transparent)]
    Corpus(#[from] CorpusError),
    #[error("render failed: {0}")]
    Render(E),
    #[error("invalid animator schedule: {0}")]
    Schedule(String),
}

/// Payload threaded through an animator's operations.
#[derive(Debug, Clone)]
pub struct AnimatorState<H> {
    pub window: Window,
    pub visible: VisibleSet<H>,
}

/// Shape of one animator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimatorOptions {
    /// Window capacity in rows.
    pub rows: usize,
    pub interval: Duration,
    pub cadence: Cadence,
    /// Start from an empty window that fills one row per advance.
    pub fill: bool,
}

impl AnimatorOptions {
    #[must_use]
    pub fn new(rows: usize, interval: Duration) -> Self {
        Self {
            rows,
            interval,
            cadence: Cadence::default(),
            fill: false,
        }
    }

    #[must_use]
    pub fn with_cadence(mut self, cadence: Cadence) -> Self {
        self.cadence = cadence;
        self
    }

    #[must_use]
    pub fn with_fill(mut self, fill: bool) -> Self {
        self.fill = fill;
        self
    }
}

/// Schedule type produced by [`animator`].
pub type AnimatorSchedule<S> = Schedule<
    AnimatorState<<S as GlyphSink>::Handle>,
    AnimatorError<<S as GlyphSink>::Error>,
>;

/// Build an animator schedule named `name`.
pub fn animator<S, L, D>(
    name: &str,
    mut source: D,
    sink: S,
    reconciler: Reconciler<L>,
    options: AnimatorOptions,
) -> Result<AnimatorSchedule<S>, AnimatorError<S::Error>>
where
    S: GlyphSink + 'static,
    S::Handle: 'static,
    S::Error: 'static,
    L: RowLayout + 'static,
    D: DocumentSource + 'static,
{
    let document = source.pick_document()?;
    tracing::debug!(
        animator = name,
        document = document.name(),
        lines = document.len(),
        rows = options.rows,
        "animator starting"
    );
    let window = if options.fill {
        Window::filling(options.rows, document)
    } else {
        Window::new(options.rows, document)
    };
    let state = AnimatorState {
        window,
        visible: VisibleSet::new(),
    };

    let operations = match options.cadence {
        Cadence::Alternating => vec![
            advance_operation(sink, reconciler),
            check_operation(name.to_string(), source),
        ],
        Cadence::Combined => {
            let mut advance = advance_operation(sink, reconciler);
            let mut check = check_operation(name.to_string(), source);
            let both: Operation<AnimatorState<S::Handle>, AnimatorError<S::Error>> =
                Box::new(move |state| check(advance(state)?));
            vec![both]
        }
    };

    Schedule::new(name, state, options.interval, operations)
        .map_err(|err| AnimatorError::Schedule(err.to_string()))
}

/// Step the window and render the frame it emits.
fn advance_operation<S, L>(
    mut sink: S,
    reconciler: Reconciler<L>,
) -> Operation<AnimatorState<S::Handle>, AnimatorError<S::Error>>
where
    S: GlyphSink + 'static,
    S::Handle: 'static,
    S::Error: 'static,
    L: RowLayout + 'static,
{
    Box::new(move |mut state: AnimatorState<S::Handle>| {
        let (window, frame) = state.window.step();
        reconciler
            .reconcile(&mut sink, &mut state.visible, &frame)
            .map_err(AnimatorError::Render)?;
        state.window = window;
        Ok(state)
    })
}

/// Reload an exhausted window with the next document.
fn check_operation<H, E, D>(
    name: String,
    mut source: D,
) -> Operation<AnimatorState<H>, AnimatorError<E>>
where
    H: 'static,
    E: 'static,
    D: DocumentSource + 'static,
{
    Box::new(move |mut state: AnimatorState<H>| {
        if state.window.is_exhausted() {
            let document = source.pick_document()?;
            tracing::debug!(
                animator = %name,
                document = document.name(),
                lines = document.len(),
                "reloading window"
            );
            state.window = state.window.reload(document);
        }
        Ok(state)
    })
}
