#![forbid(unsafe_code)]

//! Cyclic operation schedules.
//!
//! A [`Schedule`] owns a payload and a non-empty list of operations. Every
//! tick hands the payload to the next operation in cyclic order and stores
//! the result as the new payload.
//!
//! # Invariants
//!
//! 1. Operations run strictly in order `0, 1, .., n-1, 0, ..`; none is ever
//!    skipped.
//! 2. The payload seen by a tick is exactly the value returned by the
//!    previous tick.
//! 3. The operation list and the interval are fixed at construction.
//!
//! # Failure Modes
//!
//! - An operation error drops the payload and stops the schedule; every
//!   later [`tick`](Schedule::tick) returns [`ScheduleError::Poisoned`].
//! - Construction fails fast on an empty operation list or a zero interval.

use std::fmt;

use web_time::Duration;

use crate::stop::StopToken;

/// One step of a schedule: consumes the payload and returns the next one.
pub type Operation<P, E> = Box<dyn FnMut(P) -> Result<P, E>>;

/// Errors raised by schedules.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError<E> {
    #[error("schedule `{name}` has no operations")]
    NoOperations { name: String },
    #[error("schedule `{name}` has a zero interval")]
    ZeroInterval { name: String },
    /// An operation failed; the schedule is stopped.
    #[error("schedule `{name}` failed in operation {index}")]
    Operation {
        name: String,
        index: usize,
        #[source]
        source: E,
    },
    /// A tick was requested after an earlier failure.
    #[error("schedule `{name}` stopped after an earlier failure")]
    Poisoned { name: String },
}

impl<E> ScheduleError<E> {
    /// Name of the schedule that raised the error.
    pub fn schedule(&self) -> &str {
        match self {
            Self::NoOperations { name }
            | Self::ZeroInterval { name }
            | Self::Operation { name, .. }
            | Self::Poisoned { name } => name,
        }
    }
}

/// Something a [`Driver`](crate::Driver) can tick.
pub trait Scheduled {
    type Error;

    fn name(&self) -> &str;

    /// Delay between the end of one tick and the start of the next.
    fn interval(&self) -> Duration;

    fn tick(&mut self) -> Result<(), Self::Error>;
}

/// A payload threaded through a cyclic list of operations.
pub struct Schedule<P, E> {
    name: String,
    payload: Option<P>,
    interval: Duration,
    operations: Vec<Operation<P, E>>,
    index: usize,
    ticks: u64,
}

impl<P, E> Schedule<P, E> {
    /// Create a schedule. Nothing runs until the first tick.
    pub fn new(
        name: impl Into<String>,
        payload: P,
        interval: Duration,
        operations: Vec<Operation<P, E>>,
    ) -> Result<Self, ScheduleError<E>> {
        let name = name.into();
        if operations.is_empty() {
            return Err(ScheduleError::NoOperations { name });
        }
        if interval.is_zero() {
            return Err(ScheduleError::ZeroInterval { name });
        }
        Ok(Self {
            name,
            payload: Some(payload),
            interval,
            operations,
            index: 0,
            ticks: 0,
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Index of the operation the next tick will run.
    #[inline]
    pub fn next_operation(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }

    /// Number of completed ticks.
    #[inline]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Current payload, or `None` once an operation has failed.
    pub fn payload(&self) -> Option<&P> {
        self.payload.as_ref()
    }

    pub fn into_payload(self) -> Option<P> {
        self.payload
    }

    /// Run the next operation on the payload.
    pub fn tick(&mut self) -> Result<(), ScheduleError<E>> {
        let Some(payload) = self.payload.take() else {
            return Err(ScheduleError::Poisoned {
                name: self.name.clone(),
            });
        };
        let index = self.index;
        match (self.operations[index])(payload) {
            Ok(next) => {
                self.payload = Some(next);
                self.index = (index + 1) % self.operations.len();
                self.ticks += 1;
                tracing::trace!(schedule = %self.name, operation = index, tick = self.ticks, "tick");
                Ok(())
            }
            Err(source) => {
                tracing::debug!(schedule = %self.name, operation = index, "operation failed");
                Err(ScheduleError::Operation {
                    name: self.name.clone(),
                    index,
                    source,
                })
            }
        }
    }

    /// Wait `interval`, tick, repeat until `stop` fires or an operation fails.
    ///
    /// The stop is acknowledged on every exit path.
    pub fn run(&mut self, stop: &StopToken) -> Result<(), ScheduleError<E>> {
        let span = tracing::debug_span!("schedule", name = %self.name);
        let _enter = span.enter();
        tracing::debug!(interval_ms = self.interval.as_millis() as u64, "schedule started");

        let result = loop {
            if stop.wait_timeout(self.interval) {
                break Ok(());
            }
            if let Err(err) = self.tick() {
                break Err(err);
            }
        };
        stop.acknowledge();
        tracing::debug!(ticks = self.ticks, ok = result.is_ok(), "schedule stopped");
        result
    }
}

impl<P, E> Scheduled for Schedule<P, E> {
    type Error = ScheduleError<E>;

    fn name(&self) -> &str {
        &self.name
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn tick(&mut self) -> Result<(), ScheduleError<E>> {
        Schedule::tick(self)
    }
}

impl<P: fmt::Debug, E> fmt::Debug for Schedule<P, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schedule")
            .field("name", &self.name)
            .field("interval", &self.interval)
            .field("operations", &self.operations.len())
            .field("index", &self.index)
            .field("ticks", &self.ticks)
            .field("payload", &self.payload)
            .finish()
    }
}
