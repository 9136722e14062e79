#![forbid(unsafe_code)]

//! Single-threaded multiplexer for several schedules.
//!
//! The [`Driver`] keeps one deadline per schedule and sleeps until the
//! earliest one. Schedules keep their own interval, so two animators with
//! different cadences drift independently without extra threads.
//!
//! # How it works
//!
//! 1. A schedule added to the driver becomes due one interval after it was
//!    added.
//! 2. [`Driver::poll`] ticks every due schedule once, in insertion order,
//!    and re-arms each at `completion + interval` (timer re-arm semantics:
//!    a slow tick delays its own next tick, never the others).
//! 3. [`Driver::run`] alternates `poll` with an interruptible wait for the
//!    returned delay until the stop token fires.
//!
//! All time comes from a [`Clock`], so tests drive the loop with a
//! [`ManualClock`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use web_time::{Duration, Instant};

use crate::schedule::Scheduled;
use crate::stop::StopToken;

/// Monotonic time source.
pub trait Clock {
    /// Elapsed time since an unspecified epoch, monotonically increasing.
    fn now_mono(&self) -> Duration;
}

/// Wall-clock time measured from the clock's creation.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_mono(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-advanced clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        let by = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        self.nanos.fetch_add(by, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_mono(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_mono(&self) -> Duration {
        (**self).now_mono()
    }
}

struct Slot<E> {
    schedule: Box<dyn Scheduled<Error = E>>,
    due: Duration,
    ticks: u64,
}

/// Cooperative scheduler for schedules sharing an error type.
pub struct Driver<E, C = SystemClock> {
    clock: C,
    slots: Vec<Slot<E>>,
}

impl<E> Driver<E, SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock::new())
    }
}

impl<E> Default for Driver<E, SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E, C: Clock> Driver<E, C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            slots: Vec::new(),
        }
    }

    /// Add a schedule; it first becomes due one interval from now.
    pub fn add(&mut self, schedule: impl Scheduled<Error = E> + 'static) {
        let due = self.clock.now_mono() + schedule.interval();
        tracing::debug!(schedule = schedule.name(), "schedule added");
        self.slots.push(Slot {
            schedule: Box::new(schedule),
            due,
            ticks: 0,
        });
    }

    /// Builder form of [`add`](Self::add).
    #[must_use]
    pub fn with_schedule(mut self, schedule: impl Scheduled<Error = E> + 'static) -> Self {
        self.add(schedule);
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Ticks run so far by the schedule named `name`.
    pub fn ticks(&self, name: &str) -> Option<u64> {
        self.slots
            .iter()
            .find(|slot| slot.schedule.name() == name)
            .map(|slot| slot.ticks)
    }

    /// Tick every due schedule once.
    ///
    /// Returns the delay until the next deadline, or `None` when the driver
    /// holds no schedules. The first failing schedule aborts the poll.
    pub fn poll(&mut self) -> Result<Option<Duration>, E> {
        let now = self.clock.now_mono();
        for slot in &mut self.slots {
            if slot.due > now {
                continue;
            }
            slot.schedule.tick()?;
            slot.ticks += 1;
            slot.due = self.clock.now_mono() + slot.schedule.interval();
        }

        let now = self.clock.now_mono();
        Ok(self
            .slots
            .iter()
            .map(|slot| slot.due.saturating_sub(now))
            .min())
    }

    /// Poll and wait until `stop` fires or a schedule fails.
    ///
    /// An empty driver returns immediately. The stop is acknowledged on
    /// every exit path.
    pub fn run(&mut self, stop: &StopToken) -> Result<(), E> {
        let span = tracing::debug_span!("driver", schedules = self.slots.len());
        let _enter = span.enter();
        tracing::debug!("driver started");

        let result = loop {
            if stop.is_stopped() {
                break Ok(());
            }
            match self.poll() {
                Ok(Some(delay)) => {
                    if stop.wait_timeout(delay) {
                        break Ok(());
                    }
                }
                Ok(None) => break Ok(()),
                Err(err) => break Err(err),
            }
        };
        stop.acknowledge();
        tracing::debug!(ok = result.is_ok(), "driver stopped");
        result
    }
}

impl<E, C> std::fmt::Debug for Driver<E, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field(
                "schedules",
                &self
                    .slots
                    .iter()
                    .map(|slot| slot.schedule.name())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{Operation, Schedule, ScheduleError};
    use crate::stop::StopHandle;

    type TestError = ScheduleError<String>;

    fn counter(name: &str, interval_ms: u64) -> Schedule<u32, String> {
        let inc: Operation<u32, String> = Box::new(|n| Ok(n + 1));
        Schedule::new(name, 0, Duration::from_millis(interval_ms), vec![inc]).unwrap()
    }

    #[test]
    fn nothing_runs_before_the_first_interval() {
        let clock = ManualClock::new();
        let mut driver: Driver<TestError, _> =
            Driver::with_clock(clock.clone()).with_schedule(counter("a", 100));
        assert_eq!(driver.poll().unwrap(), Some(Duration::from_millis(100)));
        assert_eq!(driver.ticks("a"), Some(0));
    }

    #[test]
    fn schedules_tick_at_their_own_cadence() {
        let clock = ManualClock::new();
        let mut driver: Driver<TestError, _> = Driver::with_clock(clock.clone())
            .with_schedule(counter("fast", 100))
            .with_schedule(counter("slow", 250));

        for _ in 0..10 {
            clock.advance(Duration::from_millis(50));
            driver.poll().unwrap();
        }

        assert_eq!(driver.ticks("fast"), Some(5));
        assert_eq!(driver.ticks("slow"), Some(2));
        assert_eq!(driver.ticks("missing"), None);
    }

    #[test]
    fn poll_reports_the_earliest_deadline() {
        let clock = ManualClock::new();
        let mut driver: Driver<TestError, _> = Driver::with_clock(clock.clone())
            .with_schedule(counter("fast", 100))
            .with_schedule(counter("slow", 250));
        clock.advance(Duration::from_millis(100));
        assert_eq!(driver.poll().unwrap(), Some(Duration::from_millis(100)));
        clock.advance(Duration::from_millis(90));
        assert_eq!(driver.poll().unwrap(), Some(Duration::from_millis(10)));
    }

    #[test]
    fn late_polls_rearm_from_completion() {
        let clock = ManualClock::new();
        let mut driver: Driver<TestError, _> =
            Driver::with_clock(clock.clone()).with_schedule(counter("a", 100));
        clock.advance(Duration::from_millis(340));
        assert_eq!(driver.poll().unwrap(), Some(Duration::from_millis(100)));
        assert_eq!(driver.ticks("a"), Some(1));
    }

    #[test]
    fn empty_driver_has_no_deadline() {
        let mut driver: Driver<TestError> = Driver::new();
        assert!(driver.is_empty());
        assert_eq!(driver.poll().unwrap(), None);
        let handle = StopHandle::new();
        driver.run(&handle.token()).unwrap();
        assert!(handle.is_acknowledged());
    }

    #[test]
    fn failing_schedule_aborts_the_run() {
        let fail: Operation<u32, String> = Box::new(|_| Err("boom".into()));
        let broken = Schedule::new("broken", 0, Duration::from_millis(1), vec![fail]).unwrap();
        let mut driver: Driver<TestError> = Driver::new().with_schedule(broken);
        let handle = StopHandle::new();
        let err = driver.run(&handle.token()).unwrap_err();
        assert_eq!(err.schedule(), "broken");
        assert!(handle.is_acknowledged());
    }

    #[test]
    fn stop_before_run_ticks_nothing() {
        let mut driver: Driver<TestError> = Driver::new().with_schedule(counter("a", 1));
        let handle = StopHandle::new();
        handle.stop();
        driver.run(&handle.token()).unwrap();
        assert_eq!(driver.ticks("a"), Some(0));
        assert!(handle.is_acknowledged());
    }
}
