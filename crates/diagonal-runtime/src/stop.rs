//! Cooperative stop signal for schedule loops.
//!
//! A [`StopHandle`] is held by whoever controls the animation (a key
//! handler, a test, a timeout); the loop holds a [`StopToken`]. Calling
//! [`StopHandle::stop`] wakes a pending [`StopToken::wait_timeout`]
//! immediately. Once the loop has returned it marks the token acknowledged,
//! after which no further operation runs.
//!
//! # Example
//!
//! ```
//! use diagonal_runtime::StopHandle;
//! use std::time::Duration;
//!
//! let handle = StopHandle::new();
//! let token = handle.token();
//!
//! let worker = std::thread::spawn(move || {
//!     while !token.wait_timeout(Duration::from_millis(5)) {
//!         // tick...
//!     }
//!     token.acknowledge();
//! });
//!
//! handle.stop();
//! worker.join().unwrap();
//! assert!(handle.is_acknowledged());
//! ```

#![forbid(unsafe_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use web_time::Duration;

struct StopInner {
    stopped: AtomicBool,
    acknowledged: AtomicBool,
    notify: (Mutex<()>, Condvar),
}

/// Control side of a stop signal.
///
/// Dropping the handle does **not** stop the loop; call [`stop`](Self::stop)
/// explicitly.
#[derive(Clone)]
pub struct StopHandle {
    inner: Arc<StopInner>,
}

/// Loop side of a stop signal.
#[derive(Clone)]
pub struct StopToken {
    inner: Arc<StopInner>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StopInner {
                stopped: AtomicBool::new(false),
                acknowledged: AtomicBool::new(false),
                notify: (Mutex::new(()), Condvar::new()),
            }),
        }
    }

    /// Token observing this handle.
    pub fn token(&self) -> StopToken {
        StopToken {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Request the loop to stop and wake any pending wait.
    pub fn stop(&self) {
        self.inner.stopped.store(true, Ordering::Release);
        let (lock, cvar) = &self.inner.notify;
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
        cvar.notify_all();
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::Acquire)
    }

    /// Whether the loop has observed the stop and returned.
    #[inline]
    pub fn is_acknowledged(&self) -> bool {
        self.inner.acknowledged.load(Ordering::Acquire)
    }
}

impl Default for StopHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StopHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StopHandle")
            .field("stopped", &self.is_stopped())
            .field("acknowledged", &self.is_acknowledged())
            .finish()
    }
}

impl StopToken {
    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::Acquire)
    }

    /// Mark the stop as observed. Loops call this on their way out.
    pub fn acknowledge(&self) {
        self.inner.acknowledged.store(true, Ordering::Release);
    }

    /// Block until a stop is requested or `duration` elapses.
    ///
    /// Returns `true` if stopped, `false` on timeout.
    pub fn wait_timeout(&self, duration: Duration) -> bool {
        if self.is_stopped() {
            return true;
        }
        let (lock, cvar) = &self.inner.notify;
        let mut guard = lock.lock().unwrap_or_else(|e| e.into_inner());
        let start = web_time::Instant::now();
        let mut remaining = duration;
        loop {
            if self.is_stopped() {
                return true;
            }
            let (new_guard, result) = cvar
                .wait_timeout(guard, remaining)
                .unwrap_or_else(|e| e.into_inner());
            guard = new_guard;
            if self.is_stopped() {
                return true;
            }
            if result.timed_out() {
                return false;
            }
            let elapsed = start.elapsed();
            if elapsed >= duration {
                return false;
            }
            remaining = duration - elapsed;
        }
    }
}

impl std::fmt::Debug for StopToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StopToken")
            .field("stopped", &self.is_stopped())
            .finish()
    }
}
