//! Time capability for drivers and the state machine
//!
//! Both halves of the crate consume time through the [`Clock`] trait rather
//! than a platform API: the ranging driver busy-polls against microsecond
//! deadlines and the state machine measures millisecond motion intervals.
//! Injecting the clock keeps every timeout path deterministic under test -
//! see [`SimClock`].
//!
//! Implementations:
//! - [`SystemClock`]: host monotonic clock (requires `std`)
//! - [`SimClock`]: controllable simulated time for testing (requires `std`)
//!
//! Bare-metal targets implement [`Clock`] over a hardware timer peripheral;
//! the driver only needs microsecond reads and a blocking microsecond delay.

/// Timestamp in microseconds since an arbitrary origin (typically boot).
pub type Timestamp = u64;

/// Source of monotonic time plus a bounded blocking delay.
///
/// ## Implementation Requirements
///
/// - `now_us()` must be monotonic; the drivers subtract timestamps.
/// - `delay_us()` must block for at least the requested duration.
/// - Wraparound is not handled here; a `u64` microsecond counter outlives
///   any realistic device uptime.
pub trait Clock {
    /// Current timestamp in microseconds.
    fn now_us(&mut self) -> Timestamp;

    /// Block for at least `us` microseconds.
    fn delay_us(&mut self, us: u32);

    /// Current timestamp in milliseconds.
    fn now_ms(&mut self) -> u64 {
        self.now_us() / 1_000
    }
}

/// Host clock backed by [`std::time::Instant`].
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl SystemClock {
    /// Create a clock whose origin is "now".
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Clock for SystemClock {
    fn now_us(&mut self) -> Timestamp {
        self.origin.elapsed().as_micros() as Timestamp
    }

    fn delay_us(&mut self, us: u32) {
        std::thread::sleep(std::time::Duration::from_micros(u64::from(us)));
    }
}

/// Simulated clock for deterministic testing.
///
/// Clones share the same underlying time, so a test can hand one handle to
/// the component under test and keep another to advance or inspect time.
///
/// Every `now_us()` call auto-advances time by a configurable tick. Busy-poll
/// loops that would otherwise spin forever against frozen time terminate, and
/// the tick models the real cost of a poll iteration. `delay_us()` jumps time
/// forward without blocking.
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct SimClock {
    inner: std::rc::Rc<std::cell::RefCell<SimClockInner>>,
}

#[cfg(feature = "std")]
#[derive(Debug)]
struct SimClockInner {
    now_us: Timestamp,
    tick_us: u64,
}

#[cfg(feature = "std")]
impl SimClock {
    /// Create a simulated clock starting at `start_us` with a 1 µs poll tick.
    pub fn new(start_us: Timestamp) -> Self {
        Self::with_tick(start_us, 1)
    }

    /// Create a simulated clock with an explicit per-poll tick.
    pub fn with_tick(start_us: Timestamp, tick_us: u64) -> Self {
        Self {
            inner: std::rc::Rc::new(std::cell::RefCell::new(SimClockInner {
                now_us: start_us,
                tick_us,
            })),
        }
    }

    /// Read the current time without advancing it.
    pub fn peek_us(&self) -> Timestamp {
        self.inner.borrow().now_us
    }

    /// Jump time forward by `us` microseconds.
    pub fn advance_us(&self, us: u64) {
        self.inner.borrow_mut().now_us += us;
    }

    /// Jump time forward by `ms` milliseconds.
    pub fn advance_ms(&self, ms: u64) {
        self.advance_us(ms * 1_000);
    }
}

#[cfg(feature = "std")]
impl Clock for SimClock {
    fn now_us(&mut self) -> Timestamp {
        let mut inner = self.inner.borrow_mut();
        let now = inner.now_us;
        inner.now_us += inner.tick_us;
        now
    }

    fn delay_us(&mut self, us: u32) {
        self.inner.borrow_mut().now_us += u64::from(us);
    }
}
