//! Proximity-reactive signaling controller
//!
//! RangeGuard measures the distance to a subject with a time-of-flight
//! acoustic ranging sensor, classifies successive readings into a motion
//! direction, and drives a tiered visual indicator accordingly.
//!
//! The crate is built from two cooperating pieces:
//!
//! - [`hcsr04::HcSr04`]: the ranging driver. Generates a precisely timed
//!   trigger pulse, measures the echo pulse width against a bounded deadline,
//!   and converts elapsed time to distance with a temperature-compensated
//!   speed-of-sound model.
//! - [`monitor::ProximityMonitor`]: the state machine. Polls the driver once
//!   per cycle, derives a motion direction from distance deltas with
//!   hysteresis thresholds, and issues indicator tier commands across its
//!   state transitions, including a latched terminal fault state.
//!
//! Key constraints:
//! - Runs on bare-metal targets; no heap allocation
//! - Single execution context, no internal concurrency
//! - Worst-case blocking per measurement bounded by the configured range
//!
//! ```no_run
//! use rangeguard::{ProximityConfig, ProximityMonitor};
//! use rangeguard::mock::{MockIndicator, MockRangeSensor};
//! use rangeguard::time::SimClock;
//!
//! let sensor = MockRangeSensor::new();
//! let indicator = MockIndicator::new();
//! let clock = SimClock::new(0);
//!
//! let mut monitor = ProximityMonitor::new(
//!     sensor,
//!     indicator,
//!     clock,
//!     ProximityConfig::default(),
//! ).expect("thresholds are ordered");
//!
//! // One call per period from the cyclic caller.
//! monitor.update().ok();
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod acoustics;
pub mod constants;
pub mod errors;
pub mod hcsr04;
pub mod indicator;
pub mod mock;
pub mod monitor;
pub mod time;
pub mod traits;

// Public API
pub use errors::{ControlError, DriverError, DriverResult};
pub use hcsr04::{HcSr04, SensorConfig};
pub use indicator::{IndicatorConfig, LedIndicator};
pub use monitor::{ProximityConfig, ProximityMonitor};
pub use time::{Clock, Timestamp};
pub use traits::{
    Indicator, MotionDirection, OperatingState, Polarity, RangeSample, RangeSensor, Tier,
};

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
