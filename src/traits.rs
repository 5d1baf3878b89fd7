//! Core traits and shared types
//!
//! The sensor and indicator are modeled as traits so concrete hardware
//! drivers and test doubles are interchangeable at construction time -
//! dependency injection, never runtime type inspection. Keep the traits
//! small: the state machine only ever pulls one sample and pushes one tier
//! command per cycle.

use core::fmt;

use crate::constants::DEFAULT_AMBIENT_TEMP_DECI_C;
use crate::errors::DriverResult;

/// Active level of a digital signal line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    /// The signal is asserted when the line is high.
    ActiveHigh,
    /// The signal is asserted when the line is low.
    ActiveLow,
}

impl Polarity {
    /// The electrical level corresponding to "asserted".
    pub fn active_level(self) -> bool {
        matches!(self, Polarity::ActiveHigh)
    }
}

/// One distance reading, or an explicit "no echo observed" outcome.
///
/// Never a numeric sentinel: a missing target is kept out of the motion
/// delta arithmetic entirely, so a subject vanishing from range cannot
/// register as a large spurious movement. Produced and consumed within a
/// single update cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RangeSample {
    /// A measured distance in millimeters.
    Distance(u32),
    /// No valid echo within the range-derived deadline.
    NoTarget,
}

impl RangeSample {
    /// The measured distance, if a target was seen.
    pub fn distance_mm(self) -> Option<u32> {
        match self {
            RangeSample::Distance(mm) => Some(mm),
            RangeSample::NoTarget => None,
        }
    }
}

/// Indicator output tier, selected from distance thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Tier {
    /// All outputs off.
    Off,
    /// Nearest tier (red on a traffic-light layout).
    Near,
    /// Near-medium tier (yellow).
    Medium,
    /// Far tier (green).
    Far,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Tier::Off => "Off",
            Tier::Near => "Near",
            Tier::Medium => "Medium",
            Tier::Far => "Far",
        })
    }
}

/// Motion direction derived from successive samples.
///
/// Recomputed every cycle; never persisted beyond the current cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionDirection {
    /// No movement beyond the hysteresis thresholds.
    Stationary,
    /// Distance decreasing: the subject is closing in.
    Approaching,
    /// Distance increasing: the subject is moving away.
    Retreating,
}

impl fmt::Display for MotionDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MotionDirection::Stationary => "Stationary",
            MotionDirection::Approaching => "Approaching",
            MotionDirection::Retreating => "Retreating",
        })
    }
}

/// Operating state of the proximity state machine.
///
/// `Fault` is terminal: once latched, any further update is a caller
/// contract violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OperatingState {
    /// Not yet constructed/configured.
    #[default]
    Uninitialized,
    /// Running the indicator self-test on the first update.
    Initializing,
    /// No motion; indicator off.
    Idle,
    /// Subject moving toward the sensor.
    Approaching,
    /// Subject moving away from the sensor.
    Retreating,
    /// Terminal fault, latched.
    Fault,
}

impl fmt::Display for OperatingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OperatingState::Uninitialized => "Uninitialized",
            OperatingState::Initializing => "Initializing",
            OperatingState::Idle => "Idle",
            OperatingState::Approaching => "Approaching",
            OperatingState::Retreating => "Retreating",
            OperatingState::Fault => "Fault",
        })
    }
}

/// A distance-ranging sensor.
///
/// Implemented by [`crate::hcsr04::HcSr04`] for real hardware and
/// [`crate::mock::MockRangeSensor`] for tests.
pub trait RangeSensor {
    /// Measure the distance to the nearest target in millimeters,
    /// compensated for the ambient temperature in deci-degrees Celsius.
    ///
    /// Returns [`crate::errors::DriverError::Timeout`] when no echo arrives
    /// within the deadline derived from the configured maximum range.
    fn measure(&mut self, ambient_temp_deci_c: i16) -> DriverResult<u32>;

    /// Measure assuming a 20.0 °C ambient temperature.
    fn measure_default(&mut self) -> DriverResult<u32> {
        self.measure(DEFAULT_AMBIENT_TEMP_DECI_C)
    }
}

/// A tiered visual indicator.
///
/// Implemented by [`crate::indicator::LedIndicator`] for discrete LEDs and
/// [`crate::mock::MockIndicator`] for tests.
pub trait Indicator {
    /// Illuminate exactly the given tier (or everything off).
    fn set_tier(&mut self, tier: Tier) -> DriverResult<()>;

    /// Exercise every output once, ending with everything off.
    fn self_test(&mut self) -> DriverResult<()>;
}
