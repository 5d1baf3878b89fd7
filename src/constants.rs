//! Physical Constants and Sensor Defaults
//!
//! This module defines the acoustic model constants and the HC-SR04
//! datasheet defaults used throughout the crate. Values are based on
//! established physics and the sensor manufacturer's specification.

// ===== ACOUSTIC MODEL =====

/// Speed of sound in dry air at 0 °C (m/s).
///
/// Base term of the linear temperature-compensation model
/// `c(T) = 331.4 + 0.6 * T(°C)`.
///
/// Source: ISO 9613-1:1993
pub const SPEED_OF_SOUND_0C_M_PER_S: f32 = 331.4;

/// Increase of the speed of sound per degree Celsius (m/s·°C).
///
/// Slope term of the linear temperature-compensation model, valid over the
/// full operating range of commodity acoustic sensors.
///
/// Source: ISO 9613-1:1993
pub const SPEED_OF_SOUND_SLOPE_M_PER_S_PER_C: f32 = 0.6;

/// Default ambient temperature in deci-degrees Celsius (20.0 °C).
///
/// Used when a caller measures without supplying a temperature. Deci-degrees
/// keep the public API integer-friendly on targets without an FPU.
pub const DEFAULT_AMBIENT_TEMP_DECI_C: i16 = 200;

// ===== HC-SR04 DEFAULTS =====

/// Minimum trigger pulse duration for the HC-SR04 (µs).
///
/// The module requires at least a 10 µs active trigger pulse to emit its
/// 8-cycle 40 kHz burst.
///
/// Source: HC-SR04 datasheet
pub const HCSR04_MIN_TRIGGER_PULSE_US: u32 = 10;

/// Minimum distance the HC-SR04 can resolve (mm).
///
/// Below ~2 cm the echo overlaps the transmit burst and readings are
/// unreliable.
///
/// Source: HC-SR04 datasheet
pub const HCSR04_MIN_DISTANCE_MM: u32 = 20;

/// Maximum distance the HC-SR04 can detect (mm).
///
/// Bounds the echo-wait deadline; anything farther cannot produce a valid
/// echo and reports as a timeout.
///
/// Source: HC-SR04 datasheet
pub const HCSR04_MAX_DISTANCE_MM: u32 = 4_000;

// ===== INDICATOR =====

/// Dwell time per tier during the indicator self-test (ms).
///
/// Long enough for a human to confirm each LED visually during bring-up.
pub const SELF_TEST_STEP_MS: u32 = 500;
