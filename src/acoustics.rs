//! Temperature-compensated acoustic conversions
//!
//! Pure closed-form conversions between echo round-trip time and target
//! distance. An echo travels to the target and back, so the one-way distance
//! uses half the speed of sound.
//!
//! Temperatures are deci-degrees Celsius throughout (one tenth of a degree),
//! matching the integer-friendly sensor API.

use crate::constants::{SPEED_OF_SOUND_0C_M_PER_S, SPEED_OF_SOUND_SLOPE_M_PER_S_PER_C};

/// Speed of sound in air at the given ambient temperature (m/s).
///
/// Linear model `c(T) = 331.4 + 0.6 * T(°C)`, accurate to well under 1% over
/// the sensor's operating range.
pub fn speed_of_sound_m_per_s(ambient_temp_deci_c: i16) -> f32 {
    SPEED_OF_SOUND_0C_M_PER_S
        + SPEED_OF_SOUND_SLOPE_M_PER_S_PER_C * f32::from(ambient_temp_deci_c) / 10.0
}

/// Convert an echo pulse width to a target distance in millimeters.
pub fn time_to_distance_mm(ambient_temp_deci_c: i16, time_us: u32) -> u32 {
    let one_way_m_per_s = speed_of_sound_m_per_s(ambient_temp_deci_c) / 2.0;
    libm::roundf(time_us as f32 / 1_000_000.0 * one_way_m_per_s * 1_000.0) as u32
}

/// Convert a target distance in millimeters to an echo pulse width in
/// microseconds.
///
/// Applied to the configured maximum range this yields the echo-wait
/// deadline: a target any farther cannot return a valid echo in time.
pub fn distance_to_time_us(ambient_temp_deci_c: i16, distance_mm: u32) -> u32 {
    let one_way_m_per_s = speed_of_sound_m_per_s(ambient_temp_deci_c) / 2.0;
    libm::roundf(distance_mm as f32 / 1_000.0 / one_way_m_per_s * 1_000_000.0) as u32
}
