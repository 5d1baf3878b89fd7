//! HC-SR04 echo-ranging driver
//!
//! Executes the single-echo ranging protocol over two GPIO lines:
//!
//! ```text
//! trigger ──┐ settle ┌──── pulse ────┐ settle
//!           └────────┘               └────────
//! echo      ............┌── width ∝ distance ──┐......
//!                       └──────────────────────┘
//! ```
//!
//! 1. Drive the trigger active for the configured minimum pulse duration,
//!    bracketed by short settle delays so the module sees clean edges.
//! 2. Busy-poll the echo line for its rising edge, bounded by the round-trip
//!    time of the configured maximum range.
//! 3. Busy-poll for the falling edge against a fresh deadline.
//! 4. Convert the pulse width to millimeters with the temperature-compensated
//!    model in [`crate::acoustics`].
//!
//! Both waits block the caller; worst case is roughly twice the maximum-range
//! round-trip time (tens of milliseconds at 4 m), which the cyclic caller
//! must budget for. A missing rising or falling edge reports as
//! [`DriverError::Timeout`] - indistinguishable here from a disconnected
//! sensor, and deliberately treated as "no target" upstream.

use embedded_hal::digital::{InputPin, OutputPin};
use log::{debug, warn};

use crate::acoustics;
use crate::constants::{HCSR04_MAX_DISTANCE_MM, HCSR04_MIN_DISTANCE_MM, HCSR04_MIN_TRIGGER_PULSE_US};
use crate::errors::{DriverError, DriverResult};
use crate::time::Clock;
use crate::traits::{Polarity, RangeSensor};

/// Static configuration of an echo-ranging sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorConfig {
    /// Minimum trigger pulse duration in microseconds.
    pub min_trigger_pulse_us: u32,
    /// Minimum distance the sensor can resolve in millimeters.
    pub min_distance_mm: u32,
    /// Maximum distance the sensor can detect in millimeters; bounds the
    /// echo-wait deadline.
    pub max_distance_mm: u32,
    /// Active level of the trigger line.
    pub trigger_polarity: Polarity,
    /// Active level of the echo line.
    pub echo_polarity: Polarity,
}

impl SensorConfig {
    /// Datasheet configuration for the stock HC-SR04 module.
    pub fn hc_sr04() -> Self {
        Self {
            min_trigger_pulse_us: HCSR04_MIN_TRIGGER_PULSE_US,
            min_distance_mm: HCSR04_MIN_DISTANCE_MM,
            max_distance_mm: HCSR04_MAX_DISTANCE_MM,
            trigger_polarity: Polarity::ActiveHigh,
            echo_polarity: Polarity::ActiveHigh,
        }
    }

    fn validate(&self) -> DriverResult<()> {
        if self.min_trigger_pulse_us == 0 {
            return Err(DriverError::BadParam {
                reason: "trigger pulse duration must be nonzero",
            });
        }
        if self.max_distance_mm == 0 {
            return Err(DriverError::BadParam {
                reason: "maximum distance must be nonzero",
            });
        }
        if self.min_distance_mm >= self.max_distance_mm {
            return Err(DriverError::BadParam {
                reason: "minimum distance must be below maximum distance",
            });
        }
        Ok(())
    }
}

/// HC-SR04 style ranging driver.
///
/// Owns its trigger output, echo input, and clock exclusively. The pin types
/// come from `embedded-hal`, so the driver is portable across HALs and can
/// run against simulated pins under test.
pub struct HcSr04<Trig, Echo, C> {
    trigger: Trig,
    echo: Echo,
    clock: C,
    config: Option<SensorConfig>,
}

impl<Trig, Echo, C> HcSr04<Trig, Echo, C>
where
    Trig: OutputPin,
    Echo: InputPin,
    C: Clock,
{
    /// Create an unconfigured driver from its pins and clock.
    pub fn new(trigger: Trig, echo: Echo, clock: C) -> Self {
        Self {
            trigger,
            echo,
            clock,
            config: None,
        }
    }

    /// Apply a configuration and idle the trigger line.
    ///
    /// Fails with [`DriverError::AlreadyConfigured`] when called twice
    /// without an intervening [`deinit`](Self::deinit), and with
    /// [`DriverError::BadParam`] when a field is invalid.
    pub fn configure(&mut self, config: SensorConfig) -> DriverResult<()> {
        if self.config.is_some() {
            return Err(DriverError::AlreadyConfigured);
        }
        config.validate()?;

        // Start from a known level so the first trigger edge is clean.
        write_pin(
            &mut self.trigger,
            config.trigger_polarity,
            false,
            "trigger pin write failed",
        )?;
        self.config = Some(config);
        Ok(())
    }

    /// Release the configuration; safe to call repeatedly.
    ///
    /// The trigger line is idled on a best-effort basis. Pin mode and
    /// impedance are owned by the HAL pin types handed to
    /// [`new`](Self::new); reclaim them with [`release`](Self::release).
    pub fn deinit(&mut self) {
        if let Some(config) = self.config.take() {
            let _ = write_pin(
                &mut self.trigger,
                config.trigger_polarity,
                false,
                "trigger pin write failed",
            );
        }
    }

    /// Whether [`configure`](Self::configure) has been applied.
    pub fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    /// Consume the driver, returning the pins and clock.
    pub fn release(self) -> (Trig, Echo, C) {
        (self.trigger, self.echo, self.clock)
    }

    /// Emit the trigger pulse: settle low, active for the minimum pulse
    /// duration, settle low again.
    fn fire_trigger(&mut self, config: &SensorConfig) -> DriverResult<()> {
        let settle_us = config.min_trigger_pulse_us / 5;

        write_pin(
            &mut self.trigger,
            config.trigger_polarity,
            false,
            "trigger pin write failed",
        )?;
        self.clock.delay_us(settle_us);

        write_pin(
            &mut self.trigger,
            config.trigger_polarity,
            true,
            "trigger pin write failed",
        )?;
        self.clock.delay_us(config.min_trigger_pulse_us);

        write_pin(
            &mut self.trigger,
            config.trigger_polarity,
            false,
            "trigger pin write failed",
        )?;
        self.clock.delay_us(settle_us);
        Ok(())
    }

    fn echo_active(&mut self, polarity: Polarity) -> DriverResult<bool> {
        let high = self
            .echo
            .is_high()
            .map_err(|_| DriverError::Device {
                reason: "echo pin read failed",
            })?;
        Ok(high == polarity.active_level())
    }

    /// Wait for both echo edges and convert the pulse width to millimeters.
    fn read_distance(&mut self, ambient_temp_deci_c: i16, config: &SensorConfig) -> DriverResult<u32> {
        let max_wait_us = u64::from(acoustics::distance_to_time_us(
            ambient_temp_deci_c,
            config.max_distance_mm,
        ));
        debug!("echo wait budget is {} us", max_wait_us);

        // Rising edge of the echo pulse.
        let deadline = self.clock.now_us() + max_wait_us;
        let mut active = self.echo_active(config.echo_polarity)?;
        while !active && self.clock.now_us() < deadline {
            active = self.echo_active(config.echo_polarity)?;
        }
        if !active {
            // A silent sensor and an empty field of view look identical
            // from here.
            warn!("timeout waiting for the echo pulse rising edge");
            return Err(DriverError::Timeout);
        }
        let rise_us = self.clock.now_us();

        // Falling edge, against a fresh deadline from the rising edge.
        let deadline = rise_us + max_wait_us;
        let mut fall_us = rise_us;
        while active && fall_us < deadline {
            active = self.echo_active(config.echo_polarity)?;
            fall_us = self.clock.now_us();
        }
        if active {
            warn!("timeout waiting for the echo pulse falling edge");
            return Err(DriverError::Timeout);
        }

        let pulse_us = (fall_us - rise_us) as u32;
        debug!("echo pulse width is {} us", pulse_us);
        Ok(acoustics::time_to_distance_mm(ambient_temp_deci_c, pulse_us))
    }
}

impl<Trig, Echo, C> RangeSensor for HcSr04<Trig, Echo, C>
where
    Trig: OutputPin,
    Echo: InputPin,
    C: Clock,
{
    fn measure(&mut self, ambient_temp_deci_c: i16) -> DriverResult<u32> {
        let config = self.config.ok_or(DriverError::NotReady)?;
        self.fire_trigger(&config)?;
        self.read_distance(ambient_temp_deci_c, &config)
    }
}

/// Map a logical signal level through its polarity onto a pin.
fn write_pin<P: OutputPin>(
    pin: &mut P,
    polarity: Polarity,
    active: bool,
    reason: &'static str,
) -> DriverResult<()> {
    let result = if active == polarity.active_level() {
        pin.set_high()
    } else {
        pin.set_low()
    };
    result.map_err(|_| DriverError::Device { reason })
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use crate::acoustics;
    use crate::time::SimClock;
    use core::convert::Infallible;

    /// Trigger double that records level changes with timestamps.
    struct RecordingTrigger {
        clock: SimClock,
        edges: std::vec::Vec<(u64, bool)>,
    }

    impl RecordingTrigger {
        fn new(clock: SimClock) -> Self {
            Self {
                clock,
                edges: std::vec::Vec::new(),
            }
        }
    }

    impl embedded_hal::digital::ErrorType for RecordingTrigger {
        type Error = Infallible;
    }

    impl OutputPin for RecordingTrigger {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.edges.push((self.clock.peek_us(), false));
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.edges.push((self.clock.peek_us(), true));
            Ok(())
        }
    }

    /// Echo double that is active-high inside a scheduled pulse window.
    struct ScriptedEcho {
        clock: SimClock,
        pulse: Option<(u64, u64)>,
    }

    impl embedded_hal::digital::ErrorType for ScriptedEcho {
        type Error = Infallible;
    }

    impl InputPin for ScriptedEcho {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            let now = self.clock.peek_us();
            Ok(self
                .pulse
                .map(|(start, end)| now >= start && now < end)
                .unwrap_or(false))
        }

        fn is_low(&mut self) -> Result<bool, Infallible> {
            self.is_high().map(|h| !h)
        }
    }

    /// Pin double whose reads always fail.
    struct BrokenEcho;

    impl embedded_hal::digital::ErrorType for BrokenEcho {
        type Error = embedded_hal::digital::ErrorKind;
    }

    impl InputPin for BrokenEcho {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Err(embedded_hal::digital::ErrorKind::Other)
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Err(embedded_hal::digital::ErrorKind::Other)
        }
    }

    fn driver_with_pulse(
        pulse: Option<(u64, u64)>,
    ) -> (HcSr04<RecordingTrigger, ScriptedEcho, SimClock>, SimClock) {
        let clock = SimClock::new(0);
        let trigger = RecordingTrigger::new(clock.clone());
        let echo = ScriptedEcho {
            clock: clock.clone(),
            pulse,
        };
        (HcSr04::new(trigger, echo, clock.clone()), clock)
    }

    #[test]
    fn measure_before_configure_is_not_ready() {
        let (mut driver, _clock) = driver_with_pulse(None);
        assert_eq!(driver.measure(200), Err(DriverError::NotReady));
    }

    #[test]
    fn double_configure_is_rejected() {
        let (mut driver, _clock) = driver_with_pulse(None);
        driver.configure(SensorConfig::hc_sr04()).unwrap();
        assert_eq!(
            driver.configure(SensorConfig::hc_sr04()),
            Err(DriverError::AlreadyConfigured)
        );

        // ... but is accepted again after deinit.
        driver.deinit();
        assert!(!driver.is_configured());
        driver.deinit(); // repeat is harmless
        assert!(driver.configure(SensorConfig::hc_sr04()).is_ok());
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let (mut driver, _clock) = driver_with_pulse(None);

        let mut config = SensorConfig::hc_sr04();
        config.min_trigger_pulse_us = 0;
        assert!(matches!(
            driver.configure(config),
            Err(DriverError::BadParam { .. })
        ));

        let mut config = SensorConfig::hc_sr04();
        config.min_distance_mm = config.max_distance_mm;
        assert!(matches!(
            driver.configure(config),
            Err(DriverError::BadParam { .. })
        ));

        assert!(!driver.is_configured());
    }

    #[test]
    fn trigger_pulse_shape_matches_config() {
        let (mut driver, _clock) = driver_with_pulse(Some((5_000, 7_000)));
        driver.configure(SensorConfig::hc_sr04()).unwrap();
        driver.measure(200).unwrap();

        // configure() idles the line, then the burst: low, high, low.
        let edges = &driver.trigger.edges;
        assert_eq!(edges.len(), 4);
        assert!(!edges[0].1 && !edges[1].1 && edges[2].1 && !edges[3].1);

        // Active for exactly the minimum pulse duration.
        assert_eq!(edges[3].0 - edges[2].0, 10);
        // Settle delay of pulse/5 before the active edge.
        assert_eq!(edges[2].0 - edges[1].0, 2);
    }

    #[test]
    fn scripted_pulse_width_converts_to_distance() {
        let (mut driver, _clock) = driver_with_pulse(Some((5_000, 7_000)));
        driver.configure(SensorConfig::hc_sr04()).unwrap();

        let distance = driver.measure(200).unwrap();
        // 2000 µs at 20.0 °C; allow ±1 mm for the simulated poll tick.
        let expected = acoustics::time_to_distance_mm(200, 2_000);
        assert!(
            (i64::from(distance) - i64::from(expected)).abs() <= 1,
            "distance {distance} expected ~{expected}"
        );
    }

    #[test]
    fn active_low_echo_is_honored() {
        // The scripted pin is high inside the window; with an active-low
        // echo the pulse is the complement, so the driver sees "active"
        // immediately and "inactive" during the window.
        let (mut driver, _clock) = driver_with_pulse(Some((100, u64::MAX)));
        let mut config = SensorConfig::hc_sr04();
        config.echo_polarity = Polarity::ActiveLow;
        driver.configure(config).unwrap();

        // Rising edge (low line) is seen straight away, falling edge when
        // the scripted window starts driving the line high.
        let distance = driver.measure(200).unwrap();
        let max = acoustics::time_to_distance_mm(200, 100);
        assert!(distance <= max, "distance {distance}");
    }

    #[test]
    fn no_echo_times_out_within_one_budget() {
        let (mut driver, clock) = driver_with_pulse(None);
        driver.configure(SensorConfig::hc_sr04()).unwrap();

        let budget = u64::from(acoustics::distance_to_time_us(200, 4_000));
        let start = clock.peek_us();
        assert_eq!(driver.measure(200), Err(DriverError::Timeout));
        let elapsed = clock.peek_us() - start;

        // Trigger overhead (14 µs) plus one wait budget, with slack for
        // the final poll iteration.
        assert!(elapsed <= budget + 100, "elapsed {elapsed} budget {budget}");
    }

    #[test]
    fn stuck_echo_times_out_within_two_budgets() {
        // Rising edge arrives but the pulse never ends.
        let (mut driver, clock) = driver_with_pulse(Some((1_000, u64::MAX)));
        driver.configure(SensorConfig::hc_sr04()).unwrap();

        let budget = u64::from(acoustics::distance_to_time_us(200, 4_000));
        let start = clock.peek_us();
        assert_eq!(driver.measure(200), Err(DriverError::Timeout));
        let elapsed = clock.peek_us() - start;

        assert!(
            elapsed <= 2 * budget + 1_200,
            "elapsed {elapsed} budget {budget}"
        );
    }

    #[test]
    fn shorter_max_distance_shrinks_the_deadline() {
        let (mut driver, clock) = driver_with_pulse(None);
        let mut config = SensorConfig::hc_sr04();
        config.max_distance_mm = 500;
        driver.configure(config).unwrap();

        let start = clock.peek_us();
        assert_eq!(driver.measure(200), Err(DriverError::Timeout));
        let elapsed = clock.peek_us() - start;

        let budget = u64::from(acoustics::distance_to_time_us(200, 500));
        assert!(elapsed <= budget + 100, "elapsed {elapsed} budget {budget}");
    }

    #[test]
    fn echo_pin_fault_maps_to_device_error() {
        let clock = SimClock::new(0);
        let trigger = RecordingTrigger::new(clock.clone());
        let mut driver = HcSr04::new(trigger, BrokenEcho, clock);
        driver.configure(SensorConfig::hc_sr04()).unwrap();

        assert!(matches!(
            driver.measure(200),
            Err(DriverError::Device { .. })
        ));
    }

    #[test]
    fn measure_default_uses_room_temperature() {
        let (mut driver, _clock) = driver_with_pulse(Some((5_000, 7_000)));
        driver.configure(SensorConfig::hc_sr04()).unwrap();
        let d = driver.measure_default().unwrap();
        let expected = acoustics::time_to_distance_mm(200, 2_000);
        assert!((i64::from(d) - i64::from(expected)).abs() <= 1);
    }
}
