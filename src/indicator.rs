//! Discrete-LED tier indicator
//!
//! Three LEDs on three GPIO lines, one per tier, sharing a polarity. Exactly
//! one LED is lit at a time; selecting a tier extinguishes the others before
//! lighting the new one. The self-test walks every tier with a visible dwell
//! so a human can confirm the wiring during bring-up.
//!
//! This is deliberately a thin digital-output wrapper: all signaling policy
//! (which tier, when) lives in [`crate::monitor`].

use embedded_hal::digital::OutputPin;
use log::debug;

use crate::constants::SELF_TEST_STEP_MS;
use crate::errors::{DriverError, DriverResult};
use crate::time::Clock;
use crate::traits::{Indicator, Polarity, Tier};

/// Static configuration of a discrete-LED indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IndicatorConfig {
    /// Active level shared by all three LED lines.
    pub polarity: Polarity,
    /// Dwell per tier during the self-test, in milliseconds.
    pub self_test_step_ms: u32,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            polarity: Polarity::ActiveHigh,
            self_test_step_ms: SELF_TEST_STEP_MS,
        }
    }
}

impl IndicatorConfig {
    fn validate(&self) -> DriverResult<()> {
        if self.self_test_step_ms == 0 {
            return Err(DriverError::BadParam {
                reason: "self-test step duration must be nonzero",
            });
        }
        Ok(())
    }
}

/// Tiered indicator built from three discrete LEDs.
pub struct LedIndicator<Near, Medium, Far, C> {
    near: Near,
    medium: Medium,
    far: Far,
    clock: C,
    config: Option<IndicatorConfig>,
}

impl<Near, Medium, Far, C> LedIndicator<Near, Medium, Far, C>
where
    Near: OutputPin,
    Medium: OutputPin,
    Far: OutputPin,
    C: Clock,
{
    /// Create an unconfigured indicator from its pins and clock.
    ///
    /// On a traffic-light layout `near` is red, `medium` yellow, `far`
    /// green.
    pub fn new(near: Near, medium: Medium, far: Far, clock: C) -> Self {
        Self {
            near,
            medium,
            far,
            clock,
            config: None,
        }
    }

    /// Apply a configuration and turn every LED off.
    pub fn configure(&mut self, config: IndicatorConfig) -> DriverResult<()> {
        if self.config.is_some() {
            return Err(DriverError::AlreadyConfigured);
        }
        config.validate()?;
        self.apply(config.polarity, Tier::Off)?;
        self.config = Some(config);
        Ok(())
    }

    /// Release the configuration, turning the LEDs off best-effort.
    pub fn deinit(&mut self) {
        if let Some(config) = self.config.take() {
            let _ = self.apply(config.polarity, Tier::Off);
        }
    }

    /// Whether [`configure`](Self::configure) has been applied.
    pub fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    /// Consume the indicator, returning the pins and clock.
    pub fn release(self) -> (Near, Medium, Far, C) {
        (self.near, self.medium, self.far, self.clock)
    }

    /// Drive the three lines so exactly the selected tier is lit.
    fn apply(&mut self, polarity: Polarity, tier: Tier) -> DriverResult<()> {
        // Extinguish first so two LEDs never overlap mid-switch.
        write_led(&mut self.near, polarity, tier == Tier::Near, true)?;
        write_led(&mut self.medium, polarity, tier == Tier::Medium, true)?;
        write_led(&mut self.far, polarity, tier == Tier::Far, true)?;
        write_led(&mut self.near, polarity, tier == Tier::Near, false)?;
        write_led(&mut self.medium, polarity, tier == Tier::Medium, false)?;
        write_led(&mut self.far, polarity, tier == Tier::Far, false)?;
        Ok(())
    }
}

/// Write one LED line; `off_pass` only performs extinguishing writes.
fn write_led<P: OutputPin>(
    pin: &mut P,
    polarity: Polarity,
    lit: bool,
    off_pass: bool,
) -> DriverResult<()> {
    if lit == off_pass {
        return Ok(());
    }
    let result = if lit == polarity.active_level() {
        pin.set_high()
    } else {
        pin.set_low()
    };
    result.map_err(|_| DriverError::Device {
        reason: "indicator pin write failed",
    })
}

impl<Near, Medium, Far, C> Indicator for LedIndicator<Near, Medium, Far, C>
where
    Near: OutputPin,
    Medium: OutputPin,
    Far: OutputPin,
    C: Clock,
{
    fn set_tier(&mut self, tier: Tier) -> DriverResult<()> {
        let config = self.config.ok_or(DriverError::NotReady)?;
        debug!("indicator tier {}", tier);
        self.apply(config.polarity, tier)
    }

    fn self_test(&mut self) -> DriverResult<()> {
        let config = self.config.ok_or(DriverError::NotReady)?;
        for tier in [Tier::Near, Tier::Medium, Tier::Far] {
            self.apply(config.polarity, tier)?;
            self.clock.delay_us(config.self_test_step_ms.saturating_mul(1_000));
        }
        self.apply(config.polarity, Tier::Off)
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use crate::time::SimClock;
    use core::convert::Infallible;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Pin double exposing its level through a shared handle.
    #[derive(Clone)]
    struct SharedPin {
        level: Rc<Cell<bool>>,
    }

    impl SharedPin {
        fn new() -> Self {
            Self {
                level: Rc::new(Cell::new(false)),
            }
        }

        fn is_high(&self) -> bool {
            self.level.get()
        }
    }

    impl embedded_hal::digital::ErrorType for SharedPin {
        type Error = Infallible;
    }

    impl OutputPin for SharedPin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.level.set(false);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.level.set(true);
            Ok(())
        }
    }

    fn indicator() -> (
        LedIndicator<SharedPin, SharedPin, SharedPin, SimClock>,
        (SharedPin, SharedPin, SharedPin),
        SimClock,
    ) {
        let clock = SimClock::new(0);
        let near = SharedPin::new();
        let medium = SharedPin::new();
        let far = SharedPin::new();
        let handles = (near.clone(), medium.clone(), far.clone());
        (
            LedIndicator::new(near, medium, far, clock.clone()),
            handles,
            clock,
        )
    }

    #[test]
    fn set_tier_before_configure_is_not_ready() {
        let (mut led, _pins, _clock) = indicator();
        assert_eq!(led.set_tier(Tier::Near), Err(DriverError::NotReady));
        assert_eq!(led.self_test(), Err(DriverError::NotReady));
    }

    #[test]
    fn tiers_are_exclusive() {
        let (mut led, (near, medium, far), _clock) = indicator();
        led.configure(IndicatorConfig::default()).unwrap();

        led.set_tier(Tier::Medium).unwrap();
        assert!(!near.is_high() && medium.is_high() && !far.is_high());

        led.set_tier(Tier::Far).unwrap();
        assert!(!near.is_high() && !medium.is_high() && far.is_high());

        led.set_tier(Tier::Off).unwrap();
        assert!(!near.is_high() && !medium.is_high() && !far.is_high());
    }

    #[test]
    fn active_low_inverts_levels() {
        let (mut led, (near, medium, far), _clock) = indicator();
        led.configure(IndicatorConfig {
            polarity: Polarity::ActiveLow,
            ..IndicatorConfig::default()
        })
        .unwrap();

        led.set_tier(Tier::Near).unwrap();
        assert!(!near.is_high() && medium.is_high() && far.is_high());
    }

    #[test]
    fn self_test_ends_dark_and_takes_three_steps() {
        let (mut led, (near, medium, far), clock) = indicator();
        led.configure(IndicatorConfig::default()).unwrap();

        let start = clock.peek_us();
        led.self_test().unwrap();
        let elapsed_ms = (clock.peek_us() - start) / 1_000;

        assert!(!near.is_high() && !medium.is_high() && !far.is_high());
        assert_eq!(elapsed_ms, 3 * u64::from(SELF_TEST_STEP_MS));
    }

    #[test]
    fn zero_step_config_is_rejected() {
        let (mut led, _pins, _clock) = indicator();
        let config = IndicatorConfig {
            self_test_step_ms: 0,
            ..IndicatorConfig::default()
        };
        assert!(matches!(
            led.configure(config),
            Err(DriverError::BadParam { .. })
        ));
    }

    #[test]
    fn reconfigure_requires_deinit() {
        let (mut led, _pins, _clock) = indicator();
        led.configure(IndicatorConfig::default()).unwrap();
        assert_eq!(
            led.configure(IndicatorConfig::default()),
            Err(DriverError::AlreadyConfigured)
        );
        led.deinit();
        assert!(led.configure(IndicatorConfig::default()).is_ok());
    }
}
