//! Proximity state machine
//!
//! Pulls one distance sample per cycle from a [`RangeSensor`], derives a
//! motion direction from the delta against its retained previous sample,
//! transitions between operating states, and pushes tier commands to an
//! [`Indicator`].
//!
//! ## States
//!
//! ```text
//! Uninitialized → Initializing → Idle ⇄ {Approaching, Retreating}
//!                      │                         │
//!                      └────────→ Fault ←────────┘ (terminal, latched)
//! ```
//!
//! `Initializing` runs the indicator self-test once; failure latches
//! `Fault`. While a subject is moving, the indicator tier tracks the
//! current distance. Once the subject holds still long enough the machine
//! reverts to `Idle` and darkens the indicator.
//!
//! ## Motion hysteresis
//!
//! A direction other than `Stationary` requires both guards: enough elapsed
//! time since the motion timer was last reset and enough absolute distance
//! change. The time guard dominates, so a single noisy sample between two
//! close polls never registers as motion.
//!
//! ## No-target handling
//!
//! A sensor timeout is an expected outcome ("nothing in range") and becomes
//! an explicit [`RangeSample::NoTarget`]. It stays out of the delta
//! arithmetic: a subject vanishing from range is not motion, it is a dark
//! indicator and, after the stationary hold, a return to `Idle`.
//!
//! ## Failure semantics
//!
//! A sensor device fault escalates as
//! [`ControlError::RestartRequired`]; the shell owns the reset primitive.
//! Everything that can only happen through caller misuse - updating while
//! latched in `Fault`, a sensor reporting `NotReady` mid-loop, the
//! indicator refusing a tier command - is a
//! [`ControlError::ContractViolation`], and the shell is expected to
//! terminate after the diagnostic rather than continue undefined.

use log::{debug, error, info, trace};

use crate::errors::{ControlError, DriverError, DriverResult};
use crate::time::Clock;
use crate::traits::{Indicator, MotionDirection, OperatingState, RangeSample, RangeSensor, Tier};

/// Thresholds governing tier selection and motion hysteresis.
///
/// Invariant: `near < far < max`, enforced at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProximityConfig {
    /// Maximum-range cutoff in millimeters; beyond it the subject is out of
    /// range and the indicator is dark.
    pub max_distance_threshold_mm: u32,
    /// "Far" cutoff in millimeters; between this and the maximum cutoff the
    /// far tier is lit.
    pub far_threshold_mm: u32,
    /// "Near" cutoff in millimeters; at or below it the nearest tier is lit,
    /// between it and the far cutoff the medium tier.
    pub near_threshold_mm: u32,
    /// Minimum absolute distance delta in millimeters to count as motion.
    pub moving_distance_threshold_mm: u32,
    /// Minimum elapsed time in milliseconds before motion is evaluated.
    pub moving_time_threshold_ms: u32,
    /// Minimum stationary duration in milliseconds before reverting to idle.
    pub holding_time_threshold_ms: u32,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            max_distance_threshold_mm: 2_000,
            far_threshold_mm: 300,
            near_threshold_mm: 100,
            moving_distance_threshold_mm: 50,
            moving_time_threshold_ms: 100,
            holding_time_threshold_ms: 1_000,
        }
    }
}

impl ProximityConfig {
    fn validate(&self) -> DriverResult<()> {
        if self.near_threshold_mm == 0 {
            return Err(DriverError::BadParam {
                reason: "near threshold must be nonzero",
            });
        }
        if self.near_threshold_mm >= self.far_threshold_mm {
            return Err(DriverError::BadParam {
                reason: "near threshold must be below far threshold",
            });
        }
        if self.far_threshold_mm >= self.max_distance_threshold_mm {
            return Err(DriverError::BadParam {
                reason: "far threshold must be below the maximum-range cutoff",
            });
        }
        Ok(())
    }
}

/// The proximity state machine.
///
/// Owns its sensor, indicator, and clock exclusively; all mutable state is
/// touched only by [`update`](Self::update), which the external cyclic
/// caller invokes once per period. Each update blocks for up to one full
/// ranging measurement (roughly twice the maximum-range round-trip time),
/// so size the period accordingly.
pub struct ProximityMonitor<S, I, C> {
    sensor: S,
    indicator: I,
    clock: C,
    config: ProximityConfig,
    ambient_temp_deci_c: i16,
    state: OperatingState,
    previous: RangeSample,
    previous_time_ms: u64,
    last_direction: MotionDirection,
}

impl<S, I, C> ProximityMonitor<S, I, C>
where
    S: RangeSensor,
    I: Indicator,
    C: Clock,
{
    /// Build a monitor from its collaborators and thresholds.
    ///
    /// Rejects a configuration violating `near < far < max` with
    /// [`DriverError::BadParam`]. On success the machine is in
    /// `Initializing`; the first [`update`](Self::update) runs the
    /// indicator self-test.
    pub fn new(sensor: S, indicator: I, clock: C, config: ProximityConfig) -> DriverResult<Self> {
        config.validate()?;
        Ok(Self {
            sensor,
            indicator,
            clock,
            config,
            ambient_temp_deci_c: crate::constants::DEFAULT_AMBIENT_TEMP_DECI_C,
            state: OperatingState::Initializing,
            previous: RangeSample::NoTarget,
            previous_time_ms: 0,
            last_direction: MotionDirection::Stationary,
        })
    }

    /// Override the ambient temperature used for ranging compensation,
    /// in deci-degrees Celsius.
    pub fn with_ambient_temperature(mut self, deci_c: i16) -> Self {
        self.ambient_temp_deci_c = deci_c;
        self
    }

    /// Current operating state.
    pub fn state(&self) -> OperatingState {
        self.state
    }

    /// Direction classified on the most recent update.
    pub fn last_direction(&self) -> MotionDirection {
        self.last_direction
    }

    /// The configured thresholds.
    pub fn config(&self) -> &ProximityConfig {
        &self.config
    }

    /// Borrow the sensor, e.g. for shell telemetry.
    pub fn sensor_ref(&self) -> &S {
        &self.sensor
    }

    /// Borrow the indicator, e.g. for shell telemetry.
    pub fn indicator_ref(&self) -> &I {
        &self.indicator
    }

    /// Consume the monitor, returning its collaborators.
    pub fn release(self) -> (S, I, C) {
        (self.sensor, self.indicator, self.clock)
    }

    /// Advance the state machine by one cycle.
    ///
    /// Must be called periodically by the single external driver thread.
    /// Returns the escalations described in the module docs; an `Ok(())`
    /// covers every expected operational outcome including "no target".
    pub fn update(&mut self) -> Result<(), ControlError> {
        let state = self.state;
        if state == OperatingState::Fault {
            error!("update() invoked while latched in the fault state");
            return Err(ControlError::ContractViolation {
                reason: "update called in fault state",
            });
        }
        if state == OperatingState::Uninitialized {
            // Unreachable through the public constructor; kept as a guard
            // for state restored through future persistence hooks.
            return Err(ControlError::ContractViolation {
                reason: "update called before initialization",
            });
        }

        let sample = self.sample()?;
        let now_ms = self.clock.now_ms();
        let delta_t_ms = now_ms.saturating_sub(self.previous_time_ms);
        let delta_d_mm = match (self.previous, sample) {
            (RangeSample::Distance(prev), RangeSample::Distance(current)) => {
                Some(i64::from(current) - i64::from(prev))
            }
            // A vanishing or reappearing target is not motion.
            _ => None,
        };
        let direction = self.classify(delta_t_ms, delta_d_mm);
        trace!(
            "deltaT {} ms, deltaD {:?} mm, direction {}",
            delta_t_ms,
            delta_d_mm,
            direction
        );

        let next = match state {
            OperatingState::Initializing => {
                self.previous_time_ms = now_ms;
                if self.run_self_test() {
                    OperatingState::Idle
                } else {
                    OperatingState::Fault
                }
            }

            OperatingState::Idle => {
                // The motion timer free-runs while idle: each cycle
                // evaluates only the delta since the previous poll.
                self.previous_time_ms = now_ms;
                match direction {
                    MotionDirection::Stationary => {
                        self.command_tier(Tier::Off)?;
                        OperatingState::Idle
                    }
                    MotionDirection::Approaching => OperatingState::Approaching,
                    MotionDirection::Retreating => OperatingState::Retreating,
                }
            }

            OperatingState::Approaching | OperatingState::Retreating => {
                self.command_tier(self.tier_for(sample))?;
                match direction {
                    MotionDirection::Stationary => {
                        if delta_t_ms > u64::from(self.config.holding_time_threshold_ms) {
                            self.command_tier(Tier::Off)?;
                            OperatingState::Idle
                        } else {
                            state
                        }
                    }
                    MotionDirection::Approaching => {
                        self.previous_time_ms = now_ms;
                        OperatingState::Approaching
                    }
                    MotionDirection::Retreating => {
                        self.previous_time_ms = now_ms;
                        OperatingState::Retreating
                    }
                }
            }

            // Both handled above.
            OperatingState::Uninitialized | OperatingState::Fault => state,
        };

        if next != state {
            info!("state {} -> {}", state, next);
        }
        self.previous = sample;
        self.last_direction = direction;
        self.state = next;
        Ok(())
    }

    /// Pull one sample, absorbing the expected timeout outcome and
    /// escalating everything else.
    fn sample(&mut self) -> Result<RangeSample, ControlError> {
        match self.sensor.measure(self.ambient_temp_deci_c) {
            Ok(mm) => {
                debug!("measured distance {} mm", mm);
                Ok(RangeSample::Distance(mm))
            }
            Err(DriverError::Timeout) => {
                debug!("no echo; no target currently detectable");
                Ok(RangeSample::NoTarget)
            }
            Err(source @ DriverError::Device { .. }) => {
                error!("sensor device fault ({}); requesting restart", source);
                Err(ControlError::RestartRequired { source })
            }
            Err(other) => {
                // NotReady or a configuration error mid-loop can only be a
                // caller-ordering bug.
                error!("sensor returned {}; caller contract violated", other);
                Err(ControlError::ContractViolation {
                    reason: "sensor unusable during update",
                })
            }
        }
    }

    /// Hysteresis classification. The time guard dominates: without enough
    /// elapsed time, no distance delta counts as motion.
    fn classify(&self, delta_t_ms: u64, delta_d_mm: Option<i64>) -> MotionDirection {
        let Some(delta_d) = delta_d_mm else {
            return MotionDirection::Stationary;
        };
        if delta_t_ms <= u64::from(self.config.moving_time_threshold_ms) {
            return MotionDirection::Stationary;
        }
        if delta_d.unsigned_abs() <= u64::from(self.config.moving_distance_threshold_mm) {
            return MotionDirection::Stationary;
        }
        if delta_d > 0 {
            MotionDirection::Retreating
        } else {
            MotionDirection::Approaching
        }
    }

    /// Tier for the current sample; out of range (or no target) is dark.
    fn tier_for(&self, sample: RangeSample) -> Tier {
        match sample.distance_mm() {
            None => Tier::Off,
            Some(mm) if mm > self.config.max_distance_threshold_mm => Tier::Off,
            Some(mm) if mm > self.config.far_threshold_mm => Tier::Far,
            Some(mm) if mm > self.config.near_threshold_mm => Tier::Medium,
            Some(_) => Tier::Near,
        }
    }

    fn command_tier(&mut self, tier: Tier) -> Result<(), ControlError> {
        self.indicator.set_tier(tier).map_err(|e| {
            error!("indicator rejected tier {} ({})", tier, e);
            ControlError::ContractViolation {
                reason: "indicator refused a tier command",
            }
        })
    }

    fn run_self_test(&mut self) -> bool {
        info!("running indicator self-test");
        match self.indicator.self_test() {
            Ok(()) => {
                info!("indicator self-test passed");
                true
            }
            Err(e) => {
                error!("indicator self-test failed: {}", e);
                false
            }
        }
    }
}
