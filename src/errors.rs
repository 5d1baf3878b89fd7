//! Error Types for Ranging and Signaling Failures
//!
//! ## Design Philosophy
//!
//! RangeGuard's error system is designed with embedded systems in mind:
//!
//! 1. **Small Size**: Every variant carries at most a `&'static str`, so
//!    errors stay cheap to return from the measurement hot path.
//!
//! 2. **No Heap Allocation**: All error data is inline - no String, only
//!    `&'static str` for diagnostics. Memory usage is deterministic.
//!
//! 3. **Copy Semantics**: Errors implement `Copy` for efficient return from
//!    functions without move semantics complications.
//!
//! 4. **Severity Is Explicit**: Recoverable driver outcomes and fatal
//!    escalations live in separate enums so callers cannot confuse them.
//!
//! ## Error Categories
//!
//! [`DriverError`] covers everything a sensor or indicator driver can report:
//!
//! - `BadParam` / `AlreadyConfigured`: configuration mistakes, returned to
//!   the immediate caller and never fatal.
//! - `NotReady`: an operation before `configure()` - a caller-ordering bug.
//! - `Timeout`: no echo within the distance-derived deadline. This is an
//!   expected operational outcome ("no target in range"), absorbed by the
//!   state machine rather than propagated.
//! - `Device`: an unrecoverable hardware fault.
//!
//! [`ControlError`] covers the state machine's escalation paths:
//!
//! - `RestartRequired`: a device fault was observed; the surrounding shell
//!   owns the reset primitive and performs a full controlled restart.
//! - `ContractViolation`: the caller broke an API contract (for example
//!   updating a monitor latched in the fault state). The intended handling
//!   is "terminate after diagnostic" - kept as a distinct kind so tests can
//!   assert on the escalation without real process termination.

use thiserror_no_std::Error;

/// Result type for driver operations.
pub type DriverResult<T> = Result<T, DriverError>;

/// Errors reported by the sensor and indicator drivers.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverError {
    /// A configuration field is missing or out of range.
    #[error("invalid parameter: {reason}")]
    BadParam {
        /// What was wrong with the supplied configuration.
        reason: &'static str,
    },

    /// `configure()` was called twice without an intervening `deinit()`.
    #[error("already configured; deinit() is required before reconfiguring")]
    AlreadyConfigured,

    /// An operation was invoked before the driver was configured.
    #[error("not configured")]
    NotReady,

    /// No valid echo was observed within the measurement deadline.
    ///
    /// Indistinguishable at this level from a disconnected or silent sensor;
    /// consumers treat it as "no target currently detectable".
    #[error("no echo observed within the measurement deadline")]
    Timeout,

    /// The device is absent or in an unrecoverable error state.
    #[error("device fault: {reason}")]
    Device {
        /// Which hardware interaction failed.
        reason: &'static str,
    },
}

/// Escalations surfaced by the proximity state machine to the shell.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlError {
    /// A device fault was observed; the shell must perform a full restart.
    #[error("device fault ({source}); full device restart required")]
    RestartRequired {
        /// The driver error that triggered the escalation.
        source: DriverError,
    },

    /// A caller-contract violation; the shell must terminate after logging.
    #[error("contract violation: {reason}")]
    ContractViolation {
        /// Which contract was broken.
        reason: &'static str,
    },
}

#[cfg(feature = "defmt")]
impl defmt::Format for DriverError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::BadParam { reason } => defmt::write!(fmt, "invalid parameter: {}", reason),
            Self::AlreadyConfigured => defmt::write!(fmt, "already configured"),
            Self::NotReady => defmt::write!(fmt, "not configured"),
            Self::Timeout => defmt::write!(fmt, "echo timeout"),
            Self::Device { reason } => defmt::write!(fmt, "device fault: {}", reason),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ControlError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::RestartRequired { source } => {
                defmt::write!(fmt, "restart required: {}", source)
            }
            Self::ContractViolation { reason } => {
                defmt::write!(fmt, "contract violation: {}", reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_errors_are_copy_and_comparable() {
        let a = DriverError::BadParam { reason: "x" };
        let b = a;
        assert_eq!(a, b);
        assert_ne!(a, DriverError::Timeout);
    }

    #[test]
    #[cfg(feature = "std")]
    fn display_names_are_stable() {
        // Shells log these verbatim; keep the wording intact.
        assert_eq!(
            DriverError::Timeout.to_string(),
            "no echo observed within the measurement deadline"
        );
        let e = ControlError::ContractViolation {
            reason: "update called in fault state",
        };
        assert_eq!(
            e.to_string(),
            "contract violation: update called in fault state"
        );
    }
}
