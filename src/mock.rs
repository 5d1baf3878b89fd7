//! Test doubles for the sensor and indicator seams
//!
//! Deterministic substitutes for the hardware collaborators, usable from
//! this crate's tests and from downstream shells integration-testing their
//! cyclic loop. Both are no_std-compatible: scripts and histories live in
//! bounded `heapless` buffers.

use heapless::Vec;

use crate::errors::{DriverError, DriverResult};
use crate::traits::{Indicator, RangeSensor, Tier};

/// Maximum scripted measurements in a [`MockRangeSensor`].
pub const MOCK_SCRIPT_LEN: usize = 32;

/// Maximum recorded tier commands in a [`MockIndicator`].
pub const MOCK_HISTORY_LEN: usize = 64;

/// Scripted distance sensor.
///
/// Replays pushed results in order; the final entry repeats once the script
/// is exhausted, so a steady-state scenario needs only one trailing entry.
/// An empty script reports [`DriverError::NotReady`].
#[derive(Debug, Default)]
pub struct MockRangeSensor {
    script: Vec<DriverResult<u32>, MOCK_SCRIPT_LEN>,
    cursor: usize,
    /// Number of measurements taken so far.
    pub measurements: usize,
}

impl MockRangeSensor {
    /// Create a sensor with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one measurement outcome to the script.
    ///
    /// Panics when the script is full; tests should stay well under
    /// [`MOCK_SCRIPT_LEN`] entries.
    pub fn push(&mut self, result: DriverResult<u32>) {
        self.script.push(result).expect("mock script full");
    }
}

impl RangeSensor for MockRangeSensor {
    fn measure(&mut self, _ambient_temp_deci_c: i16) -> DriverResult<u32> {
        self.measurements += 1;
        if self.script.is_empty() {
            return Err(DriverError::NotReady);
        }
        let index = self.cursor.min(self.script.len() - 1);
        self.cursor += 1;
        self.script[index]
    }
}

/// Recording indicator.
///
/// Captures every tier command and self-test invocation; both operations
/// return scriptable results so escalation paths can be exercised.
#[derive(Debug)]
pub struct MockIndicator {
    /// Result returned by every `set_tier` call.
    pub tier_result: DriverResult<()>,
    /// Result returned by every `self_test` call.
    pub self_test_result: DriverResult<()>,
    /// Number of self-tests performed.
    pub self_test_calls: usize,
    /// Tier commands received, oldest first; saturates at
    /// [`MOCK_HISTORY_LEN`] by dropping further entries.
    pub history: Vec<Tier, MOCK_HISTORY_LEN>,
}

impl Default for MockIndicator {
    fn default() -> Self {
        Self {
            tier_result: Ok(()),
            self_test_result: Ok(()),
            self_test_calls: 0,
            history: Vec::new(),
        }
    }
}

impl MockIndicator {
    /// Create an indicator that accepts every command.
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent tier command, if any was accepted.
    pub fn last_tier(&self) -> Option<Tier> {
        self.history.last().copied()
    }
}

impl Indicator for MockIndicator {
    fn set_tier(&mut self, tier: Tier) -> DriverResult<()> {
        self.tier_result?;
        let _ = self.history.push(tier);
        Ok(())
    }

    fn self_test(&mut self) -> DriverResult<()> {
        self.self_test_calls += 1;
        self.self_test_result
    }
}
