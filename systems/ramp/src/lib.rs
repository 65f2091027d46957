#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Simulation clock that maps elapsed match time to a difficulty ramp index.

use std::time::Duration;

use lane_defence_core::{Command, Event, RampIndex, SessionConfig};

/// Configuration parameters required to construct the ramp controller.
#[derive(Clone, Debug)]
pub struct Config {
    thresholds: Vec<Duration>,
}

impl Config {
    /// Creates a new configuration from explicit tier activation thresholds.
    ///
    /// `thresholds[i]` is the match time at which ramp index `i + 1` begins;
    /// index 0 governs from the start of the session.
    #[must_use]
    pub fn new(thresholds: Vec<Duration>) -> Self {
        Self { thresholds }
    }

    /// Extracts the ramp thresholds from a session configuration.
    #[must_use]
    pub fn from_session(session: &SessionConfig) -> Self {
        Self::new(session.ramp.thresholds.clone())
    }
}

/// Pure system that advances the session's difficulty ramp over match time.
///
/// The controller accumulates simulated time from `TimeAdvanced` events and
/// emits `Command::AdvanceRamp` whenever another threshold is crossed. The
/// produced index is monotonically non-decreasing because elapsed time only
/// grows within a session.
#[derive(Debug)]
pub struct RampController {
    thresholds: Vec<Duration>,
    elapsed: Duration,
    current: RampIndex,
}

impl RampController {
    /// Creates a new ramp controller using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            thresholds: config.thresholds,
            elapsed: Duration::ZERO,
            current: RampIndex::default(),
        }
    }

    /// Consumes events and emits a ramp advance when a threshold is crossed.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        let mut accumulated = Duration::ZERO;
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                accumulated = accumulated.saturating_add(*dt);
            }
        }

        if accumulated.is_zero() {
            return;
        }

        let before = self.current;
        let after = self.advance(accumulated);
        if after > before {
            out.push(Command::AdvanceRamp { index: after });
        }
    }

    /// Adds elapsed time and returns the ramp index now governing the match.
    pub fn advance(&mut self, dt: Duration) -> RampIndex {
        self.elapsed = self.elapsed.saturating_add(dt);
        let passed = self
            .thresholds
            .partition_point(|threshold| self.elapsed >= *threshold);
        let index = RampIndex::new(passed as u32);
        if index > self.current {
            self.current = index;
        }
        self.current
    }
}
