#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Fixed-step clock that converts frame deltas into simulation ticks.

use std::time::Duration;

use city_experiment_core::Command;

const DEFAULT_QUANTUM: Duration = Duration::from_millis(100);

/// Configuration parameters required to construct the clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    quantum: Duration,
}

impl Config {
    /// Creates a configuration that ticks once per `quantum` of elapsed time.
    #[must_use]
    pub const fn new(quantum: Duration) -> Self {
        Self { quantum }
    }

    /// Simulated time covered by a single tick.
    #[must_use]
    pub const fn quantum(&self) -> Duration {
        self.quantum
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_QUANTUM)
    }
}

/// Accumulates wall-clock time and releases it one quantum at a time.
#[derive(Debug)]
pub struct SimulationClock {
    quantum: Duration,
    accumulator: Duration,
}

impl SimulationClock {
    /// Creates a clock with an empty accumulator.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self {
            quantum: config.quantum,
            accumulator: Duration::ZERO,
        }
    }

    /// Time carried over towards the next tick.
    #[must_use]
    pub const fn accumulator(&self) -> Duration {
        self.accumulator
    }

    /// Simulated time covered by a single tick.
    #[must_use]
    pub const fn quantum(&self) -> Duration {
        self.quantum
    }

    /// Adds `dt` to the accumulator and emits one tick per whole quantum.
    ///
    /// Returns the number of ticks pushed. A zero quantum never ticks.
    pub fn advance(&mut self, dt: Duration, out: &mut Vec<Command>) -> usize {
        if self.quantum.is_zero() {
            return 0;
        }

        self.accumulator = self.accumulator.saturating_add(dt);
        let ticks = self.resolve_ticks();
        out.extend(std::iter::repeat(Command::Tick).take(ticks));
        if ticks > 1 {
            log::debug!("clock catching up with {ticks} ticks after a {dt:?} frame");
        }
        ticks
    }

    fn resolve_ticks(&mut self) -> usize {
        let mut ticks = 0;
        while self.accumulator >= self.quantum {
            self.accumulator -= self.quantum;
            ticks += 1;
        }
        ticks
    }
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_quantum_keeps_time_untouched() {
        let mut clock = SimulationClock::new(Config::new(Duration::ZERO));
        let mut commands = Vec::new();

        assert_eq!(clock.advance(Duration::from_secs(5), &mut commands), 0);
        assert!(commands.is_empty());
        assert_eq!(clock.accumulator(), Duration::ZERO);
    }

    #[test]
    fn default_quantum_is_a_tenth_of_a_second() {
        assert_eq!(SimulationClock::default().quantum(), Duration::from_millis(100));
    }
}
