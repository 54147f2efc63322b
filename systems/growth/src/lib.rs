#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Growth system that lets structures appear on zoned lots served by a road.
//!
//! Every simulation step the system scans the zoned lots in row-major order.
//! Each undeveloped lot with road access draws one percentile roll; rolls
//! below the configured chance request a structure from the world.

use std::collections::HashSet;

use city_experiment_core::{CellCoord, Command, Event, LotView};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const DEFAULT_CHANCE_PERCENT: u32 = 4;
const DEFAULT_SEED: u64 = 0x00C1_7E5E;

/// Source of uniformly distributed percentile rolls.
pub trait RollSource {
    /// Draws an integer in `0..100`.
    fn roll_percent(&mut self) -> u32;
}

/// Reproducible roll source backed by a seeded ChaCha stream.
#[derive(Clone, Debug)]
pub struct SeededRolls {
    rng: ChaCha8Rng,
}

impl SeededRolls {
    /// Creates a roll source whose sequence is fully determined by `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl RollSource for SeededRolls {
    fn roll_percent(&mut self) -> u32 {
        self.rng.gen_range(0..100)
    }
}

/// Configuration parameters required to construct the growth system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    chance_percent: u32,
    seed: u64,
}

impl Config {
    /// Creates a configuration with the provided chance per step and roll seed.
    ///
    /// Chances above one hundred are clamped.
    #[must_use]
    pub fn new(chance_percent: u32, seed: u64) -> Self {
        Self {
            chance_percent: chance_percent.min(100),
            seed,
        }
    }

    /// Percentage chance that an eligible lot develops during a step.
    #[must_use]
    pub const fn chance_percent(&self) -> u32 {
        self.chance_percent
    }

    /// Seed of the default roll source.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_CHANCE_PERCENT, DEFAULT_SEED)
    }
}

/// Pure system that converts simulation steps into structure requests.
#[derive(Debug)]
pub struct Growth<R = SeededRolls> {
    chance_percent: u32,
    rolls: R,
}

impl Growth<SeededRolls> {
    /// Creates a growth system drawing from a seeded roll source.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self::with_rolls(config, SeededRolls::new(config.seed))
    }
}

impl<R: RollSource> Growth<R> {
    /// Creates a growth system drawing from the provided roll source.
    #[must_use]
    pub fn with_rolls(config: Config, rolls: R) -> Self {
        Self {
            chance_percent: config.chance_percent,
            rolls,
        }
    }

    /// Consumes world events and the current lot view to emit structure requests.
    ///
    /// The view must be captured after the events were produced. A lot is
    /// requested at most once per call even when several steps are pending.
    pub fn handle(&mut self, events: &[Event], lots: &LotView, out: &mut Vec<Command>) {
        let steps = events
            .iter()
            .filter(|event| matches!(event, Event::TickAdvanced { .. }))
            .count();
        if steps == 0 || lots.is_empty() {
            return;
        }

        let mut requested: HashSet<CellCoord> = HashSet::new();
        for _ in 0..steps {
            for lot in lots.iter() {
                if lot.has_structure || !lot.road_access || requested.contains(&lot.cell) {
                    continue;
                }

                if self.rolls.roll_percent() < self.chance_percent {
                    log::debug!("{:?} lot at {:?} is developing", lot.zone, lot.cell);
                    let _ = requested.insert(lot.cell);
                    out.push(Command::BuildStructure { cell: lot.cell });
                }
            }
        }
    }
}
