#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure bootstrap system that prepares the City Experiment world.

use city_experiment_core::{Command, Level, LevelError};
use city_experiment_world::{query, World};
use thiserror::Error;

/// Errors raised while seeding a world from a level layout.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// The layout cannot be placed onto the world grid.
    #[error("level layout does not match the world")]
    Layout(#[from] LevelError),
}

/// Produces data and commands required to start the experience.
#[derive(Debug, Default)]
pub struct Bootstrap;

impl Bootstrap {
    /// Derives the banner that should be shown when the experience starts.
    #[must_use]
    pub fn welcome_banner<'world>(&self, world: &'world World) -> &'world str {
        query::welcome_banner(world)
    }

    /// Emits the cell changes that reproduce `level` on the world grid.
    ///
    /// Commands are produced in row-major order. Returns the number of
    /// commands pushed; nothing is pushed when the layout does not fit.
    pub fn seed_level(
        &self,
        world: &World,
        level: &Level,
        out: &mut Vec<Command>,
    ) -> Result<usize, BootstrapError> {
        let (columns, rows) = query::dimensions(world);
        level.ensure_fits(columns, rows)?;

        let before = out.len();
        out.extend(
            level
                .placements()
                .map(|(cell, kind)| Command::SetCell { cell, kind }),
        );
        let seeded = out.len() - before;
        log::debug!(
            "seeding {seeded} tiles from a {}x{} layout",
            level.width(),
            level.height()
        );
        Ok(seeded)
    }
}
