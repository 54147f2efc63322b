#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for City Experiment.

mod grid;
mod roads;

use city_experiment_core::{
    CellChangeError, CellCoord, CellKind, Command, Direction, Event, Sprite, StructureError,
    VisualHandle, WELCOME_BANNER,
};
use thiserror::Error;

use self::grid::Grid;

pub use self::grid::{Cell, Lot};

const DEFAULT_GRID_COLUMNS: u32 = 64;
const DEFAULT_GRID_ROWS: u32 = 64;

/// Dimensions of the tile grid, fixed for the lifetime of a world.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorldConfig {
    columns: u32,
    rows: u32,
}

impl WorldConfig {
    /// Creates a configuration describing a grid of the provided size.
    #[must_use]
    pub const fn new(columns: u32, rows: u32) -> Self {
        Self { columns, rows }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self::new(DEFAULT_GRID_COLUMNS, DEFAULT_GRID_ROWS)
    }
}

/// Errors raised while constructing a world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum WorldError {
    /// The grid would contain no tiles.
    #[error("world grid must contain at least one tile (received {columns}x{rows})")]
    EmptyGrid {
        /// Requested number of columns.
        columns: u32,
        /// Requested number of rows.
        rows: u32,
    },
    /// The grid cannot be addressed with signed tile coordinates.
    #[error("world grid of {columns}x{rows} tiles exceeds the addressable range")]
    TooLarge {
        /// Requested number of columns.
        columns: u32,
        /// Requested number of rows.
        rows: u32,
    },
}

/// Represents the authoritative City Experiment world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    grid: Grid,
    tick_index: u64,
    next_visual: u64,
}

impl World {
    /// Creates an empty world whose grid matches the provided configuration.
    pub fn new(config: WorldConfig) -> Result<Self, WorldError> {
        let WorldConfig { columns, rows } = config;
        if columns == 0 || rows == 0 {
            return Err(WorldError::EmptyGrid { columns, rows });
        }

        let addressable = i32::try_from(columns).is_ok()
            && i32::try_from(rows).is_ok()
            && usize::try_from(u64::from(columns) * u64::from(rows)).is_ok();
        if !addressable {
            return Err(WorldError::TooLarge { columns, rows });
        }

        Ok(Self {
            banner: WELCOME_BANNER,
            grid: Grid::new(columns, rows),
            tick_index: 0,
            next_visual: 0,
        })
    }

    fn set_cell(&mut self, cell: CellCoord, kind: CellKind, out_events: &mut Vec<Event>) {
        let Some(previous) = self.grid.cell(cell).map(Cell::kind) else {
            log::warn!("rejected change of out-of-bounds cell {cell:?} to {kind:?}");
            out_events.push(Event::CellChangeRejected {
                cell,
                kind,
                reason: CellChangeError::OutOfBounds,
            });
            return;
        };

        if previous == kind {
            return;
        }

        self.release_visual(cell, out_events);
        if let Some(target) = self.grid.cell_mut(cell) {
            target.replace_kind(kind);
        }
        out_events.push(Event::CellChanged {
            cell,
            from: previous.cell_type(),
            to: kind,
        });

        if kind == CellKind::Road {
            self.update_road_visual(cell, out_events);
        } else if let Some(sprite) = kind.static_sprite() {
            self.spawn_visual(cell, sprite, out_events);
        }

        if previous == CellKind::Road {
            for direction in [
                Direction::West,
                Direction::East,
                Direction::North,
                Direction::South,
            ] {
                self.update_road_visual(cell.neighbor(direction), out_events);
            }
        }
    }

    fn build_structure(&mut self, cell: CellCoord, out_events: &mut Vec<Event>) {
        let zone = match self.grid.cell(cell) {
            None => Err(StructureError::OutOfBounds),
            Some(target) => match target.lot() {
                None => Err(StructureError::NotZoned),
                Some(lot) if lot.has_structure() => Err(StructureError::AlreadyBuilt),
                Some(_) if !self.grid.has_road_access(cell) => Err(StructureError::NoRoadAccess),
                Some(lot) => Ok(lot.zone()),
            },
        };

        let zone = match zone {
            Ok(zone) => zone,
            Err(reason) => {
                log::warn!("rejected structure at {cell:?}: {reason:?}");
                out_events.push(Event::StructureRejected { cell, reason });
                return;
            }
        };

        if let Some(target) = self.grid.cell_mut(cell) {
            let developed = target.develop_lot();
            debug_assert!(developed, "validated lot must develop");
        }
        self.spawn_visual(cell, zone.structure_sprite(), out_events);
        log::debug!("{zone:?} structure grew at {cell:?}");
        out_events.push(Event::StructureBuilt { cell, zone });
    }

    /// Replaces the visual of `cell`, releasing the previous one first.
    fn spawn_visual(&mut self, cell: CellCoord, sprite: Sprite, out_events: &mut Vec<Event>) {
        self.release_visual(cell, out_events);
        let Some(target) = self.grid.cell_mut(cell) else {
            return;
        };

        let handle = VisualHandle::new(self.next_visual);
        self.next_visual = self.next_visual.wrapping_add(1);
        target.attach_visual(handle);
        out_events.push(Event::VisualSpawned {
            handle,
            cell,
            sprite,
        });
    }

    fn release_visual(&mut self, cell: CellCoord, out_events: &mut Vec<Event>) {
        if let Some(handle) = self.grid.cell_mut(cell).and_then(Cell::take_visual) {
            out_events.push(Event::VisualDespawned { handle });
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self {
            banner: WELCOME_BANNER,
            grid: Grid::new(DEFAULT_GRID_COLUMNS, DEFAULT_GRID_ROWS),
            tick_index: 0,
            next_visual: 0,
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::SetCell { cell, kind } => world.set_cell(cell, kind, out_events),
        Command::Tick => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TickAdvanced {
                tick: world.tick_index,
            });
        }
        Command::BuildStructure { cell } => world.build_structure(cell, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use city_experiment_core::{CellCoord, CellType, LotSnapshot, LotView, VisualHandle, ZoneMask};

    use super::{Cell, World};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Number of columns and rows in the tile grid.
    #[must_use]
    pub fn dimensions(world: &World) -> (u32, u32) {
        world.grid.dimensions()
    }

    /// Type of the tile at `cell`, or `OutOfBounds` outside the grid.
    #[must_use]
    pub fn cell_type(world: &World, cell: CellCoord) -> CellType {
        world.grid.get(cell)
    }

    /// Provides read-only access to the tile at `cell` when it lies inside the grid.
    #[must_use]
    pub fn cell(world: &World, cell: CellCoord) -> Option<&Cell> {
        world.grid.cell(cell)
    }

    /// Reports whether tools may change the tile at `cell`.
    ///
    /// Natural terrain and coordinates outside the grid are never changed,
    /// whatever kind the caller intends to place.
    #[must_use]
    pub fn can_set_cell(world: &World, cell: CellCoord) -> bool {
        world.grid.get(cell).is_buildable()
    }

    /// Reports whether any orthogonal neighbour of `cell` is a road.
    #[must_use]
    pub fn has_road_access(world: &World, cell: CellCoord) -> bool {
        world.grid.has_road_access(cell)
    }

    /// Number of simulation steps executed since the world was created.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Captures the zoned lots whose zone falls within `zones`, in row-major order.
    #[must_use]
    pub fn lot_view(world: &World, zones: ZoneMask) -> LotView {
        let snapshots = world
            .grid
            .iter()
            .filter_map(|(coord, cell)| {
                let lot = cell.lot()?;
                lot.zone().matches(zones).then(|| LotSnapshot {
                    cell: coord,
                    zone: lot.zone(),
                    has_structure: lot.has_structure(),
                    road_access: world.grid.has_road_access(coord),
                })
            })
            .collect();
        LotView::from_snapshots(snapshots)
    }

    /// Enumerates the visuals currently attached to tiles, in row-major order.
    pub fn visuals(world: &World) -> impl Iterator<Item = (CellCoord, VisualHandle)> + '_ {
        world
            .grid
            .iter()
            .filter_map(|(coord, cell)| cell.visual().map(|handle| (coord, handle)))
    }
}
