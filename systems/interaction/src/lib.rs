#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure interaction system that turns pointer input and the selected tool into cell changes.

use city_experiment_core::{CellCoord, Command, Tool};
use glam::Vec2;

/// Converts a screen position into the tile beneath it.
///
/// The scroll offset is added before dividing by the tile size and each axis
/// is rounded to the nearest tile. Returns `None` when `tile_size` is not a
/// positive finite number or the position is not finite.
#[must_use]
pub fn screen_to_cell(screen: Vec2, scroll: Vec2, tile_size: f32) -> Option<CellCoord> {
    if !tile_size.is_finite() || tile_size <= 0.0 {
        return None;
    }

    let tile = ((screen + scroll) / tile_size).round();
    if !tile.is_finite() {
        return None;
    }
    Some(CellCoord::new(tile.x as i32, tile.y as i32))
}

/// Pointer activity reported by an adapter, already resolved to tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerEvent {
    /// The primary button was pressed over `cell`.
    Down {
        /// Tile under the pointer.
        cell: CellCoord,
    },
    /// The pointer moved over `cell`.
    Move {
        /// Tile under the pointer.
        cell: CellCoord,
        /// Whether the adapter reports the primary button as held.
        is_down: bool,
    },
}

/// Interaction system applying the selected tool under the pointer.
///
/// Button state is owned by the adapter and travels with each move, so a
/// press that starts outside the world still paints once the drag enters it.
#[derive(Debug, Default, Clone, Copy)]
pub struct Interaction;

impl Interaction {
    /// Creates a new interaction system.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Consumes pointer activity to emit cell change commands.
    ///
    /// `tool_index` is the externally selected palette entry. The `can_set`
    /// closure should mirror the world's `query::can_set_cell` helper so
    /// natural terrain and coordinates outside the grid stay untouched.
    pub fn handle<F>(
        &self,
        pointer: &[PointerEvent],
        tool_index: usize,
        mut can_set: F,
        out: &mut Vec<Command>,
    ) where
        F: FnMut(CellCoord) -> bool,
    {
        for event in pointer {
            let cell = match *event {
                PointerEvent::Down { cell } | PointerEvent::Move { cell, is_down: true } => cell,
                PointerEvent::Move { is_down: false, .. } => continue,
            };

            let Some(tool) = Tool::from_index(tool_index) else {
                log::error!("unknown tool index {tool_index}; ignoring pointer at {cell:?}");
                continue;
            };

            if let Some(kind) = tool.target() {
                if can_set(cell) {
                    out.push(Command::SetCell { cell, kind });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_positions_round_to_nearest_tile() {
        let scroll = Vec2::new(16.0, 0.0);
        assert_eq!(
            screen_to_cell(Vec2::new(0.0, 15.0), Vec2::ZERO, 32.0),
            Some(CellCoord::new(0, 0))
        );
        assert_eq!(
            screen_to_cell(Vec2::new(0.0, 17.0), Vec2::ZERO, 32.0),
            Some(CellCoord::new(0, 1))
        );
        assert_eq!(
            screen_to_cell(Vec2::new(40.0, 64.0), scroll, 32.0),
            Some(CellCoord::new(2, 2))
        );
        assert_eq!(
            screen_to_cell(Vec2::new(-20.0, 0.0), Vec2::ZERO, 32.0),
            Some(CellCoord::new(-1, 0))
        );
    }

    #[test]
    fn degenerate_tile_sizes_resolve_nothing() {
        assert_eq!(screen_to_cell(Vec2::ONE, Vec2::ZERO, 0.0), None);
        assert_eq!(screen_to_cell(Vec2::ONE, Vec2::ZERO, -4.0), None);
        assert_eq!(screen_to_cell(Vec2::ONE, Vec2::ZERO, f32::NAN), None);
    }
}
