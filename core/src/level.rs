//! Level layout format used to seed the world.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{CellCoord, CellKind, ZoneType};

/// Rectangular layout of single-character rows describing the initial world.
///
/// Row index maps to the tile row and character index to the tile column.
/// The serialised form matches the `{"level": [...]}` documents shipped with
/// the game.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    level: Vec<String>,
}

impl Level {
    /// Creates a level from the provided rows.
    #[must_use]
    pub fn from_rows<I, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            level: rows.into_iter().map(Into::into).collect(),
        }
    }

    /// Number of columns spanned by the widest row.
    #[must_use]
    pub fn width(&self) -> usize {
        self.level
            .iter()
            .map(|row| row.chars().count())
            .max()
            .unwrap_or(0)
    }

    /// Number of rows in the layout.
    #[must_use]
    pub fn height(&self) -> usize {
        self.level.len()
    }

    /// Verifies that the layout fits within a grid of the provided dimensions.
    pub fn ensure_fits(&self, columns: u32, rows: u32) -> Result<(), LevelError> {
        let width = self.width();
        let height = self.height();
        let fits_columns = u32::try_from(width).map_or(false, |width| width <= columns);
        let fits_rows = u32::try_from(height).map_or(false, |height| height <= rows);
        if fits_columns && fits_rows {
            Ok(())
        } else {
            Err(LevelError::ExceedsGrid {
                width,
                height,
                columns,
                rows,
            })
        }
    }

    /// Iterates over the tiles the layout places, in row-major order.
    ///
    /// Characters without a meaning leave their tile at its default.
    pub fn placements(&self) -> impl Iterator<Item = (CellCoord, CellKind)> + '_ {
        self.level.iter().enumerate().flat_map(|(row, line)| {
            line.chars().enumerate().filter_map(move |(column, glyph)| {
                let kind = kind_for_glyph(glyph)?;
                let column = i32::try_from(column).ok()?;
                let row = i32::try_from(row).ok()?;
                Some((CellCoord::new(column, row), kind))
            })
        })
    }
}

/// Maps a layout character onto the kind it places.
#[must_use]
pub fn kind_for_glyph(glyph: char) -> Option<CellKind> {
    match glyph {
        '^' => Some(CellKind::Mountain),
        'w' => Some(CellKind::Water),
        '=' => Some(CellKind::Road),
        'R' => Some(CellKind::ZonedLot(ZoneType::Residential)),
        _ => None,
    }
}

/// Errors raised while validating a level layout.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LevelError {
    /// The layout does not fit within the configured grid.
    #[error("level layout of {width}x{height} tiles exceeds the {columns}x{rows} grid")]
    ExceedsGrid {
        /// Columns spanned by the layout.
        width: usize,
        /// Rows spanned by the layout.
        height: usize,
        /// Columns available in the grid.
        columns: u32,
        /// Rows available in the grid.
        rows: u32,
    },
}
