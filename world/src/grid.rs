//! Dense tile storage backing the world.

use city_experiment_core::{CellCoord, CellKind, CellType, RoadMask, VisualHandle, ZoneType};

/// Development state of a zoned lot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Lot {
    zone: ZoneType,
    has_structure: bool,
}

impl Lot {
    const fn new(zone: ZoneType) -> Self {
        Self {
            zone,
            has_structure: false,
        }
    }

    /// Zone the lot was painted with.
    #[must_use]
    pub const fn zone(&self) -> ZoneType {
        self.zone
    }

    /// Indicates whether a structure grew on the lot.
    #[must_use]
    pub const fn has_structure(&self) -> bool {
        self.has_structure
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Content {
    Empty,
    Mountain,
    Water,
    // `None` until the resolver derives the first mask.
    Road { mask: Option<RoadMask> },
    ZonedLot(Lot),
}

impl Content {
    const fn for_kind(kind: CellKind) -> Self {
        match kind {
            CellKind::Empty => Self::Empty,
            CellKind::Mountain => Self::Mountain,
            CellKind::Water => Self::Water,
            CellKind::Road => Self::Road { mask: None },
            CellKind::ZonedLot(zone) => Self::ZonedLot(Lot::new(zone)),
        }
    }
}

/// Single tile record owned by the grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    content: Content,
    visual: Option<VisualHandle>,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            content: Content::Empty,
            visual: None,
        }
    }
}

impl Cell {
    /// Type reported for the tile.
    #[must_use]
    pub const fn cell_type(&self) -> CellType {
        self.kind().cell_type()
    }

    /// Kind stored in the tile, including the zone of a lot.
    #[must_use]
    pub const fn kind(&self) -> CellKind {
        match self.content {
            Content::Empty => CellKind::Empty,
            Content::Mountain => CellKind::Mountain,
            Content::Water => CellKind::Water,
            Content::Road { .. } => CellKind::Road,
            Content::ZonedLot(lot) => CellKind::ZonedLot(lot.zone),
        }
    }

    /// Lot stored in the tile; present exactly when the tile is a zoned lot.
    #[must_use]
    pub const fn lot(&self) -> Option<&Lot> {
        match &self.content {
            Content::ZonedLot(lot) => Some(lot),
            _ => None,
        }
    }

    /// Road mask cached by the last resolver pass, if the tile is a road.
    #[must_use]
    pub const fn road_mask(&self) -> Option<RoadMask> {
        match self.content {
            Content::Road { mask } => mask,
            _ => None,
        }
    }

    /// Handle of the visual currently shown for the tile.
    #[must_use]
    pub const fn visual(&self) -> Option<VisualHandle> {
        self.visual
    }

    pub(crate) fn replace_kind(&mut self, kind: CellKind) {
        self.content = Content::for_kind(kind);
    }

    pub(crate) fn cache_road_mask(&mut self, mask: RoadMask) {
        if let Content::Road { mask: cached } = &mut self.content {
            *cached = Some(mask);
        }
    }

    /// Marks the lot as developed, returning `false` when there is no undeveloped lot.
    pub(crate) fn develop_lot(&mut self) -> bool {
        match &mut self.content {
            Content::ZonedLot(lot) if !lot.has_structure => {
                lot.has_structure = true;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn take_visual(&mut self) -> Option<VisualHandle> {
        self.visual.take()
    }

    pub(crate) fn attach_visual(&mut self, handle: VisualHandle) {
        debug_assert!(self.visual.is_none(), "visual must be released first");
        self.visual = Some(handle);
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Grid {
    columns: u32,
    rows: u32,
    cells: Vec<Cell>,
}

impl Grid {
    pub(crate) fn new(columns: u32, rows: u32) -> Self {
        let capacity_u64 = u64::from(columns) * u64::from(rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            columns,
            rows,
            cells: vec![Cell::default(); capacity],
        }
    }

    pub(crate) fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    pub(crate) fn len(&self) -> usize {
        self.cells.len()
    }

    /// Type of the tile at `cell`; `OutOfBounds` outside the grid.
    pub(crate) fn get(&self, cell: CellCoord) -> CellType {
        self.cell(cell).map_or(CellType::OutOfBounds, Cell::cell_type)
    }

    pub(crate) fn cell(&self, cell: CellCoord) -> Option<&Cell> {
        self.index(cell).and_then(|index| self.cells.get(index))
    }

    pub(crate) fn cell_mut(&mut self, cell: CellCoord) -> Option<&mut Cell> {
        self.index(cell).and_then(|index| self.cells.get_mut(index))
    }

    pub(crate) fn has_road_access(&self, cell: CellCoord) -> bool {
        cell.neighbors()
            .into_iter()
            .any(|(_, neighbor)| self.get(neighbor) == CellType::Road)
    }

    /// Iterates over every tile in row-major order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (CellCoord, &Cell)> + '_ {
        let width = usize::try_from(self.columns).unwrap_or(usize::MAX).max(1);
        self.cells.iter().enumerate().filter_map(move |(index, cell)| {
            let column = i32::try_from(index % width).ok()?;
            let row = i32::try_from(index / width).ok()?;
            Some((CellCoord::new(column, row), cell))
        })
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        let column = u32::try_from(cell.column()).ok()?;
        let row = u32::try_from(cell.row()).ok()?;
        if column < self.columns && row < self.rows {
            let row = usize::try_from(row).ok()?;
            let column = usize::try_from(column).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}
