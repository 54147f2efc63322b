#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the City Experiment engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems and renderers to react to deterministically.

mod level;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

pub use level::{kind_for_glyph, Level, LevelError};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to City Experiment.";

/// Commands that express all permissible world mutations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    /// Converts the cell at the provided coordinate into the requested kind.
    SetCell {
        /// Tile that should change.
        cell: CellCoord,
        /// Kind the tile should hold after the change.
        kind: CellKind,
    },
    /// Advances the discrete simulation by a single step.
    Tick,
    /// Requests that a structure grows on the zoned lot at the provided cell.
    BuildStructure {
        /// Zoned lot that receives the structure.
        cell: CellCoord,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Event {
    /// Confirms that a cell switched to a new kind.
    CellChanged {
        /// Tile that changed.
        cell: CellCoord,
        /// Type the tile held before the change.
        from: CellType,
        /// Kind the tile holds after the change.
        to: CellKind,
    },
    /// Reports that a cell change request was rejected.
    CellChangeRejected {
        /// Tile named in the request.
        cell: CellCoord,
        /// Kind requested for the tile.
        kind: CellKind,
        /// Specific reason the change failed.
        reason: CellChangeError,
    },
    /// Announces that a road tile recomputed its neighbour mask.
    RoadMaskChanged {
        /// Road tile whose mask changed.
        cell: CellCoord,
        /// Mask describing the tile's road neighbours.
        mask: RoadMask,
    },
    /// Requests that the render collaborator creates a visual for a tile.
    VisualSpawned {
        /// Opaque handle identifying the visual until it is despawned.
        handle: VisualHandle,
        /// Tile the visual is drawn at.
        cell: CellCoord,
        /// Sprite drawn for the visual.
        sprite: Sprite,
    },
    /// Requests that the render collaborator destroys a previously spawned visual.
    VisualDespawned {
        /// Handle of the visual that must be released.
        handle: VisualHandle,
    },
    /// Indicates that the simulation advanced by a single step.
    TickAdvanced {
        /// Number of steps executed since the world was created.
        tick: u64,
    },
    /// Confirms that a structure grew on a zoned lot.
    StructureBuilt {
        /// Lot that received the structure.
        cell: CellCoord,
        /// Zone of the lot.
        zone: ZoneType,
    },
    /// Reports that a structure request was rejected.
    StructureRejected {
        /// Tile named in the request.
        cell: CellCoord,
        /// Specific reason the request failed.
        reason: StructureError,
    },
}

/// Location of a single tile expressed as column and row coordinates.
///
/// Coordinates are signed so that neighbours of edge tiles remain
/// representable; such coordinates simply lie outside the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellCoord {
    column: i32,
    row: i32,
}

impl CellCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Column index of the tile, increasing towards the east.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Row index of the tile, increasing towards the south.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Returns the orthogonally adjacent tile in the provided direction.
    #[must_use]
    pub const fn neighbor(self, direction: Direction) -> Self {
        let (column_offset, row_offset) = direction.offset();
        Self {
            column: self.column.saturating_add(column_offset),
            row: self.row.saturating_add(row_offset),
        }
    }

    /// Lists the four orthogonal neighbours in mask bit order.
    #[must_use]
    pub fn neighbors(self) -> [(Direction, CellCoord); 4] {
        Direction::ALL.map(|direction| (direction, self.neighbor(direction)))
    }
}

/// Cardinal directions used when inspecting orthogonal neighbours.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Towards decreasing row indices.
    North,
    /// Towards increasing column indices.
    East,
    /// Towards decreasing column indices.
    West,
    /// Towards increasing row indices.
    South,
}

impl Direction {
    /// Every direction ordered by its road mask bit.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::West,
        Direction::South,
    ];

    /// Column and row offset that moves one tile in this direction.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::West => (-1, 0),
            Self::South => (0, 1),
        }
    }

    /// Bit contributed to a [`RoadMask`] by a road neighbour in this direction.
    #[must_use]
    pub const fn road_bit(self) -> u8 {
        match self {
            Self::North => 0b0001,
            Self::East => 0b0010,
            Self::West => 0b0100,
            Self::South => 0b1000,
        }
    }
}

/// Type reported for a tile when querying the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellType {
    /// Synthetic type reported for coordinates outside the grid.
    OutOfBounds,
    /// Buildable land without content.
    Empty,
    /// Natural terrain that blocks construction.
    Mountain,
    /// Natural terrain that blocks construction.
    Water,
    /// Road tile drawn with a connective sprite.
    Road,
    /// Lot flagged for development under a zone.
    ZonedLot,
}

impl CellType {
    /// Reports whether tools may change a tile of this type.
    #[must_use]
    pub const fn is_buildable(self) -> bool {
        !matches!(self, Self::OutOfBounds | Self::Mountain | Self::Water)
    }
}

/// Kind a tile can be converted into, bundling the zone of zoned lots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    /// Buildable land without content.
    Empty,
    /// Natural mountain terrain.
    Mountain,
    /// Natural water terrain.
    Water,
    /// Road tile.
    Road,
    /// Lot zoned for the provided category.
    ZonedLot(ZoneType),
}

impl CellKind {
    /// Projects the kind onto the type reported by grid queries.
    #[must_use]
    pub const fn cell_type(self) -> CellType {
        match self {
            Self::Empty => CellType::Empty,
            Self::Mountain => CellType::Mountain,
            Self::Water => CellType::Water,
            Self::Road => CellType::Road,
            Self::ZonedLot(_) => CellType::ZonedLot,
        }
    }

    /// Sprite shown for a freshly converted tile that does not depend on neighbours.
    ///
    /// Roads return `None` because their sprite is derived from the road mask.
    #[must_use]
    pub const fn static_sprite(self) -> Option<Sprite> {
        match self {
            Self::Empty | Self::Road => None,
            Self::Mountain => Some(Sprite::Mountain),
            Self::Water => Some(Sprite::Water),
            Self::ZonedLot(zone) => zone.zone_sprite(),
        }
    }
}

/// Development category stored on a zoned lot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZoneType {
    /// Housing.
    Residential,
    /// Shops.
    Commercial,
    /// Offices.
    Office,
    /// Factories.
    Industrial,
}

impl ZoneType {
    /// Single-bit mask identifying the zone.
    #[must_use]
    pub const fn mask(self) -> ZoneMask {
        match self {
            Self::Residential => ZoneMask::RESIDENTIAL,
            Self::Commercial => ZoneMask::COMMERCIAL,
            Self::Office => ZoneMask::OFFICE,
            Self::Industrial => ZoneMask::INDUSTRIAL,
        }
    }

    /// Reports whether the zone falls within the provided query mask.
    #[must_use]
    pub fn matches(self, query: ZoneMask) -> bool {
        query.contains(self.mask())
    }

    /// Sprite marking an undeveloped lot of this zone.
    ///
    /// Only residential zoning has artwork; other zones stay without a visual.
    #[must_use]
    pub const fn zone_sprite(self) -> Option<Sprite> {
        match self {
            Self::Residential => Some(Sprite::ZoneResidential),
            Self::Commercial | Self::Office | Self::Industrial => None,
        }
    }

    /// Primary structure sprite shown once a lot of this zone develops.
    #[must_use]
    pub const fn structure_sprite(self) -> Sprite {
        match self {
            Self::Residential => Sprite::House,
            Self::Commercial => Sprite::SmallShop,
            Self::Office => Sprite::Office,
            Self::Industrial => Sprite::Factory,
        }
    }
}

bitflags! {
    /// Bit set of zones used when querying lots.
    ///
    /// Composite masks are valid queries but never stored on a lot.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ZoneMask: u8 {
        /// Residential lots.
        const RESIDENTIAL = 0b0001;
        /// Commercial lots.
        const COMMERCIAL = 0b0010;
        /// Office lots.
        const OFFICE = 0b0100;
        /// Industrial lots.
        const INDUSTRIAL = 0b1000;
        /// Commercial or office lots.
        const COMMERCIAL_OR_OFFICE = Self::COMMERCIAL.bits() | Self::OFFICE.bits();
        /// Lots of any zone.
        const ANY = 0b1111;
    }
}

/// Four-bit encoding of which orthogonal neighbours of a road are roads.
///
/// Bits follow [`Direction::road_bit`]: north, east, west, south.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoadMask(u8);

impl RoadMask {
    /// Mask of a road without road neighbours.
    pub const ISOLATED: Self = Self(0);

    /// Mask of a road connected on all four sides.
    pub const FOUR_WAY: Self = Self(0b1111);

    /// Creates a mask from raw bits, discarding bits above the fourth.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0b1111)
    }

    /// Builds a mask by asking whether the neighbour in each direction is a road.
    #[must_use]
    pub fn from_neighbors(mut is_road: impl FnMut(Direction) -> bool) -> Self {
        Direction::ALL
            .into_iter()
            .filter(|direction| is_road(*direction))
            .fold(Self::ISOLATED, Self::with)
    }

    /// Raw bit representation of the mask.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns the mask with the bit for `direction` set.
    #[must_use]
    pub const fn with(self, direction: Direction) -> Self {
        Self(self.0 | direction.road_bit())
    }

    /// Reports whether the neighbour in `direction` is a road.
    #[must_use]
    pub const fn contains(self, direction: Direction) -> bool {
        self.0 & direction.road_bit() != 0
    }

    /// Connective sprite drawn for a road with this mask.
    #[must_use]
    pub const fn sprite(self) -> Sprite {
        ROAD_SPRITES[self.0 as usize]
    }
}

const ROAD_SPRITES: [Sprite; 16] = [
    Sprite::RoadIsolated,
    Sprite::RoadNorth,
    Sprite::RoadEast,
    Sprite::RoadNorthEast,
    Sprite::RoadWest,
    Sprite::RoadNorthWest,
    Sprite::RoadEastWest,
    Sprite::RoadNorthEastWest,
    Sprite::RoadSouth,
    Sprite::RoadNorthSouth,
    Sprite::RoadEastSouth,
    Sprite::RoadNorthEastSouth,
    Sprite::RoadWestSouth,
    Sprite::RoadNorthWestSouth,
    Sprite::RoadEastWestSouth,
    Sprite::RoadFourWay,
];

/// Sprites available in the city tile sheet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sprite {
    /// Developed residential lot.
    House,
    /// Developed commercial lot.
    SmallShop,
    /// Developed office lot.
    Office,
    /// Developed industrial lot.
    Factory,
    /// Mountain terrain.
    Mountain,
    /// Water terrain.
    Water,
    /// Undeveloped residential lot.
    ZoneResidential,
    /// Road without road neighbours.
    RoadIsolated,
    /// Dead end opening north.
    RoadNorth,
    /// Dead end opening east.
    RoadEast,
    /// Dead end opening west.
    RoadWest,
    /// Dead end opening south.
    RoadSouth,
    /// Corner joining north and east.
    RoadNorthEast,
    /// Corner joining north and west.
    RoadNorthWest,
    /// Straight road running north to south.
    RoadNorthSouth,
    /// Straight road running east to west.
    RoadEastWest,
    /// Corner joining east and south.
    RoadEastSouth,
    /// Corner joining west and south.
    RoadWestSouth,
    /// T junction closed to the south.
    RoadNorthEastWest,
    /// T junction closed to the west.
    RoadNorthEastSouth,
    /// T junction closed to the east.
    RoadNorthWestSouth,
    /// T junction closed to the north.
    RoadEastWestSouth,
    /// Crossing joining all four directions.
    RoadFourWay,
}

impl Sprite {
    /// Frame index of the sprite within the 32 pixel city tile sheet.
    #[must_use]
    pub const fn sheet_index(self) -> u16 {
        match self {
            Self::House => 0,
            Self::SmallShop => 1,
            Self::Office => 2,
            Self::Factory => 23,
            Self::Mountain => 26,
            Self::Water => 45,
            Self::ZoneResidential => 64,
            Self::RoadEastSouth => 40,
            Self::RoadWestSouth => 41,
            Self::RoadFourWay => 42,
            Self::RoadIsolated => 43,
            Self::RoadNorthEast => 60,
            Self::RoadNorthWest => 61,
            Self::RoadEastWest => 62,
            Self::RoadNorthSouth => 63,
            Self::RoadNorthEastSouth => 80,
            Self::RoadNorthWestSouth => 81,
            Self::RoadEastWestSouth => 100,
            Self::RoadNorthEastWest => 101,
            Self::RoadEast => 102,
            Self::RoadWest => 103,
            Self::RoadSouth => 122,
            Self::RoadNorth => 123,
        }
    }

    /// Reports whether the sprite is one of the connective road variants.
    #[must_use]
    pub const fn is_road(self) -> bool {
        !matches!(
            self,
            Self::House
                | Self::SmallShop
                | Self::Office
                | Self::Factory
                | Self::Mountain
                | Self::Water
                | Self::ZoneResidential
        )
    }
}

/// Opaque handle identifying a visual owned by the render collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VisualHandle(u64);

impl VisualHandle {
    /// Creates a handle with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Immutable representation of a single zoned lot used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LotSnapshot {
    /// Tile occupied by the lot.
    pub cell: CellCoord,
    /// Zone the lot was painted with.
    pub zone: ZoneType,
    /// Indicates whether a structure already grew on the lot.
    pub has_structure: bool,
    /// Indicates whether any orthogonal neighbour is a road.
    pub road_access: bool,
}

/// Read-only snapshot describing zoned lots in row-major order.
#[derive(Clone, Debug, Default)]
pub struct LotView {
    snapshots: Vec<LotSnapshot>,
}

impl LotView {
    /// Creates a new lot view, ordering snapshots by row and then column.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<LotSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| (snapshot.cell.row(), snapshot.cell.column()));
        Self { snapshots }
    }

    /// Iterator over the captured lot snapshots in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &LotSnapshot> {
        self.snapshots.iter()
    }

    /// Number of lots captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view captured no lots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<LotSnapshot> {
        self.snapshots
    }
}

/// Tools the player can select from the palette.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tool {
    /// Inspects tiles without changing them.
    Select,
    /// Paints road tiles.
    DrawRoad,
    /// Zones lots for residential development.
    ZoneResidential,
    /// Clears tiles back to empty land.
    Demolish,
}

impl Tool {
    /// Every tool in palette order.
    pub const ALL: [Tool; 4] = [
        Tool::Select,
        Tool::DrawRoad,
        Tool::ZoneResidential,
        Tool::Demolish,
    ];

    /// Resolves a palette index into a tool.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Position of the tool within the palette.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Select => 0,
            Self::DrawRoad => 1,
            Self::ZoneResidential => 2,
            Self::Demolish => 3,
        }
    }

    /// Label displayed in the palette.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::DrawRoad => "draw road",
            Self::ZoneResidential => "zone residential",
            Self::Demolish => "demolish",
        }
    }

    /// Kind a tile is converted into when the tool is applied, if any.
    #[must_use]
    pub const fn target(self) -> Option<CellKind> {
        match self {
            Self::Select => None,
            Self::DrawRoad => Some(CellKind::Road),
            Self::ZoneResidential => Some(CellKind::ZonedLot(ZoneType::Residential)),
            Self::Demolish => Some(CellKind::Empty),
        }
    }
}

/// Reasons a cell change request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellChangeError {
    /// The coordinate lies outside the grid.
    OutOfBounds,
}

/// Reasons a structure request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StructureError {
    /// The coordinate lies outside the grid.
    OutOfBounds,
    /// The tile is not a zoned lot.
    NotZoned,
    /// The lot already carries a structure.
    AlreadyBuilt,
    /// No orthogonal neighbour of the lot is a road.
    NoRoadAccess,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn road_mask_bits_follow_direction_order() {
        let mask = RoadMask::from_neighbors(|direction| {
            matches!(direction, Direction::North | Direction::East)
        });
        assert_eq!(mask.bits(), 0b0011);
        assert!(mask.contains(Direction::North));
        assert!(!mask.contains(Direction::South));
        assert_eq!(mask.sprite(), Sprite::RoadNorthEast);
    }

    #[test]
    fn road_sprite_table_matches_connections() {
        let expectations = [
            (0b0000, Sprite::RoadIsolated),
            (0b0001, Sprite::RoadNorth),
            (0b0010, Sprite::RoadEast),
            (0b0100, Sprite::RoadWest),
            (0b1000, Sprite::RoadSouth),
            (0b0011, Sprite::RoadNorthEast),
            (0b0101, Sprite::RoadNorthWest),
            (0b1001, Sprite::RoadNorthSouth),
            (0b0110, Sprite::RoadEastWest),
            (0b1010, Sprite::RoadEastSouth),
            (0b1100, Sprite::RoadWestSouth),
            (0b0111, Sprite::RoadNorthEastWest),
            (0b1011, Sprite::RoadNorthEastSouth),
            (0b1101, Sprite::RoadNorthWestSouth),
            (0b1110, Sprite::RoadEastWestSouth),
            (0b1111, Sprite::RoadFourWay),
        ];

        for (bits, sprite) in expectations {
            assert_eq!(RoadMask::from_bits(bits).sprite(), sprite, "mask {bits:#06b}");
            assert!(sprite.is_road());
        }
    }

    #[test]
    fn road_mask_discards_high_bits() {
        assert_eq!(RoadMask::from_bits(0b1111_0001), RoadMask::from_bits(0b0001));
    }

    #[test]
    fn neighbors_of_origin_leave_the_grid_without_wrapping() {
        let neighbors = CellCoord::new(0, 0).neighbors();
        assert_eq!(neighbors[0], (Direction::North, CellCoord::new(0, -1)));
        assert_eq!(neighbors[2], (Direction::West, CellCoord::new(-1, 0)));
        assert_eq!(
            CellCoord::new(i32::MIN, 0).neighbor(Direction::West),
            CellCoord::new(i32::MIN, 0)
        );
    }

    #[test]
    fn natural_terrain_and_void_are_not_buildable() {
        assert!(!CellType::OutOfBounds.is_buildable());
        assert!(!CellType::Mountain.is_buildable());
        assert!(!CellType::Water.is_buildable());
        assert!(CellType::Empty.is_buildable());
        assert!(CellType::Road.is_buildable());
        assert!(CellType::ZonedLot.is_buildable());
    }

    #[test]
    fn composite_zone_masks_cover_their_members() {
        assert!(ZoneType::Commercial.matches(ZoneMask::COMMERCIAL_OR_OFFICE));
        assert!(ZoneType::Office.matches(ZoneMask::COMMERCIAL_OR_OFFICE));
        assert!(!ZoneType::Residential.matches(ZoneMask::COMMERCIAL_OR_OFFICE));
        assert!(ZoneType::Industrial.matches(ZoneMask::ANY));
        assert_eq!(ZoneMask::COMMERCIAL_OR_OFFICE.bits(), 0b0110);
    }

    #[test]
    fn only_residential_zoning_has_a_lot_sprite() {
        assert_eq!(
            CellKind::ZonedLot(ZoneType::Residential).static_sprite(),
            Some(Sprite::ZoneResidential)
        );
        assert_eq!(CellKind::ZonedLot(ZoneType::Office).static_sprite(), None);
        assert_eq!(CellKind::Road.static_sprite(), None);
        assert_eq!(CellKind::Water.static_sprite(), Some(Sprite::Water));
    }

    #[test]
    fn tool_indices_round_trip_and_reject_unknown_values() {
        for tool in Tool::ALL {
            assert_eq!(Tool::from_index(tool.index()), Some(tool));
        }
        assert_eq!(Tool::from_index(4), None);
        assert_eq!(Tool::Select.target(), None);
        assert_eq!(Tool::Demolish.target(), Some(CellKind::Empty));
    }
}
