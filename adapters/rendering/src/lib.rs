#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for City Experiment adapters.

use anyhow::Result as AnyResult;
use city_experiment_core::{CellCoord, Event, Sprite, Tool, VisualHandle};
use glam::Vec2;
use std::{collections::BTreeMap, error::Error, fmt, time::Duration};

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct FrameInput {
    /// Pointer position in screen pixels, if the pointer is over the window.
    pub cursor_screen: Option<Vec2>,
    /// Whether the primary button was pressed on this frame.
    pub pointer_pressed: bool,
    /// Whether the primary button is held down on this frame.
    pub pointer_down: bool,
    /// Held camera directions; each axis is -1, 0 or 1.
    pub pan: Vec2,
}

/// Scrollable view onto the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    scroll: Vec2,
    speed: f32,
}

impl Camera {
    /// Pan speed in pixels per millisecond used by the shipped game.
    pub const DEFAULT_SPEED: f32 = 0.4;

    /// Creates a camera at the provided scroll offset.
    #[must_use]
    pub const fn new(scroll: Vec2, speed: f32) -> Self {
        Self { scroll, speed }
    }

    /// Creates a camera whose viewport is centred on the world.
    #[must_use]
    pub fn centered(world_size: Vec2, viewport: Vec2, speed: f32) -> Self {
        Self::new(world_size / 2.0 - viewport / 2.0, speed)
    }

    /// Offset of the viewport's top-left corner in world pixels.
    #[must_use]
    pub const fn scroll(&self) -> Vec2 {
        self.scroll
    }

    /// Moves the camera by `speed * dt` milliseconds along each held direction.
    pub fn pan(&mut self, direction: Vec2, dt: Duration) {
        let direction = direction.clamp(Vec2::NEG_ONE, Vec2::ONE);
        let distance = self.speed * dt.as_secs_f32() * 1_000.0;
        self.scroll += direction * distance;
    }
}

/// Vertical list of tools drawn over the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ToolPalette {
    origin: Vec2,
    entry_size: Vec2,
    spacing: f32,
}

impl ToolPalette {
    /// Creates a palette whose first entry starts at `origin`.
    #[must_use]
    pub const fn new(origin: Vec2, entry_size: Vec2, spacing: f32) -> Self {
        Self {
            origin,
            entry_size,
            spacing,
        }
    }

    /// Screen-space top-left corner and size of the entry for `tool`.
    #[must_use]
    pub fn entry_bounds(&self, tool: Tool) -> (Vec2, Vec2) {
        let offset = Vec2::new(0.0, self.spacing * tool.index() as f32);
        (self.origin + offset, self.entry_size)
    }

    /// Tool whose entry contains the screen position, if any.
    #[must_use]
    pub fn tool_at(&self, point: Vec2) -> Option<Tool> {
        Tool::ALL.into_iter().find(|tool| {
            let (min, size) = self.entry_bounds(*tool);
            let max = min + size;
            point.x >= min.x && point.y >= min.y && point.x < max.x && point.y < max.y
        })
    }
}

impl Default for ToolPalette {
    fn default() -> Self {
        Self::new(Vec2::splat(16.0), Vec2::new(176.0, 32.0), 48.0)
    }
}

/// Describes the tile grid that composes the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileGridPresentation {
    /// Number of columns in the grid.
    pub columns: u32,
    /// Number of rows in the grid.
    pub rows: u32,
    /// Edge length of a tile in pixels.
    pub tile_size: f32,
}

impl TileGridPresentation {
    /// Tile edge length of the shipped sprite sheet.
    pub const DEFAULT_TILE_SIZE: f32 = 32.0;

    /// Creates a new tile grid descriptor.
    pub fn new(columns: u32, rows: u32, tile_size: f32) -> Result<Self, RenderingError> {
        if !tile_size.is_finite() || tile_size <= 0.0 {
            return Err(RenderingError::InvalidTileSize { tile_size });
        }

        Ok(Self {
            columns,
            rows,
            tile_size,
        })
    }

    /// Size of the whole grid in pixels.
    #[must_use]
    pub fn world_size(&self) -> Vec2 {
        Vec2::new(self.columns as f32, self.rows as f32) * self.tile_size
    }
}

/// Sprite drawn for a live visual.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpriteInstance {
    /// Tile the sprite is drawn at.
    pub cell: CellCoord,
    /// Sprite sheet frame drawn.
    pub sprite: Sprite,
}

/// Scene description combining the grid, live visuals, camera and palette.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Tile grid that composes the world.
    pub tile_grid: TileGridPresentation,
    /// Camera scrolling over the world.
    pub camera: Camera,
    /// Palette used to select tools.
    pub palette: ToolPalette,
    sprites: BTreeMap<VisualHandle, SpriteInstance>,
    tick: u64,
    selected_tool: Tool,
}

impl Scene {
    /// Creates an empty scene with the first tool selected.
    #[must_use]
    pub fn new(tile_grid: TileGridPresentation, camera: Camera, palette: ToolPalette) -> Self {
        Self {
            tile_grid,
            camera,
            palette,
            sprites: BTreeMap::new(),
            tick: 0,
            selected_tool: Tool::Select,
        }
    }

    /// Mirrors world events into the scene's visuals and status.
    pub fn apply_events(&mut self, events: &[Event]) {
        for event in events {
            match *event {
                Event::VisualSpawned {
                    handle,
                    cell,
                    sprite,
                } => {
                    if self
                        .sprites
                        .insert(handle, SpriteInstance { cell, sprite })
                        .is_some()
                    {
                        log::warn!("visual {handle:?} spawned twice; keeping the latest sprite");
                    }
                }
                Event::VisualDespawned { handle } => {
                    if self.sprites.remove(&handle).is_none() {
                        log::warn!("despawn requested for unknown visual {handle:?}");
                    }
                }
                Event::TickAdvanced { tick } => self.tick = tick,
                _ => {}
            }
        }
    }

    /// Status text drawn below the palette.
    #[must_use]
    pub fn status_line(&self) -> String {
        format!("time = {}", self.tick)
    }

    /// Tool currently highlighted in the palette.
    #[must_use]
    pub const fn selected_tool(&self) -> Tool {
        self.selected_tool
    }

    /// Highlights `tool` in the palette.
    pub fn select_tool(&mut self, tool: Tool) {
        self.selected_tool = tool;
    }

    /// Live sprites ordered by handle.
    pub fn sprites(&self) -> impl Iterator<Item = (VisualHandle, &SpriteInstance)> {
        self.sprites.iter().map(|(handle, instance)| (*handle, instance))
    }

    /// Number of live sprites.
    #[must_use]
    pub fn sprite_count(&self) -> usize {
        self.sprites.len()
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            scene,
        }
    }
}

/// Rendering backend capable of presenting City Experiment scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the frame delta and the
    /// input captured by the adapter, and may mutate the scene before it is
    /// presented.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq)]
pub enum RenderingError {
    /// Tiles must have a positive finite size.
    InvalidTileSize {
        /// Provided tile size that failed validation.
        tile_size: f32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTileSize { tile_size } => {
                write!(f, "tile_size must be positive (received {tile_size})")
            }
        }
    }
}

impl Error for RenderingError {}

#[cfg(test)]
mod tests {
    use super::*;
    use city_experiment_core::{CellKind, CellType};

    fn scene() -> Scene {
        let tile_grid = TileGridPresentation::new(64, 64, 32.0).expect("valid grid");
        Scene::new(
            tile_grid,
            Camera::centered(
                tile_grid.world_size(),
                Vec2::new(1024.0, 576.0),
                Camera::DEFAULT_SPEED,
            ),
            ToolPalette::default(),
        )
    }

    #[test]
    fn tile_grid_rejects_non_positive_tile_size() {
        let error = TileGridPresentation::new(4, 4, 0.0).expect_err("zero tile size");
        assert_eq!(error, RenderingError::InvalidTileSize { tile_size: 0.0 });
    }

    #[test]
    fn camera_starts_centred_on_the_world() {
        let scene = scene();
        assert_eq!(scene.camera.scroll(), Vec2::new(512.0, 736.0));
    }

    #[test]
    fn camera_pans_by_speed_times_elapsed_milliseconds() {
        let mut camera = Camera::new(Vec2::ZERO, 0.4);
        camera.pan(Vec2::new(1.0, -1.0), Duration::from_millis(50));
        assert!((camera.scroll() - Vec2::new(20.0, -20.0)).length() < 1e-4);

        camera.pan(Vec2::new(5.0, 0.0), Duration::from_millis(10));
        assert!((camera.scroll().x - 24.0).abs() < 1e-4);
    }

    #[test]
    fn palette_hit_test_follows_entry_spacing() {
        let palette = ToolPalette::default();

        assert_eq!(palette.tool_at(Vec2::new(16.0, 16.0)), Some(Tool::Select));
        assert_eq!(palette.tool_at(Vec2::new(191.0, 47.0)), Some(Tool::Select));
        assert_eq!(palette.tool_at(Vec2::new(192.0, 20.0)), None);
        assert_eq!(palette.tool_at(Vec2::new(100.0, 50.0)), None);
        assert_eq!(palette.tool_at(Vec2::new(100.0, 64.0)), Some(Tool::DrawRoad));
        assert_eq!(
            palette.tool_at(Vec2::new(20.0, 120.0)),
            Some(Tool::ZoneResidential)
        );
        assert_eq!(palette.tool_at(Vec2::new(20.0, 160.0)), Some(Tool::Demolish));
        assert_eq!(palette.tool_at(Vec2::new(20.0, 200.0)), None);
    }

    #[test]
    fn scene_tracks_live_visuals_and_ticks() {
        let mut scene = scene();
        let first = VisualHandle::new(0);
        let second = VisualHandle::new(1);
        let cell = CellCoord::new(3, 4);

        scene.apply_events(&[
            Event::VisualSpawned {
                handle: first,
                cell,
                sprite: Sprite::ZoneResidential,
            },
            Event::CellChanged {
                cell,
                from: CellType::Empty,
                to: CellKind::Road,
            },
            Event::VisualDespawned { handle: first },
            Event::VisualSpawned {
                handle: second,
                cell,
                sprite: Sprite::House,
            },
            Event::TickAdvanced { tick: 7 },
        ]);

        assert_eq!(scene.sprite_count(), 1);
        assert_eq!(
            scene.sprites().collect::<Vec<_>>(),
            vec![(
                second,
                &SpriteInstance {
                    cell,
                    sprite: Sprite::House,
                }
            )]
        );
        assert_eq!(scene.status_line(), "time = 7");
    }

    #[test]
    fn unknown_despawn_leaves_scene_untouched() {
        let mut scene = scene();
        scene.apply_events(&[Event::VisualDespawned {
            handle: VisualHandle::new(42),
        }]);
        assert_eq!(scene.sprite_count(), 0);
        assert_eq!(scene.selected_tool(), Tool::Select);
    }
}
