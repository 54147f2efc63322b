//! Rendering backend that runs a scripted number of frames without a window.

use std::{collections::HashMap, time::Duration};

use anyhow::Result as AnyResult;
use city_experiment_core::{CellCoord, Sprite, Tool};
use city_experiment_rendering::{FrameInput, Presentation, RenderingBackend, Scene};
use glam::Vec2;

/// Backend that feeds scripted input for a fixed number of frames and prints the final map.
#[derive(Debug)]
pub(crate) struct HeadlessBackend {
    frames: u32,
    frame_time: Duration,
    script: Vec<FrameInput>,
}

impl HeadlessBackend {
    pub(crate) fn new(frames: u32, frame_time: Duration, script: Vec<FrameInput>) -> Self {
        Self {
            frames,
            frame_time,
            script,
        }
    }
}

impl RenderingBackend for HeadlessBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static,
    {
        let Presentation {
            window_title,
            mut scene,
        } = presentation;
        log::info!("{window_title}: running {} headless frames", self.frames);

        let mut script = self.script.into_iter();
        for _ in 0..self.frames {
            let input = script.next().unwrap_or_default();
            update_scene(self.frame_time, input, &mut scene);
        }

        for (handle, instance) in scene.sprites() {
            log::debug!(
                "visual {} at {:?}: sheet frame {}",
                handle.get(),
                instance.cell,
                instance.sprite.sheet_index()
            );
        }

        println!("{}", render_map(&scene));
        println!("{}", scene.status_line());
        Ok(())
    }
}

/// Character drawn for a sprite on the text map.
fn glyph(sprite: Sprite) -> char {
    match sprite {
        Sprite::House => 'H',
        Sprite::SmallShop => 'S',
        Sprite::Office => 'O',
        Sprite::Factory => 'F',
        Sprite::Mountain => '^',
        Sprite::Water => 'w',
        Sprite::ZoneResidential => 'R',
        road => {
            debug_assert!(road.is_road());
            '='
        }
    }
}

/// Draws the scene's live sprites as one text row per grid row.
pub(crate) fn render_map(scene: &Scene) -> String {
    let tiles: HashMap<CellCoord, Sprite> = scene
        .sprites()
        .map(|(_, instance)| (instance.cell, instance.sprite))
        .collect();

    let columns = i32::try_from(scene.tile_grid.columns).unwrap_or(i32::MAX);
    let rows = i32::try_from(scene.tile_grid.rows).unwrap_or(i32::MAX);
    let mut map = String::new();
    for row in 0..rows {
        if row > 0 {
            map.push('\n');
        }
        map.extend((0..columns).map(|column| {
            tiles
                .get(&CellCoord::new(column, row))
                .map_or('.', |sprite| glyph(*sprite))
        }));
    }
    map
}

/// Scripted input that picks the road tool and drags a road across `row`.
pub(crate) fn road_row_script(scene: &Scene, row: u32) -> Vec<FrameInput> {
    let (palette_origin, palette_size) = scene.palette.entry_bounds(Tool::DrawRoad);
    let mut script = vec![FrameInput {
        cursor_screen: Some(palette_origin + palette_size / 2.0),
        pointer_pressed: true,
        pointer_down: true,
        ..FrameInput::default()
    }];

    let tile_size = scene.tile_grid.tile_size;
    let scroll = scene.camera.scroll();
    for column in 0..scene.tile_grid.columns {
        let screen = Vec2::new(column as f32, row as f32) * tile_size - scroll;
        script.push(FrameInput {
            cursor_screen: Some(screen),
            pointer_pressed: column == 0,
            pointer_down: true,
            ..FrameInput::default()
        });
    }
    script.push(FrameInput::default());
    script
}
