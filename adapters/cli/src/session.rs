//! Frame-by-frame wiring of the world, its systems and the scene.

use std::time::Duration;

use city_experiment_core::{Command, Event, Level, Tool, ZoneMask};
use city_experiment_rendering::{FrameInput, Scene};
use city_experiment_system_bootstrap::{Bootstrap, BootstrapError};
use city_experiment_system_clock::SimulationClock;
use city_experiment_system_growth::Growth;
use city_experiment_system_interaction::{screen_to_cell, Interaction, PointerEvent};
use city_experiment_world::{self as world, query, World};

/// Owns the simulation state driven by a rendering backend.
#[derive(Debug)]
pub(crate) struct Session {
    world: World,
    clock: SimulationClock,
    growth: Growth,
    interaction: Interaction,
    selected_tool: usize,
}

impl Session {
    pub(crate) fn new(world: World, clock: SimulationClock, growth: Growth) -> Self {
        Self {
            world,
            clock,
            growth,
            interaction: Interaction::new(),
            selected_tool: Tool::Select.index(),
        }
    }

    pub(crate) fn world(&self) -> &World {
        &self.world
    }

    /// Places the level layout onto the world and mirrors the result into `scene`.
    pub(crate) fn seed(
        &mut self,
        level: &Level,
        scene: &mut Scene,
    ) -> Result<usize, BootstrapError> {
        let mut commands = Vec::new();
        let seeded = Bootstrap.seed_level(&self.world, level, &mut commands)?;
        let events = self.execute(commands);
        scene.apply_events(&events);
        Ok(seeded)
    }

    /// Processes one frame of input followed by `dt` of simulated time.
    pub(crate) fn frame(&mut self, dt: Duration, input: FrameInput, scene: &mut Scene) {
        scene.camera.pan(input.pan, dt);

        let pointer: Vec<PointerEvent> = self.pointer_events(&input, scene).into_iter().collect();
        let mut commands = Vec::new();
        let world = &self.world;
        self.interaction.handle(
            &pointer,
            self.selected_tool,
            |cell| query::can_set_cell(world, cell),
            &mut commands,
        );
        let events = self.execute(commands);
        scene.apply_events(&events);

        let mut ticks = Vec::new();
        let _ = self.clock.advance(dt, &mut ticks);
        for tick in ticks {
            let events = self.step(tick);
            scene.apply_events(&events);
        }
    }

    /// Executes a single tick and the structure requests it produces.
    fn step(&mut self, tick: Command) -> Vec<Event> {
        let mut events = Vec::new();
        world::apply(&mut self.world, tick, &mut events);

        let lots = query::lot_view(&self.world, ZoneMask::ANY);
        let mut builds = Vec::new();
        self.growth.handle(&events, &lots, &mut builds);
        events.extend(self.execute(builds));

        if let Some(Event::TickAdvanced { tick }) = events.first() {
            log::trace!("tick {tick} produced {} events", events.len());
        }
        events
    }

    fn execute(&mut self, commands: Vec<Command>) -> Vec<Event> {
        let mut events = Vec::new();
        for command in commands {
            world::apply(&mut self.world, command, &mut events);
        }
        events
    }

    /// Translates raw pointer input, letting the palette claim presses over it.
    fn pointer_events(&mut self, input: &FrameInput, scene: &mut Scene) -> Option<PointerEvent> {
        let screen = input.cursor_screen?;
        if input.pointer_pressed {
            if let Some(tool) = scene.palette.tool_at(screen) {
                log::info!("selected tool: {}", tool.label());
                self.selected_tool = tool.index();
                scene.select_tool(tool);
                return None;
            }
        }

        let cell = screen_to_cell(screen, scene.camera.scroll(), scene.tile_grid.tile_size)?;
        Some(if input.pointer_pressed {
            PointerEvent::Down { cell }
        } else {
            PointerEvent::Move {
                cell,
                is_down: input.pointer_down,
            }
        })
    }
}
