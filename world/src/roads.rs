//! Road adjacency resolution.
//!
//! Every road tile caches the [`RoadMask`] of its road neighbours and shows the
//! connective sprite selected by that mask. When a mask changes, the change
//! ripples to the neighbouring roads; the ripple stops on every branch where a
//! recomputed mask equals the cached one.

use city_experiment_core::{CellCoord, CellType, Direction, Event, RoadMask};

use crate::World;

/// Upper bound on resolver visits per grid tile during a single cascade.
///
/// A cascade that settles never comes close; exceeding it means the
/// idempotence check stopped terminating the ripple.
const CASCADE_VISITS_PER_TILE: usize = 4;

/// Maximum resolver visits allowed for a cascade over a grid of `tiles` tiles.
fn cascade_ceiling(tiles: usize) -> usize {
    tiles
        .saturating_mul(CASCADE_VISITS_PER_TILE)
        .saturating_add(1)
}

impl World {
    /// Recomputes the sprite of the road at `origin` and ripples changes to neighbouring roads.
    ///
    /// Does nothing when `origin` is not a road.
    pub(crate) fn update_road_visual(&mut self, origin: CellCoord, out_events: &mut Vec<Event>) {
        let ceiling = cascade_ceiling(self.grid.len());
        self.cascade_road_visual(origin, ceiling, out_events);
    }

    /// Runs the ripple from `origin`, abandoning it after `ceiling` visits.
    fn cascade_road_visual(
        &mut self,
        origin: CellCoord,
        ceiling: usize,
        out_events: &mut Vec<Event>,
    ) {
        let mut pending = vec![origin];
        let mut visits = 0_usize;

        while let Some(cell) = pending.pop() {
            visits += 1;
            if visits > ceiling {
                log::error!(
                    "road cascade from {origin:?} exceeded {ceiling} visits; abandoning {} pending tiles",
                    pending.len() + 1
                );
                return;
            }

            let Some(mask) = self.refresh_road_mask(cell, out_events) else {
                continue;
            };

            // Reverse push keeps the north branch on top, matching depth-first order.
            for direction in Direction::ALL.into_iter().rev() {
                if mask.contains(direction) {
                    pending.push(cell.neighbor(direction));
                }
            }
        }
    }

    /// Returns the new mask of the road at `cell` when it differs from the cached one.
    fn refresh_road_mask(
        &mut self,
        cell: CellCoord,
        out_events: &mut Vec<Event>,
    ) -> Option<RoadMask> {
        let cached = self
            .grid
            .cell(cell)
            .filter(|target| target.cell_type() == CellType::Road)?
            .road_mask();

        let mask = RoadMask::from_neighbors(|direction| {
            self.grid.get(cell.neighbor(direction)) == CellType::Road
        });
        if cached == Some(mask) {
            return None;
        }

        self.spawn_visual(cell, mask.sprite(), out_events);
        if let Some(target) = self.grid.cell_mut(cell) {
            target.cache_road_mask(mask);
        }
        out_events.push(Event::RoadMaskChanged { cell, mask });
        Some(mask)
    }
}

#[cfg(test)]
mod tests {
    use city_experiment_core::{CellKind, Command, Sprite};

    use crate::{apply, query, World, WorldConfig};

    use super::*;

    #[test]
    fn update_ignores_tiles_that_are_not_roads() {
        let mut world = World::new(WorldConfig::new(3, 3)).expect("valid grid");
        let mut events = Vec::new();

        world.update_road_visual(CellCoord::new(1, 1), &mut events);
        world.update_road_visual(CellCoord::new(-1, 7), &mut events);

        assert!(events.is_empty());
    }

    #[test]
    fn settled_road_is_not_redrawn() {
        let mut world = World::new(WorldConfig::new(3, 3)).expect("valid grid");
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SetCell {
                cell: CellCoord::new(1, 1),
                kind: CellKind::Road,
            },
            &mut events,
        );
        assert!(events.contains(&Event::RoadMaskChanged {
            cell: CellCoord::new(1, 1),
            mask: RoadMask::ISOLATED,
        }));
        events.clear();

        world.update_road_visual(CellCoord::new(1, 1), &mut events);

        assert!(events.is_empty(), "settled mask must not churn: {events:?}");
        let cell = query::cell(&world, CellCoord::new(1, 1)).expect("inside grid");
        assert_eq!(cell.road_mask(), Some(RoadMask::ISOLATED));
        assert_eq!(RoadMask::ISOLATED.sprite(), Sprite::RoadIsolated);
    }

    #[test]
    fn ceiling_allows_four_visits_per_tile_plus_the_origin() {
        assert_eq!(cascade_ceiling(16), 65);
        assert_eq!(cascade_ceiling(0), 1);
        assert_eq!(cascade_ceiling(usize::MAX), usize::MAX);
    }

    #[test]
    fn exhausted_ceiling_abandons_the_remaining_ripple() {
        let mut world = World::new(WorldConfig::new(3, 1)).expect("valid grid");
        let mut events = Vec::new();
        for column in 0..2 {
            apply(
                &mut world,
                Command::SetCell {
                    cell: CellCoord::new(column, 0),
                    kind: CellKind::Road,
                },
                &mut events,
            );
        }
        events.clear();
        world
            .grid
            .cell_mut(CellCoord::new(2, 0))
            .expect("inside grid")
            .replace_kind(CellKind::Road);

        world.cascade_road_visual(CellCoord::new(2, 0), 1, &mut events);

        let changed: Vec<_> = events
            .iter()
            .filter_map(|event| match event {
                Event::RoadMaskChanged { cell, .. } => Some(*cell),
                _ => None,
            })
            .collect();
        assert_eq!(changed, vec![CellCoord::new(2, 0)]);
        let stale = query::cell(&world, CellCoord::new(1, 0)).and_then(|cell| cell.road_mask());
        assert_eq!(stale, Some(RoadMask::from_bits(0b0100)));
    }
}
