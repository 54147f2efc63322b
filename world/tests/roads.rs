use std::collections::{HashMap, HashSet};

use city_experiment_core::{CellCoord, CellKind, Command, Direction, Event, RoadMask, Sprite};
use city_experiment_world::{self as world, query, World, WorldConfig};

fn world_with_roads(columns: u32, rows: u32, roads: &[CellCoord]) -> (World, Vec<Event>) {
    let mut world = World::new(WorldConfig::new(columns, rows)).expect("valid grid");
    let mut events = Vec::new();
    for cell in roads {
        world::apply(
            &mut world,
            Command::SetCell {
                cell: *cell,
                kind: CellKind::Road,
            },
            &mut events,
        );
    }
    (world, events)
}

fn road_sprite_at(events: &[Event], cell: CellCoord) -> Option<Sprite> {
    events.iter().rev().find_map(|event| match event {
        Event::VisualSpawned {
            cell: spawned,
            sprite,
            ..
        } if *spawned == cell => Some(*sprite),
        _ => None,
    })
}

#[test]
fn center_mask_matches_every_neighbour_subset() {
    let center = CellCoord::new(1, 1);

    for bits in 0_u8..16 {
        let expected = RoadMask::from_bits(bits);
        let mut roads: Vec<CellCoord> = Direction::ALL
            .into_iter()
            .filter(|direction| expected.contains(*direction))
            .map(|direction| center.neighbor(direction))
            .collect();
        roads.push(center);

        let (world, events) = world_with_roads(3, 3, &roads);

        let cell = query::cell(&world, center).expect("center inside grid");
        assert_eq!(cell.road_mask(), Some(expected), "mask {bits:#06b}");
        assert_eq!(
            road_sprite_at(&events, center),
            Some(expected.sprite()),
            "sprite for mask {bits:#06b}"
        );
    }
}

#[test]
fn north_and_east_neighbours_select_north_east_corner() {
    let center = CellCoord::new(1, 1);
    let (world, _) = world_with_roads(
        3,
        3,
        &[CellCoord::new(1, 0), CellCoord::new(2, 1), center],
    );

    let mask = query::cell(&world, center)
        .and_then(|cell| cell.road_mask())
        .expect("road mask cached");
    assert_eq!(mask.bits(), 0b0011);
    assert_eq!(mask.sprite(), Sprite::RoadNorthEast);
}

#[test]
fn placing_a_road_updates_existing_neighbours() {
    let (mut world, _) = world_with_roads(3, 1, &[CellCoord::new(0, 0), CellCoord::new(2, 0)]);
    let mut events = Vec::new();

    world::apply(
        &mut world,
        Command::SetCell {
            cell: CellCoord::new(1, 0),
            kind: CellKind::Road,
        },
        &mut events,
    );

    let masks: Vec<_> = (0..3)
        .map(|column| {
            query::cell(&world, CellCoord::new(column, 0)).and_then(|cell| cell.road_mask())
        })
        .collect();
    assert_eq!(
        masks,
        vec![
            Some(RoadMask::from_bits(0b0010)),
            Some(RoadMask::from_bits(0b0110)),
            Some(RoadMask::from_bits(0b0100)),
        ]
    );
    assert_eq!(
        road_sprite_at(&events, CellCoord::new(1, 0)),
        Some(Sprite::RoadEastWest)
    );
    assert_eq!(
        road_sprite_at(&events, CellCoord::new(0, 0)),
        Some(Sprite::RoadEast)
    );
}

#[test]
fn removing_a_road_recomputes_all_four_neighbours_without_revisiting_it() {
    let center = CellCoord::new(2, 2);
    let neighbours: Vec<CellCoord> = Direction::ALL
        .into_iter()
        .map(|direction| center.neighbor(direction))
        .collect();
    let mut roads = neighbours.clone();
    roads.push(center);
    let (mut world, _) = world_with_roads(5, 5, &roads);
    let mut events = Vec::new();

    world::apply(
        &mut world,
        Command::SetCell {
            cell: center,
            kind: CellKind::Empty,
        },
        &mut events,
    );

    let recomputed: HashSet<CellCoord> = events
        .iter()
        .filter_map(|event| match event {
            Event::RoadMaskChanged { cell, .. } => Some(*cell),
            _ => None,
        })
        .collect();
    assert_eq!(recomputed, neighbours.iter().copied().collect());
    assert!(!recomputed.contains(&center));

    for cell in neighbours {
        let mask = query::cell(&world, cell).and_then(|cell| cell.road_mask());
        assert_eq!(mask, Some(RoadMask::ISOLATED));
    }
    let cleared = query::cell(&world, center).expect("inside grid");
    assert_eq!(cleared.road_mask(), None);
    assert!(cleared.visual().is_none());
}

#[test]
fn converting_a_road_into_a_lot_disconnects_its_neighbours() {
    let (mut world, _) = world_with_roads(
        3,
        1,
        &[
            CellCoord::new(0, 0),
            CellCoord::new(1, 0),
            CellCoord::new(2, 0),
        ],
    );
    let mut events = Vec::new();

    world::apply(
        &mut world,
        Command::SetCell {
            cell: CellCoord::new(1, 0),
            kind: CellKind::ZonedLot(city_experiment_core::ZoneType::Residential),
        },
        &mut events,
    );

    assert_eq!(
        road_sprite_at(&events, CellCoord::new(0, 0)),
        Some(Sprite::RoadIsolated)
    );
    assert_eq!(
        road_sprite_at(&events, CellCoord::new(1, 0)),
        Some(Sprite::ZoneResidential)
    );
    assert!(query::has_road_access(&world, CellCoord::new(1, 0)));
}

#[test]
fn fully_connected_network_settles() {
    let mut roads = Vec::new();
    for row in 0..12 {
        for column in 0..12 {
            roads.push(CellCoord::new(column, row));
        }
    }
    let (world, _) = world_with_roads(12, 12, &roads);

    assert_eq!(
        query::cell(&world, CellCoord::new(5, 5)).and_then(|cell| cell.road_mask()),
        Some(RoadMask::FOUR_WAY)
    );
    assert_eq!(
        query::cell(&world, CellCoord::new(0, 0)).and_then(|cell| cell.road_mask()),
        Some(RoadMask::from_bits(0b1010))
    );
    assert_eq!(
        query::cell(&world, CellCoord::new(11, 11)).and_then(|cell| cell.road_mask()),
        Some(RoadMask::from_bits(0b0101))
    );
}

#[test]
fn every_replaced_visual_is_released_first() {
    let mut roads = Vec::new();
    for row in 0..4 {
        for column in 0..4 {
            if (row + column) % 3 != 0 {
                roads.push(CellCoord::new(column, row));
            }
        }
    }
    let (mut world, mut events) = world_with_roads(4, 4, &roads);
    for cell in [CellCoord::new(1, 1), CellCoord::new(2, 2)] {
        world::apply(
            &mut world,
            Command::SetCell {
                cell,
                kind: CellKind::Empty,
            },
            &mut events,
        );
    }

    let mut live: HashMap<CellCoord, _> = HashMap::new();
    let mut owners = HashMap::new();
    for event in &events {
        match event {
            Event::VisualSpawned { handle, cell, .. } => {
                assert!(
                    live.insert(*cell, *handle).is_none(),
                    "visual at {cell:?} spawned before release"
                );
                assert!(owners.insert(*handle, *cell).is_none());
            }
            Event::VisualDespawned { handle } => {
                let cell = owners.remove(handle).expect("despawned handle was live");
                assert_eq!(live.remove(&cell), Some(*handle));
            }
            _ => {}
        }
    }

    let attached: HashMap<CellCoord, _> = query::visuals(&world).collect();
    assert_eq!(attached, live);
}
