use std::collections::BTreeMap;

use replay_core::categories::{resolve_building, resolve_unit};
use replay_core::test_fixtures::{make_rng, random_match, ReplayScript};
use replay_core::{
    analyze, ActionKind, Building, PlayerId, Position, ReplayEvent, SamplingConfig, Snapshot,
    Technology, Unit,
};

#[test]
fn test_counts_match_resolved_events_and_never_decrease() {
    for seed in [1_u64, 7, 42, 1234] {
        let mut rng = make_rng(seed);
        let source = random_match(&mut rng, 12);

        let mut expected_units: BTreeMap<(PlayerId, Unit), u32> = BTreeMap::new();
        let mut expected_buildings: BTreeMap<(PlayerId, Building), u32> = BTreeMap::new();
        for event in source.pending() {
            match event {
                ReplayEvent::UnitQueued { player, unit_id } => {
                    if let Some(unit) = resolve_unit(*unit_id) {
                        *expected_units.entry((*player, unit)).or_default() += 1;
                    }
                }
                ReplayEvent::BuildingCompleted {
                    player,
                    building_id,
                    ..
                } => {
                    if let Some(building) = resolve_building(*building_id) {
                        *expected_buildings.entry((*player, building)).or_default() += 1;
                    }
                }
                _ => {}
            }
        }

        let analysis = analyze(source, SamplingConfig::default()).unwrap();
        for player in analysis.players() {
            for (unit, count) in player.units().iter() {
                let expected = expected_units.get(&(player.id(), unit)).copied().unwrap_or(0);
                assert_eq!(count, expected, "seed {seed} player {} {unit:?}", player.id());
            }
            for (building, count) in player.buildings().iter() {
                let expected = expected_buildings
                    .get(&(player.id(), building))
                    .copied()
                    .unwrap_or(0);
                assert_eq!(count, expected, "seed {seed} player {} {building:?}", player.id());
            }

            let series: Vec<&Snapshot> = player.snapshots().values().collect();
            assert_eq!(*series[0], Snapshot::default(), "seed {seed}");
            for pair in series.windows(2) {
                assert!(pair[1].units.economic >= pair[0].units.economic);
                assert!(pair[1].units.military >= pair[0].units.military);
                assert!(pair[1].buildings.economic >= pair[0].buildings.economic);
                assert!(pair[1].buildings.military >= pair[0].buildings.military);
                assert!(pair[1].buildings.walls >= pair[0].buildings.walls);
            }
        }
        assert_eq!(analysis.duration_minutes(), 12, "seed {seed}");
    }
}

#[test]
fn test_displacement_scenario_from_start() {
    let source = ReplayScript::new(&[(1, Some(Position::new(100.0, 100.0)))])
        .advance_seconds(10)
        .action(1, ActionKind::Move, Position::new(110.0, 100.0))
        .advance_seconds(20)
        .action(1, ActionKind::Patrol, Position::new(90.0, 100.0))
        .advance_seconds(20)
        .action(1, ActionKind::Formation, Position::new(100.0, 130.0))
        .advance_seconds(70)
        .into_source();
    let analysis = analyze(source, SamplingConfig::default()).unwrap();
    let snapshot = analysis.player(PlayerId(1)).unwrap().snapshots()[&120];
    assert_eq!(snapshot.movement.count, 3);
    assert!((snapshot.movement.mean_x - 20.0 / 3.0).abs() < 1e-9);
    assert!((snapshot.movement.mean_y - 10.0).abs() < 1e-9);
    assert_eq!(snapshot.directed.count, 0);
}

#[test]
fn test_quiet_window_differs_from_action_at_start() {
    let quiet = ReplayScript::new(&[(1, Some(Position::new(50.0, 50.0)))])
        .advance_seconds(120)
        .into_source();
    let at_start = ReplayScript::new(&[(1, Some(Position::new(50.0, 50.0)))])
        .advance_seconds(60)
        .action(1, ActionKind::Order, Position::new(50.0, 50.0))
        .advance_seconds(60)
        .into_source();

    let quiet = analyze(quiet, SamplingConfig::default()).unwrap();
    let at_start = analyze(at_start, SamplingConfig::default()).unwrap();
    let quiet = quiet.player(PlayerId(1)).unwrap().snapshots()[&120].directed;
    let at_start = at_start.player(PlayerId(1)).unwrap().snapshots()[&120].directed;

    assert_eq!(quiet.count, 0);
    assert_eq!(at_start.count, 1);
    assert!(at_start.mean_x.abs() < 1e-9);
    assert!(at_start.mean_y.abs() < 1e-9);
}

#[test]
fn test_unresolved_ids_leave_state_untouched() {
    let source = ReplayScript::new(&[(1, None)])
        .event(ReplayEvent::BuildingCompleted {
            player: PlayerId(1),
            building_id: 9_999,
            position: Position::new(5.0, 5.0),
        })
        .event(ReplayEvent::UnitQueued {
            player: PlayerId(1),
            unit_id: 9_999,
        })
        .event(ReplayEvent::TechnologyResearched {
            player: PlayerId(1),
            technology_id: 9_999,
        })
        .advance_seconds(120)
        .into_source();
    let analysis = analyze(source, SamplingConfig::default()).unwrap();
    let player = analysis.player(PlayerId(1)).unwrap();
    assert_eq!(player.units().total(), 0);
    assert_eq!(player.buildings().total(), 0);
    assert_eq!(player.technologies().recorded().count(), 0);
    assert_eq!(player.starting_position(), None);
    assert_eq!(player.snapshots()[&120], Snapshot::default());
}

#[test]
fn test_research_time_last_write_wins() {
    let source = ReplayScript::new(&[(1, None)])
        .advance_seconds(300)
        .research(1, Technology::FeudalAge)
        .advance_seconds(100)
        .research(1, Technology::FeudalAge)
        .into_source();
    let analysis = analyze(source, SamplingConfig::default()).unwrap();
    let time = analysis
        .player(PlayerId(1))
        .unwrap()
        .technologies()
        .get(Technology::FeudalAge)
        .unwrap();
    assert!((time - 400.0).abs() < 1e-9);
}
