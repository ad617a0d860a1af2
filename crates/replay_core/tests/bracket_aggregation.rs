use replay_core::test_fixtures::{make_rng, random_match, ReplayScript};
use replay_core::{
    aggregate_bracket, analyze, ActionKind, AnalysisError, BracketAccumulator, MatchAnalysis,
    Position, SamplingConfig, SkillBracket, Technology, Unit,
};

fn five_minute_sampling() -> SamplingConfig {
    SamplingConfig {
        interval_minutes: 5,
        ..SamplingConfig::default()
    }
}

/// `players` players, each queueing one villager per minute for `minutes`.
fn steady_match(players: u8, minutes: u64, config: SamplingConfig) -> MatchAnalysis {
    let ids: Vec<(u8, Option<Position>)> = (1..=players).map(|id| (id, None)).collect();
    let mut script = ReplayScript::new(&ids);
    for _ in 0..minutes {
        for id in 1..=players {
            script = script.queue(id, Unit::Villager);
        }
        script = script.advance_seconds(60);
    }
    analyze(script.into_source(), config).unwrap()
}

#[test]
fn test_technology_mean_over_researchers_only() {
    let script = ReplayScript::new(&[(1, None), (2, None), (3, None), (4, None), (5, None)])
        .advance_seconds(600)
        .research(2, Technology::CastleAge)
        .advance_seconds(200)
        .research(4, Technology::CastleAge)
        .research(1, Technology::Loom)
        .advance_seconds(100);
    let analysis = analyze(script.into_source(), SamplingConfig::default()).unwrap();

    let result = aggregate_bracket(SkillBracket::Middle, &[analysis]).unwrap();
    assert_eq!(result.player_count, 5);
    assert!((result.technologies[&Technology::CastleAge] - 700.0).abs() < 1e-9);
    assert!((result.technologies[&Technology::Loom] - 800.0).abs() < 1e-9);
    assert!(!result.technologies.contains_key(&Technology::ImperialAge));
}

#[test]
fn test_series_divisor_tracks_contributing_matches() {
    let config = five_minute_sampling();
    let short = steady_match(2, 20, config);
    let long = steady_match(1, 30, config);
    let result = aggregate_bracket(SkillBracket::High, &[short, long]).unwrap();

    let at_20 = result.series[&1200];
    assert_eq!(at_20.contributors, 3);
    assert!((at_20.economic_units - 20.0).abs() < 1e-9);

    let at_25 = result.series[&1500];
    assert_eq!(at_25.contributors, 1);
    assert!((at_25.economic_units - 25.0).abs() < 1e-9);

    assert!((result.average_duration_minutes - 25.0).abs() < 1e-9);
    assert_eq!(result.reported_duration_minutes, 25);
}

#[test]
fn test_eapm_mean_over_players() {
    let busy = ReplayScript::new(&[(1, None), (2, None)])
        .action(1, ActionKind::Move, Position::new(1.0, 1.0))
        .action(1, ActionKind::Move, Position::new(1.0, 1.0))
        .action(1, ActionKind::Order, Position::new(1.0, 1.0))
        .action(1, ActionKind::Order, Position::new(1.0, 1.0))
        .advance_seconds(120);
    let analysis = analyze(busy.into_source(), SamplingConfig::default()).unwrap();
    let result = aggregate_bracket(SkillBracket::Pro, &[analysis]).unwrap();
    // Player 1: 4 actions / 2 min; player 2: none.
    assert!((result.average_eapm - 1.0).abs() < 1e-9);
}

#[test]
fn test_random_corpus_folds_cleanly() {
    let mut rng = make_rng(99);
    let mut accumulator = BracketAccumulator::new();
    for minutes in [6, 9, 14] {
        let analysis = analyze(random_match(&mut rng, minutes), SamplingConfig::default()).unwrap();
        accumulator.fold(&analysis).unwrap();
    }
    let result = accumulator.finish(SkillBracket::Low).unwrap();
    assert_eq!(result.match_count, 3);
    assert_eq!(result.player_count, 6);
    assert_eq!(result.reported_duration_minutes, 10);
    assert_eq!(result.series[&0].contributors, 6);
    // Only the 14-minute match reaches minute 14.
    assert_eq!(result.series[&840].contributors, 2);
    for snapshot in result.series.values() {
        assert!(snapshot.movement.count >= 0.0);
        assert!(snapshot.economic_units >= 0.0);
    }
}

#[test]
fn test_empty_bracket_rejected() {
    let result = BracketAccumulator::new().finish(SkillBracket::Middle);
    assert!(matches!(result, Err(AnalysisError::EmptyBracket { .. })));
}
