//! Loads the decoded replays under `fixtures/replays/` and checks they are
//! usable end to end.

use replay_core::{analyze, EventSource, PlayerId, ReplayEvent, SamplingConfig};
use replay_source::open_replay;
use std::path::PathBuf;

/// Integration tests run from the crate directory, so go up two levels.
fn fixtures_dir() -> PathBuf {
    let manifest = std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set");
    PathBuf::from(manifest).join("../../fixtures")
}

const REPLAYS: [(&str, u32, usize); 5] = [
    ("arabia_pro", 22, 0),
    ("arabia_high", 26, 0),
    ("arena_middle", 30, 1),
    ("arabia_low", 18, 0),
    ("nomad_low", 24, 0),
];

#[test]
fn test_fixture_headers_are_valid() {
    for (name, _, _) in REPLAYS {
        let path = fixtures_dir().join(format!("replays/{name}.jsonl"));
        let source = open_replay(&path).unwrap_or_else(|e| panic!("{name}: {e:#}"));
        let ids: Vec<PlayerId> = source.header().players.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![PlayerId(1), PlayerId(2)], "{name}");
        assert!(source
            .header()
            .players
            .iter()
            .all(|p| p.objects.iter().any(|o| o.object_id == 109)));
    }
}

#[test]
fn test_fixture_durations_and_skips() {
    for (name, minutes, skipped) in REPLAYS {
        let path = fixtures_dir().join(format!("replays/{name}.jsonl"));
        let mut source = open_replay(&path).unwrap();
        let analysis = analyze(&mut source, SamplingConfig::default()).unwrap();
        assert_eq!(analysis.duration_minutes(), minutes, "{name}");
        assert_eq!(source.skipped_lines(), skipped, "{name}");
        assert_eq!(analysis.player_count(), 2, "{name}");
        for player in analysis.players() {
            assert!(player.starting_position().is_some(), "{name}");
            assert!(player.units().total() > 0, "{name} player {}", player.id());
            assert!(player.average_eapm().unwrap() > 0.0, "{name}");
        }
    }
}

#[test]
fn test_fixture_streams_end_with_resignation() {
    let path = fixtures_dir().join("replays/arabia_pro.jsonl");
    let mut source = open_replay(&path).unwrap();
    let mut last = None;
    while let Some(event) = source.next_event().unwrap() {
        last = Some(event);
    }
    assert_eq!(
        last,
        Some(ReplayEvent::Resign {
            player: PlayerId(2)
        })
    );
}

#[test]
fn test_corpus_manifest_references_fixtures() {
    let corpus: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(fixtures_dir().join("corpus.json")).unwrap(),
    )
    .unwrap();
    let matches = corpus["matches"].as_array().unwrap();
    assert_eq!(matches.len(), REPLAYS.len());
    for entry in matches {
        let path = fixtures_dir().join(entry["path"].as_str().unwrap());
        assert!(path.exists(), "{} missing", path.display());
    }
}
