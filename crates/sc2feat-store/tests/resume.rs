//! Planning skips replay-players whose artifacts are complete.

use std::fs;

use sc2feat_core::{PlayerId, Race};
use sc2feat_store::{
    ActionLog, CompletenessCheck, LibraryPlayer, LibraryReplay, OutputLayout, ReplayLibrary,
    SparseMatrix,
};

const CHECK: CompletenessCheck = CompletenessCheck {
    step_frames: 72,
    tolerance: 10,
    global_columns: None,
};

fn player(id: u32, race: Race) -> LibraryPlayer {
    LibraryPlayer {
        id: PlayerId(id),
        race,
        result: (id % 2) as i32,
        apm: 120.0,
        mmr: 3000,
    }
}

fn replay(name: &str, frames: u32) -> LibraryReplay {
    LibraryReplay {
        path: format!("/replays/{name}.SC2Replay").into(),
        map: "Fixture LE".into(),
        duration_seconds: frames as f32 / 22.4,
        duration_frames: frames,
        players: vec![player(1, Race::Protoss), player(2, Race::Protoss)],
    }
}

fn write_complete(layout: &OutputLayout, player: u32, replay_id: &str, last_frame: f32) {
    let paths = layout.artifacts(PlayerId(player), replay_id);
    let rows = vec![vec![72.0, 1.0], vec![last_frame, 2.0]];
    SparseMatrix::from_rows(&rows).unwrap().write_npz(&paths.global).unwrap();
    SparseMatrix::from_rows(&rows).unwrap().write_npz(&paths.spatial).unwrap();
    ActionLog::new().write_json(&paths.actions).unwrap();
}

#[test]
fn resume_skips_only_complete_players() {
    let dir = tempfile::tempdir().unwrap();
    let layout = OutputLayout::new(dir.path(), Race::Protoss, Race::Protoss);
    layout.create_dirs().unwrap();

    let library = ReplayLibrary {
        replays: vec![replay("done", 1000), replay("short", 5000), replay("fresh", 1000)],
    };

    // "done": both players complete.
    write_complete(&layout, 1, "done", 1000.0);
    write_complete(&layout, 2, "done", 990.0);
    // "short": player 1 stopped far too early.
    write_complete(&layout, 1, "short", 144.0);
    // "short": player 2 has a corrupt global matrix.
    write_complete(&layout, 2, "short", 5000.0);
    fs::write(layout.artifacts(PlayerId(2), "short").global, b"not a zip").unwrap();

    let planned: Vec<(String, PlayerId)> = library
        .plan_work(Race::Protoss, &layout, &CHECK)
        .into_iter()
        .map(|item| (item.replay_id, item.player_id))
        .collect();
    assert_eq!(
        planned,
        vec![
            ("short".to_string(), PlayerId(1)),
            ("short".to_string(), PlayerId(2)),
            ("fresh".to_string(), PlayerId(1)),
            ("fresh".to_string(), PlayerId(2)),
        ]
    );

    let valid = library.valid_replays(Race::Protoss, &layout, &CHECK);
    let keys: Vec<&str> = valid.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys, vec!["1@done", "2@done"]);
    assert!(valid.iter().all(|r| r.steps == 2));
}

#[test]
fn other_race_is_never_planned() {
    let dir = tempfile::tempdir().unwrap();
    let layout = OutputLayout::new(dir.path(), Race::Terran, Race::Protoss);
    let library = ReplayLibrary {
        replays: vec![replay("x", 1000)],
    };
    assert!(library.plan_work(Race::Terran, &layout, &CHECK).is_empty());
}
