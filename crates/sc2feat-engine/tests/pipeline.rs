//! End-to-end runs of the supervisor over the scripted mock engine.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use sc2feat_core::{GameResult, Observation, PlayerId, Race, ReplayWorkItem};
use sc2feat_engine::{PipelineConfig, StopReason, Supervisor, SupervisorReport};
use sc2feat_obs::{Canonicalizer, GlobalFeatureExtractor, MinimapFeature};
use sc2feat_store::{ActionLog, Completeness, OutputLayout, SparseMatrix};
use sc2feat_test_utils::{
    blank_minimap, fixture_catalog, replay_info, MockEngine, MockReplay, ObservationBuilder,
    UnitBuilder,
};

// ── Helpers ─────────────────────────────────────────────────────

const SIDE: u32 = 4;
const STEP: u32 = 72;

fn layer_names() -> Vec<&'static str> {
    MinimapFeature::DEFAULT_SELECTION
        .iter()
        .map(|f| f.name())
        .collect()
}

fn config(workers: usize, batch_size: usize) -> PipelineConfig {
    PipelineConfig {
        worker_count: Some(workers),
        batch_size,
        minimap_size: SIDE,
        poll_interval: Duration::from_millis(5),
        ..PipelineConfig::default()
    }
}

fn step(n: u32) -> ObservationBuilder {
    ObservationBuilder::new(n * STEP).minimap(blank_minimap(&layer_names(), SIDE))
}

/// A Terran-vs-Zerg replay of `steps` observations ending in a result.
fn script(steps: u32) -> MockReplay {
    let observations: Vec<Observation> = (1..=steps)
        .map(|n| {
            let obs = step(n).minerals(50 * n);
            if n == steps {
                obs.result(1, GameResult::Victory).build()
            } else {
                obs.build()
            }
        })
        .collect();
    MockReplay::new(
        replay_info(&[(1, Race::Terran), (2, Race::Zerg)], steps * STEP),
        observations,
    )
}

fn path(name: &str) -> PathBuf {
    PathBuf::from(format!("/replays/{name}.SC2Replay"))
}

fn item(name: &str) -> ReplayWorkItem {
    ReplayWorkItem::new(path(name), PlayerId(1))
}

fn engine_with(replays: &[(&str, MockReplay)]) -> Arc<MockEngine> {
    let engine = replays
        .iter()
        .fold(MockEngine::new(), |e, (name, r)| e.with_replay(path(name), r.clone()));
    Arc::new(engine)
}

fn layout(out: &Path) -> OutputLayout {
    OutputLayout::new(out, Race::Terran, Race::Zerg)
}

fn run(
    engine: &Arc<MockEngine>,
    cfg: PipelineConfig,
    out: &Path,
    items: Vec<ReplayWorkItem>,
) -> SupervisorReport {
    Supervisor::new(
        Arc::clone(engine),
        cfg,
        layout(out),
        Canonicalizer::default(),
    )
    .unwrap()
    .run(items)
    .unwrap()
}

// ── Tests ───────────────────────────────────────────────────────

#[test]
fn every_item_produces_complete_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with(&[("a", script(3)), ("b", script(5)), ("c", script(1))]);
    let cfg = config(2, 10);
    let check = cfg.completeness_check();

    let report = run(&engine, cfg, dir.path(), vec![item("a"), item("b"), item("c")]);

    assert_eq!(report.total, 3);
    assert_eq!(report.processed, 3);
    assert_eq!(report.succeeded(), 3);
    assert_eq!(report.failed(), 0);
    assert!(!report.interrupted);
    assert!(report
        .workers
        .iter()
        .all(|w| w.stop == StopReason::QueueClosed));

    let layout = layout(dir.path());
    for (name, steps) in [("a", 3), ("b", 5), ("c", 1)] {
        let paths = layout.artifacts(PlayerId(1), name);
        assert_eq!(
            check.check(&paths, steps * STEP).unwrap(),
            Completeness::Complete {
                steps: steps as usize
            },
            "replay {name}"
        );
        let spatial = SparseMatrix::read_npz(&paths.spatial).unwrap();
        assert_eq!(spatial.shape(), (steps as usize, 6 * 16));
        assert_eq!(ActionLog::read_json(&paths.actions).unwrap().len(), steps as usize);
    }
    assert!(engine.step_sizes().iter().all(|&s| s == STEP));
}

#[test]
fn enemy_kill_is_recorded_in_global_matrix() {
    let dir = tempfile::tempdir().unwrap();
    let observations = vec![
        step(1).unit(UnitBuilder::new(7, 105).enemy().build()).build(),
        step(2).dead(7).build(),
        step(3).result(1, GameResult::Victory).build(),
    ];
    let replay = MockReplay::new(
        replay_info(&[(1, Race::Terran), (2, Race::Zerg)], 3 * STEP),
        observations,
    );
    let engine = engine_with(&[("kill", replay)]);

    let report = run(&engine, config(1, 10), dir.path(), vec![item("kill")]);
    assert_eq!(report.succeeded(), 1);

    let names = GlobalFeatureExtractor::new(
        &fixture_catalog(),
        &Canonicalizer::default(),
        Race::Terran,
        Race::Zerg,
    );
    let killed = names
        .feature_names()
        .iter()
        .position(|n| n == "enemy_killed_Zergling")
        .unwrap();
    let global = SparseMatrix::read_npz(&layout(dir.path()).artifacts(PlayerId(1), "kill").global)
        .unwrap();
    let column: Vec<f32> = (0..3).map(|r| global.get(r, killed)).collect();
    assert_eq!(column, vec![0.0, 1.0, 0.0]);
}

#[test]
fn engine_restarts_after_each_batch() {
    let dir = tempfile::tempdir().unwrap();
    let names = ["r0", "r1", "r2", "r3", "r4"];
    let replays: Vec<(&str, MockReplay)> = names.iter().map(|&n| (n, script(2))).collect();
    let engine = engine_with(&replays);

    let report = run(
        &engine,
        config(1, 2),
        dir.path(),
        names.iter().map(|n| item(n)).collect(),
    );

    assert_eq!(report.succeeded(), 5);
    assert_eq!(engine.launches(), 3);
    assert_eq!(engine.quits(), 3);
    assert_eq!(report.workers[0].launches, 3);
    let order: Vec<String> = engine.started().into_iter().map(|s| s.replay).collect();
    let expected: Vec<String> = names
        .iter()
        .map(|n| path(n).to_string_lossy().into_owned())
        .collect();
    assert_eq!(order, expected);
}

#[test]
fn failed_replay_is_settled_and_others_continue() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with(&[
        ("ok1", script(2)),
        ("broken", script(4).failing_after(1)),
        ("ok2", script(2)),
    ]);

    let report = run(
        &engine,
        config(1, 10),
        dir.path(),
        vec![item("ok1"), item("broken"), item("ok2")],
    );

    assert_eq!(report.processed, 3);
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 1);
    // A lost connection forces a fresh engine for the next item.
    assert_eq!(engine.launches(), 2);
    let broken = layout(dir.path()).artifacts(PlayerId(1), "broken");
    assert!(!broken.global.exists());
}

#[test]
fn missing_replay_file_stops_the_worker() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with(&[("ok", script(2))]);

    let report = run(
        &engine,
        config(1, 10),
        dir.path(),
        vec![item("absent"), item("ok")],
    );

    assert_eq!(
        report.workers[0].stop,
        StopReason::MissingReplay(path("absent"))
    );
    assert_eq!(report.processed, 1);
    assert_eq!(report.succeeded(), 0);
    assert!(engine.started().is_empty());
}

#[test]
fn stalled_engine_is_a_failed_replay() {
    let dir = tempfile::tempdir().unwrap();
    let stuck = MockReplay::new(
        replay_info(&[(1, Race::Terran), (2, Race::Zerg)], 10 * STEP),
        vec![step(1).build(), step(1).build(), step(2).build()],
    );
    let engine = engine_with(&[("stuck", stuck)]);

    let report = run(&engine, config(1, 10), dir.path(), vec![item("stuck")]);

    assert_eq!(report.failed(), 1);
    assert_eq!(report.processed, 1);
}

#[test]
fn custom_map_is_sent_with_the_replay() {
    let dir = tempfile::tempdir().unwrap();
    let mut custom = script(2);
    custom.info.local_map_path = Some("Maps/Custom.SC2Map".into());
    let engine = engine_with(&[("plain", script(2)), ("custom", custom)]);

    run(
        &engine,
        config(1, 10),
        dir.path(),
        vec![item("plain"), item("custom")],
    );

    let with_map: Vec<bool> = engine.started().iter().map(|s| s.with_map).collect();
    assert_eq!(with_map, vec![false, true]);
}

#[test]
fn unknown_player_fails_only_that_item() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with(&[("a", script(2))]);
    let observer = ReplayWorkItem::new(path("a"), PlayerId(5));

    let report = run(&engine, config(1, 10), dir.path(), vec![observer, item("a")]);

    assert_eq!(report.failed(), 1);
    assert_eq!(report.succeeded(), 1);
}

#[test]
fn shutdown_before_run_abandons_everything() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with(&[("a", script(2)), ("b", script(2))]);
    let supervisor = Supervisor::new(
        Arc::clone(&engine),
        config(2, 10),
        layout(dir.path()),
        Canonicalizer::default(),
    )
    .unwrap();
    let handle = supervisor.shutdown_handle();
    handle.request();
    assert!(handle.is_requested());

    let report = supervisor.run(vec![item("a"), item("b")]).unwrap();

    assert!(report.interrupted);
    assert_eq!(report.processed, 0);
    assert!(report
        .workers
        .iter()
        .all(|w| w.stop == StopReason::Interrupted));
    assert!(engine.started().is_empty());
}

#[test]
fn launch_failure_ends_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Arc::new(
        MockEngine::new()
            .with_replay(path("a"), script(2))
            .failing_launch(),
    );

    let report = run(&engine, config(2, 10), dir.path(), vec![item("a")]);

    assert_eq!(report.processed, 0);
    assert!(report
        .workers
        .iter()
        .all(|w| matches!(w.stop, StopReason::LaunchFailed(_))));
}

#[test]
fn empty_work_list_finishes_immediately() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with(&[]);
    let report = run(&engine, config(2, 10), dir.path(), Vec::new());
    assert_eq!(report.total, 0);
    assert_eq!(report.processed, 0);
    assert!(layout(dir.path()).root().is_dir());
}

#[test]
fn invalid_config_is_rejected_up_front() {
    let engine = engine_with(&[]);
    let cfg = PipelineConfig {
        batch_size: 0,
        ..PipelineConfig::default()
    };
    let err = Supervisor::new(
        engine,
        cfg,
        layout(Path::new("/unused")),
        Canonicalizer::default(),
    )
    .err()
    .unwrap();
    assert_eq!(err, sc2feat_engine::ConfigError::ZeroBatchSize);
}
