use std::time::Duration;

use rust_runner::{
    host::SimulationHost,
    Correction,
    EngineState,
    GameConfig,
    GameEngine,
    SnapshotDelta,
    SyncConfig
};

const DT: f32 = 1000.0 / 60.0;

#[test]
fn test_full_lifecycle_walkthrough() {
    let mut engine = GameEngine::new(GameConfig::default());
    assert_eq!(engine.state(), EngineState::Idle);

    engine.start().unwrap();
    assert_eq!(engine.state(), EngineState::Running);
    assert_eq!(engine.score(), 0);
    assert_eq!(engine.frame_count(), 0);

    engine.update(16.0);
    assert_eq!(engine.frame_count(), 1);

    engine.pause().unwrap();
    assert!(engine.snapshot().is_paused);
    engine.update(16.0);
    assert_eq!(engine.frame_count(), 1);

    engine.resume().unwrap();
    engine.game_over().unwrap();
    assert_eq!(engine.state(), EngineState::GameOver);
    assert!(!engine.snapshot().player.is_alive);

    engine.start().unwrap();
    assert_eq!(engine.state(), EngineState::Running);
    assert_eq!(engine.score(), 0);
    assert_eq!(engine.frame_count(), 0);
}

#[test]
fn test_standing_player_eventually_loses() {
    let mut engine = GameEngine::new(GameConfig::default());
    engine.start().unwrap();

    let mut ticks: u64 = 0;
    while engine.state() == EngineState::Running {
        engine.update(DT);
        ticks += 1;
        assert!(ticks < 200_000, "obstacles never ended the run");
    }

    let summary = engine.run_summary().unwrap();
    assert!(!summary.is_alive);
    assert_eq!(engine.snapshot().player.health, 0);
    assert!(summary.frames > 0);
    assert!(summary.score > 0, "passive score must accrue before the end");
    assert!(summary.obstacles_cleared >= 1, "hit obstacles still scroll past");
}

#[test]
fn test_equal_seeds_replay_identical_runs() {
    let run = |seed: u64| {
        let mut config = GameConfig::default();
        config.rng_seed = seed;
        let mut engine = GameEngine::new(config);
        engine.start().unwrap();
        for tick in 0..2_000 {
            if tick % 50 == 0 {
                engine.jump();
            }
            engine.update(DT);
        }
        if engine.state() != EngineState::GameOver {
            engine.game_over().unwrap();
        }
        engine.run_summary().unwrap()
    };

    let first = run(7);
    let second = run(7);
    assert!(first.frames > 0);
    assert_eq!(first, second);
}

#[test]
fn test_adjacent_snapshots_blend_distant_states_snap() {
    let sync_config = SyncConfig::default();
    let mut engine = GameEngine::new(GameConfig::default());
    engine.start().unwrap();

    engine.update(DT);
    let early = engine.snapshot();
    engine.update(DT);
    let next = engine.snapshot();

    let delta = SnapshotDelta::between(&early, &next);
    assert_eq!(delta.classify(&sync_config), Correction::Blend);

    for _ in 0..1_000 {
        engine.update(DT);
    }
    let late = engine.snapshot();
    assert!(!late.obstacles.is_empty());

    let delta = SnapshotDelta::between(&early, &late);
    assert_eq!(delta.classify(&sync_config), Correction::Snap);
}

#[tokio::test]
async fn test_hosted_session_round_trip() {
    let sync_config = SyncConfig {
        tick_rate_hz: 200,
        ..SyncConfig::default()
    };
    let handle = SimulationHost::new(GameConfig::default(), sync_config)
        .run()
        .unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(handle.jump().unwrap());

    tokio::time::sleep(Duration::from_millis(100)).await;
    let snapshot = handle.snapshot().unwrap();
    assert!(snapshot.frame_count > 0);
    assert!(!snapshot.is_game_over);

    let summary = handle.shutdown().await.unwrap();
    assert!(summary.frames >= snapshot.frame_count);
    assert!(!summary.is_alive);
}
