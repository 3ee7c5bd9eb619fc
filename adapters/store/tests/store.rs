use std::{collections::BTreeMap, fs, time::Duration};

use chrono::{TimeZone, Utc};
use progression_core::{GameProgress, LevelId, LevelStats, ProgressStore, StoreError, FIRST_LEVEL};
use progression_store::{JsonFileStore, MemoryStore};

fn sample() -> (GameProgress, BTreeMap<LevelId, LevelStats>) {
    let mut progress = GameProgress {
        current_level: LevelId::new(2),
        max_unlocked_level: LevelId::new(3),
        total_score: 1_250,
        total_play_time: Duration::from_millis(245_000),
        achievements: vec!["first-clear".to_owned()],
        ..GameProgress::default()
    };
    let _ = progress.completed_levels.insert(LevelId::new(1));
    let _ = progress.completed_levels.insert(LevelId::new(2));
    let _ = progress.perfect_levels.insert(LevelId::new(1));

    let mut stats = BTreeMap::new();
    let _ = stats.insert(
        LevelId::new(1),
        LevelStats {
            is_unlocked: true,
            is_completed: true,
            is_perfect: true,
            stars: 3,
            best_score: 900,
            best_time: Some(Duration::from_millis(95_000)),
            completion_count: 2,
            perfect_count: 1,
            last_played_at: Some(Utc.with_ymd_and_hms(2024, 3, 9, 18, 30, 0).unwrap()),
            claimed_rewards: [0].into_iter().collect(),
        },
    );
    let _ = stats.insert(LevelId::new(3), LevelStats::new(false));
    (progress, stats)
}

#[test]
fn empty_store_yields_defaults() {
    let restored = MemoryStore::new().load();

    assert_eq!(restored.progress.max_unlocked_level, FIRST_LEVEL);
    assert_eq!(restored.progress, GameProgress::default());
    assert!(restored.stats.is_empty());
}

#[test]
fn corrupt_store_yields_defaults() {
    for raw in ["", "   ", "{ not json", "[1, 2, 3]", "42", "null"] {
        let restored = MemoryStore::from_raw(raw).load();

        assert_eq!(restored.progress.max_unlocked_level, FIRST_LEVEL, "{raw:?}");
        assert!(restored.stats.is_empty(), "{raw:?}");
    }
}

#[test]
fn memory_store_restores_what_it_saved() {
    let (progress, stats) = sample();
    let mut store = MemoryStore::new();

    store.save(&progress, &stats).expect("memory save succeeds");
    let restored = store.load();

    assert_eq!(restored.progress, progress);
    assert_eq!(restored.stats, stats);
    assert!(store.raw().is_some_and(|raw| raw.contains("\"gameProgress\"")));
}

#[test]
fn file_store_creates_directories_and_restores() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("saves").join("slot-1").join("progress.json");
    let (progress, stats) = sample();

    let mut store = JsonFileStore::new(&path);
    store.save(&progress, &stats).expect("file save succeeds");
    assert!(path.exists());

    let restored = JsonFileStore::new(&path).load();
    assert_eq!(restored.progress, progress);
    assert_eq!(restored.stats, stats);
}

#[test]
fn file_store_overwrites_previous_document() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("progress.json");
    let mut store = JsonFileStore::new(&path);
    let (mut progress, stats) = sample();

    store.save(&progress, &stats).expect("first save");
    progress.total_score = 4_000;
    store.save(&progress, &stats).expect("second save");

    assert_eq!(store.load().progress.total_score, 4_000);
    let leftovers = fs::read_dir(dir.path()).expect("dir readable").count();
    assert_eq!(leftovers, 1, "staging files must not linger");
}

#[test]
fn missing_or_corrupt_file_yields_defaults() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("progress.json");

    assert_eq!(JsonFileStore::new(&path).load().progress, GameProgress::default());

    fs::write(&path, "{\"version\": 1, \"gameProgress\": 7").expect("write corrupt file");
    let restored = JsonFileStore::new(&path).load();
    assert_eq!(restored.progress, GameProgress::default());
    assert!(restored.stats.is_empty());
}

#[test]
fn unwritable_target_reports_write_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let blocker = dir.path().join("occupied");
    fs::write(&blocker, "not a directory").expect("write blocker");
    let (progress, stats) = sample();

    let mut store = JsonFileStore::new(blocker.join("progress.json"));
    let error = store.save(&progress, &stats).expect_err("parent is a file");

    assert!(matches!(error, StoreError::Write { .. }));
}
