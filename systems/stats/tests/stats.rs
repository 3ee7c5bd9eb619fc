use std::time::Duration;

use chrono::{TimeZone, Utc};
use progression_core::{
    GameProgress, LevelConfig, LevelDefinition, LevelId, LevelStats, ObjectiveId, ObjectiveKind,
    ObjectiveSpec, SessionId,
};
use progression_system_objectives::{start_session, update_objective, Session};
use progression_system_stats::{aggregate, time_bonus_achieved, Aggregation, RunOutcome};

fn timed_level(
    time_limit_ms: u64,
    threshold_ms: u64,
    perfect_requires_bonus: bool,
) -> LevelDefinition {
    LevelDefinition::new(LevelConfig {
        id: LevelId::new(1),
        name: "Outpost".to_owned(),
        time_limit: Duration::from_millis(time_limit_ms),
        time_bonus_threshold: Duration::from_millis(threshold_ms),
        perfect_requires_time_bonus: perfect_requires_bonus,
        objectives: vec![ObjectiveSpec::required(
            ObjectiveId::new(0),
            ObjectiveKind::DestroyAllEnemies,
            4,
            "Destroy all enemies",
        )],
        ..LevelConfig::default()
    })
    .expect("valid definition")
}

fn played(definition: &LevelDefinition, progress: u64) -> Session {
    let mut session = start_session(definition, true, SessionId::new(1)).expect("unlocked");
    let _ = update_objective(&mut session, ObjectiveId::new(0), progress).expect("objective");
    session
}

struct Records {
    stats: LevelStats,
    progress: GameProgress,
}

impl Records {
    fn new() -> Self {
        Self {
            stats: LevelStats::new(true),
            progress: GameProgress::default(),
        }
    }

    fn fold(
        &mut self,
        definition: &LevelDefinition,
        session: &Session,
        score: u64,
        elapsed_ms: u64,
    ) -> Aggregation {
        aggregate(
            definition,
            session,
            RunOutcome::new(score, Duration::from_millis(elapsed_ms)),
            &mut self.stats,
            &mut self.progress,
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        )
    }
}

#[test]
fn fast_complete_run_earns_three_stars_and_perfect() {
    let definition = timed_level(180_000, 120_000, true);
    let mut records = Records::new();

    let result = records.fold(&definition, &played(&definition, 4), 500, 100_000);

    assert_eq!(result.stars, 3);
    assert!(result.is_perfect);
    assert!(records.stats.is_perfect);
    assert_eq!(records.stats.perfect_count, 1);
    assert!(records.progress.perfect_levels.contains(&LevelId::new(1)));
    assert_eq!(records.progress.max_unlocked_level, LevelId::new(2));
}

#[test]
fn slow_complete_run_earns_two_stars() {
    let definition = timed_level(180_000, 120_000, true);
    let mut records = Records::new();

    let result = records.fold(&definition, &played(&definition, 4), 500, 150_000);

    assert_eq!(result.stars, 2);
    assert!(!result.is_perfect);
    assert!(!result.time_bonus);
    assert!(records.progress.perfect_levels.is_empty());
}

#[test]
fn incomplete_fast_run_still_counts_as_completion() {
    let definition = timed_level(180_000, 120_000, true);
    let mut records = Records::new();

    let result = records.fold(&definition, &played(&definition, 1), 80, 60_000);

    assert_eq!(result.stars, 2);
    assert!(!result.all_required_done);
    assert!(records.stats.is_completed);
    assert_eq!(records.stats.completion_count, 1);
}

#[test]
fn unlimited_level_is_never_perfect_by_default() {
    let definition = timed_level(0, 0, true);
    let mut records = Records::new();

    assert!(!time_bonus_achieved(&definition, Duration::ZERO));
    let result = records.fold(&definition, &played(&definition, 4), 500, 1);

    assert_eq!(result.stars, 2);
    assert!(!result.is_perfect);
}

#[test]
fn unlimited_level_can_opt_out_of_time_bonus_for_perfection() {
    let definition = timed_level(0, 0, false);
    let mut records = Records::new();

    let result = records.fold(&definition, &played(&definition, 4), 500, 90_000);

    assert_eq!(result.stars, 2);
    assert!(result.is_perfect);
}

#[test]
fn best_of_fields_never_regress() {
    let definition = timed_level(180_000, 120_000, true);
    let mut records = Records::new();
    let runs = [
        (4, 900, 100_000),
        (1, 100, 170_000),
        (4, 1_200, 150_000),
        (2, 50, 90_000),
    ];

    let mut previous_stars = 0;
    let mut previous_score = 0;
    let mut previous_time: Option<Duration> = None;
    for (objective_progress, score, elapsed) in runs {
        let result = records.fold(
            &definition,
            &played(&definition, objective_progress),
            score,
            elapsed,
        );

        assert!(result.stars >= previous_stars);
        assert!(records.stats.best_score >= previous_score);
        if let (Some(before), Some(after)) = (previous_time, records.stats.best_time) {
            assert!(after <= before);
        }
        previous_stars = result.stars;
        previous_score = records.stats.best_score;
        previous_time = records.stats.best_time;
    }

    assert_eq!(records.stats.stars, 3);
    assert_eq!(records.stats.best_score, 1_200);
    assert_eq!(records.stats.best_time, Some(Duration::from_millis(90_000)));
    assert!(records.stats.is_perfect, "perfection is sticky");
    assert_eq!(records.stats.completion_count, 4);
    assert_eq!(records.stats.perfect_count, 1);
    assert!(records.stats.perfect_count <= records.stats.completion_count);
}

#[test]
fn total_score_and_play_time_accumulate_every_run() {
    let definition = timed_level(180_000, 120_000, true);
    let mut records = Records::new();
    let scores = [500, 0, 1_250, 75];

    for score in scores {
        let _ = records.fold(&definition, &played(&definition, 4), score, 10_000);
    }

    assert_eq!(records.progress.total_score, scores.iter().sum::<u64>());
    assert_eq!(records.progress.total_play_time, Duration::from_millis(40_000));
    assert_eq!(records.progress.completed_levels.len(), 1);
}

#[test]
fn best_flags_report_improvements() {
    let definition = timed_level(180_000, 120_000, true);
    let mut records = Records::new();

    let first = records.fold(&definition, &played(&definition, 4), 300, 110_000);
    assert!(first.new_best_score && first.new_best_time);

    let second = records.fold(&definition, &played(&definition, 4), 200, 120_000);
    assert!(!second.new_best_score && !second.new_best_time);
    assert!(records.stats.last_played_at.is_some());
}
