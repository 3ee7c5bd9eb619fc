#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Stats aggregation that folds finished sessions into persisted progress.
//!
//! The aggregator owns the scoring rules: time bonus, perfection, the star
//! rating, and the monotonic best-of updates applied to [`LevelStats`] and
//! [`GameProgress`]. Unlock re-evaluation and persistence are left to the
//! engine, which runs them after the fold.

mod achievements;
mod rewards;

use std::time::Duration;

use chrono::{DateTime, Utc};
use progression_core::{GameProgress, LevelDefinition, LevelStats, RewardSpec, MAX_STARS};
use progression_system_objectives::{is_level_complete, Session};

pub use achievements::award_achievements;
pub use rewards::claim_rewards;

/// Score and timing reported by the game layer when a session ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunOutcome {
    /// Score earned during the run.
    pub score: u64,
    /// Time the run took, measured by the caller.
    pub elapsed: Duration,
}

impl RunOutcome {
    /// Creates a new run outcome.
    #[must_use]
    pub const fn new(score: u64, elapsed: Duration) -> Self {
        Self { score, elapsed }
    }
}

/// Result of folding a single run into the persisted records.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Aggregation {
    /// Star rating of the level after the fold.
    pub stars: u8,
    /// Whether the run was perfect.
    pub is_perfect: bool,
    /// Whether every required objective was met.
    pub all_required_done: bool,
    /// Whether the run met the time bonus threshold.
    pub time_bonus: bool,
    /// Whether the run raised the best score.
    pub new_best_score: bool,
    /// Whether the run lowered the best time.
    pub new_best_time: bool,
    /// Rewards granted by the run.
    pub rewards: Vec<RewardSpec>,
}

/// Reports whether a run earns the level's time bonus.
///
/// Levels without a time limit never award one.
#[must_use]
pub fn time_bonus_achieved(definition: &LevelDefinition, elapsed: Duration) -> bool {
    !definition.time_limit().is_zero() && elapsed <= definition.time_bonus_threshold()
}

/// Computes the star rating of a single run before merging with prior results.
#[must_use]
pub fn run_stars(all_required_done: bool, time_bonus: bool) -> u8 {
    1 + u8::from(all_required_done) + u8::from(time_bonus)
}

/// Folds a finished session into the level's stats and the global progress.
///
/// Every best-of field only moves in the improving direction: score and stars
/// never decrease, best time never increases, and perfection is sticky.
pub fn aggregate(
    definition: &LevelDefinition,
    session: &Session,
    outcome: RunOutcome,
    stats: &mut LevelStats,
    progress: &mut GameProgress,
    now: DateTime<Utc>,
) -> Aggregation {
    let all_required_done = is_level_complete(session);
    let time_bonus = time_bonus_achieved(definition, outcome.elapsed);
    let is_perfect =
        all_required_done && (time_bonus || !definition.perfect_requires_time_bonus());

    let new_best_score = stats.completion_count == 0 || outcome.score > stats.best_score;
    stats.best_score = stats.best_score.max(outcome.score);

    let new_best_time = stats.best_time.map_or(true, |best| outcome.elapsed < best);
    if new_best_time {
        stats.best_time = Some(outcome.elapsed);
    }

    stats.completion_count = stats.completion_count.saturating_add(1);
    if is_perfect {
        stats.perfect_count = stats.perfect_count.saturating_add(1);
    }
    stats.is_completed = true;
    stats.is_perfect = stats.is_perfect || is_perfect;
    stats.last_played_at = Some(now);
    stats.stars = stats
        .stars
        .max(run_stars(all_required_done, time_bonus))
        .min(MAX_STARS);

    let level = definition.id();
    let _ = progress.completed_levels.insert(level);
    if is_perfect {
        let _ = progress.perfect_levels.insert(level);
    }
    progress.total_score = progress.total_score.saturating_add(outcome.score);
    progress.total_play_time = progress.total_play_time.saturating_add(outcome.elapsed);
    progress.max_unlocked_level = progress.max_unlocked_level.max(level.next());

    let rewards = claim_rewards(definition, stats, is_perfect, time_bonus);

    Aggregation {
        stars: stats.stars,
        is_perfect,
        all_required_done,
        time_bonus,
        new_best_score,
        new_best_time,
        rewards,
    }
}
