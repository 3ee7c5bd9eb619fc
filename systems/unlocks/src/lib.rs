#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure unlock evaluation over level definitions and global progress.
//!
//! None of the supported conditions depend on another level's unlocked
//! state, only on completion, perfection, and score aggregates, so a single
//! linear scan per trigger reaches the same result as a fixed-point loop.

use std::collections::BTreeMap;

use progression_core::{GameProgress, LevelDefinition, LevelId, LevelStats, UnlockCondition};
use tracing::debug;

/// Reports whether a single unlock condition holds for the provided progress.
#[must_use]
pub fn condition_holds(condition: &UnlockCondition, progress: &GameProgress) -> bool {
    match *condition {
        UnlockCondition::LevelCompleted(level) => progress.completed_levels.contains(&level),
        UnlockCondition::TotalScoreAtLeast(score) => progress.total_score >= score,
        UnlockCondition::LevelsCompletedAtLeast(count) => progress.completed_count() >= count,
        UnlockCondition::PerfectLevelsAtLeast(count) => progress.perfect_count() >= count,
    }
}

/// Reports whether every unlock condition of the level holds.
///
/// A level without conditions is always eligible.
#[must_use]
pub fn is_eligible(definition: &LevelDefinition, progress: &GameProgress) -> bool {
    definition
        .unlock_conditions()
        .iter()
        .all(|condition| condition_holds(condition, progress))
}

/// Unlocks every locked level whose conditions hold and returns their ids.
///
/// Levels are visited once each in iteration order. Unlocked levels are never
/// re-locked, whatever the progress says. A definition without a stats record
/// is treated as locked and receives one.
pub fn reevaluate_all<'a, I>(
    definitions: I,
    stats: &mut BTreeMap<LevelId, LevelStats>,
    progress: &GameProgress,
) -> Vec<LevelId>
where
    I: IntoIterator<Item = &'a LevelDefinition>,
{
    let mut unlocked = Vec::new();
    for definition in definitions {
        let record = stats.entry(definition.id()).or_default();
        if record.is_unlocked || !is_eligible(definition, progress) {
            continue;
        }
        if record.unlock() {
            debug!(level = definition.id().get(), "level unlocked");
            unlocked.push(definition.id());
        }
    }
    unlocked
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn progress_with(completed: &[u32], perfect: &[u32], score: u64) -> GameProgress {
        GameProgress {
            completed_levels: completed.iter().copied().map(LevelId::new).collect(),
            perfect_levels: perfect.iter().copied().map(LevelId::new).collect::<BTreeSet<_>>(),
            total_score: score,
            ..GameProgress::default()
        }
    }

    #[test]
    fn level_completed_checks_membership() {
        let progress = progress_with(&[1, 2], &[], 0);
        assert!(condition_holds(
            &UnlockCondition::LevelCompleted(LevelId::new(2)),
            &progress
        ));
        assert!(!condition_holds(
            &UnlockCondition::LevelCompleted(LevelId::new(3)),
            &progress
        ));
    }

    #[test]
    fn scalar_conditions_use_inclusive_thresholds() {
        let progress = progress_with(&[1, 2, 3], &[2], 1_500);
        assert!(condition_holds(&UnlockCondition::TotalScoreAtLeast(1_500), &progress));
        assert!(!condition_holds(&UnlockCondition::TotalScoreAtLeast(1_501), &progress));
        assert!(condition_holds(&UnlockCondition::LevelsCompletedAtLeast(3), &progress));
        assert!(!condition_holds(&UnlockCondition::LevelsCompletedAtLeast(4), &progress));
        assert!(condition_holds(&UnlockCondition::PerfectLevelsAtLeast(1), &progress));
        assert!(!condition_holds(&UnlockCondition::PerfectLevelsAtLeast(2), &progress));
    }
}
