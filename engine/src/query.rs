//! Read-only views over an [`EngineContext`] for presentation layers.

use progression_core::{
    LevelDefinition, LevelId, LevelStats, LevelSummary, ProgressStore, ProgressSummary, MAX_STARS,
};

use crate::EngineContext;

fn count(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn summarize(definition: &LevelDefinition, stats: Option<&LevelStats>) -> LevelSummary {
    let fallback = LevelStats::default();
    let stats = stats.unwrap_or(&fallback);
    LevelSummary {
        id: definition.id(),
        name: definition.name().to_owned(),
        kind: definition.kind(),
        difficulty: definition.difficulty(),
        unlocked: stats.is_unlocked,
        completed: stats.is_completed,
        perfect: stats.is_perfect,
        stars: stats.stars,
        best_score: stats.best_score,
        best_time: stats.best_time,
        completion_count: stats.completion_count,
    }
}

/// Summaries of registered levels in ascending id order.
///
/// Locked levels are omitted unless `include_locked` is set.
#[must_use]
pub fn list_levels<S: ProgressStore>(
    context: &EngineContext<S>,
    include_locked: bool,
) -> Vec<LevelSummary> {
    context
        .registry
        .list(include_locked, &context.stats)
        .into_iter()
        .map(|definition| summarize(definition, context.stats.get(&definition.id())))
        .collect()
}

/// Summary of a single registered level.
#[must_use]
pub fn level_summary<S: ProgressStore>(
    context: &EngineContext<S>,
    id: LevelId,
) -> Option<LevelSummary> {
    let definition = context.registry.get(id).ok()?;
    Some(summarize(definition, context.stats.get(&id)))
}

/// Aggregate view over the whole progress.
#[must_use]
pub fn progress_summary<S: ProgressStore>(context: &EngineContext<S>) -> ProgressSummary {
    let registered: Vec<&LevelStats> = context
        .registry
        .iter()
        .filter_map(|definition| context.stats.get(&definition.id()))
        .collect();
    let total_levels = count(context.registry.len());
    let completed_levels = count(registered.iter().filter(|stats| stats.is_completed).count());
    let completion_percent = if total_levels == 0 {
        0.0
    } else {
        f64::from(completed_levels) * 100.0 / f64::from(total_levels)
    };

    ProgressSummary {
        total_levels,
        unlocked_levels: count(registered.iter().filter(|stats| stats.is_unlocked).count()),
        completed_levels,
        perfect_levels: count(registered.iter().filter(|stats| stats.is_perfect).count()),
        stars_earned: registered.iter().map(|stats| u32::from(stats.stars)).sum(),
        stars_available: total_levels.saturating_mul(u32::from(MAX_STARS)),
        completion_percent,
        total_score: context.progress.total_score,
        total_play_time: context.progress.total_play_time,
        current_level: context.progress.current_level,
        max_unlocked_level: context.progress.max_unlocked_level,
        achievements: context.progress.achievements.clone(),
    }
}
