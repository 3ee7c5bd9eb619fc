#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Progress store adapters backed by a versioned JSON document.
//!
//! Both stores share one codec. Encoding always emits the full document;
//! decoding is tolerant and never fails: unreadable sections fall back to
//! defaults and every restored value is clamped back into its invariants.

mod file;
mod memory;

use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};

use chrono::{DateTime, Utc};
use progression_core::{
    GameProgress, LevelId, LevelStats, PersistedProgress, StoreError, FIRST_LEVEL, MAX_STARS,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

pub use file::JsonFileStore;
pub use memory::MemoryStore;

/// Version written into every persisted document.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Document {
    version: u32,
    game_progress: ProgressRecord,
    level_stats: BTreeMap<String, StatsRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ProgressRecord {
    current_level_id: u32,
    max_unlocked_level_id: u32,
    completed_level_ids: Vec<u32>,
    perfect_level_ids: Vec<u32>,
    total_score: u64,
    total_play_time: u64,
    achievements: Vec<String>,
}

impl Default for ProgressRecord {
    fn default() -> Self {
        Self {
            current_level_id: FIRST_LEVEL.get(),
            max_unlocked_level_id: FIRST_LEVEL.get(),
            completed_level_ids: Vec::new(),
            perfect_level_ids: Vec::new(),
            total_score: 0,
            total_play_time: 0,
            achievements: Vec::new(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StatsRecord {
    is_unlocked: bool,
    is_completed: bool,
    is_perfect: bool,
    stars: u8,
    best_score: u64,
    best_time: Option<u64>,
    completion_count: u32,
    perfect_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_played_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    claimed_rewards: BTreeSet<usize>,
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn level_id(raw: u32) -> LevelId {
    LevelId::new(raw.max(FIRST_LEVEL.get()))
}

fn level_set(ids: &[u32]) -> BTreeSet<LevelId> {
    ids.iter()
        .copied()
        .filter(|&id| id > 0)
        .map(LevelId::new)
        .collect()
}

impl From<&GameProgress> for ProgressRecord {
    fn from(progress: &GameProgress) -> Self {
        Self {
            current_level_id: progress.current_level.get(),
            max_unlocked_level_id: progress.max_unlocked_level.get(),
            completed_level_ids: progress.completed_levels.iter().map(LevelId::get).collect(),
            perfect_level_ids: progress.perfect_levels.iter().map(LevelId::get).collect(),
            total_score: progress.total_score,
            total_play_time: millis(progress.total_play_time),
            achievements: progress.achievements.clone(),
        }
    }
}

impl From<ProgressRecord> for GameProgress {
    fn from(record: ProgressRecord) -> Self {
        let mut achievements = Vec::with_capacity(record.achievements.len());
        for tag in record.achievements {
            if !achievements.contains(&tag) {
                achievements.push(tag);
            }
        }
        Self {
            current_level: level_id(record.current_level_id),
            max_unlocked_level: level_id(record.max_unlocked_level_id),
            completed_levels: level_set(&record.completed_level_ids),
            perfect_levels: level_set(&record.perfect_level_ids),
            total_score: record.total_score,
            total_play_time: Duration::from_millis(record.total_play_time),
            achievements,
        }
    }
}

impl From<&LevelStats> for StatsRecord {
    fn from(stats: &LevelStats) -> Self {
        Self {
            is_unlocked: stats.is_unlocked,
            is_completed: stats.is_completed,
            is_perfect: stats.is_perfect,
            stars: stats.stars,
            best_score: stats.best_score,
            best_time: stats.best_time.map(millis),
            completion_count: stats.completion_count,
            perfect_count: stats.perfect_count,
            last_played_at: stats.last_played_at,
            claimed_rewards: stats.claimed_rewards.clone(),
        }
    }
}

impl From<StatsRecord> for LevelStats {
    fn from(record: StatsRecord) -> Self {
        Self {
            is_unlocked: record.is_unlocked,
            is_completed: record.is_completed || record.completion_count > 0,
            is_perfect: record.is_perfect,
            stars: record.stars.min(MAX_STARS),
            best_score: record.best_score,
            best_time: record.best_time.map(Duration::from_millis),
            completion_count: record.completion_count,
            perfect_count: record.perfect_count.min(record.completion_count),
            last_played_at: record.last_played_at,
            claimed_rewards: record.claimed_rewards,
        }
    }
}

/// Serializes progress and per-level stats into the persisted JSON document.
pub fn encode(
    progress: &GameProgress,
    stats: &BTreeMap<LevelId, LevelStats>,
) -> Result<String, StoreError> {
    let document = Document {
        version: SCHEMA_VERSION,
        game_progress: ProgressRecord::from(progress),
        level_stats: stats
            .iter()
            .map(|(id, record)| (id.get().to_string(), StatsRecord::from(record)))
            .collect(),
    };
    serde_json::to_string_pretty(&document).map_err(|error| StoreError::Serialize(Box::new(error)))
}

/// Restores progress from a persisted JSON document.
///
/// Never fails. Malformed input yields defaults and malformed entries are
/// skipped, each with a warning.
#[must_use]
pub fn decode(raw: &str) -> PersistedProgress {
    if raw.trim().is_empty() {
        debug!("no persisted progress, starting fresh");
        return PersistedProgress::default();
    }

    let document = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(document)) => document,
        Ok(_) => {
            warn!("persisted progress is not a JSON object, starting fresh");
            return PersistedProgress::default();
        }
        Err(error) => {
            warn!(%error, "persisted progress is not valid JSON, starting fresh");
            return PersistedProgress::default();
        }
    };

    match document.get("version").and_then(Value::as_u64) {
        Some(version) if version == u64::from(SCHEMA_VERSION) => {}
        Some(version) => warn!(version, "unexpected progress schema version, reading anyway"),
        None => warn!("persisted progress has no schema version, reading anyway"),
    }

    let progress = match document.get("gameProgress") {
        Some(value) => match ProgressRecord::deserialize(value) {
            Ok(record) => GameProgress::from(record),
            Err(error) => {
                warn!(%error, "malformed game progress, using defaults");
                GameProgress::default()
            }
        },
        None => GameProgress::default(),
    };

    let mut stats = BTreeMap::new();
    match document.get("levelStats") {
        Some(Value::Object(entries)) => {
            for (key, value) in entries {
                let id = match key.parse::<u32>() {
                    Ok(id) if id > 0 => LevelId::new(id),
                    _ => {
                        warn!(key = %key, "skipping level stats with invalid id");
                        continue;
                    }
                };
                match StatsRecord::deserialize(value) {
                    Ok(record) => {
                        let _ = stats.insert(id, LevelStats::from(record));
                    }
                    Err(error) => warn!(level = id.get(), %error, "skipping malformed level stats"),
                }
            }
        }
        Some(_) => warn!("level stats are not a JSON object, ignoring them"),
        None => {}
    }

    debug!(
        levels = stats.len(),
        completed = progress.completed_levels.len(),
        "restored persisted progress"
    );
    PersistedProgress { progress, stats }
}
