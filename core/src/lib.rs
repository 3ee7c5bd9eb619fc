#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the level progression engine.
//!
//! This crate defines the vocabulary that connects the authoritative engine
//! context, the pure progression systems, and the adapters at the edges.
//! Level definitions are authored through [`LevelConfig`] and validated into
//! immutable [`LevelDefinition`] values. Durable state lives in
//! [`GameProgress`] and per-level [`LevelStats`], which a [`ProgressStore`]
//! implementation persists. The engine reports what happened through
//! [`Event`] values and fails with typed [`EngineError`] values.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    path::PathBuf,
    time::Duration,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of the level that is unlocked unconditionally.
pub const FIRST_LEVEL: LevelId = LevelId::new(1);

/// Maximum star rating a single level can award.
pub const MAX_STARS: u8 = 3;

/// Unique positive identifier assigned to a level definition.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct LevelId(u32);

impl LevelId {
    /// Creates a new level identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Identifier directly following this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Identifier directly preceding this one, if it is a valid level id.
    #[must_use]
    pub const fn previous(self) -> Option<Self> {
        if self.0 > 1 {
            Some(Self(self.0 - 1))
        } else {
            None
        }
    }
}

impl fmt::Display for LevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of an objective within its level definition.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ObjectiveId(u32);

impl ObjectiveId {
    /// Creates a new objective identifier with the provided index.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Position of the objective within its level's objective list.
    #[must_use]
    pub fn index(&self) -> usize {
        usize::try_from(self.0).unwrap_or(usize::MAX)
    }
}

impl fmt::Display for ObjectiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier the engine assigns to every session it starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    /// Creates a new session identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Gameplay flavour of a level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LevelKind {
    /// Standard level that ends once its objectives are met.
    #[default]
    Normal,
    /// Level built around a single boss encounter.
    Boss,
    /// Level where the player must outlast the attackers.
    Survival,
    /// Level where the player guards a moving target.
    Escort,
    /// Level where the player holds a fixed position.
    Defense,
    /// Level scored primarily on completion time.
    SpeedRun,
    /// Level built around a puzzle rather than combat.
    Puzzle,
}

/// Difficulty tier applied to a level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    /// Gentlest tier.
    Easy,
    /// Baseline tier.
    #[default]
    Normal,
    /// Tier for experienced players.
    Hard,
    /// Tier for players who mastered the game.
    Expert,
    /// Harshest tier.
    Nightmare,
}

impl Difficulty {
    /// Every difficulty tier in ascending order.
    pub const ALL: [Difficulty; 5] = [
        Self::Easy,
        Self::Normal,
        Self::Hard,
        Self::Expert,
        Self::Nightmare,
    ];

    /// Scale applied to generated enemy counts, in tenths.
    #[must_use]
    pub const fn multiplier_tenths(self) -> u32 {
        match self {
            Self::Easy => 7,
            Self::Normal => 10,
            Self::Hard => 15,
            Self::Expert => 20,
            Self::Nightmare => 30,
        }
    }

    /// Scale applied to generated enemy counts.
    #[must_use]
    pub fn multiplier(self) -> f64 {
        f64::from(self.multiplier_tenths()) / 10.0
    }

    /// Scales a count by the multiplier, rounding down.
    #[must_use]
    pub fn scale_count(self, count: u32) -> u32 {
        let scaled = u64::from(count) * u64::from(self.multiplier_tenths()) / 10;
        u32::try_from(scaled).unwrap_or(u32::MAX)
    }

    /// Lowercase name of the tier.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Normal => "normal",
            Self::Hard => "hard",
            Self::Expert => "expert",
            Self::Nightmare => "nightmare",
        }
    }

    /// Resolves a tier from its name, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|difficulty| difficulty.name().eq_ignore_ascii_case(name))
    }

    /// Multiplier for the named tier, falling back to 1.0 for unrecognized names.
    #[must_use]
    pub fn multiplier_for_name(name: &str) -> f64 {
        Self::from_name(name).map_or(1.0, Self::multiplier)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Describes a group of enemies a level spawns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemySpawnSpec {
    /// Tag identifying the enemy type.
    pub enemy: String,
    /// Number of enemies spawned for this entry.
    pub count: u32,
    /// Delay before the first enemy of this entry spawns.
    #[serde(with = "millis")]
    pub spawn_delay: Duration,
    /// Tag naming the spawn pattern used by the game layer.
    pub pattern: String,
}

impl EnemySpawnSpec {
    /// Creates a spawn entry with the provided values.
    #[must_use]
    pub fn new(
        enemy: impl Into<String>,
        count: u32,
        spawn_delay: Duration,
        pattern: impl Into<String>,
    ) -> Self {
        Self {
            enemy: enemy.into(),
            count,
            spawn_delay,
            pattern: pattern.into(),
        }
    }
}

/// Measurable goal types an objective can track.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectiveKind {
    /// Destroy every spawned enemy.
    DestroyAllEnemies,
    /// Survive for the target duration.
    SurviveTime,
    /// Keep the base alive.
    ProtectBase,
    /// Collect the target number of items.
    CollectItems,
    /// Reach the level's destination.
    ReachDestination,
    /// Defeat the level's boss.
    DefeatBoss,
    /// Reach the target score.
    ScoreTarget,
}

/// Authoring description of a single objective.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveSpec {
    /// Index of the objective within its level.
    pub id: ObjectiveId,
    /// Goal type tracked by the objective.
    pub kind: ObjectiveKind,
    /// Progress value at which the objective counts as completed.
    pub target: u64,
    /// Human readable description.
    pub description: String,
    /// Whether the objective gates level completion.
    pub required: bool,
}

impl ObjectiveSpec {
    /// Creates a required objective with the provided values.
    #[must_use]
    pub fn required(
        id: ObjectiveId,
        kind: ObjectiveKind,
        target: u64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id,
            kind,
            target,
            description: description.into(),
            required: true,
        }
    }

    /// Creates an optional objective that never blocks completion.
    #[must_use]
    pub fn optional(
        id: ObjectiveId,
        kind: ObjectiveKind,
        target: u64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            required: false,
            ..Self::required(id, kind, target, description)
        }
    }
}

/// Kinds of rewards a level can grant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RewardKind {
    /// Bonus score.
    Score,
    /// Extra lives.
    Lives,
    /// A power-up item.
    Powerup,
    /// A weapon upgrade.
    WeaponUpgrade,
    /// Access to another level.
    UnlockLevel,
    /// Access to a game mode.
    UnlockMode,
}

/// Outcome a reward is conditioned on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RewardCondition {
    /// Granted for any completion.
    Completion,
    /// Granted for a perfect completion.
    Perfect,
    /// Granted when the time bonus threshold is met.
    TimeBonus,
}

/// Reward granted by a level when its condition is met.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardSpec {
    /// Kind of reward.
    pub kind: RewardKind,
    /// Magnitude of the reward, interpreted per kind.
    pub value: u64,
    /// Outcome required to earn the reward.
    pub condition: RewardCondition,
    /// Authored as already claimed, so it is never granted.
    pub claimed: bool,
}

impl RewardSpec {
    /// Creates an unclaimed reward.
    #[must_use]
    pub const fn new(kind: RewardKind, value: u64, condition: RewardCondition) -> Self {
        Self {
            kind,
            value,
            condition,
            claimed: false,
        }
    }
}

/// Predicate over global progress that gates access to a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnlockCondition {
    /// The referenced level has been completed at least once.
    LevelCompleted(LevelId),
    /// The accumulated score reaches the threshold.
    TotalScoreAtLeast(u64),
    /// At least this many distinct levels have been completed.
    LevelsCompletedAtLeast(u32),
    /// At least this many distinct levels have been completed perfectly.
    PerfectLevelsAtLeast(u32),
}

/// Every recognized field of a level definition together with its default.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelConfig {
    /// Unique positive identifier.
    pub id: LevelId,
    /// Display name.
    pub name: String,
    /// Longer description shown to players.
    pub description: String,
    /// Gameplay flavour.
    pub kind: LevelKind,
    /// Difficulty tier.
    pub difficulty: Difficulty,
    /// Reference to the map asset used by the game layer.
    pub map: String,
    /// Enemy groups spawned during the level.
    pub enemies: Vec<EnemySpawnSpec>,
    /// Objectives tracked during the level.
    pub objectives: Vec<ObjectiveSpec>,
    /// Rewards granted on completion.
    pub rewards: Vec<RewardSpec>,
    /// Conditions that must all hold before the level unlocks.
    pub unlock_conditions: Vec<UnlockCondition>,
    /// Time limit of the level; zero means unlimited.
    pub time_limit: Duration,
    /// Elapsed time at or under which the time bonus is awarded.
    pub time_bonus_threshold: Duration,
    /// Whether a perfect completion also requires the time bonus.
    pub perfect_requires_time_bonus: bool,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            id: FIRST_LEVEL,
            name: String::new(),
            description: String::new(),
            kind: LevelKind::Normal,
            difficulty: Difficulty::Normal,
            map: String::new(),
            enemies: Vec::new(),
            objectives: Vec::new(),
            rewards: Vec::new(),
            unlock_conditions: Vec::new(),
            time_limit: Duration::ZERO,
            time_bonus_threshold: Duration::ZERO,
            perfect_requires_time_bonus: true,
        }
    }
}

/// Immutable description of a playable level.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LevelDefinition {
    id: LevelId,
    name: String,
    description: String,
    kind: LevelKind,
    difficulty: Difficulty,
    map: String,
    enemies: Vec<EnemySpawnSpec>,
    objectives: Vec<ObjectiveSpec>,
    rewards: Vec<RewardSpec>,
    unlock_conditions: Vec<UnlockCondition>,
    #[serde(with = "millis")]
    time_limit: Duration,
    #[serde(with = "millis")]
    time_bonus_threshold: Duration,
    perfect_requires_time_bonus: bool,
}

impl LevelDefinition {
    /// Validates the configuration and freezes it into a definition.
    pub fn new(config: LevelConfig) -> Result<Self, EngineError> {
        let id = config.id;
        let invalid = |reason: String| EngineError::InvalidDefinition { level: id, reason };

        if id.get() == 0 {
            return Err(invalid("level id must be positive".to_owned()));
        }
        if config.name.trim().is_empty() {
            return Err(invalid("name must not be empty".to_owned()));
        }
        for (index, objective) in config.objectives.iter().enumerate() {
            if objective.id.index() != index {
                return Err(invalid(format!(
                    "objective at position {index} carries id {}",
                    objective.id
                )));
            }
        }
        if let Some(spec) = config.enemies.iter().find(|spec| spec.enemy.trim().is_empty()) {
            return Err(invalid(format!(
                "enemy spawn entry with count {} has no enemy tag",
                spec.count
            )));
        }
        if !config.time_limit.is_zero() && config.time_bonus_threshold > config.time_limit {
            return Err(invalid(format!(
                "time bonus threshold {}ms exceeds time limit {}ms",
                config.time_bonus_threshold.as_millis(),
                config.time_limit.as_millis()
            )));
        }
        for condition in &config.unlock_conditions {
            if let UnlockCondition::LevelCompleted(required) = condition {
                if *required == id {
                    return Err(invalid("level cannot require its own completion".to_owned()));
                }
                if required.get() == 0 {
                    return Err(invalid("unlock condition references level 0".to_owned()));
                }
            }
        }

        Ok(Self {
            id,
            name: config.name,
            description: config.description,
            kind: config.kind,
            difficulty: config.difficulty,
            map: config.map,
            enemies: config.enemies,
            objectives: config.objectives,
            rewards: config.rewards,
            unlock_conditions: config.unlock_conditions,
            time_limit: config.time_limit,
            time_bonus_threshold: config.time_bonus_threshold,
            perfect_requires_time_bonus: config.perfect_requires_time_bonus,
        })
    }

    /// Unique identifier of the level.
    #[must_use]
    pub const fn id(&self) -> LevelId {
        self.id
    }

    /// Display name of the level.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Longer description of the level.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Gameplay flavour of the level.
    #[must_use]
    pub const fn kind(&self) -> LevelKind {
        self.kind
    }

    /// Difficulty tier of the level.
    #[must_use]
    pub const fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Map reference consumed by the game layer.
    #[must_use]
    pub fn map(&self) -> &str {
        &self.map
    }

    /// Enemy groups spawned during the level.
    #[must_use]
    pub fn enemies(&self) -> &[EnemySpawnSpec] {
        &self.enemies
    }

    /// Objectives tracked during the level.
    #[must_use]
    pub fn objectives(&self) -> &[ObjectiveSpec] {
        &self.objectives
    }

    /// Rewards granted on completion.
    #[must_use]
    pub fn rewards(&self) -> &[RewardSpec] {
        &self.rewards
    }

    /// Conditions that must all hold before the level unlocks.
    #[must_use]
    pub fn unlock_conditions(&self) -> &[UnlockCondition] {
        &self.unlock_conditions
    }

    /// Time limit of the level; zero means unlimited.
    #[must_use]
    pub const fn time_limit(&self) -> Duration {
        self.time_limit
    }

    /// Elapsed time at or under which the time bonus is awarded.
    #[must_use]
    pub const fn time_bonus_threshold(&self) -> Duration {
        self.time_bonus_threshold
    }

    /// Whether a perfect completion also requires the time bonus.
    #[must_use]
    pub const fn perfect_requires_time_bonus(&self) -> bool {
        self.perfect_requires_time_bonus
    }

    /// Total number of enemies spawned across every spawn entry.
    #[must_use]
    pub fn total_enemies(&self) -> u64 {
        self.enemies.iter().map(|spec| u64::from(spec.count)).sum()
    }
}

/// Persisted record of a player's results on one level.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LevelStats {
    /// Whether the level may be started. Only ever flips from false to true.
    pub is_unlocked: bool,
    /// Whether the level has been completed at least once.
    pub is_completed: bool,
    /// Whether the level has been completed perfectly at least once.
    pub is_perfect: bool,
    /// Best star rating earned, between 0 and [`MAX_STARS`].
    pub stars: u8,
    /// Highest score reported for a completion.
    pub best_score: u64,
    /// Fastest completion time; `None` until the first completion.
    pub best_time: Option<Duration>,
    /// Number of completions.
    pub completion_count: u32,
    /// Number of perfect completions.
    pub perfect_count: u32,
    /// Moment of the most recent completion.
    pub last_played_at: Option<DateTime<Utc>>,
    /// Indices of the level's rewards that were already granted.
    pub claimed_rewards: BTreeSet<usize>,
}

impl LevelStats {
    /// Creates a fresh record with the provided unlock state.
    #[must_use]
    pub fn new(is_unlocked: bool) -> Self {
        Self {
            is_unlocked,
            ..Self::default()
        }
    }

    /// Unlocks the level, reporting whether the state changed.
    pub fn unlock(&mut self) -> bool {
        let was_unlocked = self.is_unlocked;
        self.is_unlocked = true;
        !was_unlocked
    }
}

/// Persisted global progress of the player.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameProgress {
    /// Level most recently started.
    pub current_level: LevelId,
    /// Highest level id reached through completions.
    pub max_unlocked_level: LevelId,
    /// Levels completed at least once.
    pub completed_levels: BTreeSet<LevelId>,
    /// Levels completed perfectly at least once.
    pub perfect_levels: BTreeSet<LevelId>,
    /// Sum of every completion score.
    pub total_score: u64,
    /// Sum of every completion's elapsed time.
    pub total_play_time: Duration,
    /// Tags of the achievements earned so far.
    pub achievements: Vec<String>,
}

impl Default for GameProgress {
    fn default() -> Self {
        Self {
            current_level: FIRST_LEVEL,
            max_unlocked_level: FIRST_LEVEL,
            completed_levels: BTreeSet::new(),
            perfect_levels: BTreeSet::new(),
            total_score: 0,
            total_play_time: Duration::ZERO,
            achievements: Vec::new(),
        }
    }
}

impl GameProgress {
    /// Number of distinct completed levels.
    #[must_use]
    pub fn completed_count(&self) -> u32 {
        u32::try_from(self.completed_levels.len()).unwrap_or(u32::MAX)
    }

    /// Number of distinct perfectly completed levels.
    #[must_use]
    pub fn perfect_count(&self) -> u32 {
        u32::try_from(self.perfect_levels.len()).unwrap_or(u32::MAX)
    }

    /// Reports whether the achievement was already earned.
    #[must_use]
    pub fn has_achievement(&self, achievement: Achievement) -> bool {
        self.achievements
            .iter()
            .any(|earned| earned == achievement.tag())
    }
}

/// Milestones recorded in [`GameProgress::achievements`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Achievement {
    /// First level completion.
    FirstClear,
    /// First perfect completion.
    FirstPerfect,
    /// First level rated with the maximum number of stars.
    ThreeStars,
    /// Accumulated score of at least [`Achievement::SCORE_MILESTONE`].
    ScoreMilestone,
    /// Every registered level completed.
    CampaignComplete,
}

impl Achievement {
    /// Total score required for [`Achievement::ScoreMilestone`].
    pub const SCORE_MILESTONE: u64 = 10_000;

    /// Every achievement in evaluation order.
    pub const ALL: [Achievement; 5] = [
        Self::FirstClear,
        Self::FirstPerfect,
        Self::ThreeStars,
        Self::ScoreMilestone,
        Self::CampaignComplete,
    ];

    /// Stable tag persisted for the achievement.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::FirstClear => "first-clear",
            Self::FirstPerfect => "first-perfect",
            Self::ThreeStars => "three-star",
            Self::ScoreMilestone => "score-10000",
            Self::CampaignComplete => "campaign-complete",
        }
    }
}

/// Global progress and per-level stats restored from a store.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PersistedProgress {
    /// Restored global progress.
    pub progress: GameProgress,
    /// Restored per-level stats keyed by level id.
    pub stats: BTreeMap<LevelId, LevelStats>,
}

/// Durable key/value persistence for progress.
///
/// Implementations must never fail to load: missing or malformed data
/// yields default structures.
pub trait ProgressStore {
    /// Restores the persisted progress, falling back to defaults.
    fn load(&mut self) -> PersistedProgress;

    /// Persists the provided progress and per-level stats.
    fn save(
        &mut self,
        progress: &GameProgress,
        stats: &BTreeMap<LevelId, LevelStats>,
    ) -> Result<(), StoreError>;
}

impl<S: ProgressStore + ?Sized> ProgressStore for Box<S> {
    fn load(&mut self) -> PersistedProgress {
        (**self).load()
    }

    fn save(
        &mut self,
        progress: &GameProgress,
        stats: &BTreeMap<LevelId, LevelStats>,
    ) -> Result<(), StoreError> {
        (**self).save(progress, stats)
    }
}

/// Presentation summary of a level and the player's results on it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelSummary {
    /// Identifier of the level.
    pub id: LevelId,
    /// Display name of the level.
    pub name: String,
    /// Gameplay flavour of the level.
    pub kind: LevelKind,
    /// Difficulty tier of the level.
    pub difficulty: Difficulty,
    /// Whether the level may be started.
    pub unlocked: bool,
    /// Whether the level was completed at least once.
    pub completed: bool,
    /// Whether the level was completed perfectly at least once.
    pub perfect: bool,
    /// Best star rating.
    pub stars: u8,
    /// Best score.
    pub best_score: u64,
    /// Fastest completion time.
    pub best_time: Option<Duration>,
    /// Number of completions.
    pub completion_count: u32,
}

/// Aggregate view over the player's whole progress.
#[derive(Clone, Debug, PartialEq)]
pub struct ProgressSummary {
    /// Number of registered levels.
    pub total_levels: u32,
    /// Number of unlocked levels.
    pub unlocked_levels: u32,
    /// Number of distinct completed levels.
    pub completed_levels: u32,
    /// Number of distinct perfectly completed levels.
    pub perfect_levels: u32,
    /// Stars earned across every level.
    pub stars_earned: u32,
    /// Stars available across every level.
    pub stars_available: u32,
    /// Share of registered levels completed, between 0 and 100.
    pub completion_percent: f64,
    /// Sum of every completion score.
    pub total_score: u64,
    /// Sum of every completion's elapsed time.
    pub total_play_time: Duration,
    /// Level most recently started.
    pub current_level: LevelId,
    /// Highest level id reached through completions.
    pub max_unlocked_level: LevelId,
    /// Tags of the achievements earned so far.
    pub achievements: Vec<String>,
}

/// Outcome of folding a finished session into persisted progress.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionResult {
    /// Level that was completed.
    pub level: LevelId,
    /// Star rating of the level after this completion.
    pub stars: u8,
    /// Whether this run was perfect.
    pub is_perfect: bool,
    /// Whether this run met the time bonus threshold.
    pub time_bonus: bool,
    /// Whether this run set a new best score.
    pub new_best_score: bool,
    /// Whether this run set a new best time.
    pub new_best_time: bool,
    /// Levels unlocked as a consequence of this completion.
    pub newly_unlocked: Vec<LevelId>,
    /// Rewards granted by this completion.
    pub rewards: Vec<RewardSpec>,
    /// Achievements earned by this completion.
    pub achievements: Vec<Achievement>,
}

/// Events recorded by the engine for callers to react to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A session was started for a level.
    SessionStarted {
        /// Level being played.
        level: LevelId,
        /// Identifier issued to the session.
        session: SessionId,
    },
    /// A session was discarded without being completed.
    SessionAbandoned {
        /// Level that was being played.
        level: LevelId,
        /// Identifier of the discarded session.
        session: SessionId,
    },
    /// A session was folded into persisted progress.
    LevelCompleted {
        /// Level that was completed.
        level: LevelId,
        /// Score reported for the run.
        score: u64,
        /// Star rating after the completion.
        stars: u8,
        /// Whether the run was perfect.
        perfect: bool,
    },
    /// A level transitioned from locked to unlocked.
    LevelUnlocked {
        /// Level that became available.
        level: LevelId,
    },
    /// An achievement was earned.
    AchievementEarned {
        /// Achievement that was earned.
        achievement: Achievement,
    },
    /// All progress was cleared.
    ProgressReset,
    /// Writing progress to the store failed; the in-memory state stands.
    SaveFailed {
        /// Rendered store error.
        reason: String,
    },
}

/// Entity a lookup failed to find.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Missing {
    /// No level with this id is registered.
    Level(LevelId),
    /// The level has no objective with this id.
    Objective {
        /// Level the lookup targeted.
        level: LevelId,
        /// Objective that does not exist.
        objective: ObjectiveId,
    },
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Level(level) => write!(f, "level {level}"),
            Self::Objective { level, objective } => {
                write!(f, "objective {objective} of level {level}")
            }
        }
    }
}

/// Errors surfaced by the progression engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// An unknown level or objective was referenced.
    #[error("{0} not found")]
    NotFound(Missing),
    /// A locked level was started.
    #[error("level {0} is locked")]
    LockedLevel(LevelId),
    /// A level id was registered twice.
    #[error("level {0} is already registered")]
    DuplicateId(LevelId),
    /// The generator was asked for an unregistered template.
    #[error("template `{0}` is not registered")]
    TemplateNotFound(String),
    /// A session was completed that this engine did not issue or no longer tracks.
    #[error("session was not started by this engine or is no longer active")]
    InvalidSession,
    /// A level configuration failed validation.
    #[error("level {level} is invalid: {reason}")]
    InvalidDefinition {
        /// Level the configuration described.
        level: LevelId,
        /// Validation failure.
        reason: String,
    },
    /// A template configuration failed validation.
    #[error("template `{name}` is invalid: {reason}")]
    InvalidTemplate {
        /// Name of the template.
        name: String,
        /// Validation failure.
        reason: String,
    },
    /// Progress could not be written; the in-memory state stands.
    #[error("failed to persist progress")]
    Persistence(#[from] StoreError),
}

/// Failures reported by [`ProgressStore::save`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// Progress could not be serialized.
    #[error("failed to serialize progress")]
    Serialize(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// The serialized progress could not be written.
    #[error("failed to write progress to {}", path.display())]
    Write {
        /// Destination of the write.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The backing storage is not reachable.
    #[error("progress store unavailable: {0}")]
    Unavailable(String),
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(crate) fn serialize<S: Serializer>(
        value: &Duration,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    fn base_config() -> LevelConfig {
        LevelConfig {
            id: LevelId::new(3),
            name: "Outpost".to_owned(),
            time_limit: Duration::from_secs(180),
            time_bonus_threshold: Duration::from_secs(120),
            objectives: vec![ObjectiveSpec::required(
                ObjectiveId::new(0),
                ObjectiveKind::DestroyAllEnemies,
                4,
                "Destroy all enemies",
            )],
            ..LevelConfig::default()
        }
    }

    #[test]
    fn unlock_condition_round_trips_through_bincode() {
        assert_round_trip(&UnlockCondition::LevelCompleted(LevelId::new(7)));
        assert_round_trip(&UnlockCondition::TotalScoreAtLeast(2_500));
    }

    #[test]
    fn spawn_spec_round_trips_with_millisecond_delay() {
        let spec = EnemySpawnSpec::new("grunt", 12, Duration::from_millis(1_500), "wave");
        assert_round_trip(&spec);
    }

    #[test]
    fn difficulty_multipliers_match_table() {
        let table: Vec<f64> = Difficulty::ALL.iter().map(|d| d.multiplier()).collect();
        assert_eq!(table, vec![0.7, 1.0, 1.5, 2.0, 3.0]);
    }

    #[test]
    fn scale_count_floors_after_multiplying() {
        assert_eq!(Difficulty::Easy.scale_count(3), 2);
        assert_eq!(Difficulty::Easy.scale_count(20), 14);
        assert_eq!(Difficulty::Hard.scale_count(5), 7);
        assert_eq!(Difficulty::Nightmare.scale_count(20), 60);
        assert_eq!(Difficulty::Easy.scale_count(1), 0);
    }

    #[test]
    fn unrecognized_difficulty_names_default_to_unit_multiplier() {
        assert_eq!(Difficulty::from_name(" NightMare "), Some(Difficulty::Nightmare));
        assert!((Difficulty::multiplier_for_name("ludicrous") - 1.0).abs() < f64::EPSILON);
        assert!((Difficulty::multiplier_for_name("expert") - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn definition_accepts_valid_config() {
        let definition = LevelDefinition::new(base_config()).expect("valid definition");
        assert_eq!(definition.id(), LevelId::new(3));
        assert_eq!(definition.objectives().len(), 1);
        assert!(definition.perfect_requires_time_bonus());
    }

    #[test]
    fn definition_rejects_zero_id() {
        let config = LevelConfig {
            id: LevelId::new(0),
            ..base_config()
        };
        assert!(matches!(
            LevelDefinition::new(config),
            Err(EngineError::InvalidDefinition { .. })
        ));
    }

    #[test]
    fn definition_rejects_misnumbered_objectives() {
        let mut config = base_config();
        config.objectives[0].id = ObjectiveId::new(4);
        assert!(matches!(
            LevelDefinition::new(config),
            Err(EngineError::InvalidDefinition { .. })
        ));
    }

    #[test]
    fn definition_rejects_threshold_beyond_limit() {
        let config = LevelConfig {
            time_bonus_threshold: Duration::from_secs(200),
            ..base_config()
        };
        assert!(matches!(
            LevelDefinition::new(config),
            Err(EngineError::InvalidDefinition { .. })
        ));
    }

    #[test]
    fn definition_ignores_threshold_without_limit() {
        let config = LevelConfig {
            time_limit: Duration::ZERO,
            time_bonus_threshold: Duration::from_secs(200),
            ..base_config()
        };
        assert!(LevelDefinition::new(config).is_ok());
    }

    #[test]
    fn definition_rejects_self_referencing_unlock() {
        let config = LevelConfig {
            unlock_conditions: vec![UnlockCondition::LevelCompleted(LevelId::new(3))],
            ..base_config()
        };
        assert!(matches!(
            LevelDefinition::new(config),
            Err(EngineError::InvalidDefinition { .. })
        ));
    }

    #[test]
    fn unlock_is_one_way() {
        let mut stats = LevelStats::default();
        assert!(stats.unlock());
        assert!(!stats.unlock());
        assert!(stats.is_unlocked);
    }

    #[test]
    fn default_progress_starts_on_first_level() {
        let progress = GameProgress::default();
        assert_eq!(progress.current_level, FIRST_LEVEL);
        assert_eq!(progress.max_unlocked_level, FIRST_LEVEL);
        assert_eq!(progress.total_score, 0);
    }

    #[test]
    fn missing_renders_level_and_objective() {
        let level = EngineError::NotFound(Missing::Level(LevelId::new(9)));
        assert_eq!(level.to_string(), "level 9 not found");
        let objective = EngineError::NotFound(Missing::Objective {
            level: LevelId::new(2),
            objective: ObjectiveId::new(5),
        });
        assert_eq!(objective.to_string(), "objective 5 of level 2 not found");
    }
}
