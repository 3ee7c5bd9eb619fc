use progression_core::{EngineError, LevelKind, ObjectiveKind};
use serde::Deserialize;

/// Inclusive range of enemy counts drawn per enemy type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct CountRange {
    /// Smallest count that can be drawn.
    pub min: u32,
    /// Largest count that can be drawn.
    pub max: u32,
}

impl CountRange {
    /// Creates a new inclusive range.
    #[must_use]
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }
}

/// Inclusive range of durations, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct TimeRange {
    /// Shortest duration that can be drawn.
    pub min_ms: u64,
    /// Longest duration that can be drawn.
    pub max_ms: u64,
}

impl TimeRange {
    /// Creates a new inclusive range.
    #[must_use]
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }
}

/// Every recognized field of a generator template together with its default.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Name the template is registered under.
    pub name: String,
    /// Gameplay flavour of generated levels.
    pub kind: LevelKind,
    /// Map reference assigned to generated levels.
    pub map: String,
    /// Enemy type tags, each considered once per generated level.
    pub enemy_pool: Vec<String>,
    /// Count range drawn for every enemy type before difficulty scaling.
    pub enemy_count: CountRange,
    /// Objective kinds instantiated for generated levels.
    pub objectives: Vec<ObjectiveKind>,
    /// Range the time limit and survival targets are drawn from.
    pub time_limit: TimeRange,
    /// Spawn pattern tag assigned to every enemy group.
    pub spawn_pattern: String,
    /// Spawn delay added for each successive enemy group, in milliseconds.
    pub spawn_delay_step_ms: u64,
    /// Whether generated levels require the previous level to be completed.
    pub requires_previous: bool,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            kind: LevelKind::Normal,
            map: "procedural".to_owned(),
            enemy_pool: Vec::new(),
            enemy_count: CountRange::new(1, 1),
            objectives: vec![ObjectiveKind::DestroyAllEnemies],
            time_limit: TimeRange::new(60_000, 120_000),
            spawn_pattern: "random".to_owned(),
            spawn_delay_step_ms: 2_000,
            requires_previous: true,
        }
    }
}

/// Validated blueprint the level generator instantiates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    config: TemplateConfig,
}

impl Template {
    /// Validates the configuration and freezes it into a template.
    pub fn new(config: TemplateConfig) -> Result<Self, EngineError> {
        let invalid = |reason: &str| EngineError::InvalidTemplate {
            name: config.name.clone(),
            reason: reason.to_owned(),
        };

        if config.name.trim().is_empty() {
            return Err(invalid("name must not be empty"));
        }
        if config.enemy_pool.is_empty() {
            return Err(invalid("enemy pool must not be empty"));
        }
        if config.enemy_pool.iter().any(|enemy| enemy.trim().is_empty()) {
            return Err(invalid("enemy pool contains an empty tag"));
        }
        if config.enemy_count.min > config.enemy_count.max {
            return Err(invalid("enemy count range is inverted"));
        }
        if config.time_limit.min_ms > config.time_limit.max_ms {
            return Err(invalid("time limit range is inverted"));
        }

        Ok(Self { config })
    }

    /// Name the template is registered under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Gameplay flavour of generated levels.
    #[must_use]
    pub fn kind(&self) -> LevelKind {
        self.config.kind
    }

    /// Map reference assigned to generated levels.
    #[must_use]
    pub fn map(&self) -> &str {
        &self.config.map
    }

    /// Enemy type tags considered for generated levels.
    #[must_use]
    pub fn enemy_pool(&self) -> &[String] {
        &self.config.enemy_pool
    }

    /// Count range drawn for every enemy type.
    #[must_use]
    pub fn enemy_count(&self) -> CountRange {
        self.config.enemy_count
    }

    /// Objective kinds instantiated for generated levels.
    #[must_use]
    pub fn objectives(&self) -> &[ObjectiveKind] {
        &self.config.objectives
    }

    /// Range the time limit and survival targets are drawn from.
    #[must_use]
    pub fn time_limit(&self) -> TimeRange {
        self.config.time_limit
    }

    /// Spawn pattern tag assigned to every enemy group.
    #[must_use]
    pub fn spawn_pattern(&self) -> &str {
        &self.config.spawn_pattern
    }

    /// Spawn delay added for each successive enemy group, in milliseconds.
    #[must_use]
    pub fn spawn_delay_step_ms(&self) -> u64 {
        self.config.spawn_delay_step_ms
    }

    /// Whether generated levels require the previous level to be completed.
    #[must_use]
    pub fn requires_previous(&self) -> bool {
        self.config.requires_previous
    }
}
