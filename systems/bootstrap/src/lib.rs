#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure bootstrap system that prepares the default progression content.

use std::time::Duration;

use progression_core::{
    Difficulty, EnemySpawnSpec, EngineError, LevelConfig, LevelDefinition, LevelId, LevelKind,
    ObjectiveId, ObjectiveKind, ObjectiveSpec, RewardCondition, RewardKind, RewardSpec,
    UnlockCondition, FIRST_LEVEL,
};
use progression_system_level_generation::{
    CountRange, LevelGenerator, Template, TemplateConfig, TimeRange,
};

/// Total score that gates the fourth campaign level.
pub const FORTRESS_SCORE_GATE: u64 = 1_500;

/// Number of perfect levels that gates the campaign boss.
pub const BOSS_PERFECT_GATE: u32 = 2;

/// Produces the content shipped with the engine.
#[derive(Debug, Default)]
pub struct Bootstrap;

impl Bootstrap {
    /// Builds the default five-level campaign in ascending id order.
    pub fn campaign(&self) -> Result<Vec<LevelDefinition>, EngineError> {
        campaign_configs()
            .into_iter()
            .map(LevelDefinition::new)
            .collect()
    }

    /// Builds the default generator templates.
    pub fn templates(&self) -> Result<Vec<Template>, EngineError> {
        template_configs().into_iter().map(Template::new).collect()
    }

    /// Creates a generator seeded with `seed` and preloaded with the default templates.
    pub fn generator(&self, seed: u64) -> Result<LevelGenerator, EngineError> {
        Ok(LevelGenerator::with_templates(seed, self.templates()?))
    }
}

fn seconds(value: u64) -> Duration {
    Duration::from_secs(value)
}

fn wave(enemy: &str, count: u32, delay_secs: u64, pattern: &str) -> EnemySpawnSpec {
    EnemySpawnSpec::new(enemy, count, seconds(delay_secs), pattern)
}

fn destroy_all(count: u64) -> ObjectiveSpec {
    ObjectiveSpec::required(
        ObjectiveId::new(0),
        ObjectiveKind::DestroyAllEnemies,
        count,
        format!("Destroy all {count} enemies"),
    )
}

fn after(level: u32) -> UnlockCondition {
    UnlockCondition::LevelCompleted(LevelId::new(level))
}

fn campaign_configs() -> Vec<LevelConfig> {
    vec![
        LevelConfig {
            id: FIRST_LEVEL,
            name: "First Contact".to_owned(),
            description: "Hold the gate against a scouting party.".to_owned(),
            difficulty: Difficulty::Easy,
            map: "maps/outpost".to_owned(),
            enemies: vec![wave("grunt", 4, 0, "line")],
            objectives: vec![destroy_all(4)],
            rewards: vec![RewardSpec::new(RewardKind::Score, 100, RewardCondition::Completion)],
            time_limit: seconds(180),
            time_bonus_threshold: seconds(120),
            ..LevelConfig::default()
        },
        LevelConfig {
            id: LevelId::new(2),
            name: "Crossroads".to_owned(),
            description: "Two columns converge on the crossing.".to_owned(),
            map: "maps/crossroads".to_owned(),
            enemies: vec![wave("grunt", 6, 0, "line"), wave("runner", 4, 10, "flank")],
            objectives: vec![
                destroy_all(10),
                ObjectiveSpec::optional(
                    ObjectiveId::new(1),
                    ObjectiveKind::CollectItems,
                    3,
                    "Recover 3 supply crates",
                ),
            ],
            rewards: vec![
                RewardSpec::new(RewardKind::Lives, 1, RewardCondition::Completion),
                RewardSpec::new(RewardKind::Powerup, 1, RewardCondition::TimeBonus),
            ],
            unlock_conditions: vec![after(1)],
            time_limit: seconds(240),
            time_bonus_threshold: seconds(160),
            ..LevelConfig::default()
        },
        LevelConfig {
            id: LevelId::new(3),
            name: "Long Night".to_owned(),
            description: "Keep the base standing until dawn.".to_owned(),
            kind: LevelKind::Survival,
            difficulty: Difficulty::Hard,
            map: "maps/ridge".to_owned(),
            enemies: vec![wave("mite", 30, 0, "swarm"), wave("hornet", 12, 45, "swarm")],
            objectives: vec![
                ObjectiveSpec::required(
                    ObjectiveId::new(0),
                    ObjectiveKind::SurviveTime,
                    150_000,
                    "Survive for 150 seconds",
                ),
                ObjectiveSpec::required(
                    ObjectiveId::new(1),
                    ObjectiveKind::ProtectBase,
                    1,
                    "Keep the base standing",
                ),
            ],
            rewards: vec![RewardSpec::new(
                RewardKind::WeaponUpgrade,
                1,
                RewardCondition::Perfect,
            )],
            unlock_conditions: vec![after(2)],
            time_limit: seconds(300),
            time_bonus_threshold: seconds(210),
            ..LevelConfig::default()
        },
        LevelConfig {
            id: LevelId::new(4),
            name: "Fortress".to_owned(),
            description: "Break the siege around the northern keep.".to_owned(),
            kind: LevelKind::Defense,
            difficulty: Difficulty::Hard,
            map: "maps/keep".to_owned(),
            enemies: vec![
                wave("grunt", 12, 0, "line"),
                wave("brute", 4, 20, "column"),
                wave("runner", 8, 40, "flank"),
            ],
            objectives: vec![destroy_all(24)],
            rewards: vec![RewardSpec::new(
                RewardKind::UnlockMode,
                1,
                RewardCondition::Completion,
            )],
            unlock_conditions: vec![
                after(3),
                UnlockCondition::TotalScoreAtLeast(FORTRESS_SCORE_GATE),
            ],
            time_limit: seconds(360),
            time_bonus_threshold: seconds(252),
            ..LevelConfig::default()
        },
        LevelConfig {
            id: LevelId::new(5),
            name: "The Warden".to_owned(),
            description: "Face the warden in its lair.".to_owned(),
            kind: LevelKind::Boss,
            difficulty: Difficulty::Expert,
            map: "maps/lair".to_owned(),
            enemies: vec![wave("warden", 1, 0, "center"), wave("grunt", 16, 15, "ring")],
            objectives: vec![ObjectiveSpec::required(
                ObjectiveId::new(0),
                ObjectiveKind::DefeatBoss,
                1,
                "Defeat the warden",
            )],
            rewards: vec![RewardSpec::new(RewardKind::Score, 5_000, RewardCondition::Perfect)],
            unlock_conditions: vec![
                after(4),
                UnlockCondition::PerfectLevelsAtLeast(BOSS_PERFECT_GATE),
            ],
            time_limit: seconds(480),
            time_bonus_threshold: seconds(336),
            ..LevelConfig::default()
        },
    ]
}

fn template_configs() -> Vec<TemplateConfig> {
    vec![
        TemplateConfig {
            name: "assault".to_owned(),
            map: "maps/procedural/field".to_owned(),
            enemy_pool: vec!["grunt".to_owned(), "runner".to_owned(), "brute".to_owned()],
            enemy_count: CountRange::new(3, 10),
            objectives: vec![ObjectiveKind::DestroyAllEnemies],
            time_limit: TimeRange::new(120_000, 240_000),
            spawn_pattern: "line".to_owned(),
            ..TemplateConfig::default()
        },
        TemplateConfig {
            name: "survival".to_owned(),
            kind: LevelKind::Survival,
            map: "maps/procedural/ridge".to_owned(),
            enemy_pool: vec!["mite".to_owned(), "hornet".to_owned()],
            enemy_count: CountRange::new(20, 50),
            objectives: vec![ObjectiveKind::SurviveTime],
            time_limit: TimeRange::new(90_000, 240_000),
            spawn_pattern: "swarm".to_owned(),
            spawn_delay_step_ms: 15_000,
            ..TemplateConfig::default()
        },
        TemplateConfig {
            name: "boss".to_owned(),
            kind: LevelKind::Boss,
            map: "maps/procedural/lair".to_owned(),
            enemy_pool: vec!["warden".to_owned(), "grunt".to_owned()],
            enemy_count: CountRange::new(1, 8),
            objectives: vec![ObjectiveKind::DefeatBoss, ObjectiveKind::DestroyAllEnemies],
            time_limit: TimeRange::new(240_000, 480_000),
            spawn_pattern: "ring".to_owned(),
            ..TemplateConfig::default()
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destroy_targets_match_enemy_totals() {
        let levels = Bootstrap.campaign().expect("campaign is valid");
        for level in &levels {
            for objective in level.objectives() {
                if objective.kind == ObjectiveKind::DestroyAllEnemies {
                    assert_eq!(objective.target, level.total_enemies(), "{}", level.name());
                }
            }
        }
    }

    #[test]
    fn every_level_offers_a_time_bonus() {
        for level in Bootstrap.campaign().expect("campaign is valid") {
            assert!(level.time_limit() > level.time_bonus_threshold());
            assert!(!level.time_bonus_threshold().is_zero());
        }
    }
}
