#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic template-driven level generation.
//!
//! Every random draw goes through an injected [`rand::Rng`]. The convenience
//! entry point [`LevelGenerator::generate`] derives a dedicated ChaCha stream
//! from the generator seed, the level id, the template, and the difficulty,
//! so a level is reproducible regardless of what was generated before it.

mod template;

use std::{collections::BTreeMap, time::Duration};

use progression_core::{
    Difficulty, EnemySpawnSpec, EngineError, LevelConfig, LevelDefinition, LevelId, ObjectiveId,
    ObjectiveKind, ObjectiveSpec, UnlockCondition,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

pub use template::{CountRange, Template, TemplateConfig, TimeRange};

const TIME_BONUS_NUMERATOR: u32 = 7;
const TIME_BONUS_DENOMINATOR: u32 = 10;

/// Factory producing level definitions from registered templates.
#[derive(Clone, Debug)]
pub struct LevelGenerator {
    seed: u64,
    templates: BTreeMap<String, Template>,
}

impl LevelGenerator {
    /// Creates a generator without templates.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            templates: BTreeMap::new(),
        }
    }

    /// Creates a generator preloaded with the provided templates.
    #[must_use]
    pub fn with_templates(seed: u64, templates: impl IntoIterator<Item = Template>) -> Self {
        let mut generator = Self::new(seed);
        for template in templates {
            let _ = generator.register_template(template);
        }
        generator
    }

    /// Registers a template, returning the one it replaced.
    pub fn register_template(&mut self, template: Template) -> Option<Template> {
        self.templates.insert(template.name().to_owned(), template)
    }

    /// Looks up a registered template by name.
    #[must_use]
    pub fn template(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    /// Names of every registered template in ascending order.
    pub fn template_names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    /// Generates a level using a stream derived from the generator seed.
    pub fn generate(
        &self,
        id: LevelId,
        template: &str,
        difficulty: Difficulty,
    ) -> Result<LevelDefinition, EngineError> {
        let mut rng = ChaCha8Rng::seed_from_u64(derive_level_seed(
            self.seed, id, template, difficulty,
        ));
        self.generate_with_rng(&mut rng, id, template, difficulty)
    }

    /// Generates a level drawing every random value from `rng`.
    pub fn generate_with_rng<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        id: LevelId,
        template: &str,
        difficulty: Difficulty,
    ) -> Result<LevelDefinition, EngineError> {
        let template = self
            .templates
            .get(template)
            .ok_or_else(|| EngineError::TemplateNotFound(template.to_owned()))?;

        let enemies = generate_enemies(rng, template, difficulty);
        let total_enemies: u64 = enemies.iter().map(|spec| u64::from(spec.count)).sum();
        let objectives = generate_objectives(rng, template, total_enemies);
        let time_limit = draw_duration(rng, template.time_limit());
        let time_bonus_threshold = time_limit * TIME_BONUS_NUMERATOR / TIME_BONUS_DENOMINATOR;

        let unlock_conditions = match id.previous() {
            Some(previous) if template.requires_previous() => {
                vec![UnlockCondition::LevelCompleted(previous)]
            }
            _ => Vec::new(),
        };

        debug!(
            level = id.get(),
            template = template.name(),
            %difficulty,
            enemies = total_enemies,
            time_limit_ms = u64::try_from(time_limit.as_millis()).unwrap_or(u64::MAX),
            "generated level"
        );

        LevelDefinition::new(LevelConfig {
            id,
            name: format!("{} {id}", title_case(template.name())),
            description: format!("Generated {difficulty} {} level", template.name()),
            kind: template.kind(),
            difficulty,
            map: template.map().to_owned(),
            enemies,
            objectives,
            rewards: Vec::new(),
            unlock_conditions,
            time_limit,
            time_bonus_threshold,
            perfect_requires_time_bonus: true,
        })
    }
}

fn generate_enemies<R: Rng + ?Sized>(
    rng: &mut R,
    template: &Template,
    difficulty: Difficulty,
) -> Vec<EnemySpawnSpec> {
    let range = template.enemy_count();
    let step = Duration::from_millis(template.spawn_delay_step_ms());
    let mut enemies = Vec::new();
    for enemy in template.enemy_pool() {
        let drawn = rng.gen_range(range.min..=range.max);
        let count = difficulty.scale_count(drawn);
        if count == 0 {
            continue;
        }
        let order = u32::try_from(enemies.len()).unwrap_or(u32::MAX);
        enemies.push(EnemySpawnSpec::new(
            enemy.clone(),
            count,
            step.saturating_mul(order),
            template.spawn_pattern(),
        ));
    }
    enemies
}

fn generate_objectives<R: Rng + ?Sized>(
    rng: &mut R,
    template: &Template,
    total_enemies: u64,
) -> Vec<ObjectiveSpec> {
    let mut objectives: Vec<ObjectiveSpec> = Vec::new();
    for &kind in template.objectives() {
        let (target, description) = match kind {
            ObjectiveKind::DestroyAllEnemies => {
                (total_enemies, format!("Destroy all {total_enemies} enemies"))
            }
            ObjectiveKind::SurviveTime => {
                let survive = draw_duration(rng, template.time_limit());
                let millis = u64::try_from(survive.as_millis()).unwrap_or(u64::MAX);
                (millis, format!("Survive for {} seconds", survive.as_secs()))
            }
            ObjectiveKind::DefeatBoss => (1, "Defeat the boss".to_owned()),
            ObjectiveKind::ProtectBase => (1, "Keep the base standing".to_owned()),
            ObjectiveKind::ReachDestination => (1, "Reach the destination".to_owned()),
            ObjectiveKind::CollectItems | ObjectiveKind::ScoreTarget => {
                warn!(
                    template = template.name(),
                    ?kind,
                    "objective kind has no generation rule, skipping"
                );
                continue;
            }
        };
        let id = ObjectiveId::new(u32::try_from(objectives.len()).unwrap_or(u32::MAX));
        objectives.push(ObjectiveSpec::required(id, kind, target, description));
    }
    objectives
}

fn draw_duration<R: Rng + ?Sized>(rng: &mut R, range: TimeRange) -> Duration {
    Duration::from_millis(rng.gen_range(range.min_ms..=range.max_ms))
}

fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn derive_level_seed(seed: u64, id: LevelId, template: &str, difficulty: Difficulty) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(seed.to_le_bytes());
    hasher.update(id.get().to_le_bytes());
    hasher.update(template.as_bytes());
    hasher.update(difficulty.name().as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}
