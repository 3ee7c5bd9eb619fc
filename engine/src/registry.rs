use std::collections::BTreeMap;

use progression_core::{EngineError, LevelDefinition, LevelId, LevelStats, Missing};

/// Catalog of level definitions keyed by id.
///
/// Definitions are immutable once registered; iteration is always in
/// ascending id order.
#[derive(Clone, Debug, Default)]
pub struct LevelRegistry {
    levels: BTreeMap<LevelId, LevelDefinition>,
}

impl LevelRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from definitions, rejecting duplicate ids.
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = LevelDefinition>,
    ) -> Result<Self, EngineError> {
        let mut registry = Self::new();
        for definition in definitions {
            registry.register(definition)?;
        }
        Ok(registry)
    }

    /// Adds a definition to the catalog.
    pub fn register(&mut self, definition: LevelDefinition) -> Result<(), EngineError> {
        let id = definition.id();
        if self.levels.contains_key(&id) {
            return Err(EngineError::DuplicateId(id));
        }
        let _ = self.levels.insert(id, definition);
        Ok(())
    }

    /// Looks up a definition by id.
    pub fn get(&self, id: LevelId) -> Result<&LevelDefinition, EngineError> {
        self.levels
            .get(&id)
            .ok_or(EngineError::NotFound(Missing::Level(id)))
    }

    /// Reports whether a level with this id is registered.
    #[must_use]
    pub fn contains(&self, id: LevelId) -> bool {
        self.levels.contains_key(&id)
    }

    /// Number of registered levels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Reports whether the registry holds no levels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Iterates every definition in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &LevelDefinition> {
        self.levels.values()
    }

    /// Definitions in ascending id order, restricted to unlocked levels
    /// unless `include_locked` is set.
    #[must_use]
    pub fn list(
        &self,
        include_locked: bool,
        stats: &BTreeMap<LevelId, LevelStats>,
    ) -> Vec<&LevelDefinition> {
        self.iter()
            .filter(|definition| {
                include_locked
                    || stats
                        .get(&definition.id())
                        .is_some_and(|record| record.is_unlocked)
            })
            .collect()
    }
}
