use std::collections::BTreeMap;

use progression_core::{
    GameProgress, LevelId, LevelStats, PersistedProgress, ProgressStore, StoreError,
};

use crate::{decode, encode};

/// In-process store holding the serialized document as a string.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    raw: Option<String>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with raw persisted text.
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Some(raw.into()),
        }
    }

    /// Last document written to or seeded into the store.
    #[must_use]
    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }
}

impl ProgressStore for MemoryStore {
    fn load(&mut self) -> PersistedProgress {
        self.raw.as_deref().map(decode).unwrap_or_default()
    }

    fn save(
        &mut self,
        progress: &GameProgress,
        stats: &BTreeMap<LevelId, LevelStats>,
    ) -> Result<(), StoreError> {
        self.raw = Some(encode(progress, stats)?);
        Ok(())
    }
}
