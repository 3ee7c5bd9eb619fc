#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative progression state.
//!
//! [`EngineContext`] owns the level registry, the restored progress, and the
//! store it writes through to. Callers create one context and thread it
//! through every operation; sessions are plain values handed back to the
//! caller and validated against the context when they return.

pub mod query;
mod registry;

use std::{collections::BTreeMap, mem, time::Duration};

use chrono::{DateTime, Utc};
use progression_core::{
    CompletionResult, EngineError, Event, GameProgress, LevelDefinition, LevelId, LevelStats,
    LevelSummary, ObjectiveId, PersistedProgress, ProgressStore, ProgressSummary, SessionId,
    StoreError, FIRST_LEVEL,
};
use progression_system_objectives as objectives;
use progression_system_stats::{aggregate, award_achievements, RunOutcome};
use progression_system_unlocks::reevaluate_all;
use tracing::{debug, info, warn};

pub use objectives::{Session, SessionSnapshot};
pub use registry::LevelRegistry;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ActiveSession {
    id: SessionId,
    level: LevelId,
}

/// Explicit owner of every piece of mutable progression state.
#[derive(Debug)]
pub struct EngineContext<S: ProgressStore> {
    registry: LevelRegistry,
    stats: BTreeMap<LevelId, LevelStats>,
    progress: GameProgress,
    store: S,
    active: Option<ActiveSession>,
    next_session: u64,
    dirty: bool,
    events: Vec<Event>,
    clock: fn() -> DateTime<Utc>,
}

impl<S: ProgressStore> EngineContext<S> {
    /// Restores progress from `store` and attaches it to every registered level.
    ///
    /// Level 1 is always unlocked. Unlock conditions are replayed once against
    /// the restored progress.
    pub fn new(registry: LevelRegistry, mut store: S) -> Self {
        let PersistedProgress { progress, stats } = store.load();
        let mut context = Self {
            registry,
            stats,
            progress,
            store,
            active: None,
            next_session: 1,
            dirty: false,
            events: Vec::new(),
            clock: Utc::now,
        };

        let ids: Vec<LevelId> = context.registry.iter().map(LevelDefinition::id).collect();
        for id in ids {
            context.attach(id);
        }
        let _ = context.stats.entry(FIRST_LEVEL).or_default().unlock();

        let unlocked = reevaluate_all(
            context.registry.iter(),
            &mut context.stats,
            &context.progress,
        );
        for level in unlocked {
            context.events.push(Event::LevelUnlocked { level });
        }

        info!(
            levels = context.registry.len(),
            completed = context.progress.completed_levels.len(),
            "progression engine ready"
        );
        context
    }

    /// Replaces the clock used to stamp completions.
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    fn attach(&mut self, id: LevelId) {
        let record = self.stats.entry(id).or_default();
        if id == FIRST_LEVEL {
            let _ = record.unlock();
        }
    }

    /// Registers a level after construction.
    ///
    /// The level receives its restored stats, if any. Unlock conditions are
    /// not evaluated until the next completion.
    pub fn register_level(&mut self, definition: LevelDefinition) -> Result<(), EngineError> {
        let id = definition.id();
        self.registry.register(definition)?;
        self.attach(id);
        debug!(level = id.get(), "level registered");
        Ok(())
    }

    /// Starts a session for an unlocked level.
    ///
    /// A session that is still active is superseded and can no longer be
    /// completed.
    pub fn start_level(&mut self, id: LevelId) -> Result<Session, EngineError> {
        let definition = self.registry.get(id)?;
        let unlocked = self.stats.get(&id).is_some_and(|stats| stats.is_unlocked);
        let session_id = SessionId::new(self.next_session);
        let session = objectives::start_session(definition, unlocked, session_id)?;
        self.next_session += 1;

        if let Some(previous) = self.active.take() {
            warn!(
                level = previous.level.get(),
                session = previous.id.get(),
                "active session superseded"
            );
            self.events.push(Event::SessionAbandoned {
                level: previous.level,
                session: previous.id,
            });
        }
        self.active = Some(ActiveSession {
            id: session_id,
            level: id,
        });
        self.progress.current_level = id;

        info!(level = id.get(), session = session_id.get(), "session started");
        self.events.push(Event::SessionStarted {
            level: id,
            session: session_id,
        });
        Ok(session)
    }

    fn ensure_active(&self, session: &Session) -> Result<(), EngineError> {
        let expected = ActiveSession {
            id: session.id(),
            level: session.level(),
        };
        if self.active == Some(expected) {
            Ok(())
        } else {
            Err(EngineError::InvalidSession)
        }
    }

    /// Reports progress toward an objective and returns its completed flag.
    pub fn update_objective(
        &self,
        session: &mut Session,
        objective: ObjectiveId,
        progress: u64,
    ) -> Result<bool, EngineError> {
        self.ensure_active(session)?;
        objectives::update_objective(session, objective, progress)
    }

    /// Counts one spawned enemy against the session's spawn entry at `entry`.
    pub fn record_spawn(&self, session: &mut Session, entry: usize) -> Result<bool, EngineError> {
        self.ensure_active(session)?;
        Ok(objectives::record_spawn(session, entry))
    }

    /// Read-only view of a session's progress.
    #[must_use]
    pub fn snapshot(&self, session: &Session) -> SessionSnapshot {
        objectives::snapshot(session)
    }

    /// Discards the active session without touching persisted progress.
    pub fn abandon_level(&mut self, session: Session) -> Result<(), EngineError> {
        self.ensure_active(&session)?;
        self.active = None;
        info!(
            level = session.level().get(),
            session = session.id().get(),
            "session abandoned"
        );
        self.events.push(Event::SessionAbandoned {
            level: session.level(),
            session: session.id(),
        });
        Ok(())
    }

    /// Folds a finished session into the stats, re-evaluates unlocks, and
    /// writes the result through to the store.
    ///
    /// When the write fails the in-memory update stands, the context is
    /// marked dirty, and [`EngineError::Persistence`] is returned.
    pub fn complete_level(
        &mut self,
        session: Session,
        score: u64,
        elapsed: Duration,
    ) -> Result<CompletionResult, EngineError> {
        self.ensure_active(&session)?;
        let level = session.level();
        let definition = self.registry.get(level)?;
        self.active = None;

        let now = (self.clock)();
        let stats = self.stats.entry(level).or_default();
        let aggregation = aggregate(
            definition,
            &session,
            RunOutcome::new(score, elapsed),
            stats,
            &mut self.progress,
            now,
        );
        let newly_unlocked = reevaluate_all(self.registry.iter(), &mut self.stats, &self.progress);
        let achievements = award_achievements(
            &mut self.progress,
            aggregation.stars,
            self.registry.iter().map(LevelDefinition::id),
        );

        info!(
            level = level.get(),
            score,
            elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            stars = aggregation.stars,
            perfect = aggregation.is_perfect,
            "level completed"
        );
        self.events.push(Event::LevelCompleted {
            level,
            score,
            stars: aggregation.stars,
            perfect: aggregation.is_perfect,
        });
        self.events.extend(
            newly_unlocked
                .iter()
                .map(|&level| Event::LevelUnlocked { level }),
        );
        self.events.extend(
            achievements
                .iter()
                .map(|&achievement| Event::AchievementEarned { achievement }),
        );

        let result = CompletionResult {
            level,
            stars: aggregation.stars,
            is_perfect: aggregation.is_perfect,
            time_bonus: aggregation.time_bonus,
            new_best_score: aggregation.new_best_score,
            new_best_time: aggregation.new_best_time,
            newly_unlocked,
            rewards: aggregation.rewards,
            achievements,
        };

        self.persist()?;
        Ok(result)
    }

    /// Re-locks every level except level 1 and clears all progress and stats.
    pub fn reset_progress(&mut self) -> Result<(), EngineError> {
        if let Some(active) = self.active.take() {
            debug!(session = active.id.get(), "active session dropped by reset");
            self.events.push(Event::SessionAbandoned {
                level: active.level,
                session: active.id,
            });
        }
        self.progress = GameProgress::default();
        for (&id, stats) in &mut self.stats {
            *stats = LevelStats::new(id == FIRST_LEVEL);
        }
        let _ = self.stats.entry(FIRST_LEVEL).or_default().unlock();

        info!("progress reset");
        self.events.push(Event::ProgressReset);
        self.persist()?;
        Ok(())
    }

    /// Retries a failed write. Does nothing when the store is up to date.
    pub fn flush(&mut self) -> Result<(), EngineError> {
        if !self.dirty {
            return Ok(());
        }
        self.persist()?;
        Ok(())
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        match self.store.save(&self.progress, &self.stats) {
            Ok(()) => {
                self.dirty = false;
                Ok(())
            }
            Err(error) => {
                self.dirty = true;
                warn!(%error, "failed to persist progress, keeping in-memory state");
                self.events.push(Event::SaveFailed {
                    reason: error.to_string(),
                });
                Err(error)
            }
        }
    }

    /// Takes every event recorded since the previous drain.
    pub fn drain_events(&mut self) -> Vec<Event> {
        mem::take(&mut self.events)
    }

    /// Summaries of registered levels in ascending id order.
    #[must_use]
    pub fn list_levels(&self, include_locked: bool) -> Vec<LevelSummary> {
        query::list_levels(self, include_locked)
    }

    /// Aggregate view over the whole progress.
    #[must_use]
    pub fn progress_summary(&self) -> ProgressSummary {
        query::progress_summary(self)
    }

    /// Definition of a registered level.
    pub fn definition(&self, id: LevelId) -> Result<&LevelDefinition, EngineError> {
        self.registry.get(id)
    }

    /// Stats recorded for a level.
    #[must_use]
    pub fn level_stats(&self, id: LevelId) -> Option<&LevelStats> {
        self.stats.get(&id)
    }

    /// Global progress.
    #[must_use]
    pub fn game_progress(&self) -> &GameProgress {
        &self.progress
    }

    /// Registered levels.
    #[must_use]
    pub fn registry(&self) -> &LevelRegistry {
        &self.registry
    }

    /// Whether the last write failed and has not been retried successfully.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Backing store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutable access to the backing store.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }
}
