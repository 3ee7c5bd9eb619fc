#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Objective tracking for an in-progress level session.
//!
//! A [`Session`] is created from a level definition when play starts and owns
//! its runtime objective state exclusively. The game layer reports progress
//! through [`update_objective`] and spawn activity through [`record_spawn`];
//! nothing here is persisted. Finished sessions are consumed by the stats
//! aggregator.

use progression_core::{
    EngineError, LevelDefinition, LevelId, Missing, ObjectiveId, ObjectiveKind, SessionId,
};

/// Runtime progress toward a single objective.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectiveState {
    id: ObjectiveId,
    kind: ObjectiveKind,
    target: u64,
    required: bool,
    current: u64,
    completed: bool,
}

impl ObjectiveState {
    /// Identifier of the tracked objective.
    #[must_use]
    pub const fn id(&self) -> ObjectiveId {
        self.id
    }

    /// Goal type of the tracked objective.
    #[must_use]
    pub const fn kind(&self) -> ObjectiveKind {
        self.kind
    }

    /// Progress value required for completion.
    #[must_use]
    pub const fn target(&self) -> u64 {
        self.target
    }

    /// Whether the objective gates level completion.
    #[must_use]
    pub const fn required(&self) -> bool {
        self.required
    }

    /// Highest progress reported during the session.
    #[must_use]
    pub const fn current(&self) -> u64 {
        self.current
    }

    /// Whether the objective has been met. Never resets within a session.
    #[must_use]
    pub const fn completed(&self) -> bool {
        self.completed
    }

    /// Progress as `current / target`, or zero for a zero target.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        if self.target == 0 {
            0.0
        } else {
            self.current as f64 / self.target as f64
        }
    }
}

/// Runtime spawn counter paired with one of the level's spawn entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpawnCounter {
    enemy: String,
    count: u32,
    spawned: u32,
}

impl SpawnCounter {
    /// Tag identifying the enemy type.
    #[must_use]
    pub fn enemy(&self) -> &str {
        &self.enemy
    }

    /// Number of enemies the entry schedules.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Number of enemies spawned so far.
    #[must_use]
    pub const fn spawned(&self) -> u32 {
        self.spawned
    }
}

/// Mutable state of a level being played.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    id: SessionId,
    level: LevelId,
    objectives: Vec<ObjectiveState>,
    spawns: Vec<SpawnCounter>,
}

impl Session {
    /// Identifier issued to the session by the engine.
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Level being played.
    #[must_use]
    pub const fn level(&self) -> LevelId {
        self.level
    }

    /// Runtime state of every objective, ordered by objective id.
    #[must_use]
    pub fn objectives(&self) -> &[ObjectiveState] {
        &self.objectives
    }

    /// Runtime spawn counters, ordered like the definition's spawn entries.
    #[must_use]
    pub fn spawns(&self) -> &[SpawnCounter] {
        &self.spawns
    }

    /// Looks up the runtime state of an objective.
    #[must_use]
    pub fn objective(&self, objective: ObjectiveId) -> Option<&ObjectiveState> {
        self.objectives.get(objective.index())
    }
}

/// Read-only progress of one objective for presentation layers.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectiveProgress {
    /// Identifier of the objective.
    pub id: ObjectiveId,
    /// Goal type of the objective.
    pub kind: ObjectiveKind,
    /// Highest progress reported.
    pub current: u64,
    /// Progress value required for completion.
    pub target: u64,
    /// `current / target`, or zero for a zero target.
    pub ratio: f64,
    /// Whether the objective has been met.
    pub completed: bool,
    /// Whether the objective gates level completion.
    pub required: bool,
}

/// Read-only view of a session for presentation layers.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionSnapshot {
    /// Level being played.
    pub level: LevelId,
    /// Progress of every objective.
    pub objectives: Vec<ObjectiveProgress>,
    /// Enemies scheduled across every spawn entry.
    pub enemies_total: u64,
    /// Enemies spawned so far across every spawn entry.
    pub enemies_spawned: u64,
    /// Whether every required objective has been met.
    pub complete: bool,
}

/// Starts a session with fresh objective state and zeroed spawn counters.
///
/// Fails with [`EngineError::LockedLevel`] when the level is not unlocked.
pub fn start_session(
    definition: &LevelDefinition,
    unlocked: bool,
    id: SessionId,
) -> Result<Session, EngineError> {
    if !unlocked {
        return Err(EngineError::LockedLevel(definition.id()));
    }

    let objectives = definition
        .objectives()
        .iter()
        .map(|spec| ObjectiveState {
            id: spec.id,
            kind: spec.kind,
            target: spec.target,
            required: spec.required,
            current: 0,
            completed: false,
        })
        .collect();
    let spawns = definition
        .enemies()
        .iter()
        .map(|spec| SpawnCounter {
            enemy: spec.enemy.clone(),
            count: spec.count,
            spawned: 0,
        })
        .collect();

    Ok(Session {
        id,
        level: definition.id(),
        objectives,
        spawns,
    })
}

/// Records progress toward an objective and returns its completed flag.
///
/// Progress below the current value is ignored.
pub fn update_objective(
    session: &mut Session,
    objective: ObjectiveId,
    progress: u64,
) -> Result<bool, EngineError> {
    let level = session.level;
    let state = session
        .objectives
        .get_mut(objective.index())
        .ok_or(EngineError::NotFound(Missing::Objective { level, objective }))?;

    state.current = state.current.max(progress);
    if state.current >= state.target {
        state.completed = true;
    }
    Ok(state.completed)
}

/// Reports whether every required objective is completed.
#[must_use]
pub fn is_level_complete(session: &Session) -> bool {
    session
        .objectives
        .iter()
        .filter(|state| state.required)
        .all(|state| state.completed)
}

/// Counts one spawned enemy against the spawn entry at `entry`.
///
/// Returns `false` when the entry does not exist or has spawned its full count.
pub fn record_spawn(session: &mut Session, entry: usize) -> bool {
    match session.spawns.get_mut(entry) {
        Some(counter) if counter.spawned < counter.count => {
            counter.spawned += 1;
            true
        }
        _ => false,
    }
}

/// Captures the session's progress without mutating it.
#[must_use]
pub fn snapshot(session: &Session) -> SessionSnapshot {
    let objectives = session
        .objectives
        .iter()
        .map(|state| ObjectiveProgress {
            id: state.id,
            kind: state.kind,
            current: state.current,
            target: state.target,
            ratio: state.ratio(),
            completed: state.completed,
            required: state.required,
        })
        .collect();

    SessionSnapshot {
        level: session.level,
        objectives,
        enemies_total: session
            .spawns
            .iter()
            .map(|counter| u64::from(counter.count))
            .sum(),
        enemies_spawned: session
            .spawns
            .iter()
            .map(|counter| u64::from(counter.spawned))
            .sum(),
        complete: is_level_complete(session),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_is_zero_for_zero_target() {
        let state = ObjectiveState {
            id: ObjectiveId::new(0),
            kind: ObjectiveKind::ReachDestination,
            target: 0,
            required: true,
            current: 5,
            completed: true,
        };
        assert_eq!(state.ratio(), 0.0);
    }

    #[test]
    fn ratio_divides_current_by_target() {
        let state = ObjectiveState {
            id: ObjectiveId::new(0),
            kind: ObjectiveKind::CollectItems,
            target: 8,
            required: false,
            current: 2,
            completed: false,
        };
        assert!((state.ratio() - 0.25).abs() < f64::EPSILON);
    }
}
