use crate::state::game::GameState;

/// Whether a transition's resulting state must be written back before the lease is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persistence {
    /// Write the resulting state back.
    Persist,
    /// Leave the stored record untouched.
    DoNotPersist,
}

impl Persistence {
    /// Persist exactly when something changed.
    pub fn from_changed(changed: bool) -> Self {
        if changed {
            Persistence::Persist
        } else {
            Persistence::DoNotPersist
        }
    }
}

/// Result of applying one game operation to a snapshot of the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition<T> {
    /// Whether `state` must be written back.
    pub persistence: Persistence,
    /// Record after the operation.
    pub state: GameState,
    /// Operation specific answer handed back to the caller.
    pub outcome: T,
}

impl<T> Transition<T> {
    /// Transition with an explicit persistence decision.
    pub fn new(persistence: Persistence, state: GameState, outcome: T) -> Self {
        Self {
            persistence,
            state,
            outcome,
        }
    }

    /// Transition whose state must be written back.
    pub fn persist(state: GameState, outcome: T) -> Self {
        Self::new(Persistence::Persist, state, outcome)
    }

    /// Transition that leaves the stored record as it is.
    pub fn unchanged(state: GameState, outcome: T) -> Self {
        Self::new(Persistence::DoNotPersist, state, outcome)
    }

    /// True when the state must be written back.
    pub fn should_persist(&self) -> bool {
        self.persistence == Persistence::Persist
    }
}
