//! Error types for the court rota engine.
//!
//! Every fallible operation in the crate returns [`RotaError`].

use thiserror::Error;

use crate::schedule::PersonId;

/// All error types that can occur while building or editing a rota
#[derive(Debug, Error)]
pub enum RotaError {
    /// Not enough people to fill every court
    #[error("cannot form schedule with {squad_size} people for {n_courts} courts")]
    InsufficientSquad { squad_size: usize, n_courts: usize },

    /// Schedule parameters out of range
    #[error("invalid schedule parameters: {0}")]
    InvalidParams(String),

    /// The same person was listed twice in a roster
    #[error("person {0} appears more than once in the roster")]
    DuplicatePerson(PersonId),

    /// Person is not part of the given slot (or pool)
    #[error("could not find person {0}")]
    PersonNotFound(PersonId),

    /// A pair swap was requested for someone sitting out
    #[error("expecting both persons to be playing")]
    ExpectedPlaying,

    /// Slot index past the end of the schedule
    #[error("slot {index} out of range (schedule has {n_slots} slots)")]
    SlotOutOfRange { index: usize, n_slots: usize },

    /// Slots of one schedule disagree about who is taking part
    #[error("inconsistent squads in schedule")]
    InconsistentSquads,

    /// Pool member names must not be blank
    #[error("invalid name: {0:?}")]
    InvalidName(String),

    /// An operation needed a current schedule
    #[error("no schedule")]
    NoSchedule,

    /// An operation needed a running generation
    #[error("expecting generation to be running")]
    NotRunning,

    /// Broken invariant inside the scheduling algorithms
    #[error("internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV read/write error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl RotaError {
    /// True for errors caused by the caller's input rather than by the
    /// environment or a bug.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            RotaError::InsufficientSquad { .. }
                | RotaError::InvalidParams(_)
                | RotaError::DuplicatePerson(_)
                | RotaError::PersonNotFound(_)
                | RotaError::ExpectedPlaying
                | RotaError::SlotOutOfRange { .. }
                | RotaError::InvalidName(_)
                | RotaError::NotRunning
        )
    }
}

/// Result type alias for rota operations
pub type Result<T> = std::result::Result<T, RotaError>;
