use thiserror::Error;
use uuid::Uuid;

/// Failure returned by the store behind the [`crate::Repository`] trait.
///
/// Unavailability is the only truly fatal condition in the engine's error
/// taxonomy; everything else (not-found, ambiguity, missing coordinates)
/// is an expected outcome carried in result types.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("location store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum EngineError {
    /// Missing or malformed caller parameters. Fail fast.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The caller referenced a location id that is not in the snapshot.
    #[error("unknown location: {0}")]
    UnknownLocation(Uuid),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
