//! Error types for netsim-vis.

use netsim_model::EventKind;
use thiserror::Error;

/// Result type for netsim-vis operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading or playing a scenario.
#[derive(Debug, Error)]
pub enum Error {
    /// The scenario could not be read
    #[error("Parse error: {0}")]
    Parse(#[from] netsim_parser::Error),

    /// An event or inverse names an entity the scene does not hold
    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    /// An event reached an entity of the wrong kind
    #[error("Cannot apply {kind} to {target}")]
    Mismatch { kind: EventKind, target: String },

    /// Rewinding found no recorded inverse for an applied event
    #[error("Missing inverse for event #{0}")]
    MissingInverse(usize),

    /// No scenario is loaded
    #[error("No scenario loaded")]
    NoSession,

    /// Invalid request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A background load task panicked or was cancelled
    #[error("Load task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn mismatch(kind: EventKind, target: impl std::fmt::Display) -> Self {
        Error::Mismatch {
            kind,
            target: target.to_string(),
        }
    }

    pub(crate) fn unknown(target: impl std::fmt::Display) -> Self {
        Error::UnknownEntity(target.to_string())
    }
}
