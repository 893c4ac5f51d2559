//! Error types for netsim-parser.

use thiserror::Error;

use crate::section::Section;

/// Result type for netsim-parser operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading a scenario.
#[derive(Debug, Error)]
pub enum Error {
    /// The byte stream is not a well-formed document.
    #[error("syntax error at byte {offset} after {last_token:?}: {message}")]
    Syntax {
        offset: u64,
        last_token: String,
        message: String,
    },

    /// The token feed violated the nesting rules (value without a key,
    /// mismatched close, unterminated document).
    #[error("structural error: {0}")]
    Structural(String),

    /// A record is missing a required field, has an unknown discriminator
    /// or references a container that does not exist.
    #[error("schema error in '{section}': {message}")]
    Schema { section: Section, message: String },

    /// A field is present but its value is outside the valid domain.
    #[error("'{section}' field '{field}' out of range: {message}")]
    Range {
        section: Section,
        field: String,
        message: String,
    },

    /// Reading the input failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a [`Error::Structural`].
    pub fn structural(message: impl Into<String>) -> Self {
        Error::Structural(message.into())
    }

    /// Shorthand for a [`Error::Schema`].
    pub fn schema(section: Section, message: impl Into<String>) -> Self {
        Error::Schema {
            section,
            message: message.into(),
        }
    }

    /// Shorthand for a [`Error::Range`].
    pub fn range(section: Section, field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Range {
            section,
            field: field.into(),
            message: message.into(),
        }
    }

    /// True if the error concerns one record and leaves the token stream
    /// intact, so skipping that record is possible.
    pub fn is_record_scoped(&self) -> bool {
        match self {
            Error::Schema { .. } | Error::Range { .. } => true,
            Error::Syntax { .. } | Error::Structural(_) | Error::Io(_) => false,
        }
    }
}

/// A record that was dropped instead of aborting the load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub section: Section,
    pub message: String,
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "skipped record in '{}': {}", self.section, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_classification() {
        assert!(Error::schema(Section::Nodes, "missing 'id'").is_record_scoped());
        assert!(Error::range(Section::Buildings, "floors", "must be positive").is_record_scoped());
        assert!(!Error::structural("value without key").is_record_scoped());
        assert!(!Error::Syntax {
            offset: 3,
            last_token: "{".into(),
            message: "EOF".into()
        }
        .is_record_scoped());
    }

    #[test]
    fn messages_name_the_section() {
        let err = Error::schema(Section::Events, "unknown type 'x'");
        assert_eq!(err.to_string(), "schema error in 'events': unknown type 'x'");
    }
}
