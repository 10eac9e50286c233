//! Error types for scene construction.

use thiserror::Error;

/// Errors raised while applying a protocol command to a scene node.
///
/// The `Display` text of each variant is the message shown to the user;
/// the stream parser adds the file and line location around it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    /// Wrong arity or unparsable field for a known command.
    #[error("Syntax error in \"{command}\"\n  correct syntax: {command} {expected}")]
    Syntax {
        /// The command word as written.
        command: String,
        /// Expected parameter list.
        expected: String,
    },

    /// Malformed item inside a raw section.
    #[error("Syntax error in a \"{section}\" section\n  correct syntax: {expected}")]
    RawSection {
        /// Opening directive of the section (e.g. `raw_triangle`).
        section: String,
        /// Expected item fields.
        expected: String,
    },

    /// Parameters parsed but violate a domain constraint.
    #[error("{0}")]
    Invalid(String),

    /// The command word matches no dispatch entry.
    #[error("Unknown command\n   {0}")]
    UnknownCommand(String),
}

impl SceneError {
    /// Create a syntax error for `command` expecting `expected` parameters.
    pub fn syntax(command: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::Syntax {
            command: command.into(),
            expected: expected.into(),
        }
    }

    /// Create a raw section item error.
    pub fn raw_section(section: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::RawSection {
            section: section.into(),
            expected: expected.into(),
        }
    }

    /// Create a semantic/range error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }

    /// "Parameter out of range in `<command>`".
    pub fn out_of_range(command: &str) -> Self {
        Self::Invalid(format!("Parameter out of range in {command}"))
    }
}

/// Result type for scene operations.
pub type Result<T> = std::result::Result<T, SceneError>;
