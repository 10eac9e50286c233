//! Error types for the protocol filters.

use thiserror::Error;

/// Errors that can occur while filtering a stream.
#[derive(Error, Debug)]
pub enum FilterError {
    /// A line the filter must interpret is malformed.
    #[error("line {line}: syntax error in \"{command}\", expected: {command} {expected}")]
    Syntax {
        /// 1-based input line.
        line: usize,
        /// Command or section name.
        command: String,
        /// Expected fields.
        expected: String,
    },

    /// The input ended inside a raw section.
    #[error("line {line}: {section} section without raw_end")]
    UnterminatedRaw {
        /// Opening directive of the section.
        section: String,
        /// Last line read.
        line: usize,
    },

    /// A color argument could not be understood.
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FilterError {
    /// Create a syntax error at `line`.
    pub fn syntax(line: usize, command: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            command: command.into(),
            expected: expected.into(),
        }
    }
}

/// Result type for filter operations.
pub type Result<T> = std::result::Result<T, FilterError>;
