//! Error types for stream parsing.

use glv_scene::SceneError;
use thiserror::Error;

/// Errors raised while reading and parsing a protocol stream.
#[derive(Error, Debug)]
pub enum ParseError {
    /// An error tagged with the file and line it was raised on.
    #[error("Parsing error:\n{source}\n[ On line {line} from {file} ]")]
    Located {
        /// The underlying error.
        source: Box<ParseError>,
        /// File name as given, or `stdin`.
        file: String,
        /// 1-based line number.
        line: usize,
    },

    /// A scene command was rejected.
    #[error(transparent)]
    Scene(#[from] SceneError),

    /// A physical line reached the maximum length.
    #[error("Input file - line too long")]
    LineTooLong,

    /// The input ended inside a raw section.
    #[error("Unterminated raw section \"{0}\" at end of input")]
    UnterminatedRaw(String),

    /// An input file could not be opened.
    #[error("Can't open file : {0}")]
    CannotOpen(String),

    /// A well-formed directive with unusable values.
    #[error("{0}")]
    Invalid(String),

    /// Invalid viewer settings.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// Settings file could not be decoded.
    #[error("settings: {0}")]
    SettingsFormat(#[from] toml::de::Error),

    /// Settings could not be encoded.
    #[error("settings: {0}")]
    SettingsEncode(#[from] toml::ser::Error),

    /// I/O failure on the input.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    /// Create a [`ParseError::Invalid`] error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }

    /// Attach a location unless the error already carries one.
    pub fn located(self, file: impl Into<String>, line: usize) -> Self {
        match self {
            located @ Self::Located { .. } => located,
            other => Self::Located {
                source: Box::new(other),
                file: file.into(),
                line,
            },
        }
    }

    /// The error without its location.
    pub fn inner(&self) -> &ParseError {
        match self {
            Self::Located { source, .. } => source.inner(),
            other => other,
        }
    }
}

/// Result type for parser operations.
pub type Result<T> = std::result::Result<T, ParseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_located_message() {
        let err = ParseError::from(SceneError::syntax("point", "x y z")).located("a.gl", 12);
        assert_eq!(
            err.to_string(),
            "Parsing error:\nSyntax error in \"point\"\n  correct syntax: point x y z\n[ On line 12 from a.gl ]"
        );
    }

    #[test]
    fn test_location_not_nested() {
        let err = ParseError::LineTooLong.located("inner.gl", 3).located("outer.gl", 9);
        assert!(err.to_string().ends_with("[ On line 3 from inner.gl ]"));
        assert!(matches!(err.inner(), ParseError::LineTooLong));
    }
}
