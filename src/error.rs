use std::fmt;

use thiserror::Error as ThisError;

use crate::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    KeyNotFound,
    IndexOutOfRange,
    AlreadyAttached,
    TypeMismatch,
    Syntax,
    InvalidValue,
    Io,
}

/// Position inside the parsed text. `line` and `column` are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("key not found: {key:?} in table at {path}")]
    KeyNotFound { key: String, path: Path },

    #[error("index {index} out of range (len: {len}) at {path}")]
    IndexOutOfRange { index: usize, len: usize, path: Path },

    /// The value is already placed inside a container; `copy()` it first.
    #[error("value at {path} is attached, copy first")]
    AlreadyAttached { path: Path },

    #[error("type mismatch at {path}: expected {expected}, found {found}")]
    TypeMismatch {
        path: Path,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{message} at {location}")]
    Syntax { message: String, location: Location },

    #[error("invalid value: {message}")]
    InvalidValue { message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn key_not_found(key: impl Into<String>, path: Path) -> Self {
        Self::KeyNotFound {
            key: key.into(),
            path,
        }
    }

    pub fn index_out_of_range(index: usize, len: usize, path: Path) -> Self {
        Self::IndexOutOfRange { index, len, path }
    }

    pub fn already_attached(path: Path) -> Self {
        Self::AlreadyAttached { path }
    }

    pub fn type_mismatch(path: Path, expected: &'static str, found: &'static str) -> Self {
        Self::TypeMismatch {
            path,
            expected,
            found,
        }
    }

    pub fn syntax(message: impl Into<String>, location: Location) -> Self {
        Self::Syntax {
            message: message.into(),
            location,
        }
    }

    pub fn invalid_value(message: impl Into<String>) -> Self {
        Self::InvalidValue {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::KeyNotFound { .. } => ErrorKind::KeyNotFound,
            Error::IndexOutOfRange { .. } => ErrorKind::IndexOutOfRange,
            Error::AlreadyAttached { .. } => ErrorKind::AlreadyAttached,
            Error::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Error::Syntax { .. } => ErrorKind::Syntax,
            Error::InvalidValue { .. } => ErrorKind::InvalidValue,
            Error::Io(_) => ErrorKind::Io,
        }
    }

    pub fn location(&self) -> Option<Location> {
        match self {
            Error::Syntax { location, .. } => Some(*location),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;

    #[rstest::rstest]
    fn test_error_display() {
        let err = Error::key_not_found("name", path!("owner"));
        assert_eq!(err.to_string(), "key not found: \"name\" in table at $.owner");
        assert_eq!(err.kind(), ErrorKind::KeyNotFound);
    }

    #[rstest::rstest]
    fn test_syntax_error_location() {
        let location = Location {
            offset: 12,
            line: 2,
            column: 5,
        };
        let err = Error::syntax("expected '='", location);
        assert_eq!(err.location(), Some(location));
        assert_eq!(err.to_string(), "expected '=' at line 2, column 5");
    }
}
