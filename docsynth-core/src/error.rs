//! Error types for docsynth core.

use std::{error::Error, fmt, io};

/// Error type for docsynth core operations.
#[derive(Debug)]
pub enum DocsynthError {
    /// An underlying I/O error.
    Io(io::Error),
    /// Python source could not be parsed.
    Parse(String),
    /// A catch-all error with a message.
    Other(String),
}

impl fmt::Display for DocsynthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io error: {err}"),
            Self::Parse(message) => write!(f, "parse error: {message}"),
            Self::Other(message) => write!(f, "{message}"),
        }
    }
}

impl Error for DocsynthError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(_) | Self::Other(_) => None,
        }
    }
}

impl From<io::Error> for DocsynthError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

/// Convenience result type for docsynth core.
pub type Result<T> = std::result::Result<T, DocsynthError>;

#[cfg(test)]
mod tests {
    use super::DocsynthError;
    use std::error::Error;
    use std::io;

    #[test]
    fn io_error_formats_message() {
        let error = DocsynthError::Io(io::Error::new(io::ErrorKind::Other, "boom"));
        assert_eq!(format!("{error}"), "io error: boom");
        assert!(error.source().is_some());
    }

    #[test]
    fn parse_error_formats_message() {
        let error = DocsynthError::Parse("syntax error near line 3".to_string());
        assert_eq!(format!("{error}"), "parse error: syntax error near line 3");
        assert!(error.source().is_none());
    }

    #[test]
    fn other_error_formats_message() {
        let error = DocsynthError::Other("docsynth failed".to_string());
        assert_eq!(format!("{error}"), "docsynth failed");
    }

    #[test]
    fn from_io_error_maps_variant() {
        let error: DocsynthError = io::Error::new(io::ErrorKind::NotFound, "missing").into();
        match error {
            DocsynthError::Io(inner) => {
                assert_eq!(inner.kind(), io::ErrorKind::NotFound);
            }
            _ => panic!("expected Io variant"),
        }
    }
}
