//! Error types shared by the screener crates.

use thiserror::Error;

/// Result type alias using the screener error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised before a screen or fetch starts: unreadable configuration
/// and invalid user input.
///
/// Row-level data problems never surface here: the screening pipeline
/// degrades those to "missing" instead of failing.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file unreadable or malformed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input or request (bad CLI flag, unknown sort key, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Check if this error was caused by user input.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidInput(_) => 2,
            Self::Config(_) => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(Error::InvalidInput("bad".into()).exit_code(), 2);
        assert_eq!(Error::Config("bad".into()).exit_code(), 3);
    }

    #[test]
    fn test_invalid_input_classification() {
        assert!(Error::InvalidInput("sort key".into()).is_invalid_input());
        assert!(!Error::Config("parse".into()).is_invalid_input());
        assert_eq!(
            Error::InvalidInput("sort key".into()).to_string(),
            "Invalid input: sort key"
        );
    }
}
