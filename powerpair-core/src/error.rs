/// Error types for draw generation.
///
/// Every variant aborts the whole draw: a draw is only meaningful as a complete
/// allocation of every team, so no stage returns a partial result.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DrawError {
    /// Unknown option key, unparsable option value, unknown strategy name, or
    /// an injected strategy that broke its contract.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A team does not expose something an enabled option needs, or a side
    /// selector other than "aff"/"neg" was used.
    #[error("Capability error: {0}")]
    Capability(String),

    /// Odd-bracket resolution ran out of brackets with a team still unplaced.
    #[error("Bracket {bracket} is still odd after odd-bracket resolution")]
    UnresolvedOddBracket { bracket: f64 },
}

impl DrawError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        DrawError::Configuration(msg.into())
    }

    pub(crate) fn capability(msg: impl Into<String>) -> Self {
        DrawError::Capability(msg.into())
    }
}

/// Result type for draw operations.
pub type Result<T> = std::result::Result<T, DrawError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = DrawError::config("Unrecognized option: colour");
        assert_eq!(err.to_string(), "Configuration error: Unrecognized option: colour");

        let err = DrawError::UnresolvedOddBracket { bracket: 1.0 };
        assert_eq!(err.to_string(), "Bracket 1 is still odd after odd-bracket resolution");
    }
}
