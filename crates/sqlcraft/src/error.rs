//! Error types for sqlcraft

use thiserror::Error;

/// Result type alias for sqlcraft operations
pub type SqlResult<T> = Result<T, SqlError>;

/// Errors raised while resolving identifiers or assembling statements.
///
/// Builder calls never fail; every variant is surfaced by `assemble()` (or by a
/// direct [`Dialect`](crate::Dialect) call) and leaves the statement untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SqlError {
    /// An identifier cannot be resolved (unknown record attribute, malformed shape)
    #[error("Identifier error: {0}")]
    Identifier(String),

    /// A structural invariant does not hold at assemble time
    #[error("Assembly error: {0}")]
    Assembly(String),

    /// The dialect cannot render the requested construct
    #[error("Dialect error: {0}")]
    Dialect(String),

    /// Configuration could not be loaded or parsed
    #[error("Config error: {0}")]
    Config(String),
}

impl SqlError {
    /// Create an identifier error
    pub fn identifier(message: impl Into<String>) -> Self {
        Self::Identifier(message.into())
    }

    /// Create an assembly error
    pub fn assembly(message: impl Into<String>) -> Self {
        Self::Assembly(message.into())
    }

    /// Create a dialect error
    pub fn dialect(message: impl Into<String>) -> Self {
        Self::Dialect(message.into())
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Check if this is an identifier error
    pub fn is_identifier(&self) -> bool {
        matches!(self, Self::Identifier(_))
    }

    /// Check if this is an assembly error
    pub fn is_assembly(&self) -> bool {
        matches!(self, Self::Assembly(_))
    }

    /// Check if this is a dialect error
    pub fn is_dialect(&self) -> bool {
        matches!(self, Self::Dialect(_))
    }
}

impl From<toml::de::Error> for SqlError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<serde_json::Error> for SqlError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages() {
        assert_eq!(
            SqlError::assembly("unclosed group").to_string(),
            "Assembly error: unclosed group"
        );
        assert_eq!(
            SqlError::identifier("unknown attribute 'x'").to_string(),
            "Identifier error: unknown attribute 'x'"
        );
    }

    #[test]
    fn error_predicates() {
        assert!(SqlError::dialect("no cast type").is_dialect());
        assert!(!SqlError::dialect("no cast type").is_assembly());
        assert!(SqlError::identifier("x").is_identifier());
    }
}
