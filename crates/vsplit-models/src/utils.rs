//! Identifier validation shared by the API and worker crates.

use thiserror::Error;

/// Longest accepted client-supplied identifier.
pub const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Errors for client-supplied job and session identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("identifier is empty")]
    Empty,

    #[error("identifier exceeds {MAX_IDENTIFIER_LENGTH} characters")]
    TooLong,

    #[error("identifier contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// Validate an opaque identifier (`[A-Za-z0-9_-]`, 1..=128 chars).
///
/// Identifiers end up in log lines and URL paths, so anything else is rejected.
pub fn validate_identifier(id: &str) -> Result<&str, IdentifierError> {
    if id.is_empty() {
        return Err(IdentifierError::Empty);
    }
    if id.len() > MAX_IDENTIFIER_LENGTH {
        return Err(IdentifierError::TooLong);
    }
    if let Some(c) = id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        return Err(IdentifierError::InvalidCharacter(c));
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_identifiers() {
        assert!(validate_identifier("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_identifier("job_42").is_ok());
    }

    #[test]
    fn test_invalid_identifiers() {
        assert_eq!(validate_identifier(""), Err(IdentifierError::Empty));
        assert_eq!(
            validate_identifier("../etc"),
            Err(IdentifierError::InvalidCharacter('.'))
        );
        assert_eq!(
            validate_identifier(&"a".repeat(MAX_IDENTIFIER_LENGTH + 1)),
            Err(IdentifierError::TooLong)
        );
    }
}
