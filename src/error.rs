//! Error types for the ordered index.

use thiserror::Error;

/// Result type alias for index operations
pub type Result<T> = std::result::Result<T, IndexError>;

/// Errors that can occur in the ordered index
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// Insert targeted a key that is already stored
    #[error("Key {key} already exists")]
    DuplicateKey { key: String },

    /// Key not found (for operations that require an existing key)
    #[error("Key {key} not found")]
    KeyNotFound { key: String },

    /// Degree below the smallest branching factor that can split
    #[error("Invalid degree: {degree} (min: {min})")]
    InvalidDegree { degree: usize, min: usize },

    /// Structural invariant violated
    #[error("Corruption detected: {0}")]
    Corruption(String),
}

impl IndexError {
    /// Create a duplicate key error from any debuggable key
    pub fn duplicate(key: &impl std::fmt::Debug) -> Self {
        Self::DuplicateKey {
            key: format!("{:?}", key),
        }
    }

    /// Create a not found error from any debuggable key
    pub fn not_found(key: &impl std::fmt::Debug) -> Self {
        Self::KeyNotFound {
            key: format!("{:?}", key),
        }
    }

    /// Create a corruption error with a message
    pub fn corruption(msg: impl Into<String>) -> Self {
        Self::Corruption(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(IndexError::duplicate(&7).to_string(), "Key 7 already exists");
        assert_eq!(IndexError::not_found(&"k").to_string(), "Key \"k\" not found");
        assert_eq!(
            IndexError::InvalidDegree { degree: 1, min: 2 }.to_string(),
            "Invalid degree: 1 (min: 2)"
        );
        assert_eq!(
            IndexError::corruption("bad").to_string(),
            "Corruption detected: bad"
        );
    }
}
