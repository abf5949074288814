//! Common types used throughout the index.

mod node_id;

pub use node_id::NodeId;

use crate::error::{IndexError, Result};
use serde::{Deserialize, Serialize};

/// Smallest degree for which a full node can still be split in two
pub const MIN_DEGREE: usize = 2;

/// Default degree (visualization-friendly, matches a 4-key leaf limit)
pub const DEFAULT_DEGREE: usize = 4;

/// Index configuration
///
/// `degree` is the key count at which a node must split: a node never
/// holds `degree` keys once a mutating call returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexConfig {
    /// Maximum keys per node (exclusive bound after each operation)
    pub degree: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            degree: DEFAULT_DEGREE,
        }
    }
}

impl IndexConfig {
    /// Create a new config with the given degree
    pub fn new(degree: usize) -> Self {
        Self { degree }
    }

    /// Set the degree
    pub fn degree(mut self, degree: usize) -> Self {
        self.degree = degree;
        self
    }

    /// Check that the degree can support splitting
    pub fn validate(&self) -> Result<()> {
        if self.degree < MIN_DEGREE {
            return Err(IndexError::InvalidDegree {
                degree: self.degree,
                min: MIN_DEGREE,
            });
        }
        Ok(())
    }

    /// Minimum keys a non-root leaf should hold after a delete
    pub fn min_leaf_keys(&self) -> usize {
        self.degree / 2
    }

    /// Minimum keys a non-root internal node should hold after a delete.
    ///
    /// Internal splits promote one key out of the right half, so the right
    /// half of an even-degree split holds one key less than a leaf half.
    /// At degree 2 this is zero: a split there leaves a key-less node with
    /// a single child.
    pub fn min_internal_keys(&self) -> usize {
        self.degree.div_ceil(2) - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = IndexConfig::default();
        assert_eq!(config.degree, DEFAULT_DEGREE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_rejects_small_degree() {
        let err = IndexConfig::new(1).validate().unwrap_err();
        assert_eq!(err, IndexError::InvalidDegree { degree: 1, min: 2 });
        assert!(IndexConfig::new(0).validate().is_err());
        assert!(IndexConfig::default().degree(2).validate().is_ok());
    }

    #[test]
    fn test_occupancy_thresholds() {
        let cases = [(2, 1, 0), (3, 1, 1), (4, 2, 1), (5, 2, 2), (8, 4, 3)];
        for (degree, leaf, internal) in cases {
            let config = IndexConfig::new(degree);
            assert_eq!(config.min_leaf_keys(), leaf, "degree {}", degree);
            assert_eq!(config.min_internal_keys(), internal, "degree {}", degree);
        }
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let json = serde_json::to_string(&IndexConfig::new(7)).unwrap();
        assert_eq!(json, r#"{"degree":7}"#);
        let back: IndexConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.degree, 7);
    }
}
