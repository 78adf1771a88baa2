//! Error types for hierarchy loading and traversal.

use thiserror::Error;

use crate::record::RecordId;

/// Main error type for the hierarchy builder
///
/// Every malformed-input failure answers `true` to
/// [`HierarchyError::is_invalid_input`]; the variants only differ in how
/// precisely they locate the problem.
#[derive(Debug, Error)]
pub enum HierarchyError {
    /// The collection itself is unusable: not an array or object, or an
    /// element that is not an object
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// An object row whose id or parent field cannot be used
    #[error("Invalid record at position {position}: {reason}")]
    InvalidRecord { position: usize, reason: String },

    #[error("Maximum depth of {max_depth} exceeded below '{root}' (cyclic or corrupt parent data?)")]
    MaxDepthExceeded { root: RecordId, max_depth: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HierarchyError {
    pub(crate) fn invalid_input(reason: impl Into<String>) -> Self {
        HierarchyError::InvalidInput {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_record(position: usize, reason: impl Into<String>) -> Self {
        HierarchyError::InvalidRecord {
            position,
            reason: reason.into(),
        }
    }

    /// True for any load-time rejection of the supplied records
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            HierarchyError::InvalidInput { .. }
                | HierarchyError::InvalidRecord { .. }
                | HierarchyError::Json(_)
        )
    }

    pub fn is_max_depth_exceeded(&self) -> bool {
        matches!(self, HierarchyError::MaxDepthExceeded { .. })
    }
}

pub type Result<T> = std::result::Result<T, HierarchyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = HierarchyError::MaxDepthExceeded {
            root: RecordId::Int(7),
            max_depth: 3,
        };
        assert_eq!(
            err.to_string(),
            "Maximum depth of 3 exceeded below '7' (cyclic or corrupt parent data?)"
        );
        assert!(err.is_max_depth_exceeded());
        assert!(!err.is_invalid_input());

        let err = HierarchyError::invalid_record(2, "missing id field 'id'");
        assert_eq!(
            err.to_string(),
            "Invalid record at position 2: missing id field 'id'"
        );
        assert!(err.is_invalid_input());
    }
}
