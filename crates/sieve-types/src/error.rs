//! Compile-time error types.

use thiserror::Error;

/// Errors raised while turning a schema tree into an executable routine.
#[derive(Debug, Error)]
pub enum CompileError {
    /// A `group` node appeared outside an object's children or groups.
    #[error("group node is only valid inside an object (at '{path}')")]
    UnexpectedGroup {
        /// Wildcard path of the position the group was found at.
        path: String,
    },

    /// The schema or options could not be serialized.
    #[error("schema serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result alias for compilation.
pub type CompileResult<T> = Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_group_display() {
        let err = CompileError::UnexpectedGroup {
            path: "users.*".into(),
        };
        assert_eq!(
            err.to_string(),
            "group node is only valid inside an object (at 'users.*')"
        );
    }

    #[test]
    fn test_root_path_display() {
        let err = CompileError::UnexpectedGroup { path: String::new() };
        assert!(err.to_string().ends_with("(at '')"));
    }
}
