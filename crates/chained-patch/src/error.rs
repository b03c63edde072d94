//! Error types for the patch crate.

/// Errors that can occur while parsing pointers or applying patches.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchError {
    /// A pointer string did not start with `/` or held a bad escape.
    #[error("invalid pointer {0:?}")]
    InvalidPointer(String),

    /// The target (or the parent of the target) does not exist.
    #[error("path not found: {path}")]
    PathNotFound { path: String },

    /// An array index was malformed or out of bounds.
    #[error("invalid array index {token:?} at {path}")]
    InvalidIndex { path: String, token: String },

    /// The parent of the target is a scalar.
    #[error("cannot address a child of a scalar at {path}")]
    NotAContainer { path: String },

    /// The whole document cannot be removed.
    #[error("cannot remove the document root")]
    RootRemoval,

    /// A value cannot be moved into one of its own children.
    #[error("cannot move {from} into its own descendant {path}")]
    MoveIntoDescendant { from: String, path: String },

    /// A `test` operation found a different value.
    #[error("test failed at {path}")]
    TestFailed { path: String },

    /// Wraps a failure with the position of the operation that raised it.
    #[error("operation {index} failed: {source}")]
    Operation {
        index: usize,
        #[source]
        source: Box<PatchError>,
    },
}

impl PatchError {
    /// Attach the index of the failing operation.
    pub fn at_operation(self, index: usize) -> Self {
        Self::Operation {
            index,
            source: Box::new(self),
        }
    }

    /// The underlying error with any operation index stripped.
    pub fn root_cause(&self) -> &PatchError {
        match self {
            Self::Operation { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Convenience alias for patch results.
pub type PatchResult<T> = Result<T, PatchError>;
