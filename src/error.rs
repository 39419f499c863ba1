//! Error types for the rcstree library
//!
//! Every failure in the revision tree is reported through [`RcsError`].
//! None of them are recovered internally: they either point at corrupt or
//! inconsistent archive data, or at a caller asking for a revision that does
//! not exist.

use crate::version::Version;
use thiserror::Error;

/// Type alias for Results in the rcstree library
pub type Result<T> = std::result::Result<T, RcsError>;

/// Main error type for all revision tree operations
#[derive(Debug, Error)]
pub enum RcsError {
    /// A version string could not be parsed
    #[error("Invalid version number: {0}")]
    InvalidVersionNumber(String),

    /// A trunk node was given a version with more than two components
    #[error("Invalid trunk version number: {0}")]
    InvalidTrunkVersionNumber(Version),

    /// A branch node was given an empty or trunk-shaped version
    #[error("Invalid branch version number: {0}")]
    InvalidBranchVersionNumber(Version),

    /// The head revision of a tree was set twice
    #[error("Head revision already set: {0}")]
    HeadAlreadySet(Version),

    /// The requested revision is not on the searched chain
    #[error("Revision not found: {0}")]
    NodeNotFound(Version),

    /// The requested revision lies on a branch that does not exist
    #[error("Branch not found: {0}")]
    BranchNotFound(Version),

    /// Stored text or edit script has an unexpected shape
    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    /// An edit script did not apply to the text it was meant for
    #[error("Patch failed while applying delta of revision {0}")]
    PatchFailed(Version),

    /// A node with the same version is already part of the tree
    #[error("Duplicate revision: {0}")]
    DuplicateRevision(Version),

    /// Configuration could not be decoded
    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),

    /// Configuration decoded but holds an unusable value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl RcsError {
    /// Create an invalid file format error with a custom message
    pub fn format(msg: impl Into<String>) -> Self {
        RcsError::InvalidFileFormat(msg.into())
    }

    /// Check if this error belongs to the invalid version number family
    pub fn is_invalid_version(&self) -> bool {
        matches!(
            self,
            RcsError::InvalidVersionNumber(_)
                | RcsError::InvalidTrunkVersionNumber(_)
                | RcsError::InvalidBranchVersionNumber(_)
        )
    }

    /// Check if this error means the requested revision does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, RcsError::NodeNotFound(_) | RcsError::BranchNotFound(_))
    }

    /// Check if this error indicates a corrupt or inconsistent archive
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            RcsError::InvalidFileFormat(_)
                | RcsError::PatchFailed(_)
                | RcsError::DuplicateRevision(_)
                | RcsError::HeadAlreadySet(_)
        )
    }

    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            RcsError::NodeNotFound(v) => {
                format!("Revision {} does not exist in this archive. Use 'log()' to list revisions.", v)
            }
            RcsError::BranchNotFound(v) => {
                format!("Branch {} does not exist in this archive.", v)
            }
            RcsError::PatchFailed(v) => {
                format!(
                    "The delta stored for revision {} does not apply. The archive is probably corrupt.",
                    v
                )
            }
            _ => self.to_string(),
        }
    }
}
