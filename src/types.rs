//! Core data types used throughout the rcstree library
//!
//! This module contains the configuration of a revision tree and the plain
//! data records it hands back to callers.
//!
//! ## Overview
//!
//! - **Configuration**: `TreeConfig` - line endings, annotation layout, default state
//! - **Check-in input**: `RevisionInfo` - who is adding a revision and why
//! - **Reporting**: `RevisionSummary`, `TreeStats` - results of `log()` and `stats()`
//!
//! ## Examples
//!
//! ```rust
//! use rcstree::types::TreeConfig;
//!
//! let config = TreeConfig {
//!     eol: "\r\n".to_string(),
//!     ..Default::default()
//! };
//! assert_eq!(config.default_state, "Exp");
//! ```

use crate::error::{RcsError, Result};
use crate::version::Version;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Date layout of annotated output unless configured otherwise
pub const DEFAULT_DATE_FORMAT: &str = "%d-%b-%y";

/// Configuration for a revision tree
///
/// Controls how reconstructed text is rendered and which defaults are used
/// when new revisions are checked in. Every field has a default, so partial
/// JSON documents are accepted by [`TreeConfig::from_json`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Line terminator used when joining reconstructed lines
    pub eol: String,
    /// `chrono` format string for dates in annotated output
    pub annotation_date_format: String,
    /// Column width reserved for the revision number in annotated output
    pub annotation_version_width: usize,
    /// Column width reserved for the author in annotated output
    pub annotation_author_width: usize,
    /// State given to checked-in revisions that do not name one
    pub default_state: String,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            eol: "\n".to_string(),
            annotation_date_format: DEFAULT_DATE_FORMAT.to_string(),
            annotation_version_width: 12,
            annotation_author_width: 8,
            default_state: "Exp".to_string(),
        }
    }
}

impl TreeConfig {
    /// Decode a configuration from JSON, filling missing fields with defaults
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rcstree::types::TreeConfig;
    ///
    /// let config = TreeConfig::from_json(r#"{ "default_state": "Rel" }"#)?;
    /// assert_eq!(config.default_state, "Rel");
    /// assert_eq!(config.eol, "\n");
    /// # Ok::<(), rcstree::RcsError>(())
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration can be used for rendering
    ///
    /// The date format must consist of valid `strftime` specifiers, since
    /// `chrono` only discovers a bad one while formatting.
    pub fn validate(&self) -> Result<()> {
        if StrftimeItems::new(&self.annotation_date_format).any(|item| matches!(item, Item::Error)) {
            return Err(RcsError::InvalidConfig(format!(
                "unsupported date format {:?}",
                self.annotation_date_format
            )));
        }
        Ok(())
    }
}

/// Author information for a check-in
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RevisionInfo {
    /// Who is checking in
    pub author: String,
    /// Log message
    pub log: String,
    /// State of the new revision (tree default when `None`)
    pub state: Option<String>,
    /// Timestamp of the new revision (now when `None`)
    pub date: Option<DateTime<Utc>>,
}

impl RevisionInfo {
    /// Create check-in information with the given author and log message
    pub fn new(author: impl Into<String>, log: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            log: log.into(),
            ..Default::default()
        }
    }

    /// Use a fixed timestamp instead of the current time
    pub fn at(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    /// Use an explicit state instead of the tree default
    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }
}

/// One entry of a revision log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionSummary {
    /// Revision number
    pub version: Version,
    /// Author of the revision
    pub author: String,
    /// Timestamp of the revision
    pub date: DateTime<Utc>,
    /// Revision state
    pub state: String,
    /// Log message
    pub log: String,
    /// Who holds a lock on the revision, if anyone
    pub locker: Option<String>,
    /// Branch identifiers forked at this revision
    pub branches: Vec<Version>,
}

/// Revision tree statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeStats {
    /// Total number of nodes
    pub total_revisions: usize,
    /// Nodes on the trunk
    pub trunk_revisions: usize,
    /// Nodes on branches
    pub branch_revisions: usize,
    /// Number of branches forked anywhere in the tree
    pub branches: usize,
    /// Placeholder revisions
    pub ghost_revisions: usize,
}
