//! # rcstree - RCS revision trees in memory
//!
//! The core of an RCS archive: revision numbers, the tree of revisions that
//! an archive stores, and reconstruction of any revision's text from the
//! deltas the tree holds.
//!
//! ## Overview
//!
//! An RCS archive keeps the newest trunk revision (the *head*) as full text.
//! Every other revision is stored as an edit script relative to a neighbour:
//!
//! - Older trunk revisions hold *reverse* deltas, turning the text of the
//!   next newer trunk revision into their own
//! - Branch revisions hold *forward* deltas, turning the text of the
//!   revision before them into their own
//!
//! Getting the text of a revision means walking from the head to it and
//! applying every delta on the way. rcstree does that walk, optionally
//! tagging each line with the revision that introduced it (annotation, as
//! in `rcs annotate`).
//!
//! ## Quick Start
//!
//! ```rust
//! use rcstree::{RevisionInfo, RevisionTree, Version};
//!
//! # fn main() -> rcstree::Result<()> {
//! let mut tree = RevisionTree::new();
//! tree.add_revision("hello\n", None, RevisionInfo::new("alice", "initial"))?;
//! tree.add_revision("hello\nworld\n", None, RevisionInfo::new("bob", "greet"))?;
//!
//! // 1.2 is the head; 1.1 is rebuilt from a reverse delta
//! let old = tree.revision_text(&Version::parse("1.1")?, false)?;
//! assert_eq!(old.to_string(), "hello\n");
//!
//! // who wrote what
//! let annotated = tree.revision_text(&Version::parse("1.2")?, true)?;
//! let origins: Vec<String> = annotated
//!     .iter()
//!     .map(|line| line.revision().unwrap().version.to_string())
//!     .collect();
//! assert_eq!(origins, vec!["1.1", "1.2"]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Building a Tree from an Archive
//!
//! Archive parsers create the nodes they read and link them explicitly:
//!
//! ```rust
//! use rcstree::{Node, Revision, RevisionTree, Version};
//!
//! # fn main() -> rcstree::Result<()> {
//! let mut tree = RevisionTree::new();
//! let head = tree.insert(Node::trunk(
//!     Revision::new(Version::parse("1.2")?, "bob"),
//!     vec!["a".into(), "b".into()],
//! )?)?;
//! let first = tree.insert(Node::trunk(
//!     Revision::new(Version::parse("1.1")?, "alice"),
//!     vec!["d2 1".into()],
//! )?)?;
//! tree.set_head(head)?;
//! tree.attach_next(head, Some(first))?;
//!
//! let text = tree.revision_text(&Version::parse("1.1")?, false)?;
//! assert_eq!(text.texts(), vec!["a"]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Key Concepts
//!
//! ### Revision Numbers
//!
//! [`Version`] is a dotted sequence of numbers. An even number of components
//! names a revision (`1.3`, `1.3.2.1`), an odd number names a branch
//! (`1.3.2`) or the trunk (`1`). Versions with a zero component are *ghosts*:
//! placeholders that keep their place in the tree but carry no text.
//!
//! ### Paths
//!
//! [`Path`] is the chain of nodes from the head to a target, built by asking
//! each node which neighbour leads on towards the target.
//!
//! ## Error Handling
//!
//! All operations return `Result<T, RcsError>`. Errors distinguish malformed
//! revision numbers, missing revisions or branches, and corrupt archive
//! data; see [`RcsError::is_corruption`].
//!
//! ## Module Organization
//!
//! - [`version`]: Revision numbers and their orderings
//! - [`delta`]: RCS edit scripts
//! - [`lines`]: Reconstructed, annotatable text
//! - [`node`]: Revisions and navigation between them
//! - [`path`]: Reconstruction along a path
//! - [`tree`]: The revision tree and check-ins
//! - [`shared`]: Thread-safe tree handle
//! - [`types`]: Configuration and reporting types
//! - [`error`]: Error types and handling

// Public API modules
pub mod delta;
pub mod error;
pub mod lines;
pub mod node;
pub mod path;
pub mod shared;
pub mod tree;
pub mod types;
pub mod version;

// Internal modules (not part of public API)
mod intern;

// Re-export main types for convenience
pub use delta::{EditCommand, EditScript};
pub use error::{RcsError, Result};
pub use lines::{Line, Lines};
pub use node::{Node, NodeId, NodeKind, Revision};
pub use path::Path;
pub use shared::SharedRevisionTree;
pub use tree::{RevisionTree, RevisionTreeBuilder};
pub use types::*;
pub use version::Version;
