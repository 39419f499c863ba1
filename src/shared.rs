//! Thread-safe handle to a revision tree
//!
//! Reconstruction only reads the tree, so any number of threads may rebuild
//! revisions at once. Check-ins take the write lock and are serialised.

use crate::error::Result;
use crate::lines::Lines;
use crate::tree::RevisionTree;
use crate::types::RevisionInfo;
use crate::version::Version;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

/// Cloneable, shareable [`RevisionTree`]
///
/// # Examples
///
/// ```rust
/// use rcstree::{RevisionInfo, RevisionTree, SharedRevisionTree, Version};
///
/// let shared = SharedRevisionTree::new(RevisionTree::new());
/// shared.add_revision("hello\n", None, RevisionInfo::new("alice", "start"))?;
///
/// let reader = shared.clone();
/// let text = std::thread::spawn(move || {
///     reader.revision_text(&Version::parse("1.1").unwrap(), false)
/// })
/// .join()
/// .unwrap()?;
/// assert_eq!(text.to_string(), "hello\n");
/// # Ok::<(), rcstree::RcsError>(())
/// ```
#[derive(Debug, Clone)]
pub struct SharedRevisionTree {
    inner: Arc<RwLock<RevisionTree>>,
}

impl SharedRevisionTree {
    pub fn new(tree: RevisionTree) -> Self {
        Self {
            inner: Arc::new(RwLock::new(tree)),
        }
    }

    /// Reconstruct `target` under a read lock
    pub fn revision_text(&self, target: &Version, annotate: bool) -> Result<Lines> {
        self.inner.read().revision_text(target, annotate)
    }

    /// Check in a new revision under the write lock
    pub fn add_revision(
        &self,
        text: &str,
        base: Option<&Version>,
        info: RevisionInfo,
    ) -> Result<Version> {
        self.inner.write().add_revision(text, base, info)
    }

    pub fn contains(&self, target: &Version) -> bool {
        self.inner.read().contains(target)
    }

    /// Borrow the tree for several reads in a row
    pub fn read(&self) -> RwLockReadGuard<'_, RevisionTree> {
        self.inner.read()
    }

    /// Borrow the tree exclusively
    pub fn write(&self) -> RwLockWriteGuard<'_, RevisionTree> {
        self.inner.write()
    }
}

impl From<RevisionTree> for SharedRevisionTree {
    fn from(tree: RevisionTree) -> Self {
        Self::new(tree)
    }
}
