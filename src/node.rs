//! Revision tree nodes
//!
//! A [`Node`] is one revision of the archived file. Nodes come in two kinds
//! that store their text in opposite directions:
//!
//! - **Trunk** nodes (`1.4`, `2.1`) hold *reverse* deltas: applied to the
//!   text of the next newer trunk revision, the delta yields this
//!   revision's text. The newest trunk node, the head, holds full text.
//! - **Branch** nodes (`1.3.1.1`) hold *forward* deltas: applied to the text
//!   of the revision before them on the branch (or of the revision the
//!   branch forked from), the delta yields this revision's text.
//!
//! ```text
//!   1.3 (head, full text)
//!    │ parent
//!   1.2 ──branch 1──▶ 1.2.1.1 ──child──▶ 1.2.1.2
//!    │ parent
//!   1.1
//! ```
//!
//! Nodes link to each other by [`NodeId`], an index into the arena owned by
//! [`RevisionTree`](crate::tree::RevisionTree). The parent link is a plain
//! back-reference.

use crate::delta::{DeltaMismatch, EditScript};
use crate::error::{RcsError, Result};
use crate::lines::{Line, Lines};
use crate::version::Version;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Handle of a node inside its tree's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Position of the node in the arena
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which way a node's delta points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Trunk revision holding a reverse delta
    Trunk,
    /// Branch revision holding a forward delta
    Branch,
}

/// Descriptive data of a revision
///
/// Shared between a node and every [`Line`] attributed to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    /// Revision number
    pub version: Version,
    /// Commit timestamp
    pub date: DateTime<Utc>,
    /// Author login
    pub author: String,
    /// State, `Exp` unless set otherwise
    pub state: String,
    /// Log message
    pub log: String,
    /// Holder of a lock on this revision
    pub locker: Option<String>,
}

impl Revision {
    /// Create revision data dated now
    pub fn new(version: Version, author: impl Into<String>) -> Self {
        Self {
            version,
            date: Utc::now(),
            author: author.into(),
            state: "Exp".to_string(),
            log: String::new(),
            locker: None,
        }
    }

    /// Set the timestamp
    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = date;
        self
    }

    /// Set the state
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = state.into();
        self
    }

    /// Set the log message
    pub fn with_log(mut self, log: impl Into<String>) -> Self {
        self.log = log.into();
        self
    }

    /// Record a lock holder
    pub fn with_locker(mut self, locker: impl Into<String>) -> Self {
        self.locker = Some(locker.into());
        self
    }
}

/// A revision in the tree
#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    revision: Arc<Revision>,
    text: Vec<String>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) child: Option<NodeId>,
    pub(crate) branches: BTreeMap<u32, NodeId>,
}

impl Node {
    /// Create a trunk node
    ///
    /// `text` is the full text when the node becomes the head and a reverse
    /// edit script otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`RcsError::InvalidTrunkVersionNumber`] unless the version
    /// has one or two components.
    pub fn trunk(revision: Revision, text: Vec<String>) -> Result<Self> {
        if !revision.version.is_trunk() {
            return Err(RcsError::InvalidTrunkVersionNumber(revision.version));
        }
        Ok(Self::with_kind(NodeKind::Trunk, revision, text))
    }

    /// Create a branch node holding a forward edit script
    ///
    /// # Errors
    ///
    /// Returns [`RcsError::InvalidBranchVersionNumber`] unless the version
    /// has more than two components.
    pub fn branch(revision: Revision, text: Vec<String>) -> Result<Self> {
        if !revision.version.is_branch() {
            return Err(RcsError::InvalidBranchVersionNumber(revision.version));
        }
        Ok(Self::with_kind(NodeKind::Branch, revision, text))
    }

    /// Create a trunk or branch node, whichever the version's length calls for
    pub fn new(revision: Revision, text: Vec<String>) -> Result<Self> {
        if revision.version.is_branch() {
            Self::branch(revision, text)
        } else {
            Self::trunk(revision, text)
        }
    }

    fn with_kind(kind: NodeKind, revision: Revision, text: Vec<String>) -> Self {
        Self {
            kind,
            revision: Arc::new(revision),
            text,
            parent: None,
            child: None,
            branches: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is_trunk(&self) -> bool {
        self.kind == NodeKind::Trunk
    }

    pub fn is_branch(&self) -> bool {
        self.kind == NodeKind::Branch
    }

    pub fn version(&self) -> &Version {
        &self.revision.version
    }

    pub fn revision(&self) -> &Revision {
        &self.revision
    }

    pub(crate) fn revision_arc(&self) -> &Arc<Revision> {
        &self.revision
    }

    /// Whether this is a placeholder revision
    pub fn is_ghost(&self) -> bool {
        self.revision.version.is_ghost()
    }

    /// Stored text: full text for the head, an edit script otherwise
    pub fn text(&self) -> &[String] {
        &self.text
    }

    pub(crate) fn set_text(&mut self, text: Vec<String>) {
        self.text = text;
    }

    /// The node below this one: the older trunk revision, or the revision a
    /// branch grows from
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The node above this one: the newer trunk revision, or the next
    /// revision on the same branch
    pub fn child(&self) -> Option<NodeId> {
        self.child
    }

    /// Root of the branch with the given digit forked at this node
    pub fn branch_root(&self, digit: u32) -> Option<NodeId> {
        self.branches.get(&digit).copied()
    }

    /// All branches forked at this node, by digit
    pub fn branches(&self) -> &BTreeMap<u32, NodeId> {
        &self.branches
    }

    /// The link followed when walking away from the head
    ///
    /// For trunk nodes this is the parent (older revision); for branch
    /// nodes it is the child (newer revision on the branch).
    pub fn next(&self) -> Option<NodeId> {
        match self.kind {
            NodeKind::Trunk => self.parent,
            NodeKind::Branch => self.child,
        }
    }

    /// Decide the next node on the way to `target`
    ///
    /// Returns `Ok(None)` when this node ends the path. With `soft`, a
    /// missing revision or branch also ends the path instead of failing,
    /// which lets callers check for existence.
    ///
    /// # Errors
    ///
    /// - [`RcsError::NodeNotFound`] if `target` cannot be on the chain
    ///   through this node
    /// - [`RcsError::BranchNotFound`] if `target` lies on a branch this node
    ///   does not have
    pub fn next_in_path_to(&self, target: &Version, soft: bool) -> Result<Option<NodeId>> {
        match self.kind {
            NodeKind::Trunk => self.next_on_trunk(target, soft),
            NodeKind::Branch => self.next_on_branch(target, soft),
        }
    }

    fn next_on_trunk(&self, target: &Version, soft: bool) -> Result<Option<NodeId>> {
        let version = self.version();
        let branch_point = target.base(2);
        let this = version.base(branch_point.len());

        if this.is_less_than(&branch_point) {
            return not_found(target, soft);
        }
        if this.is_greater_than(&branch_point) {
            return match self.parent {
                Some(parent) => Ok(Some(parent)),
                None => not_found(target, soft),
            };
        }
        if target.len() > version.len() {
            return self.branch_toward(target, soft);
        }
        Ok(None)
    }

    fn next_on_branch(&self, target: &Version, soft: bool) -> Result<Option<NodeId>> {
        let version = self.version();
        let branch_point = target.base(version.len());
        let this = version.base(branch_point.len());

        if this.is_greater_than(&branch_point) {
            return not_found(target, soft);
        }
        if version == target {
            return Ok(None);
        }
        if this.is_less_than(&branch_point) {
            return match self.child {
                Some(child) => Ok(Some(child)),
                None => not_found(target, soft),
            };
        }
        if target.len() > version.len() {
            return self.branch_toward(target, soft);
        }
        // target names this branch: run to its tip
        Ok(self.child)
    }

    fn branch_toward(&self, target: &Version, soft: bool) -> Result<Option<NodeId>> {
        let depth = self.version().len();
        match self.branch_root(target.at(depth)) {
            Some(root) => Ok(Some(root)),
            None if soft => Ok(None),
            None => Err(RcsError::BranchNotFound(target.base(depth + 1))),
        }
    }

    /// Parse the stored edit script
    ///
    /// # Errors
    ///
    /// Returns [`RcsError::InvalidFileFormat`] naming this revision when the
    /// stored text is not a valid script.
    pub fn edit_script(&self) -> Result<EditScript> {
        EditScript::parse(&self.text).map_err(|err| match err {
            RcsError::InvalidFileFormat(msg) => {
                RcsError::format(format!("delta of revision {}: {}", self.version(), msg))
            }
            other => other,
        })
    }

    /// Seed `lines` with this node's full text
    pub fn patch0(&self, lines: &mut Lines) {
        let seeded = self
            .text
            .iter()
            .map(|text| Line::new(Some(self.revision.clone()), text.as_str()));
        lines.replace(seeded.collect());
    }

    /// Apply this node's delta to `lines`
    ///
    /// Inserted lines are attributed to this revision. For trunk nodes that
    /// attribution is provisional until the path resolves line origins.
    ///
    /// # Errors
    ///
    /// Returns [`RcsError::PatchFailed`] if the delta does not fit `lines`,
    /// which are left empty, or [`RcsError::InvalidFileFormat`] if the
    /// delta cannot be parsed.
    pub fn patch(&self, lines: &mut Lines) -> Result<()> {
        let script = self.edit_script()?;
        let current = lines.take();
        let patched = script
            .apply(current, |text| Line::new(Some(self.revision.clone()), text), drop)
            .map_err(|err| self.patch_failed(err))?;
        lines.replace(patched);
        Ok(())
    }

    pub(crate) fn patch_failed(&self, err: DeltaMismatch) -> RcsError {
        warn!("Delta of revision {} does not apply: {}", self.version(), err);
        RcsError::PatchFailed(self.version().clone())
    }
}

fn not_found(target: &Version, soft: bool) -> Result<Option<NodeId>> {
    if soft {
        Ok(None)
    } else {
        Err(RcsError::NodeNotFound(target.clone()))
    }
}
