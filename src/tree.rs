//! The revision tree of one archived file
//!
//! [`RevisionTree`] owns every [`Node`] of an archive in an arena and keeps
//! the links between them consistent. An archive loader builds a tree with
//! [`insert`](RevisionTree::insert), [`attach_next`](RevisionTree::attach_next),
//! [`add_branch`](RevisionTree::add_branch) and
//! [`set_head`](RevisionTree::set_head); new revisions are checked in with
//! [`add_revision`](RevisionTree::add_revision).
//!
//! ## Examples
//!
//! ```rust
//! use rcstree::{RevisionTree, RevisionInfo, Version};
//!
//! let mut tree = RevisionTree::new();
//! tree.add_revision("one\n", None, RevisionInfo::new("alice", "initial"))?;
//! tree.add_revision("one\ntwo\n", None, RevisionInfo::new("alice", "more"))?;
//!
//! let first = tree.revision_text(&Version::parse("1.1")?, false)?;
//! assert_eq!(first.to_string(), "one\n");
//!
//! // branch off the first revision
//! let branch = tree.add_revision(
//!     "one\nthree\n",
//!     Some(&Version::parse("1.1")?),
//!     RevisionInfo::new("bob", "experiment"),
//! )?;
//! assert_eq!(branch.to_string(), "1.1.1.1");
//! # Ok::<(), rcstree::RcsError>(())
//! ```

use crate::delta::EditScript;
use crate::error::{RcsError, Result};
use crate::lines::{split_text, Lines};
use crate::node::{Node, NodeId, NodeKind, Revision};
use crate::path::Path;
use crate::types::{RevisionInfo, RevisionSummary, TreeConfig, TreeStats};
use crate::version::Version;
use chrono::Utc;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, trace};

/// Arena of revision nodes with a head and a version index
///
/// The index is ordered by [`Version`]'s storage order, so iteration yields
/// trunk revisions newest first, followed by branch revisions.
///
/// # Thread Safety
///
/// `RevisionTree` is not synchronised. Wrap it in
/// [`SharedRevisionTree`](crate::shared::SharedRevisionTree) to reconstruct
/// revisions from several threads while others check in.
#[derive(Debug, Clone, Default)]
pub struct RevisionTree {
    nodes: Vec<Node>,
    index: BTreeMap<Version, NodeId>,
    head: Option<NodeId>,
    config: TreeConfig,
}

impl RevisionTree {
    /// Create an empty tree with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty tree with the given configuration
    pub fn with_config(config: TreeConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Start building a tree
    pub fn builder() -> RevisionTreeBuilder {
        RevisionTreeBuilder::new()
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add a node to the arena, unlinked
    ///
    /// # Errors
    ///
    /// Returns [`RcsError::DuplicateRevision`] if a node with the same
    /// version already exists.
    pub fn insert(&mut self, node: Node) -> Result<NodeId> {
        if self.index.contains_key(node.version()) {
            return Err(RcsError::DuplicateRevision(node.version().clone()));
        }
        let id = NodeId(self.nodes.len());
        self.index.insert(node.version().clone(), id);
        debug!("Inserted revision {} as {}", node.version(), id);
        self.nodes.push(node);
        Ok(id)
    }

    /// Node by handle, if the handle belongs to this tree
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Node by handle, failing on a handle issued by another tree
    fn checked(&self, id: NodeId) -> Result<&Node> {
        self.get(id)
            .ok_or_else(|| RcsError::format(format!("node {} does not belong to this tree", id)))
    }

    /// Node by handle
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this tree.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Handle of the node with exactly this version
    pub fn find(&self, version: &Version) -> Option<NodeId> {
        self.index.get(version).copied()
    }

    /// Node with exactly this version
    pub fn find_node(&self, version: &Version) -> Option<&Node> {
        self.find(version).map(|id| self.node(id))
    }

    pub fn head_id(&self) -> Option<NodeId> {
        self.head
    }

    /// The head revision, holding full text
    pub fn head(&self) -> Option<&Node> {
        self.head.map(|id| self.node(id))
    }

    /// Designate the head revision
    ///
    /// # Errors
    ///
    /// - [`RcsError::HeadAlreadySet`] if a head was set before
    /// - [`RcsError::InvalidTrunkVersionNumber`] if `id` is a branch node
    /// - [`RcsError::InvalidFileFormat`] if `id` is not a node of this tree
    pub fn set_head(&mut self, id: NodeId) -> Result<()> {
        let node = self.checked(id)?;
        if self.head.is_some() {
            return Err(RcsError::HeadAlreadySet(node.version().clone()));
        }
        if !node.is_trunk() {
            return Err(RcsError::InvalidTrunkVersionNumber(node.version().clone()));
        }
        debug!("Head set to {}", node.version());
        self.head = Some(id);
        Ok(())
    }

    /// Set the "next" link of `id`, rewiring both ends
    ///
    /// For a trunk node `next` becomes its parent (the older revision) and
    /// the node becomes `next`'s child. For a branch node `next` becomes its
    /// child (the newer revision on the branch) and the node becomes
    /// `next`'s parent. Links replaced by this call are cleared on the other
    /// side as well, so the tree is never left half-linked.
    ///
    /// # Errors
    ///
    /// Returns [`RcsError::InvalidFileFormat`] if either handle is not a
    /// node of this tree, or if `next` is of a different kind than `id` or
    /// is `id` itself. Nothing is changed in that case.
    pub fn attach_next(&mut self, id: NodeId, next: Option<NodeId>) -> Result<()> {
        let node = self.checked(id)?;
        let kind = node.kind();
        if let Some(next) = next {
            let other = self.checked(next)?;
            if next == id || other.kind() != kind {
                return Err(RcsError::format(format!(
                    "cannot link revision {} to {}",
                    node.version(),
                    other.version()
                )));
            }
        }

        match kind {
            NodeKind::Trunk => {
                if let Some(old) = self.nodes[id.0].parent.take() {
                    if self.nodes[old.0].child == Some(id) {
                        self.nodes[old.0].child = None;
                    }
                }
                if let Some(next) = next {
                    if let Some(stale) = self.nodes[next.0].child.replace(id) {
                        if stale != id {
                            self.nodes[stale.0].parent = None;
                        }
                    }
                    self.nodes[id.0].parent = Some(next);
                }
            }
            NodeKind::Branch => {
                if let Some(old) = self.nodes[id.0].child.take() {
                    if self.nodes[old.0].parent == Some(id) {
                        self.nodes[old.0].parent = None;
                    }
                }
                if let Some(next) = next {
                    if let Some(stale) = self.nodes[next.0].parent.replace(id) {
                        if stale != id && self.nodes[stale.0].child == Some(next) {
                            self.nodes[stale.0].child = None;
                        }
                    }
                    self.nodes[id.0].child = Some(next);
                }
            }
        }

        trace!(
            "Linked {} -> {}",
            self.node(id).version(),
            next.map(|n| self.node(n).version().to_string())
                .unwrap_or_else(|| "nothing".to_string())
        );
        Ok(())
    }

    /// Register `root` as the first revision of a branch forked at `id`
    ///
    /// The branch digit is the component of `root`'s version right after
    /// `id`'s own components: `1.3.2.1` forked at `1.3` is branch 2.
    ///
    /// # Errors
    ///
    /// Returns [`RcsError::InvalidFileFormat`] if either handle is not a
    /// node of this tree, if `root` is not a branch revision growing out of
    /// `id`, or if that branch is already taken.
    pub fn add_branch(&mut self, id: NodeId, root: NodeId) -> Result<()> {
        let node = self.checked(id)?;
        let branch = self.checked(root)?;
        let depth = node.version().len();

        if !branch.is_branch()
            || branch.version().len() <= depth
            || branch.version().base(depth) != *node.version()
        {
            return Err(RcsError::format(format!(
                "revision {} cannot start a branch at {}",
                branch.version(),
                node.version()
            )));
        }
        let digit = branch.version().at(depth);
        if node.branch_root(digit).is_some() {
            return Err(RcsError::format(format!(
                "branch {} is already present",
                branch.version().base(depth + 1)
            )));
        }

        debug!("Branch {} forked at {}", branch.version().base(depth + 1), node.version());
        self.nodes[id.0].branches.insert(digit, root);
        self.nodes[root.0].parent = Some(id);
        Ok(())
    }

    /// Build the path from the head to `target`
    ///
    /// Walks from the head asking each node for the next one via
    /// [`Node::next_in_path_to`]. With `soft`, a missing revision ends the
    /// path early instead of failing; use [`Path::resolves_to`] to tell.
    ///
    /// # Errors
    ///
    /// - [`RcsError::NodeNotFound`] if the tree has no head, or (when not
    ///   `soft`) `target` does not exist
    /// - [`RcsError::BranchNotFound`] if (when not `soft`) `target` lies on
    ///   a missing branch
    /// - [`RcsError::InvalidFileFormat`] if the links form a cycle
    pub fn path_to(&self, target: &Version, soft: bool) -> Result<Path<'_>> {
        let mut current = self
            .head
            .ok_or_else(|| RcsError::NodeNotFound(target.clone()))?;
        let mut path = Path::new(self);

        loop {
            if path.len() > self.nodes.len() {
                return Err(RcsError::format(format!(
                    "revision links loop while looking for {}",
                    target
                )));
            }
            path.add(current);
            let node = self.node(current);
            match node.next_in_path_to(target, soft)? {
                Some(next) => {
                    trace!("{} -> {} on the way to {}", node.version(), self.node(next).version(), target);
                    current = next;
                }
                None => break,
            }
        }

        Ok(path)
    }

    /// Path to `target`, failing unless it ends exactly there
    ///
    /// # Errors
    ///
    /// As [`path_to`](Self::path_to); additionally
    /// [`RcsError::NodeNotFound`] when the walk stops short of `target`.
    pub fn revision_path(&self, target: &Version) -> Result<Path<'_>> {
        let path = self.path_to(target, false)?;
        if path.resolves_to(target) {
            Ok(path)
        } else {
            Err(RcsError::NodeNotFound(target.clone()))
        }
    }

    /// Whether `target` names an existing revision or branch
    pub fn contains(&self, target: &Version) -> bool {
        self.path_to(target, true)
            .map(|path| path.resolves_to(target))
            .unwrap_or(false)
    }

    /// Reconstruct the text of `target`
    ///
    /// `target` may be a revision or a branch identifier, which selects the
    /// latest revision on that branch. With `annotate`, every line is
    /// attributed to the revision that introduced it.
    ///
    /// # Errors
    ///
    /// - [`RcsError::NodeNotFound`] / [`RcsError::BranchNotFound`] if
    ///   `target` does not exist
    /// - [`RcsError::PatchFailed`] / [`RcsError::InvalidFileFormat`] if the
    ///   stored deltas are corrupt
    #[instrument(skip(self))]
    pub fn revision_text(&self, target: &Version, annotate: bool) -> Result<Lines> {
        let path = self.revision_path(target)?;
        debug!("Reconstructing {} through {} revisions", target, path.len());
        path.patch(annotate)
    }

    /// Reconstruct `target` and render it with the tree's annotation layout
    pub fn annotate(&self, target: &Version) -> Result<Vec<String>> {
        Ok(self
            .revision_text(target, true)?
            .to_array_with(&self.config, true))
    }

    /// Check in a new revision and return its version
    ///
    /// Where the revision lands depends on `base`:
    ///
    /// - empty tree: `1.1`, holding the full text
    /// - `None`, the head, or the trunk identifier: the next trunk revision
    ///   becomes the head and the old head is turned into a reverse delta
    /// - a major number above the head's (`2` while the head is `1.4`): a
    ///   new head `2.1`
    /// - the tip of a branch, or a branch identifier: the next revision on
    ///   that branch
    /// - any other revision: the first revision of a new branch forked there
    ///
    /// # Errors
    ///
    /// - [`RcsError::NodeNotFound`] / [`RcsError::BranchNotFound`] if `base`
    ///   does not exist, or is a ghost
    /// - [`RcsError::InvalidVersionNumber`] if the new revision number or
    ///   branch digit would pass `u32::MAX`
    /// - reconstruction errors of the base revision
    #[instrument(skip(self, text, info), fields(author = %info.author))]
    pub fn add_revision(
        &mut self,
        text: &str,
        base: Option<&Version>,
        info: RevisionInfo,
    ) -> Result<Version> {
        let new_text = split_text(text);

        let Some(head_id) = self.head else {
            let version = base
                .filter(|b| b.len() == 2 && !b.is_ghost())
                .cloned()
                .unwrap_or_else(|| Version::trunk(1, 1));
            let node = Node::trunk(self.revision_for(version.clone(), info), new_text)?;
            let id = self.insert(node)?;
            self.set_head(id)?;
            info!("Created initial revision {}", version);
            return Ok(version);
        };

        let head_version = self.node(head_id).version().clone();
        let base = base.cloned().unwrap_or_else(|| head_version.clone());
        if base.is_ghost() {
            return Err(RcsError::NodeNotFound(base));
        }

        if base.len() == 1 && base.is_greater_than(&head_version.base(1)) {
            let version = base.new_branch(1);
            self.push_head(version.clone(), new_text, info)?;
            return Ok(version);
        }

        let (target_id, base_text) = {
            let path = self.revision_path(&base)?;
            let target_id = *path.ids().last().ok_or_else(|| RcsError::NodeNotFound(base.clone()))?;
            let base_text = if target_id == head_id {
                None
            } else {
                Some(path.patch(false)?)
            };
            (target_id, base_text)
        };

        let Some(base_text) = base_text else {
            let version = head_version.next()?;
            self.push_head(version.clone(), new_text, info)?;
            return Ok(version);
        };

        let target = self.node(target_id);
        let (version, extends_branch) = if target.is_branch() && target.child().is_none() {
            (target.version().next()?, true)
        } else {
            let digit = match target.branches().keys().next_back() {
                Some(&last) => last.checked_add(1).ok_or_else(|| {
                    RcsError::InvalidVersionNumber(format!(
                        "no branch digit left at {}",
                        target.version()
                    ))
                })?,
                None => 1,
            };
            (target.version().new_branch(digit).new_branch(1), false)
        };

        let old: Vec<&str> = base_text.texts();
        let new: Vec<&str> = new_text.iter().map(String::as_str).collect();
        let forward = EditScript::compute(&old, &new);

        let node = Node::branch(self.revision_for(version.clone(), info), forward.to_lines())?;
        let id = self.insert(node)?;
        if extends_branch {
            self.attach_next(target_id, Some(id))?;
        } else {
            self.add_branch(target_id, id)?;
        }

        info!("Checked in {} on top of {}", version, self.node(target_id).version());
        Ok(version)
    }

    /// Make `version` the new head holding `text`, demoting the old head to
    /// a reverse delta
    fn push_head(&mut self, version: Version, text: Vec<String>, info: RevisionInfo) -> Result<()> {
        let old_head = self
            .head
            .ok_or_else(|| RcsError::NodeNotFound(version.clone()))?;

        let reverse = {
            let old_text: Vec<&str> = self.node(old_head).text().iter().map(String::as_str).collect();
            let new_text: Vec<&str> = text.iter().map(String::as_str).collect();
            EditScript::compute(&new_text, &old_text)
        };

        let node = Node::trunk(self.revision_for(version.clone(), info), text)?;
        let id = self.insert(node)?;
        self.nodes[old_head.0].set_text(reverse.to_lines());
        self.attach_next(id, Some(old_head))?;
        self.head = Some(id);

        info!("Checked in {} as the new head", version);
        Ok(())
    }

    fn revision_for(&self, version: Version, info: RevisionInfo) -> Revision {
        Revision::new(version, info.author)
            .with_date(info.date.unwrap_or_else(Utc::now))
            .with_state(info.state.unwrap_or_else(|| self.config.default_state.clone()))
            .with_log(info.log)
    }

    /// Every node in storage order
    pub fn revisions(&self) -> impl Iterator<Item = &Node> + '_ {
        self.index.values().map(|&id| self.node(id))
    }

    /// A log entry for every revision, in storage order
    pub fn log(&self) -> Vec<RevisionSummary> {
        self.revisions()
            .map(|node| {
                let rev = node.revision();
                RevisionSummary {
                    version: rev.version.clone(),
                    author: rev.author.clone(),
                    date: rev.date,
                    state: rev.state.clone(),
                    log: rev.log.clone(),
                    locker: rev.locker.clone(),
                    branches: node
                        .branches()
                        .keys()
                        .map(|&digit| rev.version.new_branch(digit))
                        .collect(),
                }
            })
            .collect()
    }

    /// Get tree statistics
    pub fn stats(&self) -> TreeStats {
        let trunk_revisions = self.nodes.iter().filter(|n| n.is_trunk()).count();
        TreeStats {
            total_revisions: self.nodes.len(),
            trunk_revisions,
            branch_revisions: self.nodes.len() - trunk_revisions,
            branches: self.nodes.iter().map(|n| n.branches().len()).sum(),
            ghost_revisions: self.nodes.iter().filter(|n| n.is_ghost()).count(),
        }
    }
}

/// Builder for creating revision trees with custom configuration
///
/// # Examples
///
/// ```rust
/// use rcstree::RevisionTreeBuilder;
///
/// let tree = RevisionTreeBuilder::new()
///     .eol("\r\n")
///     .default_state("Rel")
///     .build()?;
/// assert_eq!(tree.config().eol, "\r\n");
/// # Ok::<(), rcstree::RcsError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct RevisionTreeBuilder {
    config: TreeConfig,
}

impl RevisionTreeBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: TreeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the line terminator used when rendering text
    pub fn eol(mut self, eol: impl Into<String>) -> Self {
        self.config.eol = eol.into();
        self
    }

    /// Set the `chrono` format of dates in annotated output
    pub fn annotation_date_format(mut self, format: impl Into<String>) -> Self {
        self.config.annotation_date_format = format.into();
        self
    }

    /// Set the column widths of revision and author in annotated output
    pub fn annotation_widths(mut self, version: usize, author: usize) -> Self {
        self.config.annotation_version_width = version;
        self.config.annotation_author_width = author;
        self
    }

    /// Set the state of checked-in revisions that do not name one
    pub fn default_state(mut self, state: impl Into<String>) -> Self {
        self.config.default_state = state.into();
        self
    }

    /// Build an empty tree
    ///
    /// # Errors
    ///
    /// Returns [`RcsError::InvalidConfig`] if the configuration does not pass
    /// [`TreeConfig::validate`].
    pub fn build(self) -> Result<RevisionTree> {
        self.config.validate()?;
        Ok(RevisionTree::with_config(self.config))
    }
}
