//! Reconstruction paths
//!
//! A [`Path`] is the ordered list of nodes from the head to a target
//! revision, produced by [`RevisionTree::path_to`]. Patching a path seeds a
//! [`Lines`] buffer with the head's full text and applies every following
//! node's delta in order: first reverse deltas down the trunk, then forward
//! deltas out along the branches.
//!
//! ## Annotation
//!
//! When annotating, trunk lines need more than the path itself: a line in
//! revision `1.3` may date back to `1.1`. Once the trunk part of the path is
//! applied, the rest of the trunk below it is walked down to the first
//! revision. Each line a reverse delta drops along the way was introduced
//! by the revision just above that delta; lines that survive to the bottom
//! come from the first revision. Branch deltas then attribute whatever they
//! insert to their own revision.

use crate::error::{RcsError, Result};
use crate::lines::Lines;
use crate::node::{Node, NodeId};
use crate::tree::RevisionTree;
use crate::version::Version;
use tracing::trace;

/// Ordered nodes from the head to a target revision
#[derive(Debug, Clone)]
pub struct Path<'t> {
    tree: &'t RevisionTree,
    nodes: Vec<NodeId>,
}

impl<'t> Path<'t> {
    pub(crate) fn new(tree: &'t RevisionTree) -> Self {
        Self {
            tree,
            nodes: Vec::new(),
        }
    }

    /// Append a node
    pub fn add(&mut self, node: NodeId) {
        self.nodes.push(node);
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node handles in path order
    pub fn ids(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Nodes in path order
    pub fn nodes(&self) -> impl Iterator<Item = &'t Node> + '_ {
        let tree = self.tree;
        self.nodes.iter().map(move |&id| tree.node(id))
    }

    /// The node the path ends at
    pub fn last(&self) -> Option<&'t Node> {
        self.nodes.last().map(|&id| self.tree.node(id))
    }

    /// Versions in path order
    pub fn versions(&self) -> Vec<Version> {
        self.nodes().map(|n| n.version().clone()).collect()
    }

    /// Whether the path ends at `target`
    ///
    /// A revision matches exactly. A branch identifier such as `1.3.1` (or
    /// `1` for the trunk) matches the latest revision on that line.
    pub fn resolves_to(&self, target: &Version) -> bool {
        match self.last() {
            None => false,
            Some(node) if target.is_revision() => node.version() == target,
            Some(node) => {
                let version = node.version();
                version.len() == target.len() + 1 && version.base(target.len()) == *target
            }
        }
    }

    /// Reconstruct the text of the last node
    ///
    /// # Errors
    ///
    /// - [`RcsError::InvalidFileFormat`] if the path does not start at a
    ///   trunk node or a delta cannot be parsed
    /// - [`RcsError::PatchFailed`] if a delta does not apply; no partial
    ///   text is returned
    pub fn patch(&self, annotate: bool) -> Result<Lines> {
        let mut lines = Lines::new();
        self.patch_into(&mut lines, annotate)?;
        Ok(lines)
    }

    /// Reconstruct into an existing buffer, replacing its content
    pub fn patch_into(&self, lines: &mut Lines, annotate: bool) -> Result<()> {
        let mut ids = self.nodes.iter().copied();
        let head_id = ids
            .next()
            .ok_or_else(|| RcsError::format("cannot patch an empty revision path"))?;
        let head = self.tree.node(head_id);
        if !head.is_trunk() {
            return Err(RcsError::format(format!(
                "revision path starts at branch revision {} instead of the head",
                head.version()
            )));
        }

        head.patch0(lines);
        let mut last_trunk = head_id;
        let mut origins_resolved = false;

        for id in ids {
            let node = self.tree.node(id);
            if annotate && !origins_resolved && node.is_branch() {
                self.resolve_trunk_origins(last_trunk, lines)?;
                origins_resolved = true;
            }
            if node.is_ghost() {
                trace!("Skipping ghost revision {}", node.version());
                continue;
            }
            trace!("Applying delta of {}", node.version());
            node.patch(lines)?;
            if node.is_trunk() {
                last_trunk = id;
            }
        }

        if annotate && !origins_resolved {
            self.resolve_trunk_origins(last_trunk, lines)?;
        }
        Ok(())
    }

    /// Attribute every line of `lines`, which hold the text of trunk node
    /// `from`, to the trunk revision that introduced it
    fn resolve_trunk_origins(&self, from: NodeId, lines: &mut Lines) -> Result<()> {
        let mut above = self.tree.node(from);
        let mut work: Vec<Option<usize>> = (0..lines.len()).map(Some).collect();
        let mut cursor = above.parent();

        while let Some(id) = cursor {
            let node = self.tree.node(id);
            cursor = node.parent();
            if node.is_ghost() {
                continue;
            }

            let introduced_by = above.revision_arc().clone();
            let script = node.edit_script()?;
            work = script
                .apply(
                    work,
                    |_| None,
                    |gone| {
                        if let Some(index) = gone {
                            lines.attribute(index, introduced_by.clone());
                        }
                    },
                )
                .map_err(|err| node.patch_failed(err))?;
            above = node;
        }

        for index in work.into_iter().flatten() {
            lines.attribute(index, above.revision_arc().clone());
        }
        Ok(())
    }
}
