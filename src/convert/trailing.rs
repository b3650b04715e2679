//! Trailing-block analysis.
//!
//! Separators go between sibling blocks, never after the last one. Before a
//! container renders its children, [`LastMarks::mark_container`] finds the
//! block that closes the container and records it; the paragraph, listing,
//! list, and admonition rules then leave out their `<empty-line/>`.

use std::collections::HashSet;

use crate::document::{DocumentTree, NodeId, NodeKind};

/// Role that suppresses a block's trailing separator.
pub const LAST_ROLE: &str = "last";

/// Set of blocks that close their container.
///
/// Marks are a set, so analysing a container again leaves them unchanged.
#[derive(Debug, Default, Clone)]
pub struct LastMarks {
    marked: HashSet<NodeId>,
}

impl LastMarks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the closing block of `container`, if it takes a separator.
    pub fn mark_container(&mut self, tree: &DocumentTree, container: NodeId) {
        if let Some(last) = find_last_block(tree, container) {
            self.marked.insert(last);
        }
    }

    /// Whether `id` was marked or already carries the `last` role.
    pub fn is_last(&self, tree: &DocumentTree, id: NodeId) -> bool {
        self.marked.contains(&id)
            || tree
                .node(id)
                .is_some_and(|node| node.has_role(LAST_ROLE))
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.marked.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.marked.is_empty()
    }
}

/// Last block child that produces output. Table-of-contents markers, page
/// breaks, and unknown kinds render nothing and are passed over.
fn last_rendered_block(tree: &DocumentTree, container: NodeId) -> Option<NodeId> {
    tree.children(container).rev().find(|&child| {
        tree.node(child).is_some_and(|node| {
            !node.kind.is_inline()
                && !matches!(
                    node.kind,
                    NodeKind::Toc | NodeKind::PageBreak | NodeKind::Unknown(_)
                )
        })
    })
}

/// Follow the chain of last children through nested sections down to the
/// block that closes `container`, and return it if it takes a separator.
pub fn find_last_block(tree: &DocumentTree, container: NodeId) -> Option<NodeId> {
    let mut current = last_rendered_block(tree, container)?;
    loop {
        let node = tree.node(current)?;
        match node.kind {
            NodeKind::Section { .. } => match last_rendered_block(tree, current) {
                Some(next) => current = next,
                None => return None,
            },
            ref kind if kind.emits_separator() => return Some(current),
            _ => return None,
        }
    }
}
