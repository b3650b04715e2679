//! Input document tree.
//!
//! The converter consumes an already-parsed document: an arena of [`Node`]s
//! addressed by [`NodeId`], with the root document always at
//! [`NodeId::ROOT`]. Nodes keep their ordered children and a parent link, so
//! the converter never has to search upwards for the document root.
//!
//! # Example
//!
//! ```
//! use kniga::document::{DocumentTree, Node, NodeId, NodeKind};
//!
//! let mut tree = DocumentTree::new("Hello Book");
//! let para = tree.add_child(NodeId::ROOT, Node::new(NodeKind::Paragraph));
//! tree.add_child(para, Node::text("Hello"));
//!
//! assert_eq!(tree.children(NodeId::ROOT).count(), 1);
//! ```

#[cfg(feature = "json")]
pub mod json;
mod node;

use std::path::{Path, PathBuf};

pub use node::{
    AdmonitionKind, AnchorKind, CellSpec, CellStyle, HAlign, Node, NodeId, NodeKind, QuoteKind,
    RowGroup, VAlign,
};

/// Document type; decides whether top-level sections become FB2 sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "snake_case"))]
pub enum Doctype {
    #[default]
    Article,
    Book,
}

/// An author from the document header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(default))]
pub struct DocumentAuthor {
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

impl DocumentAuthor {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: Some(first_name.into()),
            last_name: Some(last_name.into()),
            ..Default::default()
        }
    }

    pub fn with_middle_name(mut self, middle_name: impl Into<String>) -> Self {
        self.middle_name = Some(middle_name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// A parsed document ready for conversion.
#[derive(Debug, Clone)]
pub struct DocumentTree {
    /// All nodes in the tree (index 0 is always the root document).
    nodes: Vec<Node>,
    /// Authors from the document header, in source order.
    pub authors: Vec<DocumentAuthor>,
    pub doctype: Doctype,
    /// Directory the source document lives in; images are resolved against it.
    pub base_dir: PathBuf,
}

impl DocumentTree {
    /// Create a tree whose root document carries the given title.
    pub fn new(title: impl Into<String>) -> Self {
        let mut tree = Self::untitled();
        tree.nodes[0].title = Some(title.into());
        tree
    }

    /// Create a tree without a document title.
    pub fn untitled() -> Self {
        Self {
            nodes: vec![Node::new(NodeKind::Document)],
            authors: Vec::new(),
            doctype: Doctype::default(),
            base_dir: PathBuf::from("."),
        }
    }

    pub fn with_doctype(mut self, doctype: Doctype) -> Self {
        self.doctype = doctype;
        self
    }

    pub fn with_base_dir(mut self, base_dir: impl AsRef<Path>) -> Self {
        self.base_dir = base_dir.as_ref().to_path_buf();
        self
    }

    pub fn with_author(mut self, author: DocumentAuthor) -> Self {
        self.authors.push(author);
        self
    }

    /// Set a document-level attribute.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.nodes[0].attributes.insert(name.into(), value.into());
        self
    }

    /// Set a document-level attribute in place.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.nodes[0].attributes.insert(name.into(), value.into());
    }

    /// Document title (doctitle).
    pub fn title(&self) -> Option<&str> {
        self.nodes[0].title.as_deref()
    }

    /// The root document node.
    pub fn root(&self) -> &Node {
        &self.nodes[0]
    }

    /// A document-level attribute.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.nodes[0].attr(name)
    }

    /// Get a node by ID.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)
    }

    /// Get a mutable node by ID.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0 as usize)
    }

    /// Get the number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Allocate a new node and return its ID.
    pub fn alloc_node(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Append a child node to a parent.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if parent == child || self.node(parent).is_none() {
            return;
        }
        let Some(child_node) = self.nodes.get_mut(child.0 as usize) else {
            return;
        };
        child_node.parent = Some(parent);
        self.nodes[parent.0 as usize].children.push(child);
    }

    /// Allocate a node and append it to `parent` in one step.
    pub fn add_child(&mut self, parent: NodeId, node: Node) -> NodeId {
        let id = self.alloc_node(node);
        self.append_child(parent, id);
        id
    }

    /// Iterate over children of a node.
    pub fn children(&self, parent: NodeId) -> impl DoubleEndedIterator<Item = NodeId> + '_ {
        self.node(parent)
            .map(|n| n.children.as_slice())
            .unwrap_or_default()
            .iter()
            .copied()
    }

    /// Last child of a node.
    pub fn last_child(&self, parent: NodeId) -> Option<NodeId> {
        self.node(parent).and_then(|n| n.children.last().copied())
    }

    /// Iterate over all nodes in depth-first order.
    pub fn iter_dfs(&self) -> DfsIter<'_> {
        DfsIter {
            tree: self,
            stack: vec![NodeId::ROOT],
        }
    }
}

/// Depth-first iterator over all nodes.
pub struct DfsIter<'a> {
    tree: &'a DocumentTree,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for DfsIter<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;

        // Push children in reverse order so they're visited left-to-right
        self.stack.extend(self.tree.children(current).rev());

        Some(current)
    }
}
