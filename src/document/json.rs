//! JSON form of a document tree.
//!
//! Parsers living outside this crate (or tests) can hand over a document as
//! nested JSON instead of building the arena by hand:
//!
//! ```json
//! {
//!   "title": "Sample",
//!   "doctype": "book",
//!   "attributes": { "revdate": "2021-03-04" },
//!   "blocks": [
//!     { "kind": "paragraph", "children": [ { "kind": "text", "text": "Hello" } ] }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::io::Read;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::{Doctype, DocumentAuthor, DocumentTree, Node, NodeId, NodeKind};
use crate::error::{Error, Result};

/// Top-level JSON document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonDocument {
    pub title: Option<String>,
    pub authors: Vec<DocumentAuthor>,
    pub doctype: Doctype,
    pub base_dir: Option<PathBuf>,
    pub attributes: BTreeMap<String, String>,
    pub blocks: Vec<JsonNode>,
}

/// One JSON node with its nested children.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonNode {
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<JsonNode>,
}

impl JsonDocument {
    /// Build the arena tree, allocating nodes in document order.
    pub fn into_tree(self) -> Result<DocumentTree> {
        let mut tree = match self.title {
            Some(title) => DocumentTree::new(title),
            None => DocumentTree::untitled(),
        };
        tree.authors = self.authors;
        tree.doctype = self.doctype;
        if let Some(base_dir) = self.base_dir {
            tree.base_dir = base_dir;
        }
        for (name, value) in self.attributes {
            tree.set_attr(name, value);
        }
        for block in self.blocks {
            attach(&mut tree, NodeId::ROOT, block)?;
        }
        Ok(tree)
    }
}

fn attach(tree: &mut DocumentTree, parent: NodeId, json: JsonNode) -> Result<()> {
    if json.kind == NodeKind::Document && parent == NodeId::ROOT {
        return Err(Error::InvalidDocument(
            "a nested document may only appear inside a table cell".into(),
        ));
    }

    let mut node = Node::new(json.kind);
    node.id = json.id;
    node.title = json.title;
    node.text = json.text;
    node.target = json.target;
    node.attributes = json.attributes;
    for role in json.roles {
        node = node.with_role(role);
    }

    let id = tree.add_child(parent, node);
    for child in json.children {
        attach(tree, id, child)?;
    }
    Ok(())
}

/// Parse a JSON document from a string.
pub fn from_json_str(json: &str) -> Result<DocumentTree> {
    let doc: JsonDocument = serde_json::from_str(json)?;
    doc.into_tree()
}

/// Parse a JSON document from any reader.
pub fn from_json_reader<R: Read>(reader: R) -> Result<DocumentTree> {
    let doc: JsonDocument = serde_json::from_reader(reader)?;
    doc.into_tree()
}
