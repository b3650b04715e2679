//! Document tree to FictionBook conversion.
//!
//! [`convert`] walks a [`DocumentTree`] once and returns a [`Book`] holding
//! the metadata, the main body, an optional footnotes body, stylesheets, and
//! embedded binaries. The walk is synchronous and keeps no state between
//! calls; the same tree and the same resource files always give the same
//! book.
//!
//! # Example
//!
//! ```
//! use kniga::convert::{convert, ConvertOptions};
//! use kniga::document::{DocumentTree, Node, NodeId, NodeKind};
//!
//! let mut tree = DocumentTree::new("Hello").with_attr("revdate", "2024-01-01");
//! let para = tree.add_child(NodeId::ROOT, Node::new(NodeKind::Paragraph));
//! tree.add_child(para, Node::text("Hello"));
//!
//! let book = convert(&tree, &ConvertOptions::default()).unwrap();
//! assert!(book.main_body().unwrap().content.contains("<p>\nHello\n</p>"));
//! assert!(book.notes_body().is_none());
//! ```

pub mod footnotes;
pub mod metadata;
pub mod resources;
pub mod rules;
pub mod trailing;
pub mod visitor;

use std::path::{Path, PathBuf};

use crate::book::{Body, Book};
use crate::document::DocumentTree;
use crate::error::Result;

pub use resources::{MediaKind, ResourceRegistry};
pub use visitor::Visitor;

/// Default title of the footnotes body.
pub const DEFAULT_FOOTNOTES_TITLE: &str = "Footnotes";

/// Conversion settings that do not come from the document itself.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Output directory; resources are looked up here before the document's
    /// base directory. An `outdir` attribute overrides it.
    pub to_dir: Option<PathBuf>,
    /// Name and version of the tool that produced the document tree, shown
    /// in `program-used`.
    pub generator: Option<String>,
}

impl ConvertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_to_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.to_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn with_generator(mut self, generator: impl Into<String>) -> Self {
        self.generator = Some(generator.into());
        self
    }
}

/// Convert a document tree into a book.
///
/// Fails when the document has no title or no usable revision date, or when
/// a resource file exists but cannot be read. Missing resources and nodes
/// without a rendering rule are logged and skipped.
pub fn convert(tree: &DocumentTree, options: &ConvertOptions) -> Result<Book> {
    let mut metadata = metadata::build_metadata(tree, options)?;
    let mut visitor = Visitor::new(tree, options);

    let mut stylesheets = Vec::new();
    if let Some(css) = tree.attr("fb2-stylesheet").filter(|s| !s.is_empty()) {
        stylesheets.extend(visitor.resources().load_stylesheet(css)?);
    }

    if let Some(cover) = tree
        .attr("front-cover-image")
        .and_then(metadata::cover_target)
    {
        let root = tree.root();
        let target = resources::image_target(tree, root, cover);
        let href = visitor
            .resources_mut()
            .register(root, &target, MediaKind::Image)?;
        metadata.coverpage.push(href);
    }

    let content = visitor.render_document()?;
    let (binaries, footnotes) = visitor.finish();

    let mut bodies = vec![Body::main(rules::section(&metadata.title, None, &content))];
    let notes_title = tree
        .attr("footnotes-title")
        .unwrap_or(DEFAULT_FOOTNOTES_TITLE);
    if let Some(notes) = footnotes.render_body(notes_title) {
        bodies.push(Body::notes(notes));
    }

    Ok(Book {
        metadata,
        stylesheets,
        bodies,
        binaries,
    })
}
