//! # kniga
//!
//! Converts parsed document trees (sections, paragraphs, lists, tables,
//! quotes, images, footnotes) into FictionBook 2 e-books.
//!
//! ## Features
//!
//! - Renders every common block and inline construct to FB2 markup
//! - Numbers footnotes in first-reference order and collects them into a
//!   separate `notes` body
//! - Embeds local images and stylesheets as binaries
//! - Byte-for-byte reproducible `.fb2` and `.fb2.zip` output
//!
//! ## Quick Start
//!
//! ```no_run
//! use kniga::{convert, write_fb2_zip, ConvertOptions, DocumentTree, Node, NodeId, NodeKind};
//!
//! let mut tree = DocumentTree::new("My Book").with_attr("revdate", "2024-05-01");
//! let para = tree.add_child(NodeId::ROOT, Node::new(NodeKind::Paragraph));
//! tree.add_child(para, Node::text("Once upon a time."));
//!
//! let book = convert(&tree, &ConvertOptions::default())?;
//! write_fb2_zip(&book, "my-book.fb2.zip")?;
//! # Ok::<(), kniga::Error>(())
//! ```
//!
//! ## Reading books back
//!
//! ```no_run
//! let book = kniga::read_fb2_file("my-book.fb2.zip")?;
//! println!("{}", book.metadata.title);
//! # Ok::<(), kniga::Error>(())
//! ```

pub mod book;
pub mod convert;
pub mod document;
pub mod error;
pub mod export;
pub mod import;
pub(crate) mod util;

pub use book::{Author, Binary, Body, Book, BookDate, Metadata, Series, Stylesheet};
pub use convert::{ConvertOptions, convert};
pub use document::{Doctype, DocumentAuthor, DocumentTree, Node, NodeId, NodeKind};
pub use error::{Error, Result};
pub use export::{Exporter, Fb2Config, Fb2Exporter, Fb2ZipExporter, write_fb2, write_fb2_zip};
pub use import::{read_fb2, read_fb2_file, read_fb2_zip};
