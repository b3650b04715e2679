//! Writing converted books to disk or memory.
//!
//! Provides the `Exporter` trait and the two FictionBook flavours.
//!
//! # Architecture
//!
//! Exporters follow a builder pattern:
//! - `new()` creates an exporter with default configuration
//! - `with_config()` allows customization
//! - `export()` writes to any `Write + Seek` destination
//!
//! # Example
//!
//! ```no_run
//! use kniga::convert::{convert, ConvertOptions};
//! use kniga::document::DocumentTree;
//! use kniga::export::{Exporter, Fb2ZipExporter};
//! use std::fs::File;
//!
//! let tree = DocumentTree::new("Title").with_attr("revdate", "2024-01-01");
//! let book = convert(&tree, &ConvertOptions::default())?;
//! let mut file = File::create("title.fb2.zip")?;
//! Fb2ZipExporter::new().export(&book, &mut file)?;
//! # Ok::<(), kniga::Error>(())
//! ```

use std::io::{Seek, Write};

use crate::book::Book;
use crate::error::Result;

mod fb2;
mod fb2_zip;

pub use fb2::{Fb2Exporter, render_fb2, write_fb2};
pub use fb2_zip::{Fb2Config, Fb2ZipExporter, entry_name_for, write_fb2_zip};

/// Trait for exporting books.
///
/// Configuration is held in the exporter; `export` writes to any
/// `Write + Seek` destination:
/// - `std::fs::File` for disk output
/// - `std::io::Cursor<Vec<u8>>` for in-memory output
pub trait Exporter {
    /// Export the book to the provided writer.
    fn export<W: Write + Seek>(&self, book: &Book, writer: &mut W) -> Result<()>;
}
