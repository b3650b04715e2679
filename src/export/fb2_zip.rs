//! `.fb2.zip` container writer.
//!
//! The archive holds a single deflated `.fb2` entry. Entries carry the
//! fixed DOS epoch timestamp, so the same book always yields the same bytes.

use std::io::{Seek, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::book::Book;
use crate::error::Result;

use super::Exporter;
use super::fb2::render_fb2;

/// Entry name used when none is derived from an output path.
const DEFAULT_ENTRY_NAME: &str = "book.fb2";

/// Configuration for `.fb2.zip` export.
#[derive(Debug, Clone, Default)]
pub struct Fb2Config {
    /// Compression level for deflate (0-9, default 6).
    pub compression_level: Option<u32>,
}

/// Zipped FictionBook exporter.
///
/// # Example
///
/// ```no_run
/// use kniga::book::Book;
/// use kniga::export::{Exporter, Fb2Config, Fb2ZipExporter};
/// use std::fs::File;
///
/// let book = Book::new();
/// let mut file = File::create("output.fb2.zip")?;
/// Fb2ZipExporter::new()
///     .with_config(Fb2Config { compression_level: Some(9) })
///     .export(&book, &mut file)?;
/// # Ok::<(), kniga::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Fb2ZipExporter {
    config: Fb2Config,
    entry_name: String,
}

impl Fb2ZipExporter {
    /// Create a new exporter with default configuration.
    pub fn new() -> Self {
        Self {
            config: Fb2Config::default(),
            entry_name: DEFAULT_ENTRY_NAME.to_string(),
        }
    }

    /// Configure the exporter with custom settings.
    pub fn with_config(mut self, config: Fb2Config) -> Self {
        self.config = config;
        self
    }

    /// Name of the `.fb2` entry inside the archive.
    pub fn with_entry_name(mut self, name: impl Into<String>) -> Self {
        self.entry_name = name.into();
        self
    }
}

impl Default for Fb2ZipExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Exporter for Fb2ZipExporter {
    fn export<W: Write + Seek>(&self, book: &Book, writer: &mut W) -> Result<()> {
        let compression_level = self.config.compression_level.unwrap_or(6).min(9);
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(compression_level as i64))
            .last_modified_time(DateTime::default());

        let mut zip = ZipWriter::new(writer);
        zip.start_file(self.entry_name.as_str(), options)?;
        zip.write_all(render_fb2(book).as_bytes())?;
        zip.finish()?;
        Ok(())
    }
}

/// Write a book to a `.fb2.zip` file. The entry is named after the file,
/// so `story.fb2.zip` contains `story.fb2`.
pub fn write_fb2_zip<P: AsRef<Path>>(book: &Book, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut file = std::fs::File::create(path)?;
    Fb2ZipExporter::new()
        .with_entry_name(entry_name_for(path))
        .export(book, &mut file)
}

/// Derive the `.fb2` entry name from an output path.
pub fn entry_name_for(path: &Path) -> String {
    let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
        return DEFAULT_ENTRY_NAME.to_string();
    };
    let stem = file_name.strip_suffix(".zip").unwrap_or(file_name);
    if stem.is_empty() {
        DEFAULT_ENTRY_NAME.to_string()
    } else if stem.ends_with(".fb2") {
        stem.to_string()
    } else {
        format!("{stem}.fb2")
    }
}
