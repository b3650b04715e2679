//! Export tests.
//!
//! Converted books are written as plain `.fb2` and as `.fb2.zip`, checked for
//! well-formed XML and reproducible bytes, and read back.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use kniga::export::{Exporter, Fb2Config, Fb2ZipExporter, entry_name_for, render_fb2};
use kniga::{
    Book, ConvertOptions, DocumentAuthor, DocumentTree, Node, NodeId, NodeKind, read_fb2,
    read_fb2_file, read_fb2_zip, write_fb2, write_fb2_zip,
};
use quick_xml::Reader;
use quick_xml::events::Event;
use tempfile::TempDir;

const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

fn sample_tree(dir: &Path) -> DocumentTree {
    fs::write(dir.join("cover.png"), PNG_BYTES).unwrap();

    let mut tree = DocumentTree::new("Tales & Stories")
        .with_author(DocumentAuthor::new("Anna", "Karenina"))
        .with_attr("revdate", "2022-11-05")
        .with_attr("lang", "ru")
        .with_attr("keywords", "tales, stories")
        .with_attr("front-cover-image", "cover.png")
        .with_base_dir(dir);

    let chapter = tree.add_child(
        NodeId::ROOT,
        Node::new(NodeKind::Section { level: 1 }).with_title("One"),
    );
    let p = tree.add_child(chapter, Node::new(NodeKind::Paragraph));
    tree.add_child(p, Node::text("It was <dark> & stormy"));
    tree.add_child(
        p,
        Node::new(NodeKind::InlineFootnote).with_text("A footnote."),
    );

    let list = tree.add_child(chapter, Node::new(NodeKind::UnorderedList));
    for text in ["first", "second"] {
        let item = tree.add_child(list, Node::new(NodeKind::ListItem));
        tree.add_child(item, Node::text(text));
    }
    tree
}

fn sample_book(dir: &Path) -> Book {
    kniga::convert(&sample_tree(dir), &ConvertOptions::default()).unwrap()
}

fn zip_bytes(book: &Book) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    Fb2ZipExporter::new().export(book, &mut cursor).unwrap();
    cursor.into_inner()
}

// ============================================================================
// Plain FB2
// ============================================================================

#[test]
fn test_plain_output_is_well_formed() {
    let dir = TempDir::new().unwrap();
    let xml = render_fb2(&sample_book(dir.path()));

    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));

    let mut reader = Reader::from_str(&xml);
    let mut depth = 0i32;
    let mut elements = 0usize;
    loop {
        match reader.read_event() {
            Ok(Event::Start(_)) => {
                depth += 1;
                elements += 1;
            }
            Ok(Event::End(_)) => depth -= 1,
            Ok(Event::Empty(_)) => elements += 1,
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => panic!("malformed XML at {}: {e}", reader.buffer_position()),
        }
        assert!(depth >= 0);
    }
    assert_eq!(depth, 0);
    assert!(elements > 10);
}

#[test]
fn test_plain_output_structure() {
    let dir = TempDir::new().unwrap();
    let xml = render_fb2(&sample_book(dir.path()));

    let description = xml.find("<description>").unwrap();
    let main_body = xml.find("<body>").unwrap();
    let notes_body = xml.find("<body name=\"notes\">").unwrap();
    let binary = xml.find("<binary ").unwrap();
    assert!(description < main_body);
    assert!(main_body < notes_body);
    assert!(notes_body < binary);

    assert!(xml.contains("<book-title>Tales &amp; Stories</book-title>"));
    assert!(xml.contains("It was &lt;dark&gt; &amp; stormy"));
    assert!(xml.contains("<lang>ru</lang>"));
    assert!(xml.contains("<coverpage><image l:href=\"#cover.png\"/></coverpage>"));
    assert!(xml.trim_end().ends_with("</FictionBook>"));
}

#[test]
fn test_render_is_deterministic() {
    let dir = TempDir::new().unwrap();
    let first = render_fb2(&sample_book(dir.path()));
    let second = render_fb2(&sample_book(dir.path()));
    assert_eq!(first, second);
}

#[test]
fn test_write_fb2_and_read_back() {
    let dir = TempDir::new().unwrap();
    let book = sample_book(dir.path());
    let path = dir.path().join("out.fb2");

    write_fb2(&book, &path).unwrap();
    let on_disk = fs::read_to_string(&path).unwrap();
    assert_eq!(on_disk, render_fb2(&book));

    let parsed = read_fb2_file(&path).unwrap();
    assert_eq!(parsed.metadata.title, "Tales & Stories");
    assert_eq!(parsed.metadata.authors, book.metadata.authors);
    assert_eq!(parsed.metadata.keywords, vec!["tales", "stories"]);
    assert_eq!(parsed.metadata.date, book.metadata.date);
    assert_eq!(parsed.metadata.coverpage, vec!["#cover.png"]);
    assert_eq!(parsed.bodies, book.bodies);
    assert_eq!(parsed.binaries, book.binaries);
}

// ============================================================================
// Zip Container
// ============================================================================

#[test]
fn test_zip_holds_single_entry() {
    let dir = TempDir::new().unwrap();
    let book = sample_book(dir.path());
    let bytes = zip_bytes(&book);

    let mut archive = zip::ZipArchive::new(Cursor::new(&bytes)).unwrap();
    assert_eq!(archive.len(), 1);

    let entry = archive.by_index(0).unwrap();
    assert_eq!(entry.name(), "book.fb2");
    assert_eq!(entry.compression(), zip::CompressionMethod::Deflated);
}

#[test]
fn test_zip_is_deterministic() {
    let dir = TempDir::new().unwrap();
    let first = zip_bytes(&sample_book(dir.path()));
    std::thread::sleep(std::time::Duration::from_millis(1100));
    let second = zip_bytes(&sample_book(dir.path()));
    assert_eq!(first, second);
}

#[test]
fn test_zip_compression_level() {
    let dir = TempDir::new().unwrap();
    let book = sample_book(dir.path());

    let mut stored = Cursor::new(Vec::new());
    Fb2ZipExporter::new()
        .with_config(Fb2Config {
            compression_level: Some(0),
        })
        .export(&book, &mut stored)
        .unwrap();

    let parsed = read_fb2_zip(Cursor::new(stored.into_inner())).unwrap();
    assert_eq!(parsed.bodies, book.bodies);
}

#[test]
fn test_zip_round_trip() {
    let dir = TempDir::new().unwrap();
    let book = sample_book(dir.path());

    let from_zip = read_fb2_zip(Cursor::new(zip_bytes(&book))).unwrap();
    let from_plain = read_fb2(render_fb2(&book).as_bytes()).unwrap();
    assert_eq!(from_zip, from_plain);
    assert_eq!(from_zip.bodies, book.bodies);
}

#[test]
fn test_write_fb2_zip_names_entry_after_file() {
    let dir = TempDir::new().unwrap();
    let book = sample_book(dir.path());
    let path = dir.path().join("tales.fb2.zip");

    write_fb2_zip(&book, &path).unwrap();

    let mut archive = zip::ZipArchive::new(fs::File::open(&path).unwrap()).unwrap();
    assert_eq!(archive.by_index(0).unwrap().name(), "tales.fb2");
    assert_eq!(entry_name_for(&path), "tales.fb2");

    let parsed = read_fb2_file(&path).unwrap();
    assert_eq!(parsed.metadata.title, "Tales & Stories");
    assert_eq!(parsed.notes_body(), book.notes_body());
}
