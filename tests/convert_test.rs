//! Conversion tests.
//!
//! Build document trees programmatically, convert them, and check the
//! rendered body markup and metadata.

use kniga::document::{
    AdmonitionKind, AnchorKind, CellSpec, CellStyle, HAlign, QuoteKind, RowGroup, VAlign,
};
use kniga::{ConvertOptions, Doctype, DocumentAuthor, DocumentTree, Error, Node, NodeId, NodeKind};
use quick_xml::Reader;
use quick_xml::events::Event;

fn dated(title: &str) -> DocumentTree {
    DocumentTree::new(title).with_attr("revdate", "2021-03-04")
}

fn para(tree: &mut DocumentTree, parent: NodeId, text: &str) -> NodeId {
    let id = tree.add_child(parent, Node::new(NodeKind::Paragraph));
    tree.add_child(id, Node::text(text));
    id
}

fn item(tree: &mut DocumentTree, list: NodeId, text: &str) -> NodeId {
    let id = tree.add_child(list, Node::new(NodeKind::ListItem));
    tree.add_child(id, Node::text(text));
    id
}

/// Main body content without the document-title wrapper.
fn body(tree: &DocumentTree) -> String {
    let book = kniga::convert(tree, &ConvertOptions::default()).unwrap();
    let content = book.main_body().unwrap().content.clone();
    let title = tree.title().unwrap();
    let prefix = format!("<section>\n<title><p>{title}</p></title>\n");
    content
        .strip_prefix(&prefix)
        .and_then(|c| c.strip_suffix("\n</section>"))
        .unwrap_or(&content)
        .to_string()
}

/// Parse a body fragment, failing on mismatched or unclosed elements.
fn assert_well_formed(fragment: &str) {
    let xml = format!("<body>{fragment}</body>");
    let mut reader = Reader::from_str(&xml);
    let mut depth = 0i32;
    loop {
        match reader.read_event() {
            Ok(Event::Start(_)) => depth += 1,
            Ok(Event::End(_)) => depth -= 1,
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => panic!("malformed fragment {fragment:?}: {e}"),
        }
    }
    assert_eq!(depth, 0, "unclosed elements in {fragment:?}");
}

// ============================================================================
// Paragraphs and Separators
// ============================================================================

#[test]
fn test_single_paragraph_has_no_separator() {
    let mut tree = dated("Hello");
    para(&mut tree, NodeId::ROOT, "Hello");

    let book = kniga::convert(&tree, &ConvertOptions::default()).unwrap();
    let main = book.main_body().unwrap();
    assert!(main.content.contains("<p>\nHello\n</p>"));
    assert!(!main.content.contains("<empty-line/>"));
}

#[test]
fn test_separator_between_paragraphs_only() {
    let mut tree = dated("Two");
    para(&mut tree, NodeId::ROOT, "One");
    para(&mut tree, NodeId::ROOT, "Two");

    assert_eq!(
        body(&tree),
        "<p>\nOne\n</p>\n<empty-line/>\n<p>\nTwo\n</p>"
    );
}

#[test]
fn test_listing_and_literal() {
    let mut tree = dated("Code");
    tree.add_child(
        NodeId::ROOT,
        Node::new(NodeKind::Listing).with_text("let a = 1;\nlet b = a < 2;"),
    );
    tree.add_child(NodeId::ROOT, Node::new(NodeKind::Literal).with_text("$ run"));

    assert_eq!(
        body(&tree),
        "<p><code>let a = 1;</code></p>\n<p><code>let b = a &lt; 2;</code></p>\n\
         <empty-line/>\n<p><code>$ run</code></p>"
    );
}

#[test]
fn test_listing_markup_spans_lines() {
    let mut tree = dated("Code");
    let listing = tree.add_child(NodeId::ROOT, Node::new(NodeKind::Listing));
    tree.add_child(listing, Node::text("let "));
    let strong = tree.add_child(listing, Node::new(NodeKind::InlineQuoted(QuoteKind::Strong)));
    tree.add_child(strong, Node::text("a\nb"));

    let content = body(&tree);
    assert_eq!(
        content,
        "<p><code>let <strong>a</strong></code></p>\n<p><code><strong>b</strong></code></p>"
    );
    assert_well_formed(&content);
}

#[test]
fn test_preamble_and_sections_in_article() {
    let mut tree = dated("Article");
    let preamble = tree.add_child(NodeId::ROOT, Node::new(NodeKind::Preamble));
    para(&mut tree, preamble, "Intro");
    let section = tree.add_child(
        NodeId::ROOT,
        Node::new(NodeKind::Section { level: 1 })
            .with_title("Part")
            .with_id("_part"),
    );
    para(&mut tree, section, "Body");

    assert_eq!(
        body(&tree),
        "<p>\nIntro\n</p>\n<subtitle id=\"_part\">Part</subtitle>\n<p>\nBody\n</p>"
    );
}

#[test]
fn test_book_chapters_become_sections() {
    let mut tree = dated("Novel").with_doctype(Doctype::Book);
    for title in ["One", "Two"] {
        let chapter = tree.add_child(
            NodeId::ROOT,
            Node::new(NodeKind::Section { level: 1 }).with_title(title),
        );
        para(&mut tree, chapter, "text");
    }

    assert_eq!(
        body(&tree),
        "<section>\n<title><p>One</p></title>\n<p>\ntext\n</p>\n</section>\n\
         <section>\n<title><p>Two</p></title>\n<p>\ntext\n</p>\n</section>"
    );
}

// ============================================================================
// Lists
// ============================================================================

#[test]
fn test_three_level_nested_list() {
    let mut tree = dated("Lists");
    let outer = tree.add_child(NodeId::ROOT, Node::new(NodeKind::UnorderedList));
    let a = item(&mut tree, outer, "a");
    let middle = tree.add_child(a, Node::new(NodeKind::OrderedList));
    let b = item(&mut tree, middle, "b");
    let inner = tree.add_child(b, Node::new(NodeKind::UnorderedList));
    item(&mut tree, inner, "c");
    item(&mut tree, middle, "d");

    assert_eq!(
        body(&tree),
        "<p>• a</p>\n<p>• 1. b</p>\n<p>• 1. • c</p>\n<p>• 2. d</p>"
    );
}

#[test]
fn test_list_item_with_paragraphs() {
    let mut tree = dated("Lists");
    let list = tree.add_child(NodeId::ROOT, Node::new(NodeKind::UnorderedList));
    let entry = item(&mut tree, list, "lead");
    para(&mut tree, entry, "first");
    para(&mut tree, entry, "second");
    para(&mut tree, NodeId::ROOT, "after");

    assert_eq!(
        body(&tree),
        "<p>• lead</p>\n<p>\nfirst\n</p>\n<empty-line/>\n<p>\nsecond\n</p>\n\
         <empty-line/>\n<p>\nafter\n</p>"
    );
}

#[test]
fn test_list_skips_stray_children() {
    let mut tree = dated("Lists");
    let list = tree.add_child(NodeId::ROOT, Node::new(NodeKind::OrderedList));
    item(&mut tree, list, "a");
    para(&mut tree, list, "stray");
    item(&mut tree, list, "b");

    assert_eq!(body(&tree), "<p>1. a</p>\n<p>2. b</p>");
}

#[test]
fn test_definition_list() {
    let mut tree = dated("Glossary");
    let dlist = tree.add_child(
        NodeId::ROOT,
        Node::new(NodeKind::DefinitionList).with_attr("options", "strong"),
    );
    let entry = tree.add_child(dlist, Node::new(NodeKind::DefinitionEntry));
    tree.add_child(entry, Node::new(NodeKind::DefinitionTerm).with_text("CPU"));
    tree.add_child(entry, Node::new(NodeKind::DefinitionTerm).with_text("Processor"));
    let desc = tree.add_child(entry, Node::new(NodeKind::ListItem).with_text("Computes."));
    para(&mut tree, desc, "More detail.");

    assert_eq!(
        body(&tree),
        "<table>\n<tr>\n<td>\n<p><strong>CPU</strong></p>\n<empty-line/>\n\
         <p><strong>Processor</strong></p>\n</td>\n<td>\n<p>Computes.</p>\n\
         <p>\nMore detail.\n</p>\n</td>\n</tr>\n</table>"
    );
}

// ============================================================================
// Tables
// ============================================================================

#[test]
fn test_table_styles_and_spans() {
    let mut tree = dated("Tables");
    let table = tree.add_child(
        NodeId::ROOT,
        Node::new(NodeKind::Table)
            .with_title("Prices")
            .with_attr("caption", "Table 1. "),
    );
    let head = tree.add_child(table, Node::new(NodeKind::TableRow(RowGroup::Head)));
    tree.add_child(
        head,
        Node::new(NodeKind::TableCell(
            CellSpec::default()
                .with_align(HAlign::Center, VAlign::Middle)
                .with_span(2, 1),
        ))
        .with_text("Item"),
    );
    let row = tree.add_child(table, Node::new(NodeKind::TableRow(RowGroup::Body)));
    tree.add_child(
        row,
        Node::new(NodeKind::TableCell(
            CellSpec::default().with_style(CellStyle::Monospaced),
        ))
        .with_text("tea"),
    );
    tree.add_child(
        row,
        Node::new(NodeKind::TableCell(CellSpec::default().with_style(CellStyle::Emphasis)))
            .with_text("cheap"),
    );

    assert_eq!(
        body(&tree),
        "<subtitle>Table 1. Prices</subtitle>\n<table>\n<tr>\n\
         <th align=\"center\" valign=\"middle\" colspan=\"2\">Item</th>\n</tr>\n<tr>\n\
         <td align=\"left\" valign=\"top\"><code>tea</code></td>\n\
         <td align=\"left\" valign=\"top\"><emphasis>cheap</emphasis></td>\n</tr>\n</table>"
    );
}

#[test]
fn test_break_in_table_cell() {
    let mut tree = dated("Tables");
    let table = tree.add_child(NodeId::ROOT, Node::new(NodeKind::Table));
    let row = tree.add_child(table, Node::new(NodeKind::TableRow(RowGroup::Body)));
    let cell = tree.add_child(row, Node::new(NodeKind::TableCell(CellSpec::default())));
    tree.add_child(cell, Node::text("a"));
    tree.add_child(cell, Node::new(NodeKind::InlineBreak));
    tree.add_child(cell, Node::text("b"));

    let content = body(&tree);
    assert!(content.contains("<td align=\"left\" valign=\"top\">a b</td>"));
    assert!(!content.contains("</p>"));
    assert_well_formed(&content);
}

// ============================================================================
// Quotes, Verses, Admonitions, Sidebars
// ============================================================================

#[test]
fn test_quote_block() {
    let mut tree = dated("Quotes");
    let quote = tree.add_child(
        NodeId::ROOT,
        Node::new(NodeKind::Quote)
            .with_attr("attribution", "Ada")
            .with_attr("citetitle", "Notes"),
    );
    para(&mut tree, quote, "Engines weave.");

    assert_eq!(
        body(&tree),
        "<cite>\n<subtitle>Notes</subtitle>\n<p>\nEngines weave.\n</p>\n\
         <text-author>Ada</text-author>\n</cite>"
    );
}

#[test]
fn test_verse_block() {
    let mut tree = dated("Poems");
    tree.add_child(
        NodeId::ROOT,
        Node::new(NodeKind::Verse)
            .with_title("Autumn")
            .with_attr("attribution", "Anon")
            .with_text("Leaves fall\nslowly\n\nWind"),
    );

    assert_eq!(
        body(&tree),
        "<poem>\n<title><p>Autumn</p></title>\n<stanza>\n<v>Leaves fall</v>\n<v>slowly</v>\n\
         </stanza>\n<stanza>\n<v>Wind</v>\n</stanza>\n<text-author>Anon</text-author>\n</poem>"
    );
}

#[test]
fn test_verse_markup_spans_lines() {
    let mut tree = dated("Poems");
    let verse = tree.add_child(NodeId::ROOT, Node::new(NodeKind::Verse));
    tree.add_child(verse, Node::text("one "));
    let strong = tree.add_child(verse, Node::new(NodeKind::InlineQuoted(QuoteKind::Strong)));
    tree.add_child(strong, Node::text("bold\nline"));

    let content = body(&tree);
    assert_eq!(
        content,
        "<poem>\n<stanza>\n<v>one <strong>bold</strong></v>\n<v><strong>line</strong></v>\n\
         </stanza>\n</poem>"
    );
    assert_well_formed(&content);
}

#[test]
fn test_break_in_verse_starts_new_line() {
    let mut tree = dated("Poems");
    let verse = tree.add_child(NodeId::ROOT, Node::new(NodeKind::Verse));
    tree.add_child(verse, Node::text("one"));
    tree.add_child(verse, Node::new(NodeKind::InlineBreak));
    tree.add_child(verse, Node::text("two"));

    let content = body(&tree);
    assert_eq!(content, "<poem>\n<stanza>\n<v>one</v>\n<v>two</v>\n</stanza>\n</poem>");
    assert_well_formed(&content);
}

#[test]
fn test_admonition_with_blocks() {
    let mut tree = dated("Notes");
    let tip = tree.add_child(
        NodeId::ROOT,
        Node::new(NodeKind::Admonition(AdmonitionKind::Tip)),
    );
    para(&mut tree, tip, "Use it.");
    para(&mut tree, NodeId::ROOT, "Later");

    assert_eq!(
        body(&tree),
        "<p>\n<strong>Tip:</strong>\n</p>\n<p>\nUse it.\n</p>\n<empty-line/>\n<p>\nLater\n</p>"
    );
}

#[test]
fn test_sidebar() {
    let mut tree = dated("Aside");
    let sidebar = tree.add_child(
        NodeId::ROOT,
        Node::new(NodeKind::Sidebar).with_title("Aside"),
    );
    para(&mut tree, sidebar, "Side text");

    assert_eq!(
        body(&tree),
        "<p><strong>Aside</strong></p>\n<p>\nSide text\n</p>"
    );
}

#[test]
fn test_thematic_break() {
    let mut tree = dated("Breaks");
    para(&mut tree, NodeId::ROOT, "a");
    tree.add_child(NodeId::ROOT, Node::new(NodeKind::ThematicBreak));
    para(&mut tree, NodeId::ROOT, "b");

    assert_eq!(
        body(&tree),
        "<p>\na\n</p>\n<empty-line/>\n<empty-line/>\n<p>\nb\n</p>"
    );
}

// ============================================================================
// Inline Content
// ============================================================================

#[test]
fn test_inline_quoted_table() {
    let mut tree = dated("Inline");
    let p = tree.add_child(NodeId::ROOT, Node::new(NodeKind::Paragraph));
    for (kind, text) in [
        (QuoteKind::Monospaced, "m"),
        (QuoteKind::Emphasis, "e"),
        (QuoteKind::Double, "d"),
        (QuoteKind::Single, "s"),
        (QuoteKind::Subscript, "2"),
        (QuoteKind::Asciimath, "x"),
        (QuoteKind::Unquoted, "u"),
    ] {
        tree.add_child(p, Node::new(NodeKind::InlineQuoted(kind)).with_text(text));
    }

    assert_eq!(
        body(&tree),
        "<p>\n<code>m</code><emphasis>e</emphasis>“d”‘s’<sub>2</sub><code>x</code>u\n</p>"
    );
}

#[test]
fn test_ui_macros_and_breaks() {
    let mut tree = dated("UI");
    let p = tree.add_child(NodeId::ROOT, Node::new(NodeKind::Paragraph));
    tree.add_child(p, Node::new(NodeKind::InlineMenu).with_text("File > Save"));
    tree.add_child(p, Node::text(" "));
    tree.add_child(p, Node::new(NodeKind::InlineButton).with_text("OK"));
    tree.add_child(p, Node::text(" "));
    tree.add_child(p, Node::new(NodeKind::InlineKbd).with_text("Ctrl+S"));
    tree.add_child(p, Node::new(NodeKind::InlineBreak).with_text(" done"));
    tree.add_child(p, Node::new(NodeKind::InlineIndexterm { visible: true }).with_text("term"));
    tree.add_child(p, Node::new(NodeKind::InlineIndexterm { visible: false }).with_text("hidden"));

    assert_eq!(
        body(&tree),
        "<p>\n<strong>File</strong>&#160;▸ <strong>Save</strong> <strong>[OK]</strong> \
         <code>Ctrl</code>+<code>S</code> done</p>\n<p>term\n</p>"
    );
}

#[test]
fn test_links_and_xrefs() {
    let mut tree = dated("Links");
    let p = tree.add_child(NodeId::ROOT, Node::new(NodeKind::Paragraph));
    let link = tree.add_child(
        p,
        Node::new(NodeKind::InlineAnchor(AnchorKind::Link)).with_target("https://example.org/?a=1&b=2"),
    );
    tree.add_child(link, Node::text("site"));
    tree.add_child(
        p,
        Node::new(NodeKind::InlineAnchor(AnchorKind::Xref))
            .with_target("#_intro")
            .with_text("Intro"),
    );

    assert_eq!(
        body(&tree),
        "<p>\n<a l:href=\"https://example.org/?a=1&amp;b=2\">site</a>\
         <a l:href=\"#_intro\">Intro</a>\n</p>"
    );
}

#[test]
fn test_break_in_paragraph_splits_it() {
    let mut tree = dated("Breaks");
    let p = tree.add_child(NodeId::ROOT, Node::new(NodeKind::Paragraph));
    tree.add_child(p, Node::text("a"));
    tree.add_child(p, Node::new(NodeKind::InlineBreak));
    tree.add_child(p, Node::text("b"));

    let content = body(&tree);
    assert_eq!(content, "<p>\na</p>\n<p>b\n</p>");
    assert_well_formed(&content);
}

#[test]
fn test_break_in_link_text() {
    let mut tree = dated("Links");
    let p = tree.add_child(NodeId::ROOT, Node::new(NodeKind::Paragraph));
    let link = tree.add_child(
        p,
        Node::new(NodeKind::InlineAnchor(AnchorKind::Link)).with_target("https://example.org"),
    );
    tree.add_child(link, Node::text("a"));
    tree.add_child(link, Node::new(NodeKind::InlineBreak));
    tree.add_child(link, Node::text("b"));

    let content = body(&tree);
    assert_eq!(content, "<p>\n<a l:href=\"https://example.org\">a b</a>\n</p>");
    assert_well_formed(&content);
}

// ============================================================================
// Footnotes
// ============================================================================

#[test]
fn test_footnotes_in_first_reference_order() {
    let mut tree = dated("Notes");
    let p1 = tree.add_child(NodeId::ROOT, Node::new(NodeKind::Paragraph));
    tree.add_child(p1, Node::text("First"));
    tree.add_child(
        p1,
        Node::new(NodeKind::InlineFootnote).with_text("Second defined, first referenced."),
    );
    let p2 = tree.add_child(NodeId::ROOT, Node::new(NodeKind::Paragraph));
    tree.add_child(p2, Node::text("Second"));
    tree.add_child(
        p2,
        Node::new(NodeKind::InlineFootnote).with_text("Referenced second."),
    );

    let book = kniga::convert(&tree, &ConvertOptions::default()).unwrap();
    let main = &book.main_body().unwrap().content;
    assert!(main.contains("First<a l:href=\"#note-1\" type=\"note\">[1]</a>"));
    assert!(main.contains("Second<a l:href=\"#note-2\" type=\"note\">[2]</a>"));

    let notes = &book.notes_body().unwrap().content;
    assert_eq!(
        notes,
        "<title><p>Footnotes</p></title>\n\
         <section id=\"note-1\">\n<title><p>1</p></title>\n<p>Second defined, first referenced.</p>\n</section>\n\
         <section id=\"note-2\">\n<title><p>2</p></title>\n<p>Referenced second.</p>\n</section>"
    );
}

#[test]
fn test_no_notes_body_without_footnotes() {
    let mut tree = dated("Plain");
    para(&mut tree, NodeId::ROOT, "text");
    let book = kniga::convert(&tree, &ConvertOptions::default()).unwrap();
    assert_eq!(book.bodies.len(), 1);
    assert!(book.notes_body().is_none());
}

// ============================================================================
// Metadata and Errors
// ============================================================================

#[test]
fn test_metadata_from_attributes() {
    let tree = dated("Meta")
        .with_attr("lang", "de")
        .with_attr("keywords", "a ,b,  c")
        .with_attr("genres", "sf_history")
        .with_attr("series-name", "Cycle")
        .with_attr("series-volume", "4")
        .with_attr("uuid", "urn:uuid:42")
        .with_attr("revnumber", "2.1")
        .with_attr("publisher", "House")
        .with_author(
            DocumentAuthor::new("Lev", "Tolstoy")
                .with_middle_name("Nikolayevich")
                .with_email("lev@example.org"),
        );

    let book = kniga::convert(&tree, &ConvertOptions::default()).unwrap();
    let meta = &book.metadata;
    assert_eq!(meta.title, "Meta");
    assert_eq!(meta.lang, "de");
    assert_eq!(meta.keywords, vec!["a", "b", "c"]);
    assert_eq!(meta.genres, vec!["sf_history"]);
    let series = meta.series.as_ref().unwrap();
    assert_eq!((series.name.as_str(), series.number), ("Cycle", Some(4)));
    assert_eq!(meta.identifier, "urn:uuid:42");
    assert_eq!(meta.version.as_deref(), Some("2.1"));
    assert_eq!(meta.publishers, vec!["House"]);
    assert_eq!(meta.date.as_ref().unwrap().display, "2021-03-04");
    assert_eq!(
        meta.authors[0].display_name(),
        "Lev Nikolayevich Tolstoy"
    );
    assert!(meta.program_used.as_ref().unwrap().starts_with("Kniga "));
}

#[test]
fn test_missing_title_is_fatal() {
    let tree = DocumentTree::untitled().with_attr("revdate", "2021-03-04");
    assert!(matches!(
        kniga::convert(&tree, &ConvertOptions::default()),
        Err(Error::MissingTitle)
    ));
}

#[test]
fn test_unparseable_date_is_fatal() {
    let tree = DocumentTree::new("T").with_attr("docdate", "the day after");
    let err = kniga::convert(&tree, &ConvertOptions::default()).unwrap_err();
    assert!(matches!(err, Error::InvalidDate { ref attribute, .. } if attribute == "docdate"));
}

#[test]
fn test_unknown_nodes_do_not_abort() {
    let mut tree = dated("Unknown");
    tree.add_child(NodeId::ROOT, Node::new(NodeKind::Unknown("open".into())));
    let p = para(&mut tree, NodeId::ROOT, "kept");
    tree.add_child(
        p,
        Node::new(NodeKind::InlineAnchor(AnchorKind::Other("weird".into()))),
    );
    assert_eq!(body(&tree), "<p>\nkept\n</p>");
}

// ============================================================================
// JSON Input
// ============================================================================

#[cfg(feature = "json")]
#[test]
fn test_convert_json_document() {
    let tree = kniga::document::json::from_json_str(
        r#"{
            "title": "From JSON",
            "attributes": { "revdate": "2022-02-02" },
            "blocks": [
                { "kind": "paragraph", "children": [
                    { "kind": "text", "text": "Hello " },
                    { "kind": { "inline_quoted": "emphasis" }, "text": "there" }
                ] },
                { "kind": "unordered_list", "children": [
                    { "kind": "list_item", "text": "one" }
                ] }
            ]
        }"#,
    )
    .unwrap();

    assert_eq!(
        body(&tree),
        "<p>\nHello <emphasis>there</emphasis>\n</p>\n<empty-line/>\n<p>• one</p>"
    );
}
