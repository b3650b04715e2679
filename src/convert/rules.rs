//! Content-model rules.
//!
//! Pure functions turning already-rendered child markup into the FB2
//! fragment for one node. Nothing here touches the tree, the filesystem, or
//! any conversion state; the visitor gathers the inputs and calls in.
//!
//! Fragments are assembled line by line and joined with `\n`.

use crate::document::{CellSpec, CellStyle, QuoteKind, RowGroup};
use crate::util::{escape_text, escape_xml};

/// Separator emitted between sibling blocks.
pub const EMPTY_LINE: &str = "<empty-line/>";

/// Marker for unordered list items.
pub const BULLET: &str = "•";

/// Opening and closing tags for an inline quoted style.
///
/// Styles without an FB2 counterpart render undecorated.
pub fn quote_tags(kind: QuoteKind) -> (&'static str, &'static str) {
    match kind {
        QuoteKind::Monospaced | QuoteKind::Asciimath | QuoteKind::Latexmath => ("<code>", "</code>"),
        QuoteKind::Emphasis => ("<emphasis>", "</emphasis>"),
        QuoteKind::Strong => ("<strong>", "</strong>"),
        QuoteKind::Double => ("“", "”"),
        QuoteKind::Single => ("‘", "’"),
        QuoteKind::Superscript => ("<sup>", "</sup>"),
        QuoteKind::Subscript => ("<sub>", "</sub>"),
        _ => ("", ""),
    }
}

pub fn quoted(kind: QuoteKind, content: &str) -> String {
    let (open, close) = quote_tags(kind);
    format!("{open}{content}{close}")
}

fn title_line(title: Option<&str>) -> Option<String> {
    title.map(|t| format!("<subtitle>{}</subtitle>", escape_text(t)))
}

pub fn paragraph(title: Option<&str>, content: &str, last: bool) -> String {
    let mut lines = Vec::with_capacity(5);
    lines.extend(title_line(title));
    lines.push("<p>".to_string());
    lines.push(content.to_string());
    lines.push("</p>".to_string());
    if !last {
        lines.push(EMPTY_LINE.to_string());
    }
    lines.join("\n")
}

/// Split rendered inline markup into lines. Elements still open at the end
/// of a line are closed there and reopened at the start of the next one, so
/// each line is well-formed on its own.
pub fn balanced_lines(content: &str) -> Vec<String> {
    let mut lines = Vec::new();
    // (element name, start tag as written)
    let mut open: Vec<(&str, &str)> = Vec::new();
    for raw in content.lines() {
        let mut line: String = open.iter().map(|&(_, tag)| tag).collect();
        let mut rest = raw;
        while let Some(start) = rest.find('<') {
            line.push_str(&rest[..start]);
            let Some(len) = rest[start..].find('>') else {
                rest = &rest[start..];
                break;
            };
            let tag = &rest[start..=start + len];
            line.push_str(tag);
            if let Some(name) = tag.strip_prefix("</") {
                let name = name.trim_end_matches('>').trim();
                if let Some(pos) = open.iter().rposition(|&(n, _)| n == name) {
                    open.truncate(pos);
                }
            } else if !tag.ends_with("/>") {
                let name = tag[1..tag.len() - 1]
                    .split_whitespace()
                    .next()
                    .unwrap_or_default();
                open.push((name, tag));
            }
            rest = &rest[start + len + 1..];
        }
        line.push_str(rest);
        for &(name, _) in open.iter().rev() {
            line.push_str(&format!("</{name}>"));
        }
        lines.push(line);
    }
    lines
}

/// Whether a balanced line shows nothing: no text and no empty element such
/// as an inline image.
fn is_blank(line: &str) -> bool {
    let mut rest = line;
    while let Some(start) = rest.find('<') {
        if !rest[..start].trim().is_empty() {
            return false;
        }
        let end = rest[start..].find('>').map_or(rest.len(), |len| start + len + 1);
        if rest[start..end].ends_with("/>") {
            return false;
        }
        rest = &rest[end..];
    }
    rest.trim().is_empty()
}

/// Listing and literal blocks: one monospace paragraph per physical line.
///
/// `content` is already rendered markup.
pub fn listing(title: Option<&str>, content: &str, last: bool) -> String {
    let mut lines = Vec::new();
    lines.extend(title_line(title));
    for line in balanced_lines(content) {
        lines.push(format!("<p><code>{line}</code></p>"));
    }
    if !last {
        lines.push(EMPTY_LINE.to_string());
    }
    lines.join("\n")
}

/// Marker for the item at zero-based `index` of an ordered list whose
/// numbering begins at `start`.
pub fn ordered_marker(start: u32, index: usize) -> String {
    format!("{}.", start as usize + index)
}

/// One list item line: the markers of every enclosing list item, outermost
/// first, followed by the item text.
pub fn list_item(markers: &[String], text: &str) -> String {
    format!("<p>{} {text}</p>", markers.join(" "))
}

/// A list made of already-rendered item fragments.
pub fn list(items: &[String], separate: bool) -> String {
    let mut lines: Vec<&str> = items
        .iter()
        .map(String::as_str)
        .filter(|s| !s.is_empty())
        .collect();
    if separate {
        lines.push(EMPTY_LINE);
    }
    lines.join("\n")
}

/// A definition list entry rendered by the visitor.
#[derive(Debug, Clone, Default)]
pub struct DefinitionEntry {
    /// Rendered term texts.
    pub terms: Vec<String>,
    /// Rendered principal text of the description.
    pub text: Option<String>,
    /// Rendered block content of the description.
    pub blocks: Option<String>,
}

/// Definition lists become a two-column table: terms left, definitions right.
pub fn definition_list(entries: &[DefinitionEntry], strong_terms: bool) -> String {
    let mut lines = vec!["<table>".to_string()];
    for entry in entries {
        lines.push("<tr>".to_string());
        lines.push("<td>".to_string());
        for (i, term) in entry.terms.iter().enumerate() {
            if i > 0 {
                lines.push(EMPTY_LINE.to_string());
            }
            if strong_terms {
                lines.push(format!("<p><strong>{term}</strong></p>"));
            } else {
                lines.push(format!("<p>{term}</p>"));
            }
        }
        lines.push("</td>".to_string());
        lines.push("<td>".to_string());
        if let Some(text) = entry.text.as_deref().filter(|t| !t.is_empty()) {
            lines.push(format!("<p>{text}</p>"));
        }
        if let Some(blocks) = entry.blocks.as_deref().filter(|b| !b.is_empty()) {
            lines.push(blocks.to_string());
        }
        lines.push("</td>".to_string());
        lines.push("</tr>".to_string());
    }
    lines.push("</table>".to_string());
    lines.join("\n")
}

/// Wrap inline cell content according to the cell style.
///
/// Nested-document cells arrive fully rendered and pass through untouched.
pub fn cell_content(style: CellStyle, content: &str) -> String {
    match style {
        CellStyle::Asciidoc => content.to_string(),
        CellStyle::Emphasis => format!("<emphasis>{content}</emphasis>"),
        CellStyle::Literal | CellStyle::Monospaced => format!("<code>{content}</code>"),
        CellStyle::Strong => format!("<strong>{content}</strong>"),
        CellStyle::Header | CellStyle::Plain => content.to_string(),
    }
}

/// Whether a cell renders as a header cell.
pub fn is_header_cell(group: RowGroup, spec: &CellSpec) -> bool {
    group == RowGroup::Head || spec.style == CellStyle::Header
}

pub fn table_cell(group: RowGroup, spec: &CellSpec, content: &str) -> String {
    let tag = if is_header_cell(group, spec) { "th" } else { "td" };
    let mut attrs = format!(
        "align=\"{}\" valign=\"{}\"",
        spec.halign.as_str(),
        spec.valign.as_str()
    );
    if spec.colspan > 1 {
        attrs.push_str(&format!(" colspan=\"{}\"", spec.colspan));
    }
    if spec.rowspan > 1 {
        attrs.push_str(&format!(" rowspan=\"{}\"", spec.rowspan));
    }
    format!("<{tag} {attrs}>{content}</{tag}>")
}

pub fn table_row(cells: &[String]) -> String {
    let mut lines = Vec::with_capacity(cells.len() + 2);
    lines.push("<tr>");
    lines.extend(cells.iter().map(String::as_str));
    lines.push("</tr>");
    lines.join("\n")
}

pub fn table(caption: Option<&str>, rows: &[String]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 3);
    lines.extend(title_line(caption));
    lines.push("<table>".to_string());
    lines.extend(rows.iter().cloned());
    lines.push("</table>".to_string());
    lines.join("\n")
}

pub fn quote(citetitle: Option<&str>, content: &str, attribution: Option<&str>) -> String {
    let mut lines = vec!["<cite>".to_string()];
    lines.extend(title_line(citetitle));
    if !content.is_empty() {
        lines.push(content.to_string());
    }
    if let Some(attribution) = attribution {
        lines.push(format!("<text-author>{}</text-author>", escape_text(attribution)));
    }
    lines.push("</cite>".to_string());
    lines.join("\n")
}

/// Split rendered verse markup into stanzas on blank lines; each stanza is
/// a list of balanced lines. Runs of blank lines count as one break.
pub fn stanzas(content: &str) -> Vec<Vec<String>> {
    let mut stanzas = Vec::new();
    let mut current = Vec::new();
    for line in balanced_lines(content) {
        if is_blank(&line) {
            if !current.is_empty() {
                stanzas.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        stanzas.push(current);
    }
    stanzas
}

/// `content` is already rendered markup.
pub fn verse(
    title: Option<&str>,
    content: &str,
    attribution: Option<&str>,
    citetitle: Option<&str>,
) -> String {
    let mut lines = vec!["<poem>".to_string()];
    if let Some(title) = title {
        lines.push(format!("<title><p>{}</p></title>", escape_text(title)));
    }
    for stanza in stanzas(content) {
        lines.push("<stanza>".to_string());
        for line in stanza {
            lines.push(format!("<v>{line}</v>"));
        }
        lines.push("</stanza>".to_string());
    }
    for author in [attribution, citetitle].into_iter().flatten() {
        lines.push(format!("<text-author>{}</text-author>", escape_text(author)));
    }
    lines.push("</poem>".to_string());
    lines.join("\n")
}

pub fn admonition(label: &str, text: Option<&str>, blocks: Option<&str>, last: bool) -> String {
    let mut lines = vec!["<p>".to_string()];
    match text.filter(|t| !t.is_empty()) {
        Some(text) => lines.push(format!("<strong>{}:</strong> {text}", escape_text(label))),
        None => lines.push(format!("<strong>{}:</strong>", escape_text(label))),
    }
    lines.push("</p>".to_string());
    if let Some(blocks) = blocks.filter(|b| !b.is_empty()) {
        lines.push(blocks.to_string());
    }
    if !last {
        lines.push(EMPTY_LINE.to_string());
    }
    lines.join("\n")
}

pub fn sidebar(title: Option<&str>, content: &str) -> String {
    let mut lines = Vec::with_capacity(2);
    if let Some(title) = title {
        lines.push(format!("<p><strong>{}</strong></p>", escape_text(title)));
    }
    if !content.is_empty() {
        lines.push(content.to_string());
    }
    lines.join("\n")
}

fn id_attr(id: Option<&str>) -> String {
    id.map(|id| format!(" id=\"{}\"", escape_xml(id)))
        .unwrap_or_default()
}

/// A top-level container with its own title.
pub fn section(title: &str, id: Option<&str>, content: &str) -> String {
    let mut lines = vec![
        format!("<section{}>", id_attr(id)),
        format!("<title><p>{}</p></title>", escape_text(title)),
    ];
    if !content.is_empty() {
        lines.push(content.to_string());
    }
    lines.push("</section>".to_string());
    lines.join("\n")
}

/// A nested section: a subtitle marker inside the enclosing body.
pub fn subsection(title: &str, id: Option<&str>, content: &str) -> String {
    let heading = format!("<subtitle{}>{}</subtitle>", id_attr(id), escape_text(title));
    if content.is_empty() {
        heading
    } else {
        format!("{heading}\n{content}")
    }
}

pub fn footnote_ref(index: usize) -> String {
    format!("<a l:href=\"#note-{index}\" type=\"note\">[{index}]</a>")
}

/// A footnotes-body entry; `text` is already rendered.
pub fn footnote_entry(index: usize, text: &str) -> String {
    format!("<section id=\"note-{index}\">\n<title><p>{index}</p></title>\n<p>{text}</p>\n</section>")
}

pub fn notes_body(title: &str, entries: &[String]) -> String {
    let mut lines = Vec::with_capacity(entries.len() + 1);
    lines.push(format!("<title><p>{}</p></title>", escape_text(title)));
    lines.extend(entries.iter().cloned());
    lines.join("\n")
}

pub fn link(href: &str, text: &str) -> String {
    format!("<a l:href=\"{}\">{text}</a>", escape_xml(href))
}

pub fn image_block(href: &str, title: Option<&str>, id: Option<&str>) -> String {
    let mut attrs = format!("l:href=\"{}\"", escape_xml(href));
    if let Some(title) = title {
        attrs.push_str(&format!(" title=\"{}\"", escape_xml(title)));
    }
    attrs.push_str(&id_attr(id));
    format!("<image {attrs}/>")
}

pub fn inline_image(href: &str, alt: Option<&str>) -> String {
    let mut attrs = format!("l:href=\"{}\"", escape_xml(href));
    if let Some(alt) = alt {
        attrs.push_str(&format!(" alt=\"{}\"", escape_xml(alt)));
    }
    format!("<image {attrs}/>")
}

/// Menu path: each segment in bold, separated by a triangle.
pub fn menu(segments: &[&str]) -> String {
    segments
        .iter()
        .map(|s| format!("<strong>{}</strong>", escape_text(s)))
        .collect::<Vec<_>>()
        .join("&#160;▸ ")
}

pub fn button(text: &str) -> String {
    format!("<strong>[{text}]</strong>")
}

pub fn kbd(keys: &[&str]) -> String {
    keys.iter()
        .map(|k| format!("<code>{}</code>", escape_text(k)))
        .collect::<Vec<_>>()
        .join("+")
}

/// Hard line break inside a paragraph: FB2 paragraphs cannot contain
/// breaks, so the current paragraph is closed and a new one opened.
pub fn line_break(text: &str) -> String {
    format!("{text}</p>\n<p>")
}
