//! Tree walk that renders document nodes into FB2 body markup.
//!
//! Children render before their parent's template is applied. Block
//! fragments of a container are joined with `\n`; inline fragments are
//! concatenated. Nested list markers are threaded down the recursion as a
//! slice, so the walk carries no list state of its own.

use super::footnotes::FootnoteCollector;
use super::resources::{MediaKind, ResourceRegistry, image_target};
use super::rules::{self, BULLET, EMPTY_LINE};
use super::trailing::LastMarks;
use super::ConvertOptions;
use crate::book::Binary;
use crate::document::{
    AdmonitionKind, AnchorKind, CellSpec, CellStyle, Doctype, DocumentTree, Node, NodeId,
    NodeKind, RowGroup,
};
use crate::error::Result;
use crate::util::escape_text;

/// Where an inline run ends up; decides how a hard line break renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InlineContext {
    /// Directly inside a `<p>`: the paragraph is closed and reopened.
    Paragraph,
    /// Line-oriented text (verse, listings): a new line starts.
    Lines,
    /// Anywhere else, such as table cells or inside another inline element:
    /// a space.
    Flat,
}

impl InlineContext {
    /// Context for the content of an inline element.
    fn nested(self) -> Self {
        match self {
            InlineContext::Lines => InlineContext::Lines,
            _ => InlineContext::Flat,
        }
    }
}

/// Conversion state for one document.
pub struct Visitor<'a> {
    tree: &'a DocumentTree,
    resources: ResourceRegistry<'a>,
    footnotes: FootnoteCollector,
    marks: LastMarks,
}

impl<'a> Visitor<'a> {
    pub fn new(tree: &'a DocumentTree, options: &'a ConvertOptions) -> Self {
        Self {
            tree,
            resources: ResourceRegistry::new(tree, options),
            footnotes: FootnoteCollector::new(),
            marks: LastMarks::new(),
        }
    }

    pub fn resources(&self) -> &ResourceRegistry<'a> {
        &self.resources
    }

    pub fn resources_mut(&mut self) -> &mut ResourceRegistry<'a> {
        &mut self.resources
    }

    /// Render the whole document content.
    pub fn render_document(&mut self) -> Result<String> {
        self.render_container(NodeId::ROOT, &[])
    }

    /// Consume the visitor, handing over collected binaries and footnotes.
    pub fn finish(self) -> (Vec<Binary>, FootnoteCollector) {
        (self.resources.into_binaries(), self.footnotes)
    }

    /// Render one node. `markers` holds the markers of the enclosing list
    /// items, outermost first.
    ///
    /// Returns `None` for nodes that contribute nothing.
    pub fn render(&mut self, id: NodeId, markers: &[String]) -> Result<Option<String>> {
        let tree = self.tree;
        let Some(node) = tree.node(id) else {
            return Ok(None);
        };

        let fragment = match &node.kind {
            NodeKind::Document | NodeKind::Preamble => Some(self.render_container(id, markers)?),
            NodeKind::Section { .. } => Some(self.section(id, node, markers)?),
            NodeKind::Paragraph => {
                let content = self.inline_or_text(id, node, InlineContext::Paragraph)?;
                let last = self.marks.is_last(tree, id);
                Some(rules::paragraph(node.title.as_deref(), &content, last))
            }
            NodeKind::Listing | NodeKind::Literal => {
                let content = self.inline_or_text(id, node, InlineContext::Lines)?;
                let last = self.marks.is_last(tree, id);
                Some(rules::listing(node.title.as_deref(), &content, last))
            }
            NodeKind::Quote => Some(self.quote(id, node, markers)?),
            NodeKind::Verse => {
                let content = self.inline_or_text(id, node, InlineContext::Lines)?;
                Some(rules::verse(
                    node.title.as_deref(),
                    &content,
                    node.attr("attribution"),
                    node.attr("citetitle"),
                ))
            }
            NodeKind::Sidebar => {
                let content = self.mixed_content(id, node, markers)?;
                Some(rules::sidebar(node.title.as_deref(), &content))
            }
            NodeKind::Admonition(kind) => Some(self.admonition(id, node, *kind, markers)?),
            NodeKind::UnorderedList => Some(self.list(id, node, markers, false)?),
            NodeKind::OrderedList => Some(self.list(id, node, markers, true)?),
            NodeKind::ListItem => Some(self.list_item(id, node, markers)?),
            NodeKind::DefinitionList => Some(self.definition_list(id, node, markers)?),
            NodeKind::Table => Some(self.table(id, node, markers)?),
            NodeKind::Image => self.image_block(node)?,
            NodeKind::ThematicBreak => Some(EMPTY_LINE.to_string()),
            NodeKind::PageBreak | NodeKind::Toc => None,
            NodeKind::DefinitionEntry
            | NodeKind::DefinitionTerm
            | NodeKind::TableRow(_)
            | NodeKind::TableCell(_) => {
                tracing::warn!("{} outside its parent block, skipping", node.kind.name());
                None
            }
            NodeKind::Unknown(name) => {
                tracing::warn!("no rendering rule for node kind {}, skipping", name);
                None
            }
            kind if kind.is_inline() => self.inline(id, node, InlineContext::Flat)?,
            _ => None,
        };
        Ok(fragment)
    }

    // ------------------------------------------------------------------
    // Containers
    // ------------------------------------------------------------------

    /// Render all children of `id` as a block sequence.
    fn render_container(&mut self, id: NodeId, markers: &[String]) -> Result<String> {
        let children: Vec<NodeId> = self.tree.children(id).collect();
        self.render_blocks(id, &children, markers)
    }

    fn render_blocks(
        &mut self,
        container: NodeId,
        children: &[NodeId],
        markers: &[String],
    ) -> Result<String> {
        self.marks.mark_container(self.tree, container);
        let mut parts = Vec::with_capacity(children.len());
        for &child in children {
            if let Some(fragment) = self.render(child, markers)?
                && !fragment.is_empty()
            {
                parts.push(fragment);
            }
        }
        Ok(parts.join("\n"))
    }

    /// Split children into the inline principal text and the block content
    /// that follows it.
    fn render_mixed(&mut self, id: NodeId, markers: &[String]) -> Result<(String, String)> {
        let tree = self.tree;
        let (inline, blocks): (Vec<NodeId>, Vec<NodeId>) = tree
            .children(id)
            .partition(|&child| tree.node(child).is_some_and(|n| n.kind.is_inline()));
        let text = self.concat_inline(&inline, InlineContext::Paragraph)?;
        let blocks = self.render_blocks(id, &blocks, markers)?;
        Ok((text, blocks))
    }

    /// Mixed content with the principal text as a leading paragraph.
    fn mixed_content(&mut self, id: NodeId, node: &Node, markers: &[String]) -> Result<String> {
        let (text, blocks) = self.render_mixed(id, markers)?;
        let text = self.or_node_text(text, node);
        let mut parts = Vec::with_capacity(2);
        if !text.is_empty() {
            parts.push(format!("<p>{text}</p>"));
        }
        if !blocks.is_empty() {
            parts.push(blocks);
        }
        Ok(parts.join("\n"))
    }

    fn section(&mut self, id: NodeId, node: &Node, markers: &[String]) -> Result<String> {
        let content = self.render_container(id, markers)?;
        let title = node.title.as_deref().unwrap_or_default();
        let top_level = self.tree.doctype == Doctype::Book
            && node.parent == Some(NodeId::ROOT);
        Ok(if top_level {
            rules::section(title, node.id.as_deref(), &content)
        } else {
            rules::subsection(title, node.id.as_deref(), &content)
        })
    }

    fn quote(&mut self, id: NodeId, node: &Node, markers: &[String]) -> Result<String> {
        let content = self.mixed_content(id, node, markers)?;
        let citetitle = node.attr("citetitle").or(node.title.as_deref());
        Ok(rules::quote(citetitle, &content, node.attr("attribution")))
    }

    fn admonition(
        &mut self,
        id: NodeId,
        node: &Node,
        kind: AdmonitionKind,
        markers: &[String],
    ) -> Result<String> {
        let caption_attr = format!("{}-caption", kind.name());
        let label = node
            .title
            .as_deref()
            .or_else(|| node.attr("caption"))
            .or_else(|| self.tree.attr(&caption_attr))
            .unwrap_or(kind.caption());
        let (text, blocks) = self.render_mixed(id, markers)?;
        let text = self.or_node_text(text, node);
        let last = self.marks.is_last(self.tree, id);
        Ok(rules::admonition(label, Some(&text), Some(&blocks), last))
    }

    // ------------------------------------------------------------------
    // Lists
    // ------------------------------------------------------------------

    fn list(&mut self, id: NodeId, node: &Node, markers: &[String], ordered: bool) -> Result<String> {
        let tree = self.tree;
        let start = node
            .attr("start")
            .and_then(|s| s.trim().parse::<u32>().ok())
            .unwrap_or(1);
        let items: Vec<NodeId> = tree
            .children(id)
            .filter(|&child| match tree.node(child) {
                Some(n) if n.kind == NodeKind::ListItem => true,
                Some(n) => {
                    tracing::warn!("unexpected {} in list", n.kind.name());
                    false
                }
                None => false,
            })
            .collect();

        let mut rendered = Vec::with_capacity(items.len());
        for (index, &item) in items.iter().enumerate() {
            let mut item_markers = markers.to_vec();
            item_markers.push(if ordered {
                rules::ordered_marker(start, index)
            } else {
                BULLET.to_string()
            });
            if let Some(fragment) = self.render(item, &item_markers)? {
                rendered.push(fragment);
            }
        }

        let separate = markers.is_empty() && !self.marks.is_last(tree, id);
        Ok(rules::list(&rendered, separate))
    }

    fn list_item(&mut self, id: NodeId, node: &Node, markers: &[String]) -> Result<String> {
        let (text, blocks) = self.render_mixed(id, markers)?;
        let text = self.or_node_text(text, node);
        let line = rules::list_item(markers, &text);
        Ok(if blocks.is_empty() {
            line
        } else {
            format!("{line}\n{blocks}")
        })
    }

    fn definition_list(&mut self, id: NodeId, node: &Node, markers: &[String]) -> Result<String> {
        let tree = self.tree;
        let strong = node.has_option("strong");
        let term_context = if strong {
            InlineContext::Flat
        } else {
            InlineContext::Paragraph
        };
        let mut entries = Vec::new();
        for entry_id in tree.children(id) {
            let Some(entry) = tree.node(entry_id) else {
                continue;
            };
            if entry.kind != NodeKind::DefinitionEntry {
                tracing::warn!("unexpected {} in definition list", entry.kind.name());
                continue;
            }

            let mut rendered = rules::DefinitionEntry::default();
            for child_id in tree.children(entry_id) {
                let Some(child) = tree.node(child_id) else {
                    continue;
                };
                match child.kind {
                    NodeKind::DefinitionTerm => {
                        rendered
                            .terms
                            .push(self.inline_or_text(child_id, child, term_context)?);
                    }
                    NodeKind::ListItem => {
                        let (text, blocks) = self.render_mixed(child_id, markers)?;
                        rendered.text = Some(self.or_node_text(text, child));
                        rendered.blocks = Some(blocks);
                    }
                    _ => tracing::warn!("unexpected {} in definition entry", child.kind.name()),
                }
            }
            entries.push(rendered);
        }
        Ok(rules::definition_list(&entries, strong))
    }

    // ------------------------------------------------------------------
    // Tables
    // ------------------------------------------------------------------

    fn table(&mut self, id: NodeId, node: &Node, markers: &[String]) -> Result<String> {
        let tree = self.tree;
        let mut rows: Vec<(RowGroup, NodeId)> = tree
            .children(id)
            .filter_map(|row| match tree.node(row).map(|n| &n.kind) {
                Some(NodeKind::TableRow(group)) => Some((*group, row)),
                _ => None,
            })
            .collect();
        // Stable: source order is kept within each group.
        rows.sort_by_key(|&(group, _)| group);

        let mut rendered = Vec::with_capacity(rows.len());
        for (group, row) in rows {
            let mut cells = Vec::new();
            for cell_id in tree.children(row) {
                let Some(cell) = tree.node(cell_id) else {
                    continue;
                };
                let NodeKind::TableCell(spec) = &cell.kind else {
                    tracing::warn!("unexpected {} in table row", cell.kind.name());
                    continue;
                };
                let content = self.cell_content(cell_id, cell, spec, markers)?;
                cells.push(rules::table_cell(group, spec, &content));
            }
            rendered.push(rules::table_row(&cells));
        }

        let caption = node.title.as_deref().map(|title| {
            format!("{}{}", node.attr("caption").unwrap_or_default(), title)
        });
        Ok(rules::table(caption.as_deref(), &rendered))
    }

    fn cell_content(
        &mut self,
        id: NodeId,
        node: &Node,
        spec: &CellSpec,
        markers: &[String],
    ) -> Result<String> {
        if spec.style == CellStyle::Asciidoc {
            return self.render_container(id, markers);
        }
        // Table cells hold inline content only, with no paragraph to break.
        let text = self.inline_or_text(id, node, InlineContext::Flat)?;
        Ok(rules::cell_content(spec.style, &text))
    }

    // ------------------------------------------------------------------
    // Images
    // ------------------------------------------------------------------

    fn image_block(&mut self, node: &Node) -> Result<Option<String>> {
        let Some(target) = node.target.as_deref().or_else(|| node.attr("target")) else {
            tracing::warn!("image without a target, skipping");
            return Ok(None);
        };
        let target = image_target(self.tree, node, target);
        let href = self.resources.register(node, &target, MediaKind::Image)?;
        let title = node.title.as_deref().map(|title| {
            format!("{}{}", node.attr("caption").unwrap_or_default(), title)
        });
        Ok(Some(rules::image_block(
            &href,
            title.as_deref(),
            node.id.as_deref(),
        )))
    }

    // ------------------------------------------------------------------
    // Inline content
    // ------------------------------------------------------------------

    fn concat_inline(&mut self, children: &[NodeId], context: InlineContext) -> Result<String> {
        let tree = self.tree;
        let mut out = String::new();
        for &child in children {
            let Some(node) = tree.node(child) else {
                continue;
            };
            if let Some(fragment) = self.inline(child, node, context)? {
                out.push_str(&fragment);
            }
        }
        Ok(out)
    }

    /// Rendered inline children, or the node's own escaped text.
    fn inline_or_text(&mut self, id: NodeId, node: &Node, context: InlineContext) -> Result<String> {
        let tree = self.tree;
        let inline: Vec<NodeId> = tree
            .children(id)
            .filter(|&child| tree.node(child).is_some_and(|n| n.kind.is_inline()))
            .collect();
        if inline.is_empty() {
            return Ok(node_text(node));
        }
        self.concat_inline(&inline, context)
    }

    fn or_node_text(&self, text: String, node: &Node) -> String {
        if text.is_empty() { node_text(node) } else { text }
    }

    fn inline(&mut self, id: NodeId, node: &Node, context: InlineContext) -> Result<Option<String>> {
        let fragment = match &node.kind {
            NodeKind::Text => Some(node_text(node)),
            NodeKind::InlineQuoted(kind) => {
                let content = self.inline_or_text(id, node, context.nested())?;
                Some(rules::quoted(*kind, &content))
            }
            NodeKind::InlineAnchor(kind) => self.anchor(id, node, kind, context)?,
            NodeKind::InlineFootnote => Some(self.footnote(id, node)?),
            NodeKind::InlineImage => self.inline_image(node)?,
            NodeKind::InlineMenu => {
                let text = node.text.as_deref().unwrap_or_default();
                let segments: Vec<&str> = text
                    .split('>')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect();
                Some(rules::menu(&segments))
            }
            NodeKind::InlineButton => Some(rules::button(&node_text(node))),
            NodeKind::InlineKbd => {
                let keys = split_keys(node.text.as_deref().unwrap_or_default());
                Some(rules::kbd(&keys))
            }
            NodeKind::InlineBreak => {
                let text = self.inline_or_text(id, node, context.nested())?;
                Some(match context {
                    InlineContext::Paragraph => rules::line_break(&text),
                    InlineContext::Lines => format!("{text}\n"),
                    InlineContext::Flat => format!("{text} "),
                })
            }
            NodeKind::InlineIndexterm { visible: true } => {
                Some(self.inline_or_text(id, node, context)?)
            }
            NodeKind::InlineIndexterm { visible: false } => None,
            _ => None,
        };
        Ok(fragment)
    }

    fn anchor(
        &mut self,
        id: NodeId,
        node: &Node,
        kind: &AnchorKind,
        context: InlineContext,
    ) -> Result<Option<String>> {
        let fragment = match kind {
            AnchorKind::Xref | AnchorKind::Link => {
                let text = self.inline_or_text(id, node, context.nested())?;
                match node.target.as_deref() {
                    Some(target) => {
                        let text = if text.is_empty() {
                            escape_text(target).into_owned()
                        } else {
                            text
                        };
                        Some(rules::link(target, &text))
                    }
                    None => {
                        tracing::warn!("{:?} anchor without a target", kind);
                        Some(text)
                    }
                }
            }
            AnchorKind::Ref => None,
            AnchorKind::Bibref => {
                let text = self.inline_or_text(id, node, context)?;
                let label = if text.is_empty() {
                    escape_text(node.id.as_deref().unwrap_or_default()).into_owned()
                } else {
                    text
                };
                Some(format!("[{label}]"))
            }
            AnchorKind::Other(name) => {
                tracing::warn!("unknown anchor type: {}", name);
                None
            }
        };
        Ok(fragment)
    }

    fn footnote(&mut self, id: NodeId, node: &Node) -> Result<String> {
        if let Some(name) = node.id.as_deref()
            && let Some(index) = self.footnotes.lookup(name)
        {
            return Ok(rules::footnote_ref(index));
        }

        if node.text.is_none() && node.children().is_empty() {
            let name = node.id.as_deref().unwrap_or_default();
            tracing::warn!("footnote reference to unknown id: {}", name);
            return Ok(format!("[{}]", escape_text(name)));
        }

        let index = self.footnotes.reserve(node.id.as_deref());
        // The text lands in its own `<p>` in the notes body.
        let text = self.inline_or_text(id, node, InlineContext::Paragraph)?;
        self.footnotes.set_text(index, text);
        Ok(rules::footnote_ref(index))
    }

    fn inline_image(&mut self, node: &Node) -> Result<Option<String>> {
        let Some(target) = node.target.as_deref() else {
            tracing::warn!("inline image without a target, skipping");
            return Ok(None);
        };
        let target = image_target(self.tree, node, target);
        let href = self.resources.register(node, &target, MediaKind::Image)?;
        let alt = node.attr("alt").or(node.text.as_deref());
        Ok(Some(rules::inline_image(&href, alt)))
    }
}

fn node_text(node: &Node) -> String {
    node.text
        .as_deref()
        .map(|t| escape_text(t).into_owned())
        .unwrap_or_default()
}

/// Split a keyboard shortcut into keys. A trailing `++` stands for the plus
/// key itself.
fn split_keys(text: &str) -> Vec<&str> {
    let text = text.trim();
    if text == "+" {
        return vec!["+"];
    }
    let (body, plus) = match text.strip_suffix("++") {
        Some(body) => (body, true),
        None => (text, false),
    };
    let mut keys: Vec<&str> = body
        .split('+')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .collect();
    if plus {
        keys.push("+");
    }
    keys
}
