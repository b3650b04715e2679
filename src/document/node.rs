//! Document tree node types and kinds.

use std::collections::BTreeMap;

/// Unique identifier for a node within a [`DocumentTree`](super::DocumentTree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The root document node ID (always 0).
    pub const ROOT: NodeId = NodeId(0);
}

/// Kind of a document node.
///
/// Block kinds come first, inline kinds after. `Unknown` carries the name of
/// a node kind the converter has no rule for; such nodes are skipped with a
/// warning instead of aborting the conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "snake_case"))]
pub enum NodeKind {
    /// Root document, or a nested document inside an AsciiDoc table cell.
    Document,
    /// Section with its heading level (1 = chapter).
    Section { level: u8 },
    /// Content before the first section.
    Preamble,
    Paragraph,
    /// Source listing; `text` holds the verbatim lines.
    Listing,
    /// Literal block; `text` holds the verbatim lines.
    Literal,
    /// Quote block (`attribution` / `citetitle` attributes).
    Quote,
    /// Verse block; `text` holds the stanzas separated by blank lines.
    Verse,
    Sidebar,
    Admonition(AdmonitionKind),
    UnorderedList,
    OrderedList,
    /// Item of an unordered or ordered list, or the description of a
    /// definition list entry. Inline children form the principal text,
    /// block children follow.
    ListItem,
    DefinitionList,
    /// One definition list entry: `DefinitionTerm` children followed by an
    /// optional `ListItem` description.
    DefinitionEntry,
    DefinitionTerm,
    Table,
    TableRow(RowGroup),
    TableCell(CellSpec),
    /// Block image; `target` is the image reference.
    Image,
    ThematicBreak,
    PageBreak,
    /// Table of contents marker.
    Toc,

    /// Literal text run.
    Text,
    InlineQuoted(QuoteKind),
    InlineAnchor(AnchorKind),
    /// Footnote reference. Children (or `text`) hold the footnote text; `id`
    /// names it so later references can reuse its number.
    InlineFootnote,
    InlineImage,
    /// Menu selection; `text` holds the path segments separated by `>`.
    InlineMenu,
    InlineButton,
    /// Keyboard shortcut; `text` holds the keys separated by `+`.
    InlineKbd,
    /// Hard line break after `text`.
    InlineBreak,
    InlineIndexterm { visible: bool },

    /// Any node kind without a rendering rule.
    Unknown(String),
}

impl NodeKind {
    /// Whether nodes of this kind are inline content.
    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            NodeKind::Text
                | NodeKind::InlineQuoted(_)
                | NodeKind::InlineAnchor(_)
                | NodeKind::InlineFootnote
                | NodeKind::InlineImage
                | NodeKind::InlineMenu
                | NodeKind::InlineButton
                | NodeKind::InlineKbd
                | NodeKind::InlineBreak
                | NodeKind::InlineIndexterm { .. }
        )
    }

    /// Whether a block of this kind ends with an `<empty-line/>` separator
    /// unless it is the last block of its container.
    pub fn emits_separator(&self) -> bool {
        matches!(
            self,
            NodeKind::Paragraph
                | NodeKind::Listing
                | NodeKind::Literal
                | NodeKind::UnorderedList
                | NodeKind::OrderedList
                | NodeKind::Admonition(_)
        )
    }

    /// Short name used in log messages.
    pub fn name(&self) -> &str {
        match self {
            NodeKind::Document => "document",
            NodeKind::Section { .. } => "section",
            NodeKind::Preamble => "preamble",
            NodeKind::Paragraph => "paragraph",
            NodeKind::Listing => "listing",
            NodeKind::Literal => "literal",
            NodeKind::Quote => "quote",
            NodeKind::Verse => "verse",
            NodeKind::Sidebar => "sidebar",
            NodeKind::Admonition(_) => "admonition",
            NodeKind::UnorderedList => "ulist",
            NodeKind::OrderedList => "olist",
            NodeKind::ListItem => "list_item",
            NodeKind::DefinitionList => "dlist",
            NodeKind::DefinitionEntry => "dlist_entry",
            NodeKind::DefinitionTerm => "dlist_term",
            NodeKind::Table => "table",
            NodeKind::TableRow(_) => "table_row",
            NodeKind::TableCell(_) => "table_cell",
            NodeKind::Image => "image",
            NodeKind::ThematicBreak => "thematic_break",
            NodeKind::PageBreak => "page_break",
            NodeKind::Toc => "toc",
            NodeKind::Text => "text",
            NodeKind::InlineQuoted(_) => "inline_quoted",
            NodeKind::InlineAnchor(_) => "inline_anchor",
            NodeKind::InlineFootnote => "inline_footnote",
            NodeKind::InlineImage => "inline_image",
            NodeKind::InlineMenu => "inline_menu",
            NodeKind::InlineButton => "inline_button",
            NodeKind::InlineKbd => "inline_kbd",
            NodeKind::InlineBreak => "inline_break",
            NodeKind::InlineIndexterm { .. } => "inline_indexterm",
            NodeKind::Unknown(name) => name,
        }
    }
}

/// Admonition flavor; drives the default label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "snake_case"))]
pub enum AdmonitionKind {
    Note,
    Tip,
    Important,
    Caution,
    Warning,
}

impl AdmonitionKind {
    /// Attribute-name form (`note`, `tip`, ...).
    pub fn name(self) -> &'static str {
        match self {
            AdmonitionKind::Note => "note",
            AdmonitionKind::Tip => "tip",
            AdmonitionKind::Important => "important",
            AdmonitionKind::Caution => "caution",
            AdmonitionKind::Warning => "warning",
        }
    }

    /// Default caption when neither a title nor a caption attribute is set.
    pub fn caption(self) -> &'static str {
        match self {
            AdmonitionKind::Note => "Note",
            AdmonitionKind::Tip => "Tip",
            AdmonitionKind::Important => "Important",
            AdmonitionKind::Caution => "Caution",
            AdmonitionKind::Warning => "Warning",
        }
    }
}

/// Inline quoted text styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "snake_case"))]
pub enum QuoteKind {
    Monospaced,
    Emphasis,
    Strong,
    Double,
    Single,
    Mark,
    Superscript,
    Subscript,
    Asciimath,
    Latexmath,
    Unquoted,
}

/// Inline anchor types.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "snake_case"))]
pub enum AnchorKind {
    /// Cross reference to an id in the document.
    Xref,
    /// Hyperlink.
    Link,
    /// Inline anchor definition.
    Ref,
    /// Bibliography entry anchor.
    Bibref,
    Other(String),
}

/// Table row group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "snake_case"))]
pub enum RowGroup {
    Head,
    #[default]
    Body,
    Foot,
}

/// Content style of a table cell. A cell has exactly one style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "snake_case"))]
pub enum CellStyle {
    /// Nested document: block children rendered as blocks.
    Asciidoc,
    Emphasis,
    Literal,
    Monospaced,
    Strong,
    /// Header-style cell in the table body (rendered as `th`).
    Header,
    #[default]
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "snake_case"))]
pub enum HAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl HAlign {
    pub fn as_str(self) -> &'static str {
        match self {
            HAlign::Left => "left",
            HAlign::Center => "center",
            HAlign::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "snake_case"))]
pub enum VAlign {
    #[default]
    Top,
    Middle,
    Bottom,
}

impl VAlign {
    pub fn as_str(self) -> &'static str {
        match self {
            VAlign::Top => "top",
            VAlign::Middle => "middle",
            VAlign::Bottom => "bottom",
        }
    }
}

/// Layout of a table cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(default))]
pub struct CellSpec {
    pub style: CellStyle,
    pub halign: HAlign,
    pub valign: VAlign,
    pub colspan: u32,
    pub rowspan: u32,
}

impl Default for CellSpec {
    fn default() -> Self {
        Self {
            style: CellStyle::Plain,
            halign: HAlign::Left,
            valign: VAlign::Top,
            colspan: 1,
            rowspan: 1,
        }
    }
}

impl CellSpec {
    pub fn with_style(mut self, style: CellStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_align(mut self, halign: HAlign, valign: VAlign) -> Self {
        self.halign = halign;
        self.valign = valign;
        self
    }

    pub fn with_span(mut self, colspan: u32, rowspan: u32) -> Self {
        self.colspan = colspan;
        self.rowspan = rowspan;
        self
    }
}

/// A node in the document tree.
#[derive(Debug, Clone)]
pub struct Node {
    /// What the node is.
    pub kind: NodeKind,
    /// Parent node (None for the root).
    pub parent: Option<NodeId>,
    /// Ordered children.
    pub(crate) children: Vec<NodeId>,
    /// Identifier (anchor id).
    pub id: Option<String>,
    /// Block title.
    pub title: Option<String>,
    /// Literal text for leaf and inline kinds, verbatim lines for listings.
    pub text: Option<String>,
    /// Link or image target.
    pub target: Option<String>,
    /// Role set in source order.
    pub roles: Vec<String>,
    /// Attribute mapping.
    pub attributes: BTreeMap<String, String>,
}

impl Node {
    /// Create a new node with default values.
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            id: None,
            title: None,
            text: None,
            target: None,
            roles: Vec::new(),
            attributes: BTreeMap::new(),
        }
    }

    /// Create a text node.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(NodeKind::Text).with_text(text)
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        let role = role.into();
        if !self.roles.contains(&role) {
            self.roles.push(role);
        }
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Ordered children of this node.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Whether an option is enabled, either as a `{name}-option` attribute
    /// or as an entry in the comma-separated `options` attribute.
    pub fn has_option(&self, name: &str) -> bool {
        if self.attributes.contains_key(&format!("{name}-option")) {
            return true;
        }
        self.attr("options")
            .is_some_and(|opts| opts.split(',').any(|o| o.trim() == name))
    }
}
