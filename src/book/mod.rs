//! Output aggregate: a FictionBook ready to be written out.

use chrono::NaiveDate;

/// A converted e-book.
///
/// Everything that affects serialized output is kept in ordered `Vec`s, so
/// writing the same book twice yields identical bytes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Book {
    pub metadata: Metadata,
    pub stylesheets: Vec<Stylesheet>,
    pub bodies: Vec<Body>,
    pub binaries: Vec<Binary>,
}

/// Book metadata (FB2 `title-info`, `document-info`, `publish-info`).
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    pub title: String,
    pub lang: String,
    pub keywords: Vec<String>,
    pub genres: Vec<String>,
    pub authors: Vec<Author>,
    pub series: Option<Series>,
    /// Revision date, shared by title-info and document-info.
    pub date: Option<BookDate>,
    /// Plain-text annotation.
    pub annotation: Option<String>,
    pub identifier: String,
    pub version: Option<String>,
    pub program_used: Option<String>,
    pub publishers: Vec<String>,
    /// Image hrefs shown on the cover page.
    pub coverpage: Vec<String>,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            title: String::new(),
            lang: "en".to_string(),
            keywords: Vec::new(),
            genres: Vec::new(),
            authors: Vec::new(),
            series: None,
            date: None,
            annotation: None,
            identifier: String::new(),
            version: None,
            program_used: None,
            publishers: Vec::new(),
            coverpage: Vec::new(),
        }
    }
}

/// A book author.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Author {
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub nickname: Option<String>,
    pub home_pages: Vec<String>,
    pub emails: Vec<String>,
}

/// Series (FB2 `sequence`) the book belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Series {
    pub name: String,
    pub number: Option<u32>,
}

/// A date as written in the document plus its calendar value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDate {
    pub display: String,
    pub value: NaiveDate,
}

/// A body of the book. The unnamed body holds the main content; the body
/// named `notes` holds footnotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Body {
    pub name: Option<String>,
    pub content: String,
}

/// Embedded binary resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binary {
    /// Identifier, unique within the book and free of path separators.
    pub id: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Embedded stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stylesheet {
    pub content_type: String,
    pub content: String,
}

impl Book {
    pub fn new() -> Self {
        Self::default()
    }

    /// The primary (unnamed) body.
    pub fn main_body(&self) -> Option<&Body> {
        self.bodies.iter().find(|b| b.name.is_none())
    }

    /// The footnotes body, if any footnote was referenced.
    pub fn notes_body(&self) -> Option<&Body> {
        self.bodies
            .iter()
            .find(|b| b.name.as_deref() == Some(Body::NOTES))
    }

    /// Get a binary by id.
    pub fn binary(&self, id: &str) -> Option<&Binary> {
        self.binaries.iter().find(|b| b.id == id)
    }

    /// Add a binary resource.
    pub fn add_binary(
        &mut self,
        id: impl Into<String>,
        data: Vec<u8>,
        content_type: Option<impl Into<String>>,
    ) {
        self.binaries.push(Binary {
            id: id.into(),
            content_type: content_type.map(Into::into),
            data,
        });
    }
}

impl Metadata {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_author(mut self, author: Author) -> Self {
        self.authors.push(author);
        self
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }
}

impl Author {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: Some(first_name.into()),
            last_name: Some(last_name.into()),
            ..Default::default()
        }
    }

    /// Name shown in listings: first, middle, and last name joined by spaces.
    pub fn display_name(&self) -> String {
        [&self.first_name, &self.middle_name, &self.last_name]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Body {
    /// Name of the footnotes body.
    pub const NOTES: &'static str = "notes";

    pub fn main(content: impl Into<String>) -> Self {
        Self {
            name: None,
            content: content.into(),
        }
    }

    pub fn notes(content: impl Into<String>) -> Self {
        Self {
            name: Some(Self::NOTES.to_string()),
            content: content.into(),
        }
    }
}
