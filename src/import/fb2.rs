//! FictionBook 2 reader.
//!
//! Body markup is kept verbatim: the reader records the byte range between
//! `<body>` and `</body>` instead of rebuilding it from events.

use std::io::{Read, Seek};
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::NaiveDate;
use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};

use crate::book::{Author, Binary, Body, Book, BookDate, Series, Stylesheet};
use crate::error::{Error, Result};

/// Parse an `.fb2` document.
pub fn read_fb2(bytes: &[u8]) -> Result<Book> {
    let content = String::from_utf8(strip_bom(bytes).to_vec())?;
    Fb2Parser::new(&content).parse()
}

/// Parse an `.fb2.zip` archive; the first `.fb2` entry is read.
pub fn read_fb2_zip<R: Read + Seek>(reader: R) -> Result<Book> {
    let mut archive = zip::ZipArchive::new(reader)?;
    let index = (0..archive.len())
        .find(|&i| {
            archive
                .name_for_index(i)
                .is_some_and(|name| name.ends_with(".fb2"))
        })
        .ok_or_else(|| Error::InvalidFb2("archive has no .fb2 entry".into()))?;

    let mut entry = archive.by_index(index)?;
    let mut bytes = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut bytes)?;
    read_fb2(&bytes)
}

/// Read a `.fb2` or `.fb2.zip` file, picking the format by extension.
pub fn read_fb2_file<P: AsRef<Path>>(path: P) -> Result<Book> {
    let path = path.as_ref();
    let is_zip = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));
    if is_zip {
        read_fb2_zip(std::fs::File::open(path)?)
    } else {
        read_fb2(&std::fs::read(path)?)
    }
}

/// Which description block the parser is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    TitleInfo,
    DocumentInfo,
    PublishInfo,
}

struct Fb2Parser<'a> {
    content: &'a str,
    book: Book,
    section: Section,
    author: Option<Author>,
    annotation: Vec<String>,
    in_annotation: bool,
    /// Attributes of the element whose text is being collected.
    date_value: Option<String>,
    stylesheet_type: Option<String>,
    binary: Option<(String, Option<String>)>,
    text: String,
}

impl<'a> Fb2Parser<'a> {
    fn new(content: &'a str) -> Self {
        Self {
            content,
            book: Book::new(),
            section: Section::None,
            author: None,
            annotation: Vec::new(),
            in_annotation: false,
            date_value: None,
            stylesheet_type: None,
            binary: None,
            text: String::new(),
        }
    }

    fn parse(mut self) -> Result<Book> {
        let mut reader = Reader::from_str(self.content);
        let mut saw_root = false;

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = e.name();
                    let local = local_name(name.as_ref());
                    if local == b"FictionBook" {
                        saw_root = true;
                    }
                    if local == b"body" {
                        let body_name = attr_value(&e, b"name")?;
                        let start = reader.buffer_position() as usize;
                        let end = skip_body(&mut reader)?;
                        self.push_body(body_name, start, end);
                        continue;
                    }
                    self.start(local, &e)?;
                }
                Event::Empty(e) => {
                    let name = e.name();
                    self.empty(local_name(name.as_ref()), &e)?;
                }
                Event::Text(e) => self.text.push_str(&String::from_utf8_lossy(e.as_ref())),
                Event::GeneralRef(e) => {
                    let entity = String::from_utf8_lossy(e.as_ref());
                    if let Some(resolved) = resolve_entity(&entity) {
                        self.text.push_str(&resolved);
                    }
                }
                Event::End(e) => {
                    let name = e.name();
                    self.end(local_name(name.as_ref()))?;
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !saw_root {
            return Err(Error::InvalidFb2("missing FictionBook root element".into()));
        }
        Ok(self.book)
    }

    fn start(&mut self, local: &[u8], e: &BytesStart<'_>) -> Result<()> {
        self.text.clear();
        match local {
            b"title-info" => self.section = Section::TitleInfo,
            b"document-info" => self.section = Section::DocumentInfo,
            b"publish-info" => self.section = Section::PublishInfo,
            b"author" if self.section == Section::TitleInfo => {
                self.author = Some(Author::default());
            }
            b"annotation" if self.section == Section::TitleInfo => self.in_annotation = true,
            b"date" => self.date_value = attr_value(e, b"value")?,
            b"stylesheet" => self.stylesheet_type = attr_value(e, b"type")?,
            b"binary" => {
                let id = attr_value(e, b"id")?.unwrap_or_default();
                let content_type = attr_value(e, b"content-type")?;
                self.binary = Some((id, content_type));
            }
            _ => {}
        }
        Ok(())
    }

    fn empty(&mut self, local: &[u8], e: &BytesStart<'_>) -> Result<()> {
        match (self.section, local) {
            (Section::TitleInfo, b"image") => {
                if let Some(href) = attr_value(e, b"href")? {
                    self.book.metadata.coverpage.push(href);
                }
            }
            (Section::TitleInfo, b"sequence") => {
                let name = attr_value(e, b"name")?.unwrap_or_default();
                let number = attr_value(e, b"number")?.and_then(|n| n.parse().ok());
                self.book.metadata.series = Some(Series { name, number });
            }
            (_, b"stylesheet") => {
                let content_type = attr_value(e, b"type")?.unwrap_or_default();
                self.book.stylesheets.push(Stylesheet {
                    content_type,
                    content: String::new(),
                });
            }
            (_, b"binary") => {
                let id = attr_value(e, b"id")?.unwrap_or_default();
                let content_type = attr_value(e, b"content-type")?;
                self.book.binaries.push(Binary {
                    id,
                    content_type,
                    data: Vec::new(),
                });
            }
            _ => {}
        }
        Ok(())
    }

    fn end(&mut self, local: &[u8]) -> Result<()> {
        let text = std::mem::take(&mut self.text);
        let value = text.trim().to_string();
        let metadata = &mut self.book.metadata;

        match (self.section, local) {
            (_, b"title-info" | b"document-info" | b"publish-info") => {
                self.section = Section::None;
            }
            (Section::TitleInfo, b"author") => {
                if let Some(author) = self.author.take() {
                    metadata.authors.push(author);
                }
            }
            (Section::TitleInfo, b"first-name" | b"middle-name" | b"last-name" | b"nickname") => {
                if let Some(author) = self.author.as_mut() {
                    let field = match local {
                        b"first-name" => &mut author.first_name,
                        b"middle-name" => &mut author.middle_name,
                        b"last-name" => &mut author.last_name,
                        _ => &mut author.nickname,
                    };
                    *field = Some(value);
                }
            }
            (Section::TitleInfo, b"email") => {
                if let Some(author) = self.author.as_mut() {
                    author.emails.push(value);
                }
            }
            (Section::TitleInfo, b"home-page") => {
                if let Some(author) = self.author.as_mut() {
                    author.home_pages.push(value);
                }
            }
            (Section::TitleInfo, b"genre") => metadata.genres.push(value),
            (Section::TitleInfo, b"book-title") => metadata.title = value,
            (Section::TitleInfo, b"p") if self.in_annotation => self.annotation.push(value),
            (Section::TitleInfo, b"annotation") => {
                self.in_annotation = false;
                metadata.annotation = Some(std::mem::take(&mut self.annotation).join("\n"));
            }
            (Section::TitleInfo, b"keywords") => {
                metadata.keywords = value
                    .split(',')
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            (Section::TitleInfo, b"date") => {
                let parsed = self
                    .date_value
                    .take()
                    .and_then(|v| NaiveDate::parse_from_str(&v, "%Y-%m-%d").ok());
                if let Some(date) = parsed {
                    metadata.date = Some(BookDate {
                        display: value,
                        value: date,
                    });
                }
            }
            (Section::TitleInfo, b"lang") => metadata.lang = value,
            (Section::DocumentInfo, b"program-used") => metadata.program_used = Some(value),
            (Section::DocumentInfo, b"id") => metadata.identifier = value,
            (Section::DocumentInfo, b"version") => metadata.version = Some(value),
            (Section::PublishInfo, b"publisher") => metadata.publishers.push(value),
            (_, b"stylesheet") => {
                let content_type = self.stylesheet_type.take().unwrap_or_default();
                self.book.stylesheets.push(Stylesheet {
                    content_type,
                    content: text,
                });
            }
            (_, b"binary") => {
                if let Some((id, content_type)) = self.binary.take() {
                    let payload: String = text.chars().filter(|c| !c.is_whitespace()).collect();
                    let data = STANDARD.decode(payload.as_bytes())?;
                    self.book.binaries.push(Binary {
                        id,
                        content_type,
                        data,
                    });
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn push_body(&mut self, name: Option<String>, start: usize, end: usize) {
        let raw = self.content.get(start..end).unwrap_or_default();
        let raw = raw.strip_prefix('\n').unwrap_or(raw);
        let raw = raw.strip_suffix('\n').unwrap_or(raw);
        self.book.bodies.push(Body {
            name,
            content: raw.to_string(),
        });
    }
}

/// Consume events up to the matching `</body>` and return the byte offset
/// where the closing tag starts.
fn skip_body(reader: &mut Reader<&[u8]>) -> Result<usize> {
    let mut depth = 0usize;
    loop {
        let before = reader.buffer_position() as usize;
        match reader.read_event()? {
            Event::Start(e) if local_name(e.name().as_ref()) == b"body" => depth += 1,
            Event::End(e) if local_name(e.name().as_ref()) == b"body" => {
                if depth == 0 {
                    return Ok(before);
                }
                depth -= 1;
            }
            Event::Eof => return Err(Error::InvalidFb2("unterminated <body>".into())),
            _ => {}
        }
    }
}

fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes().flatten() {
        if local_name(attr.key.as_ref()) == key {
            let raw = String::from_utf8(attr.value.to_vec())?;
            let value = unescape(&raw).map_err(|e| Error::InvalidFb2(e.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn strip_bom(data: &[u8]) -> &[u8] {
    data.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(data)
}

/// Extract local name from namespaced XML name (e.g., "l:href" -> "href").
fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}

/// Resolve XML entity references.
fn resolve_entity(entity: &str) -> Option<String> {
    match entity {
        "apos" => return Some("'".to_string()),
        "quot" => return Some("\"".to_string()),
        "lt" => return Some("<".to_string()),
        "gt" => return Some(">".to_string()),
        "amp" => return Some("&".to_string()),
        _ => {}
    }

    let code = match entity.strip_prefix("#x") {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => entity.strip_prefix('#')?.parse::<u32>().ok()?,
    };
    char::from_u32(code).map(|c| c.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::Metadata;
    use crate::export::render_fb2;

    #[test]
    fn test_round_trip_metadata() {
        let mut book = Book::new();
        book.metadata = Metadata::new("Tom & Jerry")
            .with_author(Author::new("Ann", "Smith"))
            .with_lang("ru")
            .with_identifier("urn:uuid:1");
        book.metadata.keywords = vec!["cats".into(), "mice".into()];
        book.metadata.genres = vec!["humor".into()];
        book.metadata.date = Some(BookDate {
            display: "2021-03-04".into(),
            value: NaiveDate::from_ymd_opt(2021, 3, 4).unwrap(),
        });
        book.metadata.coverpage = vec!["#cover.png".into()];
        book.metadata.publishers = vec!["House".into()];
        book.metadata.program_used = Some("Kniga".into());

        let parsed = read_fb2(render_fb2(&book).as_bytes()).unwrap();
        assert_eq!(parsed.metadata, book.metadata);
    }

    #[test]
    fn test_bodies_kept_verbatim() {
        let mut book = Book::new();
        book.metadata = Metadata::new("T");
        book.bodies.push(Body::main("<section>\n<p>a &amp; b</p>\n</section>"));
        book.bodies.push(Body::notes("<title><p>Footnotes</p></title>"));

        let parsed = read_fb2(render_fb2(&book).as_bytes()).unwrap();
        assert_eq!(parsed.bodies, book.bodies);
    }

    #[test]
    fn test_binaries_and_stylesheets() {
        let mut book = Book::new();
        book.metadata = Metadata::new("T");
        book.stylesheets.push(Stylesheet {
            content_type: "text/css".into(),
            content: "p > em { color: red }".into(),
        });
        book.add_binary("a.png", vec![0, 1, 2, 250], Some("image/png"));

        let parsed = read_fb2(render_fb2(&book).as_bytes()).unwrap();
        assert_eq!(parsed.stylesheets, book.stylesheets);
        assert_eq!(parsed.binaries, book.binaries);
    }

    #[test]
    fn test_not_fictionbook() {
        assert!(matches!(
            read_fb2(b"<html><body></body></html>"),
            Err(Error::InvalidFb2(_))
        ));
    }

    #[test]
    fn test_resolve_entity() {
        assert_eq!(resolve_entity("amp").as_deref(), Some("&"));
        assert_eq!(resolve_entity("#160").as_deref(), Some("\u{a0}"));
        assert_eq!(resolve_entity("#x25B8").as_deref(), Some("▸"));
        assert_eq!(resolve_entity("nbsp"), None);
    }
}
