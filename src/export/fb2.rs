//! Plain FictionBook 2.0 XML writer.

use std::io::{Seek, Write};
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::book::{Author, Book, BookDate, Metadata};
use crate::error::Result;
use crate::util::{escape_text, escape_xml};

use super::Exporter;

const FB2_NAMESPACE: &str = "http://www.gribuser.ru/xml/fictionbook/2.0";
const XLINK_NAMESPACE: &str = "http://www.w3.org/1999/xlink";

/// Writes a book as a single `.fb2` XML document.
#[derive(Debug, Clone, Default)]
pub struct Fb2Exporter;

impl Fb2Exporter {
    pub fn new() -> Self {
        Self
    }
}

impl Exporter for Fb2Exporter {
    fn export<W: Write + Seek>(&self, book: &Book, writer: &mut W) -> Result<()> {
        writer.write_all(render_fb2(book).as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}

/// Write a book to a `.fb2` file.
pub fn write_fb2<P: AsRef<Path>>(book: &Book, path: P) -> Result<()> {
    let mut file = std::fs::File::create(path)?;
    Fb2Exporter::new().export(book, &mut file)
}

/// Serialize a book to FictionBook XML.
pub fn render_fb2(book: &Book) -> String {
    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(&format!(
        "<FictionBook xmlns=\"{FB2_NAMESPACE}\" xmlns:l=\"{XLINK_NAMESPACE}\">\n"
    ));

    for stylesheet in &book.stylesheets {
        xml.push_str(&format!(
            "<stylesheet type=\"{}\">{}</stylesheet>\n",
            escape_xml(&stylesheet.content_type),
            escape_text(&stylesheet.content)
        ));
    }

    write_description(&mut xml, &book.metadata);

    for body in &book.bodies {
        match &body.name {
            Some(name) => xml.push_str(&format!("<body name=\"{}\">\n", escape_xml(name))),
            None => xml.push_str("<body>\n"),
        }
        xml.push_str(&body.content);
        xml.push_str("\n</body>\n");
    }

    for binary in &book.binaries {
        xml.push_str(&format!("<binary id=\"{}\"", escape_xml(&binary.id)));
        if let Some(content_type) = &binary.content_type {
            xml.push_str(&format!(" content-type=\"{}\"", escape_xml(content_type)));
        }
        xml.push('>');
        xml.push_str(&STANDARD.encode(&binary.data));
        xml.push_str("</binary>\n");
    }

    xml.push_str("</FictionBook>\n");
    xml
}

fn write_description(xml: &mut String, metadata: &Metadata) {
    xml.push_str("<description>\n");

    // title-info
    xml.push_str("<title-info>\n");
    for genre in &metadata.genres {
        push_element(xml, "genre", genre);
    }
    for author in &metadata.authors {
        write_author(xml, author);
    }
    push_element(xml, "book-title", &metadata.title);
    if let Some(annotation) = &metadata.annotation {
        xml.push_str("<annotation>\n");
        for line in annotation.lines().map(str::trim).filter(|l| !l.is_empty()) {
            push_element(xml, "p", line);
        }
        xml.push_str("</annotation>\n");
    }
    if !metadata.keywords.is_empty() {
        push_element(xml, "keywords", &metadata.keywords.join(", "));
    }
    if let Some(date) = &metadata.date {
        write_date(xml, date);
    }
    if !metadata.coverpage.is_empty() {
        xml.push_str("<coverpage>");
        for href in &metadata.coverpage {
            xml.push_str(&format!("<image l:href=\"{}\"/>", escape_xml(href)));
        }
        xml.push_str("</coverpage>\n");
    }
    push_element(xml, "lang", &metadata.lang);
    if let Some(series) = &metadata.series {
        xml.push_str(&format!("<sequence name=\"{}\"", escape_xml(&series.name)));
        if let Some(number) = series.number {
            xml.push_str(&format!(" number=\"{number}\""));
        }
        xml.push_str("/>\n");
    }
    xml.push_str("</title-info>\n");

    // document-info
    xml.push_str("<document-info>\n");
    for author in &metadata.authors {
        write_author(xml, author);
    }
    if let Some(program) = &metadata.program_used {
        push_element(xml, "program-used", program);
    }
    if let Some(date) = &metadata.date {
        write_date(xml, date);
    }
    push_element(xml, "id", &metadata.identifier);
    if let Some(version) = &metadata.version {
        push_element(xml, "version", version);
    }
    xml.push_str("</document-info>\n");

    // publish-info
    if !metadata.publishers.is_empty() {
        xml.push_str("<publish-info>\n");
        for publisher in &metadata.publishers {
            push_element(xml, "publisher", publisher);
        }
        xml.push_str("</publish-info>\n");
    }

    xml.push_str("</description>\n");
}

fn write_author(xml: &mut String, author: &Author) {
    xml.push_str("<author>");
    let fields = [
        ("first-name", &author.first_name),
        ("middle-name", &author.middle_name),
        ("last-name", &author.last_name),
        ("nickname", &author.nickname),
    ];
    for (tag, value) in fields {
        if let Some(value) = value {
            xml.push_str(&format!("<{tag}>{}</{tag}>", escape_text(value)));
        }
    }
    for page in &author.home_pages {
        xml.push_str(&format!("<home-page>{}</home-page>", escape_text(page)));
    }
    for email in &author.emails {
        xml.push_str(&format!("<email>{}</email>", escape_text(email)));
    }
    xml.push_str("</author>\n");
}

fn write_date(xml: &mut String, date: &BookDate) {
    xml.push_str(&format!(
        "<date value=\"{}\">{}</date>\n",
        date.value.format("%Y-%m-%d"),
        escape_text(&date.display)
    ));
}

fn push_element(xml: &mut String, tag: &str, text: &str) {
    xml.push_str(&format!("<{tag}>{}</{tag}>\n", escape_text(text)));
}
