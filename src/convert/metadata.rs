//! Book metadata from document attributes.

use chrono::NaiveDate;

use super::ConvertOptions;
use crate::book::{Author, BookDate, Metadata, Series};
use crate::document::{DocumentAuthor, DocumentTree};
use crate::error::{Error, Result};

/// Date formats accepted for `revdate` / `docdate`, tried in order.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
];

/// Formats that may be followed by a time of day.
const DATE_TIME_PREFIX_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Build the metadata block of the book. The cover page is left empty; it
/// needs the resource registry and is filled in by the caller.
pub fn build_metadata(tree: &DocumentTree, options: &ConvertOptions) -> Result<Metadata> {
    let title = tree
        .title()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(Error::MissingTitle)?;

    let mut metadata = Metadata::new(title);
    if let Some(lang) = tree.attr("lang").filter(|l| !l.is_empty()) {
        metadata.lang = lang.to_string();
    }
    metadata.keywords = tree.attr("keywords").map(split_list).unwrap_or_default();
    metadata.genres = tree.attr("genres").map(split_list).unwrap_or_default();
    metadata.authors = tree.authors.iter().map(convert_author).collect();
    metadata.series = series(tree);
    metadata.date = Some(document_date(tree)?);
    metadata.annotation = tree.attr("description").map(str::to_string);
    metadata.identifier = tree.attr("uuid").unwrap_or_default().to_string();
    metadata.version = tree.attr("revnumber").map(str::to_string);
    metadata.program_used = Some(program_used(tree, options));
    metadata.publishers = tree
        .attr("publisher")
        .map(|p| vec![p.to_string()])
        .unwrap_or_default();
    Ok(metadata)
}

/// Split a comma-separated attribute, trimming whitespace around each entry
/// and dropping empty ones.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn convert_author(author: &DocumentAuthor) -> Author {
    Author {
        first_name: author.first_name.clone(),
        middle_name: author.middle_name.clone(),
        last_name: author.last_name.clone(),
        emails: author.email.iter().cloned().collect(),
        ..Default::default()
    }
}

fn series(tree: &DocumentTree) -> Option<Series> {
    let name = tree.attr("series-name").filter(|n| !n.is_empty())?;
    let number = match tree.attr("series-volume") {
        None => Some(1),
        Some(volume) => match volume.trim().parse::<u32>() {
            Ok(n) => Some(n),
            Err(_) => {
                tracing::warn!("ignoring non-numeric series-volume: {}", volume);
                None
            }
        },
    };
    Some(Series {
        name: name.to_string(),
        number,
    })
}

fn document_date(tree: &DocumentTree) -> Result<BookDate> {
    let (attribute, value) = ["revdate", "docdate"]
        .into_iter()
        .find_map(|name| tree.attr(name).map(|v| (name, v)))
        .ok_or(Error::MissingDate)?;
    parse_date(attribute, value)
}

/// Parse a document date, keeping the text as written for display.
pub fn parse_date(attribute: &str, value: &str) -> Result<BookDate> {
    let trimmed = value.trim();
    let parsed = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            let (day, _time) = trimmed.split_once(char::is_whitespace)?;
            DATE_TIME_PREFIX_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(day, fmt).ok())
        });

    match parsed {
        Some(value) => Ok(BookDate {
            display: trimmed.to_string(),
            value,
        }),
        None => Err(Error::InvalidDate {
            attribute: attribute.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Name and version of the generating program.
pub fn program_used(tree: &DocumentTree, options: &ConvertOptions) -> String {
    let mut program = format!("Kniga {}", env!("CARGO_PKG_VERSION"));
    if let Some(version) = tree.attr("asciidoctor-version") {
        program.push_str(&format!(" using Asciidoctor {version}"));
    } else if let Some(generator) = &options.generator {
        program.push_str(&format!(" using {generator}"));
    }
    program
}

/// Image path of the `front-cover-image` attribute, which may be written
/// either as a plain path or as an `image:path[attrs]` macro.
pub fn cover_target(value: &str) -> Option<&str> {
    let value = value.trim();
    let path = match value.strip_prefix("image:") {
        Some(rest) => {
            let rest = rest.strip_prefix(':').unwrap_or(rest);
            rest.split_once('[').map_or(rest, |(path, _)| path)
        }
        None => value,
    };
    Some(path.trim()).filter(|p| !p.is_empty())
}
