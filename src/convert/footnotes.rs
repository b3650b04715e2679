//! Footnote collection.
//!
//! Indices are handed out when a footnote is first referenced, starting at
//! 1. The index is reserved before the footnote text renders, so a footnote
//! nested in another footnote's text numbers after its parent.

use std::collections::HashMap;

use super::rules;

/// A collected footnote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Footnote {
    pub index: usize,
    pub id: Option<String>,
    /// Rendered inline markup.
    pub text: String,
}

#[derive(Debug, Default)]
pub struct FootnoteCollector {
    entries: Vec<Footnote>,
    by_id: HashMap<String, usize>,
}

impl FootnoteCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next index. The text is filled in by [`set_text`](Self::set_text).
    pub fn reserve(&mut self, id: Option<&str>) -> usize {
        let index = self.entries.len() + 1;
        if let Some(id) = id {
            self.by_id.insert(id.to_string(), index);
        }
        self.entries.push(Footnote {
            index,
            id: id.map(str::to_string),
            text: String::new(),
        });
        index
    }

    pub fn set_text(&mut self, index: usize, text: String) {
        if let Some(entry) = index.checked_sub(1).and_then(|i| self.entries.get_mut(i)) {
            entry.text = text;
        }
    }

    /// Index of an already collected footnote.
    pub fn lookup(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    #[cfg(test)]
    pub(crate) fn entries(&self) -> &[Footnote] {
        &self.entries
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Content of the `notes` body, or `None` when nothing was referenced.
    pub fn render_body(&self, title: &str) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }
        let entries: Vec<String> = self
            .entries
            .iter()
            .map(|f| rules::footnote_entry(f.index, &f.text))
            .collect();
        Some(rules::notes_body(title, &entries))
    }
}
