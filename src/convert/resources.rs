//! Resource registry.
//!
//! Resolves image and stylesheet references to local files, embeds them as
//! book binaries, and hands back the `#id` reference used in markup. URIs are
//! never fetched and pass through unchanged.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::ConvertOptions;
use crate::book::{Binary, Stylesheet};
use crate::document::{DocumentTree, Node};
use crate::error::{Error, Result};
use crate::util::{decode_text, detect_media_format, is_uri};

/// What a resource is used for; decides the fallback content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Stylesheet,
}

impl MediaKind {
    fn content_type(self, target: &str, data: &[u8]) -> Option<String> {
        let format = detect_media_format(target, data);
        if self == MediaKind::Image && !format.is_image() {
            tracing::warn!("embedding image of unrecognized format: {}", target);
        }
        match (format.mime_type(), self) {
            (Some(mime), _) => Some(mime.to_string()),
            (None, MediaKind::Stylesheet) => Some("text/css".to_string()),
            (None, MediaKind::Image) => None,
        }
    }
}

/// Binary resources collected during one conversion.
pub struct ResourceRegistry<'a> {
    tree: &'a DocumentTree,
    options: &'a ConvertOptions,
    binaries: Vec<Binary>,
    by_path: HashMap<PathBuf, String>,
    taken: HashSet<String>,
}

impl<'a> ResourceRegistry<'a> {
    pub fn new(tree: &'a DocumentTree, options: &'a ConvertOptions) -> Self {
        Self {
            tree,
            options,
            binaries: Vec::new(),
            by_path: HashMap::new(),
            taken: HashSet::new(),
        }
    }

    /// Register the resource `target` referenced from `node` and return the
    /// reference to put in markup.
    ///
    /// A target that cannot be found is logged and returned as is. A file
    /// that exists but cannot be read aborts the conversion.
    pub fn register(&mut self, node: &Node, target: &str, kind: MediaKind) -> Result<String> {
        if is_uri(target) {
            return Ok(target.to_string());
        }

        let Some((path, data)) = self.resolve(node, target)? else {
            tracing::warn!("resource not found, leaving reference unresolved: {}", target);
            return Ok(target.to_string());
        };

        if let Some(id) = self.by_path.get(&path) {
            return Ok(format!("#{id}"));
        }

        let id = self.unique_id(&sanitize_id(target));
        let content_type = kind.content_type(target, &data);
        tracing::debug!(
            "embedding {} as {} ({} bytes)",
            path.display(),
            id,
            data.len()
        );

        self.by_path.insert(path, id.clone());
        self.taken.insert(id.clone());
        self.binaries.push(Binary {
            id: id.clone(),
            content_type,
            data,
        });
        Ok(format!("#{id}"))
    }

    /// Load a stylesheet to embed verbatim in the book header.
    pub fn load_stylesheet(&self, target: &str) -> Result<Option<Stylesheet>> {
        let root = self.tree.root();
        let Some((path, data)) = self.resolve(root, target)? else {
            tracing::warn!("stylesheet not found: {}", target);
            return Ok(None);
        };
        tracing::debug!("embedding stylesheet {}", path.display());
        let content_type = MediaKind::Stylesheet
            .content_type(target, &data)
            .unwrap_or_else(|| "text/css".to_string());
        Ok(Some(Stylesheet {
            content_type,
            content: decode_text(&data).into_owned(),
        }))
    }

    #[cfg(test)]
    pub(crate) fn binaries(&self) -> &[Binary] {
        &self.binaries
    }

    /// Embedded binaries in first-registration order.
    pub fn into_binaries(self) -> Vec<Binary> {
        self.binaries
    }

    /// Directory a node's resources are looked up in first: the node's
    /// `outdir` attribute, then the document's, then the configured one.
    fn output_dir(&self, node: &Node) -> Option<PathBuf> {
        node.attr("outdir")
            .or_else(|| self.tree.attr("outdir"))
            .map(PathBuf::from)
            .or_else(|| self.options.to_dir.clone())
    }

    fn candidates(&self, node: &Node, target: &str) -> Vec<PathBuf> {
        let mut paths = Vec::with_capacity(2);
        if let Some(dir) = self.output_dir(node) {
            paths.push(dir.join(target));
        }
        paths.push(self.tree.base_dir.join(target));
        paths
    }

    fn resolve(&self, node: &Node, target: &str) -> Result<Option<(PathBuf, Vec<u8>)>> {
        for path in self.candidates(node, target) {
            match fs::read(&path) {
                Ok(data) => return Ok(Some((path, data))),
                Err(e)
                    if matches!(
                        e.kind(),
                        ErrorKind::NotFound | ErrorKind::NotADirectory | ErrorKind::IsADirectory
                    ) =>
                {
                    continue;
                }
                Err(source) => return Err(Error::ResourceRead { path, source }),
            }
        }
        Ok(None)
    }

    /// `id`, or `id` with a numeric suffix before the extension when a
    /// different file already uses it.
    fn unique_id(&self, id: &str) -> String {
        if !self.taken.contains(id) {
            return id.to_string();
        }
        let (stem, ext) = match id.rfind('.') {
            Some(dot) if dot > 0 => id.split_at(dot),
            _ => (id, ""),
        };
        (2..)
            .map(|n| format!("{stem}-{n}{ext}"))
            .find(|candidate| !self.taken.contains(candidate))
            .unwrap_or_else(|| id.to_string())
    }
}

/// Replace path separators, which FB2 readers reject in binary ids.
pub fn sanitize_id(target: &str) -> String {
    target.replace(['/', '\\'], "_")
}

/// Image reference with the `imagesdir` prefix applied.
///
/// URIs and absolute paths are left alone.
pub fn image_target(tree: &DocumentTree, node: &Node, target: &str) -> String {
    if is_uri(target) || Path::new(target).is_absolute() {
        return target.to_string();
    }
    match node
        .attr("imagesdir")
        .or_else(|| tree.attr("imagesdir"))
        .filter(|dir| !dir.is_empty())
    {
        Some(dir) if dir.ends_with('/') => format!("{dir}{target}"),
        Some(dir) => format!("{dir}/{target}"),
        None => target.to_string(),
    }
}
