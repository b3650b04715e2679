//! Small shared helpers: escaping, URI sniffing, media type detection, and
//! text decoding.

use std::borrow::Cow;

// ============================================================================
// XML Escaping
// ============================================================================

/// Escape text content for inclusion between XML tags.
///
/// Quotes are left alone so prose stays readable in the generated markup.
pub fn escape_text(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>']) {
        return Cow::Borrowed(s);
    }
    let mut result = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            _ => result.push(c),
        }
    }
    Cow::Owned(result)
}

/// Escape a value for use inside a double-quoted XML attribute.
pub fn escape_xml(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    result
}

// ============================================================================
// URI Detection
// ============================================================================

/// Whether a reference looks like a URI (`scheme:` with a scheme of at least
/// two characters, so Windows drive letters are not mistaken for one).
///
/// ```ignore
/// assert!(is_uri("https://example.org/cover.png"));
/// assert!(is_uri("data:image/png;base64,AAAA"));
/// assert!(!is_uri("images/cover.png"));
/// assert!(!is_uri("C:\\images\\cover.png"));
/// ```
pub fn is_uri(target: &str) -> bool {
    let mut chars = target.char_indices();
    match chars.next() {
        Some((_, c)) if c.is_alphabetic() => {}
        _ => return false,
    }
    for (i, c) in chars {
        if c == ':' {
            return i >= 2;
        }
        if !(c.is_alphanumeric() || matches!(c, '.' | '+' | '-')) {
            return false;
        }
    }
    false
}

// ============================================================================
// Resource Format Detection
// ============================================================================

/// Format of an embedded resource, judged by extension and then by leading
/// bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFormat {
    Jpeg,
    Png,
    Gif,
    Svg,
    WebP,
    Css,
    Unknown,
}

impl MediaFormat {
    /// Content type written to the `<binary>` element.
    pub fn mime_type(self) -> Option<&'static str> {
        match self {
            MediaFormat::Jpeg => Some("image/jpeg"),
            MediaFormat::Png => Some("image/png"),
            MediaFormat::Gif => Some("image/gif"),
            MediaFormat::Svg => Some("image/svg+xml"),
            MediaFormat::WebP => Some("image/webp"),
            MediaFormat::Css => Some("text/css"),
            MediaFormat::Unknown => None,
        }
    }

    pub fn is_image(self) -> bool {
        !matches!(self, MediaFormat::Css | MediaFormat::Unknown)
    }
}

pub fn detect_media_format(path: &str, data: &[u8]) -> MediaFormat {
    let ext = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => return MediaFormat::Jpeg,
        "png" => return MediaFormat::Png,
        "gif" => return MediaFormat::Gif,
        "svg" => return MediaFormat::Svg,
        "webp" => return MediaFormat::WebP,
        "css" => return MediaFormat::Css,
        _ => {}
    }

    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        MediaFormat::Jpeg
    } else if data.starts_with(b"\x89PNG") {
        MediaFormat::Png
    } else if data.starts_with(b"GIF8") {
        MediaFormat::Gif
    } else if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        MediaFormat::WebP
    } else {
        MediaFormat::Unknown
    }
}

// ============================================================================
// Encoding Detection
// ============================================================================

/// Decode stylesheet bytes to a string.
///
/// 1. Tries UTF-8 (handles BOM automatically via encoding_rs)
/// 2. If malformed, tries the encoding named by a leading `@charset` rule
/// 3. Falls back to Windows-1252
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);

    if !malformed {
        return result;
    }

    if let Some(name) = extract_css_charset(bytes)
        && let Some(encoding) = encoding_rs::Encoding::for_label(name.as_bytes())
    {
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// Extract the encoding name from a leading `@charset "...";` rule.
fn extract_css_charset(bytes: &[u8]) -> Option<&str> {
    let rest = bytes.strip_prefix(b"@charset \"")?;
    let end = rest.iter().take(64).position(|&b| b == b'"')?;
    std::str::from_utf8(&rest[..end]).ok()
}

// ============================================================================
// Tests
// ============================================================================
