//! String capabilities applied to coerced string values.
//!
//! Plain string fields are escaped so they can never render as markup.
//! Fields listed in a type's `html_fields` are unescaped first and then
//! sanitized down to a small set of formatting tags.

use regex_lite::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

/// Escape / sanitize capability used by the coercer.
pub trait Sanitizer: Send + Sync {
    /// Neutralizes markup-significant characters.
    fn escape(&self, raw: &str) -> String;

    /// Reverses entity escaping.
    fn unescape(&self, raw: &str) -> String;

    /// Strips disallowed markup, keeping a safe subset.
    fn sanitize_html(&self, raw: &str) -> String;
}

/// Tags that survive [`HtmlSanitizer::sanitize_html`].
pub const ALLOWED_TAGS: &[&str] = &[
    "a", "b", "blockquote", "br", "code", "em", "i", "li", "ol", "p", "pre", "strong", "u", "ul",
];

/// Default sanitizer backed by `html-escape`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlSanitizer;

impl HtmlSanitizer {
    pub fn new() -> Self {
        Self
    }
}

fn block_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?is)<\s*(script|style)\b[^>]*>.*?<\s*/\s*(script|style)\s*>")
            .expect("static pattern")
    })
}

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)<\s*(/?)\s*([a-zA-Z][a-zA-Z0-9]*)([^>]*)>").expect("static pattern")
    })
}

fn href_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)\bhref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
            .expect("static pattern")
    })
}

fn safe_href(attrs: &str) -> Option<String> {
    let caps = href_pattern().captures(attrs)?;
    let href = caps
        .get(1)
        .or_else(|| caps.get(2))
        .or_else(|| caps.get(3))?
        .as_str()
        .trim();
    let scheme: String = href
        .chars()
        .filter(|c| !c.is_whitespace())
        .take(11)
        .collect::<String>()
        .to_ascii_lowercase();
    if scheme.starts_with("javascript:") || scheme.starts_with("data:") || scheme.starts_with("vbscript:") {
        return None;
    }
    Some(html_escape::encode_double_quoted_attribute(href).into_owned())
}

impl Sanitizer for HtmlSanitizer {
    fn escape(&self, raw: &str) -> String {
        html_escape::encode_safe(raw).into_owned()
    }

    fn unescape(&self, raw: &str) -> String {
        html_escape::decode_html_entities(raw).into_owned()
    }

    fn sanitize_html(&self, raw: &str) -> String {
        let without_blocks: Cow<'_, str> = block_pattern().replace_all(raw, "");
        tag_pattern()
            .replace_all(&without_blocks, |caps: &regex_lite::Captures<'_>| {
                let closing = &caps[1];
                let name = caps[2].to_ascii_lowercase();
                if !ALLOWED_TAGS.contains(&name.as_str()) {
                    return String::new();
                }
                if closing.is_empty() && name == "a" {
                    if let Some(href) = safe_href(&caps[3]) {
                        return format!("<a href=\"{href}\">");
                    }
                }
                format!("<{closing}{name}>")
            })
            .into_owned()
    }
}
