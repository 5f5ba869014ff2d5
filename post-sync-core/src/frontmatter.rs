//! Front matter rendering and identity-token recovery.
//!
//! The header is emitted line by line in a fixed order so the same metadata always
//! produces the same bytes. Strings go through JSON string escaping, which is valid
//! inside YAML double quotes, so titles with quotes or colons cannot break the header.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use crate::identity::IdentityToken;
use crate::metadata::PostMetadata;

pub const FENCE: &str = "---";
pub const ID_KEY: &str = "notion_id";

fn quote(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

pub fn render_header(meta: &PostMetadata, token: &IdentityToken, layout: &str) -> String {
    let mut lines = vec![
        FENCE.to_string(),
        format!("layout: {}", quote(layout)),
        format!("title: {}", quote(&meta.title)),
        format!("date: {}", meta.publish_date.format("%Y-%m-%d")),
        format!("slug: {}", meta.slug),
    ];
    if !meta.tags.is_empty() {
        let tags: Vec<String> = meta.tags.iter().map(|t| quote(t)).collect();
        lines.push(format!("tags: [{}]", tags.join(", ")));
    }
    let optional = [
        ("excerpt", &meta.description),
        ("cover_image", &meta.cover_image),
        ("canonical_url", &meta.canonical_url),
    ];
    for (key, value) in optional {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            lines.push(format!("{key}: {}", quote(value)));
        }
    }
    if meta.featured {
        lines.push("featured: true".to_string());
    }
    lines.push(format!("{ID_KEY}: {}", quote(token.as_str())));
    lines.push(FENCE.to_string());
    lines.join("\n")
}

/// Full file content: header, blank line, body, trailing newline.
pub fn compose_file(header: &str, body: &str) -> String {
    format!("{header}\n\n{body}\n")
}

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(&format!(r#"(?m)^{ID_KEY}:\s*"?([0-9a-fA-F-]{{36}})"?\s*$"#))
            .expect("valid regex")
    })
}

/// The lines between a leading `---` fence and the next `---` line, without the fences.
/// `None` when the file does not open with a complete header.
pub fn split_header(content: &str) -> Option<&str> {
    let rest = content.strip_prefix(FENCE)?;
    let rest = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))?;
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == FENCE {
            return Some(&rest[..offset]);
        }
        offset += line.len();
    }
    None
}

/// Find the identity token in a file's header, quoted or not. The body is never searched.
pub fn extract_token(content: &str) -> Option<IdentityToken> {
    let header = split_header(content)?;
    let captures = token_pattern().captures(header)?;
    IdentityToken::parse(captures.get(1)?.as_str()).ok()
}
