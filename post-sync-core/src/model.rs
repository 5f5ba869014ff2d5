//! Records returned by the content API, and the block model derived from them.
//!
//! Pages, property values and rich text deserialise straight from the API's JSON.
//! Blocks arrive as loosely-typed [`BlockRecord`]s and are narrowed into the closed
//! [`ContentBlock`] set; kinds this crate does not render become [`ContentBlock::Unknown`].

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

/// One page of a cursor-paginated listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ListPage<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

impl<T> ListPage<T> {
    /// A final page holding `results`.
    pub fn last(results: Vec<T>) -> Self {
        Self {
            results,
            has_more: false,
            next_cursor: None,
        }
    }

    /// A page that continues at `cursor`.
    pub fn more(results: Vec<T>, cursor: impl Into<String>) -> Self {
        Self {
            results,
            has_more: true,
            next_cursor: Some(cursor.into()),
        }
    }
}

/// Formatting flags on a single [`TextSpan`]. Fields the API adds (underline, color) are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Annotations {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub code: bool,
}

/// A run of text with its own annotations and an optional link target.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TextSpan {
    pub plain_text: String,
    pub href: Option<String>,
    pub annotations: Annotations,
}

impl TextSpan {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            plain_text: text.into(),
            ..Self::default()
        }
    }

    pub fn bold(mut self) -> Self {
        self.annotations.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.annotations.italic = true;
        self
    }

    pub fn code(mut self) -> Self {
        self.annotations.code = true;
        self
    }

    pub fn strikethrough(mut self) -> Self {
        self.annotations.strikethrough = true;
        self
    }

    pub fn linked(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UrlRef {
    pub url: String,
}

/// A media reference. The API stores a URL either as an external link or as a hosted
/// file; the external link wins when both are present.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FileRef {
    pub external: Option<UrlRef>,
    pub file: Option<UrlRef>,
    pub caption: Vec<TextSpan>,
}

impl FileRef {
    pub fn external(url: impl Into<String>) -> Self {
        Self {
            external: Some(UrlRef { url: url.into() }),
            ..Self::default()
        }
    }

    pub fn hosted(url: impl Into<String>) -> Self {
        Self {
            file: Some(UrlRef { url: url.into() }),
            ..Self::default()
        }
    }

    pub fn url(&self) -> Option<&str> {
        [&self.external, &self.file]
            .into_iter()
            .flatten()
            .map(|r| r.url.trim())
            .find(|url| !url.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NamedOption {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DateValue {
    pub start: String,
    #[serde(default)]
    pub end: Option<String>,
}

/// A typed page property. The shape is owned by whoever authors the remote database,
/// so every accessor is tolerant and returns `None` rather than failing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyValue {
    Title { title: Vec<TextSpan> },
    RichText { rich_text: Vec<TextSpan> },
    Date { date: Option<DateValue> },
    Select { select: Option<NamedOption> },
    MultiSelect { multi_select: Vec<NamedOption> },
    Status { status: Option<NamedOption> },
    Checkbox { checkbox: bool },
    Url { url: Option<String> },
    Files { files: Vec<FileRef> },
    #[serde(other)]
    Unsupported,
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn spans_text(spans: &[TextSpan]) -> String {
    spans.iter().map(|s| s.plain_text.as_str()).collect()
}

impl PropertyValue {
    /// Plain text of title, rich-text, select, status and url properties.
    pub fn text(&self) -> Option<String> {
        match self {
            PropertyValue::Title { title: spans } | PropertyValue::RichText { rich_text: spans } => {
                non_empty(&spans_text(spans))
            }
            PropertyValue::Select { select: Some(opt) }
            | PropertyValue::Status { status: Some(opt) } => non_empty(&opt.name),
            PropertyValue::Url { url: Some(url) } => non_empty(url),
            _ => None,
        }
    }

    /// The raw `start` of a date property.
    pub fn date_start(&self) -> Option<&str> {
        match self {
            PropertyValue::Date { date: Some(d) } if !d.start.trim().is_empty() => {
                Some(d.start.trim())
            }
            _ => None,
        }
    }

    /// Option names of a multi-select (or single select), in remote order.
    pub fn names(&self) -> Option<Vec<String>> {
        let names: Vec<String> = match self {
            PropertyValue::MultiSelect { multi_select } => multi_select
                .iter()
                .filter_map(|o| non_empty(&o.name))
                .collect(),
            PropertyValue::Select { select: Some(opt) } => non_empty(&opt.name).into_iter().collect(),
            _ => return None,
        };
        (!names.is_empty()).then_some(names)
    }

    /// A URL from url, files or rich-text properties.
    pub fn url(&self) -> Option<String> {
        match self {
            PropertyValue::Url { url: Some(url) } => non_empty(url),
            PropertyValue::Files { files } => files.iter().find_map(|f| f.url().map(str::to_string)),
            PropertyValue::RichText { rich_text } => non_empty(&spans_text(rich_text)),
            _ => None,
        }
    }

    pub fn checked(&self) -> Option<bool> {
        match self {
            PropertyValue::Checkbox { checkbox } => Some(*checkbox),
            _ => None,
        }
    }
}

pub type PropertyBag = HashMap<String, PropertyValue>;

/// A page as returned by the published-page listing.
#[derive(Debug, Clone, Deserialize)]
pub struct PageRecord {
    pub id: String,
    #[serde(default)]
    pub properties: PropertyBag,
    #[serde(default)]
    pub cover: Option<FileRef>,
}

/// A block as returned by the children listing: `type` names the key holding its payload.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub has_children: bool,
    #[serde(flatten)]
    pub payload: serde_json::Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Icon {
    Emoji {
        emoji: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TextPayload {
    rich_text: Vec<TextSpan>,
    checked: bool,
    language: Option<String>,
    caption: Vec<TextSpan>,
    icon: Option<Icon>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LinkPayload {
    url: String,
}

/// One structural unit of a remote document, narrowed to the kinds this crate renders.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    Paragraph(Vec<TextSpan>),
    Heading {
        level: u8,
        text: Vec<TextSpan>,
    },
    BulletedItem(Vec<TextSpan>),
    NumberedItem(Vec<TextSpan>),
    ChecklistItem {
        checked: bool,
        text: Vec<TextSpan>,
    },
    Code {
        language: Option<String>,
        text: Vec<TextSpan>,
        caption: Vec<TextSpan>,
    },
    Quote(Vec<TextSpan>),
    Callout {
        icon: Option<String>,
        text: Vec<TextSpan>,
    },
    Divider,
    Image(FileRef),
    Video(FileRef),
    Bookmark {
        url: String,
    },
    Toggle(Vec<TextSpan>),
    TableOfContents,
    ChildPage,
    ChildDatabase,
    Unknown(String),
}

fn payload<T: DeserializeOwned + Default>(record: &BlockRecord) -> Result<T, serde_json::Error> {
    match record.payload.get(&record.kind) {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => serde_json::from_value(value.clone()),
    }
}

impl ContentBlock {
    /// Narrow a raw record. A payload that does not match its declared kind is logged
    /// and treated as an unknown block, so it is omitted from the document.
    pub fn from_record(record: &BlockRecord) -> Self {
        match Self::try_from_record(record) {
            Ok(block) => block,
            Err(e) => {
                warn!(block_id = %record.id, kind = %record.kind, error = %e, "Malformed block payload, skipping");
                ContentBlock::Unknown(record.kind.clone())
            }
        }
    }

    fn try_from_record(record: &BlockRecord) -> Result<Self, serde_json::Error> {
        let block = match record.kind.as_str() {
            "paragraph" => ContentBlock::Paragraph(payload::<TextPayload>(record)?.rich_text),
            "heading_1" | "heading_2" | "heading_3" => ContentBlock::Heading {
                level: record.kind[record.kind.len() - 1..].parse().unwrap_or(1),
                text: payload::<TextPayload>(record)?.rich_text,
            },
            "bulleted_list_item" => {
                ContentBlock::BulletedItem(payload::<TextPayload>(record)?.rich_text)
            }
            "numbered_list_item" => {
                ContentBlock::NumberedItem(payload::<TextPayload>(record)?.rich_text)
            }
            "to_do" => {
                let p = payload::<TextPayload>(record)?;
                ContentBlock::ChecklistItem {
                    checked: p.checked,
                    text: p.rich_text,
                }
            }
            "code" => {
                let p = payload::<TextPayload>(record)?;
                ContentBlock::Code {
                    language: p.language,
                    text: p.rich_text,
                    caption: p.caption,
                }
            }
            "quote" => ContentBlock::Quote(payload::<TextPayload>(record)?.rich_text),
            "callout" => {
                let p = payload::<TextPayload>(record)?;
                let icon = match p.icon {
                    Some(Icon::Emoji { emoji }) => non_empty(&emoji),
                    _ => None,
                };
                ContentBlock::Callout {
                    icon,
                    text: p.rich_text,
                }
            }
            "divider" => ContentBlock::Divider,
            "image" => ContentBlock::Image(payload(record)?),
            "video" => ContentBlock::Video(payload(record)?),
            "bookmark" | "link_preview" | "embed" => ContentBlock::Bookmark {
                url: payload::<LinkPayload>(record)?.url,
            },
            "toggle" => ContentBlock::Toggle(payload::<TextPayload>(record)?.rich_text),
            "table_of_contents" => ContentBlock::TableOfContents,
            "child_page" => ContentBlock::ChildPage,
            "child_database" => ContentBlock::ChildDatabase,
            other => ContentBlock::Unknown(other.to_string()),
        };
        Ok(block)
    }

    /// Bulleted, numbered and checklist items render adjacent to one another.
    pub fn is_list_item(&self) -> bool {
        matches!(
            self,
            ContentBlock::BulletedItem(_)
                | ContentBlock::NumberedItem(_)
                | ContentBlock::ChecklistItem { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> BlockRecord {
        serde_json::from_value(value).expect("valid block record")
    }

    #[test]
    fn rich_text_defaults_missing_annotations() {
        let span: TextSpan = serde_json::from_value(json!({
            "type": "text",
            "plain_text": "hi",
            "href": null
        }))
        .unwrap();
        assert_eq!(span, TextSpan::plain("hi"));
    }

    #[test]
    fn to_do_block_carries_checked_flag() {
        let block = ContentBlock::from_record(&record(json!({
            "id": "b1",
            "type": "to_do",
            "has_children": false,
            "to_do": {
                "rich_text": [{"plain_text": "ship it", "annotations": {"bold": true, "color": "red"}}],
                "checked": true
            }
        })));
        assert_eq!(
            block,
            ContentBlock::ChecklistItem {
                checked: true,
                text: vec![TextSpan::plain("ship it").bold()],
            }
        );
    }

    #[test]
    fn heading_level_comes_from_kind() {
        let block = ContentBlock::from_record(&record(json!({
            "id": "b2",
            "type": "heading_3",
            "heading_3": {"rich_text": [{"plain_text": "Deep"}]}
        })));
        assert_eq!(
            block,
            ContentBlock::Heading {
                level: 3,
                text: vec![TextSpan::plain("Deep")],
            }
        );
    }

    #[test]
    fn callout_keeps_only_emoji_icons() {
        let emoji = ContentBlock::from_record(&record(json!({
            "id": "b3",
            "type": "callout",
            "callout": {"rich_text": [], "icon": {"type": "emoji", "emoji": "💡"}}
        })));
        let external = ContentBlock::from_record(&record(json!({
            "id": "b4",
            "type": "callout",
            "callout": {"rich_text": [], "icon": {"type": "external", "external": {"url": "https://x/i.png"}}}
        })));
        assert!(matches!(emoji, ContentBlock::Callout { icon: Some(ref i), .. } if i == "💡"));
        assert!(matches!(external, ContentBlock::Callout { icon: None, .. }));
    }

    #[test]
    fn media_prefers_external_url() {
        let both = FileRef {
            external: Some(UrlRef { url: "https://ext/a.png".into() }),
            file: Some(UrlRef { url: "https://hosted/a.png".into() }),
            caption: vec![],
        };
        assert_eq!(both.url(), Some("https://ext/a.png"));
        assert_eq!(FileRef::hosted("https://hosted/b.png").url(), Some("https://hosted/b.png"));
        assert_eq!(FileRef::default().url(), None);
    }

    #[test]
    fn unknown_and_malformed_blocks_become_unknown() {
        let unknown = ContentBlock::from_record(&record(json!({
            "id": "b5", "type": "synced_block", "synced_block": {}
        })));
        let malformed = ContentBlock::from_record(&record(json!({
            "id": "b6", "type": "paragraph", "paragraph": {"rich_text": "not a list"}
        })));
        assert_eq!(unknown, ContentBlock::Unknown("synced_block".into()));
        assert_eq!(malformed, ContentBlock::Unknown("paragraph".into()));
    }

    #[test]
    fn property_values_deserialise_by_type_tag() {
        let bag: PropertyBag = serde_json::from_value(json!({
            "Name": {"id": "title", "type": "title", "title": [{"plain_text": "Hello"}]},
            "Tags": {"type": "multi_select", "multi_select": [{"name": "a"}, {"name": "b"}]},
            "Rollup": {"type": "rollup", "rollup": {"type": "number", "number": 3}},
            "Featured": {"type": "checkbox", "checkbox": true}
        }))
        .unwrap();
        assert_eq!(bag["Name"].text().as_deref(), Some("Hello"));
        assert_eq!(bag["Tags"].names(), Some(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(bag["Rollup"], PropertyValue::Unsupported);
        assert_eq!(bag["Featured"].checked(), Some(true));
    }
}
