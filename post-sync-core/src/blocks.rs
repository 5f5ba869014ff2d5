//! Block-to-Markdown translation and document assembly.
//!
//! [`translate_block`] distinguishes an empty line (`Some("")`, kept for spacing) from
//! an omitted block (`None`). [`assemble_document`] joins the survivors, separating
//! blocks by a blank line except between consecutive list items.

use crate::model::ContentBlock;
use crate::richtext::{format_rich_text, plain_text};

/// Language value the API uses for "no language"; never written into a fence.
pub const NO_LANGUAGE: &str = "plain text";

pub fn translate_block(block: &ContentBlock) -> Option<String> {
    let line = match block {
        ContentBlock::Paragraph(text) => format_rich_text(text),
        ContentBlock::Heading { level, text } => {
            let level = usize::from((*level).clamp(1, 3));
            format!("{} {}", "#".repeat(level), format_rich_text(text))
        }
        ContentBlock::BulletedItem(text) => format!("- {}", format_rich_text(text)),
        // Every numbered item uses the same ordinal; the Markdown renderer renumbers.
        ContentBlock::NumberedItem(text) => format!("1. {}", format_rich_text(text)),
        ContentBlock::ChecklistItem { checked, text } => {
            let mark = if *checked { "x" } else { " " };
            format!("- [{mark}] {}", format_rich_text(text))
        }
        ContentBlock::Code {
            language,
            text,
            caption,
        } => {
            let language = language
                .as_deref()
                .map(str::trim)
                .filter(|l| !l.is_empty() && *l != NO_LANGUAGE)
                .unwrap_or("");
            let mut out = format!("```{language}\n{}\n```", plain_text(text));
            let caption = plain_text(caption);
            if !caption.trim().is_empty() {
                out.push_str(&format!("\n*{}*", caption.trim()));
            }
            out
        }
        ContentBlock::Quote(text) => format!("> {}", format_rich_text(text)),
        ContentBlock::Callout { icon, text } => match icon {
            Some(icon) => format!("> {icon} {}", format_rich_text(text)),
            None => format!("> {}", format_rich_text(text)),
        },
        ContentBlock::Divider => "---".to_string(),
        ContentBlock::Image(media) => {
            let url = media.url()?;
            format!("![{}]({url})", plain_text(&media.caption).trim())
        }
        ContentBlock::Video(media) => {
            let url = media.url()?;
            let caption = plain_text(&media.caption);
            let label = match caption.trim() {
                "" => "Video",
                caption => caption,
            };
            format!("[{label}]({url})")
        }
        ContentBlock::Bookmark { url } => {
            let url = url.trim();
            if url.is_empty() {
                return None;
            }
            format!("[{url}]({url})")
        }
        // Children of a toggle are not fetched; only the summary is rendered.
        ContentBlock::Toggle(text) => format!(
            "<details><summary>{}</summary></details>",
            format_rich_text(text)
        ),
        ContentBlock::TableOfContents => String::new(),
        ContentBlock::ChildPage | ContentBlock::ChildDatabase | ContentBlock::Unknown(_) => {
            return None
        }
    };
    Some(line)
}

pub fn assemble_document(blocks: &[ContentBlock]) -> String {
    let mut body = String::new();
    let mut previous_was_list: Option<bool> = None;

    for block in blocks {
        let Some(line) = translate_block(block) else {
            continue;
        };
        let is_list = block.is_list_item();
        match previous_was_list {
            None => {}
            Some(true) if is_list => body.push('\n'),
            Some(_) => body.push_str("\n\n"),
        }
        body.push_str(&line);
        previous_was_list = Some(is_list);
    }

    body.trim().to_string()
}
