//! Inline formatting of annotated text spans.

use crate::model::TextSpan;

/// Concatenate spans, each formatted on its own. No separators are inserted.
pub fn format_rich_text(spans: &[TextSpan]) -> String {
    spans.iter().map(format_span).collect()
}

/// Wrap one span. The layering order is fixed: code, then emphasis, then
/// strikethrough, then the link as the outermost layer.
pub fn format_span(span: &TextSpan) -> String {
    let mut text = span.plain_text.clone();
    if text.is_empty() {
        return text;
    }
    let a = &span.annotations;

    if a.code {
        text = format!("`{text}`");
    }
    if a.bold && a.italic {
        text = format!("***{text}***");
    } else if a.bold {
        text = format!("**{text}**");
    } else if a.italic {
        text = format!("*{text}*");
    }
    if a.strikethrough {
        text = format!("~~{text}~~");
    }
    if let Some(href) = span.href.as_deref().filter(|h| !h.is_empty()) {
        text = format!("[{text}]({href})");
    }
    text
}

/// Concatenated span text with every annotation ignored.
pub fn plain_text(spans: &[TextSpan]) -> String {
    spans.iter().map(|s| s.plain_text.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_is_outermost_around_combined_emphasis() {
        let span = TextSpan::plain("x").bold().italic().linked("https://x");
        assert_eq!(format_span(&span), "[***x***](https://x)");
    }

    #[test]
    fn code_sits_inside_emphasis_and_strikethrough() {
        let span = TextSpan::plain("let").code().bold().strikethrough();
        assert_eq!(format_span(&span), "~~**`let`**~~");
    }

    #[test]
    fn italic_only() {
        assert_eq!(format_span(&TextSpan::plain("soft").italic()), "*soft*");
    }

    #[test]
    fn empty_span_stays_empty_even_when_annotated() {
        let span = TextSpan::plain("").bold().linked("https://x");
        assert_eq!(format_span(&span), "");
    }

    #[test]
    fn spans_concatenate_without_whitespace() {
        let spans = vec![
            TextSpan::plain("Read "),
            TextSpan::plain("the docs").linked("https://docs"),
            TextSpan::plain("."),
        ];
        assert_eq!(format_rich_text(&spans), "Read [the docs](https://docs).");
        assert_eq!(plain_text(&spans), "Read the docs.");
    }
}
