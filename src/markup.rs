//! Pango-style markup used for entry display strings.

use crate::matcher::Span;

pub const BOLD_OPEN: &str = "<b>";
pub const BOLD_CLOSE: &str = "</b>";

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders `text` with the characters covered by `span` in bold. The span is
/// in characters and is clamped to the text.
pub fn bold_span(text: &str, span: Option<Span>) -> String {
    let Some(span) = span else {
        return escape(text);
    };
    let len = text.chars().count();
    let start = span.offset.min(len);
    let end = span.end().min(len);

    let head: String = text.chars().take(start).collect();
    let mid: String = text.chars().skip(start).take(end - start).collect();
    let tail: String = text.chars().skip(end).collect();

    format!(
        "{}{BOLD_OPEN}{}{BOLD_CLOSE}{}",
        escape(&head),
        escape(&mid),
        escape(&tail)
    )
}

/// Removes bold tags and resolves the entities produced by [`escape`].
pub fn strip(markup: &str) -> String {
    markup
        .replace(BOLD_OPEN, "")
        .replace(BOLD_CLOSE, "")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_pango_specials() {
        assert_eq!(escape("a & <b>"), "a &amp; &lt;b&gt;");
    }

    #[test]
    fn bolds_by_character_not_byte() {
        let span = Span { offset: 1, len: 2 };
        assert_eq!(bold_span("Ärger", Some(span)), "Ä<b>rg</b>er");
    }

    #[test]
    fn clamps_out_of_range_span() {
        let span = Span { offset: 3, len: 10 };
        assert_eq!(bold_span("abcd", Some(span)), "abc<b>d</b>");
    }

    #[test]
    fn strip_undoes_bold_span() {
        let name = "Tom & <Jerry>";
        let marked = bold_span(name, Some(Span { offset: 2, len: 5 }));
        assert_eq!(strip(&marked), name);
    }
}
