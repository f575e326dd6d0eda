use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Truncate `text` to at most `max_width` display columns, ending with `…` when shortened.
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(text) <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let budget = max_width - 1;
    let mut out = String::new();
    let mut used = 0;
    for grapheme in text.graphemes(true) {
        let width = UnicodeWidthStr::width(grapheme);
        if used + width > budget {
            break;
        }
        out.push_str(grapheme);
        used += width;
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn short_text_is_unchanged() {
        assert_eq!(truncate_to_width("a@x.com", 7), "a@x.com");
    }

    #[test]
    fn long_text_ends_with_ellipsis() {
        assert_eq!(truncate_to_width("someone@example.com", 8), "someone…");
        assert_eq!(truncate_to_width("someone@example.com", 1), "…");
        assert_eq!(truncate_to_width("someone@example.com", 0), "");
    }

    #[test]
    fn wide_graphemes_are_not_split() {
        assert_eq!(truncate_to_width("日本語@例え.jp", 4), "日…");
    }
}
