//! Splits raw typed or pasted text into candidate tokens.

use std::sync::LazyLock;

use regex::Regex;

/// Runs of whitespace, commas and semicolons separate tokens.
static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\s,;]+").unwrap_or_else(|err| panic!("separator pattern must compile: {err}"))
});

/// Split `text` into trimmed, non-empty candidate tokens, preserving input order.
pub fn split_tokens(text: &str) -> Vec<String> {
    SEPARATORS
        .split(text)
        .map(normalize)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Returns true when `text` holds at least one separator, i.e. it may carry more than one token.
pub fn contains_separator(text: &str) -> bool {
    SEPARATORS.is_match(text)
}

fn normalize(token: &str) -> &str {
    token.trim().trim_end_matches([',', ';'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn splits_on_mixed_separators() {
        assert_eq!(
            split_tokens("a@b.com, c@d.co;e@f.io\n g@h.dev\r\n\ti@j.net"),
            vec!["a@b.com", "c@d.co", "e@f.io", "g@h.dev", "i@j.net"]
        );
    }

    #[test]
    fn drops_empty_pieces_and_trailing_punctuation() {
        assert_eq!(split_tokens(""), Vec::<String>::new());
        assert_eq!(split_tokens(" ,;; \n "), Vec::<String>::new());
        assert_eq!(split_tokens(",,a@b.com;;"), vec!["a@b.com"]);
    }

    #[test]
    fn keeps_input_order_and_casing() {
        assert_eq!(
            split_tokens("Zed@Example.com alice@example.com"),
            vec!["Zed@Example.com", "alice@example.com"]
        );
    }

    #[test]
    fn tokens_never_carry_separators() {
        let inputs = [
            "x@y.com y@z.com",
            "  ;a;;b,,c  ",
            "one\u{00a0}two",
            "trailing,",
            "\u{3000}wide\u{3000}space",
        ];
        for input in inputs {
            for token in split_tokens(input) {
                assert!(!token.is_empty(), "{input:?} produced an empty token");
                assert!(
                    !contains_separator(&token),
                    "{input:?} produced {token:?} containing a separator"
                );
            }
        }
    }

    #[test]
    fn detects_separators_for_paste_handling() {
        assert!(contains_separator("x@y.com y@z.com"));
        assert!(contains_separator("x@y.com,"));
        assert!(contains_separator("line\n"));
        assert!(!contains_separator("x@y.com"));
    }
}
