//! Deterministic message text normalization
//!
//! This is the single normalization entry point for the whole system. The
//! fitted vectorizer artifacts were produced over text cleaned by exactly
//! this function; any divergence between the fit-time and serve-time
//! transform silently misaligns every feature index. Do not fork it.

use regex::Regex;
use std::sync::OnceLock;

fn url_pattern() -> &'static Regex {
    static URL: OnceLock<Regex> = OnceLock::new();
    URL.get_or_init(|| Regex::new(r"http\S+").expect("static regex"))
}

fn number_pattern() -> &'static Regex {
    static NUMBER: OnceLock<Regex> = OnceLock::new();
    NUMBER.get_or_init(|| Regex::new(r"\d+").expect("static regex"))
}

fn punct_pattern() -> &'static Regex {
    static PUNCT: OnceLock<Regex> = OnceLock::new();
    PUNCT.get_or_init(|| Regex::new(r"[^\w\s]").expect("static regex"))
}

/// Normalize a raw message into the canonical token stream input.
///
/// Steps, in order:
/// 1. Drop the header block: everything before the first blank-line
///    separator (`"\n\n"`), when one is present.
/// 2. Lowercase.
/// 3. Mask URL-like runs (`http` followed by non-whitespace) as `URL`.
/// 4. Mask digit runs as `NUMBER`.
/// 5. Strip characters that are neither word characters nor whitespace.
///
/// The mask tokens stay uppercase so they survive the alphabetic token
/// pattern as distinct vocabulary entries.
///
/// Never fails: empty input yields an empty string.
pub fn normalize(raw: &str) -> String {
    let body = match raw.split_once("\n\n") {
        Some((_headers, body)) => body,
        None => raw,
    };

    let text = body.to_lowercase();
    let text = url_pattern().replace_all(&text, "URL");
    let text = number_pattern().replace_all(&text, "NUMBER");
    punct_pattern().replace_all(&text, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases_and_strips_punctuation() {
        assert_eq!(normalize("Hello, World!"), "hello world");
    }

    #[test]
    fn test_masks_urls() {
        assert_eq!(
            normalize("visit http://example.com/offer today"),
            "visit URL today"
        );
        // https is covered by the same prefix
        assert_eq!(normalize("see https://x.co now"), "see URL now");
    }

    #[test]
    fn test_masks_numbers() {
        assert_eq!(normalize("win 1000 dollars"), "win NUMBER dollars");
        // digit runs inside words are masked too
        assert_eq!(normalize("agent007"), "agentNUMBER");
    }

    #[test]
    fn test_drops_header_block() {
        let message = "From: a@b.c\nSubject: Hi\n\nActual Body Here";
        assert_eq!(normalize(message), "actual body here");
    }

    #[test]
    fn test_no_separator_keeps_whole_input() {
        let message = "Subject: Hi there";
        assert_eq!(normalize(message), "subject hi there");
    }

    #[test]
    fn test_only_first_separator_splits() {
        let message = "headers\n\npara one\n\npara two";
        assert_eq!(normalize(message), "para one\n\npara two");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_deterministic() {
        let raw = "Win $$$ now!! http://x.co 123";
        assert_eq!(normalize(raw), normalize(raw));
    }

    #[test]
    fn test_idempotent_on_mask_free_input() {
        let plain = normalize("just some plain words, nothing else!");
        assert_eq!(normalize(&plain), plain);
    }

    #[test]
    fn test_combined_spam_sample() {
        assert_eq!(
            normalize("Win $$$ now!! http://x.co 123"),
            "win  now URL NUMBER"
        );
    }
}
