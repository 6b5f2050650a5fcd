//! Markup disarm for free-text form input.
//!
//! Strips invisible/control characters, then script tags, inline event
//! handlers and script-capable URI schemes, repeating until nothing more
//! matches. Nested fragments such as `<scr<script>ipt>` therefore cannot
//! reassemble into a live tag once the inner match is removed.
//!
//! # Security caveat
//!
//! This is pattern stripping, not an HTML sanitizer. It does not parse
//! markup and can be bypassed by encodings it does not know about
//! (HTML entities, CSS expressions, SVG payloads, and so on). Output must
//! still be escaped wherever it is rendered as HTML.

use regex::Regex;

/// Deleting passes before matches are replaced by a space instead.
pub(crate) const MAX_REMOVAL_PASSES: usize = 8;

/// Compiled stripping rules, applied in order on every pass.
pub(crate) struct Disarm {
    rules: Vec<Regex>,
}

impl Disarm {
    pub(crate) fn new() -> Self {
        let rules = [
            // Paired script blocks, body included
            r"(?is)<script\b[^>]*>.*?</script\s*>",
            // Stray opening/closing tags, closed or not
            r"(?i)</?script[^>]*>?",
            // Inline event handlers: onclick="..", onerror='..', onload=x
            r#"(?i)\bon[a-z]+\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]*)"#,
            // Script-capable URI schemes
            r"(?i)\b(?:javascript|vbscript|data)\s*:",
        ];

        Self {
            rules: rules
                .iter()
                .map(|p| Regex::new(p).expect("built-in disarm pattern is valid"))
                .collect(),
        }
    }

    /// Runs every rule until a full pass changes nothing.
    ///
    /// The first [`MAX_REMOVAL_PASSES`] passes delete matches outright. Input
    /// still changing after that is nested deliberately, so later passes
    /// replace each match with a single space, which keeps the fragments on
    /// either side from joining into a new match. Every match is at least
    /// two characters long, so each productive pass shortens the string and
    /// the loop terminates.
    pub(crate) fn apply(&self, input: &str) -> String {
        let mut current = strip_invisible(input);

        for _ in 0..MAX_REMOVAL_PASSES {
            let next = self.pass(&current, "");
            if next == current {
                return current;
            }
            current = next;
        }

        loop {
            let next = self.pass(&current, " ");
            if next == current {
                return current;
            }
            current = next;
        }
    }

    fn pass(&self, input: &str, replacement: &str) -> String {
        let mut out = input.to_string();
        for rule in &self.rules {
            out = rule.replace_all(&out, replacement).into_owned();
        }
        out
    }
}

/// Drops control and zero-width characters, keeping newlines and tabs.
pub(crate) fn strip_invisible(input: &str) -> String {
    input
        .chars()
        .filter(|c| match c {
            '\n' | '\r' | '\t' => true,
            '\u{200B}'..='\u{200F}' => false, // Zero-width chars
            '\u{202A}'..='\u{202E}' => false, // Directional formatting
            '\u{2060}'..='\u{2064}' => false, // Word joiner, invisible chars
            '\u{FEFF}' => false,              // BOM
            c => !c.is_control(),
        })
        .collect()
}

/// Keeps at most `max_chars` characters (not bytes).
pub(crate) fn truncate_chars(input: &str, max_chars: usize) -> &str {
    match input.char_indices().nth(max_chars) {
        Some((idx, _)) => &input[..idx],
        None => input,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_untouched() {
        let disarm = Disarm::new();
        let input = "Senior Rust engineer, 5 years experience.";
        assert_eq!(disarm.apply(input), input);
    }

    #[test]
    fn test_strips_control_and_zero_width() {
        assert_eq!(strip_invisible("Hello\u{200B}World\u{FEFF}!\x00"), "HelloWorld!");
        assert_eq!(strip_invisible("a\nb\tc"), "a\nb\tc");
    }

    #[test]
    fn test_script_block_removed() {
        let disarm = Disarm::new();
        assert_eq!(disarm.apply("<script>alert(1)</script>hello"), "hello");
    }

    #[test]
    fn test_multiline_script_block_removed() {
        let disarm = Disarm::new();
        let out = disarm.apply("before<SCRIPT type=\"text/javascript\">\nx()\n</script >after");
        assert_eq!(out, "beforeafter");
    }

    #[test]
    fn test_nested_script_does_not_reassemble() {
        let disarm = Disarm::new();
        let out = disarm.apply("<scr<script>x</script>ipt>alert(1)</scr<script></script>ipt>");
        assert!(!out.to_lowercase().contains("<script"));
    }

    #[test]
    fn test_deep_nesting_falls_back_to_spacing() {
        let disarm = Disarm::new();
        let levels = 2_000;
        let input = format!("{}<script>{}x", "<scr".repeat(levels), "ipt>".repeat(levels));

        let out = disarm.apply(&input);
        assert!(!out.to_lowercase().contains("<script"));
        assert!(out.ends_with('x'));
        assert!(out.contains(' '));
    }

    #[test]
    fn test_zero_width_split_tag_removed() {
        let disarm = Disarm::new();
        let out = disarm.apply("<scr\u{200B}ipt>alert(1)</script>ok");
        assert!(!out.contains("<script"));
        assert!(out.contains("ok"));
    }

    #[test]
    fn test_unterminated_tag_removed() {
        let disarm = Disarm::new();
        assert!(!disarm.apply("text <script").contains("<script"));
    }

    #[test]
    fn test_event_handlers_removed() {
        let disarm = Disarm::new();
        let out = disarm.apply(r#"<img src=x onerror="alert(1)"><b onclick='go()'>hi</b>"#);
        assert!(!out.contains("onerror"));
        assert!(!out.contains("onclick"));
        assert!(out.contains("hi"));
    }

    #[test]
    fn test_uri_schemes_removed() {
        let disarm = Disarm::new();
        let out = disarm.apply("<a href=\"JavaScript:alert(1)\">x</a> vbscript:run data:text/html");
        let lower = out.to_lowercase();
        assert!(!lower.contains("javascript:"));
        assert!(!lower.contains("vbscript:"));
        assert!(!lower.contains("data:"));
    }

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }
}
