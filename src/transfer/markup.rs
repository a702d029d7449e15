/// HTML-to-plain-text conversion for the text export
use regex::Regex;
use std::sync::OnceLock;

/// Block-level tags that end a line of text
static BLOCK_BREAK_REGEX: OnceLock<Regex> = OnceLock::new();

/// Any remaining tag
static TAG_REGEX: OnceLock<Regex> = OnceLock::new();

/// Runs of three or more newlines
static BLANK_RUN_REGEX: OnceLock<Regex> = OnceLock::new();

fn block_break_regex() -> &'static Regex {
    BLOCK_BREAK_REGEX.get_or_init(|| {
        Regex::new(r"(?i)<br\s*/?>|</(?:p|div|li|h[1-6]|blockquote|pre|tr)\s*>")
            .expect("Failed to compile block break regex")
    })
}

fn tag_regex() -> &'static Regex {
    TAG_REGEX.get_or_init(|| Regex::new(r"<[^>]*>").expect("Failed to compile tag regex"))
}

fn blank_run_regex() -> &'static Regex {
    BLANK_RUN_REGEX.get_or_init(|| Regex::new(r"\n{3,}").expect("Failed to compile blank run regex"))
}

/// Strip markup from editor HTML, keeping paragraph breaks.
pub fn strip_markup(html: &str) -> String {
    let with_breaks = block_break_regex().replace_all(html, "\n");
    let without_tags = tag_regex().replace_all(&with_breaks, "");
    let decoded = decode_entities(&without_tags);

    let lines: Vec<&str> = decoded.lines().map(str::trim_end).collect();
    let joined = lines.join("\n");
    blank_run_regex()
        .replace_all(joined.trim(), "\n\n")
        .into_owned()
}

/// Decode the handful of entities rich-text editors emit
fn decode_entities(text: &str) -> String {
    // &amp; last so "&amp;lt;" decodes to "&lt;" rather than "<".
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_simple_paragraphs() {
        assert_eq!(
            strip_markup("<p>Hello <b>world</b></p><p>Second</p>"),
            "Hello world\nSecond"
        );
    }

    #[test]
    fn test_strip_breaks_and_entities() {
        assert_eq!(
            strip_markup("a &amp; b<br>c &lt;tag&gt;&nbsp;d"),
            "a & b\nc <tag> d"
        );
        assert_eq!(strip_markup("&amp;lt;"), "&lt;");
    }

    #[test]
    fn test_strip_collapses_blank_runs() {
        assert_eq!(strip_markup("<p>one</p><p></p><p></p><p>two</p>"), "one\n\ntwo");
    }

    #[test]
    fn test_strip_empty_and_plain() {
        assert_eq!(strip_markup(""), "");
        assert_eq!(strip_markup("plain text"), "plain text");
    }
}
