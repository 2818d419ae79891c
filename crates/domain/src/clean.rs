//! Content cleaner: markup to plain text

use regex::Regex;
use std::sync::LazyLock;

/// Elements removed together with everything they contain
const REMOVED_ELEMENTS: &[&str] = &["script", "style", "a", "video", "audio", "iframe", "noscript"];

static COMMENTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("Valid regex"));

static REMOVED: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    REMOVED_ELEMENTS
        .iter()
        .map(|name| {
            Regex::new(&format!(r"(?is)<{name}\b[^>]*?(?:/>|>.*?</{name}\s*>)"))
                .expect("Valid regex")
        })
        .collect()
});

static VOID_ELEMENTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<(?:img|input|source|embed)\b[^>]*>").expect("Valid regex"));

static BLOCK_BREAKS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</?(?:p|div|br|li|ul|ol|h[1-6]|tr|td|th|blockquote|section|article)\b[^>]*>")
        .expect("Valid regex")
});

static TAGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[A-Za-z/!?][^>]*>").expect("Valid regex"));

static UNTERMINATED_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[A-Za-z/!]").expect("Valid regex"));

static NUMERIC_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#(?:[xX]([0-9a-fA-F]+)|([0-9]+));").expect("Valid regex"));

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("Valid regex"));

/// Markup that cannot be reduced to text safely
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed markup near byte {offset}")]
pub struct MalformedMarkup {
    pub offset: usize,
}

/// Strip non-textual and interactive markup and return plain text
///
/// Never fails: malformed markup is returned unchanged.
pub fn clean(raw: &str) -> String {
    match try_clean(raw) {
        Ok(text) => text,
        Err(error) => {
            tracing::debug!(error = %error, "Markup not cleanable, keeping original");
            raw.to_string()
        }
    }
}

/// Strip markup, reporting unterminated tags instead of guessing
pub fn try_clean(raw: &str) -> Result<String, MalformedMarkup> {
    let mut text = COMMENTS.replace_all(raw, " ").into_owned();
    for element in REMOVED.iter() {
        text = element.replace_all(&text, " ").into_owned();
    }
    text = VOID_ELEMENTS.replace_all(&text, " ").into_owned();
    text = BLOCK_BREAKS.replace_all(&text, " ").into_owned();
    text = TAGS.replace_all(&text, "").into_owned();

    if let Some(found) = UNTERMINATED_TAG.find(&text) {
        return Err(MalformedMarkup {
            offset: found.start(),
        });
    }

    let text = decode_entities(&text);
    Ok(WHITESPACE.replace_all(&text, " ").trim().to_string())
}

fn decode_entities(text: &str) -> String {
    let decoded = NUMERIC_ENTITY.replace_all(text, |caps: &regex::Captures<'_>| {
        let code = match (caps.get(1), caps.get(2)) {
            (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
            (_, Some(dec)) => dec.as_str().parse::<u32>().ok(),
            _ => None,
        };
        code.and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_string())
    });

    decoded
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// First `max_chars` characters of `text`, and whether anything was cut
pub fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => (&text[..idx], true),
        None => (text, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_scripts_styles_and_links() {
        let raw = r#"<div><script>alert('x')</script><style>p{}</style>
            <p>Hello <a href="https://x">click here</a> world</p></div>"#;
        assert_eq!(clean(raw), "Hello world");
    }

    #[test]
    fn removes_media_and_inputs() {
        let raw = r#"<p>Before<img src="a.png"><video src="v.mp4">fallback</video>
            <iframe src="e"></iframe><input type="text">After</p>"#;
        assert_eq!(clean(raw), "Before After");
    }

    #[test]
    fn collapses_whitespace_and_trims() {
        assert_eq!(clean("  <p>one\n\n two</p>\t<p>three</p>  "), "one two three");
    }

    #[test]
    fn decodes_common_entities() {
        assert_eq!(clean("<p>Fish &amp; chips &lt;3 &#8364;5 &#x41;</p>"), "Fish & chips <3 €5 A");
    }

    #[test]
    fn block_elements_separate_words() {
        assert_eq!(clean("<p>first</p><p>second</p>"), "first second");
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(clean("a < b and c > d"), "a < b and c > d");
    }

    #[test]
    fn unterminated_tag_returns_original() {
        let raw = "<p>Hello <b class=\"x\"";
        assert!(try_clean(raw).is_err());
        assert_eq!(clean(raw), raw);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), ("hé", true));
        assert_eq!(truncate_chars("hi", 5), ("hi", false));
    }
}
