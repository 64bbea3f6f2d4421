//! Text cleaning applied to scraped pages before they are sent to the model.

use once_cell::sync::Lazy;
use regex::Regex;

static HTML_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*?>").expect("tag regex"));

static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"http[s]?://(?:[a-zA-Z]|[0-9]|[$-_@.&+]|[!*\(\),]|(?:%[0-9a-fA-F][0-9a-fA-F]))+",
    )
    .expect("url regex")
});

static SPECIAL_CHAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9 ]").expect("special char regex"));

static MULTI_SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").expect("space regex"));

/// Normalises scraped page text to plain ASCII words separated by single spaces.
///
/// Order matters: tags and URLs go first so their punctuation is still intact
/// when they are matched, then everything outside `[a-zA-Z0-9 ]` is dropped.
pub fn clean_text(text: &str) -> String {
    let text = HTML_TAG_RE.replace_all(text, "");
    let text = URL_RE.replace_all(&text, "");
    let text = SPECIAL_CHAR_RE.replace_all(&text, "");
    let text = MULTI_SPACE_RE.replace_all(&text, " ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
