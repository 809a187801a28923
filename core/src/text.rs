//! Text preparation for speech synthesis.

use once_cell::sync::Lazy;
use regex::Regex;

static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").expect("valid URL regex"));
static SPACES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").expect("valid whitespace regex"));

/// Remove http/https links from text that is about to be spoken.
///
/// Only the synthesis copy goes through here; the text returned to the
/// caller keeps its links so the frontend can render them.
pub fn strip_urls(text: &str) -> String {
    let without = URL_RE.replace_all(text, "");
    SPACES_RE.replace_all(without.trim(), " ").into_owned()
}

/// True when the text still contains something a voice can say
pub fn is_speakable(text: &str) -> bool {
    text.chars().any(char::is_alphanumeric)
}
