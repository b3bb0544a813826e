use std::sync::OnceLock;

use regex::Regex;

/// Truncates on a char boundary at or below `max_bytes`, appending `suffix`
/// only when something was actually cut.
pub(crate) fn truncate_utf8(s: &str, max_bytes: usize, suffix: &str) -> String {
    if s.len() <= max_bytes {
        return s.to_string();
    }

    let mut boundary = max_bytes;
    while boundary > 0 && !s.is_char_boundary(boundary) {
        boundary -= 1;
    }
    let mut out = s[..boundary].trim_end().to_string();
    out.push_str(suffix);
    out
}

pub(crate) fn clean_opt(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn decode_html_entities(value: &str) -> String {
    value
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ")
}

fn strip_inline_tags(value: &str) -> String {
    static TAG_RE: OnceLock<Regex> = OnceLock::new();
    let re = TAG_RE.get_or_init(|| Regex::new(r"(?is)<[^>]+>").expect("valid regex"));
    re.replace_all(value, "").to_string()
}

/// Strips markup and entities from text pulled out of an XML payload.
pub(crate) fn clean_markup(value: &str) -> String {
    strip_inline_tags(&decode_html_entities(value))
        .trim()
        .to_string()
}

/// Builds a search URL with a single properly-encoded query parameter.
///
/// Falls back to the bare base when it does not parse as a URL, so the
/// function stays total for callers that must always produce a link.
pub(crate) fn encoded_search_url(base: &str, key: &str, value: &str) -> String {
    match reqwest::Url::parse_with_params(base, [(key, value)]) {
        Ok(url) => url.into(),
        Err(_) => base.to_string(),
    }
}
