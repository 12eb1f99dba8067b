//! Log Redaction Layer
//!
//! Inline font payloads can run to megabytes; logs keep only a short prefix
//! of each base64 body.

use regex::Regex;
use std::sync::LazyLock;

/// Characters of base64 body kept before truncation.
const KEPT_CHARS: usize = 16;

static DATA_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(data:[\w.+-]+/[\w.+-]+;base64,)([A-Za-z0-9+/=]+)").unwrap());

/// Truncates base64 bodies of `data:` URLs in a string.
pub fn redact_data_urls(input: &str) -> String {
    DATA_URL_RE
        .replace_all(input, |caps: &regex::Captures<'_>| {
            let body = &caps[2];
            if body.len() <= KEPT_CHARS {
                format!("{}{}", &caps[1], body)
            } else {
                format!("{}{}…[{} chars]", &caps[1], &body[..KEPT_CHARS], body.len())
            }
        })
        .into_owned()
}
