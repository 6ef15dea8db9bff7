//! Lightweight resolution of attribute values found in markup.
//!
//! This is not a full RFC 3986 reference resolver: `.`/`..` segments are not
//! collapsed and query/fragment parts are passed through untouched.

use url::Url;

pub const DATA_TOKEN: &str = "data:";
pub const BLOB_TOKEN: &str = "blob:";
pub const UNKNOWN_TOKEN: &str = "unknown";

const IGNORED_PREFIXES: [&str; 3] = ["javascript:", "mailto:", "tel:"];
const PASSTHROUGH_PREFIXES: [&str; 4] = ["http://", "https://", "data:", "blob:"];

/// Resolve `raw` against the page it was found on.
///
/// Returns `None` for empty values, `javascript:`/`mailto:`/`tel:` values, and
/// relative values whose base has no host.
pub fn normalize_url(base: &str, raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let lowered = raw.to_ascii_lowercase();
    if IGNORED_PREFIXES.iter().any(|p| lowered.starts_with(p)) {
        return None;
    }
    if PASSTHROUGH_PREFIXES.iter().any(|p| lowered.starts_with(p)) {
        return Some(raw.to_string());
    }

    let base_url = Url::parse(base).ok();

    if raw.starts_with("//") {
        let scheme = base_url.as_ref().map(|u| u.scheme()).unwrap_or("https");
        return Some(format!("{}:{}", scheme, raw));
    }

    let base_url = base_url?;
    let origin = origin_of(&base_url)?;

    if raw.starts_with('/') {
        return Some(format!("{}{}", origin, raw));
    }

    let path = base_url.path();
    let directory = match path.rfind('/') {
        Some(idx) => &path[..=idx],
        None => "/",
    };
    Some(format!("{}{}{}", origin, directory, raw))
}

/// `scheme://host[:port]` of a URL, or `None` when it has no host.
fn origin_of(url: &Url) -> Option<String> {
    let host = url.host_str().filter(|h| !h.is_empty())?;
    Some(match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    })
}

/// Lowercase hostname of `url`, if one can be extracted.
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
        .filter(|h| !h.is_empty())
}

/// Classification key for a resolved URL: its hostname, or a scheme token for
/// `data:`/`blob:` values, or `unknown`.
pub fn domain_token(url: &str) -> String {
    let lowered = url.trim_start().to_ascii_lowercase();
    if lowered.starts_with(DATA_TOKEN) {
        return DATA_TOKEN.to_string();
    }
    if lowered.starts_with(BLOB_TOKEN) {
        return BLOB_TOKEN.to_string();
    }
    host_of(url).unwrap_or_else(|| UNKNOWN_TOKEN.to_string())
}
