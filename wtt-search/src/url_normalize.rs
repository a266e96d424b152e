//! URL canonicalisation used as the cross-query deduplication key.
//!
//! Two provider results refer to the same source when their URLs differ
//! only in host case, a `www.` prefix, a default port, a trailing slash,
//! query-parameter order, tracking parameters or the fragment.

use url::Url;

/// Query parameters that never identify content.
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "ref",
    "ref_src",
    "si",
    "feature",
];

/// Canonical form of `raw` for deduplication.
///
/// Unparseable input is returned trimmed but otherwise unchanged, so two
/// identical non-URL strings still collapse to one key.
///
/// # Examples
///
/// ```
/// use wtt_search::url_normalize::normalize_url;
///
/// let a = normalize_url("https://WWW.Example.COM/coin/?b=2&a=1#top");
/// let b = normalize_url("https://example.com/coin?a=1&b=2&utm_source=x");
/// assert_eq!(a, b);
/// ```
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    match Url::parse(trimmed) {
        Ok(url) => canonical_key(&url),
        Err(_) => trimmed.to_owned(),
    }
}

/// `scheme://host[:port]path[?sorted-query]`, with no fragment or userinfo.
///
/// `Url` already lowercases the host and drops default ports.
fn canonical_key(url: &Url) -> String {
    let Some(host) = url.host_str() else {
        return url.as_str().to_owned();
    };
    let host = host.strip_prefix("www.").unwrap_or(host);

    let mut key = format!("{}://{host}", url.scheme());
    if let Some(port) = url.port() {
        key.push(':');
        key.push_str(&port.to_string());
    }

    let path = url.path().trim_end_matches('/');
    key.push_str(if path.is_empty() { "/" } else { path });

    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(name, _)| !is_tracking_param(name))
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();
    params.sort();
    for (i, (name, value)) in params.iter().enumerate() {
        key.push(if i == 0 { '?' } else { '&' });
        key.push_str(name);
        key.push('=');
        key.push_str(value);
    }
    key
}

fn is_tracking_param(name: &str) -> bool {
    TRACKING_PARAMS
        .iter()
        .any(|tracking| tracking.eq_ignore_ascii_case(name))
}
