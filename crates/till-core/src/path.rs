//! # Path Utilities
//!
//! Normalization applied to every navigation target before it is compared,
//! pushed onto history or matched against the route table.
//!
//! ## Normalization Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Input                    Normalized                                    │
//! │  ─────                    ──────────                                    │
//! │  ""                       "/"                                           │
//! │  "dashboard"              "/dashboard"          (leading slash added)   │
//! │  "/dashboard/"            "/dashboard"          (trailing slash gone)   │
//! │  "/"                      "/"                   (root is kept)          │
//! │  "/sales/?page=2"         "/sales?page=2"       (query preserved)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

/// Parsed query string parameters, ordered by key.
pub type QueryParams = BTreeMap<String, String>;

/// Normalizes a navigation target.
///
/// ## Example
/// ```rust
/// use till_core::path::normalize_path;
///
/// assert_eq!(normalize_path("products/"), "/products");
/// assert_eq!(normalize_path("/"), "/");
/// assert_eq!(normalize_path("/sales/?page=2"), "/sales?page=2");
/// ```
pub fn normalize_path(raw: &str) -> String {
    let raw = raw.trim();
    let (path, query) = split_query(raw);

    let trimmed = path.trim_end_matches('/');
    let mut normalized = String::with_capacity(raw.len() + 1);
    if !trimmed.starts_with('/') {
        normalized.push('/');
    }
    normalized.push_str(trimmed);

    if let Some(query) = query.filter(|q| !q.is_empty()) {
        normalized.push('?');
        normalized.push_str(query);
    }

    normalized
}

/// Splits a target into its path part and optional query string.
///
/// Any `#fragment` is discarded.
pub fn split_query(target: &str) -> (&str, Option<&str>) {
    let target = target.split('#').next().unwrap_or_default();
    match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    }
}

/// Decodes a query string (`a=1&b=two`) into ordered parameters.
///
/// Repeated keys keep the last value.
pub fn parse_query(query: &str) -> QueryParams {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("///"), "/");
        assert_eq!(normalize_path("dashboard"), "/dashboard");
        assert_eq!(normalize_path("/dashboard/"), "/dashboard");
        assert_eq!(normalize_path("  /pos  "), "/pos");
    }

    #[test]
    fn test_normalize_keeps_query_and_drops_fragment() {
        assert_eq!(normalize_path("/sales/?page=2"), "/sales?page=2");
        assert_eq!(normalize_path("/sales?"), "/sales");
        assert_eq!(normalize_path("/sales#top"), "/sales");
    }

    #[test]
    fn test_parse_query() {
        let query = parse_query("page=2&q=coca%20cola&page=3");
        assert_eq!(query.get("page").map(String::as_str), Some("3"));
        assert_eq!(query.get("q").map(String::as_str), Some("coca cola"));
    }
}
