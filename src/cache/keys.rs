//! Cache Key Module
//!
//! Query parameter handling, deterministic key construction and the glob
//! matcher used for pattern invalidation.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Longest `path?params` text kept readable before falling back to a digest.
pub const MAX_READABLE_KEY_LENGTH: usize = 200;

/// Marker segment for digest keys.
pub const HASH_SEGMENT: &str = "hash";

// == Query Params ==
/// Query parameters of an upstream request, always kept sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct QueryParams(BTreeMap<String, String>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.insert(name, value);
        self
    }

    /// Inserts a parameter, replacing any previous value under the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl ToString) {
        self.0.insert(name.into(), value.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Renders `name=value` pairs sorted by name and joined with `&`.
    ///
    /// `%`, `&` and `=` inside names and values are percent-encoded so the
    /// rendering is unambiguous.
    pub fn to_query_string(&self) -> String {
        self.iter()
            .map(|(k, v)| format!("{}={}", escape_component(k), escape_component(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Percent-encodes the characters that delimit query components.
fn escape_component(raw: &str) -> Cow<'_, str> {
    if !raw.contains(['%', '&', '=']) {
        return Cow::Borrowed(raw);
    }
    let mut escaped = String::with_capacity(raw.len() + 4);
    for c in raw.chars() {
        match c {
            '%' => escaped.push_str("%25"),
            '&' => escaped.push_str("%26"),
            '=' => escaped.push_str("%3D"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

impl fmt::Display for QueryParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

// == Key Builder ==
/// Builds the canonical cache key for a request.
///
/// Short requests map to `namespace:path?sorted-params`. When the
/// `path?sorted-params` text is longer than [`MAX_READABLE_KEY_LENGTH`]
/// characters the key becomes `namespace:hash:<sha256 hex>`.
///
/// The digest is taken over the whole `path?sorted-params` text, not the
/// parameter string alone, so equal long parameter sets on different paths
/// get different keys.
pub fn build_key(namespace: &str, path: &str, params: &QueryParams) -> String {
    let combined = if params.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, params.to_query_string())
    };

    if combined.chars().count() > MAX_READABLE_KEY_LENGTH {
        let mut hasher = Sha256::new();
        hasher.update(combined.as_bytes());
        format!("{}:{}:{}", namespace, HASH_SEGMENT, hex::encode(hasher.finalize()))
    } else {
        format!("{}:{}", namespace, combined)
    }
}

// == Resource Type ==
/// Extracts the resource type from a request path.
///
/// The resource type is the last non-empty path segment, ignoring any query
/// string: `/laps` and `v1/laps?x=1` both yield `laps`.
pub fn resource_type(path: &str) -> &str {
    let path = path.split('?').next().unwrap_or_default();
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .last()
        .unwrap_or_default()
}

// == Glob Matching ==
/// Matches `text` against a Redis-style glob pattern.
///
/// Supports `*`, `?`, `[abc]`, `[a-z]`, `[^a]` / `[!a]` and `\` escapes.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();

    let (mut pi, mut ti) = (0, 0);
    // (index of the last `*`, text index it currently absorbs up to)
    let mut star: Option<(usize, usize)> = None;

    loop {
        if pi < p.len() && p[pi] == '*' {
            star = Some((pi, ti));
            pi += 1;
            continue;
        }
        if ti == t.len() {
            break;
        }
        if pi < p.len() {
            if let Some(next) = match_one(&p, pi, t[ti]) {
                pi = next;
                ti += 1;
                continue;
            }
        }
        match star {
            Some((sp, st)) => {
                pi = sp + 1;
                ti = st + 1;
                star = Some((sp, st + 1));
            }
            None => return false,
        }
    }

    pi == p.len()
}

/// Matches one non-`*` pattern token at `pi`; returns the next pattern index.
fn match_one(p: &[char], pi: usize, c: char) -> Option<usize> {
    match p[pi] {
        '?' => Some(pi + 1),
        '[' => match_class(p, pi, c),
        '\\' if pi + 1 < p.len() => (p[pi + 1] == c).then_some(pi + 2),
        literal => (literal == c).then_some(pi + 1),
    }
}

fn match_class(p: &[char], start: usize, c: char) -> Option<usize> {
    let mut i = start + 1;
    let negate = i < p.len() && (p[i] == '^' || p[i] == '!');
    if negate {
        i += 1;
    }

    let mut matched = false;
    while i < p.len() && p[i] != ']' {
        if p[i] == '\\' && i + 1 < p.len() {
            matched |= p[i + 1] == c;
            i += 2;
        } else if i + 2 < p.len() && p[i + 1] == '-' && p[i + 2] != ']' {
            let (lo, hi) = if p[i] <= p[i + 2] {
                (p[i], p[i + 2])
            } else {
                (p[i + 2], p[i])
            };
            matched |= lo <= c && c <= hi;
            i += 3;
        } else {
            matched |= p[i] == c;
            i += 1;
        }
    }

    if i >= p.len() {
        // Unterminated class: treat `[` as a literal
        return (c == '[').then_some(start + 1);
    }

    (matched != negate).then_some(i + 1)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_string_is_sorted() {
        let params = QueryParams::new().with("session_key", 42).with("driver_number", 1);
        assert_eq!(params.to_query_string(), "driver_number=1&session_key=42");
        assert_eq!(params.get("session_key"), Some("42"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_insert_replaces_value() {
        let mut params = QueryParams::new();
        params.insert("year", 2023);
        params.insert("year", 2024);
        assert_eq!(params.to_query_string(), "year=2024");
    }

    #[test]
    fn test_build_key_readable() {
        let params = QueryParams::new().with("session_key", 42);
        assert_eq!(build_key("f1", "/laps", &params), "f1:/laps?session_key=42");
    }

    #[test]
    fn test_query_string_escapes_delimiters() {
        let params = QueryParams::new().with("driver_number", "1&session_key=9");
        assert_eq!(params.to_query_string(), "driver_number=1%26session_key%3D9");

        let params = QueryParams::new().with("a=b", "100%");
        assert_eq!(params.to_query_string(), "a%3Db=100%25");
    }

    #[test]
    fn test_embedded_separators_do_not_collide() {
        let smuggled = QueryParams::new().with("driver_number", "1&session_key=9");
        let split = QueryParams::new().with("driver_number", 1).with("session_key", 9);
        assert_ne!(build_key("f1", "/laps", &smuggled), build_key("f1", "/laps", &split));
        assert_eq!(
            build_key("f1", "/laps", &split),
            "f1:/laps?driver_number=1&session_key=9"
        );

        // An already-escaped value must not alias the raw one
        let raw = QueryParams::new().with("q", "&");
        let escaped = QueryParams::new().with("q", "%26");
        assert_ne!(build_key("f1", "/laps", &raw), build_key("f1", "/laps", &escaped));
    }

    #[test]
    fn test_digest_covers_path_and_params() {
        let params = QueryParams::new().with("filter", "y".repeat(250));
        let combined = format!("/car_data?{}", params.to_query_string());

        let key = build_key("f1", "/car_data", &params);
        assert_eq!(key, format!("f1:hash:{}", hex::encode(Sha256::digest(combined.as_bytes()))));
        assert_ne!(key, build_key("f1", "/position", &params));
    }

    #[test]
    fn test_build_key_without_params() {
        assert_eq!(build_key("f1", "/meetings", &QueryParams::new()), "f1:/meetings");
    }

    #[test]
    fn test_build_key_order_independent() {
        let a: QueryParams = [("a", 1), ("b", 2)].into_iter().collect();
        let b: QueryParams = [("b", 2), ("a", 1)].into_iter().collect();
        assert_eq!(build_key("f1", "/laps", &a), build_key("f1", "/laps", &b));
    }

    #[test]
    fn test_build_key_hashes_long_requests() {
        let params = QueryParams::new().with("filter", "x".repeat(250));
        let key = build_key("f1", "/car_data", &params);

        assert!(key.starts_with("f1:hash:"));
        assert!(!key.contains("xxxx"));
        // sha256 hex digest
        assert_eq!(key.len(), "f1:hash:".len() + 64);
        assert_eq!(key, build_key("f1", "/car_data", &params));
    }

    #[test]
    fn test_build_key_threshold_boundary() {
        // "/p?k=" is 5 chars, so 195 value chars lands exactly on the limit
        let at_limit = QueryParams::new().with("k", "v".repeat(195));
        let over_limit = QueryParams::new().with("k", "v".repeat(196));

        assert!(!build_key("f1", "/p", &at_limit).contains(":hash:"));
        assert!(build_key("f1", "/p", &over_limit).starts_with("f1:hash:"));
    }

    #[test]
    fn test_resource_type() {
        assert_eq!(resource_type("/laps"), "laps");
        assert_eq!(resource_type("laps"), "laps");
        assert_eq!(resource_type("v1/car_data/"), "car_data");
        assert_eq!(resource_type("/weather?session_key=1"), "weather");
        assert_eq!(resource_type(""), "");
    }

    #[test]
    fn test_glob_star_and_question() {
        assert!(glob_match("*", "/laps?session_key=42"));
        assert!(glob_match("/laps*", "/laps?session_key=42"));
        assert!(!glob_match("/laps*", "/pit?session_key=42"));
        assert!(glob_match("*session_key=4?", "/laps?session_key=42"));
        assert!(glob_match("a*b*c", "axxbyyc"));
        assert!(!glob_match("a*b*c", "axxbyy"));
        assert!(glob_match("", ""));
        assert!(!glob_match("", "a"));
    }

    #[test]
    fn test_glob_classes_and_escapes() {
        assert!(glob_match("h[ae]llo", "hallo"));
        assert!(!glob_match("h[ae]llo", "hillo"));
        assert!(glob_match("h[^e]llo", "hallo"));
        assert!(!glob_match("h[!a]llo", "hallo"));
        assert!(glob_match("lap[0-9]", "lap7"));
        assert!(glob_match("a\\*b", "a*b"));
        assert!(!glob_match("a\\*b", "axb"));
        assert!(glob_match("a[b", "a[b"));
    }
}
