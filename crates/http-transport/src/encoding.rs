//! Percent-encoding and form serialisation.
//!
//! The character sets mirror the ECMAScript `encodeURIComponent` /
//! `encodeURI` functions, so request URLs and bodies are byte-identical to
//! those produced by browser CoreAPI clients.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;

/// Characters escaped by `encodeURIComponent`.
pub(crate) const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// RFC 3986 unreserved characters only; everything else is escaped.
pub(crate) const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Characters escaped by `encodeURI`, keeping `[` and `]`.
pub(crate) const RESERVED: &AsciiSet = &COMPONENT
    .remove(b';')
    .remove(b',')
    .remove(b'/')
    .remove(b'?')
    .remove(b':')
    .remove(b'@')
    .remove(b'&')
    .remove(b'=')
    .remove(b'+')
    .remove(b'$')
    .remove(b'#')
    .remove(b'[')
    .remove(b']');

/// Encodes like `encodeURIComponent`.
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// Renders a parameter value as text: strings verbatim, everything else as
/// JSON (`42`, `true`, `null`, `[1,2]`).
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Serialises pairs as `k1=v1&k2=v2`, both sides component-encoded.
///
/// Used for query strings and `application/x-www-form-urlencoded` bodies.
pub fn encode_pairs<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a String, &'a Value)>,
{
    pairs
        .into_iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                encode_component(key),
                encode_component(&value_text(value))
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Splits and percent-decodes a `k=v&…` string. Inverse of [`encode_pairs`]
/// for string values.
pub fn decode_pairs(encoded: &str) -> Vec<(String, String)> {
    encoded
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (
                percent_decode_str(key).decode_utf8_lossy().into_owned(),
                percent_decode_str(value).decode_utf8_lossy().into_owned(),
            )
        })
        .collect()
}

/// Appends an encoded query string to `url`, before any fragment.
pub fn append_query(url: &str, query: &str) -> String {
    if query.is_empty() {
        return url.to_owned();
    }
    let (base, fragment) = match url.find('#') {
        Some(index) => url.split_at(index),
        None => (url, ""),
    };
    let separator = match base.find('?') {
        None => "?",
        Some(_) if base.ends_with('?') || base.ends_with('&') => "",
        Some(_) => "&",
    };
    format!("{base}{separator}{query}{fragment}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use serde_json::json;

    #[test]
    fn component_encoding_matches_encode_uri_component() {
        assert_eq!(encode_component("a b&c=d/é"), "a%20b%26c%3Dd%2F%C3%A9");
        assert_eq!(encode_component("-_.!~*'()"), "-_.!~*'()");
    }

    #[test]
    fn non_string_values_render_as_json() {
        assert_eq!(value_text(&json!("plain")), "plain");
        assert_eq!(value_text(&json!(42)), "42");
        assert_eq!(value_text(&json!(false)), "false");
        assert_eq!(value_text(&json!(null)), "null");
        assert_eq!(value_text(&json!([1, "a"])), r#"[1,"a"]"#);
    }

    #[test]
    fn form_encoding_round_trips() {
        let params: IndexMap<String, Value> = IndexMap::from([
            ("title".to_owned(), json!("Hello, world & co")),
            ("lang".to_owned(), json!("中文")),
            ("a=b".to_owned(), json!("x+y%z")),
            ("empty".to_owned(), json!("")),
        ]);
        let encoded = encode_pairs(&params);
        assert!(!encoded.contains(' '));
        let decoded = decode_pairs(&encoded);
        let expected: Vec<(String, String)> = params
            .iter()
            .map(|(k, v)| (k.clone(), v.as_str().unwrap().to_owned()))
            .collect();
        assert_eq!(decoded, expected);
    }

    #[test]
    fn query_is_appended_before_the_fragment() {
        assert_eq!(append_query("http://h/p", "a=1"), "http://h/p?a=1");
        assert_eq!(append_query("http://h/p?x=0", "a=1"), "http://h/p?x=0&a=1");
        assert_eq!(append_query("http://h/p?", "a=1"), "http://h/p?a=1");
        assert_eq!(append_query("/p#top", "a=1"), "/p?a=1#top");
        assert_eq!(append_query("/p", ""), "/p");
    }
}
