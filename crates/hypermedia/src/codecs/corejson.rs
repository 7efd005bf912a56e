//! CoreJSON (`application/coreapi+json`) decoding and encoding.
//!
//! Objects tagged `"_type": "document"` or `"_type": "link"` become
//! [`Document`]s and [`Link`]s; every other value is plain structure. Content
//! keys that collide with the reserved `_type` / `_meta` keys are escaped on
//! the wire with one extra leading underscore.

use std::borrow::Cow;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::{Map, Value};
use url::Url;

use crate::codecs::{Codec, DecodeOptions};
use crate::document::{Content, Document, Field, Link, Node};
use crate::errors::ActionError;
use crate::identifiers::{FieldName, Method};
use crate::types::{Encoding, FieldKind, Location};

const EXCLUDED_KEYS: [&str; 2] = ["_type", "_meta"];

/// Hypermedia JSON decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoreJsonCodec;

impl Codec for CoreJsonCodec {
    fn media_type(&self) -> &str {
        "application/coreapi+json"
    }

    fn decode(&self, text: &str, options: &DecodeOptions) -> Result<Node, ActionError> {
        let data: Value = serde_json::from_str(text).map_err(|e| ActionError::Decode {
            media_type: self.media_type().to_owned(),
            message: e.to_string(),
        })?;
        Ok(CoreJsonCodec::decode_value(data, options.url.as_deref()))
    }
}

impl CoreJsonCodec {
    /// Converts already-parsed JSON into a node tree, resolving relative URLs
    /// against `base_url`.
    pub fn decode_value(data: Value, base_url: Option<&str>) -> Node {
        primitive_to_node(data, base_url)
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

fn primitive_to_node(data: Value, base_url: Option<&str>) -> Node {
    match data {
        Value::Object(map) => match Tag::of(&map) {
            Tag::Document => Node::Document(decode_document(map, base_url)),
            Tag::Link => Node::Link(decode_link(&Value::Object(map), base_url)),
            Tag::Plain => Node::Object(
                map.into_iter()
                    .map(|(key, value)| (key, primitive_to_node(value, base_url)))
                    .collect(),
            ),
        },
        Value::Array(items) => Node::Array(
            items
                .into_iter()
                .map(|item| primitive_to_node(item, base_url))
                .collect(),
        ),
        scalar => Node::Primitive(scalar),
    }
}

/// The three ways a JSON object is interpreted.
enum Tag {
    Document,
    Link,
    Plain,
}

impl Tag {
    fn of(map: &Map<String, Value>) -> Self {
        match map.get("_type").and_then(Value::as_str) {
            Some("document") => Self::Document,
            Some("link") => Self::Link,
            _ => Self::Plain,
        }
    }
}

fn decode_document(mut map: Map<String, Value>, base_url: Option<&str>) -> Document {
    let meta = map.remove("_meta").unwrap_or(Value::Null);
    let url = resolved_url(get_string(&meta, "url"), base_url);
    let title = get_string(&meta, "title");
    let description = get_string(&meta, "description");

    // Content is resolved against the document's own URL when it has one.
    let content_base = if url.is_empty() { base_url } else { Some(url.as_str()) };
    let content: Content = map
        .into_iter()
        .filter(|(key, _)| !EXCLUDED_KEYS.contains(&key.as_str()))
        .map(|(key, value)| (unescape_key(key), primitive_to_node(value, content_base)))
        .collect();

    Document::new(url, title, description, content)
}

fn decode_link(data: &Value, base_url: Option<&str>) -> Link {
    let url = resolved_url(get_string(data, "url"), base_url);
    let method = Method::new(get_string(data, "action")).unwrap_or_default();
    let encoding = Encoding::from_media_type(get_string(data, "encoding")).unwrap_or_default();

    let fields = get_array(data, "fields")
        .iter()
        .filter_map(decode_field)
        .collect();

    Link::new(url, method)
        .with_encoding(encoding)
        .with_fields(fields)
        .with_title(get_string(data, "title"))
        .with_description(get_string(data, "description"))
}

fn decode_field(data: &Value) -> Option<Field> {
    let Some(name) = FieldName::new(get_string(data, "name")) else {
        tracing::debug!("Skipping link field without a name");
        return None;
    };

    let schema = data.get("schema").unwrap_or(&Value::Null);
    let mut description = get_string(data, "fieldDescription");
    if description.is_empty() {
        description = get_string(schema, "description");
    }

    Some(
        Field::new(name)
            .required(data.get("required").and_then(Value::as_bool).unwrap_or(false))
            .at(Location::parse(get_string(data, "location")))
            .of_kind(FieldKind::parse(get_string(schema, "_type")))
            .with_description(description),
    )
}

/// Returns the string at `key`, or `""` if it is missing or not a string.
fn get_string<'a>(data: &'a Value, key: &str) -> &'a str {
    data.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn get_array<'a>(data: &'a Value, key: &str) -> &'a [Value] {
    data.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// `__type` → `_type`, `__meta` → `_meta` (and so on for deeper escapes).
fn unescape_key(key: String) -> String {
    if key.starts_with('_') && (key.ends_with("__type") || key.ends_with("__meta")) {
        key[1..].to_owned()
    } else {
        key
    }
}

fn escape_key(key: &str) -> Cow<'_, str> {
    let trimmed = key.trim_start_matches('_');
    if trimmed.len() < key.len() && (trimmed == "type" || trimmed == "meta") {
        Cow::Owned(format!("_{key}"))
    } else {
        Cow::Borrowed(key)
    }
}

fn resolved_url(relative: &str, base_url: Option<&str>) -> String {
    if relative.is_empty() {
        String::new()
    } else {
        resolve_url(relative, base_url)
    }
}

// ---------------------------------------------------------------------------
// URL resolution
// ---------------------------------------------------------------------------

/// Resolves a possibly relative URL template against `base`.
///
/// Template expressions (`{id}`, `{?page}`) are carried through verbatim;
/// URL parsing would otherwise percent-encode the braces. Absolute URLs, and
/// relative URLs with no usable base, are returned unchanged.
pub fn resolve_url(relative: &str, base: Option<&str>) -> String {
    if Url::parse(relative).is_ok() {
        return relative.to_owned();
    }
    let Some(base) = base.and_then(|b| Url::parse(b).ok()) else {
        return relative.to_owned();
    };

    let (masked, expressions) = mask_expressions(relative);
    match base.join(&masked) {
        Ok(joined) => {
            let mut resolved = joined.to_string();
            for (index, expression) in expressions.iter().enumerate() {
                resolved = resolved.replacen(&placeholder(index), expression, 1);
            }
            resolved
        }
        Err(_) => relative.to_owned(),
    }
}

fn placeholder(index: usize) -> String {
    format!("__expr{index}__")
}

fn mask_expressions(template: &str) -> (String, Vec<&str>) {
    let mut masked = String::with_capacity(template.len());
    let mut expressions = Vec::new();
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        masked.push_str(&rest[..start]);
        masked.push_str(&placeholder(expressions.len()));
        expressions.push(&rest[start..=start + len]);
        rest = &rest[start + len + 1..];
    }
    masked.push_str(rest);
    (masked, expressions)
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Nodes serialise back to CoreJSON. Empty metadata and default link
/// attributes are omitted, so decoding the output reproduces the tree.
impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Node::Document(document) => document.serialize(serializer),
            Node::Link(link) => link.serialize(serializer),
            Node::Object(content) => serializer.collect_map(content),
            Node::Array(items) => serializer.collect_seq(items),
            Node::Primitive(value) => value.serialize(serializer),
        }
    }
}

#[derive(Serialize)]
struct WireMeta<'a> {
    #[serde(skip_serializing_if = "is_empty")]
    url: &'a str,
    #[serde(skip_serializing_if = "is_empty")]
    title: &'a str,
    #[serde(skip_serializing_if = "is_empty")]
    description: &'a str,
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("_type", "document")?;

        let meta = WireMeta {
            url: self.url(),
            title: self.title(),
            description: self.description(),
        };
        if !(meta.url.is_empty() && meta.title.is_empty() && meta.description.is_empty()) {
            map.serialize_entry("_meta", &meta)?;
        }

        for (key, value) in self.content() {
            map.serialize_entry(escape_key(key).as_ref(), value)?;
        }
        map.end()
    }
}

#[derive(Serialize)]
struct WireLink<'a> {
    #[serde(rename = "_type")]
    tag: &'static str,
    #[serde(skip_serializing_if = "is_empty")]
    url: &'a str,
    #[serde(skip_serializing_if = "is_default_action")]
    action: &'a str,
    #[serde(skip_serializing_if = "is_default_encoding")]
    encoding: Encoding,
    #[serde(skip_serializing_if = "is_empty")]
    title: &'a str,
    #[serde(skip_serializing_if = "is_empty")]
    description: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<WireField<'a>>,
}

#[derive(Serialize)]
struct WireField<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "is_false")]
    required: bool,
    #[serde(skip_serializing_if = "is_empty")]
    location: &'static str,
    #[serde(rename = "fieldDescription", skip_serializing_if = "is_empty")]
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    schema: Option<WireSchema>,
}

#[derive(Serialize)]
struct WireSchema {
    #[serde(rename = "_type")]
    tag: &'static str,
}

impl Serialize for Link {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WireLink {
            tag: "link",
            url: self.url(),
            action: self.method().as_str(),
            encoding: self.encoding(),
            title: self.title(),
            description: self.description(),
            fields: self
                .fields()
                .iter()
                .map(|field| WireField {
                    name: field.name().as_str(),
                    required: field.is_required(),
                    location: field.location().as_str(),
                    description: field.description(),
                    schema: (field.kind() != FieldKind::String).then(|| WireSchema {
                        tag: field.kind().as_str(),
                    }),
                })
                .collect(),
        }
        .serialize(serializer)
    }
}

fn is_empty(value: &&str) -> bool {
    value.is_empty()
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_default_action(value: &&str) -> bool {
    *value == "get"
}

fn is_default_encoding(value: &Encoding) -> bool {
    *value == Encoding::default()
}
