//! In-memory hypermedia document model.
//!
//! A decoded response is a tree of [`Node`]s. Documents and links are the two
//! hypermedia node types; everything else is plain JSON structure. Trees are
//! built fresh by a codec on every decode and never shared, so there is no
//! identity beyond structural equality.

use std::str::FromStr;

use indexmap::IndexMap;

use crate::errors::ActionError;
use crate::identifiers::{FieldName, Method};
use crate::types::{Encoding, FieldKind, Location};

/// Insertion-ordered mapping from names to nodes.
pub type Content = IndexMap<String, Node>;

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// One node of a decoded document tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Document(Document),
    Link(Link),
    /// A plain JSON object with (possibly hypermedia) children.
    Object(Content),
    /// A plain JSON array with (possibly hypermedia) children.
    Array(Vec<Node>),
    /// A JSON scalar: null, boolean, number, or string. Never an array or
    /// object; those are always [`Node::Array`] / [`Node::Object`].
    Primitive(serde_json::Value),
}

impl Node {
    /// Returns the document if this node is one.
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Self::Document(document) => Some(document),
            _ => None,
        }
    }

    /// Returns the link if this node is one.
    pub fn as_link(&self) -> Option<&Link> {
        match self {
            Self::Link(link) => Some(link),
            _ => None,
        }
    }

    /// Returns the string if this node is a string primitive.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Primitive(serde_json::Value::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Looks up a single key one level down. See [`lookup_link`] for the
    /// per-node rules.
    pub fn child(&self, key: &PathKey) -> Option<&Node> {
        match (self, key) {
            (Self::Document(document), PathKey::Name(name)) => document.content.get(name),
            (Self::Document(document), PathKey::Index(index)) => {
                document.content.get(&index.to_string())
            }
            (Self::Object(content), PathKey::Name(name)) => content.get(name),
            (Self::Object(content), PathKey::Index(index)) => content.get(&index.to_string()),
            (Self::Array(items), PathKey::Index(index)) => items.get(*index),
            (Self::Array(items), PathKey::Name(name)) => {
                name.parse::<usize>().ok().and_then(|index| items.get(index))
            }
            _ => None,
        }
    }
}

impl From<Document> for Node {
    fn from(document: Document) -> Self {
        Self::Document(document)
    }
}

impl From<Link> for Node {
    fn from(link: Link) -> Self {
        Self::Link(link)
    }
}

/// Converts plain JSON with no hypermedia interpretation.
impl From<serde_json::Value> for Node {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Object(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, Node::from(v))).collect())
            }
            serde_json::Value::Array(items) => {
                Self::Array(items.into_iter().map(Node::from).collect())
            }
            scalar => Self::Primitive(scalar),
        }
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// A hypermedia resource: metadata plus ordered content.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    url: String,
    title: String,
    description: String,
    content: Content,
}

impl Document {
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        content: Content,
    ) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            description: description.into(),
            content,
        }
    }

    /// Absolute URL of the document; empty when the wire form had none.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn content(&self) -> &Content {
        &self.content
    }
}

// ---------------------------------------------------------------------------
// Link
// ---------------------------------------------------------------------------

/// An invocable action: URL template, method, and parameter schema.
///
/// `url` and `method` are required by [`Link::new`]; everything else has a
/// default (`application/json` encoding, no fields, empty title and
/// description) and is set with the `with_*` methods.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    url: String,
    method: Method,
    encoding: Encoding,
    fields: Vec<Field>,
    title: String,
    description: String,
}

impl Link {
    pub fn new(url: impl Into<String>, method: Method) -> Self {
        Self {
            url: url.into(),
            method,
            encoding: Encoding::default(),
            fields: Vec::new(),
            title: String::new(),
            description: String::new(),
        }
    }

    #[must_use]
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    #[must_use]
    pub fn with_fields(mut self, fields: Vec<Field>) -> Self {
        self.fields = fields;
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// URL template; may contain RFC 6570 expressions such as `{id}`.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Returns the field declared with `name`, if any.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name.as_str() == name)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

// ---------------------------------------------------------------------------
// Field
// ---------------------------------------------------------------------------

/// One parameter of a [`Link`].
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: FieldName,
    required: bool,
    location: Location,
    kind: FieldKind,
    description: String,
}

impl Field {
    /// Creates an optional field with unspecified location and string kind.
    pub fn new(name: FieldName) -> Self {
        Self {
            name,
            required: false,
            location: Location::default(),
            kind: FieldKind::default(),
            description: String::new(),
        }
    }

    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    #[must_use]
    pub fn at(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    #[must_use]
    pub fn of_kind(mut self, kind: FieldKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn name(&self) -> &FieldName {
        &self.name
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

// ---------------------------------------------------------------------------
// Key paths
// ---------------------------------------------------------------------------

/// One step of a [`KeyPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathKey {
    Name(String),
    Index(usize),
}

impl From<&str> for PathKey {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

impl From<String> for PathKey {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<usize> for PathKey {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// An ordered sequence of keys leading from a root node to a link.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct KeyPath(Vec<PathKey>);

impl KeyPath {
    pub fn new(keys: Vec<PathKey>) -> Self {
        Self(keys)
    }

    pub fn keys(&self) -> &[PathKey] {
        &self.0
    }
}

impl<K: Into<PathKey>> FromIterator<K> for KeyPath {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Parses dotted text such as `"users.0.read"`. All-digit segments become
/// [`PathKey::Index`]; the empty string is the empty path.
impl FromStr for KeyPath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::default());
        }
        Ok(s.split('.')
            .map(|segment| match segment.parse::<usize>() {
                Ok(index) if segment.bytes().all(|b| b.is_ascii_digit()) => PathKey::Index(index),
                _ => PathKey::Name(segment.to_owned()),
            })
            .collect())
    }
}

/// Renders as a JSON array, e.g. `["users",0,"read"]`.
impl std::fmt::Display for KeyPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered: Vec<serde_json::Value> = self
            .0
            .iter()
            .map(|key| match key {
                PathKey::Name(name) => serde_json::Value::from(name.as_str()),
                PathKey::Index(index) => serde_json::Value::from(*index),
            })
            .collect();
        write!(f, "{}", serde_json::Value::Array(rendered))
    }
}

// ---------------------------------------------------------------------------
// Link lookup
// ---------------------------------------------------------------------------

/// Walks `keys` from `root` and returns the link at the end of the path.
///
/// At a document the key is looked up in its content; at an object by name;
/// at an array by position. Fails with [`ActionError::LinkLookup`] when any
/// key is absent or the final node is not a link.
pub fn lookup_link<'a>(root: &'a Node, keys: &KeyPath) -> Result<&'a Link, ActionError> {
    let lookup_error = || ActionError::LinkLookup {
        keys: keys.to_string(),
    };

    let mut node = root;
    for key in keys.keys() {
        node = node.child(key).ok_or_else(lookup_error)?;
    }
    node.as_link().ok_or_else(lookup_error)
}
