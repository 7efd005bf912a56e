//! Shared value types for the hypermedia model.
//!
//! These are the closed vocabularies that appear on the wire as free-form
//! strings (`"query"`, `"multipart/form-data"`, `"integer"`) and are parsed
//! once, at decode time, into enums.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Request body encoding
// ---------------------------------------------------------------------------

/// How a link's request body is serialised.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Encoding {
    /// `application/json`: the body is JSON text.
    #[default]
    #[serde(rename = "application/json")]
    Json,
    /// `multipart/form-data`: one part per top-level body key.
    #[serde(rename = "multipart/form-data")]
    Multipart,
    /// `application/x-www-form-urlencoded`: percent-encoded `key=value` pairs.
    #[serde(rename = "application/x-www-form-urlencoded")]
    UrlEncoded,
}

impl Encoding {
    /// Parses a media type string, returning `None` for unsupported encodings.
    pub fn from_media_type(value: &str) -> Option<Self> {
        match value {
            "application/json" => Some(Self::Json),
            "multipart/form-data" => Some(Self::Multipart),
            "application/x-www-form-urlencoded" => Some(Self::UrlEncoded),
            _ => None,
        }
    }

    /// Returns the media type string for this encoding.
    pub fn as_media_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Multipart => "multipart/form-data",
            Self::UrlEncoded => "application/x-www-form-urlencoded",
        }
    }
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_media_type())
    }
}

// ---------------------------------------------------------------------------
// Field location
// ---------------------------------------------------------------------------

/// Where a field's value is placed in the outgoing request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    /// Appended to the URL query string.
    Query,
    /// Substituted into the URL template.
    Path,
    /// Merged into the request body as one key.
    Form,
    /// Used as the entire request body.
    Body,
    /// No location declared. The parameter is accepted but not sent.
    #[default]
    Unspecified,
}

impl Location {
    /// Parses a wire location. Unknown values map to [`Location::Unspecified`].
    pub fn parse(value: &str) -> Self {
        match value {
            "query" => Self::Query,
            "path" => Self::Path,
            "form" => Self::Form,
            "body" => Self::Body,
            _ => Self::Unspecified,
        }
    }

    /// Returns the wire form; empty for [`Location::Unspecified`].
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Path => "path",
            Self::Form => "form",
            Self::Body => "body",
            Self::Unspecified => "",
        }
    }
}

// ---------------------------------------------------------------------------
// Field kind
// ---------------------------------------------------------------------------

/// Declared type of a field's value, taken from the field schema.
///
/// Only used to convert textual input into typed parameter values; see
/// [`crate::params`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    #[default]
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl FieldKind {
    /// Parses a schema type tag. Unknown tags (e.g. `"enum"`) are strings.
    pub fn parse(value: &str) -> Self {
        match value {
            "integer" => Self::Integer,
            "number" => Self::Number,
            "boolean" => Self::Boolean,
            "array" => Self::Array,
            "object" => Self::Object,
            _ => Self::String,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
