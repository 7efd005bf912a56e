//! Error types for hypermedia actions.
//!
//! [`ActionError`] covers every way a single `action` call can fail. None of
//! these conditions is retried internally; each surfaces to the caller, who
//! is expected to handle the kinds distinctly (e.g. show a validation message
//! for [`ErrorKind::Parameter`] and a response panel for
//! [`ErrorKind::ErrorMessage`]).

use thiserror::Error;

use crate::document::Node;

// ---------------------------------------------------------------------------
// Error kind tags
// ---------------------------------------------------------------------------

/// Stable name tag for an [`ActionError`].
///
/// The names match the error names exposed by other CoreAPI clients so that
/// callers can branch on them without matching the full enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Parameter,
    LinkLookup,
    ErrorMessage,
    UnsupportedScheme,
    UnsupportedMediaType,
    Decode,
    InvalidUrl,
    Network,
}

impl ErrorKind {
    /// Returns the error name, e.g. `"ParameterError"`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Parameter => "ParameterError",
            Self::LinkLookup => "LinkLookupError",
            Self::ErrorMessage => "ErrorMessage",
            Self::UnsupportedScheme => "UnsupportedSchemeError",
            Self::UnsupportedMediaType => "UnsupportedMediaTypeError",
            Self::Decode => "DecodeError",
            Self::InvalidUrl => "InvalidUrlError",
            Self::Network => "NetworkError",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Action errors
// ---------------------------------------------------------------------------

/// Errors produced while resolving, building, issuing, or decoding an action.
#[derive(Debug, Error)]
pub enum ActionError {
    /// Required fields were missing, unknown parameters were supplied, or a
    /// parameter value could not be used.
    ///
    /// Raised before any network I/O.
    #[error("{message}")]
    Parameter {
        /// Human-readable description, e.g. `Missing required field: "id"`.
        message: String,
    },

    /// A key path did not resolve to a link inside a document tree.
    ///
    /// Raised before any request is built.
    #[error("Invalid link lookup: {keys}")]
    LinkLookup {
        /// The key path that failed, rendered as a JSON array.
        keys: String,
    },

    /// The server answered with a non-2xx status.
    #[error("{title}")]
    ErrorMessage {
        /// The HTTP status line, e.g. `"404 Not Found"`.
        title: String,
        /// The decoded response body.
        content: Node,
    },

    /// No registered transport handles the URL's scheme.
    #[error("Unsupported scheme in URL: {url}")]
    UnsupportedScheme {
        /// The URL whose scheme was not recognised.
        url: String,
    },

    /// No registered decoder accepts the response content type.
    #[error("Unsupported media in Content-Type header: {content_type}")]
    UnsupportedMediaType {
        /// The response `Content-Type` header as received.
        content_type: String,
    },

    /// The response body could not be decoded by the negotiated codec.
    #[error("Failed to decode {media_type} response: {message}")]
    Decode {
        /// Media type of the codec that failed.
        media_type: String,
        /// Parser error description.
        message: String,
    },

    /// A request URL could not be turned into an absolute URL.
    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
        /// Why the URL was rejected.
        message: String,
    },

    /// The request could not be sent or the response could not be read.
    #[error("Network error: {source}")]
    Network {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ActionError {
    /// Creates an [`ActionError::Parameter`].
    pub fn parameter(message: impl Into<String>) -> Self {
        Self::Parameter {
            message: message.into(),
        }
    }

    /// Creates an [`ActionError::Network`] from any transport-level error.
    pub fn network(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Network {
            source: Box::new(source),
        }
    }

    /// Returns the kind tag for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Parameter { .. } => ErrorKind::Parameter,
            Self::LinkLookup { .. } => ErrorKind::LinkLookup,
            Self::ErrorMessage { .. } => ErrorKind::ErrorMessage,
            Self::UnsupportedScheme { .. } => ErrorKind::UnsupportedScheme,
            Self::UnsupportedMediaType { .. } => ErrorKind::UnsupportedMediaType,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::InvalidUrl { .. } => ErrorKind::InvalidUrl,
            Self::Network { .. } => ErrorKind::Network,
        }
    }

    /// Returns the decoded response body carried by an
    /// [`ActionError::ErrorMessage`].
    pub fn content(&self) -> Option<&Node> {
        match self {
            Self::ErrorMessage { content, .. } => Some(content),
            _ => None,
        }
    }
}
