//! Transport configuration.
//!
//! Everything a transport needs to know about the caller's session (default
//! headers, credentials, CSRF token, observer) is passed in explicitly at
//! construction. Nothing is read from ambient state.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use thiserror::Error;
use url::Url;

use crate::observer::RequestObserver;

/// Invalid transport configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid header name '{name}'")]
    InvalidHeaderName { name: String },

    #[error("Invalid value for header '{name}'")]
    InvalidHeaderValue { name: String },

    #[error("Invalid base URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Failed to initialise the HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

/// Credentials attached to every request as an `Authorization` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authentication {
    /// `Authorization: <scheme> <token>`, e.g. `Token abc123` or `Bearer abc123`.
    Token { scheme: String, token: String },
    /// `Authorization: Basic base64(username:password)`.
    Basic { username: String, password: String },
}

impl Authentication {
    /// Returns the `Authorization` header value.
    pub fn header_value(&self) -> String {
        match self {
            Self::Token { scheme, token } => format!("{scheme} {token}"),
            Self::Basic { username, password } => {
                format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// CSRF
// ---------------------------------------------------------------------------

/// CSRF protection for session-authenticated APIs.
///
/// When configured, requests are sent with `same-origin` credentials and
/// every non-safe request carries the token both as a header and as a
/// cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfConfig {
    /// Header carrying the token. Default `X-CSRFToken`.
    pub header_name: String,
    /// Cookie carrying the token. Default `csrftoken`.
    pub cookie_name: String,
    pub token: String,
}

impl CsrfConfig {
    /// Creates a configuration with the default header and cookie names.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            header_name: "X-CSRFToken".to_owned(),
            cookie_name: "csrftoken".to_owned(),
            token: token.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Transport configuration
// ---------------------------------------------------------------------------

/// Configuration for [`crate::HttpTransport`].
///
/// | Field | Default |
/// |-------|---------|
/// | `headers` | none |
/// | `authentication` | none |
/// | `csrf` | none |
/// | `base_url` | none; relative request URLs are rejected |
/// | `observer` | none |
#[derive(Clone, Default)]
pub struct HttpTransportConfig {
    /// Headers sent with every request; request-specific headers override them.
    pub headers: HeaderMap,
    pub authentication: Option<Authentication>,
    pub csrf: Option<CsrfConfig>,
    /// Base for relative request URLs.
    pub base_url: Option<Url>,
    pub observer: Option<Arc<dyn RequestObserver>>,
}

impl HttpTransportConfig {
    /// Adds a default header. Repeating a name keeps every value; repeated
    /// `Cookie` values are joined into one header when a request is built.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, ConfigError> {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|_| ConfigError::InvalidHeaderName {
                name: name.to_owned(),
            })?;
        let header_value =
            HeaderValue::from_str(value).map_err(|_| ConfigError::InvalidHeaderValue {
                name: name.to_owned(),
            })?;
        self.headers.append(header_name, header_value);
        Ok(self)
    }

    #[must_use]
    pub fn with_authentication(mut self, authentication: Authentication) -> Self {
        self.authentication = Some(authentication);
        self
    }

    #[must_use]
    pub fn with_csrf(mut self, csrf: CsrfConfig) -> Self {
        self.csrf = Some(csrf);
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ConfigError> {
        let parsed = Url::parse(base_url).map_err(|source| ConfigError::InvalidBaseUrl {
            url: base_url.to_owned(),
            source,
        })?;
        self.base_url = Some(parsed);
        Ok(self)
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn RequestObserver>) -> Self {
        self.observer = Some(observer);
        self
    }
}

impl std::fmt::Debug for HttpTransportConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransportConfig")
            .field("headers", &self.headers)
            .field("authentication", &self.authentication.is_some())
            .field("csrf", &self.csrf.is_some())
            .field("base_url", &self.base_url)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_authentication_uses_the_given_scheme() {
        let auth = Authentication::Token {
            scheme: "Bearer".into(),
            token: "abc".into(),
        };
        assert_eq!(auth.header_value(), "Bearer abc");
    }

    #[test]
    fn basic_authentication_is_base64_encoded() {
        let auth = Authentication::Basic {
            username: "Aladdin".into(),
            password: "open sesame".into(),
        };
        assert_eq!(auth.header_value(), "Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ==");
    }

    #[test]
    fn invalid_headers_are_rejected() {
        assert!(matches!(
            HttpTransportConfig::default().with_header("bad name", "x"),
            Err(ConfigError::InvalidHeaderName { .. })
        ));
        assert!(matches!(
            HttpTransportConfig::default().with_header("X-Ok", "line\nbreak"),
            Err(ConfigError::InvalidHeaderValue { .. })
        ));
    }

    #[test]
    fn repeated_headers_keep_every_value() {
        let config = HttpTransportConfig::default()
            .with_header("X-Tag", "a")
            .unwrap()
            .with_header("x-tag", "b")
            .unwrap();
        let values: Vec<_> = config.headers.get_all("x-tag").iter().collect();
        assert_eq!(values, ["a", "b"]);
    }

    #[test]
    fn base_url_must_be_absolute() {
        assert!(HttpTransportConfig::default().with_base_url("/api/").is_err());
        let config = HttpTransportConfig::default()
            .with_base_url("http://api.test/")
            .unwrap();
        assert_eq!(config.base_url.unwrap().as_str(), "http://api.test/");
    }
}
