//! Hypermedia action client.
//!
//! A [`Client`] resolves a key path to a link inside a decoded document,
//! picks the transport registered for the link's URL scheme, and delegates
//! the request to it along with the client's decoder registry.
//!
//! ```text
//! Client::action(document, ["users", "list"], params)
//!     ├─ lookup_link          → &Link, or LinkLookupError
//!     ├─ determine_transport  → &dyn Transport, or UnsupportedScheme
//!     └─ Transport::action    → Node, or Parameter/ErrorMessage/…
//! ```
//!
//! Decoders and transports are fixed at construction. A client holds no
//! per-call state and may be shared across tasks.

use std::sync::Arc;

use http_transport::{ConfigError, HttpTransport, HttpTransportConfig};
use hypermedia::{
    default_decoders, lookup_link, ActionError, Codec, KeyPath, Link, Method, Node, Params,
    Transport,
};
use url::Url;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Decoders and transports a [`Client`] dispatches to.
///
/// | Field | Default ([`ClientConfig::with_http`]) |
/// |-------|---------|
/// | `decoders` | CoreJSON, JSON, text |
/// | `transports` | one [`HttpTransport`] |
/// | `base_url` | the transport configuration's base URL |
#[derive(Clone)]
pub struct ClientConfig {
    /// Response decoders, in negotiation order.
    pub decoders: Vec<Arc<dyn Codec>>,
    /// Transports, searched in order for the first that handles a scheme.
    pub transports: Vec<Arc<dyn Transport>>,
    /// Supplies the scheme of relative link URLs.
    pub base_url: Option<Url>,
}

impl ClientConfig {
    /// A configuration with the default decoders and the given transports.
    pub fn new(transports: Vec<Arc<dyn Transport>>) -> Self {
        Self {
            decoders: default_decoders(),
            transports,
            base_url: None,
        }
    }

    /// The default configuration: default decoders and one HTTP transport.
    pub fn with_http(config: HttpTransportConfig) -> Result<Self, ConfigError> {
        let base_url = config.base_url.clone();
        let transport = HttpTransport::new(config)?;
        Ok(Self {
            base_url,
            ..Self::new(vec![Arc::new(transport)])
        })
    }

    #[must_use]
    pub fn with_decoders(mut self, decoders: Vec<Arc<dyn Codec>>) -> Self {
        self.decoders = decoders;
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let media_types: Vec<&str> = self.decoders.iter().map(|d| d.media_type()).collect();
        let schemes: Vec<&[String]> = self.transports.iter().map(|t| t.schemes()).collect();
        f.debug_struct("ClientConfig")
            .field("decoders", &media_types)
            .field("transports", &schemes)
            .field("base_url", &self.base_url)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Entry point for invoking links.
#[derive(Debug, Clone)]
pub struct Client {
    config: ClientConfig,
}

impl Client {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    /// A client with the default decoders and an HTTP transport built from
    /// `config`.
    pub fn with_http(config: HttpTransportConfig) -> Result<Self, ConfigError> {
        ClientConfig::with_http(config).map(Self::new)
    }

    pub fn decoders(&self) -> &[Arc<dyn Codec>] {
        &self.config.decoders
    }

    /// Invokes the link found at `keys` inside `document`.
    ///
    /// # Errors
    ///
    /// - [`ActionError::LinkLookup`] if `keys` does not lead to a link.
    /// - [`ActionError::UnsupportedScheme`] if no transport handles the
    ///   link's URL.
    /// - Anything the transport returns.
    pub async fn action(
        &self,
        document: &Node,
        keys: &KeyPath,
        params: &Params,
    ) -> Result<Node, ActionError> {
        let link = lookup_link(document, keys)?;
        tracing::debug!(%keys, url = link.url(), "Resolved link");
        self.invoke(link, params).await
    }

    /// Fetches `url` with a plain `GET`.
    pub async fn get(&self, url: &str) -> Result<Node, ActionError> {
        let link = Link::new(url, Method::get());
        self.invoke(&link, &Params::new()).await
    }

    /// Sends `link` through the transport for its scheme.
    pub async fn invoke(&self, link: &Link, params: &Params) -> Result<Node, ActionError> {
        let transport = self.determine_transport(link.url())?;
        transport.action(link, &self.config.decoders, params).await
    }

    /// Returns the first transport that handles the scheme of `url`.
    ///
    /// Relative URLs take the scheme of the configured base URL; without one
    /// they have no scheme and are rejected.
    pub fn determine_transport(&self, url: &str) -> Result<&dyn Transport, ActionError> {
        let unsupported = || ActionError::UnsupportedScheme {
            url: url.to_owned(),
        };

        let scheme = match Url::parse(url) {
            Ok(parsed) => parsed.scheme().to_owned(),
            Err(url::ParseError::RelativeUrlWithoutBase) => self
                .config
                .base_url
                .as_ref()
                .map(|base| base.scheme().to_owned())
                .ok_or_else(unsupported)?,
            Err(_) => return Err(unsupported()),
        };

        self.config
            .transports
            .iter()
            .find(|transport| transport.schemes().iter().any(|s| *s == scheme))
            .map(|transport| transport.as_ref())
            .ok_or_else(unsupported)
    }
}
