//! Transport port.
//!
//! A transport turns a link plus parameter values into one request over some
//! protocol, and decodes the response with the client's codec registry. The
//! HTTP implementation lives in the `http-transport` crate; this crate only
//! defines the contract.

use std::sync::Arc;

use async_trait::async_trait;

use crate::codecs::Codec;
use crate::document::{Link, Node};
use crate::errors::ActionError;
use crate::params::Params;

/// Executes link actions for a fixed set of URL schemes.
///
/// Implementations hold no per-call state, so one instance may serve any
/// number of concurrent actions.
#[async_trait]
pub trait Transport: Send + Sync {
    /// URL schemes handled by this transport, e.g. `["http", "https"]`.
    fn schemes(&self) -> &[String];

    /// Builds and issues the request for `link`, then decodes the response.
    ///
    /// # Errors
    ///
    /// - [`ActionError::Parameter`] if `params` does not satisfy the link's
    ///   fields; no request is sent.
    /// - [`ActionError::ErrorMessage`] if the response status is not 2xx.
    /// - Any negotiation, decode, URL, or network error.
    async fn action(
        &self,
        link: &Link,
        decoders: &[Arc<dyn Codec>],
        params: &Params,
    ) -> Result<Node, ActionError>;
}
