//! HTTP transport for hypermedia actions.
//!
//! Implements [`hypermedia::Transport`] over `reqwest` for `http` and
//! `https` links.
//!
//! ## Action flow
//!
//! 1. [`RequestBuilder::build_request`] validates parameters against the
//!    link's fields and routes each value by location: path values expand
//!    the URL template, query values become the query string, form values
//!    merge into an object body, and a body value replaces the body.
//! 2. The body is serialised per the link encoding (JSON, url-encoded, or
//!    multipart), and default, `Authorization`, and CSRF headers are added.
//! 3. The request is sent; the response content type selects a decoder from
//!    the caller's registry, and the body is decoded against the final
//!    response URL.
//! 4. Non-2xx responses fail with [`hypermedia::ActionError::ErrorMessage`]
//!    carrying the decoded body.
//!
//! URL templates follow RFC 6570 (levels 1 to 4); see [`url_template`].

pub mod config;
pub mod encoding;
pub mod observer;
pub mod request;
mod transport;
pub mod url_template;

pub use config::{Authentication, ConfigError, CsrfConfig, HttpTransportConfig};
pub use observer::{RequestObserver, ResponseHead};
pub use request::{Credentials, PreparedRequest, RequestBody, RequestBuilder};
pub use transport::HttpTransport;
