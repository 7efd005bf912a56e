//! Hypermedia document model and codec registry.
//!
//! This crate contains the in-memory document model, link lookup, response
//! decoders with content-type negotiation, parameter conversion, the error
//! type shared by every layer, and the [`Transport`] port that infrastructure
//! crates implement.
//!
//! ## Architectural Layer
//!
//! **Domain + port definitions.** This crate has no I/O dependencies. It
//! defines *what* a transport must do; `http-transport` defines *how*.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`document`] | `Node`, `Document`, `Link`, `Field`, key paths, `lookup_link` |
//! | [`codecs`] | `Codec` trait, CoreJSON / JSON / text codecs, negotiation |
//! | [`params`] | Parameter map and text-to-value conversion |
//! | [`transport`] | `Transport` port trait |
//! | [`identifiers`] | Newtype names (`FieldName`, `Method`, `RequestId`) |
//! | [`types`] | Wire vocabularies (`Encoding`, `Location`, `FieldKind`) and `Timestamp` |
//! | [`errors`] | `ActionError` and its kind tags |

pub mod codecs;
pub mod document;
pub mod errors;
pub mod identifiers;
pub mod params;
pub mod transport;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use codecs::{
    default_decoders, negotiate_decoder, Codec, CoreJsonCodec, DecodeOptions, JsonCodec,
    TextCodec,
};
pub use document::{lookup_link, Content, Document, Field, KeyPath, Link, Node, PathKey};
pub use errors::{ActionError, ErrorKind};
pub use identifiers::{FieldName, Method, RequestId};
pub use params::{parse_params, parse_value, Params};
pub use transport::Transport;
pub use types::{Encoding, FieldKind, Location, Timestamp};
