//! Codec registry: response decoders and content-type negotiation.
//!
//! A client holds an ordered list of decoders. For every response the list is
//! searched in registration order for the first decoder that accepts the
//! response's `Content-Type`; earlier registrations win ties.
//!
//! | Codec | Media type | Output |
//! |-------|------------|--------|
//! | [`CoreJsonCodec`] | `application/coreapi+json` | documents and links |
//! | [`JsonCodec`] | `application/json` | plain structural nodes |
//! | [`TextCodec`] | `text/*` | one string primitive |

use std::sync::Arc;

use crate::document::Node;
use crate::errors::ActionError;

mod corejson;
mod json;
mod text;

pub use corejson::CoreJsonCodec;
pub use json::JsonCodec;
pub use text::TextCodec;

/// Per-call decoding context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// URL the body was fetched from. Relative link and document URLs are
    /// resolved against it.
    pub url: Option<String>,
}

impl DecodeOptions {
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
        }
    }
}

/// A response body decoder for one media type.
///
/// Implementations are pure: the same input always decodes to structurally
/// equal output, and no state is kept between calls.
pub trait Codec: Send + Sync {
    /// Media type this codec accepts. May contain a wildcard subtype
    /// (`text/*`) or be `*/*`.
    fn media_type(&self) -> &str;

    /// Decodes a response body.
    fn decode(&self, text: &str, options: &DecodeOptions) -> Result<Node, ActionError>;
}

/// The default decoder registry: CoreJSON, then plain JSON, then text.
pub fn default_decoders() -> Vec<Arc<dyn Codec>> {
    vec![
        Arc::new(CoreJsonCodec),
        Arc::new(JsonCodec),
        Arc::new(TextCodec),
    ]
}

/// Selects the decoder for a response.
///
/// With no `Content-Type` the first registered decoder is used. Otherwise the
/// header is lowercased and stripped of parameters, and the first decoder
/// whose media type equals the full type, the `main/*` wildcard, or `*/*` is
/// chosen.
pub fn negotiate_decoder<'a>(
    decoders: &'a [Arc<dyn Codec>],
    content_type: Option<&str>,
) -> Result<&'a dyn Codec, ActionError> {
    let Some(content_type) = content_type else {
        return decoders
            .first()
            .map(|decoder| decoder.as_ref())
            .ok_or_else(|| ActionError::UnsupportedMediaType {
                content_type: String::new(),
            });
    };

    let lowered = content_type.to_ascii_lowercase();
    let full_type = lowered.split(';').next().unwrap_or_default().trim();
    let main_type = format!("{}/*", full_type.split('/').next().unwrap_or_default());
    let acceptable = [full_type, main_type.as_str(), "*/*"];

    let decoder = decoders
        .iter()
        .find(|decoder| acceptable.contains(&decoder.media_type()))
        .ok_or_else(|| ActionError::UnsupportedMediaType {
            content_type: content_type.to_owned(),
        })?;

    tracing::debug!(
        content_type,
        media_type = decoder.media_type(),
        "Negotiated response decoder"
    );
    Ok(decoder.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    // Lets tests call `unwrap_err()` on `Result<&dyn Codec, _>`.
    impl<'a> std::fmt::Debug for dyn Codec + 'a {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_tuple("Codec").field(&self.media_type()).finish()
        }
    }

    struct Named(&'static str);

    impl Codec for Named {
        fn media_type(&self) -> &str {
            self.0
        }

        fn decode(&self, _text: &str, _options: &DecodeOptions) -> Result<Node, ActionError> {
            Ok(Node::Primitive(self.0.into()))
        }
    }

    fn registry(types: &[&'static str]) -> Vec<Arc<dyn Codec>> {
        types
            .iter()
            .map(|t| Arc::new(Named(t)) as Arc<dyn Codec>)
            .collect()
    }

    fn pick(decoders: &[Arc<dyn Codec>], content_type: Option<&str>) -> String {
        negotiate_decoder(decoders, content_type)
            .unwrap()
            .media_type()
            .to_owned()
    }

    #[test]
    fn missing_content_type_uses_first_decoder() {
        let decoders = registry(&["application/x", "application/y"]);
        assert_eq!(pick(&decoders, None), "application/x");
    }

    #[test]
    fn exact_match_wins_over_earlier_non_matching_decoder() {
        let decoders = registry(&["application/x", "application/y"]);
        assert_eq!(pick(&decoders, Some("application/y")), "application/y");
    }

    #[test]
    fn registration_order_breaks_ties() {
        let decoders = registry(&["text/*", "text/html", "*/*"]);
        assert_eq!(pick(&decoders, Some("text/html")), "text/*");
    }

    #[test]
    fn header_is_lowercased_and_parameters_stripped() {
        let decoders = registry(&["application/json", "text/*"]);
        assert_eq!(
            pick(&decoders, Some("Application/JSON; charset=utf-8")),
            "application/json"
        );
        assert_eq!(pick(&decoders, Some("TEXT/Plain ;q=1")), "text/*");
    }

    #[test]
    fn wildcard_decoder_accepts_anything() {
        let decoders = registry(&["application/json", "*/*"]);
        assert_eq!(pick(&decoders, Some("image/png")), "*/*");
    }

    #[test]
    fn unmatched_content_type_is_unsupported() {
        let decoders = default_decoders();
        let err = negotiate_decoder(&decoders, Some("image/png")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedMediaType);
        assert_eq!(
            err.to_string(),
            "Unsupported media in Content-Type header: image/png"
        );
    }

    #[test]
    fn empty_registry_is_unsupported() {
        let err = negotiate_decoder(&[], None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedMediaType);
    }

    #[test]
    fn plain_json_response_skips_the_corejson_decoder() {
        let decoders = default_decoders();
        let decoder = negotiate_decoder(&decoders, Some("application/json")).unwrap();
        assert_eq!(decoder.media_type(), "application/json");
        let node = decoder.decode(r#"{"a":1}"#, &DecodeOptions::default()).unwrap();
        assert_eq!(node, Node::from(serde_json::json!({"a": 1})));
    }
}
