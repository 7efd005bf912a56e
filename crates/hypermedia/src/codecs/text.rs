use crate::codecs::{Codec, DecodeOptions};
use crate::document::Node;
use crate::errors::ActionError;

/// Passthrough decoder for any `text/*` response.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCodec;

impl Codec for TextCodec {
    fn media_type(&self) -> &str {
        "text/*"
    }

    fn decode(&self, text: &str, _options: &DecodeOptions) -> Result<Node, ActionError> {
        Ok(Node::Primitive(serde_json::Value::String(text.to_owned())))
    }
}
