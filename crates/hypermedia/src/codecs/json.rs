use crate::codecs::{Codec, DecodeOptions};
use crate::document::Node;
use crate::errors::ActionError;

/// Plain JSON decoder (`application/json`).
///
/// Objects and arrays become structural nodes; `_type` keys are not
/// interpreted.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn media_type(&self) -> &str {
        "application/json"
    }

    fn decode(&self, text: &str, _options: &DecodeOptions) -> Result<Node, ActionError> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| ActionError::Decode {
                media_type: self.media_type().to_owned(),
                message: e.to_string(),
            })?;
        Ok(Node::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn type_tags_are_left_alone() {
        let node = JsonCodec
            .decode(r#"{"_type": "link", "url": "/x/"}"#, &DecodeOptions::default())
            .unwrap();
        assert!(node.as_link().is_none());
        assert!(matches!(node, Node::Object(_)));
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        let err = JsonCodec
            .decode("{not json", &DecodeOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }
}
