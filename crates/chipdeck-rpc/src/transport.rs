//! Length-prefixed transport codec for JSON-RPC messages.
//!
//! Frame format:
//! ```text
//! +----------------+------------------+
//! |  4 bytes       |  N bytes         |
//! |  (length BE)   |  (JSON payload)  |
//! +----------------+------------------+
//! ```
//!
//! Framing is delegated to [`LengthDelimitedCodec`]; this codec only turns
//! frames into [`Message`]s and back.

use bytes::{Bytes, BytesMut};
use std::io;
use tokio_util::codec::{Decoder, Encoder, LengthDelimitedCodec, LengthDelimitedCodecError};

use crate::protocol::Message;

/// Maximum message size (16 MB)
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Length prefix size in bytes
const LENGTH_PREFIX_SIZE: usize = 4;

/// Codec for length-prefixed JSON-RPC messages
#[derive(Debug)]
pub struct JsonRpcCodec {
    frames: LengthDelimitedCodec,
}

impl JsonRpcCodec {
    #[must_use]
    pub fn new() -> Self {
        Self {
            frames: LengthDelimitedCodec::builder()
                .length_field_length(LENGTH_PREFIX_SIZE)
                .big_endian()
                .max_frame_length(MAX_MESSAGE_SIZE)
                .new_codec(),
        }
    }
}

impl Default for JsonRpcCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for JsonRpcCodec {
    type Item = Message;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some(frame) = self.frames.decode(src).map_err(CodecError::from_frame)? else {
            return Ok(None);
        };

        let json_str = std::str::from_utf8(&frame)?;
        let message: Message = serde_json::from_str(json_str)?;
        Ok(Some(message))
    }
}

impl Encoder<Message> for JsonRpcCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let json = serde_json::to_vec(&item)?;
        self.frames
            .encode(Bytes::from(json), dst)
            .map_err(CodecError::from_frame)
    }
}

/// Errors that can occur during codec operations
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("Message too large (max: {MAX_MESSAGE_SIZE} bytes)")]
    MessageTooLarge,
}

impl CodecError {
    fn from_frame(e: io::Error) -> Self {
        if e
            .get_ref()
            .is_some_and(|inner| inner.is::<LengthDelimitedCodecError>())
        {
            Self::MessageTooLarge
        } else {
            Self::Io(e)
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::cast_possible_truncation)] // Test constants bounded to u32

    use super::*;
    use crate::protocol::{RequestId, Response, RpcError};
    use bytes::BufMut;

    #[test]
    fn test_encode_decode_request() {
        let mut codec = JsonRpcCodec::new();
        let mut buf = BytesMut::new();

        let request = crate::protocol::Request::new(
            "render_template",
            Some(serde_json::json!({"template": "{{ 1 }}"})),
            1.into(),
        );
        codec.encode(Message::Request(request), &mut buf).unwrap();

        let Message::Request(decoded) = codec.decode(&mut buf).unwrap().unwrap() else {
            panic!("Expected Request");
        };
        assert_eq!(decoded.method, "render_template");
        assert_eq!(decoded.id, Some(RequestId::Number(1)));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_encode_decode_error_response() {
        let mut codec = JsonRpcCodec::new();
        let mut buf = BytesMut::new();

        let response = Response::error(1.into(), RpcError::template_error("bad"));
        codec.encode(Message::Response(response), &mut buf).unwrap();

        let Message::Response(decoded) = codec.decode(&mut buf).unwrap().unwrap() else {
            panic!("Expected Response");
        };
        assert_eq!(decoded.error.unwrap().code, crate::protocol::TEMPLATE_ERROR);
    }

    #[test]
    fn test_length_prefix_format() {
        let mut codec = JsonRpcCodec::new();
        let mut buf = BytesMut::new();

        let request = crate::protocol::Request::new("x", None, 1.into());
        codec.encode(Message::Request(request), &mut buf).unwrap();

        let length = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
        assert_eq!(length, buf.len() - LENGTH_PREFIX_SIZE);
    }

    #[test]
    fn test_partial_decode() {
        let mut codec = JsonRpcCodec::new();
        let mut full = BytesMut::new();
        let request = crate::protocol::Request::new("unsubscribe", None, 7.into());
        codec.encode(Message::Request(request), &mut full).unwrap();

        let mut partial = BytesMut::new();
        partial.extend_from_slice(&full[..2]);
        assert!(codec.decode(&mut partial).unwrap().is_none());

        partial.extend_from_slice(&full[2..6]);
        assert!(codec.decode(&mut partial).unwrap().is_none());

        partial.extend_from_slice(&full[6..]);
        assert!(codec.decode(&mut partial).unwrap().is_some());
    }

    #[test]
    fn test_multiple_messages_in_buffer() {
        let mut codec = JsonRpcCodec::new();
        let mut buf = BytesMut::new();

        for method in ["first", "second"] {
            let request = crate::protocol::Request::new(method, None, 1.into());
            codec.encode(Message::Request(request), &mut buf).unwrap();
        }

        for expected in ["first", "second"] {
            let Message::Request(req) = codec.decode(&mut buf).unwrap().unwrap() else {
                panic!("Expected Request");
            };
            assert_eq!(req.method, expected);
        }
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_message_too_large() {
        let mut codec = JsonRpcCodec::new();
        let mut buf = BytesMut::new();
        buf.put_u32((MAX_MESSAGE_SIZE + 1) as u32);

        let result = codec.decode(&mut buf);
        assert!(matches!(result, Err(CodecError::MessageTooLarge)));
    }

    #[test]
    fn test_invalid_json() {
        let mut codec = JsonRpcCodec::new();
        let mut buf = BytesMut::new();
        let invalid_json = b"not valid json";
        buf.put_u32(invalid_json.len() as u32);
        buf.extend_from_slice(invalid_json);

        assert!(matches!(codec.decode(&mut buf), Err(CodecError::Json(_))));
    }

    #[test]
    fn test_invalid_utf8() {
        let mut codec = JsonRpcCodec::new();
        let mut buf = BytesMut::new();
        let invalid_utf8 = [0xff, 0xfe, 0x00, 0x01];
        buf.put_u32(invalid_utf8.len() as u32);
        buf.extend_from_slice(&invalid_utf8);

        assert!(matches!(codec.decode(&mut buf), Err(CodecError::Utf8(_))));
    }

    #[test]
    fn test_codec_error_display() {
        assert!(
            CodecError::MessageTooLarge
                .to_string()
                .contains("16777216")
        );

        let io_err = io::Error::new(io::ErrorKind::ConnectionReset, "connection reset");
        let err: CodecError = io_err.into();
        assert!(err.to_string().contains("connection reset"));
    }
}
