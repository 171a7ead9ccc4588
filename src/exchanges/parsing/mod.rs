//! Feed message decoders
//!
//! Turns raw WebSocket frames into `FeedMessage`s. Anything that is neither a
//! subscription acknowledgment nor a book ticker is a `DecodeError`; callers
//! count and drop those, they never end the receive loop.

pub mod binance;

pub use binance::BinanceParser;

use tokio_tungstenite::tungstenite::protocol::Message;

/// Why an inbound frame produced no usable message
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid JSON: {0}")]
    InvalidJson(String),
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("empty field `{0}`")]
    EmptyField(&'static str),
    #[error("invalid symbol {0:?}")]
    InvalidSymbol(String),
    #[error("request {id:?} rejected with code {code}: {msg}")]
    Rejected { id: Option<u64>, code: i64, msg: String },
    #[error("unrecognized message shape")]
    Unrecognized,
    #[error("binary frame is not valid UTF-8")]
    NotUtf8,
}

/// Payload of a data frame, or `None` for control frames
#[inline]
pub fn frame_text(msg: &Message) -> Option<Result<&str, DecodeError>> {
    match msg {
        Message::Text(text) => Some(Ok(text.as_str())),
        Message::Binary(data) => {
            Some(std::str::from_utf8(data).map_err(|_| DecodeError::NotUtf8))
        }
        Message::Ping(_) | Message::Pong(_) | Message::Close(_) | Message::Frame(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_text() {
        let text = Message::text(r#"{"id":1}"#);
        assert_eq!(frame_text(&text), Some(Ok(r#"{"id":1}"#)));

        let binary = Message::binary(vec![0xff, 0x00]);
        assert_eq!(frame_text(&binary), Some(Err(DecodeError::NotUtf8)));

        let ping = Message::Ping(Default::default());
        assert_eq!(frame_text(&ping), None);
    }

    #[test]
    fn test_decode_error_display() {
        assert_eq!(DecodeError::MissingField("s").to_string(), "missing field `s`");
        let rejected = DecodeError::Rejected {
            id: Some(3),
            code: 2,
            msg: "Invalid request".into(),
        };
        assert_eq!(
            rejected.to_string(),
            "request Some(3) rejected with code 2: Invalid request"
        );
    }
}
