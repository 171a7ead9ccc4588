//! Binance message parser
//!
//! Decodes the two message shapes the bookTicker feed sends on a raw `/ws`
//! connection: subscription responses and book ticker updates.

use super::DecodeError;
use crate::core::{BookTicker, QuoteSide, Symbol};
use crate::exchanges::traits::FeedMessage;
use serde::Deserialize;

/// Binance message parser
pub struct BinanceParser;

/// Superset of every field we look at. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(default)]
    id: Option<u64>,
    /// `null` and absent both deserialize to `None`
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<RawError>,
    #[serde(default)]
    u: Option<u64>,
    #[serde(default)]
    s: Option<String>,
    #[serde(default)]
    b: Option<String>,
    #[serde(default, rename = "B")]
    bid_qty: Option<String>,
    #[serde(default)]
    a: Option<String>,
    #[serde(default, rename = "A")]
    ask_qty: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawError {
    code: i64,
    #[serde(default)]
    msg: String,
}

impl BinanceParser {
    /// Decode one text frame
    ///
    /// Subscription response: `{"result": null, "id": 1}`
    ///
    /// Error response: `{"error": {"code": 2, "msg": "Invalid request"}, "id": 1}`
    ///
    /// bookTicker: `{"u":400900217,"s":"BNBUSDT","b":"25.35","B":"31.21","a":"25.36","A":"40.66"}`
    pub fn decode(text: &str) -> Result<FeedMessage, DecodeError> {
        let frame: RawFrame =
            serde_json::from_str(text).map_err(|e| DecodeError::InvalidJson(e.to_string()))?;

        if let Some(error) = frame.error {
            return Err(DecodeError::Rejected {
                id: frame.id,
                code: error.code,
                msg: error.msg,
            });
        }

        if Self::looks_like_ticker(&frame) {
            return Self::book_ticker(frame).map(FeedMessage::BookTicker);
        }

        match (frame.id, &frame.result) {
            (Some(id), None) => Ok(FeedMessage::SubscriptionAck { id }),
            _ => Err(DecodeError::Unrecognized),
        }
    }

    /// Any quote field present means the sender meant a ticker
    #[inline]
    fn looks_like_ticker(frame: &RawFrame) -> bool {
        frame.s.is_some()
            || frame.b.is_some()
            || frame.a.is_some()
            || frame.bid_qty.is_some()
            || frame.ask_qty.is_some()
    }

    fn book_ticker(frame: RawFrame) -> Result<BookTicker, DecodeError> {
        let symbol_raw = required(frame.s, "s")?;
        let bid_price = required(frame.b, "b")?;
        let bid_qty = required(frame.bid_qty, "B")?;
        let ask_price = required(frame.a, "a")?;
        let ask_qty = required(frame.ask_qty, "A")?;

        let symbol = match Symbol::new(&symbol_raw) {
            Some(symbol) => symbol,
            None => return Err(DecodeError::InvalidSymbol(symbol_raw)),
        };

        Ok(BookTicker {
            update_id: frame.u,
            symbol,
            bid: QuoteSide::new(bid_price, bid_qty),
            ask: QuoteSide::new(ask_price, ask_qty),
        })
    }
}

#[inline]
fn required(value: Option<String>, field: &'static str) -> Result<String, DecodeError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        Some(_) => Err(DecodeError::EmptyField(field)),
        None => Err(DecodeError::MissingField(field)),
    }
}
