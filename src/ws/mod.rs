//! WebSocket transport and subscription encoding

pub mod connection;
pub mod subscription;

pub use connection::{ConnectionState, WebSocketConnection, WebSocketError};
pub use subscription::{PendingRequests, RequestIds, StreamType, SubscriptionRequest};
