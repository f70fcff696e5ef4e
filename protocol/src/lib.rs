//! RateMesh Protocol Messages
//!
//! Message types exchanged between clients and a rates node. Every
//! message is a single JSON document on its own line; prices and amounts
//! travel as decimal strings so no precision is lost in transit.

pub mod codec;
pub mod messages;

pub use codec::{decode_line, encode_line, ProtocolError, ProtocolResult};
pub use messages::*;
