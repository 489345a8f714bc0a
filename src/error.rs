//! Error types for the non-fatal, propagate-to-caller conditions this
//! crate surfaces. Per spec §7 only transport failures, malformed wire
//! records, and configuration problems are `Result`-worthy; resource
//! exhaustion and invariant breaks are fatal assertions (`panic!`) raised
//! directly by [`crate::object_pool`], [`crate::spsc_ring`] and
//! [`crate::order_book`], never wrapped here. Style grounded on
//! `joaquinbejar-OrderBook-rs`'s `orderbook::error::OrderBookError`,
//! adapted to `thiserror` derives per this crate's ambient stack.

use crate::message_codec::CodecError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("wire codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}
