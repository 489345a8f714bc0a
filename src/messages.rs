//! Wire-level record shapes exchanged across the rings and the TCP/
//! multicast transports: requests in, responses and market updates out.
//! Field layout follows spec §3 and §6; grounded on the request/response
//! structs the teacher's `message_codec.rs` frames, generalized to the
//! fields this engine's book actually needs.

use crate::types::{
    ClientId, ClientRequestType, ClientResponseType, MarketUpdateType, OrderId, Price, Priority,
    Qty, Side, TickerId, CLIENT_ID_INVALID, ORDER_ID_INVALID, PRICE_INVALID, PRIORITY_INVALID,
    QTY_INVALID, TICKER_ID_INVALID,
};

/// A NEW or CANCEL request from a client, as handed from the FIFO
/// sequencer to the matching engine.
#[derive(Debug, Clone, Copy)]
pub struct ClientRequest {
    pub kind: ClientRequestType,
    pub client_id: ClientId,
    pub ticker_id: TickerId,
    pub client_order_id: OrderId,
    pub side: Side,
    pub price: Price,
    pub qty: Qty,
}

impl Default for ClientRequest {
    fn default() -> Self {
        ClientRequest {
            kind: ClientRequestType::Invalid,
            client_id: CLIENT_ID_INVALID,
            ticker_id: TICKER_ID_INVALID,
            client_order_id: ORDER_ID_INVALID,
            side: Side::Invalid,
            price: PRICE_INVALID,
            qty: QTY_INVALID,
        }
    }
}

/// An execution report delivered back to a single client.
#[derive(Debug, Clone, Copy)]
pub struct ClientResponse {
    pub kind: ClientResponseType,
    pub client_id: ClientId,
    pub ticker_id: TickerId,
    pub client_order_id: OrderId,
    pub market_order_id: OrderId,
    pub side: Side,
    pub price: Price,
    pub exec_qty: Qty,
    pub leaves_qty: Qty,
}

impl Default for ClientResponse {
    fn default() -> Self {
        ClientResponse {
            kind: ClientResponseType::Invalid,
            client_id: CLIENT_ID_INVALID,
            ticker_id: TICKER_ID_INVALID,
            client_order_id: ORDER_ID_INVALID,
            market_order_id: ORDER_ID_INVALID,
            side: Side::Invalid,
            price: PRICE_INVALID,
            exec_qty: QTY_INVALID,
            leaves_qty: QTY_INVALID,
        }
    }
}

/// A public book-state change, as broadcast on the incremental and
/// snapshot multicast groups.
#[derive(Debug, Clone, Copy)]
pub struct MarketUpdate {
    pub kind: MarketUpdateType,
    pub market_order_id: OrderId,
    pub ticker_id: TickerId,
    pub side: Side,
    pub price: Price,
    pub qty: Qty,
    pub priority: Priority,
}

impl Default for MarketUpdate {
    fn default() -> Self {
        MarketUpdate {
            kind: MarketUpdateType::Invalid,
            market_order_id: ORDER_ID_INVALID,
            ticker_id: TICKER_ID_INVALID,
            side: Side::Invalid,
            price: PRICE_INVALID,
            qty: QTY_INVALID,
            priority: PRIORITY_INVALID,
        }
    }
}

/// Sequence-numbered envelope for a [`MarketUpdate`] as it appears on
/// either multicast group (spec §6: "one update per datagram").
#[derive(Debug, Clone, Copy, Default)]
pub struct PublicMessage {
    pub seq_num: u64,
    pub update: MarketUpdate,
}

/// A request record as framed on the TCP order-gateway wire: a session
/// sequence number ahead of the request payload (spec §4.6/§6).
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestFrame {
    pub seq: u64,
    pub request: ClientRequest,
}

/// A response record as framed on the TCP order-gateway wire.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseFrame {
    pub seq: u64,
    pub response: ClientResponse,
}

/// A request paired with the receive timestamp the socket layer
/// stamped it with, as buffered by the FIFO sequencer (spec §4.5).
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampedRequest {
    pub recv_time_ns: u64,
    pub client_id: ClientId,
    pub request: ClientRequest,
}
