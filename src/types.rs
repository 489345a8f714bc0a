//! Primitive identifiers shared across the book, the rings and the wire
//! formats. Each has a reserved sentinel denoting INVALID, following
//! `original_source/common/types.h`.

use std::fmt;

pub type TickerId = u16;
pub const TICKER_ID_INVALID: TickerId = TickerId::MAX;

pub type ClientId = u32;
pub const CLIENT_ID_INVALID: ClientId = ClientId::MAX;

pub type OrderId = u64;
pub const ORDER_ID_INVALID: OrderId = OrderId::MAX;

/// Signed price in ticks.
pub type Price = i64;
pub const PRICE_INVALID: Price = Price::MAX;

pub type Qty = u32;
pub const QTY_INVALID: Qty = Qty::MAX;

/// Monotonic within a price level; strictly increasing from head to tail.
pub type Priority = u64;
pub const PRIORITY_INVALID: Priority = Priority::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum Side {
    Invalid = 0,
    Buy = 1,
    Sell = -1,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
            Side::Invalid => Side::Invalid,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
            Side::Invalid => "INVALID",
        };
        write!(f, "{s}")
    }
}

pub fn order_id_to_string(id: OrderId) -> String {
    if id == ORDER_ID_INVALID {
        "INVALID".to_string()
    } else {
        id.to_string()
    }
}

pub fn ticker_id_to_string(id: TickerId) -> String {
    if id == TICKER_ID_INVALID {
        "INVALID".to_string()
    } else {
        id.to_string()
    }
}

pub fn client_id_to_string(id: ClientId) -> String {
    if id == CLIENT_ID_INVALID {
        "INVALID".to_string()
    } else {
        id.to_string()
    }
}

/// NOTE: the original source's `priceToString` used `if (price = Price_INVALID)`
/// — an assignment where a comparison was meant. This is a pure comparison.
pub fn price_to_string(price: Price) -> String {
    if price == PRICE_INVALID {
        "INVALID".to_string()
    } else {
        price.to_string()
    }
}

pub fn qty_to_string(qty: Qty) -> String {
    if qty == QTY_INVALID {
        "INVALID".to_string()
    } else {
        qty.to_string()
    }
}

pub fn priority_to_string(priority: Priority) -> String {
    if priority == PRIORITY_INVALID {
        "INVALID".to_string()
    } else {
        priority.to_string()
    }
}

// --- Client request / response / market update type tags ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ClientRequestType {
    Invalid = 0,
    New = 1,
    Cancel = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ClientResponseType {
    Invalid = 0,
    Accepted = 1,
    Canceled = 2,
    Filled = 3,
    CancelRejected = 4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MarketUpdateType {
    Invalid = 0,
    Add = 1,
    Modify = 2,
    Cancel = 3,
    Trade = 4,
    Clear = 5,
    SnapshotStart = 6,
    SnapshotEnd = 7,
}
