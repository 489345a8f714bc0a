//! Pool-resident nodes for the order book: resting orders and the
//! price-level buckets that chain them. Ground truth: `original_source/
//! exchange/matcher/me_order.h`'s `MEOrder`/`MEOrdersAtPrice`, reworked
//! per spec §9's design note — prev/next are [`Idx`] values into an
//! [`ObjectPool`](crate::object_pool::ObjectPool), not raw pointers. A
//! lone node in a circular list has both links pointing at itself.

use crate::object_pool::{Idx, IDX_INVALID};
use crate::types::{
    order_id_to_string, price_to_string, priority_to_string, qty_to_string, ClientId, OrderId,
    Price, Priority, Qty, Side, TickerId, CLIENT_ID_INVALID, ORDER_ID_INVALID, PRICE_INVALID,
    PRIORITY_INVALID, QTY_INVALID, TICKER_ID_INVALID,
};
use std::fmt;

/// A resting order; a node in the circular doubly-linked list of its
/// price level.
#[derive(Debug, Clone, Copy)]
pub struct Order {
    pub ticker_id: TickerId,
    pub client_id: ClientId,
    pub client_order_id: OrderId,
    pub market_order_id: OrderId,
    pub side: Side,
    pub price: Price,
    pub qty: Qty,
    pub priority: Priority,
    pub prev_order: Idx,
    pub next_order: Idx,
}

impl Default for Order {
    fn default() -> Self {
        Order {
            ticker_id: TICKER_ID_INVALID,
            client_id: CLIENT_ID_INVALID,
            client_order_id: ORDER_ID_INVALID,
            market_order_id: ORDER_ID_INVALID,
            side: Side::Invalid,
            price: PRICE_INVALID,
            qty: QTY_INVALID,
            priority: PRIORITY_INVALID,
            prev_order: IDX_INVALID,
            next_order: IDX_INVALID,
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Order[ticker:{} client:{} coid:{} moid:{} side:{} price:{} qty:{} prio:{}]",
            self.ticker_id,
            self.client_id,
            order_id_to_string(self.client_order_id),
            order_id_to_string(self.market_order_id),
            self.side,
            price_to_string(self.price),
            qty_to_string(self.qty),
            priority_to_string(self.priority)
        )
    }
}

/// All resting orders at one price, on one side; a node in the
/// per-side circular doubly-linked list of price levels.
#[derive(Debug, Clone, Copy)]
pub struct PriceLevel {
    pub side: Side,
    pub price: Price,
    pub first_order: Idx,
    pub prev_level: Idx,
    pub next_level: Idx,
}

impl Default for PriceLevel {
    fn default() -> Self {
        PriceLevel {
            side: Side::Invalid,
            price: PRICE_INVALID,
            first_order: IDX_INVALID,
            prev_level: IDX_INVALID,
            next_level: IDX_INVALID,
        }
    }
}

impl fmt::Display for PriceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PriceLevel[side:{} price:{} first_order:{}]",
            self.side,
            price_to_string(self.price),
            self.first_order
        )
    }
}
