//! Per-instrument price-time-priority order book — the matching core
//! (spec §4.3). Ground truth: `original_source/exchange/matcher/
//! me_order_book.cpp`'s `add`/`cancel`/`checkForMatch`/`match`, reworked
//! onto the index-addressed pools of [`crate::object_pool`] per spec
//! §9's design note (the teacher's `order_book.rs`/`continuous_order_
//! book.rs`, built around a single shared `Vec` rebuilt/rescanned on
//! every operation, cannot express O(1) cancel or the per-level
//! circular list the spec mandates, so this module does not reuse their
//! storage layout — only their public add/cancel vocabulary).

use crate::messages::{ClientResponse, MarketUpdate};
use crate::object_pool::{Idx, ObjectPool, IDX_INVALID};
use crate::order::{Order, PriceLevel};
use crate::types::{
    ClientId, ClientResponseType, MarketUpdateType, OrderId, Price, Priority, Qty, Side,
    TickerId, ORDER_ID_INVALID, PRICE_INVALID, PRIORITY_INVALID,
};

/// Narrow output-sink capability the book emits through, per spec §9 —
/// replaces a back-pointer to the matching engine with two callables.
pub trait OutputSink {
    fn send_client_response(&mut self, resp: ClientResponse);
    fn send_market_update(&mut self, update: MarketUpdate);
}

pub struct OrderBook<S: OutputSink> {
    ticker_id: TickerId,
    sink: S,

    order_pool: ObjectPool<Order>,
    level_pool: ObjectPool<PriceLevel>,

    bid_head: Idx,
    ask_head: Idx,

    /// Shared between sides: a resting bid and a resting ask can never
    /// share a literal price (invariant 3), so one table suffices.
    price_level_index: Vec<Idx>,
    max_price_levels: i64,

    /// `client_order_index[client_id][client_order_id]`, direct
    /// addressed; per spec §6 `max-orders` also sizes this width.
    client_order_index: Vec<Vec<Idx>>,
    max_client_order_id: usize,

    next_market_order_id: OrderId,
}

impl<S: OutputSink> OrderBook<S> {
    pub fn new(
        ticker_id: TickerId,
        max_orders: usize,
        max_price_levels: usize,
        max_clients: usize,
        sink: S,
    ) -> Self {
        OrderBook {
            ticker_id,
            sink,
            order_pool: ObjectPool::new(max_orders),
            level_pool: ObjectPool::new(max_price_levels),
            bid_head: IDX_INVALID,
            ask_head: IDX_INVALID,
            price_level_index: vec![IDX_INVALID; max_price_levels],
            max_price_levels: max_price_levels as i64,
            client_order_index: vec![vec![IDX_INVALID; max_orders]; max_clients],
            max_client_order_id: max_orders,
            next_market_order_id: 1,
        }
    }

    pub fn ticker_id(&self) -> TickerId {
        self.ticker_id
    }

    /// Access to the book's output sink, for callers that buffer
    /// responses/updates per book and drain them into shared transport
    /// after the call returns (see [`crate::matching_engine`]).
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    fn price_slot(&self, price: Price) -> usize {
        price.rem_euclid(self.max_price_levels) as usize
    }

    fn generate_market_order_id(&mut self) -> OrderId {
        let id = self.next_market_order_id;
        self.next_market_order_id += 1;
        id
    }

    fn side_head(&self, side: Side) -> Idx {
        match side {
            Side::Buy => self.bid_head,
            Side::Sell => self.ask_head,
            Side::Invalid => IDX_INVALID,
        }
    }

    fn set_side_head(&mut self, side: Side, head: Idx) {
        match side {
            Side::Buy => self.bid_head = head,
            Side::Sell => self.ask_head = head,
            Side::Invalid => {}
        }
    }

    /// `true` if `aggressive_price` on `side` crosses `level.price`.
    fn crosses(side: Side, aggressive_price: Price, level_price: Price) -> bool {
        match side {
            Side::Buy => aggressive_price >= level_price,
            Side::Sell => aggressive_price <= level_price,
            Side::Invalid => false,
        }
    }

    /// spec §4.3 add(): accept, match, rest the remainder.
    pub fn add(
        &mut self,
        client_id: ClientId,
        client_order_id: OrderId,
        side: Side,
        price: Price,
        qty: Qty,
    ) {
        let market_order_id = self.generate_market_order_id();

        self.sink.send_client_response(ClientResponse {
            kind: ClientResponseType::Accepted,
            client_id,
            ticker_id: self.ticker_id,
            client_order_id,
            market_order_id,
            side,
            price,
            exec_qty: 0,
            leaves_qty: qty,
        });

        let leaves = self.match_against_opposite_side(
            client_id,
            client_order_id,
            market_order_id,
            side,
            price,
            qty,
        );

        if leaves > 0 {
            let priority = self.next_priority(side, price);
            let order_idx = self.order_pool.allocate(Order {
                ticker_id: self.ticker_id,
                client_id,
                client_order_id,
                market_order_id,
                side,
                price,
                qty: leaves,
                priority,
                prev_order: IDX_INVALID,
                next_order: IDX_INVALID,
            });
            self.insert_order(order_idx, side, price);

            if (client_order_id as usize) < self.max_client_order_id {
                self.client_order_index[client_id as usize][client_order_id as usize] = order_idx;
            }

            self.sink.send_market_update(MarketUpdate {
                kind: MarketUpdateType::Add,
                market_order_id,
                ticker_id: self.ticker_id,
                side,
                price,
                qty: leaves,
                priority,
            });
        }
    }

    /// spec §4.3 cancel().
    pub fn cancel(&mut self, client_id: ClientId, client_order_id: OrderId) {
        let order_idx = self.lookup_order(client_id, client_order_id);

        let Some(order_idx) = order_idx else {
            self.sink.send_client_response(ClientResponse {
                kind: ClientResponseType::CancelRejected,
                client_id,
                ticker_id: self.ticker_id,
                client_order_id,
                market_order_id: ORDER_ID_INVALID,
                side: Side::Invalid,
                price: PRICE_INVALID,
                exec_qty: crate::types::QTY_INVALID,
                leaves_qty: crate::types::QTY_INVALID,
            });
            return;
        };

        let order = *self.order_pool.get(order_idx);

        self.sink.send_client_response(ClientResponse {
            kind: ClientResponseType::Canceled,
            client_id,
            ticker_id: self.ticker_id,
            client_order_id,
            market_order_id: order.market_order_id,
            side: order.side,
            price: order.price,
            exec_qty: crate::types::QTY_INVALID,
            leaves_qty: order.qty,
        });
        self.sink.send_market_update(MarketUpdate {
            kind: MarketUpdateType::Cancel,
            market_order_id: order.market_order_id,
            ticker_id: self.ticker_id,
            side: order.side,
            price: order.price,
            qty: 0,
            priority: order.priority,
        });

        self.remove_order(order_idx);
        if (client_order_id as usize) < self.max_client_order_id {
            self.client_order_index[client_id as usize][client_order_id as usize] = IDX_INVALID;
        }
    }

    fn lookup_order(&self, client_id: ClientId, client_order_id: OrderId) -> Option<Idx> {
        let client_id = client_id as usize;
        if client_id >= self.client_order_index.len() {
            return None;
        }
        if (client_order_id as usize) >= self.max_client_order_id {
            return None;
        }
        let idx = self.client_order_index[client_id][client_order_id as usize];
        if idx == IDX_INVALID {
            None
        } else {
            Some(idx)
        }
    }

    /// spec §4.3 "Matching procedure". Returns the aggressor's leaves.
    fn match_against_opposite_side(
        &mut self,
        client_id: ClientId,
        client_order_id: OrderId,
        market_order_id: OrderId,
        side: Side,
        price: Price,
        qty: Qty,
    ) -> Qty {
        let mut leaves = qty;
        let opp_side = side.opposite();

        while leaves > 0 {
            let level_idx = self.side_head(opp_side);
            if level_idx == IDX_INVALID {
                break;
            }
            let level_price = self.level_pool.get(level_idx).price;
            if !Self::crosses(side, price, level_price) {
                break;
            }

            let resting_idx = self.level_pool.get(level_idx).first_order;
            debug_assert!(resting_idx != IDX_INVALID, "price level with no orders");

            let resting = *self.order_pool.get(resting_idx);
            let fill = leaves.min(resting.qty);
            leaves -= fill;
            let resting_leaves = resting.qty - fill;
            self.order_pool.get_mut(resting_idx).qty = resting_leaves;

            self.sink.send_client_response(ClientResponse {
                kind: ClientResponseType::Filled,
                client_id,
                ticker_id: self.ticker_id,
                client_order_id,
                market_order_id,
                side,
                price: resting.price,
                exec_qty: fill,
                leaves_qty: leaves,
            });
            self.sink.send_client_response(ClientResponse {
                kind: ClientResponseType::Filled,
                client_id: resting.client_id,
                ticker_id: self.ticker_id,
                client_order_id: resting.client_order_id,
                market_order_id: resting.market_order_id,
                side: resting.side,
                price: resting.price,
                exec_qty: fill,
                leaves_qty: resting_leaves,
            });
            self.sink.send_market_update(MarketUpdate {
                kind: MarketUpdateType::Trade,
                market_order_id: ORDER_ID_INVALID,
                ticker_id: self.ticker_id,
                side,
                price: resting.price,
                qty: fill,
                priority: PRIORITY_INVALID,
            });

            if resting_leaves == 0 {
                self.sink.send_market_update(MarketUpdate {
                    kind: MarketUpdateType::Cancel,
                    market_order_id: resting.market_order_id,
                    ticker_id: self.ticker_id,
                    side: resting.side,
                    price: resting.price,
                    qty: 0,
                    priority: resting.priority,
                });
                self.remove_order(resting_idx);
                if (resting.client_order_id as usize) < self.max_client_order_id {
                    self.client_order_index[resting.client_id as usize]
                        [resting.client_order_id as usize] = IDX_INVALID;
                }
            } else {
                self.sink.send_market_update(MarketUpdate {
                    kind: MarketUpdateType::Modify,
                    market_order_id: resting.market_order_id,
                    ticker_id: self.ticker_id,
                    side: resting.side,
                    price: resting.price,
                    qty: resting_leaves,
                    priority: resting.priority,
                });
            }
        }

        leaves
    }

    fn next_priority(&self, side: Side, price: Price) -> Priority {
        let slot = self.price_slot(price);
        let level_idx = self.price_level_index[slot];
        if level_idx == IDX_INVALID {
            return 1;
        }
        let level = self.level_pool.get(level_idx);
        if level.side != side || level.price != price {
            return 1;
        }
        let tail = self.order_pool.get(self.tail_of(level.first_order));
        tail.priority + 1
    }

    fn tail_of(&self, head: Idx) -> Idx {
        self.order_pool.get(head).prev_order
    }

    /// Appends `order_idx` to the tail of its price level's order list,
    /// creating the level if needed (spec §4.3 "Price-level insertion").
    fn insert_order(&mut self, order_idx: Idx, side: Side, price: Price) {
        let slot = self.price_slot(price);
        let mut level_idx = self.price_level_index[slot];

        if level_idx == IDX_INVALID {
            level_idx = self.level_pool.allocate(PriceLevel {
                side,
                price,
                first_order: order_idx,
                prev_level: IDX_INVALID,
                next_level: IDX_INVALID,
            });
            self.price_level_index[slot] = level_idx;
            {
                let o = self.order_pool.get_mut(order_idx);
                o.prev_order = order_idx;
                o.next_order = order_idx;
            }
            self.insert_level(level_idx, side, price);
            return;
        }

        // existing level: append at tail of its order ring
        let head = self.level_pool.get(level_idx).first_order;
        let tail = self.order_pool.get(head).prev_order;
        {
            let o = self.order_pool.get_mut(order_idx);
            o.prev_order = tail;
            o.next_order = head;
        }
        self.order_pool.get_mut(tail).next_order = order_idx;
        self.order_pool.get_mut(head).prev_order = order_idx;
    }

    /// Splices a freshly-allocated, empty price level into the side's
    /// ordered circular list (descending for bids, ascending for asks),
    /// updating the side-specific head when the new level becomes best.
    /// Fixes the source's head-assignment bug noted in spec §9: both
    /// insertion branches must update `side`'s own head, not always the
    /// bid head.
    fn insert_level(&mut self, level_idx: Idx, side: Side, price: Price) {
        let head = self.side_head(side);
        if head == IDX_INVALID {
            self.level_pool.get_mut(level_idx).prev_level = level_idx;
            self.level_pool.get_mut(level_idx).next_level = level_idx;
            self.set_side_head(side, level_idx);
            return;
        }

        let is_better = match side {
            Side::Buy => price > self.level_pool.get(head).price,
            Side::Sell => price < self.level_pool.get(head).price,
            Side::Invalid => false,
        };

        if is_better {
            let tail = self.level_pool.get(head).prev_level;
            self.splice_level_before(level_idx, head, tail);
            self.set_side_head(side, level_idx);
            return;
        }

        // scan forward from head for the first level worse than `price`
        let mut cursor = head;
        loop {
            let next = self.level_pool.get(cursor).next_level;
            let reached_tail = next == head;
            let next_is_worse = match side {
                Side::Buy => price > self.level_pool.get(next).price,
                Side::Sell => price < self.level_pool.get(next).price,
                Side::Invalid => false,
            };
            if reached_tail || next_is_worse {
                self.splice_level_before(level_idx, next, cursor);
                break;
            }
            cursor = next;
        }
    }

    fn splice_level_before(&mut self, new_idx: Idx, at: Idx, at_prev: Idx) {
        self.level_pool.get_mut(new_idx).prev_level = at_prev;
        self.level_pool.get_mut(new_idx).next_level = at;
        self.level_pool.get_mut(at_prev).next_level = new_idx;
        self.level_pool.get_mut(at).prev_level = new_idx;
    }

    /// Unlinks `order_idx` from its price level's order ring and the
    /// order index, freeing the level too if it's now empty (spec §4.3
    /// "Price-level removal").
    fn remove_order(&mut self, order_idx: Idx) {
        let order = *self.order_pool.get(order_idx);
        let slot = self.price_slot(order.price);
        let level_idx = self.price_level_index[slot];
        debug_assert!(level_idx != IDX_INVALID, "order's price level missing");

        let prev = order.prev_order;
        let next = order.next_order;

        if prev == order_idx {
            // sole order at this level
            self.remove_level(level_idx, order.side, slot);
        } else {
            self.order_pool.get_mut(prev).next_order = next;
            self.order_pool.get_mut(next).prev_order = prev;
            let level = self.level_pool.get_mut(level_idx);
            if level.first_order == order_idx {
                level.first_order = next;
            }
        }

        self.order_pool.deallocate(order_idx);
    }

    fn remove_level(&mut self, level_idx: Idx, side: Side, slot: usize) {
        let level = *self.level_pool.get(level_idx);
        let prev = level.prev_level;
        let next = level.next_level;

        if next == level_idx {
            self.set_side_head(side, IDX_INVALID);
        } else {
            self.level_pool.get_mut(prev).next_level = next;
            self.level_pool.get_mut(next).prev_level = prev;
            if self.side_head(side) == level_idx {
                self.set_side_head(side, next);
            }
        }

        self.price_level_index[slot] = IDX_INVALID;
        self.level_pool.deallocate(level_idx);
    }

    pub fn best_bid(&self) -> Option<Price> {
        if self.bid_head == IDX_INVALID {
            None
        } else {
            Some(self.level_pool.get(self.bid_head).price)
        }
    }

    pub fn best_ask(&self) -> Option<Price> {
        if self.ask_head == IDX_INVALID {
            None
        } else {
            Some(self.level_pool.get(self.ask_head).price)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bid_head == IDX_INVALID && self.ask_head == IDX_INVALID && self.order_pool.is_empty()
    }

    /// Diagnostics dump of every resting price level, best-to-worst on
    /// each side, with per-level aggregate quantity and order count.
    /// Not on any hot path; intended for an operator console, not the
    /// matching loop.
    pub fn render(&self) {
        crate::text_output_tool::print_separator(60);
        crate::text_output_tool::print_centered_line(
            &format!("ticker {} book", self.ticker_id),
            '=',
            60,
        );
        self.render_side(Side::Sell, self.ask_head);
        self.render_side(Side::Buy, self.bid_head);
    }

    fn render_side(&self, side: Side, head: Idx) {
        let label = match side {
            Side::Buy => "BIDS",
            Side::Sell => "ASKS",
            Side::Invalid => "?",
        };
        crate::text_output_tool::print_centered_line(label, '-', 60);
        if head == IDX_INVALID {
            println!("  (empty)");
            return;
        }

        let mut level_idx = head;
        loop {
            let level = self.level_pool.get(level_idx);
            let (qty, count) = self.level_totals(level.first_order);
            println!("  {:>10}  qty={:<8} orders={}", level.price, qty, count);

            level_idx = level.next_level;
            if level_idx == head {
                break;
            }
        }
    }

    fn level_totals(&self, first_order: Idx) -> (Qty, usize) {
        let mut qty = 0;
        let mut count = 0;
        let mut order_idx = first_order;
        loop {
            let order = self.order_pool.get(order_idx);
            qty += order.qty;
            count += 1;
            order_idx = order.next_order;
            if order_idx == first_order {
                break;
            }
        }
        (qty, count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default, Clone)]
    struct Recorder {
        responses: Rc<RefCell<Vec<ClientResponse>>>,
        updates: Rc<RefCell<Vec<MarketUpdate>>>,
    }

    impl OutputSink for Recorder {
        fn send_client_response(&mut self, resp: ClientResponse) {
            self.responses.borrow_mut().push(resp);
        }
        fn send_market_update(&mut self, update: MarketUpdate) {
            self.updates.borrow_mut().push(update);
        }
    }

    fn book(rec: Recorder) -> OrderBook<Recorder> {
        OrderBook::new(1, 64, 32, 8, rec)
    }

    #[test]
    fn simple_cross_fully_fills_both_sides() {
        let rec = Recorder::default();
        let mut b = book(rec.clone());
        b.add(1, 1001, Side::Buy, 500, 100);
        b.add(2, 2001, Side::Sell, 500, 100);

        assert!(b.is_empty());
        let updates = rec.updates.borrow();
        let kinds: Vec<_> = updates.iter().map(|u| u.kind).collect();
        assert_eq!(
            kinds,
            vec![
                MarketUpdateType::Add,
                MarketUpdateType::Trade,
                MarketUpdateType::Cancel,
            ]
        );
    }

    #[test]
    fn partial_fill_then_rest() {
        let rec = Recorder::default();
        let mut b = book(rec.clone());
        b.add(1, 1, Side::Buy, 500, 60);
        b.add(2, 2, Side::Sell, 500, 100);

        assert_eq!(b.best_bid(), None);
        assert_eq!(b.best_ask(), Some(500));
        let responses = rec.responses.borrow();
        let filled: Vec<_> = responses
            .iter()
            .filter(|r| r.kind == ClientResponseType::Filled)
            .collect();
        assert_eq!(filled.len(), 2);
        assert!(filled.iter().all(|r| r.exec_qty == 60));
    }

    #[test]
    fn price_time_priority_fills_oldest_first() {
        let rec = Recorder::default();
        let mut b = book(rec.clone());
        b.add(1, 1, Side::Buy, 500, 50);
        b.add(2, 2, Side::Buy, 500, 50);
        b.add(3, 3, Side::Sell, 500, 60);

        assert_eq!(b.best_bid(), Some(500));
        assert!(b.best_ask().is_none());
        let responses = rec.responses.borrow();
        let c2_filled: Vec<_> = responses
            .iter()
            .filter(|r| r.client_id == 2 && r.kind == ClientResponseType::Filled)
            .collect();
        assert_eq!(c2_filled.len(), 1);
        assert_eq!(c2_filled[0].leaves_qty, 40);
    }

    #[test]
    fn cancel_of_unknown_order_is_rejected() {
        let rec = Recorder::default();
        let mut b = book(rec.clone());
        b.cancel(1, 999);
        let responses = rec.responses.borrow();
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].kind, ClientResponseType::CancelRejected);
    }

    #[test]
    fn cancel_is_not_idempotent() {
        let rec = Recorder::default();
        let mut b = book(rec.clone());
        b.add(1, 1, Side::Buy, 500, 10);
        b.cancel(1, 1);
        b.cancel(1, 1);
        let responses = rec.responses.borrow();
        let kinds: Vec<_> = responses
            .iter()
            .skip(1) // drop ACCEPTED
            .map(|r| r.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![ClientResponseType::Canceled, ClientResponseType::CancelRejected]
        );
        assert!(b.is_empty());
    }

    #[test]
    fn round_trip_leaves_book_empty() {
        let rec = Recorder::default();
        let mut b = book(rec.clone());
        b.add(1, 1, Side::Buy, 500, 10);
        b.add(1, 2, Side::Buy, 501, 20);
        b.add(2, 3, Side::Sell, 600, 5);
        b.cancel(1, 1);
        b.cancel(1, 2);
        b.cancel(2, 3);
        assert!(b.is_empty());
        assert_eq!(b.order_pool.len(), 0);
        assert_eq!(b.level_pool.len(), 0);
    }

    #[test]
    fn self_match_delivers_both_fills_to_same_client() {
        let rec = Recorder::default();
        let mut b = book(rec.clone());
        b.add(7, 1, Side::Buy, 500, 50);
        b.add(7, 2, Side::Sell, 500, 50);
        let responses = rec.responses.borrow();
        let filled: Vec<_> = responses
            .iter()
            .filter(|r| r.kind == ClientResponseType::Filled)
            .collect();
        assert_eq!(filled.len(), 2);
        assert!(filled.iter().all(|r| r.client_id == 7));
        assert_ne!(filled[0].side, filled[1].side);
    }

    #[test]
    fn render_does_not_panic_on_populated_or_empty_book() {
        let rec = Recorder::default();
        let mut b = book(rec);
        b.render();
        b.add(1, 1, Side::Buy, 500, 10);
        b.add(1, 2, Side::Buy, 501, 5);
        b.add(2, 3, Side::Sell, 600, 7);
        b.render();
    }

    #[derive(Debug, Clone, Copy)]
    enum Op {
        New { side: Side, price: Price, qty: Qty, coid: OrderId },
        Cancel { coid: OrderId },
    }

    fn op_strategy() -> impl proptest::strategy::Strategy<Value = Op> {
        use proptest::prelude::*;
        prop_oneof![
            (any::<bool>(), 1i64..=10, 1u32..=20, 0u64..16).prop_map(|(buy, price, qty, coid)| {
                Op::New {
                    side: if buy { Side::Buy } else { Side::Sell },
                    price,
                    qty,
                    coid,
                }
            }),
            (0u64..16).prop_map(|coid| Op::Cancel { coid }),
        ]
    }

    fn apply(b: &mut OrderBook<Recorder>, op: Op) {
        match op {
            Op::New { side, price, qty, coid } => b.add(1, coid, side, price, qty),
            Op::Cancel { coid } => b.cancel(1, coid),
        }
    }

    proptest::proptest! {
        /// A resting book is never crossed: whatever `add` couldn't
        /// immediately match gets priced so the best bid can never sit
        /// at or above the best ask (spec §4.3 invariant 1/2).
        #[test]
        fn book_never_ends_crossed(ops in proptest::collection::vec(op_strategy(), 0..40)) {
            let rec = Recorder::default();
            let mut b = book(rec);
            for op in ops {
                apply(&mut b, op);
            }
            if let (Some(bid), Some(ask)) = (b.best_bid(), b.best_ask()) {
                proptest::prop_assert!(bid < ask);
            }
        }

        /// Cancelling every client-order-id ever issued always empties
        /// the book, regardless of how many times each id was reused or
        /// matched away first (spec §4.3 invariant 7).
        #[test]
        fn cancelling_every_issued_id_empties_the_book(ops in proptest::collection::vec(op_strategy(), 0..40)) {
            let rec = Recorder::default();
            let mut b = book(rec);
            for op in ops {
                apply(&mut b, op);
            }
            for coid in 0u64..16 {
                b.cancel(1, coid);
            }
            proptest::prop_assert!(b.is_empty());
        }

        /// Cancelling the same id twice never panics; the second call is
        /// always rejected rather than silently corrupting book state.
        #[test]
        fn repeated_cancel_of_same_id_is_always_rejected_not_fatal(
            ops in proptest::collection::vec(op_strategy(), 0..20),
            coid in 0u64..16,
        ) {
            let rec = Recorder::default();
            let mut b = book(rec.clone());
            for op in ops {
                apply(&mut b, op);
            }
            b.cancel(1, coid);
            b.cancel(1, coid);
            let responses = rec.responses.borrow();
            proptest::prop_assert_eq!(
                responses.last().unwrap().kind,
                ClientResponseType::CancelRejected
            );
        }
    }
}
