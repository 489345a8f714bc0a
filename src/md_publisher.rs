//! Numbers the public market-data stream and mirrors it to the
//! Snapshot Synthesiser (spec §4.7). Ground truth: `original_source/
//! exchange/market_data/market_data_publisher.{h,cpp}`'s `run`, with
//! the UDP multicast socket replaced by the [`McastSink`] capability
//! (spec §6: the socket layer is an external collaborator, only its
//! contract is specified here).

use crate::messages::{MarketUpdate, PublicMessage};
use crate::spsc_ring::{RingConsumer, RingProducer};
use std::sync::atomic::{AtomicBool, Ordering};

/// Non-blocking UDP multicast emitter contract (spec §6). A real
/// implementation wraps `IP_ADD_MEMBERSHIP`d sockets; tests use an
/// in-memory recorder.
pub trait McastSink {
    fn send(&mut self, msg: PublicMessage);
}

pub struct MarketDataPublisher<I: McastSink> {
    next_inc_seq_num: u64,
    incremental: I,
}

impl<I: McastSink> MarketDataPublisher<I> {
    pub fn new(incremental: I) -> Self {
        MarketDataPublisher {
            next_inc_seq_num: 1,
            incremental,
        }
    }

    pub fn next_seq(&self) -> u64 {
        self.next_inc_seq_num
    }

    /// Drains `md_ring`, numbering and emitting each update on the
    /// incremental group, and forwarding a numbered copy to
    /// `snap_ring` for the Snapshot Synthesiser.
    pub fn drain_once(
        &mut self,
        md_ring: &mut impl RingConsumer<MarketUpdate>,
        snap_ring: &mut impl RingProducer<PublicMessage>,
    ) {
        while let Some(&update) = md_ring.peek_read() {
            let msg = PublicMessage {
                seq_num: self.next_inc_seq_num,
                update,
            };
            self.incremental.send(msg);

            *snap_ring.reserve_write() = msg;
            snap_ring.commit_write();

            self.next_inc_seq_num += 1;
            md_ring.commit_read();
        }
    }

    pub fn run(
        &mut self,
        run_flag: &AtomicBool,
        md_ring: &mut impl RingConsumer<MarketUpdate>,
        snap_ring: &mut impl RingProducer<PublicMessage>,
    ) {
        while run_flag.load(Ordering::Relaxed) {
            self.drain_once(md_ring, snap_ring);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spsc_ring::SpscRing;
    use crate::types::{MarketUpdateType, Side};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default, Clone)]
    struct Recorder(Rc<RefCell<Vec<PublicMessage>>>);

    impl McastSink for Recorder {
        fn send(&mut self, msg: PublicMessage) {
            self.0.borrow_mut().push(msg);
        }
    }

    fn update(qty: u32) -> MarketUpdate {
        MarketUpdate {
            kind: MarketUpdateType::Add,
            market_order_id: 1,
            ticker_id: 1,
            side: Side::Buy,
            price: 500,
            qty,
            priority: 1,
        }
    }

    #[test]
    fn sequence_numbers_start_at_one_and_increment() {
        let rec = Recorder::default();
        let mut pub_ = MarketDataPublisher::new(rec.clone());
        let mut md: SpscRing<MarketUpdate> = SpscRing::new(8);
        let mut snap: SpscRing<PublicMessage> = SpscRing::new(8);

        *md.reserve_write() = update(10);
        md.commit_write();
        *md.reserve_write() = update(20);
        md.commit_write();

        pub_.drain_once(&mut md, &mut snap);

        assert_eq!(pub_.next_seq(), 3);
        assert_eq!(rec.0.borrow().len(), 2);
        assert_eq!(snap.len(), 2);
        assert_eq!(snap.peek_read().unwrap().seq_num, 1);
    }

    #[test]
    fn forwards_identical_copy_to_snapshot_ring() {
        let rec = Recorder::default();
        let mut pub_ = MarketDataPublisher::new(rec);
        let mut md: SpscRing<MarketUpdate> = SpscRing::new(8);
        let mut snap: SpscRing<PublicMessage> = SpscRing::new(8);

        *md.reserve_write() = update(42);
        md.commit_write();
        pub_.drain_once(&mut md, &mut snap);

        let forwarded = snap.peek_read().unwrap();
        assert_eq!(forwarded.update.qty, 42);
    }
}
