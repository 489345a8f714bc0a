//! Restores arrival-time order across many TCP sockets polled in
//! arbitrary readiness order, once per poll cycle (spec §4.5). Ground
//! truth: `original_source/exchange/order_server/fifo_sequencer.h`'s
//! `addClientRequest`/`sequenceAndPublish`.
//!
//! The source resets its pending-count to zero *inside* the publish
//! loop rather than after it, which (because the loop condition
//! re-reads that count each iteration) drops every buffered request
//! but the first. Spec §4.5 step 3 is "clear the buffer" once the
//! publish loop is done; that is what this does.

use crate::messages::{RequestFrame, TimestampedRequest};
use crate::spsc_ring::RingProducer;

pub struct FifoSequencer {
    pending: Vec<TimestampedRequest>,
    capacity: usize,
}

impl FifoSequencer {
    pub fn new(capacity: usize) -> Self {
        FifoSequencer {
            pending: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Buffers one request with its socket-layer receive timestamp.
    /// Fatal if the per-cycle batch capacity is exceeded (spec §4.5:
    /// "The buffer has a fixed capacity; overflow is fatal.").
    pub fn add_client_request(&mut self, request: TimestampedRequest) {
        assert!(
            self.pending.len() < self.capacity,
            "FIFO sequencer overflow: {} pending requests exceeds capacity {}",
            self.pending.len(),
            self.capacity
        );
        self.pending.push(request);
    }

    /// Stable-sorts the batch by receive timestamp, publishes each
    /// request into `req_ring` in that order, then clears the buffer.
    pub fn sequence_and_publish(&mut self, seq_base: u64, req_ring: &mut impl RingProducer<RequestFrame>) {
        if self.pending.is_empty() {
            return;
        }

        self.pending.sort_by_key(|r| r.recv_time_ns);

        for (i, timestamped) in self.pending.iter().enumerate() {
            *req_ring.reserve_write() = RequestFrame {
                seq: seq_base + i as u64,
                request: timestamped.request,
            };
            req_ring.commit_write();
        }

        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::ClientRequest;
    use crate::spsc_ring::SpscRing;
    use crate::types::{ClientRequestType, Side};

    fn ts_req(recv_time_ns: u64, client_order_id: u64) -> TimestampedRequest {
        TimestampedRequest {
            recv_time_ns,
            client_id: 1,
            request: ClientRequest {
                kind: ClientRequestType::New,
                client_id: 1,
                ticker_id: 0,
                client_order_id,
                side: Side::Buy,
                price: 100,
                qty: 1,
            },
        }
    }

    #[test]
    fn publishes_in_ascending_timestamp_order_regardless_of_arrival() {
        let mut seq = FifoSequencer::new(8);
        // socket B arrives first but has the later kernel timestamp
        seq.add_client_request(ts_req(10, 1)); // socket A, t=10
        seq.add_client_request(ts_req(5, 2)); // socket B, t=5

        let mut ring: SpscRing<RequestFrame> = SpscRing::new(8);
        seq.sequence_and_publish(100, &mut ring);

        assert!(seq.is_empty());
        assert_eq!(ring.len(), 2);
        let first = ring.peek_read().unwrap().request.client_order_id;
        ring.commit_read();
        let second = ring.peek_read().unwrap().request.client_order_id;
        assert_eq!(first, 2);
        assert_eq!(second, 1);
    }

    #[test]
    fn all_buffered_requests_survive_one_cycle() {
        let mut seq = FifoSequencer::new(8);
        for i in 0..5 {
            seq.add_client_request(ts_req(i, i));
        }
        let mut ring: SpscRing<RequestFrame> = SpscRing::new(8);
        seq.sequence_and_publish(0, &mut ring);
        assert_eq!(ring.len(), 5);
    }

    #[test]
    #[should_panic(expected = "overflow")]
    fn overflow_is_fatal() {
        let mut seq = FifoSequencer::new(1);
        seq.add_client_request(ts_req(1, 1));
        seq.add_client_request(ts_req(2, 2));
    }

    #[test]
    fn empty_cycle_is_a_no_op() {
        let mut seq = FifoSequencer::new(4);
        let mut ring: SpscRing<RequestFrame> = SpscRing::new(4);
        seq.sequence_and_publish(0, &mut ring);
        assert!(ring.is_empty());
    }
}
