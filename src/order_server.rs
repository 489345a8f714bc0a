//! Per-client TCP session bookkeeping: sequence-number framing, bind-
//! on-first-record, and response dispatch (spec §4.6). Ground truth:
//! `original_source/exchange/order_server/order_server.h`'s
//! `recvCallback`/`run`, with the actual non-blocking socket poll loop
//! left to the transport layer (spec §6: "a thin kernel wrapper" is
//! out of scope — only the contract here matters) behind
//! [`OrderGatewayTransport`].

use crate::fifo_sequencer::FifoSequencer;
use crate::messages::{ClientResponse, RequestFrame, ResponseFrame, TimestampedRequest};
use crate::spsc_ring::{RingConsumer, RingProducer};
use crate::types::ClientId;
use tracing::debug;

/// Opaque handle for a connected socket, assigned by the transport
/// layer. Two different physical connections never compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketId(pub u64);

/// What the order gateway needs from the socket layer to emit
/// responses (spec §6).
pub trait OrderGatewayTransport {
    fn send_response(&mut self, socket: SocketId, frame: ResponseFrame);
}

struct ClientState {
    socket: Option<SocketId>,
    next_exp_seq: u64,
    next_outgoing_seq: u64,
}

impl Default for ClientState {
    fn default() -> Self {
        ClientState {
            socket: None,
            next_exp_seq: 0,
            next_outgoing_seq: 0,
        }
    }
}

pub struct OrderServer<T: OrderGatewayTransport> {
    clients: Vec<ClientState>,
    fifo_sequencer: FifoSequencer,
    transport: T,
    next_req_seq: u64,
}

impl<T: OrderGatewayTransport> OrderServer<T> {
    pub fn new(max_clients: usize, max_pending_requests: usize, transport: T) -> Self {
        let mut clients = Vec::with_capacity(max_clients);
        clients.resize_with(max_clients, ClientState::default);
        OrderServer {
            clients,
            fifo_sequencer: FifoSequencer::new(max_pending_requests),
            transport,
            next_req_seq: 1,
        }
    }

    /// spec §4.6 receive path, one whole frame at a time. `rx_time_ns`
    /// is the kernel receive timestamp, captured at the socket layer.
    pub fn on_receive(&mut self, socket: SocketId, rx_time_ns: u64, frame: RequestFrame) {
        let client_id = frame.request.client_id;
        let Some(state) = self.clients.get_mut(client_id as usize) else {
            debug!(client_id, "dropping request from out-of-range client");
            return;
        };

        match state.socket {
            None => state.socket = Some(socket),
            Some(bound) if bound != socket => {
                debug!(client_id, "dropping record from unbound socket");
                return;
            }
            _ => {}
        }

        if frame.seq != state.next_exp_seq {
            debug!(
                client_id,
                expected = state.next_exp_seq,
                got = frame.seq,
                "dropping out-of-sequence record"
            );
            return;
        }
        state.next_exp_seq += 1;

        self.fifo_sequencer.add_client_request(TimestampedRequest {
            recv_time_ns: rx_time_ns,
            client_id,
            request: frame.request,
        });
    }

    /// Grants the socket poll loop access to the owned transport, so it
    /// can be polled for new frames without a second mutable borrow of
    /// `self` alongside [`OrderServer::on_receive`].
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Called once a poll cycle has read from every ready socket (spec
    /// §4.6: "call sequenceAndPublish").
    pub fn recv_finished(&mut self, req_ring: &mut impl RingProducer<RequestFrame>) {
        let base = self.next_req_seq;
        let n = self.fifo_sequencer.len() as u64;
        self.fifo_sequencer.sequence_and_publish(base, req_ring);
        self.next_req_seq += n;
    }

    /// spec §4.6 send path: drains `rsp_ring` and frames each response
    /// with its per-client outgoing sequence number.
    pub fn send_responses(&mut self, rsp_ring: &mut impl RingConsumer<ResponseFrame>) {
        while let Some(&frame) = rsp_ring.peek_read() {
            self.send_one(frame.response);
            rsp_ring.commit_read();
        }
    }

    fn send_one(&mut self, response: ClientResponse) {
        let client_id = response.client_id as usize;
        let Some(state) = self.clients.get_mut(client_id) else {
            return;
        };
        let Some(socket) = state.socket else {
            debug!(client_id, "no socket bound, dropping response");
            return;
        };
        let seq = state.next_outgoing_seq;
        state.next_outgoing_seq += 1;
        self.transport
            .send_response(socket, ResponseFrame { seq, response });
    }

    /// spec §4.6 "Connection loss": the socket is gone from the poll
    /// set by the transport layer already; this clears the binding so
    /// a reconnect on a fresh socket can rebind. Sequence counters are
    /// untouched — they persist across reconnects for the same client.
    pub fn on_socket_closed(&mut self, socket: SocketId) {
        for state in &mut self.clients {
            if state.socket == Some(socket) {
                state.socket = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::ClientRequest;
    use crate::spsc_ring::SpscRing;
    use crate::types::{ClientRequestType, Side};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default, Clone)]
    struct Recorder(Rc<RefCell<Vec<(SocketId, ResponseFrame)>>>);

    impl OrderGatewayTransport for Recorder {
        fn send_response(&mut self, socket: SocketId, frame: ResponseFrame) {
            self.0.borrow_mut().push((socket, frame));
        }
    }

    fn req_frame(client_id: ClientId, seq: u64) -> RequestFrame {
        RequestFrame {
            seq,
            request: ClientRequest {
                kind: ClientRequestType::New,
                client_id,
                ticker_id: 0,
                client_order_id: 1,
                side: Side::Buy,
                price: 100,
                qty: 1,
            },
        }
    }

    #[test]
    fn binds_client_to_first_socket_seen() {
        let rec = Recorder::default();
        let mut srv = OrderServer::new(8, 16, rec);
        srv.on_receive(SocketId(1), 10, req_frame(3, 0));
        assert!(srv.clients[3].socket == Some(SocketId(1)));
    }

    #[test]
    fn drops_record_from_a_different_socket_once_bound() {
        let rec = Recorder::default();
        let mut srv = OrderServer::new(8, 16, rec);
        srv.on_receive(SocketId(1), 10, req_frame(3, 0));
        srv.on_receive(SocketId(2), 11, req_frame(3, 1));
        assert_eq!(srv.clients[3].next_exp_seq, 1);
    }

    #[test]
    fn drops_record_with_wrong_sequence_number() {
        let rec = Recorder::default();
        let mut srv = OrderServer::new(8, 16, rec);
        srv.on_receive(SocketId(1), 10, req_frame(3, 5)); // expected 0
        assert_eq!(srv.clients[3].next_exp_seq, 0);
        assert!(srv.fifo_sequencer.is_empty());
    }

    #[test]
    fn reconnect_preserves_sequence_counters() {
        let rec = Recorder::default();
        let mut srv = OrderServer::new(8, 16, rec);
        srv.on_receive(SocketId(1), 10, req_frame(3, 0));
        assert_eq!(srv.clients[3].next_exp_seq, 1);

        srv.on_socket_closed(SocketId(1));
        assert!(srv.clients[3].socket.is_none());

        srv.on_receive(SocketId(2), 20, req_frame(3, 1));
        assert_eq!(srv.clients[3].socket, Some(SocketId(2)));
        assert_eq!(srv.clients[3].next_exp_seq, 2);
    }

    #[test]
    fn send_responses_frames_with_per_client_outgoing_sequence() {
        let rec = Recorder::default();
        let mut srv = OrderServer::new(8, 16, rec.clone());
        srv.on_receive(SocketId(1), 10, req_frame(3, 0));

        let mut rsp: SpscRing<ResponseFrame> = SpscRing::new(4);
        let resp = ClientResponse {
            client_id: 3,
            ..Default::default()
        };
        *rsp.reserve_write() = ResponseFrame { seq: 0, response: resp };
        rsp.commit_write();
        srv.send_responses(&mut rsp);

        let sent = rec.0.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, SocketId(1));
        assert_eq!(sent[0].1.seq, 0);
    }
}
