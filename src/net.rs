//! Minimal non-blocking TCP order-gateway transport. Spec §6 treats the
//! socket layer (edge-triggered poll, `MSG_DONTWAIT`) as an external
//! collaborator with only its contract specified; this realizes that
//! contract with plain `std::net` nonblocking sockets plus a background
//! accept thread rather than a raw epoll/kqueue binding, since the core
//! only needs readiness-polling semantics, not a specific syscall.

use crate::error::EngineError;
use crate::md_publisher::McastSink;
use crate::message_codec::{self, PUBLIC_MESSAGE_SIZE, REQUEST_FRAME_SIZE, RESPONSE_FRAME_SIZE};
use crate::messages::{PublicMessage, RequestFrame, ResponseFrame};
use crate::order_server::{OrderGatewayTransport, SocketId};
use std::collections::HashMap;
use std::io::{ErrorKind, Read, Write};
use std::net::{Ipv4Addr, TcpListener, TcpStream, UdpSocket};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Instant;
use tracing::debug;

pub struct TcpOrderGateway {
    sockets: HashMap<u64, TcpStream>,
    next_socket_id: u64,
    new_conns: Receiver<TcpStream>,
    /// Per-socket byte accumulator: a `WouldBlock` mid-record must not
    /// drop the bytes already read, and a single `read()` can straddle
    /// more than one record (spec §4.6: "records are concatenated; the
    /// receiver consumes whole records from its buffer, shifting any
    /// partial-record tail to the front").
    recv_bufs: HashMap<u64, Vec<u8>>,
    scratch: [u8; 4096],
    started: Instant,
}

impl TcpOrderGateway {
    /// Binds `addr` and spawns a background thread that accepts
    /// connections and hands them to the poll loop via a channel.
    pub fn bind(addr: &str) -> Result<Self, EngineError> {
        let listener = TcpListener::bind(addr)?;
        listener.set_nonblocking(true)?;
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || loop {
            match listener.accept() {
                Ok((stream, _)) => {
                    let _ = stream.set_nonblocking(true);
                    if tx.send(stream).is_err() {
                        break;
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => thread::yield_now(),
                Err(_) => break,
            }
        });
        Ok(TcpOrderGateway {
            sockets: HashMap::new(),
            next_socket_id: 1,
            new_conns: rx,
            recv_bufs: HashMap::new(),
            scratch: [0u8; 4096],
            started: Instant::now(),
        })
    }

    fn rx_time_ns(&self) -> u64 {
        self.started.elapsed().as_nanos() as u64
    }

    /// Registers any connections accepted since the last call, reads
    /// whatever bytes are currently available from every ready socket
    /// into its accumulator, and drains every complete
    /// `REQUEST_FRAME_SIZE`-byte record off the front of that
    /// accumulator, leaving any partial tail in place for the next call.
    /// Returns the decoded frames plus the sockets found closed this
    /// cycle, so the caller can dispatch both without holding a second
    /// mutable borrow of whatever owns this gateway.
    pub fn poll_receive(&mut self) -> (Vec<(SocketId, u64, RequestFrame)>, Vec<SocketId>) {
        while let Ok(stream) = self.new_conns.try_recv() {
            let id = self.next_socket_id;
            self.next_socket_id += 1;
            self.sockets.insert(id, stream);
            self.recv_bufs.insert(id, Vec::new());
        }

        let mut frames = Vec::new();
        let mut closed = Vec::new();
        for (&id, stream) in self.sockets.iter_mut() {
            loop {
                match stream.read(&mut self.scratch) {
                    Ok(0) => {
                        closed.push(id);
                        break;
                    }
                    Ok(n) => {
                        self.recv_bufs.entry(id).or_default().extend_from_slice(&self.scratch[..n]);
                        if n < self.scratch.len() {
                            break;
                        }
                    }
                    Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                    Err(_) => {
                        closed.push(id);
                        break;
                    }
                }
            }

            let buf = self.recv_bufs.entry(id).or_default();
            let mut consumed = 0;
            while buf.len() - consumed >= REQUEST_FRAME_SIZE {
                let record = &buf[consumed..consumed + REQUEST_FRAME_SIZE];
                match message_codec::decode_request_frame(record) {
                    Ok(frame) => frames.push((id, frame)),
                    Err(e) => debug!(socket_id = id, error = %e, "dropping malformed frame"),
                }
                consumed += REQUEST_FRAME_SIZE;
            }
            if consumed > 0 {
                buf.drain(..consumed);
            }
        }

        for id in &closed {
            self.sockets.remove(id);
            self.recv_bufs.remove(id);
        }

        let rx_time_ns = self.rx_time_ns();
        let frames = frames
            .into_iter()
            .map(|(id, frame)| (SocketId(id), rx_time_ns, frame))
            .collect();
        (frames, closed.into_iter().map(SocketId).collect())
    }
}

impl OrderGatewayTransport for TcpOrderGateway {
    fn send_response(&mut self, socket: SocketId, frame: ResponseFrame) {
        let Some(stream) = self.sockets.get_mut(&socket.0) else {
            return;
        };
        let mut buf = [0u8; RESPONSE_FRAME_SIZE];
        if message_codec::encode_response_frame(&frame, &mut buf).is_ok() {
            let _ = stream.write_all(&buf);
        }
    }
}

/// Non-blocking UDP multicast emitter: one datagram per [`PublicMessage`]
/// (spec §6's "one update per datagram"). Used by both the incremental
/// and snapshot groups — each binds its own instance.
pub struct UdpMcastSink {
    socket: UdpSocket,
    group: std::net::SocketAddrV4,
}

impl UdpMcastSink {
    pub fn bind(group_ip: Ipv4Addr, port: u16, iface: Ipv4Addr) -> Result<Self, EngineError> {
        let socket = UdpSocket::bind((iface, 0))?;
        socket.set_nonblocking(true)?;
        socket.set_multicast_ttl_v4(8)?;
        Ok(UdpMcastSink {
            socket,
            group: std::net::SocketAddrV4::new(group_ip, port),
        })
    }
}

impl McastSink for UdpMcastSink {
    fn send(&mut self, msg: PublicMessage) {
        let mut buf = [0u8; PUBLIC_MESSAGE_SIZE];
        if message_codec::encode_public_message(&msg, &mut buf).is_ok() {
            let _ = self.socket.send_to(&buf, self.group);
        }
    }
}

/// Joins a multicast group and yields decoded [`PublicMessage`]s as they
/// arrive, non-blocking (spec §6 `IP_ADD_MEMBERSHIP`). Dropping this (or
/// calling [`McastReceiver::leave`] explicitly) drops the group
/// membership, so the snapshot group can be joined only while a consumer
/// is in recovery (spec §4.9).
pub struct McastReceiver {
    socket: UdpSocket,
    group_ip: Ipv4Addr,
    iface: Ipv4Addr,
    buf: [u8; PUBLIC_MESSAGE_SIZE],
}

impl McastReceiver {
    pub fn join(group_ip: Ipv4Addr, port: u16, iface: Ipv4Addr) -> Result<Self, EngineError> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, port))?;
        socket.join_multicast_v4(&group_ip, &iface)?;
        socket.set_nonblocking(true)?;
        Ok(McastReceiver {
            socket,
            group_ip,
            iface,
            buf: [0u8; PUBLIC_MESSAGE_SIZE],
        })
    }

    /// Returns the next datagram on this group, if one is waiting.
    pub fn try_recv(&mut self) -> Option<PublicMessage> {
        match self.socket.recv(&mut self.buf) {
            Ok(n) if n == PUBLIC_MESSAGE_SIZE => message_codec::decode_public_message(&self.buf).ok(),
            Ok(_) => None,
            Err(e) if e.kind() == ErrorKind::WouldBlock => None,
            Err(_) => None,
        }
    }

    /// Drops this group's membership. The socket is consumed; rejoining
    /// requires a fresh [`McastReceiver::join`] call.
    pub fn leave(self) -> std::io::Result<()> {
        self.socket.leave_multicast_v4(&self.group_ip, &self.iface)
    }
}
