//! Process entry point: wires the four pinned hardware threads together
//! (spec §2/§5) — Order Server, Matching Engine, MD Publisher, Snapshot
//! Synthesiser — connected only by the SPSC rings. Ground truth:
//! `original_source/exchange/exchange_main.cpp`'s startup sequence and
//! this crate's old `main.rs`, generalized from a single inline matching
//! thread to the full pinned-thread topology spec §5 calls for.
//!
//! The FIFO Sequencer (spec §4.5) is not its own thread: it runs inline
//! at the end of the Order Server's receive-path poll cycle, exactly as
//! `OrderServer::recv_finished` already does. That leaves four OS
//! threads on the server side; MD Consumer recovery (spec §4.9) is a
//! client-side concern realized in the separate `md_consumer` binary.

use beacon_match_core::config::EngineConfig;
use beacon_match_core::matching_engine::MatchingEngine;
use beacon_match_core::md_publisher::MarketDataPublisher;
use beacon_match_core::messages::{MarketUpdate, PublicMessage, RequestFrame, ResponseFrame};
use beacon_match_core::net::{TcpOrderGateway, UdpMcastSink};
use beacon_match_core::order_server::OrderServer;
use beacon_match_core::snapshot_synthesiser::SnapshotSynthesiser;
use beacon_match_core::spsc_ring::SpscRing;
use beacon_match_core::types::TickerId;
use beacon_match_core::{cpu_affinity, logging};

use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;
use tracing::{error, info};

static RUN_FLAG: OnceLock<Arc<AtomicBool>> = OnceLock::new();

extern "C" fn on_sigint(_: libc::c_int) {
    if let Some(flag) = RUN_FLAG.get() {
        flag.store(false, Ordering::Relaxed);
    }
}

fn install_signal_handler(run_flag: Arc<AtomicBool>) {
    RUN_FLAG.set(run_flag).ok();
    unsafe {
        libc::signal(libc::SIGINT, on_sigint as libc::sighandler_t);
        libc::signal(libc::SIGTERM, on_sigint as libc::sighandler_t);
    }
}

fn main() {
    logging::init();

    let config = match EngineConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };
    info!(instance = %config.instance_name, "starting exchange");

    let run_flag = Arc::new(AtomicBool::new(true));
    install_signal_handler(run_flag.clone());

    let req_ring: SpscRing<RequestFrame> = SpscRing::new(config.req_ring_capacity as usize);
    let rsp_ring: SpscRing<ResponseFrame> = SpscRing::new(config.rsp_ring_capacity as usize);
    let md_ring: SpscRing<MarketUpdate> = SpscRing::new(config.md_ring_capacity as usize);
    let snap_ring: SpscRing<PublicMessage> = SpscRing::new(config.snap_ring_capacity as usize);

    let (mut req_tx, mut req_rx) = req_ring.split();
    let (mut rsp_tx, mut rsp_rx) = rsp_ring.split();
    let (mut md_tx, mut md_rx) = md_ring.split();
    let (mut snap_tx, mut snap_rx) = snap_ring.split();

    let order_gateway_addr = format!("{}:{}", config.order_gateway_iface, config.order_gateway_port);
    let mut transport = TcpOrderGateway::bind(&order_gateway_addr).unwrap_or_else(|e| {
        error!(addr = %order_gateway_addr, error = %e, "failed to bind order gateway");
        std::process::exit(1);
    });

    let incremental_ip: Ipv4Addr = config.incremental_ip.parse().expect("invalid incremental-ip");
    let incremental_iface: Ipv4Addr = config.incremental_iface.parse().unwrap_or(Ipv4Addr::UNSPECIFIED);
    let incremental_sink = UdpMcastSink::bind(incremental_ip, config.incremental_port, incremental_iface)
        .expect("failed to bind incremental multicast sink");

    let snapshot_ip: Ipv4Addr = config.snapshot_ip.parse().expect("invalid snapshot-ip");
    let snapshot_iface: Ipv4Addr = config.snapshot_iface.parse().unwrap_or(Ipv4Addr::UNSPECIFIED);
    let snapshot_sink = UdpMcastSink::bind(snapshot_ip, config.snapshot_port, snapshot_iface)
        .expect("failed to bind snapshot multicast sink");

    let max_clients = config.max_clients as usize;
    let max_pending_requests = config.max_pending_requests as usize;
    let max_tickers = config.max_tickers as usize;
    let max_orders = config.max_orders as usize;
    let max_price_levels = config.max_price_levels as usize;
    let snapshot_period = config.snapshot_period;

    let order_server_flag = run_flag.clone();
    let order_server_thread = thread::Builder::new()
        .name("order-server".into())
        .spawn(move || {
            cpu_affinity::set_core(0);
            let mut server = OrderServer::new(max_clients, max_pending_requests, transport);
            while order_server_flag.load(Ordering::Relaxed) {
                let (frames, closed) = server.transport_mut().poll_receive();
                for (socket, rx_time_ns, frame) in frames {
                    server.on_receive(socket, rx_time_ns, frame);
                }
                for socket in closed {
                    server.on_socket_closed(socket);
                }
                server.recv_finished(&mut req_tx);
                server.send_responses(&mut rsp_rx);
            }
        })
        .expect("failed to spawn order-server thread");

    let matching_flag = run_flag.clone();
    let matching_thread = thread::Builder::new()
        .name("matching-engine".into())
        .spawn(move || {
            cpu_affinity::set_core(1);
            let mut engine = MatchingEngine::new(max_tickers, max_orders, max_price_levels, max_clients, matching_flag);
            engine.run(&mut req_rx, &mut rsp_tx, &mut md_tx);
        })
        .expect("failed to spawn matching-engine thread");

    let md_publisher_flag = run_flag.clone();
    let md_publisher_thread = thread::Builder::new()
        .name("md-publisher".into())
        .spawn(move || {
            cpu_affinity::set_core(2);
            let mut publisher = MarketDataPublisher::new(incremental_sink);
            publisher.run(&md_publisher_flag, &mut md_rx, &mut snap_tx);
        })
        .expect("failed to spawn md-publisher thread");

    let snapshot_flag = run_flag.clone();
    let snapshot_thread = thread::Builder::new()
        .name("snapshot-synthesiser".into())
        .spawn(move || {
            cpu_affinity::set_core(3);
            let mut synth = SnapshotSynthesiser::new(snapshot_sink, snapshot_period, max_tickers as TickerId);
            synth.run(&snapshot_flag, &mut snap_rx);
        })
        .expect("failed to spawn snapshot-synthesiser thread");

    order_server_thread.join().ok();
    matching_thread.join().ok();
    md_publisher_thread.join().ok();
    snapshot_thread.join().ok();

    info!("exchange shut down");
}
