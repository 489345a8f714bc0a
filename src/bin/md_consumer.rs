//! Client-side market-data recovery demo: joins both multicast groups,
//! feeds [`MdConsumer`] and mirrors the resulting book into a simple
//! per-ticker quantity-by-price map, logging whenever a gap triggers
//! recovery. Ground truth: `original_source/trading/market_data/
//! market_data_consumer.{h,cpp}`'s standalone consumer process.

use beacon_match_core::config::EngineConfig;
use beacon_match_core::logging;
use beacon_match_core::md_consumer::{DownstreamBook, MdConsumer};
use beacon_match_core::messages::MarketUpdate;
use beacon_match_core::net::McastReceiver;
use beacon_match_core::types::{MarketUpdateType, OrderId, Price, TickerId};

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{error, info, warn};

/// A resting-order mirror keyed the same way the Snapshot Synthesiser
/// keys its own: `(ticker, order id)`. Good enough for a demo consumer;
/// a production downstream would maintain full price-level aggregates.
#[derive(Default)]
struct MirrorBook {
    orders: HashMap<(TickerId, OrderId), (Price, u32)>,
}

impl DownstreamBook for MirrorBook {
    fn apply(&mut self, update: MarketUpdate) {
        let key = (update.ticker_id, update.market_order_id);
        match update.kind {
            MarketUpdateType::Add => {
                self.orders.insert(key, (update.price, update.qty));
            }
            MarketUpdateType::Modify => {
                if let Some(entry) = self.orders.get_mut(&key) {
                    *entry = (update.price, update.qty);
                }
            }
            MarketUpdateType::Cancel | MarketUpdateType::Trade => {
                self.orders.remove(&key);
            }
            MarketUpdateType::Clear => {
                self.orders.retain(|(tid, _), _| *tid != update.ticker_id);
            }
            MarketUpdateType::SnapshotStart | MarketUpdateType::SnapshotEnd | MarketUpdateType::Invalid => {}
        }
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
    info!(instance = %config.instance_name, "starting market data consumer");

    let run_flag = Arc::new(AtomicBool::new(true));
    {
        let flag = run_flag.clone();
        ctrlc_fallback(flag);
    }

    let incremental_ip: Ipv4Addr = config.incremental_ip.parse().expect("invalid incremental-ip");
    let incremental_iface: Ipv4Addr = config.incremental_iface.parse().unwrap_or(Ipv4Addr::UNSPECIFIED);
    let mut incremental = McastReceiver::join(incremental_ip, config.incremental_port, incremental_iface)
        .expect("failed to join incremental multicast group");

    let snapshot_ip: Ipv4Addr = config.snapshot_ip.parse().expect("invalid snapshot-ip");
    let snapshot_iface: Ipv4Addr = config.snapshot_iface.parse().unwrap_or(Ipv4Addr::UNSPECIFIED);

    let mut consumer = MdConsumer::new(MirrorBook::default());
    let mut was_in_recovery = false;
    // Snapshot group membership tracks recovery state (spec §4.9): the
    // consumer listens to incremental always, and joins snapshot only
    // while recovering, leaving it the moment recovery completes.
    let mut snapshot: Option<McastReceiver> = None;

    while run_flag.load(Ordering::Relaxed) {
        if let Some(msg) = incremental.try_recv() {
            consumer.on_incremental(msg);
        }
        if let Some(receiver) = snapshot.as_mut() {
            if let Some(msg) = receiver.try_recv() {
                consumer.on_snapshot(msg);
            }
        }

        if consumer.in_recovery() != was_in_recovery {
            was_in_recovery = consumer.in_recovery();
            if was_in_recovery {
                warn!(
                    expected = consumer.next_expected_inc_seq(),
                    "sequence gap detected, entering snapshot recovery"
                );
                match McastReceiver::join(snapshot_ip, config.snapshot_port, snapshot_iface) {
                    Ok(receiver) => snapshot = Some(receiver),
                    Err(e) => error!(error = %e, "failed to join snapshot multicast group"),
                }
            } else {
                info!(
                    next_expected = consumer.next_expected_inc_seq(),
                    "recovery complete, resuming live updates"
                );
                if let Some(receiver) = snapshot.take() {
                    if let Err(e) = receiver.leave() {
                        error!(error = %e, "failed to leave snapshot multicast group");
                    }
                }
            }
        }

        thread::sleep(Duration::from_micros(100));
    }

    info!("market data consumer shut down");
}

/// No signal-handling crate is part of this stack; SIGINT/SIGTERM wiring
/// mirrors `exchange`'s via raw `libc::signal`.
fn ctrlc_fallback(flag: Arc<AtomicBool>) {
    use std::sync::OnceLock;
    static RUN_FLAG: OnceLock<Arc<AtomicBool>> = OnceLock::new();
    RUN_FLAG.set(flag).ok();

    extern "C" fn on_signal(_: libc::c_int) {
        if let Some(flag) = RUN_FLAG.get() {
            flag.store(false, Ordering::Relaxed);
        }
    }

    unsafe {
        libc::signal(libc::SIGINT, on_signal as libc::sighandler_t);
        libc::signal(libc::SIGTERM, on_signal as libc::sighandler_t);
    }
}
