//! Startup configuration (spec §6's enumerated option table). Values
//! come from `--flag value` CLI arguments with `EXCHANGE_*` environment
//! variables as fallback, CLI winning on conflict — the same override
//! order as the teacher's `instance_name`/`INST_NAME` pair, just
//! generalized across the whole table.

use crate::error::EngineError;
use crate::number_tool::parse_human_readable_u32;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub instance_name: String,

    pub max_tickers: u32,
    pub max_orders: u32,
    pub max_price_levels: u32,
    pub max_clients: u32,
    pub max_pending_requests: u32,

    pub req_ring_capacity: u32,
    pub rsp_ring_capacity: u32,
    pub md_ring_capacity: u32,
    pub snap_ring_capacity: u32,

    pub incremental_ip: String,
    pub incremental_port: u16,
    pub incremental_iface: String,

    pub snapshot_ip: String,
    pub snapshot_port: u16,
    pub snapshot_iface: String,

    pub order_gateway_iface: String,
    pub order_gateway_port: u16,

    pub snapshot_period: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            instance_name: "DEFAULT".to_string(),
            max_tickers: 8,
            max_orders: 1024,
            max_price_levels: 256,
            max_clients: 256,
            max_pending_requests: 1024,
            req_ring_capacity: 4096,
            rsp_ring_capacity: 4096,
            md_ring_capacity: 4096,
            snap_ring_capacity: 4096,
            incremental_ip: "233.252.14.1".to_string(),
            incremental_port: 20000,
            incremental_iface: "lo".to_string(),
            snapshot_ip: "233.252.14.2".to_string(),
            snapshot_port: 20001,
            snapshot_iface: "lo".to_string(),
            order_gateway_iface: "lo".to_string(),
            order_gateway_port: 12345,
            snapshot_period: Duration::from_secs(60),
        }
    }
}

/// Reads one `--flag value` pair out of the raw CLI args, falling back
/// to an `EXCHANGE_*` environment variable, then to `default`.
fn resolve_str(args: &[String], flag: &str, env_key: &str, default: &str) -> String {
    let mut i = 1;
    while i < args.len() {
        if args[i] == flag && i + 1 < args.len() {
            return args[i + 1].clone();
        }
        i += 1;
    }
    std::env::var(env_key).unwrap_or_else(|_| default.to_string())
}

fn resolve_u32(args: &[String], flag: &str, env_key: &str, default: u32) -> Result<u32, String> {
    let raw = resolve_str(args, flag, env_key, "");
    if raw.is_empty() {
        return Ok(default);
    }
    parse_human_readable_u32(&raw).map_err(|e| format!("invalid value for {flag}: {e}"))
}

fn resolve_u16(args: &[String], flag: &str, env_key: &str, default: u16) -> Result<u16, String> {
    let raw = resolve_str(args, flag, env_key, "");
    if raw.is_empty() {
        return Ok(default);
    }
    raw.parse()
        .map_err(|_| format!("invalid value for {flag}: '{raw}' is not a valid u16"))
}

impl EngineConfig {
    /// Parses process CLI args plus `EXCHANGE_*` env vars into a
    /// complete configuration (spec §6). CLI wins on conflict.
    pub fn from_env() -> Result<Self, EngineError> {
        Self::from_env_impl().map_err(EngineError::Config)
    }

    fn from_env_impl() -> Result<Self, String> {
        let args: Vec<String> = std::env::args().collect();
        let defaults = EngineConfig::default();

        let instance_name = resolve_str(&args, "--name", "EXCHANGE_NAME", &defaults.instance_name);
        if instance_name.len() > 16 {
            return Err(format!(
                "instance name '{instance_name}' exceeds maximum length of 16 characters"
            ));
        }

        Ok(EngineConfig {
            instance_name,
            max_tickers: resolve_u32(&args, "--max-tickers", "EXCHANGE_MAX_TICKERS", defaults.max_tickers)?,
            max_orders: resolve_u32(&args, "--max-orders", "EXCHANGE_MAX_ORDERS", defaults.max_orders)?,
            max_price_levels: resolve_u32(
                &args,
                "--max-price-levels",
                "EXCHANGE_MAX_PRICE_LEVELS",
                defaults.max_price_levels,
            )?,
            max_clients: resolve_u32(&args, "--max-clients", "EXCHANGE_MAX_CLIENTS", defaults.max_clients)?,
            max_pending_requests: resolve_u32(
                &args,
                "--max-pending-requests",
                "EXCHANGE_MAX_PENDING_REQUESTS",
                defaults.max_pending_requests,
            )?,
            req_ring_capacity: resolve_u32(
                &args,
                "--req-ring-capacity",
                "EXCHANGE_REQ_RING_CAPACITY",
                defaults.req_ring_capacity,
            )?,
            rsp_ring_capacity: resolve_u32(
                &args,
                "--rsp-ring-capacity",
                "EXCHANGE_RSP_RING_CAPACITY",
                defaults.rsp_ring_capacity,
            )?,
            md_ring_capacity: resolve_u32(
                &args,
                "--md-ring-capacity",
                "EXCHANGE_MD_RING_CAPACITY",
                defaults.md_ring_capacity,
            )?,
            snap_ring_capacity: resolve_u32(
                &args,
                "--snap-ring-capacity",
                "EXCHANGE_SNAP_RING_CAPACITY",
                defaults.snap_ring_capacity,
            )?,
            incremental_ip: resolve_str(&args, "--incremental-ip", "EXCHANGE_INCREMENTAL_IP", &defaults.incremental_ip),
            incremental_port: resolve_u16(
                &args,
                "--incremental-port",
                "EXCHANGE_INCREMENTAL_PORT",
                defaults.incremental_port,
            )?,
            incremental_iface: resolve_str(
                &args,
                "--incremental-iface",
                "EXCHANGE_INCREMENTAL_IFACE",
                &defaults.incremental_iface,
            ),
            snapshot_ip: resolve_str(&args, "--snapshot-ip", "EXCHANGE_SNAPSHOT_IP", &defaults.snapshot_ip),
            snapshot_port: resolve_u16(&args, "--snapshot-port", "EXCHANGE_SNAPSHOT_PORT", defaults.snapshot_port)?,
            snapshot_iface: resolve_str(
                &args,
                "--snapshot-iface",
                "EXCHANGE_SNAPSHOT_IFACE",
                &defaults.snapshot_iface,
            ),
            order_gateway_iface: resolve_str(
                &args,
                "--order-gateway-iface",
                "EXCHANGE_ORDER_GATEWAY_IFACE",
                &defaults.order_gateway_iface,
            ),
            order_gateway_port: resolve_u16(
                &args,
                "--order-gateway-port",
                "EXCHANGE_ORDER_GATEWAY_PORT",
                defaults.order_gateway_port,
            )?,
            snapshot_period: {
                let secs = resolve_u32(
                    &args,
                    "--snapshot-period-secs",
                    "EXCHANGE_SNAPSHOT_PERIOD_SECS",
                    defaults.snapshot_period.as_secs() as u32,
                )?;
                Duration::from_secs(secs as u64)
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_internally_consistent() {
        let cfg = EngineConfig::default();
        assert!(cfg.max_orders > 0);
        assert_eq!(cfg.snapshot_period, Duration::from_secs(60));
    }

    #[test]
    fn resolve_u32_accepts_human_readable_suffixes() {
        let args = vec!["exchange".to_string(), "--max-orders".to_string(), "2k".to_string()];
        let v = resolve_u32(&args, "--max-orders", "EXCHANGE_MAX_ORDERS_TEST_UNUSED", 0).unwrap();
        assert_eq!(v, 2000);
    }

    #[test]
    fn resolve_str_falls_back_to_default_when_flag_absent() {
        let args = vec!["exchange".to_string()];
        let v = resolve_str(&args, "--name", "EXCHANGE_NAME_TEST_UNUSED", "DEFAULT");
        assert_eq!(v, "DEFAULT");
    }
}
