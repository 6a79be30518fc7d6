//! Capture configuration.
//!
//! A plain value describing which provider to run and how; constructed by
//! the embedding application (from its own settings store) and passed to
//! [`Engine::spawn`](crate::Engine::spawn). Serde-derived so applications can
//! embed it directly in whatever configuration format they use.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::arbiter::ArbiterConfig;
use crate::classify::heuristic::DEFAULT_UDP_PORTS;
use crate::providers::relay::DEFAULT_RELAY_PORT;

/// Which packet provider the engine runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureMode {
    /// Multi-device live capture on this host (requires the `live-capture`
    /// feature).
    #[default]
    Local,
    /// Receive pre-filtered payloads from an external relay agent.
    Remote,
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub mode: CaptureMode,

    /// UDP ports the target protocol is expected on; also drives the BPF
    /// capture filter. An empty list disables both the filter and the
    /// port half of the heuristic (signature matching still applies).
    pub target_ports: Vec<u16>,

    /// Bind address for the relay provider.
    pub relay_host: IpAddr,
    pub relay_port: u16,

    /// Device-lock tuning for local capture.
    pub score_to_lock: u32,
    pub lock_timeout_secs: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            mode: CaptureMode::Local,
            target_ports: DEFAULT_UDP_PORTS.to_vec(),
            relay_host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            relay_port: DEFAULT_RELAY_PORT,
            score_to_lock: 1,
            lock_timeout_secs: 20,
        }
    }
}

impl CaptureConfig {
    pub fn relay_addr(&self) -> SocketAddr {
        SocketAddr::new(self.relay_host, self.relay_port)
    }

    pub fn arbiter_config(&self) -> ArbiterConfig {
        ArbiterConfig {
            score_to_lock: self.score_to_lock,
            lock_timeout: Duration::from_secs(self.lock_timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_protocol_conventions() {
        let config = CaptureConfig::default();
        assert_eq!(config.mode, CaptureMode::Local);
        assert_eq!(config.target_ports, vec![5055, 5056, 5058]);
        assert_eq!(config.relay_addr().port(), 44444);
        assert_eq!(config.arbiter_config().score_to_lock, 1);
        assert_eq!(config.arbiter_config().lock_timeout, Duration::from_secs(20));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: CaptureConfig =
            serde_json::from_str(r#"{"mode": "remote", "relay_port": 50001}"#).unwrap();
        assert_eq!(config.mode, CaptureMode::Remote);
        assert_eq!(config.relay_port, 50001);
        assert_eq!(config.target_ports, vec![5055, 5056, 5058]);
    }
}
