//! Capture device arbitration.
//!
//! When the true game-facing interface is unknown, the live provider opens
//! every capturable device and lets them race: the first device to produce
//! enough valid protocol packets wins an exclusive lock, and everything else
//! is rejected until that device goes silent for longer than the lock
//! timeout. This converges multi-homed hosts onto a single packet source
//! without configuration.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{debug, info};

/// Tuning knobs for [`DeviceArbiter`].
#[derive(Debug, Clone, Copy)]
pub struct ArbiterConfig {
    /// Valid packets a device must produce before it can take the lock.
    pub score_to_lock: u32,

    /// Silence on the locked device after which the lock is released and
    /// all scores reset.
    pub lock_timeout: Duration,
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self { score_to_lock: 1, lock_timeout: Duration::from_secs(20) }
    }
}

#[derive(Default)]
struct ArbiterState {
    active: Option<String>,
    scores: HashMap<String, u32>,
    last_valid: Option<Instant>,
}

/// First-packet-wins device lock with timeout-based failover.
///
/// Both [`offer`](Self::offer) and [`is_active`](Self::is_active) synchronize
/// on one internal mutex, so the arbiter stays correct if device polling is
/// ever parallelized across threads.
pub struct DeviceArbiter {
    config: ArbiterConfig,
    state: Mutex<ArbiterState>,
}

impl Default for DeviceArbiter {
    fn default() -> Self {
        Self::new(ArbiterConfig::default())
    }
}

impl DeviceArbiter {
    pub fn new(config: ArbiterConfig) -> Self {
        Self { config, state: Mutex::new(ArbiterState::default()) }
    }

    /// Credit `device` with one valid packet and report whether it is (now)
    /// the active device.
    ///
    /// Releases a stale lock first when the locked device has been silent
    /// past the timeout. A device other than the lock holder is rejected
    /// without being scored.
    pub fn offer(&self, device: &str) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        if let (Some(active), Some(last_valid)) = (&state.active, state.last_valid)
            && last_valid.elapsed() > self.config.lock_timeout
        {
            info!(device = %active, "releasing device lock after silence timeout");
            state.active = None;
            state.last_valid = None;
            state.scores.clear();
        }

        if let Some(active) = &state.active
            && active != device
        {
            return false;
        }

        let score = state.scores.entry(device.to_string()).or_insert(0);
        *score += 1;

        if *score >= self.config.score_to_lock {
            if state.active.is_none() {
                info!(device, "locked capture device");
                state.active = Some(device.to_string());
            }
            state.last_valid = Some(Instant::now());
            return true;
        }

        debug!(device, score = state.scores[device], "device below lock threshold");
        state.active.is_none()
    }

    /// True when no device holds the lock yet, or `device` is the holder.
    pub fn is_active(&self, device: &str) -> bool {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        match &state.active {
            None => true,
            Some(active) => active == device,
        }
    }

    /// Name of the current lock holder, if any.
    pub fn active_device(&self) -> Option<String> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.active.clone()
    }
}
