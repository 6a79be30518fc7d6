//! Packet provider contract.
//!
//! Providers produce raw protocol payloads from some capture source and push
//! them into a bounded channel through [`PayloadSink`]. Each provider runs
//! its polling loop on a dedicated background thread; `start`/`stop` manage
//! that thread cooperatively. Delivery is best-effort: when the pipeline
//! falls behind, payloads are dropped at the sink rather than blocking the
//! capture loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::trace;

use crate::Result;

/// One raw payload as it left the capture source.
#[derive(Debug, Clone)]
pub struct RawPacket {
    /// Protocol payload bytes (UDP payload, link/IP headers already
    /// stripped).
    pub data: Arc<[u8]>,

    /// Identifier of the capture source that produced this payload.
    pub device: Arc<str>,

    /// Arrival timestamp, taken when the payload was pulled off the wire.
    pub received_at: Instant,
}

impl RawPacket {
    pub fn new(data: impl Into<Arc<[u8]>>, device: impl Into<Arc<str>>) -> Self {
        Self { data: data.into(), device: device.into(), received_at: Instant::now() }
    }
}

/// Lifecycle state of a provider.
///
/// `Starting` covers the window between a successful `start()` call and the
/// polling thread entering its loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderStatus {
    Stopped,
    Starting,
    Running,
}

/// Shared, atomically updated [`ProviderStatus`] cell.
///
/// Written by both the controlling thread (`start`/`stop`) and the polling
/// thread (loop entry/exit).
#[derive(Debug, Default)]
pub struct StatusCell(AtomicU8);

impl StatusCell {
    const STOPPED: u8 = 0;
    const STARTING: u8 = 1;
    const RUNNING: u8 = 2;

    pub fn set(&self, status: ProviderStatus) {
        let raw = match status {
            ProviderStatus::Stopped => Self::STOPPED,
            ProviderStatus::Starting => Self::STARTING,
            ProviderStatus::Running => Self::RUNNING,
        };
        self.0.store(raw, Ordering::SeqCst);
    }

    pub fn get(&self) -> ProviderStatus {
        match self.0.load(Ordering::SeqCst) {
            Self::STARTING => ProviderStatus::Starting,
            Self::RUNNING => ProviderStatus::Running,
            _ => ProviderStatus::Stopped,
        }
    }
}

/// Sending half of the raw-payload channel handed to providers.
///
/// Cloneable; uses `try_send` so capture threads never block on a slow
/// consumer. Drops are counted at trace level only, matching the
/// best-effort delivery model.
#[derive(Clone)]
pub struct PayloadSink {
    tx: mpsc::Sender<RawPacket>,
}

impl PayloadSink {
    /// Default capacity of the payload channel created by [`Self::channel`].
    pub const DEFAULT_CAPACITY: usize = 1024;

    pub fn new(tx: mpsc::Sender<RawPacket>) -> Self {
        Self { tx }
    }

    /// Create a bounded payload channel and its sink.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<RawPacket>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    /// Push one payload; returns false when it was dropped (channel full)
    /// or the pipeline has shut down (channel closed).
    pub fn emit(&self, packet: RawPacket) -> bool {
        match self.tx.try_send(packet) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(packet)) => {
                trace!(device = %packet.device, "payload channel full, dropping packet");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// True when the receiving side is gone.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// A source of raw protocol payloads.
///
/// Implementations spawn their polling loop on a background thread in
/// `start` and shut it down cooperatively in `stop`. `stop` must be
/// idempotent and must release all OS resources, tolerating handles that are
/// already closed.
pub trait PacketProvider: Send {
    /// Begin producing payloads into `sink`.
    fn start(&mut self, sink: PayloadSink) -> Result<()>;

    /// Stop producing and release capture resources. Safe to call when
    /// already stopped.
    fn stop(&mut self) -> Result<()>;

    /// Current lifecycle state.
    fn status(&self) -> ProviderStatus;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_cell_round_trips() {
        let cell = StatusCell::default();
        assert_eq!(cell.get(), ProviderStatus::Stopped);

        cell.set(ProviderStatus::Starting);
        assert_eq!(cell.get(), ProviderStatus::Starting);

        cell.set(ProviderStatus::Running);
        assert_eq!(cell.get(), ProviderStatus::Running);

        cell.set(ProviderStatus::Stopped);
        assert_eq!(cell.get(), ProviderStatus::Stopped);
    }

    #[tokio::test]
    async fn sink_delivers_and_drops_on_overflow() {
        let (sink, mut rx) = PayloadSink::channel(2);

        assert!(sink.emit(RawPacket::new(vec![1], "a")));
        assert!(sink.emit(RawPacket::new(vec![2], "a")));
        // Capacity reached: best-effort drop, no blocking.
        assert!(!sink.emit(RawPacket::new(vec![3], "a")));

        assert_eq!(rx.recv().await.unwrap().data.as_ref(), &[1]);
        assert_eq!(rx.recv().await.unwrap().data.as_ref(), &[2]);
    }

    #[tokio::test]
    async fn sink_reports_closed_pipeline() {
        let (sink, rx) = PayloadSink::channel(2);
        drop(rx);

        assert!(sink.is_closed());
        assert!(!sink.emit(RawPacket::new(vec![1], "a")));
    }
}
