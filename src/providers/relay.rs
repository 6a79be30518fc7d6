//! Relay-socket packet provider.
//!
//! Receives protocol payloads forwarded verbatim over UDP by an external
//! capture agent (typically running on a router or another machine). The
//! agent has already classified the traffic, so every datagram goes straight
//! to the sink with no further filtering and no device arbitration.

use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::provider::{PacketProvider, PayloadSink, ProviderStatus, RawPacket, StatusCell};
use crate::{Result, SnifferError};

/// Default port the relay agent forwards to.
pub const DEFAULT_RELAY_PORT: u16 = 44444;

/// Receive timeout; bounds how long `stop` can lag behind the stop request.
const RECV_TIMEOUT: Duration = Duration::from_secs(1);

/// Largest datagram the relay socket will accept.
const MAX_DATAGRAM: usize = 65536;

/// Source identifier attached to relayed payloads.
const RELAY_DEVICE: &str = "relay";

/// UDP socket provider for relay-forwarded payloads.
pub struct RelayProvider {
    bind_addr: SocketAddr,
    local_addr: Option<SocketAddr>,
    cancel: CancellationToken,
    worker: Option<JoinHandle<()>>,
    status: Arc<StatusCell>,
}

impl RelayProvider {
    /// Create a provider that will bind `bind_addr` on start.
    ///
    /// Port 0 requests an ephemeral port; the effective address is available
    /// from [`local_addr`](Self::local_addr) once started.
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            local_addr: None,
            cancel: CancellationToken::new(),
            worker: None,
            status: Arc::new(StatusCell::default()),
        }
    }

    /// The address the socket is actually bound to, once running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    fn recv_loop(
        socket: UdpSocket,
        sink: PayloadSink,
        cancel: CancellationToken,
        status: Arc<StatusCell>,
    ) {
        status.set(ProviderStatus::Running);
        debug!("relay receive loop started");
        let mut buf = vec![0u8; MAX_DATAGRAM];

        while !cancel.is_cancelled() {
            match socket.recv_from(&mut buf) {
                Ok((len, _peer)) => {
                    if len == 0 {
                        continue;
                    }
                    // The relay agent pre-filters; forward verbatim.
                    sink.emit(RawPacket::new(buf[..len].to_vec(), RELAY_DEVICE));
                }
                Err(e)
                    if matches!(
                        e.kind(),
                        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                    ) =>
                {
                    continue;
                }
                Err(e) => {
                    if !cancel.is_cancelled() {
                        warn!(error = %e, "relay socket receive failed");
                    }
                }
            }
        }

        status.set(ProviderStatus::Stopped);
        debug!("relay receive loop exited");
    }
}

impl PacketProvider for RelayProvider {
    fn start(&mut self, sink: PayloadSink) -> Result<()> {
        if self.status() != ProviderStatus::Stopped {
            return Err(SnifferError::AlreadyRunning);
        }

        let socket = UdpSocket::bind(self.bind_addr)
            .map_err(|e| SnifferError::socket_error(self.bind_addr, e))?;
        socket
            .set_read_timeout(Some(RECV_TIMEOUT))
            .map_err(|e| SnifferError::socket_error(self.bind_addr, e))?;

        let local_addr =
            socket.local_addr().map_err(|e| SnifferError::socket_error(self.bind_addr, e))?;
        self.local_addr = Some(local_addr);

        self.status.set(ProviderStatus::Starting);
        self.cancel = CancellationToken::new();

        let cancel = self.cancel.clone();
        let status = Arc::clone(&self.status);
        self.worker = Some(std::thread::spawn(move || {
            Self::recv_loop(socket, sink, cancel, status);
        }));

        info!(%local_addr, "relay provider listening");
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.cancel.cancel();

        if let Some(worker) = self.worker.take() {
            // The loop observes cancellation within the receive timeout.
            if worker.join().is_err() {
                warn!("relay receive thread panicked during shutdown");
            }
            info!("relay provider stopped");
        }

        self.status.set(ProviderStatus::Stopped);
        self.local_addr = None;
        Ok(())
    }

    fn status(&self) -> ProviderStatus {
        self.status.get()
    }
}

impl Drop for RelayProvider {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
