//! Multi-device live capture provider (libpcap/Npcap).
//!
//! The game-facing interface is unknown a priori, so every capturable device
//! is opened and polled round-robin. Packets are classified down to the
//! protocol heuristic per device; classified matches are offered to the
//! [`DeviceArbiter`], and payloads are emitted only while the offering
//! device holds (or nothing holds) the capture lock. Devices that fail to
//! open are skipped; start fails only when none opened.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use pcap::{Active, Capture, Device, Linktype};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::arbiter::DeviceArbiter;
use crate::classify::{Classifier, LinkMode};
use crate::provider::{PacketProvider, PayloadSink, ProviderStatus, RawPacket, StatusCell};
use crate::{Result, SnifferError};

/// Read timeout handed to libpcap, also the upper bound on how stale a
/// cancellation check can get inside the capture library.
const READ_TIMEOUT_MS: i32 = 100;

/// Snap length; full datagrams are needed for decoding, not just headers.
const SNAP_LEN: i32 = 65536;

/// Idle back-off when a full polling round produced no packet.
const IDLE_SLEEP: Duration = Duration::from_millis(25);

/// One successfully opened capture handle.
struct OpenDevice {
    name: Arc<str>,
    capture: Capture<Active>,
    mode: LinkMode,
}

/// Round-robin multi-device capture with arbitration.
pub struct LiveCaptureProvider {
    classifier: Arc<Classifier>,
    arbiter: Arc<DeviceArbiter>,
    cancel: CancellationToken,
    worker: Option<JoinHandle<()>>,
    status: Arc<StatusCell>,
}

impl LiveCaptureProvider {
    pub fn new(classifier: Classifier, arbiter: DeviceArbiter) -> Self {
        Self {
            classifier: Arc::new(classifier),
            arbiter: Arc::new(arbiter),
            cancel: CancellationToken::new(),
            worker: None,
            status: Arc::new(StatusCell::default()),
        }
    }

    /// The arbiter gating packet emission, shared with the polling thread.
    pub fn arbiter(&self) -> Arc<DeviceArbiter> {
        Arc::clone(&self.arbiter)
    }

    /// Build the BPF expression restricting capture to the target ports.
    fn bpf_filter(ports: &[u16]) -> String {
        ports.iter().map(|p| format!("udp port {p}")).collect::<Vec<_>>().join(" or ")
    }

    /// Interfaces that hand over bare IP datagrams skip link-layer parsing.
    fn link_mode(linktype: Linktype) -> LinkMode {
        match linktype {
            Linktype::RAW | Linktype::IPV4 | Linktype::IPV6 => LinkMode::RawIp,
            _ => LinkMode::Ethernet,
        }
    }

    /// Open every enumerable device, skipping failures.
    fn open_devices(&self) -> Result<Vec<OpenDevice>> {
        let devices = Device::list().map_err(|e| {
            SnifferError::capture_failed_with_source(
                "<enumeration>",
                "device list failed",
                e.into(),
            )
        })?;

        let filter = match self.classifier.ports() {
            [] => None,
            ports => Some(Self::bpf_filter(ports)),
        };

        let mut opened = Vec::new();
        for device in devices {
            let name = device.name.clone();
            match Self::open_one(device, filter.as_deref()) {
                Ok(open) => {
                    info!(device = %open.name, mode = ?open.mode, "opened capture device");
                    opened.push(open);
                }
                Err(e) => {
                    warn!(device = %name, error = %e, "skipping capture device");
                }
            }
        }

        if opened.is_empty() {
            return Err(SnifferError::NoDevices);
        }
        Ok(opened)
    }

    fn open_one(device: Device, filter: Option<&str>) -> Result<OpenDevice> {
        let name: Arc<str> = device.name.clone().into();
        let wrap = |e: pcap::Error| {
            SnifferError::capture_failed_with_source(name.as_ref(), "open failed", e.into())
        };

        let capture = Capture::from_device(device)
            .map_err(wrap)?
            .promisc(false)
            .snaplen(SNAP_LEN)
            .timeout(READ_TIMEOUT_MS)
            .open()
            .map_err(wrap)?;
        let mut capture = capture.setnonblock().map_err(wrap)?;

        if let Some(expr) = filter {
            capture.filter(expr, true).map_err(wrap)?;
            debug!(device = %name, filter = expr, "installed capture filter");
        }

        let mode = Self::link_mode(capture.get_datalink());
        Ok(OpenDevice { name, capture, mode })
    }

    fn poll_loop(
        mut devices: Vec<OpenDevice>,
        classifier: Arc<Classifier>,
        arbiter: Arc<DeviceArbiter>,
        sink: PayloadSink,
        cancel: CancellationToken,
        status: Arc<StatusCell>,
    ) {
        status.set(ProviderStatus::Running);
        debug!(devices = devices.len(), "capture polling loop started");

        while !cancel.is_cancelled() {
            let mut dispatched = 0usize;

            for device in &mut devices {
                if !arbiter.is_active(&device.name) {
                    continue;
                }

                let packet = match device.capture.next_packet() {
                    Ok(packet) => packet,
                    Err(pcap::Error::TimeoutExpired) => continue,
                    Err(e) => {
                        trace!(device = %device.name, error = %e, "capture read failed");
                        continue;
                    }
                };

                let Some(classified) = classifier.classify(device.mode, packet.data) else {
                    continue;
                };

                // Offer first, then re-check: the offer itself may have
                // released a stale lock and handed it elsewhere.
                if !arbiter.offer(&device.name) || !arbiter.is_active(&device.name) {
                    continue;
                }

                sink.emit(RawPacket {
                    data: classified.payload.to_vec().into(),
                    device: Arc::clone(&device.name),
                    received_at: std::time::Instant::now(),
                });
                dispatched += 1;
            }

            if dispatched == 0 {
                std::thread::sleep(IDLE_SLEEP);
            }
        }

        // Capture handles close on drop; nothing to flush.
        drop(devices);
        status.set(ProviderStatus::Stopped);
        debug!("capture polling loop exited");
    }
}

impl PacketProvider for LiveCaptureProvider {
    fn start(&mut self, sink: PayloadSink) -> Result<()> {
        if self.status() != ProviderStatus::Stopped {
            return Err(SnifferError::AlreadyRunning);
        }

        let devices = self.open_devices()?;
        info!(devices = devices.len(), "live capture starting");

        self.status.set(ProviderStatus::Starting);
        self.cancel = CancellationToken::new();

        let classifier = Arc::clone(&self.classifier);
        let arbiter = Arc::clone(&self.arbiter);
        let cancel = self.cancel.clone();
        let status = Arc::clone(&self.status);
        self.worker = Some(std::thread::spawn(move || {
            Self::poll_loop(devices, classifier, arbiter, sink, cancel, status);
        }));

        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.cancel.cancel();

        if let Some(worker) = self.worker.take() {
            // Non-blocking reads plus the idle sleep bound the loop latency,
            // so the join completes within tens of milliseconds.
            if worker.join().is_err() {
                warn!("capture polling thread panicked during shutdown");
            }
            info!("live capture stopped");
        }

        self.status.set(ProviderStatus::Stopped);
        Ok(())
    }

    fn status(&self) -> ProviderStatus {
        self.status.get()
    }
}

impl Drop for LiveCaptureProvider {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_expression_joins_ports_with_or() {
        assert_eq!(LiveCaptureProvider::bpf_filter(&[5055]), "udp port 5055");
        assert_eq!(
            LiveCaptureProvider::bpf_filter(&[5055, 5056, 5058]),
            "udp port 5055 or udp port 5056 or udp port 5058"
        );
    }

    #[test]
    fn raw_datalinks_skip_the_link_layer() {
        assert_eq!(LiveCaptureProvider::link_mode(Linktype::RAW), LinkMode::RawIp);
        assert_eq!(LiveCaptureProvider::link_mode(Linktype::IPV4), LinkMode::RawIp);
        assert_eq!(LiveCaptureProvider::link_mode(Linktype::IPV6), LinkMode::RawIp);
        assert_eq!(LiveCaptureProvider::link_mode(Linktype::ETHERNET), LinkMode::Ethernet);
        assert_eq!(LiveCaptureProvider::link_mode(Linktype::NULL), LinkMode::Ethernet);
    }

    #[test]
    fn stop_before_start_is_a_no_op() {
        let mut provider =
            LiveCaptureProvider::new(Classifier::default(), DeviceArbiter::default());
        provider.stop().unwrap();
        assert_eq!(provider.status(), ProviderStatus::Stopped);
    }
}
