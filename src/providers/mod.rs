//! Packet provider implementations.
//!
//! Two mutually exclusive capture sources:
//! - [`relay::RelayProvider`]: one UDP socket receiving pre-filtered
//!   payloads from an external capture agent (always available).
//! - [`live::LiveCaptureProvider`]: multi-device libpcap capture with
//!   device arbitration (behind the `live-capture` feature).

#[cfg(feature = "live-capture")]
pub mod live;
pub mod relay;

#[cfg(feature = "live-capture")]
pub use live::LiveCaptureProvider;
pub use relay::RelayProvider;
