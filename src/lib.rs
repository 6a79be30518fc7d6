//! Capture, classify and decode Photon-style UDP game traffic.
//!
//! Photonwire turns raw network traffic into typed domain events: a packet
//! provider (live capture or a UDP relay feed) produces candidate payloads,
//! a classifier picks out datagrams of the target protocol, and the decode
//! pipeline resolves them into frames and dispatches events to subscribers.
//!
//! # Features
//!
//! - **Live Capture**: Multi-device libpcap sniffing with automatic device
//!   lock-in, behind the `live-capture` feature
//! - **Relay Feed**: A plain UDP listener for payloads forwarded by an
//!   external capture agent
//! - **Typed Events**: Opcode-keyed parser registry decoding movement,
//!   character and cluster events out of raw parameter maps
//! - **Streams**: A broadcast tap with async stream adapters and a
//!   latest-wins throttle for render loops
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use photonwire::{CaptureConfig, CaptureMode, Dispatcher, Engine, FrameKind, builtin_registry};
//! # use photonwire::{CodecMessage, WireCodec};
//! # struct SessionCodec;
//! # impl WireCodec for SessionCodec {
//! #     fn parse(&mut self, _: &[u8], _: &mut dyn FnMut(CodecMessage)) -> photonwire::Result<()> { Ok(()) }
//! # }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut dispatcher = Dispatcher::new(builtin_registry()?);
//!     dispatcher.register(FrameKind::Event, Some(&[photonwire::events::codes::MOVE]), |event| {
//!         println!("move: {:?}", event.payload);
//!         Ok(())
//!     });
//!
//!     let config = CaptureConfig { mode: CaptureMode::Remote, ..Default::default() };
//!     let mut engine = Engine::spawn(&config, SessionCodec, dispatcher)?;
//!
//!     let mut events = engine.subscribe();
//!     while let Ok(event) = events.recv().await {
//!         println!("{:?}", event.kind);
//!     }
//!     engine.stop()?;
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod error;

// Packet acquisition
pub mod arbiter;
pub mod classify;
pub mod provider;
pub mod providers;

// Decode and dispatch pipeline
pub mod decode;
pub mod dispatch;
pub mod events;

// Assembly and consumption
pub mod config;
mod engine;
pub mod stream;

// Core exports
pub use config::{CaptureConfig, CaptureMode};
pub use engine::Engine;
pub use error::{Result, SnifferError};

// Pipeline exports
pub use decode::{CodecMessage, Frame, FrameKind, Parameters, ProtocolDecoder, Value, WireCodec};
pub use dispatch::{Dispatcher, HandlerId, ParserRegistry};
pub use events::{DomainEvent, EventPayload, builtin_registry};

// Provider exports
pub use provider::{PacketProvider, PayloadSink, ProviderStatus, RawPacket};
pub use providers::RelayProvider;

#[cfg(feature = "live-capture")]
pub use providers::LiveCaptureProvider;
