//! Engine wires a packet provider into the decode and dispatch pipeline.
//!
//! [`Engine::spawn`] builds the provider named by the configuration, starts
//! it, and runs a decode task that drains the provider channel, turns each
//! payload into frames, and feeds them through the dispatcher. Handlers must
//! be registered on the [`Dispatcher`] before spawning; late subscribers use
//! the broadcast tap via [`Engine::subscribe`].

use futures::Stream;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::config::{CaptureConfig, CaptureMode};
use crate::decode::{ProtocolDecoder, WireCodec};
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::events::DomainEvent;
use crate::provider::{PacketProvider, PayloadSink, ProviderStatus, RawPacket};
use crate::providers::RelayProvider;
use crate::stream::event_stream;

/// A running capture pipeline: one provider plus one decode task.
pub struct Engine {
    provider: Box<dyn PacketProvider>,
    events: broadcast::Sender<DomainEvent>,
    cancel: CancellationToken,
}

impl Engine {
    /// Build and start the provider selected by `config`, then spawn the
    /// decode task on the current tokio runtime.
    ///
    /// The dispatcher moves into the decode task, so all handler
    /// registration happens before this call. Returns an error if the
    /// provider cannot start, or if `config` asks for local capture and the
    /// crate was built without the `live-capture` feature.
    pub fn spawn<C>(config: &CaptureConfig, codec: C, dispatcher: Dispatcher) -> Result<Self>
    where
        C: WireCodec + 'static,
    {
        let mut provider = build_provider(config)?;
        let (sink, rx) = PayloadSink::channel(PayloadSink::DEFAULT_CAPACITY);
        provider.start(sink)?;

        let events = dispatcher.tap_sender();
        let cancel = CancellationToken::new();
        let cancel_task = cancel.clone();
        let decoder = ProtocolDecoder::new(codec);
        tokio::spawn(async move {
            decode_task(rx, decoder, dispatcher, cancel_task).await;
        });

        info!(mode = ?config.mode, "engine started");
        Ok(Self { provider, events, cancel })
    }

    /// Subscribe a broadcast receiver to the dispatched event tap.
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.events.subscribe()
    }

    /// Stream view over the event tap. Slow consumers skip lagged events
    /// rather than stalling the pipeline.
    pub fn events(&self) -> impl Stream<Item = DomainEvent> + Send + use<> {
        event_stream(self.subscribe())
    }

    pub fn status(&self) -> ProviderStatus {
        self.provider.status()
    }

    /// Stop the decode task and the provider. Idempotent.
    pub fn stop(&mut self) -> Result<()> {
        self.cancel.cancel();
        self.provider.stop()
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn build_provider(config: &CaptureConfig) -> Result<Box<dyn PacketProvider>> {
    match config.mode {
        CaptureMode::Remote => Ok(Box::new(RelayProvider::new(config.relay_addr()))),
        #[cfg(feature = "live-capture")]
        CaptureMode::Local => {
            let classifier = crate::classify::Classifier::new(config.target_ports.clone());
            let arbiter = crate::arbiter::DeviceArbiter::new(config.arbiter_config());
            Ok(Box::new(crate::providers::LiveCaptureProvider::new(classifier, arbiter)))
        }
        #[cfg(not(feature = "live-capture"))]
        CaptureMode::Local => Err(crate::error::SnifferError::feature_disabled(
            "local capture",
            "live-capture",
        )),
    }
}

/// Decode task: drains raw payloads, decodes frames, dispatches events.
///
/// Undecodable payloads are logged and skipped; the task ends when the
/// provider channel closes or the engine is stopped.
async fn decode_task<C>(
    mut rx: mpsc::Receiver<RawPacket>,
    mut decoder: ProtocolDecoder<C>,
    dispatcher: Dispatcher,
    cancel: CancellationToken,
) where
    C: WireCodec,
{
    info!("decode task started");
    let mut packet_count = 0u64;
    let mut codec_errors = 0u64;

    loop {
        let packet = tokio::select! {
            _ = cancel.cancelled() => {
                info!("decode task cancelled");
                break;
            }
            packet = rx.recv() => match packet {
                Some(packet) => packet,
                None => {
                    info!("provider channel closed");
                    break;
                }
            },
        };

        packet_count += 1;
        trace!(device = %packet.device, len = packet.data.len(), "decoding payload");

        if let Err(e) = decoder.decode(&packet.data, &mut |frame| {
            dispatcher.dispatch(frame);
        }) {
            codec_errors += 1;
            debug!(device = %packet.device, error = %e, "undecodable payload skipped");
        }
    }

    info!(packets = packet_count, codec_errors, "decode task ended");
}
