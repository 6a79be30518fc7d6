//! Stream-based event consumption.
//!
//! Callback handlers on the [`Dispatcher`](crate::dispatch::Dispatcher) run
//! on the capture path and must stay cheap. Consumers that want to do real
//! work (the overlay renderer, recorders) subscribe to the broadcast tap
//! instead and read events as an async [`Stream`], optionally paced with
//! [`ThrottleExt::throttle`] so a redraw loop sees at most one event per
//! interval with latest-wins semantics.

mod throttle;

pub use throttle::{Throttle, ThrottleExt};

use futures::Stream;
use tokio::sync::broadcast;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

use crate::events::DomainEvent;

/// Adapt a broadcast receiver into a stream of events.
///
/// Lag errors (the subscriber fell more than the tap capacity behind) are
/// swallowed: the stream simply resumes at the oldest retained event, which
/// is the right behavior for best-effort overlay feeds.
pub fn event_stream(
    rx: broadcast::Receiver<DomainEvent>,
) -> impl Stream<Item = DomainEvent> + Send + 'static {
    BroadcastStream::new(rx).filter_map(|result| result.ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{Frame, FrameKind, Parameters};
    use crate::dispatch::Dispatcher;
    use crate::events::builtin_registry;

    #[tokio::test]
    async fn stream_yields_dispatched_events() {
        let dispatcher = Dispatcher::new(builtin_registry().unwrap());
        let mut stream = Box::pin(event_stream(dispatcher.tap()));

        dispatcher.dispatch(Frame::new(FrameKind::Event, 3, Parameters::new()));
        dispatcher.dispatch(Frame::new(FrameKind::Event, 29, Parameters::new()));

        assert_eq!(stream.next().await.unwrap().code, 3);
        assert_eq!(stream.next().await.unwrap().code, 29);
    }
}
