//! Latest-wins stream throttling.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::{Stream, ready};
use pin_project_lite::pin_project;
use tokio::time::{Interval, MissedTickBehavior, interval};

/// Extension trait adding overlay-style pacing to any stream.
pub trait ThrottleExt: Stream {
    /// Emit at most one item per `period`, keeping only the newest item
    /// that arrived during the interval. Intermediate items are discarded,
    /// which is exactly what a position-overlay redraw loop wants.
    fn throttle(self, period: Duration) -> Throttle<Self>
    where
        Self: Sized,
    {
        Throttle::new(self, period)
    }
}

impl<S: Stream> ThrottleExt for S {}

pin_project! {
    /// Stream combinator produced by [`ThrottleExt::throttle`].
    pub struct Throttle<S: Stream> {
        #[pin]
        inner: S,
        ticker: Interval,
        latest: Option<S::Item>,
    }
}

impl<S: Stream> Throttle<S> {
    pub fn new(inner: S, period: Duration) -> Self {
        let mut ticker = interval(period);
        // Skip missed ticks instead of bursting to catch up.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { inner, ticker, latest: None }
    }
}

impl<S: Stream> Stream for Throttle<S> {
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        ready!(this.ticker.poll_tick(cx));

        // Drain whatever accumulated since the last tick; newest wins.
        loop {
            match this.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(item)) => *this.latest = Some(item),
                Poll::Ready(None) => return Poll::Ready(this.latest.take()),
                Poll::Pending => {
                    return match this.latest.take() {
                        Some(item) => Poll::Ready(Some(item)),
                        // Nothing arrived this interval; wait for data
                        // rather than waking every tick with nothing to say.
                        None => Poll::Pending,
                    };
                }
            }
        }
    }
}
