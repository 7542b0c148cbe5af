//! Latest-wins rate limiting for update streams

use futures::{Stream, ready};
use pin_project_lite::pin_project;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::time::{Interval, MissedTickBehavior, interval};

/// Extension trait to add throttling to any Stream
pub trait ThrottleExt: Stream {
    /// Emit at most one item per `period`.
    ///
    /// Items that arrive while waiting replace each other; only the newest is
    /// emitted. A quiet source does not end the stream.
    fn throttle(self, period: Duration) -> Throttle<Self>
    where
        Self: Sized,
    {
        Throttle::new(self, period)
    }
}

impl<T: Stream> ThrottleExt for T {}

pin_project! {
    /// Stream returned by [`ThrottleExt::throttle`].
    pub struct Throttle<S: Stream> {
        #[pin]
        stream: S,
        interval: Interval,
        pending: Option<S::Item>,
        exhausted: bool,
    }
}

impl<S: Stream> Throttle<S> {
    pub fn new(stream: S, period: Duration) -> Self {
        let mut interval = interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Self { stream, interval, pending: None, exhausted: false }
    }
}

impl<S: Stream> Stream for Throttle<S> {
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        if !*this.exhausted {
            loop {
                match this.stream.as_mut().poll_next(cx) {
                    Poll::Ready(Some(item)) => *this.pending = Some(item),
                    Poll::Ready(None) => {
                        *this.exhausted = true;
                        break;
                    }
                    Poll::Pending => break,
                }
            }
        }

        if this.pending.is_none() {
            return if *this.exhausted { Poll::Ready(None) } else { Poll::Pending };
        }

        ready!(this.interval.poll_tick(cx));
        Poll::Ready(this.pending.take())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tokio::sync::mpsc;
    use tokio_stream::wrappers::UnboundedReceiverStream;

    #[tokio::test]
    async fn burst_collapses_to_latest() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut throttled = UnboundedReceiverStream::new(rx).throttle(Duration::from_millis(50));

        tx.send(1).unwrap();
        assert_eq!(throttled.next().await, Some(1));

        for i in 2..=5 {
            tx.send(i).unwrap();
        }
        assert_eq!(throttled.next().await, Some(5));
    }

    #[tokio::test]
    async fn quiet_source_does_not_end_stream() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut throttled = UnboundedReceiverStream::new(rx).throttle(Duration::from_millis(10));

        let waited = tokio::time::timeout(Duration::from_millis(40), throttled.next()).await;
        assert!(waited.is_err(), "a throttled stream should wait for the next item");

        tx.send(7).unwrap();
        assert_eq!(throttled.next().await, Some(7));

        drop(tx);
        assert_eq!(throttled.next().await, None);
    }

    #[tokio::test]
    async fn final_item_is_flushed_before_end() {
        let source = futures::stream::iter([1, 2, 3]);
        let items: Vec<_> = source.throttle(Duration::from_millis(10)).collect().await;
        assert_eq!(items, vec![3]);
    }

    #[tokio::test(start_paused = true)]
    async fn emissions_are_spaced_by_period() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut throttled = UnboundedReceiverStream::new(rx).throttle(Duration::from_millis(100));

        tx.send(1).unwrap();
        throttled.next().await;
        let first = tokio::time::Instant::now();

        tx.send(2).unwrap();
        throttled.next().await;
        assert!(first.elapsed() >= Duration::from_millis(100));
    }
}
