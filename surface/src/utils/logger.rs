//! Transport tap copying every message that goes through it to a channel

use std::{
    pin::Pin,
    task::{Context, Poll},
};

use futures::{channel::mpsc, ready, Sink, Stream};
use pin_project::pin_project;

/// A message seen by a [`Logger`], from the surface's point of view
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Traffic<M> {
    Sent(M),
    Received(M),
}

/// Stream and sink passing through to `inner`. Copies stop once the receiving end of the tap
/// is dropped.
#[pin_project]
pub struct Logger<T, M> {
    #[pin]
    inner: T,
    tap: mpsc::UnboundedSender<Traffic<M>>,
}

impl<T, M> Logger<T, M> {
    pub fn new(inner: T, tap: mpsc::UnboundedSender<Traffic<M>>) -> Self {
        Logger { inner, tap }
    }
}

fn copy<M>(tap: &mpsc::UnboundedSender<Traffic<M>>, msg: impl FnOnce() -> Traffic<M>) {
    if !tap.is_closed() {
        let _ = tap.unbounded_send(msg());
    }
}

impl<T, M, E> Stream for Logger<T, M>
where
    T: Stream<Item = Result<M, E>>,
    M: Clone,
{
    type Item = Result<M, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        let msg = ready!(this.inner.poll_next(cx));
        if let Some(Ok(msg)) = &msg {
            copy(this.tap, || Traffic::Received(msg.clone()));
        }
        Poll::Ready(msg)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T, M> Sink<M> for Logger<T, M>
where
    T: Sink<M>,
    M: Clone,
{
    type Error = T::Error;

    fn poll_ready(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.project().inner.poll_ready(cx)
    }

    fn start_send(self: Pin<&mut Self>, msg: M) -> Result<(), Self::Error> {
        let this = self.project();
        copy(this.tap, || Traffic::Sent(msg.clone()));
        this.inner.start_send(msg)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.project().inner.poll_flush(cx)
    }

    fn poll_close(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.project().inner.poll_close(cx)
    }
}

#[cfg(test)]
mod test {
    use bytes::Bytes;
    use futures::{SinkExt, StreamExt};

    use super::*;
    use crate::utils::Combine;

    #[tokio::test]
    async fn taps_both_directions() {
        let (host_tx, rx) = mpsc::unbounded::<Result<Bytes, mpsc::SendError>>();
        let (tx, mut host_rx) = mpsc::unbounded::<Bytes>();
        let (tap, mut log_rx) = mpsc::unbounded();

        let mut transport = Logger::new(Combine::new(rx, tx), tap);

        host_tx
            .unbounded_send(Ok(Bytes::from_static(&[0x90, 0x10, 0x7F])))
            .unwrap();
        let received = transport.next().await.unwrap().unwrap();
        transport
            .send(Bytes::from_static(&[0xB0, 0x3C, 0x01]))
            .await
            .unwrap();

        assert_eq!(host_rx.next().await.unwrap().as_ref(), &[0xB0, 0x3C, 0x01]);
        assert_eq!(log_rx.next().await, Some(Traffic::Received(received)));
        assert_eq!(
            log_rx.next().await,
            Some(Traffic::Sent(Bytes::from_static(&[0xB0, 0x3C, 0x01])))
        );
    }

    #[tokio::test]
    async fn dropped_tap() {
        let (tx, mut host_rx) = mpsc::unbounded::<Bytes>();
        let (_, rx) = mpsc::unbounded::<Result<Bytes, mpsc::SendError>>();
        let (tap, log_rx) = mpsc::unbounded();
        drop(log_rx);

        let mut transport = Logger::new(Combine::new(rx, tx), tap);
        transport.send(Bytes::from_static(&[0xF8])).await.unwrap();
        assert_eq!(host_rx.next().await.unwrap().as_ref(), &[0xF8]);
    }
}
