use futures::{Sink, Stream};

/// Implemented for anything that is both a Stream and a Sink, so that it can be boxed as one
pub trait StreamSink<'a, StreamItem, SinkItem, SinkError>:
    Stream<Item = StreamItem> + Sink<SinkItem, Error = SinkError> + 'a
{
}

impl<'a, T, StreamItem, SinkItem, SinkError> StreamSink<'a, StreamItem, SinkItem, SinkError> for T
where
    T: Stream<Item = StreamItem> + 'a,
    T: Sink<SinkItem, Error = SinkError> + 'a,
{
}

#[cfg(test)]
mod test {
    use bytes::Bytes;
    use futures::channel::mpsc;

    use super::StreamSink;
    use crate::utils::Combine;

    #[test]
    fn boxed_channel_pair() {
        let (tx, _) = mpsc::unbounded::<Bytes>();
        let (_, rx) = mpsc::unbounded::<Bytes>();
        let pair = Combine::new(rx, tx);
        let _: Box<dyn StreamSink<Bytes, Bytes, mpsc::SendError>> = Box::new(pair);
    }
}
