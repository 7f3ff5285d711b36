//! Text log of the traffic between host and surface, one message per line:
//! `Sent: <hex>` for messages sent to the host and `Recv: <hex>` for messages received from it.

use std::{fmt, io::Cursor};

use bytes::Bytes;
use futures::{channel::mpsc, SinkExt, Stream, StreamExt};
use tokio::{fs::File, io::AsyncRead};
use tokio_util::codec::{Decoder, LinesCodec};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    Sent(Bytes),
    Received(Bytes),
}

impl Message {
    pub fn from_string(s: &str) -> Option<Message> {
        let mut split = s.splitn(2, ": ");
        let prefix = split.next()?;
        match prefix {
            "Sent" => Some(Message::Sent(Message::parse_hex(split.next()?)?)),
            "Recv" => Some(Message::Received(Message::parse_hex(split.next()?)?)),
            _ => None,
        }
    }

    fn parse_hex(s: &str) -> Option<Bytes> {
        Some(Bytes::from(hex::decode(s.trim().replace(' ', "")).ok()?))
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Sent(data) => {
                write!(f, "Sent: {}", hex::encode(data))
            }
            Message::Received(data) => {
                write!(f, "Recv: {}", hex::encode(data))
            }
        }
    }
}

/// Appends messages to a text file from a background task
pub struct Recorder {
    tx: mpsc::UnboundedSender<Message>,
}

impl Recorder {
    pub fn new(file: File) -> Self {
        let mut framed = LinesCodec::new().framed(file);
        let (tx, mut rx) = mpsc::unbounded::<Message>();

        tokio::spawn(async move {
            while let Some(msg) = rx.next().await {
                if let Err(e) = framed.send(msg.to_string()).await {
                    log::error!("couldn't write to the traffic log: {}", e);
                    break;
                }
            }
        });

        Recorder { tx }
    }

    pub fn feed_sent(&mut self, msg: &Bytes) {
        let _ = self.tx.unbounded_send(Message::Sent(msg.clone()));
    }

    pub fn feed_recv(&mut self, msg: &Bytes) {
        let _ = self.tx.unbounded_send(Message::Received(msg.clone()));
    }
}

/// Reads back a log, skipping lines that aren't messages
pub fn from_reader<T: AsyncRead + Sized>(reader: T) -> impl Stream<Item = Message> {
    let framed = tokio_util::codec::FramedRead::new(reader, LinesCodec::new());
    framed.filter_map(|x| async { Message::from_string(x.ok()?.as_str()) })
}

pub fn fixtures_reader(data: &'static [u8]) -> impl Stream<Item = Message> {
    let r = Cursor::new(data);
    from_reader(r)
}
