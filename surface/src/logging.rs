use std::path::PathBuf;

use bytes::Bytes;
use futures::{channel::mpsc, StreamExt};
use termcolor::{ColorChoice, StandardStream};

use crate::{
    transport::Transport,
    utils::{decoder::Decoder, recorder::Recorder, Logger, Traffic},
};

/// Destinations for a copy of the traffic
struct Taps {
    decoder: Option<Decoder>,
    recorder: Option<Recorder>,
}

impl Taps {
    async fn open(verbose: u8, log: Option<PathBuf>) -> std::io::Result<Self> {
        let decoder = (verbose > 0).then(|| {
            let writer = StandardStream::stderr(ColorChoice::Auto);
            Decoder::new(Box::new(writer), verbose == 1)
        });

        let recorder = match log {
            Some(filename) => Some(Recorder::new(tokio::fs::File::create(filename).await?)),
            None => None,
        };

        Ok(Taps { decoder, recorder })
    }

    fn feed(&mut self, msg: &Traffic<Bytes>) {
        match msg {
            Traffic::Sent(msg) => {
                if let Some(decoder) = self.decoder.as_mut() {
                    decoder.feed_sent(msg);
                }
                if let Some(recorder) = self.recorder.as_mut() {
                    recorder.feed_sent(msg);
                }
            }
            Traffic::Received(msg) => {
                if let Some(decoder) = self.decoder.as_mut() {
                    decoder.feed_recv(msg);
                }
                if let Some(recorder) = self.recorder.as_mut() {
                    recorder.feed_recv(msg);
                }
            }
        }
    }
}

/// Taps a transport so that its traffic is printed to stderr (`verbose` > 0) and/or recorded
/// to a `log` file which `replay` can read back.
pub fn transport_logging(transport: Transport, verbose: u8, log: Option<PathBuf>) -> Transport {
    if verbose == 0 && log.is_none() {
        return transport;
    }

    let (log_tx, mut log_rx) = mpsc::unbounded::<Traffic<Bytes>>();
    let transport = Logger::new(transport, log_tx);

    tokio::spawn(async move {
        let mut taps = match Taps::open(verbose, log).await {
            Ok(taps) => taps,
            Err(e) => {
                log::error!("transport logging exiting: {}", e);
                return;
            }
        };

        while let Some(msg) = log_rx.next().await {
            taps.feed(&msg);
        }
    });

    Box::pin(transport)
}
