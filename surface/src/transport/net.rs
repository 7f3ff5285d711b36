//! TCP transport, for hosts reachable through a network MIDI bridge
use futures::{SinkExt, TryStreamExt};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::{TcpListener, TcpStream},
};
use tokio_util::codec::Framed;

use super::{IntoTransport, LcError, MidiCodec, Transport};

/// Default port used when an address doesn't specify one
pub const DEFAULT_PORT: u16 = 5004;

pub struct StreamTransport<T>
where
    T: AsyncRead + AsyncWrite + Send + 'static,
{
    framed: Framed<T, MidiCodec>,
}

impl<T> StreamTransport<T>
where
    T: AsyncRead + AsyncWrite + Send + 'static,
{
    pub fn new(stream: T) -> StreamTransport<T> {
        StreamTransport {
            framed: Framed::new(stream, MidiCodec::new()),
        }
    }

    pub fn into_inner(self) -> Framed<T, MidiCodec> {
        self.framed
    }
}

impl<T> IntoTransport for StreamTransport<T>
where
    T: AsyncRead + AsyncWrite + Send + 'static,
{
    fn into_transport(self) -> Transport {
        Box::pin(self.into_inner().sink_err_into().err_into())
    }
}

fn with_default_port(addr: &str) -> String {
    if addr.contains(':') {
        addr.to_string()
    } else {
        format!("{addr}:{DEFAULT_PORT}")
    }
}

pub async fn connect(addr: &str) -> Result<StreamTransport<TcpStream>, LcError> {
    let addr = with_default_port(addr);
    let stream = TcpStream::connect(&addr).await?;
    log::info!("Connected to {}", addr);
    Ok(StreamTransport::new(stream))
}

/// Waits for a single bridge connection on the given address
pub async fn accept(bind_address: &str) -> Result<StreamTransport<TcpStream>, LcError> {
    let bind_address = with_default_port(bind_address);
    let listener = TcpListener::bind(&bind_address).await?;
    log::info!("Listening on {}", &bind_address);

    let (stream, addr) = listener.accept().await?;
    log::info!("[{:?}] New connection", addr);
    Ok(StreamTransport::new(stream))
}
