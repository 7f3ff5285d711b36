//! Transport base types for talking to a host

use std::pin::Pin;

use bytes::Bytes;
use thiserror::Error;

use crate::utils::StreamSink;

pub mod codec;
pub use codec::MidiCodec;

pub mod net;

/// A bidirectional stream of complete MIDI messages
pub type Transport = Pin<Box<dyn StreamSink<'static, Result<Bytes, LcError>, Bytes, LcError> + Send>>;

#[derive(Error, Debug)]
pub enum LcError {
    #[error("IO error: {0}")]
    IOError(#[from] std::io::Error),

    #[error("A malformed message was received: {0}")]
    MalformedMessage(#[from] lc_protocol::MessageError),

    #[error("Local input error: {0}")]
    InputError(#[from] lc_protocol::InputError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Transport has closed")]
    TransportClosed,

    #[error("Internal error")]
    InternalError(#[from] anyhow::Error),
}

pub trait IntoTransport {
    fn into_transport(self) -> Transport;
}
