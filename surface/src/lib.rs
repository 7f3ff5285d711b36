//! Logic Control / Mackie Control surface emulator
//!
//! Connects the [`lc_protocol`] core to a host through a byte-oriented transport, keeps the
//! surface state in memory and renders it as text.
//!
//! ```no_run
//! use midibox_lc::{transport::{net, IntoTransport}, Emulator};
//! use midibox_lc::lc_protocol::CoreConfig;
//!
//! # async fn run() -> Result<(), midibox_lc::LcError> {
//! let transport = net::connect("localhost:5004").await?.into_transport();
//! let (emulator, outgoing) = Emulator::new(CoreConfig::default());
//! emulator.run(transport, outgoing).await
//! # }
//! ```

pub use lc_protocol;

pub mod config;
pub use config::Config;

pub mod display;
pub use display::Snapshot;

pub mod emulator;
pub use emulator::{ChannelTx, Emulator};

pub mod input;
pub use input::InputEvent;

pub mod logging;

pub mod transport;
pub use transport::{IntoTransport, LcError, Transport};

pub mod utils;
