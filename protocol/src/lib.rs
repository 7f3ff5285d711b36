#![cfg_attr(not(feature = "std"), no_std)]

//! Logic Control / Mackie Control protocol core.
//!
//! This crate turns the byte stream received from a DAW into updates of a control surface,
//! and local surface input into messages for the DAW.
//!
//! It is meant to be as lean as possible in order to run in restricted environments.
//! For this reason, it doesn't include any transport implementations: MIDI messages are
//! handed to the core already split, and outgoing messages go to a [`Transmit`].

extern crate alloc;

mod util;
pub use util::{TryBuf, TryBufError};

pub mod channel;
pub use channel::{ChannelMessage, MessageError};

pub mod commands;
pub use commands::{Command, Responses};

pub mod decoder;
pub use decoder::{Action, DecodeError};

pub mod encoder;
pub use encoder::InputError;

pub mod identity;
pub use identity::{DeviceIdMode, DeviceIdentity};

pub mod packet;
pub use packet::{EncodeError, ParseError};

pub mod state;
pub use state::SurfaceState;

pub mod surface;
pub use surface::{Surface, Transmit};

pub mod sysex;
pub use sysex::{FrameEvent, SysexParser};

/// Options fixed at startup
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoreConfig {
    pub device_id: DeviceIdMode,

    /// Serial number reported to the host
    pub serial: [u8; 8],

    /// Challenge bytes sent along with the serial number in a query reply
    pub id_string: [u8; 4],

    /// Fader index receiving pitch bend messages sent on channel 0
    pub master_fader: Option<u8>,

    /// Drop fader moves while the fader isn't touched
    pub touch_suppression: bool,

    /// Route V-Pot deltas to [`Surface::gpc_vpot_delta`] instead of the host
    pub gpc_mode: bool,

    /// Abandon a command after this many data bytes without a terminator
    pub max_command_len: Option<usize>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            device_id: DeviceIdMode::default(),
            serial: *b"12345678",
            id_string: *b"ABCD",
            master_fader: None,
            touch_suppression: false,
            gpc_mode: false,
            max_command_len: None,
        }
    }
}

/// Protocol state for a single surface: its identity and the SysEx parser.
///
/// The surface itself and the outgoing message sink are passed to each call, so that the
/// caller decides how they are shared.
#[derive(Clone, Debug)]
pub struct ProtocolCore {
    config: CoreConfig,
    identity: DeviceIdentity,
    parser: SysexParser,
}

impl ProtocolCore {
    pub fn new(config: CoreConfig) -> Self {
        Self {
            identity: DeviceIdentity::new(config.device_id),
            parser: SysexParser::new(),
            config,
        }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    pub fn parser(&self) -> &SysexParser {
        &self.parser
    }

    /// Feeds a single byte of the incoming stream to the SysEx parser.
    ///
    /// Responses to host queries are framed with the resolved device id and sent to `tx`.
    /// Bytes yielding [`FrameEvent::ForwardToChannelHandler`] are not part of a frame for
    /// this device and should be handled by the caller.
    pub fn feed_byte<S, T>(&mut self, byte: u8, surface: &mut S, tx: &mut T) -> FrameEvent
    where
        S: Surface + ?Sized,
        T: Transmit + ?Sized,
    {
        let fed = self
            .parser
            .feed_byte(byte, &mut self.identity, &self.config, surface);

        if let Some(response) = fed.response {
            self.respond(&response, tx);
        }

        fed.event
    }

    /// Feeds a complete SysEx message, returning the event caused by its last byte
    pub fn feed_sysex<S, T>(&mut self, data: &[u8], surface: &mut S, tx: &mut T) -> FrameEvent
    where
        S: Surface + ?Sized,
        T: Transmit + ?Sized,
    {
        let mut event = FrameEvent::ForwardToChannelHandler;
        for &b in data {
            event = self.feed_byte(b, surface, tx);
        }
        event
    }

    fn respond<T: Transmit + ?Sized>(&self, response: &Responses, tx: &mut T) {
        let id = match self.identity.resolved() {
            Some(id) => id,
            None => {
                log::error!("no device id to answer with, dropping {:?}", response);
                return;
            }
        };

        match packet::frame(id, response.to_bytes()) {
            Ok(frame) => {
                log::debug!("responding with {:?}", response);
                tx.transmit(frame);
            }
            Err(e) => log::error!("couldn't frame {:?}: {:?}", response, e),
        }
    }

    /// Applies a channel voice message received from the host
    pub fn on_midi<S: Surface + ?Sized>(
        &self,
        msg: &ChannelMessage,
        surface: &mut S,
    ) -> Result<Action, DecodeError> {
        decoder::decode(&self.config, msg, surface)
    }

    pub fn send_vpot_delta<S, T>(&self, index: u8, increment: i32, surface: &mut S, tx: &mut T)
    where
        S: Surface + ?Sized,
        T: Transmit + ?Sized,
    {
        encoder::send_vpot_delta(&self.config, index, increment, surface, tx)
    }

    pub fn send_jogwheel_delta<T: Transmit + ?Sized>(&self, increment: i32, tx: &mut T) {
        encoder::send_jogwheel_delta(increment, tx)
    }

    pub fn send_fader_delta<S, T>(
        &self,
        index: u8,
        increment: i32,
        surface: &mut S,
        tx: &mut T,
    ) -> Result<bool, InputError>
    where
        S: Surface + ?Sized,
        T: Transmit + ?Sized,
    {
        encoder::send_fader_delta(&self.config, index, increment, surface, tx)
    }

    pub fn fader_event<S, T>(
        &self,
        index: u8,
        position: u16,
        surface: &mut S,
        tx: &mut T,
    ) -> Result<bool, InputError>
    where
        S: Surface + ?Sized,
        T: Transmit + ?Sized,
    {
        encoder::fader_event(&self.config, index, position, surface, tx)
    }

    pub fn send_button<T: Transmit + ?Sized>(&self, id: u8, pressed: bool, tx: &mut T) {
        encoder::send_button(id, pressed, tx)
    }

    pub fn send_fader_touch<S, T>(
        &self,
        index: u8,
        touched: bool,
        surface: &mut S,
        tx: &mut T,
    ) -> Result<(), InputError>
    where
        S: Surface + ?Sized,
        T: Transmit + ?Sized,
    {
        encoder::send_fader_touch(index, touched, surface, tx)
    }

    /// Abandons any partially received frame
    pub fn reset_parser(&mut self) {
        self.parser.reset();
    }

    /// Forgets the latched device id along with any partial frame
    pub fn hard_reset(&mut self) {
        log::info!("hard reset");
        self.identity.hard_reset();
        self.parser.reset();
    }
}
