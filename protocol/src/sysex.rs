//! Byte-oriented SysEx frame matcher and command dispatcher
//!
//! Bytes are fed one at a time. The parser first matches the manufacturer header and the
//! device id, then routes every following data byte to the active command [`Handler`]
//! until the terminator is seen. Any violation silently returns the parser to its
//! initial state; hosts routinely interleave SysEx meant for other devices.

use crate::{
    commands::{Command, Handler, Phase, Responses},
    identity::DeviceIdentity,
    packet::{EOX, HEADER},
    surface::Surface,
    CoreConfig,
};

/// Outcome of feeding a single byte
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FrameEvent {
    /// The byte extended a partial header match
    Matching,

    /// The byte was the device id and completed the frame header
    Framed,

    /// The byte was consumed by the active command
    Command,

    /// The terminator ended the active command
    Completed,

    /// The byte violated the expected framing; the parser was reset
    Rejected,

    /// The byte isn't part of a frame addressed to this device
    ForwardToChannelHandler,
}

/// Live parse state
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SysexParser {
    /// Bytes of the header matched so far, [`HEADER`] length + 1 once the device id matched
    header_match_count: u8,
    framed: bool,
    handler: Option<Handler>,
    data_len: usize,
}

/// What a byte amounted to, and the response it triggered if any
pub(crate) struct Fed {
    pub event: FrameEvent,
    pub response: Option<Responses>,
}

impl From<FrameEvent> for Fed {
    fn from(event: FrameEvent) -> Self {
        Fed {
            event,
            response: None,
        }
    }
}

impl SysexParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header_match_count(&self) -> u8 {
        self.header_match_count
    }

    pub fn is_framed(&self) -> bool {
        self.framed
    }

    pub fn is_command_active(&self) -> bool {
        self.handler.is_some()
    }

    /// Command currently receiving data, if any
    pub fn active_command(&self) -> Option<Command> {
        self.handler.as_ref().map(Handler::command)
    }

    /// Returns to the initial state, abandoning any partially received command
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn feed_byte<S: Surface + ?Sized>(
        &mut self,
        byte: u8,
        identity: &mut DeviceIdentity,
        config: &CoreConfig,
        surface: &mut S,
    ) -> Fed {
        // A new SysEx start always restarts matching, even inside a frame
        if byte == HEADER[0] {
            if self.framed {
                log::trace!("frame interrupted by a new sysex start");
            }
            self.reset();
            self.header_match_count = 1;
            return FrameEvent::Matching.into();
        }

        if self.framed {
            return self.feed_data_byte(byte, config, surface);
        }

        let ctr = self.header_match_count as usize;

        if ctr == 0 {
            return FrameEvent::ForwardToChannelHandler.into();
        }

        if ctr < HEADER.len() {
            if byte == HEADER[ctr] {
                self.header_match_count += 1;
                return FrameEvent::Matching.into();
            }
            log::trace!("header mismatch at {}: {:#04x}", ctr, byte);
            self.reset();
            return FrameEvent::ForwardToChannelHandler.into();
        }

        if identity.accept(byte) {
            self.header_match_count += 1;
            self.framed = true;
            FrameEvent::Framed.into()
        } else {
            log::trace!("frame addressed to another device id: {:#04x}", byte);
            self.reset();
            FrameEvent::Rejected.into()
        }
    }

    fn feed_data_byte<S: Surface + ?Sized>(
        &mut self,
        byte: u8,
        config: &CoreConfig,
        surface: &mut S,
    ) -> Fed {
        if byte & 0x80 != 0 {
            let fed = match (byte, self.handler.as_mut()) {
                (EOX, Some(handler)) => Fed {
                    event: FrameEvent::Completed,
                    response: handler.handle(Phase::End, byte, config, surface),
                },
                _ => {
                    log::trace!("unexpected status byte inside frame: {:#04x}", byte);
                    FrameEvent::Rejected.into()
                }
            };
            self.reset();
            return fed;
        }

        match self.handler.as_mut() {
            None => match Command::from_code(byte) {
                Some(cmd) => {
                    let mut handler = Handler::from(cmd);
                    let response = handler.handle(Phase::Begin, byte, config, surface);
                    self.handler = Some(handler);
                    self.data_len = 0;
                    Fed {
                        event: FrameEvent::Command,
                        response,
                    }
                }
                None => {
                    log::trace!("unknown command {:#04x}", byte);
                    self.reset();
                    FrameEvent::Rejected.into()
                }
            },
            Some(handler) => {
                self.data_len += 1;
                if matches!(config.max_command_len, Some(max) if self.data_len > max) {
                    log::debug!(
                        "abandoning {:?} after {} data bytes",
                        handler.command(),
                        self.data_len
                    );
                    self.reset();
                    return FrameEvent::Rejected.into();
                }

                Fed {
                    event: FrameEvent::Command,
                    response: handler.handle(Phase::Continue, byte, config, surface),
                }
            }
        }
    }
}
