//! SysEx commands sent by the host and their handlers
//!
//! Once a frame has been matched, the byte following the device id selects a [`Command`].
//! The command's [`Handler`] then sees every data byte in three phases: [`Phase::Begin`]
//! with the command code itself, [`Phase::Continue`] for each payload byte and
//! [`Phase::End`] when the terminator arrives.
//!
//! Query-type commands answer on `End` with one of the fixed [`Responses`]. Write-type
//! commands apply their payload to the [`Surface`] as it streams in.

use bytes::{BufMut, Bytes, BytesMut};

use crate::{surface::Surface, CoreConfig};

/// Version string reported in response to [`Command::VersionReq`]
pub const FIRMWARE_VERSION: &[u8; 5] = b"V1.42";

/// LCD cursor values at or above this address the second line
const LCD_LINE2_OFFSET: u8 = 56;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// 0x00: Host connection query
    Query,

    /// 0x1A: Mackie Control connection query
    McQuery,

    /// 0x02: Host connection reply
    HostReply,

    /// 0x10: Write the 10 digit timecode display
    WriteMtc,

    /// 0x11: Write the 2 digit status display
    WriteStatus,

    /// 0x12: Write characters to the LCD
    WriteLcd,

    /// 0x13: Firmware version request
    VersionReq,

    /// 0x20: Set the meter mode of a single channel
    MeterMode,

    /// 0x21: Set the global meter mode
    MeterGMode,
}

impl Command {
    pub fn from_code(code: u8) -> Option<Command> {
        Some(match code {
            0x00 => Command::Query,
            0x1A => Command::McQuery,
            0x02 => Command::HostReply,
            0x10 => Command::WriteMtc,
            0x11 => Command::WriteStatus,
            0x12 => Command::WriteLcd,
            0x13 => Command::VersionReq,
            0x20 => Command::MeterMode,
            0x21 => Command::MeterGMode,
            _ => return None,
        })
    }

    pub fn code(&self) -> u8 {
        match self {
            Command::Query => 0x00,
            Command::McQuery => 0x1A,
            Command::HostReply => 0x02,
            Command::WriteMtc => 0x10,
            Command::WriteStatus => 0x11,
            Command::WriteLcd => 0x12,
            Command::VersionReq => 0x13,
            Command::MeterMode => 0x20,
            Command::MeterGMode => 0x21,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Begin,
    Continue,
    End,
}

/// Per-command parsing state, created when the command code is received
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Handler {
    Query,
    McQuery,
    HostReply,
    VersionReq,
    WriteMtc { cursor: u8 },
    WriteStatus { cursor: u8 },
    WriteLcd { cursor_set: bool },
    MeterMode { channel: Option<u8>, applied: bool },
    MeterGMode { applied: bool },
}

impl From<Command> for Handler {
    fn from(cmd: Command) -> Self {
        match cmd {
            Command::Query => Handler::Query,
            Command::McQuery => Handler::McQuery,
            Command::HostReply => Handler::HostReply,
            Command::VersionReq => Handler::VersionReq,
            Command::WriteMtc => Handler::WriteMtc { cursor: 0 },
            Command::WriteStatus => Handler::WriteStatus { cursor: 0 },
            Command::WriteLcd => Handler::WriteLcd { cursor_set: false },
            Command::MeterMode => Handler::MeterMode {
                channel: None,
                applied: false,
            },
            Command::MeterGMode => Handler::MeterGMode { applied: false },
        }
    }
}

impl Handler {
    pub fn command(&self) -> Command {
        match self {
            Handler::Query => Command::Query,
            Handler::McQuery => Command::McQuery,
            Handler::HostReply => Command::HostReply,
            Handler::VersionReq => Command::VersionReq,
            Handler::WriteMtc { .. } => Command::WriteMtc,
            Handler::WriteStatus { .. } => Command::WriteStatus,
            Handler::WriteLcd { .. } => Command::WriteLcd,
            Handler::MeterMode { .. } => Command::MeterMode,
            Handler::MeterGMode { .. } => Command::MeterGMode,
        }
    }

    /// Feeds one byte, returning the response payload to send back, if any
    pub fn handle<S: Surface + ?Sized>(
        &mut self,
        phase: Phase,
        byte: u8,
        config: &CoreConfig,
        surface: &mut S,
    ) -> Option<Responses> {
        if phase == Phase::Begin {
            *self = self.command().into();
            return None;
        }

        match self {
            Handler::Query if phase == Phase::End => Some(Responses::QueryReply {
                serial: config.serial,
                challenge: config.id_string,
            }),
            Handler::McQuery if phase == Phase::End => Some(Responses::McQueryReply),
            Handler::HostReply if phase == Phase::End => Some(Responses::HostConnectionConfirm {
                serial: config.serial,
            }),
            Handler::VersionReq if phase == Phase::End => Some(Responses::Version),
            Handler::Query | Handler::McQuery | Handler::HostReply | Handler::VersionReq => None,

            Handler::WriteMtc { cursor } if phase == Phase::Continue => {
                // Digits arrive from the leftmost (highest index) one
                if let Some(index) = 9usize.checked_sub(*cursor as usize) {
                    surface.led_digit_mtc_set(index, byte);
                }
                *cursor = cursor.saturating_add(1);
                None
            }
            Handler::WriteStatus { cursor } if phase == Phase::Continue => {
                if let Some(index) = 1usize.checked_sub(*cursor as usize) {
                    surface.led_digit_status_set(index, byte);
                }
                *cursor = cursor.saturating_add(1);
                None
            }
            Handler::WriteLcd { cursor_set } if phase == Phase::Continue => {
                if *cursor_set {
                    surface.lcd_print_host_char(byte);
                } else {
                    let pos = if byte < LCD_LINE2_OFFSET {
                        byte
                    } else {
                        byte - LCD_LINE2_OFFSET + 0x40
                    };
                    surface.lcd_cursor_set(pos);
                    *cursor_set = true;
                }
                None
            }
            Handler::MeterMode { channel, applied } if phase == Phase::Continue => {
                match *channel {
                    None => {
                        // An invalid channel still consumes the mode byte
                        *channel = Some(byte);
                    }
                    Some(ch) if !*applied => {
                        if (ch as usize) < crate::state::NUM_STRIPS {
                            surface.meter_mode_set(ch, byte);
                        }
                        *applied = true;
                    }
                    Some(_) => {}
                }
                None
            }
            Handler::MeterGMode { applied } if phase == Phase::Continue => {
                if !*applied {
                    surface.meter_global_mode_set(byte);
                    *applied = true;
                }
                None
            }
            _ => None,
        }
    }
}

/// Messages sent by the surface in response to a host query
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Responses {
    /// 0x01: Answer to [`Command::Query`]
    QueryReply { serial: [u8; 8], challenge: [u8; 4] },

    /// 0x03: Answer to [`Command::HostReply`]
    HostConnectionConfirm { serial: [u8; 8] },

    /// 0x14: Answer to [`Command::VersionReq`]
    Version,

    /// 0x1B: Answer to [`Command::McQuery`]
    McQueryReply,
}

impl Responses {
    pub fn to_bytes(&self) -> Bytes {
        let mut f = BytesMut::with_capacity(16);

        match self {
            Responses::QueryReply { serial, challenge } => {
                f.put_u8(0x01);
                f.put_slice(serial);
                f.put_slice(challenge);
            }
            Responses::HostConnectionConfirm { serial } => {
                f.put_u8(0x03);
                f.put_slice(serial);
            }
            Responses::Version => {
                f.put_u8(0x14);
                f.put_slice(FIRMWARE_VERSION);
            }
            Responses::McQueryReply => {
                f.put_u8(0x1B);
                f.put_u8(0x42);
            }
        }

        f.freeze()
    }
}
