//! Channel voice messages exchanged with the host
//!
//! Only the running-status-free, complete form of each message is handled here; splitting
//! a raw byte stream into messages is up to the transport.

use bytes::{BufMut, Bytes, BytesMut};
#[cfg(feature = "debug")]
use thiserror::Error;

use crate::util::{TryBuf, TryBufError};

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "debug", derive(Error))]
pub enum MessageError {
    #[cfg_attr(feature = "debug", error("not a channel voice status byte: {0:#04x}"))]
    NotChannelVoice(u8),

    #[cfg_attr(feature = "debug", error("decode error: {0}"))]
    DecodeError(#[cfg_attr(feature = "debug", from)] TryBufError),
}

#[cfg(not(feature = "debug"))]
impl From<TryBufError> for MessageError {
    fn from(e: TryBufError) -> Self {
        MessageError::DecodeError(e)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelMessage {
    /// 0x8n
    NoteOff { channel: u8, note: u8, velocity: u8 },

    /// 0x9n
    NoteOn { channel: u8, note: u8, velocity: u8 },

    /// 0xAn
    PolyPressure { channel: u8, note: u8, pressure: u8 },

    /// 0xBn
    ControlChange { channel: u8, cc: u8, value: u8 },

    /// 0xCn
    ProgramChange { channel: u8, program: u8 },

    /// 0xDn: the Logic Control "aftertouch", carries meter levels
    ChannelPressure { channel: u8, value: u8 },

    /// 0xEn: 14-bit value, 0..=0x3FFF
    PitchBend { channel: u8, value: u16 },
}

impl ChannelMessage {
    pub fn from_bytes(mut frame: Bytes) -> Result<ChannelMessage, MessageError> {
        let status = frame.try_read_u8()?;
        let channel = status & 0x0F;

        Ok(match status & 0xF0 {
            0x80 => ChannelMessage::NoteOff {
                channel,
                note: frame.try_get_data()?,
                velocity: frame.try_get_data()?,
            },
            0x90 => ChannelMessage::NoteOn {
                channel,
                note: frame.try_get_data()?,
                velocity: frame.try_get_data()?,
            },
            0xA0 => ChannelMessage::PolyPressure {
                channel,
                note: frame.try_get_data()?,
                pressure: frame.try_get_data()?,
            },
            0xB0 => ChannelMessage::ControlChange {
                channel,
                cc: frame.try_get_data()?,
                value: frame.try_get_data()?,
            },
            0xC0 => ChannelMessage::ProgramChange {
                channel,
                program: frame.try_get_data()?,
            },
            0xD0 => ChannelMessage::ChannelPressure {
                channel,
                value: frame.try_get_data()?,
            },
            0xE0 => {
                let lsb = frame.try_get_data()? as u16;
                let msb = frame.try_get_data()? as u16;
                ChannelMessage::PitchBend {
                    channel,
                    value: (msb << 7) | lsb,
                }
            }
            _ => return Err(MessageError::NotChannelVoice(status)),
        })
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut f = BytesMut::with_capacity(3);

        match *self {
            ChannelMessage::NoteOff {
                channel,
                note,
                velocity,
            } => {
                f.put_u8(0x80 | (channel & 0x0F));
                f.put_u8(note & 0x7F);
                f.put_u8(velocity & 0x7F);
            }
            ChannelMessage::NoteOn {
                channel,
                note,
                velocity,
            } => {
                f.put_u8(0x90 | (channel & 0x0F));
                f.put_u8(note & 0x7F);
                f.put_u8(velocity & 0x7F);
            }
            ChannelMessage::PolyPressure {
                channel,
                note,
                pressure,
            } => {
                f.put_u8(0xA0 | (channel & 0x0F));
                f.put_u8(note & 0x7F);
                f.put_u8(pressure & 0x7F);
            }
            ChannelMessage::ControlChange { channel, cc, value } => {
                f.put_u8(0xB0 | (channel & 0x0F));
                f.put_u8(cc & 0x7F);
                f.put_u8(value & 0x7F);
            }
            ChannelMessage::ProgramChange { channel, program } => {
                f.put_u8(0xC0 | (channel & 0x0F));
                f.put_u8(program & 0x7F);
            }
            ChannelMessage::ChannelPressure { channel, value } => {
                f.put_u8(0xD0 | (channel & 0x0F));
                f.put_u8(value & 0x7F);
            }
            ChannelMessage::PitchBend { channel, value } => {
                f.put_u8(0xE0 | (channel & 0x0F));
                f.put_u8((value & 0x7F) as u8);
                f.put_u8(((value >> 7) & 0x7F) as u8);
            }
        }

        f.freeze()
    }

    pub fn channel(&self) -> u8 {
        match *self {
            ChannelMessage::NoteOff { channel, .. }
            | ChannelMessage::NoteOn { channel, .. }
            | ChannelMessage::PolyPressure { channel, .. }
            | ChannelMessage::ControlChange { channel, .. }
            | ChannelMessage::ProgramChange { channel, .. }
            | ChannelMessage::ChannelPressure { channel, .. }
            | ChannelMessage::PitchBend { channel, .. } => channel,
        }
    }

    /// Number of bytes a complete message with this status byte occupies
    pub fn len_for_status(status: u8) -> Option<usize> {
        match status & 0xF0 {
            0x80 | 0x90 | 0xA0 | 0xB0 | 0xE0 => Some(3),
            0xC0 | 0xD0 => Some(2),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use bytes::Buf;

    use super::*;

    #[test]
    fn pitch_bend() {
        let msg = ChannelMessage::from_bytes(Bytes::from_static(&[0xE3, 0x7F, 0x7F])).unwrap();
        assert_eq!(
            msg,
            ChannelMessage::PitchBend {
                channel: 3,
                value: 0x3FFF
            }
        );

        let mut b = ChannelMessage::PitchBend {
            channel: 1,
            value: 0x2001,
        }
        .to_bytes();
        assert_eq!(b.get_u8(), 0xE1);
        assert_eq!(b.get_u8(), 0x01);
        assert_eq!(b.get_u8(), 0x40);
        assert_eq!(b.remaining(), 0);
    }

    #[test]
    fn channel_pressure_is_two_bytes() {
        let msg = ChannelMessage::from_bytes(Bytes::from_static(&[0xD0, 0x3C])).unwrap();
        assert_eq!(
            msg,
            ChannelMessage::ChannelPressure {
                channel: 0,
                value: 0x3C
            }
        );
        assert_eq!(msg.to_bytes().len(), 2);
        assert_eq!(ChannelMessage::len_for_status(0xD5), Some(2));
        assert_eq!(ChannelMessage::len_for_status(0xF0), None);
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(
            ChannelMessage::from_bytes(Bytes::from_static(&[0xF8])),
            Err(MessageError::NotChannelVoice(0xF8))
        );
        assert!(matches!(
            ChannelMessage::from_bytes(Bytes::from_static(&[0x90, 0x10])),
            Err(MessageError::DecodeError(TryBufError::InvalidLength { .. }))
        ));
        assert!(matches!(
            ChannelMessage::from_bytes(Bytes::from_static(&[0xB0, 0x10, 0x90])),
            Err(MessageError::DecodeError(TryBufError::UnexpectedStatus {
                status: 0x90
            }))
        ));
    }
}
