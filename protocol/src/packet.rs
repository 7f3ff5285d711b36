//! Functions for framing and unframing Logic Control SysEx messages
use bytes::{BufMut, Bytes, BytesMut};
#[cfg(feature = "debug")]
use thiserror::Error;

/// Manufacturer header shared by every Logic Control / Mackie Control SysEx message
pub const HEADER: [u8; 4] = [0xF0, 0x00, 0x00, 0x66];

/// SysEx terminator
pub const EOX: u8 = 0xF7;

/// Upper bound for a complete outgoing frame, header and terminator included
pub const MAX_FRAME_LEN: usize = 128;

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "debug", derive(Error))]
pub enum EncodeError {
    #[cfg_attr(
        feature = "debug",
        error("frame of {len} bytes exceeds the {max} bytes bound")
    )]
    FrameTooLong { len: usize, max: usize },
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "debug", derive(Error))]
pub enum ParseError {
    #[cfg_attr(feature = "debug", error("frame is too short"))]
    TooShort,

    #[cfg_attr(feature = "debug", error("manufacturer header mismatch"))]
    BadHeader,

    #[cfg_attr(feature = "debug", error("missing sysex terminator"))]
    Unterminated,
}

/// Wraps a payload with the header, device id and terminator.
///
/// Nothing is produced if the complete frame would exceed [`MAX_FRAME_LEN`].
pub fn frame<T: AsRef<[u8]>>(device_id: u8, payload: T) -> Result<Bytes, EncodeError> {
    let payload = payload.as_ref();
    let len = HEADER.len() + 1 + payload.len() + 1;
    if len > MAX_FRAME_LEN {
        return Err(EncodeError::FrameTooLong {
            len,
            max: MAX_FRAME_LEN,
        });
    }

    let mut buf = BytesMut::with_capacity(len);
    buf.extend_from_slice(&HEADER);
    buf.put_u8(device_id);
    buf.extend_from_slice(payload);
    buf.put_u8(EOX);

    Ok(buf.freeze())
}

/// Splits a complete frame into its device id and payload
pub fn unframe(frame: Bytes) -> Result<(u8, Bytes), ParseError> {
    if frame.len() < HEADER.len() + 2 {
        return Err(ParseError::TooShort);
    }
    if frame[..HEADER.len()] != HEADER {
        return Err(ParseError::BadHeader);
    }
    if frame[frame.len() - 1] != EOX {
        return Err(ParseError::Unterminated);
    }

    let device_id = frame[HEADER.len()];
    Ok((device_id, frame.slice(HEADER.len() + 1..frame.len() - 1)))
}
