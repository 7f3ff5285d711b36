//! A codec splitting a raw MIDI byte stream into complete messages.
//!
//! Hosts and MIDI bridges don't align reads with message boundaries, and they are free to
//! use running status, so every decoded item is rebuilt into a self-contained message:
//!
//! * channel messages always carry their status byte, running status is expanded
//! * SysEx messages are returned whole, from `F0` to `F7`
//! * realtime bytes (`F8`-`FF`) are returned on their own as soon as they're seen, even in
//!   the middle of another message
//!
//! A SysEx message interrupted by any other status byte is dropped. Encoding copies
//! messages as-is.

use std::io;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use lc_protocol::{packet::EOX, ChannelMessage};
use tokio_util::codec::{Decoder, Encoder};

const SYSEX_START: u8 = 0xF0;

#[derive(Clone, Debug, Default)]
pub struct MidiCodec {
    running_status: Option<u8>,

    // Message being assembled, including its status byte
    pending: BytesMut,

    // Length of the message being assembled, `None` while inside SysEx
    expected: Option<usize>,

    in_sysex: bool,
}

impl MidiCodec {
    pub fn new() -> Self {
        Self::default()
    }

    fn start(&mut self, status: u8, len: Option<usize>) {
        self.pending.clear();
        self.pending.put_u8(status);
        self.expected = len;
    }

    /// Length of a system common message, including its status byte
    fn system_common_len(status: u8) -> usize {
        match status {
            0xF1 | 0xF3 => 2,
            0xF2 => 3,
            _ => 1,
        }
    }

    fn feed(&mut self, byte: u8) -> Option<Bytes> {
        if byte >= 0xF8 {
            return Some(Bytes::copy_from_slice(&[byte]));
        }

        if self.in_sysex {
            if byte & 0x80 == 0 {
                self.pending.put_u8(byte);
                return None;
            }

            self.in_sysex = false;
            if byte == EOX {
                self.pending.put_u8(byte);
                return Some(self.pending.split().freeze());
            }
            log::trace!(
                "dropping {} bytes of unterminated sysex before {:#04x}",
                self.pending.len(),
                byte
            );
            self.pending.clear();
        }

        match byte {
            SYSEX_START => {
                self.running_status = None;
                self.in_sysex = true;
                self.start(byte, None);
            }
            EOX => {
                log::trace!("stray end of sysex");
            }
            0xF1..=0xF6 => {
                self.running_status = None;
                self.start(byte, Some(Self::system_common_len(byte)));
            }
            0x80..=0xEF => {
                self.running_status = Some(byte);
                self.start(byte, ChannelMessage::len_for_status(byte));
            }
            _ => {
                if self.pending.is_empty() {
                    match self.running_status {
                        Some(status) => self.start(status, ChannelMessage::len_for_status(status)),
                        None => {
                            log::trace!("dropping data byte {:#04x} without status", byte);
                            return None;
                        }
                    }
                }
                self.pending.put_u8(byte);
            }
        }

        match self.expected {
            Some(len) if !self.in_sysex && self.pending.len() >= len => {
                self.expected = None;
                Some(self.pending.split().freeze())
            }
            _ => None,
        }
    }
}

impl Decoder for MidiCodec {
    type Item = Bytes;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        while src.has_remaining() {
            if let Some(msg) = self.feed(src.get_u8()) {
                return Ok(Some(msg));
            }
        }

        Ok(None)
    }
}

impl Encoder<Bytes> for MidiCodec {
    type Error = io::Error;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(&item);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn decode_all(codec: &mut MidiCodec, data: &[u8]) -> Vec<Bytes> {
        let mut src = BytesMut::from(data);
        let mut out = Vec::new();
        while let Some(msg) = codec.decode(&mut src).unwrap() {
            out.push(msg);
        }
        assert!(src.is_empty());
        out
    }

    #[test]
    fn running_status() {
        let mut codec = MidiCodec::new();
        let msgs = decode_all(&mut codec, &[0x90, 0x10, 0x7F, 0x11, 0x7F, 0xD0, 0x35, 0x46]);
        assert_eq!(
            msgs,
            vec![
                Bytes::from_static(&[0x90, 0x10, 0x7F]),
                Bytes::from_static(&[0x90, 0x11, 0x7F]),
                Bytes::from_static(&[0xD0, 0x35]),
                Bytes::from_static(&[0xD0, 0x46]),
            ]
        );
    }

    #[test]
    fn split_reads() {
        let mut codec = MidiCodec::new();
        assert!(decode_all(&mut codec, &[0xF0, 0x00, 0x00]).is_empty());
        assert!(decode_all(&mut codec, &[0x66, 0x10, 0x00]).is_empty());
        assert_eq!(
            decode_all(&mut codec, &[0xF7, 0xE1]),
            vec![Bytes::from_static(&[0xF0, 0x00, 0x00, 0x66, 0x10, 0x00, 0xF7])]
        );
        assert!(decode_all(&mut codec, &[0x00]).is_empty());
        assert_eq!(
            decode_all(&mut codec, &[0x40]),
            vec![Bytes::from_static(&[0xE1, 0x00, 0x40])]
        );
    }

    #[test]
    fn realtime_interleaved() {
        let mut codec = MidiCodec::new();
        let msgs = decode_all(
            &mut codec,
            &[0xB0, 0x30, 0xF8, 0x05, 0xF0, 0x00, 0xFE, 0x00, 0xF7],
        );
        assert_eq!(
            msgs,
            vec![
                Bytes::from_static(&[0xF8]),
                Bytes::from_static(&[0xB0, 0x30, 0x05]),
                Bytes::from_static(&[0xFE]),
                Bytes::from_static(&[0xF0, 0x00, 0x00, 0xF7]),
            ]
        );
    }

    #[test]
    fn interrupted_sysex() {
        let mut codec = MidiCodec::new();
        let msgs = decode_all(&mut codec, &[0xF0, 0x00, 0x00, 0x90, 0x10, 0x00, 0x20, 0x7F]);
        assert_eq!(
            msgs,
            vec![
                Bytes::from_static(&[0x90, 0x10, 0x00]),
                Bytes::from_static(&[0x90, 0x20, 0x7F]),
            ]
        );
    }

    #[test]
    fn sysex_cancels_running_status() {
        let mut codec = MidiCodec::new();
        let msgs = decode_all(&mut codec, &[0x90, 0x10, 0x7F, 0xF0, 0x01, 0xF7, 0x11, 0x7F]);
        assert_eq!(
            msgs,
            vec![
                Bytes::from_static(&[0x90, 0x10, 0x7F]),
                Bytes::from_static(&[0xF0, 0x01, 0xF7]),
            ]
        );
    }

    #[test]
    fn system_common() {
        let mut codec = MidiCodec::new();
        let msgs = decode_all(&mut codec, &[0xF2, 0x01, 0x02, 0xF6, 0xF1, 0x10]);
        assert_eq!(
            msgs,
            vec![
                Bytes::from_static(&[0xF2, 0x01, 0x02]),
                Bytes::from_static(&[0xF6]),
                Bytes::from_static(&[0xF1, 0x10]),
            ]
        );
    }

    #[test]
    fn encode_passthrough() {
        let mut codec = MidiCodec::new();
        let mut dst = BytesMut::new();
        codec
            .encode(Bytes::from_static(&[0x90, 0x5E, 0x7F]), &mut dst)
            .unwrap();
        assert_eq!(dst.as_ref(), &[0x90, 0x5E, 0x7F]);
    }
}
