//! Traffic decoder aiming at inspecting the host's interaction with the surface
//!
//! Every message is printed to the given writer, followed by what it means in LC terms.

use std::fmt;

use bytes::Bytes;
use lc_protocol::{packet, ChannelMessage, Command};
use termcolor::{Color, ColorSpec, WriteColor};

/// Main decoder
pub struct Decoder {
    quiet: bool,
    w: Box<dyn WriteColor + Send + Sync>,
    start_instant: std::time::Instant,
}

impl Decoder {
    /// In quiet mode, meter levels and realtime messages are skipped
    pub fn new(w: Box<dyn WriteColor + Send + Sync>, quiet: bool) -> Self {
        Decoder {
            quiet,
            w,
            start_instant: std::time::Instant::now(),
        }
    }

    /// Feed a message sent to the host
    pub fn feed_sent(&mut self, msg: &Bytes) {
        self.feed(true, msg);
    }

    /// Feed a message received from the host
    pub fn feed_recv(&mut self, msg: &Bytes) {
        self.feed(false, msg);
    }

    fn feed(&mut self, sent: bool, msg: &Bytes) {
        let status = match msg.first() {
            Some(&status) => status,
            None => return,
        };

        if self.quiet && (status >= 0xF8 || status & 0xF0 == 0xD0) {
            return;
        }

        let _ = self.print_frame(sent, msg);
        let described = if status == packet::HEADER[0] {
            describe_sysex(sent, msg)
        } else {
            ChannelMessage::from_bytes(msg.clone())
                .map(|m| describe_channel(sent, &m))
                .map_err(|e| e.to_string())
        };

        let _ = match described {
            Ok(text) => self.print_meaning(sent, &text),
            Err(err) => self.print_error(err),
        };
    }

    fn print_time(&mut self) -> std::io::Result<()> {
        let elapsed = self.start_instant.elapsed();
        let secs = elapsed.as_secs();
        let millis = elapsed.subsec_millis();
        write!(self.w, "[{secs}.{millis:03}s] ")
    }

    fn print_frame(&mut self, sent: bool, msg: &Bytes) -> std::io::Result<()> {
        let _ = self.print_direction(sent);
        let _ = self
            .w
            .set_color(ColorSpec::new().set_fg(Some(Color::White)).set_dimmed(true));
        writeln!(self.w, "{:02x?}", msg.as_ref())?;
        Ok(())
    }

    fn print_meaning(&mut self, sent: bool, text: &str) -> std::io::Result<()> {
        let _ = self.print_direction(sent);
        let color = if sent { Color::Cyan } else { Color::Green };
        let _ = self.w.set_color(ColorSpec::new().set_fg(Some(color)));
        writeln!(self.w, "{text}")?;
        self.w.reset()
    }

    fn print_direction(&mut self, sent: bool) -> std::io::Result<()> {
        let direction = if sent {
            let _ = self.w.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)));
            "Sent: "
        } else {
            let _ = self.w.set_color(ColorSpec::new().set_fg(Some(Color::Blue)));
            "Recv: "
        };
        let _ = self.print_time();
        write!(self.w, "{direction}")
    }

    fn print_error<T: fmt::Display>(&mut self, err: T) -> std::io::Result<()> {
        let _ = self.w.set_color(ColorSpec::new().set_fg(Some(Color::Red)));
        let _ = self.print_time();
        writeln!(self.w, "Decode error: {err}")?;
        self.w.reset()
    }
}

fn describe_sysex(sent: bool, msg: &Bytes) -> Result<String, String> {
    let (id, payload) = packet::unframe(msg.clone()).map_err(|e| e.to_string())?;
    let code = *payload.first().ok_or("empty sysex payload")?;
    let data = &payload[1..];

    let name = if sent {
        match code {
            0x01 => "QueryReply".to_string(),
            0x03 => "HostConnectionConfirm".to_string(),
            0x14 => "Version".to_string(),
            0x1B => "McQueryReply".to_string(),
            _ => format!("unknown response {code:#04x}"),
        }
    } else {
        match Command::from_code(code) {
            Some(cmd) => format!("{cmd:?}"),
            None => format!("unknown command {code:#04x}"),
        }
    };

    let text = String::from_utf8_lossy(data);
    Ok(format!("[{id:#04x}] {name} {text:?}"))
}

fn describe_channel(sent: bool, msg: &ChannelMessage) -> String {
    match *msg {
        ChannelMessage::NoteOn { note, velocity, .. } if sent => format!(
            "button {note:#04x} {}",
            if velocity != 0 { "pressed" } else { "released" }
        ),
        ChannelMessage::NoteOn { note, velocity, .. } => format!(
            "LED {note:#04x} {}",
            if velocity != 0 { "on" } else { "off" }
        ),
        ChannelMessage::PitchBend { channel, value } => {
            format!("fader {channel} position {:#06x}", value << 2)
        }
        ChannelMessage::ControlChange { cc, value, .. } if sent => match cc {
            0x10..=0x17 => format!(
                "V-Pot {} delta {}",
                cc & 0x07,
                lc_protocol::encoder::decode_relative(value)
            ),
            0x3C => format!(
                "jog wheel delta {}",
                lc_protocol::encoder::decode_relative(value)
            ),
            _ => format!("{msg:?}"),
        },
        ChannelMessage::ControlChange { cc, value, .. } => match cc {
            0x30..=0x37 => format!("V-Pot {} ring {value:#04x}", cc & 0x07),
            0x40..=0x4B => format!("digit {} glyph {value:#04x}", cc - 0x40),
            _ => format!("{msg:?}"),
        },
        ChannelMessage::ChannelPressure { value, .. } => {
            format!("meter {} level {:#x}", value >> 4, value & 0x0F)
        }
        _ => format!("{msg:?}"),
    }
}

#[cfg(test)]
mod test {
    use termcolor::{ColorChoice, StandardStream};

    use super::*;

    #[test]
    fn test_print() {
        let writer = Box::new(StandardStream::stderr(ColorChoice::Always));
        let mut d = Decoder::new(writer, false);
        d.feed_recv(&Bytes::from_static(&[0xF0, 0x00, 0x00, 0x66, 0x10, 0x00, 0xF7]));
        d.feed_sent(&Bytes::from_static(&[0xB0, 0x13, 0x45]));
        d.feed_recv(&Bytes::from_static(&[0xA0]));
        d.w.reset().unwrap();
    }

    #[test]
    fn descriptions() {
        assert_eq!(
            describe_sysex(
                false,
                &Bytes::from_static(&[0xF0, 0x00, 0x00, 0x66, 0x10, 0x12, 0x00, b'L', b'C', 0xF7])
            ),
            Ok("[0x10] WriteLcd \"\\0LC\"".to_string())
        );
        assert_eq!(
            describe_channel(
                true,
                &ChannelMessage::ControlChange {
                    channel: 0,
                    cc: 0x13,
                    value: 0x45
                }
            ),
            "V-Pot 3 delta -5"
        );
        assert_eq!(
            describe_channel(
                false,
                &ChannelMessage::ChannelPressure {
                    channel: 0,
                    value: 0x3C
                }
            ),
            "meter 3 level 0xc"
        );
    }

    #[test]
    fn quiet_skips_meters() {
        let writer = Box::new(StandardStream::stderr(ColorChoice::Never));
        let mut d = Decoder::new(writer, true);
        d.feed_recv(&Bytes::from_static(&[0xD0, 0x3C]));
        d.feed_recv(&Bytes::from_static(&[0xF8]));
    }
}
