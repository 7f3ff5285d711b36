//! Local surface input given as text, one event per line
//!
//! ```text
//! vpot 3 -5        # turn V-Pot 3 five steps counter-clockwise
//! jog 2
//! fader 0 16       # move fader 0 up by 16 steps of 1/1024
//! fader-set 7 0x8000
//! touch 7 on
//! button 0x5e on   # play
//! reset            # forget the latched device id
//! ```

use std::num::ParseIntError;

use clap::{Parser, Subcommand};
use lc_protocol::{InputError, ProtocolCore, Surface, Transmit};

use crate::LcError;

#[derive(Clone, Debug, Parser)]
#[command(no_binary_name = true)]
struct InputLine {
    #[command(subcommand)]
    event: InputEvent,
}

#[derive(Clone, Debug, PartialEq, Eq, Subcommand)]
pub enum InputEvent {
    /// Turn a V-Pot by a number of steps, negative is counter-clockwise
    Vpot {
        index: u8,
        #[arg(allow_negative_numbers = true)]
        increment: i32,
    },

    /// Turn the jog wheel by a number of steps
    Jog {
        #[arg(allow_negative_numbers = true)]
        increment: i32,
    },

    /// Move a fader by a number of 10-bit steps
    Fader {
        index: u8,
        #[arg(allow_negative_numbers = true)]
        increment: i32,
    },

    /// Move a fader to an absolute 16-bit position
    FaderSet {
        index: u8,
        #[arg(value_parser = parse_u16)]
        position: u16,
    },

    /// Set the touch state of a fader
    Touch {
        index: u8,
        #[arg(value_parser = on_or_off, action = clap::ArgAction::Set)]
        value: bool,
    },

    /// Press or release a button
    Button {
        #[arg(value_parser = parse_u8)]
        id: u8,
        #[arg(value_parser = on_or_off, action = clap::ArgAction::Set)]
        value: bool,
    },

    /// Forget the latched device id, as a reboot would
    Reset,
}

impl InputEvent {
    /// Parses a single line, `None` for blank lines and comments
    pub fn parse_line(line: &str) -> Result<Option<InputEvent>, LcError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let words = shellwords::split(line).map_err(|e| anyhow::anyhow!(e))?;
        Self::parse_words(words).map(Some)
    }

    pub fn parse_words<I, T>(words: I) -> Result<InputEvent, LcError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        InputLine::try_parse_from(words)
            .map(|line| line.event)
            .map_err(|e| anyhow::anyhow!(e.to_string()).into())
    }

    /// Applies the event to the surface, sending the resulting messages to `tx`
    pub fn apply<S, T>(
        &self,
        core: &mut ProtocolCore,
        surface: &mut S,
        tx: &mut T,
    ) -> Result<(), InputError>
    where
        S: Surface + ?Sized,
        T: Transmit + ?Sized,
    {
        match *self {
            InputEvent::Vpot { index, increment } => {
                core.send_vpot_delta(index, increment, surface, tx);
            }
            InputEvent::Jog { increment } => core.send_jogwheel_delta(increment, tx),
            InputEvent::Fader { index, increment } => {
                core.send_fader_delta(index, increment, surface, tx)?;
            }
            InputEvent::FaderSet { index, position } => {
                core.fader_event(index, position, surface, tx)?;
            }
            InputEvent::Touch { index, value } => {
                core.send_fader_touch(index, value, surface, tx)?;
            }
            InputEvent::Button { id, value } => core.send_button(id, value, tx),
            InputEvent::Reset => core.hard_reset(),
        }
        Ok(())
    }
}

fn on_or_off(s: &str) -> Result<bool, &'static str> {
    match s {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        _ => Err("expected `on`, `true`, `off`, `false`"),
    }
}

fn strip_hex(s: &str) -> Option<&str> {
    s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))
}

fn parse_u8(s: &str) -> Result<u8, ParseIntError> {
    match strip_hex(s) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse(),
    }
}

fn parse_u16(s: &str) -> Result<u16, ParseIntError> {
    match strip_hex(s) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse(),
    }
}

#[cfg(test)]
mod test {
    use bytes::Bytes;
    use lc_protocol::{CoreConfig, SurfaceState};

    use super::*;

    #[test]
    fn parse() {
        assert_eq!(
            InputEvent::parse_line("vpot 3 -5").unwrap(),
            Some(InputEvent::Vpot {
                index: 3,
                increment: -5
            })
        );
        assert_eq!(
            InputEvent::parse_line("  button 0x5e on ").unwrap(),
            Some(InputEvent::Button { id: 0x5E, value: true })
        );
        assert_eq!(
            InputEvent::parse_line("fader-set 7 0x8000").unwrap(),
            Some(InputEvent::FaderSet {
                index: 7,
                position: 0x8000
            })
        );
        assert_eq!(InputEvent::parse_line("# comment").unwrap(), None);
        assert_eq!(InputEvent::parse_line("").unwrap(), None);
        assert_eq!(InputEvent::parse_line("reset").unwrap(), Some(InputEvent::Reset));

        assert!(InputEvent::parse_line("touch 1 maybe").is_err());
        assert!(InputEvent::parse_line("button 0x100 on").is_err());
        assert!(InputEvent::parse_line("warp 9").is_err());
    }

    #[test]
    fn apply() {
        let mut core = ProtocolCore::new(CoreConfig::default());
        let mut surface = SurfaceState::new();
        let mut tx: Vec<Bytes> = Vec::new();

        for line in ["vpot 3 -5", "jog 1", "touch 2 on", "fader-set 2 0x8000", "button 0x5e on"] {
            InputEvent::parse_line(line)
                .unwrap()
                .unwrap()
                .apply(&mut core, &mut surface, &mut tx)
                .unwrap();
        }

        let sent: Vec<_> = tx.iter().map(|b| b.to_vec()).collect();
        assert_eq!(
            sent,
            vec![
                vec![0xB0, 0x13, 0x45],
                vec![0xB0, 0x3C, 0x01],
                vec![0x90, 0x6A, 0x7F],
                vec![0xE2, 0x00, 0x40],
                vec![0x90, 0x5E, 0x7F],
            ]
        );

        let err = InputEvent::Fader {
            index: 9,
            increment: 1,
        }
        .apply(&mut core, &mut surface, &mut tx);
        assert_eq!(err, Err(InputError::FaderOutOfRange(9)));
    }
}
