//! Decoding of host channel voice messages into surface updates
//!
//! | Message | Meaning |
//! |---|---|
//! | NoteOn/NoteOff (note, velocity) | LED `note` on when velocity != 0 |
//! | PitchBend (channel 0-7) | Move fader |
//! | CC 0x30-0x37 | V-Pot ring value |
//! | CC 0x40-0x49 | MTC digit `9 - (cc - 0x40)` |
//! | CC 0x4A-0x4B | Status digit `1 - (cc - 0x4A)` |
//! | Channel pressure `0xmc` | Meter `m`, level code `c` |

#[cfg(feature = "debug")]
use thiserror::Error;

use crate::{channel::ChannelMessage, state::NUM_STRIPS, surface::Surface, CoreConfig};

/// What a host message did to the surface
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Action {
    LedSet { id: u8, on: bool },
    FaderMove { index: u8, position: u16 },
    VPotValueSet { index: u8, value: u8 },
    MtcDigitSet { index: usize, glyph: u8 },
    StatusDigitSet { index: usize, glyph: u8 },
    MeterLevelSet { channel: u8, code: u8 },

    /// The message has no meaning on this surface and may be forwarded elsewhere
    Unsupported,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "debug", derive(Error))]
pub enum DecodeError {
    #[cfg_attr(feature = "debug", error("pitch bend on channel {0} has no fader"))]
    FaderOutOfRange(u8),

    #[cfg_attr(feature = "debug", error("meter {0} is out of range"))]
    MeterOutOfRange(u8),

    #[cfg_attr(feature = "debug", error("cc {0:#04x} does not address a digit"))]
    DigitOutOfRange(u8),
}

pub fn decode<S: Surface + ?Sized>(
    config: &CoreConfig,
    msg: &ChannelMessage,
    surface: &mut S,
) -> Result<Action, DecodeError> {
    let action = match *msg {
        // Note off isn't part of the protocol, but helps when testing with a keyboard
        ChannelMessage::NoteOn { note, velocity, .. } => Action::LedSet {
            id: note,
            on: velocity != 0,
        },
        ChannelMessage::NoteOff { note, .. } => Action::LedSet { id: note, on: false },

        ChannelMessage::PitchBend { channel, value } => {
            if channel as usize >= NUM_STRIPS {
                return Err(DecodeError::FaderOutOfRange(channel));
            }
            let index = match config.master_fader {
                Some(master) if channel == 0 => master,
                _ => channel,
            };
            Action::FaderMove {
                index,
                position: value << 2,
            }
        }

        ChannelMessage::ControlChange { cc, value, .. } if cc & 0xF8 == 0x30 => {
            Action::VPotValueSet {
                index: cc & 0x07,
                value,
            }
        }
        // Digits are sent on channel 16, but the channel isn't checked
        ChannelMessage::ControlChange { cc, value, .. } if cc & 0xF0 == 0x40 => match cc {
            0x40..=0x49 => Action::MtcDigitSet {
                index: 9 - (cc - 0x40) as usize,
                glyph: value,
            },
            0x4A..=0x4B => Action::StatusDigitSet {
                index: 1 - (cc - 0x4A) as usize,
                glyph: value,
            },
            _ => return Err(DecodeError::DigitOutOfRange(cc)),
        },

        ChannelMessage::ChannelPressure { value, .. } => {
            let channel = value >> 4;
            if channel as usize >= NUM_STRIPS {
                return Err(DecodeError::MeterOutOfRange(channel));
            }
            Action::MeterLevelSet {
                channel,
                code: value & 0x0F,
            }
        }

        _ => Action::Unsupported,
    };

    apply(action, surface);
    Ok(action)
}

fn apply<S: Surface + ?Sized>(action: Action, surface: &mut S) {
    match action {
        Action::LedSet { id, on } => {
            surface.led_set(id, on);
            surface.led_status_update(id, on);
        }
        Action::FaderMove { index, position } => surface.fader_move(index, position),
        Action::VPotValueSet { index, value } => surface.vpot_value_set(index, value),
        Action::MtcDigitSet { index, glyph } => surface.led_digit_mtc_set(index, glyph),
        Action::StatusDigitSet { index, glyph } => surface.led_digit_status_set(index, glyph),
        Action::MeterLevelSet { channel, code } => surface.meter_level_set(channel, code),
        Action::Unsupported => {}
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{state::TimeDisplayMode, SurfaceState};

    fn run(msg: ChannelMessage, surface: &mut SurfaceState) -> Result<Action, DecodeError> {
        decode(&CoreConfig::default(), &msg, surface)
    }

    #[test]
    fn leds() {
        let mut surface = SurfaceState::new();
        let on = ChannelMessage::NoteOn {
            channel: 0,
            note: 0x72,
            velocity: 0x7F,
        };
        assert_eq!(
            run(on, &mut surface),
            Ok(Action::LedSet { id: 0x72, on: true })
        );
        assert!(surface.led(0x72));
        assert_eq!(surface.time_mode(), TimeDisplayMode::Beats);

        let off = ChannelMessage::NoteOn {
            channel: 0,
            note: 0x72,
            velocity: 0,
        };
        run(off, &mut surface).unwrap();
        assert!(!surface.led(0x72));

        run(
            ChannelMessage::NoteOn {
                channel: 0,
                note: 0x10,
                velocity: 1,
            },
            &mut surface,
        )
        .unwrap();
        run(
            ChannelMessage::NoteOff {
                channel: 0,
                note: 0x10,
                velocity: 0x40,
            },
            &mut surface,
        )
        .unwrap();
        assert!(!surface.led(0x10));
    }

    #[test]
    fn faders() {
        let mut surface = SurfaceState::new();
        let msg = ChannelMessage::PitchBend {
            channel: 2,
            value: 0x3FFF,
        };
        assert_eq!(
            run(msg, &mut surface),
            Ok(Action::FaderMove {
                index: 2,
                position: 0xFFFC
            })
        );
        assert_eq!(surface.faders()[2], 0xFFFC);

        let msg = ChannelMessage::PitchBend {
            channel: 8,
            value: 0,
        };
        assert_eq!(run(msg, &mut surface), Err(DecodeError::FaderOutOfRange(8)));
    }

    #[test]
    fn master_fader_redirect() {
        let mut surface = SurfaceState::new();
        let config = CoreConfig {
            master_fader: Some(7),
            ..Default::default()
        };
        let msg = ChannelMessage::PitchBend {
            channel: 0,
            value: 0x1000,
        };
        assert_eq!(
            decode(&config, &msg, &mut surface),
            Ok(Action::FaderMove {
                index: 7,
                position: 0x4000
            })
        );
        assert_eq!(surface.faders()[0], 0);
    }

    #[test]
    fn vpots_and_digits() {
        let mut surface = SurfaceState::new();
        let msg = ChannelMessage::ControlChange {
            channel: 0,
            cc: 0x35,
            value: 0x16,
        };
        assert_eq!(
            run(msg, &mut surface),
            Ok(Action::VPotValueSet {
                index: 5,
                value: 0x16
            })
        );

        let msg = ChannelMessage::ControlChange {
            channel: 15,
            cc: 0x40,
            value: b'7',
        };
        assert_eq!(
            run(msg, &mut surface),
            Ok(Action::MtcDigitSet {
                index: 9,
                glyph: b'7'
            })
        );
        assert_eq!(surface.mtc_digits()[9], b'7');

        let msg = ChannelMessage::ControlChange {
            channel: 15,
            cc: 0x4B,
            value: b'2',
        };
        run(msg, &mut surface).unwrap();
        assert_eq!(surface.status_digits()[0], b'2');

        let msg = ChannelMessage::ControlChange {
            channel: 15,
            cc: 0x4C,
            value: 0,
        };
        assert_eq!(run(msg, &mut surface), Err(DecodeError::DigitOutOfRange(0x4C)));
    }

    #[test]
    fn meters() {
        let mut surface = SurfaceState::new();
        let msg = ChannelMessage::ChannelPressure {
            channel: 0,
            value: 0x3C,
        };
        assert_eq!(
            run(msg, &mut surface),
            Ok(Action::MeterLevelSet {
                channel: 3,
                code: 0x0C
            })
        );
        assert_eq!(surface.meter_level(3), Some(0x0C));

        let msg = ChannelMessage::ChannelPressure {
            channel: 0,
            value: 0x3E,
        };
        run(msg, &mut surface).unwrap();
        assert_eq!(surface.meter_level(3), Some(0x8C));

        let msg = ChannelMessage::ChannelPressure {
            channel: 0,
            value: 0x85,
        };
        assert_eq!(run(msg, &mut surface), Err(DecodeError::MeterOutOfRange(8)));
    }

    #[test]
    fn unsupported() {
        let mut surface = SurfaceState::new();
        let msg = ChannelMessage::ProgramChange {
            channel: 0,
            program: 3,
        };
        assert_eq!(run(msg, &mut surface), Ok(Action::Unsupported));

        let msg = ChannelMessage::ControlChange {
            channel: 0,
            cc: 0x07,
            value: 3,
        };
        assert_eq!(run(msg, &mut surface), Ok(Action::Unsupported));
    }
}
