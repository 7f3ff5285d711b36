//! Encoding of local surface input into host channel voice messages
//!
//! Relative controls (V-Pots, jog wheel) use a sign-magnitude byte: bits 0-5 carry the
//! magnitude and bit 6 is set for negative movements. Faders report absolute 14-bit
//! positions as pitch bend messages.

#[cfg(feature = "debug")]
use thiserror::Error;

use crate::{
    channel::ChannelMessage,
    state::NUM_STRIPS,
    surface::{Surface, Transmit},
    CoreConfig,
};

/// First V-Pot delta controller, V-Pot `n` uses `VPOT_DELTA_CC | n`
pub const VPOT_DELTA_CC: u8 = 0x10;

/// Jog wheel delta controller
pub const JOGWHEEL_CC: u8 = 0x3C;

/// First fader touch note, fader `n` uses `FADER_TOUCH_NOTE + n`
pub const FADER_TOUCH_NOTE: u8 = 0x68;

/// Largest magnitude a relative delta can carry
pub const MAX_DELTA: u8 = 0x3F;

/// Largest fader position in the 10-bit resolution used for relative fader moves
pub const FADER_DELTA_MAX: i32 = 0x3FF;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "debug", derive(Error))]
pub enum InputError {
    #[cfg_attr(feature = "debug", error("fader {0} is out of range"))]
    FaderOutOfRange(u8),
}

/// Sign-magnitude encoding of a relative movement; magnitudes beyond [`MAX_DELTA`] saturate
pub fn encode_relative(increment: i32) -> u8 {
    let magnitude = increment.unsigned_abs().min(MAX_DELTA as u32) as u8;
    if increment < 0 {
        magnitude | 0x40
    } else {
        magnitude
    }
}

/// Inverse of [`encode_relative`], as a host would read it
pub fn decode_relative(value: u8) -> i8 {
    let magnitude = (value & MAX_DELTA) as i8;
    if value & 0x40 != 0 {
        -magnitude
    } else {
        magnitude
    }
}

fn send<T: Transmit + ?Sized>(tx: &mut T, msg: ChannelMessage) {
    log::trace!("sending {:?}", msg);
    tx.transmit(msg.to_bytes());
}

fn check_fader(index: u8) -> Result<(), InputError> {
    if (index as usize) < NUM_STRIPS {
        Ok(())
    } else {
        Err(InputError::FaderOutOfRange(index))
    }
}

/// Pitch bend channel used to report a fader, undoing the master fader redirect
fn fader_channel(config: &CoreConfig, index: u8) -> u8 {
    match config.master_fader {
        Some(master) if master == index => 0,
        _ => index,
    }
}

pub fn send_vpot_delta<S, T>(
    config: &CoreConfig,
    index: u8,
    increment: i32,
    surface: &mut S,
    tx: &mut T,
) where
    S: Surface + ?Sized,
    T: Transmit + ?Sized,
{
    if config.gpc_mode {
        surface.gpc_vpot_delta(index, increment);
        return;
    }

    send(
        tx,
        ChannelMessage::ControlChange {
            channel: 0,
            cc: VPOT_DELTA_CC | (index & 0x07),
            value: encode_relative(increment),
        },
    );
}

pub fn send_jogwheel_delta<T: Transmit + ?Sized>(increment: i32, tx: &mut T) {
    send(
        tx,
        ChannelMessage::ControlChange {
            channel: 0,
            cc: JOGWHEEL_CC,
            value: encode_relative(increment),
        },
    );
}

/// Moves a fader by a relative amount in 10-bit resolution.
///
/// Returns whether the position changed, in which case it was reported through
/// [`fader_event`].
pub fn send_fader_delta<S, T>(
    config: &CoreConfig,
    index: u8,
    increment: i32,
    surface: &mut S,
    tx: &mut T,
) -> Result<bool, InputError>
where
    S: Surface + ?Sized,
    T: Transmit + ?Sized,
{
    check_fader(index)?;

    let current = (surface.fader_position(index) >> 6) as i32;
    let value = (current + increment).clamp(0, FADER_DELTA_MAX);
    if value == current {
        return Ok(false);
    }

    fader_event(config, index, (value as u16) << 6, surface, tx)
}

/// Reports a fader moved by hand to the host.
///
/// With touch suppression enabled, nothing is stored or sent unless the fader's touch
/// sensor is active. Returns whether the event was sent.
pub fn fader_event<S, T>(
    config: &CoreConfig,
    index: u8,
    position: u16,
    surface: &mut S,
    tx: &mut T,
) -> Result<bool, InputError>
where
    S: Surface + ?Sized,
    T: Transmit + ?Sized,
{
    check_fader(index)?;

    if config.touch_suppression && !surface.fader_touch_active(index) {
        log::trace!("fader {} untouched, dropping move", index);
        return Ok(false);
    }

    surface.store_fader_position(index, position);
    send(
        tx,
        ChannelMessage::PitchBend {
            channel: fader_channel(config, index),
            value: position >> 2,
        },
    );
    Ok(true)
}

/// Reports a button press or release
pub fn send_button<T: Transmit + ?Sized>(id: u8, pressed: bool, tx: &mut T) {
    send(
        tx,
        ChannelMessage::NoteOn {
            channel: 0,
            note: id,
            velocity: if pressed { 0x7F } else { 0x00 },
        },
    );
}

/// Records a fader touch sensor change and reports it
pub fn send_fader_touch<S, T>(
    index: u8,
    touched: bool,
    surface: &mut S,
    tx: &mut T,
) -> Result<(), InputError>
where
    S: Surface + ?Sized,
    T: Transmit + ?Sized,
{
    check_fader(index)?;

    surface.set_fader_touch(index, touched);
    send_button(FADER_TOUCH_NOTE + index, touched, tx);
    Ok(())
}
