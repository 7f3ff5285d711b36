//! Contracts for the collaborators the protocol core drives
//!
//! The core decodes host messages into calls on a [`Surface`] and hands every outgoing
//! message to a [`Transmit`]. Rendering LEDs, LCDs, motor faders and meters is up to the
//! implementor; [`crate::SurfaceState`] is an in-memory implementation.

use alloc::{collections::VecDeque, vec::Vec};

use bytes::Bytes;

pub trait Surface {
    /// Sets or clears the LED with the given logical id
    fn led_set(&mut self, id: u8, on: bool);

    /// Called after every host LED change, used for the SMPTE/BEATS indicators
    fn led_status_update(&mut self, _id: u8, _on: bool) {}

    fn led_digit_mtc_set(&mut self, index: usize, glyph: u8);

    fn led_digit_status_set(&mut self, index: usize, glyph: u8);

    /// `code` is the low nibble of a meter message: a level, or the overload set/clear codes
    fn meter_level_set(&mut self, channel: u8, code: u8);

    fn meter_mode_set(&mut self, channel: u8, mode: u8);

    fn meter_global_mode_set(&mut self, mode: u8);

    fn vpot_value_set(&mut self, index: u8, value: u8);

    /// Host request to move a motor fader to a 16-bit position
    fn fader_move(&mut self, index: u8, position: u16);

    /// Last known 16-bit position of a fader
    fn fader_position(&self, index: u8) -> u16;

    /// Records a fader position reported by the local hardware
    fn store_fader_position(&mut self, index: u8, position: u16);

    fn fader_touch_active(&self, index: u8) -> bool;

    fn set_fader_touch(&mut self, index: u8, touched: bool);

    fn lcd_cursor_set(&mut self, pos: u8);

    fn lcd_print_host_char(&mut self, c: u8);

    /// V-Pot movements while the surface runs as a general purpose controller
    fn gpc_vpot_delta(&mut self, _index: u8, _increment: i32) {}
}

/// Destination for outgoing MIDI messages
pub trait Transmit {
    fn transmit(&mut self, msg: Bytes);
}

impl Transmit for Vec<Bytes> {
    fn transmit(&mut self, msg: Bytes) {
        self.push(msg);
    }
}

impl Transmit for VecDeque<Bytes> {
    fn transmit(&mut self, msg: Bytes) {
        self.push_back(msg);
    }
}
