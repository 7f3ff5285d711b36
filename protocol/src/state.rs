//! In-memory surface state
//!
//! Holds every table the host can write to, along with update request flags telling
//! the rendering loop which parts of the surface need to be redrawn.

#[cfg(feature = "use_serde")]
use serde::Serialize;

use crate::surface::Surface;

/// Number of strips (faders, V-Pots, meters) on a surface
pub const NUM_STRIPS: usize = 8;

/// Number of MTC digits in the LED digit display
pub const NUM_MTC_DIGITS: usize = 10;

/// Number of status digits in the LED digit display
pub const NUM_STATUS_DIGITS: usize = 2;

/// Characters per LCD line
pub const LCD_LINE_LEN: usize = 56;

/// Address of the first character of the second LCD line
pub const LCD_LINE2_ADDR: u8 = 0x40;

/// LED ids signalling the active time display mode
pub const LED_SMPTE: u8 = 0x71;
pub const LED_BEATS: u8 = 0x72;

/// Meter codes with a special meaning
pub const METER_SET_OVERLOAD: u8 = 0x0E;
pub const METER_CLEAR_OVERLOAD: u8 = 0x0F;
pub const METER_OVERLOAD: u8 = 0x80;

/// Packed state of 256 LEDs
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LedBitmap([u32; 8]);

impl LedBitmap {
    pub fn get(&self, id: u8) -> bool {
        self.0[(id >> 5) as usize] & (1 << (id & 0x1F)) != 0
    }

    pub fn set(&mut self, id: u8, on: bool) {
        let word = &mut self.0[(id >> 5) as usize];
        if on {
            *word |= 1 << (id & 0x1F);
        } else {
            *word &= !(1 << (id & 0x1F));
        }
    }

    /// Ids of every LED currently lit
    pub fn iter_on(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=255u8).filter(move |&id| self.get(id))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "use_serde", derive(Serialize))]
pub struct VPot {
    /// Ring display mode, bits 4-5 of the host value
    pub display_type: u8,

    /// Bits 0-5: ring position, bit 6: center LED
    pub abs_value: u8,
}

impl VPot {
    pub fn position(&self) -> u8 {
        self.abs_value & 0x3F
    }

    pub fn center(&self) -> bool {
        self.abs_value & 0x40 != 0
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "use_serde", derive(Serialize))]
#[cfg_attr(feature = "use_serde", serde(rename_all = "lowercase"))]
pub enum TimeDisplayMode {
    #[default]
    Smpte,
    Beats,
}

/// Which parts of the surface changed since the rendering loop last looked
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateFlags {
    pub leds: bool,
    pub faders: bool,
    pub vpots: bool,
    pub meters: bool,
    pub led_digits: bool,
    pub lcd: bool,
}

impl UpdateFlags {
    pub fn any(&self) -> bool {
        self.leds || self.faders || self.vpots || self.meters || self.led_digits || self.lcd
    }
}

#[derive(Clone, Debug)]
pub struct SurfaceState {
    leds: LedBitmap,
    faders: [u16; NUM_STRIPS],
    touched: [bool; NUM_STRIPS],
    vpots: [VPot; NUM_STRIPS],
    meters: [u8; NUM_STRIPS],
    meter_modes: [u8; NUM_STRIPS],
    meter_global_mode: u8,
    mtc_digits: [u8; NUM_MTC_DIGITS],
    status_digits: [u8; NUM_STATUS_DIGITS],
    time_mode: TimeDisplayMode,
    lcd: [[u8; LCD_LINE_LEN]; 2],
    lcd_cursor: u8,
    updates: UpdateFlags,
}

impl Default for SurfaceState {
    fn default() -> Self {
        Self {
            leds: LedBitmap::default(),
            faders: [0; NUM_STRIPS],
            touched: [false; NUM_STRIPS],
            vpots: [VPot::default(); NUM_STRIPS],
            meters: [0; NUM_STRIPS],
            meter_modes: [0; NUM_STRIPS],
            meter_global_mode: 0,
            mtc_digits: [b' '; NUM_MTC_DIGITS],
            status_digits: [b' '; NUM_STATUS_DIGITS],
            time_mode: TimeDisplayMode::default(),
            lcd: [[b' '; LCD_LINE_LEN]; 2],
            lcd_cursor: 0,
            updates: UpdateFlags::default(),
        }
    }
}

impl SurfaceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the pending update requests and clears them
    pub fn take_updates(&mut self) -> UpdateFlags {
        core::mem::take(&mut self.updates)
    }

    pub fn leds(&self) -> &LedBitmap {
        &self.leds
    }

    pub fn led(&self, id: u8) -> bool {
        self.leds.get(id)
    }

    pub fn faders(&self) -> &[u16; NUM_STRIPS] {
        &self.faders
    }

    pub fn vpot(&self, index: usize) -> Option<VPot> {
        self.vpots.get(index).copied()
    }

    pub fn vpots(&self) -> &[VPot; NUM_STRIPS] {
        &self.vpots
    }

    /// Packed meter byte, bit 7: overload, bits 0-6: level
    pub fn meter_level(&self, channel: usize) -> Option<u8> {
        self.meters.get(channel).copied()
    }

    pub fn meters(&self) -> &[u8; NUM_STRIPS] {
        &self.meters
    }

    pub fn meter_mode(&self, channel: usize) -> Option<u8> {
        self.meter_modes.get(channel).copied()
    }

    pub fn meter_global_mode(&self) -> u8 {
        self.meter_global_mode
    }

    /// MTC digit glyphs, index 0 is the rightmost digit
    pub fn mtc_digits(&self) -> &[u8; NUM_MTC_DIGITS] {
        &self.mtc_digits
    }

    pub fn status_digits(&self) -> &[u8; NUM_STATUS_DIGITS] {
        &self.status_digits
    }

    pub fn time_mode(&self) -> TimeDisplayMode {
        self.time_mode
    }

    pub fn lcd_line(&self, line: usize) -> Option<&[u8; LCD_LINE_LEN]> {
        self.lcd.get(line)
    }

    pub fn lcd_cursor(&self) -> u8 {
        self.lcd_cursor
    }

    /// Maps a cursor address to a (line, column) cell, if it's inside the display
    fn lcd_cell(addr: u8) -> Option<(usize, usize)> {
        let line = (addr >= LCD_LINE2_ADDR) as usize;
        let column = (addr & 0x3F) as usize;
        if column < LCD_LINE_LEN && addr < LCD_LINE2_ADDR * 2 {
            Some((line, column))
        } else {
            None
        }
    }
}

impl Surface for SurfaceState {
    fn led_set(&mut self, id: u8, on: bool) {
        self.leds.set(id, on);
        self.updates.leds = true;
    }

    fn led_status_update(&mut self, id: u8, on: bool) {
        let mode = match (id, on) {
            (LED_SMPTE, true) => TimeDisplayMode::Smpte,
            (LED_BEATS, true) => TimeDisplayMode::Beats,
            _ => return,
        };
        if mode != self.time_mode {
            self.time_mode = mode;
            self.updates.led_digits = true;
        }
    }

    fn led_digit_mtc_set(&mut self, index: usize, glyph: u8) {
        if let Some(digit) = self.mtc_digits.get_mut(index) {
            *digit = glyph & 0x7F;
            self.updates.led_digits = true;
        }
    }

    fn led_digit_status_set(&mut self, index: usize, glyph: u8) {
        if let Some(digit) = self.status_digits.get_mut(index) {
            *digit = glyph & 0x7F;
            self.updates.led_digits = true;
        }
    }

    fn meter_level_set(&mut self, channel: u8, code: u8) {
        let meter = match self.meters.get_mut(channel as usize) {
            Some(meter) => meter,
            None => return,
        };

        // The level survives overload changes and vice versa
        *meter = match code & 0x0F {
            METER_SET_OVERLOAD => *meter | METER_OVERLOAD,
            METER_CLEAR_OVERLOAD => *meter & !METER_OVERLOAD,
            level => (*meter & METER_OVERLOAD) | level,
        };
        self.updates.meters = true;
    }

    fn meter_mode_set(&mut self, channel: u8, mode: u8) {
        if let Some(m) = self.meter_modes.get_mut(channel as usize) {
            *m = mode;
            self.updates.meters = true;
        }
    }

    fn meter_global_mode_set(&mut self, mode: u8) {
        self.meter_global_mode = mode;
        self.updates.meters = true;
    }

    fn vpot_value_set(&mut self, index: u8, value: u8) {
        if let Some(vpot) = self.vpots.get_mut(index as usize) {
            *vpot = VPot {
                display_type: (value >> 4) & 0x03,
                abs_value: value & 0x4F,
            };
            self.updates.vpots = true;
        }
    }

    fn fader_move(&mut self, index: u8, position: u16) {
        if let Some(fader) = self.faders.get_mut(index as usize) {
            *fader = position;
            self.updates.faders = true;
        }
    }

    fn fader_position(&self, index: u8) -> u16 {
        self.faders.get(index as usize).copied().unwrap_or_default()
    }

    fn store_fader_position(&mut self, index: u8, position: u16) {
        if let Some(fader) = self.faders.get_mut(index as usize) {
            *fader = position;
        }
    }

    fn fader_touch_active(&self, index: u8) -> bool {
        self.touched.get(index as usize).copied().unwrap_or(false)
    }

    fn set_fader_touch(&mut self, index: u8, touched: bool) {
        if let Some(t) = self.touched.get_mut(index as usize) {
            *t = touched;
        }
    }

    fn lcd_cursor_set(&mut self, pos: u8) {
        self.lcd_cursor = pos;
    }

    fn lcd_print_host_char(&mut self, c: u8) {
        if let Some((line, column)) = Self::lcd_cell(self.lcd_cursor) {
            self.lcd[line][column] = c;
            self.updates.lcd = true;
        }

        self.lcd_cursor = match self.lcd_cursor.saturating_add(1) {
            next if next == LCD_LINE_LEN as u8 => LCD_LINE2_ADDR,
            next => next,
        };
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn led_bitmap() {
        let mut leds = LedBitmap::default();
        leds.set(0, true);
        leds.set(0x71, true);
        leds.set(255, true);
        assert!(leds.get(0x71));
        assert!(!leds.get(0x70));
        assert_eq!(leds.iter_on().collect::<Vec<_>>(), vec![0, 0x71, 255]);

        leds.set(0x71, false);
        assert!(!leds.get(0x71));
    }

    #[test]
    fn meter_overload_keeps_level() {
        let mut state = SurfaceState::new();
        state.meter_level_set(2, 0x09);
        state.meter_level_set(2, METER_SET_OVERLOAD);
        assert_eq!(state.meter_level(2), Some(0x89));

        state.meter_level_set(2, METER_CLEAR_OVERLOAD);
        assert_eq!(state.meter_level(2), Some(0x09));

        state.meter_level_set(2, METER_SET_OVERLOAD);
        state.meter_level_set(2, 0x03);
        assert_eq!(state.meter_level(2), Some(0x83));

        // Out of range channels are ignored
        assert!(state.take_updates().meters);
        let meters = *state.meters();
        state.meter_level_set(8, 0x03);
        assert_eq!(*state.meters(), meters);
        assert!(!state.take_updates().meters);
    }

    #[test]
    fn lcd_wraps_to_second_line() {
        let mut state = SurfaceState::new();
        state.lcd_cursor_set(0x36);
        for &c in b"abc" {
            state.lcd_print_host_char(c);
        }
        assert_eq!(&state.lcd_line(0).unwrap()[0x36..], b"ab");
        assert_eq!(state.lcd_line(1).unwrap()[0], b'c');
        assert_eq!(state.lcd_cursor(), 0x41);

        state.lcd_cursor_set(0x77);
        state.lcd_print_host_char(b'z');
        state.lcd_print_host_char(b'!');
        assert_eq!(state.lcd_line(1).unwrap()[LCD_LINE_LEN - 1], b'z');
    }

    #[test]
    fn digits_strip_high_bit() {
        let mut state = SurfaceState::new();
        state.led_digit_mtc_set(9, 0xB1);
        state.led_digit_mtc_set(10, b'x');
        state.led_digit_status_set(1, 0x41);
        assert_eq!(state.mtc_digits()[9], 0x31);
        assert_eq!(state.status_digits(), &[b' ', 0x41]);
        assert!(state.take_updates().led_digits);
        assert!(!state.take_updates().any());
    }

    #[test]
    fn time_mode_follows_leds() {
        let mut state = SurfaceState::new();
        state.led_status_update(LED_BEATS, true);
        assert_eq!(state.time_mode(), TimeDisplayMode::Beats);
        state.led_status_update(LED_SMPTE, false);
        assert_eq!(state.time_mode(), TimeDisplayMode::Beats);
        state.led_status_update(LED_SMPTE, true);
        assert_eq!(state.time_mode(), TimeDisplayMode::Smpte);
    }

    #[test]
    fn vpot_packing() {
        let mut state = SurfaceState::new();
        state.vpot_value_set(3, 0x56);
        let vpot = state.vpot(3).unwrap();
        assert_eq!(vpot.display_type, 1);
        assert_eq!(vpot.position(), 6);
        assert!(vpot.center());
    }
}
