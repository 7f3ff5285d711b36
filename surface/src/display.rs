//! Virtual surface display
//!
//! Renders what a physical surface would show: the host LCD, the LED digits, V-Pot rings,
//! meters, fader positions and lit LEDs.

use std::fmt;

use lc_protocol::{
    state::{TimeDisplayMode, VPot, LCD_LINE_LEN, METER_OVERLOAD, NUM_STRIPS},
    SurfaceState,
};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Strip {
    pub fader: u16,
    pub vpot: VPot,
    pub meter_level: u8,
    pub overload: bool,
    pub meter_mode: u8,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub lcd: [String; 2],
    pub time_mode: TimeDisplayMode,

    /// Timecode digits as displayed, leftmost first
    pub mtc: String,

    /// Status digits as displayed, leftmost first
    pub status: String,
    pub leds: Vec<u8>,
    pub strips: Vec<Strip>,
    pub meter_global_mode: u8,
}

/// Seven segment glyph to the character it shows, and whether its dot is lit.
///
/// Bit 6 is the dot, codes below 0x20 are the letters from `@` to `_`.
pub fn glyph(g: u8) -> (char, bool) {
    let c = g & 0x3F;
    let c = if c < 0x20 { c + 0x40 } else { c };
    (c as char, g & 0x40 != 0)
}

fn render_digits(digits: &[u8]) -> String {
    let mut s = String::with_capacity(digits.len() * 2);
    // Index 0 is the rightmost digit
    for &g in digits.iter().rev() {
        let (c, dot) = glyph(g);
        s.push(c);
        if dot {
            s.push('.');
        }
    }
    s
}

fn render_lcd_line(line: &[u8; LCD_LINE_LEN]) -> String {
    line.iter()
        .map(|&c| {
            if (0x20..0x7F).contains(&c) {
                c as char
            } else {
                ' '
            }
        })
        .collect()
}

impl From<&SurfaceState> for Snapshot {
    fn from(state: &SurfaceState) -> Self {
        let lcd = [0, 1].map(|line| {
            state
                .lcd_line(line)
                .map(render_lcd_line)
                .unwrap_or_default()
        });

        let strips = (0..NUM_STRIPS)
            .map(|i| {
                let meter = state.meters()[i];
                Strip {
                    fader: state.faders()[i],
                    vpot: state.vpots()[i],
                    meter_level: meter & !METER_OVERLOAD,
                    overload: meter & METER_OVERLOAD != 0,
                    meter_mode: state.meter_mode(i).unwrap_or_default(),
                }
            })
            .collect();

        Snapshot {
            lcd,
            time_mode: state.time_mode(),
            mtc: render_digits(state.mtc_digits()),
            status: render_digits(state.status_digits()),
            leds: state.leds().iter_on().collect(),
            strips,
            meter_global_mode: state.meter_global_mode(),
        }
    }
}

impl Snapshot {
    /// A snapshot if anything changed since the last call
    pub fn take(state: &mut SurfaceState) -> Option<Snapshot> {
        if state.take_updates().any() {
            Some(Snapshot::from(&*state))
        } else {
            None
        }
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let border = "-".repeat(LCD_LINE_LEN);
        writeln!(f, "+{border}+")?;
        for line in &self.lcd {
            writeln!(f, "|{line}|")?;
        }
        writeln!(f, "+{border}+")?;

        let mode = match self.time_mode {
            TimeDisplayMode::Smpte => "SMPTE",
            TimeDisplayMode::Beats => "BEATS",
        };
        writeln!(f, "{mode} {}  [{}]", self.mtc, self.status)?;

        for (i, strip) in self.strips.iter().enumerate() {
            writeln!(
                f,
                "{}: fader {:#06x}  vpot {:2}{} mode {}  meter {:2}{}",
                i + 1,
                strip.fader,
                strip.vpot.position(),
                if strip.vpot.center() { '*' } else { ' ' },
                strip.vpot.display_type,
                strip.meter_level,
                if strip.overload { " OVL" } else { "" },
            )?;
        }

        let leds: Vec<_> = self.leds.iter().map(|id| format!("{id:02x}")).collect();
        write!(f, "LEDs: {}", leds.join(" "))
    }
}

#[cfg(test)]
mod test {
    use lc_protocol::Surface;

    use super::*;

    #[test]
    fn glyphs() {
        assert_eq!(glyph(b'7'), ('7', false));
        assert_eq!(glyph(b'7' | 0x40), ('7', true));
        assert_eq!(glyph(0x01), ('A', false));
        assert_eq!(glyph(b' '), (' ', false));
    }

    #[test]
    fn snapshot() {
        let mut state = SurfaceState::new();
        assert!(Snapshot::take(&mut state).is_none());

        state.lcd_cursor_set(0x40);
        for &c in b"Track 1" {
            state.lcd_print_host_char(c);
        }
        state.led_digit_mtc_set(9, b'1');
        state.led_digit_mtc_set(8, b'2' | 0x40);
        state.led_digit_status_set(1, 0x01);
        state.meter_level_set(2, 0x0C);
        state.meter_level_set(2, 0x0E);
        state.led_set(0x5E, true);
        state.vpot_value_set(0, 0x56);

        let snap = Snapshot::take(&mut state).unwrap();
        assert!(snap.lcd[0].trim().is_empty());
        assert!(snap.lcd[1].starts_with("Track 1"));
        assert_eq!(snap.lcd[1].len(), LCD_LINE_LEN);
        assert!(snap.mtc.starts_with("12."));
        assert!(snap.status.starts_with('A'));
        assert_eq!(snap.strips[2].meter_level, 0x0C);
        assert!(snap.strips[2].overload);
        assert_eq!(snap.strips[0].vpot.position(), 0x06);
        assert!(snap.strips[0].vpot.center());
        assert_eq!(snap.leds, vec![0x5E]);
        assert!(Snapshot::take(&mut state).is_none());

        let text = snap.to_string();
        assert!(text.contains("|Track 1"));
        assert!(text.contains("3: fader 0x0000  vpot  0  mode 0  meter 12 OVL"));
        assert!(text.ends_with("LEDs: 5e"));

        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["time_mode"], "smpte");
        assert_eq!(json["strips"][2]["overload"], true);
    }
}
