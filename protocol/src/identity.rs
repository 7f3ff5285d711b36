//! Device id resolution
//!
//! A surface either answers to a fixed device id, or learns it from the first frame
//! a host addresses to one of the well known Logic Control ids.

use core::{num::ParseIntError, str::FromStr};

#[cfg(feature = "use_serde")]
use serde::{Deserialize, Serialize};

/// Device id seeds accepted while auto-detecting a Logic Control main unit
pub const LC_SEEDS: [u8; 2] = [0x10, 0x14];

/// Device id seeds accepted while auto-detecting a Logic Control XT extension
pub const LCXT_SEEDS: [u8; 2] = [0x11, 0x15];

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "use_serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "use_serde", serde(rename_all = "lowercase"))]
pub enum DeviceIdMode {
    /// Only frames carrying exactly this id are accepted
    Fixed(u8),

    /// Latch the first of `0x10` / `0x14` seen after the header
    #[cfg_attr(feature = "use_serde", serde(rename = "lc"))]
    AutoDetectLc,

    /// Latch the first of `0x11` / `0x15` seen after the header
    #[cfg_attr(feature = "use_serde", serde(rename = "lcxt"))]
    AutoDetectLcXt,
}

impl Default for DeviceIdMode {
    fn default() -> Self {
        DeviceIdMode::Fixed(LC_SEEDS[0])
    }
}

impl DeviceIdMode {
    /// Ids which may be latched in this mode, empty for fixed ids
    pub fn seeds(&self) -> &'static [u8] {
        match self {
            DeviceIdMode::Fixed(_) => &[],
            DeviceIdMode::AutoDetectLc => &LC_SEEDS,
            DeviceIdMode::AutoDetectLcXt => &LCXT_SEEDS,
        }
    }
}

impl FromStr for DeviceIdMode {
    type Err = ParseIntError;

    /// Parses `lc`, `lcxt`, or a fixed id in decimal or `0x` prefixed hex
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lc" => Ok(DeviceIdMode::AutoDetectLc),
            "lcxt" => Ok(DeviceIdMode::AutoDetectLcXt),
            s => match s.strip_prefix("0x") {
                Some(hex) => u8::from_str_radix(hex, 16),
                None => s.parse(),
            }
            .map(DeviceIdMode::Fixed),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeviceIdentity {
    mode: DeviceIdMode,
    detected: Option<u8>,
}

impl DeviceIdentity {
    pub fn new(mode: DeviceIdMode) -> Self {
        Self {
            mode,
            detected: None,
        }
    }

    pub fn mode(&self) -> DeviceIdMode {
        self.mode
    }

    pub fn detected(&self) -> Option<u8> {
        self.detected
    }

    /// The id used for matching and for every response, if known yet
    pub fn resolved(&self) -> Option<u8> {
        match self.mode {
            DeviceIdMode::Fixed(id) => Some(id),
            _ => self.detected,
        }
    }

    /// Checks the byte following the manufacturer header.
    ///
    /// While auto-detecting and nothing has been latched yet, an acceptable seed is latched
    /// permanently. The byte is then compared to the resolved id.
    pub fn accept(&mut self, id: u8) -> bool {
        if self.detected.is_none() && self.mode.seeds().contains(&id) {
            log::debug!("latched device id {:#04x}", id);
            self.detected = Some(id);
        }

        self.resolved() == Some(id)
    }

    /// Forgets the latched id, the equivalent of a device reboot
    pub fn hard_reset(&mut self) {
        self.detected = None;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fixed_id() {
        let mut id = DeviceIdentity::new(DeviceIdMode::Fixed(0x42));
        assert!(!id.accept(0x10));
        assert!(id.accept(0x42));
        assert_eq!(id.detected(), None);
        assert_eq!(id.resolved(), Some(0x42));
    }

    #[test]
    fn latch_once() {
        let mut id = DeviceIdentity::new(DeviceIdMode::AutoDetectLc);
        assert_eq!(id.resolved(), None);
        assert!(!id.accept(0x11));
        assert!(id.accept(0x14));
        assert!(!id.accept(0x10));
        assert!(id.accept(0x14));

        id.hard_reset();
        assert!(id.accept(0x10));
        assert_eq!(id.resolved(), Some(0x10));
    }

    #[test]
    fn parse_mode() {
        assert_eq!("lc".parse::<DeviceIdMode>(), Ok(DeviceIdMode::AutoDetectLc));
        assert_eq!("LCXT".parse::<DeviceIdMode>(), Ok(DeviceIdMode::AutoDetectLcXt));
        assert_eq!("0x14".parse::<DeviceIdMode>(), Ok(DeviceIdMode::Fixed(0x14)));
        assert_eq!("17".parse::<DeviceIdMode>(), Ok(DeviceIdMode::Fixed(0x11)));
        assert!("main".parse::<DeviceIdMode>().is_err());
    }

    #[test]
    fn xt_seeds() {
        let mut id = DeviceIdentity::new(DeviceIdMode::AutoDetectLcXt);
        assert!(!id.accept(0x10));
        assert!(id.accept(0x15));
        assert_eq!(id.detected(), Some(0x15));
    }
}
