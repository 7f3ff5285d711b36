use std::path::Path;

use lc_protocol::{CoreConfig, DeviceIdMode};
use serde::{Deserialize, Serialize};

use crate::LcError;

/// Main configuration file
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `"lc"` or `"lcxt"` to auto-detect the id among the usual seeds, or `{ fixed = <id> }`
    pub device_id: DeviceIdMode,

    /// Serial number reported to the host, exactly 8 ASCII characters
    pub serial: String,

    /// Challenge reported along with the serial number, exactly 4 ASCII characters
    pub id_string: String,

    /// Fader index receiving channel 0 pitch bend
    pub master_fader: Option<u8>,

    /// Only report fader moves while the fader is touched
    pub touch_suppression: bool,

    /// Keep V-Pot movements local instead of sending them to the host
    pub gpc_mode: bool,

    /// Abandon SysEx commands longer than this
    pub max_command_len: Option<usize>,

    pub transport: TransportConfig,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Address to listen on for a MIDI bridge connection
    pub bind_address: Option<String>,

    /// Address of the MIDI bridge to connect to
    pub connect_address: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let core = CoreConfig::default();
        Self {
            device_id: core.device_id,
            serial: String::from_utf8_lossy(&core.serial).into_owned(),
            id_string: String::from_utf8_lossy(&core.id_string).into_owned(),
            master_fader: core.master_fader,
            touch_suppression: core.touch_suppression,
            gpc_mode: core.gpc_mode,
            max_command_len: core.max_command_len,
            transport: TransportConfig::default(),
        }
    }
}

fn fixed_ascii<const N: usize>(field: &str, value: &str) -> Result<[u8; N], LcError> {
    if !value.is_ascii() {
        return Err(LcError::InvalidConfig(format!("{field} must be ASCII")));
    }
    value.as_bytes().try_into().map_err(|_| {
        LcError::InvalidConfig(format!(
            "{} must be exactly {} characters, got {:?}",
            field, N, value
        ))
    })
}

impl Config {
    pub fn from_toml(s: &str) -> Result<Self, LcError> {
        toml::from_str(s).map_err(|e| LcError::InvalidConfig(e.to_string()))
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LcError> {
        let s = tokio::fs::read_to_string(path).await?;
        Self::from_toml(&s)
    }

    /// Validates the configuration and builds the protocol core's options
    pub fn core_config(&self) -> Result<CoreConfig, LcError> {
        if let Some(index) = self.master_fader {
            if index as usize >= lc_protocol::state::NUM_STRIPS {
                return Err(LcError::InvalidConfig(format!(
                    "master_fader {index} is out of range"
                )));
            }
        }

        Ok(CoreConfig {
            device_id: self.device_id,
            serial: fixed_ascii("serial", &self.serial)?,
            id_string: fixed_ascii("id_string", &self.id_string)?,
            master_fader: self.master_fader,
            touch_suppression: self.touch_suppression,
            gpc_mode: self.gpc_mode,
            max_command_len: self.max_command_len,
        })
    }
}
