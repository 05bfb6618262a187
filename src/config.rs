//! Node configuration parameters
//!
//! All tunable parameters for the SoilNode firmware. Defaults match the
//! field deployment: one moisture uplink every 30 minutes, button uplinks
//! on a separate port, a 20 s sleep ceiling under a 32 s hardware watchdog.

use serde::{Deserialize, Serialize};

use crate::credentials::CredentialSource;
use crate::drivers::watchdog::WATCHDOG_TIMEOUT_MS;
use crate::error::{Error, Result};

/// Highest application port usable for uplinks (224+ are reserved).
pub const MAX_APP_PORT: u8 = 223;

/// LoRaWAN regional parameter set. Discriminants match the stack's codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Region {
    Eu868 = 1,
    As923Grp1 = 2,
    Us915 = 3,
    Au915 = 4,
    Cn470 = 5,
    Ww2g4 = 6,
    As923Grp2 = 7,
    As923Grp3 = 8,
    In865 = 9,
    Kr920 = 10,
    Ru864 = 11,
}

impl Region {
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// Core node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    // --- Network ---
    /// Regional parameters pushed to the stack on reset
    pub region: Region,
    /// Where join credentials come from
    pub credentials: CredentialSource,
    /// Stack instance the node talks to
    pub stack_id: u8,

    // --- Uplinks ---
    /// Periodic uplink alarm period (seconds)
    pub uplink_period_s: u32,
    /// Port for periodic (alarm / joined) uplinks
    pub periodic_port: u8,
    /// Port for button-triggered uplinks
    pub button_port: u8,

    // --- Timing ---
    /// Upper bound on a single sleep; must stay below the hardware watchdog period
    pub watchdog_reload_period_ms: u32,
    /// Minimum gap between accepted button presses (milliseconds)
    pub debounce_ms: u32,
    /// Sensor power-up settle time before conversion (milliseconds)
    pub sensor_settle_ms: u32,
    /// ADC conversion poll timeout (milliseconds)
    pub adc_timeout_ms: u32,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            // Network
            region: Region::Eu868,
            credentials: CredentialSource::ChipResident,
            stack_id: 0,

            // Uplinks
            uplink_period_s: 1800, // 30 min
            periodic_port: 101,
            button_port: 102,

            // Timing
            watchdog_reload_period_ms: 20_000, // hardware watchdog is 32 s
            debounce_ms: 500,
            sensor_settle_ms: 5_000,
            adc_timeout_ms: 100,
        }
    }
}

impl NodeConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|_| Error::Config("malformed configuration JSON"))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would break the loop's timing or port invariants.
    pub fn validate(&self) -> Result<()> {
        for port in [self.periodic_port, self.button_port] {
            if port == 0 || port > MAX_APP_PORT {
                return Err(Error::Config("uplink port must be in 1..=223"));
            }
        }
        if self.periodic_port == self.button_port {
            return Err(Error::Config("periodic and button ports must differ"));
        }
        if self.uplink_period_s == 0 {
            return Err(Error::Config("uplink period must be non-zero"));
        }
        if self.watchdog_reload_period_ms == 0 {
            return Err(Error::Config("watchdog reload period must be non-zero"));
        }
        if self.watchdog_reload_period_ms >= WATCHDOG_TIMEOUT_MS {
            return Err(Error::Config("watchdog reload period must be below the hardware timeout"));
        }
        if self.sensor_settle_ms >= self.watchdog_reload_period_ms {
            return Err(Error::Config("sensor settle time must be below the watchdog bound"));
        }
        Ok(())
    }
}
