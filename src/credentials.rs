//! LoRaWAN join credentials and the two ways of getting them into the stack.
//!
//! A node either carries fixed keys in its configuration (pushed into the
//! stack on reset) or relies on the keys burned into the radio's secure
//! element (pulled back and logged so they can be registered on the
//! network server). The choice is made once at startup by building a
//! [`Provisioner`] from the configured [`CredentialSource`].

use log::info;
use serde::{Deserialize, Serialize};

use crate::app::ports::ModemPort;
use crate::error::{check_and_log, report};

pub const EUI_LENGTH: usize = 8;
pub const KEY_LENGTH: usize = 16;
pub const PIN_LENGTH: usize = 4;

pub type Eui64 = [u8; EUI_LENGTH];
pub type AesKey = [u8; KEY_LENGTH];
pub type ChipPin = [u8; PIN_LENGTH];

/// Immutable identity tuple of the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCredentials {
    pub dev_eui: Eui64,
    pub join_eui: Eui64,
    pub app_key: AesKey,
    pub nwk_key: AesKey,
}

impl DeviceCredentials {
    /// Parse credentials from hex strings (as baked in at build time).
    pub fn from_hex(dev_eui: &str, join_eui: &str, app_key: &str, nwk_key: &str) -> Option<Self> {
        Some(Self {
            dev_eui: parse_hex(dev_eui)?,
            join_eui: parse_hex(join_eui)?,
            app_key: parse_hex(app_key)?,
            nwk_key: parse_hex(nwk_key)?,
        })
    }
}

/// Where the join credentials come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredentialSource {
    /// Keys supplied by configuration.
    Fixed(DeviceCredentials),
    /// Keys resident in the radio's secure element.
    ChipResident,
}

/// The single capability the reset handler needs: get credentials in place.
pub trait CredentialProvisioner {
    fn provision<M: ModemPort>(&self, modem: &mut M);
}

/// Pushes configured keys into the stack.
#[derive(Debug, Clone, Copy)]
pub struct FixedCredentials(pub DeviceCredentials);

impl CredentialProvisioner for FixedCredentials {
    fn provision<M: ModemPort>(&self, modem: &mut M) {
        let c = &self.0;
        check_and_log("set_dev_eui", modem.set_dev_eui(&c.dev_eui));
        check_and_log("set_join_eui", modem.set_join_eui(&c.join_eui));
        check_and_log("set_app_key", modem.set_app_key(&c.app_key));
        check_and_log("set_nwk_key", modem.set_nwk_key(&c.nwk_key));
    }
}

/// Reads the chip EUI and PIN back from the secure element and logs them.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChipCredentials;

impl CredentialProvisioner for ChipCredentials {
    fn provision<M: ModemPort>(&self, modem: &mut M) {
        if let Ok(eui) = report("chip_eui", modem.chip_eui()) {
            info!("CHIP_EUI: {}", HexBytes(&eui));
        }
        if let Ok(pin) = report("chip_pin", modem.chip_pin()) {
            info!("CHIP_PIN: {}", HexBytes(&pin));
        }
    }
}

/// Runtime-selected provisioning strategy.
#[derive(Debug, Clone, Copy)]
pub enum Provisioner {
    Fixed(FixedCredentials),
    Chip(ChipCredentials),
}

impl Provisioner {
    pub fn from_source(source: &CredentialSource) -> Self {
        match source {
            CredentialSource::Fixed(creds) => Self::Fixed(FixedCredentials(*creds)),
            CredentialSource::ChipResident => Self::Chip(ChipCredentials),
        }
    }
}

impl CredentialProvisioner for Provisioner {
    fn provision<M: ModemPort>(&self, modem: &mut M) {
        match self {
            Self::Fixed(p) => p.provision(modem),
            Self::Chip(p) => p.provision(modem),
        }
    }
}

/// Formats a byte slice as space-separated hex, e.g. `00 16 C0 01`.
pub struct HexBytes<'a>(pub &'a [u8]);

impl core::fmt::Display for HexBytes<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:02X}", b)?;
        }
        Ok(())
    }
}

fn parse_hex<const N: usize>(s: &str) -> Option<[u8; N]> {
    let mut out = [0u8; N];
    let mut nibbles = 0usize;
    for b in s.bytes().filter(|b| !matches!(b, b':' | b'-' | b' ')) {
        let v = (b as char).to_digit(16)? as u8;
        let idx = nibbles / 2;
        if idx >= N {
            return None;
        }
        if nibbles % 2 == 0 {
            out[idx] = v << 4;
        } else {
            out[idx] |= v;
        }
        nibbles += 1;
    }
    (nibbles == N * 2).then_some(out)
}
