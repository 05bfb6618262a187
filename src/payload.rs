//! Moisture uplink payload: one 12-bit reading, big-endian in two bytes.
//!
//! ```text
//!  byte 0: (raw >> 8) & 0xFF
//!  byte 1:  raw       & 0xFF
//! ```

use crate::sensors::SensorSample;

pub const PAYLOAD_LEN: usize = 2;

/// Ephemeral uplink: built, handed to the stack, dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UplinkPayload {
    pub port: u8,
    pub bytes: [u8; PAYLOAD_LEN],
}

impl UplinkPayload {
    pub fn encode(sample: SensorSample, port: u8) -> Self {
        Self {
            port,
            bytes: sample.raw().to_be_bytes(),
        }
    }

    pub fn decode(bytes: [u8; PAYLOAD_LEN]) -> u16 {
        u16::from_be_bytes(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}
