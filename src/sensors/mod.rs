//! Sensor subsystem — the capacitive soil-moisture probe.
//!
//! A [`SensorSample`] only exists between power-up and power-down of the
//! probe; nothing is cached or persisted.

pub mod moisture;

/// Full-scale value of the 12-bit converter.
pub const ADC_FULL_SCALE: u16 = 0x0FFF;

/// One raw moisture reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorSample(u16);

impl SensorSample {
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u16 {
        self.0
    }
}
