//! GPIO / peripheral pin assignments for the soil-moisture node board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers. The radio's SPI bus and control lines belong to
//! the modem component's HAL and are not listed here.

// ---------------------------------------------------------------------------
// Moisture probe (capacitive, switched supply)
// ---------------------------------------------------------------------------

/// Digital output: HIGH powers the probe.
pub const SENSOR_POWER_GPIO: i32 = 4;

/// Probe analog output. ADC1 channel 4 (GPIO 5 on ESP32-S3).
pub const MOISTURE_ADC_GPIO: i32 = 5;
pub const MOISTURE_ADC_CHANNEL: u32 = 4;

// ---------------------------------------------------------------------------
// Radio
// ---------------------------------------------------------------------------

/// Radio IRQ line (active HIGH). Only used here as a light-sleep wake source.
pub const RADIO_IRQ_GPIO: i32 = 9;

// ---------------------------------------------------------------------------
// User button (active-low with external pull-up)
// ---------------------------------------------------------------------------

/// Momentary push-button requesting an immediate uplink.
pub const BUTTON_GPIO: i32 = 16;
