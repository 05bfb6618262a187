//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements          | Connects to                  |
//! |------------|---------------------|------------------------------|
//! | `modem`    | ModemPort           | LoRa Basics Modem C API      |
//! | `hardware` | McuPort             | ESP32 light sleep, TWDT      |
//! |            | AdcPort             | ESP32 ADC1 oneshot           |
//! |            | OutputPin           | Probe supply GPIO            |
//! | `log_sink` | EventSink           | Serial log output            |
//! | `time`     | (clock)             | ESP32 system timer           |

pub mod hardware;
pub mod log_sink;
#[cfg(target_os = "espidf")]
pub mod modem;
pub mod time;
