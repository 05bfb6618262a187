//! Outbound node events.
//!
//! The dispatcher and the node service emit these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters decide what to do
//! with them; on target they go to the serial log.

use crate::error::SensorError;
use crate::events::{Downlink, RelayStatus};

/// Why an uplink request was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UplinkTrigger {
    Joined,
    Alarm,
    Button,
}

/// Why the node is about to reset itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetReason {
    /// Firmware management asked for an immediate reboot.
    FirmwareManagement,
    /// The periodic alarm could not be re-armed.
    AlarmArmFailed,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum NodeEvent {
    /// Moisture sample handed to the stack.
    UplinkQueued { trigger: UplinkTrigger, port: u8, raw: u16 },

    /// Sampling failed; nothing was transmitted.
    SampleFailed { trigger: UplinkTrigger, error: SensorError },

    /// Button press arrived before the node joined and was discarded.
    PressDiscarded,

    /// Join accepted by the network.
    Joined,

    /// One downlink chunk received.
    Downlink(Downlink),

    /// Relay TX sub-state refreshed.
    RelayStatus(RelayStatus),

    /// The node is resetting itself.
    Resetting(ResetReason),

    /// Loop slept for `ms` milliseconds.
    Slept { ms: u32 },
}
