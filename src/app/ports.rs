//! Port traits — the hexagonal boundary between the control loop and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Dispatcher / NodeService (domain)
//! ```
//!
//! The wireless stack, the MCU HAL and the analog front-end are external
//! collaborators. Adapters in [`crate::adapters`] bind them on target; the
//! integration tests bind them to recording mocks.

use critical_section::CriticalSection;

use crate::config::Region;
use crate::credentials::{AesKey, ChipPin, Eui64};
use crate::error::{ModemResult, SensorError};
use crate::events::{Downlink, ModemEvent, ModemStatus, RelayActivationMode, RelaySyncStatus};
use crate::sensors::SensorSample;

// ───────────────────────────────────────────────────────────────
// Wireless stack port
// ───────────────────────────────────────────────────────────────

/// The LoRaWAN stack as seen by the node. The adapter owns the stack id.
pub trait ModemPort {
    /// Whether the stack signalled new events since the last call. Clears
    /// the signal.
    fn take_event_signal(&mut self) -> bool;

    /// Pop the next queued event and the number still pending behind it.
    fn next_event(&mut self) -> ModemResult<(ModemEvent, u8)>;

    fn status(&mut self) -> ModemResult<ModemStatus>;

    // ── Credentials ──
    fn set_dev_eui(&mut self, eui: &Eui64) -> ModemResult<()>;
    fn set_join_eui(&mut self, eui: &Eui64) -> ModemResult<()>;
    fn set_app_key(&mut self, key: &AesKey) -> ModemResult<()>;
    fn set_nwk_key(&mut self, key: &AesKey) -> ModemResult<()>;
    fn chip_eui(&mut self) -> ModemResult<Eui64>;
    fn chip_pin(&mut self) -> ModemResult<ChipPin>;

    // ── Network ──
    fn set_region(&mut self, region: Region) -> ModemResult<()>;
    fn join_network(&mut self) -> ModemResult<()>;

    // ── Relay TX ──
    fn relay_tx_enable(&mut self) -> ModemResult<()>;
    fn relay_tx_is_enabled(&mut self) -> ModemResult<bool>;
    fn relay_tx_activation_mode(&mut self) -> ModemResult<RelayActivationMode>;
    fn relay_tx_sync_status(&mut self) -> ModemResult<RelaySyncStatus>;

    // ── Traffic ──
    /// Start the one-shot application alarm.
    fn alarm_start_timer(&mut self, seconds: u32) -> ModemResult<()>;
    fn downlink(&mut self) -> ModemResult<Downlink>;
    fn request_uplink(&mut self, port: u8, confirmed: bool, payload: &[u8]) -> ModemResult<()>;

    // ── Scheduling ──
    /// Run the stack's engine; returns the recommended sleep in milliseconds.
    fn run_engine(&mut self) -> u32;
    /// Whether the radio has raised an interrupt the engine has not serviced.
    fn irq_flag_pending(&self) -> bool;
    /// Whether an event signal is raised, without clearing it.
    fn event_signal_pending(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// MCU port
// ───────────────────────────────────────────────────────────────

/// Interrupt mask, sleep, watchdog and reset of the host MCU.
pub trait McuPort {
    /// Run `f` with interrupts masked on this core. Wake sources stay armed
    /// in hardware, so an edge during the section still ends a sleep.
    ///
    /// The default goes through the `critical-section` implementation,
    /// which is enough when nothing preempts the loop.
    fn with_irq_masked<R>(&mut self, f: impl FnOnce(&mut Self, CriticalSection<'_>) -> R) -> R
    where
        Self: Sized,
    {
        critical_section::with(|cs| f(self, cs))
    }

    /// Enter low-power sleep for at most `ms` milliseconds.
    fn sleep_for_ms(&mut self, ms: u32);

    fn watchdog_reload(&mut self);

    /// Reset the device. Does not return on hardware.
    fn reset(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Sensor port (hardware → domain)
// ───────────────────────────────────────────────────────────────

/// One complete acquisition of the moisture reading.
pub trait SensorPort {
    fn sample(&mut self) -> Result<SensorSample, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Analog front-end port
// ───────────────────────────────────────────────────────────────

/// Single-channel ADC used for the moisture probe.
pub trait AdcPort {
    fn start(&mut self);

    /// Wait for end of conversion; `false` if `timeout_ms` elapsed first.
    fn poll_for_conversion(&mut self, timeout_ms: u32) -> bool;

    /// Last converted value (12-bit).
    fn value(&mut self) -> u16;

    fn stop(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`NodeEvent`](super::events::NodeEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::NodeEvent);
}
