//! Power/timing gate — the last step of every loop iteration.
//!
//! The stack recommends how long it can stay idle; the gate clamps that to
//! the watchdog reload period and then, inside
//! [`McuPort::with_irq_masked`], makes the final sleep decision:
//!
//! ```text
//!  run_engine() ─▶ clamp ─▶ ┌──────────── interrupts masked ──────────┐
//!                           │ button armed? ── yes ─▶ skip             │
//!                           │ event signal? ── yes ─▶ skip             │
//!                           │ radio irq?    ── yes ─▶ skip             │
//!                           │ reload wdt ─▶ sleep(clamped)             │
//!                           │ reload wdt                               │
//!                           └──────────────────────────────────────────┘
//! ```
//!
//! No handler can raise a flag between the checks and the sleep. A press
//! in that window is caught by the button's level wake source instead.

use crate::app::ports::{McuPort, ModemPort};
use crate::drivers::button::PendingInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A button press is waiting for the loop.
    InputPending,
    /// The stack signalled events that have not been drained.
    EventPending,
    /// The radio raised an interrupt the engine has not serviced yet.
    RadioIrqPending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepOutcome {
    Slept { ms: u32 },
    Skipped(SkipReason),
}

pub struct PowerGate {
    max_sleep_ms: u32,
}

impl PowerGate {
    /// `max_sleep_ms` must stay below the hardware watchdog period.
    pub const fn new(max_sleep_ms: u32) -> Self {
        Self { max_sleep_ms }
    }

    pub const fn max_sleep_ms(&self) -> u32 {
        self.max_sleep_ms
    }

    /// Bound a recommended sleep so the watchdog is reloaded in time.
    pub fn clamp(&self, recommended_ms: u32) -> u32 {
        recommended_ms.min(self.max_sleep_ms)
    }

    /// Sleep unless something is pending. The watchdog is reloaded before
    /// sleeping, after waking, and when sleep is skipped.
    pub fn idle<M, U>(
        &self,
        recommended_ms: u32,
        input: &PendingInput,
        modem: &M,
        mcu: &mut U,
    ) -> SleepOutcome
    where
        M: ModemPort,
        U: McuPort,
    {
        let sleep_ms = self.clamp(recommended_ms);

        mcu.with_irq_masked(|mcu, cs| {
            let outcome = if input.is_set(cs) {
                SleepOutcome::Skipped(SkipReason::InputPending)
            } else if modem.event_signal_pending() {
                SleepOutcome::Skipped(SkipReason::EventPending)
            } else if modem.irq_flag_pending() {
                SleepOutcome::Skipped(SkipReason::RadioIrqPending)
            } else {
                mcu.watchdog_reload();
                mcu.sleep_for_ms(sleep_ms);
                SleepOutcome::Slept { ms: sleep_ms }
            };
            mcu.watchdog_reload();
            outcome
        })
    }
}
