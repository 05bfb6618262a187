//! ISR-debounced user button: a falling edge becomes a "send now" request.
//!
//! ## Hardware
//!
//! Active-low momentary switch with pull-up. The GPIO fires on the falling
//! edge; the ISR calls [`Debouncer::on_edge`], which accepts the edge only
//! if more than the debounce window has passed since the last accepted
//! one, and raises the shared [`PendingInput`] flag.
//!
//! ## States
//!
//! | State | Meaning                         | Left by                          |
//! |-------|---------------------------------|----------------------------------|
//! | Idle  | no request outstanding          | accepted edge → Armed            |
//! | Armed | a press is waiting for the loop | [`PendingInput::take`] → Idle    |
//!
//! The ISR never blocks and never talks to the stack.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use critical_section::CriticalSection;

pub const DEBOUNCE_MS: u32 = 500;

/// Single-producer (ISR) / single-consumer (main loop) request flag.
pub struct PendingInput {
    armed: AtomicBool,
}

impl Default for PendingInput {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingInput {
    pub const fn new() -> Self {
        Self {
            armed: AtomicBool::new(false),
        }
    }

    /// ISR side. Lock-free.
    pub fn raise(&self) {
        self.armed.store(true, Ordering::Release);
    }

    /// Main-loop side: consume the request, returning whether one was armed.
    pub fn take(&self) -> bool {
        self.armed.swap(false, Ordering::AcqRel)
    }

    /// Read for the sleep decision. Requires interrupts masked so no press
    /// can land between this read and the sleep.
    pub fn is_set(&self, _cs: CriticalSection<'_>) -> bool {
        self.armed.load(Ordering::Acquire)
    }
}

/// Edge filter owned by the ISR.
pub struct Debouncer {
    window_ms: AtomicU32,
    last_accepted_ms: AtomicU32,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEBOUNCE_MS)
    }
}

impl Debouncer {
    pub const fn new(window_ms: u32) -> Self {
        Self {
            window_ms: AtomicU32::new(window_ms),
            last_accepted_ms: AtomicU32::new(0),
        }
    }

    /// Change the window. Call before the ISR is installed.
    pub fn set_window(&self, window_ms: u32) {
        self.window_ms.store(window_ms, Ordering::Relaxed);
    }

    /// Handle one falling edge at `now_ms`. Returns `true` if accepted.
    pub fn on_edge(&self, now_ms: u32, pending: &PendingInput) -> bool {
        let last = self.last_accepted_ms.load(Ordering::Relaxed);
        let window = self.window_ms.load(Ordering::Relaxed);
        // Signed difference so a 32-bit clock wrap still reads as "later".
        let elapsed = now_ms.wrapping_sub(last) as i32;
        if elapsed > window as i32 {
            self.last_accepted_ms.store(now_ms, Ordering::Relaxed);
            pending.raise();
            true
        } else {
            false
        }
    }

    #[cfg(test)]
    fn last_accepted_ms(&self) -> u32 {
        self.last_accepted_ms.load(Ordering::Relaxed)
    }
}

// ── Board instance ────────────────────────────────────────────

/// Request flag shared by the button ISR and the main loop.
pub static BUTTON_REQUEST: PendingInput = PendingInput::new();

static BUTTON_DEBOUNCER: Debouncer = Debouncer::new(DEBOUNCE_MS);

/// Called from the GPIO ISR with the current uptime in milliseconds.
pub fn button_isr_handler(now_ms: u32) -> bool {
    BUTTON_DEBOUNCER.on_edge(now_ms, &BUTTON_REQUEST)
}

/// Apply the configured debounce window. Call before the ISR is installed.
pub fn set_debounce_window(window_ms: u32) {
    BUTTON_DEBOUNCER.set_window(window_ms);
}
