//! Periodic uplink cadence on top of the stack's one-shot alarm.
//!
//! The stack only offers a single-shot countdown. The cadence exists
//! because every consumer of an Alarm event re-arms it with the same
//! period before returning:
//!
//! ```text
//!  Joined ──▶ arm ──▶ … period … ──▶ Alarm ──▶ uplink ──▶ arm ──▶ …
//! ```
//!
//! A failed arm ends the cadence for good, so callers treat it as fatal.

use log::debug;

use crate::app::ports::ModemPort;
use crate::error::{ModemResult, report};

#[derive(Debug)]
pub struct AlarmScheduler {
    period_s: u32,
    armed: bool,
    arm_count: u32,
    fire_count: u32,
}

impl AlarmScheduler {
    pub const fn new(period_s: u32) -> Self {
        Self {
            period_s,
            armed: false,
            arm_count: 0,
            fire_count: 0,
        }
    }

    /// Start the countdown for one period.
    pub fn arm<M: ModemPort>(&mut self, modem: &mut M) -> ModemResult<()> {
        report("alarm_start_timer", modem.alarm_start_timer(self.period_s))?;
        self.armed = true;
        self.arm_count = self.arm_count.saturating_add(1);
        debug!("alarm: armed for {}s (arm #{})", self.period_s, self.arm_count);
        Ok(())
    }

    /// Record an Alarm event. The alarm is disarmed until [`arm`](Self::arm).
    pub fn on_fired(&mut self) {
        self.armed = false;
        self.fire_count = self.fire_count.saturating_add(1);
    }

    /// The stack was reset and dropped any running countdown.
    pub fn on_reset(&mut self) {
        self.armed = false;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn period_s(&self) -> u32 {
        self.period_s
    }

    pub fn arm_count(&self) -> u32 {
        self.arm_count
    }

    pub fn fire_count(&self) -> u32 {
        self.fire_count
    }
}
