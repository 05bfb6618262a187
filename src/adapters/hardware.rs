//! Hardware adapter — bridges real peripherals to domain port traits.
//!
//! | Type             | Implements                 | Backed by                         |
//! |------------------|----------------------------|-----------------------------------|
//! | `EspMcu`         | McuPort                    | ISR mask, light sleep, TWDT       |
//! | `EspAdc`         | AdcPort                    | ADC1 oneshot, bounded poll        |
//! | `SensorPowerPin` | `embedded_hal` OutputPin   | probe supply GPIO                 |
//!
//! `SensorPowerPin` builds on the host against the simulated GPIO layer;
//! the other two only exist on target.

use embedded_hal::digital::{ErrorKind, ErrorType, OutputPin};

use crate::drivers::hw_init::{self, HwInitError};
use crate::pins;

#[cfg(target_os = "espidf")]
use {
    crate::adapters::time::Esp32Clock,
    crate::app::ports::{AdcPort, McuPort},
    crate::drivers::watchdog::Watchdog,
    critical_section::CriticalSection,
    esp_idf_hal::delay::FreeRtos,
    esp_idf_hal::interrupt,
    esp_idf_svc::sys::*,
    log::debug,
};

// ── Probe supply ──────────────────────────────────────────────

impl embedded_hal::digital::Error for HwInitError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Switched supply of the moisture probe.
#[derive(Default)]
pub struct SensorPowerPin;

impl ErrorType for SensorPowerPin {
    type Error = HwInitError;
}

impl OutputPin for SensorPowerPin {
    fn set_high(&mut self) -> Result<(), HwInitError> {
        hw_init::gpio_write(pins::SENSOR_POWER_GPIO, true)
    }

    fn set_low(&mut self) -> Result<(), HwInitError> {
        hw_init::gpio_write(pins::SENSOR_POWER_GPIO, false)
    }
}

// ── MCU ───────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub struct EspMcu {
    watchdog: Watchdog,
}

#[cfg(target_os = "espidf")]
impl EspMcu {
    pub fn new(watchdog: Watchdog) -> Self {
        Self { watchdog }
    }
}

#[cfg(target_os = "espidf")]
impl McuPort for EspMcu {
    /// The `critical-section` implementation of esp-idf-hal is a task-level
    /// lock, so the button ISR could still run there. This masks interrupts
    /// on the core instead.
    fn with_irq_masked<R>(&mut self, f: impl FnOnce(&mut Self, CriticalSection<'_>) -> R) -> R {
        interrupt::free(|| {
            // SAFETY: interrupts are masked on this core for the closure's
            // lifetime, and the loop is the only task touching the flag.
            let cs = unsafe { CriticalSection::new() };
            f(self, cs)
        })
    }

    fn sleep_for_ms(&mut self, ms: u32) {
        if ms == 0 {
            return;
        }
        // SAFETY: main-loop only, inside `with_irq_masked`. The button's
        // edge interrupt is disabled while the level wake source replaces
        // it, so a held button cannot retrigger the ISR, and it is restored
        // on wake. A press after the flag check wakes the core by level.
        unsafe {
            gpio_intr_disable(pins::BUTTON_GPIO);
            esp_sleep_enable_timer_wakeup(u64::from(ms) * 1_000);
            gpio_wakeup_enable(pins::BUTTON_GPIO, gpio_int_type_t_GPIO_INTR_LOW_LEVEL);
            let ret = esp_light_sleep_start();
            gpio_wakeup_disable(pins::BUTTON_GPIO);
            gpio_set_intr_type(pins::BUTTON_GPIO, gpio_int_type_t_GPIO_INTR_NEGEDGE);
            gpio_intr_enable(pins::BUTTON_GPIO);
            if ret != ESP_OK {
                debug!("light sleep rejected ({})", ret);
            }
        }
    }

    fn watchdog_reload(&mut self) {
        self.watchdog.reload();
    }

    fn reset(&mut self) {
        // SAFETY: does not return.
        unsafe { esp_restart() }
    }
}

// ── ADC ───────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub struct EspAdc {
    channel: u32,
    clock: Esp32Clock,
    started: bool,
    value: Option<u16>,
}

#[cfg(target_os = "espidf")]
impl EspAdc {
    pub fn new(channel: u32, clock: Esp32Clock) -> Self {
        Self {
            channel,
            clock,
            started: false,
            value: None,
        }
    }
}

#[cfg(target_os = "espidf")]
impl AdcPort for EspAdc {
    fn start(&mut self) {
        self.started = true;
        self.value = None;
    }

    fn poll_for_conversion(&mut self, timeout_ms: u32) -> bool {
        if !self.started {
            return false;
        }
        let begin = self.clock.now_ms();
        loop {
            if let Some(raw) = hw_init::adc1_read(self.channel) {
                self.value = Some(raw);
                return true;
            }
            if self.clock.now_ms().wrapping_sub(begin) >= timeout_ms {
                return false;
            }
            FreeRtos::delay_ms(1);
        }
    }

    fn value(&mut self) -> u16 {
        self.value.unwrap_or(0)
    }

    fn stop(&mut self) {
        self.started = false;
    }
}
