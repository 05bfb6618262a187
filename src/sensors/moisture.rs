//! Capacitive soil-moisture probe on a switched supply.
//!
//! The probe draws current whenever it is powered, so it is only switched
//! on for a single conversion:
//!
//! ```text
//!  power on ─▶ settle ─▶ start ─▶ poll (bounded) ─▶ read ─▶ stop ─▶ power off
//! ```
//!
//! A poll timeout is a failed sample. The conversion is still stopped and
//! the probe still powered off, but no value is returned.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::{info, warn};

use super::SensorSample;
use crate::app::ports::{AdcPort, SensorPort};
use crate::error::SensorError;

pub struct MoistureSensor<P, D, A> {
    power: P,
    delay: D,
    adc: A,
    settle_ms: u32,
    timeout_ms: u32,
}

impl<P, D, A> MoistureSensor<P, D, A>
where
    P: OutputPin,
    D: DelayNs,
    A: AdcPort,
{
    pub fn new(power: P, delay: D, adc: A, settle_ms: u32, timeout_ms: u32) -> Self {
        Self {
            power,
            delay,
            adc,
            settle_ms,
            timeout_ms,
        }
    }

    /// Run one power-up → convert → power-down sequence.
    pub fn read(&mut self) -> Result<SensorSample, SensorError> {
        self.power.set_high().map_err(|_| SensorError::PowerPinFailed)?;
        self.delay.delay_ms(self.settle_ms);

        self.adc.start();
        let converted = self.adc.poll_for_conversion(self.timeout_ms);
        let raw = if converted { Some(self.adc.value()) } else { None };
        self.adc.stop();

        let powered_down = self.power.set_low();

        let raw = raw.ok_or(SensorError::ConversionTimeout)?;
        if powered_down.is_err() {
            warn!("moisture: probe power-down failed");
            return Err(SensorError::PowerPinFailed);
        }
        info!("moisture: raw={}", raw);
        Ok(SensorSample::new(raw))
    }
}

impl<P, D, A> SensorPort for MoistureSensor<P, D, A>
where
    P: OutputPin,
    D: DelayNs,
    A: AdcPort,
{
    fn sample(&mut self) -> Result<SensorSample, SensorError> {
        self.read()
    }
}
