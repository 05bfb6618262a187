//! SoilNode Firmware — Main Entry Point
//!
//! Periodic LoRaWAN soil-moisture uplinks with relay TX, on a single
//! polling super-loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  LbmModem      EspMcu        EspAdc + SensorPowerPin           │
//! │  (ModemPort)   (McuPort)     (AdcPort, OutputPin)              │
//! │  LogEventSink  button ISR → BUTTON_REQUEST                     │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            NodeService (pure logic)                    │    │
//! │  │  Dispatcher · AlarmScheduler · PowerGate               │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use log::{error, info, warn};

use soilnode::adapters::hardware::{EspAdc, EspMcu, SensorPowerPin};
use soilnode::adapters::log_sink::LogEventSink;
use soilnode::adapters::modem::LbmModem;
use soilnode::adapters::time::Esp32Clock;
use soilnode::app::service::{NodeService, StepOutcome};
use soilnode::config::NodeConfig;
use soilnode::credentials::{CredentialSource, DeviceCredentials};
use soilnode::drivers::button::{self, BUTTON_REQUEST};
use soilnode::drivers::hw_init;
use soilnode::drivers::watchdog::Watchdog;
use soilnode::pins;
use soilnode::sensors::moisture::MoistureSensor;

/// Credentials baked in at build time, if all four are provided.
fn build_time_credentials() -> Option<DeviceCredentials> {
    let dev_eui = option_env!("SOILNODE_DEV_EUI")?;
    let join_eui = option_env!("SOILNODE_JOIN_EUI")?;
    let app_key = option_env!("SOILNODE_APP_KEY")?;
    let nwk_key = option_env!("SOILNODE_NWK_KEY")?;
    let creds = DeviceCredentials::from_hex(dev_eui, join_eui, app_key, nwk_key);
    if creds.is_none() {
        warn!("Build-time credentials malformed, falling back to chip-resident");
    }
    creds
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  SoilNode v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("║  periodic uplink · relay TX          ║");
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let mut config = match option_env!("SOILNODE_CONFIG_JSON") {
        Some(json) => NodeConfig::from_json(json)?,
        None => NodeConfig::default(),
    };
    if let Some(creds) = build_time_credentials() {
        config.credentials = CredentialSource::Fixed(creds);
    }
    let mut node = NodeService::new(&config)?;
    button::set_debounce_window(config.debounce_ms);

    // ── 3. Peripherals + stack (button ISR last) ──────────────
    if let Err(e) = hw_init::init_peripherals() {
        error!("HAL init failed: {}, halting", e);
        return Err(soilnode::error::Error::from(e).into());
    }
    let watchdog = Watchdog::new();
    let mut modem = LbmModem::init(config.stack_id);
    hw_init::init_isr_service().map_err(soilnode::error::Error::from)?;

    // ── 4. Adapters ───────────────────────────────────────────
    let mut mcu = EspMcu::new(watchdog);
    let adc = EspAdc::new(pins::MOISTURE_ADC_CHANNEL, Esp32Clock::new());
    let mut sensor = MoistureSensor::new(
        SensorPowerPin,
        FreeRtos,
        adc,
        config.sensor_settle_ms,
        config.adc_timeout_ms,
    );
    let mut sink = LogEventSink::new();

    info!("Entering main loop");

    // ── 5. Super-loop ─────────────────────────────────────────
    loop {
        if let StepOutcome::Reset(reason) =
            node.step(&BUTTON_REQUEST, &mut modem, &mut mcu, &mut sensor, &mut sink)
        {
            // esp_restart() does not return; reaching here means it was refused.
            error!("Reset ({:?}) did not take effect", reason);
        }
    }
}
