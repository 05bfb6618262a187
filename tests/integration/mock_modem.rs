//! Mock ports for integration tests.
//!
//! Records every stack and MCU call so tests can assert on the full call
//! history without a radio, a watchdog, or an ADC.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};

use soilnode::app::events::NodeEvent;
use soilnode::app::ports::{EventSink, McuPort, ModemPort, SensorPort};
use soilnode::config::Region;
use soilnode::credentials::{AesKey, ChipPin, Eui64};
use soilnode::drivers::button::PendingInput;
use soilnode::error::{ModemError, ModemResult, SensorError};
use soilnode::events::{
    Downlink, DownlinkMetadata, ModemEvent, ModemStatus, RelayActivationMode, RelaySyncStatus,
    RxWindow,
};
use soilnode::sensors::SensorSample;

// ── Stack call record ─────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModemCall {
    Status,
    SetDevEui(Eui64),
    SetJoinEui(Eui64),
    SetAppKey(AesKey),
    SetNwkKey(AesKey),
    ChipEui,
    ChipPin,
    SetRegion(Region),
    JoinNetwork,
    RelayTxEnable,
    RelayTxIsEnabled,
    RelayTxActivationMode,
    RelayTxSyncStatus,
    AlarmStart(u32),
    Downlink,
    Uplink { port: u8, confirmed: bool, payload: Vec<u8> },
    RunEngine,
}

// ── MockModem ─────────────────────────────────────────────────

pub struct MockModem {
    pub calls: Vec<ModemCall>,
    pub queue: VecDeque<ModemEvent>,
    pub signal: bool,
    pub failures: HashMap<&'static str, ModemError>,
    pub status: ModemStatus,
    pub downlinks: VecDeque<Downlink>,
    pub relay_enabled: bool,
    pub relay_mode: RelayActivationMode,
    pub relay_sync: RelaySyncStatus,
    pub chip_eui: Eui64,
    pub sleep_ms: u32,
    pub irq_pending: bool,
    /// Raised from inside `run_engine`, standing in for an ISR firing
    /// while the loop is busy.
    pub press_during_engine: Option<&'static PendingInput>,
    /// Events the stack reports from inside each `run_engine` call.
    pub engine_events: VecDeque<Vec<ModemEvent>>,
}

impl MockModem {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            queue: VecDeque::new(),
            signal: false,
            failures: HashMap::new(),
            status: ModemStatus(0),
            downlinks: VecDeque::new(),
            relay_enabled: true,
            relay_mode: RelayActivationMode::Dynamic,
            relay_sync: RelaySyncStatus::Sync,
            chip_eui: [0x00, 0x16, 0xC0, 0x01, 0xFF, 0xFE, 0x00, 0x01],
            sleep_ms: 1_000,
            irq_pending: false,
            press_during_engine: None,
            engine_events: VecDeque::new(),
        }
    }

    /// Queue events and raise the stack's event signal.
    pub fn push_events(&mut self, events: &[ModemEvent]) {
        self.queue.extend(events.iter().copied());
        self.signal = true;
    }

    pub fn fail(&mut self, call: &'static str, error: ModemError) {
        self.failures.insert(call, error);
    }

    pub fn uplinks(&self) -> Vec<(u8, bool, Vec<u8>)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ModemCall::Uplink { port, confirmed, payload } => {
                    Some((*port, *confirmed, payload.clone()))
                }
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, call: &ModemCall) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }

    pub fn alarm_arms(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, ModemCall::AlarmStart(_)))
            .count()
    }

    /// Calls other than engine runs and status polls.
    pub fn config_calls(&self) -> Vec<ModemCall> {
        self.calls
            .iter()
            .filter(|c| !matches!(c, ModemCall::RunEngine | ModemCall::Status))
            .cloned()
            .collect()
    }

    fn record<T>(&mut self, name: &'static str, call: ModemCall, ok: T) -> ModemResult<T> {
        self.calls.push(call);
        match self.failures.get(name) {
            Some(e) => Err(*e),
            None => Ok(ok),
        }
    }
}

impl Default for MockModem {
    fn default() -> Self {
        Self::new()
    }
}

impl ModemPort for MockModem {
    fn take_event_signal(&mut self) -> bool {
        std::mem::take(&mut self.signal)
    }

    fn next_event(&mut self) -> ModemResult<(ModemEvent, u8)> {
        if let Some(e) = self.failures.get("next_event") {
            return Err(*e);
        }
        let event = self.queue.pop_front().ok_or(ModemError::NoEventAvailable)?;
        Ok((event, self.queue.len() as u8))
    }

    fn status(&mut self) -> ModemResult<ModemStatus> {
        let status = self.status;
        self.record("status", ModemCall::Status, status)
    }

    fn set_dev_eui(&mut self, eui: &Eui64) -> ModemResult<()> {
        self.record("set_dev_eui", ModemCall::SetDevEui(*eui), ())
    }

    fn set_join_eui(&mut self, eui: &Eui64) -> ModemResult<()> {
        self.record("set_join_eui", ModemCall::SetJoinEui(*eui), ())
    }

    fn set_app_key(&mut self, key: &AesKey) -> ModemResult<()> {
        self.record("set_app_key", ModemCall::SetAppKey(*key), ())
    }

    fn set_nwk_key(&mut self, key: &AesKey) -> ModemResult<()> {
        self.record("set_nwk_key", ModemCall::SetNwkKey(*key), ())
    }

    fn chip_eui(&mut self) -> ModemResult<Eui64> {
        let eui = self.chip_eui;
        self.record("chip_eui", ModemCall::ChipEui, eui)
    }

    fn chip_pin(&mut self) -> ModemResult<ChipPin> {
        self.record("chip_pin", ModemCall::ChipPin, [0xDE, 0xAD, 0xBE, 0xEF])
    }

    fn set_region(&mut self, region: Region) -> ModemResult<()> {
        self.record("set_region", ModemCall::SetRegion(region), ())
    }

    fn join_network(&mut self) -> ModemResult<()> {
        self.record("join_network", ModemCall::JoinNetwork, ())
    }

    fn relay_tx_enable(&mut self) -> ModemResult<()> {
        self.record("relay_tx_enable", ModemCall::RelayTxEnable, ())
    }

    fn relay_tx_is_enabled(&mut self) -> ModemResult<bool> {
        let enabled = self.relay_enabled;
        self.record("relay_tx_is_enabled", ModemCall::RelayTxIsEnabled, enabled)
    }

    fn relay_tx_activation_mode(&mut self) -> ModemResult<RelayActivationMode> {
        let mode = self.relay_mode;
        self.record("relay_tx_activation_mode", ModemCall::RelayTxActivationMode, mode)
    }

    fn relay_tx_sync_status(&mut self) -> ModemResult<RelaySyncStatus> {
        let sync = self.relay_sync;
        self.record("relay_tx_sync_status", ModemCall::RelayTxSyncStatus, sync)
    }

    fn alarm_start_timer(&mut self, seconds: u32) -> ModemResult<()> {
        self.record("alarm_start_timer", ModemCall::AlarmStart(seconds), ())
    }

    fn downlink(&mut self) -> ModemResult<Downlink> {
        self.calls.push(ModemCall::Downlink);
        if let Some(e) = self.failures.get("downlink") {
            return Err(*e);
        }
        self.downlinks.pop_front().ok_or(ModemError::NoEventAvailable)
    }

    fn request_uplink(&mut self, port: u8, confirmed: bool, payload: &[u8]) -> ModemResult<()> {
        let call = ModemCall::Uplink {
            port,
            confirmed,
            payload: payload.to_vec(),
        };
        self.record("request_uplink", call, ())
    }

    fn run_engine(&mut self) -> u32 {
        self.calls.push(ModemCall::RunEngine);
        if let Some(input) = self.press_during_engine.take() {
            input.raise();
        }
        if let Some(events) = self.engine_events.pop_front() {
            if !events.is_empty() {
                self.push_events(&events);
            }
        }
        self.sleep_ms
    }

    fn irq_flag_pending(&self) -> bool {
        self.irq_pending
    }

    fn event_signal_pending(&self) -> bool {
        self.signal
    }
}

/// One downlink chunk on `fport` with `remaining` chunks behind it.
pub fn downlink(fport: u8, payload: &[u8], remaining: u8) -> Downlink {
    Downlink {
        payload: heapless::Vec::from_slice(payload).unwrap(),
        metadata: DownlinkMetadata {
            fport,
            rssi_dbm: -87,
            snr_db: 7,
            window: RxWindow::Rx1,
        },
        remaining,
    }
}

// ── MockMcu ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum McuCall {
    WatchdogReload,
    Sleep(u32),
    Reset,
}

#[derive(Default)]
pub struct MockMcu {
    pub calls: Vec<McuCall>,
    pub masked_sections: usize,
    pub sleeps_outside_mask: usize,
    masked: bool,
}

impl MockMcu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slept(&self) -> Vec<u32> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                McuCall::Sleep(ms) => Some(*ms),
                _ => None,
            })
            .collect()
    }
}

impl McuPort for MockMcu {
    fn with_irq_masked<R>(
        &mut self,
        f: impl FnOnce(&mut Self, critical_section::CriticalSection<'_>) -> R,
    ) -> R {
        self.masked_sections += 1;
        critical_section::with(|cs| {
            self.masked = true;
            let r = f(self, cs);
            self.masked = false;
            r
        })
    }

    fn sleep_for_ms(&mut self, ms: u32) {
        if !self.masked {
            self.sleeps_outside_mask += 1;
        }
        self.calls.push(McuCall::Sleep(ms));
    }

    fn watchdog_reload(&mut self) {
        self.calls.push(McuCall::WatchdogReload);
    }

    fn reset(&mut self) {
        self.calls.push(McuCall::Reset);
    }
}

// ── MockSensor ────────────────────────────────────────────────

pub struct MockSensor {
    pub result: Result<SensorSample, SensorError>,
    pub samples: usize,
}

impl MockSensor {
    pub fn reading(raw: u16) -> Self {
        Self {
            result: Ok(SensorSample::new(raw)),
            samples: 0,
        }
    }

    pub fn failing(error: SensorError) -> Self {
        Self {
            result: Err(error),
            samples: 0,
        }
    }
}

impl SensorPort for MockSensor {
    fn sample(&mut self) -> Result<SensorSample, SensorError> {
        self.samples += 1;
        self.result
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<NodeEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&NodeEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &NodeEvent) {
        self.events.push(event.clone());
    }
}
