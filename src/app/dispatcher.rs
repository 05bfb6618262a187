//! Event dispatcher — drains the stack's event queue, one handler per event.
//!
//! ```text
//!  next_event() ─▶ (event, pending) ─▶ dispatch(event) ─▶ pending > 0 ? ─┐
//!       ▲                                                               │
//!       └───────────────────────────── yes ──────────────────────────────┘
//! ```
//!
//! The stack may coalesce several events before the dispatcher runs, so
//! this is a drain-to-empty loop, not a fixed batch. Every stack call made
//! by a handler goes through [`report`]; a failed call is logged and the
//! drain carries on. Two paths are fatal and end the drain with
//! [`Directive::Reset`]: a firmware-management reboot request, and a
//! periodic alarm that could not be re-armed.

use log::{debug, info, warn};

use super::events::{NodeEvent, ResetReason, UplinkTrigger};
use super::ports::{EventSink, ModemPort, SensorPort};
use crate::config::{NodeConfig, Region};
use crate::credentials::{CredentialProvisioner, HexBytes, Provisioner};
use crate::drivers::button::PendingInput;
use crate::error::{check_and_log, report};
use crate::events::{FmpStatus, ModemEvent, ModemStatus, RelayStatus};
use crate::payload::UplinkPayload;
use crate::scheduler::AlarmScheduler;

/// Upper bound on downlink chunks pulled for a single DownlinkData event.
pub const MAX_DOWNLINK_PULLS: usize = 8;

/// What the loop must do once dispatch returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Continue,
    Reset(ResetReason),
}

/// The ports a handler may touch, borrowed for one dispatch.
pub struct Ports<'a, M, S, E> {
    pub modem: &'a mut M,
    pub sensor: &'a mut S,
    pub sink: &'a mut E,
}

/// Counters kept for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub events: u32,
    pub uplinks: u32,
    pub tx_done: u32,
    pub join_failures: u32,
    pub downlinks: u32,
    pub unknown: u32,
}

pub struct Dispatcher {
    provisioner: Provisioner,
    region: Region,
    periodic_port: u8,
    button_port: u8,
    alarm: AlarmScheduler,
    relay: RelayStatus,
    joined: bool,
    stats: DispatchStats,
}

impl Dispatcher {
    pub fn new(config: &NodeConfig) -> Self {
        Self {
            provisioner: Provisioner::from_source(&config.credentials),
            region: config.region,
            periodic_port: config.periodic_port,
            button_port: config.button_port,
            alarm: AlarmScheduler::new(config.uplink_period_s),
            relay: RelayStatus::default(),
            joined: false,
            stats: DispatchStats::default(),
        }
    }

    // ── Queue drain ───────────────────────────────────────────

    /// Process events until the stack reports none pending.
    pub fn drain<M, S, E>(&mut self, ports: &mut Ports<'_, M, S, E>) -> Directive
    where
        M: ModemPort,
        S: SensorPort,
        E: EventSink,
    {
        loop {
            let Ok((event, pending)) = report("next_event", ports.modem.next_event()) else {
                return Directive::Continue;
            };

            if let Directive::Reset(reason) = self.dispatch(event, ports) {
                warn!("dispatch: device reset requested ({:?})", reason);
                ports.sink.emit(&NodeEvent::Resetting(reason));
                return Directive::Reset(reason);
            }

            if pending == 0 {
                return Directive::Continue;
            }
        }
    }

    /// Handle exactly one event.
    pub fn dispatch<M, S, E>(&mut self, event: ModemEvent, ports: &mut Ports<'_, M, S, E>) -> Directive
    where
        M: ModemPort,
        S: SensorPort,
        E: EventSink,
    {
        self.stats.events = self.stats.events.saturating_add(1);
        log_received(&event);

        match event {
            ModemEvent::Reset => {
                self.on_reset(ports.modem);
                Directive::Continue
            }
            ModemEvent::Joined => self.on_joined(ports),
            ModemEvent::Alarm => self.on_alarm(ports),
            ModemEvent::TxDone => {
                self.stats.tx_done = self.stats.tx_done.saturating_add(1);
                Directive::Continue
            }
            ModemEvent::DownlinkData => {
                self.on_downlink(ports);
                Directive::Continue
            }
            ModemEvent::JoinFail => {
                self.stats.join_failures = self.stats.join_failures.saturating_add(1);
                Directive::Continue
            }
            ModemEvent::FirmwareManagement { status } => match status {
                FmpStatus::RebootImmediately => Directive::Reset(ResetReason::FirmwareManagement),
                FmpStatus::Other(_) => Directive::Continue,
            },
            ModemEvent::RelayTxDynamic => {
                if let Ok(enabled) = report("relay_tx_is_enabled", ports.modem.relay_tx_is_enabled()) {
                    info!(
                        "Relay TX dynamic mode is now {}",
                        if enabled { "enable" } else { "disable" }
                    );
                    self.relay.dynamic_enabled = Some(enabled);
                    ports.sink.emit(&NodeEvent::RelayStatus(self.relay));
                }
                Directive::Continue
            }
            ModemEvent::RelayTxMode => {
                if let Ok(mode) =
                    report("relay_tx_activation_mode", ports.modem.relay_tx_activation_mode())
                {
                    info!("Relay TX activation mode is now {}", mode.name());
                    self.relay.activation_mode = Some(mode);
                    ports.sink.emit(&NodeEvent::RelayStatus(self.relay));
                }
                Directive::Continue
            }
            ModemEvent::RelayTxSync => {
                if let Ok(sync) = report("relay_tx_sync_status", ports.modem.relay_tx_sync_status()) {
                    info!("Relay TX synchronisation status is now {}", sync.name());
                    self.relay.sync = Some(sync);
                    ports.sink.emit(&NodeEvent::RelayStatus(self.relay));
                }
                Directive::Continue
            }
            ModemEvent::Unknown(_) => {
                self.stats.unknown = self.stats.unknown.saturating_add(1);
                Directive::Continue
            }
            // Observability only; the log line above is the whole handler.
            ModemEvent::AlcSyncTime
            | ModemEvent::LinkCheck
            | ModemEvent::ClassBPingSlotInfo
            | ModemEvent::ClassBStatus
            | ModemEvent::LorawanMacTime
            | ModemEvent::FuotaDone { .. }
            | ModemEvent::NoMoreMulticastSessionClassC
            | ModemEvent::NoMoreMulticastSessionClassB
            | ModemEvent::NewMulticastSessionClassC
            | ModemEvent::NewMulticastSessionClassB
            | ModemEvent::StreamDone
            | ModemEvent::UploadDone
            | ModemEvent::DmSetConf
            | ModemEvent::Mute => Directive::Continue,
        }
    }

    // ── Button requests ───────────────────────────────────────

    /// Consume a debounced button press. Sends an uplink on the button port
    /// if the node has joined; otherwise the press is dropped.
    pub fn process_input<M, S, E>(&mut self, input: &PendingInput, ports: &mut Ports<'_, M, S, E>) -> bool
    where
        M: ModemPort,
        S: SensorPort,
        E: EventSink,
    {
        if !input.take() {
            return false;
        }

        let joined = report("status", ports.modem.status()).is_ok_and(ModemStatus::is_joined);
        if !joined {
            debug!("button: not joined, press dropped");
            ports.sink.emit(&NodeEvent::PressDiscarded);
            return false;
        }

        self.uplink(UplinkTrigger::Button, self.button_port, ports)
    }

    // ── Handlers ──────────────────────────────────────────────

    fn on_reset<M: ModemPort>(&mut self, modem: &mut M) {
        // The stack forgets its session and its alarm on reset.
        self.joined = false;
        self.alarm.on_reset();
        self.provisioner.provision(modem);
        check_and_log("set_region", modem.set_region(self.region));
        check_and_log("join_network", modem.join_network());
        check_and_log("relay_tx_enable", modem.relay_tx_enable());
    }

    fn on_joined<M, S, E>(&mut self, ports: &mut Ports<'_, M, S, E>) -> Directive
    where
        M: ModemPort,
        S: SensorPort,
        E: EventSink,
    {
        info!("Modem is now joined");
        self.joined = true;
        ports.sink.emit(&NodeEvent::Joined);
        self.uplink(UplinkTrigger::Joined, self.periodic_port, ports);
        self.arm_alarm(ports.modem)
    }

    fn on_alarm<M, S, E>(&mut self, ports: &mut Ports<'_, M, S, E>) -> Directive
    where
        M: ModemPort,
        S: SensorPort,
        E: EventSink,
    {
        self.alarm.on_fired();
        self.uplink(UplinkTrigger::Alarm, self.periodic_port, ports);
        self.arm_alarm(ports.modem)
    }

    fn arm_alarm<M: ModemPort>(&mut self, modem: &mut M) -> Directive {
        match self.alarm.arm(modem) {
            Ok(()) => Directive::Continue,
            Err(_) => Directive::Reset(ResetReason::AlarmArmFailed),
        }
    }

    fn on_downlink<M, S, E>(&mut self, ports: &mut Ports<'_, M, S, E>)
    where
        M: ModemPort,
        E: EventSink,
    {
        for _ in 0..MAX_DOWNLINK_PULLS {
            let Ok(downlink) = report("downlink", ports.modem.downlink()) else {
                return;
            };
            self.stats.downlinks = self.stats.downlinks.saturating_add(1);

            let meta = &downlink.metadata;
            info!(
                "Data received on port {} (rssi={}dBm snr={}dB window={:?})",
                meta.fport, meta.rssi_dbm, meta.snr_db, meta.window
            );
            info!("Received payload: {}", HexBytes(&downlink.payload));

            let remaining = downlink.remaining;
            ports.sink.emit(&NodeEvent::Downlink(downlink));
            if remaining == 0 {
                return;
            }
        }
        warn!("downlink: pull limit reached with chunks still queued");
    }

    /// Sample the probe and queue an unconfirmed uplink on `port`.
    fn uplink<M, S, E>(&mut self, trigger: UplinkTrigger, port: u8, ports: &mut Ports<'_, M, S, E>) -> bool
    where
        M: ModemPort,
        S: SensorPort,
        E: EventSink,
    {
        let sample = match ports.sensor.sample() {
            Ok(sample) => sample,
            Err(error) => {
                warn!("uplink({:?}): {}, nothing sent", trigger, error);
                ports.sink.emit(&NodeEvent::SampleFailed { trigger, error });
                return false;
            }
        };

        let payload = UplinkPayload::encode(sample, port);
        if report(
            "request_uplink",
            ports.modem.request_uplink(payload.port, false, payload.as_bytes()),
        )
        .is_err()
        {
            return false;
        }

        self.stats.uplinks = self.stats.uplinks.saturating_add(1);
        ports.sink.emit(&NodeEvent::UplinkQueued {
            trigger,
            port,
            raw: sample.raw(),
        });
        true
    }

    // ── Queries ───────────────────────────────────────────────

    /// Join state as derived from Reset / Joined events.
    pub fn is_joined(&self) -> bool {
        self.joined
    }

    pub fn relay_status(&self) -> RelayStatus {
        self.relay
    }

    pub fn alarm(&self) -> &AlarmScheduler {
        &self.alarm
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }
}

fn log_received(event: &ModemEvent) {
    match event {
        ModemEvent::LorawanMacTime => warn!("Event received: {}", event.name()),
        ModemEvent::FuotaDone { successful: false } => warn!("Event received: FUOTA FAIL"),
        ModemEvent::FuotaDone { successful: true } => info!("Event received: FUOTA SUCCESSFUL"),
        ModemEvent::Unknown(code) => warn!("Unknown event {}", code),
        _ => info!("Event received: {}", event.name()),
    }
}
