//! Dispatcher: per-event handlers, queue draining and button requests.

use soilnode::app::dispatcher::{Directive, Dispatcher, MAX_DOWNLINK_PULLS, Ports};
use soilnode::app::events::{NodeEvent, ResetReason, UplinkTrigger};
use soilnode::config::{NodeConfig, Region};
use soilnode::credentials::{CredentialSource, DeviceCredentials};
use soilnode::drivers::button::PendingInput;
use soilnode::error::{ModemError, SensorError};
use soilnode::events::{FmpStatus, ModemEvent, ModemStatus, RelayActivationMode, RelaySyncStatus};

use super::mock_modem::{downlink, MockModem, MockSensor, ModemCall, RecordingSink};

struct Rig {
    dispatcher: Dispatcher,
    modem: MockModem,
    sensor: MockSensor,
    sink: RecordingSink,
}

impl Rig {
    fn new(config: &NodeConfig) -> Self {
        Self {
            dispatcher: Dispatcher::new(config),
            modem: MockModem::new(),
            sensor: MockSensor::reading(2730),
            sink: RecordingSink::new(),
        }
    }

    fn chip() -> Self {
        Self::new(&NodeConfig::default())
    }

    fn dispatch(&mut self, event: ModemEvent) -> Directive {
        let mut ports = Ports {
            modem: &mut self.modem,
            sensor: &mut self.sensor,
            sink: &mut self.sink,
        };
        self.dispatcher.dispatch(event, &mut ports)
    }

    fn drain(&mut self) -> Directive {
        let mut ports = Ports {
            modem: &mut self.modem,
            sensor: &mut self.sensor,
            sink: &mut self.sink,
        };
        self.dispatcher.drain(&mut ports)
    }

    fn press(&mut self, input: &PendingInput) -> bool {
        let mut ports = Ports {
            modem: &mut self.modem,
            sensor: &mut self.sensor,
            sink: &mut self.sink,
        };
        self.dispatcher.process_input(input, &mut ports)
    }
}

fn fixed_credentials() -> DeviceCredentials {
    DeviceCredentials {
        dev_eui: [0x70, 0xB3, 0xD5, 0x7E, 0xD0, 0x00, 0x00, 0x01],
        join_eui: [0; 8],
        app_key: [0x2B; 16],
        nwk_key: [0x7E; 16],
    }
}

// ── Reset ─────────────────────────────────────────────────────

#[test]
fn reset_with_chip_credentials_reads_identity_then_joins() {
    let mut rig = Rig::chip();
    assert_eq!(rig.dispatch(ModemEvent::Reset), Directive::Continue);
    assert_eq!(
        rig.modem.config_calls(),
        vec![
            ModemCall::ChipEui,
            ModemCall::ChipPin,
            ModemCall::SetRegion(Region::Eu868),
            ModemCall::JoinNetwork,
            ModemCall::RelayTxEnable,
        ]
    );
}

#[test]
fn reset_with_fixed_credentials_writes_all_four_before_join() {
    let creds = fixed_credentials();
    let config = NodeConfig {
        credentials: CredentialSource::Fixed(creds),
        ..NodeConfig::default()
    };
    let mut rig = Rig::new(&config);
    rig.dispatch(ModemEvent::Reset);
    assert_eq!(
        rig.modem.config_calls(),
        vec![
            ModemCall::SetDevEui(creds.dev_eui),
            ModemCall::SetJoinEui(creds.join_eui),
            ModemCall::SetAppKey(creds.app_key),
            ModemCall::SetNwkKey(creds.nwk_key),
            ModemCall::SetRegion(Region::Eu868),
            ModemCall::JoinNetwork,
            ModemCall::RelayTxEnable,
        ]
    );
}

#[test]
fn reset_carries_on_after_failed_calls() {
    let mut rig = Rig::chip();
    rig.modem.fail("chip_eui", ModemError::GenericFailure);
    rig.modem.fail("set_region", ModemError::InvalidArgument);
    assert_eq!(rig.dispatch(ModemEvent::Reset), Directive::Continue);
    assert_eq!(rig.modem.count(&ModemCall::JoinNetwork), 1);
    assert_eq!(rig.modem.count(&ModemCall::RelayTxEnable), 1);
}

#[test]
fn reset_clears_join_state() {
    let mut rig = Rig::chip();
    rig.dispatch(ModemEvent::Joined);
    assert!(rig.dispatcher.is_joined());
    rig.dispatch(ModemEvent::Reset);
    assert!(!rig.dispatcher.is_joined());
}

#[test]
fn reset_drops_armed_alarm() {
    let mut rig = Rig::chip();
    rig.dispatch(ModemEvent::Joined);
    assert!(rig.dispatcher.alarm().is_armed());

    rig.dispatch(ModemEvent::Reset);
    assert!(!rig.dispatcher.alarm().is_armed());
    assert_eq!(rig.dispatcher.alarm().fire_count(), 0);

    // Rejoining starts a fresh countdown.
    rig.dispatch(ModemEvent::Joined);
    assert!(rig.dispatcher.alarm().is_armed());
    assert_eq!(rig.modem.alarm_arms(), 2);
}

// ── Joined / Alarm ────────────────────────────────────────────

#[test]
fn joined_sends_reading_on_periodic_port_and_arms_alarm() {
    let mut rig = Rig::chip();
    assert_eq!(rig.dispatch(ModemEvent::Joined), Directive::Continue);

    assert_eq!(rig.modem.uplinks(), vec![(101, false, vec![0x0A, 0xAA])]);
    assert_eq!(rig.modem.count(&ModemCall::AlarmStart(1800)), 1);
    assert!(rig.dispatcher.alarm().is_armed());
    assert!(rig.dispatcher.is_joined());
    assert_eq!(
        rig.sink.count(|e| matches!(
            e,
            NodeEvent::UplinkQueued { trigger: UplinkTrigger::Joined, port: 101, raw: 2730 }
        )),
        1
    );
}

#[test]
fn every_alarm_rearms_the_cadence() {
    let mut rig = Rig::chip();
    rig.dispatch(ModemEvent::Joined);
    for _ in 0..5 {
        assert_eq!(rig.dispatch(ModemEvent::Alarm), Directive::Continue);
    }
    assert_eq!(rig.modem.alarm_arms(), 6);
    assert_eq!(rig.dispatcher.alarm().fire_count(), 5);
    assert_eq!(rig.modem.uplinks().len(), 6);
    assert!(rig.modem.uplinks().iter().all(|(port, confirmed, _)| *port == 101 && !confirmed));
}

#[test]
fn failed_rearm_requests_device_reset() {
    let mut rig = Rig::chip();
    rig.modem.fail("alarm_start_timer", ModemError::Busy);
    assert_eq!(
        rig.dispatch(ModemEvent::Alarm),
        Directive::Reset(ResetReason::AlarmArmFailed)
    );
}

#[test]
fn sensor_timeout_skips_uplink_but_keeps_cadence() {
    let mut rig = Rig::chip();
    rig.sensor = MockSensor::failing(SensorError::ConversionTimeout);
    assert_eq!(rig.dispatch(ModemEvent::Alarm), Directive::Continue);
    assert!(rig.modem.uplinks().is_empty());
    assert_eq!(rig.modem.alarm_arms(), 1);
    assert_eq!(
        rig.sink.count(|e| matches!(
            e,
            NodeEvent::SampleFailed { error: SensorError::ConversionTimeout, .. }
        )),
        1
    );
}

#[test]
fn rejected_uplink_still_rearms() {
    let mut rig = Rig::chip();
    rig.modem.fail("request_uplink", ModemError::NoTimeAvailable);
    assert_eq!(rig.dispatch(ModemEvent::Alarm), Directive::Continue);
    assert_eq!(rig.modem.alarm_arms(), 1);
    assert_eq!(rig.dispatcher.stats().uplinks, 0);
}

// ── Other events ──────────────────────────────────────────────

#[test]
fn counters_follow_tx_and_join_failures() {
    let mut rig = Rig::chip();
    rig.dispatch(ModemEvent::TxDone);
    rig.dispatch(ModemEvent::TxDone);
    rig.dispatch(ModemEvent::JoinFail);
    let stats = rig.dispatcher.stats();
    assert_eq!(stats.tx_done, 2);
    assert_eq!(stats.join_failures, 1);
    assert_eq!(stats.events, 3);
}

#[test]
fn firmware_management_reboot_requests_reset() {
    let mut rig = Rig::chip();
    let reboot = ModemEvent::FirmwareManagement { status: FmpStatus::RebootImmediately };
    assert_eq!(rig.dispatch(reboot), Directive::Reset(ResetReason::FirmwareManagement));

    let other = ModemEvent::FirmwareManagement { status: FmpStatus::Other(2) };
    assert_eq!(rig.dispatch(other), Directive::Continue);
}

#[test]
fn informational_and_unknown_events_touch_nothing() {
    let mut rig = Rig::chip();
    for event in [
        ModemEvent::AlcSyncTime,
        ModemEvent::LinkCheck,
        ModemEvent::LorawanMacTime,
        ModemEvent::FuotaDone { successful: false },
        ModemEvent::Mute,
        ModemEvent::Unknown(0x42),
    ] {
        assert_eq!(rig.dispatch(event), Directive::Continue);
    }
    assert!(rig.modem.calls.is_empty());
    assert_eq!(rig.dispatcher.stats().unknown, 1);
}

#[test]
fn relay_events_refresh_status() {
    let mut rig = Rig::chip();
    rig.modem.relay_enabled = true;
    rig.modem.relay_mode = RelayActivationMode::EdControl;
    rig.modem.relay_sync = RelaySyncStatus::Unsync;

    rig.dispatch(ModemEvent::RelayTxDynamic);
    rig.dispatch(ModemEvent::RelayTxMode);
    rig.dispatch(ModemEvent::RelayTxSync);

    let status = rig.dispatcher.relay_status();
    assert_eq!(status.dynamic_enabled, Some(true));
    assert_eq!(status.activation_mode, Some(RelayActivationMode::EdControl));
    assert_eq!(status.sync, Some(RelaySyncStatus::Unsync));
    assert_eq!(rig.sink.count(|e| matches!(e, NodeEvent::RelayStatus(_))), 3);
}

#[test]
fn failed_relay_query_leaves_status_untouched() {
    let mut rig = Rig::chip();
    rig.modem.fail("relay_tx_sync_status", ModemError::GenericFailure);
    rig.dispatch(ModemEvent::RelayTxSync);
    assert_eq!(rig.dispatcher.relay_status().sync, None);
    assert!(rig.sink.events.is_empty());
}

// ── Downlinks ─────────────────────────────────────────────────

#[test]
fn downlink_pulls_every_queued_chunk() {
    let mut rig = Rig::chip();
    rig.modem.downlinks.extend([
        downlink(3, &[0x01, 0x02], 2),
        downlink(3, &[0x03], 1),
        downlink(3, &[0x04], 0),
    ]);
    rig.dispatch(ModemEvent::DownlinkData);

    assert_eq!(rig.modem.count(&ModemCall::Downlink), 3);
    assert_eq!(rig.dispatcher.stats().downlinks, 3);
    let fports: Vec<u8> = rig
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            NodeEvent::Downlink(dl) => Some(dl.metadata.fport),
            _ => None,
        })
        .collect();
    assert_eq!(fports, vec![3, 3, 3]);
}

#[test]
fn downlink_pulls_are_bounded() {
    let mut rig = Rig::chip();
    for _ in 0..(MAX_DOWNLINK_PULLS * 2) {
        rig.modem.downlinks.push_back(downlink(9, &[0xAA], 5));
    }
    rig.dispatch(ModemEvent::DownlinkData);
    assert_eq!(rig.modem.count(&ModemCall::Downlink), MAX_DOWNLINK_PULLS);
}

#[test]
fn failed_downlink_fetch_stops_pulling() {
    let mut rig = Rig::chip();
    rig.modem.fail("downlink", ModemError::Busy);
    assert_eq!(rig.dispatch(ModemEvent::DownlinkData), Directive::Continue);
    assert_eq!(rig.modem.count(&ModemCall::Downlink), 1);
    assert!(rig.sink.events.is_empty());
}

// ── Draining ──────────────────────────────────────────────────

#[test]
fn drain_empties_the_queue() {
    let mut rig = Rig::chip();
    rig.modem
        .push_events(&[ModemEvent::TxDone, ModemEvent::LinkCheck, ModemEvent::Unknown(0x55)]);
    assert_eq!(rig.drain(), Directive::Continue);
    assert!(rig.modem.queue.is_empty());
    assert_eq!(rig.dispatcher.stats().events, 3);
}

#[test]
fn drain_on_empty_queue_is_harmless() {
    let mut rig = Rig::chip();
    assert_eq!(rig.drain(), Directive::Continue);
    assert_eq!(rig.dispatcher.stats().events, 0);
}

#[test]
fn drain_stops_at_reset_request() {
    let mut rig = Rig::chip();
    rig.modem.push_events(&[
        ModemEvent::FirmwareManagement { status: FmpStatus::RebootImmediately },
        ModemEvent::TxDone,
    ]);
    assert_eq!(rig.drain(), Directive::Reset(ResetReason::FirmwareManagement));
    assert_eq!(rig.modem.queue.len(), 1);
    assert_eq!(
        rig.sink.count(|e| matches!(e, NodeEvent::Resetting(ResetReason::FirmwareManagement))),
        1
    );
}

#[test]
fn drain_ends_when_fetch_fails() {
    let mut rig = Rig::chip();
    rig.modem.push_events(&[ModemEvent::TxDone]);
    rig.modem.fail("next_event", ModemError::NotInitialized);
    assert_eq!(rig.drain(), Directive::Continue);
    assert_eq!(rig.dispatcher.stats().events, 0);
}

#[test]
fn reset_then_joined_in_one_drain() {
    let mut rig = Rig::chip();
    rig.modem.push_events(&[ModemEvent::Reset, ModemEvent::Joined]);
    rig.drain();
    assert_eq!(rig.modem.count(&ModemCall::JoinNetwork), 1);
    assert_eq!(rig.modem.uplinks().len(), 1);
    assert!(rig.dispatcher.is_joined());
}

// ── Button requests ───────────────────────────────────────────

#[test]
fn press_while_joined_sends_on_button_port() {
    let mut rig = Rig::chip();
    rig.modem.status = ModemStatus(ModemStatus::JOINED);
    let input = PendingInput::new();
    input.raise();

    assert!(rig.press(&input));
    assert_eq!(rig.modem.uplinks(), vec![(102, false, vec![0x0A, 0xAA])]);
    assert!(!input.take());
    // Button uplinks do not touch the cadence.
    assert_eq!(rig.modem.alarm_arms(), 0);
}

#[test]
fn press_before_join_is_dropped() {
    let mut rig = Rig::chip();
    rig.modem.status = ModemStatus(ModemStatus::JOINING);
    let input = PendingInput::new();
    input.raise();

    assert!(!rig.press(&input));
    assert!(rig.modem.uplinks().is_empty());
    assert!(!input.take());
    assert_eq!(rig.sink.count(|e| matches!(e, NodeEvent::PressDiscarded)), 1);
}

#[test]
fn press_with_failed_status_query_counts_as_not_joined() {
    let mut rig = Rig::chip();
    rig.modem.status = ModemStatus(ModemStatus::JOINED);
    rig.modem.fail("status", ModemError::Busy);
    let input = PendingInput::new();
    input.raise();

    assert!(!rig.press(&input));
    assert!(rig.modem.uplinks().is_empty());
}

#[test]
fn no_press_means_no_status_query() {
    let mut rig = Rig::chip();
    let input = PendingInput::new();
    assert!(!rig.press(&input));
    assert!(rig.modem.calls.is_empty());
}
