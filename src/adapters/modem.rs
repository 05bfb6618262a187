//! LoRa Basics Modem adapter.
//!
//! Implements [`ModemPort`] over the `smtc_modem_*` C API, linked as an
//! ESP-IDF extra component (`lbm_component/`). The stack reports new
//! events through a parameterless callback, invoked from inside
//! `smtc_modem_run_engine()`; it only raises [`EVENT_SIGNAL`] and the main
//! loop pulls the events afterwards.

use core::ffi::c_void;
use core::sync::atomic::{AtomicBool, Ordering};

use heapless::Vec;
use log::info;

use crate::app::ports::ModemPort;
use crate::config::Region;
use crate::credentials::{AesKey, ChipPin, Eui64, EUI_LENGTH, PIN_LENGTH};
use crate::error::{ModemError, ModemResult};
use crate::events::{
    Downlink, DownlinkMetadata, MAX_DOWNLINK_LEN, ModemEvent, ModemStatus, RelayActivationMode,
    RelaySyncStatus, RxWindow,
};

// ── C API ─────────────────────────────────────────────────────

/// `smtc_modem_return_code_t` (C enum, int-sized).
type ReturnCode = u32;

#[repr(C)]
#[allow(dead_code)]
struct RawEvent {
    event_type: u8,
    missed_events: u8,
    /// Union of the per-event payloads; sized above the largest member.
    event_data: [u32; 8],
}

#[repr(C)]
#[allow(dead_code)]
struct RawDownlinkMetadata {
    stack_id: u8,
    rssi: i16,
    snr: i8,
    window: u32,
    fport: u8,
    fpending_bit: u8,
    frequency_hz: u32,
    datarate: u8,
}

unsafe extern "C" {
    fn smtc_modem_init(callback: Option<unsafe extern "C" fn()>);
    fn smtc_modem_run_engine() -> u32;
    fn smtc_modem_is_irq_flag_pending() -> bool;
    fn smtc_modem_get_event(event: *mut RawEvent, event_pending_count: *mut u8) -> ReturnCode;
    fn smtc_modem_get_status(stack_id: u8, status_mask: *mut u32) -> ReturnCode;

    fn smtc_modem_set_deveui(stack_id: u8, dev_eui: *const u8) -> ReturnCode;
    fn smtc_modem_set_joineui(stack_id: u8, join_eui: *const u8) -> ReturnCode;
    fn smtc_modem_set_appkey(stack_id: u8, app_key: *const u8) -> ReturnCode;
    fn smtc_modem_set_nwkkey(stack_id: u8, nwk_key: *const u8) -> ReturnCode;
    fn smtc_modem_get_chip_eui(stack_id: u8, chip_eui: *mut u8) -> ReturnCode;
    fn smtc_modem_get_pin(stack_id: u8, chip_pin: *mut u8) -> ReturnCode;

    fn smtc_modem_set_region(stack_id: u8, region: u32) -> ReturnCode;
    fn smtc_modem_join_network(stack_id: u8) -> ReturnCode;

    fn smtc_modem_relay_tx_enable(stack_id: u8, relay_config: *const c_void) -> ReturnCode;
    fn smtc_modem_relay_tx_is_enable(stack_id: u8, is_enable: *mut bool) -> ReturnCode;
    fn smtc_modem_relay_tx_get_activation_mode(stack_id: u8, mode: *mut u32) -> ReturnCode;
    fn smtc_modem_relay_tx_get_sync_status(stack_id: u8, sync: *mut u32) -> ReturnCode;

    fn smtc_modem_alarm_start_timer(alarm_timer_in_s: u32) -> ReturnCode;
    fn smtc_modem_get_downlink_data(
        buff: *mut u8,
        length: *mut u8,
        metadata: *mut RawDownlinkMetadata,
        remaining: *mut u8,
    ) -> ReturnCode;
    fn smtc_modem_request_uplink(
        stack_id: u8,
        fport: u8,
        confirmed: bool,
        payload: *const u8,
        payload_length: u8,
    ) -> ReturnCode;
}

// ── Event signal ──────────────────────────────────────────────

/// Raised by the stack callback, consumed by [`ModemPort::take_event_signal`].
static EVENT_SIGNAL: AtomicBool = AtomicBool::new(false);

unsafe extern "C" fn on_modem_event() {
    EVENT_SIGNAL.store(true, Ordering::Release);
}

fn check(rc: ReturnCode) -> ModemResult<()> {
    let code = u8::try_from(rc).unwrap_or(u8::MAX);
    match ModemError::from_code(code) {
        None => Ok(()),
        Some(e) => Err(e),
    }
}

// ── Adapter ───────────────────────────────────────────────────

pub struct LbmModem {
    stack_id: u8,
}

impl LbmModem {
    /// Initialise the stack. A Reset event is queued by the first
    /// `run_engine()` call.
    pub fn init(stack_id: u8) -> Self {
        // SAFETY: called once from main() before the loop; the callback
        // only touches an atomic.
        unsafe { smtc_modem_init(Some(on_modem_event)) };
        info!("modem: LBM initialised (stack {})", stack_id);
        Self { stack_id }
    }
}

impl ModemPort for LbmModem {
    fn take_event_signal(&mut self) -> bool {
        EVENT_SIGNAL.swap(false, Ordering::AcqRel)
    }

    fn next_event(&mut self) -> ModemResult<(ModemEvent, u8)> {
        let mut raw = RawEvent {
            event_type: 0,
            missed_events: 0,
            event_data: [0; 8],
        };
        let mut pending = 0u8;
        // SAFETY: both out-pointers reference live locals.
        check(unsafe { smtc_modem_get_event(&mut raw, &mut pending) })?;
        let detail = raw.event_data[0].to_le_bytes()[0];
        Ok((ModemEvent::from_raw(raw.event_type, detail), pending))
    }

    fn status(&mut self) -> ModemResult<ModemStatus> {
        let mut mask = 0u32;
        // SAFETY: out-pointer references a live local.
        check(unsafe { smtc_modem_get_status(self.stack_id, &mut mask) })?;
        Ok(ModemStatus(mask))
    }

    fn set_dev_eui(&mut self, eui: &Eui64) -> ModemResult<()> {
        // SAFETY: the stack copies EUI_LENGTH bytes.
        check(unsafe { smtc_modem_set_deveui(self.stack_id, eui.as_ptr()) })
    }

    fn set_join_eui(&mut self, eui: &Eui64) -> ModemResult<()> {
        check(unsafe { smtc_modem_set_joineui(self.stack_id, eui.as_ptr()) })
    }

    fn set_app_key(&mut self, key: &AesKey) -> ModemResult<()> {
        check(unsafe { smtc_modem_set_appkey(self.stack_id, key.as_ptr()) })
    }

    fn set_nwk_key(&mut self, key: &AesKey) -> ModemResult<()> {
        check(unsafe { smtc_modem_set_nwkkey(self.stack_id, key.as_ptr()) })
    }

    fn chip_eui(&mut self) -> ModemResult<Eui64> {
        let mut eui = [0u8; EUI_LENGTH];
        // SAFETY: buffer is EUI_LENGTH bytes as the API requires.
        check(unsafe { smtc_modem_get_chip_eui(self.stack_id, eui.as_mut_ptr()) })?;
        Ok(eui)
    }

    fn chip_pin(&mut self) -> ModemResult<ChipPin> {
        let mut pin = [0u8; PIN_LENGTH];
        // SAFETY: buffer is PIN_LENGTH bytes as the API requires.
        check(unsafe { smtc_modem_get_pin(self.stack_id, pin.as_mut_ptr()) })?;
        Ok(pin)
    }

    fn set_region(&mut self, region: Region) -> ModemResult<()> {
        check(unsafe { smtc_modem_set_region(self.stack_id, u32::from(region.code())) })
    }

    fn join_network(&mut self) -> ModemResult<()> {
        check(unsafe { smtc_modem_join_network(self.stack_id) })
    }

    fn relay_tx_enable(&mut self) -> ModemResult<()> {
        // A null config selects the stack's built-in relay parameters.
        check(unsafe { smtc_modem_relay_tx_enable(self.stack_id, core::ptr::null()) })
    }

    fn relay_tx_is_enabled(&mut self) -> ModemResult<bool> {
        let mut enabled = false;
        check(unsafe { smtc_modem_relay_tx_is_enable(self.stack_id, &mut enabled) })?;
        Ok(enabled)
    }

    fn relay_tx_activation_mode(&mut self) -> ModemResult<RelayActivationMode> {
        let mut raw = 0u32;
        check(unsafe { smtc_modem_relay_tx_get_activation_mode(self.stack_id, &mut raw) })?;
        u8::try_from(raw)
            .ok()
            .and_then(RelayActivationMode::from_raw)
            .ok_or(ModemError::GenericFailure)
    }

    fn relay_tx_sync_status(&mut self) -> ModemResult<RelaySyncStatus> {
        let mut raw = 0u32;
        check(unsafe { smtc_modem_relay_tx_get_sync_status(self.stack_id, &mut raw) })?;
        u8::try_from(raw)
            .ok()
            .and_then(RelaySyncStatus::from_raw)
            .ok_or(ModemError::GenericFailure)
    }

    fn alarm_start_timer(&mut self, seconds: u32) -> ModemResult<()> {
        check(unsafe { smtc_modem_alarm_start_timer(seconds) })
    }

    fn downlink(&mut self) -> ModemResult<Downlink> {
        let mut buf = [0u8; MAX_DOWNLINK_LEN];
        let mut len = 0u8;
        let mut remaining = 0u8;
        let mut meta = RawDownlinkMetadata {
            stack_id: 0,
            rssi: 0,
            snr: 0,
            window: 0,
            fport: 0,
            fpending_bit: 0,
            frequency_hz: 0,
            datarate: 0,
        };
        // SAFETY: buf holds the largest LoRaWAN payload; other pointers
        // reference live locals.
        check(unsafe {
            smtc_modem_get_downlink_data(buf.as_mut_ptr(), &mut len, &mut meta, &mut remaining)
        })?;

        let len = usize::from(len).min(MAX_DOWNLINK_LEN);
        let payload = Vec::from_slice(&buf[..len]).map_err(|()| ModemError::GenericFailure)?;
        Ok(Downlink {
            payload,
            metadata: DownlinkMetadata {
                fport: meta.fport,
                rssi_dbm: meta.rssi,
                snr_db: i16::from(meta.snr),
                window: RxWindow::from_raw(u8::try_from(meta.window).unwrap_or(u8::MAX)),
            },
            remaining,
        })
    }

    fn request_uplink(&mut self, port: u8, confirmed: bool, payload: &[u8]) -> ModemResult<()> {
        let len = u8::try_from(payload.len()).map_err(|_| ModemError::InvalidArgument)?;
        // SAFETY: the stack copies `len` bytes before returning.
        check(unsafe {
            smtc_modem_request_uplink(self.stack_id, port, confirmed, payload.as_ptr(), len)
        })
    }

    fn run_engine(&mut self) -> u32 {
        // SAFETY: main-loop only; the event callback runs synchronously here.
        unsafe { smtc_modem_run_engine() }
    }

    fn irq_flag_pending(&self) -> bool {
        unsafe { smtc_modem_is_irq_flag_pending() }
    }

    fn event_signal_pending(&self) -> bool {
        EVENT_SIGNAL.load(Ordering::Acquire)
    }
}
