//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured node events to the
//! ESP-IDF logger (UART / USB-CDC in production).

use log::{debug, info, warn};

use crate::app::events::NodeEvent;
use crate::app::ports::EventSink;
use crate::credentials::HexBytes;

/// Adapter that logs every [`NodeEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &NodeEvent) {
        match event {
            NodeEvent::UplinkQueued { trigger, port, raw } => {
                info!("UPLINK | trigger={:?} | port={} | raw={} (0x{:04X})", trigger, port, raw, raw);
            }
            NodeEvent::SampleFailed { trigger, error } => {
                warn!("UPLINK | trigger={:?} | skipped: {}", trigger, error);
            }
            NodeEvent::PressDiscarded => {
                debug!("BUTTON | press discarded, not joined");
            }
            NodeEvent::Joined => {
                info!("JOIN | accepted");
            }
            NodeEvent::Downlink(dl) => {
                info!(
                    "DOWNLINK | port={} | {} bytes | remaining={} | {}",
                    dl.metadata.fport,
                    dl.payload.len(),
                    dl.remaining,
                    HexBytes(&dl.payload)
                );
            }
            NodeEvent::RelayStatus(status) => {
                info!(
                    "RELAY | dynamic={:?} | mode={} | sync={}",
                    status.dynamic_enabled,
                    status.activation_mode.map_or("?", |m| m.name()),
                    status.sync.map_or("?", |s| s.name()),
                );
            }
            NodeEvent::Resetting(reason) => {
                warn!("RESET | reason={:?}", reason);
            }
            NodeEvent::Slept { ms } => {
                debug!("SLEEP | {}ms", ms);
            }
        }
    }
}
