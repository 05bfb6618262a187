//! Wireless stack events and the status types that travel with them.
//!
//! Events are produced by the stack and pulled by the dispatcher one at a
//! time, each paired with the number still queued behind it:
//!
//! ```text
//! ┌──────────────┐  next_event()   ┌──────────────┐
//! │ Modem stack  │────────────────▶│  Dispatcher  │
//! │ (coalesces)  │  (event, count) │ drain to 0   │
//! └──────────────┘                 └──────────────┘
//! ```
//!
//! Discriminants in [`ModemEvent::from_raw`] follow the stack's event
//! codes so adapters can decode without a lookup table of their own.

use heapless::Vec;

/// Largest LoRaWAN application payload the stack will hand over.
pub const MAX_DOWNLINK_LEN: usize = 242;

/// Firmware-management directive carried by a FMP event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FmpStatus {
    /// Reboot the device immediately.
    RebootImmediately,
    /// Any other directive; handled by the stack.
    Other(u8),
}

impl FmpStatus {
    pub const fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::RebootImmediately,
            other => Self::Other(other),
        }
    }
}

/// Every event kind the stack can deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModemEvent {
    Reset,
    Alarm,
    Joined,
    TxDone,
    DownlinkData,
    JoinFail,
    AlcSyncTime,
    LinkCheck,
    ClassBPingSlotInfo,
    ClassBStatus,
    LorawanMacTime,
    FuotaDone { successful: bool },
    NoMoreMulticastSessionClassC,
    NoMoreMulticastSessionClassB,
    NewMulticastSessionClassC,
    NewMulticastSessionClassB,
    FirmwareManagement { status: FmpStatus },
    StreamDone,
    UploadDone,
    DmSetConf,
    Mute,
    RelayTxDynamic,
    RelayTxMode,
    RelayTxSync,
    /// A code this firmware does not know.
    Unknown(u8),
}

impl ModemEvent {
    /// Decode a raw event code. `detail` is the first byte of the event's
    /// payload union (FUOTA success flag, FMP status); ignored otherwise.
    pub const fn from_raw(code: u8, detail: u8) -> Self {
        match code {
            0x00 => Self::Reset,
            0x01 => Self::Alarm,
            0x02 => Self::Joined,
            0x03 => Self::TxDone,
            0x04 => Self::DownlinkData,
            0x05 => Self::JoinFail,
            0x06 => Self::AlcSyncTime,
            0x07 => Self::LinkCheck,
            0x08 => Self::ClassBPingSlotInfo,
            0x09 => Self::ClassBStatus,
            0x0A => Self::LorawanMacTime,
            0x0B => Self::FuotaDone { successful: detail != 0 },
            0x0C => Self::NoMoreMulticastSessionClassC,
            0x0D => Self::NoMoreMulticastSessionClassB,
            0x0E => Self::NewMulticastSessionClassC,
            0x0F => Self::NewMulticastSessionClassB,
            0x10 => Self::FirmwareManagement { status: FmpStatus::from_raw(detail) },
            0x11 => Self::StreamDone,
            0x12 => Self::UploadDone,
            0x13 => Self::DmSetConf,
            0x14 => Self::Mute,
            0x15 => Self::RelayTxDynamic,
            0x16 => Self::RelayTxMode,
            0x17 => Self::RelayTxSync,
            other => Self::Unknown(other),
        }
    }

    /// Short upper-case name for log lines.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Reset => "RESET",
            Self::Alarm => "ALARM",
            Self::Joined => "JOINED",
            Self::TxDone => "TXDONE",
            Self::DownlinkData => "DOWNDATA",
            Self::JoinFail => "JOINFAIL",
            Self::AlcSyncTime => "ALCSYNC_TIME",
            Self::LinkCheck => "LINK_CHECK",
            Self::ClassBPingSlotInfo => "CLASS_B_PING_SLOT_INFO",
            Self::ClassBStatus => "CLASS_B_STATUS",
            Self::LorawanMacTime => "LORAWAN_MAC_TIME",
            Self::FuotaDone { .. } => "FUOTA_DONE",
            Self::NoMoreMulticastSessionClassC => "MULTICAST_CLASS_C_STOP",
            Self::NoMoreMulticastSessionClassB => "MULTICAST_CLASS_B_STOP",
            Self::NewMulticastSessionClassC => "NEW_MULTICAST_CLASS_C",
            Self::NewMulticastSessionClassB => "NEW_MULTICAST_CLASS_B",
            Self::FirmwareManagement { .. } => "FIRMWARE_MANAGEMENT",
            Self::StreamDone => "STREAM_DONE",
            Self::UploadDone => "UPLOAD_DONE",
            Self::DmSetConf => "DM_SET_CONF",
            Self::Mute => "MUTE",
            Self::RelayTxDynamic => "RELAY_TX_DYNAMIC",
            Self::RelayTxMode => "RELAY_TX_MODE",
            Self::RelayTxSync => "RELAY_TX_SYNC",
            Self::Unknown(_) => "UNKNOWN",
        }
    }
}

// ── Relay TX sub-state ────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RelayActivationMode {
    Disable = 0,
    Enable = 1,
    Dynamic = 2,
    EdControl = 3,
}

impl RelayActivationMode {
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Disable),
            1 => Some(Self::Enable),
            2 => Some(Self::Dynamic),
            3 => Some(Self::EdControl),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Disable => "DISABLE",
            Self::Enable => "ENABLE",
            Self::Dynamic => "DYNAMIC",
            Self::EdControl => "ED_CONTROL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RelaySyncStatus {
    Init = 0,
    Unsync = 1,
    Sync = 2,
}

impl RelaySyncStatus {
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Init),
            1 => Some(Self::Unsync),
            2 => Some(Self::Sync),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Init => "INIT",
            Self::Unsync => "UNSYNC",
            Self::Sync => "SYNC",
        }
    }
}

/// Last observed relay TX sub-state; `None` until first queried.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStatus {
    pub dynamic_enabled: Option<bool>,
    pub activation_mode: Option<RelayActivationMode>,
    pub sync: Option<RelaySyncStatus>,
}

// ── Downlinks ─────────────────────────────────────────────────

/// Receive window a downlink arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxWindow {
    Rx1,
    Rx2,
    RxC,
    RxB,
    Other(u8),
}

impl RxWindow {
    /// Multicast and beacon windows are kept as [`RxWindow::Other`].
    pub const fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Rx1,
            1 => Self::Rx2,
            2 => Self::RxC,
            7 => Self::RxB,
            other => Self::Other(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownlinkMetadata {
    pub fport: u8,
    pub rssi_dbm: i16,
    pub snr_db: i16,
    pub window: RxWindow,
}

/// One downlink chunk pulled from the stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Downlink {
    pub payload: Vec<u8, MAX_DOWNLINK_LEN>,
    pub metadata: DownlinkMetadata,
    /// Chunks still waiting in the stack after this one.
    pub remaining: u8,
}

// ── Status bitmask ────────────────────────────────────────────

/// Stack status bitmask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModemStatus(pub u32);

impl ModemStatus {
    pub const BROWNOUT: u32 = 1 << 0;
    pub const CRASH: u32 = 1 << 1;
    pub const MUTE: u32 = 1 << 2;
    pub const JOINED: u32 = 1 << 3;
    pub const SUSPEND: u32 = 1 << 4;
    pub const UPLOAD: u32 = 1 << 5;
    pub const JOINING: u32 = 1 << 6;
    pub const STREAM: u32 = 1 << 7;

    pub const fn contains(self, bits: u32) -> bool {
        self.0 & bits == bits
    }

    pub const fn is_joined(self) -> bool {
        self.contains(Self::JOINED)
    }
}
