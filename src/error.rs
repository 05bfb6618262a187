//! Unified error types for the SoilNode firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! control loop's error handling uniform. All variants are `Copy` so they
//! pass through the dispatcher without allocation.
//!
//! Modem return codes get their own type, [`ModemError`], because the
//! dispatcher has a per-class logging policy for them (see [`report`]).

use core::fmt;

use log::{error, info, warn};

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A wireless stack call returned a non-OK code.
    Modem(ModemError),
    /// The moisture sample could not be acquired.
    Sensor(SensorError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Modem(e) => write!(f, "modem: {e}"),
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Modem return codes
// ---------------------------------------------------------------------------

/// Non-OK result codes of the wireless stack API.
///
/// `OK` maps to `Ok(_)`; everything else lands here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModemError {
    /// Stack was not initialised before the call.
    NotInitialized,
    /// A parameter was rejected.
    InvalidArgument,
    /// The stack is busy with another operation.
    Busy,
    /// Generic failure.
    GenericFailure,
    /// No time slot available for the requested operation.
    NoTimeAvailable,
    /// The stack identifier does not exist.
    InvalidStackIdentifier,
    /// The event queue is empty.
    NoEventAvailable,
}

/// Log level that a [`ModemError`] is reported at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl ModemError {
    /// Map a raw stack return code. `0` (OK) yields `None`.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => None,
            1 => Some(Self::NotInitialized),
            2 => Some(Self::InvalidArgument),
            3 => Some(Self::Busy),
            4 => Some(Self::GenericFailure),
            5 => Some(Self::NoTimeAvailable),
            6 => Some(Self::InvalidStackIdentifier),
            7 => Some(Self::NoEventAvailable),
            // Codes outside the documented table are treated as failures.
            _ => Some(Self::GenericFailure),
        }
    }

    pub const fn severity(self) -> Severity {
        match self {
            Self::NotInitialized
            | Self::InvalidArgument
            | Self::Busy
            | Self::GenericFailure
            | Self::InvalidStackIdentifier => Severity::Error,
            Self::NoTimeAvailable => Severity::Warning,
            Self::NoEventAvailable => Severity::Info,
        }
    }

    /// Stack-style constant name, used in log lines.
    pub const fn name(self) -> &'static str {
        match self {
            Self::NotInitialized => "RC_NOT_INIT",
            Self::InvalidArgument => "RC_INVALID",
            Self::Busy => "RC_BUSY",
            Self::GenericFailure => "RC_FAIL",
            Self::NoTimeAvailable => "RC_NO_TIME",
            Self::InvalidStackIdentifier => "RC_INVALID_STACK_ID",
            Self::NoEventAvailable => "RC_NO_EVENT",
        }
    }
}

impl fmt::Display for ModemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<ModemError> for Error {
    fn from(e: ModemError) -> Self {
        Self::Modem(e)
    }
}

/// Result of a single wireless stack call.
pub type ModemResult<T> = core::result::Result<T, ModemError>;

/// Log a failed stack call at the severity of its class and hand the
/// result back. `Ok` is silent. Never retries.
pub fn report<T>(call: &'static str, result: ModemResult<T>) -> ModemResult<T> {
    if let Err(e) = result {
        match e.severity() {
            Severity::Error => error!("{}: {}", call, e),
            Severity::Warning => warn!("{}: {}", call, e),
            Severity::Info => info!("{}: {}", call, e),
        }
    }
    result
}

/// [`report`] for calls whose failure only needs logging. Returns whether
/// the call succeeded.
pub fn check_and_log<T>(call: &'static str, result: ModemResult<T>) -> bool {
    report(call, result).is_ok()
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The sensor supply pin could not be driven.
    PowerPinFailed,
    /// The conversion did not complete within the poll timeout.
    ConversionTimeout,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PowerPinFailed => write!(f, "sensor power pin failed"),
            Self::ConversionTimeout => write!(f, "ADC conversion timed out"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
