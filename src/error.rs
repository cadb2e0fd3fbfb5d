//! Unified error types for the FreezerMon firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! top-level pipeline's error handling uniform. All variants are `Copy` so
//! they can be passed between the workers without allocation.

use core::fmt;

use crate::app::ports::{SensorError, TransportError};

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The thermocouple front-end could not be read.
    Sensor(SensorError),
    /// A network call (probe or delivery) did not complete.
    Transport(TransportError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
    /// Wall-clock time never became trustworthy.
    TimeNotValid,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::TimeNotValid => write!(f, "wall clock never became valid"),
        }
    }
}

impl std::error::Error for Error {}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
