//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ pipeline workers (domain)
//! ```
//!
//! Driven adapters (thermocouple driver, HTTP client, SNTP clock, alert GPIO,
//! NVS config store) implement these traits. The workers consume them via
//! generics, so the domain core never touches hardware or sockets directly.

use core::fmt;

use serde::Serialize;

use crate::config::SystemConfig;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// One raw reading from the thermocouple front-end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    /// Linearized thermocouple temperature in Celsius.
    pub temperature_c: f64,
    /// Fault status bitmask straight from the converter (0 = healthy).
    pub fault_flags: u8,
}

/// Read-side port: the sample producer calls this once per capture cycle.
pub trait SensorPort {
    /// Read the current temperature and fault status.
    fn read(&mut self) -> Result<SensorReading, SensorError>;
}

/// Errors from [`SensorPort`] operations. Transient: a failed read skips
/// exactly one capture cycle and has no other effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// SPI transaction failed or timed out.
    Bus,
    /// The converter has not produced a conversion yet.
    NotReady,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus => write!(f, "SPI bus error"),
            Self::NotReady => write!(f, "no conversion available"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Time port
// ───────────────────────────────────────────────────────────────

/// Wall-clock time source. Sample timestamps and all staleness arithmetic
/// use UTC milliseconds from this port.
pub trait TimePort {
    /// Current UTC time in milliseconds since the Unix epoch.
    fn now_utc_ms(&self) -> i64;

    /// Whether the wall clock is trustworthy (synced past the sanity epoch).
    /// Must be `true` before the pipeline loops start.
    fn time_is_valid(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Alert output port (domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the external alert line (buzzer/relay).
pub trait AlertPort {
    /// Drive the alert output: `true` = asserted.
    fn set_alert(&mut self, active: bool);
}

// ───────────────────────────────────────────────────────────────
// HTTP port (domain → network)
// ───────────────────────────────────────────────────────────────

/// Wire body for `POST {base}/ingest`. Field names are the ingest API
/// contract; `temp_c` is rounded to two decimals before construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IngestRecord<'a> {
    pub device_id: &'a str,
    pub temp_c: f64,
    pub sr: u8,
    pub ts_ms: i64,
}

/// Network-side port. Both calls are bounded-timeout blocking: they block
/// only the delivery worker, never the producer or the queue.
pub trait HttpPort {
    /// `GET {base_url}/health`. Returns the HTTP status code, or a
    /// [`TransportError`] if the call did not complete.
    fn health_probe(&mut self, base_url: &str) -> Result<u16, TransportError>;

    /// `POST {base_url}/ingest` with the JSON-encoded record and the
    /// `X-API-Key` header. Returns the HTTP status code.
    fn post_reading(
        &mut self,
        base_url: &str,
        api_key: &str,
        record: &IngestRecord<'_>,
    ) -> Result<u16, TransportError>;
}

/// A network call that did not complete. Folded into the server-failure
/// class by the delivery worker: the sample is requeued and draining halts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// DNS/TCP/TLS setup failed.
    ConnectFailed,
    /// The call exceeded its bounded timeout.
    Timeout,
    /// Read/write error mid-exchange.
    Io,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectFailed => write!(f, "connect failed"),
            Self::Timeout => write!(f, "timed out"),
            Self::Io => write!(f, "I/O error"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Configuration port (domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate before persisting: rejecting invalid ranges
/// with [`ConfigError::ValidationFailed`] rather than silently clamping
/// prevents a bad blob from disabling the staleness alarm or pointing
/// deliveries at a garbage URL.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed integrity / deserialization check.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The workers emit structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go (serial log today,
/// a diagnostics characteristic tomorrow).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
