//! Mock adapters for integration tests.
//!
//! Every port the pipeline touches has a recording or scriptable double
//! here, so tests can assert on full call histories without hardware or
//! network.

use std::cell::Cell;
use std::collections::VecDeque;

use freezermon::app::events::AppEvent;
use freezermon::app::ports::{
    AlertPort, EventSink, HttpPort, IngestRecord, SensorError, SensorPort, SensorReading,
    TimePort, TransportError,
};

// ── Sensor ────────────────────────────────────────────────────

/// Serves a scripted list of readings, then fails with `NotReady`.
pub struct ScriptedSensor {
    pub readings: VecDeque<Result<SensorReading, SensorError>>,
}

#[allow(dead_code)]
impl ScriptedSensor {
    pub fn new() -> Self {
        Self {
            readings: VecDeque::new(),
        }
    }

    pub fn push_good(&mut self, temp_c: f64) {
        self.readings.push_back(Ok(SensorReading {
            temperature_c: temp_c,
            fault_flags: 0,
        }));
    }

    pub fn push_faulty(&mut self, temp_c: f64, fault_flags: u8) {
        self.readings.push_back(Ok(SensorReading {
            temperature_c: temp_c,
            fault_flags,
        }));
    }

    pub fn push_error(&mut self, err: SensorError) {
        self.readings.push_back(Err(err));
    }
}

impl SensorPort for ScriptedSensor {
    fn read(&mut self) -> Result<SensorReading, SensorError> {
        self.readings.pop_front().unwrap_or(Err(SensorError::NotReady))
    }
}

// ── Clock ─────────────────────────────────────────────────────

/// Manually advanced wall clock.
pub struct MockClock {
    now_ms: Cell<i64>,
}

#[allow(dead_code)]
impl MockClock {
    pub fn at(now_ms: i64) -> Self {
        Self {
            now_ms: Cell::new(now_ms),
        }
    }

    pub fn advance_secs(&self, secs: i64) {
        self.now_ms.set(self.now_ms.get() + secs * 1_000);
    }

    pub fn set(&self, now_ms: i64) {
        self.now_ms.set(now_ms);
    }
}

impl TimePort for MockClock {
    fn now_utc_ms(&self) -> i64 {
        self.now_ms.get()
    }

    fn time_is_valid(&self) -> bool {
        true
    }
}

// ── HTTP ──────────────────────────────────────────────────────

/// One recorded delivery attempt, with the borrowed record copied out.
#[derive(Debug, Clone, PartialEq)]
pub struct SentPost {
    pub base_url: String,
    pub api_key: String,
    pub device_id: String,
    pub temp_c: f64,
    pub sr: u8,
    pub ts_ms: i64,
}

/// Health results keyed per endpoint, posts served from a script
/// (defaulting to 200 when the script runs dry).
pub struct MockHttp {
    pub local_health: Result<u16, TransportError>,
    pub cloud_health: Result<u16, TransportError>,
    pub post_results: VecDeque<Result<u16, TransportError>>,
    pub posts: Vec<SentPost>,
    pub health_probes: Vec<String>,
}

#[allow(dead_code)]
impl MockHttp {
    pub fn new(
        local_health: Result<u16, TransportError>,
        cloud_health: Result<u16, TransportError>,
    ) -> Self {
        Self {
            local_health,
            cloud_health,
            post_results: VecDeque::new(),
            posts: Vec::new(),
            health_probes: Vec::new(),
        }
    }

    pub fn script_posts(&mut self, results: &[Result<u16, TransportError>]) {
        self.post_results.extend(results.iter().copied());
    }
}

impl HttpPort for MockHttp {
    fn health_probe(&mut self, base_url: &str) -> Result<u16, TransportError> {
        self.health_probes.push(base_url.to_string());
        if base_url.starts_with("https://") {
            self.cloud_health
        } else {
            self.local_health
        }
    }

    fn post_reading(
        &mut self,
        base_url: &str,
        api_key: &str,
        record: &IngestRecord<'_>,
    ) -> Result<u16, TransportError> {
        self.posts.push(SentPost {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            device_id: record.device_id.to_string(),
            temp_c: record.temp_c,
            sr: record.sr,
            ts_ms: record.ts_ms,
        });
        self.post_results.pop_front().unwrap_or(Ok(200))
    }
}

// ── Alert output ──────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockAlert {
    pub asserted: bool,
    pub history: Vec<bool>,
}

impl AlertPort for MockAlert {
    fn set_alert(&mut self, active: bool) {
        self.asserted = active;
        self.history.push(active);
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count<F: Fn(&AppEvent) -> bool>(&self, pred: F) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn contains<F: Fn(&AppEvent) -> bool>(&self, pred: F) -> bool {
        self.count(pred) > 0
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
