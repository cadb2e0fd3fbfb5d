//! Sample producer.
//!
//! Periodic worker that turns raw thermocouple reads into queued samples.
//! Fault-free readings are smoothed with a first-order EMA; faulty readings
//! are delivered raw so the server sees the actual misbehaving value, but
//! they do not perturb the filter state — the next good reading resumes
//! smoothing from the last good state instead of restarting from a spike.
//!
//! This worker never touches the network; its only side effect is a queue
//! push (plus events).

use log::warn;

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, SensorPort, TimePort};
use crate::config::SystemConfig;
use crate::queue::{Sample, SharedQueue};

/// EMA filter state. Owned exclusively by the producer; never shared.
#[derive(Debug, Clone, Copy, Default)]
struct SmoothingState {
    has_value: bool,
    filtered_c: f64,
}

impl SmoothingState {
    /// Fold one fault-free reading into the filter and return the
    /// smoothed value. The first good sample seeds the filter.
    fn update(&mut self, alpha: f64, raw_c: f64) -> f64 {
        self.filtered_c = if self.has_value {
            alpha * raw_c + (1.0 - alpha) * self.filtered_c
        } else {
            self.has_value = true;
            raw_c
        };
        self.filtered_c
    }
}

/// The sample producer worker.
pub struct SampleProducer {
    alpha: f64,
    smoothing: SmoothingState,
}

impl SampleProducer {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            alpha: config.smoothing_alpha,
            smoothing: SmoothingState::default(),
        }
    }

    /// One capture cycle: read → smooth → timestamp → enqueue.
    ///
    /// A failed sensor read is transient: log, produce nothing, touch
    /// nothing. The queue push never blocks; an eviction is surfaced as an
    /// event only, because shedding old samples under a dead uplink is the
    /// intended behavior.
    pub fn run_cycle(
        &mut self,
        sensor: &mut impl SensorPort,
        clock: &impl TimePort,
        queue: &SharedQueue,
        sink: &mut impl EventSink,
    ) {
        let reading = match sensor.read() {
            Ok(r) => r,
            Err(e) => {
                warn!("sensor read failed ({e}), skipping this cycle");
                return;
            }
        };

        let smoothed = reading.fault_flags == 0;
        let delivered_c = if smoothed {
            self.smoothing.update(self.alpha, reading.temperature_c)
        } else {
            reading.temperature_c
        };

        let sample = Sample {
            temperature_c: delivered_c,
            fault_flags: reading.fault_flags,
            captured_at: clock.now_utc_ms(),
        };

        if let Some(evicted) = queue.push(sample) {
            warn!(
                "sample queue full — evicted reading from ts={}",
                evicted.captured_at
            );
            sink.emit(&AppEvent::SampleEvicted {
                dropped_ts_ms: evicted.captured_at,
            });
        }

        sink.emit(&AppEvent::SampleCaptured {
            temp_c: delivered_c,
            fault_flags: reading.fault_flags,
            smoothed,
        });
    }
}
