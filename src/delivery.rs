//! Delivery worker.
//!
//! Consumes queued samples and posts them to the active ingestion endpoint,
//! applying backpressure by failure class:
//!
//! * accepted (200) — sample done, keep draining;
//! * server-side failure (5xx or transport error) — put the sample back at
//!   the consumption end and stop draining until the next wake, the server
//!   needs room to recover;
//! * client-side rejection (other 4xx) — drop the sample and keep going,
//!   retrying a request the server has judged malformed wastes the queue.
//!
//! The worker also drives the endpoint health monitor and the staleness
//! alarm, so all of the "is delivery healthy" state lives on one thread.

use log::{debug, error, info, warn};

use crate::alarm::StalenessAlarm;
use crate::app::events::AppEvent;
use crate::app::ports::{AlertPort, EventSink, HttpPort, IngestRecord, TimePort, TransportError};
use crate::config::SystemConfig;
use crate::endpoint::{EndpointState, HealthMonitor};
use crate::queue::SharedQueue;

/// Classification of one delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// 200 — the server stored the reading.
    Accepted,
    /// Server-side or transport failure; the sample is retryable.
    /// Status is `None` when the request never completed.
    Deferred(Option<u16>),
    /// 401/403 — credentials are wrong; retrying cannot help.
    AuthRejected(u16),
    /// Any other 4xx — the request itself is bad; retrying cannot help.
    Rejected(u16),
}

/// Map an HTTP attempt onto a delivery outcome. Total: every status code
/// and every transport error lands in exactly one class. Unrecognized
/// statuses (1xx/3xx and friends) defer — retry is the safe default for a
/// response we do not understand.
pub fn classify(attempt: Result<u16, TransportError>) -> DeliveryOutcome {
    match attempt {
        Ok(200) => DeliveryOutcome::Accepted,
        Ok(status @ (401 | 403)) => DeliveryOutcome::AuthRejected(status),
        Ok(status @ 400..=499) => DeliveryOutcome::Rejected(status),
        Ok(status) => DeliveryOutcome::Deferred(Some(status)),
        Err(_) => DeliveryOutcome::Deferred(None),
    }
}

/// The delivery worker. Owns the health monitor and the staleness alarm;
/// runs on its own thread, woken by the scheduler.
pub struct DeliveryWorker {
    monitor: HealthMonitor,
    alarm: StalenessAlarm,
    device_id: String,
    api_key: String,
}

impl DeliveryWorker {
    pub fn new(config: &SystemConfig, device_id: String) -> Self {
        Self {
            monitor: HealthMonitor::new(config),
            alarm: StalenessAlarm::new(config),
            device_id,
            api_key: config.api_key.clone(),
        }
    }

    pub fn state(&self) -> &EndpointState {
        self.monitor.state()
    }

    pub fn alarm_active(&self) -> bool {
        self.alarm.is_active()
    }

    /// One-shot startup endpoint selection, before the periodic schedule
    /// starts.
    pub fn startup(&mut self, http: &mut impl HttpPort, clock: &impl TimePort, sink: &mut impl EventSink) {
        self.monitor.startup_select(http, clock.now_utc_ms(), sink);
        sink.emit(&AppEvent::Started {
            active: self.state().active,
            reachable: self.state().reachable,
        });
    }

    /// One delivery cycle: health step, queue drain, alarm evaluation.
    ///
    /// Ordering matters: the alarm is evaluated *after* the drain so a
    /// successful delivery on this very cycle counts as fresh.
    pub fn run_cycle(
        &mut self,
        http: &mut impl HttpPort,
        queue: &SharedQueue,
        clock: &impl TimePort,
        alert: &mut impl AlertPort,
        sink: &mut impl EventSink,
    ) {
        let now = clock.now_utc_ms();
        self.monitor.baseline_success(now);

        let outcome = self.monitor.run_health_step(http, now, sink);
        if outcome.became_reachable {
            self.alarm.clear_early(alert, sink);
        }

        if self.state().reachable {
            self.drain(http, queue, clock, sink);
        } else if !queue.is_empty() {
            debug!("endpoint unreachable, holding {} queued sample(s)", queue.len());
        }

        let stale_for_ms = clock.now_utc_ms() - self.state().last_success_at;
        self.alarm.evaluate(stale_for_ms, alert, sink);
    }

    /// Drain the queue against the active endpoint until it is empty or a
    /// deferrable failure tells us to back off.
    fn drain(
        &mut self,
        http: &mut impl HttpPort,
        queue: &SharedQueue,
        clock: &impl TimePort,
        sink: &mut impl EventSink,
    ) {
        let mut delivered = 0u32;
        while let Some(sample) = queue.pop() {
            let record = IngestRecord {
                device_id: &self.device_id,
                temp_c: round2(sample.temperature_c),
                sr: sample.fault_flags,
                ts_ms: sample.captured_at,
            };
            let attempt = http.post_reading(self.monitor.active_base(), &self.api_key, &record);

            match classify(attempt) {
                DeliveryOutcome::Accepted => {
                    let now = clock.now_utc_ms();
                    self.monitor.record_success(now);
                    delivered += 1;
                    debug!("delivered reading ts={} temp={:.2}", record.ts_ms, record.temp_c);
                    sink.emit(&AppEvent::DeliveryAccepted {
                        ts_ms: sample.captured_at,
                    });
                }
                DeliveryOutcome::Deferred(status) => {
                    queue.requeue_front(sample);
                    match status {
                        Some(code) => warn!("server deferred delivery (HTTP {code}), backing off"),
                        None => warn!("delivery did not complete, backing off"),
                    }
                    sink.emit(&AppEvent::DeliveryDeferred { status });
                    break;
                }
                DeliveryOutcome::AuthRejected(status) => {
                    error!("ingestion rejected credentials (HTTP {status}), dropping reading");
                    sink.emit(&AppEvent::SampleRejected {
                        status,
                        auth: true,
                    });
                }
                DeliveryOutcome::Rejected(status) => {
                    warn!("ingestion rejected reading (HTTP {status}), dropping it");
                    sink.emit(&AppEvent::SampleRejected {
                        status,
                        auth: false,
                    });
                }
            }
        }
        if delivered > 0 && queue.is_empty() {
            info!("queue drained ({delivered} delivered)");
        }
    }
}

/// Round to two decimals for the wire, matching the server's ingest schema.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
