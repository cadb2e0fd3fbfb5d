//! End-to-end pipeline tests: producer → queue → delivery worker, with the
//! alarm and alert output in the loop.

use freezermon::app::events::AppEvent;
use freezermon::app::ports::{TimePort, TransportError};
use freezermon::config::SystemConfig;
use freezermon::delivery::DeliveryWorker;
use freezermon::endpoint::Endpoint;
use freezermon::queue::{SharedQueue, QUEUE_CAPACITY};
use freezermon::sampler::SampleProducer;

use crate::mock_hw::{MockAlert, MockClock, MockHttp, RecordingSink, ScriptedSensor};

const DEVICE_ID: &str = "esp32-AABBCCDDEEFF";

struct Rig {
    producer: SampleProducer,
    worker: DeliveryWorker,
    queue: SharedQueue,
    clock: MockClock,
    alert: MockAlert,
    sink: RecordingSink,
}

impl Rig {
    /// Build a rig and run startup selection against the given HTTP mock.
    fn boot(http: &mut MockHttp) -> Self {
        let config = SystemConfig::default();
        let mut rig = Self {
            producer: SampleProducer::new(&config),
            worker: DeliveryWorker::new(&config, DEVICE_ID.to_string()),
            queue: SharedQueue::new(),
            clock: MockClock::at(1_700_000_000_000),
            alert: MockAlert::default(),
            sink: RecordingSink::new(),
        };
        rig.worker.startup(http, &rig.clock, &mut rig.sink);
        rig
    }

    fn sample(&mut self, sensor: &mut ScriptedSensor) {
        self.producer
            .run_cycle(sensor, &self.clock, &self.queue, &mut self.sink);
    }

    fn deliver(&mut self, http: &mut MockHttp) {
        self.worker
            .run_cycle(http, &self.queue, &self.clock, &mut self.alert, &mut self.sink);
    }
}

#[test]
fn clean_boot_samples_and_drains_to_cloud() {
    // Local down, cloud up.
    let mut http = MockHttp::new(Err(TransportError::ConnectFailed), Ok(200));
    let mut rig = Rig::boot(&mut http);
    assert_eq!(rig.worker.state().active, Endpoint::Cloud);
    assert!(rig.worker.state().reachable);

    let mut sensor = ScriptedSensor::new();
    for t in [-18.0, -18.4, -17.9] {
        sensor.push_good(t);
    }
    for _ in 0..3 {
        rig.sample(&mut sensor);
        rig.clock.advance_secs(15);
    }
    assert_eq!(rig.queue.len(), 3);

    rig.clock.advance_secs(60);
    rig.deliver(&mut http);

    assert!(rig.queue.is_empty(), "all samples delivered");
    assert_eq!(http.posts.len(), 3);
    assert!(http.posts.iter().all(|p| p.base_url.starts_with("https://")));
    assert!(http.posts.iter().all(|p| p.device_id == DEVICE_ID));
    assert_eq!(
        rig.worker.state().last_success_at,
        rig.clock.now_utc_ms(),
        "last_success_at advanced to the delivery time"
    );
    assert!(!rig.worker.alarm_active());
    assert!(!rig.alert.asserted);
}

#[test]
fn delivered_values_are_smoothed_and_rounded() {
    let mut http = MockHttp::new(Ok(200), Ok(200));
    let mut rig = Rig::boot(&mut http);

    let mut sensor = ScriptedSensor::new();
    sensor.push_good(-20.0);
    sensor.push_good(-19.0);
    rig.sample(&mut sensor);
    rig.sample(&mut sensor);

    rig.clock.advance_secs(60);
    rig.deliver(&mut http);

    // Seed, then 0.25 * -19 + 0.75 * -20 = -19.75.
    assert_eq!(http.posts[0].temp_c, -20.0);
    assert_eq!(http.posts[1].temp_c, -19.75);
}

#[test]
fn server_failure_halts_drain_and_preserves_order() {
    let mut http = MockHttp::new(Err(TransportError::ConnectFailed), Ok(200));
    let mut rig = Rig::boot(&mut http);

    let mut sensor = ScriptedSensor::new();
    sensor.push_good(-18.0);
    sensor.push_good(-18.1);
    rig.sample(&mut sensor);
    rig.clock.advance_secs(15);
    rig.sample(&mut sensor);

    http.script_posts(&[Ok(500)]);
    rig.clock.advance_secs(60);
    rig.deliver(&mut http);

    // One attempt, drain stopped, nothing lost.
    assert_eq!(http.posts.len(), 1);
    assert_eq!(rig.queue.len(), 2);
    assert!(rig.sink.contains(|e| matches!(
        e,
        AppEvent::DeliveryDeferred { status: Some(500) }
    )));

    // Next cycle retries the same sample first and drains the rest.
    rig.clock.advance_secs(60);
    rig.deliver(&mut http);
    assert!(rig.queue.is_empty());
    assert_eq!(http.posts.len(), 3);
    assert_eq!(http.posts[1].ts_ms, http.posts[0].ts_ms, "failed sample retried first");
}

#[test]
fn auth_rejection_drops_sample_and_keeps_draining() {
    let mut http = MockHttp::new(Err(TransportError::ConnectFailed), Ok(200));
    let mut rig = Rig::boot(&mut http);

    let mut sensor = ScriptedSensor::new();
    for t in [-18.0, -18.1, -18.2] {
        sensor.push_good(t);
    }
    for _ in 0..3 {
        rig.sample(&mut sensor);
    }

    http.script_posts(&[Ok(403), Ok(200), Ok(200)]);
    rig.clock.advance_secs(60);
    rig.deliver(&mut http);

    assert!(rig.queue.is_empty(), "rejection does not halt the drain");
    assert_eq!(http.posts.len(), 3);
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, AppEvent::SampleRejected { auth: true, .. })),
        1
    );
}

#[test]
fn queue_overflow_sheds_oldest_and_reports_it() {
    let mut http = MockHttp::new(Err(TransportError::ConnectFailed), Err(TransportError::Timeout));
    let mut rig = Rig::boot(&mut http);
    assert!(!rig.worker.state().reachable);

    let mut sensor = ScriptedSensor::new();
    for i in 0..(QUEUE_CAPACITY + 3) {
        sensor.push_good(-18.0 - i as f64 * 0.1);
    }
    for _ in 0..(QUEUE_CAPACITY + 3) {
        rig.sample(&mut sensor);
        rig.clock.advance_secs(15);
    }

    assert_eq!(rig.queue.len(), QUEUE_CAPACITY);
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, AppEvent::SampleEvicted { .. })),
        3
    );
}

#[test]
fn alarm_boundary_and_alert_line() {
    // Both endpoints down from boot.
    let mut http = MockHttp::new(
        Err(TransportError::ConnectFailed),
        Err(TransportError::ConnectFailed),
    );
    let mut rig = Rig::boot(&mut http);
    let boot_ms = rig.clock.now_utc_ms();

    // First cycle baselines the success clock.
    rig.clock.advance_secs(60);
    rig.deliver(&mut http);
    let baseline_ms = rig.clock.now_utc_ms();
    assert!(!rig.worker.alarm_active());

    // 119 s of silence: still inside the window.
    rig.clock.set(baseline_ms + 119_000);
    rig.deliver(&mut http);
    assert!(!rig.worker.alarm_active());
    assert!(!rig.alert.asserted);

    // 121 s: alarm up, alert line driven high.
    rig.clock.set(baseline_ms + 121_000);
    rig.deliver(&mut http);
    assert!(rig.worker.alarm_active());
    assert!(rig.alert.asserted);
    assert!(rig.sink.contains(|e| matches!(e, AppEvent::AlarmRaised { .. })));

    // Endpoint recovers and a queued sample lands: alarm clears.
    let mut sensor = ScriptedSensor::new();
    sensor.push_good(-18.0);
    rig.sample(&mut sensor);
    http.cloud_health = Ok(200);
    rig.clock.set(baseline_ms + 181_000);
    rig.deliver(&mut http);
    assert!(!rig.worker.alarm_active());
    assert!(!rig.alert.asserted);
    let _ = boot_ms;
}

#[test]
fn recovery_clears_alarm_early_before_any_delivery() {
    let mut http = MockHttp::new(
        Err(TransportError::ConnectFailed),
        Err(TransportError::ConnectFailed),
    );
    let mut rig = Rig::boot(&mut http);

    rig.clock.advance_secs(60);
    rig.deliver(&mut http);
    let baseline_ms = rig.clock.now_utc_ms();

    rig.clock.set(baseline_ms + 130_000);
    rig.deliver(&mut http);
    assert!(rig.worker.alarm_active());

    // Probe succeeds on the next health cycle; the queue is empty so no
    // delivery happens, but the transition alone clears optimistically.
    http.cloud_health = Ok(200);
    rig.clock.set(baseline_ms + 190_000);
    rig.deliver(&mut http);
    assert!(rig.sink.contains(|e| matches!(e, AppEvent::AlarmCleared { early: true })));
}

#[test]
fn faulty_reading_is_delivered_raw_with_status_bits() {
    let mut http = MockHttp::new(Ok(200), Ok(200));
    let mut rig = Rig::boot(&mut http);

    let mut sensor = ScriptedSensor::new();
    sensor.push_good(-20.0);
    sensor.push_faulty(42.0, 0x02); // OVUV
    rig.sample(&mut sensor);
    rig.sample(&mut sensor);

    rig.clock.advance_secs(60);
    rig.deliver(&mut http);

    assert_eq!(http.posts[1].temp_c, 42.0, "faulty reading bypasses the filter");
    assert_eq!(http.posts[1].sr, 0x02);
}
