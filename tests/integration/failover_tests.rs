//! Endpoint selection and failover behavior through the delivery worker.

use freezermon::app::events::AppEvent;
use freezermon::app::ports::{TimePort, TransportError};
use freezermon::config::SystemConfig;
use freezermon::delivery::DeliveryWorker;
use freezermon::endpoint::Endpoint;
use freezermon::queue::SharedQueue;

use crate::mock_hw::{MockAlert, MockClock, MockHttp, RecordingSink};

const DEVICE_ID: &str = "esp32-AABBCCDDEEFF";

fn boot(http: &mut MockHttp) -> (DeliveryWorker, MockClock, RecordingSink) {
    let mut worker = DeliveryWorker::new(&SystemConfig::default(), DEVICE_ID.to_string());
    let clock = MockClock::at(1_700_000_000_000);
    let mut sink = RecordingSink::new();
    worker.startup(http, &clock, &mut sink);
    (worker, clock, sink)
}

#[test]
fn startup_selection_truth_table() {
    // Local up → Local, plain transport.
    let mut http = MockHttp::new(Ok(200), Ok(200));
    let (worker, _, _) = boot(&mut http);
    assert_eq!(worker.state().active, Endpoint::Local);
    assert!(!worker.state().secure_transport);
    assert!(worker.state().reachable);

    // Local down, cloud up → Cloud, secure.
    let mut http = MockHttp::new(Err(TransportError::ConnectFailed), Ok(200));
    let (worker, _, _) = boot(&mut http);
    assert_eq!(worker.state().active, Endpoint::Cloud);
    assert!(worker.state().secure_transport);
    assert!(worker.state().reachable);

    // Local degraded (503) still counts as up.
    let mut http = MockHttp::new(Ok(503), Ok(200));
    let (worker, _, _) = boot(&mut http);
    assert_eq!(worker.state().active, Endpoint::Local);
    assert!(worker.state().reachable);

    // Both down → Cloud, unreachable.
    let mut http = MockHttp::new(
        Err(TransportError::Timeout),
        Err(TransportError::ConnectFailed),
    );
    let (worker, _, sink) = boot(&mut http);
    assert_eq!(worker.state().active, Endpoint::Cloud);
    assert!(!worker.state().reachable);
    assert!(sink.contains(|e| matches!(
        e,
        AppEvent::Started {
            active: Endpoint::Cloud,
            reachable: false
        }
    )));
}

#[test]
fn prefer_local_switches_back_on_fifth_health_cycle() {
    let mut http = MockHttp::new(Err(TransportError::ConnectFailed), Ok(200));
    let (mut worker, clock, mut sink) = boot(&mut http);
    assert_eq!(worker.state().active, Endpoint::Cloud);

    // Local comes back after boot.
    http.local_health = Ok(200);

    let queue = SharedQueue::new();
    let mut alert = MockAlert::default();
    for cycle in 1..=4 {
        clock.advance_secs(60);
        worker.run_cycle(&mut http, &queue, &clock, &mut alert, &mut sink);
        assert_eq!(
            worker.state().active,
            Endpoint::Cloud,
            "still on cloud after cycle {cycle}"
        );
    }

    clock.advance_secs(60);
    worker.run_cycle(&mut http, &queue, &clock, &mut alert, &mut sink);
    assert_eq!(worker.state().active, Endpoint::Local);
    assert!(!worker.state().secure_transport);
    assert!(sink.contains(|e| matches!(
        e,
        AppEvent::EndpointSwitched {
            from: Endpoint::Cloud,
            to: Endpoint::Local
        }
    )));
}

#[test]
fn deliveries_follow_the_active_endpoint_after_switch() {
    let mut http = MockHttp::new(Err(TransportError::ConnectFailed), Ok(200));
    let (mut worker, clock, mut sink) = boot(&mut http);

    let queue = SharedQueue::new();
    let mut alert = MockAlert::default();

    // Deliver one sample while on cloud.
    queue.push(freezermon::queue::Sample {
        temperature_c: -18.0,
        fault_flags: 0,
        captured_at: clock.now_utc_ms(),
    });
    clock.advance_secs(60);
    worker.run_cycle(&mut http, &queue, &clock, &mut alert, &mut sink);
    assert!(http.posts.last().unwrap().base_url.starts_with("https://"));

    // Local returns; ride out the reprobe cycles until the switch lands.
    http.local_health = Ok(200);
    while worker.state().active == Endpoint::Cloud {
        clock.advance_secs(60);
        worker.run_cycle(&mut http, &queue, &clock, &mut alert, &mut sink);
    }

    queue.push(freezermon::queue::Sample {
        temperature_c: -18.2,
        fault_flags: 0,
        captured_at: clock.now_utc_ms(),
    });
    clock.advance_secs(60);
    worker.run_cycle(&mut http, &queue, &clock, &mut alert, &mut sink);
    assert!(http.posts.last().unwrap().base_url.starts_with("http://"));
}

#[test]
fn health_probes_run_on_schedule_while_unreachable() {
    let mut http = MockHttp::new(
        Err(TransportError::ConnectFailed),
        Err(TransportError::ConnectFailed),
    );
    let (mut worker, clock, mut sink) = boot(&mut http);
    let probes_after_boot = http.health_probes.len();

    let queue = SharedQueue::new();
    let mut alert = MockAlert::default();

    // Wakes inside the interval do not probe.
    clock.advance_secs(15);
    worker.run_cycle(&mut http, &queue, &clock, &mut alert, &mut sink);
    assert_eq!(http.health_probes.len(), probes_after_boot);

    // The due wake probes even though nothing is queued.
    clock.advance_secs(45);
    worker.run_cycle(&mut http, &queue, &clock, &mut alert, &mut sink);
    assert!(http.health_probes.len() > probes_after_boot);
}
