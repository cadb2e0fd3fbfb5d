//! Worker thread loops.
//!
//! Two long-lived threads, one per pipeline stage. Each loop waits on its
//! wake signal with a short timeout and feeds the task watchdog every pass,
//! so an idle worker (no wakes due) stays visibly alive while a wedged one
//! — stuck in a cycle longer than the watchdog timeout — trips a reset.

use std::thread;
use std::time::Duration;

use log::info;

use crate::app::ports::{AlertPort, EventSink, HttpPort, SensorPort, TimePort};
use crate::delivery::DeliveryWorker;
use crate::drivers::watchdog::Watchdog;
use crate::error::{Error, Result};
use crate::queue::SharedQueue;
use crate::sampler::SampleProducer;
use crate::scheduler::{self, DELIVERY_WAKE, SAMPLE_WAKE};

/// Idle wait per pass. Far below the watchdog timeout so several feeds fit
/// in one watchdog window even with cycle work in between.
const FEED_INTERVAL: Duration = Duration::from_secs(5);

/// Body of the sample producer thread.
pub fn producer_loop(
    mut producer: SampleProducer,
    mut sensor: impl SensorPort,
    clock: impl TimePort,
    queue: SharedQueue,
    mut sink: impl EventSink,
) {
    let mut wdt = Watchdog::subscribe_current_task();
    info!("sample producer running");
    loop {
        let woke = SAMPLE_WAKE.wait_timeout(FEED_INTERVAL);
        wdt.feed();
        if woke {
            producer.run_cycle(&mut sensor, &clock, &queue, &mut sink);
        }
    }
}

/// Body of the delivery worker thread. Publishes the reachability hint
/// after every cycle so the sample tick knows whether to piggyback a
/// delivery wake.
pub fn delivery_loop(
    mut worker: DeliveryWorker,
    mut http: impl HttpPort,
    clock: impl TimePort,
    queue: SharedQueue,
    mut alert: impl AlertPort,
    mut sink: impl EventSink,
) {
    let mut wdt = Watchdog::subscribe_current_task();
    info!("delivery worker running");
    loop {
        let woke = DELIVERY_WAKE.wait_timeout(FEED_INTERVAL);
        wdt.feed();
        if woke {
            worker.run_cycle(&mut http, &queue, &clock, &mut alert, &mut sink);
            scheduler::set_reachable_hint(worker.state().reachable);
        }
    }
}

/// Spawn the sample producer on its own named thread.
pub fn spawn_producer(
    producer: SampleProducer,
    sensor: impl SensorPort + Send + 'static,
    clock: impl TimePort + Send + 'static,
    queue: SharedQueue,
    sink: impl EventSink + Send + 'static,
) -> Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("sampler".into())
        .stack_size(8 * 1024)
        .spawn(move || producer_loop(producer, sensor, clock, queue, sink))
        .map_err(|_| Error::Init("sampler thread"))
}

/// Spawn the delivery worker on its own named thread. The larger stack
/// covers TLS handshakes inside the HTTP client.
pub fn spawn_delivery(
    worker: DeliveryWorker,
    http: impl HttpPort + Send + 'static,
    clock: impl TimePort + Send + 'static,
    queue: SharedQueue,
    alert: impl AlertPort + Send + 'static,
    sink: impl EventSink + Send + 'static,
) -> Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("delivery".into())
        .stack_size(16 * 1024)
        .spawn(move || delivery_loop(worker, http, clock, queue, alert, sink))
        .map_err(|_| Error::Init("delivery thread"))
}
