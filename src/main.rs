//! FreezerMon firmware — main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  Max31856      HttpClient    NvsConfigStore   SntpTime       │
//! │  (SensorPort)  (HttpPort)    (ConfigPort)     (TimePort)     │
//! │  AlertOutput   LogEventSink                                  │
//! │  (AlertPort)   (EventSink)                                   │
//! │                                                              │
//! │  ────────────── Port Trait Boundary ───────────────────      │
//! │                                                              │
//! │  ┌──────────────────────────────────────────────────────┐    │
//! │  │  SampleProducer ── SharedQueue ── DeliveryWorker     │    │
//! │  │                 (two worker threads)                 │    │
//! │  └──────────────────────────────────────────────────────┘    │
//! │                                                              │
//! │  Scheduler (two esp_timer cadences, coalesced wakes)         │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use anyhow::{Context, Result};
use log::{info, warn};

use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::spi::{config as spi_config, SpiDeviceDriver, SpiDriver, SpiDriverConfig};
use esp_idf_hal::units::FromValueType;

use freezermon::adapters::device_id;
use freezermon::adapters::http::HttpClient;
use freezermon::adapters::log_sink::LogEventSink;
use freezermon::adapters::nvs::NvsConfigStore;
use freezermon::adapters::time::SntpTime;
use freezermon::app::ports::ConfigPort;
use freezermon::config::SystemConfig;
use freezermon::delivery::DeliveryWorker;
use freezermon::drivers::alert::AlertOutput;
use freezermon::pipeline;
use freezermon::queue::SharedQueue;
use freezermon::sampler::SampleProducer;
use freezermon::scheduler;
use freezermon::sensors::max31856::Max31856;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("FreezerMon v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Config from NVS (or defaults) ──────────────────────
    let config = match NvsConfigStore::new() {
        Ok(nvs) => nvs.load().unwrap_or_else(|e| {
            warn!("config load failed ({e}), using defaults");
            SystemConfig::default()
        }),
        Err(e) => {
            warn!("NVS init failed ({e}), running with defaults and no persistence");
            SystemConfig::default()
        }
    };

    // ── 3. Thermocouple front-end on SPI2 ─────────────────────
    let peripherals = Peripherals::take().context("peripherals already taken")?;
    let spi_driver = SpiDriver::new(
        peripherals.spi2,
        peripherals.pins.gpio12, // SCK
        peripherals.pins.gpio11, // SDI of the MAX31856
        Some(peripherals.pins.gpio13), // SDO of the MAX31856
        &SpiDriverConfig::new(),
    )
    .context("SPI driver init")?;
    let spi_device = SpiDeviceDriver::new(
        spi_driver,
        Some(peripherals.pins.gpio10), // CS, active low
        &spi_config::Config::new()
            .baudrate(1.MHz().into())
            .data_mode(embedded_hal::spi::MODE_1),
    )
    .context("SPI device init")?;

    let mut sensor = Max31856::new(spi_device);
    sensor
        .init()
        .map_err(|e| anyhow::anyhow!("MAX31856 init failed: {e}"))?;

    // ── 4. Wall clock ─────────────────────────────────────────
    // Network link is assumed up by this point (provisioning is outside
    // this firmware). TLS and timestamps both need a sane clock first.
    let clock = SntpTime::start().context("SNTP sync")?;

    // ── 5. Identity, alert line, HTTP ─────────────────────────
    let dev_id = device_id::device_id();
    let alert = AlertOutput::new().map_err(|e| anyhow::anyhow!("alert output: {e}"))?;
    let mut http = HttpClient::new(&config);

    // ── 6. Pipeline state + startup endpoint selection ────────
    let queue = SharedQueue::new();
    let producer = SampleProducer::new(&config);
    let mut worker = DeliveryWorker::new(&config, dev_id);

    let mut sink = LogEventSink;
    worker.startup(&mut http, &clock, &mut sink);
    scheduler::set_reachable_hint(worker.state().reachable);

    // ── 7. Worker threads + timers ────────────────────────────
    pipeline::spawn_producer(producer, sensor, SntpTime, queue.clone(), LogEventSink)
        .map_err(|e| anyhow::anyhow!("spawn producer: {e}"))?;
    pipeline::spawn_delivery(worker, http, clock, queue, alert, sink)
        .map_err(|e| anyhow::anyhow!("spawn delivery: {e}"))?;
    scheduler::start_timers(&config).map_err(|e| anyhow::anyhow!("timers: {e}"))?;

    info!("pipeline running");

    // Workers own everything from here; the main task just parks.
    loop {
        std::thread::park();
    }
}
