//! Endpoint health monitor & selector.
//!
//! Tracks which of the two configured ingestion endpoints is active and
//! whether it is currently worth attempting deliveries against it.
//!
//! "Reachable" is operational, not aspirational: a health probe that
//! completed with HTTP 200 **or** HTTP 503 counts. A degraded server is
//! still a server — the delivery worker keeps attempting ingestion rather
//! than failing over on the server's own load shedding.
//!
//! ## Prefer-local policy
//!
//! Local ingestion is cheaper and keeps data on the LAN, so the selector is
//! biased toward it: while Cloud is active, every
//! [`SystemConfig::local_reprobe_cycles`]-th health cycle additionally
//! probes Local (regardless of Cloud's own state) and switches back the
//! moment Local answers. The cycle gate bounds how often the device pays
//! for contacting a possibly-absent local server.
//!
//! Single-writer: only the delivery worker calls the mutating operations.

use core::fmt;

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, HttpPort};
use crate::config::SystemConfig;

/// One of the two configured ingestion targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// LAN ingestion server, plain HTTP.
    Local,
    /// Cloud ingestion server, HTTPS.
    Cloud,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Cloud => write!(f, "cloud"),
        }
    }
}

/// Selector state. Single-writer (delivery worker); the scheduler sees only
/// a relaxed copy of `reachable` via the wake hint.
#[derive(Debug, Clone, Copy)]
pub struct EndpointState {
    pub active: Endpoint,
    /// Whether the active endpoint requires TLS.
    pub secure_transport: bool,
    /// Last probe verdict for the active endpoint.
    pub reachable: bool,
    /// UTC ms of the last health probe.
    pub last_health_check_at: i64,
    /// UTC ms of the last accepted delivery. 0 = never (rebased at the
    /// first delivery-worker cycle to avoid a false alarm at boot).
    pub last_success_at: i64,
    /// Completed health cycles since startup.
    pub health_cycle_count: u32,
}

/// Result of one periodic health step, consumed by the delivery worker.
#[derive(Debug, Clone, Copy, Default)]
pub struct HealthStepOutcome {
    /// A probe actually ran this wake (the interval had elapsed).
    pub checked: bool,
    /// The endpoint went unreachable → reachable (triggers the optimistic
    /// alarm clear).
    pub became_reachable: bool,
    /// The prefer-local policy switched the active endpoint to Local.
    pub switched_to_local: bool,
}

/// Health monitor & selector.
pub struct HealthMonitor {
    state: EndpointState,
    local_base: String,
    cloud_base: String,
    check_interval_ms: i64,
    reprobe_cycles: u32,
}

impl HealthMonitor {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            state: EndpointState {
                active: Endpoint::Cloud,
                secure_transport: true,
                reachable: false,
                last_health_check_at: 0,
                last_success_at: 0,
                health_cycle_count: 0,
            },
            local_base: config.local_base_url.clone(),
            cloud_base: config.cloud_base_url.clone(),
            check_interval_ms: i64::from(config.health_check_interval_secs) * 1_000,
            reprobe_cycles: config.local_reprobe_cycles.max(1),
        }
    }

    /// A probe result counts as reachable on plain success and on
    /// degraded-but-up (the server asked for backoff, but it is there).
    fn is_reachable_status(status: u16) -> bool {
        matches!(status, 200 | 503)
    }

    fn base_url(&self, endpoint: Endpoint) -> &str {
        match endpoint {
            Endpoint::Local => &self.local_base,
            Endpoint::Cloud => &self.cloud_base,
        }
    }

    /// Base URL of the currently active endpoint.
    pub fn active_base(&self) -> &str {
        self.base_url(self.state.active)
    }

    pub fn state(&self) -> &EndpointState {
        &self.state
    }

    /// Startup selection: prefer Local, fall back to Cloud, and when
    /// neither answers, sit on Cloud marked unreachable — the periodic
    /// probes keep retrying on schedule.
    pub fn startup_select(
        &mut self,
        http: &mut impl HttpPort,
        now: i64,
        sink: &mut impl EventSink,
    ) {
        if self.probe(http, Endpoint::Local, sink) {
            self.state.active = Endpoint::Local;
            self.state.secure_transport = false;
            self.state.reachable = true;
        } else {
            let cloud_up = self.probe(http, Endpoint::Cloud, sink);
            self.state.active = Endpoint::Cloud;
            self.state.secure_transport = true;
            self.state.reachable = cloud_up;
        }
        self.state.last_health_check_at = now;
        info!(
            "endpoint selected: {} (reachable={})",
            self.state.active, self.state.reachable
        );
    }

    /// Periodic health step. Runs at most once per health interval; probes
    /// the active endpoint, then applies the prefer-local policy.
    pub fn run_health_step(
        &mut self,
        http: &mut impl HttpPort,
        now: i64,
        sink: &mut impl EventSink,
    ) -> HealthStepOutcome {
        let mut outcome = HealthStepOutcome::default();
        if now - self.state.last_health_check_at < self.check_interval_ms {
            return outcome;
        }

        let was_reachable = self.state.reachable;
        self.state.reachable = self.probe(http, self.state.active, sink);
        self.state.last_health_check_at = now;
        self.state.health_cycle_count = self.state.health_cycle_count.wrapping_add(1);
        outcome.checked = true;

        if self.state.active == Endpoint::Cloud
            && self.state.health_cycle_count % self.reprobe_cycles == 0
            && self.probe(http, Endpoint::Local, sink)
        {
            info!("prefer-local: local endpoint answered, switching back");
            sink.emit(&AppEvent::EndpointSwitched {
                from: Endpoint::Cloud,
                to: Endpoint::Local,
            });
            self.state.active = Endpoint::Local;
            self.state.secure_transport = false;
            self.state.reachable = true;
            outcome.switched_to_local = true;
        }

        outcome.became_reachable = self.state.reachable && !was_reachable;
        outcome
    }

    /// Record an accepted delivery.
    pub fn record_success(&mut self, now: i64) {
        self.state.last_success_at = now;
    }

    /// Rebase `last_success_at` at the first evaluation after boot so the
    /// staleness alarm measures from startup, not from the epoch.
    pub fn baseline_success(&mut self, now: i64) {
        if self.state.last_success_at == 0 {
            self.state.last_success_at = now;
        }
    }

    fn probe(
        &mut self,
        http: &mut impl HttpPort,
        endpoint: Endpoint,
        sink: &mut impl EventSink,
    ) -> bool {
        let url = match endpoint {
            Endpoint::Local => self.local_base.clone(),
            Endpoint::Cloud => self.cloud_base.clone(),
        };
        let (reachable, status) = match http.health_probe(&url) {
            Ok(code) => (Self::is_reachable_status(code), Some(code)),
            Err(e) => {
                warn!("health probe against {endpoint} did not complete: {e}");
                (false, None)
            }
        };
        sink.emit(&AppEvent::EndpointProbed {
            endpoint,
            reachable,
            status,
        });
        reachable
    }
}
