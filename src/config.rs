//! System configuration parameters
//!
//! All tunable parameters for the FreezerMon pipeline.
//! Values can be overridden via NVS (non-volatile storage).

use serde::{Deserialize, Serialize};

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Endpoints ---
    /// Local ingestion server base URL (plain HTTP, LAN).
    pub local_base_url: String,
    /// Cloud ingestion server base URL (HTTPS).
    pub cloud_base_url: String,
    /// Shared secret sent as `X-API-Key` on every delivery.
    pub api_key: String,

    // --- Cadences ---
    /// Sample capture interval (seconds).
    pub sample_interval_secs: u32,
    /// Endpoint health-check interval (seconds).
    pub health_check_interval_secs: u32,
    /// Probe the Local endpoint every N health cycles while on Cloud.
    pub local_reprobe_cycles: u32,

    // --- Alarm ---
    /// Maximum tolerated time since last successful delivery (seconds).
    pub staleness_window_secs: u32,

    // --- Smoothing ---
    /// Exponential smoothing factor for fault-free readings.
    pub smoothing_alpha: f64,

    // --- Network timeouts ---
    /// Health probe timeout (milliseconds).
    pub probe_timeout_ms: u32,
    /// Delivery POST timeout (milliseconds).
    pub delivery_timeout_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Endpoints
            local_base_url: "http://freezer-hub.local:8080".to_string(),
            cloud_base_url: "https://freezer-monitor-server.onrender.com".to_string(),
            api_key: "change-me".to_string(),

            // Cadences
            sample_interval_secs: 15,
            health_check_interval_secs: 60,
            local_reprobe_cycles: 5, // ~300 s on Cloud before trying Local again

            // Alarm
            staleness_window_secs: 120,

            // Smoothing
            smoothing_alpha: 0.25,

            // Timeouts
            probe_timeout_ms: 8_000,
            delivery_timeout_ms: 10_000,
        }
    }
}
