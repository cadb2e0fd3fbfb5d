//! Outward-facing adapters: implementations of the application ports
//! against ESP-IDF (on device) or simulation backends (on the host).

pub mod device_id;
pub mod http;
pub mod log_sink;
pub mod nvs;
pub mod time;
