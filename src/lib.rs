//! FreezerMon firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod alarm;
pub mod app;
pub mod config;
pub mod delivery;
pub mod endpoint;
pub mod pipeline;
pub mod queue;
pub mod sampler;
pub mod scheduler;

mod error;
mod pins;

// Hardware-facing modules; ESP-IDF code paths are cfg-gated inside,
// simulation backends keep them host-buildable.
pub mod adapters;
pub mod drivers;
pub mod sensors;

pub use error::{Error, Result};
