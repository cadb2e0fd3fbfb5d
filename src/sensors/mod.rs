//! Sensor front-end drivers.

pub mod max31856;
