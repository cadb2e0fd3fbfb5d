//! Hardware output drivers.

pub mod alert;
pub mod watchdog;
