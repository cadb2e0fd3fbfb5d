//! ESP32-S3 pin assignments.
//!
//! SPI2 wiring for the MAX31856 thermocouple front-end plus the alert
//! output line driven by the staleness alarm.

#![allow(dead_code)]

// ── SPI2 (MAX31856) ───────────────────────────────────────────
/// SDO of the MAX31856.
pub const SPI_MISO_GPIO: i32 = 13;
/// SDI of the MAX31856.
pub const SPI_MOSI_GPIO: i32 = 11;
/// SCK.
pub const SPI_CLK_GPIO: i32 = 12;
/// Chip select (active low).
pub const SPI_CS_GPIO: i32 = 10;

// ── Alert output ──────────────────────────────────────────────
/// Drives the external buzzer/relay input; high = alarm asserted.
pub const ALERT_GPIO: i32 = 4;
