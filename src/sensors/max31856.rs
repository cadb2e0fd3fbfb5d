//! MAX31856 thermocouple-to-digital converter driver.
//!
//! SPI mode 1, register map per the datasheet. Configured for a T-type
//! thermocouple with 2-sample averaging and automatic conversion mode, so
//! reads just fetch the latest linearized result.
//!
//! Fault handling is deliberately soft: the fault status register is
//! returned alongside every reading and faults are logged, but a faulty
//! reading is still a reading — the pipeline decides what to do with it.

use std::thread;
use std::time::Duration;

use embedded_hal::spi::{Operation, SpiDevice};
use log::{info, warn};

use crate::app::ports::{SensorError, SensorPort, SensorReading};

// Register addresses (read side; write side is addr | 0x80).
const REG_CR0: u8 = 0x00;
const REG_CR1: u8 = 0x01;
const REG_CJHF: u8 = 0x03;
const REG_CJLF: u8 = 0x04;
const REG_LTHFTH: u8 = 0x05;
const REG_LTHFTL: u8 = 0x06;
const REG_LTLFTH: u8 = 0x07;
const REG_LTLFTL: u8 = 0x08;
const REG_CJTO: u8 = 0x09;
const REG_LTCBH: u8 = 0x0C;
const REG_SR: u8 = 0x0F;

/// CR0: automatic conversion mode.
const CR0_CMODE: u8 = 0x80;
/// CR1: 2-sample averaging, T-type thermocouple.
const CR1_AVG2_TYPE_T: u8 = 0x17;

/// LSB weight of the 19-bit linearized temperature.
const LSB_CELSIUS: f64 = 0.007_812_5;

/// Plausibility window for a freezer installation. Readings outside it are
/// logged but still reported; the fault flags carry the real verdict.
const SANITY_MIN_C: f64 = -100.0;
const SANITY_MAX_C: f64 = 100.0;

/// Fault status bits (REG_SR).
const FAULT_NAMES: [(u8, &str); 8] = [
    (0x01, "OPEN"),
    (0x02, "OVUV"),
    (0x04, "TCLOW"),
    (0x08, "TCHIGH"),
    (0x10, "CJLOW"),
    (0x20, "CJHIGH"),
    (0x40, "TCRANGE"),
    (0x80, "CJRANGE"),
];

pub struct Max31856<SPI> {
    spi: SPI,
}

impl<SPI: SpiDevice> Max31856<SPI> {
    pub fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Program thresholds and conversion mode, then give the converter one
    /// conversion period to settle before the first read.
    pub fn init(&mut self) -> Result<(), SensorError> {
        // Fault thresholds wide open: threshold faults are surfaced through
        // the status register, not used to gate conversions.
        self.write_reg(REG_CJHF, 0x7F)?;
        self.write_reg(REG_CJLF, 0xC0)?;
        self.write_reg(REG_LTHFTH, 0x7F)?;
        self.write_reg(REG_LTHFTL, 0xFF)?;
        self.write_reg(REG_LTLFTH, 0x80)?;
        self.write_reg(REG_LTLFTL, 0x00)?;
        self.write_reg(REG_CJTO, 0x00)?;

        self.write_reg(REG_CR1, CR1_AVG2_TYPE_T)?;
        self.write_reg(REG_CR0, CR0_CMODE)?;

        thread::sleep(Duration::from_millis(50));
        info!("MAX31856 configured: T-type, 2-sample avg, auto conversion");
        Ok(())
    }

    fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), SensorError> {
        self.spi.write(&[reg | 0x80, value]).map_err(|e| {
            warn!("MAX31856 write reg {reg:#04x} failed: {e:?}");
            SensorError::Bus
        })
    }

    fn read_regs(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), SensorError> {
        self.spi
            .transaction(&mut [Operation::Write(&[reg & 0x7F]), Operation::Read(buf)])
            .map_err(|e| {
                warn!("MAX31856 read reg {reg:#04x} failed: {e:?}");
                SensorError::Bus
            })
    }

    fn read_fault_status(&mut self) -> Result<u8, SensorError> {
        let mut sr = [0u8; 1];
        self.read_regs(REG_SR, &mut sr)?;
        Ok(sr[0])
    }

    /// Fetch the latest linearized thermocouple temperature and the fault
    /// status captured in the same cycle.
    pub fn read_temperature(&mut self) -> Result<SensorReading, SensorError> {
        let fault_flags = self.read_fault_status()?;
        if fault_flags != 0 {
            for (bit, name) in FAULT_NAMES {
                if fault_flags & bit != 0 {
                    warn!("MAX31856 fault: {name}");
                }
            }
        }

        let mut ltcb = [0u8; 3];
        self.read_regs(REG_LTCBH, &mut ltcb)?;

        // 19-bit two's-complement value in the top bits of the 3 bytes.
        let packed =
            (u32::from(ltcb[0]) << 16) | (u32::from(ltcb[1]) << 8) | u32::from(ltcb[2]);
        let mut raw = (packed >> 5) as i32;
        if raw & 0x40000 != 0 {
            raw -= 0x80000;
        }
        let temperature_c = f64::from(raw) * LSB_CELSIUS;

        if !(SANITY_MIN_C..=SANITY_MAX_C).contains(&temperature_c) {
            warn!("MAX31856 implausible reading: {temperature_c:.2} C");
        }

        Ok(SensorReading {
            temperature_c,
            fault_flags,
        })
    }
}

impl<SPI: SpiDevice> SensorPort for Max31856<SPI> {
    fn read(&mut self) -> Result<SensorReading, SensorError> {
        self.read_temperature()
    }
}
