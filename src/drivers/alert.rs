//! External alert line driver.
//!
//! Drives the buzzer/relay GPIO from the staleness alarm. Active high.
//! The host build keeps the last written level so tests can observe it.

use crate::app::ports::AlertPort;
use crate::pins;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use log::info;

use crate::error::{Error, Result};

pub struct AlertOutput {
    #[cfg(not(target_os = "espidf"))]
    asserted: bool,
}

impl AlertOutput {
    /// Configure the alert pin as a plain push-pull output, deasserted.
    pub fn new() -> Result<Self> {
        #[cfg(target_os = "espidf")]
        {
            let cfg = gpio_config_t {
                pin_bit_mask: 1u64 << pins::ALERT_GPIO,
                mode: gpio_mode_t_GPIO_MODE_OUTPUT,
                pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
                pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
                intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
            };
            // SAFETY: cfg is a valid, fully-initialized gpio_config_t for a
            // pin this firmware owns exclusively.
            let ret = unsafe { gpio_config(&cfg) };
            if ret != ESP_OK {
                return Err(Error::Init("alert gpio config"));
            }
            unsafe { gpio_set_level(pins::ALERT_GPIO, 0) };
            info!("alert output ready on GPIO{}", pins::ALERT_GPIO);
            Ok(Self {})
        }

        #[cfg(not(target_os = "espidf"))]
        {
            info!("alert output (sim) ready on GPIO{}", pins::ALERT_GPIO);
            Ok(Self { asserted: false })
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn is_asserted(&self) -> bool {
        self.asserted
    }
}

impl AlertPort for AlertOutput {
    fn set_alert(&mut self, active: bool) {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: pin configured as output in `new`; level writes are
            // single-register and safe from any task context.
            unsafe { gpio_set_level(pins::ALERT_GPIO, u32::from(active)) };
        }

        #[cfg(not(target_os = "espidf"))]
        {
            self.asserted = active;
            info!("alert line (sim) -> {}", if active { "ON" } else { "off" });
        }
    }
}
