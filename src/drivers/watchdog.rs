//! Task Watchdog Timer (TWDT) driver.
//!
//! Wraps the ESP-IDF TWDT API to reset the device if either pipeline
//! thread stalls for more than 30 seconds. Each worker loop calls `feed()`
//! on every wait pass, so an idle thread keeps feeding while a wedged one
//! trips the reset.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
const TWDT_TIMEOUT_MS: u32 = 30_000;

pub struct Watchdog {
    #[cfg(target_os = "espidf")]
    subscribed: bool,
}

impl Watchdog {
    /// Configure the TWDT and subscribe the calling task to it. Meant to be
    /// called once from each worker thread's own context.
    pub fn subscribe_current_task() -> Self {
        #[cfg(target_os = "espidf")]
        {
            unsafe {
                let cfg = esp_task_wdt_config_t {
                    timeout_ms: TWDT_TIMEOUT_MS,
                    idle_core_mask: 0,
                    trigger_panic: true,
                };
                let ret = esp_task_wdt_reconfigure(&cfg);
                if ret != ESP_OK {
                    log::warn!(
                        "TWDT reconfigure returned {} (may already be configured)",
                        ret
                    );
                }

                let ret = esp_task_wdt_add(core::ptr::null_mut());
                let subscribed = ret == ESP_OK;
                if subscribed {
                    info!("watchdog: task subscribed (30s timeout, panic on trigger)");
                } else {
                    log::warn!("watchdog: failed to subscribe ({})", ret);
                }

                Self { subscribed }
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            Self {}
        }
    }

    /// Feed the watchdog for the calling task.
    pub fn feed(&mut self) {
        #[cfg(target_os = "espidf")]
        {
            if self.subscribed {
                unsafe {
                    esp_task_wdt_reset();
                }
            }
        }
    }
}

#[cfg(target_os = "espidf")]
impl Drop for Watchdog {
    fn drop(&mut self) {
        if self.subscribed {
            // SAFETY: null unsubscribes the calling task, which is the one
            // that subscribed in `subscribe_current_task`.
            unsafe {
                esp_task_wdt_delete(core::ptr::null_mut());
            }
        }
    }
}
