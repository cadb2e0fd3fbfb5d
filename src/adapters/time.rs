//! Wall-clock adapter.
//!
//! On device the system clock starts at the epoch and is useless until
//! SNTP has synced, so [`SntpTime`] gates on a sanity epoch: any time
//! before 2021-01-01 is treated as not-yet-valid. TLS certificate
//! validation and sample timestamps both depend on this gate.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::{info, warn};

use crate::app::ports::TimePort;
use crate::error::{Error, Result};

/// Any wall-clock time before this is a cold boot, not a real date.
const SANITY_EPOCH_MS: i64 = 1_609_459_200_000; // 2021-01-01T00:00:00Z

/// How long to wait for the first SNTP sync before giving up.
const SYNC_WAIT: Duration = Duration::from_secs(20);
const SYNC_POLL: Duration = Duration::from_millis(100);

pub struct SntpTime;

impl SntpTime {
    /// Start the SNTP client and block until the clock passes the sanity
    /// epoch, up to [`SYNC_WAIT`]. Errors if the clock never becomes sane;
    /// nothing downstream can timestamp or speak TLS without real time.
    pub fn start() -> Result<Self> {
        let time = Self;

        #[cfg(target_os = "espidf")]
        {
            use esp_idf_svc::sys::*;
            // SAFETY: SNTP init runs once from the main task before the
            // pipeline threads exist; the server name is a static literal.
            unsafe {
                esp_sntp_setoperatingmode(esp_sntp_operatingmode_t_ESP_SNTP_OPMODE_POLL);
                esp_sntp_setservername(0, c"pool.ntp.org".as_ptr());
                esp_sntp_init();
            }
        }

        let deadline = std::time::Instant::now() + SYNC_WAIT;
        while !time.time_is_valid() {
            if std::time::Instant::now() >= deadline {
                warn!("SNTP sync did not complete within {} s", SYNC_WAIT.as_secs());
                return Err(Error::TimeNotValid);
            }
            std::thread::sleep(SYNC_POLL);
        }
        info!("wall clock valid: now={} ms", time.now_utc_ms());
        Ok(time)
    }
}

impl TimePort for SntpTime {
    fn now_utc_ms(&self) -> i64 {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(d) => i64::try_from(d.as_millis()).unwrap_or(i64::MAX),
            // Clock before the epoch: report 0, which also fails the gate.
            Err(_) => 0,
        }
    }

    fn time_is_valid(&self) -> bool {
        self.now_utc_ms() >= SANITY_EPOCH_MS
    }
}
