//! Two-timer wake scheduler.
//!
//! One periodic timer per cadence (sampling, health), each with a tiny
//! timer-context callback that only flips a flag and signals a condvar.
//! Everything with real work to do — SPI, HTTP, queue — runs on the worker
//! threads the signals wake.
//!
//! Wakes are coalesced: a signal is a single pending flag, not a counter.
//! If a worker is still busy when its timer fires again, the second tick
//! merges into the pending one and the worker simply runs one more cycle.
//! Cycle counts under load are therefore best-effort, which is fine — every
//! cycle re-reads the actual queue and clock state.
//!
//! The sample tick also wakes the delivery worker when the endpoint looks
//! reachable, so a freshly captured sample does not sit in the queue until
//! the next health tick. The "looks reachable" hint is a relaxed atomic
//! written by the delivery worker; the timer callback may read a stale
//! value, which costs at most one prompt wake (a spurious wake drains
//! nothing, a missed one is covered by the health-cadence wake).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::Duration;

use crate::config::SystemConfig;

/// A coalescing wake signal: one pending flag behind a mutex + condvar.
pub struct WakeSignal {
    pending: Mutex<bool>,
    cv: Condvar,
}

impl WakeSignal {
    pub const fn new() -> Self {
        Self {
            pending: Mutex::new(false),
            cv: Condvar::new(),
        }
    }

    /// Mark a wake pending and notify the waiter. Safe from any context
    /// that can take an uncontended std mutex; the timer callbacks run on
    /// the esp_timer task, not in an ISR.
    pub fn notify(&self) {
        let mut pending = self.lock();
        *pending = true;
        self.cv.notify_one();
    }

    /// Wait for a wake, up to `timeout`. Returns `true` if a wake was
    /// pending (and consumes it), `false` on timeout. Workers call this in
    /// a loop with a short timeout so they keep feeding the watchdog while
    /// idle.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let pending = self.lock();
        let (mut pending, _timed_out) = self
            .cv
            .wait_timeout_while(pending, timeout, |p| !*p)
            .unwrap_or_else(PoisonError::into_inner);
        let woke = *pending;
        *pending = false;
        woke
    }

    /// Consume a pending wake without blocking.
    pub fn try_take(&self) -> bool {
        let mut pending = self.lock();
        std::mem::replace(&mut *pending, false)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, bool> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for WakeSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Wake signal for the sample producer thread.
pub static SAMPLE_WAKE: WakeSignal = WakeSignal::new();
/// Wake signal for the delivery worker thread.
pub static DELIVERY_WAKE: WakeSignal = WakeSignal::new();

/// Reachability hint written by the delivery worker, read by the sample
/// tick. Relaxed on both sides: a stale read changes only whether the
/// delivery worker gets a prompt wake or waits for the health cadence.
static REACHABLE_HINT: AtomicBool = AtomicBool::new(false);

pub fn set_reachable_hint(reachable: bool) {
    REACHABLE_HINT.store(reachable, Ordering::Relaxed);
}

pub fn reachable_hint() -> bool {
    REACHABLE_HINT.load(Ordering::Relaxed)
}

/// Sample-cadence tick: wake the producer, and piggyback a delivery wake
/// when the uplink looks usable.
pub fn on_sample_tick() {
    SAMPLE_WAKE.notify();
    if reachable_hint() {
        DELIVERY_WAKE.notify();
    }
}

/// Health-cadence tick: wake the delivery worker unconditionally so probes
/// run on schedule even while unreachable.
pub fn on_health_tick() {
    DELIVERY_WAKE.notify();
}

#[cfg(target_os = "espidf")]
mod timers {
    use esp_idf_svc::sys::*;
    use log::info;

    use crate::config::SystemConfig;
    use crate::error::{Error, Result};

    unsafe extern "C" fn sample_tick_cb(_arg: *mut core::ffi::c_void) {
        super::on_sample_tick();
    }

    unsafe extern "C" fn health_tick_cb(_arg: *mut core::ffi::c_void) {
        super::on_health_tick();
    }

    fn start_periodic(
        cb: unsafe extern "C" fn(*mut core::ffi::c_void),
        name: &'static core::ffi::CStr,
        period_us: u64,
    ) -> Result<()> {
        let args = esp_timer_create_args_t {
            callback: Some(cb),
            arg: core::ptr::null_mut(),
            dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
            name: name.as_ptr(),
            skip_unhandled_events: true,
        };
        let mut handle: esp_timer_handle_t = core::ptr::null_mut();
        // SAFETY: args outlives the call, handle is written before use, and
        // the timer is periodic and never deleted for the process lifetime.
        let ret = unsafe { esp_timer_create(&args, &mut handle) };
        if ret != ESP_OK {
            return Err(Error::Init("timer create"));
        }
        let ret = unsafe { esp_timer_start_periodic(handle, period_us) };
        if ret != ESP_OK {
            return Err(Error::Init("timer start"));
        }
        Ok(())
    }

    /// Create and start both periodic timers. Dispatch is the esp_timer
    /// task (not ISR), so the callbacks may take the signal mutexes.
    pub fn start(config: &SystemConfig) -> Result<()> {
        start_periodic(
            sample_tick_cb,
            c"sample_tick",
            u64::from(config.sample_interval_secs) * 1_000_000,
        )?;
        start_periodic(
            health_tick_cb,
            c"health_tick",
            u64::from(config.health_check_interval_secs) * 1_000_000,
        )?;
        info!(
            "timers running: sample {} s, health {} s",
            config.sample_interval_secs, config.health_check_interval_secs
        );
        Ok(())
    }
}

#[cfg(not(target_os = "espidf"))]
mod timers {
    use std::thread;
    use std::time::Duration;

    use log::info;

    use crate::config::SystemConfig;
    use crate::error::Result;

    /// Host build: plain sleeper threads stand in for the hardware timers.
    pub fn start(config: &SystemConfig) -> Result<()> {
        let sample_period = Duration::from_secs(u64::from(config.sample_interval_secs));
        let health_period = Duration::from_secs(u64::from(config.health_check_interval_secs));
        thread::Builder::new()
            .name("sample_tick".into())
            .spawn(move || loop {
                thread::sleep(sample_period);
                super::on_sample_tick();
            })
            .map_err(|_| crate::error::Error::Init("tick thread"))?;
        thread::Builder::new()
            .name("health_tick".into())
            .spawn(move || loop {
                thread::sleep(health_period);
                super::on_health_tick();
            })
            .map_err(|_| crate::error::Error::Init("tick thread"))?;
        info!("simulated timers running");
        Ok(())
    }
}

/// Start both periodic timers for the configured cadences.
pub fn start_timers(config: &SystemConfig) -> crate::error::Result<()> {
    timers::start(config)
}
