//! Staleness alarm state machine.
//!
//! Two states, one question: how long since a reading was last accepted by
//! an ingestion server? Past the staleness window the alert output is
//! asserted; back inside it, cleared.
//!
//! There is also an optimistic early clear: when the health monitor sees the
//! endpoint come back (unreachable → reachable) the alarm drops immediately,
//! before the window has technically closed. The regular evaluation on the
//! next cycle re-raises it if deliveries still do not land.

use log::{error, info};

use crate::app::events::AppEvent;
use crate::app::ports::{AlertPort, EventSink};
use crate::config::SystemConfig;

/// The alarm state machine. Single-writer: only the delivery worker's
/// cycle drives it.
pub struct StalenessAlarm {
    active: bool,
    window_ms: i64,
}

impl StalenessAlarm {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            active: false,
            window_ms: i64::from(config.staleness_window_secs) * 1_000,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Evaluate against the elapsed time since the last accepted delivery.
    /// Strictly-greater on raise, at-or-below on clear: exactly at the
    /// window boundary the alarm stays (or becomes) inactive.
    pub fn evaluate(
        &mut self,
        stale_for_ms: i64,
        alert: &mut impl AlertPort,
        sink: &mut impl EventSink,
    ) {
        if !self.active && stale_for_ms > self.window_ms {
            self.active = true;
            alert.set_alert(true);
            error!(
                "ALARM: no successful delivery for {} s (window {} s)",
                stale_for_ms / 1_000,
                self.window_ms / 1_000
            );
            sink.emit(&AppEvent::AlarmRaised {
                stale_for_ms,
            });
        } else if self.active && stale_for_ms <= self.window_ms {
            self.active = false;
            alert.set_alert(false);
            info!("alarm cleared, deliveries flowing again");
            sink.emit(&AppEvent::AlarmCleared { early: false });
        }
    }

    /// Optimistic clear on an unreachable → reachable transition.
    pub fn clear_early(&mut self, alert: &mut impl AlertPort, sink: &mut impl EventSink) {
        if self.active {
            self.active = false;
            alert.set_alert(false);
            info!("alarm cleared early: endpoint reachable again");
            sink.emit(&AppEvent::AlarmCleared { early: true });
        }
    }
}
