//! Logging event sink.
//!
//! Renders every pipeline event as one structured log line. This is the
//! only [`EventSink`] the firmware ships; tests substitute recording sinks.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

#[derive(Debug, Default)]
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { active, reachable } => {
                info!("EVT | started active={active} reachable={reachable}");
            }
            AppEvent::SampleCaptured {
                temp_c,
                fault_flags,
                smoothed,
            } => {
                info!(
                    "EVT | sample temp={temp_c:.2}C sr={fault_flags:#04x} smoothed={smoothed}"
                );
            }
            AppEvent::SampleEvicted { dropped_ts_ms } => {
                warn!("EVT | evicted ts={dropped_ts_ms}");
            }
            AppEvent::EndpointProbed {
                endpoint,
                reachable,
                status,
            } => match status {
                Some(code) => {
                    info!("EVT | probe {endpoint} status={code} reachable={reachable}");
                }
                None => warn!("EVT | probe {endpoint} incomplete"),
            },
            AppEvent::EndpointSwitched { from, to } => {
                info!("EVT | endpoint {from} -> {to}");
            }
            AppEvent::DeliveryAccepted { ts_ms } => {
                info!("EVT | delivered ts={ts_ms}");
            }
            AppEvent::DeliveryDeferred { status } => match status {
                Some(code) => warn!("EVT | deferred status={code}"),
                None => warn!("EVT | deferred transport"),
            },
            AppEvent::SampleRejected { status, auth } => {
                warn!("EVT | rejected status={status} auth={auth}");
            }
            AppEvent::AlarmRaised { stale_for_ms } => {
                warn!("EVT | alarm raised stale_for={}s", stale_for_ms / 1_000);
            }
            AppEvent::AlarmCleared { early } => {
                info!("EVT | alarm cleared early={early}");
            }
        }
    }
}
