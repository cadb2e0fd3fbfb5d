//! Outbound application events.
//!
//! The pipeline workers emit these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters on the other side
//! decide what to do with them — log to serial, publish to a diagnostics
//! channel, etc.

use crate::endpoint::Endpoint;

/// Structured events emitted by the pipeline workers.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Startup endpoint selection finished.
    Started { active: Endpoint, reachable: bool },

    /// A sample was captured and enqueued.
    SampleCaptured {
        temp_c: f64,
        fault_flags: u8,
        /// Whether the value went through the EMA filter (fault-free reads).
        smoothed: bool,
    },

    /// The queue was full; its oldest sample was evicted to make room.
    SampleEvicted { dropped_ts_ms: i64 },

    /// A health probe completed (or failed to complete).
    EndpointProbed {
        endpoint: Endpoint,
        reachable: bool,
        /// HTTP status, `None` when the call did not complete.
        status: Option<u16>,
    },

    /// The active endpoint changed.
    EndpointSwitched { from: Endpoint, to: Endpoint },

    /// The server accepted a reading.
    DeliveryAccepted { ts_ms: i64 },

    /// Server-side failure: the sample was requeued and draining stopped.
    DeliveryDeferred { status: Option<u16> },

    /// Client-side rejection: the sample was dropped permanently.
    SampleRejected { status: u16, auth: bool },

    /// No successful delivery for longer than the staleness window.
    AlarmRaised { stale_for_ms: i64 },

    /// The alarm was cleared — `early` when cleared optimistically on an
    /// unreachable→reachable transition rather than by the window closing.
    AlarmCleared { early: bool },
}
