//! Application core — hardware-agnostic pipeline logic.
//!
//! The domain modules ([`sampler`](crate::sampler), [`delivery`](crate::delivery),
//! [`endpoint`](crate::endpoint), [`alarm`](crate::alarm)) consume the outside
//! world exclusively through the port traits in [`ports`] and report through
//! the structured events in [`events`].

pub mod events;
pub mod ports;
