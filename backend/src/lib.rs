//! Presence-aware event relay library.

pub mod domain;
pub mod inbound;
pub mod outbound;
pub mod settings;
