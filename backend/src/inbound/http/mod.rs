//! HTTP inbound adapter: operational probes.

pub mod health;
