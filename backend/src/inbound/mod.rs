//! Inbound adapters that translate external traffic into relay calls while
//! keeping framework details at the edge.
//!
//! The relay protocol itself runs over [`ws`]; [`http`] only serves probes.

pub mod http;
pub mod ws;
