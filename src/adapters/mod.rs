//! Adapters - inbound REST surface and outbound infrastructure.

pub mod inbound;
pub mod outbound;
