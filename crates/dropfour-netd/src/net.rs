//! Transport layer: accept loop, request sniffing, per-connection reader and writer.

pub mod check;
pub mod inbound;
pub mod outbound;
pub mod tcp;
