//! Per-candidate measurements: the TCP latency phase and the HTTP throughput phase.

pub mod http;
pub mod tcp;
