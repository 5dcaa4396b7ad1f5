use std::net::Ipv4Addr;
use std::sync::Arc;

use crate::error::ErrorKind;
use crate::geo::GeoLocation;
use crate::network::candidate::Candidate;

/// The immutable outcome of one probe.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    pub addr: Ipv4Addr,
    pub port: u16,
    pub code: Option<Arc<str>>,
    pub tcp_connect_ok: bool,
    /// Duration of the attempt that succeeded, not of all attempts.
    pub tcp_latency_ms: Option<f64>,
    pub retries_used: u32,
    pub http_enabled: bool,
    pub download_ok: bool,
    /// MB/s. Only present when some body bytes arrived without a transport error.
    pub throughput_mbps: Option<f64>,
    pub error_kind: Option<ErrorKind>,
}

impl ProbeResult {
    /// The TCP phase failed outright; nothing else was attempted.
    pub fn unreachable(
        candidate: &Candidate,
        kind: ErrorKind,
        retries_used: u32,
        http_enabled: bool,
    ) -> Self {
        Self {
            addr: candidate.addr,
            port: candidate.port,
            code: candidate.code.clone(),
            tcp_connect_ok: false,
            tcp_latency_ms: None,
            retries_used,
            http_enabled,
            download_ok: false,
            throughput_mbps: None,
            error_kind: Some(kind),
        }
    }

    /// The TCP phase succeeded; the HTTP phase, if any, is recorded later.
    pub fn reachable(candidate: &Candidate, latency_ms: f64, retries_used: u32) -> Self {
        Self {
            addr: candidate.addr,
            port: candidate.port,
            code: candidate.code.clone(),
            tcp_connect_ok: true,
            tcp_latency_ms: Some(latency_ms),
            retries_used,
            http_enabled: false,
            download_ok: false,
            throughput_mbps: None,
            error_kind: None,
        }
    }

    pub fn with_download(
        mut self,
        throughput_mbps: Option<f64>,
        error_kind: Option<ErrorKind>,
    ) -> Self {
        self.http_enabled = true;
        self.download_ok = throughput_mbps.is_some();
        self.throughput_mbps = throughput_mbps;
        self.error_kind = error_kind;
        self
    }
}

/// A probe result with its geographic annotation and prior quality score.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedResult {
    pub result: ProbeResult,
    pub location: Option<GeoLocation>,
    pub quality: f64,
}

/// The final ordered output of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankedResultSet {
    entries: Vec<AnnotatedResult>,
}

impl RankedResultSet {
    pub fn new(entries: Vec<AnnotatedResult>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AnnotatedResult> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[AnnotatedResult] {
        &self.entries
    }

    pub fn into_vec(self) -> Vec<AnnotatedResult> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a RankedResultSet {
    type Item = &'a AnnotatedResult;
    type IntoIter = std::slice::Iter<'a, AnnotatedResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
