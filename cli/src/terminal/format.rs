use colored::*;

use edgeprobe_common::network::result::AnnotatedResult;

use crate::terminal::colors;

pub type Detail = (String, ColoredString);

const FAST_LATENCY_MS: f64 = 100.0;

pub fn latency_to_detail(latency_ms: Option<f64>) -> Detail {
    let value = match latency_ms {
        Some(ms) if ms <= FAST_LATENCY_MS => format!("{ms:.1} ms").color(colors::FAST),
        Some(ms) => format!("{ms:.1} ms").color(colors::SLOW),
        None => "n/a".color(colors::MISSING),
    };
    ("Latency".to_string(), value)
}

/// `None` when the download test was not run.
pub fn speed_to_detail(entry: &AnnotatedResult) -> Option<Detail> {
    if !entry.result.http_enabled {
        return None;
    }
    let value = match entry.result.throughput_mbps {
        Some(mbps) => format!("{mbps:.2} MB/s").color(colors::FAST),
        None => "n/a".color(colors::MISSING),
    };
    Some(("Speed".to_string(), value))
}

pub fn location_to_detail(entry: &AnnotatedResult) -> Option<Detail> {
    let code = entry.result.code.as_deref();
    let value = match (&entry.location, code) {
        (Some(loc), _) => format!("{} ({}, {}) {}", loc.city, loc.country, loc.region, loc.code),
        (None, Some(code)) => code.to_string(),
        (None, None) => return None,
    };
    Some(("Location".to_string(), value.normal()))
}

pub fn quality_to_detail(quality: f64) -> Detail {
    ("Quality".to_string(), format!("{quality:.2}").normal())
}

pub fn retries_to_detail(retries: u32) -> Option<Detail> {
    (retries > 0).then(|| ("Retries".to_string(), retries.to_string().color(colors::SLOW)))
}

pub fn result_details(entry: &AnnotatedResult) -> Vec<Detail> {
    let mut details: Vec<Detail> = vec![latency_to_detail(entry.result.tcp_latency_ms)];
    details.extend(speed_to_detail(entry));
    details.extend(location_to_detail(entry));
    details.push(quality_to_detail(entry.quality));
    details.extend(retries_to_detail(entry.result.retries_used));
    details
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
