//! # Aggregation and Ranking
//!
//! Filters annotated results against the run's [`FilterCriteria`] and
//! orders the survivors: latency ascending, throughput descending, quality
//! descending. Latency and throughput are compared after quantising to
//! microseconds and 1/1000 MB/s, so values that differ only by float noise
//! fall through to the next key. The sort is stable; remaining ties keep
//! their input order.

use std::cmp::Ordering;

use edgeprobe_common::config::FilterCriteria;
use edgeprobe_common::network::result::{AnnotatedResult, RankedResultSet};

const QUANTUM: f64 = 1000.0;

pub fn passes(entry: &AnnotatedResult, filter: &FilterCriteria) -> bool {
    let result = &entry.result;
    if !result.tcp_connect_ok {
        return false;
    }
    if filter.max_latency_ms > 0.0
        && result
            .tcp_latency_ms
            .is_none_or(|latency| latency > filter.max_latency_ms)
    {
        return false;
    }
    if result.http_enabled {
        if !result.download_ok {
            return false;
        }
        let throughput = result.throughput_mbps.unwrap_or(0.0);
        if throughput < filter.min_throughput_mbps {
            return false;
        }
    }
    true
}

fn quantise(value: f64) -> i64 {
    (value * QUANTUM).round() as i64
}

fn compare(a: &AnnotatedResult, b: &AnnotatedResult) -> Ordering {
    let latency = |e: &AnnotatedResult| e.result.tcp_latency_ms.map_or(i64::MAX, quantise);
    let throughput = |e: &AnnotatedResult| e.result.throughput_mbps.map_or(0, quantise);

    latency(a)
        .cmp(&latency(b))
        .then_with(|| throughput(b).cmp(&throughput(a)))
        .then_with(|| b.quality.total_cmp(&a.quality))
}

/// Filters, sorts and truncates to `top_n` entries (`0` keeps everything).
pub fn finalize(
    results: Vec<AnnotatedResult>,
    filter: &FilterCriteria,
    top_n: usize,
) -> RankedResultSet {
    let mut kept: Vec<AnnotatedResult> = results
        .into_iter()
        .filter(|entry| passes(entry, filter))
        .collect();
    kept.sort_by(compare);
    if top_n > 0 {
        kept.truncate(top_n);
    }
    RankedResultSet::new(kept)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
