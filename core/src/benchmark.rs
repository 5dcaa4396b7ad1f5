//! # Benchmark Service
//!
//! Implements the "benchmark the edge" use case end to end.
//!
//! The service is split in two steps so callers can size their progress
//! display before probing starts:
//! 1. [`BenchmarkService::prepare`] validates the input and builds the lazy
//!    candidate sequence. [`BenchmarkService::prepare_builtin`] does the same
//!    for the built-in address sources.
//! 2. [`BenchmarkService::execute`] drains it through the worker pool, then
//!    annotates, filters and ranks whatever completed.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use edgeprobe_common::config::Config;
use edgeprobe_common::error::ConfigError;
use edgeprobe_common::geo::{GeoFilter, LocationRepository};
use edgeprobe_common::network::candidate::Candidate;
use edgeprobe_common::network::catalog;
use edgeprobe_common::network::premium::{self, PREMIUM_LIST_CAP};
use edgeprobe_common::network::range::AddressRange;
use edgeprobe_common::network::result::RankedResultSet;
use edgeprobe_common::{info, success, warn};

use crate::annotator::Annotator;
use crate::expander::{ExpansionLimits, RangeExpander, filter_ranges};
use crate::ranker;
use crate::scanner::pool::{ProgressFn, WorkerPool};
use crate::scanner::{ProbeEngine, ProbeSettings, Prober, StopSignal};

enum Candidates {
    Sampled(RangeExpander),
    Listed(std::vec::IntoIter<Candidate>),
}

impl Iterator for Candidates {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        match self {
            Candidates::Sampled(expander) => expander.next(),
            Candidates::Listed(listed) => listed.next(),
        }
    }
}

/// Validated ranges plus the candidate sequence drawn from them.
pub struct BenchmarkPlan {
    ranges: Vec<AddressRange>,
    candidates: Candidates,
}

impl BenchmarkPlan {
    /// One candidate per single-address range.
    fn listed(ranges: Vec<AddressRange>, port: u16) -> Self {
        let candidates: Vec<Candidate> = ranges
            .iter()
            .map(|range| Candidate::new(range.base(), port).with_code(range.code_handle()))
            .collect();
        Self {
            ranges,
            candidates: Candidates::Listed(candidates.into_iter()),
        }
    }

    pub fn planned(&self) -> u64 {
        match &self.candidates {
            Candidates::Sampled(expander) => expander.planned(),
            Candidates::Listed(listed) => listed.len() as u64,
        }
    }

    pub fn ranges(&self) -> &[AddressRange] {
        &self.ranges
    }
}

#[derive(Debug)]
pub struct BenchmarkReport {
    pub ranked: RankedResultSet,
    pub planned: u64,
    pub probed: usize,
    pub reachable: usize,
    pub cancelled: bool,
    pub elapsed: Duration,
}

pub struct BenchmarkService {
    config: Config,
    locations: Arc<dyn LocationRepository>,
    prober: Arc<dyn Prober>,
}

impl BenchmarkService {
    /// Validates `config` and wires the production probe engine.
    pub fn new(config: Config, locations: Arc<dyn LocationRepository>) -> Result<Self, ConfigError> {
        let settings = ProbeSettings::from_config(&config)?;
        Self::with_prober(config, locations, Arc::new(ProbeEngine::new(settings)))
    }

    pub fn with_prober(
        config: Config,
        locations: Arc<dyn LocationRepository>,
        prober: Arc<dyn Prober>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            locations,
            prober,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Applies the geographic filter and sets up candidate expansion.
    ///
    /// Loading no ranges at all is fatal. A filter that matches nothing is
    /// not: the plan is simply empty.
    pub fn prepare(&self, ranges: Vec<AddressRange>) -> Result<BenchmarkPlan, ConfigError> {
        if ranges.is_empty() {
            return Err(ConfigError::NoRanges);
        }
        let ranges = match &self.config.geo_filter {
            Some(term) => filter_ranges(ranges, &GeoFilter::new(term), self.locations.as_ref()),
            None => ranges,
        };
        let limits = ExpansionLimits {
            per_range: self.config.per_range,
            max_total: self.config.max_ips,
        };
        let expander = RangeExpander::new(ranges.clone(), self.config.port, limits);
        Ok(BenchmarkPlan {
            ranges,
            candidates: Candidates::Sampled(expander),
        })
    }

    /// Plans a run without a range file.
    ///
    /// Small runs (`max_ips` up to [`PREMIUM_LIST_CAP`], no per-range quota)
    /// probe the curated premium addresses; larger ones sample the published
    /// catalog. Built-in addresses are anycast, so a location code tags them
    /// instead of filtering them. Any other filter term matches nothing.
    pub fn prepare_builtin(&self) -> Result<BenchmarkPlan, ConfigError> {
        let code = match self.config.geo_filter.as_deref() {
            None => None,
            Some(term) => match self.locations.location(term) {
                Some(location) => Some(location.code),
                None => {
                    warn!("'{term}' is not a location code, built-in addresses carry no other location data");
                    return Ok(BenchmarkPlan::listed(Vec::new(), self.config.port));
                }
            },
        };

        if self.config.per_range == 0 && self.config.max_ips <= PREMIUM_LIST_CAP {
            let mut ranges = premium::premium_ranges(code.as_deref());
            if self.config.max_ips > 0 {
                ranges.truncate(self.config.max_ips);
            }
            info!("Using {} curated premium addresses", ranges.len());
            return Ok(BenchmarkPlan::listed(ranges, self.config.port));
        }

        let ranges = catalog::builtin_ranges()
            .into_iter()
            .map(|range| match &code {
                Some(code) => range.with_code(code),
                None => range,
            })
            .collect();
        self.prepare(ranges)
    }

    pub async fn execute(
        &self,
        plan: BenchmarkPlan,
        stop: StopSignal,
        progress: Option<ProgressFn>,
    ) -> BenchmarkReport {
        let started = Instant::now();
        let planned = plan.planned();
        info!(
            "Probing up to {planned} candidates from {} ranges with {} workers",
            plan.ranges.len(),
            self.config.workers
        );

        let mut pool = WorkerPool::new(self.config.workers, stop);
        if let Some(progress) = progress {
            pool = pool.on_progress(progress);
        }
        let outcome = pool.run(plan.candidates, Arc::clone(&self.prober)).await;

        let probed = outcome.results.len();
        let reachable = outcome.results.iter().filter(|r| r.tcp_connect_ok).count();
        if reachable > 0 {
            success!("{reachable} of {probed} candidates answered");
        }

        let annotator = Annotator::new(Arc::clone(&self.locations), &plan.ranges);
        let annotated = annotator.annotate_all(outcome.results);
        let ranked = ranker::finalize(annotated, &self.config.filter, self.config.top);

        BenchmarkReport {
            ranked,
            planned,
            probed,
            reachable,
            cancelled: outcome.cancelled,
            elapsed: started.elapsed(),
        }
    }

    pub async fn run(
        &self,
        ranges: Vec<AddressRange>,
        stop: StopSignal,
    ) -> Result<BenchmarkReport, ConfigError> {
        let plan = self.prepare(ranges)?;
        Ok(self.execute(plan, stop, None).await)
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
