//! # Range Expander
//!
//! Turns static [`AddressRange`]s into a lazy, finite sequence of
//! [`Candidate`]s. Nothing is materialised: each range is walked through an
//! index-based cursor.
//!
//! Without a cap a range is walked in numeric order. With a per-range quota
//! smaller than the range, the host span is cut into `quota` equal strata and
//! one random address is drawn from each, so every part of the range,
//! including its tail, is reachable across runs.

use std::iter::FusedIterator;
use std::net::Ipv4Addr;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use edgeprobe_common::geo::{GeoFilter, LocationRepository};
use edgeprobe_common::network::candidate::Candidate;
use edgeprobe_common::network::range::{AddressRange, Ipv4Range};
use edgeprobe_common::warn;

/// Caps applied while expanding. `0` disables a cap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpansionLimits {
    pub per_range: usize,
    pub max_total: usize,
}

/// Keeps the ranges a geographic filter selects.
pub fn filter_ranges(
    ranges: Vec<AddressRange>,
    filter: &GeoFilter,
    repo: &dyn LocationRepository,
) -> Vec<AddressRange> {
    let selected: Vec<AddressRange> = ranges
        .into_iter()
        .filter(|range| filter.matches(range, repo))
        .collect();
    if selected.is_empty() {
        warn!("No range matches the location filter '{}'", filter.term());
    }
    selected
}

pub struct RangeExpander<R = StdRng> {
    pending: std::vec::IntoIter<AddressRange>,
    cursor: Option<RangeCursor>,
    port: u16,
    quota: Option<u64>,
    remaining: Option<usize>,
    planned: u64,
    rng: R,
}

impl RangeExpander<StdRng> {
    pub fn new(ranges: Vec<AddressRange>, port: u16, limits: ExpansionLimits) -> Self {
        Self::with_rng(ranges, port, limits, StdRng::seed_from_u64(rand::random()))
    }
}

impl<R: Rng> RangeExpander<R> {
    pub fn with_rng(ranges: Vec<AddressRange>, port: u16, limits: ExpansionLimits, rng: R) -> Self {
        let usable: Vec<AddressRange> = ranges
            .into_iter()
            .filter(|range| {
                let keep = range.hosts().is_some();
                if !keep {
                    debug!("skipping {range}: no usable host addresses");
                }
                keep
            })
            .collect();

        let quota: Option<u64> = if limits.per_range > 0 {
            Some(limits.per_range as u64)
        } else if limits.max_total > 0 && !usable.is_empty() {
            Some((limits.max_total as u64).div_ceil(usable.len() as u64))
        } else {
            None
        };
        let remaining = (limits.max_total > 0).then_some(limits.max_total);

        let mut planned: u64 = usable
            .iter()
            .map(|range| quota.map_or(range.host_count(), |q| q.min(range.host_count())))
            .sum();
        if let Some(max) = remaining {
            planned = planned.min(max as u64);
        }

        Self {
            pending: usable.into_iter(),
            cursor: None,
            port,
            quota,
            remaining,
            planned,
            rng,
        }
    }

    /// Upper bound on the number of candidates this expander yields.
    pub fn planned(&self) -> u64 {
        self.planned
    }
}

impl<R: Rng> Iterator for RangeExpander<R> {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        if self.remaining == Some(0) {
            return None;
        }
        loop {
            if let Some(cursor) = self.cursor.as_mut()
                && let Some(addr) = cursor.next_addr(&mut self.rng)
            {
                if let Some(remaining) = self.remaining.as_mut() {
                    *remaining -= 1;
                }
                let candidate = Candidate::new(addr, self.port).with_code(cursor.code.clone());
                return Some(candidate);
            }
            let range = self.pending.next()?;
            self.cursor = RangeCursor::new(&range, self.quota);
        }
    }
}

impl<R: Rng> FusedIterator for RangeExpander<R> {}

enum Plan {
    Sequential { next: u64 },
    Stratified { quota: u64, next_stratum: u64 },
}

struct RangeCursor {
    hosts: Ipv4Range,
    code: Option<Arc<str>>,
    plan: Plan,
}

impl RangeCursor {
    fn new(range: &AddressRange, quota: Option<u64>) -> Option<Self> {
        let hosts = range.hosts()?;
        let plan = match quota {
            Some(quota) if quota < hosts.len() => Plan::Stratified {
                quota,
                next_stratum: 0,
            },
            _ => Plan::Sequential { next: 0 },
        };
        Some(Self {
            hosts,
            code: range.code_handle(),
            plan,
        })
    }

    fn next_addr<R: Rng>(&mut self, rng: &mut R) -> Option<Ipv4Addr> {
        let len = self.hosts.len();
        match &mut self.plan {
            Plan::Sequential { next } => {
                while *next < len {
                    let idx = *next;
                    *next += 1;
                    if let Some(addr) = self.hosts.nth(idx)
                        && is_probeable(addr)
                    {
                        return Some(addr);
                    }
                }
                None
            }
            Plan::Stratified {
                quota,
                next_stratum,
            } => {
                while *next_stratum < *quota {
                    let (lo, hi) = stratum_bounds(*next_stratum, *quota, len);
                    *next_stratum += 1;
                    if let Some(addr) = pick_in_stratum(&self.hosts, lo, hi, rng) {
                        return Some(addr);
                    }
                }
                None
            }
        }
    }
}

/// Half-open index bounds of stratum `i` out of `quota` over `len` hosts.
/// The last stratum always ends at `len`.
fn stratum_bounds(i: u64, quota: u64, len: u64) -> (u64, u64) {
    let lo = (u128::from(i) * u128::from(len) / u128::from(quota)) as u64;
    let hi = (u128::from(i + 1) * u128::from(len) / u128::from(quota)) as u64;
    (lo, hi)
}

/// Draws one address from `[lo, hi)`, nudging forward when the draw lands on
/// an address that should not be probed. Three neighbours always contain one
/// probeable address.
fn pick_in_stratum<R: Rng>(hosts: &Ipv4Range, lo: u64, hi: u64, rng: &mut R) -> Option<Ipv4Addr> {
    let width = hi.checked_sub(lo).filter(|w| *w > 0)?;
    let offset = rng.random_range(0..width);
    (0..width.min(3))
        .map(|k| lo + (offset + k) % width)
        .filter_map(|idx| hosts.nth(idx))
        .find(|addr| is_probeable(*addr))
}

/// `.0` and `.255` addresses are skipped even inside wide blocks.
fn is_probeable(addr: Ipv4Addr) -> bool {
    let last = addr.octets()[3];
    last != 0 && last != 255
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use edgeprobe_common::geo::GeoLocation;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn ranges(lines: &[&str]) -> Vec<AddressRange> {
        lines.iter().map(|line| line.parse().unwrap()).collect()
    }

    fn seeded(lines: &[&str], limits: ExpansionLimits, seed: u64) -> RangeExpander {
        RangeExpander::with_rng(ranges(lines), 443, limits, StdRng::seed_from_u64(seed))
    }

    #[test]
    fn slash_30_yields_both_hosts_in_order() {
        let addrs: Vec<Ipv4Addr> = seeded(&["1.1.1.0/30"], ExpansionLimits::default(), 1)
            .map(|c| c.addr)
            .collect();
        assert_eq!(addrs, vec![Ipv4Addr::new(1, 1, 1, 1), Ipv4Addr::new(1, 1, 1, 2)]);
    }

    #[test]
    fn ranges_without_hosts_are_skipped_silently() {
        let expander = seeded(
            &["1.1.1.0/31", "1.1.1.9/32", "1.1.1.0/40", "2.2.2.0/30"],
            ExpansionLimits::default(),
            1,
        );
        let addrs: Vec<Ipv4Addr> = expander.map(|c| c.addr).collect();
        assert_eq!(addrs, vec![Ipv4Addr::new(2, 2, 2, 1), Ipv4Addr::new(2, 2, 2, 2)]);
    }

    #[test]
    fn candidates_carry_port_and_range_code() {
        let candidate = seeded(&["10.0.0.0/30 nrt"], ExpansionLimits::default(), 1)
            .next()
            .unwrap();
        assert_eq!(candidate.port, 443);
        assert_eq!(candidate.code.as_deref(), Some("NRT"));
    }

    #[test]
    fn unlimited_walk_skips_zero_and_broadcast_octets() {
        let count = seeded(&["10.1.0.0/16"], ExpansionLimits::default(), 1)
            .inspect(|c| {
                let last = c.addr.octets()[3];
                assert!(last != 0 && last != 255, "{} emitted", c.addr);
            })
            .count();
        assert_eq!(count, 65_534 - 510);
    }

    #[test]
    fn per_range_quota_draws_one_address_per_stratum() {
        let limits = ExpansionLimits {
            per_range: 16,
            max_total: 0,
        };
        let addrs: Vec<u32> = seeded(&["10.1.0.0/16"], limits, 7)
            .map(|c| u32::from(c.addr))
            .collect();
        assert_eq!(addrs.len(), 16);

        let first_host = u32::from(Ipv4Addr::new(10, 1, 0, 1));
        for (i, addr) in addrs.iter().enumerate() {
            let (lo, hi) = stratum_bounds(i as u64, 16, 65_534);
            let idx = u64::from(addr - first_host);
            assert!(lo <= idx && idx < hi, "stratum {i} produced index {idx}");
        }
    }

    #[test]
    fn sampling_is_not_biased_towards_the_low_end() {
        let limits = ExpansionLimits {
            per_range: 4,
            max_total: 0,
        };
        for seed in 0..50 {
            let highest = seeded(&["10.0.0.0/24"], limits, seed)
                .map(|c| c.addr)
                .max()
                .unwrap();
            assert!(highest > Ipv4Addr::new(10, 0, 0, 190), "seed {seed}: {highest}");
        }
    }

    #[test]
    fn both_ends_are_reachable_across_runs() {
        let limits = ExpansionLimits {
            per_range: 64,
            max_total: 0,
        };
        let mut seen: HashSet<Ipv4Addr> = HashSet::new();
        for seed in 0..200 {
            seen.extend(seeded(&["10.0.0.0/24"], limits, seed).map(|c| c.addr));
        }
        assert!(seen.contains(&Ipv4Addr::new(10, 0, 0, 1)));
        assert!(seen.contains(&Ipv4Addr::new(10, 0, 0, 254)));
    }

    #[test]
    fn global_cap_is_spread_across_ranges() {
        let limits = ExpansionLimits {
            per_range: 0,
            max_total: 10,
        };
        let expander = seeded(&["10.0.0.0/24", "10.0.1.0/24"], limits, 3);
        assert_eq!(expander.planned(), 10);

        let candidates: Vec<Candidate> = expander.collect();
        assert_eq!(candidates.len(), 10);
        let in_second = candidates
            .iter()
            .filter(|c| c.addr.octets()[2] == 1)
            .count();
        assert_eq!(in_second, 5);
    }

    #[test]
    fn global_cap_stops_the_sequence() {
        let limits = ExpansionLimits {
            per_range: 100,
            max_total: 3,
        };
        assert_eq!(seeded(&["10.0.0.0/24", "10.0.1.0/24"], limits, 3).count(), 3);
    }

    #[test]
    fn candidates_are_unique() {
        let limits = ExpansionLimits {
            per_range: 200,
            max_total: 0,
        };
        let all: Vec<Ipv4Addr> = seeded(&["10.0.0.0/22"], limits, 11).map(|c| c.addr).collect();
        let unique: HashSet<Ipv4Addr> = all.iter().copied().collect();
        assert_eq!(all.len(), unique.len());
    }

    struct OneCity;

    impl LocationRepository for OneCity {
        fn location(&self, code: &str) -> Option<GeoLocation> {
            code.eq_ignore_ascii_case("HKG")
                .then(|| GeoLocation::new("HKG", "Hong Kong", "HK", "Asia Pacific"))
        }

        fn all(&self) -> Vec<GeoLocation> {
            self.location("HKG").into_iter().collect()
        }
    }

    #[test]
    fn geo_filter_without_match_yields_an_empty_sequence() {
        let selected = filter_ranges(
            ranges(&["10.0.0.0/24 HKG", "10.0.1.0/24"]),
            &GeoFilter::new("LAX"),
            &OneCity,
        );
        assert!(selected.is_empty());
        let expander = RangeExpander::new(selected, 443, ExpansionLimits::default());
        assert_eq!(expander.planned(), 0);
        assert_eq!(expander.count(), 0);
    }

    #[test]
    fn geo_filter_selects_by_region() {
        let selected = filter_ranges(
            ranges(&["10.0.0.0/24 HKG", "10.0.1.0/24"]),
            &GeoFilter::new("Asia Pacific"),
            &OneCity,
        );
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].code(), Some("HKG"));
    }

    proptest! {
        #[test]
        fn every_candidate_lies_within_its_source_range(
            base in any::<u32>(),
            prefix in 8u8..=30,
            per_range in 0usize..64,
            seed in any::<u64>(),
        ) {
            let range = AddressRange::new(Ipv4Addr::from(base), prefix);
            let limits = ExpansionLimits { per_range, max_total: 0 };
            let expander = RangeExpander::with_rng(
                vec![range.clone()],
                443,
                limits,
                StdRng::seed_from_u64(seed),
            );
            let hosts = range.hosts().unwrap();
            for candidate in expander.take(512) {
                prop_assert!(hosts.contains(candidate.addr));
                prop_assert!(range.contains(candidate.addr));
            }
        }
    }
}
