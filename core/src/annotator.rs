//! # Geo/Quality Annotation
//!
//! Enriches raw probe results with the location behind their range code and
//! the static quality prior of the range they came from. Neither value
//! affects measurement; the quality only breaks ranking ties.

use std::net::Ipv4Addr;
use std::sync::Arc;

use edgeprobe_common::geo::LocationRepository;
use edgeprobe_common::network::range::AddressRange;
use edgeprobe_common::network::result::{AnnotatedResult, ProbeResult};

/// Prior for addresses whose range carries no hint.
pub const UNRATED_QUALITY: f64 = 0.5;

/// Quality hints keyed by range, resolved by longest-prefix match.
#[derive(Debug, Clone, Default)]
pub struct QualityTable {
    rated: Vec<AddressRange>,
}

impl QualityTable {
    pub fn from_ranges(ranges: &[AddressRange]) -> Self {
        let mut rated: Vec<AddressRange> = ranges
            .iter()
            .filter(|range| range.quality().is_some())
            .cloned()
            .collect();
        rated.sort_by(|a, b| b.prefix().cmp(&a.prefix()));
        Self { rated }
    }

    pub fn lookup(&self, addr: Ipv4Addr) -> Option<f64> {
        self.rated
            .iter()
            .find(|range| range.contains(addr))
            .and_then(AddressRange::quality)
    }
}

pub struct Annotator {
    locations: Arc<dyn LocationRepository>,
    quality: QualityTable,
}

impl Annotator {
    pub fn new(locations: Arc<dyn LocationRepository>, ranges: &[AddressRange]) -> Self {
        Self {
            locations,
            quality: QualityTable::from_ranges(ranges),
        }
    }

    pub fn annotate(&self, result: ProbeResult) -> AnnotatedResult {
        let location = result
            .code
            .as_deref()
            .and_then(|code| self.locations.location(code));
        let quality = self.quality.lookup(result.addr).unwrap_or(UNRATED_QUALITY);
        AnnotatedResult {
            result,
            location,
            quality,
        }
    }

    pub fn annotate_all(&self, results: Vec<ProbeResult>) -> Vec<AnnotatedResult> {
        results.into_iter().map(|r| self.annotate(r)).collect()
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locations::BuiltinLocations;
    use edgeprobe_common::network::candidate::Candidate;

    fn ranges() -> Vec<AddressRange> {
        vec![
            "104.16.0.0/13 0.9".parse().unwrap(),
            "104.16.5.0/24 LAX 0.3".parse().unwrap(),
            "172.64.0.0/13".parse().unwrap(),
        ]
    }

    fn result(addr: Ipv4Addr, code: Option<&str>) -> ProbeResult {
        let candidate = Candidate::new(addr, 443).with_code(code.map(Arc::from));
        ProbeResult::reachable(&candidate, 20.0, 0)
    }

    #[test]
    fn most_specific_range_wins() {
        let table = QualityTable::from_ranges(&ranges());
        assert_eq!(table.lookup(Ipv4Addr::new(104, 16, 5, 9)), Some(0.3));
        assert_eq!(table.lookup(Ipv4Addr::new(104, 17, 0, 9)), Some(0.9));
        assert_eq!(table.lookup(Ipv4Addr::new(172, 64, 0, 9)), None);
    }

    #[test]
    fn annotation_attaches_location_and_quality() {
        let annotator = Annotator::new(Arc::new(BuiltinLocations), &ranges());
        let annotated = annotator.annotate(result(Ipv4Addr::new(104, 16, 5, 9), Some("lax")));

        let location = annotated.location.unwrap();
        assert_eq!(location.city, "Los Angeles");
        assert_eq!(annotated.quality, 0.3);
    }

    #[test]
    fn unknown_codes_and_unrated_ranges_fall_back() {
        let annotator = Annotator::new(Arc::new(BuiltinLocations), &ranges());
        let annotated = annotator.annotate(result(Ipv4Addr::new(172, 64, 0, 9), Some("ZZZ")));

        assert!(annotated.location.is_none());
        assert_eq!(annotated.quality, UNRATED_QUALITY);
    }
}
