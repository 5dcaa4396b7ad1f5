//! The CDN's published IPv4 anycast ranges.
//!
//! Quality hints come from long-running reachability measurements: the
//! premium tier connected reliably, the fallback tier was usable with higher
//! latency, and the deprecated tier rarely completed a handshake. Ranges that
//! were never classified carry no hint.

use std::net::Ipv4Addr;

use super::range::AddressRange;

pub const PREMIUM: f64 = 0.9;
pub const FALLBACK: f64 = 0.6;
pub const DEPRECATED: f64 = 0.2;

const PUBLISHED: &[(Ipv4Addr, u8, Option<f64>)] = &[
    (Ipv4Addr::new(173, 245, 48, 0), 20, Some(DEPRECATED)),
    (Ipv4Addr::new(103, 21, 244, 0), 22, Some(DEPRECATED)),
    (Ipv4Addr::new(103, 22, 200, 0), 22, Some(DEPRECATED)),
    (Ipv4Addr::new(103, 31, 4, 0), 22, Some(DEPRECATED)),
    (Ipv4Addr::new(141, 101, 64, 0), 18, None),
    (Ipv4Addr::new(108, 162, 192, 0), 18, Some(PREMIUM)),
    (Ipv4Addr::new(190, 93, 240, 0), 20, None),
    (Ipv4Addr::new(188, 114, 96, 0), 20, Some(FALLBACK)),
    (Ipv4Addr::new(197, 234, 240, 0), 22, None),
    (Ipv4Addr::new(198, 41, 128, 0), 17, Some(DEPRECATED)),
    (Ipv4Addr::new(162, 158, 0, 0), 15, Some(DEPRECATED)),
    (Ipv4Addr::new(104, 16, 0, 0), 13, Some(PREMIUM)),
    (Ipv4Addr::new(104, 24, 0, 0), 14, Some(PREMIUM)),
    (Ipv4Addr::new(172, 64, 0, 0), 13, Some(DEPRECATED)),
    (Ipv4Addr::new(131, 0, 72, 0), 22, None),
];

/// The built-in ranges, used when no range file is supplied.
pub fn builtin_ranges() -> Vec<AddressRange> {
    PUBLISHED
        .iter()
        .map(|&(base, prefix, quality)| {
            let range = AddressRange::new(base, prefix);
            match quality {
                Some(score) => range.with_quality(score),
                None => range,
            }
        })
        .collect()
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

    #[test]
    fn every_builtin_range_has_usable_hosts() {
        let ranges = builtin_ranges();
        assert_eq!(ranges.len(), 15);
        for range in &ranges {
            assert!(range.host_count() > 0, "{range} has no hosts");
            assert!(range.code().is_none());
        }
    }

    #[test]
    fn premium_tier_is_tagged() {
        let ranges = builtin_ranges();
        let premium = ranges
            .iter()
            .find(|r| r.to_string() == "104.16.0.0/13")
            .unwrap();
        assert_eq!(premium.quality(), Some(PREMIUM));
    }
}
