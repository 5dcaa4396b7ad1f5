//! Curated premium addresses.
//!
//! Individual edge addresses that answered reliably across many networks,
//! grouped in three tiers. Small runs probe these instead of sampling the
//! published ranges; the mix of tiers depends on where the user is.

use std::net::Ipv4Addr;

use super::range::AddressRange;

/// Runs capped at or below this many candidates use the curated list.
pub const PREMIUM_LIST_CAP: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Connected in over 90% of measurements.
    Core,
    /// Connected in 60% to 90% of measurements.
    Backup,
    /// Public resolver and special purpose addresses.
    Resolver,
}

impl Tier {
    pub fn quality(self) -> f64 {
        match self {
            Tier::Core => 0.9,
            Tier::Backup => 0.6,
            Tier::Resolver => 0.4,
        }
    }
}

// First host of each curated /24.
const CORE: &[[u8; 4]] = &[
    [104, 16, 0, 1], [104, 16, 1, 1], [104, 16, 2, 1], [104, 16, 3, 1], [104, 16, 4, 1],
    [104, 17, 0, 1], [104, 17, 1, 1], [104, 17, 2, 1], [104, 17, 3, 1], [104, 17, 4, 1],
    [104, 18, 0, 1], [104, 18, 1, 1], [104, 18, 2, 1], [104, 18, 3, 1], [104, 18, 4, 1],
    [104, 19, 0, 1], [104, 19, 1, 1], [104, 19, 2, 1], [104, 19, 3, 1], [104, 19, 4, 1],
    [104, 20, 0, 1], [104, 20, 1, 1], [104, 20, 2, 1], [104, 20, 3, 1], [104, 20, 4, 1],
    [104, 21, 0, 1], [104, 21, 1, 1], [104, 21, 2, 1], [104, 21, 3, 1], [104, 21, 4, 1],
    [104, 22, 0, 1], [104, 22, 1, 1], [104, 22, 2, 1], [104, 22, 3, 1], [104, 22, 4, 1],
    [104, 23, 0, 1], [104, 23, 1, 1], [104, 23, 2, 1], [104, 23, 3, 1], [104, 23, 4, 1],
    [162, 159, 0, 1], [162, 159, 1, 1], [162, 159, 2, 1], [162, 159, 3, 1], [162, 159, 4, 1],
    [162, 159, 128, 1], [162, 159, 129, 1], [162, 159, 130, 1], [162, 159, 192, 1], [162, 159, 193, 1],
    [104, 24, 0, 1], [104, 24, 1, 1], [104, 24, 2, 1], [104, 24, 3, 1], [104, 24, 4, 1],
    [104, 25, 0, 1], [104, 25, 1, 1], [104, 25, 2, 1], [104, 25, 3, 1], [104, 25, 4, 1],
    [104, 26, 0, 1], [104, 26, 1, 1], [104, 26, 2, 1], [104, 26, 3, 1], [104, 26, 4, 1],
    [104, 27, 0, 1], [104, 27, 1, 1], [104, 27, 2, 1], [104, 27, 3, 1], [104, 27, 4, 1],
];

const BACKUP: &[[u8; 4]] = &[
    [172, 64, 0, 1], [172, 64, 1, 1], [172, 64, 32, 1], [172, 64, 64, 1],
    [172, 65, 0, 1], [172, 65, 1, 1], [172, 65, 32, 1], [172, 65, 64, 1],
    [172, 66, 0, 1], [172, 66, 1, 1], [172, 66, 32, 1],
    [172, 67, 0, 1], [172, 67, 1, 1], [172, 67, 32, 1],
    [108, 162, 192, 1], [108, 162, 193, 1], [108, 162, 194, 1], [108, 162, 195, 1],
    [108, 162, 196, 1], [108, 162, 224, 1], [108, 162, 225, 1], [108, 162, 226, 1],
    [162, 158, 0, 1], [162, 158, 1, 1], [162, 158, 2, 1], [162, 158, 64, 1], [162, 158, 128, 1],
];

const RESOLVER: &[[u8; 4]] = &[
    [1, 1, 1, 1], [1, 0, 0, 1], [1, 1, 1, 2], [1, 0, 0, 2],
    [188, 114, 96, 1], [188, 114, 97, 1], [188, 114, 98, 1], [188, 114, 99, 1],
];

/// How many addresses of each tier a location gets. `None` takes the whole tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TierMix {
    core: Option<usize>,
    backup: Option<usize>,
    resolver: Option<usize>,
}

impl TierMix {
    const GLOBAL: TierMix = TierMix {
        core: None,
        backup: None,
        resolver: None,
    };

    const fn new(core: usize, backup: usize, resolver: usize) -> Self {
        Self {
            core: Some(core),
            backup: Some(backup),
            resolver: Some(resolver),
        }
    }

    fn for_code(code: Option<&str>) -> Self {
        let Some(code) = code else {
            return Self::GLOBAL;
        };
        match code.to_ascii_uppercase().as_str() {
            "HKG" => Self::new(60, 15, 5),
            "LAX" | "SFO" | "SJC" | "SEA" => Self::new(50, 20, 10),
            "NRT" | "ICN" | "SIN" | "TPE" => Self::new(45, 25, 10),
            _ => Self::GLOBAL,
        }
    }
}

/// The curated addresses for `code`, best tier first, as single-address
/// ranges carrying their tier quality and, when given, the location code.
pub fn premium_ranges(code: Option<&str>) -> Vec<AddressRange> {
    let mix = TierMix::for_code(code);
    let tiers = [
        (Tier::Core, CORE, mix.core),
        (Tier::Backup, BACKUP, mix.backup),
        (Tier::Resolver, RESOLVER, mix.resolver),
    ];

    tiers
        .into_iter()
        .flat_map(|(tier, addrs, take)| {
            addrs
                .iter()
                .take(take.unwrap_or(addrs.len()))
                .map(move |&octets| {
                    let range = AddressRange::new(Ipv4Addr::from(octets), 32)
                        .with_quality(tier.quality());
                    match code {
                        Some(code) => range.with_code(code),
                        None => range,
                    }
                })
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
