//! # Geographic Model
//!
//! Location codes tag ranges with an approximate physical location. The
//! lookup table itself lives behind [`LocationRepository`] so the core can be
//! fed from the built-in table, a JSON file, or a test double.

use serde::Serialize;

use crate::network::range::AddressRange;

/// A single entry of the geographic lookup table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoLocation {
    pub code: String,
    pub city: String,
    pub country: String,
    pub region: String,
}

impl GeoLocation {
    pub fn new(code: &str, city: &str, country: &str, region: &str) -> Self {
        Self {
            code: code.to_ascii_uppercase(),
            city: city.to_string(),
            country: country.to_string(),
            region: region.to_string(),
        }
    }
}

/// Defines the contract for resolving location codes.
pub trait LocationRepository: Send + Sync {
    /// Retrieves the location for a code, matched case-insensitively.
    fn location(&self, code: &str) -> Option<GeoLocation>;

    /// Every known location, in table order.
    fn all(&self) -> Vec<GeoLocation>;

    fn by_country(&self, country: &str) -> Vec<GeoLocation> {
        self.all()
            .into_iter()
            .filter(|loc| loc.country.eq_ignore_ascii_case(country))
            .collect()
    }

    fn by_region(&self, region: &str) -> Vec<GeoLocation> {
        self.all()
            .into_iter()
            .filter(|loc| loc.region.eq_ignore_ascii_case(region))
            .collect()
    }
}

/// Restricts candidate generation to one location code, country or region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoFilter {
    term: String,
}

impl GeoFilter {
    pub fn new(term: &str) -> Self {
        Self {
            term: term.trim().to_string(),
        }
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    /// A range matches when its code equals the term, or when the table maps
    /// its code to a country or region equal to the term. Untagged ranges
    /// never match.
    pub fn matches(&self, range: &AddressRange, repo: &dyn LocationRepository) -> bool {
        let Some(code) = range.code() else {
            return false;
        };
        if code.eq_ignore_ascii_case(&self.term) {
            return true;
        }
        repo.location(code).is_some_and(|loc| {
            loc.country.eq_ignore_ascii_case(&self.term)
                || loc.region.eq_ignore_ascii_case(&self.term)
        })
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
