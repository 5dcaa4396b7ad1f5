//! Implementations of the [`LocationRepository`] port.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use edgeprobe_common::error::ConfigError;
use edgeprobe_common::geo::{GeoLocation, LocationRepository};

/// (code, city, country, region)
const BUILTIN: &[(&str, &str, &str, &str)] = &[
    ("LAX", "Los Angeles", "US", "North America"),
    ("SFO", "San Francisco", "US", "North America"),
    ("SJC", "San Jose", "US", "North America"),
    ("SEA", "Seattle", "US", "North America"),
    ("ORD", "Chicago", "US", "North America"),
    ("EWR", "Newark", "US", "North America"),
    ("IAD", "Washington", "US", "North America"),
    ("DFW", "Dallas", "US", "North America"),
    ("MIA", "Miami", "US", "North America"),
    ("YYZ", "Toronto", "CA", "North America"),
    ("LHR", "London", "GB", "Europe"),
    ("AMS", "Amsterdam", "NL", "Europe"),
    ("FRA", "Frankfurt", "DE", "Europe"),
    ("CDG", "Paris", "FR", "Europe"),
    ("MAD", "Madrid", "ES", "Europe"),
    ("MXP", "Milan", "IT", "Europe"),
    ("HKG", "Hong Kong", "HK", "Asia Pacific"),
    ("NRT", "Tokyo", "JP", "Asia Pacific"),
    ("SIN", "Singapore", "SG", "Asia Pacific"),
    ("SYD", "Sydney", "AU", "Asia Pacific"),
    ("ICN", "Seoul", "KR", "Asia Pacific"),
    ("TPE", "Taipei", "TW", "Asia Pacific"),
    ("GRU", "São Paulo", "BR", "South America"),
    ("JNB", "Johannesburg", "ZA", "Africa"),
    ("DXB", "Dubai", "AE", "Middle East"),
];

/// The compiled-in table of the CDN's major points of presence.
pub struct BuiltinLocations;

impl LocationRepository for BuiltinLocations {
    fn location(&self, code: &str) -> Option<GeoLocation> {
        BUILTIN
            .iter()
            .find(|(c, ..)| c.eq_ignore_ascii_case(code))
            .map(|&(c, city, country, region)| GeoLocation::new(c, city, country, region))
    }

    fn all(&self) -> Vec<GeoLocation> {
        BUILTIN
            .iter()
            .map(|&(c, city, country, region)| GeoLocation::new(c, city, country, region))
            .collect()
    }
}

/// One record of a `locations.json` file. Coordinates and unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct LocationRecord {
    iata: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    region: String,
    #[serde(default)]
    cca2: String,
}

/// A location table loaded from a JSON array of records.
#[derive(Debug, Clone, Default)]
pub struct JsonLocations {
    entries: Vec<GeoLocation>,
    index: HashMap<String, usize>,
}

impl JsonLocations {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|e| ConfigError::InvalidLocations {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let records: Vec<LocationRecord> = serde_json::from_str(text)?;
        let mut table = Self::default();
        for record in records {
            let location = GeoLocation::new(&record.iata, &record.city, &record.cca2, &record.region);
            // First record wins for duplicate codes.
            if table.index.contains_key(&location.code) {
                continue;
            }
            table.index.insert(location.code.clone(), table.entries.len());
            table.entries.push(location);
        }
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl LocationRepository for JsonLocations {
    fn location(&self, code: &str) -> Option<GeoLocation> {
        self.index
            .get(&code.to_ascii_uppercase())
            .and_then(|&idx| self.entries.get(idx))
            .cloned()
    }

    fn all(&self) -> Vec<GeoLocation> {
        self.entries.clone()
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
