//! # Address Range Model
//!
//! An [`AddressRange`] is a CIDR block with an optional location code and
//! quality hint. Ranges are loaded once and never mutated; the expander only
//! ever reads the numeric span of usable hosts out of them.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;
use std::sync::Arc;

use pnet::ipnetwork::{IpNetworkError, Ipv4Network};

use crate::error::ConfigError;
use crate::warn;

/// Represents a continuous range of IPv4 addresses, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv4Range {
    pub start_addr: Ipv4Addr,
    pub end_addr: Ipv4Addr,
}

impl Ipv4Range {
    pub fn new(start_addr: Ipv4Addr, end_addr: Ipv4Addr) -> Self {
        Self {
            start_addr,
            end_addr,
        }
    }

    /// Number of addresses in the range. Zero when `start > end`.
    pub fn len(&self) -> u64 {
        let start = u64::from(u32::from(self.start_addr));
        let end = u64::from(u32::from(self.end_addr));
        if start > end { 0 } else { end - start + 1 }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The address at `index`, counted from `start_addr`.
    pub fn nth(&self, index: u64) -> Option<Ipv4Addr> {
        if index >= self.len() {
            return None;
        }
        let addr = u64::from(u32::from(self.start_addr)) + index;
        u32::try_from(addr).ok().map(Ipv4Addr::from)
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        let addr = u32::from(addr);
        u32::from(self.start_addr) <= addr && addr <= u32::from(self.end_addr)
    }
}

/// Creates a range covering the entire network block of `ip/prefix`.
pub fn cidr_range(ip: Ipv4Addr, prefix: u8) -> Result<Ipv4Range, IpNetworkError> {
    let network = Ipv4Network::new(ip, prefix)?;
    Ok(Ipv4Range::new(network.network(), network.broadcast()))
}

/// A contiguous block of addresses, the unit of input configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AddressRange {
    base: Ipv4Addr,
    prefix: u8,
    code: Option<Arc<str>>,
    quality: Option<f64>,
}

impl AddressRange {
    pub fn new(base: Ipv4Addr, prefix: u8) -> Self {
        Self {
            base,
            prefix,
            code: None,
            quality: None,
        }
    }

    pub fn with_code(mut self, code: &str) -> Self {
        self.code = Some(Arc::from(code.to_ascii_uppercase()));
        self
    }

    pub fn with_quality(mut self, quality: f64) -> Self {
        self.quality = Some(quality);
        self
    }

    pub fn base(&self) -> Ipv4Addr {
        self.base
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// Shared handle to the location code, handed to every candidate.
    pub fn code_handle(&self) -> Option<Arc<str>> {
        self.code.clone()
    }

    pub fn quality(&self) -> Option<f64> {
        self.quality
    }

    /// The whole block, network and broadcast address included.
    /// `None` when the prefix exceeds 32 bits.
    pub fn block(&self) -> Option<Ipv4Range> {
        cidr_range(self.base, self.prefix).ok()
    }

    /// The usable host addresses: the block minus its network and broadcast
    /// address. `/31`, `/32` and invalid prefixes have none.
    pub fn hosts(&self) -> Option<Ipv4Range> {
        if self.prefix > 30 {
            return None;
        }
        let block = self.block()?;
        let start = u32::from(block.start_addr).checked_add(1)?;
        let end = u32::from(block.end_addr).checked_sub(1)?;
        Some(Ipv4Range::new(Ipv4Addr::from(start), Ipv4Addr::from(end)))
    }

    pub fn host_count(&self) -> u64 {
        self.hosts().map_or(0, |hosts| hosts.len())
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        self.block().is_some_and(|block| block.contains(addr))
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.prefix)
    }
}

impl FromStr for AddressRange {
    type Err = String;

    /// Parses `CIDR [CODE] [QUALITY]`, e.g. `104.16.0.0/13 LAX 0.9`.
    ///
    /// A numeric second token is taken as the quality hint.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tokens = s.split_whitespace();
        let cidr = tokens.next().ok_or_else(|| "empty range".to_string())?;
        let (ip_str, prefix_str) = cidr
            .split_once('/')
            .ok_or_else(|| format!("missing prefix length in '{cidr}'"))?;

        let base = ip_str
            .parse::<Ipv4Addr>()
            .map_err(|e| format!("Invalid IP in CIDR '{ip_str}': {e}"))?;
        let prefix = prefix_str
            .parse::<u8>()
            .map_err(|e| format!("Invalid prefix in CIDR '{prefix_str}': {e}"))?;

        let mut range = AddressRange::new(base, prefix);
        for token in tokens {
            if let Ok(quality) = token.parse::<f64>() {
                if !(0.0..=1.0).contains(&quality) {
                    return Err(format!("quality hint {token} is outside 0..=1"));
                }
                range = range.with_quality(quality);
            } else if range.code.is_none() && token.chars().all(|c| c.is_ascii_alphanumeric()) {
                range = range.with_code(token);
            } else {
                return Err(format!("unexpected token '{token}'"));
            }
        }
        Ok(range)
    }
}

/// Parses a range file, one `CIDR [CODE] [QUALITY]` per line.
///
/// Blank lines and `#` comments are ignored; IPv6 blocks are skipped.
pub fn parse_ranges(text: &str) -> Result<Vec<AddressRange>, ConfigError> {
    let mut ranges = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        if is_ipv6_line(line) {
            warn!("Skipping IPv6 range on line {}: {line}", idx + 1);
            continue;
        }
        let range = line
            .parse::<AddressRange>()
            .map_err(|reason| ConfigError::InvalidRange {
                line: idx + 1,
                reason,
            })?;
        ranges.push(range);
    }
    Ok(ranges)
}

fn is_ipv6_line(line: &str) -> bool {
    line.split_whitespace()
        .next()
        .and_then(|cidr| cidr.split('/').next())
        .is_some_and(|ip| ip.parse::<Ipv6Addr>().is_ok())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
