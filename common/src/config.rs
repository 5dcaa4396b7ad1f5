use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_PORT: u16 = 443;
pub const DEFAULT_WORKERS: usize = 10;
pub const DEFAULT_TCP_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_SPEED_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(500);
pub const DEFAULT_MAX_LATENCY_MS: f64 = 300.0;
pub const DEFAULT_TOP: usize = 10;
pub const DEFAULT_SPEED_URL: &str = "https://speed.cloudflare.com/__down?bytes=10000000";
pub const DEFAULT_SPEED_BYTES: u64 = 5 * 1024 * 1024;

/// Thresholds a completed probe must meet to be ranked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterCriteria {
    /// Upper latency bound in milliseconds. `0` disables the check.
    pub max_latency_ms: f64,
    /// Lower throughput bound in MB/s, only applied when the speed test ran.
    pub min_throughput_mbps: f64,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            max_latency_ms: DEFAULT_MAX_LATENCY_MS,
            min_throughput_mbps: 0.0,
        }
    }
}

impl FilterCriteria {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_non_negative("max_latency_ms", self.max_latency_ms)?;
        check_non_negative("min_throughput_mbps", self.min_throughput_mbps)
    }
}

fn check_non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidFilter { field, value })
    }
}

/// Everything a benchmark run needs to know, fixed before the first probe.
#[derive(Debug, Clone)]
pub struct Config {
    /// Keeps only ranges whose location code, country or region matches.
    pub geo_filter: Option<String>,
    pub port: u16,
    /// Global candidate cap. `0` means unlimited.
    pub max_ips: usize,
    /// Per-range candidate cap. `0` derives it from `max_ips`.
    pub per_range: usize,
    pub workers: usize,
    pub tcp_timeout: Duration,
    pub speed_timeout: Duration,
    pub speed_test: bool,
    /// Additional TCP attempts after the first one failed.
    pub max_retries: u32,
    pub retry_backoff: Duration,
    pub speed_url: String,
    /// Download stops once this many body bytes arrived.
    pub speed_bytes: u64,
    pub filter: FilterCriteria,
    /// Result cap. `0` means unlimited.
    pub top: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            geo_filter: None,
            port: DEFAULT_PORT,
            max_ips: 0,
            per_range: 0,
            workers: DEFAULT_WORKERS,
            tcp_timeout: DEFAULT_TCP_TIMEOUT,
            speed_timeout: DEFAULT_SPEED_TIMEOUT,
            speed_test: true,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            speed_url: DEFAULT_SPEED_URL.to_string(),
            speed_bytes: DEFAULT_SPEED_BYTES,
            filter: FilterCriteria::default(),
            top: DEFAULT_TOP,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        if self.port == 0 {
            return Err(ConfigError::ZeroPort);
        }
        check_timeout("tcp_timeout", self.tcp_timeout)?;
        if self.speed_test {
            check_timeout("speed_timeout", self.speed_timeout)?;
            if self.speed_bytes == 0 {
                return Err(ConfigError::InvalidTimeout {
                    field: "speed_bytes",
                    reason: "byte target must be non-zero".to_string(),
                });
            }
        }
        self.filter.validate()
    }
}

fn check_timeout(field: &'static str, value: Duration) -> Result<(), ConfigError> {
    if value.is_zero() {
        return Err(ConfigError::InvalidTimeout {
            field,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(())
}

/// Converts a user supplied number of seconds into a [`Duration`].
pub fn secs_to_duration(field: &'static str, secs: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(secs).map_err(|e| ConfigError::InvalidTimeout {
        field,
        reason: e.to_string(),
    })
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
