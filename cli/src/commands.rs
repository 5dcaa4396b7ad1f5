pub mod locations;
pub mod ranges;
pub mod run;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, value_parser};

use edgeprobe_common::config::{
    Config, DEFAULT_MAX_RETRIES, DEFAULT_PORT, DEFAULT_SPEED_BYTES, DEFAULT_SPEED_URL,
    DEFAULT_TOP, DEFAULT_WORKERS, FilterCriteria, secs_to_duration,
};
use edgeprobe_common::geo::LocationRepository;
use edgeprobe_common::network::catalog;
use edgeprobe_common::network::range::{AddressRange, parse_ranges};
use edgeprobe_core::locations::{BuiltinLocations, JsonLocations};

#[derive(Parser)]
#[command(name = "edgeprobe", version)]
#[command(about = "Finds the fastest anycast CDN edge addresses from where you are.")]
#[command(args_conflicts_with_subcommands = true)]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the geographic lookup table
    #[command(alias = "l")]
    Locations(LocationsArgs),
    /// List the address ranges a benchmark would draw from
    #[command(alias = "r")]
    Ranges(RangesArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Csv,
    Json,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Only probe ranges in this location code, country or region
    #[arg(long, value_name = "CODE")]
    pub iata: Option<String>,

    /// Target port
    #[arg(short, long, default_value_t = DEFAULT_PORT, value_parser = value_parser!(u16).range(1..))]
    pub port: u16,

    /// Global candidate cap, 0 for unlimited
    #[arg(long, default_value_t = 0)]
    pub max_ips: usize,

    /// Candidates sampled per range, 0 to derive from --max-ips
    #[arg(long, default_value_t = 0)]
    pub per_range: usize,

    /// Number of concurrent probes
    #[arg(short, long, default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// TCP connect timeout in seconds
    #[arg(long, default_value_t = 5.0, value_name = "SECS")]
    pub tcp_timeout: f64,

    /// Download time limit in seconds
    #[arg(long, default_value_t = 30.0, value_name = "SECS")]
    pub speed_timeout: f64,

    /// Skip the download test and rank on latency alone
    #[arg(long)]
    pub no_speed: bool,

    /// Latency ceiling in milliseconds, 0 disables it
    #[arg(long, default_value_t = 300.0, value_name = "MS")]
    pub max_delay: f64,

    /// Throughput floor in MB/s
    #[arg(long, default_value_t = 0.0, value_name = "MBPS")]
    pub min_speed: f64,

    /// Number of results to keep, 0 for all
    #[arg(short = 'n', long, default_value_t = DEFAULT_TOP)]
    pub top: usize,

    /// TCP retries after a failed attempt
    #[arg(long, default_value_t = DEFAULT_MAX_RETRIES)]
    pub retries: u32,

    /// Download endpoint; its hostname is kept for TLS and Host
    #[arg(long, default_value = DEFAULT_SPEED_URL, value_name = "URL")]
    pub speed_url: String,

    /// Bytes to download per candidate
    #[arg(long, default_value_t = DEFAULT_SPEED_BYTES, value_name = "BYTES")]
    pub speed_bytes: u64,

    /// Range file with one `CIDR [CODE] [QUALITY]` per line
    #[arg(long, value_name = "FILE")]
    pub ranges: Option<PathBuf>,

    /// JSON location table
    #[arg(long, value_name = "FILE")]
    pub locations: Option<PathBuf>,

    /// Write the ranked results to this file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Result file format
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,

    /// Do not listen for 'q' on the terminal
    #[arg(long)]
    pub no_input: bool,

    /// Reduce output, repeat for less
    #[arg(short, long, action = ArgAction::Count)]
    pub quiet: u8,

    /// Show probe-level detail
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl RunArgs {
    pub fn to_config(&self) -> anyhow::Result<Config> {
        let config = Config {
            geo_filter: self.iata.clone(),
            port: self.port,
            max_ips: self.max_ips,
            per_range: self.per_range,
            workers: self.workers,
            tcp_timeout: secs_to_duration("tcp timeout", self.tcp_timeout)?,
            speed_timeout: secs_to_duration("speed timeout", self.speed_timeout)?,
            speed_test: !self.no_speed,
            max_retries: self.retries,
            speed_url: self.speed_url.clone(),
            speed_bytes: self.speed_bytes,
            filter: FilterCriteria {
                max_latency_ms: self.max_delay,
                min_throughput_mbps: self.min_speed,
            },
            top: self.top,
            ..Config::default()
        };
        config.validate()?;
        Ok(config)
    }
}

#[derive(Args, Debug)]
pub struct LocationsArgs {
    /// Only show locations in this region
    #[arg(long)]
    pub region: Option<String>,

    /// Only show locations in this country (ISO code)
    #[arg(long)]
    pub country: Option<String>,

    /// Look up a single location code
    #[arg(long, value_name = "CODE")]
    pub iata: Option<String>,

    /// JSON location table instead of the built-in one
    #[arg(long, value_name = "FILE")]
    pub locations: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct RangesArgs {
    /// Range file instead of the built-in catalog
    #[arg(long, value_name = "FILE")]
    pub ranges: Option<PathBuf>,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Reads a range file, or falls back to the built-in catalog.
pub fn load_ranges(path: Option<&Path>) -> anyhow::Result<Vec<AddressRange>> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read range file {}", path.display()))?;
            let ranges = parse_ranges(&text)
                .with_context(|| format!("failed to parse range file {}", path.display()))?;
            Ok(ranges)
        }
        None => Ok(catalog::builtin_ranges()),
    }
}

pub fn load_locations(path: Option<&Path>) -> anyhow::Result<Arc<dyn LocationRepository>> {
    match path {
        Some(path) => Ok(Arc::new(JsonLocations::load(path)?)),
        None => Ok(Arc::new(BuiltinLocations)),
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
