//! # Edgeprobe Common
//!
//! Shared models and contracts for the endpoint benchmark.
//!
//! ## Contents
//! * **[`network`]**: Address ranges, probe candidates and probe results.
//! * **[`geo`]**: Geographic annotation model and the [`geo::LocationRepository`] port.
//! * **[`config`]**: The enumerated run configuration and its filter criteria.
//! * **[`error`]**: Configuration errors and the per-probe error taxonomy.

pub mod config;
pub mod error;
pub mod geo;
pub mod macros;
pub mod network;

pub use tracing;
