use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal problems detected before any probing starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no address ranges were loaded")]
    NoRanges,

    #[error("invalid filter value for {field}: {value}")]
    InvalidFilter { field: &'static str, value: f64 },

    #[error("worker count must be at least 1")]
    ZeroWorkers,

    #[error("target port must be non-zero")]
    ZeroPort,

    #[error("invalid {field}: {reason}")]
    InvalidTimeout { field: &'static str, reason: String },

    #[error("invalid range on line {line}: {reason}")]
    InvalidRange { line: usize, reason: String },

    #[error("invalid speed test url '{url}': {reason}")]
    InvalidSpeedUrl { url: String, reason: String },

    #[error("failed to read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse location table {}: {reason}", path.display())]
    InvalidLocations { path: PathBuf, reason: String },
}

/// Why a single probe fell short. Recorded in the probe's result, never raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Every TCP attempt ran into the connect timeout.
    ConnectTimeout,
    /// The peer actively refused the connection.
    ConnectRefused,
    /// Any other socket level failure (unreachable, reset, ...).
    ConnectOther,
    /// The speed timeout elapsed before a single body byte arrived.
    SpeedTimeout,
    /// The download failed: bad status, TLS error, or the stream broke.
    SpeedTransportError,
}

impl ErrorKind {
    pub fn is_tcp(self) -> bool {
        matches!(
            self,
            ErrorKind::ConnectTimeout | ErrorKind::ConnectRefused | ErrorKind::ConnectOther
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::ConnectTimeout => "connect timeout",
            ErrorKind::ConnectRefused => "connect refused",
            ErrorKind::ConnectOther => "connect error",
            ErrorKind::SpeedTimeout => "speed timeout",
            ErrorKind::SpeedTransportError => "speed transport error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
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
