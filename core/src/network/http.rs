//! # Throughput Phase
//!
//! Downloads from the configured endpoint *through* a candidate address.
//! The request URL keeps the endpoint's hostname, so TLS server-name
//! indication and virtual hosting behave as they would for a normal client,
//! while the connection itself is pinned to the candidate via a resolver
//! override.

use std::net::SocketAddr;
use std::time::Duration;

use reqwest::redirect::Policy;
use reqwest::{Client, StatusCode, Url};
use thiserror::Error;
use tokio::time::{Instant, timeout_at};
use tracing::debug;

use edgeprobe_common::error::{ConfigError, ErrorKind};

/// Ports on which the CDN terminates TLS.
pub const TLS_PORTS: [u16; 6] = [443, 2053, 2083, 2087, 2096, 8443];

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

pub fn scheme_for_port(port: u16) -> &'static str {
    if TLS_PORTS.contains(&port) {
        "https"
    } else {
        "http"
    }
}

#[derive(Debug, Error)]
enum DownloadError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    /// Anything but 2xx. Redirects are never followed.
    #[error("unexpected status {0}")]
    Status(StatusCode),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedOutcome {
    pub throughput_mbps: Option<f64>,
    pub bytes: u64,
    pub error: Option<ErrorKind>,
}

#[derive(Debug, Clone)]
pub struct SpeedTester {
    url: Url,
    byte_limit: u64,
    timeout: Duration,
}

impl SpeedTester {
    pub fn new(url: &str, byte_limit: u64, timeout: Duration) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidSpeedUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        };
        let parsed = Url::parse(url).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        if parsed.host_str().is_none() {
            return Err(invalid("missing host"));
        }
        Ok(Self {
            url: parsed,
            byte_limit,
            timeout,
        })
    }

    /// Downloads until `byte_limit` bytes arrived or the wall-clock timeout
    /// elapsed. Never retried.
    ///
    /// - timeout with bytes received: partial throughput, no error
    /// - timeout with nothing received: [`ErrorKind::SpeedTimeout`]
    /// - non-2xx status, broken stream or empty body: [`ErrorKind::SpeedTransportError`]
    pub async fn measure(&self, target: SocketAddr) -> SpeedOutcome {
        let started = Instant::now();
        let deadline = started + self.timeout;
        let mut received: u64 = 0;

        let finished = timeout_at(deadline, self.download(target, &mut received)).await;
        let elapsed = started.elapsed();

        match finished {
            Ok(Ok(())) if received > 0 => SpeedOutcome {
                throughput_mbps: Some(throughput(received, elapsed)),
                bytes: received,
                error: None,
            },
            Ok(Ok(())) => {
                debug!("{target}: download returned an empty body");
                failed(received, ErrorKind::SpeedTransportError)
            }
            Ok(Err(e)) => {
                debug!("{target}: download failed: {e}");
                failed(received, ErrorKind::SpeedTransportError)
            }
            Err(_elapsed) if received > 0 => SpeedOutcome {
                throughput_mbps: Some(throughput(received, elapsed)),
                bytes: received,
                error: None,
            },
            Err(_elapsed) => failed(0, ErrorKind::SpeedTimeout),
        }
    }

    async fn download(&self, target: SocketAddr, received: &mut u64) -> Result<(), DownloadError> {
        let (client, url) = self.request_for(target)?;
        let mut response = client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status(status));
        }
        while let Some(chunk) = response.chunk().await? {
            *received += chunk.len() as u64;
            if *received >= self.byte_limit {
                break;
            }
        }
        Ok(())
    }

    /// Builds a client whose resolver sends the endpoint's hostname to
    /// `target`, along with the URL to request through it.
    fn request_for(&self, target: SocketAddr) -> reqwest::Result<(Client, Url)> {
        let url = self.request_url(target);
        let mut builder = Client::builder()
            .no_proxy()
            .redirect(Policy::none())
            .connect_timeout(self.timeout);
        if let Some(host) = url.domain() {
            builder = builder.resolve(host, target);
        }
        Ok((builder.build()?, url))
    }

    fn request_url(&self, target: SocketAddr) -> Url {
        let mut url = self.url.clone();
        // Switching between the two special schemes cannot fail.
        let _ = url.set_scheme(scheme_for_port(target.port()));
        let _ = url.set_port(Some(target.port()));
        if url.domain().is_none() {
            let _ = url.set_ip_host(target.ip());
        }
        url
    }
}

fn failed(bytes: u64, kind: ErrorKind) -> SpeedOutcome {
    SpeedOutcome {
        throughput_mbps: None,
        bytes,
        error: Some(kind),
    }
}

fn throughput(bytes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64().max(f64::EPSILON);
    bytes as f64 / BYTES_PER_MIB / secs
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
