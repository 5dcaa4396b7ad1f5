//! The **probing** abstraction and its production implementation.
//!
//! A [`Prober`] turns one [`Candidate`] into one [`ProbeResult`]. It never
//! fails: every per-candidate problem is recorded in the result so a single
//! bad address cannot stop the run. The [`pool`] submodule drives a prober
//! over a candidate sequence with bounded concurrency.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use edgeprobe_common::config::Config;
use edgeprobe_common::error::ConfigError;
use edgeprobe_common::network::candidate::Candidate;
use edgeprobe_common::network::result::ProbeResult;

use crate::network::http::SpeedTester;
use crate::network::tcp::{Connector, RetryPolicy, TcpConnector, TcpOutcome, connect_with_retry};

pub mod pool;

/// Run-wide cancellation flag, shared by every worker.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    flag: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Measures a single candidate.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, candidate: &Candidate, stop: &StopSignal) -> ProbeResult;
}

/// Measurement parameters fixed for the whole run.
#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub retry: RetryPolicy,
    /// `None` disables the HTTP phase.
    pub speed: Option<SpeedTester>,
}

impl ProbeSettings {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let retry = RetryPolicy {
            timeout: config.tcp_timeout,
            max_retries: config.max_retries,
            backoff: config.retry_backoff,
        };
        let speed = if config.speed_test {
            Some(SpeedTester::new(
                &config.speed_url,
                config.speed_bytes,
                config.speed_timeout,
            )?)
        } else {
            None
        };
        Ok(Self { retry, speed })
    }
}

/// TCP latency followed by the optional throughput download.
pub struct ProbeEngine {
    connector: Box<dyn Connector>,
    settings: ProbeSettings,
}

impl ProbeEngine {
    pub fn new(settings: ProbeSettings) -> Self {
        Self::with_connector(Box::new(TcpConnector), settings)
    }

    pub fn with_connector(connector: Box<dyn Connector>, settings: ProbeSettings) -> Self {
        Self {
            connector,
            settings,
        }
    }
}

#[async_trait]
impl Prober for ProbeEngine {
    async fn probe(&self, candidate: &Candidate, stop: &StopSignal) -> ProbeResult {
        let addr = candidate.socket_addr();
        let outcome =
            connect_with_retry(self.connector.as_ref(), addr, &self.settings.retry, stop).await;

        match outcome {
            TcpOutcome::Failed { kind, retries_used } => ProbeResult::unreachable(
                candidate,
                kind,
                retries_used,
                self.settings.speed.is_some(),
            ),
            TcpOutcome::Connected {
                latency_ms,
                retries_used,
            } => {
                let reachable = ProbeResult::reachable(candidate, latency_ms, retries_used);
                match &self.settings.speed {
                    Some(tester) => {
                        let speed = tester.measure(addr).await;
                        reachable.with_download(speed.throughput_mbps, speed.error)
                    }
                    None => reachable,
                }
            }
        }
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

#[cfg(test)]
mod tests {
    use super::*;
    use edgeprobe_common::error::ErrorKind;
    use std::io;
    use std::net::{Ipv4Addr, SocketAddr};
    use std::time::Duration;

    struct Refusing;

    #[async_trait]
    impl Connector for Refusing {
        async fn connect(&self, _addr: SocketAddr) -> io::Result<()> {
            Err(io::Error::from(io::ErrorKind::ConnectionRefused))
        }
    }

    struct Accepting;

    #[async_trait]
    impl Connector for Accepting {
        async fn connect(&self, _addr: SocketAddr) -> io::Result<()> {
            Ok(())
        }
    }

    fn settings(speed_test: bool) -> ProbeSettings {
        let config = Config {
            speed_test,
            ..Config::default()
        };
        ProbeSettings::from_config(&config).unwrap()
    }

    fn candidate() -> Candidate {
        Candidate::new(Ipv4Addr::new(192, 0, 2, 10), 443)
    }

    #[test]
    fn settings_follow_the_config() {
        let config = Config {
            tcp_timeout: Duration::from_secs(2),
            max_retries: 4,
            speed_test: false,
            ..Config::default()
        };
        let parsed = ProbeSettings::from_config(&config).unwrap();
        assert_eq!(parsed.retry.timeout, Duration::from_secs(2));
        assert_eq!(parsed.retry.max_retries, 4);
        assert!(parsed.speed.is_none());
        assert!(settings(true).speed.is_some());
    }

    #[test]
    fn invalid_speed_url_is_a_config_error() {
        let config = Config {
            speed_url: "gopher://nowhere".to_string(),
            ..Config::default()
        };
        assert!(ProbeSettings::from_config(&config).is_err());
    }

    #[test]
    fn stop_signal_is_shared_between_clones() {
        let stop = StopSignal::new();
        let observer = stop.clone();
        assert!(!observer.is_stopped());
        stop.stop();
        assert!(observer.is_stopped());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_connect_skips_the_http_phase() {
        let engine = ProbeEngine::with_connector(Box::new(Refusing), settings(true));
        let result = engine.probe(&candidate(), &StopSignal::new()).await;

        assert!(!result.tcp_connect_ok);
        assert!(result.http_enabled);
        assert!(!result.download_ok);
        assert_eq!(result.throughput_mbps, None);
        assert_eq!(result.error_kind, Some(ErrorKind::ConnectRefused));
    }

    #[tokio::test(start_paused = true)]
    async fn tcp_only_probe_records_latency() {
        let engine = ProbeEngine::with_connector(Box::new(Accepting), settings(false));
        let result = engine.probe(&candidate(), &StopSignal::new()).await;

        assert!(result.tcp_connect_ok);
        assert!(!result.http_enabled);
        assert!(result.tcp_latency_ms.is_some());
        assert_eq!(result.error_kind, None);
        assert_eq!(result.port, 443);
    }
}
