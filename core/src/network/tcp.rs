use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::time::{Instant, sleep, timeout};
use tracing::debug;

use edgeprobe_common::error::ErrorKind;

use crate::scanner::StopSignal;

/// Opens a connection and drops it again. The seam lets tests script
/// timeouts and refusals without touching the network.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, addr: SocketAddr) -> io::Result<()>;
}

pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self, addr: SocketAddr) -> io::Result<()> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub max_retries: u32,
    pub backoff: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TcpOutcome {
    Connected { latency_ms: f64, retries_used: u32 },
    Failed { kind: ErrorKind, retries_used: u32 },
}

/// Connects to `addr`, retrying timeouts and socket errors up to
/// `policy.max_retries` times. A refusal is final: the port is closed and
/// asking again will not change that.
///
/// The reported latency covers the successful attempt only. The stop signal
/// is checked between attempts, never during one.
pub async fn connect_with_retry(
    connector: &dyn Connector,
    addr: SocketAddr,
    policy: &RetryPolicy,
    stop: &StopSignal,
) -> TcpOutcome {
    let mut retries_used: u32 = 0;
    loop {
        let started = Instant::now();
        let kind = match timeout(policy.timeout, connector.connect(addr)).await {
            Ok(Ok(())) => {
                let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
                return TcpOutcome::Connected {
                    latency_ms,
                    retries_used,
                };
            }
            Ok(Err(e)) if e.kind() == io::ErrorKind::ConnectionRefused => {
                return TcpOutcome::Failed {
                    kind: ErrorKind::ConnectRefused,
                    retries_used,
                };
            }
            Ok(Err(e)) => {
                debug!("connect to {addr} failed: {e}");
                ErrorKind::ConnectOther
            }
            Err(_elapsed) => ErrorKind::ConnectTimeout,
        };

        if retries_used >= policy.max_retries || stop.is_stopped() {
            return TcpOutcome::Failed { kind, retries_used };
        }
        retries_used += 1;
        sleep(policy.backoff).await;
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
    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::net::TcpListener;

    const TARGET: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)), 443);

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            timeout: Duration::from_secs(1),
            max_retries,
            backoff: Duration::from_millis(500),
        }
    }

    /// Hangs for the first `hangs` attempts, then connects after `delay`.
    struct Flaky {
        hangs: u32,
        delay: Duration,
        attempts: AtomicU32,
    }

    #[async_trait]
    impl Connector for Flaky {
        async fn connect(&self, _addr: SocketAddr) -> io::Result<()> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if attempt < self.hangs {
                std::future::pending::<()>().await;
            }
            sleep(self.delay).await;
            Ok(())
        }
    }

    struct Failing {
        kind: io::ErrorKind,
        attempts: AtomicU32,
    }

    #[async_trait]
    impl Connector for Failing {
        async fn connect(&self, _addr: SocketAddr) -> io::Result<()> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(io::Error::from(self.kind))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn latency_covers_only_the_successful_attempt() {
        let connector = Flaky {
            hangs: 3,
            delay: Duration::from_millis(40),
            attempts: AtomicU32::new(0),
        };
        let outcome = connect_with_retry(&connector, TARGET, &policy(5), &StopSignal::new()).await;

        match outcome {
            TcpOutcome::Connected {
                latency_ms,
                retries_used,
            } => {
                assert_eq!(retries_used, 3);
                assert!((latency_ms - 40.0).abs() < 1.0, "latency was {latency_ms}");
            }
            other => panic!("expected a connection, got {other:?}"),
        }
        assert_eq!(connector.attempts.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn timeouts_exhaust_the_retry_budget() {
        let connector = Flaky {
            hangs: u32::MAX,
            delay: Duration::ZERO,
            attempts: AtomicU32::new(0),
        };
        let outcome = connect_with_retry(&connector, TARGET, &policy(2), &StopSignal::new()).await;
        assert_eq!(
            outcome,
            TcpOutcome::Failed {
                kind: ErrorKind::ConnectTimeout,
                retries_used: 2
            }
        );
        assert_eq!(connector.attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn refusal_is_not_retried() {
        let connector = Failing {
            kind: io::ErrorKind::ConnectionRefused,
            attempts: AtomicU32::new(0),
        };
        let outcome = connect_with_retry(&connector, TARGET, &policy(5), &StopSignal::new()).await;
        assert_eq!(
            outcome,
            TcpOutcome::Failed {
                kind: ErrorKind::ConnectRefused,
                retries_used: 0
            }
        );
        assert_eq!(connector.attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn other_socket_errors_are_retried() {
        let connector = Failing {
            kind: io::ErrorKind::ConnectionReset,
            attempts: AtomicU32::new(0),
        };
        let outcome = connect_with_retry(&connector, TARGET, &policy(2), &StopSignal::new()).await;
        assert_eq!(
            outcome,
            TcpOutcome::Failed {
                kind: ErrorKind::ConnectOther,
                retries_used: 2
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stop_signal_ends_retries_at_the_next_boundary() {
        let connector = Flaky {
            hangs: u32::MAX,
            delay: Duration::ZERO,
            attempts: AtomicU32::new(0),
        };
        let stop = StopSignal::new();
        stop.stop();
        let outcome = connect_with_retry(&connector, TARGET, &policy(5), &stop).await;
        assert_eq!(
            outcome,
            TcpOutcome::Failed {
                kind: ErrorKind::ConnectTimeout,
                retries_used: 0
            }
        );
    }

    #[tokio::test]
    async fn tcp_connector_reaches_a_local_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let outcome = connect_with_retry(&TcpConnector, addr, &policy(0), &StopSignal::new()).await;
        assert!(matches!(outcome, TcpOutcome::Connected { retries_used: 0, .. }));
    }

    #[tokio::test]
    async fn tcp_connector_reports_a_closed_port_as_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let outcome = connect_with_retry(&TcpConnector, addr, &policy(3), &StopSignal::new()).await;
        assert_eq!(
            outcome,
            TcpOutcome::Failed {
                kind: ErrorKind::ConnectRefused,
                retries_used: 0
            }
        );
    }
}
