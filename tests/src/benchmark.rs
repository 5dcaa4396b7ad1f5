#![cfg(test)]
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use edgeprobe_common::config::Config;
use edgeprobe_common::network::range::AddressRange;
use edgeprobe_core::benchmark::{BenchmarkReport, BenchmarkService};
use edgeprobe_core::locations::BuiltinLocations;
use edgeprobe_core::scanner::StopSignal;
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// 127.0.0.1 and 127.0.0.2, tagged as Frankfurt.
fn loopback_ranges() -> Vec<AddressRange> {
    vec![AddressRange::new(Ipv4Addr::new(127, 0, 0, 0), 30).with_code("FRA")]
}

fn tcp_only(port: u16) -> Config {
    Config {
        port,
        workers: 4,
        tcp_timeout: Duration::from_secs(2),
        max_retries: 0,
        speed_test: false,
        ..Config::default()
    }
}

async fn benchmark(config: Config) -> BenchmarkReport {
    let service = BenchmarkService::new(config, Arc::new(BuiltinLocations))
        .expect("valid configuration");
    service
        .run(loopback_ranges(), StopSignal::new())
        .await
        .expect("ranges were supplied")
}

/// Keeps accepting so every probe on the port completes its handshake.
async fn accepting_listener() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            drop(socket);
        }
    });
    addr
}

async fn unused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// Every candidate refuses: the run succeeds with nothing ranked.
#[tokio::test]
async fn refused_everywhere_ranks_nothing() {
    let report = benchmark(tcp_only(unused_port().await)).await;

    assert_eq!(report.planned, 2);
    assert_eq!(report.probed, 2);
    assert_eq!(report.reachable, 0);
    assert!(report.ranked.is_empty());
    assert!(!report.cancelled);
}

#[tokio::test]
async fn listening_loopback_is_ranked_and_annotated() {
    let addr = accepting_listener().await;
    let report = benchmark(tcp_only(addr.port())).await;

    assert_eq!(report.reachable, 1);
    assert_eq!(report.ranked.len(), 1);

    let best = &report.ranked.as_slice()[0];
    assert_eq!(best.result.addr, Ipv4Addr::LOCALHOST);
    assert_eq!(best.result.port, addr.port());
    assert!(best.result.tcp_latency_ms.is_some());
    assert_eq!(best.location.as_ref().map(|l| l.city.as_str()), Some("Frankfurt"));
}

#[tokio::test]
async fn geo_filter_without_match_plans_nothing() {
    let config = Config {
        geo_filter: Some("Antarctica".to_string()),
        ..tcp_only(unused_port().await)
    };
    let report = benchmark(config).await;

    assert_eq!(report.planned, 0);
    assert_eq!(report.probed, 0);
    assert!(report.ranked.is_empty());
}

#[tokio::test]
async fn download_phase_measures_through_the_candidate() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 64 * 1024]))
        .mount(&server)
        .await;

    let config = Config {
        speed_test: true,
        speed_url: format!("{}/down", server.uri()),
        speed_bytes: 32 * 1024,
        speed_timeout: Duration::from_secs(5),
        ..tcp_only(server.address().port())
    };
    let report = benchmark(config).await;

    assert_eq!(report.ranked.len(), 1);
    let best = &report.ranked.as_slice()[0].result;
    assert!(best.http_enabled);
    assert!(best.download_ok);
    assert!(best.throughput_mbps.is_some_and(|mbps| mbps > 0.0));
}

#[tokio::test]
async fn stopped_run_is_reported_as_cancelled() {
    let stop = StopSignal::new();
    stop.stop();

    let service = BenchmarkService::new(tcp_only(unused_port().await), Arc::new(BuiltinLocations))
        .unwrap();
    let report = service.run(loopback_ranges(), stop).await.unwrap();

    assert!(report.cancelled);
    assert!(report.ranked.is_empty());
}
