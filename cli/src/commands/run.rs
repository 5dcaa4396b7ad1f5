use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Context;
use colored::*;

use edgeprobe_common::config::Config;
use edgeprobe_common::network::result::ProbeResult;
use edgeprobe_common::{success, warn};
use edgeprobe_core::benchmark::{BenchmarkReport, BenchmarkService};
use edgeprobe_core::scanner::StopSignal;
use edgeprobe_core::scanner::pool::ProgressFn;

use crate::commands::{self, RunArgs};
use crate::mprint;
use crate::output;
use crate::terminal::input::InputHandle;
use crate::terminal::{colors, format, print, spinner};

const SETTINGS_KEY_WIDTH: usize = 10;

pub async fn run(args: RunArgs) -> anyhow::Result<()> {
    let q_level = args.quiet;
    let config = args.to_config().context("invalid arguments")?;
    let locations = commands::load_locations(args.locations.as_deref())?;

    let service = BenchmarkService::new(config, locations)?;
    let plan = match args.ranges.as_deref() {
        Some(path) => service.prepare(commands::load_ranges(Some(path))?)?,
        None => service.prepare_builtin()?,
    };
    let planned = plan.planned();

    print::header("preparing benchmark", q_level);
    print_settings(service.config(), plan.ranges().len(), planned, q_level);

    let stop = StopSignal::new();
    let ctrl_c = {
        let stop = stop.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                stop.stop();
            }
        })
    };
    let input = (!args.no_input).then(|| InputHandle::start(stop.clone()));

    spinner::start("Probing candidates...");
    let reachable = Arc::new(AtomicUsize::new(0));
    let progress: ProgressFn = Arc::new(move |probed: usize, result: &ProbeResult| {
        if result.tcp_connect_ok {
            reachable.fetch_add(1, Ordering::Relaxed);
        }
        spinner::report_probe_progress(probed, planned, reachable.load(Ordering::Relaxed));
    });

    let report = service.execute(plan, stop, Some(progress)).await;

    spinner::finish();
    drop(input);
    ctrl_c.abort();

    if report.cancelled {
        warn!(
            "Run interrupted, ranking the {} probes that completed",
            report.probed
        );
    }

    if let Some(path) = &args.output {
        output::write_results(path, args.format, &report.ranked)?;
        success!("Results written to {}", path.display());
    }

    benchmark_ends(&report, q_level);
    Ok(())
}

fn print_settings(config: &Config, range_count: usize, planned: u64, q_level: u8) {
    if q_level > 0 {
        return;
    }
    let line = |key: &str, value: String| print::aligned_line(key, SETTINGS_KEY_WIDTH, value);

    line("Sources", range_count.to_string());
    line("Candidates", planned.to_string());
    line("Port", config.port.to_string());
    line("Workers", config.workers.to_string());
    line("Location", config.geo_filter.clone().unwrap_or_else(|| "any".to_string()));
    line(
        "Speed test",
        if config.speed_test {
            format!("{} bytes from {}", config.speed_bytes, config.speed_url)
        } else {
            "off".to_string()
        },
    );
    line(
        "Filter",
        format!(
            "latency <= {} ms, speed >= {} MB/s",
            config.filter.max_latency_ms, config.filter.min_throughput_mbps
        ),
    );
}

fn benchmark_ends(report: &BenchmarkReport, q_level: u8) {
    if report.ranked.is_empty() {
        print::header("zero candidates ranked", q_level);
        print::no_results();
        print_summary(report, q_level);
        return;
    }

    if q_level > 0 {
        mprint!();
    }

    print::header("edge benchmark", q_level);
    print_results(report, q_level);
    print_summary(report, q_level);
}

fn print_results(report: &BenchmarkReport, q_level: u8) {
    let count = report.ranked.len();
    for (idx, entry) in report.ranked.iter().enumerate() {
        let endpoint = format!("{}:{}", entry.result.addr, entry.result.port);
        match q_level {
            2 => {}
            1 => print::print_status(format!(
                "{} {}",
                endpoint.color(colors::IPV4_ADDR),
                format::latency_to_detail(entry.result.tcp_latency_ms).1
            )),
            _ => {
                print::tree_head(idx + 1, &endpoint);
                print::as_tree_one_level(format::result_details(entry));
                if idx + 1 != count {
                    mprint!();
                }
            }
        }
    }
}

fn print_summary(report: &BenchmarkReport, q_level: u8) {
    let ranked: ColoredString = format!("{} ranked", report.ranked.len()).bold().green();
    let reachable: ColoredString = format!("{} reachable", report.reachable).bold();
    let total_time: ColoredString = format!("{:.2}s", report.elapsed.as_secs_f64())
        .bold()
        .yellow();
    let interrupted = if report.cancelled { " (interrupted)" } else { "" };
    let output: ColoredString = format!(
        "Benchmark Complete: {ranked} of {} probed, {reachable}, in {total_time}{interrupted}",
        report.probed
    )
    .color(colors::TEXT_DEFAULT);

    match q_level {
        0 => {
            print::fat_separator();
            print::centerln(&output.to_string());
        }
        _ => {
            mprint!();
            success!("{}", output)
        }
    }
}
