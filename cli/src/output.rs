//! Result file writer.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use serde::Serialize;

use edgeprobe_common::network::result::{AnnotatedResult, RankedResultSet};

use crate::commands::OutputFormat;

const CSV_HEADER: &str =
    "rank,ip,port,tcp_latency_ms,download_mbps,code,city,country,region,quality";

#[derive(Debug, Serialize)]
struct ResultRecord<'a> {
    rank: usize,
    ip: String,
    port: u16,
    tcp_latency_ms: Option<f64>,
    download_mbps: Option<f64>,
    code: Option<&'a str>,
    city: Option<&'a str>,
    country: Option<&'a str>,
    region: Option<&'a str>,
    quality: f64,
}

impl<'a> ResultRecord<'a> {
    fn new(rank: usize, entry: &'a AnnotatedResult) -> Self {
        let location = entry.location.as_ref();
        Self {
            rank,
            ip: entry.result.addr.to_string(),
            port: entry.result.port,
            tcp_latency_ms: entry.result.tcp_latency_ms,
            download_mbps: entry.result.throughput_mbps,
            code: entry.result.code.as_deref(),
            city: location.map(|l| l.city.as_str()),
            country: location.map(|l| l.country.as_str()),
            region: location.map(|l| l.region.as_str()),
            quality: entry.quality,
        }
    }
}

fn records(ranked: &RankedResultSet) -> Vec<ResultRecord<'_>> {
    ranked
        .iter()
        .enumerate()
        .map(|(idx, entry)| ResultRecord::new(idx + 1, entry))
        .collect()
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn opt_number(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(String::new, |v| format!("{v:.precision$}"))
}

pub fn render_csv<W: Write>(out: &mut W, ranked: &RankedResultSet) -> io::Result<()> {
    writeln!(out, "{CSV_HEADER}")?;
    for record in records(ranked) {
        writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{:.2}",
            record.rank,
            record.ip,
            record.port,
            opt_number(record.tcp_latency_ms, 2),
            opt_number(record.download_mbps, 2),
            csv_field(record.code.unwrap_or_default()),
            csv_field(record.city.unwrap_or_default()),
            csv_field(record.country.unwrap_or_default()),
            csv_field(record.region.unwrap_or_default()),
            record.quality,
        )?;
    }
    Ok(())
}

pub fn render_json<W: Write>(out: &mut W, ranked: &RankedResultSet) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, &records(ranked))?;
    writeln!(out)
}

pub fn write_results(path: &Path, format: OutputFormat, ranked: &RankedResultSet) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    match format {
        OutputFormat::Csv => render_csv(&mut out, ranked),
        OutputFormat::Json => render_json(&mut out, ranked),
    }
    .and_then(|()| out.flush())
    .with_context(|| format!("failed to write {}", path.display()))
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
    use edgeprobe_common::geo::GeoLocation;
    use edgeprobe_common::network::candidate::Candidate;
    use edgeprobe_common::network::result::ProbeResult;
    use std::net::Ipv4Addr;
    use std::sync::Arc;

    fn ranked() -> RankedResultSet {
        let fast = Candidate::new(Ipv4Addr::new(104, 16, 0, 1), 443).with_code(Some(Arc::from("SIN")));
        let slow = Candidate::new(Ipv4Addr::new(172, 64, 0, 9), 443);
        RankedResultSet::new(vec![
            AnnotatedResult {
                result: ProbeResult::reachable(&fast, 12.346, 0).with_download(Some(8.5), None),
                location: Some(GeoLocation::new("SIN", "Singapore", "SG", "Asia Pacific")),
                quality: 0.9,
            },
            AnnotatedResult {
                result: ProbeResult::reachable(&slow, 80.0, 1),
                location: None,
                quality: 0.5,
            },
        ])
    }

    #[test]
    fn csv_has_a_header_and_one_row_per_result() {
        let mut out = Vec::new();
        render_csv(&mut out, &ranked()).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(lines[1], "1,104.16.0.1,443,12.35,8.50,SIN,Singapore,SG,Asia Pacific,0.90");
        assert_eq!(lines[2], "2,172.64.0.9,443,80.00,,,,,,0.50");
    }

    #[test]
    fn csv_fields_with_commas_are_quoted() {
        assert_eq!(csv_field("Washington, D.C."), "\"Washington, D.C.\"");
        assert_eq!(csv_field("Tokyo"), "Tokyo");
    }

    #[test]
    fn json_is_an_array_of_records() {
        let mut out = Vec::new();
        render_json(&mut out, &ranked()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

        let records = value.as_array().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["rank"], 1);
        assert_eq!(records[0]["city"], "Singapore");
        assert!(records[1]["download_mbps"].is_null());
    }

    #[test]
    fn empty_set_writes_only_the_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.csv");
        write_results(&path, OutputFormat::Csv, &RankedResultSet::default()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.trim_end(), CSV_HEADER);
    }
}
