use colored::*;

use edgeprobe_common::network::range::AddressRange;
use edgeprobe_common::{success, warn};

use crate::commands::{self, RangesArgs};
use crate::terminal::format::Detail;
use crate::terminal::{colors, print};

pub fn ranges(args: RangesArgs) -> anyhow::Result<()> {
    let ranges = commands::load_ranges(args.ranges.as_deref())?;
    if ranges.is_empty() {
        warn!("No ranges loaded");
        return Ok(());
    }

    print::header("address ranges", 0);
    for (idx, range) in ranges.iter().enumerate() {
        print::tree_head(idx + 1, &range.to_string());
        print::as_tree_one_level(range_details(range));
    }
    print::fat_separator();

    let hosts: u64 = ranges.iter().map(AddressRange::host_count).sum();
    success!("{} ranges, {} probeable hosts", ranges.len(), hosts);
    Ok(())
}

fn range_details(range: &AddressRange) -> Vec<Detail> {
    let quality = match range.quality() {
        Some(q) => format!("{q:.2}").normal(),
        None => "unrated".color(colors::MISSING),
    };
    vec![
        ("Code".to_string(), range.code().unwrap_or("-").normal()),
        ("Hosts".to_string(), range.host_count().to_string().normal()),
        ("Quality".to_string(), quality),
    ]
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
