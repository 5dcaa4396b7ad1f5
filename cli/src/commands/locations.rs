use colored::*;

use edgeprobe_common::geo::{GeoLocation, LocationRepository};
use edgeprobe_common::{success, warn};

use crate::commands::{self, LocationsArgs};
use crate::mprint;
use crate::terminal::format::Detail;
use crate::terminal::print;

pub fn locations(args: LocationsArgs) -> anyhow::Result<()> {
    let repo = commands::load_locations(args.locations.as_deref())?;
    let selected = select_locations(repo.as_ref(), &args);

    if selected.is_empty() {
        warn!("No location matches the given filters");
        return Ok(());
    }

    print::header("location table", 0);
    for (idx, location) in selected.iter().enumerate() {
        print::tree_head(idx + 1, &location.code);
        print::as_tree_one_level(location_details(location));
        if idx + 1 != selected.len() {
            mprint!();
        }
    }
    print::fat_separator();
    success!("{} locations listed", selected.len());
    Ok(())
}

/// Narrows the table by code, then country, then region. Every given
/// filter must match.
fn select_locations(repo: &dyn LocationRepository, args: &LocationsArgs) -> Vec<GeoLocation> {
    let mut selected: Vec<GeoLocation> = match (&args.iata, &args.country) {
        (Some(code), _) => repo.location(code).into_iter().collect(),
        (None, Some(country)) => repo.by_country(country),
        (None, None) => repo.all(),
    };
    if let Some(country) = &args.country {
        selected.retain(|loc| loc.country.eq_ignore_ascii_case(country));
    }
    if let Some(region) = &args.region {
        selected.retain(|loc| loc.region.eq_ignore_ascii_case(region));
    }
    selected
}

fn location_details(location: &GeoLocation) -> Vec<Detail> {
    vec![
        ("City".to_string(), location.city.normal()),
        ("Country".to_string(), location.country.normal()),
        ("Region".to_string(), location.region.normal()),
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
