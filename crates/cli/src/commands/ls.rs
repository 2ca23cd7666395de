//! list executor - Show the bucket contents
//!
//! Fetches every object in the bucket and prints one line per object (or a
//! table). Whether an empty bucket ends the session is decided by the caller.

use bkt_core::{list_all, Listing, ObjectInfo, ObjectStore, Result, SessionSettings, SizeUnit};
use comfy_table::{presets, Cell, CellAlignment, Table};
use serde::Serialize;

use crate::output::Formatter;

/// Message printed for a bucket without objects
pub const EMPTY_MESSAGE: &str = "No objects found in the bucket.";

const MIB: f64 = 1_048_576.0;

/// Output structure for a listing (JSON format)
#[derive(Debug, Serialize)]
struct LsOutput<'a> {
    bucket: &'a str,
    items: &'a [ObjectInfo],
    total_objects: usize,
    total_size_bytes: u64,
}

/// List the bucket and print it
pub async fn execute<S>(
    store: &S,
    bucket: &str,
    settings: &SessionSettings,
    formatter: &Formatter,
) -> Result<Listing>
where
    S: ObjectStore + ?Sized,
{
    let listing = list_all(store, bucket).await?;
    print_listing(bucket, &listing, settings, formatter);
    Ok(listing)
}

fn print_listing(
    bucket: &str,
    listing: &Listing,
    settings: &SessionSettings,
    formatter: &Formatter,
) {
    if formatter.is_json() {
        formatter.json(&LsOutput {
            bucket,
            items: listing.objects(),
            total_objects: listing.len(),
            total_size_bytes: listing.total_size(),
        });
        return;
    }

    match listing {
        Listing::Empty => formatter.println(EMPTY_MESSAGE),
        Listing::NonEmpty(items) if settings.table => {
            formatter.println(&render_table(items, settings.size_unit));
        }
        Listing::NonEmpty(items) => {
            for item in items {
                formatter.println(&format!(
                    "Key: {}, Size: {}",
                    item.key,
                    format_size(item.size_bytes, settings.size_unit)
                ));
            }
        }
    }
}

/// Render an object size in the configured unit
pub fn format_size(bytes: u64, unit: SizeUnit) -> String {
    match unit {
        SizeUnit::Bytes => format!("{bytes} bytes"),
        SizeUnit::Mib => format!("{:.2} MiB", bytes as f64 / MIB),
        SizeUnit::Human => humansize::format_size(bytes, humansize::BINARY),
    }
}

fn render_table(items: &[ObjectInfo], unit: SizeUnit) -> String {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_header(vec!["Key", "Size", "Last Modified"]);

    for item in items {
        let modified = item
            .last_modified
            .map(|t| t.strftime("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(&item.key),
            Cell::new(format_size(item.size_bytes, unit)).set_alignment(CellAlignment::Right),
            Cell::new(modified),
        ]);
    }

    table.to_string()
}
