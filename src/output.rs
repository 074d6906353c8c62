// Console rendering helpers: tables and status colors.

use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{ContentArrangement, Table};
use crossterm::style::Stylize;

pub fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Two-column `label | value` table.
pub fn kv_table(rows: Vec<(&str, String)>) -> Table {
    let mut table = new_table();
    for (label, value) in rows {
        table.add_row(vec![label.to_string(), value]);
    }
    table
}

/// Table with a header row.
pub fn grid_table(header: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut table = new_table();
    table.set_header(header.to_vec());
    for row in rows {
        table.add_row(row);
    }
    table
}

pub fn green(text: &str) -> String {
    text.green().to_string()
}

pub fn yellow(text: &str) -> String {
    text.yellow().to_string()
}

pub fn red(text: &str) -> String {
    text.red().to_string()
}

/// Which palette applies to a status value.
#[derive(Debug, Clone, Copy)]
pub enum StatusKind {
    Instance,
    Power,
    Server,
    Snapshot,
}

/// Color a provider status string; unknown values stay plain.
pub fn status_color(kind: StatusKind, status: &str) -> String {
    match (kind, status) {
        (StatusKind::Instance, "active")
        | (StatusKind::Power, "running")
        | (StatusKind::Server, "ok")
        | (StatusKind::Snapshot, "complete") => green(status),
        (StatusKind::Instance, "pending" | "resizing")
        | (StatusKind::Server, "none" | "installingbooting")
        | (StatusKind::Snapshot, "pending") => yellow(status),
        (StatusKind::Instance, "suspended")
        | (StatusKind::Power, "stopped")
        | (StatusKind::Server, "locked")
        | (StatusKind::Snapshot, "deleted") => red(status),
        _ => status.to_string(),
    }
}
