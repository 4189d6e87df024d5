//! Flat file-list exports.
//!
//! All three formats take the same input, typically `Node::files()` or the
//! hits of a search, and render one row per node. Dates are rendered at
//! second precision in UTC.

use chrono::{DateTime, SecondsFormat, Utc};
use dirsnap_core::Node;
use serde::Serialize;

use crate::error::Result;

const COLUMNS: [&str; 4] = ["Name", "Path", "Size", "Date Modified"];

/// Export nodes as CSV. Every field is quoted, internal quotes doubled.
pub fn export_csv(nodes: &[&Node]) -> String {
    let mut lines = Vec::with_capacity(nodes.len() + 1);
    lines.push(csv_row(COLUMNS));

    for node in nodes {
        let size = node.size.to_string();
        let date = format_date(&node.modified);
        lines.push(csv_row([node.name.as_str(), &node.path, &size, &date]));
    }

    lines.join("\n")
}

/// Export nodes as tab-separated text. Fields are written verbatim.
pub fn export_tsv(nodes: &[&Node]) -> String {
    let mut lines = Vec::with_capacity(nodes.len() + 1);
    lines.push(COLUMNS.join("\t"));

    for node in nodes {
        lines.push(format!(
            "{}\t{}\t{}\t{}",
            node.name,
            node.path,
            node.size,
            format_date(&node.modified)
        ));
    }

    lines.join("\n")
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportRow<'a> {
    name: &'a str,
    path: &'a str,
    size: u64,
    date_modified: String,
}

/// Export nodes as a pretty-printed JSON array.
pub fn export_json(nodes: &[&Node]) -> Result<String> {
    let rows: Vec<ExportRow<'_>> = nodes
        .iter()
        .map(|node| ExportRow {
            name: &node.name,
            path: &node.path,
            size: node.size,
            date_modified: format_date(&node.modified),
        })
        .collect();

    Ok(serde_json::to_string_pretty(&rows)?)
}

fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn csv_row<'a>(fields: impl IntoIterator<Item = &'a str>) -> String {
    fields
        .into_iter()
        .map(csv_escape)
        .collect::<Vec<_>>()
        .join(",")
}

fn csv_escape(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
