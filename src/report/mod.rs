use colored::Colorize;
use serde_json::Value;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::issues::LanguageCounts;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write output file: {0}")]
    FileWrite(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Print a JSON value, pretty-printed, to stdout.
pub fn print_json(value: &Value) -> Result<(), ReportError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// `label: count` lines, sorted by label.
pub fn format_language_counts(counts: &LanguageCounts) -> Vec<String> {
    counts
        .iter()
        .map(|(label, count)| format!("{}: {}", label, count))
        .collect()
}

pub fn print_language_counts(counts: &LanguageCounts) {
    if counts.is_empty() {
        println!("No issues found.");
        return;
    }
    for line in format_language_counts(counts) {
        println!("{}", line);
    }
}

/// Write file counts to `output_path` as `filename,count`, or print them when no path is given.
#[instrument(skip(rows), fields(rows = rows.len()))]
pub fn output_file_counts(rows: &[(String, usize)], output_path: Option<&Path>) -> Result<(), ReportError> {
    match output_path {
        None => {
            debug!("writing file counts to terminal");
            print_file_counts(rows);
            Ok(())
        }
        Some(path) => {
            debug!(path = %path.display(), "writing file counts to file");
            write_file_counts(rows, path)
        }
    }
}

fn print_file_counts(rows: &[(String, usize)]) {
    if rows.is_empty() {
        println!("No changed files found.");
        return;
    }
    for (filename, count) in rows {
        println!("{}: {}", filename, count.to_string().bold());
    }
}

fn write_file_counts(rows: &[(String, usize)], path: &Path) -> Result<(), ReportError> {
    let mut out = String::from("filename,count\n");
    for (filename, count) in rows {
        out.push_str(&format!("{},{}\n", csv_field(filename), count));
    }
    std::fs::write(path, out)?;
    Ok(())
}

/// Quote a field if it contains the delimiter, a quote, or a line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
