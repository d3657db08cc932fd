// artmgr - Artifact Repository Manager
// Copyright (C) 2025 artmgr Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.

//! Shared output formatting for CLI commands
//!
//! Status lines use [`console`] styling and go to stdout, errors to stderr.
//! Artifact lines share one layout:
//!
//! ```text
//!   2024-03-01 14:22 +0100   1.5M dir1/artifactA.zip
//! ```

use artmgr_core::{ArtifactListing, DiffReport, IndexEntry};
use chrono::{DateTime, Local, TimeZone};
use console::style;

/// Print a success message with a green check mark
pub fn success(msg: &str) {
    println!("{} {}", style("✔").green().bold(), msg);
}

/// Print an error message to stderr
pub fn error(msg: &str) {
    eprintln!("{} {}", style("✘").red().bold(), msg);
}

pub fn info(msg: &str) {
    println!("{} {}", style("ℹ").cyan(), msg);
}

/// Print a warning to stderr, keeping stdout for command output
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("⚠").yellow(), msg);
}

/// Print a `key: value` detail line with the value highlighted
pub fn detail(key: &str, value: &str) {
    println!("  {}: {}", key, style(value).cyan());
}

pub fn header(msg: &str) {
    println!("{}", style(msg).bold());
}

/// Human-readable size: `K`/`M`/`G`/`T` steps of 1024, one decimal above 1M
pub fn size_string(size: u64) -> String {
    const SUFFIXES: [&str; 5] = ["", "K", "M", "G", "T"];
    let precision = usize::from(size > 1024 * 1024);
    let mut value = size as f64;
    let mut suffix = 0;
    while value > 1024.0 && suffix < SUFFIXES.len() - 1 {
        value /= 1024.0;
        suffix += 1;
    }
    format!("{value:.precision$}{}", SUFFIXES[suffix])
}

/// Local time of an index mtime, minute precision with the UTC offset
pub fn timestamp(mtime: f64) -> String {
    timestamp_in(mtime, &Local)
}

fn timestamp_in<Tz>(mtime: f64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let secs = mtime.floor() as i64;
    match DateTime::from_timestamp(secs, 0) {
        Some(utc) => utc.with_timezone(tz).format("%Y-%m-%d %H:%M %z").to_string(),
        None => "-".to_string(),
    }
}

/// One artifact line, with `subdir` taken off the front of the path
pub fn item_line(entry: &IndexEntry, path: &str, subdir: Option<&str>) -> String {
    let shown = subdir
        .and_then(|prefix| path.strip_prefix(prefix))
        .unwrap_or(path);
    format!(
        "  {} {:>6} {}",
        timestamp(entry.mtime),
        size_string(entry.size),
        shown
    )
}

/// Print a listing, with extra paths of the same object indented below it
pub fn listing(items: &[ArtifactListing], subdir: Option<&str>) {
    for item in items {
        let mut paths = item.paths.iter();
        if let Some(primary) = paths.next() {
            println!("{}", item_line(&item.entry, primary, subdir));
        }
        for alias in paths {
            println!("  {:>23} {}", style("=").dim(), alias);
        }
    }
}

/// Print the non-empty sections of a comparison report
pub fn report(report: &DiffReport, subdir: Option<&str>) {
    for section in report.sections.iter().filter(|s| !s.items.is_empty()) {
        println!("{}:", style(&section.label).bold());
        for item in &section.items {
            match &item.entry {
                Some(entry) => println!("{}", item_line(entry, &item.path, subdir)),
                None => println!("  {:>23} {}", item.id, item.path),
            }
        }
    }
}
