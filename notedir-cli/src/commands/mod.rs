pub mod classify;
pub mod sync;

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use notedir_core::Event;
use notedir_core::google::{RejectedEvent, parse_events};

/// Read and parse the event collection. A collection that is not valid
/// JSON is fatal; individual unusable events come back as rejected.
pub fn load_events(path: &Path) -> Result<(Vec<Event>, Vec<RejectedEvent>)> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read events from {}", path.display()))?;
    Ok(parse_events(&json)?)
}

/// `YYYY-MM-DD` or anything fuzzydate understands ("today", "next friday").
pub fn parse_date(input: Option<&str>) -> Result<NaiveDate> {
    let Some(input) = input.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(chrono::Local::now().date_naive());
    };

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(date);
    }

    fuzzydate::parse(&expand_abbreviations(input))
        .map(|dt| dt.date())
        .map_err(|_| anyhow::anyhow!("Could not parse date: \"{}\"", input))
}

/// Expand weekday abbreviations that fuzzydate doesn't handle.
fn expand_abbreviations(input: &str) -> String {
    const ABBREVIATIONS: [(&str, &str); 10] = [
        ("mon", "monday"),
        ("tue", "tuesday"),
        ("tues", "tuesday"),
        ("wed", "wednesday"),
        ("thu", "thursday"),
        ("thurs", "thursday"),
        ("fri", "friday"),
        ("sat", "saturday"),
        ("sun", "sunday"),
        ("tmrw", "tomorrow"),
    ];

    input
        .to_lowercase()
        .split_whitespace()
        .map(|word| {
            ABBREVIATIONS
                .iter()
                .find(|(abbr, _)| *abbr == word)
                .map(|(_, full)| *full)
                .unwrap_or(word)
                .to_string()
        })
        .collect::<Vec<_>>()
        .join(" ")
}
