//! Moment.js-style date formats, as used by Obsidian settings.
//!
//! Obsidian stores daily-note formats like `YYYY/MM-MMMM/YYYY-MM-DD dddd`.
//! These are translated into chrono format strings before use.

use std::fmt::Write;

use chrono::{NaiveDate, NaiveTime};

use crate::error::{NoteDirError, NoteDirResult};

/// Moment tokens and their chrono equivalents, longest first so that
/// `YYYY` wins over `YY` and `dddd` over `dd`.
const TOKENS: &[(&str, &str)] = &[
    ("YYYY", "%Y"),
    ("MMMM", "%B"),
    ("DDDD", "%j"),
    ("dddd", "%A"),
    ("MMM", "%b"),
    ("ddd", "%a"),
    ("YY", "%y"),
    ("MM", "%m"),
    ("DD", "%d"),
    // Two-letter weekday, no chrono equivalent
    ("dd", ""),
    ("HH", "%H"),
    ("hh", "%I"),
    ("mm", "%M"),
    ("ss", "%S"),
    ("M", "%-m"),
    ("D", "%-d"),
    ("d", "%w"),
    ("H", "%-H"),
    ("h", "%-I"),
    ("m", "%-M"),
    ("s", "%-S"),
    ("A", "%p"),
    ("a", "%P"),
];

/// Convert a moment format string into a chrono format string for `date`.
///
/// Text inside `[...]` is copied literally, as in moment. `dd` has no chrono
/// specifier, so it is written out as a literal (`Fr`).
pub fn to_chrono(moment: &str, date: NaiveDate) -> String {
    let mut out = String::with_capacity(moment.len() * 2);
    let mut rest = moment;

    while let Some(c) = rest.chars().next() {
        if c == '[' {
            if let Some(close) = rest.find(']') {
                push_literal(&mut out, &rest[1..close]);
                rest = &rest[close + 1..];
                continue;
            }
        }

        if let Some((token, chrono)) = TOKENS.iter().find(|(token, _)| rest.starts_with(token)) {
            if *token == "dd" {
                let weekday: String = date.format("%a").to_string().chars().take(2).collect();
                push_literal(&mut out, &weekday);
            } else {
                out.push_str(chrono);
            }
            rest = &rest[token.len()..];
            continue;
        }

        push_literal(&mut out, &rest[..c.len_utf8()]);
        rest = &rest[c.len_utf8()..];
    }

    out
}

fn push_literal(out: &mut String, text: &str) {
    for c in text.chars() {
        if c == '%' {
            out.push_str("%%");
        } else {
            out.push(c);
        }
    }
}

/// Format `date` with a moment format string.
pub fn format_date(date: NaiveDate, moment: &str) -> NoteDirResult<String> {
    let pattern = to_chrono(moment, date);
    let datetime = date.and_time(NaiveTime::MIN);

    let mut out = String::new();
    write!(out, "{}", datetime.format(&pattern))
        .map_err(|_| NoteDirError::Config(format!("Invalid date format '{}'", moment)))?;
    Ok(out)
}
