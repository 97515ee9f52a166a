//! TUI rendering traits for notedir types.
//!
//! Extension traits that add colored terminal rendering to notedir-core
//! types using owo_colors.

use std::path::Path;

use notedir_core::filter::{Decision, Tier};
use notedir_core::sync::SyncReport;
use owo_colors::OwoColorize;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for Tier {
    fn render(&self) -> String {
        match self {
            Tier::FullDocument => "full".green().to_string(),
            Tier::LinkOnly => "link".yellow().to_string(),
            Tier::Skip => "skip".dimmed().to_string(),
        }
    }
}

impl Render for Decision {
    fn render(&self) -> String {
        format!("{} {}", self.tier.render(), format!("({})", self.reason).dimmed())
    }
}

/// Above this many entries a list collapses to a count unless verbose.
const COMPACT_THRESHOLD: usize = 5;

/// Path relative to the vault root, for shorter lines.
fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{}s", word)
    }
}

/// The run summary printed after `notedir sync`.
pub fn render_report(report: &SyncReport, root: &Path, verbose: bool) -> String {
    let mut lines = Vec::new();

    for change in &report.created {
        lines.push(format!("   {} {}", "+".green(), display_path(&change.path, root).green()));
    }
    for change in &report.updated {
        lines.push(format!("   {} {}", "~".yellow(), display_path(&change.path, root).yellow()));
    }
    if verbose || report.unchanged.len() <= COMPACT_THRESHOLD {
        for change in &report.unchanged {
            lines.push(format!("   {} {}", "=".dimmed(), display_path(&change.path, root).dimmed()));
        }
    } else {
        let label = format!("({} unchanged {})", report.unchanged.len(), pluralize("note", report.unchanged.len()));
        lines.push(format!("   {} {}", "=".dimmed(), label.dimmed()));
    }

    for event in &report.link_only {
        let detail = match event.resources {
            0 => event.reason.clone(),
            n => format!("{}, {} {}", event.reason, n, pluralize("resource", n)),
        };
        lines.push(format!("   {} {} {}", "→".cyan(), event.event, format!("({})", detail).dimmed()));
    }

    if verbose || report.skipped.len() <= COMPACT_THRESHOLD {
        for event in &report.skipped {
            lines.push(format!(
                "   {} {} {}",
                "-".dimmed(),
                event.event.dimmed(),
                format!("({})", event.reason).dimmed()
            ));
        }
    } else {
        let label = format!("({} skipped {})", report.skipped.len(), pluralize("event", report.skipped.len()));
        lines.push(format!("   {} {}", "-".dimmed(), label.dimmed()));
    }

    for note in &report.malformed {
        lines.push(format!(
            "   {} {} {}",
            "!".red(),
            display_path(&note.path, root).red(),
            format!("(left untouched: {})", note.reason).dimmed()
        ));
    }
    for event in &report.failed {
        lines.push(format!("   {} {} {}", "✗".red(), event.event.red(), format!("({})", event.reason).dimmed()));
    }

    if let Some(daily) = &report.daily_note {
        let action = if daily.created { "created" } else { "updated" };
        lines.push(format!(
            "\n📅 {} {}",
            display_path(&daily.path, root),
            format!("({}, {} new {})", action, daily.added, pluralize("link", daily.added)).dimmed()
        ));
    }

    if !report.unresolved.is_empty() {
        lines.push(format!("\n{}", "People not found (create notes in your people folder):".yellow()));
        for person in &report.unresolved {
            lines.push(format!(
                "   {} {} <{}> {}",
                "?".yellow(),
                person.display_name,
                person.email,
                format!("in {}", person.event).dimmed()
            ));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "{}{} created, {} updated, {} unchanged, {} link-only, {} skipped",
        if report.dry_run { "Dry run: " } else { "" },
        report.created.len(),
        report.updated.len(),
        report.unchanged.len(),
        report.link_only.len(),
        report.skipped.len()
    ));

    lines.join("\n")
}
