//! Deduplicated list sections in an index note (the daily note).

use tracing::{debug, info};

use crate::document::{Document, Section};

/// One list item, optionally with nested items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub line: String,
    pub children: Vec<String>,
}

impl IndexEntry {
    pub fn new(line: impl Into<String>) -> Self {
        IndexEntry {
            line: line.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(line: impl Into<String>, children: Vec<String>) -> Self {
        IndexEntry {
            line: line.into(),
            children,
        }
    }
}

/// Appends entries to named list sections, skipping any already present.
#[derive(Debug, Clone, Copy)]
pub struct IndexSynchronizer {
    heading_level: usize,
}

impl Default for IndexSynchronizer {
    fn default() -> Self {
        IndexSynchronizer { heading_level: 1 }
    }
}

impl IndexSynchronizer {
    pub fn new(heading_level: usize) -> Self {
        IndexSynchronizer { heading_level }
    }

    /// Add `entries` to the list under `section_title`, creating the section
    /// when it is missing. Existing items keep their order; new items go
    /// after the last one. Returns the number of lines added.
    pub fn update_index(&self, document: &mut Document, section_title: &str, entries: &[IndexEntry]) -> usize {
        if entries.is_empty() {
            return 0;
        }

        if document.body.section(section_title).is_none() {
            debug!(section = section_title, "Creating index section");
            document
                .body
                .push_section(Section::new(self.heading_level, section_title, "\n"));
        }
        let Some(section) = document.body.section_mut(section_title) else {
            return 0;
        };

        let mut lines: Vec<String> = section.content.split('\n').map(String::from).collect();
        let added: usize = entries.iter().map(|entry| add_entry(&mut lines, entry)).sum();

        if added > 0 {
            let mut content = lines.join("\n");
            if !content.ends_with('\n') {
                content.push('\n');
            }
            section.content = content;
            info!(section = section_title, added, "Updated index");
        }

        added
    }
}

fn add_entry(lines: &mut Vec<String>, entry: &IndexEntry) -> usize {
    let key = normalize(&entry.line);
    if key.is_empty() {
        return 0;
    }

    let existing = lines
        .iter()
        .position(|line| is_item(line) && indent(line) < 2 && normalize(line) == key);

    match existing {
        Some(group) => {
            let mut end = group + 1;
            while end < lines.len() && is_item(&lines[end]) && indent(&lines[end]) >= 2 {
                end += 1;
            }
            let present: Vec<String> = lines[group + 1..end].iter().map(|l| normalize(l)).collect();

            let mut added = 0;
            for child in &entry.children {
                let child_key = normalize(child);
                if child_key.is_empty() || present.contains(&child_key) {
                    continue;
                }
                lines.insert(end + added, format!("  - {}", child.trim()));
                added += 1;
            }
            added
        }
        None => {
            let mut new_lines = vec![format!("- {}", entry.line.trim())];
            new_lines.extend(
                entry
                    .children
                    .iter()
                    .filter(|c| !normalize(c).is_empty())
                    .map(|c| format!("  - {}", c.trim())),
            );
            let added = new_lines.len();

            let at = match lines.iter().rposition(|line| is_item(line)) {
                Some(last_item) => last_item + 1,
                None => {
                    // Keep a blank line between prose and the new list
                    let last_text = lines.iter().rposition(|l| !l.trim().is_empty()).unwrap_or(0);
                    new_lines.insert(0, String::new());
                    last_text + 1
                }
            };

            lines.splice(at..at, new_lines);
            added
        }
    }
}

fn is_item(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed == "-" || ["- ", "* ", "+ "].iter().any(|marker| trimmed.starts_with(marker))
}

fn indent(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Item text without its marker, whitespace collapsed.
fn normalize(line: &str) -> String {
    let trimmed = line.trim();
    let text = ["- ", "* ", "+ "]
        .iter()
        .find_map(|marker| trimmed.strip_prefix(marker))
        .unwrap_or(trimmed);
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
