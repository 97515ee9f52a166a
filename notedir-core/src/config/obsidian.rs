//! Settings read from the vault's `.obsidian/` directory.
//!
//! Only the handful of keys that affect where notes live are read. They are
//! turned into a TOML layer so they slot into the same `config` builder as
//! the notedir config files.

use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
struct DailyNotesSettings {
    #[serde(default)]
    folder: String,
    #[serde(default)]
    format: String,
}

#[derive(Debug, Default, Deserialize)]
struct TemplatesSettings {
    #[serde(default)]
    folder: String,
}

#[derive(Debug, Default, Serialize)]
struct ObsidianLayer {
    #[serde(skip_serializing_if = "Option::is_none")]
    daily_folder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    daily_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    templates_folder: Option<String>,
}

/// Build a TOML layer from `.obsidian/daily-notes.json` and
/// `.obsidian/templates.json`. Unreadable files are ignored.
pub(crate) fn settings_layer(root: &Path) -> String {
    let dir = root.join(".obsidian");
    let mut layer = ObsidianLayer::default();

    if let Some(daily) = read_json::<DailyNotesSettings>(&dir.join("daily-notes.json")) {
        layer.daily_folder = non_empty(daily.folder);
        layer.daily_format = non_empty(daily.format);
    }

    if let Some(templates) = read_json::<TemplatesSettings>(&dir.join("templates.json")) {
        layer.templates_folder = non_empty(templates.folder);
    }

    toml::to_string(&layer).unwrap_or_default()
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Option<T> {
    let content = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable Obsidian settings");
            None
        }
    }
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim().trim_matches('/').to_string();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}
