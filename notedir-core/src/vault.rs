//! Note storage layout: where meeting and daily notes live, and how they are
//! read, written and scaffolded.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use tracing::{debug, info};

use crate::config::VaultConfig;
use crate::date_format::format_date;
use crate::document::{sanitize_title, Body, Document, Fields};
use crate::error::{NoteDirError, NoteDirResult};
use crate::event::Event;
use crate::people::PeopleIndex;

pub const MEETING_TEMPLATE: &str = "Meeting Template";
pub const DAILY_NOTE_TEMPLATE: &str = "Daily Note Template";

const DEFAULT_MEETING_BODY: &str = "## Actions\n\n\n## Agenda\n\n";
const DEFAULT_DAILY_BODY: &str = "# 📅 Meetings\n\n";

static TEMPLATER_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<%.*?%>").expect("valid templater pattern"));

/// A notes vault rooted at a resolved configuration.
#[derive(Debug, Clone)]
pub struct Vault {
    config: VaultConfig,
}

impl Vault {
    pub fn new(config: VaultConfig) -> Self {
        Vault { config }
    }

    pub fn load(root: &Path) -> NoteDirResult<Self> {
        Ok(Vault::new(VaultConfig::load(root)?))
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// File stem of an event's meeting note: `YYYY-MM-DD - <title>`.
    pub fn meeting_stem(event: &Event) -> String {
        format!(
            "{} - {}",
            event.date().format("%Y-%m-%d"),
            sanitize_title(&event.summary)
        )
    }

    pub fn meeting_path(&self, event: &Event) -> NoteDirResult<PathBuf> {
        let folder = format_date(event.date(), &self.config.meetings_format)?;
        Ok(self
            .config
            .root
            .join(&self.config.meetings_folder)
            .join(folder)
            .join(format!("{}.md", Self::meeting_stem(event))))
    }

    pub fn daily_note_path(&self, date: NaiveDate) -> NoteDirResult<PathBuf> {
        let name = format_date(date, &self.config.daily_format)?;
        Ok(self
            .config
            .root
            .join(&self.config.daily_folder)
            .join(format!("{}.md", name)))
    }

    /// `None` when the file does not exist.
    pub fn read_document(&self, path: &Path) -> NoteDirResult<Option<Document>> {
        if !path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(path)?;
        Document::parse(&text)
            .map(Some)
            .map_err(|reason| NoteDirError::MalformedDocument {
                path: path.to_path_buf(),
                reason,
            })
    }

    pub fn write_document(&self, path: &Path, document: &Document) -> NoteDirResult<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, document.render())?;
        info!(path = %path.display(), "Wrote note");
        Ok(())
    }

    pub fn people_index(&self) -> NoteDirResult<PeopleIndex> {
        PeopleIndex::from_dir(&self.config.people_dir())
    }

    /// Scaffold for new meeting notes. Fields are left to the merger.
    pub fn meeting_template(&self) -> Document {
        let body = self
            .template_body(MEETING_TEMPLATE)
            .unwrap_or_else(|| DEFAULT_MEETING_BODY.to_string());
        Document::new(Fields::new(), Body::parse(&body))
    }

    pub fn daily_template(&self, created: NaiveDateTime) -> Document {
        let body = self
            .template_body(DAILY_NOTE_TEMPLATE)
            .unwrap_or_else(|| DEFAULT_DAILY_BODY.to_string());
        let fields = Fields::new()
            .with("created", created.format("%Y-%m-%d %H:%M").to_string())
            .with("tags", vec!["Daily_Notes".to_string()]);
        Document::new(fields, Body::parse(&format!("\n{}", body)))
    }

    /// Body of a user template with its frontmatter and Templater tags removed.
    fn template_body(&self, name: &str) -> Option<String> {
        let path = self.config.templates_dir().join(format!("{}.md", name));
        let text = std::fs::read_to_string(&path).ok()?;

        let body = match Document::parse(&text) {
            Ok(doc) => doc.body.render(),
            Err(reason) => {
                debug!(path = %path.display(), %reason, "Template frontmatter unreadable, using raw text");
                text
            }
        };

        let stripped = TEMPLATER_TAG.replace_all(&body, "");
        let stripped = stripped.trim_start_matches('\n');
        if stripped.trim().is_empty() {
            return None;
        }
        Some(stripped.to_string())
    }
}
