//! Resolved vault configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, File, FileFormat};
use serde::{Deserialize, Deserializer};

use crate::error::{NoteDirError, NoteDirResult};

use super::obsidian;

const DEFAULT_CONFIG: &str = r#"
meetings_folder = "MEETINGS"
meetings_format = "YYYY/MM-MMMM"
daily_folder = "DAILY_NOTES"
daily_format = "YYYY/MM-MMMM/YYYY-MM-DD dddd"
people_folder = "PEOPLE"
templates_folder = "TEMPLATES"

[filter]
broadcast_keywords = ["office hours", "all hands", "town hall"]
personal_keywords = ["prep", "lunch", "focus", "ooo"]
large_group_threshold = 15
size_rule_first = false

[directory]
timeout = "10s"

[drive]
timeout = "10s"

[index]
meetings_heading = "📅 Meetings"
resources_heading = "📎 Meeting Resources"
"#;

/// Vault-local overrides live next to the notes.
const VAULT_CONFIG_FILE: &str = ".notedir.toml";

/// Everything the reconciler needs to know about a vault.
///
/// Layers, lowest precedence first: built-in defaults, `.obsidian/` settings,
/// `~/.config/notedir/config.toml`, `<vault>/.notedir.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct VaultConfig {
    #[serde(skip)]
    pub root: PathBuf,

    pub meetings_folder: String,
    pub meetings_format: String,
    pub daily_folder: String,
    pub daily_format: String,
    pub people_folder: String,
    pub templates_folder: String,

    /// Fallback for spotting the calendar owner when the feed has no `self` flag
    #[serde(default)]
    pub self_email: Option<String>,

    pub filter: FilterConfig,
    pub directory: DirectoryConfig,
    pub drive: DriveConfig,
    pub index: IndexConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    pub broadcast_keywords: Vec<String>,
    pub personal_keywords: Vec<String>,
    pub large_group_threshold: usize,
    /// Check the large-group rule before the title keyword rules
    #[serde(default)]
    pub size_rule_first: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            broadcast_keywords: vec![
                "office hours".into(),
                "all hands".into(),
                "town hall".into(),
            ],
            personal_keywords: vec!["prep".into(), "lunch".into(), "focus".into(), "ooo".into()],
            large_group_threshold: 15,
            size_rule_first: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryConfig {
    /// External people-search command; `{email}` is substituted per lookup.
    #[serde(default)]
    pub command: Option<Vec<String>>,

    #[serde(deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        DirectoryConfig {
            command: None,
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DriveConfig {
    /// Drive metadata command; `{id}` is substituted per attachment.
    #[serde(default)]
    pub command: Option<Vec<String>>,

    #[serde(deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
}

impl Default for DriveConfig {
    fn default() -> Self {
        DriveConfig {
            command: None,
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndexConfig {
    pub meetings_heading: String,
    pub resources_heading: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        IndexConfig {
            meetings_heading: "📅 Meetings".into(),
            resources_heading: "📎 Meeting Resources".into(),
        }
    }
}

fn deserialize_duration<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(&s).map_err(serde::de::Error::custom)
}

impl VaultConfig {
    /// Defaults only, rooted at `root`. Does not touch the filesystem.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        VaultConfig {
            root: root.into(),
            meetings_folder: "MEETINGS".into(),
            meetings_format: "YYYY/MM-MMMM".into(),
            daily_folder: "DAILY_NOTES".into(),
            daily_format: "YYYY/MM-MMMM/YYYY-MM-DD dddd".into(),
            people_folder: "PEOPLE".into(),
            templates_folder: "TEMPLATES".into(),
            self_email: None,
            filter: FilterConfig::default(),
            directory: DirectoryConfig::default(),
            drive: DriveConfig::default(),
            index: IndexConfig::default(),
        }
    }

    pub fn global_config_path() -> NoteDirResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| NoteDirError::Config("Could not determine config directory".into()))?
            .join("notedir");

        Ok(config_dir.join("config.toml"))
    }

    /// Resolve the configuration for the vault at `root`.
    ///
    /// Fails with `ConfigurationMissing` before anything is written when the
    /// vault root is not a directory or a required folder name is empty.
    pub fn load(root: &Path) -> NoteDirResult<Self> {
        let root = PathBuf::from(shellexpand::tilde(&root.to_string_lossy()).into_owned());

        if !root.is_dir() {
            return Err(NoteDirError::ConfigurationMissing(format!(
                "Vault root {} does not exist or is not a directory",
                root.display()
            )));
        }

        let mut builder = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from_str(&obsidian::settings_layer(&root), FileFormat::Toml));

        if let Ok(global) = Self::global_config_path() {
            builder = builder.add_source(File::from(global).required(false));
        }

        let mut config: VaultConfig = builder
            .add_source(File::from(root.join(VAULT_CONFIG_FILE)).required(false))
            .build()
            .map_err(|e| NoteDirError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| NoteDirError::Config(e.to_string()))?;

        config.root = root;
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> NoteDirResult<()> {
        let folders = [
            ("meetings_folder", &self.meetings_folder),
            ("daily_folder", &self.daily_folder),
            ("people_folder", &self.people_folder),
        ];

        for (key, value) in folders {
            if value.trim().is_empty() {
                return Err(NoteDirError::ConfigurationMissing(format!(
                    "'{}' is not set",
                    key
                )));
            }
        }

        Ok(())
    }

    pub fn people_dir(&self) -> PathBuf {
        self.root.join(&self.people_folder)
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.root.join(&self.templates_folder)
    }
}
