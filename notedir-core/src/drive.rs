//! Drive metadata for event attachments.
//!
//! Calendar attachments carry the title they had when they were attached.
//! When a catalog is configured (for example `gog drive get {id} --json
//! --results-only`), each attachment with a Drive file id is looked up and
//! its current name, mime type and view link are used instead.

use std::time::Duration;

use serde::Deserialize;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::command::ExternalCommand;
use crate::config::DriveConfig;
use crate::event::{Attachment, MediaKind};
use crate::people::LookupError;

/// Current metadata of a Drive file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileInfo {
    pub name: String,
    pub mime_type: String,
    pub web_view_link: Option<String>,
}

/// Looks up Drive files by id.
#[allow(async_fn_in_trait)]
pub trait FileCatalog {
    async fn file_info(&self, file_id: &str) -> Result<FileInfo, LookupError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoCatalog;

impl FileCatalog for NoCatalog {
    async fn file_info(&self, file_id: &str) -> Result<FileInfo, LookupError> {
        Err(LookupError::NotFound(file_id.to_string()))
    }
}

impl<C: FileCatalog> FileCatalog for Option<C> {
    async fn file_info(&self, file_id: &str) -> Result<FileInfo, LookupError> {
        match self {
            Some(catalog) => catalog.file_info(file_id).await,
            None => NoCatalog.file_info(file_id).await,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FileResponse {
    Wrapped { file: FileInfo },
    Bare(FileInfo),
}

/// Runs a configured command per file id.
#[derive(Debug, Clone)]
pub struct CommandCatalog {
    command: ExternalCommand,
}

impl CommandCatalog {
    pub fn new(argv: Vec<String>) -> Option<Self> {
        ExternalCommand::new(argv, "{id}").map(|command| CommandCatalog { command })
    }

    pub fn from_config(config: &DriveConfig) -> Option<Self> {
        config.command.clone().and_then(Self::new)
    }
}

impl FileCatalog for CommandCatalog {
    async fn file_info(&self, file_id: &str) -> Result<FileInfo, LookupError> {
        let stdout = self.command.run(file_id).await?;
        parse_file_output(&stdout, file_id)
    }
}

fn parse_file_output(stdout: &str, file_id: &str) -> Result<FileInfo, LookupError> {
    if stdout.trim().is_empty() {
        return Err(LookupError::NotFound(file_id.to_string()));
    }

    let info = match serde_json::from_str(stdout)
        .map_err(|e| LookupError::Failed(format!("Failed to parse Drive response: {}", e)))?
    {
        FileResponse::Wrapped { file } => file,
        FileResponse::Bare(file) => file,
    };

    if info.name.trim().is_empty() && info.mime_type.is_empty() {
        return Err(LookupError::NotFound(file_id.to_string()));
    }
    Ok(info)
}

/// `attachment` with Drive metadata applied. Lookup failures leave it as is.
pub async fn refine<C: FileCatalog>(
    attachment: &Attachment,
    catalog: &C,
    lookup_timeout: Duration,
) -> Attachment {
    let Some(file_id) = attachment.file_id.as_deref().filter(|id| !id.is_empty()) else {
        return attachment.clone();
    };

    let info = match timeout(lookup_timeout, catalog.file_info(file_id)).await {
        Ok(Ok(info)) => info,
        Ok(Err(LookupError::NotFound(_))) => {
            debug!(file_id, "No Drive metadata");
            return attachment.clone();
        }
        Ok(Err(error)) => {
            warn!(file_id, %error, "Drive lookup failed");
            return attachment.clone();
        }
        Err(_) => {
            warn!(file_id, error = %LookupError::Timeout(lookup_timeout), "Drive lookup failed");
            return attachment.clone();
        }
    };

    let title = match info.name.trim() {
        "" => attachment.title.clone(),
        name => name.to_string(),
    };
    let url = info
        .web_view_link
        .filter(|link| !link.trim().is_empty())
        .unwrap_or_else(|| attachment.url.clone());

    debug!(file_id, %title, "Applied Drive metadata");
    Attachment {
        media_kind: MediaKind::detect(&info.mime_type, &title, &url),
        title,
        url,
        file_id: attachment.file_id.clone(),
    }
}
