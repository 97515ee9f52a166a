//! External people directory.
//!
//! The directory is an external command (for example `gog people search
//! {email} --json`) that prints `{"people": [{"name": "..."}]}`. It is only
//! consulted after both local lookups miss.

use serde::Deserialize;

use super::LookupError;
use crate::command::ExternalCommand;
use crate::config::DirectoryConfig;

/// A people directory keyed by email.
#[allow(async_fn_in_trait)]
pub trait Directory {
    /// Canonical name for `email`.
    async fn lookup(&self, email: &str) -> Result<String, LookupError>;
}

/// Directory used when none is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDirectory;

impl Directory for NoDirectory {
    async fn lookup(&self, email: &str) -> Result<String, LookupError> {
        Err(LookupError::NotFound(email.to_string()))
    }
}

/// An unconfigured directory finds nobody.
impl<D: Directory> Directory for Option<D> {
    async fn lookup(&self, email: &str) -> Result<String, LookupError> {
        match self {
            Some(directory) => directory.lookup(email).await,
            None => NoDirectory.lookup(email).await,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    people: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(default)]
    name: Option<String>,
}

/// Runs a configured command per lookup.
#[derive(Debug, Clone)]
pub struct CommandDirectory {
    command: ExternalCommand,
}

impl CommandDirectory {
    /// `argv[0]` is resolved through `PATH`. Every `{email}` in the remaining
    /// arguments is replaced; without a placeholder the email is appended.
    pub fn new(argv: Vec<String>) -> Option<Self> {
        ExternalCommand::new(argv, "{email}").map(|command| CommandDirectory { command })
    }

    pub fn from_config(config: &DirectoryConfig) -> Option<Self> {
        config.command.clone().and_then(Self::new)
    }
}

impl Directory for CommandDirectory {
    async fn lookup(&self, email: &str) -> Result<String, LookupError> {
        let stdout = self.command.run(email).await?;
        parse_search_output(&stdout, email)
    }
}

fn parse_search_output(stdout: &str, email: &str) -> Result<String, LookupError> {
    if stdout.trim().is_empty() {
        return Err(LookupError::NotFound(email.to_string()));
    }

    let response: SearchResponse = serde_json::from_str(stdout)
        .map_err(|e| LookupError::Failed(format!("Failed to parse directory response: {}", e)))?;

    response
        .people
        .into_iter()
        .filter_map(|hit| hit.name)
        .map(|name| name.trim().to_string())
        .find(|name| !name.is_empty())
        .ok_or_else(|| LookupError::NotFound(email.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_command_is_rejected() {
        assert!(CommandDirectory::new(vec![]).is_none());
        assert!(CommandDirectory::new(vec![" ".into()]).is_none());
    }

    #[test]
    fn parses_first_named_hit() {
        let out = r#"{"people": [{"name": ""}, {"name": "Ada Lovelace"}, {"name": "Other"}]}"#;
        assert_eq!(parse_search_output(out, "ada@x.com").unwrap(), "Ada Lovelace");
    }

    #[test]
    fn empty_result_is_not_found() {
        assert_eq!(
            parse_search_output(r#"{"people": []}"#, "a@x.com"),
            Err(LookupError::NotFound("a@x.com".into()))
        );
        assert_eq!(
            parse_search_output("", "a@x.com"),
            Err(LookupError::NotFound("a@x.com".into()))
        );
    }

    #[tokio::test]
    async fn unconfigured_directory_never_finds() {
        let directory: Option<CommandDirectory> = None;
        assert_eq!(
            directory.lookup("a@x.com").await,
            Err(LookupError::NotFound("a@x.com".into()))
        );
    }

    #[tokio::test]
    async fn missing_binary_is_a_failure() {
        let directory = CommandDirectory::new(vec!["notedir-no-such-binary-xyz".into()]).unwrap();
        assert!(matches!(
            directory.lookup("a@x.com").await,
            Err(LookupError::Failed(_))
        ));
    }

    #[tokio::test]
    async fn no_directory_never_finds() {
        assert!(matches!(
            NoDirectory.lookup("a@x.com").await,
            Err(LookupError::NotFound(_))
        ));
    }
}
