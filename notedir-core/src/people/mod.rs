//! Attendee → person record resolution.

mod directory;
mod index;
mod resolver;

use std::fmt;
use std::time::Duration;

use thiserror::Error;

pub use directory::{CommandDirectory, Directory, NoDirectory};
pub use index::PeopleIndex;
pub use resolver::AttendeeResolver;

/// Why a directory lookup did not produce a name. Never fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("lookup timed out after {}", humantime::format_duration(*.0))]
    Timeout(Duration),

    #[error("no directory entry for {0}")]
    NotFound(String),

    #[error("{0}")]
    Failed(String),
}

/// Which cascade step produced a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedBy {
    Email,
    Name,
    Directory,
}

/// A stable handle to a person record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersonReference {
    Resolved { name: String, by: ResolvedBy },
    /// No record found; carries the calendar-provided display name.
    Unresolved { display_name: String },
}

impl PersonReference {
    pub fn name(&self) -> &str {
        match self {
            PersonReference::Resolved { name, .. } => name,
            PersonReference::Unresolved { display_name } => display_name,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, PersonReference::Resolved { .. })
    }

    /// `[[Name]]`
    pub fn wikilink(&self) -> String {
        wikilink(self.name())
    }

    /// `"[[Name]]"`, the quoted form used in frontmatter lists.
    pub fn token(&self) -> String {
        format!("\"{}\"", self.wikilink())
    }
}

impl fmt::Display for PersonReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Wrap a note name as a wikilink, dropping characters that would end it early.
pub fn wikilink(name: &str) -> String {
    let clean: String = name
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | '|' | '#'))
        .collect();
    format!("[[{}]]", clean.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_quoted_wikilink() {
        let reference = PersonReference::Unresolved {
            display_name: "Jane Doe".into(),
        };
        assert_eq!(reference.wikilink(), "[[Jane Doe]]");
        assert_eq!(reference.token(), "\"[[Jane Doe]]\"");
        assert!(!reference.is_resolved());
    }

    #[test]
    fn wikilink_strips_link_syntax() {
        assert_eq!(wikilink("Ops | Oncall [bot]"), "[[Ops  Oncall bot]]");
    }
}
