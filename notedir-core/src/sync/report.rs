use std::path::PathBuf;

use crate::google::RejectedEvent;

/// A meeting note that was created, updated or left as is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteChange {
    pub event: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEvent {
    pub event: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkOnlyEvent {
    pub event: String,
    pub reason: String,
    /// Attachments listed under the resources section
    pub resources: usize,
}

/// An existing note left untouched because it could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedNote {
    pub event: String,
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedEvent {
    pub event: String,
    pub reason: String,
}

/// An attendee with no person note, for manual follow-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedAttendee {
    pub event: String,
    pub email: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexUpdate {
    pub path: PathBuf,
    pub created: bool,
    pub added: usize,
}

/// Outcome of one reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub dry_run: bool,
    pub created: Vec<NoteChange>,
    pub updated: Vec<NoteChange>,
    pub unchanged: Vec<NoteChange>,
    pub link_only: Vec<LinkOnlyEvent>,
    pub skipped: Vec<SkippedEvent>,
    pub malformed: Vec<MalformedNote>,
    pub failed: Vec<FailedEvent>,
    pub unresolved: Vec<UnresolvedAttendee>,
    pub daily_note: Option<IndexUpdate>,
}

impl SyncReport {
    pub fn add_rejected(&mut self, rejected: &[RejectedEvent]) {
        self.failed.extend(rejected.iter().map(|r| FailedEvent {
            event: r.summary.clone(),
            reason: r.reason.clone(),
        }));
    }

    /// Whether any file was (or, in a dry run, would be) written.
    pub fn has_changes(&self) -> bool {
        !self.created.is_empty()
            || !self.updated.is_empty()
            || self.daily_note.as_ref().is_some_and(|d| d.created || d.added > 0)
    }

    /// Events that need a human to look at them.
    pub fn needs_attention(&self) -> usize {
        self.malformed.len() + self.failed.len() + self.unresolved.len()
    }
}
