//! Calendar → vault reconciliation.

mod reconciler;
mod report;

pub use reconciler::{PlannedEvent, Reconciler, SyncOptions};
pub use report::{
    FailedEvent, IndexUpdate, LinkOnlyEvent, MalformedNote, NoteChange, SkippedEvent, SyncReport,
    UnresolvedAttendee,
};
