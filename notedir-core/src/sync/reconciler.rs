use std::path::PathBuf;

use chrono::{Local, NaiveDate, NaiveDateTime};
use tracing::{debug, info, warn};

use super::report::{
    FailedEvent, IndexUpdate, LinkOnlyEvent, MalformedNote, NoteChange, SkippedEvent, SyncReport,
    UnresolvedAttendee,
};
use crate::attachment::SlottedAttachments;
use crate::document::{Document, DocumentMerger, Schema};
use crate::drive::{self, FileCatalog, NoCatalog};
use crate::error::{NoteDirError, NoteDirResult};
use crate::event::Event;
use crate::filter::{Decision, DecisionOverrides, EventFilter, Tier};
use crate::index::{IndexEntry, IndexSynchronizer};
use crate::meeting::{self, attachment_link, MeetingContent};
use crate::people::{self, AttendeeResolver, Directory, PeopleIndex};
use crate::vault::Vault;

#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Compute everything, write nothing.
    pub dry_run: bool,
    /// Only process the first N events (after sorting).
    pub limit: Option<usize>,
}

/// An event with the tier it will be handled in.
#[derive(Debug, Clone)]
pub struct PlannedEvent {
    pub event: Event,
    pub decision: Decision,
}

/// Reconciles a batch of calendar events with the vault.
pub struct Reconciler<'a, D: Directory, C: FileCatalog = NoCatalog> {
    vault: &'a Vault,
    directory: &'a D,
    catalog: &'a C,
    filter: EventFilter,
    people: PeopleIndex,
    schema: Schema,
    template: Document,
    options: SyncOptions,
    now: NaiveDateTime,
}

enum MeetingOutcome {
    Created(PathBuf),
    Updated(PathBuf),
    Unchanged(PathBuf),
    Malformed(PathBuf, String),
}

impl<'a, D: Directory> Reconciler<'a, D> {
    /// A reconciler that takes attachments as the calendar describes them.
    pub fn new(vault: &'a Vault, directory: &'a D, options: SyncOptions) -> NoteDirResult<Self> {
        let config = vault.config();
        let people = vault.people_index()?;
        debug!(people = people.len(), "Loaded people index");

        Ok(Reconciler {
            vault,
            directory,
            catalog: &NoCatalog,
            filter: EventFilter::new(&config.filter, config.self_email.clone())?,
            people,
            schema: meeting::schema(),
            template: vault.meeting_template(),
            options,
            now: Local::now().naive_local(),
        })
    }
}

impl<'a, D: Directory, C: FileCatalog> Reconciler<'a, D, C> {
    /// Look attachments up in `catalog` before slotting them.
    pub fn with_catalog<K: FileCatalog>(self, catalog: &'a K) -> Reconciler<'a, D, K> {
        Reconciler {
            vault: self.vault,
            directory: self.directory,
            catalog,
            filter: self.filter,
            people: self.people,
            schema: self.schema,
            template: self.template,
            options: self.options,
            now: self.now,
        }
    }

    /// Timestamp written to `created` fields of new notes.
    pub fn with_now(mut self, now: NaiveDateTime) -> Self {
        self.now = now;
        self
    }

    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }

    /// Sort chronologically (ties by title), apply the limit, classify.
    pub fn plan(&self, mut events: Vec<Event>, overrides: &DecisionOverrides) -> Vec<PlannedEvent> {
        events.sort_by(|a, b| {
            a.start
                .sort_key()
                .cmp(&b.start.sort_key())
                .then_with(|| a.summary.cmp(&b.summary))
        });
        if let Some(limit) = self.options.limit {
            events.truncate(limit);
        }

        events
            .into_iter()
            .map(|event| {
                let decision = self.filter.classify_with(&event, overrides.get(&event.id));
                PlannedEvent { event, decision }
            })
            .collect()
    }

    pub async fn run(
        &self,
        events: Vec<Event>,
        target_date: NaiveDate,
        overrides: &DecisionOverrides,
    ) -> NoteDirResult<SyncReport> {
        let resolver = AttendeeResolver::new(
            &self.people,
            self.directory,
            self.vault.config().directory.timeout,
        );
        let mut report = SyncReport {
            dry_run: self.options.dry_run,
            ..Default::default()
        };
        let mut meeting_links = Vec::new();
        let mut resources = Vec::new();

        for PlannedEvent { event, decision } in self.plan(events, overrides) {
            let title = event.to_string();

            match decision.tier {
                Tier::Skip => report.skipped.push(SkippedEvent {
                    event: title,
                    reason: decision.reason,
                }),
                Tier::LinkOnly => {
                    let attachments = self.attachments(&event).await;
                    let links: Vec<String> = attachments
                        .iter()
                        .map(|(slot, attachment)| attachment_link(*slot, attachment))
                        .collect();
                    if !links.is_empty() {
                        resources.push(IndexEntry::with_children(title.clone(), links.clone()));
                    }
                    report.link_only.push(LinkOnlyEvent {
                        event: title,
                        reason: decision.reason,
                        resources: links.len(),
                    });
                }
                Tier::FullDocument => match self.reconcile_meeting(&event, &resolver, &mut report).await {
                    Ok(outcome) => {
                        meeting_links.push(IndexEntry::new(people::wikilink(&Vault::meeting_stem(&event))));
                        record_outcome(&mut report, title, outcome);
                    }
                    Err(error) => {
                        warn!(event = %title, %error, "Failed to reconcile event");
                        report.failed.push(FailedEvent {
                            event: title,
                            reason: error.to_string(),
                        });
                    }
                },
            }
        }

        let daily_note = self.update_daily_note(target_date, &meeting_links, &resources, &mut report)?;
        report.daily_note = daily_note;

        Ok(report)
    }

    async fn reconcile_meeting(
        &self,
        event: &Event,
        resolver: &AttendeeResolver<'_, D>,
        report: &mut SyncReport,
    ) -> NoteDirResult<MeetingOutcome> {
        let path = self.vault.meeting_path(event)?;

        let existing = match self.vault.read_document(&path) {
            Ok(existing) => existing,
            Err(NoteDirError::MalformedDocument { path, reason }) => {
                warn!(path = %path.display(), %reason, "Leaving malformed note untouched");
                return Ok(MeetingOutcome::Malformed(path, reason));
            }
            Err(e) => return Err(e),
        };

        let mut references = Vec::with_capacity(event.attendees.len());
        for (attendee, reference) in resolver.resolve_all(&event.attendees).await {
            if !reference.is_resolved() {
                report.unresolved.push(UnresolvedAttendee {
                    event: event.to_string(),
                    email: attendee.email.clone(),
                    display_name: reference.name().to_string(),
                });
            }
            references.push(reference);
        }

        let content = MeetingContent::compute(
            event,
            &references,
            &self.attachments(event).await,
            self.now,
        );
        let merged = DocumentMerger::new(&self.schema).merge(
            existing.clone(),
            &self.template,
            &content.fields,
            &content.sections,
        );

        let outcome = match existing {
            Some(existing) if existing == merged => return Ok(MeetingOutcome::Unchanged(path)),
            Some(_) => MeetingOutcome::Updated(path.clone()),
            None => MeetingOutcome::Created(path.clone()),
        };

        if !self.options.dry_run {
            self.vault.write_document(&path, &merged)?;
        }
        Ok(outcome)
    }

    async fn attachments(&self, event: &Event) -> SlottedAttachments {
        let lookup_timeout = self.vault.config().drive.timeout;
        let mut refined = Vec::with_capacity(event.attachments.len());
        for attachment in &event.attachments {
            refined.push(drive::refine(attachment, self.catalog, lookup_timeout).await);
        }
        SlottedAttachments::from_attachments(&refined)
    }

    fn update_daily_note(
        &self,
        date: NaiveDate,
        meeting_links: &[IndexEntry],
        resources: &[IndexEntry],
        report: &mut SyncReport,
    ) -> NoteDirResult<Option<IndexUpdate>> {
        if meeting_links.is_empty() && resources.is_empty() {
            return Ok(None);
        }

        let path = self.vault.daily_note_path(date)?;
        let (mut document, created) = match self.vault.read_document(&path) {
            Ok(Some(document)) => (document, false),
            Ok(None) => (self.vault.daily_template(self.now), true),
            Err(NoteDirError::MalformedDocument { path, reason }) => {
                warn!(path = %path.display(), %reason, "Leaving malformed daily note untouched");
                report.malformed.push(MalformedNote {
                    event: format!("Daily note {}", date),
                    path,
                    reason,
                });
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let headings = &self.vault.config().index;
        let sync = IndexSynchronizer::default();
        let added = sync.update_index(&mut document, &headings.meetings_heading, meeting_links)
            + sync.update_index(&mut document, &headings.resources_heading, resources);

        if (created || added > 0) && !self.options.dry_run {
            self.vault.write_document(&path, &document)?;
        }
        info!(path = %path.display(), created, added, "Daily note reconciled");

        Ok(Some(IndexUpdate {
            path,
            created,
            added,
        }))
    }
}

fn record_outcome(report: &mut SyncReport, event: String, outcome: MeetingOutcome) {
    match outcome {
        MeetingOutcome::Created(path) => {
            info!(path = %path.display(), "Created meeting note");
            report.created.push(NoteChange { event, path });
        }
        MeetingOutcome::Updated(path) => {
            info!(path = %path.display(), "Updated meeting note");
            report.updated.push(NoteChange { event, path });
        }
        MeetingOutcome::Unchanged(path) => report.unchanged.push(NoteChange { event, path }),
        MeetingOutcome::Malformed(path, reason) => {
            report.malformed.push(MalformedNote { event, path, reason })
        }
    }
}
