//! Fields and sections computed for a meeting note.

use chrono::NaiveDateTime;

use crate::attachment::{Slot, SlottedAttachments};
use crate::document::{ComputedSection, FieldMode, Fields, Ownership, Schema};
use crate::event::Event;
use crate::people::PersonReference;

pub const MEETING_TAG: &str = "Meetings";
pub const AGENDA_SECTION: &str = "Agenda";
pub const ACTIONS_SECTION: &str = "Actions";
pub const ATTACHMENTS_SECTION: &str = "Calendar Attachments";

/// Live fields mirror the calendar; everything else is filled once.
pub fn schema() -> Schema {
    Schema::default()
        .field("start", FieldMode::Live)
        .field("end", FieldMode::Live)
        .field("gmeet", FieldMode::Live)
        .field("URL", FieldMode::Live)
        .section(AGENDA_SECTION, Ownership::User, 2)
        .section(ACTIONS_SECTION, Ownership::User, 2)
        .section(ATTACHMENTS_SECTION, Ownership::System, 2)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingContent {
    pub fields: Fields,
    pub sections: Vec<ComputedSection>,
}

impl MeetingContent {
    pub fn compute(
        event: &Event,
        attendees: &[PersonReference],
        attachments: &SlottedAttachments,
        created: NaiveDateTime,
    ) -> Self {
        let mut fields = Fields::new()
            .with(
                "attendees",
                attendees.iter().map(PersonReference::wikilink).collect::<Vec<_>>(),
            )
            .with("tags", vec![MEETING_TAG.to_string()])
            .with("created", created.format("%Y-%m-%d %H:%M").to_string())
            .with("start", event.start.to_string())
            .with(
                "end",
                event.end.as_ref().map(ToString::to_string).unwrap_or_default(),
            )
            .with("gmeet", event.conference_url.clone().unwrap_or_default());

        for slot in Slot::ALL {
            fields.set(
                slot.key(),
                attachments.first_url(slot).unwrap_or_default().to_string(),
            );
        }
        fields.set("URL", event.html_link.clone().unwrap_or_default());

        let sections = vec![
            ComputedSection::new(
                AGENDA_SECTION,
                event.description.as_deref().unwrap_or_default().trim(),
            ),
            ComputedSection::new(ATTACHMENTS_SECTION, attachment_lines(attachments)),
        ];

        MeetingContent { fields, sections }
    }
}

/// `- <slot>: [title](url)` per attachment, in calendar order.
pub fn attachment_lines(attachments: &SlottedAttachments) -> String {
    attachments
        .iter()
        .map(|(slot, attachment)| format!("- {}", attachment_link(*slot, attachment)))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn attachment_link(slot: Slot, attachment: &crate::event::Attachment) -> String {
    let title = if attachment.title.trim().is_empty() {
        slot.key()
    } else {
        attachment.title.trim()
    };
    format!("{}: [{}]({})", slot, title, attachment.url)
}
