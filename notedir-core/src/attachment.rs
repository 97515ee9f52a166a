//! Attachment → output slot classification.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::event::{Attachment, MediaKind};

/// Typed output slot of a meeting document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    Agenda,
    Minutes,
    Transcript,
    Recording,
}

impl Slot {
    pub const ALL: [Slot; 4] = [Slot::Agenda, Slot::Minutes, Slot::Transcript, Slot::Recording];

    /// Frontmatter key of the slot.
    pub fn key(&self) -> &'static str {
        match self {
            Slot::Agenda => "agenda",
            Slot::Minutes => "minutes",
            Slot::Transcript => "transcript",
            Slot::Recording => "recording",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

enum Matcher {
    Kind(MediaKind),
    TitleContains(&'static [&'static str]),
}

/// Evaluated top to bottom; the first match wins. Anything unmatched is an agenda.
const RULES: &[(Matcher, Slot)] = &[
    (Matcher::Kind(MediaKind::MeetingTranscript), Slot::Transcript),
    (Matcher::Kind(MediaKind::MeetingRecording), Slot::Recording),
    (Matcher::TitleContains(&["minutes", "summary", "recap"]), Slot::Minutes),
    (Matcher::TitleContains(&["notes", "agenda", "1:1", "1-1"]), Slot::Agenda),
];

/// Map an attachment to its slot.
pub fn classify(attachment: &Attachment) -> Slot {
    let title = attachment.title.to_lowercase();

    RULES
        .iter()
        .find(|(matcher, _)| match matcher {
            Matcher::Kind(kind) => attachment.media_kind == *kind,
            Matcher::TitleContains(words) => words.iter().any(|w| title.contains(w)),
        })
        .map(|(_, slot)| *slot)
        .unwrap_or(Slot::Agenda)
}

/// Attachments grouped by slot, preserving input order within each slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlottedAttachments {
    entries: Vec<(Slot, Attachment)>,
}

impl SlottedAttachments {
    pub fn from_attachments(attachments: &[Attachment]) -> Self {
        SlottedAttachments {
            entries: attachments
                .iter()
                .map(|a| (classify(a), a.clone()))
                .collect(),
        }
    }

    /// URL of the first attachment seen for `slot`.
    pub fn first_url(&self, slot: Slot) -> Option<&str> {
        self.entries
            .iter()
            .find(|(s, a)| *s == slot && !a.url.is_empty())
            .map(|(_, a)| a.url.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Slot, Attachment)> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
