//! Calendar event types.
//!
//! These mirror the subset of a Google Calendar event that the reconciler
//! consumes. They are immutable once parsed; see [`crate::google`] for the
//! conversion from the wire format.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

/// A calendar event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub summary: String,
    pub start: EventTime,
    pub end: Option<EventTime>,
    pub description: Option<String>,
    pub kind: EventKind,
    pub attendees: Vec<Attendee>,
    pub attachments: Vec<Attachment>,
    pub guests_can_see_others: bool,
    pub guests_can_invite_others: bool,
    /// Conference/video call URL (Google Meet)
    pub conference_url: Option<String>,
    /// Link to the event in the calendar web UI
    pub html_link: Option<String>,
}

impl Event {
    /// The attendee entry representing the calendar owner, if listed.
    pub fn self_attendee(&self, self_email: Option<&str>) -> Option<&Attendee> {
        self.attendees
            .iter()
            .find(|a| a.is_self || self_email.is_some_and(|email| a.email == email))
    }

    /// Response status of the calendar owner. Organizer-only events with no
    /// self entry count as accepted.
    pub fn self_status(&self, self_email: Option<&str>) -> ResponseStatus {
        self.self_attendee(self_email)
            .map(|a| a.response_status)
            .unwrap_or(ResponseStatus::Accepted)
    }

    /// Attendees other than the calendar owner.
    pub fn other_attendees<'a>(
        &'a self,
        self_email: Option<&'a str>,
    ) -> impl Iterator<Item = &'a Attendee> {
        self.attendees
            .iter()
            .filter(move |a| !(a.is_self || self_email.is_some_and(|email| a.email == email)))
    }

    /// Guests can neither see nor invite each other.
    pub fn is_broadcast(&self) -> bool {
        !self.guests_can_see_others && !self.guests_can_invite_others
    }

    pub fn date(&self) -> NaiveDate {
        self.start.date()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.summary.is_empty() {
            write!(f, "(untitled)")
        } else {
            write!(f, "{}", self.summary)
        }
    }
}

/// An event attendee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendee {
    pub email: String,
    pub display_name: Option<String>,
    pub response_status: ResponseStatus,
    pub is_self: bool,
}

impl Attendee {
    /// Display name, falling back to the local part of the email.
    pub fn label(&self) -> String {
        match self.display_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self
                .email
                .split('@')
                .next()
                .unwrap_or(&self.email)
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseStatus {
    Accepted,
    Declined,
    Tentative,
    NoResponse,
}

impl ResponseStatus {
    pub fn from_google(status: &str) -> Self {
        match status {
            "accepted" => ResponseStatus::Accepted,
            "declined" => ResponseStatus::Declined,
            "tentative" => ResponseStatus::Tentative,
            _ => ResponseStatus::NoResponse,
        }
    }
}

/// Google's `eventType`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    Default,
    WorkingLocation,
    OutOfOffice,
    FocusTime,
    Other(String),
}

impl EventKind {
    pub fn from_google(kind: &str) -> Self {
        match kind {
            "" | "default" => EventKind::Default,
            "workingLocation" => EventKind::WorkingLocation,
            "outOfOffice" => EventKind::OutOfOffice,
            "focusTime" => EventKind::FocusTime,
            other => EventKind::Other(other.to_string()),
        }
    }

    /// Location/availability markers are never meetings.
    pub fn is_marker(&self) -> bool {
        matches!(
            self,
            EventKind::WorkingLocation | EventKind::OutOfOffice | EventKind::FocusTime
        )
    }
}

/// A file attached to an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub title: String,
    pub url: String,
    pub media_kind: MediaKind,
    /// Drive file id, when the attachment lives in Drive
    #[serde(default)]
    pub file_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    Document,
    MeetingRecording,
    MeetingTranscript,
    Other,
}

impl MediaKind {
    /// Coarse classification from the attachment's mime type, title and URL.
    pub fn detect(mime_type: &str, title: &str, url: &str) -> Self {
        let title = title.to_lowercase();
        let mime = mime_type.to_lowercase();

        if mime.starts_with("video/") || mime.starts_with("audio/") || title.contains("recording")
        {
            MediaKind::MeetingRecording
        } else if mime == "text/vtt" || title.contains("transcript") || url.contains("gemini") {
            MediaKind::MeetingTranscript
        } else if mime.starts_with("application/vnd.google-apps.")
            || mime == "application/pdf"
            || mime.starts_with("application/vnd.openxmlformats")
            || mime.starts_with("application/msword")
            || mime.starts_with("text/")
            || url.contains("docs.google.com")
        {
            MediaKind::Document
        } else {
            MediaKind::Other
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventTime {
    DateTime(DateTime<FixedOffset>),
    Date(NaiveDate),
}

impl EventTime {
    pub fn date(&self) -> NaiveDate {
        match self {
            EventTime::DateTime(dt) => dt.date_naive(),
            EventTime::Date(d) => *d,
        }
    }

    /// Sort key: all-day events sort before timed events on the same day.
    pub fn sort_key(&self) -> (NaiveDate, Option<DateTime<FixedOffset>>) {
        match self {
            EventTime::DateTime(dt) => (dt.date_naive(), Some(*dt)),
            EventTime::Date(d) => (*d, None),
        }
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventTime::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            EventTime::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_kind_from_mime_and_title() {
        assert_eq!(
            MediaKind::detect("video/mp4", "Team Sync", "https://drive.google.com/x"),
            MediaKind::MeetingRecording
        );
        assert_eq!(
            MediaKind::detect("", "Team Sync - Transcript", "https://docs.google.com/d/1"),
            MediaKind::MeetingTranscript
        );
        assert_eq!(
            MediaKind::detect(
                "application/vnd.google-apps.document",
                "1:1 Notes",
                "https://docs.google.com/d/2"
            ),
            MediaKind::Document
        );
        assert_eq!(
            MediaKind::detect("image/png", "whiteboard", "https://example.com/a.png"),
            MediaKind::Other
        );
    }

    #[test]
    fn attendee_label_falls_back_to_email_local_part() {
        let attendee = Attendee {
            email: "jane.doe@example.com".into(),
            display_name: None,
            response_status: ResponseStatus::Accepted,
            is_self: false,
        };
        assert_eq!(attendee.label(), "jane.doe");
    }

    #[test]
    fn event_kind_markers() {
        assert!(EventKind::from_google("workingLocation").is_marker());
        assert!(EventKind::from_google("outOfOffice").is_marker());
        assert!(!EventKind::from_google("default").is_marker());
        assert_eq!(
            EventKind::from_google("birthday"),
            EventKind::Other("birthday".into())
        );
    }
}
