//! Google Calendar JSON → [`Event`] conversion.
//!
//! The event collection is whatever the calendar fetcher wrote to disk:
//! either `{"events": [...]}` or a bare array of Calendar v3 event resources.

use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{NoteDirError, NoteDirResult};
use crate::event::{Attachment, Attendee, Event, EventKind, EventTime, MediaKind, ResponseStatus};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Collection {
    Wrapped { events: Vec<Value> },
    Bare(Vec<Value>),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GoogleEvent {
    pub id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub event_type: Option<String>,
    pub start: Option<GoogleTime>,
    pub end: Option<GoogleTime>,
    pub attendees: Option<Vec<GoogleAttendee>>,
    pub attachments: Option<Vec<GoogleAttachment>>,
    pub guests_can_see_other_guests: Option<bool>,
    pub guests_can_invite_others: Option<bool>,
    pub hangout_link: Option<String>,
    pub html_link: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GoogleTime {
    pub date_time: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GoogleAttendee {
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub response_status: Option<String>,
    #[serde(rename = "self")]
    pub is_self: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GoogleAttachment {
    pub title: Option<String>,
    pub file_url: Option<String>,
    pub mime_type: Option<String>,
    pub file_id: Option<String>,
}

/// A raw event that could not be converted, kept for the run report.
#[derive(Debug, Clone)]
pub struct RejectedEvent {
    pub summary: String,
    pub reason: String,
}

/// Parse a serialized event collection.
///
/// A collection that is not valid JSON, or not a list of events, is fatal.
/// Each event is converted on its own: one that does not match the event
/// shape or has no usable start time is returned separately so the rest of
/// the run can proceed. JSON `null` counts as an absent field.
pub fn parse_events(json: &str) -> NoteDirResult<(Vec<Event>, Vec<RejectedEvent>)> {
    let collection: Collection =
        serde_json::from_str(json).map_err(|e| NoteDirError::MalformedEvents(e.to_string()))?;

    let raw = match collection {
        Collection::Wrapped { events } => events,
        Collection::Bare(events) => events,
    };

    let mut events = Vec::new();
    let mut rejected = Vec::new();

    for value in raw {
        let summary = value
            .get("summary")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let converted = serde_json::from_value::<GoogleEvent>(value)
            .map_err(|e| format!("Unreadable event: {}", e))
            .and_then(Event::from_google);

        match converted {
            Ok(event) => events.push(event),
            Err(reason) => rejected.push(RejectedEvent { summary, reason }),
        }
    }

    Ok((events, rejected))
}

pub trait FromGoogle {
    fn from_google(event: GoogleEvent) -> Result<Self, String>
    where
        Self: Sized;
}

impl FromGoogle for Event {
    fn from_google(event: GoogleEvent) -> Result<Self, String> {
        let start = event
            .start
            .as_ref()
            .and_then(parse_time)
            .ok_or_else(|| "Event has no start time".to_string())?;
        let end = event.end.as_ref().and_then(parse_time);

        let attendees = event
            .attendees
            .unwrap_or_default()
            .into_iter()
            .map(|a| Attendee {
                email: a.email.unwrap_or_default(),
                display_name: non_empty(a.display_name),
                response_status: ResponseStatus::from_google(a.response_status.as_deref().unwrap_or("")),
                is_self: a.is_self.unwrap_or(false),
            })
            .collect();

        let attachments = event
            .attachments
            .unwrap_or_default()
            .into_iter()
            .map(|a| {
                let title = a.title.unwrap_or_default();
                let url = a.file_url.unwrap_or_default();
                Attachment {
                    media_kind: MediaKind::detect(a.mime_type.as_deref().unwrap_or(""), &title, &url),
                    title,
                    url,
                    file_id: non_empty(a.file_id),
                }
            })
            .collect();

        Ok(Event {
            id: event.id.unwrap_or_default(),
            summary: event.summary.unwrap_or_default(),
            start,
            end,
            description: non_empty(event.description),
            kind: EventKind::from_google(event.event_type.as_deref().unwrap_or("")),
            attendees,
            attachments,
            // Google omits these when they hold their default (true)
            guests_can_see_others: event.guests_can_see_other_guests.unwrap_or(true),
            guests_can_invite_others: event.guests_can_invite_others.unwrap_or(true),
            conference_url: non_empty(event.hangout_link),
            html_link: non_empty(event.html_link),
        })
    }
}

fn parse_time(time: &GoogleTime) -> Option<EventTime> {
    if let Some(dt) = time.date_time.as_deref() {
        return DateTime::parse_from_rfc3339(dt).ok().map(EventTime::DateTime);
    }
    time.date
        .as_deref()
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .map(EventTime::Date)
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wrapped_collection() {
        let json = r#"{
            "events": [{
                "id": "evt1",
                "summary": "Team Sync",
                "eventType": "default",
                "start": {"dateTime": "2026-02-26T10:00:00-05:00"},
                "end": {"dateTime": "2026-02-26T10:30:00-05:00"},
                "hangoutLink": "https://meet.google.com/abc-defg-hij",
                "attendees": [
                    {"email": "me@x.com", "responseStatus": "accepted", "self": true},
                    {"email": "a@x.com", "displayName": "Alice", "responseStatus": "needsAction"}
                ],
                "attachments": [
                    {"title": "Team Sync Notes", "fileUrl": "https://docs.google.com/document/d/1",
                     "mimeType": "application/vnd.google-apps.document"}
                ]
            }]
        }"#;

        let (events, rejected) = parse_events(json).unwrap();
        assert!(rejected.is_empty());
        assert_eq!(events.len(), 1);

        let event = &events[0];
        assert_eq!(event.summary, "Team Sync");
        assert_eq!(event.kind, EventKind::Default);
        assert_eq!(event.attendees.len(), 2);
        assert!(event.attendees[0].is_self);
        assert_eq!(event.attendees[1].response_status, ResponseStatus::NoResponse);
        assert_eq!(event.attachments[0].media_kind, MediaKind::Document);
        assert!(event.guests_can_see_others);
        assert_eq!(
            event.date(),
            NaiveDate::from_ymd_opt(2026, 2, 26).unwrap()
        );
    }

    #[test]
    fn parses_bare_array_and_all_day_events() {
        let json = r#"[{"id": "e", "summary": "Offsite", "start": {"date": "2026-03-01"}}]"#;
        let (events, _) = parse_events(json).unwrap();
        assert_eq!(
            events[0].start,
            EventTime::Date(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap())
        );
    }

    #[test]
    fn event_without_start_is_rejected_not_fatal() {
        let json = r#"[{"id": "a", "summary": "Broken"}, {"id": "b", "summary": "Fine", "start": {"date": "2026-03-01"}}]"#;
        let (events, rejected) = parse_events(json).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].summary, "Broken");
    }

    #[test]
    fn null_fields_count_as_absent() {
        let json = r#"[
            {"id": "a", "summary": "Review", "description": null, "attendees": null,
             "hangoutLink": null, "start": {"dateTime": null, "date": "2026-03-01"}},
            {"id": "b", "summary": "Fine", "start": {"date": "2026-03-01"}}
        ]"#;
        let (events, rejected) = parse_events(json).unwrap();
        assert!(rejected.is_empty());
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].description, None);
        assert!(events[0].attendees.is_empty());
    }

    #[test]
    fn unreadable_event_is_rejected_alone() {
        let json = r#"{"events": [
            {"id": "a", "summary": "Bad attendees", "start": {"date": "2026-03-01"}, "attendees": "everyone"},
            "not an event",
            {"id": "b", "summary": "Fine", "start": {"date": "2026-03-01"}}
        ]}"#;
        let (events, rejected) = parse_events(json).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].summary, "Fine");
        assert_eq!(rejected.len(), 2);
        assert_eq!(rejected[0].summary, "Bad attendees");
        assert!(rejected[0].reason.starts_with("Unreadable event"));
        assert_eq!(rejected[1].summary, "");
    }

    #[test]
    fn invalid_json_is_fatal() {
        assert!(matches!(
            parse_events("not json"),
            Err(NoteDirError::MalformedEvents(_))
        ));
    }
}
