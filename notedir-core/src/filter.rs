//! Event tiering.
//!
//! Each event is assigned one of three tiers by an ordered rule table. The
//! first rule whose predicate holds decides the tier; later rules are never
//! consulted. Rules 1-4 are structural exclusions and cannot be overridden.
//! Rules 5-8 are judgment calls that yield to an external decision when one
//! is supplied for the event.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::FilterConfig;
use crate::error::{NoteDirError, NoteDirResult};
use crate::event::{Event, ResponseStatus};

/// How an event is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    #[serde(rename = "skip")]
    Skip,
    #[serde(rename = "link", alias = "link-only", alias = "link_only")]
    LinkOnly,
    #[serde(rename = "full", alias = "full-document", alias = "full_document")]
    FullDocument,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Skip => write!(f, "skip"),
            Tier::LinkOnly => write!(f, "link"),
            Tier::FullDocument => write!(f, "full"),
        }
    }
}

/// The tier chosen for an event, with the reason for audit output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub tier: Tier,
    pub reason: String,
    /// Whether an external decision could have replaced this one.
    pub overridable: bool,
}

impl Decision {
    fn new(tier: Tier, reason: &str, overridable: bool) -> Self {
        Decision {
            tier,
            reason: reason.to_string(),
            overridable,
        }
    }
}

/// Externally supplied decisions, keyed by event id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecisionOverrides(HashMap<String, Tier>);

impl DecisionOverrides {
    pub fn load(path: &Path) -> NoteDirResult<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            NoteDirError::Serialization(format!("Invalid decisions file {}: {}", path.display(), e))
        })
    }

    pub fn get(&self, event_id: &str) -> Option<Tier> {
        self.0.get(event_id).copied()
    }

    pub fn insert(&mut self, event_id: impl Into<String>, tier: Tier) {
        self.0.insert(event_id.into(), tier);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// What a rule looks at.
#[derive(Debug, Clone)]
enum Predicate {
    MarkerKind,
    SelfDeclined,
    NoOtherParticipants,
    BroadcastVisibility,
    Title(Option<Regex>),
    MoreAttendeesThan(usize),
    SelfUnconfirmed,
}

#[derive(Debug, Clone)]
struct Rule {
    predicate: Predicate,
    tier: Tier,
    reason: &'static str,
    overridable: bool,
}

/// Ordered-rule event classifier.
#[derive(Debug, Clone)]
pub struct EventFilter {
    rules: Vec<Rule>,
    self_email: Option<String>,
}

impl EventFilter {
    pub fn new(config: &FilterConfig, self_email: Option<String>) -> NoteDirResult<Self> {
        let mut rules = vec![
            Rule {
                predicate: Predicate::MarkerKind,
                tier: Tier::Skip,
                reason: "non-meeting event type",
                overridable: false,
            },
            Rule {
                predicate: Predicate::SelfDeclined,
                tier: Tier::Skip,
                reason: "declined",
                overridable: false,
            },
            Rule {
                predicate: Predicate::NoOtherParticipants,
                tier: Tier::Skip,
                reason: "no other participants",
                overridable: false,
            },
            Rule {
                predicate: Predicate::BroadcastVisibility,
                tier: Tier::Skip,
                reason: "broadcast",
                overridable: false,
            },
        ];

        let mut judgment = vec![
            // Attachments do not lift a broadcast-titled event to a full document
            Rule {
                predicate: Predicate::Title(keyword_regex(&config.broadcast_keywords)?),
                tier: Tier::LinkOnly,
                reason: "broadcast",
                overridable: true,
            },
            Rule {
                predicate: Predicate::Title(keyword_regex(&config.personal_keywords)?),
                tier: Tier::Skip,
                reason: "personal time",
                overridable: true,
            },
        ];
        let size_rule = Rule {
            predicate: Predicate::MoreAttendeesThan(config.large_group_threshold),
            tier: Tier::LinkOnly,
            reason: "large group",
            overridable: true,
        };
        if config.size_rule_first {
            judgment.insert(0, size_rule);
        } else {
            judgment.push(size_rule);
        }
        rules.extend(judgment);

        rules.push(Rule {
            predicate: Predicate::SelfUnconfirmed,
            tier: Tier::LinkOnly,
            reason: "unconfirmed attendance",
            overridable: true,
        });

        Ok(EventFilter { rules, self_email })
    }

    /// Classify without any external decision.
    pub fn classify(&self, event: &Event) -> Decision {
        self.classify_with(event, None)
    }

    /// Classify, letting `override_tier` replace the outcome of any
    /// overridable rule (including the default).
    pub fn classify_with(&self, event: &Event, override_tier: Option<Tier>) -> Decision {
        let decision = self.decide(event, override_tier);
        debug!(
            event_id = %event.id,
            title = %event.summary,
            tier = %decision.tier,
            reason = %decision.reason,
            "Classified event"
        );
        decision
    }

    fn decide(&self, event: &Event, override_tier: Option<Tier>) -> Decision {
        for rule in &self.rules {
            if !self.matches(&rule.predicate, event) {
                continue;
            }
            if rule.overridable {
                if let Some(tier) = override_tier {
                    return Decision::new(tier, "manual override", true);
                }
            }
            return Decision::new(rule.tier, rule.reason, rule.overridable);
        }

        match override_tier {
            Some(tier) => Decision::new(tier, "manual override", true),
            None => Decision::new(Tier::FullDocument, "default", true),
        }
    }

    fn matches(&self, predicate: &Predicate, event: &Event) -> bool {
        let self_email = self.self_email.as_deref();

        match predicate {
            Predicate::MarkerKind => event.kind.is_marker(),
            Predicate::SelfDeclined => event.self_status(self_email) == ResponseStatus::Declined,
            Predicate::NoOtherParticipants => event.other_attendees(self_email).next().is_none(),
            Predicate::BroadcastVisibility => event.is_broadcast(),
            Predicate::Title(regex) => regex.as_ref().is_some_and(|r| r.is_match(&event.summary)),
            // Raw count: resolution status plays no part in filtering
            Predicate::MoreAttendeesThan(threshold) => event.attendees.len() > *threshold,
            Predicate::SelfUnconfirmed => matches!(
                event.self_status(self_email),
                ResponseStatus::Tentative | ResponseStatus::NoResponse
            ),
        }
    }
}

/// Case-insensitive whole-word alternation over `keywords`.
fn keyword_regex(keywords: &[String]) -> NoteDirResult<Option<Regex>> {
    let alternatives: Vec<String> = keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .map(|k| regex::escape(k).replace(' ', r"\s+"))
        .collect();

    if alternatives.is_empty() {
        return Ok(None);
    }

    let pattern = format!(r"(?i)(?:^|\W)(?:{})(?:\W|$)", alternatives.join("|"));
    Regex::new(&pattern)
        .map(Some)
        .map_err(|e| NoteDirError::Config(format!("Invalid keyword list: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Attachment, Attendee, EventKind, EventTime, MediaKind};
    use chrono::NaiveDate;

    fn attendee(email: &str, status: ResponseStatus, is_self: bool) -> Attendee {
        Attendee {
            email: email.to_string(),
            display_name: None,
            response_status: status,
            is_self,
        }
    }

    fn event(title: &str) -> Event {
        Event {
            id: "evt".into(),
            summary: title.into(),
            start: EventTime::Date(NaiveDate::from_ymd_opt(2026, 2, 26).unwrap()),
            end: None,
            description: None,
            kind: EventKind::Default,
            attendees: vec![
                attendee("me@x.com", ResponseStatus::Accepted, true),
                attendee("a@x.com", ResponseStatus::Accepted, false),
            ],
            attachments: vec![],
            guests_can_see_others: true,
            guests_can_invite_others: true,
            conference_url: None,
            html_link: None,
        }
    }

    fn filter() -> EventFilter {
        EventFilter::new(&FilterConfig::default(), None).unwrap()
    }

    fn crowd(n: usize) -> Vec<Attendee> {
        let mut attendees = vec![attendee("me@x.com", ResponseStatus::Accepted, true)];
        attendees.extend(
            (0..n - 1).map(|i| attendee(&format!("p{i}@x.com"), ResponseStatus::Accepted, false)),
        );
        attendees
    }

    #[test]
    fn team_sync_is_full_document() {
        let decision = filter().classify(&event("Team Sync"));
        assert_eq!(decision.tier, Tier::FullDocument);
        assert_eq!(decision.reason, "default");
    }

    #[test]
    fn marker_kind_always_skips() {
        let mut e = event("All Hands prep lunch");
        e.kind = EventKind::WorkingLocation;
        e.attendees = crowd(200);
        let decision = filter().classify_with(&e, Some(Tier::FullDocument));
        assert_eq!(decision.tier, Tier::Skip);
        assert_eq!(decision.reason, "non-meeting event type");
    }

    #[test]
    fn declined_skips() {
        let mut e = event("Team Sync");
        e.attendees[0].response_status = ResponseStatus::Declined;
        assert_eq!(filter().classify(&e).reason, "declined");
    }

    #[test]
    fn self_email_identifies_owner_without_self_flag() {
        let mut e = event("Team Sync");
        e.attendees[0].is_self = false;
        e.attendees[0].response_status = ResponseStatus::Declined;
        let filter = EventFilter::new(&FilterConfig::default(), Some("me@x.com".into())).unwrap();
        assert_eq!(filter.classify(&e).reason, "declined");
    }

    #[test]
    fn alone_skips() {
        let mut e = event("Deep work");
        e.attendees.truncate(1);
        assert_eq!(filter().classify(&e).reason, "no other participants");

        e.attendees.clear();
        assert_eq!(filter().classify(&e).reason, "no other participants");
    }

    #[test]
    fn broadcast_visibility_skips_and_is_not_overridable() {
        let mut e = event("Quarterly update");
        e.guests_can_see_others = false;
        e.guests_can_invite_others = false;
        let decision = filter().classify_with(&e, Some(Tier::FullDocument));
        assert_eq!(decision.tier, Tier::Skip);
        assert_eq!(decision.reason, "broadcast");
        assert!(!decision.overridable);
    }

    #[test]
    fn broadcast_keyword_beats_large_group() {
        let mut e = event("All Hands Town Hall");
        e.attendees = crowd(200);
        let decision = filter().classify(&e);
        assert_eq!(decision.tier, Tier::LinkOnly);
        assert_eq!(decision.reason, "broadcast");
    }

    #[test]
    fn size_rule_can_take_precedence_over_keywords() {
        let config = FilterConfig {
            size_rule_first: true,
            ..FilterConfig::default()
        };
        let filter = EventFilter::new(&config, None).unwrap();

        let mut town_hall = event("All Hands Town Hall");
        town_hall.attendees = crowd(200);
        assert_eq!(filter.classify(&town_hall).reason, "large group");

        let mut team_lunch = event("Team Lunch");
        team_lunch.attendees = crowd(40);
        let decision = filter.classify(&team_lunch);
        assert_eq!(decision.tier, Tier::LinkOnly);
        assert_eq!(decision.reason, "large group");

        assert_eq!(filter.classify(&event("Lunch")).reason, "personal time");
    }

    #[test]
    fn broadcast_keyword_with_attachments_stays_link_only() {
        let mut e = event("Platform Office Hours");
        e.attachments.push(Attachment {
            title: "Agenda".into(),
            url: "https://docs.google.com/document/d/1".into(),
            media_kind: MediaKind::Document,
            file_id: None,
        });
        assert_eq!(filter().classify(&e).tier, Tier::LinkOnly);
    }

    #[test]
    fn personal_keywords_skip_on_word_boundaries() {
        assert_eq!(filter().classify(&event("Lunch")).reason, "personal time");
        assert_eq!(filter().classify(&event("OOO - Dentist")).reason, "personal time");
        assert_eq!(filter().classify(&event("Interview prep")).reason, "personal time");
        // "prep" inside another word is not personal time
        assert_eq!(filter().classify(&event("Preparedness review")).reason, "default");
    }

    #[test]
    fn large_group_is_link_only() {
        let mut e = event("Design review");
        e.attendees = crowd(16);
        assert_eq!(filter().classify(&e).reason, "large group");

        e.attendees = crowd(15);
        assert_eq!(filter().classify(&e).reason, "default");
    }

    #[test]
    fn unconfirmed_attendance_is_link_only() {
        let mut e = event("Team Sync");
        e.attendees[0].response_status = ResponseStatus::Tentative;
        assert_eq!(filter().classify(&e).reason, "unconfirmed attendance");

        e.attendees[0].response_status = ResponseStatus::NoResponse;
        assert_eq!(filter().classify(&e).tier, Tier::LinkOnly);
    }

    #[test]
    fn override_replaces_judgment_rules() {
        let mut e = event("Team Sync");
        e.attendees[0].response_status = ResponseStatus::Tentative;
        let decision = filter().classify_with(&e, Some(Tier::FullDocument));
        assert_eq!(decision.tier, Tier::FullDocument);
        assert_eq!(decision.reason, "manual override");

        let decision = filter().classify_with(&event("Team Sync"), Some(Tier::Skip));
        assert_eq!(decision.tier, Tier::Skip);
    }

    #[test]
    fn classification_is_deterministic() {
        let mut e = event("All Hands");
        e.attendees = crowd(40);
        let f = filter();
        assert_eq!(f.classify(&e), f.classify(&e));
    }

    #[test]
    fn empty_keyword_lists_never_match() {
        let config = FilterConfig {
            broadcast_keywords: vec![],
            personal_keywords: vec![" ".into()],
            large_group_threshold: 15,
            size_rule_first: false,
        };
        let filter = EventFilter::new(&config, None).unwrap();
        assert_eq!(filter.classify(&event("All Hands lunch")).tier, Tier::FullDocument);
    }

    #[test]
    fn overrides_parse_from_json() {
        let overrides: DecisionOverrides =
            serde_json::from_str(r#"{"a": "skip", "b": "link", "c": "full-document"}"#).unwrap();
        assert_eq!(overrides.get("a"), Some(Tier::Skip));
        assert_eq!(overrides.get("b"), Some(Tier::LinkOnly));
        assert_eq!(overrides.get("c"), Some(Tier::FullDocument));
        assert_eq!(overrides.get("d"), None);
    }
}
