use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, warn};

use super::{Directory, LookupError, PeopleIndex, PersonReference, ResolvedBy};
use crate::event::Attendee;

/// Resolves attendees to person references: local email, local name, then
/// the external directory, then the calendar's display name.
pub struct AttendeeResolver<'a, D: Directory> {
    people: &'a PeopleIndex,
    directory: &'a D,
    lookup_timeout: Duration,
    /// Directory answers for this run, so each email is queried once.
    cache: Mutex<HashMap<String, Result<String, LookupError>>>,
}

impl<'a, D: Directory> AttendeeResolver<'a, D> {
    pub fn new(people: &'a PeopleIndex, directory: &'a D, lookup_timeout: Duration) -> Self {
        AttendeeResolver {
            people,
            directory,
            lookup_timeout,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Never fails; lookup errors only advance the cascade.
    pub async fn resolve(&self, attendee: &Attendee) -> PersonReference {
        if let Some(name) = self.people.by_email(&attendee.email) {
            debug!(email = %attendee.email, name, "Resolved by email");
            return resolved(name, ResolvedBy::Email);
        }

        if let Some(name) = attendee.display_name.as_deref().and_then(|n| self.people.by_name(n)) {
            debug!(email = %attendee.email, name, "Resolved by name");
            return resolved(name, ResolvedBy::Name);
        }

        if !attendee.email.is_empty() {
            match self.lookup(&attendee.email).await {
                Ok(name) => {
                    debug!(email = %attendee.email, %name, "Resolved by directory");
                    return PersonReference::Resolved {
                        name,
                        by: ResolvedBy::Directory,
                    };
                }
                Err(LookupError::NotFound(_)) => {
                    debug!(email = %attendee.email, "Not in directory");
                }
                Err(error) => {
                    warn!(email = %attendee.email, %error, "Directory lookup failed");
                }
            }
        }

        PersonReference::Unresolved {
            display_name: attendee.label(),
        }
    }

    pub async fn resolve_all(&self, attendees: &[Attendee]) -> Vec<(Attendee, PersonReference)> {
        let mut resolved = Vec::with_capacity(attendees.len());
        for attendee in attendees {
            resolved.push((attendee.clone(), self.resolve(attendee).await));
        }
        resolved
    }

    async fn lookup(&self, email: &str) -> Result<String, LookupError> {
        if let Some(cached) = self.cached(email) {
            return cached;
        }

        let result = match timeout(self.lookup_timeout, self.directory.lookup(email)).await {
            Ok(result) => result,
            Err(_) => Err(LookupError::Timeout(self.lookup_timeout)),
        };

        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(email.to_string(), result.clone());
        }
        result
    }

    fn cached(&self, email: &str) -> Option<Result<String, LookupError>> {
        self.cache.lock().ok()?.get(email).cloned()
    }
}

fn resolved(name: &str, by: ResolvedBy) -> PersonReference {
    PersonReference::Resolved {
        name: name.to_string(),
        by,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::event::ResponseStatus;
    use crate::people::NoDirectory;

    fn attendee(email: &str, name: Option<&str>) -> Attendee {
        Attendee {
            email: email.to_string(),
            display_name: name.map(String::from),
            response_status: ResponseStatus::Accepted,
            is_self: false,
        }
    }

    fn people() -> PeopleIndex {
        PeopleIndex::from_records(vec![
            ("Alice Smith".to_string(), Some("alice@x.com".to_string())),
            ("Bob Jones".to_string(), None),
        ])
    }

    struct FixedDirectory {
        calls: AtomicUsize,
    }

    impl Directory for FixedDirectory {
        async fn lookup(&self, email: &str) -> Result<String, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match email {
                "carol@x.com" => Ok("Carol King".into()),
                other => Err(LookupError::NotFound(other.into())),
            }
        }
    }

    struct HangingDirectory;

    impl Directory for HangingDirectory {
        async fn lookup(&self, _email: &str) -> Result<String, LookupError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn email_match_wins_over_name() {
        let people = people();
        let resolver = AttendeeResolver::new(&people, &NoDirectory, Duration::from_secs(1));
        let reference = resolver
            .resolve(&attendee("alice@x.com", Some("Bob Jones")))
            .await;
        assert_eq!(
            reference,
            PersonReference::Resolved {
                name: "Alice Smith".into(),
                by: ResolvedBy::Email
            }
        );
    }

    #[tokio::test]
    async fn name_match_is_case_insensitive() {
        let people = people();
        let resolver = AttendeeResolver::new(&people, &NoDirectory, Duration::from_secs(1));
        let reference = resolver
            .resolve(&attendee("bjones@other.com", Some("bob JONES")))
            .await;
        assert_eq!(reference.name(), "Bob Jones");
        assert!(reference.is_resolved());
    }

    #[tokio::test]
    async fn directory_is_queried_once_per_email() {
        let people = people();
        let directory = FixedDirectory {
            calls: AtomicUsize::new(0),
        };
        let resolver = AttendeeResolver::new(&people, &directory, Duration::from_secs(1));

        let carol = attendee("carol@x.com", None);
        let first = resolver.resolve(&carol).await;
        let second = resolver.resolve(&carol).await;

        assert_eq!(first.wikilink(), "[[Carol King]]");
        assert_eq!(first, second);
        assert_eq!(directory.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn falls_back_to_display_name() {
        let people = people();
        let directory = FixedDirectory {
            calls: AtomicUsize::new(0),
        };
        let resolver = AttendeeResolver::new(&people, &directory, Duration::from_secs(1));

        let reference = resolver
            .resolve(&attendee("unknown@x.com", Some("Un Known")))
            .await;
        assert_eq!(
            reference,
            PersonReference::Unresolved {
                display_name: "Un Known".into()
            }
        );
    }

    #[tokio::test]
    async fn directory_timeout_advances_cascade() {
        let people = people();
        let resolver = AttendeeResolver::new(&people, &HangingDirectory, Duration::from_millis(20));

        let reference = resolver.resolve(&attendee("unknown@x.com", None)).await;
        assert_eq!(
            reference,
            PersonReference::Unresolved {
                display_name: "unknown".into()
            }
        );
        assert_eq!(
            resolver.cached("unknown@x.com"),
            Some(Err(LookupError::Timeout(Duration::from_millis(20))))
        );
        assert_eq!(
            LookupError::Timeout(Duration::from_millis(20)).to_string(),
            "lookup timed out after 20ms"
        );
    }
}
