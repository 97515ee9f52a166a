use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::document::{Document, FieldValue};
use crate::error::NoteDirResult;

/// Local person records, keyed by email and by lowercased name.
///
/// A record is a markdown file whose stem is the person's canonical name and
/// whose `mail` (or `email`) field holds their address.
#[derive(Debug, Clone, Default)]
pub struct PeopleIndex {
    by_email: BTreeMap<String, String>,
    by_name: BTreeMap<String, String>,
}

impl PeopleIndex {
    /// Index every `*.md` file directly under `dir`. A missing directory
    /// yields an empty index. A note whose frontmatter cannot be read is
    /// still indexed by name, just without an email.
    pub fn from_dir(dir: &Path) -> NoteDirResult<Self> {
        if !dir.is_dir() {
            debug!(dir = %dir.display(), "No people folder");
            return Ok(PeopleIndex::default());
        }

        let mut records = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let email = match fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|text| Document::parse(&text))
            {
                Ok(doc) => record_email(&doc),
                Err(reason) => {
                    warn!(path = %path.display(), %reason, "Indexing person note by name only");
                    None
                }
            };
            records.push((name.to_string(), email));
        }

        Ok(Self::from_records(records))
    }

    /// Build from `(name, email)` pairs. When two records share an email or
    /// a case-insensitive name, the lexicographically first name wins.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = (String, Option<String>)>,
    {
        let mut records: Vec<_> = records.into_iter().collect();
        records.sort_by(|a, b| a.0.cmp(&b.0));

        let mut index = PeopleIndex::default();
        for (name, email) in records {
            if let Some(email) = email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty()) {
                index.by_email.entry(email).or_insert_with(|| name.clone());
            }
            index
                .by_name
                .entry(name.to_lowercase())
                .or_insert(name);
        }
        index
    }

    pub fn by_email(&self, email: &str) -> Option<&str> {
        self.by_email.get(email.trim()).map(String::as_str)
    }

    pub fn by_name(&self, name: &str) -> Option<&str> {
        self.by_name.get(&name.trim().to_lowercase()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

fn record_email(doc: &Document) -> Option<String> {
    ["mail", "email"].iter().find_map(|key| match doc.fields.get(key)? {
        FieldValue::Text(text) => Some(text.clone()).filter(|t| !t.trim().is_empty()),
        FieldValue::List(items) => items.iter().find(|i| !i.trim().is_empty()).cloned(),
    })
}
