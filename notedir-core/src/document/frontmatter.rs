//! YAML frontmatter as an ordered key → value list.
//!
//! Only the shapes notes actually use are supported: scalars and lists of
//! scalars. Anything nested is rejected so that a document we cannot
//! represent faithfully is never rewritten.
//!
//! Parsed entries remember their source lines, including comments above
//! them. An entry whose value is not changed renders exactly as it was read,
//! so `1e3`, `True` or a trailing `# comment` survive a rewrite.

use serde_yaml::Value;

/// A frontmatter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::List(items) => items.iter().all(|i| i.trim().is_empty()),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::List(_) => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        FieldValue::List(items)
    }
}

#[derive(Debug, Clone)]
struct Entry {
    key: String,
    value: FieldValue,
    /// Comment and blank lines directly above the key
    leading: String,
    /// The key's own source lines, while `value` is unchanged
    raw: Option<String>,
}

impl Entry {
    fn new(key: &str, value: FieldValue) -> Self {
        Entry {
            key: key.to_string(),
            value,
            leading: String::new(),
            raw: None,
        }
    }
}

/// Ordered frontmatter fields. Keys keep the order they were read or added in.
///
/// Equality compares keys and values only, not source formatting.
#[derive(Debug, Clone, Default)]
pub struct Fields {
    entries: Vec<Entry>,
    /// Comment and blank lines after the last key
    trailer: String,
}

impl PartialEq for Fields {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(&other.entries)
                .all(|(a, b)| a.key == b.key && a.value == b.value)
    }
}

impl Eq for Fields {}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.entries.iter().find(|e| e.key == key).map(|e| &e.value)
    }

    /// Replace `key` in place, or append it.
    pub fn set(&mut self, key: &str, value: impl Into<FieldValue>) {
        let value = value.into();
        match self.entries.iter_mut().find(|e| e.key == key) {
            Some(entry) if entry.value == value => {}
            Some(entry) => {
                entry.value = value;
                entry.raw = None;
            }
            None => self.entries.push(Entry::new(key, value)),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<FieldValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|e| (e.key.as_str(), &e.value))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse the YAML between the `---` delimiters.
    pub fn parse(yaml: &str) -> Result<Self, String> {
        let value: Value = serde_yaml::from_str(yaml).map_err(|e| e.to_string())?;

        let mapping = match value {
            // Empty, or nothing but comments
            Value::Null => {
                return Ok(Fields {
                    entries: Vec::new(),
                    trailer: yaml.to_string(),
                });
            }
            Value::Mapping(mapping) => mapping,
            _ => return Err("frontmatter is not a key/value mapping".into()),
        };

        let mut fields = Fields::new();
        for (key, value) in mapping {
            let key = scalar_to_string(&key)
                .ok_or_else(|| "frontmatter key is not a scalar".to_string())?;
            let value = match value {
                Value::Sequence(items) => FieldValue::List(
                    items
                        .iter()
                        .map(|item| {
                            scalar_to_string(item).ok_or_else(|| {
                                format!("unsupported nested value in list '{}'", key)
                            })
                        })
                        .collect::<Result<_, _>>()?,
                ),
                other => FieldValue::Text(
                    scalar_to_string(&other)
                        .ok_or_else(|| format!("unsupported nested value for '{}'", key))?,
                ),
            };
            fields.entries.push(Entry::new(&key, value));
        }

        fields.attach_source(yaml);
        Ok(fields)
    }

    /// Split `yaml` into one block per top-level key and keep each block on
    /// its entry. When the blocks cannot be matched to the parsed keys one to
    /// one, nothing is kept and rendering falls back to generated YAML.
    fn attach_source(&mut self, yaml: &str) {
        let mut blocks: Vec<(String, String)> = Vec::new();
        let mut pending = String::new();

        for line in yaml.split_inclusive('\n') {
            let content = line.trim_end();
            let is_filler = content.trim_start().is_empty() || content.trim_start().starts_with('#');
            let starts_key = !is_filler
                && !line.starts_with([' ', '\t', '-'])
                && content.contains(':');

            if starts_key {
                blocks.push((std::mem::take(&mut pending), line.to_string()));
            } else if is_filler {
                pending.push_str(line);
            } else {
                match blocks.last_mut() {
                    Some((_, raw)) => {
                        raw.push_str(&std::mem::take(&mut pending));
                        raw.push_str(line);
                    }
                    None => return,
                }
            }
        }

        let matches = blocks.len() == self.entries.len()
            && blocks.iter().zip(&self.entries).all(|((_, raw), entry)| {
                raw.trim_start_matches(['"', '\''])
                    .starts_with(entry.key.as_str())
            });
        if !matches {
            return;
        }

        for ((leading, raw), entry) in blocks.into_iter().zip(self.entries.iter_mut()) {
            entry.leading = leading;
            entry.raw = Some(if raw.ends_with('\n') { raw } else { raw + "\n" });
        }
        self.trailer = pending;
    }

    /// Render as block-style YAML, one key per line, newline-terminated.
    pub fn render(&self) -> String {
        let mut out = String::new();

        for entry in &self.entries {
            out.push_str(&entry.leading);
            if let Some(raw) = &entry.raw {
                out.push_str(raw);
                continue;
            }

            let key = render_scalar(&entry.key);
            match &entry.value {
                FieldValue::Text(s) if s.is_empty() => out.push_str(&format!("{}:\n", key)),
                FieldValue::Text(s) => out.push_str(&format!("{}: {}\n", key, render_scalar(s))),
                FieldValue::List(items) if items.is_empty() => {
                    out.push_str(&format!("{}: []\n", key))
                }
                FieldValue::List(items) => {
                    out.push_str(&format!("{}:\n", key));
                    for item in items {
                        out.push_str(&format!("  - {}\n", render_scalar(item)));
                    }
                }
            }
        }

        out.push_str(&self.trailer);
        out
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => None,
    }
}

/// Emit `s` plain when YAML would read it back as the same text, double-quoted
/// otherwise. Numbers and booleans stay plain so user-typed values keep their type.
fn render_scalar(s: &str) -> String {
    let plain_roundtrips = !s.is_empty()
        && !s.contains('\n')
        && s.trim() == s
        && match serde_yaml::from_str::<Value>(s) {
            Ok(parsed @ (Value::String(_) | Value::Number(_) | Value::Bool(_))) => {
                scalar_to_string(&parsed).as_deref() == Some(s)
            }
            _ => false,
        };

    if plain_roundtrips {
        s.to_string()
    } else {
        // A JSON string literal is a valid YAML double-quoted scalar
        serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scalars_and_lists_in_order() {
        let fields = Fields::parse(
            "attendees:\n  - \"[[Alice]]\"\n  - \"[[Bob]]\"\ntags:\n  - Meetings\ncreated: 2026-02-26 10:00\ngmeet:\n",
        )
        .unwrap();

        let keys: Vec<_> = fields.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["attendees", "tags", "created", "gmeet"]);
        assert_eq!(
            fields.get("attendees"),
            Some(&FieldValue::List(vec!["[[Alice]]".into(), "[[Bob]]".into()]))
        );
        assert_eq!(fields.get("created"), Some(&FieldValue::Text("2026-02-26 10:00".into())));
        assert!(fields.get("gmeet").unwrap().is_empty());
    }

    #[test]
    fn render_quotes_only_when_needed() {
        let fields = Fields::new()
            .with("attendees", vec!["[[Alice]]".to_string()])
            .with("gmeet", "https://meet.google.com/abc-defg-hij")
            .with("start", "2026-02-26T10:00:00-05:00")
            .with("count", "12")
            .with("note", "a: b")
            .with("agenda", "");

        assert_eq!(
            fields.render(),
            "attendees:\n  - \"[[Alice]]\"\n\
             gmeet: https://meet.google.com/abc-defg-hij\n\
             start: 2026-02-26T10:00:00-05:00\n\
             count: 12\n\
             note: \"a: b\"\n\
             agenda:\n"
        );
    }

    #[test]
    fn render_then_parse_is_stable() {
        let fields = Fields::new()
            .with("title", "Q3: planning #1")
            .with("tags", vec!["Meetings".to_string(), "yes".to_string()])
            .with("empty", Vec::<String>::new());
        let reparsed = Fields::parse(&fields.render()).unwrap();
        assert_eq!(reparsed, fields);
    }

    #[test]
    fn nested_mapping_is_rejected() {
        assert!(Fields::parse("meta:\n  owner: me\n").is_err());
        assert!(Fields::parse("- just\n- a list\n").is_err());
    }

    #[test]
    fn invalid_yaml_is_rejected() {
        assert!(Fields::parse("key: [unclosed\n").is_err());
    }

    #[test]
    fn untouched_entries_keep_their_source_text() {
        let yaml = "# synced by notedir\nweight: 1e3\nreviewed: True  # by hand\ngmeet: old\ntags:\n- a\n\n- b\n# end\n";
        let mut fields = Fields::parse(yaml).unwrap();
        assert_eq!(fields.render(), yaml);

        let weight = fields.get("weight").cloned().unwrap();
        fields.set("weight", weight);
        fields.set("gmeet", "https://meet.google.com/new");
        assert_eq!(
            fields.render(),
            "# synced by notedir\nweight: 1e3\nreviewed: True  # by hand\ngmeet: https://meet.google.com/new\ntags:\n- a\n\n- b\n# end\n"
        );
    }

    #[test]
    fn comment_only_frontmatter_is_kept() {
        let fields = Fields::parse("# nothing yet\n").unwrap();
        assert!(fields.is_empty());
        assert_eq!(fields.render(), "# nothing yet\n");
    }

    #[test]
    fn set_replaces_in_place() {
        let mut fields = Fields::new().with("a", "1").with("b", "2");
        fields.set("a", "3");
        let rendered = fields.render();
        assert!(rendered.starts_with("a: 3\n"));
    }
}
