//! Idempotent three-way merge of computed content into a note.
//!
//! Fields are fill-only unless declared live. Sections are either
//! system-owned (replaced wholesale) or user-owned (appended to, never
//! rewritten). Merging the same inputs twice leaves the document unchanged.

use tracing::debug;

use super::body::{Section, is_fence, is_heading};
use super::frontmatter::{FieldValue, Fields};
use super::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldMode {
    /// Set only when absent or empty.
    Fill,
    /// Always refreshed from the source.
    Live,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: String,
    pub mode: FieldMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// Regenerated on every run.
    System,
    /// Append-only from the merger's point of view.
    User,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSpec {
    pub title: String,
    pub ownership: Ownership,
    pub level: usize,
}

/// Which fields are live and who owns which sections. Undeclared fields are
/// fill-only; undeclared sections are user-owned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    pub fields: Vec<FieldSpec>,
    pub sections: Vec<SectionSpec>,
}

impl Schema {
    pub fn field(mut self, key: &str, mode: FieldMode) -> Self {
        self.fields.push(FieldSpec {
            key: key.to_string(),
            mode,
        });
        self
    }

    pub fn section(mut self, title: &str, ownership: Ownership, level: usize) -> Self {
        self.sections.push(SectionSpec {
            title: title.to_string(),
            ownership,
            level,
        });
        self
    }

    fn field_mode(&self, key: &str) -> FieldMode {
        self.fields
            .iter()
            .find(|f| f.key == key)
            .map(|f| f.mode)
            .unwrap_or(FieldMode::Fill)
    }

    fn section_spec(&self, title: &str) -> Option<&SectionSpec> {
        self.sections
            .iter()
            .find(|s| s.title.eq_ignore_ascii_case(title.trim()))
    }
}

/// Computed text for one named section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputedSection {
    pub title: String,
    pub content: String,
}

impl ComputedSection {
    pub fn new(title: &str, content: impl Into<String>) -> Self {
        ComputedSection {
            title: title.to_string(),
            content: content.into(),
        }
    }
}

pub struct DocumentMerger<'a> {
    schema: &'a Schema,
}

impl<'a> DocumentMerger<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        DocumentMerger { schema }
    }

    /// Merge computed fields and sections into `existing`, or into a copy of
    /// `template` when there is no existing document.
    pub fn merge(
        &self,
        existing: Option<Document>,
        template: &Document,
        fields: &Fields,
        sections: &[ComputedSection],
    ) -> Document {
        let is_new = existing.is_none();
        let mut document = existing.unwrap_or_else(|| template.clone());

        for (key, value) in fields.iter() {
            // A new document takes every computed value as a fill
            let mode = if is_new {
                FieldMode::Fill
            } else {
                self.schema.field_mode(key)
            };
            merge_field(&mut document.fields, key, value, mode);
        }

        for computed in sections {
            let (ownership, level) = self
                .schema
                .section_spec(&computed.title)
                .map(|spec| (spec.ownership, spec.level))
                .unwrap_or((Ownership::User, 2));
            merge_section(&mut document, computed, ownership, level);
        }

        document
    }
}

fn merge_field(fields: &mut Fields, key: &str, value: &FieldValue, mode: FieldMode) {
    if value.is_empty() {
        return;
    }

    let current = fields.get(key);
    let should_set = match mode {
        FieldMode::Live => current != Some(value),
        FieldMode::Fill => current.is_none_or(FieldValue::is_empty),
    };

    if should_set {
        debug!(key, ?mode, "Setting field");
        fields.set(key, value.clone());
    }
}

fn merge_section(document: &mut Document, computed: &ComputedSection, ownership: Ownership, level: usize) {
    let text = contained(computed.content.trim());
    let text = text.as_str();

    match (document.body.section_mut(&computed.title), ownership) {
        (Some(section), Ownership::System) => {
            let replacement = block(text);
            if section.content != replacement {
                debug!(section = %computed.title, "Regenerating system section");
                section.content = replacement;
            }
        }
        (Some(section), Ownership::User) => {
            if text.is_empty() || section.content.contains(text) {
                return;
            }
            debug!(section = %computed.title, "Appending to user section");
            section.content = append_below(&section.content, text);
        }
        (None, _) => {
            if text.is_empty() {
                return;
            }
            debug!(section = %computed.title, "Adding missing section");
            document
                .body
                .push_section(Section::new(level, &computed.title, block(text)));
        }
    }
}

/// `text` rewritten so it parses back as part of a single section: lines
/// that would start a heading are escaped and an unclosed fence is closed.
fn contained(text: &str) -> String {
    let mut in_fence = false;
    let mut lines = Vec::new();

    for line in text.lines() {
        if is_fence(line) {
            in_fence = !in_fence;
        }
        if !in_fence && is_heading(line) {
            lines.push(format!("\\{}", line));
        } else {
            lines.push(line.to_string());
        }
    }
    if in_fence {
        lines.push("```".to_string());
    }

    lines.join("\n")
}

fn block(text: &str) -> String {
    if text.is_empty() {
        "\n\n".to_string()
    } else {
        format!("\n\n{}\n\n", text)
    }
}

/// `existing` with `text` added after its last non-blank line. The trailing
/// whitespace of `existing` moves below the new text, so nothing is removed.
fn append_below(existing: &str, text: &str) -> String {
    let kept = existing.trim_end();
    let tail = &existing[kept.len()..];
    let tail = if tail.is_empty() { "\n" } else { tail };

    if kept.is_empty() {
        // Only the heading's own newline and blank lines so far
        format!("{}{}{}", "\n\n", text, tail)
    } else {
        format!("{}\n\n{}{}", kept, text, tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Body;

    fn schema() -> Schema {
        Schema::default()
            .field("gmeet", FieldMode::Live)
            .field("agenda", FieldMode::Fill)
            .section("Agenda", Ownership::User, 2)
            .section("Calendar Attachments", Ownership::System, 2)
    }

    fn template() -> Document {
        Document::new(Fields::new(), Body::parse("## Actions\n\n\n## Agenda\n\n"))
    }

    fn existing(text: &str) -> Document {
        Document::parse(text).unwrap()
    }

    #[test]
    fn fill_only_keeps_existing_value() {
        let schema = schema();
        let merger = DocumentMerger::new(&schema);
        let doc = existing("---\nagenda: X\ngmeet: old\n---\n");
        let fields = Fields::new().with("agenda", "Y").with("gmeet", "new");

        let merged = merger.merge(Some(doc), &template(), &fields, &[]);
        assert_eq!(merged.fields.get("agenda"), Some(&FieldValue::Text("X".into())));
        assert_eq!(merged.fields.get("gmeet"), Some(&FieldValue::Text("new".into())));
    }

    #[test]
    fn fill_only_fills_empty_value() {
        let schema = schema();
        let merger = DocumentMerger::new(&schema);
        let doc = existing("---\nagenda:\n---\n");
        let fields = Fields::new().with("agenda", "Y").with("minutes", "M");

        let merged = merger.merge(Some(doc), &template(), &fields, &[]);
        assert_eq!(merged.fields.get("agenda"), Some(&FieldValue::Text("Y".into())));
        assert_eq!(merged.fields.get("minutes"), Some(&FieldValue::Text("M".into())));
    }

    #[test]
    fn empty_computed_value_never_clears_live_field() {
        let schema = schema();
        let merger = DocumentMerger::new(&schema);
        let doc = existing("---\ngmeet: old\n---\n");
        let fields = Fields::new().with("gmeet", "");

        let merged = merger.merge(Some(doc), &template(), &fields, &[]);
        assert_eq!(merged.fields.get("gmeet"), Some(&FieldValue::Text("old".into())));
    }

    #[test]
    fn new_document_starts_from_template() {
        let schema = schema();
        let merger = DocumentMerger::new(&schema);
        let fields = Fields::new().with("gmeet", "https://meet");
        let sections = [ComputedSection::new("Agenda", "Discuss roadmap")];

        let merged = merger.merge(None, &template(), &fields, &sections);
        assert_eq!(
            merged.render(),
            "---\ngmeet: https://meet\n---\n## Actions\n\n\n## Agenda\n\nDiscuss roadmap\n\n"
        );
    }

    #[test]
    fn user_section_text_is_preserved_and_appended_once() {
        let schema = schema();
        let merger = DocumentMerger::new(&schema);
        let doc = existing("---\n---\n## Agenda\n\nMy own notes\n- point\n\n## Actions\n- [ ] x\n");
        let sections = [ComputedSection::new("Agenda", "Calendar description")];

        let once = merger.merge(Some(doc), &template(), &Fields::new(), &sections);
        let agenda = &once.body.section("Agenda").unwrap().content;
        assert!(agenda.contains("My own notes\n- point"));
        assert_eq!(agenda, "\n\nMy own notes\n- point\n\nCalendar description\n\n");

        let twice = merger.merge(Some(once.clone()), &template(), &Fields::new(), &sections);
        assert_eq!(twice, once);
    }

    #[test]
    fn user_section_never_shrinks() {
        let schema = schema();
        let merger = DocumentMerger::new(&schema);
        let original = "\n\nkeep me   \n\n\n";
        let mut doc = template();
        doc.body.section_mut("Agenda").unwrap().content = original.to_string();

        let merged = merger.merge(
            Some(doc),
            &template(),
            &Fields::new(),
            &[ComputedSection::new("Agenda", "new text")],
        );
        let content = &merged.body.section("Agenda").unwrap().content;
        assert!(content.len() >= original.len());
        assert!(content.contains("keep me"));
    }

    #[test]
    fn system_section_is_replaced() {
        let schema = schema();
        let merger = DocumentMerger::new(&schema);
        let doc = existing("## Agenda\n\n## Calendar Attachments\n\n- stale link\n");
        let sections = [ComputedSection::new("Calendar Attachments", "- agenda: [Doc](https://d)")];

        let merged = merger.merge(Some(doc), &template(), &Fields::new(), &sections);
        assert_eq!(
            merged.body.section("Calendar Attachments").unwrap().content,
            "\n\n- agenda: [Doc](https://d)\n\n"
        );
    }

    #[test]
    fn missing_section_is_appended_only_with_content() {
        let schema = schema();
        let merger = DocumentMerger::new(&schema);
        let doc = existing("## Agenda\n");

        let merged = merger.merge(
            Some(doc.clone()),
            &template(),
            &Fields::new(),
            &[ComputedSection::new("Calendar Attachments", "")],
        );
        assert_eq!(merged, doc);

        let merged = merger.merge(
            Some(doc),
            &template(),
            &Fields::new(),
            &[ComputedSection::new("Calendar Attachments", "- x")],
        );
        assert_eq!(merged.render(), "## Agenda\n\n## Calendar Attachments\n\n- x\n\n");
    }

    #[test]
    fn headings_in_computed_text_stay_inside_the_section() {
        let schema = schema();
        let merger = DocumentMerger::new(&schema);
        let sections = [ComputedSection::new("Agenda", "Intro\n## Topics\n- roadmap")];

        let first = merger.merge(None, &template(), &Fields::new(), &sections).render();
        let mut text = first.clone();
        for _ in 0..2 {
            let merged = merger.merge(Some(existing(&text)), &template(), &Fields::new(), &sections);
            text = merged.render();
        }

        assert_eq!(text, first);
        assert_eq!(
            text,
            "---\n---\n## Actions\n\n\n## Agenda\n\nIntro\n\\## Topics\n- roadmap\n\n"
        );
        assert_eq!(existing(&text).body.sections.len(), 2);
    }

    #[test]
    fn unclosed_fence_in_computed_text_is_closed() {
        let schema = schema();
        let merger = DocumentMerger::new(&schema);
        let doc = existing("## Agenda\n\n## Actions\n- [ ] x\n");
        let sections = [ComputedSection::new("Agenda", "```\n# shell prompt")];

        let text = merger.merge(Some(doc), &template(), &Fields::new(), &sections).render();
        let reparsed = existing(&text);

        assert!(reparsed.body.section("Actions").is_some());
        assert_eq!(
            reparsed.body.section("Agenda").unwrap().content,
            "\n\n```\n# shell prompt\n```\n\n"
        );
        let again = merger.merge(Some(reparsed.clone()), &template(), &Fields::new(), &sections);
        assert_eq!(again, reparsed);
    }

    #[test]
    fn merge_is_idempotent() {
        let schema = schema();
        let merger = DocumentMerger::new(&schema);
        let fields = Fields::new()
            .with("gmeet", "https://meet")
            .with("agenda", "https://doc")
            .with("attendees", vec!["[[A]]".to_string()]);
        let sections = [
            ComputedSection::new("Agenda", "Description"),
            ComputedSection::new("Calendar Attachments", "- agenda: [Doc](https://doc)"),
        ];

        let first = merger.merge(None, &template(), &fields, &sections);
        let second = merger.merge(Some(first.clone()), &template(), &fields, &sections);
        assert_eq!(second.render(), first.render());
    }
}
