//! Markdown notes with YAML frontmatter.

mod body;
mod frontmatter;
mod merge;

pub use body::{Body, Section};
pub use frontmatter::{FieldValue, Fields};
pub use merge::{
    ComputedSection, DocumentMerger, FieldMode, FieldSpec, Ownership, Schema, SectionSpec,
};

/// A note: structured fields plus a sectioned body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub fields: Fields,
    pub body: Body,
    has_frontmatter: bool,
}

impl Document {
    pub fn new(fields: Fields, body: Body) -> Self {
        Document {
            fields,
            body,
            has_frontmatter: true,
        }
    }

    /// Parse a note. Fails when the frontmatter block is unterminated or is
    /// not a flat key/value mapping.
    pub fn parse(text: &str) -> Result<Self, String> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        let Some(after_open) = strip_delimiter_line(text) else {
            return Ok(Document {
                fields: Fields::new(),
                body: Body::parse(text),
                has_frontmatter: false,
            });
        };

        let mut offset = 0;
        for line in after_open.split_inclusive('\n') {
            if line.trim_end() == "---" {
                let yaml = &after_open[..offset];
                let rest = &after_open[offset + line.len()..];
                return Ok(Document {
                    fields: Fields::parse(yaml)?,
                    body: Body::parse(rest),
                    has_frontmatter: true,
                });
            }
            offset += line.len();
        }

        Err("frontmatter has no closing '---'".into())
    }

    pub fn render(&self) -> String {
        if !self.has_frontmatter && self.fields.is_empty() {
            return self.body.render();
        }
        format!("---\n{}---\n{}", self.fields.render(), self.body.render())
    }
}

/// `text` minus its first line when that line is exactly `---`.
fn strip_delimiter_line(text: &str) -> Option<&str> {
    let (first, rest) = match text.find('\n') {
        Some(idx) => (&text[..idx], &text[idx + 1..]),
        None => return None,
    };
    (first.trim_end() == "---").then_some(rest)
}

/// Make an event title safe to use as a file name.
///
/// `/`, `:` and `|` become ` - `. Characters that are invalid in file names
/// or that end a wikilink early (`#`, `^`, `[`, `]`) are dropped, and runs
/// of whitespace collapse to one space. The result depends only on the
/// input, so a title always maps to the same key and links to it verbatim.
pub fn sanitize_title(title: &str) -> String {
    let replaced: String = title
        .chars()
        .flat_map(|c| match c {
            '/' | ':' | '|' => " - ".chars().collect::<Vec<_>>(),
            '<' | '>' | '"' | '\\' | '?' | '*' | '#' | '^' | '[' | ']' => vec![],
            c if c.is_control() => vec![' '],
            c => vec![c],
        })
        .collect();

    let collapsed = replaced.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed.trim_matches(|c: char| c == '.' || c.is_whitespace());

    if trimmed.is_empty() {
        "Untitled".to_string()
    } else {
        trimmed.to_string()
    }
}
