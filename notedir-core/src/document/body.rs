//! Markdown body split into heading-delimited sections.
//!
//! Parsing is lossless: `Body::parse(s).render() == s` for any input.

/// A heading and everything up to the next heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// The heading line without its newline, e.g. `## Agenda`
    pub heading: String,
    /// Text after the heading line, starting with its newline
    pub content: String,
}

impl Section {
    pub fn new(level: usize, title: &str, content: impl Into<String>) -> Self {
        Section {
            heading: format!("{} {}", "#".repeat(level.clamp(1, 6)), title),
            content: content.into(),
        }
    }

    pub fn title(&self) -> &str {
        self.heading.trim_start_matches('#').trim()
    }

    pub fn level(&self) -> usize {
        self.heading.chars().take_while(|c| *c == '#').count()
    }

    fn matches(&self, title: &str) -> bool {
        self.title().to_lowercase() == title.trim().to_lowercase()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Body {
    /// Text before the first heading
    pub preamble: String,
    pub sections: Vec<Section>,
}

impl Body {
    pub fn parse(text: &str) -> Self {
        let mut body = Body::default();
        let mut current: Option<Section> = None;
        let mut in_fence = false;

        for line in text.split_inclusive('\n') {
            if is_fence(line) {
                in_fence = !in_fence;
            }

            if !in_fence && is_heading(line) {
                if let Some(section) = current.take() {
                    body.sections.push(section);
                }
                let (heading, newline) = match line.strip_suffix('\n') {
                    Some(h) => (h, "\n"),
                    None => (line, ""),
                };
                current = Some(Section {
                    heading: heading.to_string(),
                    content: newline.to_string(),
                });
                continue;
            }

            match current.as_mut() {
                Some(section) => section.content.push_str(line),
                None => body.preamble.push_str(line),
            }
        }

        if let Some(section) = current {
            body.sections.push(section);
        }

        body
    }

    pub fn render(&self) -> String {
        let mut out = self.preamble.clone();
        for section in &self.sections {
            out.push_str(&section.heading);
            out.push_str(&section.content);
        }
        out
    }

    pub fn section(&self, title: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.matches(title))
    }

    pub fn section_mut(&mut self, title: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.matches(title))
    }

    /// Append a section at the end, separated from preceding text by a blank line.
    pub fn push_section(&mut self, section: Section) {
        let has_sections = !self.sections.is_empty();
        let tail = match self.sections.last_mut() {
            Some(last) => &mut last.content,
            None => &mut self.preamble,
        };

        if has_sections || !tail.trim().is_empty() {
            let trailing_newlines = tail.len() - tail.trim_end_matches('\n').len();
            for _ in trailing_newlines..2 {
                tail.push('\n');
            }
        }

        self.sections.push(section);
    }
}

pub(super) fn is_fence(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("```") || trimmed.starts_with("~~~")
}

pub(super) fn is_heading(line: &str) -> bool {
    let hashes = line.chars().take_while(|c| *c == '#').count();
    if hashes == 0 || hashes > 6 {
        return false;
    }
    matches!(line[hashes..].chars().next(), None | Some(' ' | '\t' | '\n' | '\r'))
}
