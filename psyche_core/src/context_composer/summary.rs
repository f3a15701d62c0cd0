//! The composed summary handed to the text generator.

use serde::{Deserialize, Serialize};

/// What a summary line talks about. Declaration order is priority order:
/// when the budget is tight, later kinds are dropped first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LineKind {
    Conflict,
    Secret,
    Legend,
    Qualia,
    Perception,
    Trait,
}

impl LineKind {
    pub fn label(&self) -> &'static str {
        match self {
            LineKind::Conflict => "conflict",
            LineKind::Secret => "secret",
            LineKind::Legend => "legend",
            LineKind::Qualia => "qualia",
            LineKind::Perception => "perception",
            LineKind::Trait => "trait",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryLine {
    pub kind: LineKind,
    pub text: String,
}

impl SummaryLine {
    pub fn new(kind: LineKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// The line as it appears in the prompt, including the trailing newline.
    pub fn render(&self) -> String {
        format!("[{}] {}\n", self.kind.label(), self.text)
    }

    pub fn rendered_len(&self) -> usize {
        self.kind.label().len() + self.text.len() + 4
    }
}

/// Tagged lines in priority order, plus how many were cut for space.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub lines: Vec<SummaryLine>,
    pub omitted: usize,
}

impl Summary {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines_of(&self, kind: LineKind) -> impl Iterator<Item = &SummaryLine> {
        self.lines.iter().filter(move |l| l.kind == kind)
    }

    /// Total length of the rendered prompt.
    pub fn rendered_len(&self) -> usize {
        self.lines.iter().map(SummaryLine::rendered_len).sum()
    }

    /// Format the summary as a prompt string.
    pub fn to_prompt_string(&self) -> String {
        let mut prompt = String::with_capacity(self.rendered_len());
        for line in &self.lines {
            prompt.push_str(&line.render());
        }
        prompt
    }
}
