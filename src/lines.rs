//! Reconstructed text
//!
//! [`Lines`] is the working buffer that deltas are applied to while a
//! revision is reconstructed. Every [`Line`] remembers the revision that
//! introduced it, which is what annotated output prints next to the text.
//!
//! Two lines are equal when their text is equal, whoever introduced them.
//! The diff engine depends on this to recognise unchanged content.

use crate::node::Revision;
use crate::types::{TreeConfig, DEFAULT_DATE_FORMAT};
use std::fmt::{self, Write as _};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A line of text tagged with the revision that introduced it
#[derive(Debug, Clone)]
pub struct Line {
    revision: Option<Arc<Revision>>,
    text: String,
}

impl Line {
    /// Create a line, optionally attributed to a revision
    pub fn new(revision: Option<Arc<Revision>>, text: impl Into<String>) -> Self {
        Self {
            revision,
            text: text.into(),
        }
    }

    /// The line's text, without terminator
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The revision this line is attributed to
    pub fn revision(&self) -> Option<&Revision> {
        self.revision.as_deref()
    }

    /// Render the line with its revision, author and date in front
    ///
    /// A date format that `chrono` cannot render falls back to the default
    /// layout instead of failing.
    pub fn annotated(&self, config: &TreeConfig) -> String {
        let vw = config.annotation_version_width;
        let aw = config.annotation_author_width;
        match &self.revision {
            Some(rev) => {
                let mut date = String::new();
                if write!(date, "{}", rev.date.format(&config.annotation_date_format)).is_err() {
                    date = rev.date.format(DEFAULT_DATE_FORMAT).to_string();
                }
                format!(
                    "{:<vw$} ({:<aw$} {}): {}",
                    rev.version.to_string(),
                    rev.author,
                    date,
                    self.text,
                )
            }
            None => format!("{:<vw$} ({:<aw$}): {}", "", "", self.text),
        }
    }

    pub(crate) fn attribute(&mut self, revision: Arc<Revision>) {
        self.revision = Some(revision);
    }
}

impl PartialEq for Line {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for Line {}

impl Hash for Line {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// An ordered, mutable sequence of [`Line`]s
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lines {
    lines: Vec<Line>,
}

impl Lines {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Split `text` into lines, all attributed to `revision`
    ///
    /// Lines are separated by `\n`. A final newline does not start an
    /// extra empty line, and carriage returns are kept as part of the text.
    pub fn from_text(text: &str, revision: Option<Arc<Revision>>) -> Self {
        Self {
            lines: split_text(text)
                .into_iter()
                .map(|t| Line::new(revision.clone(), t))
                .collect(),
        }
    }

    /// Number of lines
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether there are no lines
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Line at `index`
    pub fn get(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    /// Append a line
    pub fn push(&mut self, line: Line) {
        self.lines.push(line);
    }

    /// Iterate over the lines
    pub fn iter(&self) -> std::slice::Iter<'_, Line> {
        self.lines.iter()
    }

    /// The lines as a slice
    pub fn as_slice(&self) -> &[Line] {
        &self.lines
    }

    /// Plain text of every line
    pub fn texts(&self) -> Vec<&str> {
        self.lines.iter().map(Line::text).collect()
    }

    /// Every line as a string, annotated or plain, using the default layout
    pub fn to_array(&self, annotate: bool) -> Vec<String> {
        self.to_array_with(&TreeConfig::default(), annotate)
    }

    /// Every line as a string, annotated or plain, using `config`
    pub fn to_array_with(&self, config: &TreeConfig, annotate: bool) -> Vec<String> {
        self.lines
            .iter()
            .map(|line| {
                if annotate {
                    line.annotated(config)
                } else {
                    line.text.clone()
                }
            })
            .collect()
    }

    /// Join every line, each followed by the configured terminator
    pub fn to_string_with(&self, config: &TreeConfig, annotate: bool) -> String {
        let mut out = String::new();
        for line in self.to_array_with(config, annotate) {
            out.push_str(&line);
            out.push_str(&config.eol);
        }
        out
    }

    pub(crate) fn take(&mut self) -> Vec<Line> {
        std::mem::take(&mut self.lines)
    }

    pub(crate) fn replace(&mut self, lines: Vec<Line>) {
        self.lines = lines;
    }

    pub(crate) fn attribute(&mut self, index: usize, revision: Arc<Revision>) {
        if let Some(line) = self.lines.get_mut(index) {
            line.attribute(revision);
        }
    }
}

/// Plain text with every line terminated by `\n`
///
/// Use [`Lines::to_string_with`] for a configured terminator.
impl fmt::Display for Lines {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line.text)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Lines {
    type Item = &'a Line;
    type IntoIter = std::slice::Iter<'a, Line>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}

impl FromIterator<Line> for Lines {
    fn from_iter<I: IntoIterator<Item = Line>>(iter: I) -> Self {
        Self {
            lines: iter.into_iter().collect(),
        }
    }
}

/// Split text on `\n`, dropping the empty remainder after a final newline
pub(crate) fn split_text(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();
    if lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}
