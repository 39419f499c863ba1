//! RCS edit scripts
//!
//! Every node except the head stores its text as an edit script in the
//! classic RCS diff format:
//!
//! ```text
//! d3 2        delete 2 lines starting at line 3
//! a7 1        append 1 line after line 7
//! new text
//! ```
//!
//! Line numbers always refer to the text the script is applied to, counted
//! from 1, and commands appear in increasing line order. `a0 n` inserts at
//! the very beginning.
//!
//! ## Examples
//!
//! ```rust
//! use rcstree::delta::EditScript;
//!
//! let old = ["a", "b", "c"];
//! let new = ["a", "B", "c", "d"];
//!
//! let script = EditScript::compute(&old, &new);
//! assert_eq!(script.to_lines(), vec!["d2 1", "a2 1", "B", "a3 1", "d"]);
//!
//! let applied = script
//!     .apply(old.iter().map(|s| s.to_string()).collect(), |t| t.to_string(), drop)
//!     .unwrap();
//! assert_eq!(applied, new);
//! ```

use crate::error::{RcsError, Result};
use crate::intern::LineInterner;
use std::ops::{Index, IndexMut, Range};
use thiserror::Error;
use tracing::trace;

/// One command of an edit script
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditCommand {
    /// Delete `count` lines starting at line `at` (1-based)
    Delete {
        /// First deleted line
        at: usize,
        /// Number of deleted lines
        count: usize,
    },
    /// Insert `lines` after line `after` (0 inserts at the start)
    Add {
        /// Line the text is appended after
        after: usize,
        /// Inserted text
        lines: Vec<String>,
    },
}

/// An edit script did not fit the text it was applied to
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{command} does not apply to a text of {len} lines (already at line {consumed})")]
pub struct DeltaMismatch {
    /// The offending command, in RCS notation
    pub command: String,
    /// Length of the text being patched
    pub len: usize,
    /// Lines of the original text already consumed by earlier commands
    pub consumed: usize,
}

/// A parsed RCS edit script
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditScript {
    commands: Vec<EditCommand>,
}

impl EditScript {
    /// Parse the stored text of a delta node
    ///
    /// # Errors
    ///
    /// Returns [`RcsError::InvalidFileFormat`] for unknown commands,
    /// malformed numbers, or an `a` command followed by fewer lines than
    /// it announces.
    pub fn parse(text: &[String]) -> Result<Self> {
        let mut commands = Vec::new();
        let mut rows = text.iter().enumerate();

        while let Some((row, line)) = rows.next() {
            let (action, args) = line.split_at(line.chars().next().map_or(0, char::len_utf8));
            let mut numbers = args.split(' ').map(str::parse::<usize>);
            let (at, count) = match (numbers.next(), numbers.next(), numbers.next()) {
                (Some(Ok(at)), Some(Ok(count)), None) => (at, count),
                _ => {
                    return Err(RcsError::format(format!(
                        "line {}: malformed edit command '{}'",
                        row + 1,
                        line
                    )))
                }
            };

            match action {
                "d" => {
                    if at == 0 {
                        return Err(RcsError::format(format!(
                            "line {}: delete must start at line 1 or later",
                            row + 1
                        )));
                    }
                    commands.push(EditCommand::Delete { at, count });
                }
                "a" => {
                    let mut added = Vec::with_capacity(count.min(text.len()));
                    for _ in 0..count {
                        match rows.next() {
                            Some((_, text)) => added.push(text.clone()),
                            None => {
                                return Err(RcsError::format(format!(
                                    "line {}: 'a{} {}' announces more lines than the delta holds",
                                    row + 1,
                                    at,
                                    count
                                )))
                            }
                        }
                    }
                    commands.push(EditCommand::Add { after: at, lines: added });
                }
                _ => {
                    return Err(RcsError::format(format!(
                        "line {}: unknown edit command '{}'",
                        row + 1,
                        line
                    )))
                }
            }
        }

        Ok(Self { commands })
    }

    /// Compute the script that turns `old` into `new`
    ///
    /// Lines are interned and matched with Myers' algorithm, so the work
    /// grows with the size of the difference rather than the product of the
    /// two lengths, and memory stays linear.
    pub fn compute(old: &[&str], new: &[&str]) -> Self {
        let mut interner = LineInterner::new();
        let old_ids = interner.intern_all(old);
        let new_ids = interner.intern_all(new);
        trace!(
            "Diffing {} against {} lines ({} distinct)",
            old.len(),
            new.len(),
            interner.distinct()
        );

        let matches = Myers::matches(&old_ids, &new_ids);
        let changes = lcs_to_changes(&matches, old.len(), new.len());

        Self {
            commands: changes_to_commands(&changes, new),
        }
    }

    /// The commands of this script
    pub fn commands(&self) -> &[EditCommand] {
        &self.commands
    }

    /// Whether the script leaves its input unchanged
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Render the script in RCS notation
    pub fn to_lines(&self) -> Vec<String> {
        let mut out = Vec::new();
        for command in &self.commands {
            match command {
                EditCommand::Delete { at, count } => out.push(format!("d{} {}", at, count)),
                EditCommand::Add { after, lines } => {
                    out.push(format!("a{} {}", after, lines.len()));
                    out.extend(lines.iter().cloned());
                }
            }
        }
        out
    }

    /// Apply the script to `original`
    ///
    /// `on_add` builds an element for every inserted line and `on_delete`
    /// receives every element the script removes, which lets callers track
    /// line identity through the edit.
    ///
    /// # Errors
    ///
    /// Returns [`DeltaMismatch`] when a command points outside the text or
    /// behind a position an earlier command already consumed. The input is
    /// consumed either way.
    pub fn apply<T>(
        &self,
        original: Vec<T>,
        mut on_add: impl FnMut(&str) -> T,
        mut on_delete: impl FnMut(T),
    ) -> std::result::Result<Vec<T>, DeltaMismatch> {
        let len = original.len();
        let mut out = Vec::with_capacity(len);
        let mut source = original.into_iter();
        let mut consumed = 0usize;

        for command in &self.commands {
            match command {
                EditCommand::Delete { at, count } => {
                    let start = match at.checked_sub(1) {
                        Some(start)
                            if start >= consumed
                                && start.checked_add(*count).is_some_and(|end| end <= len) =>
                        {
                            start
                        }
                        _ => return Err(mismatch(command, len, consumed)),
                    };
                    out.extend(source.by_ref().take(start - consumed));
                    source.by_ref().take(*count).for_each(&mut on_delete);
                    consumed = start + count;
                }
                EditCommand::Add { after, lines } => {
                    if *after < consumed || *after > len {
                        return Err(mismatch(command, len, consumed));
                    }
                    out.extend(source.by_ref().take(after - consumed));
                    out.extend(lines.iter().map(|line| on_add(line.as_str())));
                    consumed = *after;
                }
            }
        }

        out.extend(source);
        Ok(out)
    }
}

fn mismatch(command: &EditCommand, len: usize, consumed: usize) -> DeltaMismatch {
    let command = match command {
        EditCommand::Delete { at, count } => format!("d{} {}", at, count),
        EditCommand::Add { after, lines } => format!("a{} {}", after, lines.len()),
    };
    DeltaMismatch { command, len, consumed }
}

/// Represents a change operation in the diff
#[derive(Debug, Clone, Copy)]
enum ChangeOp {
    Keep,
    Delete(usize), // old_line_idx
    Insert(usize), // new_line_idx
}

/// Diagonal-indexed furthest-reaching `x` values of the edit graph
struct V {
    offset: isize,
    v: Vec<isize>,
}

impl V {
    fn new(max_d: usize) -> Self {
        Self {
            offset: max_d as isize,
            v: vec![0; 2 * max_d + 1],
        }
    }
}

impl Index<isize> for V {
    type Output = isize;

    fn index(&self, k: isize) -> &isize {
        &self.v[(k + self.offset) as usize]
    }
}

impl IndexMut<isize> for V {
    fn index_mut(&mut self, k: isize) -> &mut isize {
        &mut self.v[(k + self.offset) as usize]
    }
}

fn max_d(old_len: usize, new_len: usize) -> usize {
    (old_len + new_len + 1) / 2 + 1
}

fn common_prefix(old: &[u32], new: &[u32]) -> usize {
    old.iter().zip(new).take_while(|(a, b)| a == b).count()
}

fn common_suffix(old: &[u32], new: &[u32]) -> usize {
    old.iter()
        .rev()
        .zip(new.iter().rev())
        .take_while(|(a, b)| a == b)
        .count()
}

/// Linear-space Myers diff over interned lines
///
/// Finds the middle snake of the edit graph by running the greedy search
/// from both corners at once, then recurses on the two halves around it.
/// The matched pairs come out in increasing order and form a longest common
/// subsequence.
struct Myers<'a> {
    old: &'a [u32],
    new: &'a [u32],
    forward: V,
    backward: V,
    matches: Vec<(usize, usize)>,
}

impl<'a> Myers<'a> {
    fn matches(old: &'a [u32], new: &'a [u32]) -> Vec<(usize, usize)> {
        let max_d = max_d(old.len(), new.len());
        let mut myers = Self {
            old,
            new,
            forward: V::new(max_d),
            backward: V::new(max_d),
            matches: Vec::new(),
        };
        myers.conquer(0..old.len(), 0..new.len());
        myers.matches
    }

    fn conquer(&mut self, mut old: Range<usize>, mut new: Range<usize>) {
        let prefix = common_prefix(&self.old[old.clone()], &self.new[new.clone()]);
        self.matches
            .extend((0..prefix).map(|i| (old.start + i, new.start + i)));
        old.start += prefix;
        new.start += prefix;

        let suffix = common_suffix(&self.old[old.clone()], &self.new[new.clone()]);
        old.end -= suffix;
        new.end -= suffix;

        if !old.is_empty() && !new.is_empty() {
            if let Some((x, y)) = self.middle_snake(old.clone(), new.clone()) {
                // a split on a corner would not shrink the problem
                let within = (old.start..=old.end).contains(&x) && (new.start..=new.end).contains(&y);
                let shrinks = (x, y) != (old.start, new.start) && (x, y) != (old.end, new.end);
                if within && shrinks {
                    self.conquer(old.start..x, new.start..y);
                    self.conquer(x..old.end, y..new.end);
                }
            }
        }

        self.matches
            .extend((0..suffix).map(|i| (old.end + i, new.end + i)));
    }

    /// Start of the middle snake, in absolute line positions
    fn middle_snake(&mut self, old: Range<usize>, new: Range<usize>) -> Option<(usize, usize)> {
        let n = old.len() as isize;
        let m = new.len() as isize;
        let delta = n - m;
        let odd = delta & 1 == 1;
        self.forward[1] = 0;
        self.backward[1] = 0;

        for d in 0..max_d(old.len(), new.len()) as isize {
            for k in (-d..=d).rev().step_by(2) {
                let mut x = if k == -d || (k != d && self.forward[k - 1] < self.forward[k + 1]) {
                    self.forward[k + 1]
                } else {
                    self.forward[k - 1] + 1
                };
                let y = x - k;
                let (x0, y0) = (x, y);
                if x < n && y < m {
                    x += common_prefix(
                        &self.old[old.start + x as usize..old.end],
                        &self.new[new.start + y as usize..new.end],
                    ) as isize;
                }
                self.forward[k] = x;
                if odd && (k - delta).abs() < d && x + self.backward[delta - k] >= n {
                    return Some((old.start + x0 as usize, new.start + y0 as usize));
                }
            }

            for k in (-d..=d).rev().step_by(2) {
                let mut x = if k == -d || (k != d && self.backward[k - 1] < self.backward[k + 1]) {
                    self.backward[k + 1]
                } else {
                    self.backward[k - 1] + 1
                };
                let mut y = x - k;
                if x < n && y < m {
                    let advance = common_suffix(
                        &self.old[old.start..old.end - x as usize],
                        &self.new[new.start..new.end - y as usize],
                    ) as isize;
                    x += advance;
                    y += advance;
                }
                self.backward[k] = x;
                if !odd && (k - delta).abs() <= d && x + self.forward[delta - k] >= n {
                    return Some((
                        old.end.saturating_sub(x as usize),
                        new.end.saturating_sub(y as usize),
                    ));
                }
            }
        }

        None
    }
}

/// Convert LCS to a sequence of change operations, deletions before insertions
fn lcs_to_changes(lcs: &[(usize, usize)], old_len: usize, new_len: usize) -> Vec<ChangeOp> {
    let mut changes = Vec::with_capacity(old_len + new_len);
    let mut old_idx = 0;
    let mut new_idx = 0;

    for &(lcs_old, lcs_new) in lcs.iter().chain(std::iter::once(&(old_len, new_len))) {
        changes.extend((old_idx..lcs_old).map(ChangeOp::Delete));
        changes.extend((new_idx..lcs_new).map(ChangeOp::Insert));
        if lcs_old < old_len {
            changes.push(ChangeOp::Keep);
        }
        old_idx = lcs_old + 1;
        new_idx = lcs_new + 1;
    }

    changes
}

/// Group consecutive deletions and insertions into RCS commands
fn changes_to_commands(changes: &[ChangeOp], new: &[&str]) -> Vec<EditCommand> {
    let mut commands = Vec::new();
    let mut old_pos = 0; // old lines passed so far
    let mut i = 0;

    while i < changes.len() {
        match changes[i] {
            ChangeOp::Keep => {
                old_pos += 1;
                i += 1;
            }
            ChangeOp::Delete(first) => {
                let mut count = 0;
                while let Some(ChangeOp::Delete(_)) = changes.get(i) {
                    count += 1;
                    i += 1;
                }
                commands.push(EditCommand::Delete {
                    at: first + 1,
                    count,
                });
                old_pos += count;
            }
            ChangeOp::Insert(_) => {
                let mut lines = Vec::new();
                while let Some(ChangeOp::Insert(j)) = changes.get(i) {
                    lines.push(new[*j].to_string());
                    i += 1;
                }
                commands.push(EditCommand::Add { after: old_pos, lines });
            }
        }
    }

    commands
}
