//! Line interning for the diff engine
//!
//! Comparing lines as small integers instead of strings keeps the LCS table
//! cheap. The map is backed by gxhash when the `gxhash` feature is enabled
//! (it needs AES-NI/SSE2), and by the standard hasher otherwise.

#[cfg(feature = "gxhash")]
use gxhash::{HashMap, HashMapExt};

#[cfg(not(feature = "gxhash"))]
use std::collections::HashMap;

/// Assigns a stable id to every distinct line text
pub(crate) struct LineInterner<'a> {
    ids: HashMap<&'a str, u32>,
}

impl<'a> LineInterner<'a> {
    pub(crate) fn new() -> Self {
        Self { ids: HashMap::new() }
    }

    /// Id of `line`, allocating a new one on first sight
    pub(crate) fn intern(&mut self, line: &'a str) -> u32 {
        let next = self.ids.len() as u32;
        *self.ids.entry(line).or_insert(next)
    }

    pub(crate) fn intern_all(&mut self, lines: &[&'a str]) -> Vec<u32> {
        lines.iter().map(|line| self.intern(line)).collect()
    }

    /// Number of distinct lines seen so far
    pub(crate) fn distinct(&self) -> usize {
        self.ids.len()
    }
}
