//! Revision and branch numbers
//!
//! A [`Version`] is an immutable sequence of non-negative integers such as
//! `1.4` or `1.3.2.1`. Its length carries meaning:
//!
//! - length 1 or 2: a trunk version
//! - length above 2: a branch version
//! - even length: a concrete revision
//! - odd length: a branch identifier (`1.3.2` names the second branch
//!   forked at `1.3` without naming a revision on it)
//!
//! A version with any zero component is a *ghost*: a placeholder left
//! behind by deleted revisions which traversal has to step over.
//!
//! ## Orderings
//!
//! Versions have two orderings and both matter:
//!
//! - [`Version::compare_versions`] is the numeric order (`2.0 > 1.99.1`,
//!   `0.1.2 > 0.1`). Navigation uses it to decide "newer" and "older".
//! - [`Ord`] is the storage order in which archives keep their nodes: shorter
//!   versions sort first, and versions of equal length sort in *descending*
//!   numeric order. A `BTreeMap<Version, _>` therefore lists the head first.
//!
//! ```rust
//! use rcstree::Version;
//!
//! let a: Version = "1.10".parse()?;
//! let b: Version = "1.2.1".parse()?;
//! assert!(a.is_greater_than(&b)); // numeric order
//! assert!(a < b); // storage order: length first
//! # Ok::<(), rcstree::RcsError>(())
//! ```

use crate::error::{RcsError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Revision or branch number of the form `x(.y)*`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    numbers: Vec<u32>,
}

impl Version {
    /// Create an empty (unset) version
    pub fn empty() -> Self {
        Self { numbers: Vec::new() }
    }

    /// Create a single-component trunk version
    pub fn major(major: u32) -> Self {
        Self { numbers: vec![major] }
    }

    /// Create a `major.minor` trunk version
    pub fn trunk(major: u32, minor: u32) -> Self {
        Self { numbers: vec![major, minor] }
    }

    /// Parse a version string
    ///
    /// Accepts strings of the form `[0-9]+(\.[0-9]+)*`. A trailing `.` is
    /// read as `.0`, and a trailing `.0` is dropped when the number of
    /// components is even, so `1.2.1.` names the branch `1.2.1` rather than
    /// a revision on it.
    ///
    /// # Errors
    ///
    /// Returns [`RcsError::InvalidVersionNumber`] if any component is not a
    /// plain decimal number.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rcstree::Version;
    ///
    /// assert_eq!(Version::parse("1.4")?.to_string(), "1.4");
    /// assert_eq!(Version::parse("1.2.1.")?.to_string(), "1.2.1");
    /// assert!(Version::parse("1.b").is_err());
    /// # Ok::<(), rcstree::RcsError>(())
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Ok(Self::empty());
        }

        let normalized = if s.ends_with('.') {
            format!("{}0", s)
        } else {
            s.to_string()
        };

        let mut tokens: Vec<&str> = normalized.split('.').collect();
        // a .0 ending is only allowed on branch identifiers
        if tokens.len() % 2 == 0 && normalized.ends_with(".0") {
            tokens.pop();
        }

        let numbers = tokens
            .into_iter()
            .map(|token| {
                if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(RcsError::InvalidVersionNumber(normalized.clone()));
                }
                token
                    .parse::<u32>()
                    .map_err(|_| RcsError::InvalidVersionNumber(normalized.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { numbers })
    }

    /// The components of this version
    pub fn numbers(&self) -> &[u32] {
        &self.numbers
    }

    /// Number of components
    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    /// Whether this is the empty version
    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    /// Component at `pos`
    ///
    /// # Panics
    ///
    /// Panics if `pos` is out of range.
    pub fn at(&self, pos: usize) -> u32 {
        self.numbers[pos]
    }

    /// Last component, if any
    pub fn last(&self) -> Option<u32> {
        self.numbers.last().copied()
    }

    /// Numeric comparison
    ///
    /// Components are compared left to right and the first difference
    /// decides. When one version is a strict prefix of the other, the longer
    /// one is greater: `0.1.2 > 0.1`.
    pub fn compare_versions(&self, other: &Version) -> Ordering {
        for (i, n) in self.numbers.iter().enumerate() {
            match other.numbers.get(i) {
                None => return Ordering::Greater,
                Some(m) if n > m => return Ordering::Greater,
                Some(m) if n < m => return Ordering::Less,
                Some(_) => {}
            }
        }
        if other.numbers.len() > self.numbers.len() {
            Ordering::Less
        } else {
            Ordering::Equal
        }
    }

    /// Numerically greater than `other`
    pub fn is_greater_than(&self, other: &Version) -> bool {
        self.compare_versions(other) == Ordering::Greater
    }

    /// Numerically greater than or equal to `other`
    pub fn is_greater_or_equal(&self, other: &Version) -> bool {
        self.compare_versions(other) != Ordering::Less
    }

    /// Numerically less than `other`
    pub fn is_less_than(&self, other: &Version) -> bool {
        self.compare_versions(other) == Ordering::Less
    }

    /// Numerically less than or equal to `other`
    pub fn is_less_or_equal(&self, other: &Version) -> bool {
        self.compare_versions(other) != Ordering::Greater
    }

    /// The first `min(positions, len)` components
    pub fn base(&self, positions: usize) -> Version {
        let end = positions.min(self.numbers.len());
        Self {
            numbers: self.numbers[..end].to_vec(),
        }
    }

    /// This version without its last component
    ///
    /// For the revision `1.3.2.4` this is the branch identifier `1.3.2`; for a
    /// branch identifier it is the revision the branch was forked from.
    pub fn branch_point(&self) -> Version {
        self.base(self.numbers.len().saturating_sub(1))
    }

    /// The following version on the same line: `1.3.2.4` becomes `1.3.2.5`
    ///
    /// # Errors
    ///
    /// Returns [`RcsError::InvalidVersionNumber`] for the empty version and
    /// for a last component of `u32::MAX`, neither of which has a successor.
    pub fn next(&self) -> Result<Version> {
        let mut numbers = self.numbers.clone();
        let last = numbers
            .last_mut()
            .ok_or_else(|| RcsError::InvalidVersionNumber(String::new()))?;
        *last = last
            .checked_add(1)
            .ok_or_else(|| RcsError::InvalidVersionNumber(format!("{} has no successor", self)))?;
        Ok(Self { numbers })
    }

    /// Append `branch` as a new final component
    ///
    /// Applied to a revision this yields a branch identifier; applied to a
    /// branch identifier it yields a revision on that branch.
    pub fn new_branch(&self, branch: u32) -> Version {
        let mut numbers = Vec::with_capacity(self.numbers.len() + 1);
        numbers.extend_from_slice(&self.numbers);
        numbers.push(branch);
        Self { numbers }
    }

    /// Length 1 or 2
    pub fn is_trunk(&self) -> bool {
        (1..=2).contains(&self.numbers.len())
    }

    /// Length above 2
    pub fn is_branch(&self) -> bool {
        self.numbers.len() > 2
    }

    /// Even length: names a concrete revision
    pub fn is_revision(&self) -> bool {
        self.numbers.len() % 2 == 0
    }

    /// Any component is zero
    pub fn is_ghost(&self) -> bool {
        self.numbers.iter().any(|&n| n == 0)
    }
}

impl Ord for Version {
    /// Storage order: length first, then descending numeric order
    fn cmp(&self, other: &Self) -> Ordering {
        match self.numbers.len().cmp(&other.numbers.len()) {
            Ordering::Equal => self.compare_versions(other).reverse(),
            by_length => by_length,
        }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut numbers = self.numbers.iter();
        if let Some(first) = numbers.next() {
            write!(f, "{}", first)?;
            for n in numbers {
                write!(f, ".{}", n)?;
            }
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = RcsError;

    fn from_str(s: &str) -> Result<Self> {
        Version::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = RcsError;

    fn try_from(s: String) -> Result<Self> {
        Version::parse(&s)
    }
}

impl From<Version> for String {
    fn from(v: Version) -> Self {
        v.to_string()
    }
}

impl From<Vec<u32>> for Version {
    fn from(numbers: Vec<u32>) -> Self {
        Self { numbers }
    }
}

impl From<&[u32]> for Version {
    fn from(numbers: &[u32]) -> Self {
        Self {
            numbers: numbers.to_vec(),
        }
    }
}
