//! Integration tests for rcstree
//!
//! Drives whole revision trees through realistic check-in histories and
//! verifies every stored revision can be rebuilt and annotated.

use ::rcstree::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use tracing::info;

/// Test harness that mirrors every check-in in a plain map
pub struct ArchiveHarness {
    pub tree: RevisionTree,
    pub expected: BTreeMap<Version, String>,
    pub rng: StdRng,
    counter: usize,
}

impl ArchiveHarness {
    pub fn new(seed: u64) -> Self {
        Self {
            tree: RevisionTree::new(),
            expected: BTreeMap::new(),
            rng: StdRng::seed_from_u64(seed),
            counter: 0,
        }
    }

    /// Check in `text` on top of `base`, remembering what it should read
    pub fn check_in(&mut self, text: &str, base: Option<&Version>, author: &str) -> Version {
        let version = self
            .tree
            .add_revision(text, base, RevisionInfo::new(author, format!("{} edits", author)))
            .unwrap();
        self.expected.insert(version.clone(), text.to_string());
        version
    }

    /// Produce a random variation of `text`
    pub fn mutate(&mut self, text: &str) -> String {
        let mut lines: Vec<String> = text.lines().map(str::to_string).collect();
        let edits = self.rng.random_range(1..5);
        for _ in 0..edits {
            self.counter += 1;
            let fresh = format!("line {}", self.counter);
            match self.rng.random_range(0..3) {
                0 if !lines.is_empty() => {
                    let at = self.rng.random_range(0..lines.len());
                    lines.remove(at);
                }
                1 if !lines.is_empty() => {
                    let at = self.rng.random_range(0..lines.len());
                    lines[at] = fresh;
                }
                _ => {
                    let at = self.rng.random_range(0..=lines.len());
                    lines.insert(at, fresh);
                }
            }
        }
        lines.iter().map(|l| format!("{}\n", l)).collect()
    }

    /// Rebuild every revision and compare with what was checked in
    pub fn verify_all(&self) -> VerificationSummary {
        let mut summary = VerificationSummary::default();
        for (version, text) in &self.expected {
            let rebuilt = self.tree.revision_text(version, false).unwrap();
            assert_eq!(&rebuilt.to_string(), text, "text of {}", version);

            let annotated = self.tree.revision_text(version, true).unwrap();
            assert_eq!(annotated.texts(), rebuilt.texts());
            for line in &annotated {
                let origin = line.revision().expect("every line is attributed");
                let origin_text = &self.expected[&origin.version];
                assert!(
                    origin_text.lines().any(|l| l == line.text()),
                    "{} attributes {:?} to {}, which does not contain it",
                    version,
                    line.text(),
                    origin.version
                );
            }
            summary.revisions_checked += 1;
            summary.lines_checked += rebuilt.len();
        }
        summary
    }
}

#[derive(Debug, Default)]
pub struct VerificationSummary {
    pub revisions_checked: usize,
    pub lines_checked: usize,
}

/// Build the tree an archive parser would produce for a small archive
///
/// ```text
/// 2.1 (head) ─ 2.0 (ghost) ─ 1.2 ─ 1.1
///                             └─ 1.2.1.1 ─ 1.2.1.2
/// ```
pub fn loaded_archive() -> RevisionTree {
    fn owned(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }
    fn rev(v: &str, author: &str) -> Revision {
        Revision::new(Version::parse(v).unwrap(), author).with_log(format!("{} by {}", v, author))
    }

    let mut tree = RevisionTree::new();
    let r21 = tree
        .insert(Node::new(rev("2.1", "carol"), owned(&["alpha", "beta", "gamma", "delta"])).unwrap())
        .unwrap();
    // "2.0" would parse as the trunk identifier 2
    let ghost_version = Version::from(vec![2, 0]);
    let ghost = tree
        .insert(Node::new(Revision::new(ghost_version, "nobody"), owned(&["d1 4"])).unwrap())
        .unwrap();
    let r12 = tree
        .insert(Node::new(rev("1.2", "bob"), owned(&["d2 1", "a2 1", "BETA", "d4 1"])).unwrap())
        .unwrap();
    let r11 = tree.insert(Node::new(rev("1.1", "alice"), owned(&["d3 1"])).unwrap()).unwrap();
    let b1 = tree
        .insert(Node::new(rev("1.2.1.1", "dave"), owned(&["a0 1", "preface"])).unwrap())
        .unwrap();
    let b2 = tree
        .insert(Node::new(rev("1.2.1.2", "erin"), owned(&["d4 1", "a4 1", "GAMMA"])).unwrap())
        .unwrap();

    tree.set_head(r21).unwrap();
    tree.attach_next(r21, Some(ghost)).unwrap();
    tree.attach_next(ghost, Some(r12)).unwrap();
    tree.attach_next(r12, Some(r11)).unwrap();
    tree.add_branch(r12, b1).unwrap();
    tree.attach_next(b1, Some(b2)).unwrap();
    tree
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn origins(lines: &Lines) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.revision().map(|r| r.version.to_string()).unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_loaded_archive_texts() {
        let tree = loaded_archive();
        let text = |s: &str| tree.revision_text(&v(s), false).unwrap().texts().join(",");

        assert_eq!(text("2.1"), "alpha,beta,gamma,delta");
        assert_eq!(text("1.2"), "alpha,BETA,gamma");
        assert_eq!(text("1.1"), "alpha,BETA");
        assert_eq!(text("1.2.1.1"), "preface,alpha,BETA,gamma");
        assert_eq!(text("1.2.1.2"), "preface,alpha,BETA,GAMMA");
        // branch and trunk identifiers resolve to their latest revision
        assert_eq!(text("1.2.1"), text("1.2.1.2"));
        assert_eq!(text("1"), text("1.2"));
        assert_eq!(text("2"), text("2.1"));
    }

    #[test]
    fn test_loaded_archive_annotation() {
        let tree = loaded_archive();

        let head = tree.revision_text(&v("2.1"), true).unwrap();
        assert_eq!(origins(&head), vec!["1.1", "2.1", "1.2", "2.1"]);

        let branch = tree.revision_text(&v("1.2.1.2"), true).unwrap();
        assert_eq!(origins(&branch), vec!["1.2.1.1", "1.1", "1.1", "1.2.1.2"]);

        let rendered = tree.annotate(&v("1.2.1.2")).unwrap();
        assert!(rendered[0].starts_with("1.2.1.1      (dave     "));
        assert!(rendered[0].ends_with("): preface"));
    }

    #[test]
    fn test_loaded_archive_lookup_failures() {
        let tree = loaded_archive();

        assert!(matches!(
            tree.revision_text(&v("1.3"), false),
            Err(RcsError::NodeNotFound(_))
        ));
        match tree.revision_text(&v("1.2.2.1"), false) {
            Err(RcsError::BranchNotFound(branch)) => assert_eq!(branch, v("1.2.2")),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            tree.revision_text(&v("1.2.1.3"), false),
            Err(RcsError::NodeNotFound(_))
        ));
        assert!(tree.contains(&v("1.2.1.1")));
        assert!(tree.contains(&v("1.2.1")));
        assert!(!tree.contains(&v("1.2.1.3")));
        assert!(!tree.contains(&v("3.1")));
    }

    #[test]
    fn test_loaded_archive_report() {
        let tree = loaded_archive();

        let order: Vec<String> = tree.revisions().map(|n| n.version().to_string()).collect();
        assert_eq!(order, vec!["2.1", "2.0", "1.2", "1.1", "1.2.1.2", "1.2.1.1"]);

        let stats = tree.stats();
        assert_eq!(stats.total_revisions, 6);
        assert_eq!(stats.trunk_revisions, 4);
        assert_eq!(stats.branches, 1);
        assert_eq!(stats.ghost_revisions, 1);

        let log = tree.log();
        let r12 = log.iter().find(|e| e.version == v("1.2")).unwrap();
        assert_eq!(r12.author, "bob");
        assert_eq!(r12.branches, vec![v("1.2.1")]);
    }

    #[test]
    fn test_check_in_on_loaded_archive() {
        let mut tree = loaded_archive();
        let base = v("1.2.1");
        let next = tree
            .add_revision("preface\nalpha\n", Some(&base), RevisionInfo::new("frank", "trim"))
            .unwrap();
        assert_eq!(next, v("1.2.1.3"));

        let forked = tree
            .add_revision("other\n", Some(&v("1.1")), RevisionInfo::new("gina", "fork"))
            .unwrap();
        assert_eq!(forked, v("1.1.1.1"));

        let head = tree
            .add_revision("alpha\n", None, RevisionInfo::new("hank", "shrink"))
            .unwrap();
        assert_eq!(head, v("2.2"));

        assert_eq!(tree.revision_text(&v("2.1"), false).unwrap().texts(), vec!["alpha", "beta", "gamma", "delta"]);
        assert_eq!(tree.revision_text(&v("1.2.1.3"), false).unwrap().texts(), vec!["preface", "alpha"]);
        assert_eq!(tree.revision_text(&v("1.1.1.1"), false).unwrap().texts(), vec!["other"]);
        assert_eq!(tree.revision_text(&v("1.1"), false).unwrap().texts(), vec!["alpha", "BETA"]);
    }

    #[test]
    #[traced_test]
    fn test_linear_history_annotation() {
        let mut harness = ArchiveHarness::new(7);
        let mut text = String::new();
        for i in 1..=6 {
            text.push_str(&format!("added in {}\n", i));
            harness.check_in(&text, None, "alice");
        }

        let annotated = harness.tree.revision_text(&v("1.6"), true).unwrap();
        let expected: Vec<String> = (1..=6).map(|i| format!("1.{}", i)).collect();
        assert_eq!(origins(&annotated), expected);

        // an older revision only knows the lines that existed back then
        let older = harness.tree.revision_text(&v("1.3"), true).unwrap();
        assert_eq!(origins(&older), vec!["1.1", "1.2", "1.3"]);
        info!("Linear history verified: {:?}", harness.verify_all());
    }

    #[test]
    #[traced_test]
    fn test_random_history() {
        let mut harness = ArchiveHarness::new(42);
        let initial: String = (0..20).map(|i| format!("original {}\n", i)).collect();
        harness.check_in(&initial, None, "alice");

        for round in 0..40 {
            let versions: Vec<Version> = harness.expected.keys().cloned().collect();
            let base = if harness.rng.random_bool(0.4) {
                None
            } else {
                Some(versions[harness.rng.random_range(0..versions.len())].clone())
            };
            let base_text = match &base {
                Some(b) => harness.expected[b].clone(),
                None => harness.tree.revision_text(&v("1"), false).unwrap().to_string(),
            };
            let text = harness.mutate(&base_text);
            let author = format!("dev{}", round % 3);
            harness.check_in(&text, base.as_ref(), &author);
        }

        let summary = harness.verify_all();
        assert_eq!(summary.revisions_checked, 41);
        assert_eq!(harness.tree.len(), 41);
        info!("Random history verified: {:?}", summary);
    }

    #[test]
    fn test_shared_tree_history() {
        let shared = SharedRevisionTree::new(loaded_archive());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let shared = shared.clone();
                std::thread::spawn(move || {
                    let target = if i % 2 == 0 { v("1.2.1.2") } else { v("1.1") };
                    shared.revision_text(&target, true).unwrap().len()
                })
            })
            .collect();
        let lengths: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(lengths, vec![4, 2, 4, 2]);
    }
}
