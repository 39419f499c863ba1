//! Property-based testing for rcstree
//!
//! Uses proptest to verify revision number laws and delta reconstruction
//! across randomly generated inputs.

use ::rcstree::*;
use proptest::prelude::*;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Generate revision numbers with one to six components
fn version_strategy() -> impl Strategy<Value = Version> {
    prop::collection::vec(0u32..20, 1..=6).prop_map(Version::from)
}

/// Generate revision numbers without zero components
fn live_version_strategy() -> impl Strategy<Value = Version> {
    prop::collection::vec(1u32..20, 1..=6).prop_map(Version::from)
}

/// Generate texts drawn from a small vocabulary so that edits share lines
fn text_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop_oneof![
            "[a-e]".prop_map(|s| s),
            "line [0-9]{1,2}".prop_map(|s| s),
            Just(String::new()),
        ],
        0..25,
    )
}

fn as_strs(lines: &[String]) -> Vec<&str> {
    lines.iter().map(String::as_str).collect()
}

fn joined(lines: &[String]) -> String {
    lines.iter().map(|l| format!("{}\n", l)).collect()
}

/// Origins of a new head's lines, given the origins of the head it replaces
///
/// Lines the stored reverse delta deletes are new in `version`; every other
/// line keeps the origin of the old head's line it turns back into.
fn origins_after_new_head(
    old: &[String],
    old_origins: &[Version],
    new: &[String],
    version: &Version,
) -> Vec<Version> {
    let reverse = EditScript::compute(&as_strs(new), &as_strs(old));
    let survivors = reverse
        .apply((0..new.len()).map(Some).collect(), |_| None, drop)
        .unwrap();
    let mut origins = vec![version.clone(); new.len()];
    for (slot, origin) in survivors.into_iter().zip(old_origins) {
        if let Some(i) = slot {
            origins[i] = origin.clone();
        }
    }
    origins
}

/// Origins of a branch revision's lines: added lines are new in `version`
fn origins_on_branch(
    base: &[String],
    base_origins: &[Version],
    new: &[String],
    version: &Version,
) -> Vec<Version> {
    EditScript::compute(&as_strs(base), &as_strs(new))
        .apply(base_origins.to_vec(), |_| version.clone(), drop)
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn prop_parse_display_roundtrip(version in live_version_strategy()) {
        let parsed = Version::parse(&version.to_string()).unwrap();
        prop_assert_eq!(parsed, version);
    }

    #[test]
    fn prop_numeric_order_is_total(a in version_strategy(), b in version_strategy()) {
        let ab = a.compare_versions(&b);
        prop_assert_eq!(ab, b.compare_versions(&a).reverse());
        prop_assert_eq!(ab == Ordering::Equal, a == b);
        prop_assert_eq!(a.is_greater_than(&b), ab == Ordering::Greater);
        prop_assert_eq!(a.is_less_or_equal(&b), ab != Ordering::Greater);
    }

    #[test]
    fn prop_storage_order_inverts_equal_lengths(a in version_strategy(), b in version_strategy()) {
        if a.len() == b.len() {
            prop_assert_eq!(a.cmp(&b), b.compare_versions(&a));
        } else {
            prop_assert_eq!(a.cmp(&b), a.len().cmp(&b.len()));
        }
    }

    #[test]
    fn prop_base_is_a_prefix(version in version_strategy(), n in 0usize..8) {
        let base = version.base(n);
        prop_assert_eq!(base.len(), n.min(version.len()));
        prop_assert_eq!(base.numbers(), &version.numbers()[..base.len()]);
        prop_assert_eq!(base.base(n), base.clone());
    }

    #[test]
    fn prop_ghost_iff_zero_component(version in version_strategy()) {
        prop_assert_eq!(version.is_ghost(), version.numbers().contains(&0));
    }

    #[test]
    fn prop_next_and_branch(version in live_version_strategy(), digit in 1u32..9) {
        let next = version.next().unwrap();
        prop_assert!(next.is_greater_than(&version));
        prop_assert_eq!(next.branch_point(), version.branch_point());

        let branch = version.new_branch(digit);
        prop_assert_eq!(branch.len(), version.len() + 1);
        prop_assert_eq!(branch.branch_point(), version.clone());
        prop_assert_eq!(branch.is_revision(), !version.is_revision());
    }

    #[test]
    fn prop_computed_script_applies(old in text_strategy(), new in text_strategy()) {
        let script = EditScript::compute(&as_strs(&old), &as_strs(&new));
        let applied = script.apply(old.clone(), str::to_string, drop).unwrap();
        prop_assert_eq!(&applied, &new);

        // the stored form parses back to the same script
        let reparsed = EditScript::parse(&script.to_lines()).unwrap();
        prop_assert_eq!(reparsed, script);
    }

    #[test]
    fn prop_trunk_history_rebuilds(history in prop::collection::vec(text_strategy(), 1..8)) {
        let mut tree = RevisionTree::new();
        for text in &history {
            tree.add_revision(&joined(text), None, RevisionInfo::new("prop", "step")).unwrap();
        }
        for (i, text) in history.iter().enumerate() {
            let version = Version::trunk(1, i as u32 + 1);
            let rebuilt = tree.revision_text(&version, false).unwrap();
            prop_assert_eq!(rebuilt.texts(), as_strs(text));
        }
    }

    #[test]
    fn prop_branch_history_rebuilds(
        trunk in prop::collection::vec(text_strategy(), 1..5),
        branch in prop::collection::vec(text_strategy(), 1..5),
        fork in 0usize..4,
    ) {
        let mut tree = RevisionTree::new();
        let mut expected = BTreeMap::new();
        for text in &trunk {
            let v = tree.add_revision(&joined(text), None, RevisionInfo::new("t", "trunk")).unwrap();
            expected.insert(v, text.clone());
        }

        let mut base = Version::trunk(1, (fork % trunk.len()) as u32 + 1);
        for text in &branch {
            let v = tree.add_revision(&joined(text), Some(&base), RevisionInfo::new("b", "branch")).unwrap();
            prop_assert!(v.is_branch() || v.is_trunk());
            expected.insert(v.clone(), text.clone());
            base = v;
        }

        for (version, text) in &expected {
            let rebuilt = tree.revision_text(version, false).unwrap();
            prop_assert_eq!(rebuilt.texts(), as_strs(text));
        }
    }

    #[test]
    fn prop_annotation_matches_tracked_origins(
        trunk in prop::collection::vec(text_strategy(), 1..7),
        branch in prop::collection::vec(text_strategy(), 0..4),
        fork in 0usize..6,
    ) {
        let mut tree = RevisionTree::new();
        let mut texts: BTreeMap<Version, Vec<String>> = BTreeMap::new();
        let mut tracked: BTreeMap<Version, Vec<Version>> = BTreeMap::new();

        let mut head: Option<Version> = None;
        for text in &trunk {
            let v = tree.add_revision(&joined(text), None, RevisionInfo::new("t", "trunk")).unwrap();
            let origins = match &head {
                Some(old) => origins_after_new_head(&texts[old], &tracked[old], text, &v),
                None => vec![v.clone(); text.len()],
            };
            texts.insert(v.clone(), text.clone());
            tracked.insert(v.clone(), origins);
            head = Some(v);
        }

        // branch off anything but the head, which would extend the trunk
        if trunk.len() > 1 {
            let mut base = Version::trunk(1, (fork % (trunk.len() - 1)) as u32 + 1);
            for text in &branch {
                let v = tree.add_revision(&joined(text), Some(&base), RevisionInfo::new("b", "branch")).unwrap();
                prop_assert!(v.is_branch());
                let origins = origins_on_branch(&texts[&base], &tracked[&base], text, &v);
                texts.insert(v.clone(), text.clone());
                tracked.insert(v.clone(), origins);
                base = v;
            }
        }

        for (version, expected) in &tracked {
            let annotated = tree.revision_text(version, true).unwrap();
            prop_assert_eq!(annotated.texts(), as_strs(&texts[version]));
            let origins: Vec<Version> = annotated
                .iter()
                .map(|line| line.revision().unwrap().version.clone())
                .collect();
            prop_assert_eq!(&origins, expected, "origins of {}", version);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        #[test]
        fn prop_parse_rejects_garbage(s in "[0-9.]{0,3}[a-z ][a-z. ]{0,2}[0-9]{0,3}") {
            let err = Version::parse(&s).unwrap_err();
            prop_assert!(err.is_invalid_version());
        }

        #[test]
        fn prop_trailing_zero_names_branch(version in live_version_strategy()) {
            prop_assume!(version.is_revision());
            let text = format!("{}.0", version.branch_point());
            prop_assert_eq!(Version::parse(&text).unwrap(), version.branch_point());
        }
    }
}
