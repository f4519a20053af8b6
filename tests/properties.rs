//! Property tests for expectation resolution and output joining

use conformance::expect::members::ALERT_DELIMITER;
use conformance::{
    resolve, CapturedOutput, Error, ExpectationTable, Expectations, Mode, ProfileRegistry,
};
use proptest::prelude::*;

const GROUP: &str = "FAM";

/// Registry with a few grouped and ungrouped profiles
fn registry() -> ProfileRegistry {
    let mut registry = ProfileRegistry::new();
    registry.register("P1", Some(GROUP)).unwrap();
    registry.register("P2", Some(GROUP)).unwrap();
    registry.register("P3", None).unwrap();
    registry.register("P4", Some("OTHER")).unwrap();
    registry
}

fn profile() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("P1"), Just("P2"), Just("P3"), Just("P4")]
}

fn value() -> impl Strategy<Value = String> {
    "[a-zA-Z]{1,6}(\\(\\))?(,[a-zA-Z]{1,6}(\\(\\))?){0,4}"
}

fn key() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("default"),
        Just("P1"),
        Just("P2"),
        Just("P3"),
        Just("P4"),
        Just(GROUP),
        Just("OTHER"),
    ]
}

fn table() -> impl Strategy<Value = ExpectationTable> {
    proptest::collection::vec((key(), value()), 0..6)
        .prop_map(|entries| entries.into_iter().collect::<ExpectationTable>())
}

proptest! {
    #[test]
    fn resolve_is_deterministic(table in table(), profile in profile()) {
        let registry = registry();
        let exp = Expectations::new(table, None);
        let first = resolve("t", &exp, &registry, profile, Mode::Target).ok();
        let second = resolve("t", &exp, &registry, profile, Mode::Target).ok();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn profile_entry_wins(mut table in table(), profile in profile(), specific in value(), family in value()) {
        let registry = registry();
        if let Some(group) = registry.group_of(profile) {
            table.set(group, family);
        }
        table.set(profile, specific.clone());
        let exp = Expectations::new(table, None);
        prop_assert_eq!(resolve("t", &exp, &registry, profile, Mode::Target).unwrap(), specific.as_str());
    }

    #[test]
    fn group_entry_beats_default(default in value(), family in value(), profile in prop_oneof![Just("P1"), Just("P2")]) {
        let registry = registry();
        let exp = Expectations::new(
            [("default", default.as_str()), (GROUP, family.as_str())].into_iter().collect(),
            None,
        );
        prop_assert_eq!(resolve("t", &exp, &registry, profile, Mode::Target).unwrap(), family.as_str());
    }

    #[test]
    fn default_applies_everywhere(default in value(), profile in profile()) {
        let registry = registry();
        let exp = Expectations::new([("default", default.as_str())].into_iter().collect(), None);
        prop_assert_eq!(resolve("t", &exp, &registry, profile, Mode::Target).unwrap(), default.as_str());
        prop_assert_eq!(resolve("t", &exp, &registry, profile, Mode::Current).unwrap(), default.as_str());
    }

    #[test]
    fn unresolvable_is_missing_never_wrong(table in table(), profile in profile()) {
        let registry = registry();
        let group = registry.group_of(profile);
        let resolvable = table.get_id(profile).is_some()
            || group.is_some_and(|g| table.get_id(g).is_some())
            || table.get_default().is_some();
        let exp = Expectations::new(table, None);
        let result = resolve("t", &exp, &registry, profile, Mode::Target);
        if resolvable {
            prop_assert!(result.is_ok());
        } else {
            let is_missing = matches!(result, Err(Error::MissingExpectation { .. }));
            prop_assert!(is_missing);
        }
    }

    #[test]
    fn current_entry_shadows_target(target in table(), current in table(), profile in profile()) {
        let registry = registry();
        let from_current = resolve("t", &Expectations::new(current.clone(), None), &registry, profile, Mode::Target).ok().map(str::to_string);
        let from_target = resolve("t", &Expectations::new(target.clone(), None), &registry, profile, Mode::Target).ok().map(str::to_string);
        let exp = Expectations::new(target, Some(current));
        let resolved = resolve("t", &exp, &registry, profile, Mode::Current).ok().map(str::to_string);
        prop_assert_eq!(resolved, from_current.or(from_target));
    }

    #[test]
    fn join_split_round_trip(entries in proptest::collection::vec("[^§]{0,12}", 0..8)) {
        prop_assume!(entries.iter().all(|e| !e.contains(ALERT_DELIMITER)));
        let captured = CapturedOutput::new(entries.clone());
        let back = CapturedOutput::split(&captured.joined());
        prop_assert_eq!(back.entries().len(), entries.len());
        prop_assert_eq!(back, captured);
    }
}
