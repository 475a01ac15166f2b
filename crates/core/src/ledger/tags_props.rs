//! Property-based tests for tags and tag propagation.

use proptest::prelude::*;

use super::executor::propagate_tags;
use super::tags::Tags;

/// Tag text including the characters the wire form escapes.
fn tag_strategy() -> impl Strategy<Value = String> {
    "[a-z_]{1,8}:[a-zA-Z0-9,\\\\ ]{0,8}[a-z0-9]"
}

fn tags_strategy() -> impl Strategy<Value = Tags> {
    prop::collection::vec(tag_strategy(), 0..6).prop_map(Tags::from_iter)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// The wire form parses back to the same tags.
    #[test]
    fn prop_wire_form_round_trips(tags in tags_strategy()) {
        let wire = tags.to_string();
        prop_assert_eq!(Tags::parse(&wire), tags);
    }

    /// Adding a tag twice keeps one copy.
    #[test]
    fn prop_add_is_idempotent(tags in tags_strategy(), tag in tag_strategy()) {
        let once = tags.clone().with(tag.clone());
        let twice = once.clone().with(tag);
        prop_assert_eq!(once, twice);
    }

    /// Entry tags are the transaction's tags followed by their own, with a
    /// repeated tag taking its own position.
    #[test]
    fn prop_propagation_appends_own_tags(
        transaction_tags in tags_strategy(),
        own in tags_strategy(),
    ) {
        let merged = propagate_tags(&transaction_tags, Some(&own));
        let expected: Vec<&str> = transaction_tags
            .iter()
            .filter(|t| !own.contains(t))
            .chain(own.iter())
            .collect();
        prop_assert_eq!(merged.iter().collect::<Vec<_>>(), expected);
    }

    /// Key lookups on entry tags match the plain concatenation of both tag
    /// lists: own values first, then the transaction's.
    #[test]
    fn prop_propagation_lookup_matches_concatenation(
        transaction_tags in tags_strategy(),
        own in tags_strategy(),
    ) {
        let merged = propagate_tags(&transaction_tags, Some(&own));
        for (key, _) in transaction_tags.pairs().chain(own.pairs()) {
            prop_assert_eq!(merged.get(key), own.get(key).or_else(|| transaction_tags.get(key)));
        }
    }

    /// Without own tags an entry gets exactly the transaction's tags.
    #[test]
    fn prop_propagation_without_own_tags(transaction_tags in tags_strategy()) {
        prop_assert_eq!(propagate_tags(&transaction_tags, None), transaction_tags);
    }

    /// Own tags win key lookups over transaction tags with the same key.
    #[test]
    fn prop_own_value_wins_lookup(value in "[a-z0-9]{1,6}") {
        let transaction_tags = Tags::new().with("type:AMOUNT");
        let own = Tags::new().with(format!("type:{value}"));
        let merged = propagate_tags(&transaction_tags, Some(&own));
        prop_assert_eq!(merged.get("type"), Some(value.as_str()));
    }
}
