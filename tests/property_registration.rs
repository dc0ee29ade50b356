/// Property-based tests for service registration
///
/// These tests use proptest to generate random inputs and verify invariants
/// that should hold for all registrations and keys.

use ferrous_ioc::{constants, Container, DescriptorBuilder, Injectable, Lifetime, Resolver, ServiceKey};
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Debug)]
struct Tagged {
    tag: u32,
}

impl Injectable for Tagged {
    fn describe(d: &mut DescriptorBuilder<Self>) {
        d.constructor()
            .external::<u32>()
            .build(|a| Ok(Tagged { tag: a.constant(0)? }));
    }
}

fn lifetime_strategy() -> impl Strategy<Value = Lifetime> {
    prop_oneof![
        Just(Lifetime::Transient),
        Just(Lifetime::Singleton),
        Just(Lifetime::Scoped),
        Just(Lifetime::PerContext),
    ]
}

proptest! {
    // Property: the first registration of a key wins, constants included
    #[test]
    fn first_registration_wins(
        tags in prop::collection::vec(0u32..1000, 1..10),
        lifetimes in prop::collection::vec(lifetime_strategy(), 10),
    ) {
        let container = Container::new();
        for (tag, lifetime) in tags.iter().zip(&lifetimes) {
            container.register::<Tagged, Tagged>(None, *lifetime, constants![*tag]);
        }

        let resolved = container.get_required::<Tagged>();
        prop_assert_eq!(resolved.tag, tags[0]);

        let descriptors = container.descriptors();
        prop_assert_eq!(descriptors.len(), 1);
        prop_assert_eq!(descriptors[0].lifetime, lifetimes[0]);
        prop_assert_eq!(descriptors[0].constant_count, 1);
    }

    // Property: every distinct name gets its own registration and constants
    #[test]
    fn named_registrations_are_independent(names in prop::collection::btree_set("[a-z]{1,8}", 1..8)) {
        let container = Container::new();
        for (tag, name) in names.iter().enumerate() {
            container.register::<Tagged, Tagged>(Some(name), Lifetime::Singleton, constants![tag as u32]);
        }

        prop_assert_eq!(container.descriptors().len(), names.len());
        for (tag, name) in names.iter().enumerate() {
            let first = container.get_named_required::<Tagged>(name);
            let again = container.get_named_required::<Tagged>(name);
            prop_assert_eq!(first.tag, tag as u32);
            prop_assert!(Arc::ptr_eq(&first, &again));
        }
    }

    // Property: whitespace-only names always denote the unnamed key
    #[test]
    fn blank_names_are_unnamed(blank in "[ \t\n]{0,6}") {
        let key = ServiceKey::of::<Tagged>(Some(&blank));
        prop_assert_eq!(key.clone(), ServiceKey::of::<Tagged>(None));
        prop_assert!(!key.is_named());

        let container = Container::new();
        container.register::<Tagged, Tagged>(Some(&blank), Lifetime::Transient, constants![7u32]);
        prop_assert!(container.is_registered::<Tagged>(None));
        prop_assert_eq!(container.get_required::<Tagged>().tag, 7);
    }

    // Property: named keys render as `{type}_{name}` and fall back when unregistered
    #[test]
    fn named_keys_fall_back_to_unnamed(name in "[A-Za-z0-9]{1,12}") {
        let key = ServiceKey::of::<u32>(Some(&name));
        prop_assert_eq!(key.to_string(), format!("u32_{}", name));

        let container = Container::new();
        container.register::<Tagged, Tagged>(None, Lifetime::Transient, constants![1u32]);
        prop_assert!(container.is_registered::<Tagged>(Some(&name)));
        prop_assert_eq!(container.get_named_required::<Tagged>(&name).tag, 1);
    }

    // Property: registering the same set of names in any order yields the same table
    #[test]
    fn registration_order_does_not_change_the_table(
        names in prop::collection::vec("[a-z]{1,4}", 1..8).prop_shuffle(),
    ) {
        let container = Container::new();
        for name in &names {
            container.register_named::<Tagged, Tagged>(name, Lifetime::Transient);
        }

        let registered: BTreeSet<String> = container
            .descriptors()
            .into_iter()
            .filter_map(|d| d.service_name().map(str::to_string))
            .collect();
        let expected: BTreeSet<String> = names.iter().cloned().collect();
        prop_assert_eq!(registered, expected);
    }
}
