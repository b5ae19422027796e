use proptest::prelude::*;
use tenant_access::cache::{derive_key, KeyParts, MAX_KEY_LEN};

fn key_parts() -> impl Strategy<Value = KeyParts> {
    (
        "[a-z]{1,12}",
        "(/[a-z0-9-]{1,16}){1,6}",
        proptest::option::of("[a-f0-9-]{0,36}"),
        proptest::option::of("[a-z0-9=&%]{0,400}"),
        proptest::collection::vec(("[A-Za-z-]{1,20}", "[ -~]{0,40}"), 0..3),
    )
        .prop_map(|(prefix, path, user_id, query, headers)| KeyParts {
            prefix,
            path,
            user_id,
            query,
            headers,
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_key_derivation_is_deterministic(parts in key_parts()) {
        prop_assert_eq!(derive_key(&parts), derive_key(&parts.clone()));
    }

    #[test]
    fn prop_keys_are_bounded_and_prefixed(parts in key_parts()) {
        let key = derive_key(&parts);
        prop_assert!(key.len() <= MAX_KEY_LEN);
        let expected_prefix = format!("{}:", parts.prefix);
        prop_assert!(key.starts_with(&expected_prefix));
    }

    #[test]
    fn prop_distinct_users_get_distinct_keys(
        parts in key_parts(),
        a in "[a-f0-9]{8}",
        b in "[a-f0-9]{8}",
    ) {
        prop_assume!(a != b);
        let for_a = derive_key(&KeyParts { user_id: Some(a), ..parts.clone() });
        let for_b = derive_key(&KeyParts { user_id: Some(b), ..parts });
        prop_assert_ne!(for_a, for_b);
    }
}
