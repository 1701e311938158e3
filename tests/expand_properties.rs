// tests/expand_properties.rs

use proptest::prelude::*;
use bulkexec::expand::expand;
use bulkexec::expr::Limits;

// Tokens that can never evaluate to anything: bare names that are neither
// builtins nor `n`, or plain decimal integers that render as themselves.
fn scalar_token() -> impl Strategy<Value = String> {
    prop_oneof![
        "x[a-z_]{0,8}",
        "[1-9][0-9]{0,5}",
    ]
}

proptest! {
    #[test]
    fn scalar_only_input_is_one_unchanged_invocation(
        raw in proptest::collection::vec(scalar_token(), 1..6)
    ) {
        let invocations = expand(&raw, &Limits::default()).unwrap();
        prop_assert_eq!(invocations, vec![raw]);
    }

    #[test]
    fn single_list_expands_in_order(
        items in proptest::collection::vec(-1000i64..1000, 1..8),
        position in 0usize..3,
    ) {
        let mut raw = vec!["cmd".to_string(), "xa".to_string(), "xb".to_string()];
        let list = format!(
            "[{}]",
            items.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(", ")
        );
        raw.insert(position + 1, list);

        let invocations = expand(&raw, &Limits::default()).unwrap();
        prop_assert_eq!(invocations.len(), items.len());
        for (i, argv) in invocations.iter().enumerate() {
            prop_assert_eq!(argv.len(), raw.len());
            for (slot, text) in argv.iter().enumerate() {
                if slot == position + 1 {
                    prop_assert_eq!(text, &items[i].to_string());
                } else {
                    prop_assert_eq!(text, &raw[slot]);
                }
            }
        }
    }

    #[test]
    fn two_ranges_cycle_to_the_longer_one(a in 1usize..10, b in 1usize..10) {
        let raw = vec![
            "cmd".to_string(),
            format!("range({a})"),
            format!("range({b})"),
        ];
        let invocations = expand(&raw, &Limits::default()).unwrap();
        prop_assert_eq!(invocations.len(), a.max(b));
        for (i, argv) in invocations.iter().enumerate() {
            prop_assert_eq!(&argv[1], &(i % a).to_string());
            prop_assert_eq!(&argv[2], &(i % b).to_string());
        }
    }
}
