//! Property tests for filter-literal escaping.

use arbor_query::escape_literal;
use proptest::prelude::*;

/// Inverse of the escape table, for round-trip checking.
fn unescape(escaped: &str) -> String {
    let mut out = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let pair: String = chars.by_ref().take(2).collect();
        match pair.as_str() {
            "28" => out.push('('),
            "29" => out.push(')'),
            "5c" => out.push('\\'),
            other => panic!("unexpected escape sequence \\{other}"),
        }
    }
    out
}

proptest! {
    #[test]
    fn escaping_round_trips(s in ".*") {
        let escaped = escape_literal(&s);
        prop_assert_eq!(unescape(&escaped), s);
    }

    #[test]
    fn escaped_output_has_no_raw_specials(s in ".*") {
        let escaped = escape_literal(&s);
        prop_assert!(!escaped.contains('('));
        prop_assert!(!escaped.contains(')'));
    }

    // Every occurrence is escaped exactly once: the number of emitted
    // escape sequences matches the number of source occurrences.
    #[test]
    fn each_occurrence_escaped_exactly_once(s in ".*") {
        let escaped = escape_literal(&s);
        prop_assert_eq!(escaped.matches("\\28").count(), s.matches('(').count());
        prop_assert_eq!(escaped.matches("\\29").count(), s.matches(')').count());
        prop_assert_eq!(escaped.matches("\\5c").count(), s.matches('\\').count());
    }

    #[test]
    fn strings_without_specials_pass_through(s in "[a-zA-Z0-9 *=.@-]*") {
        prop_assert_eq!(escape_literal(&s), s);
    }
}
