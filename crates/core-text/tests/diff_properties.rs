//! Property tests: a reconstructed edit always reproduces the new text and
//! never splits a surrogate pair.

use core_text::diff::reconstruct_edit;
use core_text::{replace_utf16, utf16_len};
use proptest::prelude::*;

fn text_strategy() -> impl Strategy<Value = String> {
    // Small alphabet so ambiguous runs show up often.
    proptest::collection::vec(prop_oneof!["a", "b", " ", "@", "🐱", "é"], 0..12)
        .prop_map(|parts| parts.concat())
}

proptest! {
    #[test]
    fn reconstructed_edit_replays_to_new_text(old in text_strategy(), new in text_strategy(), hint in 0usize..20) {
        match reconstruct_edit(&old, &new, hint) {
            None => prop_assert_eq!(&old, &new),
            Some(edit) => {
                prop_assert!(edit.range.end() <= utf16_len(&old));
                let replayed = replace_utf16(&old, edit.range, &edit.replacement).unwrap();
                prop_assert_eq!(replayed, new);
            }
        }
    }

    #[test]
    fn delta_matches_length_change(old in text_strategy(), new in text_strategy()) {
        if let Some(edit) = reconstruct_edit(&old, &new, 0) {
            prop_assert_eq!(
                edit.delta(),
                utf16_len(&new) as isize - utf16_len(&old) as isize
            );
        }
    }
}
