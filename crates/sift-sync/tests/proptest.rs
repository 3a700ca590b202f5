//! Property-based tests for query-string merging.

use proptest::prelude::*;
use sift_sync::{ParamPatch, QueryParams};

fn params_strategy() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec(("[a-e]{1,2}", "[ -~]{0,12}"), 0..8)
}

proptest! {
    /// After a merge the patch is visible and every other key is untouched.
    #[test]
    fn merge_applies_patch_and_keeps_the_rest(
        base in params_strategy(),
        updates in params_strategy(),
    ) {
        let original: QueryParams = base.iter().cloned().collect();
        let patch: ParamPatch = updates.iter().cloned().collect();

        let mut merged = QueryParams::parse(&original.to_query_string());
        merged.apply(&patch);
        let reread = QueryParams::parse(&merged.to_query_string());

        prop_assert!(patch.is_applied_to(&reread));
        for (key, _) in original.iter() {
            if !patch.contains(key) {
                prop_assert_eq!(reread.get(key), original.get(key));
            }
        }
    }
}
