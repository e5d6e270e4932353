//! Comparator consistency and binary search over random HSPs.

use std::cmp::Ordering;

use proptest::prelude::*;

use crate::helpers::*;
use sumlink::core::link_hsps::{
    end_compare_hsps, fwd_compare_hsps, fwd_compare_hsps_transl, hsp_binary_search,
    rev_compare_hsps, rev_compare_hsps_tbn, rev_compare_hsps_tbx, rev_compare_hsps_transl,
    sumscore_compare_hsps,
};
use sumlink::Hsp;

type Comparator = fn(&Hsp, &Hsp) -> Ordering;

const COMPARATORS: [Comparator; 8] = [
    fwd_compare_hsps,
    fwd_compare_hsps_transl,
    end_compare_hsps,
    rev_compare_hsps,
    rev_compare_hsps_transl,
    rev_compare_hsps_tbn,
    rev_compare_hsps_tbx,
    sumscore_compare_hsps,
];

fn hsp_strategy() -> impl Strategy<Value = Hsp> {
    (
        0i32..40,
        0usize..6,
        0i32..30,
        1i32..10,
        0i32..30,
        1i32..10,
        prop::sample::select(vec![-2i16, -1, 1, 2]),
    )
        .prop_map(|(score, context, q_off, q_len, s_off, s_len, frame)| {
            make_hsp(score, context, (q_off, q_off + q_len), (s_off, s_off + s_len), frame)
        })
}

proptest! {
    #[test]
    fn comparators_are_antisymmetric(a in hsp_strategy(), b in hsp_strategy()) {
        for cmp in COMPARATORS {
            prop_assert_eq!(cmp(&a, &b), cmp(&b, &a).reverse());
            prop_assert_eq!(cmp(&a, &a), Ordering::Equal);
        }
    }

    #[test]
    fn sorted_order_holds_pairwise(hsps in prop::collection::vec(hsp_strategy(), 0usize..20)) {
        for cmp in COMPARATORS {
            let mut sorted = hsps.clone();
            sorted.sort_by(cmp);
            for pair in sorted.windows(2) {
                prop_assert_ne!(cmp(&pair[0], &pair[1]), Ordering::Greater);
            }
        }
    }

    #[test]
    fn binary_search_is_a_lower_bound(
        mut offsets in prop::collection::vec(0i32..50, 0usize..20),
        target in -5i32..55,
    ) {
        offsets.sort();
        let i = hsp_binary_search(&offsets, target, |&o| o);
        prop_assert!(i <= offsets.len());
        prop_assert!(offsets[..i].iter().all(|&o| o < target));
        prop_assert!(offsets[i..].iter().all(|&o| o >= target));
    }
}
