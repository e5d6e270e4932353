//! Randomized invariants of even-gap linking.

use proptest::prelude::*;

use crate::helpers::*;
use sumlink::{
    chains, link_hsps, BlastProgram, Hsp, LinkHspParameters, LinkOrderingMethod, RecomputePolicy,
};

const QUERY_LENGTH: i32 = 500;
const SUBJECT_LENGTH: i32 = 3000;

fn hsp_strategy() -> impl Strategy<Value = Hsp> {
    (
        15i32..120,
        0i32..440,
        4i32..60,
        0i32..900,
        4i32..60,
        prop::sample::select(vec![-3i16, -2, -1, 1, 2, 3]),
    )
        .prop_map(|(score, q_off, q_len, s_off, s_len, frame)| {
            make_hsp(score, 0, (q_off, q_off + q_len), (s_off, s_off + s_len), frame)
        })
}

fn params_strategy() -> impl Strategy<Value = LinkHspParameters> {
    (0i32..50, 0i32..12, prop_oneof![Just(0i32), 1i32..30], 0i32..30).prop_map(
        |(gap_size, overlap_size, small, big)| {
            LinkHspParameters::default()
                .with_gap_size(gap_size)
                .with_overlap_size(overlap_size)
                .with_cutoffs(small, big)
        },
    )
}

fn run(hsps: &mut [Hsp], params: &LinkHspParameters) {
    let (qi, sbp) = search_setup(BlastProgram::Tblastn, QUERY_LENGTH, 1_000_000);
    link_hsps(BlastProgram::Tblastn, hsps, &qi, SUBJECT_LENGTH, &sbp, params, false).unwrap();
}

/// Trimmed `(offset, end)` of a segment, as adjacency is judged.
fn trimmed(offset: i32, end: i32, trim_size: i32) -> (i32, i32) {
    let trim = ((end - offset) / 4).min(trim_size);
    (offset + trim, end - trim)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn linking_permutes_and_annotates_consistently(
        hsps in prop::collection::vec(hsp_strategy(), 1usize..14),
        params in params_strategy(),
    ) {
        let mut linked = hsps.clone();
        run(&mut linked, &params);

        let mut before: Vec<_> = hsps.iter().map(identity).collect();
        let mut after: Vec<_> = linked.iter().map(identity).collect();
        before.sort();
        after.sort();
        prop_assert_eq!(before, after);

        assert_chains_consistent(&linked);
        for hsp in &linked {
            prop_assert!(hsp.evalue.is_finite() && hsp.evalue >= 0.0, "evalue {}", hsp.evalue);
            prop_assert!(hsp.ordering_method.is_some());
        }
    }

    #[test]
    fn chain_members_advance_on_both_sequences(
        hsps in prop::collection::vec(hsp_strategy(), 1usize..14),
        params in params_strategy(),
    ) {
        let mut linked = hsps;
        run(&mut linked, &params);

        let trim_size = params.trim_size();
        for chain in chains(&linked) {
            let strand = chain[0].subject.strand();
            for pair in chain.windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                prop_assert_eq!(b.subject.strand(), strand);
                prop_assert_eq!(a.context, b.context);
                let (_, a_q_end) = trimmed(a.query.offset, a.query.end, trim_size);
                let (_, a_s_end) = trimmed(a.subject.offset, a.subject.end, trim_size);
                let (b_q_off, _) = trimmed(b.query.offset, b.query.end, trim_size);
                let (b_s_off, _) = trimmed(b.subject.offset, b.subject.end, trim_size);
                prop_assert!(b_q_off > a_q_end, "{:?} then {:?}", a, b);
                prop_assert!(b_s_off > a_s_end, "{:?} then {:?}", a, b);
                if chain[0].ordering_method == Some(LinkOrderingMethod::SmallGaps) {
                    let window = params.window_size();
                    prop_assert!(b_q_off - a_q_end <= window, "{:?} then {:?}", a, b);
                    prop_assert!(b_s_off - a_s_end <= window, "{:?} then {:?}", a, b);
                }
            }
        }
    }

    #[test]
    fn incremental_recompute_matches_full(
        hsps in prop::collection::vec(hsp_strategy(), 1usize..14),
        params in params_strategy(),
    ) {
        let mut incremental = hsps.clone();
        run(&mut incremental, &params.clone().with_recompute(RecomputePolicy::Incremental));
        let mut full = hsps;
        run(&mut full, &params.with_recompute(RecomputePolicy::Full));
        prop_assert_eq!(incremental, full);
    }
}
