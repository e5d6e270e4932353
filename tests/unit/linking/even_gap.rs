//! Even-gap linking scenarios through `link_hsps`.

use crate::helpers::*;
use sumlink::core::blast_stat::{gap_decay_divisor, large_gap_sum_e};
use sumlink::{
    link_hsps, BlastProgram, Hsp, LinkHspParameters, LinkOrderingMethod, RecomputePolicy,
};

const SUBJECT_LENGTH: i32 = 5000;

fn tight_params() -> LinkHspParameters {
    LinkHspParameters::default()
        .with_gap_size(10)
        .with_overlap_size(0)
        .with_cutoffs(0, 10)
}

fn link(program: BlastProgram, hsps: &mut [Hsp], params: &LinkHspParameters) {
    init_logger();
    let (qi, sbp) = search_setup(program, 500, 2_500_000);
    link_hsps(program, hsps, &qi, SUBJECT_LENGTH, &sbp, params, false).unwrap();
}

fn scores(hsps: &[Hsp]) -> Vec<i32> {
    hsps.iter().map(|h| h.score).collect()
}

#[test]
fn test_two_adjacent_hsps_form_one_chain() {
    let mut hsps = vec![
        make_hsp(55, 0, (15, 25), (15, 25), 0),
        make_hsp(60, 0, (0, 10), (0, 10), 0),
    ];
    link(BlastProgram::Blastp, &mut hsps, &tight_params());

    assert_eq!(scores(&hsps), vec![60, 55]);
    assert!(hsps[0].start_of_chain && hsps[0].linked_set);
    assert!(hsps[1].linked_set && !hsps[1].start_of_chain);
    assert!(hsps.iter().all(|h| h.num == 2 && h.sumscore == 115));
    assert_eq!(hsps[0].ordering_method, Some(LinkOrderingMethod::LargeGaps));
    assert_chains_consistent(&hsps);

    // The pair is more significant than its best member alone.
    let kbp = ungapped_protein_params();
    let alone = large_gap_sum_e(
        &kbp,
        1,
        60.0 * kbp.lambda,
        500,
        SUBJECT_LENGTH,
        gap_decay_divisor(0.5, 1),
    );
    assert!(hsps[0].evalue < alone, "{} >= {}", hsps[0].evalue, alone);
    assert!(hsps[0].evalue > 1e-5 && hsps[0].evalue < 1e-3);
}

#[test]
fn test_small_gap_ordering_wins_when_enabled() {
    let params = tight_params().with_cutoffs(5, 10);
    let mut hsps = vec![
        make_hsp(60, 0, (0, 10), (0, 10), 0),
        make_hsp(55, 0, (15, 25), (15, 25), 0),
    ];
    link(BlastProgram::Blastp, &mut hsps, &params);

    assert!(hsps.iter().all(|h| h.num == 2 && h.sumscore == 115));
    assert!(hsps
        .iter()
        .all(|h| h.ordering_method == Some(LinkOrderingMethod::SmallGaps)));
    assert!(hsps[0].evalue < 1e-6);
}

#[test]
fn test_small_gap_window_caps_predecessor_distance() {
    // gap 10 and overlap 0 give a window of 11 past the end of the first HSP.
    let params = tight_params().with_cutoffs(5, 10);
    let pair = |offset: i32| {
        let mut hsps = vec![
            make_hsp(60, 0, (0, 10), (0, 10), 0),
            make_hsp(55, 0, (offset, offset + 10), (offset, offset + 10), 0),
        ];
        link(BlastProgram::Blastp, &mut hsps, &params);
        assert!(hsps.iter().all(|h| h.num == 2 && h.sumscore == 115));
        assert_chains_consistent(&hsps);
        hsps[0].ordering_method
    };

    assert_eq!(pair(21), Some(LinkOrderingMethod::SmallGaps));
    assert_eq!(pair(22), Some(LinkOrderingMethod::LargeGaps));
    assert_eq!(pair(100), Some(LinkOrderingMethod::LargeGaps));
}

#[test]
fn test_three_hsps_on_a_diagonal_chain_in_order() {
    let mut hsps = vec![
        make_hsp(50, 0, (30, 40), (30, 40), 0),
        make_hsp(60, 0, (0, 10), (0, 10), 0),
        make_hsp(55, 0, (15, 25), (15, 25), 0),
    ];
    link(BlastProgram::Blastp, &mut hsps, &tight_params());

    assert_eq!(scores(&hsps), vec![60, 55, 50]);
    assert!(hsps.iter().all(|h| h.num == 3 && h.sumscore == 165));
    assert_chains_consistent(&hsps);
}

#[test]
fn test_weak_hsp_below_cutoff_starts_no_chain() {
    // At the large-gap cutoff an HSP may not extend a chain.
    let mut hsps = vec![
        make_hsp(10, 0, (0, 10), (0, 10), 0),
        make_hsp(55, 0, (15, 25), (15, 25), 0),
    ];
    link(BlastProgram::Blastp, &mut hsps, &tight_params());

    assert!(hsps.iter().all(|h| !h.linked_set && h.num == 1));
    assert_eq!(scores(&hsps), vec![10, 55]);
    assert_chains_consistent(&hsps);
}

#[test]
fn test_opposite_subject_strands_do_not_chain() {
    let mut hsps = vec![
        make_hsp(60, 0, (0, 10), (0, 10), 1),
        make_hsp(55, 0, (15, 25), (15, 25), -1),
    ];
    link(BlastProgram::Blastn, &mut hsps, &tight_params());

    assert!(hsps.iter().all(|h| !h.linked_set && h.num == 1));
    assert_eq!(hsps[0].sumscore, hsps[0].score);
    assert_chains_consistent(&hsps);
}

#[test]
fn test_tblastx_links_frames_of_one_strand_only() {
    // Contexts 0 and 1 are frames of the plus strand, context 3 is minus.
    let mut hsps = vec![
        make_hsp(50, 3, (30, 40), (30, 40), 1),
        make_hsp(55, 1, (15, 25), (15, 25), 1),
        make_hsp(60, 0, (0, 10), (0, 10), 1),
    ];
    init_logger();
    let (qi, sbp) = search_setup(BlastProgram::Tblastx, 300, 300_000);
    link_hsps(
        BlastProgram::Tblastx,
        &mut hsps,
        &qi,
        3000,
        &sbp,
        &tight_params(),
        false,
    )
    .unwrap();

    assert_eq!(scores(&hsps), vec![60, 55, 50]);
    assert_eq!((hsps[0].num, hsps[1].num, hsps[2].num), (2, 2, 1));
    assert_eq!((hsps[0].context, hsps[1].context), (0, 1));
    assert!(!hsps[2].linked_set);
    assert_chains_consistent(&hsps);
}

#[test]
fn test_full_recompute_matches_incremental() {
    // Two competing diagonals sharing HSPs force several passes.
    let hsps = vec![
        make_hsp(70, 0, (0, 30), (0, 30), 0),
        make_hsp(40, 0, (40, 60), (40, 60), 0),
        make_hsp(65, 0, (45, 80), (200, 235), 0),
        make_hsp(30, 0, (90, 110), (100, 120), 0),
        make_hsp(45, 0, (100, 140), (250, 290), 0),
        make_hsp(25, 0, (150, 170), (300, 320), 0),
        make_hsp(35, 0, (200, 230), (20, 50), 0),
    ];
    let params = LinkHspParameters::default().with_cutoffs(8, 12);

    let mut incremental = hsps.clone();
    link(BlastProgram::Blastp, &mut incremental, &params);
    let mut full = hsps;
    link(
        BlastProgram::Blastp,
        &mut full,
        &params.with_recompute(RecomputePolicy::Full),
    );

    assert_eq!(incremental, full);
    assert_chains_consistent(&incremental);
}

#[test]
fn test_relinking_resets_previous_annotations() {
    let mut hsps = vec![
        make_hsp(60, 0, (0, 10), (0, 10), 0),
        make_hsp(55, 0, (15, 25), (15, 25), 0),
    ];
    link(BlastProgram::Blastp, &mut hsps, &tight_params());
    let first = hsps.clone();
    link(BlastProgram::Blastp, &mut hsps, &tight_params());
    assert_eq!(hsps, first);
}
