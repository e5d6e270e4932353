//! Linking every HSP list of a search.

use crate::helpers::*;
use sumlink::{link_hsp_lists, BlastProgram, HspList, LinkError, LinkHspParameters, LinkSummary};

fn params() -> LinkHspParameters {
    LinkHspParameters::default()
        .with_gap_size(10)
        .with_overlap_size(0)
        .with_cutoffs(0, 10)
}

fn pair_list(oid: usize) -> HspList {
    HspList::new(
        oid,
        5000,
        vec![
            make_hsp(55, 0, (15, 25), (15, 25), 0),
            make_hsp(60, 0, (0, 10), (0, 10), 0),
            make_hsp(40, 0, (300, 340), (10, 50), 0),
        ],
    )
}

#[test]
fn test_lists_are_linked_independently() {
    init_logger();
    let (qi, sbp) = search_setup(BlastProgram::Blastp, 500, 2_500_000);
    let mut lists = vec![pair_list(0), HspList::new(1, 800, Vec::new()), pair_list(2)];

    let summaries =
        link_hsp_lists(BlastProgram::Blastp, &mut lists, &qi, &sbp, &params(), false).unwrap();

    let linked = LinkSummary {
        hsps: 3,
        chains: 2,
        linked_hsps: 2,
    };
    assert_eq!(summaries, vec![linked, LinkSummary::default(), linked]);
    assert!(lists[1].is_empty());
    assert_eq!(lists[0].hsps, lists[2].hsps);
    for list in &lists {
        assert_chains_consistent(&list.hsps);
    }
    let heads: Vec<i32> = lists[0].chains().map(|c| c[0].score).collect();
    assert_eq!(heads, vec![60, 40]);
}

#[test]
fn test_failure_names_the_subject() {
    let (qi, sbp) = search_setup(BlastProgram::Blastp, 500, 2_500_000);
    let mut broken = pair_list(4);
    broken.hsps[2].context = 3;
    let mut lists = vec![pair_list(0), broken];

    let err = link_hsp_lists(BlastProgram::Blastp, &mut lists, &qi, &sbp, &params(), false)
        .unwrap_err();

    assert!(format!("{:#}", err).contains("subject 4"));
    assert_eq!(
        err.downcast_ref::<LinkError>(),
        Some(&LinkError::MissingKarlinBlock { context: 3 })
    );
}
