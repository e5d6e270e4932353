//! Test utilities and helpers for unit tests
//!
//! - HSP and search-layout fixtures
//! - Chain-structure assertions shared by scenario and property tests

use sumlink::{chains, BlastProgram, Hsp, KarlinParams, QueryInfo, ScoreBlock, Seg};

/// BLOSUM62 ungapped Karlin-Altschul parameters.
pub fn ungapped_protein_params() -> KarlinParams {
    KarlinParams::new(0.3176, 0.134, 0.4012)
}

/// BLOSUM62 gapped (11/1) Karlin-Altschul parameters.
pub fn gapped_protein_params() -> KarlinParams {
    KarlinParams::new(0.267, 0.041, 0.14)
}

/// Build an HSP. Coordinates are `(offset, end)` with `end` exclusive.
pub fn make_hsp(score: i32, context: usize, q: (i32, i32), s: (i32, i32), s_frame: i16) -> Hsp {
    Hsp::new(score, context, Seg::new(0, q.0, q.1), Seg::new(s_frame, s.0, s.1))
}

/// One query of `query_length` per context, ungapped and gapped blocks for
/// every context.
pub fn search_setup(
    program: BlastProgram,
    query_length: i32,
    eff_searchsp: i64,
) -> (QueryInfo, ScoreBlock) {
    let lengths = vec![query_length; program.contexts_per_query()];
    let qi = QueryInfo::uniform(program, &lengths, 0, eff_searchsp);
    let sbp = ScoreBlock::uniform(ungapped_protein_params(), lengths.len())
        .with_gapped(gapped_protein_params());
    (qi, sbp)
}

/// Route `log` output through the test harness.
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Sortable identity of an HSP, ignoring chain annotations.
pub fn identity(hsp: &Hsp) -> (usize, i32, i32, i32, i32, i32, i16) {
    (
        hsp.context,
        hsp.score,
        hsp.query.offset,
        hsp.query.end,
        hsp.subject.offset,
        hsp.subject.end,
        hsp.subject.frame,
    )
}

/// Every chain is contiguous and head first, and its members agree with
/// the head on `num`, `evalue` and `sumscore`.
pub fn assert_chains_consistent(hsps: &[Hsp]) {
    let mut seen = 0;
    for chain in chains(hsps) {
        let head = &chain[0];
        assert!(head.is_chain_head(), "chain does not start at a head: {:?}", head);
        if head.linked_set {
            assert_eq!(head.num as usize, chain.len(), "num disagrees with chain: {:?}", chain);
            for member in &chain[1..] {
                assert!(member.linked_set && !member.start_of_chain, "bad member {:?}", member);
                assert_eq!(member.num, head.num);
                assert_eq!(member.evalue, head.evalue);
                assert_eq!(member.sumscore, head.sumscore);
            }
        } else {
            assert_eq!(head.num, 1, "singleton with num {}", head.num);
            assert_eq!(head.sumscore, head.score);
        }
        seen += chain.len();
    }
    assert_eq!(seen, hsps.len());
}
