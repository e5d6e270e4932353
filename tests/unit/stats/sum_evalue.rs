//! Sum e-values of joined HSPs against the closed-form statistics.

use crate::helpers::*;
use sumlink::core::blast_stat::{gap_decay_divisor, uneven_gap_sum_e};
use sumlink::core::link_hsps::{sum_hsp_evalue, SumEvaluator};
use sumlink::{BlastProgram, Hsp, LinkHspParameters, QueryInfo, ScoreBlock};

const LENGTH_ADJUSTMENT: i32 = 20;
const EFF_SEARCHSP: i64 = 250_000;

fn setup(program: BlastProgram) -> (QueryInfo, ScoreBlock, LinkHspParameters) {
    let lengths = vec![300; program.contexts_per_query()];
    let qi = QueryInfo::uniform(program, &lengths, LENGTH_ADJUSTMENT, EFF_SEARCHSP);
    let sbp = ScoreBlock::uniform(ungapped_protein_params(), lengths.len())
        .with_gapped(gapped_protein_params());
    let params = LinkHspParameters::for_program(program, true).with_longest_intron(122);
    (qi, sbp, params)
}

fn expected(num: i32, sumscore: i32, query_eff: i32, subject_eff: i32) -> f64 {
    let kbp = gapped_protein_params();
    let e = uneven_gap_sum_e(
        &kbp,
        40 + 9 + 1,
        9 + 122 + 1,
        num,
        sumscore as f64 * kbp.lambda,
        query_eff,
        subject_eff,
        gap_decay_divisor(0.1, num as usize),
    );
    e * EFF_SEARCHSP as f64 / (query_eff as f64 * subject_eff as f64)
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() <= 1e-12 * expected.abs(),
        "{} != {}",
        actual,
        expected
    );
}

#[test]
fn test_tblastn_pair_uses_codon_scaled_subject() {
    let (qi, sbp, params) = setup(BlastProgram::Tblastn);
    let head = make_hsp(60, 0, (10, 60), (100, 250), 1);
    let new = make_hsp(55, 0, (70, 120), (300, 450), 1);

    let (evalue, sumscore) =
        sum_hsp_evalue(BlastProgram::Tblastn, &sbp, &qi, 3000, &params, &head, &new).unwrap();

    assert_eq!(sumscore, 115);
    assert_close(evalue, expected(2, 115, 280, (3000 - 20) / 3));
}

#[test]
fn test_blastp_subject_is_not_scaled() {
    let (qi, sbp, params) = setup(BlastProgram::Blastp);
    let head = make_hsp(60, 0, (10, 60), (100, 150), 0);
    let new = make_hsp(55, 0, (70, 120), (300, 350), 0);

    let (evalue, _) =
        sum_hsp_evalue(BlastProgram::Blastp, &sbp, &qi, 3000, &params, &head, &new).unwrap();

    assert_close(evalue, expected(2, 115, 280, 3000 - 20));
}

#[test]
fn test_joining_to_a_set_counts_every_member() {
    let (qi, sbp, params) = setup(BlastProgram::Tblastn);
    let mut head = make_hsp(60, 0, (10, 60), (100, 250), 1);
    head.num = 2;
    head.sumscore = 115;
    let new = make_hsp(50, 0, (130, 180), (500, 650), 1);

    let (evalue, sumscore) =
        sum_hsp_evalue(BlastProgram::Tblastn, &sbp, &qi, 3000, &params, &head, &new).unwrap();

    assert_eq!(sumscore, 165);
    assert_close(evalue, expected(3, 165, 280, 993));
}

#[test]
fn test_evaluator_reads_statistics_from_the_given_context() {
    // Context 1 of a blastx query is shorter than context 0.
    let qi = QueryInfo::uniform(
        BlastProgram::Blastx,
        &[300, 120, 300, 300, 300, 300],
        LENGTH_ADJUSTMENT,
        EFF_SEARCHSP,
    );
    let (_, sbp, params) = setup(BlastProgram::Blastx);
    let evaluator = SumEvaluator {
        program: BlastProgram::Blastx,
        sbp: &sbp,
        query_info: &qi,
        subject_length: 3000,
        params: &params,
    };
    let head = Hsp::new(60, 0, sumlink::Seg::new(0, 10, 60), sumlink::Seg::new(1, 100, 250));
    let new = Hsp::new(55, 0, sumlink::Seg::new(0, 70, 120), sumlink::Seg::new(2, 300, 450));

    let (short, _) = evaluator.evaluate(1, &head, &new).unwrap();
    let (long, _) = evaluator.evaluate(0, &head, &new).unwrap();
    assert_close(short, expected(2, 115, 100, 2980));
    assert_close(long, expected(2, 115, 280, 2980));
}
