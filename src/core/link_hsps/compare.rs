//! HSP orderings used to sort and search during linking.
//!
//! Reference: link_hsps.c fwd_compare_hsps, end_compare_hsps,
//! rev_compare_hsps*, sumscore_compare_hsps, hsp_binary_search
//!
//! The `_transl` and `_tbx` variants compare `context / 3`, which groups the
//! three frames of one query strand. The `_tbn` and `_tbx` variants put
//! positive subject frames before negative ones.

use std::cmp::Ordering;

use crate::core::blast_hits::Hsp;

const FRAMES_PER_STRAND: usize = 3;

/// Context, then query offset, then subject offset, ascending.
pub fn fwd_compare_hsps(h1: &Hsp, h2: &Hsp) -> Ordering {
    h1.context
        .cmp(&h2.context)
        .then(h1.query.offset.cmp(&h2.query.offset))
        .then(h1.subject.offset.cmp(&h2.subject.offset))
}

pub fn fwd_compare_hsps_transl(h1: &Hsp, h2: &Hsp) -> Ordering {
    (h1.context / FRAMES_PER_STRAND)
        .cmp(&(h2.context / FRAMES_PER_STRAND))
        .then(h1.query.offset.cmp(&h2.query.offset))
        .then(h1.subject.offset.cmp(&h2.subject.offset))
}

/// Context, then query end, then subject end, ascending.
pub fn end_compare_hsps(h1: &Hsp, h2: &Hsp) -> Ordering {
    h1.context
        .cmp(&h2.context)
        .then(h1.query.end.cmp(&h2.query.end))
        .then(h1.subject.end.cmp(&h2.subject.end))
}

/// Context ascending, then query offset and subject offset descending.
pub fn rev_compare_hsps(h1: &Hsp, h2: &Hsp) -> Ordering {
    h1.context
        .cmp(&h2.context)
        .then(h2.query.offset.cmp(&h1.query.offset))
        .then(h2.subject.offset.cmp(&h1.subject.offset))
}

pub fn rev_compare_hsps_transl(h1: &Hsp, h2: &Hsp) -> Ordering {
    (h1.context / FRAMES_PER_STRAND)
        .cmp(&(h2.context / FRAMES_PER_STRAND))
        .then(h2.query.offset.cmp(&h1.query.offset))
        .then(h2.subject.offset.cmp(&h1.subject.offset))
}

/// Subject strand, positive first.
#[inline]
fn subject_sign_desc(h1: &Hsp, h2: &Hsp) -> Ordering {
    h2.subject.strand().cmp(&h1.subject.strand())
}

/// Reverse order for untranslated queries, split by subject strand.
pub fn rev_compare_hsps_tbn(h1: &Hsp, h2: &Hsp) -> Ordering {
    h1.context
        .cmp(&h2.context)
        .then_with(|| subject_sign_desc(h1, h2))
        .then(h2.query.offset.cmp(&h1.query.offset))
        .then(h2.subject.offset.cmp(&h1.subject.offset))
}

/// Reverse order for translated queries, split by subject strand.
pub fn rev_compare_hsps_tbx(h1: &Hsp, h2: &Hsp) -> Ordering {
    (h1.context / FRAMES_PER_STRAND)
        .cmp(&(h2.context / FRAMES_PER_STRAND))
        .then_with(|| subject_sign_desc(h1, h2))
        .then(h2.query.offset.cmp(&h1.query.offset))
        .then(h2.subject.offset.cmp(&h1.subject.offset))
}

/// Best known score descending; ties go to the earlier, then longer,
/// subject segment.
pub fn sumscore_compare_hsps(h1: &Hsp, h2: &Hsp) -> Ordering {
    let score1 = h1.sumscore.max(h1.score);
    let score2 = h2.sumscore.max(h2.score);
    score2
        .cmp(&score1)
        .then(h1.subject.offset.cmp(&h2.subject.offset))
        .then(h2.subject.length().cmp(&h1.subject.length()))
}

/// Lower bound: the first position whose coordinate is `>= offset`, or
/// `coords.len()` when there is none.
///
/// `coord` reads the query offset for a search to the right and the query
/// end for a search to the left.
pub fn hsp_binary_search<T>(items: &[T], offset: i32, coord: impl Fn(&T) -> i32) -> usize {
    let mut begin = 0usize;
    let mut end = items.len();
    while begin < end {
        let index = (begin + end) / 2;
        if coord(&items[index]) >= offset {
            end = index;
        } else {
            begin = index + 1;
        }
    }
    end
}
