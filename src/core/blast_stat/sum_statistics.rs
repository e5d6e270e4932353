//! Sum statistics for multi-HSP E-values.
//!
//! Reference: blast_stat.c s_BlastSumP, BLAST_SmallGapSumE,
//! BLAST_UnevenGapSumE, BLAST_LargeGapSumE, BLAST_GapDecayDivisor
//!
//! The `*_sum_e` functions take `xsum`, the Lambda-scaled score total of a
//! chain (sum of `lambda * score`), and subtract `num * ln K` themselves.
//! They return the E-value over the pair search space `query_length *
//! subject_length`; callers project it onto the context's effective search
//! space.

use super::karlin_params::KarlinParams;
use crate::core::ncbi_math::{expm1, ln_factorial, ln_gamma_int, log1p, powi, romberg_integrate};

/// Largest e-value reported; larger values are clamped to it.
pub const MAX_EVALUE: f64 = i32::MAX as f64;

/// Gap decay divisor for weighting E-values when multiple alignments are considered.
///
/// Formula: (1 - decayrate) * decayrate^(nsegs - 1)
pub fn gap_decay_divisor(decay_rate: f64, num_segments: usize) -> f64 {
    if num_segments == 0 {
        return 1.0;
    }
    (1.0 - decay_rate) * powi(decay_rate, (num_segments - 1) as i32)
}

/// Convert P-value to E-value: E = -ln(1 - P).
pub fn p_to_e(p: f64) -> f64 {
    if !(0.0..=1.0).contains(&p) {
        return i32::MIN as f64;
    }
    if p == 1.0 {
        return MAX_EVALUE;
    }
    -log1p(-p)
}

/// Convert E-value to P-value: P = 1 - exp(-E).
pub fn e_to_p(e: f64) -> f64 {
    if e < 0.0 {
        return 0.0;
    }
    -expm1(-e)
}

// Interpolation tables for s_BlastSumP, r = 2, 3, 4.
const TAB2: &[f64] = &[
    0.01669, 0.0249, 0.03683, 0.05390, 0.07794, 0.1111, 0.1559, 0.2146, 0.2890, 0.3794, 0.4836,
    0.5965, 0.7092, 0.8114, 0.8931, 0.9490, 0.9806, 0.9944, 0.9989,
];

const TAB3: &[f64] = &[
    0.0001682, 0.0002542, 0.0003829, 0.0005745, 0.0008587, 0.001278,
    0.001893, 0.002789, 0.004088, 0.005958, 0.008627, 0.01240, 0.01770, 0.02505, 0.03514, 0.04880,
    0.06704, 0.09103, 0.1220, 0.1612, 0.2097, 0.2682, 0.3368, 0.4145, 0.4994, 0.5881, 0.6765,
    0.7596, 0.8326, 0.8922, 0.9367, 0.9667, 0.9846, 0.9939, 0.9980,
];

const TAB4: &[f64] = &[
    2.658e-07, 4.064e-07, 6.203e-07, 9.450e-07, 1.437e-06, 2.181e-06, 3.302e-06, 4.990e-06,
    7.524e-06, 1.132e-05, 1.698e-05, 2.541e-05, 3.791e-05, 5.641e-05, 8.368e-05, 0.0001237,
    0.0001823, 0.0002677, 0.0003915, 0.0005704, 0.0008275, 0.001195, 0.001718, 0.002457, 0.003494,
    0.004942, 0.006948, 0.009702, 0.01346, 0.01853, 0.02532, 0.03431, 0.04607, 0.06128, 0.08068,
    0.1051, 0.1352, 0.1719, 0.2157, 0.2669, 0.3254, 0.3906, 0.4612, 0.5355, 0.6110, 0.6849, 0.7544,
    0.8168, 0.8699, 0.9127, 0.9451, 0.9679, 0.9827, 0.9915, 0.9963,
];

/// Sum P-value by double Romberg integration.
fn sum_p_calc(r: i32, s: f64) -> f64 {
    const SUMP_EPSILON: f64 = 0.002;

    if r == 1 {
        if s > 8.0 {
            return (-s).exp();
        }
        return -expm1(-(-s).exp());
    }
    if r < 1 {
        return 0.0;
    }

    let rf = r as f64;
    let quick_bound = match r {
        2..=7 => Some(-2.3),
        8..=14 => Some(-2.5),
        15..=26 => Some(-3.0),
        27..=50 => Some(-3.4),
        51..=100 => Some(-4.0),
        _ => None,
    };
    if let Some(bound) = quick_bound {
        if s <= bound * rf {
            return 1.0;
        }
    }

    let stddev = rf.sqrt();
    let stddev4 = 4.0 * stddev;
    let r1 = r - 1;

    // log(r) <= r gives a cheap lower bound on the mean for large r.
    if r > 100 && s <= -rf * (r1 as f64) - stddev4 {
        return 1.0;
    }

    let logr = rf.ln();
    let mean = rf * (1.0 - logr) - 0.5;
    if s <= mean - stddev4 {
        return 1.0;
    }

    let (t, mut itmin) = if s >= mean {
        (s + 6.0 * stddev, 1)
    } else {
        (mean + 6.0 * stddev, 2)
    };

    let adj1 = (r - 2) as f64 * logr - ln_gamma_int(r1) - ln_gamma_int(r);
    let power = r - 2;

    let outer = |x: f64, adj2: f64, sdvir: f64| -> f64 {
        let y = (x - sdvir).exp();
        if !y.is_finite() {
            return 0.0;
        }
        if power == 0 {
            return (adj2 - y).exp();
        }
        if x == 0.0 {
            return 0.0;
        }
        ((power as f64) * x.ln() + adj2 - y).exp()
    };

    let mut inner = |s_var: f64| -> f64 {
        let adj2 = adj1 - s_var;
        let sdvir = s_var / rf;
        let mx = if s_var > 0.0 { sdvir + 3.0 } else { 3.0 };
        let mut f = |x: f64| outer(x, adj2, sdvir);
        romberg_integrate(&mut f, 0.0, mx, SUMP_EPSILON, 0, 1)
    };

    loop {
        let d = romberg_integrate(&mut inner, s, t, SUMP_EPSILON, 0, itmin);
        if !d.is_finite() {
            return d;
        }
        if !(s < mean && d < 0.4 && itmin < 4) {
            return d.min(1.0);
        }
        itmin += 1;
    }
}

/// Probability that `r` HSPs reach normalized sum score `s`.
///
/// Table interpolation for r <= 4, integration above that.
fn sum_p(r: i32, s: f64) -> f64 {
    if r == 1 {
        return -expm1(-(-s).exp());
    }
    if r > 4 {
        return sum_p_calc(r, s);
    }
    if r < 1 {
        return 0.0;
    }

    let rf = r as f64;
    let r1 = (r - 1) as f64;
    if s >= rf * rf + r1 {
        let a = ln_gamma_int(r + 1);
        return rf * (r1 * s.ln() - s - a - a).exp();
    }
    if s > -2.0 * rf {
        let table = match r {
            2 => TAB2,
            3 => TAB3,
            _ => TAB4,
        };
        let mut a = s + s + 4.0 * rf;
        let i = a as i32;
        a -= i as f64;
        let idx = (table.len() as i32 - 1) - i;
        if idx > 0 && (idx as usize) < table.len() {
            let idx = idx as usize;
            return a * table[idx - 1] + (1.0 - a) * table[idx];
        }
    }
    1.0
}

/// Divide by the gap-decay weight, clamping overflow.
fn weighted(sum_e: f64, weight_divisor: f64) -> f64 {
    if weight_divisor == 0.0 {
        return MAX_EVALUE;
    }
    let e = sum_e / weight_divisor;
    if e > MAX_EVALUE {
        MAX_EVALUE
    } else {
        e
    }
}

/// E-value for `num` alignments separated by "small" gaps.
///
/// * `starting_points` - positions allowed between adjacent alignments
///   (typically overlap + gap + 1)
/// * `xsum` - sum of `lambda * score` over the chain
pub fn small_gap_sum_e(
    kbp: &KarlinParams,
    starting_points: i32,
    num: i32,
    xsum: f64,
    query_length: i32,
    subject_length: i32,
    weight_divisor: f64,
) -> f64 {
    let search_space = (subject_length as f64) * (query_length as f64);
    let xsum = xsum - (num as f64) * kbp.log_k();

    let sum_e = if num == 1 {
        search_space * (-xsum).exp()
    } else {
        let adjusted = xsum
            - (search_space.ln() + 2.0 * ((num - 1) as f64) * (starting_points as f64).ln())
            - ln_factorial(num as f64);
        p_to_e(sum_p(num, adjusted))
    };
    weighted(sum_e, weight_divisor)
}

/// E-value for `num` alignments whose gaps differ between query and subject.
///
/// The query and subject windows bound where the next alignment may start on
/// each axis; the subject window carries the intron allowance.
#[allow(clippy::too_many_arguments)]
pub fn uneven_gap_sum_e(
    kbp: &KarlinParams,
    query_start_points: i32,
    subject_start_points: i32,
    num: i32,
    xsum: f64,
    query_length: i32,
    subject_length: i32,
    weight_divisor: f64,
) -> f64 {
    let search_space = (subject_length as f64) * (query_length as f64);
    let xsum = xsum - (num as f64) * kbp.log_k();

    let sum_e = if num == 1 {
        search_space * (-xsum).exp()
    } else {
        let adjusted = xsum
            - (search_space.ln()
                + ((num - 1) as f64)
                    * ((query_start_points as f64).ln() + (subject_start_points as f64).ln()))
            - ln_factorial(num as f64);
        p_to_e(sum_p(num, adjusted))
    };
    weighted(sum_e, weight_divisor)
}

/// E-value for `num` alignments with arbitrarily large gaps.
pub fn large_gap_sum_e(
    kbp: &KarlinParams,
    num: i32,
    xsum: f64,
    query_length: i32,
    subject_length: i32,
    weight_divisor: f64,
) -> f64 {
    let search_space = (subject_length as f64) * (query_length as f64);
    let xsum = xsum - (num as f64) * kbp.log_k();

    let sum_e = if num == 1 {
        search_space * (-xsum).exp()
    } else {
        let adjusted = xsum - (num as f64) * search_space.ln() + ln_factorial(num as f64);
        p_to_e(sum_p(num, adjusted))
    };
    weighted(sum_e, weight_divisor)
}
