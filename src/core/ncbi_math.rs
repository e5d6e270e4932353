//! Numeric helpers used by the sum-statistics formulas.
//!
//! Reference: ncbi-blast/c++/src/algo/blast/core/ncbi_math.c
//!
//! These mirror the NCBI routines rather than `std` where the results
//! differ in the last bits, so that sum-statistics e-values are stable
//! across platforms.

const LOGDERIV_ORDER_MAX: usize = 4;
const POLYGAMMA_ORDER_MAX: usize = LOGDERIV_ORDER_MAX;
const NCBIMATH_PI: f64 = std::f64::consts::PI;
const NCBIMATH_LN2: f64 = std::f64::consts::LN_2;
const NCBIMATH_LNPI: f64 = 1.144_729_885_849_400_2;

/// Lanczos-style coefficients for the log-gamma series.
const GAMMA_COEF: [f64; 11] = [
    4.694580336184385e+04,
    -1.560605207784446e+05,
    2.065049568014106e+05,
    -1.388934775095388e+05,
    5.031796415085709e+04,
    -9.601592329182778e+03,
    8.785855930895250e+02,
    -3.155153906098611e+01,
    2.908143421162229e-01,
    -2.319827630494973e-04,
    1.251639670050933e-10,
];

const PRECOMPUTED_FACTORIAL: [f64; 35] = [
    1.0,
    1.0,
    2.0,
    6.0,
    24.0,
    120.0,
    720.0,
    5040.0,
    40320.0,
    362880.0,
    3628800.0,
    39916800.0,
    479001600.0,
    6227020800.0,
    87178291200.0,
    1307674368000.0,
    20922789888000.0,
    355687428096000.0,
    6402373705728000.0,
    121645100408832000.0,
    2432902008176640000.0,
    51090942171709440000.0,
    1124000727777607680000.0,
    25852016738884976640000.0,
    620448401733239439360000.0,
    15511210043330985984000000.0,
    403291461126605635584000000.0,
    10888869450418352160768000000.0,
    304888344611713860501504000000.0,
    8841761993739701954543616000000.0,
    265252859812191058636308480000000.0,
    8222838654177922817725562880000000.0,
    263130836933693530167218012160000000.0,
    8683317618811886495518194401280000000.0,
    295232799039604140847618609643520000000.0,
];

/// `exp(x) - 1`, accurate near zero.
pub fn expm1(x: f64) -> f64 {
    let absx = x.abs();
    if absx > 0.33 {
        return x.exp() - 1.0;
    }
    if absx < 1.0e-16 {
        return x;
    }
    // Horner form of the Taylor series through x^13.
    let mut term = 1.0 / 6227020800.0;
    for divisor in [
        479001600.0,
        39916800.0,
        3628800.0,
        362880.0,
        40320.0,
        5040.0,
        720.0,
        120.0,
        24.0,
        6.0,
        2.0,
        1.0,
    ] {
        term = 1.0 / divisor + x * term;
    }
    x * term
}

/// `ln(1 + x)`, accurate near zero.
pub fn log1p(x: f64) -> f64 {
    if x.abs() >= 0.2 {
        return (x + 1.0).ln();
    }
    let mut sum = 0.0;
    let mut y = x;
    let mut i = 0;
    while i < 500 {
        i += 1;
        sum += y / (i as f64);
        if y.abs() < f64::EPSILON {
            break;
        }
        y *= x;
        i += 1;
        sum -= y / (i as f64);
        if y < f64::EPSILON {
            break;
        }
        y *= x;
    }
    sum
}

/// Integer power by repeated squaring.
pub fn powi(mut x: f64, mut n: i32) -> f64 {
    if n == 0 {
        return 1.0;
    }
    if x == 0.0 {
        return if n < 0 { f64::INFINITY } else { 0.0 };
    }
    if n < 0 {
        x = 1.0 / x;
        n = -n;
    }
    let mut y = 1.0;
    while n > 0 {
        if n & 1 != 0 {
            y *= x;
        }
        n /= 2;
        x *= x;
    }
    y
}

/// Round half away from zero (NCBI `BLAST_Nint`).
#[inline]
pub fn nint(x: f64) -> i64 {
    let rounded = if x >= 0.0 { x + 0.5 } else { x - 0.5 };
    rounded as i64
}

fn log_derivative(order: usize, u: &[f64]) -> f64 {
    if order > LOGDERIV_ORDER_MAX || (order > 0 && u[0] == 0.0) {
        return f64::INFINITY;
    }
    let mut y = [0.0; LOGDERIV_ORDER_MAX + 1];
    for i in 1..=order {
        y[i] = u[i] / u[0];
    }
    match order {
        0 => {
            if u[0] > 0.0 {
                u[0].ln()
            } else {
                f64::INFINITY
            }
        }
        1 => y[1],
        2 => y[2] - y[1] * y[1],
        3 => y[3] - 3.0 * y[2] * y[1] + 2.0 * y[1] * y[1] * y[1],
        _ => {
            let sq = y[1] * y[1];
            y[4] - 4.0 * y[3] * y[1] - 3.0 * y[2] * y[2] + 12.0 * y[2] * sq - 6.0 * sq * sq
        }
    }
}

fn general_ln_gamma(x: f64, order: usize) -> f64 {
    let xx = x - 1.0;
    let dim = GAMMA_COEF.len() as f64;
    let tx = xx + dim;
    let mut y = [0.0; POLYGAMMA_ORDER_MAX + 1];

    for (i, slot) in y.iter_mut().enumerate().take(order + 1) {
        let mut tmp = tx;
        let mut value = 0.0;
        for coef in GAMMA_COEF.iter().rev() {
            value += if i == 0 {
                coef / tmp
            } else {
                coef / powi(tmp, i as i32 + 1)
            };
            tmp -= 1.0;
        }
        if i > 0 {
            let f = factorial(i as i32);
            value *= if i % 2 == 0 { f } else { -f };
        }
        *slot = value;
    }
    y[0] += 1.0;

    let mut value = log_derivative(order, &y);
    let tmp = tx + 0.5;
    match order {
        0 => value += (NCBIMATH_LNPI + NCBIMATH_LN2) / 2.0 + (xx + 0.5) * tmp.ln() - tmp,
        1 => value += tmp.ln() - dim / tmp,
        2 => value += (tmp + dim) / (tmp * tmp),
        3 => value -= (1.0 + 2.0 * dim / tmp) / (tmp * tmp),
        _ => value += 2.0 * (1.0 + 3.0 * dim / tmp) / (tmp * tmp * tmp),
    }
    value
}

fn poly_gamma(x: f64, order: usize) -> f64 {
    if order > POLYGAMMA_ORDER_MAX {
        return f64::INFINITY;
    }
    if x >= 1.0 {
        return general_ln_gamma(x, order);
    }
    if x < 0.0 {
        // Reflection formula.
        let mut value = general_ln_gamma(1.0 - x, order);
        if order % 2 == 0 {
            value = -value;
        }
        if order == 0 {
            let sx = (NCBIMATH_PI * x).sin().abs();
            if (x < -0.1 && (x.ceil() == x || sx < 2.0 * f64::EPSILON)) || sx == 0.0 {
                return f64::INFINITY;
            }
            value += NCBIMATH_LNPI - sx.ln();
        } else {
            let mut y = [0.0; POLYGAMMA_ORDER_MAX + 1];
            let mut tmp = 1.0;
            let mut angle = x * NCBIMATH_PI;
            y[0] = angle.sin();
            for slot in y.iter_mut().take(order + 1).skip(1) {
                tmp *= NCBIMATH_PI;
                angle += NCBIMATH_PI / 2.0;
                *slot = tmp * angle.sin();
            }
            value -= log_derivative(order, &y);
        }
        return value;
    }
    let mut value = general_ln_gamma(1.0 + x, order);
    if order == 0 {
        if x == 0.0 {
            return f64::INFINITY;
        }
        value -= x.ln();
    } else {
        let tmp = factorial(order as i32 - 1) * powi(x, -(order as i32));
        value += if order % 2 == 0 { tmp } else { -tmp };
    }
    value
}

/// `ln(Gamma(x))`.
pub fn ln_gamma(x: f64) -> f64 {
    poly_gamma(x, 0)
}

/// `n!` from a table for small `n`, via log-gamma otherwise.
pub fn factorial(n: i32) -> f64 {
    if n < 0 {
        return 0.0;
    }
    match PRECOMPUTED_FACTORIAL.get(n as usize) {
        Some(&f) => f,
        None => ln_gamma(n as f64 + 1.0).exp(),
    }
}

/// `ln(Gamma(n))` for integer `n`, i.e. `ln((n-1)!)`.
pub fn ln_gamma_int(n: i32) -> f64 {
    if n > 1 && (n as usize) < PRECOMPUTED_FACTORIAL.len() {
        return PRECOMPUTED_FACTORIAL[(n - 1) as usize].ln();
    }
    ln_gamma(n as f64)
}

/// `ln(x!)`; zero for non-positive `x`.
pub fn ln_factorial(x: f64) -> f64 {
    if x <= 0.0 {
        0.0
    } else {
        ln_gamma(x + 1.0)
    }
}

/// Romberg integration of `f` over `[p, q]`.
///
/// Stops once `epsit` consecutive extrapolations agree to relative
/// tolerance `eps`, after at least `itmin` refinements. Returns the first
/// non-finite ordinate if `f` produces one, and infinity if it fails to
/// converge.
pub fn romberg_integrate<F>(f: &mut F, p: f64, q: f64, eps: f64, epsit: i32, itmin: i32) -> f64
where
    F: FnMut(f64) -> f64,
{
    const MAX_DIAGS: usize = 20;

    let itmin = itmin.clamp(1, (MAX_DIAGS - 1) as i32);
    let epsit = epsit.clamp(1, 3);
    let epsck = itmin - epsit;

    let mut romb = [0.0_f64; MAX_DIAGS];
    let mut npts: i32 = 1;
    let mut h = q - p;

    let x0 = f(p);
    if !x0.is_finite() {
        return x0;
    }
    let y0 = f(q);
    if !y0.is_finite() {
        return y0;
    }
    romb[0] = 0.5 * h * (x0 + y0);

    let mut consecutive = 0;
    for i in 1..MAX_DIAGS {
        let mut sum = 0.0;
        let mut x = p + 0.5 * h;
        for _ in 0..npts {
            let y = f(x);
            if !y.is_finite() {
                return y;
            }
            sum += y;
            x += h;
        }
        romb[i] = 0.5 * (romb[i - 1] + h * sum);

        let mut n = 4.0;
        for j in (0..i).rev() {
            romb[j] = (n * romb[j + 1] - romb[j]) / (n - 1.0);
            n *= 4.0;
        }

        if i as i32 > epsck {
            if (romb[1] - romb[0]).abs() > eps * romb[0].abs() {
                consecutive = 0;
            } else {
                consecutive += 1;
                if i as i32 >= itmin && consecutive >= epsit {
                    return romb[0];
                }
            }
        }

        npts *= 2;
        h *= 0.5;
    }

    f64::INFINITY
}
