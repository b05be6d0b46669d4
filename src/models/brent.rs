//! Bracketing root finder (Brent's method)
//!
//! Combines bisection, secant and inverse quadratic interpolation steps while
//! always keeping the root inside a sign-changing bracket, so the iterate can
//! never leave the initial interval.

/// Configuration for the Brent root finder
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BrentConfig {
    /// Absolute tolerance on x
    pub xtol: f64,
    /// Relative tolerance on x
    pub rtol: f64,
    /// Maximum number of function evaluations after the endpoints
    pub max_iter: usize,
}

impl Default for BrentConfig {
    fn default() -> Self {
        Self {
            xtol: 2e-12,
            rtol: 4.0 * f64::EPSILON,
            max_iter: 100,
        }
    }
}

/// Why a root could not be produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RootError {
    /// f(a) and f(b) have the same sign
    NotBracketed,
    /// The objective returned NaN or infinity
    NonFinite,
    /// Iteration budget exhausted
    MaxIterations,
}

/// Find a root of `f` in `[a, b]`
pub(crate) fn brent_root<F>(f: F, a: f64, b: f64, config: &BrentConfig) -> Result<f64, RootError>
where
    F: Fn(f64) -> f64,
{
    let mut x_pre = a;
    let mut x_cur = b;
    let mut f_pre = f(x_pre);
    let mut f_cur = f(x_cur);

    if !f_pre.is_finite() || !f_cur.is_finite() {
        return Err(RootError::NonFinite);
    }
    if f_pre == 0.0 {
        return Ok(x_pre);
    }
    if f_cur == 0.0 {
        return Ok(x_cur);
    }
    if f_pre.signum() == f_cur.signum() {
        return Err(RootError::NotBracketed);
    }

    // Contrapoint: the end of the bracket opposite x_cur
    let mut x_blk = 0.0;
    let mut f_blk = 0.0;
    let mut s_pre = 0.0;
    let mut s_cur = 0.0;

    for _ in 0..config.max_iter {
        if f_pre != 0.0 && f_cur != 0.0 && f_pre.signum() != f_cur.signum() {
            x_blk = x_pre;
            f_blk = f_pre;
            s_pre = x_cur - x_pre;
            s_cur = s_pre;
        }

        if f_blk.abs() < f_cur.abs() {
            x_pre = x_cur;
            x_cur = x_blk;
            x_blk = x_pre;

            f_pre = f_cur;
            f_cur = f_blk;
            f_blk = f_pre;
        }

        let delta = (config.xtol + config.rtol * x_cur.abs()) / 2.0;
        let s_bis = (x_blk - x_cur) / 2.0;

        if f_cur == 0.0 || s_bis.abs() < delta {
            return Ok(x_cur);
        }

        if s_pre.abs() > delta && f_cur.abs() < f_pre.abs() {
            let s_try = if x_pre == x_blk {
                // Secant
                -f_cur * (x_cur - x_pre) / (f_cur - f_pre)
            } else {
                // Inverse quadratic interpolation
                let d_pre = (f_pre - f_cur) / (x_pre - x_cur);
                let d_blk = (f_blk - f_cur) / (x_blk - x_cur);
                -f_cur * (f_blk * d_blk - f_pre * d_pre) / (d_blk * d_pre * (f_blk - f_pre))
            };

            if 2.0 * s_try.abs() < s_pre.abs().min(3.0 * s_bis.abs() - delta) {
                s_pre = s_cur;
                s_cur = s_try;
            } else {
                s_pre = s_bis;
                s_cur = s_bis;
            }
        } else {
            s_pre = s_bis;
            s_cur = s_bis;
        }

        x_pre = x_cur;
        f_pre = f_cur;

        if s_cur.abs() > delta {
            x_cur += s_cur;
        } else {
            x_cur += if s_bis > 0.0 { delta } else { -delta };
        }

        f_cur = f(x_cur);
        if !f_cur.is_finite() {
            return Err(RootError::NonFinite);
        }
    }

    Err(RootError::MaxIterations)
}
