// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use focus_core::FocusError;

/// One changepoint hypothesis: "the rate increased `age` steps ago".
///
/// `counts` and `background` are cumulative from the hypothesis lineage
/// origin, not from the hypothesized start; two curves are always compared
/// through their differences against a younger accumulator. `best_llr`
/// memoizes the best log-likelihood ratio achieved along the lineage while
/// the curve survived pruning.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Curve {
    pub counts: f64,
    pub background: f64,
    pub age: u64,
    pub best_llr: f64,
}

impl Curve {
    /// Fresh "changepoint is now" hypothesis.
    pub const fn zero() -> Self {
        Self {
            counts: 0.0,
            background: 0.0,
            age: 0,
            best_llr: 0.0,
        }
    }

    /// Bottom-of-stack sentinel for the null hypothesis.
    ///
    /// Infinite counts make it dominate nothing and be dominated by
    /// everything, so it anchors the pruning loop and is never popped.
    pub const fn anchor() -> Self {
        Self {
            counts: f64::INFINITY,
            background: 0.0,
            age: 0,
            best_llr: 0.0,
        }
    }

    /// Extends the hypothesis by one observation.
    pub fn accumulate(&self, x: f64, b: f64) -> Self {
        Self {
            counts: self.counts + x,
            background: self.background + b,
            age: self.age + 1,
            best_llr: self.best_llr,
        }
    }
}

/// Poisson GLRT statistic for "the rate increased right after `p`" against
/// "no change": `a ln(a/b) - (a - b)` over the increments
/// `a = acc.counts - p.counts`, `b = acc.background - p.background`.
///
/// The natural-log formula is used verbatim; it is only defined for
/// `a > b > 0` and any other input is a caller contract breach.
pub fn ymax(p: &Curve, acc: &Curve) -> Result<f64, FocusError> {
    let a = acc.counts - p.counts;
    let b = acc.background - p.background;
    if !(a > b && b > 0.0) {
        return Err(FocusError::numerical_issue(format!(
            "llr requires counts > background > 0; got counts={a}, background={b}"
        )));
    }
    Ok(a * (a / b).ln() - (a - b))
}

/// Like [`ymax`], but hypotheses without positive evidence score zero.
///
/// Used by the maximizer walk and the DES quality-control re-scan, where a
/// curve with `a <= b` can never beat a positive threshold and contributes
/// nothing to the maximum.
pub fn ymax_or_zero(p: &Curve, acc: &Curve) -> f64 {
    let a = acc.counts - p.counts;
    let b = acc.background - p.background;
    if a > b && b > 0.0 {
        a * (a / b).ln() - (a - b)
    } else {
        0.0
    }
}

/// Whether hypothesis `p` dominates hypothesis `q` given the accumulator:
/// positive signed area on the cumulative (counts, background) plane means
/// `q` can never again out-score `p` under any future data.
pub fn dominates(p: &Curve, q: &Curve, acc: &Curve) -> bool {
    (acc.counts - p.counts) * (acc.background - q.background)
        - (acc.counts - q.counts) * (acc.background - p.background)
        > 0.0
}
