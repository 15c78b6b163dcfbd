//! Numerical stability utilities.
//!
//! Provides guarded implementations of the nonlinear transforms used by the
//! demand and cost models: logit shares with an outside good, the matching
//! inclusive value `ln(1 + Σ exp z)`, floor clamps that keep `ln`/`Φ⁻¹`
//! inputs away from zero, and a thread-safe counter that records how often
//! those floors fire.
//!
//! # Provided items
//! - [`PROB_FLOOR`]: numerical floor (1e-4) applied to utilities and
//!   probabilities before `ln` or `Φ⁻¹`.
//! - [`ClampCounter`]: atomic tally of clamped entries.
//! - [`floor_clamp`]: elementwise `max(x, floor)` that reports the number of
//!   entries it raised.
//! - [`logit_shares`]: row-wise `exp(z) / (1 + Σ exp z)` with a max-shift.
//! - [`inclusive_value`]: row-wise `ln(1 + Σ exp z)` with the same shift.
//! - [`standard_normal`]: the shared `N(0, 1)` used by the cost transforms.
use std::sync::atomic::{AtomicU64, Ordering};

use ndarray::{Array1, Array2, ArrayView2, Axis, Zip};
use statrs::distribution::Normal;

/// Floor applied to utilities and probabilities in the investment transforms.
///
/// Inputs below this value would send `ln(u)` or `Φ⁻¹(p)` towards `-∞`;
/// they are raised to the floor instead, and the event is counted.
pub const PROB_FLOOR: f64 = 1e-4;

/// Atomic count of entries raised to a numerical floor.
///
/// Clamping is part of the model and is never an error, but it should be
/// observable: models own one counter each and callers read it through
/// [`ClampCounter::get`] to attribute clamps to an iteration.
#[derive(Debug, Default)]
pub struct ClampCounter(AtomicU64);

impl ClampCounter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    /// Add `n` clamp events.
    pub fn record(&self, n: usize) {
        if n > 0 {
            self.0.fetch_add(n as u64, Ordering::Relaxed);
        }
    }

    /// Total clamp events recorded so far.
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

impl Clone for ClampCounter {
    fn clone(&self) -> Self {
        Self(AtomicU64::new(self.get()))
    }
}

/// Raise every entry of `values` below `floor` to `floor`.
///
/// Returns the clamped array together with the number of entries that were
/// raised. `NaN` entries are left untouched (and not counted) so that they
/// surface downstream instead of being masked.
pub fn floor_clamp(values: ArrayView2<'_, f64>, floor: f64) -> (Array2<f64>, usize) {
    let mut raised = 0usize;
    let out = values.mapv(|v| {
        if v < floor {
            raised += 1;
            floor
        } else {
            v
        }
    });
    (out, raised)
}

/// Row-wise logit shares with an implicit outside good of utility zero.
///
/// For each row `m`, returns `s_{m,j} = exp(z_{m,j}) / (1 + Σ_k exp(z_{m,k}))`.
/// The row maximum (floored at 0, the outside utility) is subtracted before
/// exponentiating so large utilities cannot overflow.
///
/// Every share lies in `(0, 1)` and each row sums to strictly less than one
/// for finite input.
pub fn logit_shares(z: ArrayView2<'_, f64>) -> Array2<f64> {
    let mut out = Array2::<f64>::zeros(z.raw_dim());
    Zip::from(out.rows_mut()).and(z.rows()).for_each(|mut s_row, z_row| {
        let shift = z_row.fold(0.0_f64, |acc, &v| acc.max(v));
        let outside = (-shift).exp();
        let mut denom = outside;
        for (s, &v) in s_row.iter_mut().zip(z_row.iter()) {
            *s = (v - shift).exp();
            denom += *s;
        }
        s_row.mapv_inplace(|s| s / denom);
    });
    out
}

/// Row-wise inclusive value `ln(1 + Σ_j exp z_{m,j})`.
///
/// Uses the same max-shift as [`logit_shares`]; the result is the expected
/// maximum utility (up to Euler's constant) of the choice set in each row.
pub fn inclusive_value(z: ArrayView2<'_, f64>) -> Array1<f64> {
    z.map_axis(Axis(1), |row| {
        let shift = row.fold(0.0_f64, |acc, &v| acc.max(v));
        let sum = (-shift).exp() + row.iter().map(|&v| (v - shift).exp()).sum::<f64>();
        shift + sum.ln()
    })
}

/// Standard normal distribution `N(0, 1)`.
pub fn standard_normal() -> Normal {
    Normal::standard()
}
