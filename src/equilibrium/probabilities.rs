//! Cumulative adoption probabilities.
//!
//! Purpose
//! -------
//! Compound per-period investment probabilities `σ` into the probability
//! that a cell/product has adopted (invested) by a given offset. Two
//! variants feed two different steps of the outer fixed point:
//!
//! - [`calc_probs0`] works on the **previous** iteration's `σ` and drives
//!   the best response.
//! - [`calc_probs_eq`] works on the **new** `σ` and drives the quality
//!   update.
//!
//! Key behaviors
//! -------------
//! - The hazard recursion `cum[τ] = cum[τ−1] + (1 − cum[τ−1])·σ[·]`.
//! - [`ProbabilityTrajectory`] stores `cum` indexed by `(t, τ, m)` with the
//!   valid range `τ ∈ [0, T − t)` per `t`; [`ProbabilityTrajectory::get`]
//!   returns `None` outside it.
//!
//! Invariants & assumptions
//! ------------------------
//! - If every `σ` entry lies in `[0, 1]`, every `cum` entry lies in `[0, 1]`
//!   and is non-decreasing in `τ`.
//!
//! Conventions
//! -----------
//! - `calc_probs0`: `cum[t][0] = cum[t][1] = 0`; for `τ ≥ 2` the recursion
//!   uses `σ[t + τ − 1]`, i.e. adoption strictly after `t` and before
//!   `t + τ`.
//! - `calc_probs_eq` tails: `tail[t][0] = 0`, `tail[t][1] = σ[t]`, then the
//!   same recursion (adoption from `t` on).
//! - `calc_probs_eq` from-origin: `cum[0] = 0` and the recursion with
//!   `σ[τ − 1]`, for `τ ∈ [0, T)`.
use crate::equilibrium::state::InvestmentTrajectory;
use ndarray::Array2;
use rayon::prelude::*;

/// Cumulative probabilities indexed by `(t, τ, m)`, `τ ∈ [0, T − t)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityTrajectory {
    data: Vec<Vec<Vec<Array2<f64>>>>,
}

impl ProbabilityTrajectory {
    /// Horizon `T`.
    pub fn horizon(&self) -> usize {
        self.data.len()
    }

    /// `cum[t][τ][m]`, or `None` when `τ ≥ T − t` or an index is out of range.
    pub fn get(&self, t: usize, tau: usize, m: usize) -> Option<&Array2<f64>> {
        self.data.get(t)?.get(tau)?.get(m)
    }

    /// Number of valid offsets for `t` (`T − t`, or 0 past the horizon).
    pub fn offsets(&self, t: usize) -> usize {
        self.data.get(t).map_or(0, Vec::len)
    }
}

/// Output of [`calc_probs_eq`].
#[derive(Debug, Clone, PartialEq)]
pub struct EquilibriumProbabilities {
    /// `from_origin[τ][m]`, `τ ∈ [0, T)`; drives the quality update.
    pub from_origin: Vec<Vec<Array2<f64>>>,
    /// Per-period tails starting with `σ[t]` at `τ = 1`.
    pub tails: ProbabilityTrajectory,
}

/// Cumulative probabilities from the previous iteration's `σ`.
pub fn calc_probs0(sigma: &InvestmentTrajectory) -> ProbabilityTrajectory {
    let horizon = sigma.horizon();
    let data = (0..horizon)
        .into_par_iter()
        .map(|t| {
            let zeros = zeros_like(sigma, t);
            let mut offsets = Vec::with_capacity(horizon - t);
            offsets.push(zeros.clone());
            if horizon - t > 1 {
                offsets.push(zeros);
            }
            for tau in 2..horizon - t {
                let next = compound(&offsets[tau - 1], sigma, t + tau - 1);
                offsets.push(next);
            }
            offsets
        })
        .collect();
    ProbabilityTrajectory { data }
}

/// Cumulative probabilities from the current `σ`.
pub fn calc_probs_eq(sigma: &InvestmentTrajectory) -> EquilibriumProbabilities {
    let horizon = sigma.horizon();

    let mut from_origin: Vec<Vec<Array2<f64>>> = Vec::with_capacity(horizon);
    if horizon > 0 {
        from_origin.push(zeros_like(sigma, 0));
    }
    for tau in 1..horizon {
        let next = compound(&from_origin[tau - 1], sigma, tau - 1);
        from_origin.push(next);
    }

    let data = (0..horizon)
        .into_par_iter()
        .map(|t| {
            let mut offsets = Vec::with_capacity(horizon - t);
            offsets.push(zeros_like(sigma, t));
            if horizon - t > 1 {
                offsets.push(sigma.period(t).map(<[_]>::to_vec).unwrap_or_default());
            }
            for tau in 2..horizon - t {
                let next = compound(&offsets[tau - 1], sigma, t + tau - 1);
                offsets.push(next);
            }
            offsets
        })
        .collect();

    EquilibriumProbabilities { from_origin, tails: ProbabilityTrajectory { data } }
}

// ---- Helper Methods ----

/// `prev + (1 − prev)·σ[s]`, market by market.
fn compound(
    prev: &[Array2<f64>], sigma: &InvestmentTrajectory, s: usize,
) -> Vec<Array2<f64>> {
    let sigma_s = sigma.period(s).unwrap_or_default();
    prev.iter()
        .zip(sigma_s)
        .map(|(c, sig)| c + &(c.mapv(|v| 1.0 - v) * sig))
        .collect()
}

fn zeros_like(sigma: &InvestmentTrajectory, t: usize) -> Vec<Array2<f64>> {
    sigma
        .period(t)
        .unwrap_or_default()
        .iter()
        .map(|a| Array2::zeros(a.raw_dim()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    // Four periods, one market with one cell and two products.
    fn sigma4() -> InvestmentTrajectory {
        InvestmentTrajectory::from_periods(vec![
            vec![array![[0.1, 0.0]]],
            vec![array![[0.2, 1.0]]],
            vec![array![[0.5, 0.3]]],
            vec![array![[0.9, 0.0]]],
        ])
    }

    #[test]
    // Purpose
    // -------
    // `calc_probs0` starts compounding at σ[t + 1].
    //
    // Given
    // -----
    // - σ₀ = 0.1, σ₁ = 0.2, σ₂ = 0.5 for product 0.
    //
    // Expect
    // ------
    // - cum[0][1] = 0, cum[0][2] = σ₁ = 0.2, cum[0][3] = 0.2 + 0.8·0.5 = 0.6.
    // - Only τ ∈ [0, T − t) is addressable.
    fn calc_probs0_recursion_and_range() {
        let cum = calc_probs0(&sigma4());

        assert_eq!(cum.horizon(), 4);
        assert_eq!(cum.offsets(0), 4);
        assert_eq!(cum.offsets(3), 1);
        assert_relative_eq!(cum.get(0, 1, 0).unwrap()[[0, 0]], 0.0);
        assert_relative_eq!(cum.get(0, 2, 0).unwrap()[[0, 0]], 0.2, epsilon = 1e-15);
        assert_relative_eq!(cum.get(0, 3, 0).unwrap()[[0, 0]], 0.6, epsilon = 1e-15);
        assert_relative_eq!(cum.get(1, 2, 0).unwrap()[[0, 0]], 0.5, epsilon = 1e-15);
        assert!(cum.get(1, 3, 0).is_none());
        assert!(cum.get(0, 0, 1).is_none());
    }

    #[test]
    // Purpose
    // -------
    // `calc_probs_eq` compounds from the origin and its tails start at σ[t].
    fn calc_probs_eq_origin_and_tails() {
        let eq = calc_probs_eq(&sigma4());

        assert_eq!(eq.from_origin.len(), 4);
        assert_relative_eq!(eq.from_origin[0][0][[0, 0]], 0.0);
        assert_relative_eq!(eq.from_origin[1][0][[0, 0]], 0.1, epsilon = 1e-15);
        assert_relative_eq!(eq.from_origin[2][0][[0, 0]], 0.1 + 0.9 * 0.2, epsilon = 1e-15);
        assert_relative_eq!(eq.from_origin[3][0][[0, 1]], 1.0, epsilon = 1e-15);

        assert_relative_eq!(eq.tails.get(1, 1, 0).unwrap()[[0, 0]], 0.2, epsilon = 1e-15);
        assert_relative_eq!(
            eq.tails.get(1, 2, 0).unwrap()[[0, 0]],
            0.2 + 0.8 * 0.5,
            epsilon = 1e-15
        );
    }

    #[test]
    // Purpose
    // -------
    // Both variants are non-decreasing in τ and stay in [0, 1].
    fn cumulative_probabilities_are_monotone_and_bounded() {
        let sigma = sigma4();
        let cum0 = calc_probs0(&sigma);
        let eq = calc_probs_eq(&sigma);

        for traj in [&cum0, &eq.tails] {
            for t in 0..traj.horizon() {
                for tau in 1..traj.offsets(t) {
                    let prev = traj.get(t, tau - 1, 0).unwrap();
                    let cur = traj.get(t, tau, 0).unwrap();
                    for (a, b) in prev.iter().zip(cur.iter()) {
                        assert!(b >= a);
                        assert!((0.0..=1.0).contains(b));
                    }
                }
            }
        }
        for w in eq.from_origin.windows(2) {
            assert!(w[1][0].iter().zip(w[0][0].iter()).all(|(b, a)| b >= a && *b <= 1.0));
        }
    }

    #[test]
    fn single_period_has_only_the_zero_offset() {
        let sigma = InvestmentTrajectory::zeros(1, &[3], 2);

        let cum0 = calc_probs0(&sigma);
        let eq = calc_probs_eq(&sigma);

        assert_eq!(cum0.offsets(0), 1);
        assert_eq!(eq.tails.offsets(0), 1);
        assert_eq!(eq.from_origin.len(), 1);
    }
}
