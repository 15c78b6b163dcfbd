//! Engine state: the price, quality and investment trajectories.
//!
//! [`EngineState`] is an immutable value. Each outer iteration builds a new
//! one and the engine swaps it in, so one iteration can be inspected (or
//! tested) in isolation.
use ndarray::{Array1, Array2};

/// Investment probabilities `σ[t][m]`, each `cells_m × J`.
#[derive(Debug, Clone, PartialEq)]
pub struct InvestmentTrajectory {
    periods: Vec<Vec<Array2<f64>>>,
}

impl InvestmentTrajectory {
    /// All-zero trajectory over `horizon` periods for markets of the given
    /// cell counts.
    pub fn zeros(horizon: usize, market_sizes: &[usize], n_products: usize) -> Self {
        let period: Vec<Array2<f64>> =
            market_sizes.iter().map(|&cells| Array2::zeros((cells, n_products))).collect();
        Self { periods: vec![period; horizon] }
    }

    pub(crate) fn from_periods(periods: Vec<Vec<Array2<f64>>>) -> Self {
        Self { periods }
    }

    pub fn horizon(&self) -> usize {
        self.periods.len()
    }

    /// `σ[t][m]`, or `None` outside the horizon or market range.
    pub fn get(&self, t: usize, m: usize) -> Option<&Array2<f64>> {
        self.periods.get(t).and_then(|p| p.get(m))
    }

    /// All markets of period `t`.
    pub fn period(&self, t: usize) -> Option<&[Array2<f64>]> {
        self.periods.get(t).map(Vec::as_slice)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Vec<Array2<f64>>> {
        self.periods.iter()
    }

    /// `max |self − other|` over every period, market, cell and product.
    ///
    /// `NaN` entries propagate so a broken trajectory never looks converged.
    pub fn max_abs_diff(&self, other: &Self) -> f64 {
        let mut diff = 0.0_f64;
        for (a_t, b_t) in self.periods.iter().zip(&other.periods) {
            for (a, b) in a_t.iter().zip(b_t) {
                for (x, y) in a.iter().zip(b.iter()) {
                    let d = (x - y).abs();
                    if d.is_nan() {
                        return f64::NAN;
                    }
                    diff = diff.max(d);
                }
            }
        }
        diff
    }
}

/// Snapshot of the engine after one outer iteration.
///
/// Fields
/// ------
/// - `price[t]`: length `J`.
/// - `quality[t]`: `M × J`.
/// - `sigma`: investment probabilities.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineState {
    pub price: Vec<Array1<f64>>,
    pub quality: Vec<Array2<f64>>,
    pub sigma: InvestmentTrajectory,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn zeros_have_market_shapes() {
        let sigma = InvestmentTrajectory::zeros(3, &[2, 5], 4);

        assert_eq!(sigma.horizon(), 3);
        assert_eq!(sigma.get(2, 1).map(|a| a.dim()), Some((5, 4)));
        assert!(sigma.get(3, 0).is_none());
        assert!(sigma.get(0, 2).is_none());
    }

    #[test]
    // Purpose
    // -------
    // The sup-norm difference finds the largest entry and propagates NaN.
    fn max_abs_diff_is_sup_norm() {
        let a = InvestmentTrajectory::from_periods(vec![vec![array![[0.1, 0.2]]]]);
        let b = InvestmentTrajectory::from_periods(vec![vec![array![[0.4, 0.15]]]]);
        let c = InvestmentTrajectory::from_periods(vec![vec![array![[f64::NAN, 0.0]]]]);

        assert!((a.max_abs_diff(&b) - 0.3).abs() < 1e-15);
        assert!(a.max_abs_diff(&c).is_nan());
    }
}
