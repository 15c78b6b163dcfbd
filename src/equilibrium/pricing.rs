//! Static Bertrand–Nash price sub-solve for one period.
//!
//! Purpose
//! -------
//! Given the quality of period `t`, find prices `p` (length `J`) solving the
//! markup first-order conditions
//!
//! `F_j(p) = e_j(p)·(p_j − mc_j(Q(p)))/p_j + 1 = 0`,
//!
//! i.e. `(p − c)/p = −1/e`. With `e_j = −α·p_j·r_j` this is evaluated as
//! `F_j = 1 − α·(p_j − mc_j)·r_j`, using the retention ratio `r` of
//! [`DemandModel::retention`], which stays finite when demand for a product
//! underflows to zero.
//!
//! Key behaviors
//! -------------
//! - [`PriceFoc`] implements [`ResidualSystem`] in log-price coordinates
//!   `θ = ln p`, so every trial point maps to strictly positive prices.
//! - [`solve_period_price`] starts from the static marginal cost; if the
//!   root finder does not reach its residual tolerance, it retries once from
//!   the logit markup guess `mc + 1/α` and otherwise reports
//!   [`EquilibriumError::PriceSolverFailure`].
//!
//! Invariants & assumptions
//! ------------------------
//! - A returned price vector always satisfies `‖F(p)‖ ≤ tol_residual`.
use crate::{
    equilibrium::errors::{EquilibriumError, EquilibriumResult},
    market::geography::MarketSet,
    model::{cost::CostModel, demand::DemandModel},
    optimization::{
        errors::OptResult,
        root_finder::{Point, Residual, ResidualSystem, RootOptions, RootOutcome, solve_root},
    },
};
use log::warn;
use ndarray::{Array1, ArrayView2};

/// Markup first-order conditions of one period in log-price coordinates.
#[derive(Debug, Clone, Copy)]
pub struct PriceFoc<'a> {
    pub demand: &'a DemandModel,
    pub cost: &'a CostModel,
    pub quality: ArrayView2<'a, f64>,
    pub markets: &'a MarketSet,
}

impl<'a> PriceFoc<'a> {
    /// `F(p)` evaluated at prices (not log-prices).
    pub fn foc(&self, price: &Array1<f64>) -> OptResult<Residual> {
        let (quantity, retention) = self.demand.retention(price.view(), self.quality, self.markets)?;
        let mc = self.cost.static_marginal_cost(quantity.view())?;
        Ok(1.0 - &(&retention * &(price - &mc)) * self.demand.alpha())
    }
}

impl<'a> ResidualSystem for PriceFoc<'a> {
    fn residuals(&self, theta: &Point) -> OptResult<Residual> {
        self.foc(&theta.mapv(f64::exp))
    }
}

/// Solve the price equilibrium of period `period`.
///
/// Returns the prices together with the accepted solver outcome.
///
/// # Errors
/// - [`EquilibriumError::PriceSolverFailure`] if neither start reaches
///   `opts.tol_residual`.
/// - [`EquilibriumError::Model`] for shape errors in the model inputs.
pub fn solve_period_price<'a>(
    period: usize, demand: &'a DemandModel, cost: &'a CostModel, quality: ArrayView2<'a, f64>,
    markets: &'a MarketSet, opts: &RootOptions,
) -> EquilibriumResult<(Array1<f64>, RootOutcome)> {
    let system = PriceFoc { demand, cost, quality, markets };
    let mc = cost.static_marginal_cost(Array1::zeros(cost.n_products()).view())?;
    let markup = 1.0 / demand.alpha();

    let first = attempt(&system, log_start(&mc, markup), opts);
    let first_failure = match first {
        Ok(out) if out.converged => return Ok((out.x_hat.mapv(f64::exp), out)),
        Ok(out) => (out.residual_norm, out.status),
        Err(err) => (f64::NAN, err.to_string()),
    };
    warn!(
        "period {period}: price solve from marginal cost failed (residual {:.3e}, {}); \
         retrying from mc + 1/alpha",
        first_failure.0, first_failure.1
    );

    let retry_start = log_start(&(&mc + markup), markup);
    match attempt(&system, retry_start, opts) {
        Ok(out) if out.converged => Ok((out.x_hat.mapv(f64::exp), out)),
        Ok(out) => Err(EquilibriumError::PriceSolverFailure {
            period,
            residual_norm: out.residual_norm,
            status: out.status,
        }),
        Err(err) => Err(EquilibriumError::PriceSolverFailure {
            period,
            residual_norm: f64::NAN,
            status: err.to_string(),
        }),
    }
}

// ---- Helper Methods ----

fn attempt(system: &PriceFoc<'_>, theta0: Point, opts: &RootOptions) -> OptResult<RootOutcome> {
    solve_root(system, theta0, opts)
}

/// `ln p`, replacing non-positive guesses by `fallback`.
fn log_start(price: &Array1<f64>, fallback: f64) -> Point {
    price.mapv(|p| if p > 0.0 { p.ln() } else { fallback.ln() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        market::geography::Market,
        model::cost::{DynamicCostParams, StaticCostParams},
        optimization::root_finder::Tolerances,
    };
    use approx::assert_relative_eq;
    use ndarray::{Array2, array};

    fn setup(j: usize) -> (DemandModel, CostModel, MarketSet) {
        let markets = MarketSet::new(vec![
            Market::from_columns(&[1.0, 1.0], &[1000.0, 500.0]).unwrap(),
            Market::from_columns(&[1.0], &[800.0]).unwrap(),
        ])
        .unwrap();
        let demand = DemandModel::with_default_delta_q(0.045, 2.0, Array2::zeros((2, j))).unwrap();
        let cost = CostModel::new(
            StaticCostParams { static_mc: Array1::from_elem(j, 10.0) },
            DynamicCostParams {
                alpha_0: Array1::from_elem(j, 10.0),
                alpha_tri: 0.05,
                alpha_pop: 0.95,
                sigma: 0.2,
            },
        )
        .unwrap();
        (demand, cost, markets)
    }

    #[test]
    // Purpose
    // -------
    // The solved prices satisfy the markup condition and exceed marginal
    // cost.
    //
    // Given
    // -----
    // - Three symmetric products, quality 1.8, α = 0.045, mc = 10.
    //
    // Expect
    // ------
    // - ‖F(p)‖ ≤ tol, p > 10, and symmetric products get equal prices.
    fn solved_prices_satisfy_first_order_conditions() {
        let (demand, cost, markets) = setup(3);
        let quality = Array2::from_elem((2, 3), 1.8);
        let opts = RootOptions::default();

        let (price, out) =
            solve_period_price(0, &demand, &cost, quality.view(), &markets, &opts).unwrap();

        let system = PriceFoc { demand: &demand, cost: &cost, quality: quality.view(), markets: &markets };
        let residual = system.foc(&price).unwrap();
        assert!(out.converged);
        assert!(residual.iter().all(|r| r.abs() < 1e-6));
        assert!(price.iter().all(|&p| p > 10.0));
        assert_relative_eq!(price[0], price[2], epsilon = 1e-5);
    }

    #[test]
    // Purpose
    // -------
    // The log-price residual equals the price-space FOC at `exp θ`.
    fn log_price_residual_matches_price_space() {
        let (demand, cost, markets) = setup(2);
        let quality = array![[1.0, 1.5], [0.5, 1.0]];
        let system = PriceFoc { demand: &demand, cost: &cost, quality: quality.view(), markets: &markets };
        let price = array![20.0, 30.0];

        let r_theta = system.residuals(&price.mapv(f64::ln)).unwrap();
        let r_price = system.foc(&price).unwrap();

        for (a, b) in r_theta.iter().zip(r_price.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    // Purpose
    // -------
    // Market intercepts far apart drive one product's demand to zero at
    // high prices; the residual stays finite there and the solve still
    // converges.
    //
    // Given
    // -----
    // - Five one-cell markets, J = 2, ξ = [[3,-3],[0,0],[5,1],[-2,-8],[0,10]].
    // - Trial prices [17000, 50], where product 0 sells nothing.
    //
    // Expect
    // ------
    // - F at the trial prices is finite; with zero demand r_0 = 1, so
    //   F_0 == 1 − α·(p_0 − mc).
    // - The solve converges with ‖F(p)‖ ≤ 1e-6 and p > mc.
    fn extreme_intercepts_keep_first_order_conditions_finite() {
        let markets = MarketSet::new(
            (0..5).map(|_| Market::from_columns(&[1.0], &[1000.0]).unwrap()).collect(),
        )
        .unwrap();
        let xi = array![[3.0, -3.0], [0.0, 0.0], [5.0, 1.0], [-2.0, -8.0], [0.0, 10.0]];
        let demand = DemandModel::with_default_delta_q(0.045, 2.0, xi).unwrap();
        let (_, cost, _) = setup(2);
        let quality = Array2::from_elem((5, 2), 1.8);
        let system = PriceFoc { demand: &demand, cost: &cost, quality: quality.view(), markets: &markets };

        let trial = system.foc(&array![17000.0, 50.0]).unwrap();
        let (price, out) =
            solve_period_price(0, &demand, &cost, quality.view(), &markets, &RootOptions::default())
                .unwrap();

        assert!(trial.iter().all(|r| r.is_finite()));
        assert_relative_eq!(trial[0], 1.0 - 0.045 * (17000.0 - 10.0), epsilon = 1e-9);
        assert!(out.converged);
        assert!(system.foc(&price).unwrap().iter().all(|r| r.abs() < 1e-6));
        assert!(price.iter().all(|&p| p > 10.0));
    }

    #[test]
    // Purpose
    // -------
    // When neither start reaches the residual tolerance the period is
    // reported as a price solver failure.
    //
    // Given
    // -----
    // - tol_residual = 1e-300 and a single L-BFGS iteration per attempt.
    //
    // Expect
    // ------
    // - Err(PriceSolverFailure) carrying period 7 and a residual norm above
    //   the tolerance (or NaN when the solver itself errored).
    fn unreachable_tolerance_reports_price_solver_failure() {
        let (demand, cost, markets) = setup(2);
        let quality = Array2::from_elem((2, 2), 1.8);
        let opts = RootOptions {
            tols: Tolerances { tol_grad: Some(1e-13), tol_cost: Some(1e-30), max_iter: Some(1) },
            tol_residual: 1e-300,
            ..RootOptions::default()
        };

        let result = solve_period_price(7, &demand, &cost, quality.view(), &markets, &opts);

        match result {
            Err(EquilibriumError::PriceSolverFailure { period, residual_norm, .. }) => {
                assert_eq!(period, 7);
                assert!(!(residual_norm <= 1e-300));
            }
            other => panic!("expected PriceSolverFailure, got {other:?}"),
        }
    }

    #[test]
    fn log_start_replaces_non_positive_guesses() {
        let theta = log_start(&array![1.0, 0.0, -3.0], 2.0);

        assert_eq!(theta[0], 0.0);
        assert_relative_eq!(theta[1], 2f64.ln());
        assert_relative_eq!(theta[2], 2f64.ln());
    }
}
