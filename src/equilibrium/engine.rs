//! The equilibrium engine: nested fixed point over prices, investment and
//! quality.
//!
//! Purpose
//! -------
//! Own the mutable part of the model (prices, quality, investment
//! probabilities) and drive the outer fixed point:
//!
//! 1. solve every period's Bertrand prices given quality;
//! 2. compute cumulative probabilities from the previous `σ`;
//! 3. compute every period's investment best response;
//! 4. measure `max |σ_new − σ_old|`;
//! 5. update quality forward from the new `σ`, blended by the learning
//!    rate;
//!
//! until the difference is below the tolerance or the budget is spent.
//!
//! Key behaviors
//! -------------
//! - [`EquilibriumModel::step`] performs exactly one iteration and returns
//!   its [`IterationRecord`]; [`EquilibriumModel::find_equilibrium`] loops
//!   over `step`.
//! - Per-period price solves and per-period best responses run in parallel
//!   (rayon); all prices of an iteration are final before any best response
//!   of that iteration starts.
//! - State is replaced wholesale after each successful iteration. A failing
//!   iteration leaves the previous state untouched.
//!
//! Invariants & assumptions
//! ------------------------
//! - Horizon `T = min(len(demands), len(costs)) ≥ 1`.
//! - Initial quality supplies at least `T` independent `M × J` matrices;
//!   entries past `T` are ignored.
//! - `quality[0]` is never updated.
//!
//! Conventions
//! -----------
//! - Iteration progress is logged at `debug`, convergence at `info`,
//!   non-convergence and price-solve retries at `warn`.
use crate::{
    equilibrium::{
        errors::{EquilibriumError, EquilibriumResult},
        investment::{BestResponse, ForwardEffect},
        options::{EquilibriumOptions, FixedPointOutcome, IterationRecord},
        pricing::solve_period_price,
        probabilities::{calc_probs_eq, calc_probs0},
        state::{EngineState, InvestmentTrajectory},
    },
    market::geography::MarketSet,
    model::{
        cost::{CostModel, Costs},
        demand::{DemandModel, Demands},
        errors::ModelError,
        shape::{ensure_finite, ensure_matrix},
    },
    optimization::root_finder::RootOptions,
};
use log::{debug, info, warn};
use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;

/// Default discount factor.
pub const DEFAULT_DELTA: f64 = 0.92;

/// Dynamic oligopoly with a single investment type.
///
/// Borrows the geography and the per-period models for its whole lifetime;
/// owns the engine state.
#[derive(Debug, Clone)]
pub struct EquilibriumModel<'a> {
    markets: &'a MarketSet,
    demands: &'a Demands,
    costs: &'a Costs,
    delta: f64,
    horizon: usize,
    n_products: usize,
    state: EngineState,
    iterations: usize,
}

impl<'a> EquilibriumModel<'a> {
    /// Build the engine and solve initial prices with default root-finder
    /// options.
    ///
    /// # Errors
    /// See [`EquilibriumModel::with_price_solver`].
    pub fn new(
        markets: &'a MarketSet, demands: &'a Demands, costs: &'a Costs,
        initial_quality: Vec<Array2<f64>>, delta: f64,
    ) -> EquilibriumResult<Self> {
        Self::with_price_solver(
            markets,
            demands,
            costs,
            initial_quality,
            delta,
            &RootOptions::default(),
        )
    }

    /// Build the engine: validate inputs, zero-initialize `σ`, and solve the
    /// price equilibrium of every period once.
    ///
    /// # Errors
    /// - [`ModelError::InvalidDelta`] unless `0 < delta < 1`.
    /// - [`ModelError::EmptyHorizon`] if either sequence is empty.
    /// - [`ModelError::LengthMismatch`] if demand and cost disagree on `J`,
    ///   or `xi` does not have one row per market.
    /// - [`ModelError::InitialQualityLength`] if fewer than `T` quality
    ///   matrices are supplied; [`ModelError::ShapeMismatch`] or
    ///   [`ModelError::NonFiniteParameter`] for a malformed one.
    /// - [`EquilibriumError::PriceSolverFailure`] if a period's initial
    ///   prices cannot be solved.
    pub fn with_price_solver(
        markets: &'a MarketSet, demands: &'a Demands, costs: &'a Costs,
        mut initial_quality: Vec<Array2<f64>>, delta: f64, price_solver: &RootOptions,
    ) -> EquilibriumResult<Self> {
        if !delta.is_finite() || delta <= 0.0 || delta >= 1.0 {
            return Err(ModelError::InvalidDelta { value: delta }.into());
        }
        let horizon = demands.len().min(costs.len());
        let first_demand = demands.get(0).ok_or(ModelError::EmptyHorizon)?;
        if horizon == 0 {
            return Err(ModelError::EmptyHorizon.into());
        }
        let n_products = costs.n_products();
        if first_demand.n_products() != n_products {
            return Err(ModelError::LengthMismatch {
                what: "products",
                expected: n_products,
                found: first_demand.n_products(),
            }
            .into());
        }
        if first_demand.n_markets() != markets.count() {
            return Err(ModelError::LengthMismatch {
                what: "markets",
                expected: markets.count(),
                found: first_demand.n_markets(),
            }
            .into());
        }
        if initial_quality.len() < horizon {
            return Err(ModelError::InitialQualityLength {
                expected: horizon,
                found: initial_quality.len(),
            }
            .into());
        }
        initial_quality.truncate(horizon);
        for q in &initial_quality {
            ensure_matrix("initial quality", q, (markets.count(), n_products))?;
            ensure_finite("initial quality", q.iter())?;
        }

        let sigma = InvestmentTrajectory::zeros(horizon, &markets.sizes(), n_products);
        let mut model = Self {
            markets,
            demands,
            costs,
            delta,
            horizon,
            n_products,
            state: EngineState { price: Vec::new(), quality: initial_quality, sigma },
            iterations: 0,
        };
        model.state.price = model.solve_prices(&model.state.quality, price_solver)?;
        info!(
            "engine ready: T = {horizon}, M = {}, J = {n_products}, delta = {delta}",
            markets.count()
        );
        Ok(model)
    }

    /// Run one outer iteration and replace the state.
    ///
    /// # Errors
    /// - Invalid tolerance or learning rate in `opts`.
    /// - [`EquilibriumError::PriceSolverFailure`] from any period.
    pub fn step(&mut self, opts: &EquilibriumOptions) -> EquilibriumResult<IterationRecord> {
        opts.validate()?;
        let clamps_before = self.costs.clamp_events(self.horizon);

        let prices = self.solve_prices(&self.state.quality, &opts.price_solver)?;
        let effects = self.forward_effects(&prices)?;
        let cum0 = calc_probs0(&self.state.sigma);
        let br = BestResponse {
            markets: self.markets,
            costs: self.costs,
            delta: self.delta,
            prices: &prices,
            effects: &effects,
            sigma_old: &self.state.sigma,
            cum0: &cum0,
        };
        let sigma = InvestmentTrajectory::from_periods(
            (0..self.horizon).into_par_iter().map(|t| br.respond(t)).collect(),
        );
        let max_sigma_diff = sigma.max_abs_diff(&self.state.sigma);
        let quality = self.update_quality(&sigma, opts.learning_rate);

        self.state = EngineState { price: prices, quality, sigma };
        self.iterations += 1;
        let clamp_events = self.costs.clamp_events(self.horizon).saturating_sub(clamps_before);
        debug!(
            "iteration {}: max |sigma diff| = {max_sigma_diff:.3e}, clamp events = {clamp_events}",
            self.iterations
        );
        Ok(IterationRecord { iteration: self.iterations, max_sigma_diff, clamp_events })
    }

    /// Iterate [`EquilibriumModel::step`] until `max |σ_new − σ_old| ≤
    /// opts.tolerance`.
    ///
    /// # Errors
    /// - [`EquilibriumError::NonConvergence`] after `opts.max_iter`
    ///   iterations without meeting the tolerance (including a zero budget).
    /// - Any error from [`EquilibriumModel::step`].
    pub fn find_equilibrium(
        &mut self, opts: &EquilibriumOptions,
    ) -> EquilibriumResult<FixedPointOutcome> {
        opts.validate()?;
        let mut history = Vec::with_capacity(opts.max_iter.min(1024));
        let mut last_diff = f64::INFINITY;
        for _ in 0..opts.max_iter {
            let record = self.step(opts)?;
            last_diff = record.max_sigma_diff;
            history.push(record);
            if last_diff <= opts.tolerance {
                info!(
                    "equilibrium found after {} iterations (max |sigma diff| = {last_diff:.3e})",
                    history.len()
                );
                return Ok(FixedPointOutcome { iterations: history.len(), final_diff: last_diff, history });
            }
        }
        warn!(
            "no equilibrium after {} iterations (last max |sigma diff| = {last_diff:.3e})",
            opts.max_iter
        );
        Err(EquilibriumError::NonConvergence { iterations: opts.max_iter, last_diff })
    }

    // ---- Accessors ----

    pub fn prices(&self) -> &[Array1<f64>] {
        &self.state.price
    }

    pub fn quality(&self) -> &[Array2<f64>] {
        &self.state.quality
    }

    pub fn sigma(&self) -> &InvestmentTrajectory {
        &self.state.sigma
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn delta(&self) -> f64 {
        self.delta
    }

    /// Horizon `T`.
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn n_markets(&self) -> usize {
        self.markets.count()
    }

    pub fn n_products(&self) -> usize {
        self.n_products
    }

    /// Outer iterations run so far.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn markets(&self) -> &MarketSet {
        self.markets
    }

    // ---- Helper Methods ----

    pub(crate) fn period_models(&self, t: usize) -> EquilibriumResult<(&'a DemandModel, &'a CostModel)> {
        let demand = self.demands.get(t).ok_or(ModelError::EmptyHorizon)?;
        let cost = self.costs.get(t).ok_or(ModelError::EmptyHorizon)?;
        Ok((demand, cost))
    }

    fn solve_prices(
        &self, quality: &[Array2<f64>], opts: &RootOptions,
    ) -> EquilibriumResult<Vec<Array1<f64>>> {
        (0..self.horizon)
            .into_par_iter()
            .map(|t| {
                let (demand, cost) = self.period_models(t)?;
                let (price, outcome) =
                    solve_period_price(t, demand, cost, quality[t].view(), self.markets, opts)?;
                debug!(
                    "period {t}: prices solved in {} iterations (residual {:.3e})",
                    outcome.iterations, outcome.residual_norm
                );
                Ok(price)
            })
            .collect()
    }

    fn forward_effects(&self, prices: &[Array1<f64>]) -> EquilibriumResult<Vec<ForwardEffect>> {
        (0..self.horizon)
            .into_par_iter()
            .map(|t| {
                let (demand, cost) = self.period_models(t)?;
                let effect = ForwardEffect::evaluate(
                    demand,
                    cost,
                    prices[t].view(),
                    self.state.quality[t].view(),
                    self.markets,
                )?;
                Ok(effect)
            })
            .collect()
    }

    /// `q[t] ← (1 − lr)·q[t] + lr·(q[0] + Σ_cells cum[t]·pop_cell / pop_m)`
    /// for `t ≥ 1`, using cumulative probabilities from the origin.
    fn update_quality(&self, sigma: &InvestmentTrajectory, learning_rate: f64) -> Vec<Array2<f64>> {
        let probs = calc_probs_eq(sigma);
        let q0 = &self.state.quality[0];
        self.state
            .quality
            .iter()
            .enumerate()
            .map(|(t, q_t)| {
                if t == 0 {
                    return q_t.clone();
                }
                let mut contribution = Array2::<f64>::zeros(q_t.raw_dim());
                for (m, market) in self.markets.iter().enumerate() {
                    let Some(cum) = probs.from_origin.get(t).and_then(|c| c.get(m)) else {
                        continue;
                    };
                    let cells = market.populations().view().insert_axis(Axis(1));
                    let dq = (cum * &cells).sum_axis(Axis(0)) / market.total_population();
                    contribution.row_mut(m).assign(&dq);
                }
                q_t * (1.0 - learning_rate) + &((q0 + &contribution) * learning_rate)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        market::geography::Market,
        model::cost::{DynamicCostParams, StaticCostParams},
    };
    use ndarray::array;

    fn fixture(horizon: usize) -> (MarketSet, Demands, Costs) {
        let markets = MarketSet::new(vec![
            Market::from_columns(&[1.0, 2.0], &[1000.0, 2000.0]).unwrap(),
            Market::from_columns(&[1.5], &[1500.0]).unwrap(),
        ])
        .unwrap();
        let demand = DemandModel::with_default_delta_q(0.045, 2.0, Array2::zeros((2, 2))).unwrap();
        let cost = CostModel::new(
            StaticCostParams { static_mc: array![10.0, 10.0] },
            DynamicCostParams { alpha_0: array![10.0, 10.0], alpha_tri: 0.05, alpha_pop: 0.95, sigma: 0.2 },
        )
        .unwrap();
        (
            markets,
            Demands::repeat(demand, horizon).unwrap(),
            Costs::repeat(cost, horizon).unwrap(),
        )
    }

    #[test]
    // Purpose
    // -------
    // Construction validates δ, the horizon and the initial quality.
    fn constructor_validates_inputs() {
        let (markets, demands, costs) = fixture(3);
        let q = vec![Array2::from_elem((2, 2), 1.8); 3];

        assert!(matches!(
            EquilibriumModel::new(&markets, &demands, &costs, q.clone(), 1.0),
            Err(EquilibriumError::Model(ModelError::InvalidDelta { .. }))
        ));
        assert!(matches!(
            EquilibriumModel::new(&markets, &demands, &costs, q[..2].to_vec(), 0.9),
            Err(EquilibriumError::Model(ModelError::InitialQualityLength { expected: 3, found: 2 }))
        ));
        assert!(matches!(
            EquilibriumModel::new(&markets, &demands, &costs, vec![Array2::zeros((1, 2)); 3], 0.9),
            Err(EquilibriumError::Model(ModelError::ShapeMismatch { .. }))
        ));
    }

    #[test]
    // Purpose
    // -------
    // The engine horizon is the shorter of the two sequences and extra
    // quality matrices are ignored.
    fn horizon_is_shorter_sequence() {
        let (markets, demands, _) = fixture(4);
        let (_, _, costs) = fixture(2);
        let q = vec![Array2::from_elem((2, 2), 1.8); 5];

        let model = EquilibriumModel::new(&markets, &demands, &costs, q, DEFAULT_DELTA).unwrap();

        assert_eq!(model.horizon(), 2);
        assert_eq!(model.quality().len(), 2);
        assert_eq!(model.prices().len(), 2);
        assert!(model.sigma().iter().flatten().all(|s| s.iter().all(|&v| v == 0.0)));
    }

    #[test]
    // Purpose
    // -------
    // One step replaces the whole state, keeps q[0], and reports a record.
    //
    // Given
    // -----
    // - T = 3, zero initial σ.
    //
    // Expect
    // ------
    // - iteration == 1; the reported difference equals max |σ_new − 0|.
    // - clamp_events > 0, since the zero initial σ is floored by p2u.
    // - q[0] is unchanged, later quality does not fall below q[0].
    fn step_replaces_state_and_reports() {
        let (markets, demands, costs) = fixture(3);
        let q = vec![Array2::from_elem((2, 2), 1.8); 3];
        let mut model = EquilibriumModel::new(&markets, &demands, &costs, q.clone(), DEFAULT_DELTA).unwrap();
        let zeros = model.sigma().clone();

        let record = model.step(&EquilibriumOptions::default()).unwrap();

        assert_eq!(record.iteration, 1);
        assert_eq!(model.iterations(), 1);
        assert!(record.clamp_events > 0);
        assert!((record.max_sigma_diff - model.sigma().max_abs_diff(&zeros)).abs() < 1e-15);
        assert_eq!(model.quality()[0], q[0]);
        for t in 1..3 {
            assert!(model.quality()[t].iter().all(|&v| v >= 1.8 - 1e-12));
        }
    }

    #[test]
    // Purpose
    // -------
    // A zero iteration budget is reported as non-convergence, not success.
    fn zero_budget_is_non_convergence() {
        let (markets, demands, costs) = fixture(2);
        let q = vec![Array2::from_elem((2, 2), 1.8); 2];
        let mut model = EquilibriumModel::new(&markets, &demands, &costs, q, DEFAULT_DELTA).unwrap();
        let opts = EquilibriumOptions { max_iter: 0, ..EquilibriumOptions::default() };

        let err = model.find_equilibrium(&opts).unwrap_err();

        assert!(matches!(err, EquilibriumError::NonConvergence { iterations: 0, .. }));
        assert_eq!(model.iterations(), 0);
    }

    #[test]
    fn invalid_learning_rate_is_rejected_before_iterating() {
        let (markets, demands, costs) = fixture(2);
        let q = vec![Array2::from_elem((2, 2), 1.8); 2];
        let mut model = EquilibriumModel::new(&markets, &demands, &costs, q, DEFAULT_DELTA).unwrap();
        let opts = EquilibriumOptions { learning_rate: 2.0, ..EquilibriumOptions::default() };

        assert!(matches!(
            model.find_equilibrium(&opts),
            Err(EquilibriumError::InvalidLearningRate { .. })
        ));
        assert_eq!(model.iterations(), 0);
    }
}
