//! Investment best response.
//!
//! Purpose
//! -------
//! For period `t` and market `m`, value a marginal investment by comparing
//! the discounted extra margin it brings (`tr1`), the part of that margin
//! the cell would have earned anyway through earlier adoption (`tr0`), and
//! the future investment cost it avoids (`tc0`). The resulting utility per
//! unit of dynamic cost is mapped to a probability by the cost model.
//!
//! Key behaviors
//! -------------
//! With `b = boost[t+τ][m]`, `π = p[t+τ] − mc[t+τ]` and `c = cum0[t][τ][m]`:
//!
//! - `tr1 = Σ_{τ=1}^{T−t−1} δ^τ · b ⊙ π`
//! - `tr0 = Σ_{τ=1}^{T−t−1} δ^τ · b ⊙ π ⊙ c`
//! - `tc0 = Σ_{τ=1}^{T−t−2} δ^τ · p2u(σ[t+τ][m]) ⊙ base(t+τ, m) ⊙ (cum0[t][τ+1][m] − c)`
//! - `σ_new[t][m] = u2p((tr1 − tr0 + tc0) / base(t, m))`
//!
//! This is a myopic forward-looking approximation of the investment
//! decision, not a value-function solve.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every period's prices are final before any best response is computed.
//! - `σ` used in `tc0` and in `cum0` is the previous iteration's.
//! - The last period has no future and always yields `u = 0`, which the
//!   floor clamp in `u2p` turns into a (numerically) zero probability.
use crate::{
    equilibrium::{probabilities::ProbabilityTrajectory, state::InvestmentTrajectory},
    market::geography::MarketSet,
    model::{
        cost::{CostModel, Costs},
        demand::DemandModel,
        errors::ModelResult,
    },
};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

/// Forward effect of period `t`'s prices and quality: the demand boost per
/// market and the static marginal cost.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardEffect {
    /// `boost[m]`, `cells_m × J`.
    pub boost: Vec<Array2<f64>>,
    /// Static marginal cost at the period's equilibrium quantities.
    pub mc: Array1<f64>,
}

impl ForwardEffect {
    /// Evaluate the forward effect of one period.
    pub fn evaluate(
        demand: &DemandModel, cost: &CostModel, price: ArrayView1<'_, f64>,
        quality: ArrayView2<'_, f64>, markets: &MarketSet,
    ) -> ModelResult<Self> {
        let boost = demand.inv_boost(price, quality, markets)?;
        let quantity = demand.evaluate(price, quality, markets)?;
        let mc = cost.static_marginal_cost(quantity.view())?;
        Ok(Self { boost, mc })
    }
}

/// Everything the best response of any `(t, m)` reads.
#[derive(Debug, Clone, Copy)]
pub struct BestResponse<'a> {
    pub markets: &'a MarketSet,
    pub costs: &'a Costs,
    pub delta: f64,
    pub prices: &'a [Array1<f64>],
    pub effects: &'a [ForwardEffect],
    pub sigma_old: &'a InvestmentTrajectory,
    pub cum0: &'a ProbabilityTrajectory,
}

impl<'a> BestResponse<'a> {
    fn horizon(&self) -> usize {
        self.prices.len()
    }

    fn margin(&self, s: usize, m: usize) -> Option<Array2<f64>> {
        let effect = self.effects.get(s)?;
        let boost = effect.boost.get(m)?;
        let pi = &self.prices[s] - &effect.mc;
        Some(boost * &pi.insert_axis(Axis(0)))
    }

    /// Discounted extra margin from investing at `t` in market `m`.
    pub fn tr1(&self, t: usize, m: usize) -> Array2<f64> {
        let mut acc = self.zeros(m);
        let mut discount = 1.0;
        for s in t + 1..self.horizon() {
            discount *= self.delta;
            if let Some(margin) = self.margin(s, m) {
                acc.scaled_add(discount, &margin);
            }
        }
        acc
    }

    /// Part of `tr1` already secured through adoption before `t + τ`.
    pub fn tr0(&self, t: usize, m: usize) -> Array2<f64> {
        let mut acc = self.zeros(m);
        let mut discount = 1.0;
        for tau in 1..self.horizon().saturating_sub(t) {
            discount *= self.delta;
            if let (Some(margin), Some(cum)) = (self.margin(t + tau, m), self.cum0.get(t, tau, m)) {
                acc.scaled_add(discount, &(margin * cum));
            }
        }
        acc
    }

    /// Discounted future investment cost avoided by investing at `t`.
    pub fn tc0(&self, t: usize, m: usize) -> Array2<f64> {
        let mut acc = self.zeros(m);
        let Some(market) = self.markets.get(m) else {
            return acc;
        };
        let mut discount = 1.0;
        for tau in 1..self.horizon().saturating_sub(t + 1) {
            discount *= self.delta;
            let (Some(cost), Some(sigma), Some(c_now), Some(c_next)) = (
                self.costs.get(t + tau),
                self.sigma_old.get(t + tau, m),
                self.cum0.get(t, tau, m),
                self.cum0.get(t, tau + 1, m),
            ) else {
                continue;
            };
            let u = cost.prob_to_utility(sigma.view());
            let base = cost.dynamic_cost_base(market);
            acc.scaled_add(discount, &(u * &base * &(c_next - c_now)));
        }
        acc
    }

    /// New investment probabilities of period `t`, one matrix per market.
    pub fn respond(&self, t: usize) -> Vec<Array2<f64>> {
        let Some(cost) = self.costs.get(t) else {
            return Vec::new();
        };
        self.markets
            .iter()
            .enumerate()
            .map(|(m, market)| {
                let base = cost.dynamic_cost_base(market);
                let u = (self.tr1(t, m) - self.tr0(t, m) + self.tc0(t, m)) / &base;
                cost.utility_to_prob(u.view())
            })
            .collect()
    }

    fn zeros(&self, m: usize) -> Array2<f64> {
        let cells = self.markets.get(m).map_or(0, |mk| mk.size());
        let j = self.prices.first().map_or(0, Array1::len);
        Array2::zeros((cells, j))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        equilibrium::probabilities::calc_probs0,
        market::geography::Market,
        model::cost::{DynamicCostParams, StaticCostParams},
    };
    use approx::assert_relative_eq;
    use ndarray::array;

    struct Fixture {
        markets: MarketSet,
        costs: Costs,
        prices: Vec<Array1<f64>>,
        effects: Vec<ForwardEffect>,
        sigma: InvestmentTrajectory,
    }

    // One market with one cell, one product, four periods; boost = 1,
    // margin = 2 in every period, base = 1.
    fn fixture(sigma_value: f64) -> Fixture {
        let markets = MarketSet::new(vec![Market::from_columns(&[1.0], &[1.0]).unwrap()]).unwrap();
        let cost = CostModel::new(
            StaticCostParams { static_mc: array![1.0] },
            DynamicCostParams { alpha_0: array![1.0], alpha_tri: 1.0, alpha_pop: 1.0, sigma: 0.5 },
        )
        .unwrap();
        let costs = Costs::repeat(cost, 4).unwrap();
        let prices = vec![array![3.0]; 4];
        let effects = vec![ForwardEffect { boost: vec![array![[1.0]]], mc: array![1.0] }; 4];
        let sigma =
            InvestmentTrajectory::from_periods(vec![vec![array![[sigma_value]]]; 4]);
        Fixture { markets, costs, prices, effects, sigma }
    }

    #[test]
    // Purpose
    // -------
    // `tr1` is the discounted sum of future margins.
    //
    // Given
    // -----
    // - δ = 0.5, margin·boost = 2 in each of the three future periods.
    //
    // Expect
    // ------
    // - tr1(0) = 2·(0.5 + 0.25 + 0.125) = 1.75; tr1(3) = 0.
    fn tr1_discounts_future_margins() {
        let f = fixture(0.0);
        let cum0 = calc_probs0(&f.sigma);
        let br = BestResponse {
            markets: &f.markets,
            costs: &f.costs,
            delta: 0.5,
            prices: &f.prices,
            effects: &f.effects,
            sigma_old: &f.sigma,
            cum0: &cum0,
        };

        assert_relative_eq!(br.tr1(0, 0)[[0, 0]], 1.75, epsilon = 1e-14);
        assert_relative_eq!(br.tr1(3, 0)[[0, 0]], 0.0);
    }

    #[test]
    // Purpose
    // -------
    // With zero previous investment nothing is secured and nothing is
    // avoided, so `tr0 = tc0 = 0`.
    fn zero_sigma_secures_and_avoids_nothing() {
        let f = fixture(0.0);
        let cum0 = calc_probs0(&f.sigma);
        let br = BestResponse {
            markets: &f.markets,
            costs: &f.costs,
            delta: 0.9,
            prices: &f.prices,
            effects: &f.effects,
            sigma_old: &f.sigma,
            cum0: &cum0,
        };

        assert_relative_eq!(br.tr0(0, 0)[[0, 0]], 0.0);
        assert_relative_eq!(br.tc0(0, 0)[[0, 0]], 0.0);
    }

    #[test]
    // Purpose
    // -------
    // `tr0` and `tc0` follow their sums for a constant σ.
    //
    // Given
    // -----
    // - σ = 0.5 everywhere, δ = 0.5, T = 4, t = 0.
    // - cum0[0] = (0, 0, 0.5, 0.75).
    //
    // Expect
    // ------
    // - tr0 = 2·(0.5·0 + 0.25·0.5 + 0.125·0.75) = 0.4375.
    // - tc0 = 0.5·p2u(0.5)·(0.5 − 0) + 0.25·p2u(0.5)·(0.75 − 0.5).
    fn tr0_and_tc0_follow_their_sums() {
        let f = fixture(0.5);
        let cum0 = calc_probs0(&f.sigma);
        let br = BestResponse {
            markets: &f.markets,
            costs: &f.costs,
            delta: 0.5,
            prices: &f.prices,
            effects: &f.effects,
            sigma_old: &f.sigma,
            cum0: &cum0,
        };
        let p2u = f.costs.get(1).unwrap().prob_to_utility(array![[0.5]].view())[[0, 0]];

        assert_relative_eq!(br.tr0(0, 0)[[0, 0]], 0.4375, epsilon = 1e-14);
        assert_relative_eq!(
            br.tc0(0, 0)[[0, 0]],
            0.5 * p2u * 0.5 + 0.25 * p2u * 0.25,
            epsilon = 1e-14
        );
    }

    #[test]
    // Purpose
    // -------
    // The last period has no future: the best response is (numerically) zero.
    fn last_period_does_not_invest() {
        let f = fixture(0.3);
        let cum0 = calc_probs0(&f.sigma);
        let br = BestResponse {
            markets: &f.markets,
            costs: &f.costs,
            delta: 0.9,
            prices: &f.prices,
            effects: &f.effects,
            sigma_old: &f.sigma,
            cum0: &cum0,
        };

        let sigma_last = br.respond(3);

        assert_eq!(sigma_last.len(), 1);
        assert!(sigma_last[0][[0, 0]] < 1e-12);
    }
}
