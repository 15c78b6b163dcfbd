//! Read-only reports over the current engine state.
//!
//! Every report is one entry per period `t ∈ [0, T)` and is recomputed from
//! the stored prices, quality and investment probabilities on each call.
//!
//! - `consumer_surplus`: per market, `ln(1 + Σ_j exp z) / α`.
//! - `static_profits`: `M × J`, `p·s·pop − mc·(s·pop)`.
//! - `average_price`: quantity-weighted, `Σ_j p_j Q_j / Σ_j Q_j`.
//! - `average_quality`: `Σ q·s·pop / Σ s·pop`.
//! - `penetration`: `Σ_j Q_j / Σ_m pop_m`.
//! - `dynamic_costs`: `M × J`, row `m` is `Σ_cells p2u(σ[t][m]) ⊙ base(t, m)`.
use crate::{
    equilibrium::{engine::EquilibriumModel, errors::EquilibriumResult},
    model::errors::ModelError,
};
use ndarray::{Array1, Array2, Axis};

impl<'a> EquilibriumModel<'a> {
    /// Consumer surplus in money, per market.
    pub fn consumer_surplus(&self) -> EquilibriumResult<Vec<Array1<f64>>> {
        (0..self.horizon())
            .map(|t| {
                let (demand, _) = self.period_models(t)?;
                let iv = demand.inclusive_value(self.prices()[t].view(), self.quality()[t].view())?;
                Ok(iv.mapv(|u| demand.utility_to_money(u)))
            })
            .collect()
    }

    /// Static (product-market) profits per market and product.
    pub fn static_profits(&self) -> EquilibriumResult<Vec<Array2<f64>>> {
        (0..self.horizon())
            .map(|t| {
                let (_, cost) = self.period_models(t)?;
                let sales = self.sales(t)?;
                let revenue = &sales * &self.prices()[t].view().insert_axis(Axis(0));
                Ok(revenue - cost.static_cost(sales.view())?)
            })
            .collect()
    }

    /// Quantity-weighted average price per period.
    pub fn average_price(&self) -> EquilibriumResult<Array1<f64>> {
        let mut out = Array1::zeros(self.horizon());
        for t in 0..self.horizon() {
            let quantity = self.sales(t)?.sum_axis(Axis(0));
            out[t] = (&quantity * &self.prices()[t]).sum() / quantity.sum();
        }
        Ok(out)
    }

    /// Sales-weighted average quality per period.
    pub fn average_quality(&self) -> EquilibriumResult<Array1<f64>> {
        let mut out = Array1::zeros(self.horizon());
        for t in 0..self.horizon() {
            let sales = self.sales(t)?;
            out[t] = (&sales * &self.quality()[t]).sum() / sales.sum();
        }
        Ok(out)
    }

    /// Share of the total population buying any inside product.
    pub fn penetration(&self) -> EquilibriumResult<Array1<f64>> {
        let population = self.markets().populations().sum();
        let mut out = Array1::zeros(self.horizon());
        for t in 0..self.horizon() {
            out[t] = self.sales(t)?.sum() / population;
        }
        Ok(out)
    }

    /// Expected investment cost paid per market and product.
    pub fn dynamic_costs(&self) -> EquilibriumResult<Vec<Array2<f64>>> {
        (0..self.horizon())
            .map(|t| {
                let (_, cost) = self.period_models(t)?;
                let mut out = Array2::zeros((self.n_markets(), self.n_products()));
                for (m, market) in self.markets().iter().enumerate() {
                    let sigma = self.sigma().get(t, m).ok_or(ModelError::LengthMismatch {
                        what: "investment markets",
                        expected: self.n_markets(),
                        found: m,
                    })?;
                    let paid = cost.prob_to_utility(sigma.view()) * &cost.dynamic_cost_base(market);
                    out.row_mut(m).assign(&paid.sum_axis(Axis(0)));
                }
                Ok(out)
            })
            .collect()
    }

    // ---- Helper Methods ----

    /// `s·pop`, shape `M × J`.
    fn sales(&self, t: usize) -> EquilibriumResult<Array2<f64>> {
        let (demand, _) = self.period_models(t)?;
        let shares = demand.shares_by_market(self.prices()[t].view(), self.quality()[t].view())?;
        let pop = self.markets().populations().view().insert_axis(Axis(1));
        Ok(shares * &pop)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        equilibrium::engine::{DEFAULT_DELTA, EquilibriumModel},
        market::geography::{Market, MarketSet},
        model::{
            cost::{CostModel, Costs, DynamicCostParams, StaticCostParams},
            demand::{DemandModel, Demands},
        },
    };
    use approx::assert_relative_eq;
    use ndarray::{Array1, Array2, array};

    fn inputs() -> (MarketSet, Demands, Costs) {
        let markets = MarketSet::new(vec![
            Market::from_columns(&[1.0, 2.0], &[600.0, 400.0]).unwrap(),
            Market::from_columns(&[0.5], &[1000.0]).unwrap(),
        ])
        .unwrap();
        let demand = DemandModel::with_default_delta_q(0.045, 2.0, Array2::zeros((2, 2))).unwrap();
        let cost = CostModel::new(
            StaticCostParams { static_mc: array![10.0, 10.0] },
            DynamicCostParams { alpha_0: array![10.0, 10.0], alpha_tri: 0.05, alpha_pop: 0.95, sigma: 0.2 },
        )
        .unwrap();
        (markets, Demands::repeat(demand, 3).unwrap(), Costs::repeat(cost, 3).unwrap())
    }

    #[test]
    // Purpose
    // -------
    // Reports have one entry per period with the documented shapes.
    fn reports_have_documented_shapes() {
        let (markets, demands, costs) = inputs();
        let q = vec![Array2::from_elem((2, 2), 1.8); 3];
        let model = EquilibriumModel::new(&markets, &demands, &costs, q, DEFAULT_DELTA).unwrap();

        let cs = model.consumer_surplus().unwrap();
        let profits = model.static_profits().unwrap();
        let dyn_costs = model.dynamic_costs().unwrap();

        assert_eq!(cs.len(), 3);
        assert!(cs.iter().all(|c| c.len() == 2 && c.iter().all(|v| v.is_finite() && *v > 0.0)));
        assert!(profits.iter().all(|p| p.dim() == (2, 2)));
        assert!(dyn_costs.iter().all(|d| d.dim() == (2, 2)));
        assert_eq!(model.average_price().unwrap().len(), 3);
        assert_eq!(model.average_quality().unwrap().len(), 3);
        assert_eq!(model.penetration().unwrap().len(), 3);
    }

    #[test]
    // Purpose
    // -------
    // Symmetric products make the weighted averages collapse to the common
    // price and quality; markups make static profits positive.
    //
    // Given
    // -----
    // - Two identical products at quality 1.8.
    //
    // Expect
    // ------
    // - average_price == p[t][0], average_quality == 1.8.
    // - 0 < penetration < 1; profits > 0.
    fn symmetric_reports_collapse_to_common_values() {
        let (markets, demands, costs) = inputs();
        let q = vec![Array2::from_elem((2, 2), 1.8); 3];
        let model = EquilibriumModel::new(&markets, &demands, &costs, q, DEFAULT_DELTA).unwrap();

        let avg_p = model.average_price().unwrap();
        let avg_q = model.average_quality().unwrap();
        let pen = model.penetration().unwrap();

        for t in 0..3 {
            assert_relative_eq!(avg_p[t], model.prices()[t][0], max_relative = 1e-6);
            assert_relative_eq!(avg_q[t], 1.8, epsilon = 1e-12);
            assert!(pen[t] > 0.0 && pen[t] < 1.0);
        }
        assert!(model.static_profits().unwrap().iter().all(|p| p.iter().all(|&v| v > 0.0)));
    }

    #[test]
    // Purpose
    // -------
    // With zero investment every cell sits at the p2u floor, so the cost
    // paid is p2u(1e-4) times the summed base.
    fn dynamic_costs_at_zero_investment() {
        let (markets, demands, costs) = inputs();
        let q = vec![Array2::from_elem((2, 2), 1.8); 3];
        let model = EquilibriumModel::new(&markets, &demands, &costs, q, DEFAULT_DELTA).unwrap();
        let cost = costs.get(0).unwrap();
        let floor_u = cost.prob_to_utility(array![[0.0]].view())[[0, 0]];

        let dyn_costs = model.dynamic_costs().unwrap();

        for (m, market) in markets.iter().enumerate() {
            let base: Array1<f64> = cost.dynamic_cost_base(market).sum_axis(ndarray::Axis(0));
            for j in 0..2 {
                assert_relative_eq!(dyn_costs[0][[m, j]], floor_u * base[j], max_relative = 1e-12);
            }
        }
    }
}
