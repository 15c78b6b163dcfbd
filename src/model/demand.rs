//! Logit demand with an outside good, and its per-period sequence.
//!
//! Purpose
//! -------
//! Map prices (one per product) and quality (one per market and product) to
//! market shares, aggregate quantities, own-price elasticities, and the
//! "demand boost" that values a marginal quality improvement.
//!
//! Key behaviors
//! -------------
//! - [`DemandModel::combine`] builds the mean utility
//!   `z = xi − α·p + β·q + (β − δ_q)·(1 − q)` (`M × J`).
//! - Shares are row-wise logit with an outside option of utility zero:
//!   `s_{m,j} = exp z_{m,j} / (1 + Σ_k exp z_{m,k})`.
//! - Quantities aggregate shares with market populations:
//!   `Q_j = Σ_m s_{m,j}·pop_m`.
//! - Elasticities use the diagonal of the logit Jacobian,
//!   `dQ_j/dp_j = −α Σ_m s(1 − s)·pop_m`, computed as `e_j = −α·p_j·r_j`
//!   with the retention ratio `r_j = Σ_m s(1 − s)·pop_m / Q_j` (`r_j = 1`
//!   when `Q_j` underflows to zero).
//!
//! Invariants & assumptions
//! ------------------------
//! - `alpha > 0` and all parameters finite (checked at construction).
//! - `xi` has one row per market of the [`MarketSet`] it is evaluated on;
//!   every operation checks the shapes of its inputs against `xi`.
//! - Shares lie in `(0, 1)`; row sums are `< 1` for finite utilities.
//!
//! Conventions
//! -----------
//! - Prices are `Array1` of length `J`, broadcast across market rows.
//! - Quality and all per-market outputs are `M × J`.
//! - Per-cell outputs ([`DemandModel::inv_boost`]) are `cells_m × J`, one
//!   matrix per market.
//!
//! Testing notes
//! -------------
//! - Unit tests cover share bounds, the elasticity sign, agreement of the
//!   analytic elasticity with a finite difference, finite elasticities under
//!   demand underflow, `inv_boost` shapes, and shape-contract failures.
use crate::{
    market::geography::MarketSet,
    model::{
        errors::{ModelError, ModelResult},
        shape::{ensure_finite, ensure_len, ensure_matrix},
    },
    optimization::numerical_stability::transformations::{inclusive_value, logit_shares},
};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, Zip};

/// Default quality-decay adjustment `δ_q`.
pub const DEFAULT_DELTA_Q: f64 = 0.2;

/// Logit demand for one period.
#[derive(Debug, Clone, PartialEq)]
pub struct DemandModel {
    alpha: f64,
    beta: f64,
    xi: Array2<f64>,
    delta_q: f64,
}

impl DemandModel {
    /// Construct a validated demand model.
    ///
    /// # Errors
    /// - [`ModelError::InvalidAlpha`] if `alpha` is non-finite or ≤ 0.
    /// - [`ModelError::NonFiniteParameter`] for non-finite `beta`, `delta_q`
    ///   or `xi` entries.
    /// - [`ModelError::NoProducts`] if `xi` has no columns;
    ///   [`ModelError::ShapeMismatch`] if it has no rows.
    pub fn new(alpha: f64, beta: f64, xi: Array2<f64>, delta_q: f64) -> ModelResult<Self> {
        if !alpha.is_finite() || alpha <= 0.0 {
            return Err(ModelError::InvalidAlpha { value: alpha });
        }
        ensure_finite("beta", [beta].iter())?;
        ensure_finite("delta_q", [delta_q].iter())?;
        ensure_finite("xi", xi.iter())?;
        if xi.ncols() == 0 {
            return Err(ModelError::NoProducts);
        }
        if xi.nrows() == 0 {
            return Err(ModelError::ShapeMismatch {
                what: "xi",
                expected: (1, xi.ncols()),
                found: xi.dim(),
            });
        }
        Ok(Self { alpha, beta, xi, delta_q })
    }

    /// Same as [`DemandModel::new`] with `delta_q = 0.2`.
    pub fn with_default_delta_q(alpha: f64, beta: f64, xi: Array2<f64>) -> ModelResult<Self> {
        Self::new(alpha, beta, xi, DEFAULT_DELTA_Q)
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn delta_q(&self) -> f64 {
        self.delta_q
    }

    pub fn xi(&self) -> &Array2<f64> {
        &self.xi
    }

    /// Number of markets `M` (rows of `xi`).
    pub fn n_markets(&self) -> usize {
        self.xi.nrows()
    }

    /// Number of products `J` (columns of `xi`).
    pub fn n_products(&self) -> usize {
        self.xi.ncols()
    }

    /// Mean utility `z = xi − α·p + β·q + (β − δ_q)·(1 − q)`, shape `M × J`.
    ///
    /// # Errors
    /// Shape errors if `price` is not length `J` or `quality` is not `M × J`.
    pub fn combine(
        &self, price: ArrayView1<'_, f64>, quality: ArrayView2<'_, f64>,
    ) -> ModelResult<Array2<f64>> {
        ensure_len("price", &price, self.n_products())?;
        ensure_matrix("quality", &quality, self.xi.dim())?;
        let decay = self.beta - self.delta_q;
        let mut z = &self.xi + &quality.mapv(|q| self.beta * q + decay * (1.0 - q));
        z -= &(price.to_owned() * self.alpha).insert_axis(Axis(0));
        Ok(z)
    }

    /// Per-market logit shares, shape `M × J`.
    pub fn shares_by_market(
        &self, price: ArrayView1<'_, f64>, quality: ArrayView2<'_, f64>,
    ) -> ModelResult<Array2<f64>> {
        let z = self.combine(price, quality)?;
        Ok(logit_shares(z.view()))
    }

    /// Aggregate quantity per product, `Q_j = Σ_m s_{m,j}·pop_m`.
    pub fn evaluate(
        &self, price: ArrayView1<'_, f64>, quality: ArrayView2<'_, f64>, markets: &MarketSet,
    ) -> ModelResult<Array1<f64>> {
        let (shares, pop) = self.shares_and_population(price, quality, markets)?;
        Ok(quantities(&shares, &pop))
    }

    /// Own-price elasticity per product, always ≤ 0.
    pub fn elasticity(
        &self, price: ArrayView1<'_, f64>, quality: ArrayView2<'_, f64>, markets: &MarketSet,
    ) -> ModelResult<Array1<f64>> {
        let (_, elasticity) = self.evaluate2(price, quality, markets)?;
        Ok(elasticity)
    }

    /// Quantities and own-price elasticities from a single share evaluation.
    ///
    /// The elasticity is computed as `−α·p·r` with `r` from
    /// [`DemandModel::retention`], so it stays finite when demand underflows.
    pub fn evaluate2(
        &self, price: ArrayView1<'_, f64>, quality: ArrayView2<'_, f64>, markets: &MarketSet,
    ) -> ModelResult<(Array1<f64>, Array1<f64>)> {
        let (q, r) = self.retention(price, quality, markets)?;
        let elasticity = &r * &price * -self.alpha;
        Ok((q, elasticity))
    }

    /// Quantities and the retention ratio
    /// `r_j = Σ_m s(1 − s)·pop_m / Σ_m s·pop_m`, in `[0, 1]`.
    ///
    /// `r_j` is the limit `1` when product `j` sells nothing (all shares
    /// underflowed), since `1 − s → 1` as `s → 0`.
    pub fn retention(
        &self, price: ArrayView1<'_, f64>, quality: ArrayView2<'_, f64>, markets: &MarketSet,
    ) -> ModelResult<(Array1<f64>, Array1<f64>)> {
        let (shares, pop) = self.shares_and_population(price, quality, markets)?;
        let q = quantities(&shares, &pop);
        let churn = (shares.mapv(|s| s * (1.0 - s)) * &pop).sum_axis(Axis(0));
        let r = Zip::from(&churn)
            .and(&q)
            .map_collect(|&c, &qj| if qj > 0.0 { (c / qj).clamp(0.0, 1.0) } else { 1.0 });
        Ok((q, r))
    }

    /// Demand boost of a marginal quality improvement, per market and cell.
    ///
    /// For market `m`, returns `pop_cells ⊗ [s(1 − s)·δ_q]_{m,·}`, a
    /// `cells_m × J` matrix.
    pub fn inv_boost(
        &self, price: ArrayView1<'_, f64>, quality: ArrayView2<'_, f64>, markets: &MarketSet,
    ) -> ModelResult<Vec<Array2<f64>>> {
        let (shares, _) = self.shares_and_population(price, quality, markets)?;
        let ds = shares.mapv(|s| s * (1.0 - s) * self.delta_q);
        let boosts = markets
            .iter()
            .zip(ds.rows())
            .map(|(market, ds_m)| {
                let cells = market.populations().view().insert_axis(Axis(1));
                &cells * &ds_m.insert_axis(Axis(0))
            })
            .collect();
        Ok(boosts)
    }

    /// Log-sum-exp inclusive value per market, `ln(1 + Σ_j exp z_{m,j})`.
    pub fn inclusive_value(
        &self, price: ArrayView1<'_, f64>, quality: ArrayView2<'_, f64>,
    ) -> ModelResult<Array1<f64>> {
        let z = self.combine(price, quality)?;
        Ok(inclusive_value(z.view()))
    }

    /// Convert utility into money, `u / α`.
    pub fn utility_to_money(&self, u: f64) -> f64 {
        u / self.alpha
    }

    // ---- Helper Methods ----

    fn shares_and_population(
        &self, price: ArrayView1<'_, f64>, quality: ArrayView2<'_, f64>, markets: &MarketSet,
    ) -> ModelResult<(Array2<f64>, Array2<f64>)> {
        if markets.count() != self.n_markets() {
            return Err(ModelError::LengthMismatch {
                what: "markets",
                expected: self.n_markets(),
                found: markets.count(),
            });
        }
        let shares = self.shares_by_market(price, quality)?;
        let pop = markets.populations().view().insert_axis(Axis(1)).to_owned();
        Ok((shares, pop))
    }
}

fn quantities(shares: &Array2<f64>, pop: &Array2<f64>) -> Array1<f64> {
    (shares * pop).sum_axis(Axis(0))
}

/// Ordered per-period demand models.
#[derive(Debug, Clone, PartialEq)]
pub struct Demands {
    periods: Vec<DemandModel>,
}

impl Demands {
    /// # Errors
    /// - [`ModelError::EmptyHorizon`] if `periods` is empty.
    /// - [`ModelError::ShapeMismatch`] if the periods disagree on `M × J`.
    pub fn new(periods: Vec<DemandModel>) -> ModelResult<Self> {
        let first = periods.first().ok_or(ModelError::EmptyHorizon)?;
        let dim = first.xi.dim();
        for d in &periods {
            ensure_matrix("xi", &d.xi, dim)?;
        }
        Ok(Self { periods })
    }

    /// Stationary sequence: `model` repeated for `horizon` periods.
    pub fn repeat(model: DemandModel, horizon: usize) -> ModelResult<Self> {
        Self::new(vec![model; horizon])
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    pub fn get(&self, t: usize) -> Option<&DemandModel> {
        self.periods.get(t)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DemandModel> {
        self.periods.iter()
    }

    /// Per-period quantities for a price and quality trajectory.
    ///
    /// Covers `min(len, prices.len(), quality.len())` periods.
    pub fn evaluate(
        &self, prices: &[Array1<f64>], quality: &[Array2<f64>], markets: &MarketSet,
    ) -> ModelResult<Vec<Array1<f64>>> {
        self.periods
            .iter()
            .zip(prices.iter().zip(quality))
            .map(|(d, (p, q))| d.evaluate(p.view(), q.view(), markets))
            .collect()
    }

    /// Per-period mean utilities.
    pub fn combine(
        &self, prices: &[Array1<f64>], quality: &[Array2<f64>],
    ) -> ModelResult<Vec<Array2<f64>>> {
        self.periods
            .iter()
            .zip(prices.iter().zip(quality))
            .map(|(d, (p, q))| d.combine(p.view(), q.view()))
            .collect()
    }

    /// Per-period market shares.
    pub fn shares_by_market(
        &self, prices: &[Array1<f64>], quality: &[Array2<f64>],
    ) -> ModelResult<Vec<Array2<f64>>> {
        self.periods
            .iter()
            .zip(prices.iter().zip(quality))
            .map(|(d, (p, q))| d.shares_by_market(p.view(), q.view()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::geography::{Market, MarketSet};
    use approx::assert_relative_eq;
    use ndarray::array;

    fn two_markets() -> MarketSet {
        let a = Market::from_columns(&[1.0, 2.0], &[100.0, 50.0]).unwrap();
        let b = Market::from_columns(&[1.0], &[80.0]).unwrap();
        MarketSet::new(vec![a, b]).unwrap()
    }

    fn demand() -> DemandModel {
        DemandModel::with_default_delta_q(0.5, 2.0, array![[0.1, -0.2], [0.3, 0.0]]).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // `combine` follows the mean-utility formula entrywise.
    fn combine_matches_formula() {
        let d = demand();
        let p = array![1.0, 2.0];
        let q = array![[1.0, 0.5], [0.0, 2.0]];

        let z = d.combine(p.view(), q.view()).unwrap();

        for m in 0..2 {
            for j in 0..2 {
                let expect = d.xi()[[m, j]] - 0.5 * p[j]
                    + 2.0 * q[[m, j]]
                    + (2.0 - DEFAULT_DELTA_Q) * (1.0 - q[[m, j]]);
                assert_relative_eq!(z[[m, j]], expect, epsilon = 1e-14);
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // Shares lie in (0, 1), rows sum below one, quantities are non-negative
    // and elasticities are non-positive.
    //
    // Given
    // -----
    // - Two markets, two products, a grid of prices.
    //
    // Expect
    // ------
    // - All bounds hold at every grid point.
    fn shares_quantities_and_elasticities_have_expected_signs() {
        let d = demand();
        let markets = two_markets();
        let q = array![[1.8, 1.8], [1.8, 1.8]];

        for &p0 in &[0.01, 1.0, 10.0, 50.0] {
            let p = array![p0, 2.0 * p0];
            let s = d.shares_by_market(p.view(), q.view()).unwrap();
            let (quant, e) = d.evaluate2(p.view(), q.view(), &markets).unwrap();

            assert!(s.iter().all(|&x| x > 0.0 && x < 1.0));
            assert!(s.rows().into_iter().all(|r| r.sum() <= 1.0));
            assert!(quant.iter().all(|&x| x >= 0.0));
            assert!(e.iter().all(|&x| x <= 0.0));
        }
    }

    #[test]
    // Purpose
    // -------
    // The analytic elasticity agrees with a central finite difference of
    // `evaluate` in the own price.
    fn elasticity_matches_finite_difference() {
        let d = demand();
        let markets = two_markets();
        let q = array![[1.0, 0.5], [0.2, 1.5]];
        let p = array![3.0, 4.0];
        let h = 1e-6;

        let e = d.elasticity(p.view(), q.view(), &markets).unwrap();
        let base = d.evaluate(p.view(), q.view(), &markets).unwrap();

        for j in 0..2 {
            let mut up = p.clone();
            let mut down = p.clone();
            up[j] += h;
            down[j] -= h;
            let q_up = d.evaluate(up.view(), q.view(), &markets).unwrap();
            let q_down = d.evaluate(down.view(), q.view(), &markets).unwrap();
            let fd = (q_up[j] - q_down[j]) / (2.0 * h) * p[j] / base[j];
            assert_relative_eq!(e[j], fd, epsilon = 1e-6);
        }
    }

    #[test]
    // Purpose
    // -------
    // Elasticities stay finite and non-positive when demand underflows.
    //
    // Given
    // -----
    // - α = 0.5 and a price of 5000, so every exp z underflows to 0.
    //
    // Expect
    // ------
    // - Q = 0, retention = 1 and elasticity = −α·p exactly.
    fn elasticity_is_finite_when_demand_underflows() {
        let d = demand();
        let markets = two_markets();
        let q = array![[1.0, 0.5], [0.2, 1.5]];
        let p = array![5000.0, 4.0];

        let (quant, e) = d.evaluate2(p.view(), q.view(), &markets).unwrap();
        let (_, r) = d.retention(p.view(), q.view(), &markets).unwrap();

        assert_eq!(quant[0], 0.0);
        assert_eq!(r[0], 1.0);
        assert_relative_eq!(e[0], -0.5 * 5000.0);
        assert!(e.iter().all(|v| v.is_finite() && *v <= 0.0));
        assert!(r.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    // Purpose
    // -------
    // Shares approach a full market as all utilities grow.
    fn shares_approach_one_for_large_utilities() {
        let d = DemandModel::with_default_delta_q(1.0, 0.0, array![[40.0, 40.0]]).unwrap();
        let s = d.shares_by_market(array![0.0, 0.0].view(), array![[0.0, 0.0]].view()).unwrap();

        assert_relative_eq!(s.row(0).sum(), 1.0, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // `inv_boost` returns one `cells_m × J` matrix per market equal to the
    // cell populations times `s(1 − s)·δ_q` of that market's row.
    fn inv_boost_shapes_and_values() {
        let d = demand();
        let markets = two_markets();
        let p = array![1.0, 1.0];
        let q = array![[1.0, 1.0], [1.0, 1.0]];

        let boosts = d.inv_boost(p.view(), q.view(), &markets).unwrap();
        let s = d.shares_by_market(p.view(), q.view()).unwrap();

        assert_eq!(boosts.len(), 2);
        assert_eq!(boosts[0].dim(), (2, 2));
        assert_eq!(boosts[1].dim(), (1, 2));
        let expect = 50.0 * s[[0, 1]] * (1.0 - s[[0, 1]]) * DEFAULT_DELTA_Q;
        assert_relative_eq!(boosts[0][[1, 1]], expect, epsilon = 1e-12);
    }

    #[test]
    fn inclusive_value_and_money_conversion() {
        let d = demand();
        let p = array![1.0, 2.0];
        let q = array![[1.0, 1.0], [1.0, 1.0]];

        let z = d.combine(p.view(), q.view()).unwrap();
        let iv = d.inclusive_value(p.view(), q.view()).unwrap();

        let naive = (1.0 + z.row(0).mapv(f64::exp).sum()).ln();
        assert_relative_eq!(iv[0], naive, epsilon = 1e-12);
        assert_relative_eq!(d.utility_to_money(iv[0]), naive / 0.5, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Invalid parameters and mis-shaped inputs are rejected, not broadcast.
    fn invalid_parameters_and_shapes_are_rejected() {
        let xi = array![[0.0, 0.0]];
        assert!(matches!(
            DemandModel::new(0.0, 1.0, xi.clone(), 0.2),
            Err(ModelError::InvalidAlpha { .. })
        ));
        assert!(matches!(
            DemandModel::new(1.0, f64::NAN, xi.clone(), 0.2),
            Err(ModelError::NonFiniteParameter { name: "beta", .. })
        ));

        let d = DemandModel::new(1.0, 1.0, xi, 0.2).unwrap();
        assert!(matches!(
            d.combine(array![1.0].view(), array![[1.0, 1.0]].view()),
            Err(ModelError::LengthMismatch { what: "price", .. })
        ));
        assert!(matches!(
            d.combine(array![1.0, 1.0].view(), array![[1.0], [1.0]].view()),
            Err(ModelError::ShapeMismatch { what: "quality", .. })
        ));
        assert!(matches!(
            d.evaluate(array![1.0, 1.0].view(), array![[1.0, 1.0]].view(), &two_markets()),
            Err(ModelError::LengthMismatch { what: "markets", .. })
        ));
    }

    #[test]
    fn demands_sequence_validation_and_evaluation() {
        assert_eq!(Demands::new(vec![]), Err(ModelError::EmptyHorizon));

        let demands = Demands::repeat(demand(), 3).unwrap();
        let markets = two_markets();
        let prices = vec![array![1.0, 1.0]; 2];
        let quality = vec![array![[1.0, 1.0], [1.0, 1.0]]; 3];

        let out = demands.evaluate(&prices, &quality, &markets).unwrap();

        assert_eq!(demands.len(), 3);
        assert_eq!(out.len(), 2);
    }
}
