//! Static production cost and dynamic investment cost, and their per-period
//! sequence.
//!
//! Purpose
//! -------
//! Provide the two cost components of a period: a static marginal cost per
//! product (constant in quantity for this model) and a dynamic investment
//! cost whose per-cell scale depends on the cell's shifter and population.
//! The investment side also owns the probability/utility transforms used by
//! the best response.
//!
//! Key behaviors
//! -------------
//! - [`CostModel::dynamic_cost_base`]:
//!   `α₀ ⊙ shifter^α_tri ⊙ population^α_pop`, shape `cells × J`.
//! - [`CostModel::utility_to_prob`]: `Φ((ln max(u, 1e-4) + σ²)/σ)`.
//! - [`CostModel::prob_to_utility`]: `Φ(Φ⁻¹(max(p, 1e-4)) − σ) / p`.
//!
//! `prob_to_utility` is deliberately **not** the inverse of
//! `utility_to_prob`. With a log-normal investment-utility draw, it returns
//! the expected marginal utility (per unit probability) of investing with
//! probability `p`, which is what the avoided-cost term of the best
//! response needs.
//!
//! Invariants & assumptions
//! ------------------------
//! - `sigma > 0`; `static_mc` and `alpha_0` have the same length `J ≥ 1`;
//!   all parameters finite.
//! - Floors at [`PROB_FLOOR`] are part of the model. Each clamped entry is
//!   counted on the model's [`ClampCounter`] (see
//!   [`CostModel::clamp_events`]).
//!
//! Testing notes
//! -------------
//! - Unit tests cover monotonicity and range of `utility_to_prob`, its
//!   value at the floor, the documented asymmetry with `prob_to_utility`,
//!   dynamic-cost shapes, and clamp counting.
use crate::{
    market::geography::Market,
    model::{
        errors::{ModelError, ModelResult},
        shape::{ensure_finite, ensure_len},
    },
    optimization::numerical_stability::transformations::{
        ClampCounter, PROB_FLOOR, floor_clamp, standard_normal,
    },
};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use statrs::distribution::{ContinuousCDF, Normal};

/// Static (production) cost parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticCostParams {
    /// Marginal cost per product (length `J`).
    pub static_mc: Array1<f64>,
}

/// Dynamic (investment) cost parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicCostParams {
    /// Scale per product (length `J`); strictly positive.
    pub alpha_0: Array1<f64>,
    /// Elasticity with respect to the cell shifter.
    pub alpha_tri: f64,
    /// Elasticity with respect to the cell population.
    pub alpha_pop: f64,
    /// Dispersion of the log investment utility; `> 0`.
    pub sigma: f64,
}

/// Cost model for one period.
#[derive(Debug, Clone)]
pub struct CostModel {
    static_pars: StaticCostParams,
    dynamic_pars: DynamicCostParams,
    normal: Normal,
    clamps: ClampCounter,
}

impl CostModel {
    /// Construct a validated cost model.
    ///
    /// # Errors
    /// - [`ModelError::NoProducts`] if `static_mc` is empty.
    /// - [`ModelError::LengthMismatch`] if `alpha_0` differs in length.
    /// - [`ModelError::InvalidSigma`] if `sigma` is non-finite or ≤ 0.
    /// - [`ModelError::InvalidDynamicScale`] if an `alpha_0` entry is ≤ 0.
    /// - [`ModelError::NonFiniteParameter`] for any other non-finite entry.
    pub fn new(static_pars: StaticCostParams, dynamic_pars: DynamicCostParams) -> ModelResult<Self> {
        let j = static_pars.static_mc.len();
        if j == 0 {
            return Err(ModelError::NoProducts);
        }
        ensure_len("alpha_0", &dynamic_pars.alpha_0, j)?;
        ensure_finite("static_mc", static_pars.static_mc.iter())?;
        ensure_finite("alpha_0", dynamic_pars.alpha_0.iter())?;
        if let Some((index, &value)) =
            dynamic_pars.alpha_0.iter().enumerate().find(|(_, a)| **a <= 0.0)
        {
            return Err(ModelError::InvalidDynamicScale { index, value });
        }
        ensure_finite("alpha_tri", [dynamic_pars.alpha_tri].iter())?;
        ensure_finite("alpha_pop", [dynamic_pars.alpha_pop].iter())?;
        let sigma = dynamic_pars.sigma;
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(ModelError::InvalidSigma { value: sigma });
        }
        Ok(Self { static_pars, dynamic_pars, normal: standard_normal(), clamps: ClampCounter::new() })
    }

    pub fn static_params(&self) -> &StaticCostParams {
        &self.static_pars
    }

    pub fn dynamic_params(&self) -> &DynamicCostParams {
        &self.dynamic_pars
    }

    /// Number of products `J`.
    pub fn n_products(&self) -> usize {
        self.static_pars.static_mc.len()
    }

    /// Static marginal cost at quantities `q` (length `J`).
    ///
    /// Constant in quantity; `q` only fixes the shape contract.
    pub fn static_marginal_cost(&self, q: ArrayView1<'_, f64>) -> ModelResult<Array1<f64>> {
        ensure_len("quantity", &q, self.n_products())?;
        Ok(self.static_pars.static_mc.clone())
    }

    /// Static cost `mc ⊙ q` for a matrix of quantities (`rows × J`).
    pub fn static_cost(&self, q: ArrayView2<'_, f64>) -> ModelResult<Array2<f64>> {
        if q.ncols() != self.n_products() {
            return Err(ModelError::LengthMismatch {
                what: "quantity columns",
                expected: self.n_products(),
                found: q.ncols(),
            });
        }
        Ok(&q * &self.static_pars.static_mc.view().insert_axis(Axis(0)))
    }

    /// Per-cell dynamic cost scale for `market`, shape `cells × J`.
    pub fn dynamic_cost_base(&self, market: &Market) -> Array2<f64> {
        let pars = &self.dynamic_pars;
        let cell_scale: Array1<f64> = market
            .shifters()
            .iter()
            .zip(market.populations())
            .map(|(&s, &p)| s.powf(pars.alpha_tri) * p.powf(pars.alpha_pop))
            .collect();
        &cell_scale.insert_axis(Axis(1)) * &pars.alpha_0.view().insert_axis(Axis(0))
    }

    /// Map investment utility to investment probability,
    /// `Φ((ln max(u, 1e-4) + σ²)/σ)`.
    ///
    /// Monotone non-decreasing with values in `[0, 1]`. Clamped entries are
    /// counted.
    pub fn utility_to_prob(&self, u: ArrayView2<'_, f64>) -> Array2<f64> {
        let sigma = self.dynamic_pars.sigma;
        let (u, raised) = floor_clamp(u, PROB_FLOOR);
        self.clamps.record(raised);
        u.mapv(|u| self.normal.cdf((u.ln() + sigma * sigma) / sigma))
    }

    /// Expected marginal investment utility at probability `p`,
    /// `Φ(Φ⁻¹(max(p, 1e-4)) − σ) / max(p, 1e-4)`.
    ///
    /// Not the inverse of [`CostModel::utility_to_prob`]. Clamped entries
    /// are counted.
    pub fn prob_to_utility(&self, p: ArrayView2<'_, f64>) -> Array2<f64> {
        let sigma = self.dynamic_pars.sigma;
        let (p, raised) = floor_clamp(p, PROB_FLOOR);
        self.clamps.record(raised);
        p.mapv(|p| self.normal.cdf(self.normal.inverse_cdf(p) - sigma) / p)
    }

    /// Total entries clamped to [`PROB_FLOOR`] by this model so far.
    pub fn clamp_events(&self) -> u64 {
        self.clamps.get()
    }
}

impl PartialEq for CostModel {
    fn eq(&self, other: &Self) -> bool {
        self.static_pars == other.static_pars && self.dynamic_pars == other.dynamic_pars
    }
}

/// Ordered per-period cost models.
#[derive(Debug, Clone, PartialEq)]
pub struct Costs {
    periods: Vec<CostModel>,
}

impl Costs {
    /// # Errors
    /// - [`ModelError::EmptyHorizon`] if `periods` is empty.
    /// - [`ModelError::LengthMismatch`] if the periods disagree on `J`.
    pub fn new(periods: Vec<CostModel>) -> ModelResult<Self> {
        let j = periods.first().ok_or(ModelError::EmptyHorizon)?.n_products();
        for c in &periods {
            if c.n_products() != j {
                return Err(ModelError::LengthMismatch {
                    what: "static_mc",
                    expected: j,
                    found: c.n_products(),
                });
            }
        }
        Ok(Self { periods })
    }

    /// Stationary sequence: `model` repeated for `horizon` periods.
    ///
    /// Each period gets its own clamp counter.
    pub fn repeat(model: CostModel, horizon: usize) -> ModelResult<Self> {
        let periods = (0..horizon)
            .map(|_| CostModel::new(model.static_pars.clone(), model.dynamic_pars.clone()))
            .collect::<ModelResult<Vec<_>>>()?;
        Self::new(periods)
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Number of products `J`.
    pub fn n_products(&self) -> usize {
        self.periods.first().map_or(0, CostModel::n_products)
    }

    pub fn get(&self, t: usize) -> Option<&CostModel> {
        self.periods.get(t)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CostModel> {
        self.periods.iter()
    }

    /// Sum of clamp events over the first `horizon` periods.
    pub fn clamp_events(&self, horizon: usize) -> u64 {
        self.periods.iter().take(horizon).map(CostModel::clamp_events).sum()
    }
}
