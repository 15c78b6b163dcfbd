//! dynamic_oligopoly — dynamic oligopoly equilibrium with Bertrand pricing and
//! stochastic quality investment, with optional Python bindings.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that
//! exposes the equilibrium engine to Python via the `_dynamic_oligopoly`
//! extension module. When the `python-bindings` feature is enabled, this
//! module defines the Python-facing class used by the `dynamic_oligopoly`
//! package.
//!
//! Key behaviors
//! -------------
//! - Re-export the core Rust modules (`market`, `model`, `optimization`,
//!   `equilibrium`) as the public crate surface.
//! - Define the `SingleTypeInvestment` `#[pyclass]` and the `#[pymodule]`
//!   initializer for the `_dynamic_oligopoly` Python extension.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work is implemented in the inner Rust modules; this file
//!   performs only FFI glue, input conversion, and error mapping.
//! - Python inputs are validated by the same constructors Rust callers use,
//!   so the invariants documented in the core modules hold on both sides.
//!
//! Conventions
//! -----------
//! - `T` periods, `M` markets, `J` products; trajectories returned to Python
//!   are stacked along a leading period axis.
//! - Errors from core Rust code convert to `ValueError` at the PyO3 boundary.
//!
//! Downstream usage
//! ----------------
//! - Native Rust code builds a [`market::MarketSet`], per-period
//!   [`model::Demands`] and [`model::Costs`], and drives an
//!   [`equilibrium::EquilibriumModel`].
//! - Python code constructs `SingleTypeInvestment` for a stationary model and
//!   reads trajectories and reports as NumPy arrays after
//!   `find_equilibrium`.
//!
//! Testing notes
//! -------------
//! - Core behavior is covered by unit tests in the inner modules and by
//!   `tests/integration_equilibrium_pipeline.rs`.

pub mod equilibrium;
pub mod market;
pub mod model;
pub mod optimization;
pub mod utils;

#[cfg(feature = "python-bindings")]
use ndarray::{Array1, Array2, Array3};

#[cfg(feature = "python-bindings")]
use numpy::{IntoPyArray, PyArray1, PyArray2, PyArray3};

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    equilibrium::{EquilibriumModel, EquilibriumOptions, EquilibriumResult},
    market::{Market, MarketSet},
    model::{CostModel, Costs, DemandModel, Demands, DynamicCostParams, StaticCostParams},
    optimization::root_finder::RootOptions,
    utils::{extract_f64_array, extract_matrix, extract_root_opts, extract_vector},
};

/// Trajectories and reports of a solved model, owned so they outlive the
/// borrowing engine.
#[cfg(feature = "python-bindings")]
struct SolvedState {
    iterations: usize,
    final_diff: f64,
    prices: Vec<Array1<f64>>,
    quality: Vec<Array2<f64>>,
    sigma: Vec<Vec<Array2<f64>>>,
    consumer_surplus: Vec<Array1<f64>>,
    static_profits: Vec<Array2<f64>>,
    dynamic_costs: Vec<Array2<f64>>,
    average_price: Array1<f64>,
    average_quality: Array1<f64>,
    penetration: Array1<f64>,
}

#[cfg(feature = "python-bindings")]
impl SolvedState {
    fn capture(model: &EquilibriumModel<'_>, iterations: usize, final_diff: f64) -> EquilibriumResult<Self> {
        Ok(Self {
            iterations,
            final_diff,
            prices: model.prices().to_vec(),
            quality: model.quality().to_vec(),
            sigma: model.sigma().iter().cloned().collect(),
            consumer_surplus: model.consumer_surplus()?,
            static_profits: model.static_profits()?,
            dynamic_costs: model.dynamic_costs()?,
            average_price: model.average_price()?,
            average_quality: model.average_quality()?,
            penetration: model.penetration()?,
        })
    }
}

/// SingleTypeInvestment — Python-facing stationary dynamic oligopoly.
///
/// Purpose
/// -------
/// Build a stationary model (the same demand and cost parameters in every
/// period) from NumPy inputs, solve it, and expose the equilibrium
/// trajectories and reports.
///
/// Parameters
/// ----------
/// Constructed from Python via `SingleTypeInvestment(shifters, populations,
/// alpha, beta, static_mc, alpha_0, quality, horizon, ...)`:
/// - `shifters`, `populations`: one 1-D array per market, one entry per cell.
/// - `alpha`, `beta`: demand price and quality coefficients.
/// - `static_mc`, `alpha_0`: length-`J` static marginal cost and dynamic cost
///   scale.
/// - `quality`: `M × J` initial quality, used for every period.
/// - `horizon`: number of periods `T`.
/// - `xi`: optional `M × J` intercepts (zeros when omitted).
/// - `alpha_tri`, `alpha_pop`, `sigma`, `delta`: dynamic cost exponents,
///   investment dispersion and discount factor.
///
/// Notes
/// -----
/// - Accessors raise `ValueError` until `find_equilibrium` has succeeded.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "dynamic_oligopoly.equilibrium")]
pub struct SingleTypeInvestment {
    markets: MarketSet,
    demands: Demands,
    costs: Costs,
    quality: Array2<f64>,
    delta: f64,
    price_solver: RootOptions,
    solved: Option<SolvedState>,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl SingleTypeInvestment {
    #[new]
    #[pyo3(
        signature = (
            shifters,
            populations,
            alpha,
            beta,
            static_mc,
            alpha_0,
            quality,
            horizon,
            xi = None,
            alpha_tri = 0.05,
            alpha_pop = 0.95,
            sigma = 0.2,
            delta = 0.92,
            tol_grad = None,
            tol_cost = None,
            max_iter = None,
            tol_residual = None,
            line_searcher = None,
            lbfgs_mem = None,
        ),
        text_signature = "(shifters, populations, alpha, beta, static_mc, alpha_0, quality, horizon, /, \
                          xi=None, alpha_tri=0.05, alpha_pop=0.95, sigma=0.2, delta=0.92, \
                          tol_grad=None, tol_cost=None, max_iter=None, tol_residual=None, \
                          line_searcher=None, lbfgs_mem=None)"
    )]
    pub fn new<'py>(
        py: Python<'py>, shifters: Vec<Bound<'py, PyAny>>, populations: Vec<Bound<'py, PyAny>>,
        alpha: f64, beta: f64, static_mc: &Bound<'py, PyAny>, alpha_0: &Bound<'py, PyAny>,
        quality: &Bound<'py, PyAny>, horizon: usize, xi: Option<&Bound<'py, PyAny>>,
        alpha_tri: f64, alpha_pop: f64, sigma: f64, delta: f64, tol_grad: Option<f64>,
        tol_cost: Option<f64>, max_iter: Option<usize>, tol_residual: Option<f64>,
        line_searcher: Option<&str>, lbfgs_mem: Option<usize>,
    ) -> PyResult<Self> {
        if shifters.len() != populations.len() {
            return Err(PyValueError::new_err(format!(
                "shifters and populations must list the same number of markets ({} vs {})",
                shifters.len(),
                populations.len()
            )));
        }
        let mut markets = Vec::with_capacity(shifters.len());
        for (s, p) in shifters.iter().zip(&populations) {
            let s = extract_f64_array(py, s)?;
            let p = extract_f64_array(py, p)?;
            let s = s.as_slice().map_err(|_| {
                PyValueError::new_err("shifters must be 1-D contiguous float64 arrays or sequences")
            })?;
            let p = p.as_slice().map_err(|_| {
                PyValueError::new_err("populations must be 1-D contiguous float64 arrays or sequences")
            })?;
            markets.push(Market::from_columns(s, p)?);
        }
        let markets = MarketSet::new(markets)?;

        let static_mc = extract_vector(py, static_mc, "static_mc")?;
        let alpha_0 = extract_vector(py, alpha_0, "alpha_0")?;
        let quality = extract_matrix(quality, "quality")?;
        let xi = match xi {
            Some(raw) => extract_matrix(raw, "xi")?,
            None => Array2::zeros((markets.count(), static_mc.len())),
        };

        let demand = DemandModel::with_default_delta_q(alpha, beta, xi)?;
        let cost = CostModel::new(
            StaticCostParams { static_mc },
            DynamicCostParams { alpha_0, alpha_tri, alpha_pop, sigma },
        )?;
        let price_solver =
            extract_root_opts(tol_grad, tol_cost, max_iter, tol_residual, line_searcher, lbfgs_mem)?;

        Ok(SingleTypeInvestment {
            markets,
            demands: Demands::repeat(demand, horizon)?,
            costs: Costs::repeat(cost, horizon)?,
            quality,
            delta,
            price_solver,
            solved: None,
        })
    }

    /// Run the outer fixed point and store the solved trajectories.
    #[pyo3(
        signature = (tolerance = 1e-4, learning_rate = 1.0, max_iter = 500),
        text_signature = "(self, /, tolerance=1e-4, learning_rate=1.0, max_iter=500)"
    )]
    pub fn find_equilibrium(
        &mut self, py: Python<'_>, tolerance: f64, learning_rate: f64, max_iter: usize,
    ) -> PyResult<usize> {
        let opts =
            EquilibriumOptions::new(tolerance, learning_rate, max_iter, self.price_solver.clone())?;
        let initial = vec![self.quality.clone(); self.demands.len()];
        let (markets, demands, costs, delta) = (&self.markets, &self.demands, &self.costs, self.delta);
        let price_solver = &self.price_solver;
        let solved = py.allow_threads(|| -> EquilibriumResult<SolvedState> {
            let mut model =
                EquilibriumModel::with_price_solver(markets, demands, costs, initial, delta, price_solver)?;
            let outcome = model.find_equilibrium(&opts)?;
            SolvedState::capture(&model, outcome.iterations, outcome.final_diff)
        })?;
        let iterations = solved.iterations;
        self.solved = Some(solved);
        Ok(iterations)
    }

    #[getter]
    pub fn iterations(&self) -> PyResult<usize> {
        Ok(self.solved()?.iterations)
    }

    #[getter]
    pub fn final_diff(&self) -> PyResult<f64> {
        Ok(self.solved()?.final_diff)
    }

    /// Prices, shape `T × J`.
    #[getter]
    pub fn prices<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyArray2<f64>>> {
        Ok(stack_vectors(&self.solved()?.prices).into_pyarray(py))
    }

    /// Quality, shape `T × M × J`.
    #[getter]
    pub fn quality<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyArray3<f64>>> {
        Ok(stack_matrices(&self.solved()?.quality).into_pyarray(py))
    }

    /// Investment probabilities, `sigma[t][m]` of shape `cells_m × J`.
    #[getter]
    pub fn sigma<'py>(&self, py: Python<'py>) -> PyResult<Vec<Vec<Bound<'py, PyArray2<f64>>>>> {
        Ok(self
            .solved()?
            .sigma
            .iter()
            .map(|period| period.iter().map(|s| s.clone().into_pyarray(py)).collect())
            .collect())
    }

    /// Consumer surplus, shape `T × M`.
    #[getter]
    pub fn consumer_surplus<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyArray2<f64>>> {
        Ok(stack_vectors(&self.solved()?.consumer_surplus).into_pyarray(py))
    }

    /// Static profits, shape `T × M × J`.
    #[getter]
    pub fn static_profits<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyArray3<f64>>> {
        Ok(stack_matrices(&self.solved()?.static_profits).into_pyarray(py))
    }

    /// Dynamic investment costs, shape `T × M × J`.
    #[getter]
    pub fn dynamic_costs<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyArray3<f64>>> {
        Ok(stack_matrices(&self.solved()?.dynamic_costs).into_pyarray(py))
    }

    #[getter]
    pub fn average_price<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyArray1<f64>>> {
        Ok(self.solved()?.average_price.clone().into_pyarray(py))
    }

    #[getter]
    pub fn average_quality<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyArray1<f64>>> {
        Ok(self.solved()?.average_quality.clone().into_pyarray(py))
    }

    #[getter]
    pub fn penetration<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyArray1<f64>>> {
        Ok(self.solved()?.penetration.clone().into_pyarray(py))
    }
}

#[cfg(feature = "python-bindings")]
impl SingleTypeInvestment {
    fn solved(&self) -> PyResult<&SolvedState> {
        self.solved
            .as_ref()
            .ok_or_else(|| PyValueError::new_err("model not solved; call find_equilibrium() first"))
    }
}

#[cfg(feature = "python-bindings")]
fn stack_vectors(rows: &[Array1<f64>]) -> Array2<f64> {
    let n_cols = rows.first().map_or(0, Array1::len);
    Array2::from_shape_fn((rows.len(), n_cols), |(t, j)| rows[t][j])
}

#[cfg(feature = "python-bindings")]
fn stack_matrices(periods: &[Array2<f64>]) -> Array3<f64> {
    let (n_rows, n_cols) = periods.first().map_or((0, 0), Array2::dim);
    Array3::from_shape_fn((periods.len(), n_rows, n_cols), |(t, m, j)| periods[t][[m, j]])
}

/// _dynamic_oligopoly — PyO3 module initializer for the Python extension.
///
/// Registers the `equilibrium` submodule under `dynamic_oligopoly` and in
/// `sys.modules` so it is importable via its dotted path.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _dynamic_oligopoly<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let equilibrium_mod = PyModule::new(_py, "equilibrium")?;
    equilibrium_mod.add_class::<SingleTypeInvestment>()?;
    m.add_submodule(&equilibrium_mod)?;

    // Manually add submodules into sys.modules to allow for dot notation.
    _py.import("sys")?
        .getattr("modules")?
        .set_item("dynamic_oligopoly.equilibrium", equilibrium_mod)?;
    Ok(())
}
