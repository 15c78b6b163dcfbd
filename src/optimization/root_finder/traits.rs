//! Public API surface for nonlinear root finding.
//!
//! - [`ResidualSystem`]: trait users implement for a square system `F(x) = 0`.
//! - [`RootOptions`] and [`Tolerances`]: configuration for the solver.
//! - [`LineSearcher`]: choice of line search used by L-BFGS.
//! - [`RootOutcome`]: normalized result returned by [`solve_root`](super::solve_root).
//!
//! Convention: we find a root of `F` by minimizing the merit function
//! `c(x) = ½‖F(x)‖²`. A minimizer with `c = 0` is a root; a minimizer with
//! `c > 0` is not, which is why every outcome carries the final residual
//! norm and a `converged` flag computed from it.
use crate::optimization::{
    errors::{OptError, OptResult},
    root_finder::{
        types::{FnEvalMap, Point, Residual},
        validation::{validate_solution, verify_tol_cost, verify_tol_grad, verify_tol_residual},
    },
};
use argmin::core::TerminationStatus;
use std::str::FromStr;

/// User-implemented square nonlinear system `F(x) = 0`.
///
/// Required:
/// - `residuals(&Point) -> OptResult<Residual>`: evaluate `F(x)`; the output
///   must have the same length as `x`.
///
/// Optional:
/// - `check(&Point) -> OptResult<()>`: validation hook run once on the
///   starting point before the solver is built.
pub trait ResidualSystem {
    fn residuals(&self, x: &Point) -> OptResult<Residual>;

    fn check(&self, _x0: &Point) -> OptResult<()> {
        Ok(())
    }
}

/// Choice of line search used inside the L-BFGS solver.
///
/// Parsing:
/// This enum implements `FromStr` and accepts case-insensitive names
/// (`"MoreThuente"`, `"HagerZhang"`). Unknown names return
/// `OptError::InvalidLineSearch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSearcher {
    MoreThuente,
    HagerZhang,
}

impl FromStr for LineSearcher {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morethuente" => Ok(LineSearcher::MoreThuente),
            "hagerzhang" => Ok(LineSearcher::HagerZhang),
            _ => Err(OptError::InvalidLineSearch {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'MoreThuente' or 'HagerZhang'.",
            }),
        }
    }
}

/// Numerical tolerances and iteration limits used by L-BFGS.
///
/// - `tol_grad`: terminate when the merit gradient norm falls below this.
/// - `tol_cost`: terminate when the change in merit falls below this.
/// - `max_iter`: hard cap on the number of iterations.
///
/// Any field can be `None` but **at least one** must be provided.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub tol_grad: Option<f64>,
    pub tol_cost: Option<f64>,
    pub max_iter: Option<usize>,
}

impl Tolerances {
    /// Construct validated tolerances.
    ///
    /// # Errors
    /// - [`OptError::NoTolerancesProvided`] if all three are `None`.
    /// - [`OptError::InvalidTolGrad`] / [`OptError::InvalidTolCost`] for
    ///   non-finite or non-positive tolerances.
    /// - [`OptError::InvalidMaxIter`] if `max_iter == 0`.
    pub fn new(
        tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    ) -> OptResult<Self> {
        if tol_grad.is_none() && tol_cost.is_none() && max_iter.is_none() {
            return Err(OptError::NoTolerancesProvided);
        }
        verify_tol_cost(tol_cost)?;
        verify_tol_grad(tol_grad)?;
        if let Some(max_iter) = max_iter {
            if max_iter == 0 {
                return Err(OptError::InvalidMaxIter {
                    max_iter,
                    reason: "Maximum iterations must be greater than zero.",
                });
            }
        }
        Ok(Self { tol_grad, tol_cost, max_iter })
    }
}

/// Root-finder configuration.
///
/// Fields:
/// - `tols`: L-BFGS stopping rules.
/// - `tol_residual`: acceptance threshold on `‖F(x̂)‖₂`; also sets the
///   Argmin target cost `½·tol_residual²`.
/// - `line_searcher`: line-search algorithm used by L-BFGS.
/// - `verbose`: attach the slog observer (behind the `obs_slog` feature).
/// - `lbfgs_mem`: L-BFGS history size; `None` uses [`DEFAULT_LBFGS_MEM`](super::DEFAULT_LBFGS_MEM).
///
/// Default:
/// - `tols`: `tol_grad = 1e-13`, `tol_cost = 1e-30`, `max_iter = 500`
/// - `tol_residual`: `1e-8`
/// - `line_searcher`: `MoreThuente`
#[derive(Debug, Clone, PartialEq)]
pub struct RootOptions {
    pub tols: Tolerances,
    pub tol_residual: f64,
    pub line_searcher: LineSearcher,
    pub verbose: bool,
    pub lbfgs_mem: Option<usize>,
}

impl RootOptions {
    /// Create a new set of root-finder options.
    ///
    /// # Errors
    /// - [`OptError::InvalidTolResidual`] if `tol_residual` is not finite and positive.
    /// - [`OptError::InvalidLBFGSMem`] if `lbfgs_mem == Some(0)`.
    pub fn new(
        tols: Tolerances, tol_residual: f64, line_searcher: LineSearcher, verbose: bool,
        lbfgs_mem: Option<usize>,
    ) -> OptResult<Self> {
        verify_tol_residual(tol_residual)?;
        if let Some(m) = lbfgs_mem {
            if m == 0 {
                return Err(OptError::InvalidLBFGSMem {
                    mem: m,
                    reason: "L-BFGS memory must be greater than zero.",
                });
            }
        }
        Ok(Self { tols, tol_residual, line_searcher, verbose, lbfgs_mem })
    }

    /// Target merit value at which Argmin stops early.
    pub fn target_cost(&self) -> f64 {
        0.5 * self.tol_residual * self.tol_residual
    }
}

impl Default for RootOptions {
    fn default() -> Self {
        Self {
            tols: Tolerances { tol_grad: Some(1e-13), tol_cost: Some(1e-30), max_iter: Some(500) },
            tol_residual: 1e-8,
            line_searcher: LineSearcher::MoreThuente,
            verbose: false,
            lbfgs_mem: None,
        }
    }
}

/// Canonical result returned by `solve_root`.
///
/// - `x_hat`: best point found.
/// - `residual_norm`: `‖F(x̂)‖₂`, re-evaluated after the run.
/// - `converged`: `residual_norm ≤ tol_residual`. Argmin terminating is not
///   enough; a stalled line search also terminates.
/// - `status`: human-readable termination status.
/// - `iterations`, `fn_evals`: counters reported by Argmin.
#[derive(Debug, Clone, PartialEq)]
pub struct RootOutcome {
    pub x_hat: Point,
    pub residual_norm: f64,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
}

impl RootOutcome {
    /// Build a validated [`RootOutcome`] from raw solver state.
    ///
    /// # Errors
    /// - Propagates validation errors for `x_hat`.
    pub fn new(
        x_hat_opt: Option<Point>, residual_norm: f64, tol_residual: f64,
        termination: &TerminationStatus, iterations: u64, fn_evals: FnEvalMap,
    ) -> OptResult<Self> {
        let x_hat = validate_solution(x_hat_opt)?;
        let status = match termination {
            TerminationStatus::NotTerminated => "Not terminated".to_string(),
            TerminationStatus::Terminated(reason) => reason.text().to_string(),
        };
        let converged = residual_norm.is_finite() && residual_norm <= tol_residual;
        Ok(Self { x_hat, residual_norm, converged, status, iterations: iterations as usize, fn_evals })
    }
}
