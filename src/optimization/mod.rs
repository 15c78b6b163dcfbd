//! optimization — root finding, numerical guards, and the optimizer error surface.
//!
//! Purpose
//! -------
//! Provide the numerical layer the equilibrium engine stands on: an
//! Argmin-backed solver for square nonlinear systems, the guarded
//! transforms used by the demand and cost models, and a single
//! error/result surface for everything solver-related.
//!
//! Key behaviors
//! -------------
//! - `root_finder`: solve `F(x) = 0` by minimizing `½‖F(x)‖²` with L-BFGS
//!   and report the final residual norm so non-convergence is visible.
//! - `numerical_stability`: overflow-safe logit shares and inclusive
//!   values, floor clamps, and the clamp counter.
//! - `errors`: normalize configuration issues, residual-evaluation failures
//!   and Argmin backend errors into `OptError` / `OptResult<T>`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Solvers assume finite inputs once validation has passed; invalid
//!   states are reported as `OptError`, not panics.
//! - Model-layer failures raised inside a residual evaluation are carried
//!   through as `OptError::ModelFailure`.
//!
//! Conventions
//! -----------
//! - Vectors use the `ndarray`-based aliases in `root_finder::types`.
//! - This module and its submodules do not log; the equilibrium engine
//!   reports progress through the `log` facade.
//!
//! Testing notes
//! -------------
//! - Unit tests in the submodules focus on local concerns: solver wiring and
//!   tolerance handling, agreement of the guarded transforms with naïve
//!   formulas, and error conversions.

pub mod errors;
pub mod numerical_stability;
pub mod root_finder;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use dynamic_oligopoly::optimization::prelude::*;
//
// to import the main optimization surface in a single line.

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::numerical_stability::prelude::*;
    pub use super::root_finder::prelude::*;
}
