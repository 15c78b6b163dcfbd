//! root_finder — Argmin-backed solver for square nonlinear systems.
//!
//! Purpose
//! -------
//! Provide the numerical workhorse behind the per-period Bertrand price
//! solve: given a residual map `F: ℝⁿ → ℝⁿ`, find `x̂` with `F(x̂) ≈ 0`.
//! Callers implement one trait, [`ResidualSystem`], and call
//! [`solve_root`].
//!
//! Key behaviors
//! -------------
//! - Recast `F(x) = 0` as minimization of the merit `c(x) = ½‖F(x)‖²`
//!   through [`adapter::MeritAdapter`], with finite-difference gradients
//!   (central first, forward as fallback).
//! - Build L-BFGS with a Hager–Zhang or More–Thuente line search
//!   ([`builders`]) and execute it with a target cost of `½·tol_residual²`
//!   ([`run::run_lbfgs`]).
//! - Re-evaluate `‖F(x̂)‖` after the run and expose it on [`RootOutcome`]
//!   together with a `converged` flag; stalling on a non-zero minimum of the
//!   merit is reported, not hidden.
//!
//! Invariants & assumptions
//! ------------------------
//! - `F(x)` has the same length as `x` and is finite wherever the caller
//!   expects the solver to go; violations surface as [`OptError`]
//!   (`ResidualDimMismatch`, `NonFiniteResidual`).
//! - Configuration types ([`Tolerances`], [`RootOptions`]) are validated on
//!   construction.
//!
//! Conventions
//! -----------
//! - Unknowns live in an unconstrained space ([`Point`]). Constrained
//!   quantities (e.g. strictly positive prices) are reparameterized by the
//!   caller before handing the system to the solver.
//! - Errors bubble up as [`OptResult<T>`]; nothing here panics.
//!
//! Downstream usage
//! ----------------
//! - `equilibrium::pricing` implements [`ResidualSystem`] for the
//!   first-order conditions of one period and calls [`solve_root`] with
//!   log-prices as unknowns.
//!
//! Testing notes
//! -------------
//! - Unit tests cover merit/gradient wiring in [`adapter`], tolerance
//!   handling in [`traits`] and [`validation`], finite-difference error
//!   capture in [`finite_diff`], and end-to-end solves of small systems in
//!   [`api`].
//!
//! [`OptError`]: crate::optimization::errors::OptError
//! [`OptResult<T>`]: crate::optimization::errors::OptResult

pub mod adapter;
pub mod api;
pub mod builders;
pub mod finite_diff;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::solve_root;
pub use self::traits::{LineSearcher, ResidualSystem, RootOptions, RootOutcome, Tolerances};
pub use self::types::{Cost, DEFAULT_LBFGS_MEM, FnEvalMap, Grad, Point, Residual};

pub mod prelude {
    pub use super::api::solve_root;
    pub use super::traits::{LineSearcher, ResidualSystem, RootOptions, RootOutcome, Tolerances};
    pub use super::types::{Point, Residual};
}
