//! root_finder::types — shared numeric aliases and solver wiring.
//!
//! Purpose
//! -------
//! Centralize the numeric types and solver aliases used by the root finder
//! so the rest of the optimization code can stay agnostic to `ndarray` and
//! Argmin generics.
//!
//! Conventions
//! -----------
//! - `Point` is the vector of unknowns `x`; `Residual` is `F(x)` and has the
//!   same length.
//! - `Cost` is the scalar merit `c(x) = ½‖F(x)‖²` that Argmin minimizes.
use argmin::solver::{
    linesearch::{HagerZhangLineSearch, MoreThuenteLineSearch},
    quasinewton::LBFGS,
};
use ndarray::Array1;
use std::collections::HashMap;

/// Vector of unknowns `x`.
pub type Point = Array1<f64>;

/// Residual vector `F(x)`; same length as [`Point`].
pub type Residual = Array1<f64>;

/// Gradient of the merit function `∇c(x) = J(x)ᵀ F(x)`.
pub type Grad = Array1<f64>;

/// Scalar merit value `c(x) = ½‖F(x)‖²`.
pub type Cost = f64;

/// Function-evaluation counters as reported by the solver.
///
/// Maps human-readable counter names (e.g., `"cost_count"`) to counts.
pub type FnEvalMap = HashMap<String, u64>;

/// Default history size (`m`) for L-BFGS runs.
pub const DEFAULT_LBFGS_MEM: usize = 7;

/// Hager–Zhang line search specialized to this crate’s numeric types.
pub type HagerZhangLS = HagerZhangLineSearch<Point, Grad, Cost>;

/// More–Thuente line search specialized to this crate’s numeric types.
pub type MoreThuenteLS = MoreThuenteLineSearch<Point, Grad, Cost>;

/// L-BFGS solver wired to the Hager–Zhang line search.
pub type LbfgsHagerZhang = LBFGS<HagerZhangLS, Point, Grad, Cost>;

/// L-BFGS solver wired to the More–Thuente line search.
pub type LbfgsMoreThuente = LBFGS<MoreThuenteLS, Point, Grad, Cost>;
