//! Errors for the equilibrium engine (options, price sub-solve, outer fixed
//! point), wrapping model and optimizer failures.
//!
//! ## Conventions
//! - `period` is the 0-based index into the horizon.
//! - [`EquilibriumError::NonConvergence`] is recoverable: callers typically
//!   retry with a smaller learning rate or a larger iteration budget.
use crate::{model::errors::ModelError, optimization::errors::OptError};
#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

/// Result alias for engine operations.
pub type EquilibriumResult<T> = Result<T, EquilibriumError>;

#[derive(Debug, Clone, PartialEq)]
pub enum EquilibriumError {
    // ---- Options ----
    /// Fixed-point tolerance must be finite and > 0.
    InvalidTolerance { value: f64 },

    /// Learning rate must lie in (0, 1].
    InvalidLearningRate { value: f64 },

    /// Iteration budget must be > 0 when validated through the constructor.
    InvalidMaxIter { value: usize },

    // ---- Price sub-solve ----
    /// The Bertrand first-order conditions were not solved for a period,
    /// from either starting point.
    PriceSolverFailure { period: usize, residual_norm: f64, status: String },

    // ---- Outer fixed point ----
    /// The investment trajectory did not settle within the budget.
    NonConvergence { iterations: usize, last_diff: f64 },

    // ---- Wrapped ----
    Model(ModelError),
    Optimization(OptError),
}

impl std::error::Error for EquilibriumError {}

impl std::fmt::Display for EquilibriumError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Options ----
            EquilibriumError::InvalidTolerance { value } => {
                write!(f, "Invalid fixed-point tolerance {value}: must be finite and > 0")
            }
            EquilibriumError::InvalidLearningRate { value } => {
                write!(f, "Invalid learning rate {value}: must lie in (0, 1]")
            }
            EquilibriumError::InvalidMaxIter { value } => {
                write!(f, "Invalid maximum iterations {value}: must be > 0")
            }

            // ---- Price sub-solve ----
            EquilibriumError::PriceSolverFailure { period, residual_norm, status } => {
                write!(
                    f,
                    "Price equilibrium not found for period {period}: residual norm \
                     {residual_norm:.3e} ({status})"
                )
            }

            // ---- Outer fixed point ----
            EquilibriumError::NonConvergence { iterations, last_diff } => {
                write!(
                    f,
                    "Investment fixed point did not converge after {iterations} iterations \
                     (last max difference {last_diff:.3e})"
                )
            }

            // ---- Wrapped ----
            EquilibriumError::Model(err) => write!(f, "{err}"),
            EquilibriumError::Optimization(err) => write!(f, "Optimizer error: {err}"),
        }
    }
}

impl From<ModelError> for EquilibriumError {
    fn from(err: ModelError) -> Self {
        EquilibriumError::Model(err)
    }
}

impl From<OptError> for EquilibriumError {
    fn from(err: OptError) -> Self {
        EquilibriumError::Optimization(err)
    }
}

#[cfg(feature = "python-bindings")]
impl From<EquilibriumError> for PyErr {
    fn from(err: EquilibriumError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
