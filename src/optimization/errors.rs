//! Errors for the root-finding layer (configuration, residual evaluation,
//! solver outcome, and Argmin backend failures).
//!
//! [`OptError`] is the single error surface of `optimization`; Argmin's
//! `Error` and model-layer errors are converted into it so callers never
//! have to match on backend types.
use argmin::core::{ArgminError, Error};

use crate::model::errors::ModelError;
#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

/// Crate-wide result alias for optimizer operations.
pub type OptResult<T> = Result<T, OptError>;

#[derive(Debug, Clone, PartialEq)]
pub enum OptError {
    // ---- Gradient ----
    /// Gradient dimensions do not match parameter dimensions.
    GradientDimMismatch { expected: usize, found: usize },

    /// Gradient elements need to be finite
    InvalidGradient { index: usize, value: f64, reason: &'static str },

    // ---- RootOptions ----
    /// Gradient tolerance needs to be positive and finite.
    InvalidTolGrad { tol: f64, reason: &'static str },
    /// Cost change tolerance needs to be positive and finite.
    InvalidTolCost { tol: f64, reason: &'static str },
    /// Residual tolerance needs to be positive and finite.
    InvalidTolResidual { tol: f64, reason: &'static str },
    /// Maximum iterations needs to be positive.
    InvalidMaxIter { max_iter: usize, reason: &'static str },
    /// At least one tolerance must be provided.
    NoTolerancesProvided,

    /// Invalid line searcher name.
    InvalidLineSearch { name: String, reason: &'static str },

    /// lbfgs_mem needs to be at least 1.
    InvalidLBFGSMem { mem: usize, reason: &'static str },

    // ---- Residual system ----
    /// Residual vector length differs from the unknown vector length.
    ResidualDimMismatch { expected: usize, found: usize },

    /// A residual came back NaN/±inf.
    NonFiniteResidual { index: usize, value: f64 },

    /// Initial guess contains a non-finite entry.
    InvalidStartingPoint { index: usize, value: f64 },

    /// Cost function returned a non-finite value.
    NonFiniteCost { value: f64 },

    /// Residual evaluation failed inside the model layer.
    ModelFailure { text: String },

    // ---- Solver outcome ----
    /// Solution entries must be finite.
    InvalidSolution { index: usize, value: f64, reason: &'static str },

    /// Solver state carried no parameter vector.
    MissingSolution,

    // ---- Argmin ---
    /// Wrapper for argmin::InvalidParameter
    InvalidParameter { text: String },
    /// Wrapper for argmin::NotImplemented
    NotImplemented { text: String },
    /// Wrapper for argmin::NotInitialized
    NotInitialized { text: String },
    /// Wrapper for argmin::ConditionViolated
    ConditionViolated { text: String },
    /// Wrapper for argmin::CheckPointNotFound
    CheckPointNotFound { text: String },
    /// Wrapper for argmin::PotentialBug
    PotentialBug { text: String },
    /// Wrapper for argmin::ImpossibleError
    ImpossibleError { text: String },
    /// Wrapper for other argmin::Error types
    BackendError { text: String },

    // ---- Fallback ----
    UnknownError,
}

impl std::error::Error for OptError {}

impl std::fmt::Display for OptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Gradient ----
            OptError::GradientDimMismatch { expected, found } => {
                write!(f, "Gradient dimension mismatch: expected {expected}, found {found}")
            }
            OptError::InvalidGradient { index, value, reason } => {
                write!(f, "Invalid gradient at index {index}: {value}: {reason}")
            }

            // ---- RootOptions ----
            OptError::InvalidTolGrad { tol, reason } => {
                write!(f, "Invalid gradient tolerance {tol}: {reason}")
            }
            OptError::InvalidTolCost { tol, reason } => {
                write!(f, "Invalid cost function change tolerance {tol}: {reason}")
            }
            OptError::InvalidTolResidual { tol, reason } => {
                write!(f, "Invalid residual tolerance {tol}: {reason}")
            }
            OptError::InvalidMaxIter { max_iter, reason } => {
                write!(f, "Invalid maximum iterations {max_iter}: {reason}")
            }
            OptError::NoTolerancesProvided => {
                write!(f, "No tolerances provided")
            }
            OptError::InvalidLineSearch { name, reason } => {
                write!(f, "Invalid line searcher '{name}': {reason}")
            }
            OptError::InvalidLBFGSMem { mem, reason } => {
                write!(f, "Invalid L-BFGS memory {mem}: {reason}")
            }

            // ---- Residual system ----
            OptError::ResidualDimMismatch { expected, found } => {
                write!(f, "Residual dimension mismatch: expected {expected}, found {found}")
            }
            OptError::NonFiniteResidual { index, value } => {
                write!(f, "Non-finite residual at index {index}: {value}")
            }
            OptError::InvalidStartingPoint { index, value } => {
                write!(f, "Invalid starting point at index {index}: {value}, must be finite")
            }
            OptError::NonFiniteCost { value } => {
                write!(f, "Non-finite cost value: {value}")
            }
            OptError::ModelFailure { text } => {
                write!(f, "Residual evaluation failed: {text}")
            }

            // ---- Solver outcome ----
            OptError::InvalidSolution { index, value, reason } => {
                write!(f, "Invalid solution at index {index}: {value}: {reason}")
            }
            OptError::MissingSolution => {
                write!(f, "Solver returned no solution vector")
            }

            // ---- Argmin ----
            OptError::InvalidParameter { text } => {
                write!(f, "Invalid parameter: {text}")
            }
            OptError::NotImplemented { text } => {
                write!(f, "Not implemented: {text}")
            }
            OptError::NotInitialized { text } => {
                write!(f, "Not initialized: {text}")
            }
            OptError::ConditionViolated { text } => {
                write!(f, "Condition violated: {text}")
            }
            OptError::CheckPointNotFound { text } => {
                write!(f, "Checkpoint not found: {text}")
            }
            OptError::PotentialBug { text } => {
                write!(f, "Potential bug: {text}")
            }
            OptError::ImpossibleError { text } => {
                write!(f, "Impossible error: {text}")
            }
            OptError::BackendError { text } => {
                write!(f, "Backend error: {text}")
            }

            // ---- Fallback ----
            OptError::UnknownError => {
                write!(f, "Unknown error")
            }
        }
    }
}

impl From<Error> for OptError {
    fn from(original_err: Error) -> Self {
        match original_err.downcast::<ArgminError>() {
            Ok(opt_err) => match opt_err {
                ArgminError::InvalidParameter { text } => OptError::InvalidParameter { text },
                ArgminError::NotImplemented { text } => OptError::NotImplemented { text },
                ArgminError::NotInitialized { text } => OptError::NotInitialized { text },
                ArgminError::ConditionViolated { text } => OptError::ConditionViolated { text },
                ArgminError::CheckpointNotFound { text } => OptError::CheckPointNotFound { text },
                ArgminError::PotentialBug { text } => OptError::PotentialBug { text },
                ArgminError::ImpossibleError { text } => OptError::ImpossibleError { text },
                _ => OptError::UnknownError,
            },
            Err(err) => match err.downcast::<OptError>() {
                Ok(own) => own,
                Err(other) => OptError::BackendError { text: other.to_string() },
            },
        }
    }
}

impl From<ModelError> for OptError {
    fn from(err: ModelError) -> Self {
        OptError::ModelFailure { text: err.to_string() }
    }
}

#[cfg(feature = "python-bindings")]
impl From<OptError> for PyErr {
    fn from(err: OptError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Errors raised by our own residual code travel through Argmin as
    // `anyhow`-style errors; converting back must recover the original
    // variant instead of flattening it into `BackendError`.
    fn from_argmin_error_recovers_own_variant() {
        let original = OptError::NonFiniteCost { value: f64::NAN };
        let wrapped: Error = original.clone().into();

        let recovered = OptError::from(wrapped);

        match recovered {
            OptError::NonFiniteCost { value } => assert!(value.is_nan()),
            other => panic!("expected NonFiniteCost, got {other:?}"),
        }
    }

    #[test]
    fn model_error_maps_to_model_failure() {
        let err = OptError::from(ModelError::InvalidAlpha { value: -1.0 });
        assert!(matches!(err, OptError::ModelFailure { .. }));
    }
}
