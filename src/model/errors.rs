//! Errors for the demand and cost models (parameter validation and shape
//! contracts).
//!
//! [`ModelError`] is raised at construction time for invalid parameters and
//! at every public operation boundary when an input array has the wrong
//! shape. Market construction errors are wrapped rather than flattened.
//!
//! ## Conventions
//! - Shapes are reported as `(rows, cols)`; vectors as `(len, 1)`.
//! - `what` names the offending argument (`"xi"`, `"quality"`, ...).
use crate::market::errors::MarketError;
#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

/// Result alias for model construction and evaluation.
pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    // ---- Parameters ----
    /// Price sensitivity must be finite and > 0.
    InvalidAlpha { value: f64 },

    /// Investment cost dispersion must be finite and > 0.
    InvalidSigma { value: f64 },

    /// Discount factor must lie strictly inside (0, 1).
    InvalidDelta { value: f64 },

    /// Dynamic cost scale entries must be finite and > 0.
    InvalidDynamicScale { index: usize, value: f64 },

    /// A parameter entry is NaN/±inf.
    NonFiniteParameter { name: &'static str, index: usize, value: f64 },

    /// The model must have at least one product.
    NoProducts,

    // ---- Horizon ----
    /// Demand and cost sequences must cover at least one period.
    EmptyHorizon,

    /// Initial quality must provide one `M × J` matrix per period.
    InitialQualityLength { expected: usize, found: usize },

    // ---- Shapes ----
    /// A matrix argument does not have the documented shape.
    ShapeMismatch { what: &'static str, expected: (usize, usize), found: (usize, usize) },

    /// A vector argument does not have the documented length.
    LengthMismatch { what: &'static str, expected: usize, found: usize },

    // ---- Geography ----
    /// Invalid market data.
    Market(MarketError),
}

impl std::error::Error for ModelError {}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Parameters ----
            ModelError::InvalidAlpha { value } => {
                write!(f, "Invalid price sensitivity alpha = {value}: must be finite and > 0")
            }
            ModelError::InvalidSigma { value } => {
                write!(f, "Invalid investment dispersion sigma = {value}: must be finite and > 0")
            }
            ModelError::InvalidDelta { value } => {
                write!(f, "Invalid discount factor delta = {value}: must lie in (0, 1)")
            }
            ModelError::InvalidDynamicScale { index, value } => {
                write!(f, "Invalid dynamic cost scale alpha_0[{index}] = {value}: must be > 0")
            }
            ModelError::NonFiniteParameter { name, index, value } => {
                write!(f, "Non-finite parameter {name}[{index}] = {value}")
            }
            ModelError::NoProducts => write!(f, "Model must have at least one product"),

            // ---- Horizon ----
            ModelError::EmptyHorizon => {
                write!(f, "Demand and cost sequences must cover at least one period")
            }
            ModelError::InitialQualityLength { expected, found } => {
                write!(
                    f,
                    "Initial quality covers {found} periods, at least {expected} are required"
                )
            }

            // ---- Shapes ----
            ModelError::ShapeMismatch { what, expected, found } => {
                write!(
                    f,
                    "Shape mismatch for {what}: expected {}x{}, found {}x{}",
                    expected.0, expected.1, found.0, found.1
                )
            }
            ModelError::LengthMismatch { what, expected, found } => {
                write!(f, "Length mismatch for {what}: expected {expected}, found {found}")
            }

            // ---- Geography ----
            ModelError::Market(err) => write!(f, "Market error: {err}"),
        }
    }
}

impl From<MarketError> for ModelError {
    fn from(err: MarketError) -> Self {
        ModelError::Market(err)
    }
}

#[cfg(feature = "python-bindings")]
impl From<ModelError> for PyErr {
    fn from(err: ModelError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
