//! Errors for the market/geography layer.
//!
//! Zip-code cells carry a population and a cost shifter; both must be
//! strictly positive and finite. Markets and market sets must be non-empty.
//! Indices in error payloads are 0-based.
#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

/// Result alias for market construction.
pub type MarketResult<T> = Result<T, MarketError>;

#[derive(Debug, Clone, PartialEq)]
pub enum MarketError {
    /// A market must contain at least one zip-code cell.
    EmptyMarket,

    /// A market set must contain at least one market.
    EmptyMarketSet,

    /// Cell population is NaN/±inf or ≤ 0.
    InvalidPopulation { value: f64, reason: &'static str },

    /// Cell cost shifter is NaN/±inf or ≤ 0.
    InvalidShifter { value: f64, reason: &'static str },

    /// Offending cell inside a market.
    InvalidCell { market: Option<usize>, cell: usize, source: Box<MarketError> },
}

impl std::error::Error for MarketError {}

impl std::fmt::Display for MarketError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarketError::EmptyMarket => write!(f, "Market must contain at least one cell"),
            MarketError::EmptyMarketSet => {
                write!(f, "Market set must contain at least one market")
            }
            MarketError::InvalidPopulation { value, reason } => {
                write!(f, "Invalid cell population {value}: {reason}")
            }
            MarketError::InvalidShifter { value, reason } => {
                write!(f, "Invalid cell shifter {value}: {reason}")
            }
            MarketError::InvalidCell { market: Some(m), cell, source } => {
                write!(f, "Market {m}, cell {cell}: {source}")
            }
            MarketError::InvalidCell { market: None, cell, source } => {
                write!(f, "Cell {cell}: {source}")
            }
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<MarketError> for PyErr {
    fn from(err: MarketError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
