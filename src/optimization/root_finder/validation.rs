//! Validation helpers for root finding.
//!
//! - **Tolerance checks**: [`verify_tol_grad`], [`verify_tol_cost`],
//!   [`verify_tol_residual`] ensure numeric tolerances are finite and
//!   strictly positive when provided.
//! - **Starting points and residuals**: [`validate_point`] and
//!   [`validate_residual`] enforce finiteness and matching dimensions.
//! - **Gradient validation**: [`validate_grad`] enforces correct dimension
//!   and finite entries.
//! - **Solutions**: [`validate_solution`] ensures the solver returned a
//!   finite parameter vector.
use crate::optimization::{
    errors::{OptError, OptResult},
    root_finder::types::{Grad, Point, Residual},
};

/// Validate the optional gradient‐norm tolerance.
///
/// # Errors
/// Returns [`OptError::InvalidTolGrad`] if the value is non-finite or ≤ 0.0.
pub fn verify_tol_grad(tol: Option<f64>) -> OptResult<()> {
    if let Some(tol) = tol {
        if !tol.is_finite() {
            return Err(OptError::InvalidTolGrad { tol, reason: "Tolerance must be finite." });
        }
        if tol <= 0.0 {
            return Err(OptError::InvalidTolGrad { tol, reason: "Tolerance must be positive." });
        }
    }
    Ok(())
}

/// Validate the optional cost‐change tolerance.
///
/// # Errors
/// Returns [`OptError::InvalidTolCost`] if the value is non-finite or ≤ 0.0.
pub fn verify_tol_cost(tol: Option<f64>) -> OptResult<()> {
    if let Some(tol) = tol {
        if !tol.is_finite() {
            return Err(OptError::InvalidTolCost { tol, reason: "Tolerance must be finite." });
        }
        if tol <= 0.0 {
            return Err(OptError::InvalidTolCost { tol, reason: "Tolerance must be positive." });
        }
    }
    Ok(())
}

/// Validate the residual-norm acceptance tolerance.
///
/// # Errors
/// Returns [`OptError::InvalidTolResidual`] if the value is non-finite or ≤ 0.0.
pub fn verify_tol_residual(tol: f64) -> OptResult<()> {
    if !tol.is_finite() {
        return Err(OptError::InvalidTolResidual { tol, reason: "Tolerance must be finite." });
    }
    if tol <= 0.0 {
        return Err(OptError::InvalidTolResidual { tol, reason: "Tolerance must be positive." });
    }
    Ok(())
}

/// Validate a starting point: every entry must be finite.
///
/// # Errors
/// [`OptError::InvalidStartingPoint`] for the first offending entry.
pub fn validate_point(x: &Point) -> OptResult<()> {
    for (index, &value) in x.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidStartingPoint { index, value });
        }
    }
    Ok(())
}

/// Validate a residual vector against dimension and finiteness.
///
/// # Errors
/// - [`OptError::ResidualDimMismatch`] if `residual.len() != dim`.
/// - [`OptError::NonFiniteResidual`] for the first non-finite entry.
pub fn validate_residual(residual: &Residual, dim: usize) -> OptResult<()> {
    if residual.len() != dim {
        return Err(OptError::ResidualDimMismatch { expected: dim, found: residual.len() });
    }
    for (index, &value) in residual.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::NonFiniteResidual { index, value });
        }
    }
    Ok(())
}

/// Validate a gradient vector against dimension and finiteness.
///
/// # Errors
/// - [`OptError::GradientDimMismatch`] if length does not match `dim`.
/// - [`OptError::InvalidGradient`] with the index/value/reason of the first
///   offending element.
pub fn validate_grad(grad: &Grad, dim: usize) -> OptResult<()> {
    if grad.len() != dim {
        return Err(OptError::GradientDimMismatch { expected: dim, found: grad.len() });
    }
    for (index, &value) in grad.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidGradient {
                index,
                value,
                reason: "Gradient elements must be finite.",
            });
        }
    }
    Ok(())
}

/// Validate and unwrap the solver's best point.
///
/// # Errors
/// - [`OptError::MissingSolution`] if no vector was provided.
/// - [`OptError::InvalidSolution`] if any element is non-finite.
pub fn validate_solution(x_hat: Option<Point>) -> OptResult<Point> {
    match x_hat {
        Some(x) => {
            for (index, &value) in x.iter().enumerate() {
                if !value.is_finite() {
                    return Err(OptError::InvalidSolution {
                        index,
                        value,
                        reason: "Solution entries must be finite.",
                    });
                }
            }
            Ok(x)
        }
        None => Err(OptError::MissingSolution),
    }
}
