//! Shape contracts for the dense arrays passed between models and the engine.
//!
//! Every public model operation checks its inputs here instead of relying on
//! `ndarray` broadcasting, so a transposed or truncated argument fails with a
//! named [`ModelError`] rather than a panic deep inside an arithmetic op.
use crate::model::errors::{ModelError, ModelResult};
use ndarray::{ArrayBase, Data, Ix1, Ix2};

/// Require a matrix of exactly `expected = (rows, cols)`.
///
/// # Errors
/// [`ModelError::ShapeMismatch`] naming `what`.
pub fn ensure_matrix<S>(
    what: &'static str, a: &ArrayBase<S, Ix2>, expected: (usize, usize),
) -> ModelResult<()>
where
    S: Data<Elem = f64>,
{
    let found = a.dim();
    if found != expected {
        return Err(ModelError::ShapeMismatch { what, expected, found });
    }
    Ok(())
}

/// Require a vector of exactly `expected` entries.
///
/// # Errors
/// [`ModelError::LengthMismatch`] naming `what`.
pub fn ensure_len<S>(what: &'static str, v: &ArrayBase<S, Ix1>, expected: usize) -> ModelResult<()>
where
    S: Data<Elem = f64>,
{
    if v.len() != expected {
        return Err(ModelError::LengthMismatch { what, expected, found: v.len() });
    }
    Ok(())
}

/// Require every entry of `values` to be finite.
///
/// # Errors
/// [`ModelError::NonFiniteParameter`] for the first offending entry
/// (flat, row-major index).
pub fn ensure_finite<'a, I>(name: &'static str, values: I) -> ModelResult<()>
where
    I: IntoIterator<Item = &'a f64>,
{
    for (index, &value) in values.into_iter().enumerate() {
        if !value.is_finite() {
            return Err(ModelError::NonFiniteParameter { name, index, value });
        }
    }
    Ok(())
}
