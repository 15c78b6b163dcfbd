//! Adapter that exposes a user `ResidualSystem` as an `argmin` problem.
//!
//! We turn the root-finding problem `F(x) = 0` into a minimization problem
//! by defining the merit `c(x) = ½‖F(x)‖²`. Gradients are finite differences
//! of the merit itself, so the user only supplies residuals.
use std::cell::RefCell;

use crate::optimization::{
    errors::OptError,
    root_finder::{
        finite_diff::run_fd_diff,
        traits::ResidualSystem,
        types::{Cost, Grad, Point, Residual},
        validation::{validate_grad, validate_residual},
    },
};
use argmin::core::{CostFunction, Error, Gradient};
use finitediff::FiniteDiff;

/// Bridges a user `ResidualSystem` to `argmin`'s `CostFunction` and `Gradient`.
///
/// - `CostFunction::cost` returns `½‖F(x)‖²`.
/// - `Gradient::gradient` returns a central-difference gradient of the
///   merit, falling back to forward differences when the central stencil
///   hits an evaluation error or produces a non-finite entry.
#[derive(Debug, Clone)]
pub struct MeritAdapter<'a, F: ResidualSystem> {
    pub f: &'a F,
}

impl<'a, F: ResidualSystem> MeritAdapter<'a, F> {
    /// Construct a new adapter over a user `ResidualSystem`.
    pub fn new(f: &'a F) -> Self {
        Self { f }
    }

    /// Evaluate and validate `F(x)`.
    pub fn residuals(&self, x: &Point) -> Result<Residual, OptError> {
        let r = self.f.residuals(x)?;
        validate_residual(&r, x.len())?;
        Ok(r)
    }
}

impl<'a, F: ResidualSystem> CostFunction for MeritAdapter<'a, F> {
    type Param = Point;
    type Output = Cost;

    /// Evaluate the merit `c(x) = ½‖F(x)‖²`.
    ///
    /// # Errors
    /// Propagates residual evaluation/validation errors and returns
    /// `NonFiniteCost` if the merit overflows.
    fn cost(&self, x: &Self::Param) -> Result<Self::Output, Error> {
        let r = self.residuals(x)?;
        let output = 0.5 * r.dot(&r);
        if !output.is_finite() {
            return Err((OptError::NonFiniteCost { value: output }).into());
        }
        Ok(output)
    }
}

impl<'a, F: ResidualSystem> Gradient for MeritAdapter<'a, F> {
    type Param = Point;
    type Gradient = Grad;

    /// Finite-difference gradient of the merit at `x`.
    ///
    /// The FD closure must return `f64`, so errors are captured in
    /// `closure_err` and the closure returns `NaN`; after the central pass
    /// any captured error or validation failure triggers one forward pass.
    fn gradient(&self, x: &Self::Param) -> Result<Self::Gradient, Error> {
        let dim = x.len();
        let closure_err: RefCell<Option<Error>> = RefCell::new(None);
        let cost_func = |x: &Point| -> f64 {
            match self.cost(x) {
                Ok(val) => val,
                Err(e) => {
                    let mut slot = closure_err.borrow_mut();
                    if slot.is_none() {
                        *slot = Some(e);
                    }
                    f64::NAN
                }
            }
        };
        let fd_grad = x.central_diff(&cost_func);
        if closure_err.borrow().is_none() && validate_grad(&fd_grad, dim).is_ok() {
            return Ok(fd_grad);
        }
        Ok(run_fd_diff(x, &cost_func, &closure_err)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::errors::OptResult;
    use approx::assert_relative_eq;
    use ndarray::array;

    struct Linear;

    impl ResidualSystem for Linear {
        // F(x) = (x0 - 1, 2·x1 + 4)
        fn residuals(&self, x: &Point) -> OptResult<Residual> {
            Ok(array![x[0] - 1.0, 2.0 * x[1] + 4.0])
        }
    }

    struct WrongLength;

    impl ResidualSystem for WrongLength {
        fn residuals(&self, _x: &Point) -> OptResult<Residual> {
            Ok(array![0.0])
        }
    }

    #[test]
    // Purpose
    // -------
    // The merit is half the squared residual norm and its gradient is JᵀF.
    //
    // Given
    // -----
    // - F(x) = (x0 − 1, 2·x1 + 4) at x = (3, 0): F = (2, 4), J = diag(1, 2).
    //
    // Expect
    // ------
    // - c = ½(4 + 16) = 10, ∇c = (2, 8).
    fn merit_and_gradient_of_linear_system() {
        let system = Linear;
        let adapter = MeritAdapter::new(&system);
        let x = array![3.0, 0.0];

        let c = adapter.cost(&x).unwrap();
        let g = adapter.gradient(&x).unwrap();

        assert_relative_eq!(c, 10.0, epsilon = 1e-12);
        assert_relative_eq!(g[0], 2.0, epsilon = 1e-5);
        assert_relative_eq!(g[1], 8.0, epsilon = 1e-5);
    }

    #[test]
    fn residual_length_mismatch_is_an_error() {
        let system = WrongLength;
        let adapter = MeritAdapter::new(&system);

        let err = OptError::from(adapter.cost(&array![1.0, 2.0]).unwrap_err());

        assert_eq!(err, OptError::ResidualDimMismatch { expected: 2, found: 1 });
    }
}
