//! root_finder::finite_diff — finite-difference gradients with error capture.
//!
//! Purpose
//! -------
//! Provide the forward-difference fallback used by the merit-function
//! adapter when a central-difference gradient fails, together with
//! post-hoc validation so that the solver never sees a non-finite gradient.
//!
//! Invariants & assumptions
//! ------------------------
//! - Any error raised by the objective during finite differencing is routed
//!   into the shared `closure_err` cell and treated as a hard failure.
//! - Gradients returned from this module satisfy [`validate_grad`].
use crate::optimization::{
    errors::OptResult,
    root_finder::{
        types::{Grad, Point},
        validation::validate_grad,
    },
};
use argmin::core::Error;
use finitediff::FiniteDiff;
use std::cell::RefCell;

/// run_fd_diff — forward-difference gradient with error capture and validation.
///
/// Parameters
/// ----------
/// - `x`: point at which the gradient is approximated.
/// - `func`: scalar objective. It must write any evaluation error into
///   `closure_err` and return `NaN` in that case.
/// - `closure_err`: shared error slot; cleared on entry, inspected after the
///   finite-difference call.
///
/// Errors
/// ------
/// - The captured error, converted into `OptError`.
/// - `OptError::GradientDimMismatch` / `OptError::InvalidGradient` from
///   [`validate_grad`].
///
/// Examples
/// --------
/// ```rust
/// # use std::cell::RefCell;
/// # use argmin::core::Error;
/// # use ndarray::Array1;
/// # use dynamic_oligopoly::optimization::root_finder::{Point, finite_diff::run_fd_diff};
/// let x: Point = Array1::from(vec![0.0_f64, 1.0]);
/// let closure_err: RefCell<Option<Error>> = RefCell::new(None);
/// let f = |p: &Point| p.dot(p);
///
/// let grad = run_fd_diff(&x, &f, &closure_err).unwrap();
/// assert_eq!(grad.len(), x.len());
/// ```
pub fn run_fd_diff<G: Fn(&Point) -> f64>(
    x: &Point, func: &G, closure_err: &RefCell<Option<Error>>,
) -> OptResult<Grad> {
    closure_err.replace(None);
    let fd_grad = x.forward_diff(func);
    if let Some(err) = closure_err.take() {
        return Err(err.into());
    }
    validate_grad(&fd_grad, x.len())?;
    Ok(fd_grad)
}
