//! High-level entry point for solving a user-provided `ResidualSystem`.
//!
//! This selects an L-BFGS solver with either Hager–Zhang or More–Thuente line
//! search, wraps the system in a `MeritAdapter` (which minimizes
//! `½‖F(x)‖²`), and delegates the run to `run_lbfgs`.
use crate::optimization::{
    errors::OptResult,
    root_finder::{
        adapter::MeritAdapter,
        builders::{build_optimizer_hager_zhang, build_optimizer_more_thuente},
        run::run_lbfgs,
        traits::{LineSearcher, ResidualSystem, RootOptions, RootOutcome},
        types::Point,
        validation::validate_point,
    },
};

/// Find `x̂` with `F(x̂) ≈ 0` using L-BFGS on the merit `½‖F(x)‖²`.
///
/// # Behavior
/// - Rejects non-finite starting points, then runs `f.check(x0)`.
/// - Builds an L-BFGS solver with the line search named by
///   `opts.line_searcher`.
/// - Calls `run_lbfgs`, which applies the target cost and iteration cap
///   and re-evaluates `‖F(x̂)‖`.
///
/// A returned [`RootOutcome`] with `converged == false` is **not** an
/// error: the caller decides whether to retry from another start.
///
/// # Errors
/// - [`OptError::InvalidStartingPoint`](crate::optimization::errors::OptError::InvalidStartingPoint)
///   for non-finite `x0`.
/// - Propagates errors from `f.check`, the builders, and the run itself.
///
/// # Example
/// ```rust
/// use ndarray::array;
/// use dynamic_oligopoly::optimization::errors::OptResult;
/// use dynamic_oligopoly::optimization::root_finder::{
///     Point, Residual, ResidualSystem, RootOptions, solve_root,
/// };
///
/// struct Sqrt2;
/// impl ResidualSystem for Sqrt2 {
///     fn residuals(&self, x: &Point) -> OptResult<Residual> {
///         Ok(array![x[0] * x[0] - 2.0])
///     }
/// }
///
/// let out = solve_root(&Sqrt2, array![1.0], &RootOptions::default())?;
/// assert!((out.x_hat[0] - 2f64.sqrt()).abs() < 1e-6);
/// # Ok::<(), dynamic_oligopoly::optimization::errors::OptError>(())
/// ```
pub fn solve_root<F: ResidualSystem>(
    f: &F, x0: Point, opts: &RootOptions,
) -> OptResult<RootOutcome> {
    validate_point(&x0)?;
    f.check(&x0)?;
    let problem = MeritAdapter::new(f);
    match opts.line_searcher {
        LineSearcher::MoreThuente => {
            let solver = build_optimizer_more_thuente(opts)?;
            run_lbfgs(x0, opts, problem, solver)
        }
        LineSearcher::HagerZhang => {
            let solver = build_optimizer_hager_zhang(opts)?;
            run_lbfgs(x0, opts, problem, solver)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::{errors::OptError, root_finder::types::Residual};
    use approx::assert_relative_eq;
    use ndarray::array;

    // F(x) = (x0 + x1 − 3, x0 − x1 − 1), root at (2, 1).
    struct Linear2;

    impl ResidualSystem for Linear2 {
        fn residuals(&self, x: &Point) -> OptResult<Residual> {
            Ok(array![x[0] + x[1] - 3.0, x[0] - x[1] - 1.0])
        }
    }

    // F(x) = x² + 1 has no real root; the merit bottoms out at ½.
    struct NoRoot;

    impl ResidualSystem for NoRoot {
        fn residuals(&self, x: &Point) -> OptResult<Residual> {
            Ok(array![x[0] * x[0] + 1.0])
        }
    }

    #[test]
    // Purpose
    // -------
    // Both line searches solve a well-conditioned linear system.
    //
    // Given
    // -----
    // - The 2×2 system above started from the origin.
    //
    // Expect
    // ------
    // - x̂ ≈ (2, 1), `converged == true`, residual norm within tolerance.
    fn solves_linear_system_with_both_line_searches() {
        for ls in [LineSearcher::MoreThuente, LineSearcher::HagerZhang] {
            let opts = RootOptions { line_searcher: ls, ..RootOptions::default() };

            let out = solve_root(&Linear2, array![0.0, 0.0], &opts).unwrap();

            assert!(out.converged, "{ls:?}: {}", out.status);
            assert!(out.residual_norm <= opts.tol_residual);
            assert_relative_eq!(out.x_hat[0], 2.0, epsilon = 1e-6);
            assert_relative_eq!(out.x_hat[1], 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    // Purpose
    // -------
    // A system without a root is never reported as converged.
    //
    // Expect
    // ------
    // - Either a line-search error near the flat minimum or an outcome with
    //   `converged == false` and ‖F‖ ≥ 1.
    fn rootless_system_is_not_converged() {
        match solve_root(&NoRoot, array![0.7], &RootOptions::default()) {
            Ok(out) => {
                assert!(!out.converged);
                assert!(out.residual_norm >= 1.0 - 1e-8);
            }
            Err(err) => assert!(!matches!(err, OptError::InvalidStartingPoint { .. })),
        }
    }

    #[test]
    fn non_finite_start_is_rejected() {
        let err = solve_root(&Linear2, array![f64::NAN, 0.0], &RootOptions::default()).unwrap_err();

        assert!(matches!(err, OptError::InvalidStartingPoint { index: 0, .. }));
    }
}
