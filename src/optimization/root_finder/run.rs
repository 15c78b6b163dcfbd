//! Execution helper that runs an `argmin` solver on a merit-function problem
//! and returns a crate-friendly [`RootOutcome`].
use crate::optimization::{
    errors::OptResult,
    root_finder::{
        adapter::MeritAdapter,
        traits::{ResidualSystem, RootOptions, RootOutcome},
        types::{Grad, Point},
    },
};
#[cfg(feature = "obs_slog")]
use argmin::core::CostFunction;
use argmin::core::{Executor, State};

/// Run an `argmin` optimization of `½‖F(x)‖²`.
///
/// Wires up the problem, the solver, the starting point `x0`, the target
/// cost `½·tol_residual²`, optional `max_iters`, and (behind `obs_slog`) a
/// terminal observer; then re-evaluates the residual at the best point so
/// that the outcome's `converged` flag reflects `‖F(x̂)‖`, not Argmin's
/// termination reason.
///
/// # Errors
/// - Propagates any `argmin` runtime error (line-search failures, residual
///   evaluation errors) via `From<argmin::core::Error>`.
/// - Propagates validation errors raised while building [`RootOutcome`].
pub fn run_lbfgs<'a, F, S>(
    x0: Point, opts: &RootOptions, problem: MeritAdapter<'a, F>, solver: S,
) -> OptResult<RootOutcome>
where
    F: ResidualSystem,
    S: argmin::core::Solver<
            MeritAdapter<'a, F>,
            argmin::core::IterState<Point, Grad, (), (), (), f64>,
        > + 'static,
{
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        log_initial_state(&x0, &problem)?;
    }
    let evaluator = MeritAdapter::new(problem.f);
    let target = opts.target_cost();
    let mut optimizer = Executor::new(problem, solver);
    optimizer = optimizer.configure(|state| state.param(x0).target_cost(target));
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        optimizer = optimizer.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }
    if let Some(max_iter) = opts.tols.max_iter {
        optimizer = optimizer.configure(|state| state.max_iters(max_iter as u64));
    }

    let mut result = optimizer.run()?.state().clone();
    let iterations = result.get_iter();
    let function_counts = result.get_func_counts().clone();
    let termination = result.get_termination_status().clone();
    let x_hat = result.take_best_param();
    let residual_norm = match &x_hat {
        Some(x) => {
            let r = evaluator.residuals(x)?;
            r.dot(&r).sqrt()
        }
        None => f64::NAN,
    };
    RootOutcome::new(
        x_hat,
        residual_norm,
        opts.tol_residual,
        &termination,
        iterations,
        function_counts,
    )
}

// ---- Helper Methods ----

#[cfg(feature = "obs_slog")]
fn log_initial_state<F>(x0: &Point, problem: &MeritAdapter<'_, F>) -> OptResult<()>
where
    F: ResidualSystem,
{
    let c0 = problem.cost(x0)?;
    eprintln!("init: merit(x0) = {c0:.6e}, ||F(x0)|| = {:.6e}", (2.0 * c0).sqrt());
    Ok(())
}
