//! root_finder::builders — L-BFGS solver construction helpers.
//!
//! Purpose
//! -------
//! Hide Argmin's generic wiring and apply crate-level options (tolerances,
//! memory size) so that higher-level code can request a configured solver
//! without touching Argmin-specific types.
//!
//! Conventions
//! -----------
//! - The builders do **not** set the starting point, `max_iters`, or the
//!   target cost; these are runtime concerns applied by
//!   [`run_lbfgs`](super::run::run_lbfgs).
//! - Invalid tolerances rejected by Argmin surface as [`OptError`](crate::optimization::errors::OptError)
//!   through the crate's `From<Error>` conversion.
use argmin::solver::quasinewton::LBFGS;

use crate::optimization::{
    errors::OptResult,
    root_finder::{
        traits::RootOptions,
        types::{
            Cost, DEFAULT_LBFGS_MEM, Grad, HagerZhangLS, LbfgsHagerZhang, LbfgsMoreThuente,
            MoreThuenteLS, Point,
        },
    },
};

/// Construct L-BFGS with the Hager–Zhang line search.
///
/// Consults `opts.lbfgs_mem` (falling back to [`DEFAULT_LBFGS_MEM`]) and the
/// optional gradient/cost tolerances.
pub fn build_optimizer_hager_zhang(opts: &RootOptions) -> OptResult<LbfgsHagerZhang> {
    let hager_zhang = HagerZhangLS::new();
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    let lbfgs = LbfgsHagerZhang::new(hager_zhang, mem);
    configure_lbfgs(lbfgs, opts)
}

/// Construct L-BFGS with the More–Thuente line search.
pub fn build_optimizer_more_thuente(opts: &RootOptions) -> OptResult<LbfgsMoreThuente> {
    let more_thuente = MoreThuenteLS::new();
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    let lbfgs = LbfgsMoreThuente::new(more_thuente, mem);
    configure_lbfgs(lbfgs, opts)
}

/// Apply optional gradient and cost-change tolerances to an L-BFGS solver.
///
/// Generic over the line search so both variants share one code path.
pub fn configure_lbfgs<L>(
    mut lbfgs: LBFGS<L, Point, Grad, Cost>, opts: &RootOptions,
) -> OptResult<LBFGS<L, Point, Grad, Cost>> {
    if let Some(tol_grad) = opts.tols.tol_grad {
        lbfgs = lbfgs.with_tolerance_grad(tol_grad)?;
    }
    if let Some(tol_cost) = opts.tols.tol_cost {
        lbfgs = lbfgs.with_tolerance_cost(tol_cost)?;
    }
    Ok(lbfgs)
}
