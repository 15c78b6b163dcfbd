//! Equilibrium options and per-iteration diagnostics.
//!
//! Purpose
//! -------
//! Collect the knobs of the outer fixed point ([`EquilibriumOptions`]) and
//! the records the engine emits while iterating ([`IterationRecord`],
//! [`FixedPointOutcome`]).
//!
//! Key behaviors
//! -------------
//! - [`EquilibriumOptions::new`] validates the tolerance, learning rate and
//!   iteration budget; [`Default`] gives `1e-4`, `1.0`, `500` and the
//!   default price-solver options.
//! - [`FixedPointOutcome`] keeps the full iteration history so callers can
//!   inspect how the sup-norm difference decayed.
//!
//! Conventions
//! -----------
//! - `max_sigma_diff` is `max |σ_new − σ_old|` over every period, market,
//!   cell and product.
//! - `clamp_events` counts floor clamps raised by the cost models during
//!   that iteration only.
use crate::{
    equilibrium::errors::{EquilibriumError, EquilibriumResult},
    optimization::root_finder::RootOptions,
};

/// Configuration of `find_equilibrium`.
///
/// Fields
/// ------
/// - `tolerance`: stop once `max |σ_new − σ_old| ≤ tolerance`.
/// - `learning_rate`: blend weight of the new quality in `(0, 1]`.
/// - `max_iter`: iteration budget; exhausting it yields
///   [`EquilibriumError::NonConvergence`].
/// - `price_solver`: root-finder options for the per-period price solve.
#[derive(Debug, Clone, PartialEq)]
pub struct EquilibriumOptions {
    pub tolerance: f64,
    pub learning_rate: f64,
    pub max_iter: usize,
    pub price_solver: RootOptions,
}

impl EquilibriumOptions {
    /// # Errors
    /// - [`EquilibriumError::InvalidTolerance`] unless `tolerance` is finite
    ///   and > 0.
    /// - [`EquilibriumError::InvalidLearningRate`] unless
    ///   `0 < learning_rate ≤ 1`.
    /// - [`EquilibriumError::InvalidMaxIter`] if `max_iter == 0`.
    pub fn new(
        tolerance: f64, learning_rate: f64, max_iter: usize, price_solver: RootOptions,
    ) -> EquilibriumResult<Self> {
        let opts = Self { tolerance, learning_rate, max_iter, price_solver };
        opts.validate()?;
        if max_iter == 0 {
            return Err(EquilibriumError::InvalidMaxIter { value: max_iter });
        }
        Ok(opts)
    }

    /// Check tolerance and learning rate.
    ///
    /// `max_iter` is not checked here: a zero budget is a legal request that
    /// ends in [`EquilibriumError::NonConvergence`].
    pub fn validate(&self) -> EquilibriumResult<()> {
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(EquilibriumError::InvalidTolerance { value: self.tolerance });
        }
        if !self.learning_rate.is_finite()
            || self.learning_rate <= 0.0
            || self.learning_rate > 1.0
        {
            return Err(EquilibriumError::InvalidLearningRate { value: self.learning_rate });
        }
        Ok(())
    }
}

impl Default for EquilibriumOptions {
    fn default() -> Self {
        Self { tolerance: 1e-4, learning_rate: 1.0, max_iter: 500, price_solver: RootOptions::default() }
    }
}

/// Diagnostics of one outer iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationRecord {
    /// 1-based iteration counter.
    pub iteration: usize,
    pub max_sigma_diff: f64,
    pub clamp_events: u64,
}

/// Result of a converged `find_equilibrium` run.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedPointOutcome {
    pub iterations: usize,
    pub final_diff: f64,
    pub history: Vec<IterationRecord>,
}
