//! equilibrium — dynamic oligopoly engine with a single investment type.
//!
//! Purpose
//! -------
//! Compute a dynamic equilibrium in which firms set Bertrand prices every
//! period and zip-code cells invest stochastically in product quality. The
//! engine alternates a per-period price solve with an investment best
//! response until the investment probabilities stop moving.
//!
//! Key behaviors
//! -------------
//! - [`pricing`]: per-period markup first-order conditions solved with the
//!   L-BFGS root finder in log-price coordinates.
//! - [`probabilities`]: cumulative adoption probabilities from `σ`.
//! - [`investment`]: forward effects and the best response `σ_new[t][m]`.
//! - [`engine`]: [`EquilibriumModel`], its `step` and `find_equilibrium`.
//! - [`reports`]: consumer surplus, profits, averages and investment cost.
//!
//! Invariants & assumptions
//! ------------------------
//! - `T ≥ 1`, `M ≥ 1`, `J ≥ 1`; demand, cost, markets and quality agree on
//!   `M` and `J`.
//! - `σ` entries lie in `[0, 1]` and cumulative probabilities are
//!   non-decreasing in the offset.
//!
//! Conventions
//! -----------
//! - `t` is the period, `τ` an offset from `t`, `m` the market, `j` the
//!   product.
//! - Errors are [`EquilibriumError`]; model and optimizer errors are wrapped.
//!
//! Downstream usage
//! ----------------
//! ```no_run
//! use dynamic_oligopoly::equilibrium::{EquilibriumModel, EquilibriumOptions};
//! # fn run(
//! #     markets: &dynamic_oligopoly::market::MarketSet,
//! #     demands: &dynamic_oligopoly::model::Demands,
//! #     costs: &dynamic_oligopoly::model::Costs,
//! #     quality: Vec<ndarray::Array2<f64>>,
//! # ) -> dynamic_oligopoly::equilibrium::EquilibriumResult<()> {
//! let mut model = EquilibriumModel::new(markets, demands, costs, quality, 0.92)?;
//! let outcome = model.find_equilibrium(&EquilibriumOptions::default())?;
//! println!("converged in {} iterations", outcome.iterations);
//! let avg_price = model.average_price()?;
//! # let _ = avg_price;
//! # Ok(())
//! # }
//! ```
//!
//! Testing notes
//! -------------
//! - Each submodule tests its own formulas on small hand-checkable inputs;
//!   `tests/integration_equilibrium_pipeline.rs` runs the full engine.

pub mod engine;
pub mod errors;
pub mod investment;
pub mod options;
pub mod pricing;
pub mod probabilities;
pub mod reports;
pub mod state;

pub use self::engine::{DEFAULT_DELTA, EquilibriumModel};
pub use self::errors::{EquilibriumError, EquilibriumResult};
pub use self::investment::{BestResponse, ForwardEffect};
pub use self::options::{EquilibriumOptions, FixedPointOutcome, IterationRecord};
pub use self::pricing::{PriceFoc, solve_period_price};
pub use self::probabilities::{
    EquilibriumProbabilities, ProbabilityTrajectory, calc_probs_eq, calc_probs0,
};
pub use self::state::{EngineState, InvestmentTrajectory};
