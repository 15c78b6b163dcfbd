//! model — per-period demand and cost primitives.
//!
//! Purpose
//! -------
//! Hold the economic primitives the equilibrium engine consumes: a logit
//! demand system ([`DemandModel`]) and a cost model with static production
//! cost and dynamic investment cost ([`CostModel`]), each wrapped in a
//! per-period sequence ([`Demands`], [`Costs`]).
//!
//! Invariants & assumptions
//! ------------------------
//! - Models are validated at construction and immutable afterwards (the
//!   clamp counter on [`CostModel`] is diagnostic only).
//! - Every public operation checks the shapes of its array inputs through
//!   [`shape`] and reports [`ModelError`] instead of broadcasting.
//!
//! Conventions
//! -----------
//! - `M` markets, `J` products, `cells_m` zip cells in market `m`.
//! - Prices and marginal costs are length-`J` vectors; quality, shares and
//!   intercepts are `M × J`; per-cell quantities are `cells_m × J`.

pub mod cost;
pub mod demand;
pub mod errors;
pub mod shape;

pub use self::cost::{CostModel, Costs, DynamicCostParams, StaticCostParams};
pub use self::demand::{DEFAULT_DELTA_Q, DemandModel, Demands};
pub use self::errors::{ModelError, ModelResult};
