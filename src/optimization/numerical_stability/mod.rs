//! numerical_stability — guarded transforms shared by the demand and cost models.
//!
//! Purpose
//! -------
//! Collect the small numerical helpers whose naïve form misbehaves at the
//! edges of `f64`: logit shares and inclusive values for large utilities,
//! and floor clamps in front of `ln` and the normal quantile. Centralizing
//! them here keeps the model code free of ad-hoc guards and keeps the floor
//! value ([`PROB_FLOOR`]) consistent across call sites.
//!
//! Key behaviors
//! -------------
//! - Provide max-shifted logit shares with an outside good
//!   ([`logit_shares`]) and the matching log-sum-exp ([`inclusive_value`]).
//! - Provide [`floor_clamp`], which reports how many entries it raised, and
//!   [`ClampCounter`], an atomic tally owned by each cost model.
//! - Expose the shared standard normal used by the investment transforms.
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs are finite; `NaN`s are passed through rather than masked.
//! - Shares lie in `(0, 1)` and rows sum to less than one.
//!
//! Conventions
//! -----------
//! - All routines operate on `ndarray` views and return owned arrays.
//! - This module never logs or touches global state; counting is done
//!   through the explicit [`ClampCounter`] handle.
//!
//! Testing notes
//! -------------
//! - Unit tests check agreement with naïve formulas on safe grids, overflow
//!   safety for large utilities, and clamp counting.

pub mod transformations;

pub use self::transformations::{
    ClampCounter, PROB_FLOOR, floor_clamp, inclusive_value, logit_shares, standard_normal,
};

pub mod prelude {
    pub use super::transformations::{
        ClampCounter, PROB_FLOOR, floor_clamp, inclusive_value, logit_shares,
    };
}
