//! market — geography the equilibrium is computed over.
//!
//! Purpose
//! -------
//! Hold validated zip-code cells grouped into markets. Markets are built
//! once, then borrowed read-only by the demand model, the cost model and
//! the engine.
//!
//! Downstream usage
//! ----------------
//! - Build cells with [`ZipCell::new`], group them with [`Market::new`] (or
//!   [`Market::from_columns`]), and collect markets into a [`MarketSet`].
//! - Errors are [`MarketError`]; the model layer wraps them into its own
//!   error type.

pub mod errors;
pub mod geography;

pub use self::errors::{MarketError, MarketResult};
pub use self::geography::{Market, MarketSet, ZipCell};
