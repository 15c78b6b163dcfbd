//! Geographic building blocks: zip-code cells, markets, and market sets.
//!
//! Purpose
//! -------
//! Represent the fixed geography the equilibrium is computed over. A
//! [`Market`] is an ordered list of [`ZipCell`]s; a [`MarketSet`] is the
//! ordered list of markets shared by every period of the horizon.
//!
//! Key behaviors
//! -------------
//! - Validate cells at construction (positive, finite population and
//!   shifter) so the cost model can take `ln`/powers without guards.
//! - Precompute the per-cell shifter and population vectors once; the
//!   engine reads them many times per iteration.
//!
//! Invariants & assumptions
//! ------------------------
//! - Markets and market sets are non-empty.
//! - `Market::total_population()` equals the sum of its cell populations.
//! - All values are immutable after construction.
//!
//! Conventions
//! -----------
//! - Market `m` of a [`MarketSet`] corresponds to row `m` of every `M × J`
//!   matrix in the crate (`xi`, quality, shares).
//! - Per-cell vectors have length `Market::size()` and follow cell order.
//!
//! Testing notes
//! -------------
//! - Unit tests cover validation failures and the population round trip.
use crate::market::errors::{MarketError, MarketResult};
use ndarray::Array1;

/// A zip-code cell: one geographic unit with a cost shifter and population.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZipCell {
    shifter: f64,
    population: f64,
}

impl ZipCell {
    /// Construct a validated cell.
    ///
    /// # Errors
    /// - [`MarketError::InvalidShifter`] if `shifter` is non-finite or ≤ 0.
    /// - [`MarketError::InvalidPopulation`] if `population` is non-finite or ≤ 0.
    pub fn new(shifter: f64, population: f64) -> MarketResult<Self> {
        if !shifter.is_finite() {
            return Err(MarketError::InvalidShifter {
                value: shifter,
                reason: "Shifter must be finite.",
            });
        }
        if shifter <= 0.0 {
            return Err(MarketError::InvalidShifter {
                value: shifter,
                reason: "Shifter must be strictly positive.",
            });
        }
        if !population.is_finite() {
            return Err(MarketError::InvalidPopulation {
                value: population,
                reason: "Population must be finite.",
            });
        }
        if population <= 0.0 {
            return Err(MarketError::InvalidPopulation {
                value: population,
                reason: "Population must be strictly positive.",
            });
        }
        Ok(Self { shifter, population })
    }

    pub fn shifter(&self) -> f64 {
        self.shifter
    }

    pub fn population(&self) -> f64 {
        self.population
    }
}

/// An ordered, non-empty collection of zip-code cells.
///
/// Fields are private; the cached vectors are derived from `cells` once at
/// construction and stay consistent with it.
#[derive(Debug, Clone, PartialEq)]
pub struct Market {
    cells: Vec<ZipCell>,
    shifters: Array1<f64>,
    populations: Array1<f64>,
    total_population: f64,
}

impl Market {
    /// Build a market from validated cells.
    ///
    /// # Errors
    /// [`MarketError::EmptyMarket`] if `cells` is empty.
    pub fn new(cells: Vec<ZipCell>) -> MarketResult<Self> {
        if cells.is_empty() {
            return Err(MarketError::EmptyMarket);
        }
        let shifters: Array1<f64> = cells.iter().map(ZipCell::shifter).collect();
        let populations: Array1<f64> = cells.iter().map(ZipCell::population).collect();
        let total_population = populations.sum();
        Ok(Self { cells, shifters, populations, total_population })
    }

    /// Build a market from parallel shifter/population slices.
    ///
    /// # Errors
    /// - [`MarketError::EmptyMarket`] if the slices are empty.
    /// - [`MarketError::InvalidCell`] wrapping the first invalid cell; a
    ///   length mismatch is reported as an invalid population at the first
    ///   missing index.
    pub fn from_columns(shifters: &[f64], populations: &[f64]) -> MarketResult<Self> {
        if shifters.len() != populations.len() {
            let cell = shifters.len().min(populations.len());
            return Err(MarketError::InvalidCell {
                market: None,
                cell,
                source: Box::new(MarketError::InvalidPopulation {
                    value: f64::NAN,
                    reason: "Shifter and population columns differ in length.",
                }),
            });
        }
        let cells = shifters
            .iter()
            .zip(populations)
            .enumerate()
            .map(|(cell, (&s, &p))| {
                ZipCell::new(s, p).map_err(|e| MarketError::InvalidCell {
                    market: None,
                    cell,
                    source: Box::new(e),
                })
            })
            .collect::<MarketResult<Vec<_>>>()?;
        Self::new(cells)
    }

    /// Number of cells.
    pub fn size(&self) -> usize {
        self.cells.len()
    }

    /// Sum of cell populations.
    pub fn total_population(&self) -> f64 {
        self.total_population
    }

    /// Cost shifters in cell order (length `size()`).
    pub fn shifters(&self) -> &Array1<f64> {
        &self.shifters
    }

    /// Populations in cell order (length `size()`).
    pub fn populations(&self) -> &Array1<f64> {
        &self.populations
    }

    pub fn cells(&self) -> &[ZipCell] {
        &self.cells
    }
}

/// Ordered, non-empty list of markets; row `m` of every `M × J` matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketSet {
    markets: Vec<Market>,
    populations: Array1<f64>,
}

impl MarketSet {
    /// # Errors
    /// [`MarketError::EmptyMarketSet`] if `markets` is empty.
    pub fn new(markets: Vec<Market>) -> MarketResult<Self> {
        if markets.is_empty() {
            return Err(MarketError::EmptyMarketSet);
        }
        let populations = markets.iter().map(Market::total_population).collect();
        Ok(Self { markets, populations })
    }

    /// Number of markets `M`.
    pub fn count(&self) -> usize {
        self.markets.len()
    }

    /// Total population per market (length `M`).
    pub fn populations(&self) -> &Array1<f64> {
        &self.populations
    }

    pub fn get(&self, m: usize) -> Option<&Market> {
        self.markets.get(m)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Market> {
        self.markets.iter()
    }

    /// Number of cells in each market, in market order.
    pub fn sizes(&self) -> Vec<usize> {
        self.markets.iter().map(Market::size).collect()
    }
}

impl<'a> IntoIterator for &'a MarketSet {
    type Item = &'a Market;
    type IntoIter = std::slice::Iter<'a, Market>;

    fn into_iter(self) -> Self::IntoIter {
        self.markets.iter()
    }
}
